//! ESC/POS device commands
//!
//! Fixed control sequences for ticket printers with a presenter/ejector
//! unit. The byte values are vendor opcodes and must stay bit-exact.

use std::fmt;

/// ESC @ - Initialize printer (soft reset to defaults)
pub const INIT: [u8; 2] = [0x1B, 0x40];

/// ESC i - Total cut of the current ticket
pub const CUT: [u8; 2] = [0x1B, 0x69];

/// GS e 3 n - Present the ticket with 12 (0x0C) steps of paper
pub const PRESENT_12_STEPS: [u8; 4] = [0x1D, 0x65, 0x03, 0x0C];

/// GS e 2 - Retract the ticket (ignored when retraction is disabled)
pub const RETRACT: [u8; 3] = [0x1D, 0x65, 0x02];

/// GS e 5 - Eject the ticket
pub const EJECT: [u8; 3] = [0x1D, 0x65, 0x05];

/// A single device-control command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceCommand {
    Initialize,
    Cut,
    Present,
    /// Pull the presented ticket back into the device (reject)
    Retract,
    Eject,
}

impl DeviceCommand {
    /// Raw bytes sent to the printer
    pub const fn bytes(self) -> &'static [u8] {
        match self {
            DeviceCommand::Initialize => &INIT,
            DeviceCommand::Cut => &CUT,
            DeviceCommand::Present => &PRESENT_12_STEPS,
            DeviceCommand::Retract => &RETRACT,
            DeviceCommand::Eject => &EJECT,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            DeviceCommand::Initialize => "initialize",
            DeviceCommand::Cut => "cut",
            DeviceCommand::Present => "present",
            DeviceCommand::Retract => "retract",
            DeviceCommand::Eject => "eject",
        }
    }
}

impl fmt::Display for DeviceCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_bytes_are_exact() {
        assert_eq!(DeviceCommand::Initialize.bytes(), &[0x1B, 0x40]);
        assert_eq!(DeviceCommand::Cut.bytes(), &[0x1B, 0x69]);
        assert_eq!(DeviceCommand::Present.bytes(), &[0x1D, 0x65, 0x03, 0x0C]);
        assert_eq!(DeviceCommand::Retract.bytes(), &[0x1D, 0x65, 0x02]);
        assert_eq!(DeviceCommand::Eject.bytes(), &[0x1D, 0x65, 0x05]);
    }

    #[test]
    fn test_display() {
        assert_eq!(DeviceCommand::Retract.to_string(), "retract");
    }
}
