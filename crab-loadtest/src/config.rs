use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Delay used when the configured inter-cycle delay is negative
pub const FALLBACK_DELAY_MS: u64 = 7000;

/// Ticket content mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ContentMode {
    /// Random excerpt of the reference corpus
    #[default]
    TextExcerpt,
    /// Repeated marker line
    Filler,
    /// Blank lines only
    Empty,
}

impl FromStr for ContentMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text-excerpt" | "text" | "excerpt" => Ok(ContentMode::TextExcerpt),
            "filler" | "s" => Ok(ContentMode::Filler),
            "empty" => Ok(ContentMode::Empty),
            other => Err(ConfigError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for ContentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContentMode::TextExcerpt => "text-excerpt",
            ContentMode::Filler => "filler",
            ContentMode::Empty => "empty",
        })
    }
}

/// Parameters of one load-test run
///
/// Copied into the run when it starts; later edits do not affect a run in
/// progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TestConfiguration {
    pub mode: ContentMode,
    /// Number of tickets to print; negative runs until stopped
    pub stop_after: i64,
    /// Pause between cycles; negative uses [`FALLBACK_DELAY_MS`]
    pub delay_ms: i64,
    pub min_lines: u32,
    pub max_lines: u32,
    /// Every n-th cycle rejects instead of ejecting; `<= 0` never rejects
    pub reject_every_nth: i64,
    /// Label printed in every ticket header
    pub test_name: String,
}

impl Default for TestConfiguration {
    fn default() -> Self {
        Self {
            mode: ContentMode::TextExcerpt,
            stop_after: 3,
            delay_ms: 4000,
            min_lines: 25,
            max_lines: 25,
            reject_every_nth: 5,
            test_name: String::new(),
        }
    }
}

impl TestConfiguration {
    pub fn is_unbounded(&self) -> bool {
        self.stop_after < 0
    }

    pub fn inter_cycle_delay(&self) -> Duration {
        match u64::try_from(self.delay_ms) {
            Ok(ms) => Duration::from_millis(ms),
            Err(_) => Duration::from_millis(FALLBACK_DELAY_MS),
        }
    }

    /// Line bounds with `max` raised to `min` when they are inverted
    pub fn line_bounds(&self) -> (u32, u32) {
        (self.min_lines, self.max_lines.max(self.min_lines))
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })
    }
}

/// Load tester configuration
///
/// # Environment variables
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | PRINTER_NAME | (empty) | Print queue name |
/// | LOADTEST_CONFIG | - | JSON file with a `TestConfiguration` |
/// | LOADTEST_MODE | text-excerpt | text-excerpt, filler or empty |
/// | LOADTEST_STOP_AFTER | 3 | Ticket count, negative = forever |
/// | LOADTEST_DELAY_MS | 4000 | Pause between tickets |
/// | LOADTEST_MIN_LINES | 25 | Minimum ticket lines |
/// | LOADTEST_MAX_LINES | 25 | Maximum ticket lines |
/// | LOADTEST_REJECT_EVERY | 5 | Reject cadence, `<= 0` disables |
/// | LOADTEST_TEST_NAME | (empty) | Label in ticket headers |
/// | LOG_LEVEL | info | Default log level |
/// | LOG_DIR | - | Daily log files go here when set |
///
/// Variables override values from the `LOADTEST_CONFIG` file.
#[derive(Debug, Clone)]
pub struct Config {
    pub printer_name: String,
    pub test: TestConfiguration,
    pub log_level: String,
    pub log_dir: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut test = match std::env::var("LOADTEST_CONFIG") {
            Ok(path) => TestConfiguration::from_json_file(path)?,
            Err(_) => TestConfiguration::default(),
        };

        if let Ok(mode) = std::env::var("LOADTEST_MODE") {
            test.mode = mode.parse()?;
        }
        test.stop_after = env_or("LOADTEST_STOP_AFTER", test.stop_after);
        test.delay_ms = env_or("LOADTEST_DELAY_MS", test.delay_ms);
        test.min_lines = env_or("LOADTEST_MIN_LINES", test.min_lines);
        test.max_lines = env_or("LOADTEST_MAX_LINES", test.max_lines);
        test.reject_every_nth = env_or("LOADTEST_REJECT_EVERY", test.reject_every_nth);
        if let Ok(name) = std::env::var("LOADTEST_TEST_NAME") {
            test.test_name = name;
        }

        Ok(Self {
            printer_name: std::env::var("PRINTER_NAME").unwrap_or_default(),
            test,
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok(),
        })
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}
