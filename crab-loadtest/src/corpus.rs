//! Reference text for excerpt tickets

/// Built-in reference text
pub const REFERENCE_TEXT: &str = include_str!("../corpus/reference.txt");

/// Read-only line view over a text
///
/// Callers pick their own start line; nothing here keeps a cursor.
#[derive(Debug, Clone)]
pub struct Corpus {
    lines: Vec<&'static str>,
}

impl Corpus {
    pub fn new(text: &'static str) -> Self {
        Self {
            lines: text.lines().collect(),
        }
    }

    pub fn reference() -> Self {
        Self::new(REFERENCE_TEXT)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Lines from `start` to the end of the text
    pub fn lines_from(&self, start: usize) -> impl Iterator<Item = &'static str> + '_ {
        self.lines.iter().skip(start).copied()
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::reference()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_not_empty() {
        let corpus = Corpus::reference();
        // long enough that large tickets still get a random start
        assert!(corpus.len() > 2000);
        assert!(corpus.lines_from(0).all(|l| l.is_ascii()));
    }

    #[test]
    fn test_lines_from_past_end() {
        let corpus = Corpus::new("a\nb\nc");
        assert_eq!(corpus.lines_from(1).collect::<Vec<_>>(), vec!["b", "c"]);
        assert_eq!(corpus.lines_from(10).count(), 0);
    }
}
