//! Synthetic ticket content
//!
//! Every ticket starts with a header carrying the ticket counter so captured
//! printer output can be matched to the cycle that produced it. The body
//! depends on the mode:
//! - text excerpt: a random run of corpus lines, roughly `lines * 32` chars
//! - filler: a marker line repeated between `min` and `max` times
//! - empty: blank lines with the same length policy as filler

use crate::config::ContentMode;
use crate::corpus::Corpus;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Marker line for filler tickets
pub const FILLER_LINE: &str = "SSSSSSSSSSSSSSSSSSSSSSSSSSSSSSSS";

/// Approximate characters per printed line on 58mm paper
pub const AVG_CHARS_PER_LINE: usize = 32;

/// Once the minimum is reached, each further line has a 1-in-13 chance of
/// ending the ticket
const EARLY_EXIT_ODDS: u32 = 13;

/// Produces ticket payloads
pub struct ContentGenerator {
    corpus: Corpus,
    rng: StdRng,
    printer_name: String,
    test_name: String,
}

impl ContentGenerator {
    pub fn new(printer_name: impl Into<String>, test_name: impl Into<String>) -> Self {
        Self {
            corpus: Corpus::reference(),
            rng: StdRng::from_entropy(),
            printer_name: printer_name.into(),
            test_name: test_name.into(),
        }
    }

    /// Fix the random sequence (tests, reproducible runs)
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn with_corpus(mut self, corpus: Corpus) -> Self {
        self.corpus = corpus;
        self
    }

    /// Header followed by a body in the given mode
    pub fn generate(
        &mut self,
        mode: ContentMode,
        min_lines: u32,
        max_lines: u32,
        ticket_counter: u64,
    ) -> String {
        let mut out = self.header(ticket_counter);
        self.body(mode, min_lines, max_lines, &mut out);
        out
    }

    pub fn header(&self, ticket_counter: u64) -> String {
        format!(
            "\n<<Ticket #{} {}>>\n<<{}>>\n",
            ticket_counter, self.printer_name, self.test_name
        )
    }

    pub(crate) fn body(&mut self, mode: ContentMode, min_lines: u32, max_lines: u32, out: &mut String) {
        let max_lines = max_lines.max(min_lines);
        match mode {
            ContentMode::TextExcerpt => self.excerpt(min_lines, max_lines, out),
            ContentMode::Filler => self.repeat_line(FILLER_LINE, min_lines, max_lines, out),
            ContentMode::Empty => self.repeat_line("", min_lines, max_lines, out),
        }
    }

    fn excerpt(&mut self, min_lines: u32, max_lines: u32, out: &mut String) {
        if self.corpus.is_empty() || max_lines == 0 {
            return;
        }

        let line_count = self.rng.gen_range(min_lines..=max_lines) as usize;
        // Leave room for the full excerpt; when that pins the start to a
        // single line, any line may start a (truncated) excerpt instead
        let room = self.corpus.len().saturating_sub(line_count);
        let span = if room > 1 { room } else { self.corpus.len() };
        let start = self.rng.gen_range(0..span);

        let mut remaining = line_count * AVG_CHARS_PER_LINE;
        for line in self.corpus.lines_from(start) {
            if remaining == 0 {
                break;
            }
            if line.is_empty() {
                continue;
            }
            remaining = remaining.saturating_sub(line.len());
            out.push_str(line);
            out.push('\n');
        }
    }

    fn repeat_line(&mut self, line: &str, min_lines: u32, max_lines: u32, out: &mut String) {
        for i in 1..=max_lines {
            out.push_str(line);
            out.push('\n');
            if i >= min_lines && i < max_lines && self.rng.gen_ratio(1, EARLY_EXIT_ODDS) {
                break;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Longest line in the reference corpus
    const REFERENCE_LINE_MAX: usize = 54;

    fn body_of(generator: &mut ContentGenerator, mode: ContentMode, min: u32, max: u32) -> String {
        let mut out = String::new();
        generator.body(mode, min, max, &mut out);
        out
    }

    #[test]
    fn test_header_embeds_counter() {
        let mut generator = ContentGenerator::new("Reliance", "burn-in").with_seed(1);
        let ticket = generator.generate(ContentMode::Filler, 1, 1, 42);
        assert!(ticket.starts_with("\n<<Ticket #42 Reliance>>\n<<burn-in>>\n"));
    }

    #[test]
    fn test_filler_line_count_within_bounds() {
        let mut generator = ContentGenerator::new("p", "").with_seed(7);
        for _ in 0..500 {
            let body = body_of(&mut generator, ContentMode::Filler, 3, 20);
            let lines = body.lines().count();
            assert!((3..=20).contains(&lines), "got {} lines", lines);
            assert!(body.lines().all(|l| l == FILLER_LINE));
        }
    }

    #[test]
    fn test_empty_line_count_within_bounds() {
        let mut generator = ContentGenerator::new("p", "").with_seed(9);
        for _ in 0..500 {
            let body = body_of(&mut generator, ContentMode::Empty, 5, 8);
            assert!(body.chars().all(|c| c == '\n'));
            let lines = body.len();
            assert!((5..=8).contains(&lines), "got {} lines", lines);
        }
    }

    #[test]
    fn test_fixed_line_count() {
        let mut generator = ContentGenerator::new("p", "").with_seed(3);
        let body = body_of(&mut generator, ContentMode::Filler, 2, 2);
        assert_eq!(body.lines().count(), 2);
    }

    #[test]
    fn test_filler_varies_length() {
        let mut generator = ContentGenerator::new("p", "").with_seed(11);
        let lengths: std::collections::HashSet<usize> = (0..200)
            .map(|_| body_of(&mut generator, ContentMode::Filler, 1, 60).lines().count())
            .collect();
        assert!(lengths.len() > 1);
    }

    #[test]
    fn test_inverted_bounds_use_min() {
        let mut generator = ContentGenerator::new("p", "").with_seed(5);
        let body = body_of(&mut generator, ContentMode::Filler, 4, 1);
        assert_eq!(body.lines().count(), 4);
    }

    #[test]
    fn test_excerpt_from_reference() {
        let mut generator = ContentGenerator::new("p", "").with_seed(13);
        let body = body_of(&mut generator, ContentMode::TextExcerpt, 5, 10);
        assert!(!body.is_empty());
        assert!(body.lines().all(|l| !l.is_empty()));
        // stops once roughly lines * 32 characters are collected
        let chars: usize = body.lines().map(str::len).sum();
        assert!(chars <= 10 * AVG_CHARS_PER_LINE + REFERENCE_LINE_MAX);
    }

    #[test]
    fn test_excerpt_start_varies_beyond_corpus_length() {
        let corpus_len = Corpus::reference().len() as u32;
        let first_lines: std::collections::HashSet<String> = (0..50)
            .map(|seed| {
                let mut generator = ContentGenerator::new("p", "").with_seed(seed);
                let body = body_of(
                    &mut generator,
                    ContentMode::TextExcerpt,
                    corpus_len,
                    corpus_len + 40,
                );
                body.lines().next().unwrap_or_default().to_string()
            })
            .collect();
        assert!(first_lines.len() > 1, "every excerpt started at {:?}", first_lines);
    }

    #[test]
    fn test_excerpt_start_varies_near_corpus_length() {
        let corpus_len = Corpus::reference().len() as u32;
        let first_lines: std::collections::HashSet<String> = (0..50)
            .map(|seed| {
                let mut generator = ContentGenerator::new("p", "").with_seed(seed);
                let body = body_of(&mut generator, ContentMode::TextExcerpt, 10, corpus_len - 1);
                body.lines().next().unwrap_or_default().to_string()
            })
            .collect();
        assert!(first_lines.len() > 1);
    }

    #[test]
    fn test_excerpt_tolerates_exhausted_corpus() {
        let mut generator = ContentGenerator::new("p", "")
            .with_seed(17)
            .with_corpus(Corpus::new("short\n\nlines"));
        let body = body_of(&mut generator, ContentMode::TextExcerpt, 50, 100);
        assert!(body.ends_with("lines\n"));
    }

    #[test]
    fn test_excerpt_empty_corpus() {
        let mut generator = ContentGenerator::new("p", "")
            .with_seed(19)
            .with_corpus(Corpus::new(""));
        let ticket = generator.generate(ContentMode::TextExcerpt, 1, 5, 1);
        assert_eq!(ticket, generator.header(1));
    }
}
