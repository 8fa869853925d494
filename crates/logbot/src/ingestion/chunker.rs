//! Timestamp-anchored chunking of log-shaped text

use once_cell::sync::Lazy;
use regex::Regex;

/// A line starting with `YYYY-MM-DD HH:MM:SS.mmm` opens a new block
static ANCHOR_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\d{4}-\d{2}-\d{2}\s\d{2}:\d{2}:\d{2}\.\d{3}").expect("Invalid regex")
});

/// A maximal run of lines starting at an anchor line
///
/// `text` borrows from the chunked input and never includes the line break
/// that separates it from the next block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogBlock<'a> {
    /// Block text, continuation lines included
    pub text: &'a str,
    /// 1-based line number of the block's first line
    pub first_line: usize,
}

impl<'a> LogBlock<'a> {
    /// First line of the block, the only line header parsing looks at
    pub fn header_line(&self) -> &'a str {
        self.text.split('\n').next().unwrap_or(self.text)
    }

    /// Number of lines in the block (always at least one)
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }
}

/// Whether a line opens a new block
pub fn is_anchor_line(line: &str) -> bool {
    ANCHOR_PATTERN.is_match(line)
}

/// Splits log text into blocks on timestamp anchor lines
///
/// Lines before the first anchor stay in the first block; they are dropped
/// later by header parsing, never here. No block is empty: a single blank
/// line ahead of the first anchor yields no block of its own. Otherwise
/// joining the blocks with `"\n"` reproduces the input byte for byte.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampChunker;

impl TimestampChunker {
    /// Create a new chunker
    pub fn new() -> Self {
        Self
    }

    /// Chunk the full text of one file
    pub fn chunk<'a>(&self, content: &'a str) -> Vec<LogBlock<'a>> {
        if content.is_empty() {
            return Vec::new();
        }

        let mut blocks = Vec::new();
        let mut block_start = 0usize;
        let mut block_line = 1usize;
        let mut offset = 0usize;

        for (idx, line) in content.split('\n').enumerate() {
            if offset > block_start && is_anchor_line(line) {
                let text = &content[block_start..offset - 1];
                if !text.is_empty() {
                    blocks.push(LogBlock {
                        text,
                        first_line: block_line,
                    });
                }
                block_start = offset;
                block_line = idx + 1;
            }
            offset += line.len() + 1;
        }

        blocks.push(LogBlock {
            text: &content[block_start..],
            first_line: block_line,
        });

        blocks
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejoin(blocks: &[LogBlock<'_>]) -> String {
        blocks.iter().map(|b| b.text).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_stack_trace_stays_with_header() {
        let input = "2024-01-01 10:00:00.000 ERROR [Svc] [PAY-PRC-9] boom\n\
                     java.lang.IllegalStateException: x\n\
                     \tat com.acme.Pay.run(Pay.java:12)\n\
                     2024-01-01 10:00:01.000 INFO [Svc] ok";
        let blocks = TimestampChunker::new().chunk(input);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].line_count(), 3);
        assert_eq!(
            blocks[0].header_line(),
            "2024-01-01 10:00:00.000 ERROR [Svc] [PAY-PRC-9] boom"
        );
        assert_eq!(blocks[1].first_line, 4);
        assert_eq!(blocks[1].text, "2024-01-01 10:00:01.000 INFO [Svc] ok");
    }

    #[test]
    fn test_leading_content_kept_in_first_block() {
        let input = "banner line\nanother\n2024-01-01 10:00:00.000 INFO [Svc] up";
        let blocks = TimestampChunker::new().chunk(input);

        assert_eq!(blocks.len(), 2);
        assert_eq!(blocks[0].text, "banner line\nanother");
        assert_eq!(blocks[0].first_line, 1);
        assert_eq!(blocks[1].first_line, 3);
    }

    #[test]
    fn test_lossless_rejoin() {
        let inputs = [
            "2024-01-01 10:00:00.000 INFO [A] x\n",
            "\n\n2024-01-01 10:00:00.000 INFO [A] x\r\ncont\r\n",
            "no anchors at all\njust text",
            "2024-01-01 10:00:00.000 INFO [A] x\n2024-01-01 10:00:00.001 INFO [A] y\n\n",
            "single",
        ];
        let chunker = TimestampChunker::new();
        for input in inputs {
            let blocks = chunker.chunk(input);
            assert!(!blocks.is_empty());
            assert_eq!(rejoin(&blocks), input);
        }
    }

    #[test]
    fn test_single_leading_blank_line_is_not_a_block() {
        let blocks = TimestampChunker::new().chunk("\n2024-01-01 10:00:00.000 INFO [A] x");

        assert_eq!(blocks.len(), 1);
        assert_eq!(blocks[0].text, "2024-01-01 10:00:00.000 INFO [A] x");
        assert_eq!(blocks[0].first_line, 2);
        assert!(blocks.iter().all(|b| !b.text.is_empty()));
    }

    #[test]
    fn test_empty_input_has_no_blocks() {
        assert!(TimestampChunker::new().chunk("").is_empty());
    }

    #[test]
    fn test_anchor_requires_milliseconds() {
        assert!(is_anchor_line("2024-01-01 10:00:00.123 INFO"));
        assert!(!is_anchor_line("2024-01-01 10:00:00 INFO"));
        assert!(!is_anchor_line(" 2024-01-01 10:00:00.123 INFO"));
    }
}
