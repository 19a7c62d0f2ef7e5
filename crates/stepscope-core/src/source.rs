//! Immutable source line model.

/// The ordered source lines of one script, derived once from the input text.
///
/// Lines are right-trimmed on construction and never mutated afterwards.
/// Snapshot line indices throughout the crate family are 0-based indices
/// into this sequence.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SourceLines {
    lines: Vec<String>,
}

impl SourceLines {
    /// Splits a script into its source lines, right-trimming each.
    pub fn new(script: &str) -> Self {
        SourceLines {
            lines: script.lines().map(|l| l.trim_end().to_string()).collect(),
        }
    }

    /// Number of source lines.
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the script has no lines at all.
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Returns the line at `index`, if it exists.
    pub fn get(&self, index: usize) -> Option<&str> {
        self.lines.get(index).map(String::as_str)
    }

    /// True when the line is empty after trimming (never executes).
    pub fn is_blank(&self, index: usize) -> bool {
        self.get(index).map(|l| l.trim().is_empty()).unwrap_or(true)
    }

    /// All lines, in order.
    pub fn lines(&self) -> &[String] {
        &self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_and_right_trims() {
        let src = SourceLines::new("x = 1   \n\ny = 2\n");
        assert_eq!(src.len(), 3);
        assert_eq!(src.get(0), Some("x = 1"));
        assert_eq!(src.get(1), Some(""));
        assert_eq!(src.get(2), Some("y = 2"));
        assert!(src.is_blank(1));
        assert!(!src.is_blank(0));
    }

    #[test]
    fn out_of_range_is_blank() {
        let src = SourceLines::new("x = 1");
        assert_eq!(src.get(5), None);
        assert!(src.is_blank(5));
    }
}
