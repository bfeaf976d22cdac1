//! # Line Tokenization
//!
//! The linguistic splitting rule is injectable; the pipeline only requires a
//! deterministic, stateless ``line -> ordered words`` function.

/// A deterministic rule for splitting one line of text into words.
pub trait LineTokenizer {
    /// Split a line into word slices, in order.
    ///
    /// Must be pure: the same line always yields the same words.
    fn split<'a>(
        &self,
        line: &'a str,
    ) -> Vec<&'a str>;
}

/// Whitespace word splitting.
///
/// Words are maximal runs of non-whitespace; leading and trailing whitespace
/// is dropped, and runs of whitespace never yield empty words.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WhitespaceTokenizer;

impl LineTokenizer for WhitespaceTokenizer {
    fn split<'a>(
        &self,
        line: &'a str,
    ) -> Vec<&'a str> {
        line.split_whitespace().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words() {
        let tok = WhitespaceTokenizer;

        assert_eq!(tok.split("hello world"), vec!["hello", "world"]);
        assert_eq!(tok.split("  a\tb  c\n"), vec!["a", "b", "c"]);
        assert_eq!(tok.split(""), Vec::<&str>::new());
        assert_eq!(tok.split("   \t "), Vec::<&str>::new());
    }

    #[test]
    fn test_split_is_deterministic() {
        let tok = WhitespaceTokenizer;
        let line = "der schnelle braune fuchs";
        assert_eq!(tok.split(line), tok.split(line));
    }
}
