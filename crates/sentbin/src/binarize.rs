//! # Corpus Binarization
//!
//! Streams a corpus line by line, maps every word through a
//! [`Dictionary`], appends the end-of-sequence index, and hands each
//! encoded sequence to a consumer, in file order. The consumer is just a
//! fallible function over one integer sequence; feeding a dataset
//! builder's `add_item` is the typical use but not a requirement.

use crate::dictionary::{Dictionary, UNK_SYMBOL};
use crate::tokenizer::LineTokenizer;
use crate::types::TokenType;
use anyhow::Context;
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Per-file statistics accumulated by one binarization pass.
///
/// `tokens` counts every encoded element, INCLUDING the trailing
/// end-of-sequence of each line; `unknowns / tokens` is the replacement
/// rate with that same denominator.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BinarizeStats {
    /// Lines processed.
    pub sentences: u64,

    /// Elements encoded, end-of-sequence markers included.
    pub tokens: u64,

    /// Elements that resolved to the unknown index.
    pub unknowns: u64,
}

impl BinarizeStats {
    /// The fraction of encoded elements replaced by the unknown symbol.
    pub fn unknown_rate(&self) -> f64 {
        if self.tokens == 0 {
            0.0
        } else {
            self.unknowns as f64 / self.tokens as f64
        }
    }
}

/// Binarize a corpus file.
///
/// See [`binarize_reader`].
pub fn binarize_path<T, K, F, P>(
    path: P,
    dict: &mut Dictionary<T>,
    tokenizer: &K,
    consumer: F,
    extend_vocab: bool,
) -> anyhow::Result<BinarizeStats>
where
    T: TokenType,
    K: LineTokenizer,
    F: FnMut(&[T]) -> anyhow::Result<()>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let file = std::fs::File::open(path)
        .with_context(|| format!("opening corpus {}", path.display()))?;
    binarize_reader(BufReader::new(file), dict, tokenizer, consumer, extend_vocab)
        .with_context(|| format!("binarizing {}", path.display()))
}

/// Binarize a corpus from a line reader.
///
/// Per line: tokenize, map each word through the dictionary (`extend_vocab`
/// registers new words instead of collapsing them to unknown; only used
/// while a dictionary is being built), append the end-of-sequence index,
/// and invoke `consumer` with the encoded sequence.
///
/// Unknown resolutions are tallied in the returned stats and added to the
/// dictionary's unknown-symbol count. A word spelled exactly like the
/// unknown symbol is not counted as a replacement.
pub fn binarize_reader<T, K, F, R>(
    reader: R,
    dict: &mut Dictionary<T>,
    tokenizer: &K,
    mut consumer: F,
    extend_vocab: bool,
) -> anyhow::Result<BinarizeStats>
where
    T: TokenType,
    K: LineTokenizer,
    F: FnMut(&[T]) -> anyhow::Result<()>,
    R: BufRead,
{
    let eos = dict.eos();
    let unk = dict.unk();

    let mut stats = BinarizeStats::default();
    let mut item: Vec<T> = Vec::new();

    for line in reader.lines() {
        let line = line?;

        item.clear();
        for word in tokenizer.split(&line) {
            let idx = if extend_vocab {
                dict.add(word)
            } else {
                dict.lookup(word)
            };
            if idx == unk && word != UNK_SYMBOL {
                stats.unknowns += 1;
            }
            item.push(idx);
        }
        item.push(eos);

        stats.sentences += 1;
        stats.tokens += item.len() as u64;
        consumer(&item)?;
    }

    dict.note_unknowns(stats.unknowns);
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dictionary::Dictionary;
    use crate::tokenizer::WhitespaceTokenizer;
    use std::io::Cursor;

    fn finalized_dict(corpus: &str) -> Dictionary<u32> {
        let mut dict =
            Dictionary::<u32>::build_from_reader(Cursor::new(corpus), &WhitespaceTokenizer)
                .unwrap();
        dict.finalize(0, -1);
        dict
    }

    #[test]
    fn test_item_shape_and_order() {
        let mut dict = finalized_dict("a b\nc\n");
        let eos = dict.eos();

        let mut items: Vec<Vec<u32>> = Vec::new();
        let stats = binarize_reader(
            Cursor::new("a b\nc\n\n"),
            &mut dict,
            &WhitespaceTokenizer,
            |item| {
                items.push(item.to_vec());
                Ok(())
            },
            false,
        )
        .unwrap();

        // N lines in, N items out; item i has length L_i + 1.
        assert_eq!(stats.sentences, 3);
        assert_eq!(items.len(), 3);
        assert_eq!(items[0].len(), 3);
        assert_eq!(items[1].len(), 2);
        assert_eq!(items[2], vec![eos]);

        assert_eq!(items[0][0], dict.lookup("a"));
        assert_eq!(items[0][1], dict.lookup("b"));
        assert_eq!(*items[0].last().unwrap(), eos);

        // eos included in the token denominator.
        assert_eq!(stats.tokens, 6);
        assert_eq!(stats.unknowns, 0);
    }

    #[test]
    fn test_unknown_accounting() {
        let mut dict = finalized_dict("a b\n");

        let stats = binarize_reader(
            Cursor::new("a x\nx y a\n"),
            &mut dict,
            &WhitespaceTokenizer,
            |_| Ok(()),
            false,
        )
        .unwrap();

        // x twice, y once.
        assert_eq!(stats.unknowns, 3);
        assert_eq!(stats.tokens, 7);
        assert!((stats.unknown_rate() - 3.0 / 7.0).abs() < 1e-12);

        // Unknown bookkeeping lands on the dictionary too.
        assert_eq!(dict.count(UNK_SYMBOL), Some(3));
        // ... without adding symbols.
        assert_eq!(dict.index("x"), None);
    }

    #[test]
    fn test_literal_unk_is_not_a_replacement() {
        let mut dict = finalized_dict("a\n");

        let stats = binarize_reader(
            Cursor::new("a <unk>\n"),
            &mut dict,
            &WhitespaceTokenizer,
            |_| Ok(()),
            false,
        )
        .unwrap();

        assert_eq!(stats.unknowns, 0);
        assert_eq!(stats.tokens, 3);
    }

    #[test]
    fn test_extend_vocab_registers_words() {
        let mut dict = Dictionary::<u32>::new();

        let stats = binarize_reader(
            Cursor::new("a b a\n"),
            &mut dict,
            &WhitespaceTokenizer,
            |_| Ok(()),
            true,
        )
        .unwrap();

        assert_eq!(stats.unknowns, 0);
        assert_eq!(dict.count("a"), Some(2));
        assert_eq!(dict.count("b"), Some(1));
    }

    #[test]
    fn test_empty_input() {
        let mut dict = finalized_dict("a\n");
        let stats =
            binarize_reader(Cursor::new(""), &mut dict, &WhitespaceTokenizer, |_| Ok(()), false)
                .unwrap();

        assert_eq!(stats, BinarizeStats::default());
        assert_eq!(stats.unknown_rate(), 0.0);
    }
}
