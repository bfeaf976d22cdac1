//! # Symbol Dictionary
//!
//! Bidirectional mapping between word strings and dense token indices, with
//! occurrence counts and four reserved control symbols at fixed low indices.

pub mod io;

use crate::tokenizer::LineTokenizer;
use crate::types::{SymbolToTokenMap, TokenType};
use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::io::{BufRead, BufReader};
use std::path::Path;

/// Padding symbol, always index 0.
pub const PAD_SYMBOL: &str = "<pad>";

/// End-of-sequence symbol, always index 1.
pub const EOS_SYMBOL: &str = "</s>";

/// Unknown-word symbol, always index 2.
pub const UNK_SYMBOL: &str = "<unk>";

/// Begin-of-sequence symbol, always index 3.
pub const BOS_SYMBOL: &str = "<s>";

/// Number of reserved control symbols at the head of every dictionary.
pub const RESERVED_SYMBOLS: usize = 4;

const PAD_INDEX: usize = 0;
const EOS_INDEX: usize = 1;
const UNK_INDEX: usize = 2;
const BOS_INDEX: usize = 3;

/// Word dictionary as ordered ``(symbol, count)`` entries plus a reverse
/// ``{ symbol -> T }`` index map.
///
/// Indices are dense, starting at 0, and the reserved control symbols
/// occupy indices ``0..4`` regardless of corpus content. Downstream
/// consumers key loss masking off these fixed indices, so they must never
/// move.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(bound(serialize = "T: TokenType", deserialize = "T: TokenType"))]
pub struct Dictionary<T: TokenType> {
    /// ``(symbol, count)`` entries in index order; reserved symbols first.
    entries: Vec<(String, u64)>,

    /// Map of ``{ symbol -> T }``.
    indices: SymbolToTokenMap<T>,
}

impl<T: TokenType> Default for Dictionary<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: TokenType> Dictionary<T> {
    /// Create an empty dictionary holding only the reserved symbols.
    pub fn new() -> Self {
        let mut dict = Self {
            entries: Vec::new(),
            indices: SymbolToTokenMap::default(),
        };
        for symbol in [PAD_SYMBOL, EOS_SYMBOL, UNK_SYMBOL, BOS_SYMBOL] {
            dict.push_entry(symbol, 0);
        }
        dict
    }

    /// The number of symbols in the dictionary, reserved symbols included.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the dictionary contains no symbols.
    ///
    /// Never true in practice; the reserved symbols are always present.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The padding index.
    pub fn pad(&self) -> T {
        T::from_usize(PAD_INDEX).unwrap()
    }

    /// The end-of-sequence index.
    pub fn eos(&self) -> T {
        T::from_usize(EOS_INDEX).unwrap()
    }

    /// The unknown-word index.
    pub fn unk(&self) -> T {
        T::from_usize(UNK_INDEX).unwrap()
    }

    /// The begin-of-sequence index.
    pub fn bos(&self) -> T {
        T::from_usize(BOS_INDEX).unwrap()
    }

    /// Register a symbol occurrence.
    ///
    /// Assigns the next dense index if the symbol is new, and increments
    /// its count either way. Only used while building a dictionary.
    pub fn add(
        &mut self,
        symbol: &str,
    ) -> T {
        if let Some(&idx) = self.indices.get(symbol) {
            self.entries[idx.to_usize().unwrap()].1 += 1;
            idx
        } else {
            self.push_entry(symbol, 1)
        }
    }

    /// Resolve a symbol to its index.
    ///
    /// Unseen symbols resolve to the unknown index; this never fails.
    pub fn lookup(
        &self,
        symbol: &str,
    ) -> T {
        self.indices
            .get(symbol)
            .copied()
            .unwrap_or_else(|| self.unk())
    }

    /// The index of a symbol, if present.
    pub fn index(
        &self,
        symbol: &str,
    ) -> Option<T> {
        self.indices.get(symbol).copied()
    }

    /// The symbol at an index, if in range.
    pub fn symbol(
        &self,
        index: T,
    ) -> Option<&str> {
        let i = index.to_usize()?;
        self.entries.get(i).map(|(symbol, _)| symbol.as_str())
    }

    /// The occurrence count of a symbol, if present.
    pub fn count(
        &self,
        symbol: &str,
    ) -> Option<u64> {
        let idx = self.index(symbol)?;
        Some(self.entries[idx.to_usize()?].1)
    }

    /// Iterate over the retained non-reserved ``(symbol, count)`` entries,
    /// in index order.
    pub fn iter_retained(&self) -> impl Iterator<Item = (&str, u64)> {
        self.entries
            .iter()
            .skip(RESERVED_SYMBOLS)
            .map(|(symbol, count)| (symbol.as_str(), *count))
    }

    /// Add `n` unknown-word observations to the unknown symbol's count.
    ///
    /// The only count mutation permitted after [`Self::finalize`]; it never
    /// adds new symbols.
    pub fn note_unknowns(
        &mut self,
        n: u64,
    ) {
        self.entries[UNK_INDEX].1 += n;
    }

    /// Build a dictionary by streaming a corpus file line by line.
    pub fn build_from_path<K, P>(
        path: P,
        tokenizer: &K,
    ) -> anyhow::Result<Self>
    where
        K: LineTokenizer,
        P: AsRef<Path>,
    {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening corpus {}", path.display()))?;
        let dict = Self::build_from_reader(BufReader::new(file), tokenizer)
            .with_context(|| format!("building dictionary from {}", path.display()))?;
        log::info!(
            "built dictionary from {}: {} symbols",
            path.display(),
            dict.len()
        );
        Ok(dict)
    }

    /// Build a dictionary from a line reader.
    ///
    /// A symbol's count is its occurrence count across the whole stream,
    /// not per line.
    pub fn build_from_reader<K, R>(
        reader: R,
        tokenizer: &K,
    ) -> anyhow::Result<Self>
    where
        K: LineTokenizer,
        R: BufRead,
    {
        let mut dict = Self::new();
        for line in reader.lines() {
            let line = line?;
            for word in tokenizer.split(&line) {
                dict.add(word);
            }
        }
        Ok(dict)
    }

    /// Apply the threshold and max-size retention policy, then renumber.
    ///
    /// In order:
    /// 1. drop non-reserved symbols with count below `threshold`
    ///    (0 = no threshold); dropped symbols later collapse to unknown,
    /// 2. sort the remaining non-reserved symbols by count descending,
    ///    ties broken by first-seen order,
    /// 3. if `max_size >= 0`, keep only the first `max_size` of them
    ///    (reserved symbols are exempt from the cap),
    /// 4. reassign dense indices, reserved symbols staying at ``0..4``.
    ///
    /// This finalized ordering is what gets persisted and reused; the raw
    /// construction order is not observable afterwards.
    pub fn finalize(
        &mut self,
        threshold: u64,
        max_size: isize,
    ) {
        let mut retained: Vec<(String, u64)> = self.entries.split_off(RESERVED_SYMBOLS);
        if threshold > 0 {
            retained.retain(|(_, count)| *count >= threshold);
        }
        // Stable sort: equal counts keep insertion order.
        retained.sort_by(|a, b| b.1.cmp(&a.1));
        if max_size >= 0 {
            retained.truncate(max_size as usize);
        }
        self.entries.extend(retained);

        self.indices.clear();
        for (i, (symbol, _)) in self.entries.iter().enumerate() {
            self.indices
                .insert(symbol.clone(), T::from_usize(i).unwrap());
        }
    }

    /// Load a dictionary from a persisted ``"<symbol> <count>"`` listing.
    ///
    /// See [`io::load_dictionary_from_path`].
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        io::load_dictionary_from_path(path)
    }

    /// Save the dictionary as a ``"<symbol> <count>"`` listing.
    ///
    /// See [`io::save_dictionary_to_path`].
    pub fn save_to_path<P: AsRef<Path>>(
        &self,
        path: P,
    ) -> anyhow::Result<()> {
        io::save_dictionary_to_path(self, path)
    }

    /// Append a new entry with an explicit count, assigning the next index.
    fn push_entry(
        &mut self,
        symbol: &str,
        count: u64,
    ) -> T {
        let idx = T::from_usize(self.entries.len())
            .expect("symbol index overflows the token type");
        self.entries.push((symbol.to_string(), count));
        self.indices.insert(symbol.to_string(), idx);
        idx
    }
}
