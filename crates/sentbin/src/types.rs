//! # Common Types and Traits
use core::hash::Hash;
use num_traits::{FromPrimitive, ToPrimitive, Unsigned};
use std::fmt::Debug;

/// A type that can be used as a token index in an encoded corpus.
pub trait TokenType:
    'static
    + Default
    + Debug
    + Clone
    + Copy
    + Hash
    + Send
    + Sync
    + Unsigned
    + FromPrimitive
    + ToPrimitive
    + Ord
    + serde::Serialize
    + for<'de> serde::Deserialize<'de>
{
}

impl<T> TokenType for T where
    T: 'static
        + Default
        + Debug
        + Clone
        + Copy
        + Hash
        + Send
        + Sync
        + Unsigned
        + FromPrimitive
        + ToPrimitive
        + Ord
        + serde::Serialize
        + for<'de> serde::Deserialize<'de>
{
}

/// Symbol string to T map.
pub type SymbolToTokenMap<T> = ahash::AHashMap<String, T>;

/// Co-occurrence counts: ``{ source index -> { target index -> count } }``.
pub type PairFreqMap<T> = ahash::AHashMap<T, ahash::AHashMap<T, u64>>;
