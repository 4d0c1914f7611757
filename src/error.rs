//! Error types shared by every structure in the crate.
//!
//! Construction problems are [`ConfigError`]s and leave nothing behind.
//! Operation problems are [`CoreError`]s; a failed operation never mutates
//! the structure it was called on, so the caller can fix the input and retry.

use thiserror::Error;

use crate::codec::KeyEncoding;

/// A structure could not be built from the given parameters.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("table size must be greater than 0")]
    InvalidTableSize,

    #[error("key length must be greater than 0")]
    InvalidKeyLength,

    #[error("key length {key_len} exceeds the {max} character(s) a {encoding:?} key can hold")]
    KeyTooLong {
        key_len: usize,
        max: usize,
        encoding: KeyEncoding,
    },

    #[error("bits per level must be between 1 and 5, got {0}")]
    BitsPerLevel(u32),

    #[error("fold group size must be greater than 0")]
    FoldGroupSize,

    #[error("truncation needs at least one digit position")]
    NoTruncationPositions,
}

/// Why a key was rejected before touching any structure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("key must not be empty")]
    Empty,

    #[error("key '{key}' must have exactly {expected} character(s), it has {actual}")]
    Length {
        key: String,
        expected: usize,
        actual: usize,
    },

    #[error("trees take a single letter at a time, got '{0}'")]
    NotSingleLetter(String),

    #[error("trees only accept letters a-z, got '{0}'")]
    NotALetter(char),

    #[error("key '{0}' must contain only decimal digits")]
    NotDigits(String),

    #[error("numeric value of key '{0}' does not fit in 128 bits")]
    Overflow(String),
}

/// An insert, search or delete could not be carried out.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error(transparent)]
    InvalidKey(#[from] KeyError),

    #[error("key '{0}' is already present")]
    DuplicateKey(String),

    #[error("table is full, capacity {capacity}")]
    TableFull { capacity: usize },

    #[error("no free node left on the path of key '{0}'")]
    CapacityExceeded(String),

    #[error("key '{0}' does not exist")]
    NotFound(String),

    #[error("truncation position {position} is outside the {digits} digit(s) of key '{key}'")]
    InvalidPosition {
        key: String,
        position: u32,
        digits: usize,
    },

    #[error("no truncation position is valid for key '{key}', which has {digits} digit(s)")]
    NoValidPositions { key: String, digits: usize },
}

impl CoreError {
    /// True for the "key absent" outcome of a search or delete.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CoreError::NotFound(_))
    }
}
