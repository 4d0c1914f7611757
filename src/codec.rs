//! Key validation and key-to-number conversion.
//!
//! Every hash-backed structure turns its textual keys into a `u128` through a
//! [`KeyCodec`]. The conversion is pure and deterministic, and it is chosen
//! per structure through [`KeyEncoding`].
//!
//! The weighted scheme grows by three decimal digits per character, so a
//! codec refuses key lengths whose value could not be held at all.

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, KeyError};

/// Weight applied per character by [`KeyEncoding::Weighted`].
const CHAR_WEIGHT: u128 = 1000;

/// Longest key the weighted scheme can hold in a `u128`.
pub const MAX_WEIGHTED_LEN: usize = 12;

/// How a key's numeric value `k` is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeyEncoding {
    /// All-digit keys are read as decimal integers ("015" -> 15); anything
    /// else falls back to [`KeyEncoding::Weighted`].
    #[default]
    Literal,
    /// `k = k * 1000 + code(c)` for each character, so "AB3" -> 65066051.
    Weighted,
    /// Plain sum of character codes.
    CodeSum,
}

impl KeyEncoding {
    /// Longest key this encoding can convert, `None` when unbounded.
    pub fn max_key_len(self) -> Option<usize> {
        match self {
            // Literal falls back to the weighted scheme for non-digit keys.
            KeyEncoding::Literal | KeyEncoding::Weighted => Some(MAX_WEIGHTED_LEN),
            KeyEncoding::CodeSum => None,
        }
    }
}

/// Where TRUNCATION and FOLDING read their digits from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DigitSource {
    /// Decimal digits of the key's numeric value.
    #[default]
    Numeric,
    /// The key characters themselves; they must all be digits.
    RawKey,
}

/// Validates fixed-length keys and converts them to numbers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyCodec {
    key_len: usize,
    encoding: KeyEncoding,
}

impl KeyCodec {
    pub fn new(key_len: usize, encoding: KeyEncoding) -> Self {
        Self { key_len, encoding }
    }

    /// Rejects a zero key length and lengths the encoding cannot convert.
    pub fn check(&self) -> Result<(), ConfigError> {
        if self.key_len == 0 {
            return Err(ConfigError::InvalidKeyLength);
        }
        match self.encoding.max_key_len() {
            Some(max) if self.key_len > max => Err(ConfigError::KeyTooLong {
                key_len: self.key_len,
                max,
                encoding: self.encoding,
            }),
            _ => Ok(()),
        }
    }

    #[inline]
    pub fn key_len(&self) -> usize {
        self.key_len
    }

    #[inline]
    pub fn encoding(&self) -> KeyEncoding {
        self.encoding
    }

    /// Rejects empty keys and keys whose character count differs from the
    /// configured length.
    pub fn validate(&self, key: &str) -> Result<(), KeyError> {
        validate(key, self.key_len)
    }

    /// The numeric value `k` of `key` under this codec's encoding.
    pub fn numeric_value(&self, key: &str) -> Result<u128, KeyError> {
        numeric_value(key, self.encoding)
    }

    /// Decimal digit string used by TRUNCATION and FOLDING.
    pub fn digits(&self, key: &str, source: DigitSource) -> Result<String, KeyError> {
        match source {
            DigitSource::Numeric => Ok(self.numeric_value(key)?.to_string()),
            DigitSource::RawKey => {
                if key.is_empty() {
                    return Err(KeyError::Empty);
                }
                if !is_all_digits(key) {
                    return Err(KeyError::NotDigits(key.to_owned()));
                }
                Ok(key.to_owned())
            }
        }
    }
}

/// Checks that `key` is non-empty and exactly `expected` characters long.
pub fn validate(key: &str, expected: usize) -> Result<(), KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    let actual = key.chars().count();
    if actual != expected {
        return Err(KeyError::Length {
            key: key.to_owned(),
            expected,
            actual,
        });
    }
    Ok(())
}

pub fn numeric_value(key: &str, encoding: KeyEncoding) -> Result<u128, KeyError> {
    if key.is_empty() {
        return Err(KeyError::Empty);
    }
    let value = match encoding {
        KeyEncoding::Literal if is_all_digits(key) => key.bytes().try_fold(0u128, |acc, b| {
            acc.checked_mul(10)?.checked_add(u128::from(b - b'0'))
        }),
        KeyEncoding::Literal | KeyEncoding::Weighted => key.chars().try_fold(0u128, |acc, c| {
            acc.checked_mul(CHAR_WEIGHT)?.checked_add(u128::from(u32::from(c)))
        }),
        KeyEncoding::CodeSum => key
            .chars()
            .try_fold(0u128, |acc, c| acc.checked_add(u128::from(u32::from(c)))),
    };
    value.ok_or_else(|| KeyError::Overflow(key.to_owned()))
}

/// Decimal digits of `numeric_value(key, encoding)`.
pub fn digits_of(key: &str, encoding: KeyEncoding) -> Result<String, KeyError> {
    numeric_value(key, encoding).map(|k| k.to_string())
}

#[inline]
fn is_all_digits(key: &str) -> bool {
    key.bytes().all(|b| b.is_ascii_digit())
}
