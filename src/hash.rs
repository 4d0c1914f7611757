//! Hash functions mapping a key to a 1-based base position in `[1, n]`.
//!
//! All four strategies end with the MOD formula `H(x) = (x mod n) + 1`.
//! TRUNCATION and FOLDING reduce modulo `n` while they accumulate digits, so
//! keys with many digits never overflow the intermediate arithmetic.

use serde::{Deserialize, Serialize};

use crate::codec::{DigitSource, KeyCodec};
use crate::error::{ConfigError, CoreError};

/// SQUARE reduces `k` below this bound before squaring.
const SQUARE_REDUCTION: u128 = 1_000_000;

/// Default FOLDING group width, in digits.
pub const DEFAULT_FOLD_GROUP: usize = 2;

/// How FOLDING combines its digit groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FoldCombine {
    #[default]
    Sum,
    /// Groups are multiplied; an all-zero group counts as 1.
    Product,
}

/// Where FOLDING puts the short group when the digit count is not a
/// multiple of the group width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FoldTail {
    /// Groups are cut left to right; the short group is the last one.
    #[default]
    Trailing,
    /// The short group sits in the middle, after `floor(full / 2)` full groups.
    Centered,
}

/// What TRUNCATION does with a position outside the key's digits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TruncationPolicy {
    /// Skip it; fail only when no position is usable.
    #[default]
    Lenient,
    /// Fail on the first out-of-range position.
    Strict,
}

/// A hash function, independent of the table size.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum HashStrategy {
    /// `H(k) = (k mod n) + 1`
    #[default]
    Mod,
    /// `H(k) = ((k mod 10^6)^2 mod n) + 1`
    Square,
    /// Concatenate the digits at the given 1-based positions, then MOD.
    Truncation {
        positions: Vec<u32>,
        source: DigitSource,
        policy: TruncationPolicy,
    },
    /// Split the digits into groups, combine them, then MOD.
    Folding {
        group: usize,
        combine: FoldCombine,
        tail: FoldTail,
        source: DigitSource,
    },
}

impl HashStrategy {
    /// TRUNCATION over the numeric digits, skipping out-of-range positions.
    pub fn truncation(positions: impl Into<Vec<u32>>) -> Self {
        HashStrategy::Truncation {
            positions: positions.into(),
            source: DigitSource::Numeric,
            policy: TruncationPolicy::Lenient,
        }
    }

    /// FOLDING in groups of two numeric digits, short group last.
    pub fn folding(combine: FoldCombine) -> Self {
        HashStrategy::Folding {
            group: DEFAULT_FOLD_GROUP,
            combine,
            tail: FoldTail::Trailing,
            source: DigitSource::Numeric,
        }
    }

    fn check(&self) -> Result<(), ConfigError> {
        match self {
            HashStrategy::Truncation { positions, .. } if positions.is_empty() => {
                Err(ConfigError::NoTruncationPositions)
            }
            HashStrategy::Folding { group: 0, .. } => Err(ConfigError::FoldGroupSize),
            _ => Ok(()),
        }
    }
}

/// A [`HashStrategy`] bound to a table of `n` slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HashFunction {
    strategy: HashStrategy,
    n: usize,
}

impl HashFunction {
    pub fn new(strategy: HashStrategy, n: usize) -> Result<Self, ConfigError> {
        if n == 0 {
            return Err(ConfigError::InvalidTableSize);
        }
        strategy.check()?;
        Ok(Self { strategy, n })
    }

    #[inline]
    pub fn table_size(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn strategy(&self) -> &HashStrategy {
        &self.strategy
    }

    /// Base position of `key`, 1-based.
    pub fn position(&self, codec: &KeyCodec, key: &str) -> Result<usize, CoreError> {
        let n = self.n as u64;
        let reduced = match &self.strategy {
            HashStrategy::Mod => (codec.numeric_value(key)? % u128::from(n)) as u64,
            HashStrategy::Square => {
                let k = codec.numeric_value(key)? % SQUARE_REDUCTION;
                ((k * k) % u128::from(n)) as u64
            }
            HashStrategy::Truncation {
                positions,
                source,
                policy,
            } => {
                let digits = codec.digits(key, *source)?;
                truncate(key, &digits, positions, *policy, n)?
            }
            HashStrategy::Folding {
                group,
                combine,
                tail,
                source,
            } => {
                let digits = codec.digits(key, *source)?;
                fold(&digits, *group, *combine, *tail, n)
            }
        };
        Ok(reduced as usize + 1)
    }
}

/// Decimal digits folded into a value modulo `n`.
fn digits_mod(digits: &[u8], n: u64) -> u64 {
    let n = u128::from(n);
    let acc = digits
        .iter()
        .fold(0u128, |acc, d| (acc * 10 + u128::from(d - b'0')) % n);
    acc as u64
}

fn truncate(
    key: &str,
    digits: &str,
    positions: &[u32],
    policy: TruncationPolicy,
    n: u64,
) -> Result<u64, CoreError> {
    let bytes = digits.as_bytes();
    let mut picked = Vec::with_capacity(positions.len());
    for &position in positions {
        match (position as usize).checked_sub(1).and_then(|i| bytes.get(i)) {
            Some(&d) => picked.push(d),
            None if policy == TruncationPolicy::Strict => {
                return Err(CoreError::InvalidPosition {
                    key: key.to_owned(),
                    position,
                    digits: bytes.len(),
                });
            }
            None => {}
        }
    }
    if picked.is_empty() {
        return Err(CoreError::NoValidPositions {
            key: key.to_owned(),
            digits: bytes.len(),
        });
    }
    Ok(digits_mod(&picked, n))
}

/// Cuts `digits` into groups of `size` according to `tail`.
pub(crate) fn fold_groups(digits: &str, size: usize, tail: FoldTail) -> Vec<&[u8]> {
    let bytes = digits.as_bytes();
    let full = bytes.len() / size;
    let rem = bytes.len() % size;
    if rem == 0 || tail == FoldTail::Trailing {
        return bytes.chunks(size).collect();
    }
    let (left, rest) = bytes.split_at((full / 2) * size);
    let (middle, right) = rest.split_at(rem);
    left.chunks(size)
        .chain(std::iter::once(middle))
        .chain(right.chunks(size))
        .collect()
}

fn fold(digits: &str, size: usize, combine: FoldCombine, tail: FoldTail, n: u64) -> u64 {
    let wide = u128::from(n);
    let groups = fold_groups(digits, size, tail);
    let acc = match combine {
        FoldCombine::Sum => groups
            .iter()
            .fold(0u128, |acc, g| (acc + u128::from(digits_mod(g, n))) % wide),
        FoldCombine::Product => groups.iter().fold(1u128 % wide, |acc, g| {
            let factor = if g.iter().all(|&d| d == b'0') {
                1 % wide
            } else {
                u128::from(digits_mod(g, n))
            };
            (acc * factor) % wide
        }),
    };
    acc as u64
}
