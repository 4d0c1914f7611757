//! Collision resolution for open addressing.
//!
//! A [`ProbeSequence`] yields the 0-based slots visited for one key, starting
//! at the base slot (`attempt 0`) and stopping after `n` attempts. Sequences
//! are obtained from [`OpenAddressingTable::probe_sequence`], which only
//! hands out bases inside the table.
//!
//! [`OpenAddressingTable::probe_sequence`]: crate::OpenAddressingTable::probe_sequence

use serde::{Deserialize, Serialize};

/// How the next candidate slot is chosen after a collision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ProbePolicy {
    /// Offset `i`.
    #[default]
    Linear,
    /// Offset `i * i`.
    Quadratic,
    /// Offset `i * H2(k)` with `H2(k) = 1 + (k mod (n - 1))`.
    DoubleHash,
    /// Re-apply the MOD formula to the previous position: `D' = ((D + 1) mod n) + 1`.
    Rehash,
}

/// `H2(k) = 1 + (k mod (n - 1))`; never zero. A single-slot table uses a
/// divisor of 1.
pub fn secondary_step(k: u128, n: usize) -> usize {
    let divisor = n.saturating_sub(1).max(1) as u128;
    1 + (k % divisor) as usize
}

/// Real 0-based slot for base position `base` (1-based) shifted by `offset`.
#[inline]
pub(crate) fn probe(base: usize, offset: u128, n: usize) -> usize {
    ((base as u128 - 1 + offset) % n as u128) as usize
}

/// The slots visited while resolving collisions for one key.
#[derive(Debug, Clone)]
pub struct ProbeSequence {
    policy: ProbePolicy,
    base: usize,
    n: usize,
    step: usize,
    attempt: usize,
    /// Current 1-based position for [`ProbePolicy::Rehash`].
    current: usize,
}

impl ProbeSequence {
    /// `base` is the 1-based hash position in `1..=n`, `step` is `H2(k)`
    /// (ignored by every policy except [`ProbePolicy::DoubleHash`]).
    pub(crate) fn new(policy: ProbePolicy, base: usize, n: usize, step: usize) -> Self {
        debug_assert!(n > 0 && (1..=n).contains(&base));
        Self {
            policy,
            base,
            n,
            step,
            attempt: 0,
            current: base,
        }
    }

    #[inline]
    pub fn attempt(&self) -> usize {
        self.attempt
    }
}

impl Iterator for ProbeSequence {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        if self.attempt >= self.n {
            return None;
        }
        let i = self.attempt as u128;
        let slot = match self.policy {
            ProbePolicy::Linear => probe(self.base, i, self.n),
            ProbePolicy::Quadratic => probe(self.base, i * i, self.n),
            ProbePolicy::DoubleHash => probe(self.base, i * self.step as u128, self.n),
            ProbePolicy::Rehash => {
                let slot = self.current - 1;
                self.current = (self.current + 1) % self.n + 1;
                slot
            }
        };
        self.attempt += 1;
        Some(slot)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let left = self.n - self.attempt;
        (left, Some(left))
    }
}

impl ExactSizeIterator for ProbeSequence {}
