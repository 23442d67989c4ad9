//! Exit-slot identity and labeling.
//!
//! Exit slots are the addressable endpoints rules are wired from. A slot is
//! identified by its finish position, qualified by a pool index for pool
//! phases. Identity strings are stable and parseable; labels are for humans.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::phase::Phase;

/// An exit slot on a phase: a finish position, optionally within a pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExitSlot {
    /// Pool the slot belongs to; `None` for non-pool phases.
    pub pool: Option<u32>,
    /// Finish position (1-based; within the pool for pool phases).
    pub rank: u32,
}

impl ExitSlot {
    /// Create an exit slot.
    pub fn new(pool: Option<u32>, rank: u32) -> Self {
        Self { pool, rank }
    }

    /// A slot on a non-pool phase.
    pub fn ranked(rank: u32) -> Self {
        Self { pool: None, rank }
    }

    /// A slot within a pool.
    pub fn pooled(pool: u32, rank: u32) -> Self {
        Self { pool: Some(pool), rank }
    }

    /// Stable identity string: `"{rank}"` or `"{pool}-{rank}"`.
    pub fn id(&self) -> String {
        match self.pool {
            Some(pool) => format!("{}-{}", pool, self.rank),
            None => self.rank.to_string(),
        }
    }

    /// Parse a slot from its identity string.
    pub fn parse(id: &str) -> Option<Self> {
        match id.split_once('-') {
            Some((pool, rank)) => Some(Self::pooled(pool.parse().ok()?, rank.parse().ok()?)),
            None => Some(Self::ranked(id.parse().ok()?)),
        }
    }

    /// Human-readable label in the context of its source phase.
    ///
    /// Pool slots render as letter+rank ("A1" for pool 0 rank 1). Bracket
    /// rounds that expose loser exits render "W{match}" for the winner range
    /// and "L{match}" for the loser range. Everything else is the bare rank.
    pub fn label(&self, source: &Phase) -> String {
        if let Some(pool) = self.pool {
            return format!("{}{}", pool_letter(pool), self.rank);
        }
        if source.exposes_loser_exits() {
            let matches = source.match_count();
            if matches > 0 {
                if self.rank <= matches {
                    return format!("W{}", self.rank);
                }
                if self.rank <= matches * 2 {
                    return format!("L{}", self.rank - matches);
                }
            }
        }
        self.rank.to_string()
    }
}

impl fmt::Display for ExitSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Spreadsheet-style pool letters: 0 = "A", 25 = "Z", 26 = "AA".
pub fn pool_letter(pool: u32) -> String {
    let mut n = pool as i64;
    let mut letters = Vec::new();
    loop {
        letters.push((b'A' + (n % 26) as u8) as char);
        n = n / 26 - 1;
        if n < 0 {
            break;
        }
    }
    letters.iter().rev().collect()
}
