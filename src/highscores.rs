//! Ranked score tables
//!
//! Each table holds three nested tiers, Hard < Medium < Easy. A harder tier's
//! record is never worse than an easier tier's on the table's ranking key.

use serde::{Deserialize, Serialize};

/// Number of ranked tiers per table
pub const RANK_TIERS: usize = 3;

/// Default timer for seeded set tables (99:59:59 in centiseconds)
pub const SEED_TIMER: i32 = 359_999;

/// Tier index within a rank table
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RankTier {
    Hard = 0,
    Medium = 1,
    Easy = 2,
}

impl RankTier {
    pub const ALL: [RankTier; RANK_TIERS] = [RankTier::Hard, RankTier::Medium, RankTier::Easy];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(i: usize) -> Option<Self> {
        Self::ALL.get(i).copied()
    }

    /// Placeholder player name used for seeded tables
    pub fn seed_name(self) -> &'static str {
        match self {
            RankTier::Hard => "Hard",
            RankTier::Medium => "Medium",
            RankTier::Easy => "Easy",
        }
    }
}

/// Which key orders a table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RankKind {
    /// Lower timer is better, more coins breaks ties
    Time,
    /// More coins is better, lower timer breaks ties
    Coin,
}

/// One ranked record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankEntry {
    pub player: String,
    /// Time in centiseconds
    pub timer: i32,
    pub coins: i32,
}

/// Result offered for ranking
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate<'a> {
    pub player: &'a str,
    pub timer: i32,
    pub coins: i32,
}

impl<'a> Candidate<'a> {
    pub fn new(player: &'a str, timer: i32, coins: i32) -> Self {
        Self {
            player,
            timer,
            coins,
        }
    }

    /// Whether this candidate strictly beats `entry` under `kind`.
    /// Equal results never beat, so the earlier record keeps its tier.
    pub fn beats(&self, entry: &RankEntry, kind: RankKind) -> bool {
        match kind {
            RankKind::Time => {
                self.timer < entry.timer || (self.timer == entry.timer && self.coins > entry.coins)
            }
            RankKind::Coin => {
                self.coins > entry.coins || (self.coins == entry.coins && self.timer < entry.timer)
            }
        }
    }
}

/// Three-tier ranked table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankTable {
    entries: [RankEntry; RANK_TIERS],
}

impl Default for RankTable {
    fn default() -> Self {
        Self::seeded(SEED_TIMER, 0)
    }
}

impl RankTable {
    /// Table whose every tier holds the same placeholder record
    pub fn seeded(timer: i32, coins: i32) -> Self {
        Self {
            entries: RankTier::ALL.map(|tier| RankEntry {
                player: tier.seed_name().to_string(),
                timer,
                coins,
            }),
        }
    }

    pub fn from_entries(entries: [RankEntry; RANK_TIERS]) -> Self {
        Self { entries }
    }

    pub fn entry(&self, tier: RankTier) -> &RankEntry {
        &self.entries[tier.index()]
    }

    pub fn entries(&self) -> &[RankEntry; RANK_TIERS] {
        &self.entries
    }

    /// Insert a candidate ranked by `kind`.
    ///
    /// The candidate takes the best tier it beats; records below it shift down
    /// one tier and the old Easy record is dropped. Returns the tier taken, or
    /// `None` when the candidate beats nothing.
    pub fn insert(&mut self, kind: RankKind, candidate: Candidate<'_>) -> Option<RankTier> {
        let pos = self
            .entries
            .iter()
            .position(|entry| candidate.beats(entry, kind))?;

        let new_entry = RankEntry {
            player: candidate.player.to_string(),
            timer: candidate.timer,
            coins: candidate.coins,
        };

        // Cascade: Easy is overwritten, everything from `pos` moves down
        self.entries[pos..].rotate_right(1);
        self.entries[pos] = new_entry;

        RankTier::from_index(pos)
    }

    pub fn time_insert(&mut self, candidate: Candidate<'_>) -> Option<RankTier> {
        self.insert(RankKind::Time, candidate)
    }

    pub fn coin_insert(&mut self, candidate: Candidate<'_>) -> Option<RankTier> {
        self.insert(RankKind::Coin, candidate)
    }

    /// Replace the player name on a previously earned tier
    pub fn rename(&mut self, tier: RankTier, player: &str) {
        self.entries[tier.index()].player = player.to_string();
    }

    /// Whether the tiers are nested on `kind`'s ranking key
    pub fn is_nested(&self, kind: RankKind) -> bool {
        self.entries.windows(2).all(|pair| match kind {
            RankKind::Time => pair[0].timer <= pair[1].timer,
            RankKind::Coin => pair[0].coins >= pair[1].coins,
        })
    }
}
