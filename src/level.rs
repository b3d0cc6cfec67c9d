//! Levels and level sets
//!
//! A level set is an ordered chain of levels plus the set-wide rank tables.
//! Level geometry (SOL files) is loaded elsewhere; this module only keeps the
//! metadata and the progress/score state the session core mutates.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::highscores::{Candidate, RankTable, RankTier, SEED_TIMER};

/// Index of a level within its set
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LevelId(pub usize);

/// Attempt outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelStats {
    pub completed: i32,
    pub timeout: i32,
    pub fallout: i32,
}

/// Per-level rank tables
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelScores {
    /// Best completion times
    pub time: RankTable,
    /// Best completion times with the goal fully reached
    pub goal: RankTable,
    /// Most coins collected
    pub coin: RankTable,
}

impl LevelScores {
    pub fn seeded(time_limit: i32, goal: i32) -> Self {
        let timer = if time_limit > 0 { time_limit } else { SEED_TIMER };
        Self {
            time: RankTable::seeded(timer, goal),
            goal: RankTable::seeded(timer, goal),
            coin: RankTable::seeded(timer, goal),
        }
    }
}

/// Which per-level tables a result may enter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelRankRequest {
    pub time: bool,
    pub goal: bool,
    pub coin: bool,
}

/// Tiers earned by one level result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LevelRanks {
    pub time: Option<RankTier>,
    pub goal: Option<RankTier>,
    pub coin: Option<RankTier>,
}

impl LevelRanks {
    pub fn any(&self) -> bool {
        self.time.is_some() || self.goal.is_some() || self.coin.is_some()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Level {
    /// Level file path (SOL), also the key in score files
    pub file: String,
    /// Screenshot path shown in replay listings
    pub shot: String,
    /// Display name (e.g. "IV")
    pub name: String,
    /// Level revision; scores are only kept on a version match
    pub version: i32,
    /// Time limit in centiseconds, 0 for untimed
    pub time: i32,
    /// Coins required to open the goal, 0 for always open
    pub goal: i32,

    pub locked: bool,
    pub bonus: bool,
    pub master: bool,
    pub completed: bool,

    pub stats: LevelStats,
    pub scores: LevelScores,
}

impl Level {
    pub fn new(file: impl Into<String>, time: i32, goal: i32) -> Self {
        Self {
            file: file.into(),
            shot: String::new(),
            name: String::new(),
            version: 0,
            time,
            goal,
            locked: true,
            bonus: false,
            master: false,
            completed: false,
            stats: LevelStats::default(),
            scores: LevelScores::seeded(time, goal),
        }
    }

    pub fn opened(&self) -> bool {
        !self.locked
    }

    pub fn open(&mut self) {
        self.locked = false;
    }

    pub fn complete(&mut self) {
        self.completed = true;
    }

    /// Offer a completion to the per-level tables selected by `request`
    pub fn score_update(
        &mut self,
        player: &str,
        timer: i32,
        coins: i32,
        request: LevelRankRequest,
    ) -> LevelRanks {
        let candidate = Candidate::new(player, timer, coins);
        LevelRanks {
            time: request
                .time
                .then(|| self.scores.time.time_insert(candidate))
                .flatten(),
            goal: request
                .goal
                .then(|| self.scores.goal.time_insert(candidate))
                .flatten(),
            coin: request
                .coin
                .then(|| self.scores.coin.coin_insert(candidate))
                .flatten(),
        }
    }

    pub fn rename_player(&mut self, ranks: LevelRanks, player: &str) {
        if let Some(tier) = ranks.time {
            self.scores.time.rename(tier, player);
        }
        if let Some(tier) = ranks.goal {
            self.scores.goal.rename(tier, player);
        }
        if let Some(tier) = ranks.coin {
            self.scores.coin.rename(tier, player);
        }
    }
}

/// Whether a collection is an ordinary level set or the campaign
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SetKind {
    Set { id: String },
    Campaign,
}

/// Which set-wide tables a finished run may enter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetRankRequest {
    pub score: bool,
    pub times: bool,
}

/// Tiers earned in the set-wide tables
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetRanks {
    /// Coin total tier
    pub score: Option<RankTier>,
    /// Total time tier
    pub times: Option<RankTier>,
}

impl SetRanks {
    pub fn any(&self) -> bool {
        self.score.is_some() || self.times.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LevelSet {
    pub kind: SetKind,
    pub name: String,
    /// Where this set's score ledger is stored
    pub score_file: Option<PathBuf>,
    pub time_score: RankTable,
    pub coin_score: RankTable,
    pub levels: Vec<Level>,
}

impl LevelSet {
    /// New set with its first level opened
    pub fn new(kind: SetKind, levels: Vec<Level>) -> Self {
        let mut set = Self {
            kind,
            name: String::new(),
            score_file: None,
            time_score: RankTable::default(),
            coin_score: RankTable::default(),
            levels,
        };
        if let Some(first) = set.levels.first_mut() {
            first.open();
        }
        set
    }

    pub fn with_score_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.score_file = Some(path.into());
        self
    }

    /// Identifier written to the ledger's `set` line
    pub fn id(&self) -> &str {
        match &self.kind {
            SetKind::Set { id } => id,
            SetKind::Campaign => "campaign",
        }
    }

    pub fn is_campaign(&self) -> bool {
        self.kind == SetKind::Campaign
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn get(&self, id: LevelId) -> Option<&Level> {
        self.levels.get(id.0)
    }

    pub fn get_mut(&mut self, id: LevelId) -> Option<&mut Level> {
        self.levels.get_mut(id.0)
    }

    pub fn find(&self, file: &str) -> Option<LevelId> {
        self.levels.iter().position(|l| l.file == file).map(LevelId)
    }

    /// Level following `id` in the chain
    pub fn successor(&self, id: LevelId) -> Option<LevelId> {
        let next = LevelId(id.0 + 1);
        self.get(next).map(|_| next)
    }

    pub fn is_opened(&self, id: LevelId) -> bool {
        self.get(id).is_some_and(Level::opened)
    }

    pub fn open(&mut self, id: LevelId) {
        if let Some(level) = self.get_mut(id) {
            level.open();
        }
    }

    /// Next level for modes that run the chain strictly in order.
    ///
    /// Bonus and master levels after `from` are opened as they are passed.
    /// The walk stops on the first opened master level or the first ordinary
    /// level.
    pub fn next_in_sequence(&mut self, from: LevelId) -> Option<LevelId> {
        let mut next = self.successor(from);
        while let Some(id) = next {
            let level = &mut self.levels[id.0];
            if !(level.bonus || level.master) {
                break;
            }
            level.open();
            if level.master {
                break;
            }
            next = self.successor(id);
        }
        next
    }

    /// Next level for free-play modes.
    ///
    /// Master levels and still-locked bonus levels are skipped. Landing on an
    /// opened bonus or master level also opens the ordinary level after it.
    pub fn next_skipping_extras(&mut self, from: LevelId) -> Option<LevelId> {
        let mut next = self.successor(from);
        while let Some(id) = next {
            let level = &self.levels[id.0];
            if !(level.master || (level.bonus && !level.opened())) {
                break;
            }
            next = self.successor(id);
        }

        if let Some(id) = next {
            let level = &self.levels[id.0];
            if (level.bonus || level.master) && level.opened() {
                if let Some(after) = self.successor(id) {
                    self.open(after);
                }
            }
        }
        next
    }

    /// Offer a finished run to the set-wide tables
    pub fn score_update(
        &mut self,
        player: &str,
        timer: i32,
        coins: i32,
        request: SetRankRequest,
    ) -> SetRanks {
        let candidate = Candidate::new(player, timer, coins);
        SetRanks {
            score: request
                .score
                .then(|| self.coin_score.coin_insert(candidate))
                .flatten(),
            times: request
                .times
                .then(|| self.time_score.time_insert(candidate))
                .flatten(),
        }
    }

    pub fn rename_player(&mut self, ranks: SetRanks, player: &str) {
        if let Some(tier) = ranks.score {
            self.coin_score.rename(tier, player);
        }
        if let Some(tier) = ranks.times {
            self.time_score.rename(tier, player);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chain(layout: &[(&str, bool, bool)]) -> LevelSet {
        let levels = layout
            .iter()
            .map(|&(file, bonus, master)| {
                let mut l = Level::new(file, 6000, 10);
                l.bonus = bonus;
                l.master = master;
                l
            })
            .collect();
        LevelSet::new(
            SetKind::Set {
                id: "easy".to_string(),
            },
            levels,
        )
    }

    #[test]
    fn test_first_level_open() {
        let set = chain(&[("a", false, false), ("b", false, false)]);
        assert!(set.is_opened(LevelId(0)));
        assert!(!set.is_opened(LevelId(1)));
    }

    #[test]
    fn test_free_play_skips_locked_bonus_and_master() {
        let mut set = chain(&[
            ("a", false, false),
            ("bonus", true, false),
            ("master", false, true),
            ("d", false, false),
        ]);
        assert_eq!(set.next_skipping_extras(LevelId(0)), Some(LevelId(3)));
    }

    #[test]
    fn test_free_play_lands_on_opened_bonus() {
        let mut set = chain(&[("a", false, false), ("bonus", true, false), ("c", false, false)]);
        set.open(LevelId(1));
        assert_eq!(set.next_skipping_extras(LevelId(0)), Some(LevelId(1)));
        assert!(set.is_opened(LevelId(2)));
    }

    #[test]
    fn test_sequence_opens_bonus_and_stops_at_master() {
        let mut set = chain(&[
            ("a", false, false),
            ("bonus", true, false),
            ("master", false, true),
            ("d", false, false),
        ]);
        assert_eq!(set.next_in_sequence(LevelId(0)), Some(LevelId(2)));
        assert!(set.is_opened(LevelId(1)));
        assert!(set.is_opened(LevelId(2)));
        assert!(!set.is_opened(LevelId(3)));
    }

    #[test]
    fn test_last_level_has_no_next() {
        let mut set = chain(&[("a", false, false), ("bonus", true, false)]);
        assert_eq!(set.next_skipping_extras(LevelId(0)), None);
    }

    #[test]
    fn test_level_goal_table_only_when_requested() {
        let mut level = Level::new("a", 6000, 10);
        let ranks = level.score_update(
            "ann",
            4000,
            12,
            LevelRankRequest {
                time: true,
                goal: false,
                coin: true,
            },
        );
        assert_eq!(ranks.time, Some(RankTier::Hard));
        assert_eq!(ranks.goal, None);
        assert_eq!(ranks.coin, Some(RankTier::Hard));
        assert_eq!(level.scores.goal.entry(RankTier::Hard).player, "Hard");
    }

    #[test]
    fn test_set_update_and_rename() {
        let mut set = chain(&[("a", false, false)]);
        let ranks = set.score_update(
            "anon",
            90_000,
            150,
            SetRankRequest {
                score: true,
                times: true,
            },
        );
        assert_eq!(ranks.score, Some(RankTier::Hard));
        assert_eq!(ranks.times, Some(RankTier::Hard));

        set.rename_player(ranks, "Ann");
        assert_eq!(set.coin_score.entry(RankTier::Hard).player, "Ann");
        assert_eq!(set.time_score.entry(RankTier::Hard).player, "Ann");
        assert_eq!(set.time_score.entry(RankTier::Medium).player, "Hard");
    }
}
