//! Line-oriented score ledger file
//!
//! ```text
//! version 3
//! set easy
//! 359999 0 Hard          <- set time table, three tiers
//! ...                    <- set coin table
//! level 2 1 map-easy/01.sol
//! stats 4 1 7
//! ...                    <- level time, goal and coin tables
//! ```
//!
//! The campaign file uses `version 2` and a bare `campaign` line instead of
//! `set <id>`. Files written before stats tracking lack the `stats` line and
//! still load.

use std::fmt::Write as _;
use std::fs;
use std::iter::Peekable;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::highscores::{RANK_TIERS, RankEntry, RankTable, RankTier};
use crate::level::{Level, LevelSet, LevelStats, SetKind};

/// Version written for ordinary level sets
pub const SET_SCORE_VERSION: u32 = 3;
/// Version written for the campaign
pub const CAMPAIGN_SCORE_VERSION: u32 = 2;

pub const LEVEL_LOCKED: i32 = 0x01;
pub const LEVEL_COMPLETED: i32 = 0x02;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("level set {set:?} has no score file")]
    NoScoreFile { set: String },
    #[error("score file i/o failed at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Summary of a ledger load
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// File format version, 1 for the unversioned legacy layout
    pub version: u32,
    /// Whether every level record matched the loaded set
    pub matched: bool,
}

/// Write the ledger to the set's score file
pub fn store(set: &LevelSet) -> Result<(), LedgerError> {
    let path = set.score_file.as_deref().ok_or_else(|| LedgerError::NoScoreFile {
        set: set.id().to_string(),
    })?;
    store_to(set, path)
}

pub fn store_to(set: &LevelSet, path: &Path) -> Result<(), LedgerError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|source| LedgerError::Io {
            path: dir.to_path_buf(),
            source,
        })?;
    }
    fs::write(path, render(set)).map_err(|source| LedgerError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("Score ledger stored to {}", path.display());
    Ok(())
}

/// Load the set's score file into `set`. A missing file is not an error.
pub fn load(set: &mut LevelSet) -> Result<Option<LoadReport>, LedgerError> {
    let Some(path) = set.score_file.clone() else {
        return Err(LedgerError::NoScoreFile {
            set: set.id().to_string(),
        });
    };
    match fs::read_to_string(&path) {
        Ok(text) => Ok(parse(set, &text)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            log::info!("No score file at {}, starting fresh", path.display());
            Ok(None)
        }
        Err(source) => Err(LedgerError::Io { path, source }),
    }
}

pub fn render(set: &LevelSet) -> String {
    let mut out = String::new();

    match &set.kind {
        SetKind::Set { id } => {
            let _ = writeln!(out, "version {SET_SCORE_VERSION}\nset {id}");
        }
        SetKind::Campaign => {
            let _ = writeln!(out, "version {CAMPAIGN_SCORE_VERSION}\ncampaign");
        }
    }

    put_table(&mut out, &set.time_score);
    put_table(&mut out, &set.coin_score);

    for level in &set.levels {
        let mut flags = 0;
        if level.locked {
            flags |= LEVEL_LOCKED;
        }
        if level.completed {
            flags |= LEVEL_COMPLETED;
        }

        let _ = writeln!(out, "level {} {} {}", flags, level.version, level.file);
        let _ = writeln!(
            out,
            "stats {} {} {}",
            level.stats.completed, level.stats.timeout, level.stats.fallout
        );

        put_table(&mut out, &level.scores.time);
        put_table(&mut out, &level.scores.goal);
        put_table(&mut out, &level.scores.coin);
    }

    out
}

/// Apply ledger text onto `set`. Returns `None` for an empty file.
pub fn parse(set: &mut LevelSet, text: &str) -> Option<LoadReport> {
    let mut lines = text.lines().peekable();
    let first = lines.next()?;

    let version = first
        .strip_prefix("version ")
        .and_then(|v| v.trim().parse::<u32>().ok());

    let report = match version {
        Some(version) => {
            let matched = parse_versioned(set, &mut lines);
            LoadReport { version, matched }
        }
        None => {
            parse_legacy(set, first, &mut lines);
            LoadReport {
                version: 1,
                matched: true,
            }
        }
    };

    if !report.matched {
        log::warn!(
            "Score file for {:?} does not match its level set, set records ignored",
            set.id()
        );
    }
    Some(report)
}

fn parse_versioned<'a, I>(set: &mut LevelSet, lines: &mut Peekable<I>) -> bool
where
    I: Iterator<Item = &'a str>,
{
    let mut set_tables: Option<(RankTable, RankTable)> = None;
    let mut matched = true;

    while let Some(line) = lines.next() {
        if line.starts_with("rewarded ") {
            continue;
        }

        if line.starts_with("set ") || line == "campaign" {
            let time = get_table(lines);
            let coin = get_table(lines);
            if let (Some(time), Some(coin)) = (time, coin) {
                set_tables = Some((time, coin));
            }
            continue;
        }

        let Some((flags, version, file)) = parse_level_line(line) else {
            continue;
        };

        let Some(id) = set.find(file) else {
            matched = false;
            continue;
        };

        let stats = get_stats(lines);
        let level = &mut set.levels[id.0];
        level.stats = stats;

        // The locked flag is always taken from the file
        level.locked = flags & LEVEL_LOCKED != 0;

        if version == level.version {
            level.completed = flags & LEVEL_COMPLETED != 0;
            read_level_tables(level, lines);
        } else {
            matched = false;
        }
    }

    if matched {
        if let Some((time, coin)) = set_tables {
            set.time_score = time;
            set.coin_score = coin;
        }
    }
    matched
}

fn parse_legacy<'a, I>(set: &mut LevelSet, states: &str, lines: &mut Peekable<I>)
where
    I: Iterator<Item = &'a str>,
{
    let count = states.len().min(set.levels.len());

    for (level, state) in set.levels.iter_mut().zip(states.bytes()).take(count) {
        level.locked = state == b'L';
        level.completed = state == b'C';
    }

    if let Some(table) = get_table(lines) {
        set.time_score = table;
    }
    if let Some(table) = get_table(lines) {
        set.coin_score = table;
    }

    for level in set.levels.iter_mut().take(count) {
        read_level_tables(level, lines);
    }
}

fn read_level_tables<'a, I>(level: &mut Level, lines: &mut Peekable<I>)
where
    I: Iterator<Item = &'a str>,
{
    if let Some(table) = get_table(lines) {
        level.scores.time = table;
    }
    if let Some(table) = get_table(lines) {
        level.scores.goal = table;
    }
    if let Some(table) = get_table(lines) {
        level.scores.coin = table;
    }
}

/// `level <flags> <version> <file>`
fn parse_level_line(line: &str) -> Option<(i32, i32, &str)> {
    let rest = line.strip_prefix("level ")?;
    let (flags, rest) = split_int(rest)?;
    let (version, rest) = split_int(rest)?;
    Some((flags, version, rest.trim_start()))
}

/// Optional `stats` line. Anything else is left for the caller.
fn get_stats<'a, I>(lines: &mut Peekable<I>) -> LevelStats
where
    I: Iterator<Item = &'a str>,
{
    let parsed = lines.peek().and_then(|line| {
        let rest = line.strip_prefix("stats ")?;
        let (completed, rest) = split_int(rest)?;
        let (timeout, rest) = split_int(rest)?;
        let (fallout, _) = split_int(rest)?;
        Some(LevelStats {
            completed,
            timeout,
            fallout,
        })
    });

    match parsed {
        Some(stats) => {
            lines.next();
            stats
        }
        None => LevelStats::default(),
    }
}

fn put_table(out: &mut String, table: &RankTable) {
    for entry in table.entries() {
        let _ = writeln!(out, "{} {} {}", entry.timer, entry.coins, entry.player);
    }
}

fn get_table<'a, I>(lines: &mut Peekable<I>) -> Option<RankTable>
where
    I: Iterator<Item = &'a str>,
{
    let mut entries: Vec<RankEntry> = Vec::with_capacity(RANK_TIERS);
    for _ in RankTier::ALL {
        let line = lines.next()?;
        entries.push(parse_entry(line)?);
    }
    let entries: [RankEntry; RANK_TIERS] = entries.try_into().ok()?;
    Some(RankTable::from_entries(entries))
}

/// `<timer> <coins> <player name...>`
fn parse_entry(line: &str) -> Option<RankEntry> {
    let (timer, rest) = split_int(line)?;
    let (coins, rest) = split_int(rest)?;
    Some(RankEntry {
        player: rest.trim().to_string(),
        timer,
        coins,
    })
}

/// Leading integer (after whitespace) and the remainder
fn split_int(s: &str) -> Option<(i32, &str)> {
    let s = s.trim_start();
    let end = s
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '-' || c == '+'))))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let value = s[..end].parse().ok()?;
    Some((value, &s[end..]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::highscores::Candidate;
    use crate::level::LevelId;

    fn sample_set() -> LevelSet {
        let mut a = Level::new("map-easy/01.sol", 6000, 10);
        a.version = 1;
        let mut b = Level::new("map-easy/02.sol", 0, 0);
        b.version = 2;
        LevelSet::new(
            SetKind::Set {
                id: "easy".to_string(),
            },
            vec![a, b],
        )
    }

    #[test]
    fn test_render_layout() {
        let set = sample_set();
        let text = render(&set);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "version 3");
        assert_eq!(lines[1], "set easy");
        assert_eq!(lines[2], "359999 0 Hard");
        assert_eq!(lines[8], "level 0 1 map-easy/01.sol");
        assert_eq!(lines[9], "stats 0 0 0");
        // 2 header + 6 set rows + 2 levels * (2 + 9)
        assert_eq!(lines.len(), 2 + 6 + 2 * 11);
    }

    #[test]
    fn test_store_and_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scores").join("easy.txt");

        let mut set = sample_set().with_score_file(&path);
        set.levels[0].complete();
        set.levels[0].stats.completed = 3;
        set.levels[1].open();
        set.levels[0]
            .scores
            .time
            .time_insert(Candidate::new("Ann Lee", 1234, 7));
        set.coin_score.coin_insert(Candidate::new("Bo", 9000, 77));
        store(&set).unwrap();

        let mut fresh = sample_set().with_score_file(&path);
        let report = load(&mut fresh).unwrap().unwrap();
        assert_eq!(report, LoadReport { version: 3, matched: true });
        assert_eq!(fresh.levels, set.levels);
        assert_eq!(fresh.coin_score, set.coin_score);
        assert_eq!(
            fresh.levels[0].scores.time.entry(RankTier::Hard).player,
            "Ann Lee"
        );
    }

    #[test]
    fn test_missing_stats_line_tolerated() {
        let mut set = sample_set();
        let mut text = String::from("version 2\nset easy\n");
        for _ in 0..6 {
            text.push_str("359999 0 x\n");
        }
        text.push_str("level 2 1 map-easy/01.sol\n");
        text.push_str("100 5 fast\n200 5 mid\n300 5 slow\n");
        for _ in 0..6 {
            text.push_str("6000 10 y\n");
        }

        let report = parse(&mut set, &text).unwrap();
        assert_eq!(report.version, 2);
        let level = &set.levels[0];
        assert_eq!(level.stats, LevelStats::default());
        assert!(level.completed);
        assert!(!level.locked);
        assert_eq!(level.scores.time.entry(RankTier::Hard).timer, 100);
        assert_eq!(level.scores.time.entry(RankTier::Easy).player, "slow");
    }

    #[test]
    fn test_version_mismatch_keeps_only_lock_flag() {
        let mut set = sample_set();
        set.levels[0].scores.time.time_insert(Candidate::new("kept", 10, 1));
        let text = "version 3\nset easy\n\
                    1 1 a\n1 1 a\n1 1 a\n1 1 a\n1 1 a\n1 1 a\n\
                    level 3 99 map-easy/01.sol\nstats 1 2 3\n";

        let report = parse(&mut set, text).unwrap();
        assert!(!report.matched);
        let level = &set.levels[0];
        assert!(level.locked);
        assert!(!level.completed);
        assert_eq!(level.stats.fallout, 3);
        assert_eq!(level.scores.time.entry(RankTier::Hard).player, "kept");
        // Set tables are not taken from a mismatched file
        assert_eq!(set.time_score.entry(RankTier::Hard).player, "Hard");
    }

    #[test]
    fn test_legacy_layout() {
        let mut set = sample_set();
        let mut text = String::from("CL\n");
        for i in 0..(6 + 2 * 9) {
            text.push_str(&format!("{} 0 p{}\n", 100 + i, i));
        }

        let report = parse(&mut set, &text).unwrap();
        assert_eq!(report.version, 1);
        assert!(set.levels[0].completed);
        assert!(set.levels[1].locked);
        assert_eq!(set.time_score.entry(RankTier::Hard).player, "p0");
        assert_eq!(set.levels[1].scores.coin.entry(RankTier::Easy).player, "p23");
    }

    #[test]
    fn test_campaign_header() {
        let set = LevelSet::new(SetKind::Campaign, vec![Level::new("c/01.sol", 0, 0)]);
        assert!(render(&set).starts_with("version 2\ncampaign\n"));

        let mut loaded = LevelSet::new(SetKind::Campaign, vec![Level::new("c/01.sol", 0, 0)]);
        assert!(parse(&mut loaded, &render(&set)).unwrap().matched);
        assert_eq!(loaded.find("c/01.sol"), Some(LevelId(0)));
    }

    #[test]
    fn test_missing_file_is_fresh_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut set = sample_set().with_score_file(dir.path().join("none.txt"));
        assert_eq!(load(&mut set).unwrap(), None);
    }

    #[test]
    fn test_store_without_path() {
        assert!(matches!(
            store(&sample_set()),
            Err(LedgerError::NoScoreFile { .. })
        ));
    }
}
