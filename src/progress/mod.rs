//! Session progress state machine
//!
//! One [`ProgressState`] owns the live session: the economy, the level
//! chain position, the rank results of the last attempt and whichever of
//! the replay recorder or player is active.
//!
//! ```text
//! Uninitialized -> init -> Initialized -> play -> Playing -> stat -> Resolved
//!                                                    ^                  |
//!                                                    +-- next / same ---+
//! Resolved -> exit -> Exited
//! ```

pub mod economy;
pub mod mode;

use std::fs;
use std::path::{Path, PathBuf};

use chrono::Utc;

pub use economy::{
    BALLS_SENTINEL, DebtOutcome, DebtPolicy, Economy, RushMeter, apply_debt_policy, reward_ball,
};
pub use mode::{Mode, ModeRules, Retry, Status};

use crate::highscores::RankTier;
use crate::level::{Level, LevelId, LevelRankRequest, LevelRanks, LevelSet, SetRankRequest, SetRanks};
use crate::persistence::ledger;
use crate::replay::{
    CAMPAIGN_SHOT, Generation, ReplayHeader, ReplayPlayer, ReplayRecorder, ReplaySpeed,
    format_replay_name,
};
use crate::settings::Settings;
use crate::sim::{Command, CommandSink};

/// Replay name every attempt is recorded under
pub const LAST_REPLAY: &str = "Last";

/// Remaining level time (centiseconds) below which the warning is on
pub const TIME_WARNING: i32 = 1000;

/// Simulation readout for one step
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SimFrame {
    /// Coins collected on this attempt
    pub coins: i32,
    /// Level clock in centiseconds: time left on timed levels, time spent
    /// on untimed ones
    pub clock: i32,
    /// Bonus time collected
    pub gained: i32,
}

/// Transitions a step produced, for the UI to react to
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepEvents {
    /// Enough coins were collected to open the goal
    pub goal_opened: bool,
    /// `Some(true)` when the low-time warning starts, `Some(false)` when it ends
    pub time_warning: Option<bool>,
}

/// Where the ball respawns after an activated checkpoint
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Respawn {
    /// Coins already held at the checkpoint
    pub coins: i32,
    /// Level timer at the checkpoint, centiseconds
    pub timer: i32,
    /// Time elapsed before the checkpoint, subtracted from the result
    pub offset: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Checkpoint {
    respawn: Respawn,
    /// Balls to restore on the next retry or advance
    balls: Option<i32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Uninitialized,
    Initialized,
    Playing,
    Resolved(Status),
    Exited,
}

/// At most one replay file is open at a time
#[derive(Debug, Default)]
enum ReplaySlot {
    #[default]
    Idle,
    Recording(ReplayRecorder),
    Playing(ReplayPlayer),
}

#[derive(Debug)]
pub struct ProgressState {
    settings: Settings,
    settings_path: Option<PathBuf>,
    set: LevelSet,

    mode: Mode,
    phase: Phase,
    replaying: bool,
    done: bool,

    curr: Economy,
    /// Economy before the current attempt, restored on a retry after a goal
    prev: Economy,

    level: Option<LevelId>,
    next: Option<LevelId>,
    status: Status,

    frame: SimFrame,
    coins: i32,
    timer: i32,
    goal: i32,
    goal_initial: i32,
    goal_enabled: bool,
    time_warning: bool,

    level_ranks: LevelRanks,
    set_ranks: SetRanks,

    extended: bool,
    extended_timer: i32,

    rush: RushMeter,
    checkpoint: Option<Checkpoint>,
    slot: ReplaySlot,

    replay_requires_update: bool,
    replay_too_old: bool,
}

impl ProgressState {
    pub fn new(settings: Settings, set: LevelSet) -> Self {
        Self {
            settings,
            settings_path: None,
            set,
            mode: Mode::None,
            phase: Phase::Uninitialized,
            replaying: false,
            done: false,
            curr: Economy::default(),
            prev: Economy::default(),
            level: None,
            next: None,
            status: Status::None,
            frame: SimFrame::default(),
            coins: 0,
            timer: 0,
            goal: 0,
            goal_initial: 0,
            goal_enabled: false,
            time_warning: false,
            level_ranks: LevelRanks::default(),
            set_ranks: SetRanks::default(),
            extended: false,
            extended_timer: 0,
            rush: RushMeter::default(),
            checkpoint: None,
            slot: ReplaySlot::Idle,
            replay_requires_update: false,
            replay_too_old: false,
        }
    }

    /// Settings changes made by the session (spent lives, goal locks) are
    /// saved to `path`
    pub fn with_settings_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.settings_path = Some(path.into());
        self
    }

    fn rules(&self) -> &'static ModeRules {
        self.mode.rules()
    }

    // === Session lifecycle ===

    /// Home room: nothing is scored or recorded
    pub fn init_home(&mut self) {
        self.close_slot();
        self.mode = Mode::None;
        self.replaying = false;
        self.curr = Economy::default();
        self.phase = Phase::Initialized;
    }

    pub fn init(&mut self, mode: Mode) {
        self.close_slot();
        self.rush.reset();
        self.mode = mode;
        self.replaying = false;

        let start = self.rules().starting_balls;
        let bought = i32::try_from(self.settings.extra_lives).unwrap_or(i32::MAX);
        let balls = if start > 0 { start.saturating_sub(bought).max(0) } else { 0 };

        self.curr = Economy::with_balls(balls);
        self.prev = self.curr;
        self.checkpoint = None;

        self.level = None;
        self.next = None;
        self.status = Status::None;
        self.set_ranks = SetRanks::default();
        self.done = false;
        self.phase = Phase::Initialized;

        log::info!("Session started in {} (balls {})", mode.label(true), self.balls());
    }

    /// Start an attempt on `id`. Fails for unknown or locked levels and
    /// outside a live session.
    pub fn play(&mut self, id: LevelId) -> bool {
        if matches!(self.phase, Phase::Uninitialized | Phase::Exited) {
            log::warn!("play() outside a live session");
            return false;
        }

        let Some(level) = self.set.get(id) else {
            return false;
        };
        if !(level.opened() || self.settings.cheat) {
            return false;
        }
        let time_limit = level.time;
        let level_goal = level.goal;
        let completed = level.completed;

        self.close_slot();

        self.time_warning = false;
        self.done = false;
        self.level = Some(id);
        self.next = None;
        self.status = Status::None;

        let respawn = self.checkpoint.map(|c| c.respawn);
        self.coins = respawn.map_or(0, |r| r.coins);
        self.timer = respawn.map_or(0, |r| r.timer);
        let offset = respawn.map_or(0, |r| r.offset);
        self.frame = SimFrame {
            coins: self.coins,
            clock: if time_limit > 0 { time_limit - offset } else { offset },
            gained: 0,
        };

        self.goal_initial = level_goal;
        self.goal = level_goal;
        self.extended = false;
        self.goal_enabled = self.compute_goal_enabled(completed);

        if self.checkpoint.is_some() {
            self.prev.balls = self.curr.balls;
        } else {
            self.prev = self.curr;
        }

        self.level_ranks = LevelRanks::default();
        self.phase = Phase::Playing;

        self.start_recording(id);
        true
    }

    fn compute_goal_enabled(&mut self, completed: bool) -> bool {
        let rules = self.rules();

        if !self.set.is_campaign() {
            return (!rules.continuous_run && completed && !self.settings.lock_goals)
                || self.goal == 0
                || rules.goal_always_open;
        }

        if self.settings.career_active() {
            let enabled = !self.settings.lock_goals || self.goal == 0;
            if enabled {
                self.goal = 0;
            }
            enabled
        } else {
            self.goal = 0;
            true
        }
    }

    fn start_recording(&mut self, id: LevelId) {
        if self.mode == Mode::None || !self.settings.record_replays {
            return;
        }
        let Some(level) = self.set.get(id) else {
            return;
        };

        let shot = if self.mode == Mode::Campaign || self.set.is_campaign() {
            CAMPAIGN_SHOT.to_string()
        } else {
            level.shot.clone()
        };
        let header = ReplayHeader {
            mode: self.mode,
            player: self.settings.player.clone(),
            date: Some(Utc::now()),
            shot,
            file: level.file.clone(),
            time_limit: level.time,
            goal: level.goal,
            score: self.curr.score,
            balls: self.balls(),
            times: self.curr.times,
            speed_percent: self.curr.speed_percent,
            ..ReplayHeader::default()
        };

        let path = self.replay_path(LAST_REPLAY);
        match ReplayRecorder::start(&path, &header) {
            Ok(recorder) => self.slot = ReplaySlot::Recording(recorder),
            Err(err) => {
                log::warn!("Replay recording disabled ({}): {}", path.display(), err);
            }
        }
    }

    /// Feed one simulation readout. Call before any `stat` it leads to.
    pub fn step(&mut self, frame: SimFrame) -> StepEvents {
        self.frame = frame;
        let mut events = StepEvents::default();

        let timed = self.current_level().is_some_and(|l| l.time != 0);
        if timed && !self.replaying {
            if frame.clock >= TIME_WARNING && self.time_warning {
                self.time_warning = false;
                events.time_warning = Some(false);
            } else if frame.clock < TIME_WARNING && !self.time_warning {
                self.time_warning = true;
                events.time_warning = Some(true);
            }
        }

        if self.goal > 0 {
            self.goal = self.goal_initial - frame.coins;
            if self.goal <= 0 {
                self.goal = 0;
                events.goal_opened = !self.replaying;
            }
        }

        events
    }

    /// Resolve the current attempt. Only the first call per attempt counts.
    pub fn stat(&mut self, status: Status) {
        if self.mode == Mode::None || self.status != Status::None || status == Status::None {
            return;
        }
        if self.phase != Phase::Playing {
            log::warn!("stat() with no attempt in play");
            return;
        }

        if self.replaying {
            self.status = status;
            self.phase = Phase::Resolved(status);
            return;
        }

        let Some(id) = self.level else {
            return;
        };
        let Some(time_limit) = self.set.get(id).map(|l| l.time) else {
            return;
        };
        self.status = status;
        self.phase = Phase::Resolved(status);
        let rules = self.rules();

        self.coins = self.frame.coins;
        self.timer = if time_limit == 0 {
            self.frame.clock.saturating_add(self.frame.gained)
        } else {
            time_limit
                .saturating_add(self.frame.gained)
                .saturating_sub(self.frame.clock)
        };
        if let Some(checkpoint) = &self.checkpoint {
            self.timer = self.timer.saturating_sub(checkpoint.respawn.offset);
        }

        match status {
            Status::Goal => self.stat_goal(id),
            Status::Fall | Status::Time => self.stat_failure(id, status),
            Status::None => {}
        }

        if self.set.is_campaign() {
            self.store_ledger();
            if self.done && self.settings.career_active() && !self.settings.lock_goals {
                self.settings.lock_goals = true;
                self.save_settings();
            }
        } else if rules.stores_set_ledger {
            self.store_ledger();
        }

        if let ReplaySlot::Recording(recorder) = &mut self.slot {
            if let Err(err) = recorder.record_status(status, self.coins, self.timer) {
                log::error!("Could not write replay result: {}", err);
                self.slot = ReplaySlot::Idle;
            }
        }

        log::info!(
            "Attempt resolved: {:?} ({} coins, {} cs, balls {})",
            status,
            self.coins,
            self.timer,
            self.balls()
        );
    }

    fn stat_goal(&mut self, id: LevelId) {
        let rules = self.rules();

        if rules.continuous_run {
            if let Some(checkpoint) = &mut self.checkpoint {
                checkpoint.balls = Some(self.curr.balls);
            }
            self.curr.bank(self.coins, self.timer, rules.reward_balls);
        }

        let request = self.level_rank_request();
        if let Some(level) = self.set.get_mut(id) {
            if let Some(request) = request {
                self.level_ranks =
                    level.score_update(&self.settings.player, self.timer, self.coins, request);
            }
            level.stats.completed += 1;
            level.complete();
        }

        self.next = if rules.sequential_next {
            self.set.next_in_sequence(id)
        } else {
            self.set.next_skipping_extras(id)
        };

        match self.next {
            Some(next) => self.set.open(next),
            None => self.done = rules.defined_end,
        }
    }

    /// Which level tables this result may enter, `None` when it is
    /// disqualified outright
    fn level_rank_request(&self) -> Option<LevelRankRequest> {
        if !self.set.is_campaign() {
            return Some(LevelRankRequest {
                time: true,
                goal: self.goal == 0,
                coin: true,
            });
        }

        let eligible = self.mode != Mode::Hardcore
            && self.settings.slowdown_percent >= 100
            && !self.settings.cheat;
        if !eligible {
            return None;
        }

        let career = self.settings.career_active();
        Some(LevelRankRequest {
            time: true,
            goal: career && self.goal == 0,
            coin: career,
        })
    }

    fn stat_failure(&mut self, id: LevelId, status: Status) {
        let rules = self.rules();

        self.done = false;
        self.extended_timer = self.timer;

        if rules.continuous_run {
            self.curr.times = self.curr.times.saturating_add(self.timer);
        }

        let policy = DebtPolicy {
            pays_debt: rules.pays_debt,
            cheat: self.settings.cheat,
        };
        match apply_debt_policy(&mut self.curr.balls, &mut self.settings.extra_lives, policy) {
            DebtOutcome::BufferConsumed => {
                log::info!("Spent a purchased life ({} left)", self.settings.extra_lives);
                self.save_settings();
            }
            DebtOutcome::BallPaid => {
                if let Some(checkpoint) = &mut self.checkpoint {
                    checkpoint.balls = checkpoint.balls.map(|b| b - 1).filter(|&b| b >= 0);
                }
            }
            DebtOutcome::Exempt | DebtOutcome::Bankrupt => {}
        }

        if rules.speed_meter {
            economy::rush_penalty(&mut self.curr.speed_percent);
        }

        if self.dead() {
            self.next = None;
            self.done = false;
            self.curr.speed_percent = 0.0;
        }

        if let Some(level) = self.set.get_mut(id) {
            if status == Status::Fall {
                level.stats.fallout += 1;
            } else {
                level.stats.timeout += 1;
            }
        }
    }

    /// Continue after a failure: one more ball and the failed attempt's
    /// time is taken back. Refused unless the attempt just failed.
    pub fn extend(&mut self) -> bool {
        if self.mode == Mode::None || self.replaying || !self.status.is_failure() {
            return false;
        }
        self.extended = true;
        self.status = Status::None;
        self.curr.times = self.curr.times.saturating_sub(self.extended_timer);
        self.extended_timer = 0;
        self.curr.balls = self.curr.balls.saturating_add(1);
        self.phase = Phase::Playing;
        true
    }

    /// Close the attempt's recording. Nothing is kept if the level clock
    /// never moved.
    pub fn stop(&mut self) {
        if self.mode == Mode::None {
            return;
        }

        let offset = self.checkpoint.map_or(0, |c| c.respawn.offset);
        let discard = self.current_level().is_some_and(|level| {
            if level.time == 0 {
                self.frame.clock - offset <= 0
            } else {
                self.frame.clock + offset == level.time
            }
        });

        if let ReplaySlot::Recording(recorder) = std::mem::take(&mut self.slot) {
            if let Err(err) = recorder.stop(discard) {
                log::error!("Could not close replay recording: {}", err);
            }
        }
    }

    /// Advance to the next level after a goal
    pub fn next(&mut self) -> bool {
        let Some(next) = self.next else {
            return false;
        };
        if self.status != Status::Goal {
            return false;
        }
        self.stop();
        self.restore_checkpoint_balls();
        self.play(next)
    }

    /// Retry the current level. After a goal the attempt's gains are undone.
    pub fn same(&mut self) -> bool {
        if self.dead() {
            return false;
        }
        let Some(level) = self.level else {
            return false;
        };
        self.stop();
        if self.status == Status::Goal {
            self.curr = self.prev;
            self.restore_checkpoint_balls();
        }
        self.play(level)
    }

    fn restore_checkpoint_balls(&mut self) {
        if let Some(balls) = self.checkpoint.as_mut().and_then(|c| c.balls.take()) {
            self.curr.balls = balls;
        }
    }

    /// Finish the session. A completed run is ranked in the set tables.
    pub fn exit(&mut self) {
        if self.done && !self.replaying && self.phase != Phase::Exited {
            let player = self.settings.player.clone();
            let (times, score) = (self.curr.times, self.curr.score);

            if self.set.is_campaign() {
                if self.mode == Mode::Hardcore {
                    let request = SetRankRequest {
                        score: self.settings.career_active(),
                        times: true,
                    };
                    self.set_ranks = self.set.score_update(&player, times, score, request);
                    self.store_ledger();
                }
            } else {
                let request = SetRankRequest {
                    score: true,
                    times: true,
                };
                self.set_ranks = self.set.score_update(&player, times, score, request);
                if self.set_ranks.any() {
                    self.store_ledger();
                }
            }
        }

        log::info!("Session ended (done: {})", self.done);
        self.done = false;
        self.close_slot();
        self.phase = Phase::Exited;
    }

    // === Queries ===

    pub fn dead(&self) -> bool {
        if self.mode == Mode::None {
            return true;
        }
        let rules = self.rules();
        if rules.single_life && self.status.is_failure() {
            return true;
        }
        if rules.economy_gated && !self.settings.cheat {
            return i64::from(self.curr.balls) + i64::from(self.settings.extra_lives) < 0;
        }
        false
    }

    pub fn done(&self) -> bool {
        self.done
    }

    /// Goal reached on the final level of an open-ended mode
    pub fn last(&self) -> bool {
        !self.rules().continuous_run && self.status == Status::Goal && self.next.is_none()
    }

    pub fn next_avail(&self) -> bool {
        let Some(next) = self.next else {
            return false;
        };
        if self.rules().next_requires_goal && !self.settings.cheat {
            self.status == Status::Goal
        } else {
            self.set.is_opened(next)
        }
    }

    pub fn same_avail(&self) -> bool {
        match self.rules().retry {
            Retry::Never => false,
            Retry::Always => true,
            Retry::AfterAttempt if self.status == Status::None => self.settings.cheat,
            Retry::AfterAttempt => !self.dead(),
        }
    }

    pub fn extended(&self) -> bool {
        self.extended
    }

    pub fn lvl_high(&self) -> bool {
        self.level_ranks.any()
    }

    pub fn set_high(&self) -> bool {
        self.set_ranks.any()
    }

    pub fn time_rank(&self) -> Option<RankTier> {
        self.level_ranks.time
    }

    pub fn goal_rank(&self) -> Option<RankTier> {
        self.level_ranks.goal
    }

    pub fn coin_rank(&self) -> Option<RankTier> {
        self.level_ranks.coin
    }

    pub fn score_rank(&self) -> Option<RankTier> {
        self.set_ranks.score
    }

    pub fn times_rank(&self) -> Option<RankTier> {
        self.set_ranks.times
    }

    /// Write the configured player name into the slots just earned
    pub fn rename(&mut self, set_only: bool) {
        let player = self.settings.player.clone();
        let level_ranks = self.level_ranks;
        let set_ranks = self.set_ranks;

        if self.set.is_campaign() {
            if let Some(level) = self.level.and_then(|id| self.set.get_mut(id)) {
                level.rename_player(level_ranks, &player);
            }
            self.store_ledger();
            return;
        }

        if set_only {
            self.set.rename_player(set_ranks, &player);
        } else {
            if let Some(level) = self.level.and_then(|id| self.set.get_mut(id)) {
                level.rename_player(level_ranks, &player);
            }
            if self.done && self.mode != Mode::Standalone {
                self.set.rename_player(set_ranks, &player);
            }
        }

        if self.mode != Mode::Standalone {
            self.store_ledger();
        }
    }

    // === Economy ===

    /// Balls as shown to the player, purchased lives included
    pub fn balls(&self) -> i32 {
        if self.replaying {
            self.curr.balls
        } else {
            let bought = i32::try_from(self.settings.extra_lives).unwrap_or(i32::MAX);
            self.curr.balls.saturating_add(bought)
        }
    }

    pub fn buy_balls(&mut self, n: i32) {
        self.curr.add_balls(n);
    }

    pub fn score(&self) -> i32 {
        self.curr.score
    }

    pub fn times(&self) -> i32 {
        self.curr.times
    }

    pub fn speed_percent(&self) -> f32 {
        self.curr.speed_percent
    }

    pub fn economy(&self) -> Economy {
        self.curr
    }

    pub fn rush_collect_coin_value(&mut self, value: i32) {
        if self.rules().speed_meter {
            self.rush.collect(value, &mut self.curr.speed_percent);
        }
    }

    // === Checkpoints ===

    pub fn activate_checkpoint(&mut self, respawn: Respawn) {
        self.checkpoint = Some(Checkpoint {
            respawn,
            balls: Some(self.curr.balls),
        });
    }

    pub fn clear_checkpoint(&mut self) {
        self.checkpoint = None;
    }

    pub fn checkpoint(&self) -> Option<Respawn> {
        self.checkpoint.map(|c| c.respawn)
    }

    // === Replays ===

    fn replay_path(&self, name: &str) -> PathBuf {
        let generation = Generation::from(self.settings.replay_generation);
        self.settings
            .replay_dir
            .join(format!("{name}.{}", generation.extension()))
    }

    /// Path of the attempt currently being recorded (or last recorded)
    pub fn last_replay_path(&self) -> PathBuf {
        self.replay_path(LAST_REPLAY)
    }

    pub fn is_recording(&self) -> bool {
        matches!(self.slot, ReplaySlot::Recording(_))
    }

    pub fn is_replaying(&self) -> bool {
        self.replaying
    }

    /// Append one simulation command to the recording
    pub fn record_command(&mut self, cmd: &Command) {
        if let ReplaySlot::Recording(recorder) = &mut self.slot {
            if let Err(err) = recorder.append(cmd) {
                log::error!("Replay recording stopped: {}", err);
                self.slot = ReplaySlot::Idle;
            }
        }
    }

    /// Suggested save name for the last recording
    pub fn replay_save_name(&self) -> String {
        let level = self.current_level().map(|l| l.name.as_str()).filter(|n| !n.is_empty());
        format_replay_name(
            &self.settings.replay_name_format,
            Some(self.set.id()),
            level,
            self.status,
            |name| self.replay_path(name).exists(),
        )
    }

    /// Keep the last recording under `name`
    pub fn rename_replay(&mut self, name: &str) -> bool {
        if name.is_empty() || name == LAST_REPLAY {
            return false;
        }
        if self.is_recording() {
            self.stop();
        }

        let from = self.replay_path(LAST_REPLAY);
        let to = self.replay_path(name);
        if !from.exists() {
            return false;
        }
        match fs::rename(&from, &to) {
            Ok(()) => {
                log::info!("Replay saved as {}", to.display());
                true
            }
            Err(err) => {
                log::error!("Could not rename replay to {}: {}", to.display(), err);
                false
            }
        }
    }

    /// Start playing back `path`. The header's economy is loaded into the
    /// session and the first update is fed to `sink`.
    pub fn replay<S: CommandSink>(&mut self, path: &Path, sink: &mut S) -> bool {
        self.close_slot();

        match ReplayPlayer::open(path, sink) {
            Ok(player) => {
                let header = player.header();
                self.mode = header.mode;
                self.goal = header.goal;
                self.goal_initial = header.goal;
                self.curr = Economy {
                    balls: header.balls,
                    score: header.score,
                    times: header.times,
                    speed_percent: header.speed_percent,
                };
                self.level = self.set.find(&header.file);
                self.next = None;
                self.done = false;
                self.status = Status::None;
                self.replaying = true;
                self.phase = Phase::Playing;
                self.slot = ReplaySlot::Playing(player);
                true
            }
            Err(err) => {
                self.replay_requires_update |= err.requires_update();
                self.replay_too_old |= err.is_too_old();
                log::error!("Could not open replay {}: {}", path.display(), err);
                false
            }
        }
    }

    pub fn replay_step<S: CommandSink>(&mut self, dt: f32, sink: &mut S) -> bool {
        match &mut self.slot {
            ReplaySlot::Playing(player) => player.step(dt, sink),
            _ => false,
        }
    }

    pub fn replay_blend(&self) -> f32 {
        match &self.slot {
            ReplaySlot::Playing(player) => player.blend(),
            _ => 0.0,
        }
    }

    pub fn replay_speed(&mut self, speed: ReplaySpeed) {
        if let ReplaySlot::Playing(player) = &mut self.slot {
            player.set_speed(speed);
        }
    }

    pub fn replay_manual_speed(&mut self, factor: f32) {
        if let ReplaySlot::Playing(player) = &mut self.slot {
            player.manual_speed(factor);
        }
    }

    pub fn replay_header(&self) -> Option<&ReplayHeader> {
        match &self.slot {
            ReplaySlot::Playing(player) => Some(player.header()),
            _ => None,
        }
    }

    /// Close playback, deleting the replay file when `delete` is set
    pub fn replay_stop(&mut self, delete: bool) {
        if let ReplaySlot::Playing(player) = std::mem::take(&mut self.slot) {
            if let Err(err) = player.close(delete) {
                log::error!("Could not close replay: {}", err);
            }
        }
    }

    /// A replay from a newer build was rejected
    pub fn replay_requires_update(&self) -> bool {
        self.replay_requires_update
    }

    /// A replay older than the oldest readable version was rejected
    pub fn replay_too_old(&self) -> bool {
        self.replay_too_old
    }

    pub fn clear_replay_flags(&mut self) {
        self.replay_requires_update = false;
        self.replay_too_old = false;
    }

    // === Accessors ===

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn level(&self) -> Option<LevelId> {
        self.level
    }

    pub fn current_level(&self) -> Option<&Level> {
        self.level.and_then(|id| self.set.get(id))
    }

    pub fn next_level(&self) -> Option<LevelId> {
        self.next
    }

    /// Coins still needed to open the goal
    pub fn goal(&self) -> i32 {
        self.goal
    }

    pub fn goal_enabled(&self) -> bool {
        self.goal_enabled
    }

    /// Coins of the last resolved attempt
    pub fn coins(&self) -> i32 {
        self.coins
    }

    /// Time of the last resolved attempt, centiseconds
    pub fn timer(&self) -> i32 {
        self.timer
    }

    pub fn set(&self) -> &LevelSet {
        &self.set
    }

    pub fn set_mut(&mut self) -> &mut LevelSet {
        &mut self.set
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    // === Persistence ===

    fn store_ledger(&self) {
        if self.set.score_file.is_none() {
            log::debug!("Level set {:?} has no score file, results not stored", self.set.id());
            return;
        }
        if let Err(err) = ledger::store(&self.set) {
            log::error!("Could not store scores: {}", err);
        }
    }

    fn save_settings(&self) {
        if let Some(path) = &self.settings_path {
            if let Err(err) = self.settings.save(path) {
                log::error!("Could not save settings to {}: {}", path.display(), err);
            }
        }
    }

    fn close_slot(&mut self) {
        match std::mem::take(&mut self.slot) {
            ReplaySlot::Idle => {}
            ReplaySlot::Recording(recorder) => {
                if let Err(err) = recorder.stop(false) {
                    log::error!("Could not close replay recording: {}", err);
                }
            }
            ReplaySlot::Playing(player) => {
                if let Err(err) = player.close(false) {
                    log::error!("Could not close replay: {}", err);
                }
            }
        }
    }
}
