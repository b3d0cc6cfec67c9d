//! Session modes and the rules each one plays by

use serde::{Deserialize, Serialize};

/// Session play style. Discriminants are the on-disk replay codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Mode {
    /// Home room, nothing is scored or recorded
    #[default]
    None = 0,
    Challenge = 1,
    Normal = 2,
    Standalone = 3,
    Hardcore = 4,
    Zen = 5,
    BoostRush = 6,
    Campaign = 7,
}

/// When a failed or finished level may be restarted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retry {
    Always,
    /// Only after an attempt resolved and while the session is alive
    AfterAttempt,
    Never,
}

/// Per-mode rule set consulted by the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeRules {
    pub label: &'static str,
    /// Balls granted by `init`
    pub starting_balls: i32,
    /// A failed attempt costs a ball
    pub pays_debt: bool,
    /// Running out of balls ends the session
    pub economy_gated: bool,
    /// One continuous run: score and time accumulate across levels and
    /// completion never relaxes a level's coin goal
    pub continuous_run: bool,
    /// Every 100th cumulative coin grants a ball
    pub reward_balls: bool,
    /// Bonus levels are played in order instead of being skipped
    pub sequential_next: bool,
    /// Finishing the last level completes the session
    pub defined_end: bool,
    /// Any failure ends the session
    pub single_life: bool,
    /// The goal is always open
    pub goal_always_open: bool,
    /// Moving on requires reaching the goal, not just an opened level
    pub next_requires_goal: bool,
    pub retry: Retry,
    /// Results are flushed to the level set's score file
    pub stores_set_ledger: bool,
    /// Coin value drives the speed meter
    pub speed_meter: bool,
}

const NONE: ModeRules = ModeRules {
    label: "Unknown",
    starting_balls: 0,
    pays_debt: false,
    economy_gated: false,
    continuous_run: false,
    reward_balls: false,
    sequential_next: false,
    defined_end: false,
    single_life: false,
    goal_always_open: false,
    next_requires_goal: false,
    retry: Retry::Never,
    stores_set_ledger: false,
    speed_meter: false,
};

const CHALLENGE: ModeRules = ModeRules {
    label: "Challenge",
    starting_balls: 2,
    pays_debt: true,
    economy_gated: true,
    continuous_run: true,
    reward_balls: true,
    sequential_next: true,
    defined_end: true,
    next_requires_goal: true,
    retry: Retry::AfterAttempt,
    stores_set_ledger: true,
    ..NONE
};

const NORMAL: ModeRules = ModeRules {
    label: "Classic",
    starting_balls: 2,
    pays_debt: true,
    economy_gated: true,
    retry: Retry::Always,
    stores_set_ledger: true,
    ..NONE
};

const STANDALONE: ModeRules = ModeRules {
    label: "Standalone",
    starting_balls: 2,
    pays_debt: true,
    retry: Retry::Always,
    ..NONE
};

const HARDCORE: ModeRules = ModeRules {
    label: "Hardcore",
    continuous_run: true,
    sequential_next: true,
    defined_end: true,
    single_life: true,
    stores_set_ledger: true,
    ..NONE
};

const ZEN: ModeRules = ModeRules {
    label: "Zen",
    starting_balls: 2,
    goal_always_open: true,
    retry: Retry::Always,
    stores_set_ledger: true,
    ..NONE
};

const BOOST_RUSH: ModeRules = ModeRules {
    label: "Boost Rush",
    sequential_next: false,
    speed_meter: true,
    ..CHALLENGE
};

const CAMPAIGN: ModeRules = ModeRules {
    label: "Campaign",
    starting_balls: 2,
    defined_end: true,
    retry: Retry::Always,
    ..NONE
};

impl Mode {
    pub const ALL: [Mode; 8] = [
        Mode::None,
        Mode::Challenge,
        Mode::Normal,
        Mode::Standalone,
        Mode::Hardcore,
        Mode::Zen,
        Mode::BoostRush,
        Mode::Campaign,
    ];

    pub fn rules(self) -> &'static ModeRules {
        match self {
            Mode::None => &NONE,
            Mode::Challenge => &CHALLENGE,
            Mode::Normal => &NORMAL,
            Mode::Standalone => &STANDALONE,
            Mode::Hardcore => &HARDCORE,
            Mode::Zen => &ZEN,
            Mode::BoostRush => &BOOST_RUSH,
            Mode::Campaign => &CAMPAIGN,
        }
    }

    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        Self::ALL.into_iter().find(|m| m.code() == code)
    }

    /// Short label, or the long "... Mode" form
    pub fn label(self, long: bool) -> String {
        let label = self.rules().label;
        if long {
            format!("{label} Mode")
        } else {
            label.to_string()
        }
    }
}

/// Outcome of one level attempt. Discriminants are the on-disk replay codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Status {
    #[default]
    None = 0,
    Time = 1,
    Goal = 2,
    Fall = 3,
}

impl Status {
    pub fn code(self) -> i32 {
        self as i32
    }

    pub fn from_code(code: i32) -> Option<Self> {
        match code {
            0 => Some(Status::None),
            1 => Some(Status::Time),
            2 => Some(Status::Goal),
            3 => Some(Status::Fall),
            _ => None,
        }
    }

    pub fn is_failure(self) -> bool {
        matches!(self, Status::Fall | Status::Time)
    }
}
