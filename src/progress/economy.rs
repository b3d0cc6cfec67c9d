//! Session economy: balls, score, accumulated time and the speed meter

/// Lowest ball count; reaching it means the session is bankrupt
pub const BALLS_SENTINEL: i32 = -1;

/// Speed meter gain per 10 coin value collected
pub const RUSH_SPEED_STEP: f32 = 100.0 / 7.0;
pub const RUSH_SPEED_MAX: f32 = 100.0;

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Economy {
    pub balls: i32,
    /// Accumulated coins
    pub score: i32,
    /// Accumulated time in centiseconds
    pub times: i32,
    /// Boost Rush speed meter, 0 to 100
    pub speed_percent: f32,
}

impl Economy {
    pub fn with_balls(balls: i32) -> Self {
        Self {
            balls,
            ..Self::default()
        }
    }

    /// Bank one level's coins and time. Every 100th cumulative coin grants
    /// a ball when `reward` is set. Returns the balls granted.
    pub fn bank(&mut self, coins: i32, timer: i32, reward: bool) -> i32 {
        let mut granted = 0;
        if reward && coins > 0 {
            let end = self.score.saturating_add(coins);
            granted = end.max(0) / 100 - self.score.max(0) / 100;
            self.balls = self.balls.saturating_add(granted);
        }
        self.score = self.score.saturating_add(coins);
        self.times = self.times.saturating_add(timer);
        granted
    }

    pub fn add_balls(&mut self, n: i32) {
        self.balls = self.balls.saturating_add(n).max(BALLS_SENTINEL);
    }
}

pub fn reward_ball(n: i32) -> bool {
    n > 0 && n % 100 == 0
}

/// Explicit inputs of the debt policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebtPolicy {
    /// The mode charges a ball for a failed attempt
    pub pays_debt: bool,
    /// Cheats waive every charge
    pub cheat: bool,
}

/// What a failed attempt cost
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebtOutcome {
    /// Nothing was charged
    Exempt,
    /// A buffered life was spent instead of a ball
    BufferConsumed,
    /// One ball was paid
    BallPaid,
    /// Already at the sentinel, nothing left to take
    Bankrupt,
}

/// Charge one failed attempt. A positive `buffer` (purchased lives) is
/// spent before any ball; `balls` never drops below [`BALLS_SENTINEL`].
pub fn apply_debt_policy(balls: &mut i32, buffer: &mut u32, policy: DebtPolicy) -> DebtOutcome {
    if !policy.pays_debt || policy.cheat {
        return DebtOutcome::Exempt;
    }
    if *buffer > 0 {
        *buffer -= 1;
        return DebtOutcome::BufferConsumed;
    }
    if *balls <= BALLS_SENTINEL {
        *balls = BALLS_SENTINEL;
        return DebtOutcome::Bankrupt;
    }
    *balls -= 1;
    DebtOutcome::BallPaid
}

/// Boost Rush speed meter
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct RushMeter {
    /// Coin value collected but not yet converted
    pending: i32,
}

impl RushMeter {
    /// Convert each full 10 of collected coin value into speed
    pub fn collect(&mut self, value: i32, speed_percent: &mut f32) {
        self.pending = self.pending.saturating_add(value.max(0));
        while self.pending > 9 {
            *speed_percent = (*speed_percent + RUSH_SPEED_STEP).min(RUSH_SPEED_MAX);
            self.pending -= 10;
        }
    }

    pub fn reset(&mut self) {
        self.pending = 0;
    }
}

/// A failed attempt halves the meter
pub fn rush_penalty(speed_percent: &mut f32) {
    if *speed_percent > 1.0 {
        *speed_percent /= 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const CHARGED: DebtPolicy = DebtPolicy {
        pays_debt: true,
        cheat: false,
    };

    #[test]
    fn test_reward_ball() {
        assert!(!reward_ball(0));
        assert!(!reward_ball(99));
        assert!(reward_ball(100));
        assert!(reward_ball(300));
        assert!(!reward_ball(-100));
    }

    #[test]
    fn test_crossing_100_grants_one_ball() {
        let mut eco = Economy {
            balls: 2,
            score: 99,
            ..Economy::default()
        };
        assert_eq!(eco.bank(2, 1500, true), 1);
        assert_eq!(eco.balls, 3);
        assert_eq!(eco.score, 101);
        assert_eq!(eco.times, 1500);
    }

    #[test]
    fn test_large_haul_grants_each_threshold() {
        let mut eco = Economy::with_balls(0);
        eco.score = 50;
        assert_eq!(eco.bank(260, 0, true), 3);
    }

    #[test]
    fn test_bank_without_reward() {
        let mut eco = Economy::with_balls(1);
        eco.score = 99;
        assert_eq!(eco.bank(5, 0, false), 0);
        assert_eq!(eco.balls, 1);
    }

    #[test]
    fn test_buffer_spent_first() {
        let mut balls = 0;
        let mut buffer = 1;
        assert_eq!(apply_debt_policy(&mut balls, &mut buffer, CHARGED), DebtOutcome::BufferConsumed);
        assert_eq!((balls, buffer), (0, 0));
        assert_eq!(apply_debt_policy(&mut balls, &mut buffer, CHARGED), DebtOutcome::BallPaid);
        assert_eq!(balls, -1);
        assert_eq!(apply_debt_policy(&mut balls, &mut buffer, CHARGED), DebtOutcome::Bankrupt);
        assert_eq!(balls, -1);
    }

    #[test]
    fn test_exempt_modes_and_cheats() {
        let mut balls = 0;
        let mut buffer = 0;
        let free = DebtPolicy {
            pays_debt: false,
            cheat: false,
        };
        assert_eq!(apply_debt_policy(&mut balls, &mut buffer, free), DebtOutcome::Exempt);
        let cheat = DebtPolicy { cheat: true, ..CHARGED };
        assert_eq!(apply_debt_policy(&mut balls, &mut buffer, cheat), DebtOutcome::Exempt);
        assert_eq!(balls, 0);
    }

    #[test]
    fn test_rush_meter() {
        let mut meter = RushMeter::default();
        let mut speed = 0.0;
        meter.collect(5, &mut speed);
        assert_eq!(speed, 0.0);
        meter.collect(5, &mut speed);
        assert!((speed - RUSH_SPEED_STEP).abs() < 1e-4);

        meter.collect(1000, &mut speed);
        assert_eq!(speed, RUSH_SPEED_MAX);

        rush_penalty(&mut speed);
        assert_eq!(speed, 50.0);

        let mut low = 0.5;
        rush_penalty(&mut low);
        assert_eq!(low, 0.5);
    }

    #[test]
    fn test_huge_haul_saturates() {
        let mut eco = Economy::with_balls(0);
        eco.score = i32::MAX - 150;
        assert_eq!(eco.bank(1000, 0, true), 2);
        assert_eq!(eco.score, i32::MAX);
    }

    proptest! {
        #[test]
        fn prop_bank_matches_threshold_count(score in 0i32..5000, coins in 1i32..5000) {
            let mut eco = Economy::with_balls(0);
            eco.score = score;
            let expected = (score + 1..=score + coins).filter(|&n| reward_ball(n)).count() as i32;
            prop_assert_eq!(eco.bank(coins, 0, true), expected);
            prop_assert_eq!(eco.balls, expected);
        }

        #[test]
        fn prop_balls_never_below_sentinel(
            start in -1i32..5,
            buffer in 0u32..3,
            failures in 0usize..20,
        ) {
            let mut balls = start;
            let mut buffer = buffer;
            for _ in 0..failures {
                apply_debt_policy(&mut balls, &mut buffer, CHARGED);
                prop_assert!(balls >= BALLS_SENTINEL);
            }
        }
    }
}
