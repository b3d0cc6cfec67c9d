//! Replay playback speed

/// Time scale of each ladder step, paused first
pub const SPEED_FACTORS: [f32; ReplaySpeed::COUNT] = [
    0.0,
    1.0 / 128.0,
    1.0 / 64.0,
    1.0 / 32.0,
    1.0 / 16.0,
    1.0 / 8.0,
    1.0 / 4.0,
    1.0 / 2.0,
    1.0,
    2.0,
    4.0,
    8.0,
    16.0,
    32.0,
    64.0,
    128.0,
];

/// One step of the fixed speed ladder
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ReplaySpeed(u8);

impl ReplaySpeed {
    pub const COUNT: usize = 16;

    pub const PAUSED: Self = Self(0);
    pub const SLOWEST: Self = Self(1);
    pub const NORMAL: Self = Self(8);
    pub const FASTEST: Self = Self((Self::COUNT - 1) as u8);

    pub fn from_index(index: usize) -> Option<Self> {
        u8::try_from(index)
            .ok()
            .filter(|&i| (i as usize) < Self::COUNT)
            .map(Self)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    pub fn factor(self) -> f32 {
        SPEED_FACTORS[self.index()]
    }

    pub fn faster(self) -> Self {
        Self(self.0.saturating_add(1).min(Self::FASTEST.0))
    }

    pub fn slower(self) -> Self {
        Self(self.0.saturating_sub(1))
    }
}

impl Default for ReplaySpeed {
    fn default() -> Self {
        Self::NORMAL
    }
}

/// Who currently owns the playback speed
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SpeedControl {
    Ladder(ReplaySpeed),
    /// Continuous factor driven by user input
    Manual(f32),
}

impl SpeedControl {
    pub fn factor(self) -> f32 {
        match self {
            SpeedControl::Ladder(speed) => speed.factor(),
            SpeedControl::Manual(factor) => factor,
        }
    }
}

impl Default for SpeedControl {
    fn default() -> Self {
        SpeedControl::Ladder(ReplaySpeed::NORMAL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ladder_ends() {
        assert_eq!(ReplaySpeed::PAUSED.factor(), 0.0);
        assert_eq!(ReplaySpeed::SLOWEST.factor(), 1.0 / 128.0);
        assert_eq!(ReplaySpeed::NORMAL.factor(), 1.0);
        assert_eq!(ReplaySpeed::FASTEST.factor(), 128.0);
    }

    #[test]
    fn test_faster_slower_saturate() {
        assert_eq!(ReplaySpeed::FASTEST.faster(), ReplaySpeed::FASTEST);
        assert_eq!(ReplaySpeed::PAUSED.slower(), ReplaySpeed::PAUSED);
        assert_eq!(ReplaySpeed::NORMAL.faster().factor(), 2.0);
        assert_eq!(ReplaySpeed::NORMAL.slower().factor(), 0.5);
    }

    #[test]
    fn test_ladder_doubles() {
        for i in 2..ReplaySpeed::COUNT {
            assert_eq!(SPEED_FACTORS[i], SPEED_FACTORS[i - 1] * 2.0);
        }
    }

    #[test]
    fn test_from_index_bounds() {
        assert_eq!(ReplaySpeed::from_index(15), Some(ReplaySpeed::FASTEST));
        assert_eq!(ReplaySpeed::from_index(16), None);
    }
}
