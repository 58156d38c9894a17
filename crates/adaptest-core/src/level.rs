//! Level classification and level-appropriate difficulty bands.

use std::ops::RangeInclusive;

use crate::model::{GradeBand, Level};

const LEVELS: [Level; 5] = [Level::L1, Level::L2, Level::L3, Level::L4, Level::L5];

/// Upper (exclusive) score bounds for each level below the band's top level.
fn thresholds(grade: GradeBand) -> &'static [f64] {
    match grade {
        GradeBand::Advanced => &[30.0, 60.0, 80.0],
        GradeBand::Grade(n) if n <= 8 => &[40.0, 70.0],
        GradeBand::Grade(n) if n <= 10 => &[35.0, 65.0, 85.0],
        GradeBand::Grade(_) => &[30.0, 55.0, 75.0, 90.0],
    }
}

/// Map a score percentage to a level for the given grade band.
///
/// Bands are half-open: a score equal to a threshold lands in the higher
/// level. Total over every score; NaN classifies as `L1`.
pub fn classify_level(score_percent: f64, grade: GradeBand) -> Level {
    if score_percent.is_nan() {
        return Level::L1;
    }
    let bounds = thresholds(grade);
    let index = bounds
        .iter()
        .position(|&upper| score_percent < upper)
        .unwrap_or(bounds.len());
    LEVELS[index]
}

/// The highest level reachable in a grade band.
pub fn top_level(grade: GradeBand) -> Level {
    LEVELS[thresholds(grade).len()]
}

/// Inclusive difficulty interval of content suitable for a level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DifficultyBand {
    pub min: u8,
    pub max: u8,
}

impl DifficultyBand {
    /// Band used before a learner has any level record.
    pub const STARTER: DifficultyBand = DifficultyBand { min: 1, max: 3 };

    /// The single source of truth for level-based difficulty gating.
    pub fn for_level(level: Level) -> Self {
        let (min, max) = match level {
            Level::L1 => (1, 2),
            Level::L2 => (1, 3),
            Level::L3 => (2, 4),
            Level::L4 => (3, 5),
            Level::L5 => (4, 5),
        };
        Self { min, max }
    }

    pub fn contains(&self, difficulty: u8) -> bool {
        self.range().contains(&difficulty)
    }

    pub fn range(&self) -> RangeInclusive<u8> {
        self.min..=self.max
    }
}
