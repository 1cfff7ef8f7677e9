//! Turns plumb-line deviations into a posture report.
//!
//! Each part is graded by the magnitude of its offset, the four grades are
//! averaged with equal weight, and a side-specific suggestion is picked.

use std::fmt;

use plumbline_vision::{BodyPart, DeviationMap};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    /// Anything other than "left" (any case) is read as the right side
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("left") {
            Side::Left
        } else {
            Side::Right
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "Left",
            Side::Right => "Right",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Level {
    Neutral,
    Mild,
    Moderate,
    Severe,
}

impl Level {
    pub fn from_magnitude(magnitude: u64) -> Self {
        match magnitude {
            0..=9 => Level::Neutral,
            10..=39 => Level::Mild,
            40..=79 => Level::Moderate,
            _ => Level::Severe,
        }
    }

    pub fn sub_score(self) -> u32 {
        match self {
            Level::Neutral => 100,
            Level::Mild => 85,
            Level::Moderate => 65,
            Level::Severe => 40,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Direction {
    Forward,
    Backward,
    Neutral,
}

impl Direction {
    pub fn from_deviation(deviation: i64) -> Self {
        match deviation.signum() {
            1 => Direction::Forward,
            -1 => Direction::Backward,
            _ => Direction::Neutral,
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Classification {
    pub part: BodyPart,
    pub deviation: i64,
    pub level: Level,
    pub direction: Direction,
    pub sub_score: u32,
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} {} deviation", self.part, self.level, self.direction)
    }
}

pub fn classify(part: BodyPart, deviation: i64) -> Classification {
    let level = Level::from_magnitude(deviation.unsigned_abs());
    Classification {
        part,
        deviation,
        level,
        direction: Direction::from_deviation(deviation),
        sub_score: level.sub_score(),
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Condition {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl Condition {
    pub fn from_score(avg: f64) -> Self {
        if avg > 90.0 {
            Condition::Excellent
        } else if avg > 75.0 {
            Condition::Good
        } else if avg > 60.0 {
            Condition::Fair
        } else {
            Condition::Poor
        }
    }
}

impl fmt::Display for Condition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

pub const LEFT_FORWARD_LEANING: &str =
    "Forward-leaning posture detected (Rounded shoulders, anterior pelvic tilt).";
pub const LEFT_BALANCED: &str = "Posture on left side appears balanced.";
pub const RIGHT_FORWARD_HEAD: &str = "Mild forward head posture detected.";
pub const RIGHT_NEUTRAL: &str = "Right side posture appears mostly neutral.";

const LEAN_THRESHOLD: i64 = 80;
const FORWARD_HEAD_THRESHOLD: i64 = 60;

/// Only forward (positive) offsets trigger a finding
pub fn suggestion(deviations: &DeviationMap, side: Side) -> &'static str {
    match side {
        Side::Left => {
            if deviations.shoulder > LEAN_THRESHOLD || deviations.hip > LEAN_THRESHOLD {
                LEFT_FORWARD_LEANING
            } else {
                LEFT_BALANCED
            }
        }
        Side::Right => {
            if deviations.ear > FORWARD_HEAD_THRESHOLD {
                RIGHT_FORWARD_HEAD
            } else {
                RIGHT_NEUTRAL
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PostureReport {
    pub side: Side,
    pub classifications: Vec<Classification>,
    pub suggestion: &'static str,
    pub score: f64,
    pub condition: Condition,
}

impl PostureReport {
    /// Score bar fill in [0, 1]
    pub fn score_fraction(&self) -> f64 {
        self.score / 100.0
    }

    pub fn text(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for PostureReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, c) in self.classifications.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{}", c)?;
        }
        write!(
            f,
            "\n\nSummary: {}\n\nPosture Score: {:.1}/100 ({})",
            self.suggestion, self.score, self.condition
        )
    }
}

pub fn interpret(deviations: &DeviationMap, side: Side) -> PostureReport {
    let classifications: Vec<Classification> = deviations
        .iter()
        .map(|(part, value)| classify(part, value))
        .collect();

    let total: u32 = classifications.iter().map(|c| c.sub_score).sum();
    let score = total as f64 / classifications.len() as f64;

    PostureReport {
        side,
        classifications,
        suggestion: suggestion(deviations, side),
        score,
        condition: Condition::from_score(score),
    }
}
