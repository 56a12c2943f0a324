use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Quantity categories read from the health provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Step count
    Steps,
    /// Walking and running distance, meters
    Distance,
    /// Active energy burned, kilocalories
    ActiveEnergy,
    /// Exercise time, minutes
    ExerciseTime,
}

impl Metric {
    /// Every metric a daily record is assembled from
    pub const ALL: [Metric; 4] = [
        Metric::Steps,
        Metric::Distance,
        Metric::ActiveEnergy,
        Metric::ExerciseTime,
    ];

    /// Unit the provider reports this metric in
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::Steps => "count",
            Metric::Distance => "m",
            Metric::ActiveEnergy => "kcal",
            Metric::ExerciseTime => "min",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Steps => write!(f, "steps"),
            Metric::Distance => write!(f, "distance"),
            Metric::ActiveEnergy => write!(f, "active_energy"),
            Metric::ExerciseTime => write!(f, "exercise_time"),
        }
    }
}

/// One calendar day's activity summary
///
/// Records are immutable once built. Provider sums arrive as reals, so the
/// constructor clamps negative or NaN values to zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "RecordFields")]
pub struct DailyRecord {
    date: NaiveDate,
    steps: u32,
    /// Meters
    distance: f64,
    /// Kilocalories
    calories: f64,
    active_minutes: u32,
}

impl DailyRecord {
    pub fn new(date: NaiveDate, steps: u32, distance: f64, calories: f64, active_minutes: u32) -> Self {
        Self {
            date,
            steps,
            distance: non_negative(distance),
            calories: non_negative(calories),
            active_minutes,
        }
    }

    /// Build a record from raw provider sums
    pub fn from_sums(date: NaiveDate, steps: f64, distance: f64, calories: f64, minutes: f64) -> Self {
        Self::new(date, steps as u32, distance, calories, minutes as u32)
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn steps(&self) -> u32 {
        self.steps
    }

    /// Distance in meters
    pub fn distance(&self) -> f64 {
        self.distance
    }

    /// Active energy in kilocalories
    pub fn calories(&self) -> f64 {
        self.calories
    }

    pub fn active_minutes(&self) -> u32 {
        self.active_minutes
    }

    /// Distance in kilometers
    pub fn distance_km(&self) -> f64 {
        self.distance / 1000.0
    }

    /// Medium-style date, e.g. "Oct 18, 2026"
    pub fn formatted_date(&self) -> String {
        self.date.format("%b %-d, %Y").to_string()
    }

    pub fn formatted_distance(&self) -> String {
        format!("{:.2} km", self.distance_km())
    }

    pub fn formatted_calories(&self) -> String {
        format!("{:.0} kcal", self.calories)
    }
}

/// Wire shape of a record; deserialized values pass through `DailyRecord::new`
#[derive(Deserialize)]
struct RecordFields {
    date: NaiveDate,
    steps: u32,
    distance: f64,
    calories: f64,
    active_minutes: u32,
}

impl From<RecordFields> for DailyRecord {
    fn from(fields: RecordFields) -> Self {
        Self::new(
            fields.date,
            fields.steps,
            fields.distance,
            fields.calories,
            fields.active_minutes,
        )
    }
}

fn non_negative(value: f64) -> f64 {
    if value.is_nan() || value < 0.0 {
        0.0
    } else {
        value
    }
}
