use chrono::{DateTime, Datelike, Local};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// First id handed out by a fresh [`WorkoutLog`].
pub const FIRST_WORKOUT_ID: u64 = 1000;

const MONTHS: [&str; 12] = [
    "January",
    "February",
    "March",
    "April",
    "May",
    "June",
    "July",
    "August",
    "September",
    "October",
    "November",
    "December",
];

/// A point on the map. Serialized as `[lat, lng]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coords {
    pub lat: f64,
    pub lng: f64,
}

impl Coords {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl From<[f64; 2]> for Coords {
    fn from([lat, lng]: [f64; 2]) -> Self {
        Self { lat, lng }
    }
}

impl From<Coords> for [f64; 2] {
    fn from(c: Coords) -> Self {
        [c.lat, c.lng]
    }
}

impl fmt::Display for Coords {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.5},{:.5}", self.lat, self.lng)
    }
}

/// Parses `LAT,LNG` (whitespace around either number is allowed).
impl FromStr for Coords {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lat, lng) = s
            .split_once(',')
            .ok_or_else(|| format!("expected LAT,LNG but got {s:?}"))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|e| format!("bad latitude {lat:?}: {e}"))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|e| format!("bad longitude {lng:?}: {e}"))?;

        if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
            return Err(format!("coordinates out of range: {lat},{lng}"));
        }
        Ok(Self { lat, lng })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkoutType {
    #[default]
    Running,
    Cycling,
}

impl WorkoutType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Cycling => "cycling",
        }
    }

    /// Capitalized name used in descriptions.
    pub const fn label(self) -> &'static str {
        match self {
            Self::Running => "Running",
            Self::Cycling => "Cycling",
        }
    }

    pub const fn icon(self) -> &'static str {
        match self {
            Self::Running => "🏃‍♂️",
            Self::Cycling => "🚴‍♀️",
        }
    }
}

impl fmt::Display for WorkoutType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkoutType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "running" => Ok(Self::Running),
            "cycling" => Ok(Self::Cycling),
            other => Err(format!("unknown workout type {other:?} (expected running or cycling)")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkoutId(pub u64);

impl fmt::Display for WorkoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Variant-specific input, already validated.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activity {
    Running { cadence: f64 },
    Cycling { elevation_gain: f64 },
}

impl Activity {
    pub const fn kind(&self) -> WorkoutType {
        match self {
            Self::Running { .. } => WorkoutType::Running,
            Self::Cycling { .. } => WorkoutType::Cycling,
        }
    }
}

/// Everything needed to build a workout apart from id, time and place.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WorkoutInput {
    pub distance_km: f64,
    pub duration_min: f64,
    pub activity: Activity,
}

/// Variant fields plus the metric derived from them at construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Details {
    Running { cadence: f64, pace_min_per_km: f64 },
    Cycling { elevation_gain_m: f64, speed_km_per_h: f64 },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Workout {
    id: WorkoutId,
    created_at: DateTime<Local>,
    coords: Coords,
    distance_km: f64,
    duration_min: f64,
    description: String,
    details: Details,
}

impl Workout {
    /// Assumes `input` went through validation; no checks happen here.
    pub fn new(
        id: WorkoutId,
        created_at: DateTime<Local>,
        coords: Coords,
        input: WorkoutInput,
    ) -> Self {
        let WorkoutInput {
            distance_km,
            duration_min,
            activity,
        } = input;

        let details = match activity {
            Activity::Running { cadence } => Details::Running {
                cadence,
                pace_min_per_km: duration_min / distance_km,
            },
            Activity::Cycling { elevation_gain } => Details::Cycling {
                elevation_gain_m: elevation_gain,
                speed_km_per_h: distance_km / (duration_min / 60.0),
            },
        };

        Self {
            id,
            created_at,
            coords,
            distance_km,
            duration_min,
            description: describe(activity.kind(), &created_at),
            details,
        }
    }

    pub const fn id(&self) -> WorkoutId {
        self.id
    }

    pub const fn created_at(&self) -> DateTime<Local> {
        self.created_at
    }

    pub const fn coords(&self) -> Coords {
        self.coords
    }

    pub const fn distance_km(&self) -> f64 {
        self.distance_km
    }

    pub const fn duration_min(&self) -> f64 {
        self.duration_min
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub const fn details(&self) -> Details {
        self.details
    }

    pub const fn kind(&self) -> WorkoutType {
        match self.details {
            Details::Running { .. } => WorkoutType::Running,
            Details::Cycling { .. } => WorkoutType::Cycling,
        }
    }

    /// The validated input this workout was built from.
    pub const fn input(&self) -> WorkoutInput {
        let activity = match self.details {
            Details::Running { cadence, .. } => Activity::Running { cadence },
            Details::Cycling {
                elevation_gain_m, ..
            } => Activity::Cycling {
                elevation_gain: elevation_gain_m,
            },
        };
        WorkoutInput {
            distance_km: self.distance_km,
            duration_min: self.duration_min,
            activity,
        }
    }
}

/// "Running on April 14"
fn describe(kind: WorkoutType, at: &DateTime<Local>) -> String {
    let month = MONTHS[at.month0() as usize];
    format!("{} on {month} {}", kind.label(), at.day())
}

/// In-memory workout collection, in creation order. Owns the id counter.
#[derive(Debug, Clone)]
pub struct WorkoutLog {
    workouts: Vec<Workout>,
    next_id: u64,
}

impl Default for WorkoutLog {
    fn default() -> Self {
        Self::new()
    }
}

impl WorkoutLog {
    pub const fn new() -> Self {
        Self {
            workouts: Vec::new(),
            next_id: FIRST_WORKOUT_ID,
        }
    }

    pub fn add(
        &mut self,
        coords: Coords,
        input: WorkoutInput,
        created_at: DateTime<Local>,
    ) -> &Workout {
        let id = WorkoutId(self.next_id);
        self.next_id += 1;
        self.workouts
            .push(Workout::new(id, created_at, coords, input));
        &self.workouts[self.workouts.len() - 1]
    }

    pub fn get(&self, id: WorkoutId) -> Option<&Workout> {
        self.workouts.iter().find(|w| w.id == id)
    }

    pub fn as_slice(&self) -> &[Workout] {
        &self.workouts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Workout> {
        self.workouts.iter()
    }

    pub fn len(&self) -> usize {
        self.workouts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workouts.is_empty()
    }
}

impl<'a> IntoIterator for &'a WorkoutLog {
    type Item = &'a Workout;
    type IntoIter = std::slice::Iter<'a, Workout>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
