use crate::types::{Activity, Coords, WorkoutInput, WorkoutType};
use std::fmt;
use thiserror::Error;

/// Field values exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawForm {
    pub kind: WorkoutType,
    pub distance: String,
    pub duration: String,
    pub cadence: String,
    pub elevation: String,
}

impl RawForm {
    pub fn running(
        distance: impl Into<String>,
        duration: impl Into<String>,
        cadence: impl Into<String>,
    ) -> Self {
        Self {
            kind: WorkoutType::Running,
            distance: distance.into(),
            duration: duration.into(),
            cadence: cadence.into(),
            elevation: String::new(),
        }
    }

    pub fn cycling(
        distance: impl Into<String>,
        duration: impl Into<String>,
        elevation: impl Into<String>,
    ) -> Self {
        Self {
            kind: WorkoutType::Cycling,
            distance: distance.into(),
            duration: duration.into(),
            cadence: String::new(),
            elevation: elevation.into(),
        }
    }

    /// Checks every field the selected type needs.
    ///
    /// All required fields must parse to finite numbers before any range
    /// check runs, so a form with both a bad number and a zero reports the
    /// bad number.
    pub fn validate(&self) -> Result<WorkoutInput, ValidationError> {
        let distance_km = parse_finite(Field::Distance, &self.distance)?;
        let duration_min = parse_finite(Field::Duration, &self.duration)?;
        let activity = match self.kind {
            WorkoutType::Running => Activity::Running {
                cadence: parse_finite(Field::Cadence, &self.cadence)?,
            },
            WorkoutType::Cycling => Activity::Cycling {
                elevation_gain: parse_finite(Field::Elevation, &self.elevation)?,
            },
        };

        let input = WorkoutInput {
            distance_km,
            duration_min,
            activity,
        };
        check_input(&input)?;
        Ok(input)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Distance,
    Duration,
    Cadence,
    Elevation,
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Distance => "distance",
            Self::Duration => "duration",
            Self::Cadence => "cadence",
            Self::Elevation => "elevation gain",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must be a number, got {value:?}")]
    NotANumber { field: Field, value: String },

    #[error("{field} must be a positive number")]
    NotPositive { field: Field },

    #[error("{field} must not be negative")]
    Negative { field: Field },
}

impl ValidationError {
    pub const fn field(&self) -> Field {
        match self {
            Self::NotANumber { field, .. } | Self::NotPositive { field } | Self::Negative { field } => {
                *field
            }
        }
    }
}

/// Range rules for an already-numeric input.
///
/// Distance, duration and cadence must be > 0 and finite; elevation gain
/// must be >= 0 and finite.
pub fn check_input(input: &WorkoutInput) -> Result<(), ValidationError> {
    require_positive(Field::Distance, input.distance_km)?;
    require_positive(Field::Duration, input.duration_min)?;
    match input.activity {
        Activity::Running { cadence } => require_positive(Field::Cadence, cadence),
        Activity::Cycling { elevation_gain } => {
            if !elevation_gain.is_finite() {
                return Err(ValidationError::NotANumber {
                    field: Field::Elevation,
                    value: elevation_gain.to_string(),
                });
            }
            if elevation_gain < 0.0 {
                return Err(ValidationError::Negative {
                    field: Field::Elevation,
                });
            }
            Ok(())
        }
    }
}

fn parse_finite(field: Field, raw: &str) -> Result<f64, ValidationError> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| ValidationError::NotANumber {
            field,
            value: raw.to_string(),
        })
}

fn require_positive(field: Field, v: f64) -> Result<(), ValidationError> {
    if !v.is_finite() {
        return Err(ValidationError::NotANumber {
            field,
            value: v.to_string(),
        });
    }
    if v > 0.0 {
        Ok(())
    } else {
        Err(ValidationError::NotPositive { field })
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SubmitError {
    #[error("no location selected, click on the map first")]
    NoPendingLocation,

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// Lifecycle of the entry form.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum FormState {
    /// Hidden, nothing pending.
    #[default]
    Idle,
    /// Visible, waiting for a submission for the clicked location.
    AwaitingInput { at: Coords },
}

/// Form state plus the type selector, which decides the visible extra field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Form {
    state: FormState,
    kind: WorkoutType,
}

impl Form {
    pub const fn state(&self) -> FormState {
        self.state
    }

    pub const fn is_open(&self) -> bool {
        matches!(self.state, FormState::AwaitingInput { .. })
    }

    pub const fn pending(&self) -> Option<Coords> {
        match self.state {
            FormState::AwaitingInput { at } => Some(at),
            FormState::Idle => None,
        }
    }

    pub const fn kind(&self) -> WorkoutType {
        self.kind
    }

    /// A later click while open replaces the pending location.
    pub const fn open(&mut self, at: Coords) {
        self.state = FormState::AwaitingInput { at };
    }

    pub const fn close(&mut self) {
        self.state = FormState::Idle;
    }

    /// Returns whether the selection changed.
    pub fn select(&mut self, kind: WorkoutType) -> bool {
        let changed = self.kind != kind;
        self.kind = kind;
        changed
    }

    /// On success the form closes and the pending location is handed out.
    /// On failure nothing changes.
    pub fn submit(&mut self, raw: &RawForm) -> Result<(Coords, WorkoutInput), SubmitError> {
        let at = self.pending().ok_or(SubmitError::NoPendingLocation)?;
        let input = raw.validate()?;
        self.close();
        Ok((at, input))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_valid_running() {
        let input = RawForm::running("5", "30", "170").validate().unwrap();
        assert_eq!(input.distance_km, 5.0);
        assert_eq!(input.duration_min, 30.0);
        assert_eq!(input.activity, Activity::Running { cadence: 170.0 });
    }

    #[test]
    fn accepts_valid_cycling_with_flat_route() {
        let input = RawForm::cycling(" 20 ", "60", "0").validate().unwrap();
        assert_eq!(input.distance_km, 20.0);
        assert_eq!(
            input.activity,
            Activity::Cycling {
                elevation_gain: 0.0
            }
        );
    }

    #[test]
    fn rejects_non_numbers() {
        for bad in ["abc", "", "NaN", "inf", "-infinity", "5km"] {
            let err = RawForm::running(bad, "30", "170").validate().unwrap_err();
            assert_eq!(
                err,
                ValidationError::NotANumber {
                    field: Field::Distance,
                    value: bad.to_string()
                },
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn rejects_non_positive_distance_and_duration() {
        let err = RawForm::running("-5", "30", "170").validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotPositive {
                field: Field::Distance
            }
        );

        let err = RawForm::cycling("20", "0", "300").validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::NotPositive {
                field: Field::Duration
            }
        );
    }

    #[test]
    fn running_requires_positive_cadence() {
        let err = RawForm::running("5", "30", "0").validate().unwrap_err();
        assert_eq!(err.field(), Field::Cadence);
    }

    #[test]
    fn cycling_rejects_negative_elevation() {
        let err = RawForm::cycling("20", "60", "-10").validate().unwrap_err();
        assert_eq!(
            err,
            ValidationError::Negative {
                field: Field::Elevation
            }
        );
    }

    #[test]
    fn number_check_runs_before_range_check() {
        let err = RawForm::running("0", "30", "abc").validate().unwrap_err();
        assert_eq!(err.field(), Field::Cadence);
        assert!(matches!(err, ValidationError::NotANumber { .. }));
    }

    #[test]
    fn unused_field_is_ignored() {
        let mut raw = RawForm::running("5", "30", "170");
        raw.elevation = "garbage".into();
        assert!(raw.validate().is_ok());
    }

    #[test]
    fn form_lifecycle() {
        let mut form = Form::default();
        assert_eq!(form.state(), FormState::Idle);
        assert_eq!(
            form.submit(&RawForm::running("5", "30", "170")),
            Err(SubmitError::NoPendingLocation)
        );

        form.open(Coords::new(1.0, 2.0));
        form.open(Coords::new(3.0, 4.0));
        assert_eq!(form.pending(), Some(Coords::new(3.0, 4.0)));

        let err = form.submit(&RawForm::running("x", "30", "170")).unwrap_err();
        assert!(matches!(err, SubmitError::Invalid(_)));
        assert!(form.is_open());

        let (at, input) = form.submit(&RawForm::running("5", "30", "170")).unwrap();
        assert_eq!(at, Coords::new(3.0, 4.0));
        assert_eq!(input.distance_km, 5.0);
        assert_eq!(form.state(), FormState::Idle);
    }

    #[test]
    fn select_reports_changes() {
        let mut form = Form::default();
        assert_eq!(form.kind(), WorkoutType::Running);
        assert!(!form.select(WorkoutType::Running));
        assert!(form.select(WorkoutType::Cycling));
        assert_eq!(form.kind(), WorkoutType::Cycling);
    }
}
