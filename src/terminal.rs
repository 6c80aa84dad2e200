//! Console stand-ins for the map, the view and geolocation.

use crate::app::{Geolocation, GeolocationError, MapWidget, Popup, View};
use crate::dlog;
use crate::types::{Coords, Workout, WorkoutType};
use crate::utils::summary_line;

/// Tracks the map viewport and reports moves on stdout.
#[derive(Debug, Default)]
pub struct ConsoleMap {
    center: Option<(Coords, u8)>,
    markers: Vec<(Coords, Popup)>,
}

impl ConsoleMap {
    pub const fn center(&self) -> Option<(Coords, u8)> {
        self.center
    }

    pub fn markers(&self) -> &[(Coords, Popup)] {
        &self.markers
    }
}

impl MapWidget for ConsoleMap {
    fn init(&mut self, center: Coords, zoom: u8) {
        self.center = Some((center, zoom));
        self.markers.clear();
        dlog!("map_init center={center} zoom={zoom}");
    }

    fn add_marker(&mut self, at: Coords, popup: Popup) {
        dlog!("marker at={at} class={} text={}", popup.class, popup.text);
        self.markers.push((at, popup));
    }

    fn set_center(&mut self, at: Coords, zoom: u8) {
        self.center = Some((at, zoom));
        println!("📍 map centered on {at} (zoom {zoom})");
    }
}

/// Prints list entries to stdout and alerts to stderr.
#[derive(Debug, Default)]
pub struct ConsoleView {
    form_visible: bool,
    extra_field: WorkoutType,
}

impl ConsoleView {
    pub const fn form_visible(&self) -> bool {
        self.form_visible
    }

    pub const fn extra_field(&self) -> WorkoutType {
        self.extra_field
    }
}

impl View for ConsoleView {
    fn show_form(&mut self) {
        self.form_visible = true;
    }

    fn hide_form(&mut self) {
        self.form_visible = false;
    }

    fn show_extra_field(&mut self, kind: WorkoutType) {
        self.extra_field = kind;
        dlog!("form_extra_field kind={kind}");
    }

    fn render_workout(&mut self, workout: &Workout) {
        println!("{}", summary_line(workout));
    }

    fn clear_workouts(&mut self) {}

    fn alert(&mut self, message: &str) {
        eprintln!("⚠ {message}");
    }
}

/// Reports a position given up front, or fails if there is none.
#[derive(Debug, Clone, Copy)]
pub struct FixedPosition(Option<Coords>);

impl FixedPosition {
    pub const fn new(position: Option<Coords>) -> Self {
        Self(position)
    }
}

impl Geolocation for FixedPosition {
    fn current_position(&mut self) -> Result<Coords, GeolocationError> {
        self.0.ok_or_else(|| {
            GeolocationError::Unavailable("no position given (use --position LAT,LNG)".into())
        })
    }
}
