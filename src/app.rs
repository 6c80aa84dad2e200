use crate::dlog;
use crate::form::{Form, RawForm, SubmitError};
use crate::storage::{KeyValueStore, Loaded, WorkoutStorage, rehydrate};
use crate::types::{Coords, Workout, WorkoutId, WorkoutLog, WorkoutType};
use crate::utils::{popup_class, popup_text};
use anyhow::Result;
use chrono::{DateTime, Local};
use thiserror::Error;

pub const DEFAULT_ZOOM: u8 = 13;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Popup {
    pub text: String,
    pub class: String,
}

/// The map surface. Clicks come back in as [`Event::MapClick`].
pub trait MapWidget {
    fn init(&mut self, center: Coords, zoom: u8);
    fn add_marker(&mut self, at: Coords, popup: Popup);
    fn set_center(&mut self, at: Coords, zoom: u8);
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GeolocationError {
    #[error("could not get your position: {0}")]
    Unavailable(String),
}

pub trait Geolocation {
    fn current_position(&mut self) -> Result<Coords, GeolocationError>;
}

/// Form and workout list. Submissions come back in as [`Event::Submit`].
pub trait View {
    fn show_form(&mut self);
    /// Hide the form and blank its inputs.
    fn hide_form(&mut self);
    /// Show the cadence or elevation input, whichever `kind` needs.
    fn show_extra_field(&mut self, kind: WorkoutType);
    /// Add a list entry tagged with the workout id.
    fn render_workout(&mut self, workout: &Workout);
    fn clear_workouts(&mut self);
    fn alert(&mut self, message: &str);
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Position(Result<Coords, GeolocationError>),
    MapClick(Coords),
    TypeChanged(WorkoutType),
    Submit(RawForm),
    /// The workout id of the clicked list entry, if the click hit one.
    ListClick(Option<WorkoutId>),
}

/// Mediates between the map, the view, the workout log and storage.
///
/// Everything runs on the caller's thread, one event at a time.
pub struct App<M, V, S> {
    map: M,
    view: V,
    storage: WorkoutStorage<S>,
    workouts: WorkoutLog,
    form: Form,
    map_ready: bool,
    zoom: u8,
    clock: fn() -> DateTime<Local>,
}

impl<M: MapWidget, V: View, S: KeyValueStore> App<M, V, S> {
    pub fn new(map: M, view: V, store: S) -> Self {
        Self {
            map,
            view,
            storage: WorkoutStorage::new(store),
            workouts: WorkoutLog::new(),
            form: Form::default(),
            map_ready: false,
            zoom: DEFAULT_ZOOM,
            clock: Local::now,
        }
    }

    #[must_use]
    pub fn with_zoom(mut self, zoom: u8) -> Self {
        self.zoom = zoom;
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> DateTime<Local>) -> Self {
        self.clock = clock;
        self
    }

    pub const fn workouts(&self) -> &WorkoutLog {
        &self.workouts
    }

    pub const fn form(&self) -> &Form {
        &self.form
    }

    pub const fn is_map_ready(&self) -> bool {
        self.map_ready
    }

    pub const fn map(&self) -> &M {
        &self.map
    }

    pub const fn view(&self) -> &V {
        &self.view
    }

    pub const fn storage(&self) -> &WorkoutStorage<S> {
        &self.storage
    }

    /// Ask for the current position and finish startup with the answer.
    pub fn start(&mut self, geo: &mut impl Geolocation) {
        tracing::info!("requesting current position");
        let position = geo.current_position();
        self.on_position(position);
    }

    pub fn handle(&mut self, event: Event) -> Result<(), SubmitError> {
        match event {
            Event::Position(position) => self.on_position(position),
            Event::MapClick(at) => self.on_map_click(at),
            Event::TypeChanged(kind) => self.on_type_changed(kind),
            Event::Submit(raw) => {
                self.submit(&raw)?;
            }
            Event::ListClick(target) => {
                self.select(target);
            }
        }
        Ok(())
    }

    pub fn on_position(&mut self, position: Result<Coords, GeolocationError>) {
        match position {
            Ok(center) => {
                tracing::info!(%center, zoom = self.zoom, "map ready");
                self.map.init(center, self.zoom);
                self.map_ready = true;
                self.load_saved();
            }
            Err(e) => {
                tracing::warn!(err = %e, "geolocation failed; map unavailable");
                self.view.alert(&e.to_string());
            }
        }
    }

    pub fn on_map_click(&mut self, at: Coords) {
        if !self.map_ready {
            dlog!("map_click_ignored at={at} reason=map_not_ready");
            return;
        }
        dlog!("form_open at={at}");
        self.form.open(at);
        self.view.show_form();
    }

    pub fn on_type_changed(&mut self, kind: WorkoutType) {
        if self.form.select(kind) {
            self.view.show_extra_field(kind);
        }
    }

    /// Validate the form and record a workout at the pending location.
    ///
    /// On error the user is alerted, the form stays as it was and nothing
    /// is recorded or saved.
    pub fn submit(&mut self, raw: &RawForm) -> Result<WorkoutId, SubmitError> {
        let (at, input) = match self.form.submit(raw) {
            Ok(accepted) => accepted,
            Err(e) => {
                dlog!("submit_rejected err={e}");
                self.view.alert(&e.to_string());
                return Err(e);
            }
        };

        let workout = self.workouts.add(at, input, (self.clock)());
        let id = workout.id();
        tracing::info!(id = %id, kind = %workout.kind(), at = %at, "workout added");

        render(&mut self.map, &mut self.view, workout);
        self.view.hide_form();
        self.persist();

        Ok(id)
    }

    /// Center the map on the workout behind a list entry.
    ///
    /// Returns the coordinates moved to, or `None` if the click missed.
    pub fn select(&mut self, target: Option<WorkoutId>) -> Option<Coords> {
        let Some(id) = target else {
            dlog!("list_click_miss");
            return None;
        };
        let Some(workout) = self.workouts.get(id) else {
            dlog!("list_click_unknown id={id}");
            return None;
        };

        let at = workout.coords();
        self.map.set_center(at, self.zoom);
        Some(at)
    }

    /// Wipe storage and run startup again from scratch.
    pub fn reset(&mut self, geo: &mut impl Geolocation) -> Result<()> {
        self.storage.clear()?;
        tracing::info!("storage cleared; reloading");

        self.workouts = WorkoutLog::new();
        self.form = Form::default();
        self.map_ready = false;
        self.view.hide_form();
        self.view.show_extra_field(self.form.kind());
        self.view.clear_workouts();

        self.start(geo);
        Ok(())
    }

    fn load_saved(&mut self) {
        let records = match self.storage.load() {
            Loaded::Empty => {
                dlog!("no saved workouts");
                return;
            }
            Loaded::Corrupt(reason) => {
                tracing::warn!(reason = %reason, "saved workouts unreadable; starting empty");
                return;
            }
            Loaded::Records(records) => records,
        };

        let stored = records.len();
        let ids = rehydrate(records, &mut self.workouts, (self.clock)());
        for id in &ids {
            if let Some(workout) = self.workouts.get(*id) {
                render(&mut self.map, &mut self.view, workout);
            }
        }
        tracing::info!(stored, restored = ids.len(), "restored saved workouts");
    }

    fn persist(&mut self) {
        if let Err(e) = self.storage.save(self.workouts.as_slice()) {
            tracing::error!(err = %format!("{e:#}"), "saving workouts failed");
            self.view.alert("Could not save your workouts.");
        }
    }
}

fn render(map: &mut impl MapWidget, view: &mut impl View, workout: &Workout) {
    map.add_marker(
        workout.coords(),
        Popup {
            text: popup_text(workout),
            class: popup_class(workout),
        },
    );
    view.render_workout(workout);
}
