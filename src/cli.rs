use crate::app::DEFAULT_ZOOM;
use crate::types::{Coords, WorkoutType};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;

const DEFAULT_DB: &str = "mapty.sqlite3";

#[derive(Parser, Debug)]
#[command(
    name = "mapty",
    about = "Log running and cycling workouts at places on a map"
)]
pub struct Cli {
    /// SQLite file holding the saved workouts.
    #[arg(long, value_name = "PATH", default_value = DEFAULT_DB, global = true)]
    pub db: PathBuf,

    /// Current position, as reported by geolocation. Without it the map
    /// cannot be shown and saved workouts are not loaded.
    #[arg(long, value_name = "LAT,LNG", global = true, allow_hyphen_values = true)]
    pub position: Option<Coords>,

    /// Map zoom level used when centering.
    #[arg(long, default_value_t = DEFAULT_ZOOM, global = true)]
    pub zoom: u8,

    /// Increase log verbosity (-v, -vv). Defaults to INFO.
    #[arg(short = 'v', long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Decrease log verbosity (-q, -qq). Defaults to INFO.
    #[arg(short = 'q', long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub cmd: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
pub enum Cmd {
    /// Show saved workouts (default).
    List,

    /// Click the map at a location and submit the workout form.
    Add {
        /// running or cycling
        #[arg(value_name = "TYPE")]
        kind: WorkoutType,

        /// Where the workout happened.
        #[arg(long, value_name = "LAT,LNG", allow_hyphen_values = true)]
        at: Coords,

        /// Distance in km.
        #[arg(long, allow_hyphen_values = true)]
        distance: String,

        /// Duration in minutes.
        #[arg(long, allow_hyphen_values = true)]
        duration: String,

        /// Steps per minute (running).
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        cadence: String,

        /// Elevation gain in meters (cycling).
        #[arg(long, default_value = "", allow_hyphen_values = true)]
        elevation: String,
    },

    /// Center the map on a saved workout.
    Locate {
        /// Workout id as shown by `list`.
        id: u64,
    },

    /// Delete all saved workouts and start over.
    Reset,
}
