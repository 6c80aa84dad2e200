use crate::types::{Details, Workout};
use tracing_subscriber::{EnvFilter, fmt};

#[macro_export]
macro_rules! dlog {
    ($($arg:tt)*) => {
        tracing::debug!($($arg)*);
    };
}

/// Initialize colorful logging.
///
/// Default level is INFO.
/// - `-v` => DEBUG
/// - `-vv` => TRACE
/// - `-q` => WARN
/// - `-qq` => ERROR
///
/// `RUST_LOG` overrides everything (e.g. `RUST_LOG=trace`).
pub fn init_logging(verbose: u8, quiet: u8) {
    let net = i16::from(verbose) - i16::from(quiet);
    let level = match net {
        i16::MIN..=-2 => "error",
        -1 => "warn",
        0 => "info",
        1 => "debug",
        2..=i16::MAX => "trace",
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("warn,mapty={level}")));

    let show_src = matches!(level, "debug" | "trace");

    fmt()
        .with_env_filter(filter)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .with_target(true)
        .with_level(true)
        .with_file(show_src)
        .with_line_number(show_src)
        .compact()
        .init();
}

/// Marker popup text, e.g. `🏃‍♂️ Running on April 14`.
pub fn popup_text(w: &Workout) -> String {
    format!("{} {}", w.kind().icon(), w.description())
}

/// CSS-style class of the marker popup.
pub fn popup_class(w: &Workout) -> String {
    format!("{}-popup", w.kind())
}

/// One `(icon, value, unit)` cell per list-entry detail.
pub fn detail_cells(w: &Workout) -> Vec<(&'static str, String, &'static str)> {
    let mut cells = vec![
        (w.kind().icon(), w.distance_km().to_string(), "km"),
        ("⏱", w.duration_min().to_string(), "min"),
    ];

    match w.details() {
        Details::Running {
            cadence,
            pace_min_per_km,
        } => {
            cells.push(("⚡️", format!("{pace_min_per_km:.1}"), "min/km"));
            cells.push(("🦶🏼", cadence.to_string(), "spm"));
        }
        Details::Cycling {
            elevation_gain_m,
            speed_km_per_h,
        } => {
            cells.push(("⚡️", format!("{speed_km_per_h:.1}"), "km/h"));
            cells.push(("⛰", elevation_gain_m.to_string(), "m"));
        }
    }

    cells
}

/// `[1000] Running on April 14  🏃‍♂️ 5 km  ⏱ 30 min  ⚡️ 6.0 min/km  🦶🏼 170 spm`
pub fn summary_line(w: &Workout) -> String {
    let cells: Vec<String> = detail_cells(w)
        .into_iter()
        .map(|(icon, value, unit)| format!("{icon} {value} {unit}"))
        .collect();
    format!("[{}] {}  {}", w.id(), w.description(), cells.join("  "))
}
