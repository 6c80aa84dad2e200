#![deny(
    warnings,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::cargo
)]
#![allow(clippy::multiple_crate_versions)]

use anyhow::{Result, bail};
use clap::Parser;
use mapty::app::{App, Event};
use mapty::form::RawForm;
use mapty::storage::SqliteStore;
use mapty::terminal::{ConsoleMap, ConsoleView, FixedPosition};
use mapty::types::WorkoutId;
use mapty::{cli, utils};

#[macro_use]
extern crate mapty;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    utils::init_logging(cli.verbose, cli.quiet);

    let store = SqliteStore::open(&cli.db)?;
    let mut geo = FixedPosition::new(cli.position);
    let mut app =
        App::new(ConsoleMap::default(), ConsoleView::default(), store).with_zoom(cli.zoom);
    dlog!(
        "db={} position={:?} zoom={}",
        cli.db.display(),
        cli.position,
        cli.zoom
    );

    if matches!(cli.cmd, Some(cli::Cmd::Reset)) {
        dlog!("mode=reset");
        app.reset(&mut geo)?;
        println!("workout history cleared");
        return Ok(());
    }

    app.start(&mut geo);
    if !app.is_map_ready() {
        bail!("map unavailable: a current position is required (--position LAT,LNG)");
    }

    match cli.cmd.unwrap_or(cli::Cmd::List) {
        cli::Cmd::List | cli::Cmd::Reset => {
            dlog!("mode=list workouts={}", app.workouts().len());
            if app.workouts().is_empty() {
                println!("no workouts yet");
            }
        }
        cli::Cmd::Add {
            kind,
            at,
            distance,
            duration,
            cadence,
            elevation,
        } => {
            dlog!("mode=add kind={kind} at={at}");
            app.handle(Event::TypeChanged(kind))?;
            app.handle(Event::MapClick(at))?;

            let raw = RawForm {
                kind,
                distance,
                duration,
                cadence,
                elevation,
            };
            if app.handle(Event::Submit(raw)).is_err() {
                bail!("workout not recorded");
            }
        }
        cli::Cmd::Locate { id } => {
            dlog!("mode=locate id={id}");
            if app.select(Some(WorkoutId(id))).is_none() {
                tracing::warn!(id, "no workout with this id");
            }
        }
    }

    Ok(())
}
