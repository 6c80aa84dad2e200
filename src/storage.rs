use crate::dlog;
use crate::form::check_input;
use crate::types::{Activity, Coords, Details, Workout, WorkoutId, WorkoutInput, WorkoutLog};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use rusqlite::{Connection, OptionalExtension, params};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// Storage slot holding the serialized workout collection.
pub const WORKOUTS_KEY: &str = "workouts";

/// Named string slots that survive between sessions.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    slots: HashMap<String, String>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.slots.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.slots.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.slots.remove(key);
        Ok(())
    }
}

/// Key-value slots in a single SQLite table.
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Opening SQLite DB: {}", path.display()))?;
        tracing::info!(path = %path.display(), "using sqlite store");
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("Opening in-memory SQLite DB")?;
        Self::init(conn)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.execute_batch(
            r"
            CREATE TABLE IF NOT EXISTS kv (
              key    TEXT PRIMARY KEY,
              value  TEXT NOT NULL
            );
            ",
        )
        .context("Ensuring SQLite schema")?;
        Ok(Self { conn })
    }
}

impl KeyValueStore for SqliteStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row("SELECT value FROM kv WHERE key = ?1", [key], |row| row.get(0))
            .optional()
            .with_context(|| format!("Reading slot {key:?}"))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r"
                INSERT INTO kv (key, value) VALUES (?1, ?2)
                ON CONFLICT (key) DO UPDATE SET value = excluded.value
                ",
                params![key, value],
            )
            .with_context(|| format!("Writing slot {key:?}"))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", [key])
            .with_context(|| format!("Removing slot {key:?}"))?;
        Ok(())
    }
}

/// Variant part of a stored record, tagged by `type`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordActivity {
    #[serde(rename_all = "camelCase")]
    Running { cadence_steps_per_min: f64 },
    #[serde(rename_all = "camelCase")]
    Cycling { elevation_gain_m: f64 },
}

/// Plain stored form of a workout. Derived values are not stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRecord {
    #[serde(flatten)]
    pub activity: RecordActivity,
    pub coordinates: Coords,
    pub distance_km: f64,
    pub duration_min: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Local>>,
}

impl From<&Workout> for WorkoutRecord {
    fn from(w: &Workout) -> Self {
        let activity = match w.details() {
            Details::Running { cadence, .. } => RecordActivity::Running {
                cadence_steps_per_min: cadence,
            },
            Details::Cycling {
                elevation_gain_m, ..
            } => RecordActivity::Cycling { elevation_gain_m },
        };
        Self {
            activity,
            coordinates: w.coords(),
            distance_km: w.distance_km(),
            duration_min: w.duration_min(),
            created_at: Some(w.created_at()),
        }
    }
}

impl WorkoutRecord {
    pub const fn input(&self) -> WorkoutInput {
        let activity = match self.activity {
            RecordActivity::Running {
                cadence_steps_per_min,
            } => Activity::Running {
                cadence: cadence_steps_per_min,
            },
            RecordActivity::Cycling { elevation_gain_m } => Activity::Cycling {
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

/// Outcome of reading the workouts slot.
#[derive(Debug, Clone, PartialEq)]
pub enum Loaded {
    /// Slot absent or holding an empty list.
    Empty,
    Records(Vec<WorkoutRecord>),
    /// Slot present but unreadable. Callers should treat it as no history.
    Corrupt(String),
}

/// Reads and writes the workout collection in a [`KeyValueStore`] slot.
pub struct WorkoutStorage<S> {
    store: S,
}

impl<S: KeyValueStore> WorkoutStorage<S> {
    pub const fn new(store: S) -> Self {
        Self { store }
    }

    pub const fn store(&self) -> &S {
        &self.store
    }

    /// Overwrites the slot with the whole collection.
    pub fn save(&mut self, workouts: &[Workout]) -> Result<()> {
        let records: Vec<WorkoutRecord> = workouts.iter().map(WorkoutRecord::from).collect();
        let json = serde_json::to_string(&records).context("Serializing workouts")?;
        self.store.set(WORKOUTS_KEY, &json)?;
        dlog!("saved workouts={} bytes={}", records.len(), json.len());
        Ok(())
    }

    pub fn load(&self) -> Loaded {
        let raw = match self.store.get(WORKOUTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Loaded::Empty,
            Err(e) => return Loaded::Corrupt(format!("{e:#}")),
        };

        match serde_json::from_str::<Vec<WorkoutRecord>>(&raw) {
            Ok(records) if records.is_empty() => Loaded::Empty,
            Ok(records) => Loaded::Records(records),
            Err(e) => Loaded::Corrupt(e.to_string()),
        }
    }

    pub fn clear(&mut self) -> Result<()> {
        self.store.remove(WORKOUTS_KEY)
    }
}

/// Rebuilds workouts from stored records, appending them to `log` in order.
///
/// Derived values are recomputed by the workout constructor. Records whose
/// numbers fail validation are skipped. Records without a stored creation
/// time get `now`.
pub fn rehydrate(
    records: Vec<WorkoutRecord>,
    log: &mut WorkoutLog,
    now: DateTime<Local>,
) -> Vec<WorkoutId> {
    let mut ids = Vec::with_capacity(records.len());

    for (idx, record) in records.into_iter().enumerate() {
        let input = record.input();
        if let Err(e) = check_input(&input) {
            tracing::warn!(record = idx, err = %e, "skipping invalid stored workout");
            continue;
        }
        let created_at = record.created_at.unwrap_or(now);
        ids.push(log.add(record.coordinates, input, created_at).id());
    }

    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{WorkoutType, FIRST_WORKOUT_ID};
    use chrono::TimeZone;
    use serde_json::Value as JsonValue;

    fn sample_log() -> WorkoutLog {
        let mut log = WorkoutLog::new();
        log.add(
            Coords::new(48.85, 2.35),
            WorkoutInput {
                distance_km: 5.2,
                duration_min: 24.0,
                activity: Activity::Running { cadence: 178.0 },
            },
            Local.with_ymd_and_hms(2024, 5, 2, 7, 30, 0).unwrap(),
        );
        log.add(
            Coords::new(45.76, 4.83),
            WorkoutInput {
                distance_km: 27.0,
                duration_min: 95.0,
                activity: Activity::Cycling {
                    elevation_gain: 523.0,
                },
            },
            Local.with_ymd_and_hms(2024, 5, 9, 18, 0, 0).unwrap(),
        );
        log
    }

    #[test]
    fn memory_store_slots() {
        let mut store = MemoryStore::default();
        assert_eq!(store.get("a").unwrap(), None);
        store.set("a", "1").unwrap();
        store.set("a", "2").unwrap();
        assert_eq!(store.get("a").unwrap().as_deref(), Some("2"));
        store.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        store.remove("a").unwrap();
    }

    #[test]
    fn sqlite_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mapty.sqlite3");

        {
            let mut store = SqliteStore::open(&path).unwrap();
            store.set(WORKOUTS_KEY, "[]").unwrap();
            store.set(WORKOUTS_KEY, "[1]").unwrap();
        }

        let mut store = SqliteStore::open(&path).unwrap();
        assert_eq!(store.get(WORKOUTS_KEY).unwrap().as_deref(), Some("[1]"));
        store.remove(WORKOUTS_KEY).unwrap();
        assert_eq!(store.get(WORKOUTS_KEY).unwrap(), None);
    }

    #[test]
    fn save_then_load_preserves_stored_fields() {
        let log = sample_log();
        let mut storage = WorkoutStorage::new(MemoryStore::default());
        storage.save(log.as_slice()).unwrap();

        let Loaded::Records(records) = storage.load() else {
            panic!("expected records");
        };

        let mut restored = WorkoutLog::new();
        let now = Local.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap();
        let ids = rehydrate(records, &mut restored, now);
        assert_eq!(ids.len(), 2);

        for (before, after) in log.iter().zip(restored.iter()) {
            assert_eq!(before.kind(), after.kind());
            assert_eq!(before.coords(), after.coords());
            assert_eq!(before.distance_km(), after.distance_km());
            assert_eq!(before.duration_min(), after.duration_min());
            assert_eq!(before.details(), after.details());
            assert_eq!(before.description(), after.description());
        }
    }

    #[test]
    fn stored_json_uses_documented_field_names() {
        let log = sample_log();
        let mut storage = WorkoutStorage::new(MemoryStore::default());
        storage.save(log.as_slice()).unwrap();

        let raw = storage.store().get(WORKOUTS_KEY).unwrap().unwrap();
        let v: JsonValue = serde_json::from_str(&raw).unwrap();
        let first = &v[0];
        assert_eq!(first["type"], "running");
        assert_eq!(first["coordinates"], serde_json::json!([48.85, 2.35]));
        assert_eq!(first["distanceKm"], 5.2);
        assert_eq!(first["durationMin"], 24.0);
        assert_eq!(first["cadenceStepsPerMin"], 178.0);
        assert!(first.get("pace").is_none());

        assert_eq!(v[1]["type"], "cycling");
        assert_eq!(v[1]["elevationGainM"], 523.0);
    }

    #[test]
    fn load_accepts_records_without_created_at() {
        let mut store = MemoryStore::default();
        store
            .set(
                WORKOUTS_KEY,
                r#"[{"type":"cycling","coordinates":[1,2],"distanceKm":20,"durationMin":60,"elevationGainM":300}]"#,
            )
            .unwrap();
        let storage = WorkoutStorage::new(store);

        let Loaded::Records(records) = storage.load() else {
            panic!("expected records");
        };
        assert_eq!(records[0].created_at, None);

        let mut log = WorkoutLog::new();
        let now = Local.with_ymd_and_hms(2024, 8, 21, 9, 0, 0).unwrap();
        let ids = rehydrate(records, &mut log, now);
        assert_eq!(ids, vec![WorkoutId(FIRST_WORKOUT_ID)]);

        let w = log.get(ids[0]).unwrap();
        assert_eq!(w.kind(), WorkoutType::Cycling);
        assert_eq!(w.description(), "Cycling on August 21");
        assert_eq!(
            w.details(),
            Details::Cycling {
                elevation_gain_m: 300.0,
                speed_km_per_h: 20.0
            }
        );
    }

    #[test]
    fn absent_or_empty_slot_is_empty() {
        let mut storage = WorkoutStorage::new(MemoryStore::default());
        assert_eq!(storage.load(), Loaded::Empty);
        storage.save(&[]).unwrap();
        assert_eq!(storage.load(), Loaded::Empty);
    }

    #[test]
    fn malformed_slot_is_corrupt() {
        for bad in [
            "not json",
            r#"{"a":1}"#,
            r#"[{"type":"swimming","coordinates":[1,2],"distanceKm":1,"durationMin":1}]"#,
            r#"[{"coordinates":[1,2],"distanceKm":1,"durationMin":1,"cadenceStepsPerMin":1}]"#,
        ] {
            let mut store = MemoryStore::default();
            store.set(WORKOUTS_KEY, bad).unwrap();
            let storage = WorkoutStorage::new(store);
            assert!(
                matches!(storage.load(), Loaded::Corrupt(_)),
                "input {bad:?}"
            );
        }
    }

    #[test]
    fn rehydrate_skips_out_of_range_records() {
        let records = vec![
            WorkoutRecord {
                activity: RecordActivity::Running {
                    cadence_steps_per_min: 170.0,
                },
                coordinates: Coords::new(0.0, 0.0),
                distance_km: -1.0,
                duration_min: 30.0,
                created_at: None,
            },
            WorkoutRecord {
                activity: RecordActivity::Cycling {
                    elevation_gain_m: 10.0,
                },
                coordinates: Coords::new(1.0, 1.0),
                distance_km: 10.0,
                duration_min: 30.0,
                created_at: None,
            },
        ];
        let mut log = WorkoutLog::new();
        let ids = rehydrate(records, &mut log, Local::now());
        assert_eq!(ids.len(), 1);
        assert_eq!(log.len(), 1);
        assert_eq!(log.as_slice()[0].coords(), Coords::new(1.0, 1.0));
    }

    #[test]
    fn clear_empties_the_slot() {
        let mut storage = WorkoutStorage::new(SqliteStore::open_in_memory().unwrap());
        storage.save(sample_log().as_slice()).unwrap();
        assert!(matches!(storage.load(), Loaded::Records(_)));
        storage.clear().unwrap();
        assert_eq!(storage.load(), Loaded::Empty);
    }
}
