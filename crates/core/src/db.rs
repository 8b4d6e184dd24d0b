//! Relational store handle and schema bootstrap.
//!
//! The store is SQLite behind a single mutex-guarded connection. Every
//! compound mutation in the core takes an IMMEDIATE transaction, which
//! acquires the write lock up front; invariant checks and the writes they
//! guard therefore observe the same state, for this process and for any
//! other process sharing the database file.
//!
//! Dates are stored as ISO-8601 text (`YYYY-MM-DD HH:MM:SS` for instants,
//! `YYYY-MM-DD` for civil dates) and converted at the row boundary by the
//! helpers at the bottom of this module.

use crate::config::{CoreConfig, StoreLocation};
use crate::{HospitalError, HospitalResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::{Connection, Row};
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS patient (
    patient_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    first_name     TEXT NOT NULL,
    last_name      TEXT NOT NULL,
    date_of_birth  TEXT,
    gender         TEXT,
    address        TEXT,
    phone          TEXT,
    registered_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS room (
    room_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    room_no     TEXT NOT NULL UNIQUE,
    room_type   TEXT NOT NULL,
    daily_cost  REAL NOT NULL,
    bed_stock   INTEGER NOT NULL,
    room_status TEXT NOT NULL DEFAULT 'Available'
);

CREATE TABLE IF NOT EXISTS bed (
    bed_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    room_id    INTEGER NOT NULL REFERENCES room (room_id),
    bed_no     TEXT NOT NULL,
    bed_type   TEXT,
    bed_status TEXT NOT NULL DEFAULT 'Available'
);

CREATE TABLE IF NOT EXISTS admission (
    admission_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    admission_date TEXT NOT NULL,
    discharge_date TEXT,
    patient_id     INTEGER NOT NULL REFERENCES patient (patient_id),
    room_id        INTEGER NOT NULL REFERENCES room (room_id),
    bed_id         INTEGER REFERENCES bed (bed_id)
);

CREATE TABLE IF NOT EXISTS treatment (
    treatment_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id    INTEGER NOT NULL REFERENCES patient (patient_id),
    doctor_id     INTEGER NOT NULL,
    diagnosis     TEXT NOT NULL,
    treatment_fee REAL NOT NULL DEFAULT 0,
    treated_on    TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS lab_test (
    test_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id INTEGER NOT NULL REFERENCES patient (patient_id),
    test_name  TEXT NOT NULL,
    test_cost  REAL NOT NULL DEFAULT 0,
    taken_on   TEXT NOT NULL,
    result     TEXT
);

CREATE TABLE IF NOT EXISTS medicine (
    medicine_id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name           TEXT NOT NULL,
    dosage         TEXT,
    price          REAL NOT NULL DEFAULT 0,
    stock_quantity INTEGER NOT NULL DEFAULT 0 CHECK (stock_quantity >= 0)
);

CREATE TABLE IF NOT EXISTS prescription (
    prescription_id INTEGER PRIMARY KEY AUTOINCREMENT,
    treatment_id    INTEGER NOT NULL REFERENCES treatment (treatment_id),
    medicine_id     INTEGER NOT NULL REFERENCES medicine (medicine_id),
    quantity        INTEGER NOT NULL CHECK (quantity > 0),
    instructions    TEXT,
    prescribed_on   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS appointment (
    appointment_id   INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id       INTEGER NOT NULL REFERENCES patient (patient_id),
    doctor_id        INTEGER NOT NULL,
    scheduled_at     TEXT NOT NULL,
    consultation_fee REAL NOT NULL DEFAULT 0,
    status           TEXT NOT NULL DEFAULT 'Scheduled'
);

CREATE TABLE IF NOT EXISTS payment (
    payment_id  INTEGER PRIMARY KEY AUTOINCREMENT,
    patient_id  INTEGER NOT NULL REFERENCES patient (patient_id),
    amount      REAL NOT NULL,
    method      TEXT,
    paid_at     TEXT NOT NULL,
    recorded_by INTEGER
);

CREATE INDEX IF NOT EXISTS idx_admission_patient ON admission (patient_id);
CREATE INDEX IF NOT EXISTS idx_admission_room ON admission (room_id);
CREATE INDEX IF NOT EXISTS idx_bed_room ON bed (room_id);
CREATE INDEX IF NOT EXISTS idx_treatment_patient ON treatment (patient_id);
CREATE INDEX IF NOT EXISTS idx_lab_test_patient ON lab_test (patient_id);
CREATE INDEX IF NOT EXISTS idx_prescription_treatment ON prescription (treatment_id);
CREATE INDEX IF NOT EXISTS idx_appointment_patient ON appointment (patient_id);
CREATE INDEX IF NOT EXISTS idx_payment_patient ON payment (patient_id);
";

/// Shared handle to the relational store.
///
/// Cloned freely via `Arc`; the inner connection is serialised behind a
/// mutex, matching the request-per-invocation model of the callers.
pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Opens the store described by `cfg`, bootstrapping the schema.
    pub fn open(cfg: &CoreConfig) -> HospitalResult<Self> {
        let conn = match cfg.store() {
            StoreLocation::File(path) => Connection::open(path)?,
            StoreLocation::InMemory => Connection::open_in_memory()?,
        };
        conn.busy_timeout(cfg.store_busy_timeout())?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Opens a private in-memory store. Shorthand used throughout the tests.
    pub fn open_in_memory() -> HospitalResult<Self> {
        Self::open(&CoreConfig::in_memory())
    }

    /// Locks the underlying connection for one unit of work.
    ///
    /// A poisoned mutex is recovered rather than propagated: SQLite keeps
    /// its own file-level consistency, and the guard only serialises access.
    pub fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database").finish_non_exhaustive()
    }
}

const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Renders an instant in the stored text form.
pub fn fmt_datetime(value: NaiveDateTime) -> String {
    value.format(DATETIME_FORMAT).to_string()
}

/// Renders a civil date in the stored text form.
pub fn fmt_date(value: NaiveDate) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// Parses a stored instant. Accepts the bare-date form for rows written by
/// earlier versions of the schema.
pub fn parse_stored_datetime(text: &str) -> HospitalResult<NaiveDateTime> {
    NaiveDateTime::parse_from_str(text, DATETIME_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(text, DATE_FORMAT)
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|err| {
            tracing::warn!(value = text, error = %err, "unparseable stored datetime");
            HospitalError::DataAccess(rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(err),
            ))
        })
}

/// Reads a TEXT column as an instant inside a row-mapping closure.
pub(crate) fn read_datetime(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let text: String = row.get(idx)?;
    NaiveDateTime::parse_from_str(&text, DATETIME_FORMAT)
        .or_else(|_| {
            NaiveDate::parse_from_str(&text, DATE_FORMAT)
                .map(|d| d.and_hms_opt(0, 0, 0).unwrap_or_default())
        })
        .map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(
                idx,
                rusqlite::types::Type::Text,
                Box::new(err),
            )
        })
}

/// Reads a nullable TEXT column as an instant.
pub(crate) fn read_datetime_opt(
    row: &Row<'_>,
    idx: usize,
) -> rusqlite::Result<Option<NaiveDateTime>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        None => Ok(None),
        Some(_) => read_datetime(row, idx).map(Some),
    }
}

/// Reads a TEXT column as a civil date.
pub(crate) fn read_date(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let text: String = row.get(idx)?;
    NaiveDate::parse_from_str(&text, DATE_FORMAT).map_err(|err| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(err))
    })
}

/// Reads a nullable TEXT column as a civil date.
pub(crate) fn read_date_opt(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let text: Option<String> = row.get(idx)?;
    match text {
        None => Ok(None),
        Some(_) => read_date(row, idx).map(Some),
    }
}
