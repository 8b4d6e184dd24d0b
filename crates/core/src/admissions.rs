//! Admission lifecycle management.
//!
//! This module owns every state transition of an admission record and the
//! invariants that go with it:
//!
//! - a patient has at most one active admission (null discharge date);
//! - a room accepts a new active admission only while the count of active
//!   admissions is strictly below its declared bed stock;
//! - a bed may be assigned only if it exists, belongs to the admission's
//!   room, and is currently available.
//!
//! Every mutating operation runs inside a single IMMEDIATE transaction, so
//! the invariant checks and the writes they guard see the same state: two
//! concurrent admissions cannot both pass the capacity check for a room's
//! last slot, and a bed cannot be picked twice. Either the whole compound
//! mutation commits or none of it does.
//!
//! `room_status`/`bed_status` are treated as caches over live admission
//! rows and recomputed after every mutation here; `Maintenance` is the one
//! hand-set value and is never overwritten.

use crate::db::{fmt_datetime, read_datetime, read_datetime_opt, Database};
use crate::models::{Admission, AdmissionDraft, RoomAvailability};
use crate::validation::{parse_datetime_input, require_selected};
use crate::{HospitalError, HospitalResult};
use chrono::{Local, NaiveDate, NaiveDateTime};
use hms_types::{BedStatus, RoomStatus, RoomType};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use std::str::FromStr;
use std::sync::Arc;

/// Service owning admission state transitions.
#[derive(Clone, Debug)]
pub struct AdmissionService {
    db: Arc<Database>,
}

fn admission_from_row(row: &Row<'_>) -> rusqlite::Result<Admission> {
    Ok(Admission {
        admission_id: row.get(0)?,
        admission_date: read_datetime(row, 1)?,
        discharge_date: read_datetime_opt(row, 2)?,
        patient_id: row.get(3)?,
        room_id: row.get(4)?,
        bed_id: row.get(5)?,
    })
}

const ADMISSION_COLUMNS: &str =
    "admission_id, admission_date, discharge_date, patient_id, room_id, bed_id";

impl AdmissionService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Point-in-time snapshot of rooms that can take another admission.
    ///
    /// Rooms under maintenance are excluded; the rest are reported with
    /// `available_slots = bed_stock − active admissions`, positive rows
    /// only, ordered by room type then id. The snapshot is advisory — the
    /// capacity invariant is re-checked inside [`AdmissionService::admit`].
    pub fn available_rooms(&self) -> HospitalResult<Vec<RoomAvailability>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT r.room_id, r.room_no, r.room_type, r.daily_cost, r.bed_stock,
                    (SELECT COUNT(*) FROM admission a
                     WHERE a.room_id = r.room_id AND a.discharge_date IS NULL)
             FROM room r
             WHERE r.room_status <> ?1
             ORDER BY r.room_type, r.room_id",
        )?;
        let rows = stmt.query_map([RoomStatus::Maintenance.as_str()], |row| {
            let room_type: String = row.get(2)?;
            let bed_stock: i64 = row.get(4)?;
            let occupied: i64 = row.get(5)?;
            Ok(RoomAvailability {
                room_id: row.get(0)?,
                room_no: row.get(1)?,
                room_type: RoomType::from_str(&room_type).map_err(|err| {
                    rusqlite::Error::FromSqlConversionFailure(
                        2,
                        rusqlite::types::Type::Text,
                        Box::new(err),
                    )
                })?,
                daily_cost: row.get(3)?,
                bed_stock,
                available_slots: bed_stock - occupied,
            })
        })?;

        let mut available = Vec::new();
        for row in rows {
            let room = row?;
            if room.available_slots > 0 {
                available.push(room);
            }
        }
        Ok(available)
    }

    /// Admits a patient, returning the new admission id.
    ///
    /// Order of checks: field validation, bed assignability (when a bed was
    /// chosen), the single-active-admission invariant, the room capacity
    /// invariant. When no bed was chosen the lowest-id available bed in the
    /// room is assigned; if the room has capacity but no free bed row, the
    /// admission proceeds without one.
    pub fn admit(&self, draft: &AdmissionDraft) -> HospitalResult<i64> {
        let admitted_at = validate_draft(draft)?;
        let mut conn = self.db.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        if let Some(bed_id) = draft.bed_id {
            check_bed_assignable(&tx, bed_id, draft.room_id)?;
        }
        if has_active_admission(&tx, draft.patient_id, None)? {
            return Err(HospitalError::AlreadyAdmitted);
        }
        let (bed_stock, occupied) = room_capacity(&tx, draft.room_id, None)?;
        if occupied >= bed_stock {
            return Err(HospitalError::RoomFull);
        }

        let bed_id = match draft.bed_id {
            Some(bed_id) => Some(bed_id),
            None => first_available_bed(&tx, draft.room_id)?,
        };

        tx.execute(
            "INSERT INTO admission (admission_date, patient_id, room_id, bed_id)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                fmt_datetime(admitted_at),
                draft.patient_id,
                draft.room_id,
                bed_id
            ],
        )?;
        let admission_id = tx.last_insert_rowid();

        if let Some(bed_id) = bed_id {
            refresh_bed_status(&tx, bed_id)?;
        }
        refresh_room_status(&tx, draft.room_id)?;

        tx.commit()?;
        Ok(admission_id)
    }

    /// Rewrites an admission's fields.
    ///
    /// Re-runs the same invariants as [`AdmissionService::admit`] against
    /// the new field values, excluding the admission being edited from the
    /// counts. Bed and room status caches are recomputed for everything the
    /// edit touches.
    pub fn update(&self, admission_id: i64, draft: &AdmissionDraft) -> HospitalResult<()> {
        let admitted_at = validate_draft(draft)?;
        let mut conn = self.db.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing = load_admission(&tx, admission_id)?;

        if let Some(bed_id) = draft.bed_id {
            if existing.bed_id == Some(bed_id) {
                // Keeping the bed: it still has to sit in the target room.
                let bed_room: Option<i64> = tx
                    .query_row(
                        "SELECT room_id FROM bed WHERE bed_id = ?1",
                        [bed_id],
                        |row| row.get(0),
                    )
                    .optional()?;
                if bed_room != Some(draft.room_id) {
                    return Err(HospitalError::BedUnavailable(
                        "bed belongs to a different room".to_owned(),
                    ));
                }
            } else {
                check_bed_assignable(&tx, bed_id, draft.room_id)?;
            }
        }

        if existing.is_active() {
            if has_active_admission(&tx, draft.patient_id, Some(admission_id))? {
                return Err(HospitalError::AlreadyAdmitted);
            }
            if draft.room_id != existing.room_id {
                let (bed_stock, occupied) =
                    room_capacity(&tx, draft.room_id, Some(admission_id))?;
                if occupied >= bed_stock {
                    return Err(HospitalError::RoomFull);
                }
            }
        }

        tx.execute(
            "UPDATE admission
             SET admission_date = ?1, patient_id = ?2, room_id = ?3, bed_id = ?4
             WHERE admission_id = ?5",
            params![
                fmt_datetime(admitted_at),
                draft.patient_id,
                draft.room_id,
                draft.bed_id,
                admission_id
            ],
        )?;

        if let Some(old_bed) = existing.bed_id {
            refresh_bed_status(&tx, old_bed)?;
        }
        if let Some(new_bed) = draft.bed_id {
            refresh_bed_status(&tx, new_bed)?;
        }
        refresh_room_status(&tx, existing.room_id)?;
        if draft.room_id != existing.room_id {
            refresh_room_status(&tx, draft.room_id)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Closes an active admission and frees its bed.
    ///
    /// The discharge instant defaults to now. Discharging twice fails with
    /// [`HospitalError::AlreadyDischarged`] and changes nothing.
    pub fn discharge(
        &self,
        admission_id: i64,
        discharged_at: Option<NaiveDateTime>,
    ) -> HospitalResult<()> {
        let mut conn = self.db.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let admission = load_admission(&tx, admission_id)?;
        if admission.discharge_date.is_some() {
            return Err(HospitalError::AlreadyDischarged);
        }

        let when = discharged_at.unwrap_or_else(|| Local::now().naive_local());
        tx.execute(
            "UPDATE admission SET discharge_date = ?1 WHERE admission_id = ?2",
            params![fmt_datetime(when), admission_id],
        )?;

        if let Some(bed_id) = admission.bed_id {
            refresh_bed_status(&tx, bed_id)?;
        }
        refresh_room_status(&tx, admission.room_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Removes an admission record, freeing its bed regardless of the
    /// discharge state.
    pub fn delete(&self, admission_id: i64) -> HospitalResult<()> {
        let mut conn = self.db.lock();
        let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let admission = load_admission(&tx, admission_id)?;
        tx.execute(
            "DELETE FROM admission WHERE admission_id = ?1",
            [admission_id],
        )?;

        if let Some(bed_id) = admission.bed_id {
            refresh_bed_status(&tx, bed_id)?;
        }
        refresh_room_status(&tx, admission.room_id)?;

        tx.commit()?;
        Ok(())
    }

    /// Charge for the stay: inclusive day count times the room's daily
    /// cost. Open admissions are costed up to now.
    ///
    /// Non-raising: returns 0 when the admission is missing, the cost basis
    /// cannot be resolved, or the store fails. Failures are logged.
    pub fn stay_cost(&self, admission_id: i64) -> f64 {
        match self.try_stay_cost(admission_id) {
            Ok(cost) => cost,
            Err(err) => {
                tracing::error!(admission_id, error = %err, "stay cost unavailable");
                0.0
            }
        }
    }

    fn try_stay_cost(&self, admission_id: i64) -> HospitalResult<f64> {
        let conn = self.db.lock();
        let row = conn
            .query_row(
                "SELECT a.admission_date, a.discharge_date,
                        COALESCE(
                            (SELECT daily_cost FROM room WHERE room_id = a.room_id),
                            (SELECT r.daily_cost FROM bed b
                             JOIN room r ON r.room_id = b.room_id
                             WHERE b.bed_id = a.bed_id))
                 FROM admission a WHERE a.admission_id = ?1",
                [admission_id],
                |row| {
                    Ok((
                        read_datetime(row, 0)?,
                        read_datetime_opt(row, 1)?,
                        row.get::<_, Option<f64>>(2)?,
                    ))
                },
            )
            .optional()?;

        let Some((admitted_at, discharged_at, daily_cost)) = row else {
            return Ok(0.0);
        };
        let Some(daily_cost) = daily_cost else {
            tracing::warn!(admission_id, "no daily cost resolvable for admission");
            return Ok(0.0);
        };
        Ok(stay_charge(
            admitted_at,
            discharged_at,
            daily_cost,
            Local::now().naive_local(),
        ))
    }

    /// Loads one admission, failing with `NotFound` when absent.
    pub fn get(&self, admission_id: i64) -> HospitalResult<Admission> {
        let conn = self.db.lock();
        load_admission(&conn, admission_id)
    }

    pub fn list(&self) -> HospitalResult<Vec<Admission>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ADMISSION_COLUMNS} FROM admission ORDER BY admission_date, admission_id"
        ))?;
        let rows = stmt.query_map([], admission_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    pub fn for_patient(&self, patient_id: i64) -> HospitalResult<Vec<Admission>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT {ADMISSION_COLUMNS} FROM admission WHERE patient_id = ?1
             ORDER BY admission_date, admission_id"
        ))?;
        let rows = stmt.query_map([patient_id], admission_from_row)?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

fn validate_draft(draft: &AdmissionDraft) -> HospitalResult<NaiveDateTime> {
    let mut errors = Vec::new();
    let admitted_at = parse_datetime_input(&draft.admission_date);
    if admitted_at.is_none() {
        errors.push(format!(
            "admission date '{}' is not a recognised date",
            draft.admission_date.trim()
        ));
    }
    require_selected(&mut errors, draft.patient_id, "patient");
    require_selected(&mut errors, draft.room_id, "room");
    if let Some(bed_id) = draft.bed_id {
        if bed_id <= 0 {
            errors.push("bed reference must be a positive id".to_owned());
        }
    }
    match admitted_at {
        Some(parsed) if errors.is_empty() => Ok(parsed),
        _ => Err(HospitalError::Validation(errors)),
    }
}

fn load_admission(conn: &Connection, admission_id: i64) -> HospitalResult<Admission> {
    conn.query_row(
        &format!("SELECT {ADMISSION_COLUMNS} FROM admission WHERE admission_id = ?1"),
        [admission_id],
        admission_from_row,
    )
    .optional()?
    .ok_or(HospitalError::NotFound("admission"))
}

fn has_active_admission(
    conn: &Connection,
    patient_id: i64,
    exclude: Option<i64>,
) -> HospitalResult<bool> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM admission
         WHERE patient_id = ?1 AND discharge_date IS NULL AND admission_id <> ?2",
        params![patient_id, exclude.unwrap_or(0)],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

/// Declared stock and current active-admission count for a room.
fn room_capacity(
    conn: &Connection,
    room_id: i64,
    exclude: Option<i64>,
) -> HospitalResult<(i64, i64)> {
    let bed_stock: Option<i64> = conn
        .query_row(
            "SELECT bed_stock FROM room WHERE room_id = ?1",
            [room_id],
            |row| row.get(0),
        )
        .optional()?;
    let bed_stock = bed_stock.ok_or(HospitalError::NotFound("room"))?;
    let occupied: i64 = conn.query_row(
        "SELECT COUNT(*) FROM admission
         WHERE room_id = ?1 AND discharge_date IS NULL AND admission_id <> ?2",
        params![room_id, exclude.unwrap_or(0)],
        |row| row.get(0),
    )?;
    Ok((bed_stock, occupied))
}

fn check_bed_assignable(conn: &Connection, bed_id: i64, room_id: i64) -> HospitalResult<()> {
    let bed: Option<(i64, String)> = conn
        .query_row(
            "SELECT room_id, bed_status FROM bed WHERE bed_id = ?1",
            [bed_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let Some((bed_room, status)) = bed else {
        return Err(HospitalError::BedUnavailable("bed does not exist".to_owned()));
    };
    if bed_room != room_id {
        return Err(HospitalError::BedUnavailable(
            "bed belongs to a different room".to_owned(),
        ));
    }
    if status != BedStatus::Available.as_str() {
        return Err(HospitalError::BedUnavailable("bed is not available".to_owned()));
    }
    Ok(())
}

/// Lowest-id available bed in the room, if any.
fn first_available_bed(conn: &Connection, room_id: i64) -> HospitalResult<Option<i64>> {
    let bed_id = conn
        .query_row(
            "SELECT bed_id FROM bed WHERE room_id = ?1 AND bed_status = ?2
             ORDER BY bed_id LIMIT 1",
            params![room_id, BedStatus::Available.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    Ok(bed_id)
}

fn refresh_bed_status(conn: &Connection, bed_id: i64) -> HospitalResult<()> {
    conn.execute(
        "UPDATE bed SET bed_status = CASE
             WHEN bed_status = 'Maintenance' THEN 'Maintenance'
             WHEN EXISTS (SELECT 1 FROM admission
                          WHERE bed_id = ?1 AND discharge_date IS NULL) THEN 'Occupied'
             ELSE 'Available' END
         WHERE bed_id = ?1",
        [bed_id],
    )?;
    Ok(())
}

fn refresh_room_status(conn: &Connection, room_id: i64) -> HospitalResult<()> {
    conn.execute(
        "UPDATE room SET room_status = CASE
             WHEN room_status = 'Maintenance' THEN 'Maintenance'
             WHEN EXISTS (SELECT 1 FROM admission
                          WHERE room_id = ?1 AND discharge_date IS NULL) THEN 'Occupied'
             ELSE 'Available' END
         WHERE room_id = ?1",
        [room_id],
    )?;
    Ok(())
}

/// Charge for one stay at `daily_cost`, counted inclusively: same-day
/// admission and discharge is one day. Open stays are costed to `as_of`.
pub(crate) fn stay_charge(
    admitted_at: NaiveDateTime,
    discharged_at: Option<NaiveDateTime>,
    daily_cost: f64,
    as_of: NaiveDateTime,
) -> f64 {
    let end = discharged_at.unwrap_or(as_of);
    inclusive_days(admitted_at.date(), end.date()) as f64 * daily_cost
}

pub(crate) fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end.signed_duration_since(start).num_days() + 1).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewBed, NewPatient, NewRoom};
    use crate::repositories::{patients, wards};
    use hms_types::NonEmptyText;

    fn setup() -> (Arc<Database>, AdmissionService) {
        let db = Arc::new(Database::open_in_memory().expect("open in-memory store"));
        let service = AdmissionService::new(db.clone());
        (db, service)
    }

    fn seed_patient(db: &Database, first: &str) -> i64 {
        patients::register_patient(
            &db.lock(),
            &NewPatient {
                first_name: NonEmptyText::new(first).unwrap(),
                last_name: NonEmptyText::new("Tester").unwrap(),
                date_of_birth: None,
                gender: None,
                address: None,
                phone: None,
            },
        )
        .expect("seed patient")
    }

    fn seed_room(db: &Database, no: &str, stock: i64, beds: usize) -> (i64, Vec<i64>) {
        let conn = db.lock();
        let room_id = wards::create_room(
            &conn,
            &NewRoom {
                room_no: NonEmptyText::new(no).unwrap(),
                room_type: RoomType::General,
                daily_cost: 100.0,
                bed_stock: stock,
            },
        )
        .expect("seed room");
        let mut bed_ids = Vec::new();
        for i in 0..beds {
            let bed_id = wards::create_bed(
                &conn,
                &NewBed {
                    room_id,
                    bed_no: NonEmptyText::new(format!("{no}-B{i}")).unwrap(),
                    bed_type: None,
                },
            )
            .expect("seed bed");
            bed_ids.push(bed_id);
        }
        (room_id, bed_ids)
    }

    fn draft(patient_id: i64, room_id: i64) -> AdmissionDraft {
        AdmissionDraft {
            admission_date: "2024-01-01 10:00".to_owned(),
            patient_id,
            room_id,
            bed_id: None,
        }
    }

    fn bed_status(db: &Database, bed_id: i64) -> BedStatus {
        wards::get_bed(&db.lock(), bed_id)
            .unwrap()
            .expect("bed should exist")
            .bed_status
    }

    fn admission_count(db: &Database) -> i64 {
        db.lock()
            .query_row("SELECT COUNT(*) FROM admission", [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_admit_assigns_lowest_free_bed() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, bed_ids) = seed_room(&db, "G1", 2, 2);

        let admission_id = service.admit(&draft(patient, room_id)).expect("admit");
        let admission = service.get(admission_id).expect("load");

        assert_eq!(admission.bed_id, Some(bed_ids[0]));
        assert_eq!(bed_status(&db, bed_ids[0]), BedStatus::Occupied);
        assert_eq!(bed_status(&db, bed_ids[1]), BedStatus::Available);
    }

    #[test]
    fn test_admit_rejects_already_admitted_patient() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, _) = seed_room(&db, "G1", 3, 3);

        service.admit(&draft(patient, room_id)).expect("first admit");
        let err = service
            .admit(&draft(patient, room_id))
            .expect_err("second admit should fail");

        assert!(matches!(err, HospitalError::AlreadyAdmitted));
        assert_eq!(admission_count(&db), 1, "no second row inserted");
    }

    #[test]
    fn test_admit_enforces_room_capacity() {
        let (db, service) = setup();
        let (room_id, _) = seed_room(&db, "G1", 2, 2);
        let first = seed_patient(&db, "Amina");
        let second = seed_patient(&db, "Brian");
        let third = seed_patient(&db, "Chioma");

        service.admit(&draft(first, room_id)).expect("slot 1");
        service.admit(&draft(second, room_id)).expect("slot 2");
        let err = service
            .admit(&draft(third, room_id))
            .expect_err("room is full");

        assert!(matches!(err, HospitalError::RoomFull));
        assert_eq!(admission_count(&db), 2, "capacity breach inserted nothing");
    }

    #[test]
    fn test_admit_rejects_occupied_bed() {
        let (db, service) = setup();
        let (room_id, bed_ids) = seed_room(&db, "G1", 2, 2);
        let first = seed_patient(&db, "Amina");
        let second = seed_patient(&db, "Brian");

        service.admit(&draft(first, room_id)).expect("first admit");
        let mut taken = draft(second, room_id);
        taken.bed_id = Some(bed_ids[0]);

        let err = service.admit(&taken).expect_err("bed is occupied");
        assert!(matches!(err, HospitalError::BedUnavailable(_)));
    }

    #[test]
    fn test_admit_rejects_bed_from_another_room() {
        let (db, service) = setup();
        let (room_a, _) = seed_room(&db, "G1", 2, 1);
        let (_, beds_b) = seed_room(&db, "G2", 2, 1);
        let patient = seed_patient(&db, "Amina");

        let mut wrong_room = draft(patient, room_a);
        wrong_room.bed_id = Some(beds_b[0]);

        let err = service.admit(&wrong_room).expect_err("bed in wrong room");
        assert!(matches!(err, HospitalError::BedUnavailable(_)));
    }

    #[test]
    fn test_admit_collects_validation_errors() {
        let (db, service) = setup();
        let bad = AdmissionDraft {
            admission_date: "next tuesday".to_owned(),
            patient_id: 0,
            room_id: 0,
            bed_id: None,
        };
        let err = service.admit(&bad).expect_err("should fail validation");
        match err {
            HospitalError::Validation(messages) => {
                assert_eq!(messages.len(), 3, "all problems reported in one pass")
            }
            other => panic!("expected validation error, got {other:?}"),
        }
        assert_eq!(admission_count(&db), 0);
    }

    #[test]
    fn test_admit_without_free_bed_rows_is_bedless() {
        // Capacity counts admissions, not bed rows; a room can declare more
        // stock than it has beds registered.
        let (db, service) = setup();
        let (room_id, bed_ids) = seed_room(&db, "G1", 2, 1);
        let first = seed_patient(&db, "Amina");
        let second = seed_patient(&db, "Brian");

        service.admit(&draft(first, room_id)).expect("takes the bed");
        let second_id = service.admit(&draft(second, room_id)).expect("bedless admit");

        let admission = service.get(second_id).unwrap();
        assert_eq!(admission.bed_id, None);
        assert_eq!(bed_status(&db, bed_ids[0]), BedStatus::Occupied);
    }

    #[test]
    fn test_discharge_frees_bed_and_sets_date() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, bed_ids) = seed_room(&db, "G1", 2, 1);

        let admission_id = service.admit(&draft(patient, room_id)).expect("admit");
        service
            .discharge(
                admission_id,
                parse_datetime_input("2024-01-03 09:00"),
            )
            .expect("discharge");

        let admission = service.get(admission_id).unwrap();
        assert!(admission.discharge_date.is_some());
        assert_eq!(bed_status(&db, bed_ids[0]), BedStatus::Available);
    }

    #[test]
    fn test_discharge_twice_is_guarded() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, _) = seed_room(&db, "G1", 2, 1);

        let admission_id = service.admit(&draft(patient, room_id)).expect("admit");
        service.discharge(admission_id, None).expect("first discharge");

        let err = service
            .discharge(admission_id, None)
            .expect_err("second discharge should fail");
        assert!(matches!(err, HospitalError::AlreadyDischarged));
    }

    #[test]
    fn test_discharge_missing_admission_is_not_found() {
        let (_, service) = setup();
        let err = service.discharge(77, None).expect_err("should fail");
        assert!(matches!(err, HospitalError::NotFound("admission")));
    }

    #[test]
    fn test_delete_frees_bed_and_removes_row() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, bed_ids) = seed_room(&db, "G1", 2, 1);

        let admission_id = service.admit(&draft(patient, room_id)).expect("admit");
        service.delete(admission_id).expect("delete");

        assert_eq!(admission_count(&db), 0);
        assert_eq!(bed_status(&db, bed_ids[0]), BedStatus::Available);
        assert!(matches!(
            service.get(admission_id).unwrap_err(),
            HospitalError::NotFound("admission")
        ));
    }

    #[test]
    fn test_update_recheck_blocks_move_into_full_room() {
        let (db, service) = setup();
        let (room_a, _) = seed_room(&db, "G1", 2, 0);
        let (room_b, _) = seed_room(&db, "G2", 1, 0);
        let first = seed_patient(&db, "Amina");
        let second = seed_patient(&db, "Brian");

        let moving = service.admit(&draft(first, room_a)).expect("admit into A");
        service.admit(&draft(second, room_b)).expect("fill B");

        let mut move_draft = draft(first, room_b);
        let err = service
            .update(moving, &move_draft)
            .expect_err("B has no free slot");
        assert!(matches!(err, HospitalError::RoomFull));

        // After B frees up the same move succeeds.
        let b_admissions = service.for_patient(second).unwrap();
        service
            .discharge(b_admissions[0].admission_id, None)
            .expect("discharge B occupant");
        move_draft.admission_date = "2024-01-02".to_owned();
        service.update(moving, &move_draft).expect("move succeeds");
        assert_eq!(service.get(moving).unwrap().room_id, room_b);
    }

    #[test]
    fn test_update_rechecks_active_admission_invariant() {
        let (db, service) = setup();
        let (room_id, _) = seed_room(&db, "G1", 3, 0);
        let first = seed_patient(&db, "Amina");
        let second = seed_patient(&db, "Brian");

        let first_admission = service.admit(&draft(first, room_id)).expect("admit first");
        service.admit(&draft(second, room_id)).expect("admit second");

        let err = service
            .update(first_admission, &draft(second, room_id))
            .expect_err("second patient is already admitted");
        assert!(matches!(err, HospitalError::AlreadyAdmitted));
    }

    #[test]
    fn test_update_moves_bed_and_recomputes_statuses() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, bed_ids) = seed_room(&db, "G1", 2, 2);

        let admission_id = service.admit(&draft(patient, room_id)).expect("admit");
        assert_eq!(bed_status(&db, bed_ids[0]), BedStatus::Occupied);

        let mut move_bed = draft(patient, room_id);
        move_bed.bed_id = Some(bed_ids[1]);
        service.update(admission_id, &move_bed).expect("move bed");

        assert_eq!(bed_status(&db, bed_ids[0]), BedStatus::Available);
        assert_eq!(bed_status(&db, bed_ids[1]), BedStatus::Occupied);
    }

    #[test]
    fn test_update_missing_admission_is_not_found() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, _) = seed_room(&db, "G1", 2, 0);
        let err = service
            .update(41, &draft(patient, room_id))
            .expect_err("should fail");
        assert!(matches!(err, HospitalError::NotFound("admission")));
    }

    #[test]
    fn test_admit_rolls_back_when_bed_write_fails() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, _) = seed_room(&db, "G1", 2, 1);

        // Simulated fault in the step after the admission insert.
        db.lock()
            .execute_batch(
                "CREATE TRIGGER fail_bed_write BEFORE UPDATE ON bed
                 BEGIN SELECT RAISE(ABORT, 'simulated fault'); END;",
            )
            .unwrap();

        let err = service.admit(&draft(patient, room_id)).expect_err("fault");
        assert!(matches!(err, HospitalError::DataAccess(_)));
        assert_eq!(admission_count(&db), 0, "insert must have been rolled back");
    }

    #[test]
    fn test_stay_cost_counts_days_inclusively() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, _) = seed_room(&db, "G1", 2, 1);

        let mut d = draft(patient, room_id);
        d.admission_date = "2024-01-01".to_owned();
        let admission_id = service.admit(&d).expect("admit");
        service
            .discharge(admission_id, parse_datetime_input("2024-01-03"))
            .expect("discharge");

        // 3 inclusive days at 100.0 a day.
        assert_eq!(service.stay_cost(admission_id), 300.0);
    }

    #[test]
    fn test_stay_cost_same_day_is_one_day() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, _) = seed_room(&db, "G1", 2, 1);

        let mut d = draft(patient, room_id);
        d.admission_date = "2024-01-01 08:00".to_owned();
        let admission_id = service.admit(&d).expect("admit");
        service
            .discharge(admission_id, parse_datetime_input("2024-01-01 17:30"))
            .expect("discharge");

        assert_eq!(service.stay_cost(admission_id), 100.0);
    }

    #[test]
    fn test_stay_cost_missing_admission_is_zero() {
        let (_, service) = setup();
        assert_eq!(service.stay_cost(404), 0.0);
    }

    #[test]
    fn test_available_rooms_excludes_full_and_maintenance() {
        let (db, service) = setup();
        let (full_room, _) = seed_room(&db, "G1", 1, 0);
        let (open_room, _) = seed_room(&db, "G2", 2, 0);
        let (maintenance_room, _) = seed_room(&db, "G3", 5, 0);
        let patient = seed_patient(&db, "Amina");

        service.admit(&draft(patient, full_room)).expect("fill G1");
        wards::set_room_status(&db.lock(), maintenance_room, RoomStatus::Maintenance)
            .expect("flag maintenance");

        let rooms = service.available_rooms().expect("snapshot");
        assert_eq!(rooms.len(), 1);
        assert_eq!(rooms[0].room_id, open_room);
        assert_eq!(rooms[0].available_slots, 2);
    }

    #[test]
    fn test_available_rooms_reports_remaining_slots() {
        let (db, service) = setup();
        let (room_id, _) = seed_room(&db, "G1", 3, 0);
        let patient = seed_patient(&db, "Amina");
        service.admit(&draft(patient, room_id)).expect("admit");

        let rooms = service.available_rooms().expect("snapshot");
        assert_eq!(rooms[0].available_slots, 2);
    }

    #[test]
    fn test_room_status_cache_follows_occupancy() {
        let (db, service) = setup();
        let patient = seed_patient(&db, "Amina");
        let (room_id, _) = seed_room(&db, "G1", 2, 1);

        let admission_id = service.admit(&draft(patient, room_id)).expect("admit");
        assert_eq!(
            wards::get_room(&db.lock(), room_id).unwrap().unwrap().room_status,
            RoomStatus::Occupied
        );

        service.discharge(admission_id, None).expect("discharge");
        assert_eq!(
            wards::get_room(&db.lock(), room_id).unwrap().unwrap().room_status,
            RoomStatus::Available
        );
    }

    #[test]
    fn test_inclusive_days_arithmetic() {
        let jan = |d| NaiveDate::from_ymd_opt(2024, 1, d).unwrap();
        assert_eq!(inclusive_days(jan(1), jan(1)), 1);
        assert_eq!(inclusive_days(jan(1), jan(3)), 3);
        assert_eq!(inclusive_days(jan(3), jan(1)), 0, "inverted range charges nothing");
    }
}
