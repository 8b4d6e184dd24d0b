//! Treatments, lab tests and appointments.
//!
//! Each row carries its own fee/cost field; the billing aggregator sums
//! them per patient. `doctor_id` values come from the identity provider and
//! are stored as plain integers, not local foreign keys.

use crate::db::{fmt_date, fmt_datetime, read_date, read_datetime};
use crate::models::{
    Appointment, LabTest, NewAppointment, NewLabTest, NewTreatment, Treatment,
};
use crate::{HospitalError, HospitalResult};
use rusqlite::{params, Connection, OptionalExtension, Row};

fn treatment_from_row(row: &Row<'_>) -> rusqlite::Result<Treatment> {
    Ok(Treatment {
        treatment_id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        diagnosis: row.get(3)?,
        treatment_fee: row.get(4)?,
        treated_on: read_date(row, 5)?,
    })
}

fn lab_test_from_row(row: &Row<'_>) -> rusqlite::Result<LabTest> {
    Ok(LabTest {
        test_id: row.get(0)?,
        patient_id: row.get(1)?,
        test_name: row.get(2)?,
        test_cost: row.get(3)?,
        taken_on: read_date(row, 4)?,
        result: row.get(5)?,
    })
}

fn appointment_from_row(row: &Row<'_>) -> rusqlite::Result<Appointment> {
    Ok(Appointment {
        appointment_id: row.get(0)?,
        patient_id: row.get(1)?,
        doctor_id: row.get(2)?,
        scheduled_at: read_datetime(row, 3)?,
        consultation_fee: row.get(4)?,
        status: row.get(5)?,
    })
}

fn require_non_negative(value: f64, field: &str) -> HospitalResult<()> {
    if value < 0.0 {
        return Err(HospitalError::Validation(vec![format!(
            "{field} cannot be negative"
        )]));
    }
    Ok(())
}

// ── Treatments ──────────────────────────────────────────────────────────

pub fn record_treatment(conn: &Connection, draft: &NewTreatment) -> HospitalResult<i64> {
    require_non_negative(draft.treatment_fee, "treatment fee")?;
    conn.execute(
        "INSERT INTO treatment (patient_id, doctor_id, diagnosis, treatment_fee, treated_on)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            draft.patient_id,
            draft.doctor_id,
            draft.diagnosis.as_str(),
            draft.treatment_fee,
            fmt_date(draft.treated_on),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_treatment(conn: &Connection, treatment_id: i64) -> HospitalResult<Option<Treatment>> {
    let treatment = conn
        .query_row(
            "SELECT treatment_id, patient_id, doctor_id, diagnosis, treatment_fee, treated_on
             FROM treatment WHERE treatment_id = ?1",
            [treatment_id],
            treatment_from_row,
        )
        .optional()?;
    Ok(treatment)
}

pub fn treatments_for_patient(conn: &Connection, patient_id: i64) -> HospitalResult<Vec<Treatment>> {
    let mut stmt = conn.prepare(
        "SELECT treatment_id, patient_id, doctor_id, diagnosis, treatment_fee, treated_on
         FROM treatment WHERE patient_id = ?1 ORDER BY treated_on, treatment_id",
    )?;
    let rows = stmt.query_map([patient_id], treatment_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn delete_treatment(conn: &Connection, treatment_id: i64) -> HospitalResult<()> {
    let changed = conn.execute(
        "DELETE FROM treatment WHERE treatment_id = ?1",
        [treatment_id],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("treatment"));
    }
    Ok(())
}

// ── Lab tests ───────────────────────────────────────────────────────────

pub fn order_lab_test(conn: &Connection, draft: &NewLabTest) -> HospitalResult<i64> {
    require_non_negative(draft.test_cost, "test cost")?;
    conn.execute(
        "INSERT INTO lab_test (patient_id, test_name, test_cost, taken_on)
         VALUES (?1, ?2, ?3, ?4)",
        params![
            draft.patient_id,
            draft.test_name.as_str(),
            draft.test_cost,
            fmt_date(draft.taken_on),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Attaches the result text once the lab reports back.
pub fn record_lab_result(conn: &Connection, test_id: i64, result: &str) -> HospitalResult<()> {
    let changed = conn.execute(
        "UPDATE lab_test SET result = ?1 WHERE test_id = ?2",
        params![result, test_id],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("lab test"));
    }
    Ok(())
}

pub fn lab_tests_for_patient(conn: &Connection, patient_id: i64) -> HospitalResult<Vec<LabTest>> {
    let mut stmt = conn.prepare(
        "SELECT test_id, patient_id, test_name, test_cost, taken_on, result
         FROM lab_test WHERE patient_id = ?1 ORDER BY taken_on, test_id",
    )?;
    let rows = stmt.query_map([patient_id], lab_test_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn delete_lab_test(conn: &Connection, test_id: i64) -> HospitalResult<()> {
    let changed = conn.execute("DELETE FROM lab_test WHERE test_id = ?1", [test_id])?;
    if changed == 0 {
        return Err(HospitalError::NotFound("lab test"));
    }
    Ok(())
}

// ── Appointments ────────────────────────────────────────────────────────

pub fn book_appointment(conn: &Connection, draft: &NewAppointment) -> HospitalResult<i64> {
    require_non_negative(draft.consultation_fee, "consultation fee")?;
    if draft.status.trim().is_empty() {
        return Err(HospitalError::Validation(vec![
            "appointment status cannot be empty".to_owned(),
        ]));
    }
    conn.execute(
        "INSERT INTO appointment (patient_id, doctor_id, scheduled_at, consultation_fee, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            draft.patient_id,
            draft.doctor_id,
            fmt_datetime(draft.scheduled_at),
            draft.consultation_fee,
            draft.status.trim(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn set_appointment_status(
    conn: &Connection,
    appointment_id: i64,
    status: &str,
) -> HospitalResult<()> {
    if status.trim().is_empty() {
        return Err(HospitalError::Validation(vec![
            "appointment status cannot be empty".to_owned(),
        ]));
    }
    let changed = conn.execute(
        "UPDATE appointment SET status = ?1 WHERE appointment_id = ?2",
        params![status.trim(), appointment_id],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("appointment"));
    }
    Ok(())
}

pub fn appointments_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> HospitalResult<Vec<Appointment>> {
    let mut stmt = conn.prepare(
        "SELECT appointment_id, patient_id, doctor_id, scheduled_at, consultation_fee, status
         FROM appointment WHERE patient_id = ?1 ORDER BY scheduled_at, appointment_id",
    )?;
    let rows = stmt.query_map([patient_id], appointment_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn delete_appointment(conn: &Connection, appointment_id: i64) -> HospitalResult<()> {
    let changed = conn.execute(
        "DELETE FROM appointment WHERE appointment_id = ?1",
        [appointment_id],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("appointment"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::NaiveDate;
    use hms_types::NonEmptyText;

    fn seed_patient(conn: &Connection) -> i64 {
        conn.execute(
            "INSERT INTO patient (first_name, last_name, registered_at)
             VALUES ('Amina', 'Okafor', '2024-01-01 08:00:00')",
            [],
        )
        .unwrap();
        conn.last_insert_rowid()
    }

    #[test]
    fn test_treatment_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        let patient_id = seed_patient(&conn);
        let id = record_treatment(
            &conn,
            &NewTreatment {
                patient_id,
                doctor_id: 3,
                diagnosis: NonEmptyText::new("Pneumonia").unwrap(),
                treatment_fee: 120.0,
                treated_on: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            },
        )
        .expect("record");

        let loaded = get_treatment(&conn, id).unwrap().expect("should exist");
        assert_eq!(loaded.diagnosis, "Pneumonia");
        assert_eq!(loaded.treatment_fee, 120.0);

        let listed = treatments_for_patient(&conn, patient_id).unwrap();
        assert_eq!(listed.len(), 1);
    }

    #[test]
    fn test_treatment_rejects_negative_fee() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        let patient_id = seed_patient(&conn);
        let err = record_treatment(
            &conn,
            &NewTreatment {
                patient_id,
                doctor_id: 3,
                diagnosis: NonEmptyText::new("Pneumonia").unwrap(),
                treatment_fee: -5.0,
                treated_on: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            },
        )
        .expect_err("negative fee should fail");
        assert!(matches!(err, HospitalError::Validation(_)));
    }

    #[test]
    fn test_lab_result_is_attached_later() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        let patient_id = seed_patient(&conn);
        let id = order_lab_test(
            &conn,
            &NewLabTest {
                patient_id,
                test_name: NonEmptyText::new("Full blood count").unwrap(),
                test_cost: 30.0,
                taken_on: NaiveDate::from_ymd_opt(2024, 2, 2).unwrap(),
            },
        )
        .expect("order");

        record_lab_result(&conn, id, "WBC 11.2").expect("attach result");
        let tests = lab_tests_for_patient(&conn, patient_id).unwrap();
        assert_eq!(tests[0].result.as_deref(), Some("WBC 11.2"));
    }

    #[test]
    fn test_appointment_status_update() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        let patient_id = seed_patient(&conn);
        let id = book_appointment(
            &conn,
            &NewAppointment {
                patient_id,
                doctor_id: 3,
                scheduled_at: NaiveDate::from_ymd_opt(2024, 3, 1)
                    .unwrap()
                    .and_hms_opt(9, 0, 0)
                    .unwrap(),
                consultation_fee: 45.0,
                status: "Scheduled".to_owned(),
            },
        )
        .expect("book");

        set_appointment_status(&conn, id, "No show").expect("update status");
        let appointments = appointments_for_patient(&conn, patient_id).unwrap();
        assert_eq!(appointments[0].status, "No show");
    }

    #[test]
    fn test_missing_rows_surface_not_found() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        assert!(matches!(
            delete_treatment(&conn, 9).unwrap_err(),
            HospitalError::NotFound("treatment")
        ));
        assert!(matches!(
            record_lab_result(&conn, 9, "x").unwrap_err(),
            HospitalError::NotFound("lab test")
        ));
        assert!(matches!(
            set_appointment_status(&conn, 9, "Completed").unwrap_err(),
            HospitalError::NotFound("appointment")
        ));
    }
}
