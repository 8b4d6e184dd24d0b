//! Patient registry.
//!
//! Deletion is guarded: a patient with admissions, encounters or payments
//! on file cannot be removed, since every downstream record keys off the
//! patient row.

use crate::db::{fmt_date, fmt_datetime, read_date_opt, read_datetime};
use crate::models::{NewPatient, Patient};
use crate::{HospitalError, HospitalResult};
use chrono::Local;
use rusqlite::{params, Connection, OptionalExtension, Row};

fn patient_from_row(row: &Row<'_>) -> rusqlite::Result<Patient> {
    Ok(Patient {
        patient_id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        date_of_birth: read_date_opt(row, 3)?,
        gender: row.get(4)?,
        address: row.get(5)?,
        phone: row.get(6)?,
        registered_at: read_datetime(row, 7)?,
    })
}

const PATIENT_COLUMNS: &str =
    "patient_id, first_name, last_name, date_of_birth, gender, address, phone, registered_at";

/// Registers a new patient and returns the generated id.
pub fn register_patient(conn: &Connection, draft: &NewPatient) -> HospitalResult<i64> {
    conn.execute(
        "INSERT INTO patient (first_name, last_name, date_of_birth, gender, address, phone, registered_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            draft.first_name.as_str(),
            draft.last_name.as_str(),
            draft.date_of_birth.map(fmt_date),
            draft.gender,
            draft.address,
            draft.phone,
            fmt_datetime(Local::now().naive_local()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, patient_id: i64) -> HospitalResult<Option<Patient>> {
    let patient = conn
        .query_row(
            &format!("SELECT {PATIENT_COLUMNS} FROM patient WHERE patient_id = ?1"),
            [patient_id],
            patient_from_row,
        )
        .optional()?;
    Ok(patient)
}

/// Updates the demographic fields of an existing patient.
pub fn update_patient(conn: &Connection, patient_id: i64, draft: &NewPatient) -> HospitalResult<()> {
    let changed = conn.execute(
        "UPDATE patient
         SET first_name = ?1, last_name = ?2, date_of_birth = ?3,
             gender = ?4, address = ?5, phone = ?6
         WHERE patient_id = ?7",
        params![
            draft.first_name.as_str(),
            draft.last_name.as_str(),
            draft.date_of_birth.map(fmt_date),
            draft.gender,
            draft.address,
            draft.phone,
            patient_id,
        ],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("patient"));
    }
    Ok(())
}

/// Removes a patient with no dependent records.
pub fn delete_patient(conn: &Connection, patient_id: i64) -> HospitalResult<()> {
    let dependents: i64 = conn.query_row(
        "SELECT (SELECT COUNT(*) FROM admission WHERE patient_id = ?1)
              + (SELECT COUNT(*) FROM appointment WHERE patient_id = ?1)
              + (SELECT COUNT(*) FROM treatment WHERE patient_id = ?1)
              + (SELECT COUNT(*) FROM lab_test WHERE patient_id = ?1)
              + (SELECT COUNT(*) FROM payment WHERE patient_id = ?1)",
        [patient_id],
        |row| row.get(0),
    )?;
    if dependents > 0 {
        return Err(HospitalError::PatientHasRecords);
    }
    let changed = conn.execute("DELETE FROM patient WHERE patient_id = ?1", [patient_id])?;
    if changed == 0 {
        return Err(HospitalError::NotFound("patient"));
    }
    Ok(())
}

pub fn list_patients(conn: &Connection) -> HospitalResult<Vec<Patient>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patient ORDER BY last_name, first_name, patient_id"
    ))?;
    let rows = stmt.query_map([], patient_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Case-insensitive search over names and phone number.
pub fn search_patients(conn: &Connection, query: &str) -> HospitalResult<Vec<Patient>> {
    let pattern = format!("%{}%", query.trim());
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patient
         WHERE first_name LIKE ?1 OR last_name LIKE ?1 OR phone LIKE ?1
         ORDER BY last_name, first_name, patient_id"
    ))?;
    let rows = stmt.query_map([pattern], patient_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::Database;
    use chrono::NaiveDate;
    use hms_types::NonEmptyText;

    fn draft(first: &str, last: &str) -> NewPatient {
        NewPatient {
            first_name: NonEmptyText::new(first).unwrap(),
            last_name: NonEmptyText::new(last).unwrap(),
            date_of_birth: NaiveDate::from_ymd_opt(1988, 4, 12),
            gender: Some("F".to_owned()),
            address: None,
            phone: Some("0141 555 0199".to_owned()),
        }
    }

    #[test]
    fn test_register_and_get_round_trip() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        let id = register_patient(&conn, &draft("Amina", "Okafor")).expect("register");

        let patient = get_patient(&conn, id).expect("get").expect("should exist");
        assert_eq!(patient.first_name, "Amina");
        assert_eq!(patient.last_name, "Okafor");
        assert_eq!(patient.date_of_birth, NaiveDate::from_ymd_opt(1988, 4, 12));
    }

    #[test]
    fn test_get_missing_patient_is_none() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        assert!(get_patient(&conn, 42).expect("get").is_none());
    }

    #[test]
    fn test_update_missing_patient_is_not_found() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        let err = update_patient(&conn, 42, &draft("A", "B")).expect_err("should fail");
        assert!(matches!(err, HospitalError::NotFound("patient")));
    }

    #[test]
    fn test_delete_refuses_patient_with_records() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        let id = register_patient(&conn, &draft("Amina", "Okafor")).unwrap();
        conn.execute(
            "INSERT INTO appointment (patient_id, doctor_id, scheduled_at, consultation_fee, status)
             VALUES (?1, 9, '2024-05-01 09:00:00', 40.0, 'Scheduled')",
            [id],
        )
        .unwrap();

        let err = delete_patient(&conn, id).expect_err("should refuse");
        assert!(matches!(err, HospitalError::PatientHasRecords));
        assert!(get_patient(&conn, id).unwrap().is_some(), "row should remain");
    }

    #[test]
    fn test_delete_removes_unreferenced_patient() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        let id = register_patient(&conn, &draft("Amina", "Okafor")).unwrap();
        delete_patient(&conn, id).expect("delete");
        assert!(get_patient(&conn, id).unwrap().is_none());
    }

    #[test]
    fn test_search_matches_name_and_phone() {
        let db = Database::open_in_memory().unwrap();
        let conn = db.lock();
        register_patient(&conn, &draft("Amina", "Okafor")).unwrap();
        register_patient(&conn, &draft("Brian", "Leung")).unwrap();

        let by_name = search_patients(&conn, "okaf").expect("search");
        assert_eq!(by_name.len(), 1);
        assert_eq!(by_name[0].first_name, "Amina");

        let by_phone = search_patients(&conn, "555 0199").expect("search");
        assert_eq!(by_phone.len(), 2, "both drafts share the phone number");
    }
}
