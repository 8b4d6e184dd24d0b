//! Payment records.
//!
//! A payment row is written by staff after the billing aggregator has
//! produced a total; the core never writes payments on its own.

use crate::db::{fmt_datetime, read_datetime};
use crate::models::{NewPayment, Payment};
use crate::{HospitalError, HospitalResult};
use rusqlite::{params, Connection, Row};

fn payment_from_row(row: &Row<'_>) -> rusqlite::Result<Payment> {
    Ok(Payment {
        payment_id: row.get(0)?,
        patient_id: row.get(1)?,
        amount: row.get(2)?,
        method: row.get(3)?,
        paid_at: read_datetime(row, 4)?,
        recorded_by: row.get(5)?,
    })
}

pub fn record_payment(conn: &Connection, draft: &NewPayment) -> HospitalResult<i64> {
    if draft.amount <= 0.0 {
        return Err(HospitalError::Validation(vec![
            "payment amount must be positive".to_owned(),
        ]));
    }
    conn.execute(
        "INSERT INTO payment (patient_id, amount, method, paid_at, recorded_by)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            draft.patient_id,
            draft.amount,
            draft.method,
            fmt_datetime(draft.paid_at),
            draft.recorded_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn payments_for_patient(conn: &Connection, patient_id: i64) -> HospitalResult<Vec<Payment>> {
    let mut stmt = conn.prepare(
        "SELECT payment_id, patient_id, amount, method, paid_at, recorded_by
         FROM payment WHERE patient_id = ?1 ORDER BY paid_at, payment_id",
    )?;
    let rows = stmt.query_map([patient_id], payment_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Total amount the patient has already paid.
pub fn payments_total(conn: &Connection, patient_id: i64) -> HospitalResult<f64> {
    let total: f64 = conn.query_row(
        "SELECT COALESCE(SUM(amount), 0) FROM payment WHERE patient_id = ?1",
        [patient_id],
        |row| row.get(0),
    )?;
    Ok(total)
}
