//! Medicine catalogue and prescriptions.
//!
//! Prescribing moves stock: creation decrements `stock_quantity` and
//! deletion restores it, both inside the same transaction as the
//! prescription row itself. Stock can never go negative; a prescription
//! that would overdraw the stock fails before anything is written.

use crate::db::{fmt_date, read_date};
use crate::models::{Medicine, NewMedicine, NewPrescription, Prescription};
use crate::{HospitalError, HospitalResult};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};

fn medicine_from_row(row: &Row<'_>) -> rusqlite::Result<Medicine> {
    Ok(Medicine {
        medicine_id: row.get(0)?,
        name: row.get(1)?,
        dosage: row.get(2)?,
        price: row.get(3)?,
        stock_quantity: row.get(4)?,
    })
}

fn prescription_from_row(row: &Row<'_>) -> rusqlite::Result<Prescription> {
    Ok(Prescription {
        prescription_id: row.get(0)?,
        treatment_id: row.get(1)?,
        medicine_id: row.get(2)?,
        quantity: row.get(3)?,
        instructions: row.get(4)?,
        prescribed_on: read_date(row, 5)?,
    })
}

const MEDICINE_COLUMNS: &str = "medicine_id, name, dosage, price, stock_quantity";
const PRESCRIPTION_COLUMNS: &str =
    "prescription_id, treatment_id, medicine_id, quantity, instructions, prescribed_on";

fn validate_medicine(draft: &NewMedicine) -> HospitalResult<()> {
    let mut errors = Vec::new();
    if draft.price < 0.0 {
        errors.push("price cannot be negative".to_owned());
    }
    if draft.stock_quantity < 0 {
        errors.push("stock quantity cannot be negative".to_owned());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(HospitalError::Validation(errors))
    }
}

// ── Medicines ───────────────────────────────────────────────────────────

pub fn add_medicine(conn: &Connection, draft: &NewMedicine) -> HospitalResult<i64> {
    validate_medicine(draft)?;
    conn.execute(
        "INSERT INTO medicine (name, dosage, price, stock_quantity) VALUES (?1, ?2, ?3, ?4)",
        params![
            draft.name.as_str(),
            draft.dosage,
            draft.price,
            draft.stock_quantity,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_medicine(conn: &Connection, medicine_id: i64) -> HospitalResult<Option<Medicine>> {
    let medicine = conn
        .query_row(
            &format!("SELECT {MEDICINE_COLUMNS} FROM medicine WHERE medicine_id = ?1"),
            [medicine_id],
            medicine_from_row,
        )
        .optional()?;
    Ok(medicine)
}

pub fn update_medicine(
    conn: &Connection,
    medicine_id: i64,
    draft: &NewMedicine,
) -> HospitalResult<()> {
    validate_medicine(draft)?;
    let changed = conn.execute(
        "UPDATE medicine SET name = ?1, dosage = ?2, price = ?3, stock_quantity = ?4
         WHERE medicine_id = ?5",
        params![
            draft.name.as_str(),
            draft.dosage,
            draft.price,
            draft.stock_quantity,
            medicine_id,
        ],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("medicine"));
    }
    Ok(())
}

pub fn delete_medicine(conn: &Connection, medicine_id: i64) -> HospitalResult<()> {
    let changed = conn.execute(
        "DELETE FROM medicine WHERE medicine_id = ?1",
        [medicine_id],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("medicine"));
    }
    Ok(())
}

pub fn list_medicines(conn: &Connection) -> HospitalResult<Vec<Medicine>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicine ORDER BY name, medicine_id"
    ))?;
    let rows = stmt.query_map([], medicine_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Medicines at or below the reorder threshold.
pub fn low_stock(conn: &Connection, threshold: i64) -> HospitalResult<Vec<Medicine>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {MEDICINE_COLUMNS} FROM medicine WHERE stock_quantity <= ?1
         ORDER BY stock_quantity, name"
    ))?;
    let rows = stmt.query_map([threshold], medicine_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

// ── Prescriptions ───────────────────────────────────────────────────────

/// Writes a prescription and draws down the medicine stock atomically.
pub fn prescribe(conn: &mut Connection, draft: &NewPrescription) -> HospitalResult<i64> {
    if draft.quantity <= 0 {
        return Err(HospitalError::Validation(vec![
            "quantity must be at least one".to_owned(),
        ]));
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let treatment_exists: bool = tx
        .query_row(
            "SELECT 1 FROM treatment WHERE treatment_id = ?1",
            [draft.treatment_id],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    if !treatment_exists {
        return Err(HospitalError::NotFound("treatment"));
    }

    let stock: Option<(String, i64)> = tx
        .query_row(
            "SELECT name, stock_quantity FROM medicine WHERE medicine_id = ?1",
            [draft.medicine_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (name, available) = stock.ok_or(HospitalError::NotFound("medicine"))?;
    if available < draft.quantity {
        return Err(HospitalError::InsufficientStock {
            medicine: name,
            requested: draft.quantity,
            available,
        });
    }

    tx.execute(
        "UPDATE medicine SET stock_quantity = stock_quantity - ?1 WHERE medicine_id = ?2",
        params![draft.quantity, draft.medicine_id],
    )?;
    tx.execute(
        "INSERT INTO prescription (treatment_id, medicine_id, quantity, instructions, prescribed_on)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            draft.treatment_id,
            draft.medicine_id,
            draft.quantity,
            draft.instructions,
            fmt_date(draft.prescribed_on),
        ],
    )?;
    let id = tx.last_insert_rowid();
    tx.commit()?;
    Ok(id)
}

/// Deletes a prescription and returns its quantity to stock atomically.
pub fn revoke_prescription(conn: &mut Connection, prescription_id: i64) -> HospitalResult<()> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;

    let row: Option<(i64, i64)> = tx
        .query_row(
            "SELECT medicine_id, quantity FROM prescription WHERE prescription_id = ?1",
            [prescription_id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )
        .optional()?;
    let (medicine_id, quantity) = row.ok_or(HospitalError::NotFound("prescription"))?;

    tx.execute(
        "UPDATE medicine SET stock_quantity = stock_quantity + ?1 WHERE medicine_id = ?2",
        params![quantity, medicine_id],
    )?;
    tx.execute(
        "DELETE FROM prescription WHERE prescription_id = ?1",
        [prescription_id],
    )?;
    tx.commit()?;
    Ok(())
}

pub fn get_prescription(
    conn: &Connection,
    prescription_id: i64,
) -> HospitalResult<Option<Prescription>> {
    let prescription = conn
        .query_row(
            &format!("SELECT {PRESCRIPTION_COLUMNS} FROM prescription WHERE prescription_id = ?1"),
            [prescription_id],
            prescription_from_row,
        )
        .optional()?;
    Ok(prescription)
}

pub fn prescriptions_for_treatment(
    conn: &Connection,
    treatment_id: i64,
) -> HospitalResult<Vec<Prescription>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PRESCRIPTION_COLUMNS} FROM prescription WHERE treatment_id = ?1
         ORDER BY prescription_id"
    ))?;
    let rows = stmt.query_map([treatment_id], prescription_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// All prescriptions reached through the patient's treatments.
pub fn prescriptions_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> HospitalResult<Vec<Prescription>> {
    let mut stmt = conn.prepare(
        "SELECT p.prescription_id, p.treatment_id, p.medicine_id, p.quantity,
                p.instructions, p.prescribed_on
         FROM prescription p
         JOIN treatment t ON t.treatment_id = p.treatment_id
         WHERE t.patient_id = ?1
         ORDER BY p.prescribed_on, p.prescription_id",
    )?;
    let rows = stmt.query_map([patient_id], prescription_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
