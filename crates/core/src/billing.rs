//! Billing aggregation.
//!
//! A patient's bill is the sum of five independently-read components:
//! treatment fees, lab-test costs, prescription charges (quantity times
//! medicine price, reached through the treatment), admission stay charges
//! (inclusive day count times the room's daily cost) and consultation fees
//! of appointments that were not cancelled or missed. The reads share no
//! snapshot; each is a point-in-time approximation, which is acceptable
//! because nothing here mutates.
//!
//! The aggregate is non-raising: any store failure is logged and reported
//! as 0.0. Whether and when the total becomes a payment row is the
//! caller's decision.

use crate::admissions::stay_charge;
use crate::db::{read_datetime, read_datetime_opt, Database};
use crate::repositories::payments;
use crate::HospitalResult;
use chrono::Local;
use std::sync::Arc;

/// Read-only aggregator over a patient's chargeable records.
#[derive(Clone, Debug)]
pub struct BillingService {
    db: Arc<Database>,
}

impl BillingService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    /// Total owed by the patient across all five components.
    ///
    /// Non-raising: returns 0.0 on any data-access failure (logged).
    pub fn patient_bill(&self, patient_id: i64) -> f64 {
        match self.try_patient_bill(patient_id) {
            Ok(total) => total,
            Err(err) => {
                tracing::error!(patient_id, error = %err, "bill aggregation failed");
                0.0
            }
        }
    }

    /// What remains after subtracting recorded payments, floored at zero.
    ///
    /// Non-raising, like [`BillingService::patient_bill`].
    pub fn outstanding_balance(&self, patient_id: i64) -> f64 {
        let bill = match self.try_patient_bill(patient_id) {
            Ok(total) => total,
            Err(err) => {
                tracing::error!(patient_id, error = %err, "bill aggregation failed");
                return 0.0;
            }
        };
        let paid = {
            let conn = self.db.lock();
            match payments::payments_total(&conn, patient_id) {
                Ok(total) => total,
                Err(err) => {
                    tracing::error!(patient_id, error = %err, "payment total unavailable");
                    return 0.0;
                }
            }
        };
        (bill - paid).max(0.0)
    }

    fn try_patient_bill(&self, patient_id: i64) -> HospitalResult<f64> {
        let conn = self.db.lock();

        let treatment_fees: f64 = conn.query_row(
            "SELECT COALESCE(SUM(treatment_fee), 0) FROM treatment WHERE patient_id = ?1",
            [patient_id],
            |row| row.get(0),
        )?;

        let lab_costs: f64 = conn.query_row(
            "SELECT COALESCE(SUM(test_cost), 0) FROM lab_test WHERE patient_id = ?1",
            [patient_id],
            |row| row.get(0),
        )?;

        let prescription_charges: f64 = conn.query_row(
            "SELECT COALESCE(SUM(p.quantity * m.price), 0)
             FROM prescription p
             JOIN treatment t ON t.treatment_id = p.treatment_id
             JOIN medicine m ON m.medicine_id = p.medicine_id
             WHERE t.patient_id = ?1",
            [patient_id],
            |row| row.get(0),
        )?;

        let consultation_fees: f64 = conn.query_row(
            "SELECT COALESCE(SUM(consultation_fee), 0) FROM appointment
             WHERE patient_id = ?1 AND LOWER(status) NOT IN ('cancelled', 'no show')",
            [patient_id],
            |row| row.get(0),
        )?;

        // Stay charges need the day arithmetic, so the rows come out and are
        // costed here. Daily cost resolves through the room directly, then
        // through the assigned bed's room.
        let as_of = Local::now().naive_local();
        let mut stmt = conn.prepare(
            "SELECT a.admission_date, a.discharge_date,
                    COALESCE(
                        (SELECT daily_cost FROM room WHERE room_id = a.room_id),
                        (SELECT r.daily_cost FROM bed b
                         JOIN room r ON r.room_id = b.room_id
                         WHERE b.bed_id = a.bed_id))
             FROM admission a WHERE a.patient_id = ?1",
        )?;
        let stays = stmt.query_map([patient_id], |row| {
            Ok((
                read_datetime(row, 0)?,
                read_datetime_opt(row, 1)?,
                row.get::<_, Option<f64>>(2)?,
            ))
        })?;

        let mut stay_charges = 0.0;
        for stay in stays {
            let (admitted_at, discharged_at, daily_cost) = stay?;
            match daily_cost {
                Some(daily_cost) => {
                    stay_charges += stay_charge(admitted_at, discharged_at, daily_cost, as_of);
                }
                None => {
                    tracing::warn!(patient_id, "admission without resolvable daily cost skipped");
                }
            }
        }

        let total =
            treatment_fees + lab_costs + prescription_charges + stay_charges + consultation_fees;
        Ok(total.max(0.0))
    }
}
