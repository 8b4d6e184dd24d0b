//! Read-only reporting aggregates.
//!
//! No invariant logic lives here; these queries summarise the same schema
//! the lifecycle and billing services operate on.

use crate::db::{fmt_date, Database};
use crate::HospitalResult;
use chrono::NaiveDate;
use hms_types::AppointmentStatus;
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// Current headcount figures.
#[derive(Debug, Clone, Serialize)]
pub struct Census {
    pub patients: i64,
    pub active_admissions: i64,
    /// Free slots across rooms in circulation (maintenance excluded),
    /// never negative per room.
    pub free_slots: i64,
}

/// Payments recorded inside a reporting window.
#[derive(Debug, Clone, Serialize)]
pub struct RevenueSummary {
    pub total: f64,
    pub payment_count: i64,
}

/// Appointment volume for one day, bucketed by status.
#[derive(Debug, Clone, Serialize)]
pub struct AppointmentLoad {
    pub status: AppointmentStatus,
    pub count: i64,
}

#[derive(Clone, Debug)]
pub struct ReportingService {
    db: Arc<Database>,
}

impl ReportingService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub fn census(&self) -> HospitalResult<Census> {
        let conn = self.db.lock();
        let patients: i64 =
            conn.query_row("SELECT COUNT(*) FROM patient", [], |row| row.get(0))?;
        let active_admissions: i64 = conn.query_row(
            "SELECT COUNT(*) FROM admission WHERE discharge_date IS NULL",
            [],
            |row| row.get(0),
        )?;
        let free_slots: i64 = conn.query_row(
            "SELECT COALESCE(SUM(MAX(bed_stock -
                 (SELECT COUNT(*) FROM admission a
                  WHERE a.room_id = room.room_id AND a.discharge_date IS NULL), 0)), 0)
             FROM room WHERE room_status <> 'Maintenance'",
            [],
            |row| row.get(0),
        )?;
        Ok(Census {
            patients,
            active_admissions,
            free_slots,
        })
    }

    /// Payments recorded between `from` and `to`, both inclusive.
    pub fn revenue(&self, from: NaiveDate, to: NaiveDate) -> HospitalResult<RevenueSummary> {
        let conn = self.db.lock();
        let (total, payment_count) = conn.query_row(
            "SELECT COALESCE(SUM(amount), 0), COUNT(*) FROM payment
             WHERE DATE(paid_at) >= ?1 AND DATE(paid_at) <= ?2",
            [fmt_date(from), fmt_date(to)],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        Ok(RevenueSummary {
            total,
            payment_count,
        })
    }

    /// Appointments scheduled on `day`, grouped by status bucket.
    ///
    /// Raw status labels are bucketed leniently, so "cancelled" and
    /// "CANCELLED" count together.
    pub fn appointments_on(&self, day: NaiveDate) -> HospitalResult<Vec<AppointmentLoad>> {
        let conn = self.db.lock();
        let mut stmt = conn.prepare(
            "SELECT status, COUNT(*) FROM appointment
             WHERE DATE(scheduled_at) = ?1 GROUP BY status",
        )?;
        let rows = stmt.query_map([fmt_date(day)], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
        })?;

        let mut buckets: BTreeMap<AppointmentStatus, i64> = BTreeMap::new();
        for row in rows {
            let (label, count) = row?;
            *buckets.entry(AppointmentStatus::from_label(&label)).or_default() += count;
        }
        Ok(buckets
            .into_iter()
            .map(|(status, count)| AppointmentLoad { status, count })
            .collect())
    }
}
