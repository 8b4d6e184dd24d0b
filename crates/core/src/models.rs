//! Row types and input drafts for the hospital schema.
//!
//! One struct per stored row, plus a `New…` draft carrying the fields a
//! caller supplies on creation. Drafts use validated vocabulary from
//! `hms-types` wherever the value set is closed; free-text fields arrive as
//! plain strings and are checked at the operation boundary.

use chrono::{NaiveDate, NaiveDateTime};
use hms_types::{BedStatus, NonEmptyText, RoomStatus, RoomType};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub patient_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub registered_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPatient {
    pub first_name: NonEmptyText,
    pub last_name: NonEmptyText,
    pub date_of_birth: Option<NaiveDate>,
    pub gender: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Room {
    pub room_id: i64,
    pub room_no: String,
    pub room_type: RoomType,
    pub daily_cost: f64,
    pub bed_stock: i64,
    pub room_status: RoomStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewRoom {
    pub room_no: NonEmptyText,
    pub room_type: RoomType,
    pub daily_cost: f64,
    pub bed_stock: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bed {
    pub bed_id: i64,
    pub room_id: i64,
    pub bed_no: String,
    pub bed_type: Option<String>,
    pub bed_status: BedStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBed {
    pub room_id: i64,
    pub bed_no: NonEmptyText,
    pub bed_type: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admission {
    pub admission_id: i64,
    pub admission_date: NaiveDateTime,
    pub discharge_date: Option<NaiveDateTime>,
    pub patient_id: i64,
    pub room_id: i64,
    pub bed_id: Option<i64>,
}

impl Admission {
    /// An admission is active while it has no discharge date.
    pub fn is_active(&self) -> bool {
        self.discharge_date.is_none()
    }
}

/// Caller-supplied fields for creating or updating an admission.
///
/// The admission date arrives as raw text from the calling layer and is
/// parsed during validation; everything wrong with the draft is reported in
/// one pass.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionDraft {
    pub admission_date: String,
    pub patient_id: i64,
    pub room_id: i64,
    pub bed_id: Option<i64>,
}

/// One row of the available-rooms snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomAvailability {
    pub room_id: i64,
    pub room_no: String,
    pub room_type: RoomType,
    pub daily_cost: f64,
    pub bed_stock: i64,
    pub available_slots: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Treatment {
    pub treatment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis: String,
    pub treatment_fee: f64,
    pub treated_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTreatment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub diagnosis: NonEmptyText,
    pub treatment_fee: f64,
    pub treated_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LabTest {
    pub test_id: i64,
    pub patient_id: i64,
    pub test_name: String,
    pub test_cost: f64,
    pub taken_on: NaiveDate,
    pub result: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewLabTest {
    pub patient_id: i64,
    pub test_name: NonEmptyText,
    pub test_cost: f64,
    pub taken_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Medicine {
    pub medicine_id: i64,
    pub name: String,
    pub dosage: Option<String>,
    pub price: f64,
    pub stock_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMedicine {
    pub name: NonEmptyText,
    pub dosage: Option<String>,
    pub price: f64,
    pub stock_quantity: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prescription {
    pub prescription_id: i64,
    pub treatment_id: i64,
    pub medicine_id: i64,
    pub quantity: i64,
    pub instructions: Option<String>,
    pub prescribed_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPrescription {
    pub treatment_id: i64,
    pub medicine_id: i64,
    pub quantity: i64,
    pub instructions: Option<String>,
    pub prescribed_on: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub appointment_id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: NaiveDateTime,
    pub consultation_fee: f64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub patient_id: i64,
    pub doctor_id: i64,
    pub scheduled_at: NaiveDateTime,
    pub consultation_fee: f64,
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: i64,
    pub patient_id: i64,
    pub amount: f64,
    pub method: Option<String>,
    pub paid_at: NaiveDateTime,
    pub recorded_by: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewPayment {
    pub patient_id: i64,
    pub amount: f64,
    pub method: Option<String>,
    pub paid_at: NaiveDateTime,
    pub recorded_by: Option<i64>,
}
