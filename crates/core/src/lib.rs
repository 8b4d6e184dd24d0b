//! # HMS Core
//!
//! Core business logic for the hospital management system.
//!
//! This crate contains the relational store, the entity registries and the
//! lifecycle/aggregation services:
//! - Admission lifecycle with bed and room capacity accounting
//! - Billing aggregation across treatments, lab tests, prescriptions,
//!   stays and appointments
//! - Read-only reporting aggregates
//! - Registries for patients, wards, encounters, pharmacy and payments
//!
//! **No API concerns**: session handling, HTTP servers and view rendering
//! belong to the calling layer. Callers resolve the signed-in user to an
//! [`hms_types::Actor`] and enforce authorisation before invoking the core.

pub mod admissions;
pub mod billing;
pub mod config;
pub mod db;
pub mod models;
pub mod reporting;
pub mod repositories;
pub mod validation;

mod error;

pub use config::CoreConfig;
pub use db::Database;
pub use error::{HospitalError, HospitalResult};

// Re-export the shared vocabulary crate under its familiar name.
pub use hms_types as types;
