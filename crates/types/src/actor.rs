//! Actor and role model.
//!
//! The session layer resolves the signed-in user into an [`Actor`] before
//! any core operation runs; the core itself never inspects session state.
//! Roles are a closed tagged set rather than free text, so capability
//! checks are exhaustive matches instead of string comparisons.

use crate::NonEmptyText;
use serde::{Deserialize, Serialize};

/// Staff sub-roles. Doctors are a separate top-level role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum StaffRole {
    Nurse,
    Receptionist,
    Accountant,
}

/// The role an authenticated user acts under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Doctor,
    Staff(StaffRole),
}

impl Role {
    /// Registering, editing and removing patients.
    pub fn can_manage_patients(&self) -> bool {
        matches!(
            self,
            Role::Staff(StaffRole::Receptionist) | Role::Staff(StaffRole::Nurse)
        )
    }

    /// Booking and rescheduling appointments.
    pub fn can_schedule_appointments(&self) -> bool {
        matches!(self, Role::Staff(StaffRole::Receptionist))
    }

    /// Admitting, updating, discharging and deleting admissions.
    pub fn can_manage_admissions(&self) -> bool {
        matches!(
            self,
            Role::Staff(StaffRole::Nurse) | Role::Staff(StaffRole::Receptionist)
        )
    }

    /// Recording treatments and ordering lab tests.
    pub fn can_treat_patients(&self) -> bool {
        matches!(self, Role::Doctor)
    }

    /// Writing prescriptions (and the stock movements they imply).
    pub fn can_prescribe(&self) -> bool {
        matches!(self, Role::Doctor)
    }

    /// Recording payments against a patient's bill.
    pub fn can_record_payments(&self) -> bool {
        matches!(self, Role::Staff(StaffRole::Accountant))
    }

    /// Reading the aggregate reports.
    pub fn can_view_reports(&self) -> bool {
        matches!(self, Role::Doctor | Role::Staff(StaffRole::Accountant))
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Doctor => f.write_str("doctor"),
            Role::Staff(StaffRole::Nurse) => f.write_str("nurse"),
            Role::Staff(StaffRole::Receptionist) => f.write_str("receptionist"),
            Role::Staff(StaffRole::Accountant) => f.write_str("accountant"),
        }
    }
}

/// A resolved, authenticated user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Identity-provider id; not a key into the core's own tables.
    pub id: i64,
    pub name: NonEmptyText,
    pub role: Role,
}
