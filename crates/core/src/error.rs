//! Error taxonomy for the hospital core.
//!
//! Four families of failure, kept distinct so callers can react correctly:
//!
//! - **Validation**: malformed or missing input fields, reported as a list
//!   of human-readable messages. Nothing was mutated.
//! - **Invariant violations**: the input was well-formed but conflicts with
//!   live state (patient already admitted, room full, bed unassignable).
//!   Nothing was mutated.
//! - **Not-found / lifecycle guards**: the target row is absent or in the
//!   wrong lifecycle state (already discharged).
//! - **Data access**: the underlying store failed. The driver detail is
//!   logged at wrap time; `Display` stays generic so it can be shown to an
//!   end user without leaking internals.

/// Error type for every fallible core operation.
#[derive(Debug, thiserror::Error)]
pub enum HospitalError {
    #[error("validation failed: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error("patient already has an active admission")]
    AlreadyAdmitted,

    #[error("room is at full capacity")]
    RoomFull,

    #[error("bed cannot be assigned: {0}")]
    BedUnavailable(String),

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("admission is already discharged")]
    AlreadyDischarged,

    #[error("insufficient stock of {medicine}: requested {requested}, available {available}")]
    InsufficientStock {
        medicine: String,
        requested: i64,
        available: i64,
    },

    #[error("room still has active admissions")]
    RoomOccupied,

    #[error("bed is assigned to an active admission")]
    BedOccupied,

    #[error("patient still has dependent records")]
    PatientHasRecords,

    #[error("data access failure")]
    DataAccess(#[source] rusqlite::Error),
}

impl From<rusqlite::Error> for HospitalError {
    fn from(err: rusqlite::Error) -> Self {
        // Full driver detail goes to the log only; callers see the generic
        // message from `Display`.
        tracing::error!(error = %err, "database operation failed");
        HospitalError::DataAccess(err)
    }
}

pub type HospitalResult<T> = std::result::Result<T, HospitalError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_error_joins_messages() {
        let err = HospitalError::Validation(vec![
            "admission date is required".to_owned(),
            "a patient must be selected".to_owned(),
        ]);
        assert_eq!(
            err.to_string(),
            "validation failed: admission date is required; a patient must be selected"
        );
    }

    #[test]
    fn test_data_access_display_is_generic() {
        let err = HospitalError::from(rusqlite::Error::QueryReturnedNoRows);
        assert_eq!(err.to_string(), "data access failure");
    }
}
