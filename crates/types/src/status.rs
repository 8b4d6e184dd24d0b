//! Ward and scheduling vocabulary.
//!
//! These enums mirror the values stored as text in the relational schema.
//! `Display` renders the exact stored form; `FromStr` accepts it
//! case-insensitively so values read back from the store or typed by the
//! calling layer normalise to the same variant.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Error returned when a stored label does not match the vocabulary.
#[derive(Debug, thiserror::Error)]
#[error("unknown {kind} label: {value}")]
pub struct VocabularyError {
    pub kind: &'static str,
    pub value: String,
}

/// Category of a ward room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RoomType {
    General,
    Private,
    #[serde(rename = "ICU")]
    Icu,
}

impl RoomType {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomType::General => "General",
            RoomType::Private => "Private",
            RoomType::Icu => "ICU",
        }
    }
}

impl std::fmt::Display for RoomType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomType {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "general" => Ok(RoomType::General),
            "private" => Ok(RoomType::Private),
            "icu" => Ok(RoomType::Icu),
            _ => Err(VocabularyError {
                kind: "room type",
                value: s.to_owned(),
            }),
        }
    }
}

/// Informational state of a room.
///
/// Occupancy truth is derived from live admission rows; this flag only
/// matters for excluding rooms under maintenance from availability.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomStatus {
    Available,
    Occupied,
    Maintenance,
}

impl RoomStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RoomStatus::Available => "Available",
            RoomStatus::Occupied => "Occupied",
            RoomStatus::Maintenance => "Maintenance",
        }
    }
}

impl std::fmt::Display for RoomStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoomStatus {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(RoomStatus::Available),
            "occupied" => Ok(RoomStatus::Occupied),
            "maintenance" => Ok(RoomStatus::Maintenance),
            _ => Err(VocabularyError {
                kind: "room status",
                value: s.to_owned(),
            }),
        }
    }
}

/// State of a single bed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BedStatus {
    Available,
    Occupied,
    Maintenance,
}

impl BedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BedStatus::Available => "Available",
            BedStatus::Occupied => "Occupied",
            BedStatus::Maintenance => "Maintenance",
        }
    }
}

impl std::fmt::Display for BedStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BedStatus {
    type Err = VocabularyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "available" => Ok(BedStatus::Available),
            "occupied" => Ok(BedStatus::Occupied),
            "maintenance" => Ok(BedStatus::Maintenance),
            _ => Err(VocabularyError {
                kind: "bed status",
                value: s.to_owned(),
            }),
        }
    }
}

/// Outcome bucket for an appointment.
///
/// Appointment status is stored as free text; this bucketing is lenient so
/// historical spellings ("no-show", "NO SHOW") land in the right variant.
/// Anything unrecognised is kept as `Other` rather than rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
    Other(String),
}

impl AppointmentStatus {
    /// Buckets a stored status label. Never fails.
    pub fn from_label(label: &str) -> Self {
        let normalised: String = label
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        match normalised.as_str() {
            "scheduled" | "booked" | "pending" => AppointmentStatus::Scheduled,
            "completed" | "done" | "attended" => AppointmentStatus::Completed,
            "cancelled" | "canceled" => AppointmentStatus::Cancelled,
            "noshow" => AppointmentStatus::NoShow,
            _ => AppointmentStatus::Other(label.trim().to_owned()),
        }
    }

    /// Whether an appointment in this state contributes its consultation
    /// fee to the patient's bill.
    pub fn is_billable(&self) -> bool {
        !matches!(
            self,
            AppointmentStatus::Cancelled | AppointmentStatus::NoShow
        )
    }

    pub fn as_str(&self) -> &str {
        match self {
            AppointmentStatus::Scheduled => "Scheduled",
            AppointmentStatus::Completed => "Completed",
            AppointmentStatus::Cancelled => "Cancelled",
            AppointmentStatus::NoShow => "No show",
            AppointmentStatus::Other(label) => label,
        }
    }
}

impl std::fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
