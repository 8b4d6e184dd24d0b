//! # HMS Types
//!
//! Shared domain vocabulary for the hospital management system.
//!
//! This crate holds the validated value types that cross crate boundaries:
//! non-empty text, ward vocabulary (room/bed states, room categories,
//! appointment outcomes) and the actor/role model used by the calling layer.
//!
//! **No I/O concerns**: persistence and business rules live in `hms-core`.

mod actor;
mod status;
mod text;

pub use actor::{Actor, Role, StaffRole};
pub use status::{AppointmentStatus, BedStatus, RoomStatus, RoomType, VocabularyError};
pub use text::{NonEmptyText, TextError};
