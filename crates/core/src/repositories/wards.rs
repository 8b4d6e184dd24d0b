//! Room and bed registry.
//!
//! `room_status` and `bed_status` are caches over live admission rows; the
//! admission lifecycle recomputes them on every mutation. The only status
//! the registry sets directly is `Maintenance`, which takes a room or bed
//! out of circulation without touching its occupancy history.

use crate::models::{Bed, NewBed, NewRoom, Room};
use crate::{HospitalError, HospitalResult};
use hms_types::{BedStatus, RoomStatus, RoomType};
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::str::FromStr;

fn room_from_row(row: &Row<'_>) -> rusqlite::Result<Room> {
    let room_type: String = row.get(2)?;
    let room_status: String = row.get(5)?;
    Ok(Room {
        room_id: row.get(0)?,
        room_no: row.get(1)?,
        room_type: RoomType::from_str(&room_type).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(err))
        })?,
        daily_cost: row.get(3)?,
        bed_stock: row.get(4)?,
        room_status: RoomStatus::from_str(&room_status).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(err))
        })?,
    })
}

fn bed_from_row(row: &Row<'_>) -> rusqlite::Result<Bed> {
    let bed_status: String = row.get(4)?;
    Ok(Bed {
        bed_id: row.get(0)?,
        room_id: row.get(1)?,
        bed_no: row.get(2)?,
        bed_type: row.get(3)?,
        bed_status: BedStatus::from_str(&bed_status).map_err(|err| {
            rusqlite::Error::FromSqlConversionFailure(4, rusqlite::types::Type::Text, Box::new(err))
        })?,
    })
}

const ROOM_COLUMNS: &str = "room_id, room_no, room_type, daily_cost, bed_stock, room_status";
const BED_COLUMNS: &str = "bed_id, room_id, bed_no, bed_type, bed_status";

fn validate_room(draft: &NewRoom) -> HospitalResult<()> {
    let mut errors = Vec::new();
    if draft.daily_cost < 0.0 {
        errors.push("daily cost cannot be negative".to_owned());
    }
    if draft.bed_stock <= 0 {
        errors.push("bed stock must be at least one".to_owned());
    }
    if errors.is_empty() {
        Ok(())
    } else {
        Err(HospitalError::Validation(errors))
    }
}

pub fn create_room(conn: &Connection, draft: &NewRoom) -> HospitalResult<i64> {
    validate_room(draft)?;
    conn.execute(
        "INSERT INTO room (room_no, room_type, daily_cost, bed_stock, room_status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            draft.room_no.as_str(),
            draft.room_type.as_str(),
            draft.daily_cost,
            draft.bed_stock,
            RoomStatus::Available.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_room(conn: &Connection, room_id: i64) -> HospitalResult<Option<Room>> {
    let room = conn
        .query_row(
            &format!("SELECT {ROOM_COLUMNS} FROM room WHERE room_id = ?1"),
            [room_id],
            room_from_row,
        )
        .optional()?;
    Ok(room)
}

pub fn list_rooms(conn: &Connection) -> HospitalResult<Vec<Room>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {ROOM_COLUMNS} FROM room ORDER BY room_type, room_id"
    ))?;
    let rows = stmt.query_map([], room_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn update_room(conn: &Connection, room_id: i64, draft: &NewRoom) -> HospitalResult<()> {
    validate_room(draft)?;
    let changed = conn.execute(
        "UPDATE room SET room_no = ?1, room_type = ?2, daily_cost = ?3, bed_stock = ?4
         WHERE room_id = ?5",
        params![
            draft.room_no.as_str(),
            draft.room_type.as_str(),
            draft.daily_cost,
            draft.bed_stock,
            room_id,
        ],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("room"));
    }
    Ok(())
}

/// Flags a room for maintenance or returns it to circulation.
pub fn set_room_status(conn: &Connection, room_id: i64, status: RoomStatus) -> HospitalResult<()> {
    let changed = conn.execute(
        "UPDATE room SET room_status = ?1 WHERE room_id = ?2",
        params![status.as_str(), room_id],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("room"));
    }
    Ok(())
}

/// Removes a room and its beds. Refused while any admission is active in it.
pub fn delete_room(conn: &mut Connection, room_id: i64) -> HospitalResult<()> {
    let tx = conn.transaction_with_behavior(rusqlite::TransactionBehavior::Immediate)?;
    let active: i64 = tx.query_row(
        "SELECT COUNT(*) FROM admission WHERE room_id = ?1 AND discharge_date IS NULL",
        [room_id],
        |row| row.get(0),
    )?;
    if active > 0 {
        return Err(HospitalError::RoomOccupied);
    }
    tx.execute("DELETE FROM bed WHERE room_id = ?1", [room_id])?;
    let changed = tx.execute("DELETE FROM room WHERE room_id = ?1", [room_id])?;
    if changed == 0 {
        return Err(HospitalError::NotFound("room"));
    }
    tx.commit()?;
    Ok(())
}

pub fn create_bed(conn: &Connection, draft: &NewBed) -> HospitalResult<i64> {
    let room_exists: bool = conn
        .query_row(
            "SELECT 1 FROM room WHERE room_id = ?1",
            [draft.room_id],
            |_| Ok(true),
        )
        .optional()?
        .unwrap_or(false);
    if !room_exists {
        return Err(HospitalError::NotFound("room"));
    }
    conn.execute(
        "INSERT INTO bed (room_id, bed_no, bed_type, bed_status) VALUES (?1, ?2, ?3, ?4)",
        params![
            draft.room_id,
            draft.bed_no.as_str(),
            draft.bed_type,
            BedStatus::Available.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_bed(conn: &Connection, bed_id: i64) -> HospitalResult<Option<Bed>> {
    let bed = conn
        .query_row(
            &format!("SELECT {BED_COLUMNS} FROM bed WHERE bed_id = ?1"),
            [bed_id],
            bed_from_row,
        )
        .optional()?;
    Ok(bed)
}

pub fn list_beds(conn: &Connection, room_id: i64) -> HospitalResult<Vec<Bed>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BED_COLUMNS} FROM bed WHERE room_id = ?1 ORDER BY bed_id"
    ))?;
    let rows = stmt.query_map([room_id], bed_from_row)?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// Flags a bed for maintenance or returns it to circulation.
pub fn set_bed_status(conn: &Connection, bed_id: i64, status: BedStatus) -> HospitalResult<()> {
    let changed = conn.execute(
        "UPDATE bed SET bed_status = ?1 WHERE bed_id = ?2",
        params![status.as_str(), bed_id],
    )?;
    if changed == 0 {
        return Err(HospitalError::NotFound("bed"));
    }
    Ok(())
}

/// Removes a bed. Refused while an active admission occupies it.
pub fn delete_bed(conn: &Connection, bed_id: i64) -> HospitalResult<()> {
    let occupied: i64 = conn.query_row(
        "SELECT COUNT(*) FROM admission WHERE bed_id = ?1 AND discharge_date IS NULL",
        [bed_id],
        |row| row.get(0),
    )?;
    if occupied > 0 {
        return Err(HospitalError::BedOccupied);
    }
    let changed = conn.execute("DELETE FROM bed WHERE bed_id = ?1", [bed_id])?;
    if changed == 0 {
        return Err(HospitalError::NotFound("bed"));
    }
    Ok(())
}
