use crate::database::{DBError, InventoryStore};
use crate::defaults;
use crate::objects::{batch::BatchOutcome, carrier::Carrier, chip::{Chip, ChipStatus}, shipment::Shipment, statistics::Statistics};
use crate::util;

use std::path::Path;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use rusqlite::{params, ToSql};
use tracing::{debug, info, warn};


const DATABASE_VERSION_SETTING: &str = "CHIP_INVENTORY_DATABASE_VERSION";
const DATABASE_VERSION: u16 = 1;

const CHIP_COLUMNS: &str = "chip_id, iccid, carrier, status, entry_timestamp, exit_timestamp, withdrawn_by, notes, shipment_id";
const SHIPMENT_COLUMNS: &str = "shipment_id, shipment_number, created_at, carrier, quantity, notes";

const INSERT_CHIP: &str = "INSERT INTO chips (
        iccid,
        carrier,
        status,
        entry_timestamp,
        notes,
        shipment_id
    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);";

// The status guard is what keeps a chip from being withdrawn twice.
const WITHDRAW_CHIP: &str = "UPDATE chips SET
        status=?1,
        exit_timestamp=?2,
        withdrawn_by=?3
    WHERE iccid=?4 AND status=?5;";

pub struct SQLite {
    conn: rusqlite::Connection,
}

fn chip_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Chip> {
    Ok(Chip::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
        row.get(6)?,
        row.get(7)?,
        row.get(8)?,
    ))
}

fn shipment_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Shipment> {
    Ok(Shipment::new(
        row.get(0)?,
        row.get(1)?,
        row.get(2)?,
        row.get(3)?,
        row.get(4)?,
        row.get(5)?,
    ))
}

fn is_unique_violation(e: &rusqlite::Error) -> bool {
    match e {
        rusqlite::Error::SqliteFailure(err, _) => err.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
        _ => false,
    }
}

fn validate_withdrawer(withdrawn_by: &str) -> Result<&str, DBError> {
    let name = withdrawn_by.trim();
    if name.is_empty() {
        return Err(DBError::DataInsertionError(String::from("withdrawn by must name a person")))
    }
    Ok(name)
}

impl SQLite {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SQLite, DBError> {
        match rusqlite::Connection::open(path) {
            Ok(c) => Ok(SQLite {
                conn: c,
            }),
            Err(e) => Err(DBError::ConnectionError(e.to_string()))
        }
    }

    pub fn get_setting(&self, name: &str) -> Result<String, DBError> {
        match self.conn.query_row("SELECT value FROM settings WHERE setting=?1;",
            [name],
            |row| row.get(0)
        ) {
            Ok(it) => Ok(it),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(DBError::NotFound),
            Err(e) => Err(DBError::DataRetrievalError(e.to_string())),
        }
    }

    pub fn set_setting(&self, name: &str, value: &str) -> Result<(), DBError> {
        match self.conn.execute(
            "INSERT INTO settings (setting, value) VALUES (?1, ?2);",
            [name, value],
        ) {
            Ok(_) => Ok(()),
            Err(e) => Err(DBError::DataInsertionError(e.to_string()))
        }
    }

    fn check_version(&self, version: u16) -> Result<(), DBError> {
        if version > DATABASE_VERSION {
            return Err(DBError::DatabaseTooNew(format!("database version {version} is newer than our known version {DATABASE_VERSION}")))
        }
        if version < DATABASE_VERSION {
            return Err(DBError::InvalidVersionError(format!("no upgrade path from database version {version}")))
        }
        Ok(())
    }

    fn make_tables(&mut self) -> Result<(), DBError> {
        let tx = match self.conn.transaction() {
            Ok(tx) => tx,
            Err(e) => return Err(DBError::ConnectionError(e.to_string()))
        };
        let database_tables = [
            "CREATE TABLE IF NOT EXISTS shipments (
                shipment_id INTEGER PRIMARY KEY AUTOINCREMENT,
                shipment_number VARCHAR(50) NOT NULL,
                created_at VARCHAR(20) NOT NULL,
                carrier VARCHAR(50),
                quantity INTEGER NOT NULL DEFAULT 0,
                notes TEXT NOT NULL DEFAULT '',
                UNIQUE (shipment_number)
            );",
            // shipment_id is a lookup value only, deleting a shipment never
            // touches the chips that still point at it.
            "CREATE TABLE IF NOT EXISTS chips (
                chip_id INTEGER PRIMARY KEY AUTOINCREMENT,
                iccid VARCHAR(30) NOT NULL,
                carrier VARCHAR(50) NOT NULL,
                status VARCHAR(20) NOT NULL DEFAULT 'Available',
                entry_timestamp VARCHAR(20) NOT NULL,
                exit_timestamp VARCHAR(20),
                withdrawn_by VARCHAR(100),
                notes TEXT NOT NULL DEFAULT '',
                shipment_id INTEGER,
                UNIQUE (iccid),
                CHECK (iccid <> ''),
                CHECK (
                    (status = 'Available' AND exit_timestamp IS NULL AND withdrawn_by IS NULL) OR
                    (status = 'Withdrawn' AND exit_timestamp IS NOT NULL AND withdrawn_by IS NOT NULL)
                )
            );",
            "CREATE INDEX IF NOT EXISTS chips_by_shipment ON chips (shipment_id);",
            "CREATE INDEX IF NOT EXISTS chips_by_entry ON chips (entry_timestamp);",
        ];
        for table in database_tables {
            if let Err(e) = tx.execute(table, []) {
                return Err(DBError::DataInsertionError(e.to_string()))
            }
        }
        if let Err(e) = tx.execute(
            "INSERT INTO settings (setting, value) VALUES (?1, ?2);",
            params![DATABASE_VERSION_SETTING, DATABASE_VERSION.to_string()]
        ) {
            return Err(DBError::DataInsertionError(e.to_string()))
        }
        if let Err(e) = tx.commit() {
            return Err(DBError::DataInsertionError(e.to_string()))
        }
        info!(version = DATABASE_VERSION, "created inventory tables");
        Ok(())
    }

    fn query_chips(&self, sql: &str, values: &[&dyn ToSql]) -> Result<Vec<Chip>, DBError> {
        let mut stmt = match self.conn.prepare(sql) {
            Ok(stmt) => stmt,
            Err(e) => return Err(DBError::ConnectionError(e.to_string()))
        };
        let results = match stmt.query_map(values, chip_from_row) {
            Ok(r) => r,
            Err(e) => return Err(DBError::DataRetrievalError(e.to_string()))
        };
        let mut output: Vec<Chip> = Vec::new();
        for row in results {
            match row {
                Ok(c) => output.push(c),
                Err(e) => return Err(DBError::DataRetrievalError(e.to_string()))
            }
        }
        Ok(output)
    }

    /// Next free shipment number for `date`.
    ///
    /// Only suffixes that start with a digit take part, and the greatest one
    /// is picked by text order, so `REM-20240101-10000` never outranks
    /// `REM-20240101-9999`.
    pub fn shipment_number_for(&self, date: &NaiveDate) -> Result<String, DBError> {
        let prefix = util::shipment_day_prefix(date);
        let mut stmt = match self.conn.prepare(
            "SELECT shipment_number FROM shipments WHERE shipment_number GLOB ?1 ORDER BY shipment_number DESC;"
        ) {
            Ok(stmt) => stmt,
            Err(e) => return Err(DBError::ConnectionError(e.to_string()))
        };
        let mut rows = match stmt.query([format!("{prefix}-[0-9]*")]) {
            Ok(rows) => rows,
            Err(e) => return Err(DBError::DataRetrievalError(e.to_string()))
        };
        let mut next = 1;
        loop {
            let number: String = match rows.next() {
                Ok(Some(row)) => match row.get(0) {
                    Ok(number) => number,
                    Err(e) => return Err(DBError::DataRetrievalError(e.to_string()))
                },
                Ok(None) => break,
                Err(e) => return Err(DBError::DataRetrievalError(e.to_string()))
            };
            // Something like REM-20240101-7B starts with a digit but isn't ours.
            if let Some(sequence) = util::shipment_sequence(&number) {
                next = sequence.saturating_add(1);
                break
            }
            debug!(number = %number, "ignoring malformed shipment number");
        }
        Ok(util::format_shipment_number(date, next))
    }

    fn insert_shipment(&self, number: &str, carrier: Option<&str>, quantity: u32, notes: &str) -> Result<(i64, String), DBError> {
        match self.conn.execute(
            "INSERT INTO shipments (
                    shipment_number,
                    created_at,
                    carrier,
                    quantity,
                    notes
                ) VALUES (?1, ?2, ?3, ?4, ?5);",
            params![number, util::timestamp_now(), carrier, quantity, notes]
        ) {
            Ok(_) => Ok((self.conn.last_insert_rowid(), String::from(number))),
            Err(e) if is_unique_violation(&e) => Err(DBError::AlreadyExists(String::from(number))),
            Err(e) => Err(DBError::DataInsertionError(e.to_string()))
        }
    }

    /// Inserts a shipment under numbers drawn from `next_number`, drawing a
    /// fresh one whenever the previous candidate was taken in the meantime.
    fn create_shipment_with<F>(&self, mut next_number: F, carrier: Option<&str>, quantity: u32, notes: &str) -> Result<(i64, String), DBError>
    where
        F: FnMut(&SQLite) -> Result<String, DBError>,
    {
        let attempts = defaults::DEFAULT_SHIPMENT_ATTEMPTS;
        for attempt in 1..=attempts {
            let candidate = next_number(self)?;
            match self.insert_shipment(&candidate, carrier, quantity, notes) {
                Ok((id, number)) => {
                    info!(id, number = %number, quantity, "created shipment");
                    return Ok((id, number))
                },
                Err(DBError::AlreadyExists(_)) => {
                    warn!(attempt, number = %candidate, "shipment number already taken, regenerating");
                },
                Err(e) => return Err(e)
            }
        }
        Err(DBError::Exhausted(attempts))
    }
}

impl InventoryStore for SQLite {
    // Setup
    fn setup(&mut self) -> Result<(), DBError> {
        // The settings table has to exist before we can ask it for a version.
        if let Err(e) = self.conn.execute(
            "CREATE TABLE IF NOT EXISTS settings (
                setting VARCHAR NOT NULL,
                value VARCHAR NOT NULL,
                UNIQUE (setting) ON CONFLICT REPLACE
            );",
            []
        ) {
            return Err(DBError::DataInsertionError(e.to_string()))
        }
        match self.get_setting(DATABASE_VERSION_SETTING) {
            Ok(v) => match u16::from_str(&v) {
                Ok(version) => self.check_version(version),
                Err(_) => Err(DBError::InvalidVersionError(format!("unable to parse version value '{v}'")))
            },
            Err(DBError::NotFound) => self.make_tables(),
            Err(e) => Err(e)
        }
    }

    // Chips
    fn register_chip(&self, raw_iccid: &str, carrier: Carrier, shipment_id: Option<i64>, notes: &str) -> Result<i64, DBError> {
        let iccid = util::normalize_iccid(raw_iccid);
        if iccid.is_empty() {
            return Err(DBError::InvalidIdentifier(String::from(raw_iccid)))
        }
        match self.conn.execute(
            INSERT_CHIP,
            params![iccid, carrier, ChipStatus::Available, util::timestamp_now(), notes, shipment_id]
        ) {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                debug!(id, iccid = %iccid, carrier = %carrier, "registered chip");
                Ok(id)
            },
            Err(e) if is_unique_violation(&e) => Err(DBError::AlreadyExists(iccid)),
            Err(e) => Err(DBError::DataInsertionError(e.to_string()))
        }
    }

    fn register_chips_batch(&mut self, items: &[(String, Carrier)], shipment_id: Option<i64>) -> Result<BatchOutcome, DBError> {
        let tx = match self.conn.transaction() {
            Ok(tx) => tx,
            Err(e) => return Err(DBError::ConnectionError(e.to_string()))
        };
        let mut outcome = BatchOutcome::new();
        {
            let mut stmt = match tx.prepare(INSERT_CHIP) {
                Ok(stmt) => stmt,
                Err(e) => return Err(DBError::ConnectionError(e.to_string()))
            };
            for (raw, carrier) in items {
                let iccid = util::normalize_iccid(raw);
                if iccid.is_empty() {
                    debug!(raw = %raw, "skipping identifier without digits");
                    outcome.failed_on(raw);
                    continue
                }
                // A failed insert only undoes its own statement, the
                // transaction stays usable for the rest of the batch.
                match stmt.execute(params![iccid, carrier, ChipStatus::Available, util::timestamp_now(), "", shipment_id]) {
                    Ok(_) => outcome.succeeded(),
                    Err(e) if is_unique_violation(&e) => {
                        debug!(iccid = %iccid, "skipping duplicate chip");
                        outcome.failed_on(raw);
                    },
                    Err(e) => {
                        warn!(error = %e, "chip batch rolled back");
                        return Err(DBError::DataInsertionError(e.to_string()))
                    }
                }
            }
        }
        if let Err(e) = tx.commit() {
            return Err(DBError::DataInsertionError(e.to_string()))
        }
        info!(registered = outcome.success_count(), failed = outcome.failed().len(), shipment_id, "registered chip batch");
        Ok(outcome)
    }

    // Shipments
    fn generate_shipment_number(&self) -> Result<String, DBError> {
        self.shipment_number_for(&Local::now().date_naive())
    }

    fn create_shipment(&self, number: Option<&str>, carrier: Option<&str>, quantity: u32, notes: &str) -> Result<(i64, String), DBError> {
        if let Some(number) = number {
            let created = self.insert_shipment(number, carrier, quantity, notes)?;
            info!(id = created.0, number = %created.1, quantity, "created shipment");
            return Ok(created)
        }
        self.create_shipment_with(|db| db.generate_shipment_number(), carrier, quantity, notes)
    }

    fn get_shipment(&self, id: i64) -> Result<Shipment, DBError> {
        match self.conn.query_row(
            &format!("SELECT {SHIPMENT_COLUMNS} FROM shipments WHERE shipment_id=?1;"),
            [id],
            shipment_from_row
        ) {
            Ok(s) => Ok(s),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(DBError::NotFound),
            Err(e) => Err(DBError::DataRetrievalError(e.to_string()))
        }
    }

    fn list_shipments(&self) -> Result<Vec<Shipment>, DBError> {
        let mut stmt = match self.conn.prepare(&format!("SELECT {SHIPMENT_COLUMNS} FROM shipments ORDER BY created_at DESC, shipment_id DESC;")) {
            Ok(stmt) => stmt,
            Err(e) => return Err(DBError::ConnectionError(e.to_string()))
        };
        let results = match stmt.query_map([], shipment_from_row) {
            Ok(r) => r,
            Err(e) => return Err(DBError::DataRetrievalError(e.to_string()))
        };
        let mut output: Vec<Shipment> = Vec::new();
        for row in results {
            match row {
                Ok(s) => output.push(s),
                Err(e) => return Err(DBError::DataRetrievalError(e.to_string()))
            }
        }
        Ok(output)
    }

    fn get_chips_for_shipment(&self, id: i64) -> Result<Vec<Chip>, DBError> {
        self.query_chips(
            &format!("SELECT {CHIP_COLUMNS} FROM chips WHERE shipment_id=?1 ORDER BY entry_timestamp ASC, chip_id ASC;"),
            &[&id]
        )
    }

    fn delete_shipment(&mut self, id: i64, cascade_chips: bool) -> Result<usize, DBError> {
        let tx = match self.conn.transaction() {
            Ok(tx) => tx,
            Err(e) => return Err(DBError::ConnectionError(e.to_string()))
        };
        let mut removed = 0;
        if cascade_chips {
            removed = match tx.execute("DELETE FROM chips WHERE shipment_id=?1;", [id]) {
                Ok(num) => num,
                Err(e) => return Err(DBError::DataDeletionError(e.to_string()))
            };
        }
        // Returning before commit drops the transaction, which rolls back
        // any chips removed above.
        match tx.execute("DELETE FROM shipments WHERE shipment_id=?1;", [id]) {
            Ok(1) => {},
            Ok(_) => {
                warn!(id, "shipment not found, delete rolled back");
                return Err(DBError::NotFound)
            },
            Err(e) => return Err(DBError::DataDeletionError(e.to_string()))
        }
        if let Err(e) = tx.commit() {
            return Err(DBError::DataDeletionError(e.to_string()))
        }
        info!(id, cascade_chips, chips_removed = removed, "deleted shipment");
        Ok(removed)
    }

    // Withdrawal
    fn withdraw_chip(&self, iccid: &str, withdrawn_by: &str) -> Result<(), DBError> {
        let withdrawn_by = validate_withdrawer(withdrawn_by)?;
        let normalized = util::normalize_iccid(iccid);
        match self.conn.execute(
            WITHDRAW_CHIP,
            params![ChipStatus::Withdrawn, util::timestamp_now(), withdrawn_by, normalized, ChipStatus::Available]
        ) {
            Ok(1) => {
                debug!(iccid = %normalized, withdrawn_by, "withdrew chip");
                Ok(())
            },
            Ok(_) => Err(DBError::NotFoundOrAlreadyWithdrawn(String::from(iccid))),
            Err(e) => Err(DBError::DataInsertionError(e.to_string()))
        }
    }

    fn withdraw_chips_batch(&mut self, iccids: &[String], withdrawn_by: &str) -> Result<BatchOutcome, DBError> {
        let withdrawn_by = validate_withdrawer(withdrawn_by)?;
        let tx = match self.conn.transaction() {
            Ok(tx) => tx,
            Err(e) => return Err(DBError::ConnectionError(e.to_string()))
        };
        let mut outcome = BatchOutcome::new();
        {
            let mut stmt = match tx.prepare(WITHDRAW_CHIP) {
                Ok(stmt) => stmt,
                Err(e) => return Err(DBError::ConnectionError(e.to_string()))
            };
            for raw in iccids {
                let normalized = util::normalize_iccid(raw);
                match stmt.execute(params![ChipStatus::Withdrawn, util::timestamp_now(), withdrawn_by, normalized, ChipStatus::Available]) {
                    Ok(1) => outcome.succeeded(),
                    Ok(_) => {
                        debug!(raw = %raw, "chip not found or already withdrawn");
                        outcome.failed_on(raw);
                    },
                    Err(e) => {
                        warn!(error = %e, "withdrawal batch rolled back");
                        return Err(DBError::DataInsertionError(e.to_string()))
                    }
                }
            }
        }
        if let Err(e) = tx.commit() {
            return Err(DBError::DataInsertionError(e.to_string()))
        }
        info!(withdrawn = outcome.success_count(), failed = outcome.failed().len(), withdrawn_by, "withdrew chip batch");
        Ok(outcome)
    }

    // Queries
    fn get_chip(&self, iccid: &str) -> Result<Chip, DBError> {
        let normalized = util::normalize_iccid(iccid);
        if normalized.is_empty() {
            return Err(DBError::InvalidIdentifier(String::from(iccid)))
        }
        match self.conn.query_row(
            &format!("SELECT {CHIP_COLUMNS} FROM chips WHERE iccid=?1;"),
            [normalized],
            chip_from_row
        ) {
            Ok(c) => Ok(c),
            Err(rusqlite::Error::QueryReturnedNoRows) => Err(DBError::NotFound),
            Err(e) => Err(DBError::DataRetrievalError(e.to_string()))
        }
    }

    fn list_chips(&self, carrier: Option<Carrier>, status: Option<ChipStatus>) -> Result<Vec<Chip>, DBError> {
        let mut sql = format!("SELECT {CHIP_COLUMNS} FROM chips WHERE 1=1");
        let mut values: Vec<&dyn ToSql> = Vec::new();
        if let Some(c) = carrier.as_ref() {
            sql.push_str(" AND carrier=?");
            values.push(c);
        }
        if let Some(s) = status.as_ref() {
            sql.push_str(" AND status=?");
            values.push(s);
        }
        sql.push_str(" ORDER BY entry_timestamp DESC, chip_id DESC;");
        self.query_chips(&sql, &values[..])
    }

    fn compute_statistics(&self) -> Result<Statistics, DBError> {
        match self.conn.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(status = ?1), 0),
                COALESCE(SUM(status = ?2), 0),
                (SELECT COUNT(*) FROM shipments)
            FROM chips;",
            params![ChipStatus::Available, ChipStatus::Withdrawn],
            |row| {
                let total: i64 = row.get(0)?;
                let available: i64 = row.get(1)?;
                let withdrawn: i64 = row.get(2)?;
                let total_shipments: i64 = row.get(3)?;
                Ok(Statistics {
                    total: total as u64,
                    available: available as u64,
                    withdrawn: withdrawn as u64,
                    total_shipments: total_shipments as u64,
                })
            }
        ) {
            Ok(stats) => Ok(stats),
            Err(e) => Err(DBError::DataRetrievalError(e.to_string()))
        }
    }
}
