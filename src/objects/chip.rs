use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

use super::carrier::Carrier;

pub const CHIP_STATUS_AVAILABLE: &str = "Available";
pub const CHIP_STATUS_WITHDRAWN: &str = "Withdrawn";

#[derive(Debug, thiserror::Error)]
#[error("unknown chip status '{0}'")]
pub struct UnknownStatus(pub String);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipStatus {
    Available,
    Withdrawn,
}

impl ChipStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChipStatus::Available => CHIP_STATUS_AVAILABLE,
            ChipStatus::Withdrawn => CHIP_STATUS_WITHDRAWN,
        }
    }
}

impl fmt::Display for ChipStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChipStatus {
    type Err = UnknownStatus;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        if wanted.eq_ignore_ascii_case(CHIP_STATUS_AVAILABLE) {
            Ok(ChipStatus::Available)
        } else if wanted.eq_ignore_ascii_case(CHIP_STATUS_WITHDRAWN) {
            Ok(ChipStatus::Withdrawn)
        } else {
            Err(UnknownStatus(String::from(wanted)))
        }
    }
}

impl ToSql for ChipStatus {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for ChipStatus {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all="camelCase")]
pub struct Chip {
    // ID is assigned database side.
    #[serde(skip)]
    id: i64,
    iccid: String,
    carrier: Carrier,
    status: ChipStatus,
    entry_timestamp: String,
    // Both of these are only set once the chip is withdrawn.
    exit_timestamp: Option<String>,
    withdrawn_by: Option<String>,
    notes: String,
    // Plain lookup value, the shipment may no longer exist.
    shipment_id: Option<i64>,
}

impl Chip {
    pub fn new(
        id: i64,
        iccid: String,
        carrier: Carrier,
        status: ChipStatus,
        entry_timestamp: String,
        exit_timestamp: Option<String>,
        withdrawn_by: Option<String>,
        notes: String,
        shipment_id: Option<i64>,
    ) -> Chip {
        Chip {
            id,
            iccid,
            carrier,
            status,
            entry_timestamp,
            exit_timestamp,
            withdrawn_by,
            notes,
            shipment_id,
        }
    }

    pub fn id(&self) -> i64 {
        self.id
    }

    pub fn iccid(&self) -> &str {
        &self.iccid
    }

    pub fn carrier(&self) -> Carrier {
        self.carrier
    }

    pub fn status(&self) -> ChipStatus {
        self.status
    }

    pub fn entry_timestamp(&self) -> &str {
        &self.entry_timestamp
    }

    pub fn exit_timestamp(&self) -> Option<&str> {
        self.exit_timestamp.as_deref()
    }

    pub fn withdrawn_by(&self) -> Option<&str> {
        self.withdrawn_by.as_deref()
    }

    pub fn notes(&self) -> &str {
        &self.notes
    }

    pub fn shipment_id(&self) -> Option<i64> {
        self.shipment_id
    }

    pub fn is_available(&self) -> bool {
        self.status == ChipStatus::Available
    }
}
