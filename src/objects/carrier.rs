use std::fmt;
use std::str::FromStr;

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
#[error("unknown carrier '{0}'")]
pub struct UnknownCarrier(pub String);

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Carrier {
    Claro,
    Tim,
    Arquia,
    #[serde(rename = "Quectel Tim")]
    QuectelTim,
    #[serde(rename = "Quectel Vivo")]
    QuectelVivo,
    Vivo,
}

impl Carrier {
    pub const ALL: [Carrier; 6] = [
        Carrier::Claro,
        Carrier::Tim,
        Carrier::Arquia,
        Carrier::QuectelTim,
        Carrier::QuectelVivo,
        Carrier::Vivo,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Carrier::Claro => "Claro",
            Carrier::Tim => "Tim",
            Carrier::Arquia => "Arquia",
            Carrier::QuectelTim => "Quectel Tim",
            Carrier::QuectelVivo => "Quectel Vivo",
            Carrier::Vivo => "Vivo",
        }
    }
}

impl fmt::Display for Carrier {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Matching ignores case and surrounding whitespace so that hand-typed
// spreadsheet values like "quectel vivo " still resolve.
impl FromStr for Carrier {
    type Err = UnknownCarrier;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Carrier::ALL
            .iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(wanted))
            .copied()
            .ok_or_else(|| UnknownCarrier(String::from(wanted)))
    }
}

impl ToSql for Carrier {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.as_str()))
    }
}

impl FromSql for Carrier {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str()?.parse().map_err(|e| FromSqlError::Other(Box::new(e)))
    }
}

#[cfg(test)]
mod tests {
    use super::Carrier;

    #[test]
    fn test_parse_carrier() {
        assert_eq!(Carrier::QuectelVivo, "quectel vivo ".parse().unwrap());
        assert_eq!(Carrier::Tim, "TIM".parse().unwrap());
        assert!("Oi".parse::<Carrier>().is_err());
        assert!("".parse::<Carrier>().is_err());
        for c in Carrier::ALL {
            assert_eq!(c, c.to_string().parse().unwrap());
        }
    }
}
