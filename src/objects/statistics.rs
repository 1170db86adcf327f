use serde::Serialize;

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all="camelCase")]
pub struct Statistics {
    pub total: u64,
    pub available: u64,
    pub withdrawn: u64,
    pub total_shipments: u64,
}
