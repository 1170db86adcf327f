use crate::objects::{batch::BatchOutcome, carrier::Carrier, chip::{Chip, ChipStatus}, shipment::Shipment, statistics::Statistics};

pub mod sqlite;

#[derive(Debug, thiserror::Error)]
pub enum DBError {
    #[error("Connection Error: {0}")]
    ConnectionError(String),
    #[error("Invalid Database Version: {0}")]
    InvalidVersionError(String),
    #[error("Database Version Too New: {0}")]
    DatabaseTooNew(String),
    #[error("Error Inserting Data: {0}")]
    DataInsertionError(String),
    #[error("Error Retrieving Data: {0}")]
    DataRetrievalError(String),
    #[error("Error Deleting Data: {0}")]
    DataDeletionError(String),
    #[error("Data Not Found")]
    NotFound,
    #[error("Invalid Identifier: '{0}' contains no digits")]
    InvalidIdentifier(String),
    #[error("Already Exists: {0}")]
    AlreadyExists(String),
    #[error("Chip {0} not found or already withdrawn")]
    NotFoundOrAlreadyWithdrawn(String),
    #[error("No free shipment number after {0} attempts")]
    Exhausted(u32),
}

pub trait InventoryStore {
    // Setup functions
    fn setup(&mut self) -> Result<(), DBError>;
    // Chip registration
    fn register_chip(&self, raw_iccid: &str, carrier: Carrier, shipment_id: Option<i64>, notes: &str) -> Result<i64, DBError>;
    fn register_chips_batch(&mut self, items: &[(String, Carrier)], shipment_id: Option<i64>) -> Result<BatchOutcome, DBError>;
    // Shipments
    fn generate_shipment_number(&self) -> Result<String, DBError>;
    fn create_shipment(&self, number: Option<&str>, carrier: Option<&str>, quantity: u32, notes: &str) -> Result<(i64, String), DBError>;
    fn get_shipment(&self, id: i64) -> Result<Shipment, DBError>;
    fn list_shipments(&self) -> Result<Vec<Shipment>, DBError>;
    fn get_chips_for_shipment(&self, id: i64) -> Result<Vec<Chip>, DBError>;
    fn delete_shipment(&mut self, id: i64, cascade_chips: bool) -> Result<usize, DBError>;
    // Withdrawal
    fn withdraw_chip(&self, iccid: &str, withdrawn_by: &str) -> Result<(), DBError>;
    fn withdraw_chips_batch(&mut self, iccids: &[String], withdrawn_by: &str) -> Result<BatchOutcome, DBError>;
    // Queries
    fn get_chip(&self, iccid: &str) -> Result<Chip, DBError>;
    fn list_chips(&self, carrier: Option<Carrier>, status: Option<ChipStatus>) -> Result<Vec<Chip>, DBError>;
    fn compute_statistics(&self) -> Result<Statistics, DBError>;
}
