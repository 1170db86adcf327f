pub const DEFAULT_DATABASE_PATH: &str = "./chip-inventory.sqlite";
pub const DEFAULT_SHIPMENT_ATTEMPTS: u32 = 100;
pub const DEFAULT_IMPORT_DELIMITER: char = ';';
pub const DEFAULT_EXPORT_DELIMITER: char = ';';
