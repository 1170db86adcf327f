pub mod batch;
pub mod carrier;
pub mod chip;
pub mod shipment;
pub mod statistics;
