use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::objects::chip::Chip;


pub const EXPORT_HEADER: [&str; 6] = ["ICCID", "Carrier", "Status", "Entry", "Exit", "Withdrawn By"];

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Csv,
    Json,
}

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("unable to write export: {0}")]
    Io(#[from] io::Error),
    #[error("unable to write delimited export: {0}")]
    Csv(#[from] csv::Error),
    #[error("unable to write json export: {0}")]
    Json(#[from] serde_json::Error),
}

pub fn export_chips<P: AsRef<Path>>(path: P, chips: &[Chip], format: ExportFormat, delimiter: u8) -> Result<(), ExportError> {
    let file = File::create(path)?;
    match format {
        ExportFormat::Csv => write_chips_delimited(file, chips, delimiter),
        ExportFormat::Json => write_chips_json(BufWriter::new(file), chips),
    }
}

/// Writes one row per chip under [`EXPORT_HEADER`], null fields as empty cells.
pub fn write_chips_delimited<W: Write>(out: W, chips: &[Chip], delimiter: u8) -> Result<(), ExportError> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(out);
    writer.write_record(EXPORT_HEADER)?;
    for chip in chips {
        writer.write_record([
            chip.iccid(),
            chip.carrier().as_str(),
            chip.status().as_str(),
            chip.entry_timestamp(),
            chip.exit_timestamp().unwrap_or(""),
            chip.withdrawn_by().unwrap_or(""),
        ])?;
    }
    writer.flush()?;
    Ok(())
}

pub fn write_chips_json<W: Write>(mut out: W, chips: &[Chip]) -> Result<(), ExportError> {
    serde_json::to_writer_pretty(&mut out, chips)?;
    out.flush()?;
    Ok(())
}
