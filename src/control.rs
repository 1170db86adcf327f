use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};

use crate::database::{DBError, InventoryStore};
use crate::defaults;
use crate::objects::{carrier::Carrier, chip::{Chip, ChipStatus}, shipment::Shipment};

pub mod export;
pub mod import;

#[cfg(test)]
mod tests;

#[derive(Parser, Debug)]
#[command(name = "chip-inventory", version, about = "Keeps track of SIM chips from arrival to withdrawal")]
pub struct Cli {
    /// SQLite database file holding the inventory.
    #[arg(long, global = true, env = "CHIP_INVENTORY_DATABASE_PATH", default_value = defaults::DEFAULT_DATABASE_PATH)]
    pub database: PathBuf,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register a single chip.
    Register {
        iccid: String,
        #[arg(long)]
        carrier: Carrier,
        #[arg(long, default_value = "")]
        notes: String,
    },
    /// Register every chip listed in a delimited file under a new shipment.
    Import {
        file: PathBuf,
        /// Carrier for rows that don't name one.
        #[arg(long)]
        carrier: Option<Carrier>,
        #[arg(long, default_value = "")]
        notes: String,
        #[arg(long, default_value_t = defaults::DEFAULT_IMPORT_DELIMITER)]
        delimiter: char,
    },
    /// Withdraw one or more chips.
    Withdraw {
        iccids: Vec<String>,
        /// File with one ICCID per line.
        #[arg(long)]
        file: Option<PathBuf>,
        /// Who is taking the chips.
        #[arg(long = "by")]
        withdrawn_by: String,
    },
    /// List chips, newest first.
    List {
        #[arg(long)]
        carrier: Option<Carrier>,
        #[arg(long)]
        status: Option<ChipStatus>,
        /// Write the listing to this file instead of the terminal.
        #[arg(long)]
        export: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = export::ExportFormat::Csv)]
        format: export::ExportFormat,
        #[arg(long, default_value_t = defaults::DEFAULT_EXPORT_DELIMITER)]
        delimiter: char,
    },
    /// Show a single chip.
    Show {
        iccid: String,
    },
    /// List shipments, newest first.
    Shipments,
    /// Show a shipment and the chips that arrived in it.
    Shipment {
        id: i64,
    },
    /// Delete a shipment, optionally along with its chips.
    DeleteShipment {
        id: i64,
        #[arg(long)]
        cascade: bool,
    },
    /// Print the number the next shipment would get today.
    NextShipmentNumber,
    /// Inventory totals.
    Stats,
}

fn delimiter_byte(delimiter: char) -> anyhow::Result<u8> {
    if !delimiter.is_ascii() {
        bail!("delimiter '{delimiter}' must be a single ascii character")
    }
    Ok(delimiter as u8)
}

fn print_failures(failed: &[String], reason: &str) {
    if failed.is_empty() {
        return
    }
    println!("{} {reason}:", failed.len());
    for identifier in failed {
        println!("    {identifier}");
    }
}

fn print_chip_header() {
    println!("{:<22} {:<13} {:<10} {:<19} {:<19} {}", "ICCID", "Carrier", "Status", "Entry", "Exit", "Withdrawn By");
}

fn print_chip(chip: &Chip) {
    println!(
        "{:<22} {:<13} {:<10} {:<19} {:<19} {}",
        chip.iccid(),
        chip.carrier().as_str(),
        chip.status().as_str(),
        chip.entry_timestamp(),
        chip.exit_timestamp().unwrap_or(""),
        chip.withdrawn_by().unwrap_or("")
    );
}

fn print_shipment(shipment: &Shipment) {
    println!(
        "{:<6} {:<19} {:<19} {:<13} {:>5} {}",
        shipment.id(),
        shipment.number(),
        shipment.created_at(),
        shipment.carrier().unwrap_or(""),
        shipment.quantity(),
        shipment.notes()
    );
}

pub fn run<D: InventoryStore>(command: Command, db: &mut D) -> anyhow::Result<()> {
    match command {
        Command::Register { iccid, carrier, notes } => {
            db.register_chip(&iccid, carrier, None, &notes)
                .with_context(|| format!("unable to register chip {iccid}"))?;
            println!("Chip {iccid} registered.");
        },
        Command::Import { file, carrier, notes, delimiter } => {
            let plan = import::read_file(&file, delimiter_byte(delimiter)?, carrier)
                .with_context(|| format!("unable to import {}", file.display()))?;
            print_failures(plan.skipped(), "rows skipped without a known carrier");
            if plan.items().is_empty() {
                bail!("no chips with a known carrier found in {}", file.display())
            }
            let label = carrier.or_else(|| plan.predominant_carrier());
            let quantity = u32::try_from(plan.items().len()).context("too many chips in one shipment")?;
            let (shipment_id, number) = db.create_shipment(None, label.map(|c| c.as_str()), quantity, &notes)?;
            let outcome = db.register_chips_batch(plan.items(), Some(shipment_id))?;
            println!("Shipment {number} created. {} of {} chips registered.", outcome.success_count(), quantity);
            print_failures(outcome.failed(), "invalid or already registered");
        },
        Command::Withdraw { mut iccids, file, withdrawn_by } => {
            if let Some(file) = file {
                let listed = import::read_identifiers_file(&file)
                    .with_context(|| format!("unable to read {}", file.display()))?;
                iccids.extend(listed);
            }
            match iccids.len() {
                0 => bail!("no chips given to withdraw"),
                1 => {
                    db.withdraw_chip(&iccids[0], &withdrawn_by)?;
                    println!("Chip {} withdrawn by {}.", iccids[0], withdrawn_by.trim());
                },
                _ => {
                    let outcome = db.withdraw_chips_batch(&iccids, &withdrawn_by)?;
                    println!("{} of {} chips withdrawn.", outcome.success_count(), outcome.attempted());
                    print_failures(outcome.failed(), "not found or already withdrawn");
                }
            }
        },
        Command::List { carrier, status, export, format, delimiter } => {
            let chips = db.list_chips(carrier, status)?;
            match export {
                Some(path) => {
                    export::export_chips(&path, &chips, format, delimiter_byte(delimiter)?)
                        .with_context(|| format!("unable to export to {}", path.display()))?;
                    println!("{} chips exported to {}.", chips.len(), path.display());
                },
                None => {
                    print_chip_header();
                    for chip in &chips {
                        print_chip(chip);
                    }
                    println!("{} chips.", chips.len());
                }
            }
        },
        Command::Show { iccid } => {
            let chip = match db.get_chip(&iccid) {
                Ok(chip) => chip,
                Err(DBError::NotFound) => bail!("chip {iccid} is not registered"),
                Err(e) => return Err(e.into())
            };
            println!("ICCID:        {}", chip.iccid());
            println!("Carrier:      {}", chip.carrier());
            println!("Status:       {}", chip.status());
            println!("Entry:        {}", chip.entry_timestamp());
            if let (Some(exit), Some(by)) = (chip.exit_timestamp(), chip.withdrawn_by()) {
                println!("Exit:         {exit}");
                println!("Withdrawn by: {by}");
            }
            if !chip.notes().is_empty() {
                println!("Notes:        {}", chip.notes());
            }
            if let Some(id) = chip.shipment_id() {
                match db.get_shipment(id) {
                    Ok(shipment) => println!("Shipment:     {}", shipment.number()),
                    Err(DBError::NotFound) => println!("Shipment:     {id} (deleted)"),
                    Err(e) => return Err(e.into())
                }
            }
        },
        Command::Shipments => {
            let shipments = db.list_shipments()?;
            for shipment in &shipments {
                print_shipment(shipment);
            }
            println!("{} shipments.", shipments.len());
        },
        Command::Shipment { id } => {
            let shipment = match db.get_shipment(id) {
                Ok(shipment) => shipment,
                Err(DBError::NotFound) => bail!("shipment {id} does not exist"),
                Err(e) => return Err(e.into())
            };
            print_shipment(&shipment);
            let chips = db.get_chips_for_shipment(id)?;
            print_chip_header();
            for chip in &chips {
                print_chip(chip);
            }
            println!("{} of {} chips on record.", chips.len(), shipment.quantity());
        },
        Command::DeleteShipment { id, cascade } => {
            let removed = match db.delete_shipment(id, cascade) {
                Ok(removed) => removed,
                Err(DBError::NotFound) => bail!("shipment {id} does not exist"),
                Err(e) => return Err(e).context(format!("unable to delete shipment {id}"))
            };
            if cascade {
                println!("Shipment {id} deleted along with {removed} chips.");
            } else {
                println!("Shipment {id} deleted, its chips were kept.");
            }
        },
        Command::NextShipmentNumber => {
            println!("{}", db.generate_shipment_number()?);
        },
        Command::Stats => {
            let stats = db.compute_statistics()?;
            println!("Total:     {}", stats.total);
            println!("Available: {}", stats.available);
            println!("Withdrawn: {}", stats.withdrawn);
            println!("Shipments: {}", stats.total_shipments);
        },
    }
    Ok(())
}
