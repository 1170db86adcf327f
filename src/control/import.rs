use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Read};
use std::path::Path;

use tracing::warn;

use crate::objects::carrier::Carrier;

#[cfg(test)]
mod tests;

#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    #[error("unable to read import file: {0}")]
    Io(#[from] io::Error),
    #[error("malformed import row: {0}")]
    Csv(#[from] csv::Error),
}

/// Rows pulled out of an import file, ready for batch registration.
#[derive(Debug, Default)]
pub struct ImportPlan {
    items: Vec<(String, Carrier)>,
    // Identifiers whose carrier could not be worked out.
    skipped: Vec<String>,
}

impl ImportPlan {
    pub fn items(&self) -> &[(String, Carrier)] {
        &self.items
    }

    pub fn skipped(&self) -> &[String] {
        &self.skipped
    }

    /// The carrier most rows belong to, ties going to whichever showed up first.
    pub fn predominant_carrier(&self) -> Option<Carrier> {
        let mut counts: HashMap<Carrier, usize> = HashMap::new();
        let mut order: Vec<Carrier> = Vec::new();
        for (_, carrier) in &self.items {
            let count = counts.entry(*carrier).or_insert(0);
            if *count == 0 {
                order.push(*carrier);
            }
            *count += 1;
        }
        let mut best: Option<(Carrier, usize)> = None;
        for carrier in order {
            let count = counts[&carrier];
            match best {
                Some((_, best_count)) if best_count >= count => {},
                _ => best = Some((carrier, count)),
            }
        }
        best.map(|(carrier, _)| carrier)
    }
}

pub fn read_file<P: AsRef<Path>>(path: P, delimiter: u8, default_carrier: Option<Carrier>) -> Result<ImportPlan, ImportError> {
    let file = File::open(path)?;
    read_rows(file, delimiter, default_carrier)
}

/// Reads `identifier[<delimiter>carrier]` rows.
///
/// The identifier is kept exactly as written, normalizing it is up to the
/// store. A row without a carrier of its own takes `default_carrier`; a row
/// naming a carrier we don't know is skipped rather than filed under the
/// default.
pub fn read_rows<R: Read>(input: R, delimiter: u8, default_carrier: Option<Carrier>) -> Result<ImportPlan, ImportError> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(input);
    let mut plan = ImportPlan::default();
    for record in reader.records() {
        let record = record?;
        let raw = match record.get(0) {
            Some(raw) if !raw.is_empty() => raw,
            _ => continue,
        };
        let carrier = match record.get(1) {
            Some(named) if !named.is_empty() => named.parse::<Carrier>().ok(),
            _ => default_carrier,
        };
        match carrier {
            Some(carrier) => plan.items.push((String::from(raw), carrier)),
            None => {
                warn!(identifier = raw, "no usable carrier for import row");
                plan.skipped.push(String::from(raw));
            }
        }
    }
    Ok(plan)
}

pub fn read_identifiers_file<P: AsRef<Path>>(path: P) -> Result<Vec<String>, ImportError> {
    let file = File::open(path)?;
    read_identifiers(BufReader::new(file))
}

/// One identifier per line, blank lines ignored.
pub fn read_identifiers<R: BufRead>(input: R) -> Result<Vec<String>, ImportError> {
    let mut output: Vec<String> = Vec::new();
    for line in input.lines() {
        let line = line?;
        let trimmed = line.trim();
        if !trimmed.is_empty() {
            output.push(String::from(trimmed));
        }
    }
    Ok(output)
}
