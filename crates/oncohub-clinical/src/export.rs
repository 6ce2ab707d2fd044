//! CSV export of diagnostic reports.
//!
//! The destination is truncated and rewritten on every call; the header row is
//! always written, even for an empty record set.

use std::path::Path;

use tracing::{debug, info};

use oncohub_common::{OncohubError, Result};

use crate::reports::{DiagnosticReportRecord, EXPORT_HEADER};

pub fn persist(records: &[DiagnosticReportRecord], destination: &Path) -> Result<()> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(destination)
        .map_err(csv_to_io)?;
    debug!(path = %destination.display(), "CSV writer initialized");

    wtr.write_record(EXPORT_HEADER).map_err(csv_to_io)?;
    for record in records {
        wtr.write_record(record.as_row()).map_err(csv_to_io)?;
    }
    wtr.flush()?;

    info!(rows = records.len(), path = %destination.display(), "Diagnostic reports saved");
    Ok(())
}

fn csv_to_io(e: csv::Error) -> OncohubError {
    OncohubError::Io(std::io::Error::from(e))
}
