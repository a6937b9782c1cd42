use std::path::Path;

use log::{info, warn};
use tempfile::NamedTempFile;

use crate::archive::{self, Archive, Fetcher};
use crate::cli::Options;
use crate::drone::{self, DroneRow, JoinReport};
use crate::error::{Error, Result};
use crate::registry::Tables;

#[derive(Debug, PartialEq)]
pub enum Outcome {
    /// Entries of the archive, for `--list_files`.
    Listed(Vec<String>),
    Extracted(JoinReport),
}

/// Runs the whole pipeline: obtain archive, load tables, join, write.
pub fn run(options: &Options, fetcher: &dyn Fetcher) -> Result<Outcome> {
    let archive = obtain_archive(options, fetcher)?;

    if options.list_files {
        return Ok(Outcome::Listed(archive.file_names()?));
    }

    let tables = {
        let dir = archive.extract_tables(&options.data_dir)?;
        Tables::load(dir.path())?
    };

    info!("Joining drone registrations ({} classification)…", options.policy);
    let (rows, report) = drone::join(&tables, options.policy, options.formatting);

    if report.unresolved > 0 {
        info!(
            "Dropped {} drone candidates without a matching aircraft model",
            report.unresolved
        );
    }

    let output = options.output_path();
    write_output(&output, &rows)?;

    info!(
        "Saved drone data to: {} ({} active, {} deregistered)",
        output.display(),
        report.active,
        report.deregistered
    );

    Ok(Outcome::Extracted(report))
}

fn obtain_archive(options: &Options, fetcher: &dyn Fetcher) -> Result<Archive> {
    if let Some(path) = &options.database {
        if options.save_db {
            warn!("Ignoring --save_db, using the local database at {}", path.display());
        }

        info!("Reading Aircraft Registration Database from {}", path.display());
        return Archive::open(path);
    }

    info!("Downloading Aircraft Registration Database from {}…", options.url);
    Archive::download(fetcher, &options.url, &options.data_dir, options.save_db)
}

/// Replaces `path` with the CSV. Nothing is written to `path` unless all rows
/// were written successfully.
fn write_output(path: &Path, rows: &[DroneRow]) -> Result<()> {
    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|error| Error::fs(dir, error))?;
    drone::write_csv(rows, file.as_file_mut())?;
    archive::persist(file, path)
}
