use std::path::Path;

use log::{info, warn};

pub mod codes;
mod loader;
mod records;

pub use self::loader::{tidy_header, LoadReport, Record, Row, Table};
pub use self::records::{DeregRecord, MasterRecord, ModelReference};

/// The three tables of the registration database the drone extract needs.
#[derive(Debug)]
pub struct Tables {
    pub master: Table<MasterRecord>,
    pub models: Table<ModelReference>,
    pub dereg: Table<DeregRecord>,
}

impl Tables {
    /// Reads `MASTER.txt`, `ACFTREF.txt` and `DEREG.txt` from `dir`.
    pub fn load(dir: &Path) -> crate::error::Result<Tables> {
        Ok(Tables {
            master: load_table(dir)?,
            models: load_table(dir)?,
            dereg: load_table(dir)?,
        })
    }
}

fn load_table<R: Record>(dir: &Path) -> crate::error::Result<Table<R>> {
    info!("Reading {}…", R::FILE_NAME);

    let table = Table::<R>::load(&dir.join(R::FILE_NAME))?;

    let report = table.report();
    info!("Loaded {} records from {}", table.len(), R::FILE_NAME);

    if table.is_empty() {
        warn!("{} contains no usable records", R::FILE_NAME);
    }

    if report.lossy > 0 {
        warn!(
            "{} rows in {} contain invalid UTF-8, the invalid bytes were replaced",
            report.lossy,
            R::FILE_NAME
        );
    }

    if report.skipped > 0 {
        warn!(
            "Skipped {} of {} rows in {} that could not be parsed",
            report.skipped,
            report.rows,
            R::FILE_NAME
        );
    }

    if report.duplicates > 0 {
        warn!(
            "{} contains {} duplicate keys, the last occurrence was kept",
            R::FILE_NAME,
            report.duplicates
        );
    }

    Ok(table)
}
