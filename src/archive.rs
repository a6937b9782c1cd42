//! Obtaining the `ReleasableAircraft.zip` archive and unpacking its tables.

use std::ffi::OsStr;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;

use log::{debug, info};
use reqwest::blocking::Client;
use tempfile::{NamedTempFile, TempDir};
use zip::ZipArchive;

use crate::error::{Error, Result};
use crate::registry::{DeregRecord, MasterRecord, ModelReference, Record};

pub const DATABASE_URL: &str = "https://registry.faa.gov/database/ReleasableAircraft.zip";

/// File name of a saved archive inside the data directory.
pub const ARCHIVE_NAME: &str = "ReleasableAircraft.zip";

pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Tables extracted from the archive.
pub const TABLE_FILES: [&str; 3] = [
    MasterRecord::FILE_NAME,
    ModelReference::FILE_NAME,
    DeregRecord::FILE_NAME,
];

/// Something that can download the archive.
pub trait Fetcher {
    /// Streams the resource at `url` into `writer` and returns the number of
    /// bytes written.
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64>;
}

/// Blocking HTTP implementation of [`Fetcher`].
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpFetcher {
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("dronereg/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|error| Error::HttpClient(error.to_string()))?;

        Ok(HttpFetcher { client, timeout })
    }
}

impl Fetcher for HttpFetcher {
    fn fetch(&self, url: &str, writer: &mut dyn Write) -> Result<u64> {
        let network_error = |reason: String| Error::Network {
            url: url.to_owned(),
            reason,
        };

        let mut response = self.client.get(url).send().map_err(|error| {
            if error.is_timeout() {
                network_error(format!("timed out after {}s", self.timeout.as_secs()))
            } else {
                network_error(error.to_string())
            }
        })?;

        if !response.status().is_success() {
            return Err(network_error(format!("HTTP {}", response.status())));
        }

        response
            .copy_to(writer)
            .map_err(|error| network_error(error.to_string()))
    }
}

enum Location {
    Saved(PathBuf),
    /// A downloaded archive that is deleted when dropped.
    Temporary(NamedTempFile),
}

/// A validated database archive on disk.
pub struct Archive {
    location: Location,
}

impl Archive {
    /// Uses a pre-downloaded archive.
    pub fn open(path: &Path) -> Result<Archive> {
        let metadata = fs::metadata(path).map_err(|error| Error::archive(path, error))?;
        if !metadata.is_file() {
            return Err(Error::archive(path, "not a file"));
        }

        let archive = Archive { location: Location::Saved(path.to_owned()) };
        archive.zip()?;

        Ok(archive)
    }

    /// Downloads the archive into `data_dir`.
    ///
    /// With `keep` the archive is saved as [`ARCHIVE_NAME`], otherwise it is
    /// removed once the `Archive` is dropped.
    pub fn download(fetcher: &dyn Fetcher, url: &str, data_dir: &Path, keep: bool) -> Result<Archive> {
        let mut file = tempfile::Builder::new()
            .prefix(".ReleasableAircraft")
            .suffix(".zip")
            .tempfile_in(data_dir)
            .map_err(|error| Error::fs(data_dir, error))?;

        let size = fetcher.fetch(url, file.as_file_mut())?;
        file.as_file_mut().flush().map_err(|error| Error::fs(file.path(), error))?;
        debug!("Downloaded {} bytes from {}", size, url);

        let archive = Archive { location: Location::Temporary(file) };
        archive.zip()?;

        if !keep {
            return Ok(archive);
        }

        let path = data_dir.join(ARCHIVE_NAME);
        let location = match archive.location {
            Location::Temporary(file) => {
                persist(file, &path)?;
                Location::Saved(path.clone())
            }
            saved => saved,
        };

        info!("Saved database to: {}", path.display());

        Ok(Archive { location })
    }

    pub fn path(&self) -> &Path {
        match &self.location {
            Location::Saved(path) => path,
            Location::Temporary(file) => file.path(),
        }
    }

    fn zip(&self) -> Result<ZipArchive<File>> {
        let path = self.path();
        let file = File::open(path).map_err(|error| Error::archive(path, error))?;
        ZipArchive::new(file).map_err(|error| Error::archive(path, error))
    }

    /// Names of all entries in the archive.
    pub fn file_names(&self) -> Result<Vec<String>> {
        let zip = self.zip()?;
        Ok(zip.file_names().map(str::to_owned).collect())
    }

    /// Extracts the master, aircraft reference and deregistration tables into
    /// a temporary directory inside `data_dir`.
    pub fn extract_tables(&self, data_dir: &Path) -> Result<TableDir> {
        let mut zip = self.zip()?;
        let names: Vec<String> = zip.file_names().map(str::to_owned).collect();

        let dir = tempfile::Builder::new()
            .prefix(".dronereg")
            .tempdir_in(data_dir)
            .map_err(|error| Error::fs(data_dir, error))?;

        for table in &TABLE_FILES {
            let name = find_entry(&names, table)
                .ok_or_else(|| Error::archive(self.path(), format!("{} not found in archive", table)))?;

            let mut entry = zip.by_name(name).map_err(|error| Error::archive(self.path(), error))?;

            let target = dir.path().join(table);
            let mut file = File::create(&target).map_err(|error| Error::fs(&target, error))?;

            // a truncated entry fails its CRC check while being read
            let size = io::copy(&mut entry, &mut file).map_err(|error| Error::archive(self.path(), error))?;
            debug!("Extracted {} ({} bytes)", name, size);
        }

        Ok(TableDir { dir })
    }
}

/// Moves a finished temporary file to `path`.
///
/// Temporary files are created owner-only. The result gets the permissions
/// of the file it replaces, or `rw-r--r--` if there is none.
pub fn persist(file: NamedTempFile, path: &Path) -> Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let permissions = match fs::metadata(path) {
            Ok(metadata) => metadata.permissions(),
            Err(_) => fs::Permissions::from_mode(0o644),
        };

        file.as_file()
            .set_permissions(permissions)
            .map_err(|error| Error::fs(file.path(), error))?;
    }

    file.persist(path).map_err(|error| Error::fs(path, error.error))?;
    Ok(())
}

/// Finds an entry by file name, ignoring case and directories.
fn find_entry<'a>(names: &'a [String], file_name: &str) -> Option<&'a str> {
    names
        .iter()
        .map(String::as_str)
        .find(|name| {
            Path::new(name)
                .file_name()
                .and_then(OsStr::to_str)
                .map_or(false, |name| name.eq_ignore_ascii_case(file_name))
        })
}

/// The extracted tables. The directory is removed when dropped.
#[derive(Debug)]
pub struct TableDir {
    dir: TempDir,
}

impl TableDir {
    pub fn path(&self) -> &Path {
        self.dir.path()
    }
}
