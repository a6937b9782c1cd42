use std::io;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Fetching the registration database failed.
    #[error("could not download {url}: {reason}")]
    Network { url: String, reason: String },

    #[error("could not create HTTP client: {0}")]
    HttpClient(String),

    /// The archive is missing, corrupt or lacks one of the tables.
    #[error("invalid database archive {}: {reason}", path.display())]
    Archive { path: PathBuf, reason: String },

    /// A table cannot be read at all, e.g. because its header lacks a column.
    ///
    /// Malformed data rows never end up here, they are skipped and counted
    /// by the loader.
    #[error("could not parse {file}: {reason}")]
    Parse { file: String, reason: String },

    #[error("{}: {source}", path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    pub fn fs(path: impl Into<PathBuf>, source: io::Error) -> Error {
        Error::Filesystem { path: path.into(), source }
    }

    pub fn archive(path: impl Into<PathBuf>, reason: impl ToString) -> Error {
        Error::Archive { path: path.into(), reason: reason.to_string() }
    }
}
