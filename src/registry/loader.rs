use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, StringRecord, Trim};
use itertools::Itertools;
use lazy_static::lazy_static;
use log::debug;
use regex::Regex;

use crate::error::{Error, Result};

/// A record type that can be read from one of the registration tables.
pub trait Record: Sized {
    /// File name of the table inside the database archive.
    const FILE_NAME: &'static str;

    /// Normalized names of the columns `from_row()` relies on.
    const COLUMNS: &'static [&'static str];

    /// Whether several rows may share a key. History tables keep all of them
    /// in file order, other tables keep the last one.
    const REPEATED_KEYS: bool = false;

    /// Builds a record from a data row, or `None` if the row is unusable.
    fn from_row(row: &Row<'_>) -> Option<Self>;

    fn key(&self) -> &str;
}

/// Normalizes a column name, e.g. `"MODE S CODE HEX"` becomes `mode_s_code_hex`
/// and `"OTHER NAMES(1)"` becomes `other_names1`.
pub fn tidy_header(text: &str) -> String {
    lazy_static! {
        static ref PARENS: Regex = Regex::new(r"[()]").unwrap();
        static ref SEPARATORS: Regex = Regex::new(r"[- ]").unwrap();
    }

    let text = text.trim_start_matches('\u{feff}').trim().to_lowercase();
    let text = PARENS.replace_all(&text, "");
    SEPARATORS.replace_all(&text, "_").into_owned()
}

#[derive(Debug)]
pub struct Columns {
    indices: HashMap<String, usize>,
    len: usize,
}

impl Columns {
    fn from_header(header: &StringRecord) -> Columns {
        let mut names: Vec<String> = header.iter().map(tidy_header).collect();

        // every line ends with a delimiter, which shows up as an empty column
        if names.last().map_or(false, |name| name.is_empty()) {
            names.pop();
        }

        let len = names.len();
        let indices = names
            .into_iter()
            .enumerate()
            .map(|(index, name)| (name, index))
            .collect();

        Columns { indices, len }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn contains(&self, name: &str) -> bool {
        self.indices.contains_key(name)
    }
}

/// A single data row, with its fields addressable by normalized column name.
pub struct Row<'a> {
    columns: &'a Columns,
    fields: &'a StringRecord,
}

impl<'a> Row<'a> {
    /// Returns the trimmed field of the given column, or `""` if the table
    /// has no such column.
    pub fn get(&self, name: &str) -> &'a str {
        self.columns
            .indices
            .get(name)
            .and_then(|&index| self.fields.get(index))
            .unwrap_or("")
    }

    pub fn string(&self, name: &str) -> String {
        self.get(name).to_owned()
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of data rows in the file.
    pub rows: usize,
    /// Rows that were dropped because they could not be parsed.
    pub skipped: usize,
    /// Rows that replaced an earlier row with the same key.
    pub duplicates: usize,
    /// Rows kept with invalid UTF-8 replaced by `U+FFFD`.
    pub lossy: usize,
}

/// An in-memory table, keyed by the natural key of its records.
#[derive(Debug)]
pub struct Table<R> {
    records: BTreeMap<String, Vec<R>>,
    report: LoadReport,
}

impl<R: Record> Table<R> {
    pub fn load(path: &Path) -> Result<Table<R>> {
        let file = File::open(path).map_err(|error| Error::fs(path, error))?;
        Self::from_reader(file)
    }

    pub fn from_reader<T: io::Read>(reader: T) -> Result<Table<R>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(reader);

        let mut lines = reader.byte_records();

        let header = match lines.next() {
            Some(Ok(header)) => decode(&header),
            Some(Err(error)) => return Err(parse_error::<R>(error)),
            None => return Err(parse_error::<R>("missing header row")),
        };

        let columns = Columns::from_header(&header);

        let missing = R::COLUMNS.iter().filter(|name| !columns.contains(name)).join(", ");
        if !missing.is_empty() {
            return Err(parse_error::<R>(format!("missing columns: {}", missing)));
        }

        let mut records: BTreeMap<String, Vec<R>> = BTreeMap::new();
        let mut report = LoadReport::default();

        for (index, line) in lines.enumerate() {
            let line_number = index + 2;
            report.rows += 1;

            let (mut fields, lossy) = match line {
                Ok(fields) => {
                    let lossy = fields.iter().any(|field| std::str::from_utf8(field).is_err());
                    (decode(&fields), lossy)
                }
                Err(error) if error.is_io_error() => return Err(error.into()),
                Err(error) => {
                    debug!("{}: skipping line {}: {}", R::FILE_NAME, line_number, error);
                    report.skipped += 1;
                    continue;
                }
            };

            if fields.len() == columns.len() + 1 && fields.get(columns.len()) == Some("") {
                fields.truncate(columns.len());
            }

            if fields.len() != columns.len() {
                debug!(
                    "{}: skipping line {}: expected {} fields, found {}",
                    R::FILE_NAME,
                    line_number,
                    columns.len(),
                    fields.len(),
                );
                report.skipped += 1;
                continue;
            }

            let row = Row { columns: &columns, fields: &fields };
            let record = match R::from_row(&row) {
                Some(record) => record,
                None => {
                    debug!("{}: skipping incomplete line {}", R::FILE_NAME, line_number);
                    report.skipped += 1;
                    continue;
                }
            };

            let entries = records.entry(record.key().to_owned()).or_default();
            if !R::REPEATED_KEYS && !entries.is_empty() {
                entries.clear();
                report.duplicates += 1;
            }
            entries.push(record);

            if lossy {
                debug!("{}: replaced invalid UTF-8 on line {}", R::FILE_NAME, line_number);
                report.lossy += 1;
            }
        }

        Ok(Table { records, report })
    }
}

impl<R> Table<R> {
    /// Returns the last record with the given key.
    pub fn get(&self, key: &str) -> Option<&R> {
        self.records.get(key).and_then(|entries| entries.last())
    }

    /// Iterates over all records in key order. Records sharing a key keep
    /// their file order.
    pub fn iter(&self) -> impl Iterator<Item = &R> {
        self.records.values().flatten()
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn report(&self) -> LoadReport {
        self.report
    }
}

/// Decodes a raw row, replacing invalid UTF-8 instead of dropping the row.
fn decode(fields: &ByteRecord) -> StringRecord {
    fields.iter().map(|field| String::from_utf8_lossy(field)).collect()
}

fn parse_error<R: Record>(reason: impl ToString) -> Error {
    Error::Parse {
        file: R::FILE_NAME.to_owned(),
        reason: reason.to_string(),
    }
}
