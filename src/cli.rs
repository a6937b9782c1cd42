use std::env;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{value_t, App, Arg, ArgMatches};

use crate::archive::{DATABASE_URL, DEFAULT_TIMEOUT_SECS};
use crate::drone::{DronePolicy, Formatting};

/// File name of the extract inside the data directory.
pub const OUTPUT_NAME: &str = "ReleasableDrone.csv";

#[derive(Debug, Clone, PartialEq)]
pub struct Options {
    /// Pre-downloaded archive, takes precedence over fetching.
    pub database: Option<PathBuf>,
    /// Keep the fetched archive in `data_dir`.
    pub save_db: bool,
    pub data_dir: PathBuf,
    pub output: Option<PathBuf>,
    pub url: String,
    pub timeout: Duration,
    pub policy: DronePolicy,
    pub formatting: Formatting,
    pub list_files: bool,
    pub verbosity: u64,
}

impl Options {
    pub fn new(data_dir: impl Into<PathBuf>) -> Options {
        Options {
            database: None,
            save_db: false,
            data_dir: data_dir.into(),
            output: None,
            url: DATABASE_URL.to_owned(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            policy: DronePolicy::default(),
            formatting: Formatting::Verbatim,
            list_files: false,
            verbosity: 0,
        }
    }

    pub fn output_path(&self) -> PathBuf {
        self.output
            .clone()
            .unwrap_or_else(|| self.data_dir.join(OUTPUT_NAME))
    }

    fn from_matches(matches: &ArgMatches<'_>) -> Result<Options, clap::Error> {
        let data_dir = match matches.value_of_os("data_dir") {
            Some(dir) => PathBuf::from(dir),
            None => env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
        };

        let mut options = Options::new(data_dir);
        options.database = matches.value_of_os("database").map(PathBuf::from);
        options.save_db = matches.is_present("save_db");
        options.output = matches.value_of_os("output").map(PathBuf::from);
        options.policy = value_t!(matches, "classify", DronePolicy)?;
        options.list_files = matches.is_present("list_files");
        options.verbosity = matches.occurrences_of("verbose");

        if let Some(url) = matches.value_of("url") {
            options.url = url.to_owned();
        }

        options.timeout = Duration::from_secs(value_t!(matches, "timeout", u64)?);

        if matches.is_present("decode") {
            options.formatting = Formatting::Decoded;
        }

        Ok(options)
    }
}

pub fn app() -> App<'static, 'static> {
    App::new("dronereg")
        .version(clap::crate_version!())
        .about("Extracts drone registrations from the FAA Aircraft Registration Database")
        .arg(
            Arg::with_name("save_db")
                .long("save_db")
                .help("Download the Aircraft Registration Database and keep it in the data directory"),
        )
        .arg(
            Arg::with_name("database")
                .short("d")
                .long("database")
                .value_name("PATH")
                .takes_value(true)
                .help("File path of the Aircraft Registration Database (also accepted as -db)"),
        )
        .arg(
            Arg::with_name("data_dir")
                .long("data_dir")
                .value_name("DIR")
                .takes_value(true)
                .validator_os(valid_dir)
                .help(
                    "Directory where the Aircraft Registration Database and/or the extracted \
                     drone registration CSV file will be saved [default: current working directory]",
                ),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .value_name("PATH")
                .takes_value(true)
                .help("Path of the drone registration CSV file [default: <data_dir>/ReleasableDrone.csv]"),
        )
        .arg(
            Arg::with_name("classify")
                .long("classify")
                .value_name("POLICY")
                .takes_value(true)
                .possible_values(&["type-engine", "weight-class", "either"])
                .default_value("type-engine")
                .help("How drones are recognized: electric rotorcraft, CLASS 4 weight, or either"),
        )
        .arg(
            Arg::with_name("decode")
                .long("decode")
                .help("Decode registrant and status codes, format dates and ZIP codes"),
        )
        .arg(
            Arg::with_name("list_files")
                .long("list_files")
                .help("List the files of the Aircraft Registration Database and exit"),
        )
        .arg(
            Arg::with_name("url")
                .long("url")
                .value_name("URL")
                .takes_value(true)
                .env("DRONEREG_DATABASE_URL")
                .default_value(DATABASE_URL)
                .help("Download location of the Aircraft Registration Database"),
        )
        .arg(
            Arg::with_name("timeout")
                .long("timeout")
                .value_name("SECONDS")
                .takes_value(true)
                .default_value("300")
                .help("HTTP timeout for the download"),
        )
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Increase log verbosity, may be repeated"),
        )
}

/// Parses the command line. The historical `-db` spelling is rewritten to
/// `--database` first, since clap only knows single letter short flags.
pub fn parse<I, T>(args: I) -> Result<Options, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    let args = args.into_iter().map(|arg| {
        let arg = arg.into();
        if arg.to_str() == Some("-db") {
            OsString::from("--database")
        } else {
            arg
        }
    });

    let matches = app().get_matches_from_safe(args)?;
    Options::from_matches(&matches)
}

fn valid_dir(path: &std::ffi::OsStr) -> Result<(), OsString> {
    if Path::new(path).is_dir() {
        Ok(())
    } else {
        Err(OsString::from(format!("Invalid directory path: {}", Path::new(path).display())))
    }
}
