use std::env;
use std::process;

use anyhow::Context;
use log::{error, LevelFilter};

use dronereg::app::{self, Outcome};
use dronereg::archive::HttpFetcher;
use dronereg::cli::{self, Options};

fn main() {
    let options = match cli::parse(env::args_os()) {
        Ok(options) => options,
        Err(error) => error.exit(),
    };

    init_logger(options.verbosity);

    if let Err(error) = run(&options) {
        error!("{:#}", error);
        process::exit(1);
    }
}

fn run(options: &Options) -> anyhow::Result<()> {
    let fetcher = HttpFetcher::with_timeout(options.timeout)?;

    let outcome = app::run(options, &fetcher).context("Drone registration extract failed")?;

    if let Outcome::Listed(names) = outcome {
        for name in names {
            println!("{}", name);
        }
    }

    Ok(())
}

fn init_logger(verbosity: u64) {
    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let mut builder = pretty_env_logger::formatted_builder();
    builder.filter_level(level);

    if let Ok(filters) = env::var("RUST_LOG") {
        builder.parse_filters(&filters);
    }

    builder.init();
}
