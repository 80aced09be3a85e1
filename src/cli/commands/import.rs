use anyhow::{Context, Result};
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const COMMAND: &str = "import";
pub const ARG_FILE: &str = "file";

#[must_use]
pub fn command() -> Command {
    Command::new(COMMAND)
        .about("Load stocks from a CSV file into the database")
        .long_about(
            "Load stocks from a CSV file into the database.\n\n\
             Expected header: symbol,name,market_index,sector,country,currency,price,\
             high_52w,low_52w,market_cap,pe_ratio,dividend_yield",
        )
        .arg(
            Arg::new(ARG_FILE)
                .help("CSV file to import")
                .required(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
}

/// # Errors
/// Returns an error if the file argument is missing.
pub fn file(matches: &ArgMatches) -> Result<PathBuf> {
    matches
        .get_one::<PathBuf>(ARG_FILE)
        .cloned()
        .context("missing required argument: <file>")
}
