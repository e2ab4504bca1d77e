//! LineVault Dump Tool
//!
//! Inspects a compressed line store from the command line: descriptor
//! summary, raw line dumps over a wavelength window, or a full extraction
//! across several stores.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

use linevault::config::{ExtractionRequest, LinelistSource, Medium, OutputFormat, WavelengthUnit};
use linevault::merge::IsotopeTable;
use linevault::species::SpeciesTable;
use linevault::store::Store;
use linevault::Extractor;

/// LineVault dump tool
#[derive(Parser, Debug)]
#[command(name = "linedump")]
#[command(about = "Inspect and extract from compressed spectral-line stores")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print descriptor summary for one store
    Info {
        /// Compressed data file
        data: PathBuf,

        /// Descriptor index file
        descriptor: PathBuf,
    },

    /// Dump decoded lines in a wavelength window
    Dump {
        /// Compressed data file
        data: PathBuf,

        /// Descriptor index file
        descriptor: PathBuf,

        /// Window start in vacuum Angstrom
        #[arg(long)]
        from: f64,

        /// Window end in vacuum Angstrom
        #[arg(long)]
        to: f64,

        /// Line cap
        #[arg(long, default_value_t = 1000)]
        max: usize,
    },

    /// Merge several stores over a window and print formatted lines
    Extract {
        /// data,descriptor file pairs
        #[arg(long, required = true, value_parser = parse_source, num_args = 1..)]
        source: Vec<(PathBuf, PathBuf)>,

        /// Window start in vacuum Angstrom
        #[arg(long)]
        from: f64,

        /// Window end in vacuum Angstrom
        #[arg(long)]
        to: f64,

        /// Line cap
        #[arg(long, default_value_t = 100_000)]
        max: usize,

        /// Convert output wavelengths to air
        #[arg(long)]
        air: bool,

        /// Long output format with term designations
        #[arg(long)]
        long: bool,

        /// Species metadata CSV for name resolution
        #[arg(long)]
        species_table: Option<PathBuf>,

        /// Comma-separated species filter, e.g. "Fe 1, Ca 2, 5626"
        #[arg(long)]
        species: Option<String>,
    },
}

fn parse_source(raw: &str) -> Result<(PathBuf, PathBuf), String> {
    raw.split_once(',')
        .map(|(d, i)| (PathBuf::from(d), PathBuf::from(i)))
        .ok_or_else(|| format!("expected data,descriptor but got '{raw}'"))
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,linevault=debug"));
    fmt().with_env_filter(filter).with_target(true).init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> linevault::Result<()> {
    match args.command {
        Commands::Info { data, descriptor } => {
            let store = Store::open(&data, &descriptor)?;
            println!("records: {}", store.record_count()?);
            match store.span()? {
                Some((lo, hi)) => println!("span: {lo:.4} - {hi:.4} A"),
                None => println!("span: empty"),
            }
        }
        Commands::Dump {
            data,
            descriptor,
            from,
            to,
            max,
        } => {
            let mut store = Store::open(&data, &descriptor)?;
            let lines = store.query_range(from, to, max)?;
            for line in &lines {
                println!(
                    "{:12.4} {:6} {:8.3} {:12.4} {:12.4}",
                    line.wavelength, line.species_code, line.log_gf, line.e_lower, line.e_upper
                );
            }
            println!("{} lines", lines.len());
        }
        Commands::Extract {
            source,
            from,
            to,
            max,
            air,
            long,
            species_table,
            species,
        } => {
            let table = match species_table {
                Some(path) => SpeciesTable::load(&path)?,
                None => SpeciesTable::default(),
            };
            let mut builder = ExtractionRequest::builder(from, to)
                .max_lines(max)
                .wavelength_unit(WavelengthUnit::Angstrom)
                .medium(if air { Medium::Air } else { Medium::Vacuum })
                .format(if long {
                    OutputFormat::Long
                } else {
                    OutputFormat::Short
                });
            if let Some(filter) = species {
                builder = builder.species_filter(table.parse_element_filter(&filter));
            }
            for (i, (data, descriptor)) in source.iter().enumerate() {
                builder = builder.source(
                    LinelistSource::new(format!("source-{i}"), data, descriptor).priority(i as u32),
                );
            }
            let request = builder.build()?;
            let extractor = Extractor::new(table, IsotopeTable::default());
            let result = extractor.extract(&request)?;
            for line in &result.body {
                println!("{line}");
            }
            if !result.bibliography.is_empty() {
                println!("-- references --");
                print!("{}", result.bibliography);
            }
            tracing::info!(
                emitted = result.stats.emitted,
                merged = result.stats.merged,
                skipped = result.skipped,
                "done"
            );
        }
    }
    Ok(())
}
