use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use std::path::PathBuf;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use constellation_prep::descriptor::ReshapeConfig;
use constellation_prep::magnitude::{self, MagnitudeConfig, DEFAULT_MAGNITUDE_COLUMN};
use constellation_prep::{reshape_files, split_files, OutputFormat, PrepError, SplitConfig};

fn cli() -> Command {
    let column_arg = Arg::new("column")
        .short('c')
        .long("column")
        .value_parser(value_parser!(usize))
        .default_value("5")
        .help("Zero-based index of the magnitude column");

    Command::new("Constellation Prep")
        .version("1.0")
        .author("Jesper Fjellin")
        .about("Prepares constellation polygons and star magnitude tables")
        .subcommand_required(true)
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Enable debug logging"),
        )
        .subcommand(
            Command::new("split")
                .about("Splits WKT polygons into left and right halves at a vertical seam")
                .arg(
                    Arg::new("files")
                        .num_args(1..)
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Input WKT polygon files"),
                )
                .arg(
                    Arg::new("output-dir")
                        .short('o')
                        .long("output-dir")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("sep")
                        .help("Directory for the left-/right- output files"),
                )
                .arg(
                    Arg::new("threshold")
                        .short('t')
                        .long("threshold")
                        .value_parser(value_parser!(f64))
                        .default_value("20")
                        .allow_negative_numbers(true)
                        .help("x coordinate of the seam"),
                )
                .arg(
                    Arg::new("wrap")
                        .short('w')
                        .long("wrap")
                        .value_parser(value_parser!(f64))
                        .default_value("24")
                        .allow_negative_numbers(true)
                        .help("x coordinate of the far edge used to close the left half"),
                )
                .arg(
                    Arg::new("format")
                        .short('f')
                        .long("format")
                        .value_parser(["wkt", "geojson"])
                        .default_value("wkt")
                        .help("Output format"),
                ),
        )
        .subcommand(
            Command::new("reshape")
                .about("Folds WktFiles/LabelPoints of descriptor JSON files into Polys, in place")
                .arg(
                    Arg::new("files")
                        .num_args(1..)
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Descriptor JSON files"),
                )
                .arg(
                    Arg::new("max-scale")
                        .long("max-scale")
                        .value_parser(value_parser!(f64))
                        .default_value("0.012")
                        .help("MaxScale given to every poly"),
                ),
        )
        .subcommand(
            Command::new("sort")
                .about("Splits a TSV file by magnitude into two files")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Input TSV file"),
                )
                .arg(
                    Arg::new("pivot")
                        .required(true)
                        .value_parser(value_parser!(f64))
                        .allow_negative_numbers(true)
                        .help("Records below this magnitude go to the first output"),
                )
                .arg(
                    Arg::new("below")
                        .long("below")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("out1.tsv")
                        .help("Output for records below the pivot"),
                )
                .arg(
                    Arg::new("above")
                        .long("above")
                        .value_parser(value_parser!(PathBuf))
                        .default_value("out2.tsv")
                        .help("Output for records at or above the pivot"),
                )
                .arg(column_arg.clone()),
        )
        .subcommand(
            Command::new("stats")
                .about("Prints max, min, count and mean magnitude of a TSV file")
                .arg(
                    Arg::new("input")
                        .required(true)
                        .value_parser(value_parser!(PathBuf))
                        .help("Input TSV file"),
                )
                .arg(column_arg),
        )
}

fn init_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    if tracing::subscriber::set_global_default(subscriber).is_err() {
        eprintln!("Warning: a global tracing subscriber was already set");
    }
}

fn paths(matches: &ArgMatches, id: &str) -> Vec<PathBuf> {
    matches
        .get_many::<PathBuf>(id)
        .map(|values| values.cloned().collect())
        .unwrap_or_default()
}

fn path(matches: &ArgMatches, id: &str) -> PathBuf {
    matches.get_one::<PathBuf>(id).cloned().unwrap_or_default()
}

fn number(matches: &ArgMatches, id: &str) -> f64 {
    matches.get_one::<f64>(id).copied().unwrap_or_default()
}

fn magnitude_config(matches: &ArgMatches) -> MagnitudeConfig {
    MagnitudeConfig {
        column: matches
            .get_one::<usize>("column")
            .copied()
            .unwrap_or(DEFAULT_MAGNITUDE_COLUMN),
    }
}

fn run(matches: &ArgMatches) -> Result<(), PrepError> {
    match matches.subcommand() {
        Some(("split", sub)) => {
            let files = paths(sub, "files");
            // Validate that input files exist
            for file in &files {
                if !file.exists() {
                    return Err(PrepError::Io(std::io::Error::new(
                        std::io::ErrorKind::NotFound,
                        format!("File not found: {}", file.display()),
                    )));
                }
            }

            let config = SplitConfig::new(number(sub, "threshold"), number(sub, "wrap"))?;
            let format = sub
                .get_one::<String>("format")
                .and_then(|name| OutputFormat::from_name(name))
                .unwrap_or(OutputFormat::Wkt);
            split_files(&files, &path(sub, "output-dir"), &config, format)
        }
        Some(("reshape", sub)) => {
            let config = ReshapeConfig {
                max_scale: number(sub, "max-scale"),
            };
            reshape_files(&paths(sub, "files"), &config)
        }
        Some(("sort", sub)) => {
            let below = path(sub, "below");
            let above = path(sub, "above");
            let counts = magnitude::sort_file(
                &path(sub, "input"),
                number(sub, "pivot"),
                &below,
                &above,
                &magnitude_config(sub),
            )?;
            info!(
                "Wrote {} records to {} and {} records to {}",
                counts.below,
                below.display(),
                counts.at_or_above,
                above.display()
            );
            Ok(())
        }
        Some(("stats", sub)) => {
            let stats = magnitude::stats_file(&path(sub, "input"), &magnitude_config(sub))?;
            println!("{}", stats);
            Ok(())
        }
        _ => unreachable!("clap requires a subcommand"),
    }
}

fn main() {
    let matches = cli().get_matches();
    init_logging(matches.get_flag("verbose"));

    match run(&matches) {
        Ok(()) => info!("Processing completed successfully"),
        Err(e) => {
            eprintln!("Error processing files: {}", e);
            if matches!(e, PrepError::DegenerateRing { .. }) {
                eprintln!("The polygon touches the seam side with too few points to close a ring.");
            }
            std::process::exit(1);
        }
    }
}
