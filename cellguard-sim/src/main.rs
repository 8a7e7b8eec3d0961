//! CLI entry point for the cellguard bench simulator.

use std::env;
use std::ffi::OsString;
use std::fs::File;
use std::io::BufWriter;
use std::path::PathBuf;
use std::process::ExitCode;

use cellguard_sim::{
    load_config, save_config_image, Scenario, SimError, Simulator, REFERENCE_CELLS,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const USAGE_TEXT: &str = "\
Usage: cellguard-sim [command] [options]

Commands:
  run                   Run the reference scenario (default)
  image <output>        Encode the active config as a binary config image

Options:
  -c, --config <file>   Monitor config (.toml, or .bin config image)
  -t, --trace <file>    Write a per-cycle CSV trace (run only)
  -h, --help            Show this help message

Environment:
  RUST_LOG              Log filter (default: info)

Examples:
  cellguard-sim
  cellguard-sim run --config pack.toml --trace trace.csv
  cellguard-sim image pack.bin --config pack.toml
";

#[derive(Debug, PartialEq, Eq)]
enum Command {
    Run { trace: Option<PathBuf> },
    Image { output: PathBuf },
}

#[derive(Debug, PartialEq, Eq)]
struct Args {
    command: Command,
    config: Option<PathBuf>,
}

#[derive(Debug)]
enum ParseResult {
    Args(Args),
    Help,
}

fn parse_args(args: impl Iterator<Item = OsString>) -> Result<ParseResult, String> {
    let mut args = args.peekable();

    let first = args.peek().map(|a| a.to_string_lossy().to_string());
    let command = match first.as_deref() {
        Some("run") => {
            args.next();
            "run"
        }
        Some("image") => {
            args.next();
            "image"
        }
        _ => "run",
    };

    let mut config = None;
    let mut trace = None;
    let mut output = None;

    while let Some(arg) = args.next() {
        let arg_str = arg.to_string_lossy().to_string();
        match arg_str.as_str() {
            "-h" | "--help" => return Ok(ParseResult::Help),
            "-c" | "--config" => {
                let path = args.next().ok_or("missing value for --config")?;
                config = Some(PathBuf::from(path));
            }
            "-t" | "--trace" => {
                let path = args.next().ok_or("missing value for --trace")?;
                trace = Some(PathBuf::from(path));
            }
            s if s.starts_with('-') => return Err(format!("unknown option: {s}")),
            _ => {
                if output.is_some() {
                    return Err(format!("unexpected argument: {arg_str}"));
                }
                output = Some(PathBuf::from(arg));
            }
        }
    }

    let command = match command {
        "image" => {
            if trace.is_some() {
                return Err("--trace is only valid for run".to_string());
            }
            Command::Image {
                output: output.ok_or("missing output path for image")?,
            }
        }
        _ => {
            if let Some(extra) = output {
                return Err(format!("unexpected argument: {}", extra.display()));
            }
            Command::Run { trace }
        }
    };

    Ok(ParseResult::Args(Args { command, config }))
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn execute(args: Args) -> Result<(), SimError> {
    let config = load_config(args.config.as_deref())?;

    match args.command {
        Command::Run { trace } => {
            let mut sim = Simulator::<REFERENCE_CELLS>::new(config)?;
            if trace.is_some() {
                sim.enable_trace();
            }

            let report = Scenario::reference().run(&mut sim)?;
            println!("{report}");

            if let Some(path) = trace {
                let file = File::create(&path).map_err(|e| SimError::Io {
                    path: path.clone(),
                    source: e,
                })?;
                sim.write_trace_csv(BufWriter::new(file))
                    .map_err(|e| SimError::Io {
                        path: path.clone(),
                        source: e,
                    })?;
                info!(path = %path.display(), rows = sim.trace().len(), "Trace written");
            }
        }
        Command::Image { output } => {
            config.validate(REFERENCE_CELLS)?;
            let len = save_config_image(&config, &output)?;
            println!("Wrote {len} byte config image to {}", output.display());
        }
    }

    Ok(())
}

fn main() -> ExitCode {
    let args = match parse_args(env::args_os().skip(1)) {
        Ok(ParseResult::Args(args)) => args,
        Ok(ParseResult::Help) => {
            print!("{USAGE_TEXT}");
            return ExitCode::SUCCESS;
        }
        Err(msg) => {
            eprintln!("error: {msg}\n\n{USAGE_TEXT}");
            return ExitCode::from(2);
        }
    };

    init_logging();

    match execute(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}
