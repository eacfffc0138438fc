//! Line-oriented driver: one event per input line, one JSON line per
//! emitted event.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use millrace_event::{Event, Value};
use millrace_pipeline::{Outcome, Pipeline, PipelineConfig, Registry};

#[derive(Parser)]
#[command(name = "millrace")]
#[command(about = "Run structured events through an enrichment pipeline")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Process newline-delimited input through a pipeline
    ///
    /// Every non-empty input line becomes one event, pre-populated with
    /// `@metadata.line_number` and `event.original`. Emitted events are
    /// written as one compact JSON line each; per-event failures are logged
    /// to stderr and processing continues.
    Run {
        /// Pipeline definition file (YAML or JSON)
        #[arg(short = 'p', long = "pipeline")]
        pipeline: PathBuf,

        /// Input file (defaults to stdin)
        input: Option<PathBuf>,

        /// Print per-processor counters to stderr at end of input
        #[arg(long)]
        stats: bool,
    },

    /// Parse and build a pipeline definition, reporting problems
    Check {
        /// Pipeline definition file (YAML or JSON)
        #[arg(short = 'p', long = "pipeline")]
        pipeline: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            pipeline,
            input,
            stats,
        } => cmd_run(pipeline, input, stats),
        Commands::Check { pipeline } => cmd_check(pipeline),
    }
}

// ---------------------------------------------------------------------------
// Subcommand implementations
// ---------------------------------------------------------------------------

fn cmd_run(pipeline_path: PathBuf, input: Option<PathBuf>, stats: bool) {
    let pipe = load_pipeline(&pipeline_path);

    let result = match input {
        Some(path) => match File::open(&path) {
            Ok(file) => process_input(BufReader::new(file), &mut io::stdout().lock(), &pipe),
            Err(err) => {
                eprintln!("Error opening {}: {err}", path.display());
                process::exit(1);
            }
        },
        None => process_input(io::stdin().lock(), &mut io::stdout().lock(), &pipe),
    };

    if let Err(err) = result {
        eprintln!("Error: {err}");
        process::exit(1);
    }

    if stats {
        print_stats(&pipe);
    }
}

fn cmd_check(pipeline_path: PathBuf) {
    let pipe = load_pipeline(&pipeline_path);
    println!("Pipeline {:?} is valid", pipe.id());
    println!("  Processors: {}", processor_count(&pipe));
}

fn load_pipeline(path: &Path) -> Pipeline {
    let config = match PipelineConfig::from_yaml_file(path) {
        Ok(config) => config,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    };
    match Pipeline::new(&config, &Registry::with_builtins()) {
        Ok(pipe) => pipe,
        Err(err) => {
            eprintln!("Error: {err}");
            process::exit(1);
        }
    }
}

// ---------------------------------------------------------------------------
// Line processing
// ---------------------------------------------------------------------------

fn process_input<R: BufRead, W: Write>(input: R, output: &mut W, pipe: &Pipeline) -> io::Result<()> {
    let mut line_number: u64 = 0;

    for line in input.lines() {
        let line = line?;
        line_number += 1;

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let event = match line_event(line, line_number) {
            Ok(event) => event,
            Err(err) => {
                eprintln!("Error processing line {line_number}: {err}");
                continue;
            }
        };

        match pipe.process(event) {
            Ok(Outcome::Emit(event)) => match serde_json::to_string(&event) {
                Ok(json) => writeln!(output, "{json}")?,
                Err(err) => eprintln!(
                    "Unexpected error marshaling event from line {line_number} to JSON: {err}"
                ),
            },
            Ok(Outcome::Drop) => {}
            Err(err) => eprintln!("Error processing line {line_number}: {err}"),
        }
    }

    Ok(())
}

fn line_event(line: &str, line_number: u64) -> millrace_event::Result<Event> {
    let mut event = Event::new();
    event.put("@metadata.line_number", Value::from(line_number))?;
    event.put("event.original", Value::from(line))?;
    Ok(event)
}

// ---------------------------------------------------------------------------
// Stats
// ---------------------------------------------------------------------------

fn processor_count(pipe: &Pipeline) -> usize {
    pipe.metrics().len()
}

fn print_stats(pipe: &Pipeline) {
    eprintln!(
        "{:<64} {:>9} {:>9} {:>9} {:>7}",
        "component_id", "received", "sent", "discarded", "errors"
    );
    for m in pipe.metrics() {
        eprintln!(
            "{:<64} {:>9} {:>9} {:>9} {:>7}",
            m.component_id, m.received, m.sent, m.discarded, m.errors
        );
    }
}
