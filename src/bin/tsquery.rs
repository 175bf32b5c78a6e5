//! tsquery CLI
//!
//! Offline helper for the query wire format: builds command lines and
//! decodes response, error and notification lines. No network access.

use std::io::{self, BufRead};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};
use tsquery::protocol::{parse_with, OptionSet, OptionValue, Scalar};
use tsquery::{Command, Config, QueryError, Response, ServerEvent, ValueType};

/// tsquery CLI
#[derive(Parser, Debug)]
#[command(name = "tsquery")]
#[command(about = "Encode and decode server query protocol lines")]
#[command(version)]
struct Args {
    /// Override a field type, e.g. `client_flags=int`
    #[arg(short, long = "field", value_name = "NAME=TAG")]
    fields: Vec<String>,

    /// Fallback log filter when RUST_LOG is unset
    #[arg(long)]
    log: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Build a command line
    Encode {
        /// Command verb
        verb: String,

        /// Flag such as -uid (repeatable)
        #[arg(long = "flag", allow_hyphen_values = true)]
        flags: Vec<String>,

        /// Option KEY=VALUE (repeat a key to send a list)
        #[arg(long = "opt", value_name = "KEY=VALUE")]
        options: Vec<String>,

        /// Batched option set KEY=VALUE[,KEY=VALUE...] (repeatable)
        #[arg(long = "batch", value_name = "KEY=VALUE,...")]
        batches: Vec<String>,
    },

    /// Decode response or error lines (stdin when LINE is omitted)
    Decode {
        /// Line to decode
        line: Option<String>,
    },

    /// Decode a notification line into events
    Event {
        /// Notification line, e.g. "notifyclientmoved ctid=1 clid=2"
        line: String,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("error: {e}");
            return ExitCode::FAILURE;
        }
    };

    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_filter));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();

    tracing::debug!("tsquery v{}", tsquery::VERSION);

    match run(args.command, &config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn build_config(args: &Args) -> Result<Config, QueryError> {
    let mut builder = Config::builder();
    for field in &args.fields {
        let (name, tag) = split_pair(field)?;
        builder = builder.field_type(name, tag.parse::<ValueType>()?);
    }
    if let Some(filter) = &args.log {
        builder = builder.log_filter(filter.clone());
    }
    Ok(builder.build())
}

fn run(command: Commands, config: &Config) -> Result<(), QueryError> {
    match command {
        Commands::Encode {
            verb,
            flags,
            options,
            batches,
        } => {
            let mut sets = Vec::with_capacity(batches.len());
            for batch in &batches {
                sets.push(option_set(batch.split(','))?);
            }
            let command = Command::new(verb)
                .flags(flags)
                .options(option_set(options.iter().map(String::as_str))?)
                .multi_options(sets);
            println!("{command}");
        }
        Commands::Decode { line: Some(line) } => decode_line(&line, config),
        Commands::Decode { line: None } => {
            for line in io::stdin().lock().lines() {
                let line = line?;
                if !line.trim().is_empty() {
                    decode_line(&line, config);
                }
            }
        }
        Commands::Event { line } => {
            let events = ServerEvent::decode(&line, &config.registry);
            if events.is_empty() {
                tracing::warn!("not a notification line");
            }
            for event in events {
                println!("{:?}", event);
            }
        }
    }
    Ok(())
}

fn decode_line(line: &str, config: &Config) {
    let line = line.trim_end_matches(['\r', '\n']);
    if line == "error" || line.starts_with("error ") {
        let mut command = Command::default();
        command.set_error(line, &config.registry);
        match command.get_error() {
            Some(err) if command.has_error() => println!("failure: {err}"),
            Some(err) => println!("ok (id={}, msg={})", err.id, err.msg),
            None => println!("ok"),
        }
        return;
    }

    print_response(&parse_with(line, &config.registry));
}

fn print_response(response: &Response) {
    for (i, record) in response.records().iter().enumerate() {
        println!("record {i}:");
        for (key, value) in record {
            println!("  {key} = {value:?}");
        }
    }
}

/// Collect KEY=VALUE pairs; a repeated key turns into a list value
fn option_set<'a>(pairs: impl Iterator<Item = &'a str>) -> Result<OptionSet, QueryError> {
    let mut set = OptionSet::new();
    for pair in pairs {
        let (key, value) = split_pair(pair)?;
        let merged = match set.get(key) {
            Some(OptionValue::Scalar(previous)) => {
                OptionValue::List(vec![previous.clone(), Scalar::from(value)])
            }
            Some(OptionValue::List(items)) => {
                let mut items = items.clone();
                items.push(Scalar::from(value));
                OptionValue::List(items)
            }
            _ => OptionValue::from(value),
        };
        set.insert(key, merged);
    }
    Ok(set)
}

fn split_pair(pair: &str) -> Result<(&str, &str), QueryError> {
    pair.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .ok_or_else(|| QueryError::Config(format!("expected KEY=VALUE, got `{pair}`")))
}
