//! Command execution.

use crate::Commands;
use colored::Colorize;
use vedirect_core::{
    Config, ErrorKind, PortDiscovery, ReadOptions, SerialOpener, SerialTestEvaluator, Vedirect,
};
use vedirect_protocol::Record;
use vedirect_serial::{is_reachable, list_ports};

type CommandResult = Result<(), Box<dyn std::error::Error>>;

/// Executes a command, printing its output.
pub fn execute(config: &Config, cmd: Commands) -> CommandResult {
    match cmd {
        Commands::Ports => ports(),
        Commands::Read => read(config),
        Commands::Watch { count } => watch(config, count),
        Commands::Discover => discover(config),
        Commands::Check => check(config),
    }
}

fn ports() -> CommandResult {
    let ports = list_ports()?;
    if ports.is_empty() {
        println!("{}", "No serial ports found".yellow());
        return Ok(());
    }

    for port in ports {
        if is_reachable(&port) {
            println!("{}", port.cyan());
        } else {
            println!("{} {}", port.cyan(), "(unreachable)".dimmed());
        }
    }
    Ok(())
}

fn connect(config: &Config) -> Result<Vedirect, Box<dyn std::error::Error>> {
    let decoder_config = config.decoder.decoder_config()?;
    Ok(Vedirect::connect(&config.serial, decoder_config)?)
}

fn print_record(record: &Record, pretty: bool) -> CommandResult {
    let json = if pretty {
        serde_json::to_string_pretty(record)?
    } else {
        serde_json::to_string(record)?
    };
    println!("{}", json);
    Ok(())
}

fn read(config: &Config) -> CommandResult {
    let mut reader = connect(config)?;
    let record = reader.read_single(config.read.timeout())?;
    print_record(&record, true)
}

fn watch(config: &Config, count: Option<u32>) -> CommandResult {
    let mut reader = connect(config)?;
    let options = ReadOptions::new(config.read.timeout()).with_max_loops(1);
    eprintln!(
        "{} {} (Ctrl+C to stop)",
        "Watching".green(),
        config.serial.port.cyan()
    );

    let mut delivered = 0u32;
    while count.map_or(true, |n| delivered < n) {
        let mut printed = Ok(());
        let outcome =
            reader.read_with_callback(|record| printed = print_record(&record, false), &options);
        printed?;
        match outcome {
            Ok(n) => delivered += n,
            Err(e) if e.kind() == ErrorKind::InputRead => {
                eprintln!("{}: {}", "Skipped frame".yellow(), e);
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}

fn discover(config: &Config) -> CommandResult {
    let evaluator = config.evaluator()?;
    let candidates = config.discovery.resolve_candidates()?;
    if candidates.is_empty() {
        println!("{}", "No serial ports found".yellow());
        std::process::exit(1);
    }

    let discovery = PortDiscovery::new(SerialOpener::new(config.serial.clone()), &evaluator)
        .with_decoder_config(config.decoder.decoder_config()?)
        .with_timeout(config.read.timeout())
        .with_attempts(config.discovery.attempts);

    match discovery.find_port(&candidates)? {
        Some(port) => println!("{}", port.green()),
        None => {
            println!(
                "{} among {} candidate(s)",
                "No matching port".yellow(),
                candidates.len()
            );
            std::process::exit(1);
        }
    }
    Ok(())
}

fn check(config: &Config) -> CommandResult {
    config.validate()?;

    let tests = if SerialTestEvaluator::validate(&config.serial_tests)? {
        format!("{} serial test(s)", config.serial_tests.len())
    } else {
        "no serial tests".to_string()
    };
    println!(
        "{} port {} at {} baud, {}",
        "Configuration OK:".green(),
        config.serial.port.cyan(),
        config.serial.baud,
        tests
    );
    Ok(())
}
