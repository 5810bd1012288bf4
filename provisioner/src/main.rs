//! hostkeys - SSH key provisioning from Ansible-style inventories
//!
//! Generates one shared key per inventory group and one key per host,
//! expanding host ranges such as `web[01:20]` into individual hosts.

mod config;
mod error;
mod expand;
mod inventory;
mod keygen;
mod layout;
mod provisioner;

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{debug, error, info, Level};
use tracing_subscriber::EnvFilter;

use crate::config::{Config, KeyType};
use crate::error::{HostkeysError, Result};
use crate::inventory::Inventory;
use crate::keygen::SshKeygen;
use crate::layout::{KeyTarget, LayoutPlanner};
use crate::provisioner::Provisioner;

#[derive(Parser)]
#[command(name = "hostkeys")]
#[command(author, version, about = "Generate group and host SSH keys from an inventory", long_about = None)]
struct Cli {
    /// Inventory file (YAML)
    #[arg(value_name = "INVENTORY")]
    inventory: PathBuf,

    /// Numeric id of the group keys (written as key<ID>)
    #[arg(value_name = "KEY_ID")]
    key_id: String,

    /// Configuration file path
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Root directory for generated keys (overrides config)
    #[arg(short, long, value_name = "DIR")]
    output_dir: Option<PathBuf>,

    /// Key size in bits (overrides config)
    #[arg(short, long)]
    bits: Option<u32>,

    /// Key algorithm (overrides config)
    #[arg(short = 't', long, value_enum)]
    key_type: Option<KeyType>,

    /// Key generator program (overrides config)
    #[arg(long, value_name = "PROGRAM")]
    keygen: Option<PathBuf>,

    /// Print the planned keys without generating anything
    #[arg(long)]
    dry_run: bool,

    /// Output format for --dry-run
    #[arg(long, value_enum, default_value = "text")]
    format: OutputFormat,

    /// Enable verbose logging
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = match cli.verbose {
        0 => Level::INFO,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(log_level.into()))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let key_id = parse_key_id(&cli.key_id)?;

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(dir) = cli.output_dir {
        config.output_dir = dir;
    }
    if let Some(bits) = cli.bits {
        config.keygen.bits = bits;
    }
    if let Some(key_type) = cli.key_type {
        config.keygen.key_type = key_type;
    }
    if let Some(program) = cli.keygen {
        config.keygen.program = Some(program);
    }
    config.validate()?;

    info!("Using key ID: {}", key_id);

    let inventory = Inventory::load(&cli.inventory)?;
    let groups = inventory.groups()?;
    debug!("Planning keys for {}", inventory.path().display());

    let planner = LayoutPlanner::new(&config.output_dir, config.keygen.bits);
    let targets = planner.plan(&groups, key_id)?;

    if cli.dry_run {
        return print_plan(&targets, cli.format);
    }

    let generator = SshKeygen::from_config(&config.keygen)?;
    info!("Using key generator: {}", generator.program().display());
    let summary = Provisioner::new(generator).run(&targets)?;

    println!(
        "\nSSH key generation complete! {} keys ({} group, {} host) under {}",
        summary.total(),
        summary.group_keys,
        summary.host_keys,
        planner.root().display()
    );
    Ok(())
}

fn parse_key_id(text: &str) -> Result<u32> {
    text.trim()
        .parse::<u32>()
        .map_err(|_| HostkeysError::InvalidKeyId(text.to_string()))
}

fn print_plan(targets: &[KeyTarget], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => {
            for target in targets {
                println!("{}", target);
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(targets)?);
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_id() {
        assert_eq!(parse_key_id("7").unwrap(), 7);
        assert_eq!(parse_key_id(" 12 ").unwrap(), 12);
        assert_eq!(parse_key_id("0").unwrap(), 0);
    }

    #[test]
    fn test_parse_key_id_rejects_non_numbers() {
        for text in ["", "seven", "-1", "1.5", "7a"] {
            assert!(
                matches!(parse_key_id(text), Err(HostkeysError::InvalidKeyId(t)) if t == text),
                "{text:?}"
            );
        }
    }

    #[test]
    fn test_cli_parses_positionals_and_overrides() {
        let cli = Cli::try_parse_from([
            "hostkeys", "inv.yml", "3", "--bits", "2048", "-t", "ed25519", "--dry-run", "--format", "json",
        ])
        .unwrap();
        assert_eq!(cli.inventory, PathBuf::from("inv.yml"));
        assert_eq!(cli.key_id, "3");
        assert_eq!(cli.bits, Some(2048));
        assert_eq!(cli.key_type, Some(KeyType::Ed25519));
        assert!(cli.dry_run);
        assert_eq!(cli.format, OutputFormat::Json);
    }

    #[test]
    fn test_cli_requires_both_positionals() {
        assert!(Cli::try_parse_from(["hostkeys", "inv.yml"]).is_err());
        assert!(Cli::try_parse_from(["hostkeys", "inv.yml", "1", "extra"]).is_err());
    }
}
