//! OwnerHeir: command-line host for a succession ledger
//!
//! Holds one ledger in a data directory and applies owner, heir and
//! depositor operations to it. `watch` runs a daemon that reports how close
//! the heir is to being able to take possession.
//!
//! # Usage
//!
//! ```bash
//! ownerheir keygen
//! OWNERHEIR_KEY=<hex> ownerheir init --heir 0x…
//! ownerheir --key <hex> withdraw 0      # heartbeat
//! ownerheir watch
//! ```

mod config;
mod daemon;
mod host;

use anyhow::{Context, Result};
use ownerheir_core::{Amount, Principal, Signer, SystemClock};
use ownerheir_ledger::{LedgerEvent, COOLDOWN_PERIOD};
use std::path::PathBuf;
use std::sync::Arc;

/// A parsed subcommand
#[derive(Debug, Clone, PartialEq)]
enum Command {
    Keygen,
    Whoami,
    Init { heir: Principal },
    Deposit { amount: Amount },
    Withdraw { amount: Amount },
    TakePossession { new_owner: Principal },
    Status,
    Watch { once: bool },
    Help,
    Version,
}

/// Global options plus the subcommand
#[derive(Debug, Clone, PartialEq)]
struct Cli {
    config_path: PathBuf,
    key: Option<String>,
    command: Command,
}

// Parse CLI args (minimal, no clap dependency needed)
fn parse_args(args: &[String]) -> Result<Cli> {
    let mut config_path = PathBuf::from("ownerheir.toml");
    let mut key = None;
    let mut positional: Vec<&str> = Vec::new();
    let mut heir: Option<&str> = None;
    let mut once = false;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                i += 1;
                let v = args.get(i).context("--config requires a path argument")?;
                config_path = PathBuf::from(v);
            }
            "--key" | "-k" => {
                i += 1;
                key = Some(args.get(i).context("--key requires a hex argument")?.clone());
            }
            "--heir" => {
                i += 1;
                heir = Some(
                    args.get(i)
                        .map(String::as_str)
                        .context("--heir requires a principal argument")?,
                );
            }
            "--once" | "--check" => once = true,
            "--help" | "-h" => positional.insert(0, "help"),
            "--version" | "-V" => positional.insert(0, "version"),
            other if other.starts_with('-') && other.len() > 1 => {
                anyhow::bail!("Unknown argument: {}", other)
            }
            other => positional.push(other),
        }
        i += 1;
    }

    let arg = |n: usize, what: &str| -> Result<&str> {
        positional
            .get(n)
            .copied()
            .with_context(|| format!("missing {}", what))
    };

    let command = match positional.first().copied() {
        None | Some("help") => Command::Help,
        Some("version") => Command::Version,
        Some("keygen") => Command::Keygen,
        Some("whoami") => Command::Whoami,
        Some("init") => {
            let heir = heir.context("init requires --heir <PRINCIPAL>")?;
            Command::Init {
                heir: heir.parse().context("Invalid heir principal")?,
            }
        }
        Some("deposit") => Command::Deposit {
            amount: arg(1, "<AMOUNT>")?.parse().context("Invalid amount")?,
        },
        Some("withdraw") => Command::Withdraw {
            amount: arg(1, "<AMOUNT>")?.parse().context("Invalid amount")?,
        },
        Some("take-possession") => Command::TakePossession {
            new_owner: arg(1, "<NEW_OWNER>")?
                .parse()
                .context("Invalid new owner principal")?,
        },
        Some("status") => Command::Status,
        Some("watch") => Command::Watch { once },
        Some(other) => anyhow::bail!("Unknown command: {}", other),
    };

    Ok(Cli {
        config_path,
        key,
        command,
    })
}

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cli = parse_args(&args)?;

    match cli.command {
        Command::Help => {
            print_help();
            return Ok(());
        }
        Command::Version => {
            println!("ownerheir {}", env!("CARGO_PKG_VERSION"));
            return Ok(());
        }
        Command::Keygen => {
            let signer = Signer::generate();
            println!("secret key: {}", signer.secret_hex().as_str());
            println!("principal:  {}", signer.principal());
            return Ok(());
        }
        _ => {}
    }

    // Load config
    let mut config = config::ServerConfig::from_file_or_default(&cli.config_path)
        .with_context(|| format!("Failed to load config from {}", cli.config_path.display()))?;

    // Apply env overrides, then the command line
    config.apply_env_overrides();
    if let Some(key) = cli.key.clone() {
        config.key = Some(key);
    }

    config
        .validate()
        .context("Configuration validation failed")?;

    // Init logger
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.server.log_level.as_str()),
    )
    .init();

    let signer = || -> Result<Signer> {
        let key = config
            .key()
            .context("No caller key: pass --key <HEX> or set OWNERHEIR_KEY")?;
        Signer::from_hex(&key).context("Invalid caller key")
    };

    let clock = Arc::new(SystemClock);
    let host = host::Host::new(config.clone(), clock.clone());

    match cli.command {
        Command::Whoami => println!("{}", signer()?.principal()),
        Command::Init { heir } => print_event(&host.init(&signer()?, heir)?),
        Command::Deposit { amount } => print_event(&host.deposit(&signer()?, amount)?),
        Command::Withdraw { amount } => print_event(&host.withdraw(&signer()?, amount)?),
        Command::TakePossession { new_owner } => {
            print_event(&host.take_possession(&signer()?, new_owner)?)
        }
        Command::Status => {
            let (ledger, status) = host.status()?;
            println!("Owner:          {}", ledger.owner());
            println!("Heir:           {}", ledger.heir());
            println!("Balance:        {}", ledger.balance());
            println!("Last activity:  {}", ledger.last_activity());
            println!(
                "Cooldown:       {} days ({:.0}% elapsed)",
                COOLDOWN_PERIOD.as_secs() / 86_400,
                status.elapsed_fraction * 100.0
            );
            match host.last_heartbeat() {
                Ok(Some(at)) => println!("Last heartbeat: {}", at),
                Ok(None) => println!("Last heartbeat: none journaled"),
                Err(e) => log::warn!("Could not read event journal: {:#}", e),
            }
            println!("Heir eligible:  {}", status.possession_available_at);
            println!("Status:         {:?}", status.action);
        }
        Command::Watch { once: true } => {
            log::info!("Running single check cycle…");
            daemon::run_check_cycle(&host)?;
            log::info!("Done.");
        }
        Command::Watch { once: false } => {
            let rt = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;

            // Install Ctrl-C handler for graceful shutdown
            let result = rt.block_on(async {
                tokio::select! {
                    result = daemon::run(config.clone(), clock) => result,
                    _ = tokio::signal::ctrl_c() => {
                        log::info!("Received shutdown signal. Exiting…");
                        Ok(())
                    }
                }
            });

            if let Err(e) = result {
                log::error!("Watch error: {:#}", e);
                std::process::exit(1);
            }
        }
        Command::Help | Command::Version | Command::Keygen => {}
    }

    Ok(())
}

fn print_event(event: &LedgerEvent) {
    match event {
        LedgerEvent::Created { owner, heir, at } => {
            println!("✅ Ledger created at {}", at);
            println!("  Owner: {}", owner);
            println!("  Heir:  {}", heir);
        }
        LedgerEvent::Deposited {
            from,
            amount,
            balance,
        } => println!("✅ Deposited {} from {} (balance {})", amount, from, balance),
        LedgerEvent::Withdrawn {
            owner,
            amount,
            balance,
            at,
        } => println!(
            "✅ Withdrew {} to {} at {} (balance {}); cooldown restarted",
            amount, owner, at, balance
        ),
        LedgerEvent::PossessionTaken {
            previous_owner,
            new_owner,
            at,
            ..
        } => println!(
            "✅ Possession taken at {}: owner {} -> {}",
            at, previous_owner, new_owner
        ),
    }
}

fn print_help() {
    println!(
        r#"OwnerHeir: custodial ledger with time-locked heir succession

USAGE:
    ownerheir [OPTIONS] <COMMAND>

COMMANDS:
    keygen                         Generate a secret key and print its principal
    whoami                         Print the caller's principal
    init --heir <PRINCIPAL>        Create the ledger; the caller becomes owner
    deposit <AMOUNT>               Deposit value (anyone)
    withdraw <AMOUNT>              Withdraw to the owner; 0 is a heartbeat (owner only)
    take-possession <NEW_OWNER>    Install a new owner after 30 days of owner silence (heir only)
    status                         Show ledger state and heartbeat
    watch [--once]                 Report the heartbeat every check interval

OPTIONS:
    -c, --config <PATH>   Config file path (default: ownerheir.toml)
    -k, --key <HEX>       Caller secret key
    -h, --help            Show this help message
    -V, --version         Show version

ENVIRONMENT VARIABLES (override config file):
    OWNERHEIR_DATA_DIR         Data directory path
    OWNERHEIR_CHECK_INTERVAL   Watch interval in seconds
    OWNERHEIR_LOG_LEVEL        Log level (error/warn/info/debug/trace)
    OWNERHEIR_KEY              Caller secret key (hex)
"#
    );
}
