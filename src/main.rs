use clap::{Args, Parser, Subcommand};

mod balance;
mod cli;
mod client;
mod config;
mod error;
mod permissions;
mod records;
mod session;
mod store;
mod ui;
mod version;

#[cfg(test)]
mod tests;

use cli::CliHandler;
use version::CURRENT_VERSION;

#[derive(Parser)]
#[command(
    name = "moneta",
    about = "Moneta personal finance client",
    long_about = "Moneta - command-line client for the Moneta personal finance API

OVERVIEW:
  Record and inspect accounts, expenses, revenues, transfers, and loans held
  on a Moneta server. Sessions persist between runs until they expire.

QUICK START:
  moneta login                     # Authenticate with username and password
  moneta status                    # Check session and server status
  moneta accounts                  # List accounts with their balances
  moneta balance <ACCOUNT_ID>      # Compute one account's balance
  moneta permissions               # Show your capabilities per resource",
    version = CURRENT_VERSION,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Login with username and password
    Login(LoginArgs),

    /// Logout and discard the stored session
    Logout,

    /// Show session and server status
    #[command(aliases = &["st"])]
    Status,

    /// Compute an account's balance
    #[command(aliases = &["bal"])]
    Balance(BalanceArgs),

    /// List accounts with their balances
    #[command(aliases = &["acc"])]
    Accounts,

    /// Show the current user's capabilities
    #[command(aliases = &["perms"])]
    Permissions,

    /// Configure settings
    #[command(aliases = &["cfg"])]
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct LoginArgs {
    /// Username; prompted for when omitted
    pub username: Option<String>,
}

#[derive(Args)]
pub struct BalanceArgs {
    pub account_id: u64,

    /// Count only settled records (paid expenses, received revenues)
    #[arg(long)]
    pub settled: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    Show,
    SetEndpoint { url: String },
    SetTimeout { seconds: u64 },
    SetVerbose { enabled: String },
    Reset,
}

#[cfg(test)]
mod cli_parse_tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_config_subcommand_carries_inner_command() {
        let cli = Cli::parse_from(["moneta", "config", "show"]);
        match cli.command {
            Commands::Config(args) => assert!(matches!(args.command, ConfigCommand::Show)),
            _ => panic!("expected config subcommand"),
        }
    }

    #[test]
    fn test_balance_flags_parse() {
        let cli = Cli::parse_from(["moneta", "balance", "42", "--settled"]);
        match cli.command {
            Commands::Balance(args) => {
                assert_eq!(args.account_id, 42);
                assert!(args.settled);
            }
            _ => panic!("expected balance subcommand"),
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(format!("moneta={}", log_level));
    subscriber.init();

    let mut handler = CliHandler::with_config_path(None);
    if let Err(e) = handler.execute(cli.command).await {
        ui::UI::new().error(&format!("Error: {}", e));
        std::process::exit(1);
    }
}
