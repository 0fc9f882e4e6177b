use std::path::PathBuf;

use dialoguer::{Input, Password};

use crate::balance::{gross_balance, BalanceService};
use crate::client::{ApiClient, HttpClient};
use crate::config::{default_config_path, CliConfig};
use crate::error::{MonetaError, Result};
use crate::permissions::{fetch_capabilities, ResourceKind};
use crate::records::RecordService;
use crate::ui::{format_amount_colored, UI};
use crate::version::CURRENT_VERSION;
use crate::{BalanceArgs, Commands, ConfigCommand, LoginArgs};

/// CLI handler for processing commands
pub struct CliHandler {
    config_path: Option<PathBuf>,
    ui: UI,
}

impl CliHandler {
    /// Create a new CLI handler with a custom config path
    pub fn with_config_path(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            ui: UI::new(),
        }
    }

    /// Load configuration using the handler's config path
    async fn load_config(&self) -> Result<CliConfig> {
        CliConfig::load(self.config_path.as_deref()).await
    }

    async fn open_client(&self) -> Result<HttpClient> {
        let config = self.load_config().await?;
        HttpClient::new(config.to_client_config())
    }

    /// Open a client with a live session, restoring from the persisted
    /// record when possible
    async fn authenticated_client(&self) -> Result<HttpClient> {
        let client = self.open_client().await?;
        if !client.restore_session().await? {
            return Err(MonetaError::authentication(
                "Not logged in. Run `moneta login` first.",
            ));
        }
        Ok(client)
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login(args) => self.handle_login(args).await,
            Commands::Logout => self.handle_logout().await,
            Commands::Status => self.handle_status().await,
            Commands::Balance(args) => self.handle_balance(args).await,
            Commands::Accounts => self.handle_accounts().await,
            Commands::Permissions => self.handle_permissions().await,
            Commands::Config(args) => self.handle_config(args.command).await,
        }
    }

    /// Handle login command
    async fn handle_login(&mut self, args: LoginArgs) -> Result<()> {
        let client = self.open_client().await?;

        let username = match args.username {
            Some(username) => username,
            None => Input::new().with_prompt("Username").interact_text()?,
        };
        let password = Password::new().with_prompt("Password").interact()?;

        client.login(username.clone(), password).await?;
        self.ui.success(&format!("Logged in as {}", username));
        Ok(())
    }

    /// Handle logout command
    async fn handle_logout(&mut self) -> Result<()> {
        let client = self.open_client().await?;
        client.logout().await?;
        self.ui.success("Logged out");
        Ok(())
    }

    /// Handle status command
    async fn handle_status(&mut self) -> Result<()> {
        let client = self.open_client().await?;
        let authenticated = client.restore_session().await.unwrap_or(false);
        let connected = client.ping().await;

        let mut rows = vec![
            ("Version", CURRENT_VERSION.to_string()),
            ("Authentication", self.ui.format_auth_status(authenticated)),
        ];
        if authenticated {
            rows.push((
                "Username",
                self.ui.format_user_field(client.current_username()),
            ));
        }
        rows.push(("Server", self.ui.format_server_status(connected)));
        rows.push(("Endpoint", client.config().base_url.clone()));

        self.ui.card("Moneta Status", rows);
        Ok(())
    }

    /// Handle balance command
    async fn handle_balance(&mut self, args: BalanceArgs) -> Result<()> {
        let client = self.authenticated_client().await?;
        let service = BalanceService::new();

        let balance = if args.settled {
            service.settled(&client, args.account_id).await?
        } else {
            service.gross(&client, args.account_id).await?
        };

        let label = if args.settled { "settled" } else { "gross" };
        println!(
            "Account {} ({}): {}",
            args.account_id,
            label,
            format_amount_colored(balance)
        );
        Ok(())
    }

    /// Handle accounts command
    async fn handle_accounts(&mut self) -> Result<()> {
        let client = self.authenticated_client().await?;
        let records = RecordService::new();

        let accounts = records.list_accounts(&client).await?;
        if accounts.is_empty() {
            self.ui.info("No accounts recorded yet");
            return Ok(());
        }

        // One fetch of each stream serves every account row
        let revenues = records.list_revenues(&client).await?;
        let expenses = records.list_expenses(&client).await?;
        let transfers = records.list_transfers(&client).await?;
        let loans = records.list_loans(&client).await?;

        let rows = accounts
            .iter()
            .map(|account| {
                let balance =
                    gross_balance(account.id, &revenues, &expenses, &transfers, &loans);
                (account.name.as_str(), format_amount_colored(balance))
            })
            .collect();

        self.ui.card("Accounts", rows);
        Ok(())
    }

    /// Handle permissions command
    async fn handle_permissions(&mut self) -> Result<()> {
        let client = self.authenticated_client().await?;
        let caps = fetch_capabilities(&client).await?;

        if caps.is_superuser() {
            self.ui.info("Superuser: all capabilities granted");
        }

        let rows = ResourceKind::ALL
            .iter()
            .map(|kind| {
                let granted = caps.capabilities_for(*kind);
                let value = if granted.is_empty() {
                    "-".to_string()
                } else {
                    granted
                        .iter()
                        .map(|c| c.to_string())
                        .collect::<Vec<_>>()
                        .join(", ")
                };
                (kind_label(*kind), value)
            })
            .collect();

        self.ui.card("Capabilities", rows);
        Ok(())
    }

    /// Handle config command
    async fn handle_config(&mut self, command: ConfigCommand) -> Result<()> {
        let config_path = self
            .config_path
            .clone()
            .unwrap_or_else(default_config_path);
        let mut config = self.load_config().await?;

        match command {
            ConfigCommand::Show => {
                self.ui.card(
                    "Configuration",
                    vec![
                        ("Endpoint", config.endpoint.clone()),
                        ("Timeout", format!("{}s", config.timeout)),
                        ("Verbose", config.verbose.to_string()),
                        ("Storage", config.storage_dir.display().to_string()),
                    ],
                );
            }
            ConfigCommand::SetEndpoint { url } => {
                config.endpoint = url;
                config.save(&config_path).await?;
                self.ui.success("Endpoint updated");
            }
            ConfigCommand::SetTimeout { seconds } => {
                config.timeout = seconds;
                config.save(&config_path).await?;
                self.ui.success("Timeout updated");
            }
            ConfigCommand::SetVerbose { enabled } => {
                config.verbose = match enabled.as_str() {
                    "true" | "on" => true,
                    "false" | "off" => false,
                    other => {
                        return Err(MonetaError::invalid_input(format!(
                            "Expected true/false, got {other}"
                        )))
                    }
                };
                config.save(&config_path).await?;
                self.ui.success("Verbose updated");
            }
            ConfigCommand::Reset => {
                config = CliConfig::default();
                config.save(&config_path).await?;
                self.ui.success("Configuration reset to defaults");
            }
        }
        Ok(())
    }
}

fn kind_label(kind: ResourceKind) -> &'static str {
    match kind {
        ResourceKind::Accounts => "Accounts",
        ResourceKind::Expenses => "Expenses",
        ResourceKind::Revenues => "Revenues",
        ResourceKind::CreditCards => "Credit cards",
        ResourceKind::Loans => "Loans",
        ResourceKind::Transfers => "Transfers",
        ResourceKind::Members => "Members",
    }
}
