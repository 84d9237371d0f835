//! Phillet — command-line wallet over the Phillet gateway.

mod render;

use anyhow::{bail, Context};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use phillet_gateway::{ApiFlavor, ClientConfig, GatewayClient, RefreshPolicy};
use phillet_stores::{AuthStore, EventBus, RegistrationForm, StoreError, WalletStore};
use phillet_types::{
    AuthRequest, BlockchainInfoRequest, CreateAddressRequest, ScriptUpdate,
    SendTransactionRequest, TemplateQuery, TransactionHistoryRequest, WalletAddressesRequest,
    WalletBalanceRequest,
};
use phillet_utils::{init_logging, LogFormat};

use crate::render::Output;

#[derive(Parser)]
#[command(name = "phillet", version, about = "Phillet multi-chain wallet client")]
struct Cli {
    /// Gateway base URL.
    #[arg(long, env = "PHILLET_GATEWAY_URL")]
    gateway_url: Option<String>,

    /// Gateway API flavor: "v1" or "legacy".
    #[arg(long, env = "PHILLET_API_FLAVOR")]
    api_flavor: Option<ApiFlavor>,

    /// Where the session is persisted between runs.
    #[arg(long, env = "PHILLET_SESSION_FILE")]
    session_file: Option<PathBuf>,

    /// Clear the session on 401 instead of refreshing it.
    #[arg(long, env = "PHILLET_FAIL_FAST")]
    fail_fast: bool,

    /// Request timeout in seconds.
    #[arg(long, env = "PHILLET_TIMEOUT_SECS")]
    timeout_secs: Option<u64>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "PHILLET_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "PHILLET_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "PHILLET_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Args)]
struct Chain {
    /// Blockchain, e.g. "ethereum".
    #[arg(long)]
    blockchain: String,

    /// Network, e.g. "mainnet" or "goerli".
    #[arg(long)]
    network: String,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Log in and persist the session.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "PHILLET_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account.
    Register {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "PHILLET_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, env = "PHILLET_CONFIRM_PASSWORD", hide_env_values = true)]
        confirm_password: String,
    },
    /// Forget the persisted session.
    Logout,
    /// Show who is logged in.
    Status,
    /// Show a native or token balance.
    Balance {
        #[command(flatten)]
        chain: Chain,
        /// Token contract address; omit for the native coin.
        #[arg(long)]
        token: Option<String>,
    },
    /// List wallet addresses on a chain.
    Addresses {
        #[command(flatten)]
        chain: Chain,
    },
    /// Generate a new address on a chain.
    CreateAddress {
        #[command(flatten)]
        chain: Chain,
        #[arg(long)]
        label: Option<String>,
    },
    /// Submit a transaction.
    Send {
        #[command(flatten)]
        chain: Chain,
        #[arg(long)]
        from: String,
        #[arg(long)]
        to: String,
        /// Amount in whole units, e.g. "0.25".
        #[arg(long)]
        amount: String,
        #[arg(long)]
        token: Option<String>,
        #[arg(long)]
        gas_price: Option<String>,
        #[arg(long)]
        gas_limit: Option<u64>,
    },
    /// Show transaction history for an address.
    History {
        #[command(flatten)]
        chain: Chain,
        #[arg(long)]
        address: String,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long)]
        offset: Option<u32>,
    },
    /// Show chain status.
    ChainInfo {
        #[command(flatten)]
        chain: Chain,
    },
    /// Check gateway health.
    Health,
    /// Show portfolio analytics.
    Portfolio,
    /// List or acknowledge notifications.
    Notifications {
        #[command(subcommand)]
        action: Option<NotificationAction>,
    },
    /// Show the billing plan or start an upgrade.
    Billing {
        #[command(subcommand)]
        action: Option<BillingAction>,
    },
    /// Browse and install script templates.
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },
    /// Manage automation scripts.
    Scripts {
        #[command(subcommand)]
        action: Option<ScriptAction>,
    },
}

#[derive(clap::Subcommand)]
enum BillingAction {
    /// Show plan, quota and usage.
    Info,
    /// Start an upgrade and print the checkout URL.
    Upgrade { plan: String },
}

#[derive(clap::Subcommand)]
enum TemplateAction {
    /// Search the template catalogue.
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        search: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Show one template including its code.
    Show { id: String },
    /// Install a template as a new script.
    Install { id: String },
}

#[derive(clap::Subcommand)]
enum ScriptAction {
    /// List your scripts.
    List,
    /// Run a script now.
    Run { id: String },
    /// Turn a script's triggers on.
    Enable { id: String },
    /// Turn a script's triggers off.
    Disable { id: String },
    /// Delete a script.
    Delete { id: String },
}

#[derive(clap::Subcommand)]
enum NotificationAction {
    /// List a page of notifications.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Mark one notification as read.
    Read { id: String },
    /// Mark every notification as read.
    ReadAll,
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ClientConfig::default(),
    };

    if let Some(url) = &cli.gateway_url {
        config.base_url = url.clone();
    }
    if let Some(flavor) = cli.api_flavor {
        config.api_flavor = flavor;
    }
    if let Some(path) = &cli.session_file {
        config.session_file = path.clone();
    }
    if cli.fail_fast {
        config.refresh_policy = RefreshPolicy::FailFast;
    }
    if let Some(secs) = cli.timeout_secs {
        config.timeout_secs = secs;
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = cli.log_format {
        config.log_format = format;
    }
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    init_logging(config.log_format, &config.log_level);
    tracing::debug!(
        gateway = %config.base_url,
        flavor = config.api_flavor.as_str(),
        "configuration loaded"
    );

    let client = Arc::new(GatewayClient::from_config(&config)?);
    let events = Arc::new(EventBus::new());
    let auth = AuthStore::new(Arc::clone(&client), Arc::clone(&events));
    let wallet = WalletStore::new(Arc::clone(&client), Arc::clone(&events));
    auth.restore();

    let out = Output::new(cli.json);
    let result = run(cli.command, &client, &auth, &wallet, &out).await;

    if let Err(e) = &result {
        let unauthorized = e
            .downcast_ref::<StoreError>()
            .is_some_and(StoreError::is_unauthorized);
        if unauthorized && !auth.revalidate().await {
            eprintln!("Session ended; run `phillet login` to sign in again");
        }
    }
    result
}

async fn run(
    command: Command,
    client: &GatewayClient,
    auth: &AuthStore,
    wallet: &WalletStore,
    out: &Output,
) -> anyhow::Result<()> {
    match command {
        Command::Login { email, password } => {
            let user = auth.login(AuthRequest::new(email, password)).await?;
            out.logged_in(&user)?;
        }
        Command::Register {
            first_name,
            last_name,
            email,
            password,
            confirm_password,
        } => {
            let response = auth
                .register(RegistrationForm {
                    first_name,
                    last_name,
                    email,
                    password,
                    confirm_password,
                })
                .await?;
            out.registered(&response)?;
        }
        Command::Logout => {
            auth.logout().await;
            out.line("Logged out")?;
        }
        Command::Status => {
            out.status(&auth.state(), client.session().as_ref(), client.clock().now())?;
        }
        Command::Balance { chain, token } => {
            let request = WalletBalanceRequest {
                blockchain: chain.blockchain,
                network: chain.network,
                token_address: token,
            };
            let key = request.key();
            let balance = wallet.get_balance(request).await?;
            out.balance(&key, &balance, wallet.balance_display(&key))?;
        }
        Command::Addresses { chain } => {
            let addresses = wallet
                .get_addresses(WalletAddressesRequest {
                    blockchain: chain.blockchain,
                    network: chain.network,
                })
                .await?;
            out.addresses(&addresses)?;
        }
        Command::CreateAddress { chain, label } => {
            let created = wallet
                .create_address(CreateAddressRequest {
                    blockchain: chain.blockchain,
                    network: chain.network,
                    label,
                })
                .await?;
            out.created_address(&created)?;
        }
        Command::Send {
            chain,
            from,
            to,
            amount,
            token,
            gas_price,
            gas_limit,
        } => {
            let submitted = wallet
                .send_transaction(SendTransactionRequest {
                    from_address: from,
                    to_address: to,
                    amount,
                    blockchain: chain.blockchain,
                    network: chain.network,
                    token_address: token,
                    gas_price,
                    gas_limit,
                })
                .await?;
            out.submitted(&submitted)?;
        }
        Command::History {
            chain,
            address,
            limit,
            offset,
        } => {
            let history = wallet
                .get_transaction_history(TransactionHistoryRequest {
                    address,
                    blockchain: chain.blockchain,
                    network: chain.network,
                    limit,
                    offset,
                })
                .await?;
            out.history(&history)?;
        }
        Command::ChainInfo { chain } => {
            let info = wallet
                .get_blockchain_info(BlockchainInfoRequest {
                    blockchain: chain.blockchain,
                    network: chain.network,
                })
                .await?;
            out.chain_info(&info)?;
        }
        Command::Health => {
            let health = wallet.health_check().await?;
            out.health(&health)?;
            if !health.degraded_services().is_empty() {
                bail!("gateway reports degraded services");
            }
        }
        Command::Portfolio => {
            let portfolio = wallet.load_portfolio().await?;
            out.portfolio(&portfolio)?;
        }
        Command::Notifications { action } => {
            match action.unwrap_or(NotificationAction::List { page: 1, limit: 20 }) {
                NotificationAction::List { page, limit } => {
                    let notifications = client
                        .notifications(page, limit)
                        .await
                        .map_err(StoreError::from)?;
                    out.notifications(&notifications)?;
                }
                NotificationAction::Read { id } => {
                    client
                        .mark_notification_read(&id)
                        .await
                        .map_err(StoreError::from)?;
                    out.line("Marked as read")?;
                }
                NotificationAction::ReadAll => {
                    client
                        .mark_all_notifications_read()
                        .await
                        .map_err(StoreError::from)?;
                    out.line("All notifications marked as read")?;
                }
            }
        }
        Command::Billing { action } => match action.unwrap_or(BillingAction::Info) {
            BillingAction::Info => {
                let info = client.billing_info().await.map_err(StoreError::from)?;
                out.billing(&info)?;
            }
            BillingAction::Upgrade { plan } => {
                let checkout = client.upgrade_plan(&plan).await.map_err(StoreError::from)?;
                out.line(&format!("Complete the upgrade at {}", checkout.checkout_url))?;
            }
        },
        Command::Templates { action } => match action {
            TemplateAction::List {
                category,
                search,
                page,
                limit,
            } => {
                let query = TemplateQuery {
                    category,
                    search,
                    page,
                    limit,
                };
                let templates = client.templates(&query).await.map_err(StoreError::from)?;
                out.templates(&templates)?;
            }
            TemplateAction::Show { id } => {
                let template = client.template(&id).await.map_err(StoreError::from)?;
                out.template(&template)?;
            }
            TemplateAction::Install { id } => {
                let script = client.install_template(&id).await.map_err(StoreError::from)?;
                out.script(&script)?;
            }
        },
        Command::Scripts { action } => match action.unwrap_or(ScriptAction::List) {
            ScriptAction::List => {
                let scripts = client.scripts().await.map_err(StoreError::from)?;
                out.scripts(&scripts)?;
            }
            ScriptAction::Run { id } => {
                let run = client.execute_script(&id).await.map_err(StoreError::from)?;
                out.execution(&run)?;
            }
            ScriptAction::Enable { id } => set_active(client, out, &id, true).await?,
            ScriptAction::Disable { id } => set_active(client, out, &id, false).await?,
            ScriptAction::Delete { id } => {
                client.delete_script(&id).await.map_err(StoreError::from)?;
                out.line(&format!("Deleted script {id}"))?;
            }
        },
    }
    Ok(())
}

async fn set_active(
    client: &GatewayClient,
    out: &Output,
    id: &str,
    active: bool,
) -> anyhow::Result<()> {
    let update = ScriptUpdate {
        is_active: Some(active),
        ..ScriptUpdate::default()
    };
    let script = client
        .update_script(id, &update)
        .await
        .map_err(StoreError::from)?;
    out.script(&script)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_config_defaults() {
        let cli = Cli::try_parse_from([
            "phillet",
            "--gateway-url",
            "https://gateway.example.com",
            "--api-flavor",
            "legacy",
            "--fail-fast",
            "health",
        ])
        .unwrap();
        let config = load_config(&cli).unwrap();
        assert_eq!(config.base_url, "https://gateway.example.com");
        assert_eq!(config.api_flavor, ApiFlavor::Legacy);
        assert_eq!(config.refresh_policy, RefreshPolicy::FailFast);
        assert_eq!(config.timeout_secs, 30);
    }

    #[test]
    fn send_arguments_parse() {
        let cli = Cli::try_parse_from([
            "phillet",
            "send",
            "--blockchain",
            "ethereum",
            "--network",
            "goerli",
            "--from",
            "0x1111111111111111111111111111111111111111",
            "--to",
            "0x2222222222222222222222222222222222222222",
            "--amount",
            "0.25",
        ])
        .unwrap();
        match cli.command {
            Command::Send { chain, amount, gas_limit, .. } => {
                assert_eq!(chain.network, "goerli");
                assert_eq!(amount, "0.25");
                assert_eq!(gas_limit, None);
            }
            _ => panic!("expected send"),
        }
    }

    #[test]
    fn log_format_flag_overrides_config() {
        let cli = Cli::try_parse_from(["phillet", "--log-format", "json", "status"]).unwrap();
        assert_eq!(load_config(&cli).unwrap().log_format, LogFormat::Json);
    }

    #[test]
    fn template_and_script_subcommands_parse() {
        let cli = Cli::try_parse_from([
            "phillet", "templates", "list", "--category", "trading", "--page", "2",
        ])
        .unwrap();
        match cli.command {
            Command::Templates {
                action: TemplateAction::List { category, page, limit, .. },
            } => {
                assert_eq!(category.as_deref(), Some("trading"));
                assert_eq!(page, 2);
                assert_eq!(limit, 20);
            }
            _ => panic!("expected templates list"),
        }

        let cli = Cli::try_parse_from(["phillet", "scripts", "disable", "s1"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Scripts { action: Some(ScriptAction::Disable { ref id }) } if id == "s1"
        ));
    }

    #[test]
    fn cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
