use std::time::Duration;

use clap::{Parser, Subcommand};
use coinfolio::config::{ClientConfig, ConfigError};
use coinfolio::guard::{GuardView, RouteGuard};
use coinfolio::net::api::ApiClient;
use coinfolio::net::types::{ApiError, TransactionKind};
use serde::Serialize;
use serde_json::json;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error("not logged in; run `coinfolio login` first")]
    LoginRequired,
    #[error("navigation superseded before the session resolved")]
    Superseded,
    #[error("invalid JSON payload: {0}")]
    InvalidJson(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "coinfolio", about = "Crypto portfolio client")]
struct Cli {
    /// API root including the `/api` prefix. Overrides `COINFOLIO_API_BASE_URL`.
    #[arg(long)]
    base_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "COINFOLIO_PASSWORD")]
        password: String,
    },
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "COINFOLIO_PASSWORD")]
        password: String,
    },
    Logout,
    /// Resolve the stored session the way a protected view would.
    Status,
    Portfolio,
    Pnl,
    Prices {
        #[arg(required = true, value_delimiter = ',')]
        symbols: Vec<String>,
        #[arg(long)]
        currency: Option<String>,
    },
    /// Record a buy or sell transaction.
    Buy {
        symbol: String,
        amount: f64,
        #[arg(long = "type", value_enum, default_value_t = KindArg::Buy)]
        kind: KindArg,
    },
    Transfer {
        #[arg(long)]
        to: String,
        symbol: String,
        amount: f64,
    },
    ForgotPassword {
        #[arg(long)]
        email: String,
    },
    ResetPassword {
        #[arg(long)]
        token: String,
        #[arg(long, env = "COINFOLIO_NEW_PASSWORD")]
        new_password: String,
    },
}

#[derive(clap::ValueEnum, Debug, Clone, Copy)]
enum KindArg {
    Buy,
    Sell,
}

impl From<KindArg> for TransactionKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Buy => Self::Buy,
            KindArg::Sell => Self::Sell,
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), CliError> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let mut config = ClientConfig::from_env()?;
    if let Some(base_url) = cli.base_url.as_deref() {
        config = config.with_base_url(base_url)?;
    }
    tracing::debug!(base_url = %config.base_url, session_dir = %config.session_dir.display(), "client configured");

    let client = ApiClient::from_config(&config)?;
    let guard = RouteGuard::new(client.store().clone()).with_splash_delay(Duration::from_millis(config.splash_delay_ms));

    match cli.command {
        Command::Login { email, password } => {
            let user = client.login(&email, &password).await?;
            print_json(&user)
        }
        Command::Register { name, email, password } => {
            let created = client.register(&name, &email, &password).await?;
            print_json(&created)
        }
        Command::Logout => {
            client.logout();
            print_json(&json!({ "loggedOut": true }))
        }
        Command::Status => {
            let view = guard.enter().await.ok_or(CliError::Superseded)?;
            let session = client.store().snapshot();
            print_json(&json!({
                "authenticated": view == GuardView::Protected,
                "user": session.user,
            }))
        }
        Command::Portfolio => {
            require_login(&guard).await?;
            print_json(&client.portfolio().await?)
        }
        Command::Pnl => {
            require_login(&guard).await?;
            print_json(&client.pnl().await?)
        }
        Command::Prices { symbols, currency } => print_json(&client.prices(&symbols, currency.as_deref()).await?),
        Command::Buy { symbol, amount, kind } => {
            require_login(&guard).await?;
            print_json(&client.create_transaction(&symbol, kind.into(), amount).await?)
        }
        Command::Transfer { to, symbol, amount } => {
            require_login(&guard).await?;
            print_json(&client.transfer(&to, &symbol, amount).await?)
        }
        Command::ForgotPassword { email } => print_json(&client.forgot_password(&email).await?),
        Command::ResetPassword { token, new_password } => {
            print_json(&client.reset_password(&token, &new_password).await?)
        }
    }
}

async fn require_login(guard: &RouteGuard) -> Result<(), CliError> {
    match guard.enter().await {
        Some(GuardView::Protected) => Ok(()),
        Some(GuardView::RedirectToLogin | GuardView::Interstitial) => Err(CliError::LoginRequired),
        None => Err(CliError::Superseded),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), CliError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
