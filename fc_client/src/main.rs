//! Command line client for the fortune cookie service.
//!
//! Drives the session engine and the access gate from a terminal: start an
//! OAuth login, finish the callback, check whether today's fortune is
//! available and manage the account.

use std::{io::Write, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use fc_client::{
    ApiClient, ClientConfig, ConsoleNavigator, FileStore, GoTrueClient, logging,
    logging::log_policy_event,
};
use fortune_cookie::{
    AccessGate, AccessVerdict, AdminGate, AuthSnapshot, DenialModal, SessionEngine, SessionHandle,
    access::run_countdown,
    db::{Database, PgProfileStore},
    engine::CallbackOutcome,
    store::LocalStore,
    usage::{UsageSink, UsageTimer},
};
use pico_args::Arguments;

const HELP: &str = "\
Fortune cookie command line client

USAGE:
  fc_client <COMMAND> [OPTIONS]

COMMANDS:
  login                 Print the OAuth authorization URL
  callback              Finish a login with the code from the redirect
  status                Show the current session
  start                 Check access and track usage until Ctrl-C
  school                Set the school of the current user
  admin                 Check admin access
  logout                Log out and clear local data
  delete-account        Delete the current account
  countdown             Count down to a timestamp

OPTIONS:
  --provider NAME       OAuth provider for login  [default: google]
  --code CODE           Authorization code for callback
  --name SCHOOL         School name for school
  --until TIMESTAMP     RFC 3339 target for countdown

FLAGS:
  -h, --help            Print help information

Configuration is read from the environment (and .env): SUPABASE_URL,
SUPABASE_ANON_KEY, FORTUNE_API_URL, FORTUNE_STATE_PATH, DATABASE_URL.
";

/// How long a command waits for the engine to settle
const SETTLE_TIMEOUT: Duration = Duration::from_secs(10);

enum Command {
    Login { provider: String },
    Callback { code: String },
    Status,
    Start,
    School { name: String },
    Admin,
    Logout,
    DeleteAccount,
    Countdown { until: String },
}

struct Args {
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let mut pargs = Arguments::from_env();

    if pargs.contains(["-h", "--help"]) {
        print!("{HELP}");
        std::process::exit(0);
    }

    let subcommand: Option<String> = pargs.subcommand().context("Invalid command")?;
    let command = match subcommand.as_deref() {
        Some("login") => Command::Login {
            provider: pargs
                .value_from_str("--provider")
                .unwrap_or_else(|_| "google".to_string()),
        },
        Some("callback") => Command::Callback {
            code: pargs.value_from_str("--code").context("--code is required")?,
        },
        Some("status") => Command::Status,
        Some("start") => Command::Start,
        Some("school") => Command::School {
            name: pargs.value_from_str("--name").context("--name is required")?,
        },
        Some("admin") => Command::Admin,
        Some("logout") => Command::Logout,
        Some("delete-account") => Command::DeleteAccount,
        Some("countdown") => Command::Countdown {
            until: pargs.value_from_str("--until").context("--until is required")?,
        },
        Some(other) => anyhow::bail!("Unknown command '{}'\n\n{}", other, HELP),
        None => {
            print!("{HELP}");
            return Ok(());
        }
    };

    dotenvy::dotenv().ok();
    logging::init();

    run(Args { command }).await
}

/// Adapters wired around one engine instance
struct Client {
    config: ClientConfig,
    api: Arc<ApiClient>,
    sessions: Arc<GoTrueClient>,
    navigator: Arc<ConsoleNavigator>,
    handle: SessionHandle,
}

impl Client {
    fn connect() -> Result<Self> {
        let config = ClientConfig::from_env().context("Failed to load configuration")?;

        let store: Arc<dyn LocalStore> = Arc::new(
            FileStore::open(&config.state_path).context("Failed to open local state")?,
        );
        let sessions = Arc::new(GoTrueClient::new(config.auth.clone(), store.clone()));
        let api = Arc::new(ApiClient::new(
            config.api_url.clone(),
            sessions.clone(),
            config.request_timeout,
        )?);
        let navigator = Arc::new(ConsoleNavigator::new(config.routes.entry.clone()));

        let mut engine = SessionEngine::new(api.clone(), sessions.clone(), store, navigator.clone())
            .with_config(config.session.clone())
            .with_routes(config.routes.clone());
        if let Some(db_config) = &config.database {
            let database = Database::new(db_config).context("Failed to create database pool")?;
            engine = engine.with_profile_store(Arc::new(PgProfileStore::new(database.pool().clone())));
            tokio::spawn(async move {
                if let Err(e) = database.health_check().await {
                    tracing::warn!(error = %e, "Profile store unreachable, backend only");
                }
            });
        }

        Ok(Self {
            config,
            api,
            sessions,
            navigator,
            handle: engine.spawn(),
        })
    }

    async fn settled(&self) -> Result<AuthSnapshot> {
        tokio::time::timeout(SETTLE_TIMEOUT, self.handle.wait_until_loaded())
            .await
            .context("Timed out waiting for the session")?
            .context("Session engine stopped")
    }

    fn gate(&self) -> AccessGate {
        AccessGate::new(
            self.api.clone(),
            self.sessions.clone(),
            self.navigator.clone(),
            print_modal,
        )
        .with_routes(self.config.routes.clone())
    }
}

async fn run(args: Args) -> Result<()> {
    if let Command::Countdown { until } = &args.command {
        countdown(until).await;
        return Ok(());
    }

    let client = Client::connect()?;

    match args.command {
        Command::Login { provider } => {
            let url = client.handle.login(&provider).await.context("Failed to start login")?;
            println!("Open this URL to sign in:\n{}", url);
        }
        Command::Callback { code } => {
            let outcome = client
                .handle
                .complete_oauth_callback(&code)
                .await
                .context("Failed to complete login")?;
            match outcome {
                CallbackOutcome::SignedIn => {
                    let signed_in = client.handle.wait_for(|s| s.is_logged_in);
                    if tokio::time::timeout(SETTLE_TIMEOUT, signed_in).await.is_err() {
                        tracing::warn!("Session did not settle after the callback");
                    }
                    print_snapshot(&client.handle.snapshot());
                }
                CallbackOutcome::AlreadyProcessed => println!("This login was already completed."),
                CallbackOutcome::Restricted => {
                    log_policy_event("cooldown", None, "Re-signup restriction at login");
                    println!("Sign-up is temporarily restricted for this account.");
                }
                CallbackOutcome::Banned => {
                    log_policy_event("banned", None, "Banned account at login");
                    println!("This account is banned.");
                }
            }
        }
        Command::Status => print_snapshot(&client.settled().await?),
        Command::Start => start(&client).await?,
        Command::School { name } => {
            client.settled().await?;
            let profile = client
                .handle
                .update_school(&name)
                .await
                .context("Failed to update school")?;
            println!("School set to {}", profile.school.unwrap_or_default());
        }
        Command::Admin => {
            client.settled().await?;
            let gate = AdminGate::new(client.api.clone(), client.navigator.clone())
                .with_routes(client.config.routes.clone());
            if gate.verify().await {
                println!("Admin access granted.");
            } else {
                println!("Admin access denied.");
            }
        }
        Command::Logout => {
            client.settled().await?;
            client.handle.logout().await.context("Failed to log out")?;
            println!("Logged out.");
        }
        Command::DeleteAccount => {
            client.settled().await?;
            client
                .handle
                .delete_account()
                .await
                .context("Failed to delete account")?;
            println!("Account deleted.");
        }
        Command::Countdown { .. } => {}
    }

    // Let background sign-out and upsert steps finish
    tokio::time::sleep(Duration::from_millis(200)).await;
    Ok(())
}

async fn start(client: &Client) -> Result<()> {
    let snapshot = client.settled().await?;
    let user_id = snapshot.user.as_ref().map(|u| u.id.clone());

    match client.gate().check(user_id.as_deref()).await {
        AccessVerdict::Allowed => {}
        AccessVerdict::DailyLimit {
            next_available_at: Some(next),
        } => {
            log_policy_event("daily_limit", user_id.as_deref(), &next);
            countdown(&next).await;
            return Ok(());
        }
        verdict => {
            tracing::info!(?verdict, "Access denied");
            return Ok(());
        }
    }

    let Some(user_id) = user_id else {
        return Ok(());
    };
    println!("Enjoy your fortune. Press Ctrl-C to finish.");

    let sink: Arc<dyn UsageSink> = client.api.clone();
    let timer = UsageTimer::spawn(sink, user_id, &client.config.session);
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl-C")?;
    timer.stop().await;
    Ok(())
}

async fn countdown(until: &str) {
    run_countdown(until, |remaining| {
        print!("\r{}  ", remaining.label());
        let _ = std::io::stdout().flush();
    })
    .await;
    println!();
}

fn print_modal(modal: DenialModal) {
    log_policy_event("denied", None, modal.title());
    println!("[{}] {}", modal.title(), modal.message());
    println!("  ({})", modal.action().label());
}

fn print_snapshot(snapshot: &AuthSnapshot) {
    match &snapshot.user {
        Some(user) if snapshot.is_logged_in => {
            println!("Signed in as {}", user.email.as_deref().unwrap_or(&user.id));
            println!("  school: {}", user.school.as_deref().unwrap_or("-"));
            println!("  status: {:?}", user.status);
            println!("  admin:  {}", user.is_admin);
        }
        _ => println!("Not signed in."),
    }
}
