// src/main.rs
// Lexi CLI - sign in, sync settings and chat with the tutor from a terminal

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use lexi::genai::VoiceName;
use lexi::{ChannelNavigator, ClientConfig, LexiClient, Route};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "lexi")]
#[command(about = "Lexi language-learning client")]
#[command(version)]
struct Cli {
    /// Lexi API base URL (overrides LEXI_API_URL and config.toml)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Lexi API port (overrides LEXI_API_PORT)
    #[arg(long, global = true)]
    port: Option<u16>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an account
    Register {
        username: String,
        email: String,
        #[arg(long, env = "LEXI_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Sign in and keep the session token
    Login {
        email: String,
        #[arg(long, env = "LEXI_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Forget the session token
    Logout,

    /// Show whether the stored session is still valid
    Status,

    /// Show the signed-in user's settings
    Settings,

    /// Set the language being learned
    Language {
        language_id: String,
        #[arg(long, default_value = "")]
        style: String,
    },

    /// Mark or unmark a topic as favorite
    Favorite {
        topic_id: String,
        #[arg(long)]
        remove: bool,
    },

    /// Set the tutor voice and, optionally, your own Gemini API key
    Voice {
        voice: VoiceName,
        #[arg(long)]
        api_key: Option<String>,
    },

    /// Change username and email
    Profile { username: String, email: String },

    /// Change password
    Password {
        #[arg(long, env = "LEXI_NEW_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Talk to the tutor; reads lines from stdin without a message
    Chat { message: Option<String> },

    /// Show the resolved configuration and any problems with it
    Config,
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lexi=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();
}

/// Print any redirects the session layer asked for
fn report_routes(routes: &mut UnboundedReceiver<Route>) {
    while let Ok(route) = routes.try_recv() {
        println!("-> {}", route.path());
    }
}

async fn require_session(client: &LexiClient) -> Result<()> {
    if !client.auth().is_authenticated().await? {
        bail!("not signed in; run `lexi login <email>` first");
    }
    Ok(())
}

async fn run(cli: Cli, client: &LexiClient, routes: &mut UnboundedReceiver<Route>) -> Result<()> {
    match cli.command {
        Commands::Register {
            username,
            email,
            password,
        } => {
            client.auth().register(&username, &email, &password).await?;
            println!("Registered {}. Sign in with `lexi login {}`.", username, email);
        }
        Commands::Login { email, password } => {
            client.auth().login(&email, &password).await?;
            println!("Signed in as {}", email);
            // The redirect fires after the configured delay
            let wait = client.config().login_redirect_delay + Duration::from_millis(500);
            if let Ok(Some(route)) = tokio::time::timeout(wait, routes.recv()).await {
                println!("-> {}", route.path());
            }
        }
        Commands::Logout => {
            client.auth().logout();
            println!("Signed out");
        }
        Commands::Status => {
            if client.auth().is_authenticated().await? {
                match client.users().user() {
                    Some(user) if !user.username.is_empty() => {
                        println!("Signed in as {} <{}>", user.username, user.email)
                    }
                    _ => println!("Signed in"),
                }
            } else {
                println!("Not signed in");
            }
        }
        Commands::Settings => {
            require_session(client).await?;
            match client.users().fetch_user_settings().await? {
                Some(mut settings) => {
                    if settings.has_api_key() {
                        settings.api_key = "<set>".to_string();
                    }
                    println!("{}", serde_json::to_string_pretty(&settings)?);
                }
                None => println!("No settings yet"),
            }
        }
        Commands::Language { language_id, style } => {
            require_session(client).await?;
            client.users().save_language(&language_id, &style).await?;
            println!("Language set to {}", language_id);
        }
        Commands::Favorite { topic_id, remove } => {
            require_session(client).await?;
            client.users().toggle_favorite(&topic_id, !remove).await?;
            let action = if remove { "Removed" } else { "Added" };
            println!("{} favorite: {}", action, topic_id);
        }
        Commands::Voice { voice, api_key } => {
            require_session(client).await?;
            let api_key = match api_key {
                Some(key) => key,
                None => client
                    .users()
                    .fetch_user_settings()
                    .await?
                    .map(|s| s.api_key)
                    .unwrap_or_default(),
            };
            client.users().save_lexi_settings(voice, &api_key).await?;
            println!("Tutor voice set to {}", voice);
        }
        Commands::Profile { username, email } => {
            require_session(client).await?;
            client.users().save_profile_settings(&username, &email).await?;
            println!("Profile updated");
        }
        Commands::Password { password } => {
            require_session(client).await?;
            client.users().save_security_settings(&password).await?;
            println!("Password changed");
        }
        Commands::Chat { message } => {
            require_session(client).await?;
            client.users().fetch_user_settings().await?;
            let mut tutor = client
                .tutor()
                .context("set a Gemini API key with `lexi voice <name> --api-key` or GEMINI_API_KEY")?;

            if let Some(message) = message {
                println!("{}", tutor.send(&message).await?);
                return Ok(());
            }

            let mut lines = BufReader::new(tokio::io::stdin()).lines();
            let mut stdout = tokio::io::stdout();
            loop {
                stdout.write_all(b"> ").await?;
                stdout.flush().await?;
                let Some(line) = lines.next_line().await? else {
                    break;
                };
                match line.trim() {
                    "" => continue,
                    "/reset" => {
                        tutor.reset();
                        println!("(conversation cleared)");
                    }
                    "/quit" | "/exit" => break,
                    text => match tutor.send(text).await {
                        Ok(reply) => println!("{}", reply),
                        Err(e) => {
                            warn!(error = %e, "Tutor turn failed");
                            eprintln!("error: {}", e);
                        }
                    },
                }
                report_routes(routes);
            }
        }
        Commands::Config => {
            let config = client.config();
            println!("{:#?}", config);
            println!("{}", config.validate().report());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Global first, then project - project overrides
    if let Some(home) = dirs::home_dir() {
        let _ = dotenvy::from_path(home.join(".lexi/.env"));
    }
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_logging();

    let mut config = ClientConfig::load();
    if let Some(url) = &cli.api_url {
        config.api_url = url.clone();
    }
    if let Some(port) = cli.port {
        config = config.with_port(port);
    }
    debug!(?config, "Configuration resolved");

    let (navigator, mut routes) = ChannelNavigator::channel();
    let client = LexiClient::new(config, Arc::new(navigator)).context("invalid Lexi API address")?;

    let result = run(cli, &client, &mut routes).await;
    report_routes(&mut routes);
    result
}
