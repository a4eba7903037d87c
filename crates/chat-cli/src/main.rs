use chat_client::{BackendClient, SessionError, SessionManager};
use chat_core::{Config, ConversationRef};
use chat_view::{ConversationView, FetchOutcome, Navigator, Route, Severity, ViewContext};
use clap::{Parser, Subcommand};
use colored::Colorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "chat-cli")]
#[command(about = "Sign in to the chat backend and browse conversations")]
#[command(version)]
struct Cli {
    /// Backend base URL (overrides config and BACKEND_URL)
    #[arg(long)]
    backend_url: Option<String>,

    #[arg(long, short)]
    username: String,

    /// Password; read from CHAT_PASSWORD when omitted
    #[arg(long, env = "CHAT_PASSWORD", hide_env_values = true)]
    password: String,

    /// Enable debug logging
    #[arg(long, short, default_value = "false")]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in and print the session
    Login,
    /// Load the responses of a conversation
    Responses {
        conversation_id: String,
        /// Conversation title, used for the current response pointer
        #[arg(long)]
        title: Option<String>,
    },
    /// Sign in, then sign out again (invalidates the refresh token)
    Signout,
}

fn init_tracing(debug: bool) {
    let default_level = if debug { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)))
        .with(
            fmt::layer()
                .with_target(true)
                .with_line_number(debug)
                .with_writer(std::io::stderr),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    init_tracing(cli.debug);

    let mut config = Config::new();
    if let Some(url) = &cli.backend_url {
        config.backend_url = url.clone();
    }
    tracing::debug!("Using backend {}", config.backend_url);

    let backend = BackendClient::new(&config)?;
    let session = SessionManager::new(backend.clone(), &config);

    match session.login(&cli.username, &cli.password).await {
        Ok(token) => println!("{}", format!("✅ Signed in as {}", token.user_name).green()),
        Err(e) => {
            print_session_error(&e);
            std::process::exit(1);
        }
    }

    match cli.command {
        Commands::Login => print_session(&session, &config.app_url).await,
        Commands::Responses {
            conversation_id,
            title,
        } => show_responses(&session, backend, &config.app_url, conversation_id, title).await,
        Commands::Signout => {
            session.sign_out().await;
            println!("{}", "👋 Signed out".cyan());
            Ok(())
        }
    }
}

async fn print_session(session: &SessionManager, app_url: &str) -> anyhow::Result<()> {
    let view = session.session().await?;
    println!("{}", format!("👤 User: {}", view.user.name).cyan());
    println!(
        "{}",
        format!("💬 Conversations: {}", Route::ConversationList.url(app_url)).dimmed()
    );
    println!("{}", format!("⏰ Access token expires: {}", view.expires).dimmed());
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

async fn show_responses(
    session: &SessionManager,
    backend: BackendClient,
    app_url: &str,
    conversation_id: String,
    title: Option<String>,
) -> anyhow::Result<()> {
    let (alerts, mut alert_rx) = chat_view::AlertChannel::new();
    let (navigator, mut route_rx) = Navigator::new();
    let ctx = ViewContext::new(backend, alerts, navigator);

    if let Some(title) = title {
        ctx.store
            .add_conversation(ConversationRef::new(conversation_id.clone(), title));
    }

    let view = ConversationView::mount(conversation_id.clone(), ctx.clone());
    let sync = view.spawn_pointer_sync();

    println!(
        "{}",
        format!("📥 Loading conversation {conversation_id}...").cyan()
    );
    let outcome = view.load(session).await;

    while let Ok(alert) = alert_rx.try_recv() {
        let line = format!("⚠️  {}", alert.message);
        match alert.severity {
            Severity::Error => println!("{}", line.red()),
            _ => println!("{}", line.yellow()),
        }
    }
    while let Ok(route) = route_rx.try_recv() {
        println!("{}", format!("➡️  Redirect to {}", route.url(app_url)).dimmed());
    }

    if let FetchOutcome::Loaded { count } = outcome {
        println!("{}", "─".repeat(50).dimmed());
        for record in ctx.store.responses() {
            println!(
                "{} {}",
                format!("[{} / {}]", record.response_id, record.choice_id).yellow(),
                serde_json::Value::Object(record.payload)
            );
        }
        println!("{}", "─".repeat(50).dimmed());
        println!("{}", format!("📊 {count} responses").dimmed());
    }

    view.sync_pointer();
    if let Some(pointer) = ctx.store.current_response() {
        let title = view.display_title().unwrap_or_default();
        println!(
            "{}",
            format!("📌 {title}: current response {}", pointer.response_id).green()
        );
    }

    view.unmount();
    sync.await?;
    Ok(())
}

fn print_session_error(e: &SessionError) {
    match e {
        SessionError::Validation(message) | SessionError::Backend(message) => {
            eprintln!("{}", format!("❌ {message}").red())
        }
        SessionError::InvalidCredentials => eprintln!("{}", format!("🔒 {e}").red()),
        SessionError::Network(message) => {
            eprintln!("{}", format!("🌐 Backend unreachable: {message}").red())
        }
        SessionError::SessionExpired | SessionError::NotAuthenticated => {
            eprintln!("{}", format!("⏰ {e}").yellow())
        }
    }
}
