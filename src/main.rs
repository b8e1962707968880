use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use larder_api::auth;
use larder_api::config::AppConfig;
use larder_api::db;
use larder_api::db::users::{self, NewUser};
use larder_api::handlers;
use larder_api::media::MediaStore;
use larder_api::AppState;

#[derive(Parser)]
#[command(name = "larder-api", version, about = "Recipe management REST API")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Run the HTTP server (the default when no subcommand is given)
    Serve,
    /// Provision an active staff + superuser account
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        #[arg(long, default_value = "")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config).await,
        Command::CreateSuperuser {
            email,
            password,
            name,
        } => create_superuser(config, email, password, name).await,
    }
}

async fn serve(config: AppConfig) -> anyhow::Result<()> {
    let pool = db::connect_wait(&config.database)
        .await
        .context("database is unavailable")?;
    db::migrate(&pool).await.context("running migrations")?;

    let media = MediaStore::new(config.media.root.clone());
    media
        .ensure_exists()
        .await
        .context("creating media directories")?;

    let port = config.server.port;
    let app = handlers::router(AppState::new(pool, config, media));

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("larder-api listening on http://{}", bind_addr);
    axum::serve(listener, app).await.context("server error")?;
    Ok(())
}

async fn create_superuser(
    config: AppConfig,
    email: String,
    password: String,
    name: String,
) -> anyhow::Result<()> {
    auth::validate_email(&email).map_err(|msg| anyhow::anyhow!("invalid email: {}", msg))?;
    if password.chars().count() < config.security.password_min_length {
        anyhow::bail!(
            "password must be at least {} characters",
            config.security.password_min_length
        );
    }

    let pool = db::connect_wait(&config.database)
        .await
        .context("database is unavailable")?;
    db::migrate(&pool).await.context("running migrations")?;

    let email = auth::normalize_email(&email);
    let password_hash = auth::hash_password(password)
        .await
        .context("hashing password")?;

    let user = users::insert(
        &pool,
        NewUser {
            email,
            password_hash,
            name,
            is_staff: true,
            is_superuser: true,
        },
    )
    .await
    .context("creating superuser")?;

    println!("Superuser {} created (id {})", user.email, user.id);
    Ok(())
}
