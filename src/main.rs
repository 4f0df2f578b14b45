mod api;
mod config;
mod db;
mod discovery;
mod error;
mod maintenance;
mod media;
mod store;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api::{AdminAuth, AppState};
use config::{load_fallback_table, CdnConfig, StoreConfig};
use error::{MediaError, Result};
use media::{Resolution, Resolver};

#[derive(Parser, Debug)]
#[command(name = "clinic-media", version, about = "Clinic media identity and resolution service")]
struct Cli {
    /// Link store backend (memory or sqlite)
    #[arg(long, env = "MEDIA_STORE", default_value = "sqlite", global = true)]
    store: String,

    /// SQLite database file
    #[arg(long, env = "MEDIA_DB_PATH", global = true)]
    db_path: Option<PathBuf>,

    /// JSON object file replacing the built-in compatibility table
    #[arg(long, env = "MEDIA_FALLBACK_TABLE", global = true)]
    fallback_table: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API
    Serve {
        #[arg(long, env = "MEDIA_BIND", default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        #[arg(long, env = "MEDIA_CDN_HOST", default_value = "res.cloudinary.com")]
        cdn_host: String,

        #[arg(long, env = "MEDIA_CLOUD_NAME")]
        cloud_name: String,

        /// Bearer token for the admin routes; admin routes are closed without one
        #[arg(long, env = "MEDIA_ADMIN_TOKEN")]
        admin_token: Option<String>,
    },
    /// Repair duplicate IDs in a discovery manifest, write the map, and persist it
    GenerateMap {
        #[arg(long)]
        manifest: PathBuf,
        #[arg(long, default_value = "placeholder-map.json")]
        output: PathBuf,
    },
    /// Push a discovery manifest into the store as-is
    Sync {
        #[arg(long)]
        manifest: PathBuf,
    },
    /// Repair duplicate IDs among persisted placeholders
    FixDuplicates,
    /// Show how a placeholder ID resolves
    Resolve { placeholder_id: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "clinic_media=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let store_config = StoreConfig::from_kind(&cli.store, cli.db_path)?;
    let store = store_config.build().await?;
    tracing::info!("Link store ready ({:?})", store_config.store_type);

    match cli.command {
        Command::Serve {
            bind,
            cdn_host,
            cloud_name,
            admin_token,
        } => {
            let cdn = CdnConfig::parse(&cdn_host, &cloud_name)?;
            let fallback = load_fallback_table(cli.fallback_table.as_ref())?;
            tracing::info!("Compatibility table has {} entries", fallback.len());

            let state = Arc::new(AppState::new(
                store,
                fallback,
                cdn,
                AdminAuth::new(admin_token.as_deref()),
            ));

            let app = api::router()
                .with_state(state)
                .layer(TraceLayer::new_for_http());

            tracing::info!("Media server starting on http://{}", bind);
            tracing::info!("  GET /api/media/resolve?id=<placeholder>");
            tracing::info!("  GET /api/media/url?public_id=<public id>");

            let listener = tokio::net::TcpListener::bind(bind).await?;
            axum::serve(listener, app).await?;
            Ok(ExitCode::SUCCESS)
        }
        Command::GenerateMap { manifest, output } => {
            let summary = maintenance::generate_map(store.as_ref(), &manifest, &output).await?;
            println!("Placeholders discovered: {}", summary.discovered);
            println!("Duplicate IDs renamed:   {}", summary.renamed);
            println!("Stored rows renamed:     {}", summary.renamed_in_store);
            println!("New rows persisted:      {}", summary.inserted);
            println!("Links carried:           {}", summary.carried_links);
            if !summary.is_complete() {
                println!("Renames failed:          {}", summary.failed.len());
                for failed in &summary.failed {
                    println!("  {} -> {}: {}", failed.rename.old_id, failed.rename.new_id, failed.error);
                }
            }
            println!("Map written to {}", output.display());
            Ok(ExitCode::SUCCESS)
        }
        Command::Sync { manifest } => {
            let summary = maintenance::sync(store.as_ref(), &manifest).await?;
            println!("Placeholders discovered: {}", summary.discovered);
            println!("New rows persisted:      {}", summary.inserted);
            if !summary.duplicate_ids.is_empty() {
                println!("Duplicate IDs: {}", summary.duplicate_ids.join(", "));
                println!("Run fix-duplicates to repair them.");
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::FixDuplicates => {
            let summary = maintenance::fix_duplicates(store.as_ref()).await?;
            println!("Placeholders scanned: {}", summary.scanned);
            println!("Renames applied:      {}", summary.applied.len());
            for rename in &summary.applied {
                println!("  {} -> {} ({}/{})", rename.old_id, rename.new_id, rename.page, rename.section);
            }
            if !summary.is_complete() {
                println!("Renames failed:       {}", summary.failed.len());
                for failed in &summary.failed {
                    println!("  {} -> {}: {}", failed.rename.old_id, failed.rename.new_id, failed.error);
                }
            }
            Ok(ExitCode::SUCCESS)
        }
        Command::Resolve { placeholder_id } => {
            let fallback = load_fallback_table(cli.fallback_table.as_ref())?;
            let resolver = Resolver::new(store, Arc::new(fallback));
            match maintenance::resolve_one(&resolver, &placeholder_id).await? {
                Resolution::Found(resolved) => {
                    let json = serde_json::to_string_pretty(&resolved)
                        .map_err(|e| MediaError::Manifest(e.to_string()))?;
                    println!("{}", json);
                    Ok(ExitCode::SUCCESS)
                }
                Resolution::NotFound => {
                    println!("{}: not found", placeholder_id);
                    Ok(ExitCode::SUCCESS)
                }
            }
        }
    }
}
