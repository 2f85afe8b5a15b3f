use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::extract::DefaultBodyLimit;
use axum::http::HeaderValue;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay::models::binding::RepositoryBinding;
use relay::store::memory::MemoryStore;
use relay::store::postgres::PgStore;
use relay::store::Store;
use relay::{api, config, jobs, AppState};

mod cli;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let json_logs = std::env::var("RELAY_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let (text_layer, json_layer) = if json_logs {
        (None, Some(tracing_subscriber::fmt::layer().json()))
    } else {
        (Some(tracing_subscriber::fmt::layer()), None)
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "relay=debug,tower_http=debug".into()),
        ))
        .with(text_layer)
        .with(json_layer)
        .init();

    let cfg = config::load()?;
    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port).await
        }
        Some(cli::Commands::Migrate) => {
            let db = connect_database(&cfg).await?;
            db.migrate().await?;
            println!("Migrations applied.");
            Ok(())
        }
        Some(cli::Commands::Binding { command }) => {
            let db = connect_database(&cfg).await?;
            handle_binding_command(command, &db).await
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

async fn connect_database(cfg: &config::Config) -> anyhow::Result<PgStore> {
    let url = cfg
        .database_url
        .as_deref()
        .context("DATABASE_URL is required for this command")?;
    PgStore::connect(url).await
}

async fn open_store(database_url: Option<&str>) -> anyhow::Result<Arc<dyn Store>> {
    match database_url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let db = PgStore::connect(url).await?;

            tracing::info!("Running migrations...");
            db.migrate().await?;
            Ok(Arc::new(db))
        }
        None => {
            tracing::warn!(
                "No DATABASE_URL; using in-memory store, tokens and bindings are lost on restart"
            );
            Ok(Arc::new(MemoryStore::new()))
        }
    }
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    cfg.ensure_oauth_configured()?;
    tracing::info!(config = ?cfg, "loaded configuration");

    let store = open_store(cfg.database_url.as_deref()).await?;
    jobs::cleanup::spawn(store.clone(), cfg.flow_ttl());
    let state = Arc::new(AppState::new(cfg, store)?);

    let app = api::router()
        .with_state(state)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(axum::middleware::from_fn(request_id_middleware))
        .layer(axum::middleware::from_fn(security_headers_middleware));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("relay listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Middleware: injects a unique X-Request-Id into every response.
async fn request_id_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let req_id = uuid::Uuid::new_v4().to_string();
    let mut resp = next.run(req).await;
    if let Ok(val) = HeaderValue::from_str(&req_id) {
        resp.headers_mut().insert("x-request-id", val);
    }
    resp
}

/// Middleware: security headers. Callback URLs carry authorization codes,
/// so nothing may be cached or leaked through the Referer header.
async fn security_headers_middleware(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    let mut resp = next.run(req).await;
    let headers = resp.headers_mut();

    headers.insert("X-Content-Type-Options", HeaderValue::from_static("nosniff"));
    headers.insert("X-Frame-Options", HeaderValue::from_static("DENY"));
    headers.insert("Cache-Control", HeaderValue::from_static("no-store"));
    headers.insert("Referrer-Policy", HeaderValue::from_static("no-referrer"));
    headers.remove("Server");

    resp
}

async fn handle_binding_command(
    cmd: cli::BindingCommands,
    db: &PgStore,
) -> anyhow::Result<()> {
    match cmd {
        cli::BindingCommands::Set {
            user_id,
            repository,
            path,
            branch,
        } => {
            if [&user_id, &repository, &path, &branch]
                .iter()
                .any(|v| v.is_empty())
            {
                anyhow::bail!("user id, repository, path and branch must all be non-empty");
            }
            let binding = RepositoryBinding {
                repository,
                path,
                branch,
            };
            db.put_binding(&user_id, &binding).await?;
            println!(
                "Binding saved:\n  User:       {}\n  Repository: {}\n  Path:       {}\n  Branch:     {}",
                user_id, binding.repository, binding.path, binding.branch
            );
        }
        cli::BindingCommands::Show { user_id } => match db.get_binding(&user_id).await? {
            Some(b) => println!(
                "{:<20} {:<30} {:<30} {:<15}\n{:<20} {:<30} {:<30} {:<15}",
                "USER", "REPOSITORY", "PATH", "BRANCH", user_id, b.repository, b.path, b.branch
            ),
            None => println!("No binding found for {}.", user_id),
        },
    }
    Ok(())
}
