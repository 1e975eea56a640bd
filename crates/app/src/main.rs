use std::{sync::Arc, time::Duration};

use chrono_tz::Tz;
use engine::{DatabaseLedger, NotificationChannel, QueueChannel, WebhookChannel};
use migration::{Migrator, MigratorTrait};
use settings::{Channel, Database};

mod settings;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    let settings = settings::Settings::new()?;
    let mut tasks = tokio::task::JoinSet::new();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "tally={level},server={level},engine={level}",
            level = settings.app.level
        ))
        .init();

    let timezone: Tz = settings
        .ledger
        .timezone
        .parse()
        .map_err(|err| format!("invalid ledger timezone: {err}"))?;

    let Some(server) = settings.server else {
        tracing::warn!("no [server] section configured, nothing to run");
        return Ok(());
    };
    let notifications = settings.notifications;

    tasks.spawn(async move {
        tracing::info!("Found server settings...");
        let db = match parse_database(&server.database).await {
            Ok(db) => db,
            Err(err) => {
                tracing::error!("failed to initialize database: {err}");
                return;
            }
        };

        let mut builder =
            engine::Engine::builder().ledger(DatabaseLedger::new(db.clone()).timezone(timezone));
        if notifications.enabled {
            match build_channel(&notifications.channel, &db) {
                Ok(channel) => builder = builder.channel(channel),
                Err(err) => {
                    tracing::error!("failed to initialize notification channel: {err}");
                    return;
                }
            }
        } else {
            tracing::info!("notifications disabled");
        }

        let engine = match builder.build() {
            Ok(engine) => engine,
            Err(err) => {
                tracing::error!("failed to build engine: {err}");
                return;
            }
        };
        let bind = server.bind.unwrap_or_else(|| "127.0.0.1".to_string());
        let addr = format!("{}:{}", bind, server.port);
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(listener) => listener,
            Err(err) => {
                tracing::error!("failed to bind server listener: {err}");
                return;
            }
        };
        if let Err(err) = server::run_with_listener(engine, listener).await {
            tracing::error!("server failed: {err}");
        }
    });

    while tasks.join_next().await.is_some() {
        tasks.shutdown().await;
    }

    Ok(())
}

fn build_channel(
    config: &Channel,
    db: &sea_orm::DatabaseConnection,
) -> Result<Arc<dyn NotificationChannel>, BoxError> {
    let channel: Arc<dyn NotificationChannel> = match config {
        Channel::Queue { name } => {
            tracing::info!(queue = %name, "notifications go to the queue table");
            Arc::new(QueueChannel::new(db.clone(), name.as_str()))
        }
        Channel::Webhook { url, timeout_ms } => {
            tracing::info!(%url, "notifications go to a webhook");
            Arc::new(WebhookChannel::new(
                url.as_str(),
                Duration::from_millis(*timeout_ms),
            )?)
        }
    };
    Ok(channel)
}

async fn parse_database(config: &Database) -> Result<sea_orm::DatabaseConnection, BoxError> {
    let url = match config {
        // A pool would hand out separate in-memory databases; keep one connection.
        Database::Memory => String::from("sqlite::memory:"),
        Database::Sqlite(path) => format!("sqlite:{}?mode=rwc", path),
        Database::Postgres(url) => url.clone(),
    };

    let mut options = sea_orm::ConnectOptions::new(url);
    if matches!(config, Database::Memory) {
        options.max_connections(1);
    }
    let database = sea_orm::Database::connect(options).await?;
    Migrator::up(&database, None).await?;
    Ok(database)
}
