use std::sync::Arc;

use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    config::{AppConfig, JwtConfig},
    db,
    notifier::{LogMailer, Mailer, Outbox, SmtpMailer},
    storage::{LocalStorage, StorageClient},
};

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub storage: Arc<dyn StorageClient>,
    pub outbox: Outbox,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let db = db::open(&config.database_url).await?;

        let storage = Arc::new(LocalStorage::new(&config.public_dir)) as Arc<dyn StorageClient>;

        let mailer = match &config.smtp {
            Some(smtp) => {
                info!(host = %smtp.host, from = %smtp.from, "smtp mailer configured");
                Arc::new(SmtpMailer::new(smtp)?) as Arc<dyn Mailer>
            }
            None => {
                warn!("SMTP_USERNAME/SMTP_PASSWORD not set; emails will only be logged");
                Arc::new(LogMailer) as Arc<dyn Mailer>
            }
        };

        Ok(Self::from_parts(db, config, storage, mailer))
    }

    pub fn from_parts(
        db: SqlitePool,
        config: Arc<AppConfig>,
        storage: Arc<dyn StorageClient>,
        mailer: Arc<dyn Mailer>,
    ) -> Self {
        Self {
            db,
            config,
            storage,
            outbox: Outbox::new(mailer),
        }
    }

    /// Configuration for tests and local experiments: in-memory database,
    /// a fixed JWT secret, no SMTP.
    pub fn test_config(public_dir: impl Into<std::path::PathBuf>) -> AppConfig {
        AppConfig {
            host: "127.0.0.1".into(),
            port: 0,
            database_url: "sqlite::memory:".into(),
            jwt: JwtConfig {
                secret: "test".into(),
                issuer: "test".into(),
                audience: "test".into(),
                ttl_minutes: 5,
            },
            smtp: None,
            public_dir: public_dir.into(),
            public_base_url: "http://localhost:8080".into(),
        }
    }

    /// Fully wired state over an in-memory database and a logging mailer.
    pub async fn fake(public_dir: impl Into<std::path::PathBuf>) -> anyhow::Result<Self> {
        let config = Arc::new(Self::test_config(public_dir));
        let db = db::open(&config.database_url).await?;
        let storage = Arc::new(LocalStorage::new(&config.public_dir)) as Arc<dyn StorageClient>;
        Ok(Self::from_parts(db, config, storage, Arc::new(LogMailer)))
    }
}
