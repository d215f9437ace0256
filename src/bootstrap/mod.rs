use crate::db;
use crate::modules::verification::documents::FsBlobStore;
use crate::modules::verification::notify::{NotificationDispatcher, SmtpMailer};
use crate::modules::verification::service::VerificationService;
use crate::shared::{config::Config, state::AppState};
use std::sync::Arc;

pub async fn create_app_state(config: &Config) -> AppState {
    let db_conn = db::connect(config)
        .await
        .expect("Failed to connect to database");

    tracing::info!("Connected to database");

    let blobs = Arc::new(FsBlobStore::new(config.document_store_dir.clone()));
    let mailer = Arc::new(SmtpMailer::new(config));
    let notifier = Arc::new(NotificationDispatcher::new(
        mailer,
        config.admin_emails.clone(),
    ));
    let verification = Arc::new(VerificationService::new(
        db_conn.clone(),
        blobs,
        notifier.clone(),
    ));

    AppState {
        config: Arc::new(config.clone()),
        db: db_conn,
        verification,
        notifier,
    }
}
