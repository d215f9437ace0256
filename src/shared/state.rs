use crate::modules::verification::notify::NotificationDispatcher;
use crate::modules::verification::service::VerificationService;
use crate::shared::config::Config;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub db: DatabaseConnection,
    pub verification: Arc<VerificationService>,
    pub notifier: Arc<NotificationDispatcher>,
}
