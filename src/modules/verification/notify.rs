use async_trait::async_trait;
use lettre::message::header::ContentType;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use std::sync::Arc;

use crate::modules::users::entities::user;
use crate::modules::verification::entities::submission::{self, SubmissionStatus};
use crate::shared::config::Config;
use crate::shared::error::{AppError, AppResult};

/// Outbound mail transport boundary. May fail; the dispatcher decides what
/// to do with failures.
#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()>;
}

pub struct SmtpMailer {
    mailer: Option<AsyncSmtpTransport<Tokio1Executor>>,
    from: String,
    app_env: String,
}

impl SmtpMailer {
    pub fn new(config: &Config) -> Self {
        let app_env = config.app_env.clone();

        if app_env == "dev" || app_env == "test" {
            // No SMTP connection in dev/test, messages are logged instead.
            return Self {
                mailer: None,
                from: config.mail_from.clone(),
                app_env,
            };
        }

        let creds = Credentials::new(config.smtp_user.clone(), config.smtp_password.clone());

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&config.smtp_relay)
            .expect("Failed to build mailer")
            .credentials(creds)
            .build();

        Self {
            mailer: Some(mailer),
            from: config.mail_from.clone(),
            app_env,
        }
    }
}

#[async_trait]
impl Mailer for SmtpMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        if self.app_env == "dev" || self.app_env == "test" {
            tracing::info!("[DEV] mail to={} subject={:?} body={:?}", to, subject, body);
            return Ok(());
        }

        let email = Message::builder()
            .from(self.from.parse().map_err(|e| {
                AppError::InternalServerError(format!("Invalid from address: {}", e))
            })?)
            .to(to
                .parse()
                .map_err(|e| AppError::BadRequest(format!("Invalid to address: {}", e)))?)
            .subject(subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body.to_string())
            .map_err(|e| AppError::InternalServerError(format!("Failed to build email: {}", e)))?;

        let mailer = self.mailer.as_ref().ok_or(AppError::InternalServerError(
            "Mailer not initialized in non-dev env".to_string(),
        ))?;

        mailer
            .send(email)
            .await
            .map_err(|e| AppError::InternalServerError(format!("Failed to send email: {}", e)))?;

        Ok(())
    }
}

/// Fire-and-forget side channel for workflow events. Not part of any
/// transactional contract: callers invoke it strictly after their commit,
/// and transport failures are logged and discarded, never surfaced.
pub struct NotificationDispatcher {
    mailer: Arc<dyn Mailer>,
    admin_emails: Vec<String>,
}

impl NotificationDispatcher {
    pub fn new(mailer: Arc<dyn Mailer>, admin_emails: Vec<String>) -> Self {
        Self {
            mailer,
            admin_emails,
        }
    }

    pub async fn instructor_signed_up(&self, instructor: &user::Model) {
        let body = format!("New instructor registered: {}", instructor.email);
        self.broadcast_to_admins("New instructor signup", &body).await;
    }

    pub async fn submission_received(&self, instructor: &user::Model) {
        let body = format!(
            "{} submitted verification documents for review.",
            instructor.email
        );
        self.broadcast_to_admins("New verification submission", &body)
            .await;
    }

    pub async fn decision_recorded(&self, instructor: &user::Model, decided: &submission::Model) {
        let (subject, body) = match decided.status {
            SubmissionStatus::Approved => (
                "Your instructor account has been approved",
                format!(
                    "Hi {},\n\nYour instructor account has been approved.",
                    instructor.username
                ),
            ),
            SubmissionStatus::Rejected => (
                "Your instructor verification was rejected",
                format!(
                    "Hi {},\n\nYour verification request was rejected.\nReason: {}\n\n\
                     Please update your documents and re-submit.",
                    instructor.username,
                    decided.rejection_reason.as_deref().unwrap_or("")
                ),
            ),
            // Only decided submissions reach the dispatcher.
            SubmissionStatus::Pending => return,
        };

        self.dispatch(&instructor.email, subject, &body).await;
    }

    async fn broadcast_to_admins(&self, subject: &str, body: &str) {
        for admin in &self.admin_emails {
            self.dispatch(admin, subject, body).await;
        }
    }

    async fn dispatch(&self, to: &str, subject: &str, body: &str) {
        if let Err(err) = self.mailer.send(to, subject, body).await {
            tracing::warn!("Failed to deliver notification to {}: {}", to, err);
        }
    }
}
