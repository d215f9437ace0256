#![allow(dead_code)]

use async_trait::async_trait;
use coursehub_backend::modules::users::entities::{enums::Role, instructor_profile, user};
use coursehub_backend::modules::verification::documents::{BlobStore, DocumentUpload};
use coursehub_backend::modules::verification::notify::{Mailer, NotificationDispatcher};
use coursehub_backend::modules::verification::service::VerificationService;
use coursehub_backend::shared::error::{AppError, AppResult};
use migration::{Migrator, MigratorTrait};
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

pub const ADMIN_LIST: [&str; 2] = ["ops-a@coursehub.dev", "ops-b@coursehub.dev"];

#[derive(Clone, Debug)]
pub struct SentMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<SentMail>>,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<SentMail> {
        self.sent.lock().unwrap().clone()
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, to: &str, subject: &str, body: &str) -> AppResult<()> {
        self.sent.lock().unwrap().push(SentMail {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
        });
        Ok(())
    }
}

pub struct FailingMailer;

#[async_trait]
impl Mailer for FailingMailer {
    async fn send(&self, _to: &str, _subject: &str, _body: &str) -> AppResult<()> {
        Err(AppError::InternalServerError("SMTP down".to_string()))
    }
}

#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBlobStore {
    pub fn len(&self) -> usize {
        self.blobs.lock().unwrap().len()
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn put(&self, file_name: &str, bytes: &[u8]) -> AppResult<String> {
        let mut blobs = self.blobs.lock().unwrap();
        let file_ref = format!("{}_{}", blobs.len(), file_name);
        blobs.insert(file_ref.clone(), bytes.to_vec());
        Ok(file_ref)
    }

    async fn remove(&self, file_ref: &str) {
        self.blobs.lock().unwrap().remove(file_ref);
    }
}

pub struct TestEnv {
    pub db: DatabaseConnection,
    pub service: Arc<VerificationService>,
    pub mailer: Arc<RecordingMailer>,
    pub blobs: Arc<MemoryBlobStore>,
}

pub async fn connect_and_migrate() -> DatabaseConnection {
    // One connection so every query sees the same in-memory database.
    let mut opts = ConnectOptions::new("sqlite::memory:");
    opts.max_connections(1);
    let db = Database::connect(opts).await.expect("sqlite connect");
    Migrator::up(&db, None).await.expect("migrations");
    db
}

pub async fn setup() -> TestEnv {
    let db = connect_and_migrate().await;
    let mailer = Arc::new(RecordingMailer::default());
    let blobs = Arc::new(MemoryBlobStore::default());
    let notifier = Arc::new(NotificationDispatcher::new(
        mailer.clone(),
        ADMIN_LIST.iter().map(|s| s.to_string()).collect(),
    ));
    let service = Arc::new(VerificationService::new(
        db.clone(),
        blobs.clone(),
        notifier,
    ));

    TestEnv {
        db,
        service,
        mailer,
        blobs,
    }
}

pub async fn setup_with_mailer(mailer: Arc<dyn Mailer>) -> (DatabaseConnection, Arc<VerificationService>) {
    let db = connect_and_migrate().await;
    let notifier = Arc::new(NotificationDispatcher::new(
        mailer,
        ADMIN_LIST.iter().map(|s| s.to_string()).collect(),
    ));
    let service = Arc::new(VerificationService::new(
        db.clone(),
        Arc::new(MemoryBlobStore::default()),
        notifier,
    ));
    (db, service)
}

pub async fn seed_user(db: &DatabaseConnection, email: &str, role: Role) -> user::Model {
    let now = chrono::Utc::now().naive_utc();
    user::ActiveModel {
        uuid: Set(uuid::Uuid::new_v4().to_string()),
        username: Set(email.split('@').next().unwrap().to_string()),
        email: Set(email.to_string()),
        role: Set(role),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed user")
}

pub async fn seed_instructor(
    db: &DatabaseConnection,
    email: &str,
) -> (user::Model, instructor_profile::Model) {
    let user = seed_user(db, email, Role::Instructor).await;
    let profile = instructor_profile::ActiveModel {
        user_id: Set(user.id),
        bio: Set(Some("Teaches systems programming".to_string())),
        expertise: Set(Some("Rust".to_string())),
        is_verified: Set(false),
        verification_requested_at: Set(None),
        created_at: Set(chrono::Utc::now().naive_utc()),
        ..Default::default()
    }
    .insert(db)
    .await
    .expect("seed profile");
    (user, profile)
}

pub async fn seed_admin(db: &DatabaseConnection) -> user::Model {
    seed_user(db, "admin@coursehub.dev", Role::Admin).await
}

pub fn doc(name: &str) -> DocumentUpload {
    DocumentUpload {
        file_name: name.to_string(),
        bytes: b"%PDF-1.4 test".to_vec(),
    }
}

pub async fn reload_profile(
    db: &DatabaseConnection,
    id: i32,
) -> instructor_profile::Model {
    use sea_orm::EntityTrait;
    instructor_profile::Entity::find_by_id(id)
        .one(db)
        .await
        .expect("query profile")
        .expect("profile exists")
}
