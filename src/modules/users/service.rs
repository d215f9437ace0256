use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    SqlErr, TransactionTrait,
};

use crate::modules::users::entities::{enums::Role, instructor_profile, user};
use crate::shared::error::{AppError, AppResult};

pub struct UserService;

impl UserService {
    pub async fn find_by_uuid(
        db: &DatabaseConnection,
        uuid: &str,
    ) -> AppResult<Option<user::Model>> {
        user::Entity::find()
            .filter(user::Column::Uuid.eq(uuid))
            .one(db)
            .await
            .map_err(AppError::DbError)
    }

    pub async fn instructor_profile(
        db: &DatabaseConnection,
        user_id: i32,
    ) -> AppResult<Option<instructor_profile::Model>> {
        instructor_profile::Entity::find()
            .filter(instructor_profile::Column::UserId.eq(user_id))
            .one(db)
            .await
            .map_err(AppError::DbError)
    }

    pub async fn register_student(
        db: &DatabaseConnection,
        email: &str,
        username: &str,
    ) -> AppResult<user::Model> {
        Self::create_user(db, email, username, Role::Student)
            .await
            .map_err(Self::map_duplicate_email)
    }

    /// Creates the instructor account together with its profile in one
    /// transaction; the caller submits the first verification batch
    /// separately through the verification service.
    pub async fn register_instructor(
        db: &DatabaseConnection,
        email: &str,
        username: &str,
        bio: Option<String>,
        expertise: Option<String>,
    ) -> AppResult<(user::Model, instructor_profile::Model)> {
        let txn = db.begin().await.map_err(AppError::DbError)?;

        let now = chrono::Utc::now().naive_utc();

        let created = user::ActiveModel {
            uuid: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            role: Set(Role::Instructor),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(|e| Self::map_duplicate_email(AppError::DbError(e)))?;

        let profile = instructor_profile::ActiveModel {
            user_id: Set(created.id),
            bio: Set(bio),
            expertise: Set(expertise),
            is_verified: Set(false),
            verification_requested_at: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(AppError::DbError)?;

        txn.commit().await.map_err(AppError::DbError)?;

        Ok((created, profile))
    }

    /// Applies an instructor's profile edit. Only bio and expertise are
    /// writable here; `is_verified` and `verification_requested_at` belong
    /// to the verification service. An empty value clears the field.
    pub async fn update_instructor_profile(
        db: &DatabaseConnection,
        profile: instructor_profile::Model,
        bio: Option<String>,
        expertise: Option<String>,
    ) -> AppResult<instructor_profile::Model> {
        if bio.is_none() && expertise.is_none() {
            return Ok(profile);
        }
        let mut edit: instructor_profile::ActiveModel = profile.into();
        if let Some(bio) = bio {
            edit.bio = Set(Some(bio).filter(|v| !v.trim().is_empty()));
        }
        if let Some(expertise) = expertise {
            edit.expertise = Set(Some(expertise).filter(|v| !v.trim().is_empty()));
        }
        edit.update(db).await.map_err(AppError::DbError)
    }

    async fn create_user(
        db: &DatabaseConnection,
        email: &str,
        username: &str,
        role: Role,
    ) -> AppResult<user::Model> {
        let now = chrono::Utc::now().naive_utc();

        user::ActiveModel {
            uuid: Set(uuid::Uuid::new_v4().to_string()),
            username: Set(username.to_string()),
            email: Set(email.to_string()),
            role: Set(role),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(AppError::DbError)
    }

    fn map_duplicate_email(err: AppError) -> AppError {
        if let AppError::DbError(ref db_err) = err {
            if Self::is_unique_violation(db_err) {
                return AppError::BadRequest(
                    "A user with this email already exists.".to_string(),
                );
            }
        }
        err
    }

    fn is_unique_violation(err: &DbErr) -> bool {
        matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
    }
}
