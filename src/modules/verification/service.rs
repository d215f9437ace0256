use chrono::NaiveDateTime;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    QueryFilter, QueryOrder, Set, SqlErr, TransactionTrait,
};
use std::collections::HashMap;
use std::sync::Arc;

use crate::modules::users::entities::{instructor_profile, user};
use crate::modules::verification::documents::{BlobStore, DocumentUpload, validate_document};
use crate::modules::verification::entities::audit_log::{self, AuditAction};
use crate::modules::verification::entities::document;
use crate::modules::verification::entities::submission::{self, SubmissionStatus};
use crate::modules::verification::error::VerificationError;
use crate::modules::verification::notify::NotificationDispatcher;
use crate::shared::error::{AppError, AppResult};

/// Derived verification state of a profile. Never persisted; computed from
/// `is_verified` and the submission history on every read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VerificationStatus {
    Verified,
    Pending(submission::Model),
    Rejected(submission::Model),
    NoSubmission,
}

/// Submission joined with its owning profile and instructor account, as the
/// admin review surface presents it.
pub struct SubmissionWithInstructor {
    pub submission: submission::Model,
    pub profile: instructor_profile::Model,
    pub instructor: user::Model,
}

#[derive(Debug)]
pub struct SubmissionDetail {
    pub submission: submission::Model,
    pub profile: instructor_profile::Model,
    pub instructor: user::Model,
    pub documents: Vec<document::Model>,
}

/// Orchestrates the verification workflow: submission creation with the
/// one-pending-per-profile invariant, the pending -> approved/rejected
/// state machine, audit logging and post-commit notifications.
pub struct VerificationService {
    db: DatabaseConnection,
    blobs: Arc<dyn BlobStore>,
    notifier: Arc<NotificationDispatcher>,
}

impl VerificationService {
    pub fn new(
        db: DatabaseConnection,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<NotificationDispatcher>,
    ) -> Self {
        Self {
            db,
            blobs,
            notifier,
        }
    }

    /// Creates one submission with its document batch, all-or-nothing.
    /// Fails before persisting anything if the profile is already verified,
    /// a pending submission exists, the batch is empty, or any file fails
    /// validation.
    pub async fn create_submission(
        &self,
        instructor: &user::Model,
        profile: &instructor_profile::Model,
        files: Vec<DocumentUpload>,
    ) -> AppResult<submission::Model> {
        if files.is_empty() {
            return Err(VerificationError::NoDocuments.into());
        }

        // The whole batch must validate before a single byte is stored.
        for file in &files {
            validate_document(&file.file_name, file.bytes.len())?;
        }

        if profile.is_verified {
            return Err(VerificationError::AlreadyVerified.into());
        }

        let mut stored: Vec<(String, String)> = Vec::with_capacity(files.len());
        for file in &files {
            let file_ref = self.blobs.put(&file.file_name, &file.bytes).await?;
            stored.push((file_ref, file.file_name.clone()));
        }

        match self.persist_submission(profile.id, &stored).await {
            Ok(created) => {
                // Post-commit only: the transition is durable at this point.
                self.notifier.submission_received(instructor).await;
                Ok(created)
            }
            Err(err) => {
                for (file_ref, _) in &stored {
                    self.blobs.remove(file_ref).await;
                }
                Err(err)
            }
        }
    }

    async fn persist_submission(
        &self,
        profile_id: i32,
        stored: &[(String, String)],
    ) -> AppResult<submission::Model> {
        let txn = self.db.begin().await.map_err(AppError::DbError)?;

        // Re-read inside the transaction; the caller's snapshot may be stale.
        let profile = instructor_profile::Entity::find_by_id(profile_id)
            .one(&txn)
            .await
            .map_err(AppError::DbError)?
            .ok_or(AppError::NotFound)?;

        if profile.is_verified {
            return Err(VerificationError::AlreadyVerified.into());
        }

        let pending = submission::Entity::find()
            .filter(submission::Column::ProfileId.eq(profile_id))
            .filter(submission::Column::Status.eq(SubmissionStatus::Pending))
            .one(&txn)
            .await
            .map_err(AppError::DbError)?;

        if pending.is_some() {
            return Err(VerificationError::DuplicatePending.into());
        }

        let now = chrono::Utc::now().naive_utc();

        let created = submission::ActiveModel {
            profile_id: Set(profile_id),
            status: Set(SubmissionStatus::Pending),
            rejection_reason: Set(None),
            created_at: Set(now),
            reviewed_at: Set(None),
            ..Default::default()
        }
        .insert(&txn)
        .await
        // The partial unique index is the backstop for racing creations:
        // the loser surfaces DuplicatePending, never a silent success.
        .map_err(Self::map_pending_conflict)?;

        for (file_ref, file_name) in stored {
            document::ActiveModel {
                submission_id: Set(created.id),
                file_ref: Set(file_ref.clone()),
                file_name: Set(file_name.clone()),
                uploaded_at: Set(now),
                ..Default::default()
            }
            .insert(&txn)
            .await
            .map_err(AppError::DbError)?;
        }

        let mut profile: instructor_profile::ActiveModel = profile.into();
        profile.verification_requested_at = Set(Some(now));
        profile.update(&txn).await.map_err(AppError::DbError)?;

        txn.commit().await.map_err(AppError::DbError)?;

        Ok(created)
    }

    fn map_pending_conflict(err: DbErr) -> AppError {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            VerificationError::DuplicatePending.into()
        } else {
            AppError::DbError(err)
        }
    }

    /// Derived status read, mirroring what the instructor self-service
    /// surface reports.
    pub async fn current_status(
        &self,
        profile: &instructor_profile::Model,
    ) -> AppResult<VerificationStatus> {
        if profile.is_verified {
            return Ok(VerificationStatus::Verified);
        }

        let pending = submission::Entity::find()
            .filter(submission::Column::ProfileId.eq(profile.id))
            .filter(submission::Column::Status.eq(SubmissionStatus::Pending))
            .order_by_desc(submission::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(AppError::DbError)?;

        if let Some(found) = pending {
            return Ok(VerificationStatus::Pending(found));
        }

        let rejected = submission::Entity::find()
            .filter(submission::Column::ProfileId.eq(profile.id))
            .filter(submission::Column::Status.eq(SubmissionStatus::Rejected))
            .order_by_desc(submission::Column::CreatedAt)
            .one(&self.db)
            .await
            .map_err(AppError::DbError)?;

        if let Some(found) = rejected {
            return Ok(VerificationStatus::Rejected(found));
        }

        Ok(VerificationStatus::NoSubmission)
    }

    /// pending -> approved. Also flips the profile to verified and appends
    /// the audit entry, all in one transaction.
    pub async fn approve(
        &self,
        submission_id: i32,
        admin: &user::Model,
    ) -> AppResult<submission::Model> {
        let txn = self.db.begin().await.map_err(AppError::DbError)?;

        let found = submission::Entity::find_by_id(submission_id)
            .one(&txn)
            .await
            .map_err(AppError::DbError)?
            .ok_or(VerificationError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();

        Self::flip_pending(
            &txn,
            submission_id,
            SubmissionStatus::Approved,
            None,
            now,
        )
        .await?;

        let profile = instructor_profile::Entity::find_by_id(found.profile_id)
            .one(&txn)
            .await
            .map_err(AppError::DbError)?
            .ok_or(AppError::NotFound)?;
        let instructor_user_id = profile.user_id;

        let mut profile: instructor_profile::ActiveModel = profile.into();
        profile.is_verified = Set(true);
        profile.update(&txn).await.map_err(AppError::DbError)?;

        audit_log::ActiveModel {
            submission_id: Set(submission_id),
            admin_id: Set(Some(admin.id)),
            action: Set(AuditAction::Approved),
            reason: Set(None),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(AppError::DbError)?;

        txn.commit().await.map_err(AppError::DbError)?;

        let decided = submission::Model {
            status: SubmissionStatus::Approved,
            rejection_reason: None,
            reviewed_at: Some(now),
            ..found
        };

        self.notify_decision(instructor_user_id, &decided).await;

        Ok(decided)
    }

    /// pending -> rejected. The submission and its documents are retained
    /// as history; a new submission becomes legal immediately afterwards.
    pub async fn reject(
        &self,
        submission_id: i32,
        admin: &user::Model,
        reason: &str,
    ) -> AppResult<submission::Model> {
        let reason = reason.trim();
        if reason.is_empty() {
            return Err(VerificationError::MissingReason.into());
        }

        let txn = self.db.begin().await.map_err(AppError::DbError)?;

        let found = submission::Entity::find_by_id(submission_id)
            .one(&txn)
            .await
            .map_err(AppError::DbError)?
            .ok_or(VerificationError::NotFound)?;

        let now = chrono::Utc::now().naive_utc();

        Self::flip_pending(
            &txn,
            submission_id,
            SubmissionStatus::Rejected,
            Some(reason.to_string()),
            now,
        )
        .await?;

        let profile = instructor_profile::Entity::find_by_id(found.profile_id)
            .one(&txn)
            .await
            .map_err(AppError::DbError)?
            .ok_or(AppError::NotFound)?;
        let instructor_user_id = profile.user_id;

        audit_log::ActiveModel {
            submission_id: Set(submission_id),
            admin_id: Set(Some(admin.id)),
            action: Set(AuditAction::Rejected),
            reason: Set(Some(reason.to_string())),
            created_at: Set(now),
            ..Default::default()
        }
        .insert(&txn)
        .await
        .map_err(AppError::DbError)?;

        txn.commit().await.map_err(AppError::DbError)?;

        let decided = submission::Model {
            status: SubmissionStatus::Rejected,
            rejection_reason: Some(reason.to_string()),
            reviewed_at: Some(now),
            ..found
        };

        self.notify_decision(instructor_user_id, &decided).await;

        Ok(decided)
    }

    /// Conditional flip out of `pending`, enforced by the storage layer:
    /// the UPDATE carries the prior-state predicate, so of two concurrent
    /// decisions exactly one affects a row and the other sees InvalidState.
    async fn flip_pending(
        txn: &DatabaseTransaction,
        submission_id: i32,
        to: SubmissionStatus,
        reason: Option<String>,
        reviewed_at: NaiveDateTime,
    ) -> AppResult<()> {
        let updated = submission::Entity::update_many()
            .col_expr(submission::Column::Status, Expr::value(to))
            .col_expr(
                submission::Column::ReviewedAt,
                Expr::value(Some(reviewed_at)),
            )
            .col_expr(submission::Column::RejectionReason, Expr::value(reason))
            .filter(submission::Column::Id.eq(submission_id))
            .filter(submission::Column::Status.eq(SubmissionStatus::Pending))
            .exec(txn)
            .await
            .map_err(AppError::DbError)?;

        if updated.rows_affected == 0 {
            return Err(VerificationError::InvalidState.into());
        }

        Ok(())
    }

    /// Notification reads happen outside the decision transaction; a
    /// failure here must not taint an already-committed decision.
    async fn notify_decision(&self, instructor_user_id: i32, decided: &submission::Model) {
        match user::Entity::find_by_id(instructor_user_id).one(&self.db).await {
            Ok(Some(instructor)) => {
                self.notifier.decision_recorded(&instructor, decided).await;
            }
            Ok(None) => {}
            Err(err) => {
                tracing::warn!("Skipping decision notification: {}", err);
            }
        }
    }

    /// Admin listing, newest first, optionally filtered by status. Profiles
    /// come in through the join and accounts in one batched fetch.
    pub async fn list_submissions(
        &self,
        status: Option<SubmissionStatus>,
    ) -> AppResult<Vec<SubmissionWithInstructor>> {
        let mut query = submission::Entity::find();
        if let Some(status) = status {
            query = query.filter(submission::Column::Status.eq(status));
        }
        let joined = query
            .order_by_desc(submission::Column::CreatedAt)
            .find_also_related(instructor_profile::Entity)
            .all(&self.db)
            .await
            .map_err(AppError::DbError)?;

        let user_ids: Vec<i32> = joined
            .iter()
            .filter_map(|(_, profile)| profile.as_ref().map(|p| p.user_id))
            .collect();
        let instructors: HashMap<i32, user::Model> = user::Entity::find()
            .filter(user::Column::Id.is_in(user_ids))
            .all(&self.db)
            .await
            .map_err(AppError::DbError)?
            .into_iter()
            .map(|instructor| (instructor.id, instructor))
            .collect();

        let mut rows = Vec::with_capacity(joined.len());
        for (found, profile) in joined {
            let profile = profile.ok_or(AppError::NotFound)?;
            let instructor = instructors
                .get(&profile.user_id)
                .cloned()
                .ok_or(AppError::NotFound)?;
            rows.push(SubmissionWithInstructor {
                submission: found,
                profile,
                instructor,
            });
        }

        Ok(rows)
    }

    pub async fn submission_detail(&self, submission_id: i32) -> AppResult<SubmissionDetail> {
        let found = submission::Entity::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(AppError::DbError)?
            .ok_or(VerificationError::NotFound)?;

        let documents = document::Entity::find()
            .filter(document::Column::SubmissionId.eq(submission_id))
            .order_by_asc(document::Column::UploadedAt)
            .all(&self.db)
            .await
            .map_err(AppError::DbError)?;

        let (profile, instructor) = self.instructor_of(found.profile_id).await?;

        Ok(SubmissionDetail {
            submission: found,
            profile,
            instructor,
            documents,
        })
    }

    /// Audit trail for one submission, oldest first, with the deciding
    /// admin attached where the account still exists.
    pub async fn audit_trail(
        &self,
        submission_id: i32,
    ) -> AppResult<Vec<(audit_log::Model, Option<user::Model>)>> {
        submission::Entity::find_by_id(submission_id)
            .one(&self.db)
            .await
            .map_err(AppError::DbError)?
            .ok_or(VerificationError::NotFound)?;

        audit_log::Entity::find()
            .filter(audit_log::Column::SubmissionId.eq(submission_id))
            .order_by_asc(audit_log::Column::CreatedAt)
            .find_also_related(user::Entity)
            .all(&self.db)
            .await
            .map_err(AppError::DbError)
    }

    async fn instructor_of(
        &self,
        profile_id: i32,
    ) -> AppResult<(instructor_profile::Model, user::Model)> {
        let profile = instructor_profile::Entity::find_by_id(profile_id)
            .one(&self.db)
            .await
            .map_err(AppError::DbError)?
            .ok_or(AppError::NotFound)?;

        let instructor = user::Entity::find_by_id(profile.user_id)
            .one(&self.db)
            .await
            .map_err(AppError::DbError)?
            .ok_or(AppError::NotFound)?;

        Ok((profile, instructor))
    }
}
