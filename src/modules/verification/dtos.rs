use serde::{Deserialize, Serialize};

use crate::modules::verification::entities::audit_log::{self, AuditAction};
use crate::modules::verification::entities::submission::{self, SubmissionStatus};
use crate::modules::verification::service::{
    SubmissionDetail, SubmissionWithInstructor, VerificationStatus,
};
use crate::modules::users::entities::user;

#[derive(Serialize)]
pub struct SubmissionResponse {
    pub id: i32,
    pub status: SubmissionStatus,
    pub rejection_reason: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<submission::Model> for SubmissionResponse {
    fn from(m: submission::Model) -> Self {
        Self {
            id: m.id,
            status: m.status,
            rejection_reason: m.rejection_reason,
            created_at: m.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub is_verified: bool,
    pub current_submission: Option<SubmissionResponse>,
    pub can_resubmit: bool,
}

impl From<VerificationStatus> for StatusResponse {
    fn from(status: VerificationStatus) -> Self {
        match status {
            VerificationStatus::Verified => Self {
                is_verified: true,
                current_submission: None,
                can_resubmit: false,
            },
            VerificationStatus::Pending(s) => Self {
                is_verified: false,
                current_submission: Some(s.into()),
                can_resubmit: false,
            },
            VerificationStatus::Rejected(s) => Self {
                is_verified: false,
                current_submission: Some(s.into()),
                can_resubmit: true,
            },
            VerificationStatus::NoSubmission => Self {
                is_verified: false,
                current_submission: None,
                can_resubmit: true,
            },
        }
    }
}

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<SubmissionStatus>,
}

#[derive(Serialize)]
pub struct AdminSubmissionResponse {
    pub id: i32,
    pub status: SubmissionStatus,
    pub created_at: chrono::NaiveDateTime,
    pub instructor_email: String,
}

impl From<SubmissionWithInstructor> for AdminSubmissionResponse {
    fn from(row: SubmissionWithInstructor) -> Self {
        Self {
            id: row.submission.id,
            status: row.submission.status,
            created_at: row.submission.created_at,
            instructor_email: row.instructor.email,
        }
    }
}

#[derive(Serialize)]
pub struct DocumentResponse {
    pub id: i32,
    pub file_name: String,
    pub file_ref: String,
    pub uploaded_at: chrono::NaiveDateTime,
}

#[derive(Serialize)]
pub struct AdminSubmissionDetailResponse {
    pub id: i32,
    pub status: SubmissionStatus,
    pub rejection_reason: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub reviewed_at: Option<chrono::NaiveDateTime>,
    pub instructor_email: String,
    pub instructor_username: String,
    pub instructor_bio: Option<String>,
    pub instructor_expertise: Option<String>,
    pub documents: Vec<DocumentResponse>,
}

impl From<SubmissionDetail> for AdminSubmissionDetailResponse {
    fn from(detail: SubmissionDetail) -> Self {
        Self {
            id: detail.submission.id,
            status: detail.submission.status,
            rejection_reason: detail.submission.rejection_reason,
            created_at: detail.submission.created_at,
            reviewed_at: detail.submission.reviewed_at,
            instructor_email: detail.instructor.email,
            instructor_username: detail.instructor.username,
            instructor_bio: detail.profile.bio,
            instructor_expertise: detail.profile.expertise,
            documents: detail
                .documents
                .into_iter()
                .map(|d| DocumentResponse {
                    id: d.id,
                    file_name: d.file_name,
                    file_ref: d.file_ref,
                    uploaded_at: d.uploaded_at,
                })
                .collect(),
        }
    }
}

#[derive(Deserialize)]
pub struct RejectRequest {
    #[serde(default)]
    pub rejection_reason: Option<String>,
}

#[derive(Serialize)]
pub struct AuditLogResponse {
    pub id: i32,
    pub action: AuditAction,
    pub reason: Option<String>,
    pub admin_email: Option<String>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<(audit_log::Model, Option<user::Model>)> for AuditLogResponse {
    fn from((entry, admin): (audit_log::Model, Option<user::Model>)) -> Self {
        Self {
            id: entry.id,
            action: entry.action,
            reason: entry.reason,
            admin_email: admin.map(|a| a.email),
            created_at: entry.created_at,
        }
    }
}
