use axum::{
    Json,
    extract::{Multipart, Path, Query, State},
    http::StatusCode,
};
use serde_json::{Value, json};

use crate::modules::auth::service::Claims;
use crate::modules::users::entities::{enums::Role, instructor_profile, user};
use crate::modules::users::service::UserService;
use crate::modules::verification::documents::DocumentUpload;
use crate::modules::verification::dtos::{
    AdminSubmissionDetailResponse, AdminSubmissionResponse, AuditLogResponse, ListQuery,
    RejectRequest, StatusResponse, SubmissionResponse,
};
use crate::shared::error::{AppError, AppResult};
use crate::shared::state::AppState;

/// `POST /verification/submissions`: instructor submits a document batch.
pub async fn submit(
    State(state): State<AppState>,
    claims: Claims,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<SubmissionResponse>)> {
    let (instructor, profile) = instructor_context(&state, &claims).await?;
    let files = collect_documents(multipart).await?;

    let created = state
        .verification
        .create_submission(&instructor, &profile, files)
        .await?;

    Ok((StatusCode::CREATED, Json(created.into())))
}

/// `GET /verification/status`: derived status for the calling instructor.
pub async fn status(
    State(state): State<AppState>,
    claims: Claims,
) -> AppResult<Json<StatusResponse>> {
    let (_, profile) = instructor_context(&state, &claims).await?;
    let status = state.verification.current_status(&profile).await?;
    Ok(Json(status.into()))
}

/// `GET /admin/verification/submissions`: review queue, newest first.
pub async fn admin_list(
    State(state): State<AppState>,
    claims: Claims,
    Query(query): Query<ListQuery>,
) -> AppResult<Json<Vec<AdminSubmissionResponse>>> {
    require_admin(&claims)?;
    let rows = state.verification.list_submissions(query.status).await?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

/// `GET /admin/verification/submissions/:id`
pub async fn admin_detail(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> AppResult<Json<AdminSubmissionDetailResponse>> {
    require_admin(&claims)?;
    let detail = state.verification.submission_detail(id).await?;
    Ok(Json(detail.into()))
}

/// `POST /admin/verification/submissions/:id/approve`
pub async fn admin_approve(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> AppResult<Json<Value>> {
    let admin = admin_context(&state, &claims).await?;
    state.verification.approve(id, &admin).await?;
    Ok(Json(json!({ "detail": "Instructor verified." })))
}

/// `POST /admin/verification/submissions/:id/reject`
pub async fn admin_reject(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
    Json(payload): Json<RejectRequest>,
) -> AppResult<Json<Value>> {
    let admin = admin_context(&state, &claims).await?;
    let reason = payload.rejection_reason.as_deref().unwrap_or("");
    state.verification.reject(id, &admin, reason).await?;
    Ok(Json(json!({ "detail": "Submission rejected." })))
}

/// `GET /admin/verification/submissions/:id/audit`
pub async fn admin_audit(
    State(state): State<AppState>,
    claims: Claims,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<AuditLogResponse>>> {
    require_admin(&claims)?;
    let trail = state.verification.audit_trail(id).await?;
    Ok(Json(trail.into_iter().map(Into::into).collect()))
}

fn require_admin(claims: &Claims) -> AppResult<()> {
    match claims.role {
        Role::Admin => Ok(()),
        Role::Student | Role::Instructor => Err(AppError::Forbidden(
            "Admin role required.".to_string(),
        )),
    }
}

async fn admin_context(state: &AppState, claims: &Claims) -> AppResult<user::Model> {
    require_admin(claims)?;
    UserService::find_by_uuid(&state.db, &claims.sub)
        .await?
        .ok_or(AppError::Unauthorized("Unknown account.".to_string()))
}

/// Resolves the calling instructor and their profile; instructors only ever
/// act on their own profile.
async fn instructor_context(
    state: &AppState,
    claims: &Claims,
) -> AppResult<(user::Model, instructor_profile::Model)> {
    match claims.role {
        Role::Instructor => {}
        Role::Student | Role::Admin => {
            return Err(AppError::Forbidden(
                "Only instructors can access verification.".to_string(),
            ));
        }
    }

    let instructor = UserService::find_by_uuid(&state.db, &claims.sub)
        .await?
        .ok_or(AppError::Unauthorized("Unknown account.".to_string()))?;

    let profile = UserService::instructor_profile(&state.db, instructor.id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok((instructor, profile))
}

pub(crate) async fn collect_documents(mut multipart: Multipart) -> AppResult<Vec<DocumentUpload>> {
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        if field.name() != Some("verification_documents") {
            continue;
        }

        let file_name = field.file_name().unwrap_or("").to_string();
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Failed to read upload: {}", e)))?;

        files.push(DocumentUpload {
            file_name,
            bytes: bytes.to_vec(),
        });
    }

    Ok(files)
}
