use axum::{
    Json,
    extract::{Multipart, State},
    http::StatusCode,
};

use crate::modules::auth::service::{AuthService, Claims};
use crate::modules::users::dtos::{
    InstructorProfileResponse, InstructorRegisterResponse, ProfileUpdateRequest, RegisterResponse,
    StudentRegisterRequest,
};
use crate::modules::users::entities::{enums::Role, instructor_profile, user};
use crate::modules::users::service::UserService;
use crate::modules::verification::documents::{DocumentUpload, validate_document};
use crate::modules::verification::error::VerificationError;
use crate::shared::error::{AppError, AppResult};
use crate::shared::state::AppState;

/// `POST /users/register/student`
pub async fn register_student(
    State(state): State<AppState>,
    Json(payload): Json<StudentRegisterRequest>,
) -> AppResult<(StatusCode, Json<RegisterResponse>)> {
    if payload.email.trim().is_empty() || payload.username.trim().is_empty() {
        return Err(AppError::BadRequest(
            "email and username are required.".to_string(),
        ));
    }

    let user = UserService::register_student(&state.db, &payload.email, &payload.username).await?;
    let token = AuthService::generate_token(&state.config, &user)?;

    Ok((StatusCode::CREATED, Json(RegisterResponse::new(user, token))))
}

/// `POST /users/register/instructor`: multipart account fields plus the
/// first verification document batch.
pub async fn register_instructor(
    State(state): State<AppState>,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<InstructorRegisterResponse>)> {
    let form = parse_instructor_form(multipart).await?;

    if form.files.is_empty() {
        return Err(VerificationError::NoDocuments.into());
    }
    // Gate the batch before touching the database so a bad upload cannot
    // leave behind a half-registered instructor.
    for file in &form.files {
        validate_document(&file.file_name, file.bytes.len())?;
    }

    let (user, profile) = UserService::register_instructor(
        &state.db,
        &form.email,
        &form.username,
        form.bio,
        form.expertise,
    )
    .await?;

    state.notifier.instructor_signed_up(&user).await;

    let submission = state
        .verification
        .create_submission(&user, &profile, form.files)
        .await?;

    let token = AuthService::generate_token(&state.config, &user)?;

    Ok((
        StatusCode::CREATED,
        Json(InstructorRegisterResponse {
            user: RegisterResponse::new(user, token),
            submission: submission.into(),
        }),
    ))
}

/// `GET /users/profile`: the calling instructor's own profile.
pub async fn get_profile(
    State(state): State<AppState>,
    claims: Claims,
) -> AppResult<Json<InstructorProfileResponse>> {
    let (user, profile) = own_profile(&state, &claims).await?;
    Ok(Json(InstructorProfileResponse::new(&user, profile)))
}

/// `PATCH /users/profile`: edit bio and expertise. The verified flag is not
/// part of the payload type, so it cannot be touched from this surface.
pub async fn update_profile(
    State(state): State<AppState>,
    claims: Claims,
    Json(payload): Json<ProfileUpdateRequest>,
) -> AppResult<Json<InstructorProfileResponse>> {
    let (user, profile) = own_profile(&state, &claims).await?;
    let updated =
        UserService::update_instructor_profile(&state.db, profile, payload.bio, payload.expertise)
            .await?;
    Ok(Json(InstructorProfileResponse::new(&user, updated)))
}

async fn own_profile(
    state: &AppState,
    claims: &Claims,
) -> AppResult<(user::Model, instructor_profile::Model)> {
    match claims.role {
        Role::Instructor => {}
        Role::Student | Role::Admin => {
            return Err(AppError::Forbidden(
                "Only instructors have a profile.".to_string(),
            ));
        }
    }

    let user = UserService::find_by_uuid(&state.db, &claims.sub)
        .await?
        .ok_or(AppError::Unauthorized("Unknown account.".to_string()))?;

    let profile = UserService::instructor_profile(&state.db, user.id)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok((user, profile))
}

struct InstructorForm {
    email: String,
    username: String,
    bio: Option<String>,
    expertise: Option<String>,
    files: Vec<DocumentUpload>,
}

async fn parse_instructor_form(mut multipart: Multipart) -> AppResult<InstructorForm> {
    let mut email = None;
    let mut username = None;
    let mut bio = None;
    let mut expertise = None;
    let mut files = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid multipart body: {}", e)))?
    {
        match field.name() {
            Some("email") => email = Some(read_text(field).await?),
            Some("username") => username = Some(read_text(field).await?),
            Some("bio") => bio = Some(read_text(field).await?),
            Some("expertise") => expertise = Some(read_text(field).await?),
            Some("verification_documents") => {
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
            _ => {}
        }
    }

    let email = email
        .filter(|v| !v.trim().is_empty())
        .ok_or(AppError::BadRequest("email is required.".to_string()))?;
    let username = username
        .filter(|v| !v.trim().is_empty())
        .ok_or(AppError::BadRequest("username is required.".to_string()))?;

    Ok(InstructorForm {
        email,
        username,
        bio: bio.filter(|v| !v.is_empty()),
        expertise: expertise.filter(|v| !v.is_empty()),
        files,
    })
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field
        .text()
        .await
        .map_err(|e| AppError::BadRequest(format!("Invalid form field: {}", e)))
}
