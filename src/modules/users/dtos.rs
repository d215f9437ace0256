use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::modules::users::entities::enums::Role;
use crate::modules::users::entities::{instructor_profile, user};
use crate::modules::verification::dtos::SubmissionResponse;

#[derive(Deserialize)]
pub struct StudentRegisterRequest {
    pub email: String,
    pub username: String,
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub uuid: String,
    pub email: String,
    pub username: String,
    pub role: Role,
    pub token: String,
}

impl RegisterResponse {
    pub fn new(user: user::Model, token: String) -> Self {
        Self {
            uuid: user.uuid,
            email: user.email,
            username: user.username,
            role: user.role,
            token,
        }
    }
}

#[derive(Serialize)]
pub struct InstructorRegisterResponse {
    #[serde(flatten)]
    pub user: RegisterResponse,
    pub submission: SubmissionResponse,
}

/// Profile edit payload. Unknown keys are dropped on deserialization, so
/// `is_verified` and the verification timestamps can never arrive here;
/// only the verification service writes those.
#[derive(Deserialize)]
pub struct ProfileUpdateRequest {
    pub bio: Option<String>,
    pub expertise: Option<String>,
}

#[derive(Serialize)]
pub struct InstructorProfileResponse {
    pub uuid: String,
    pub email: String,
    pub username: String,
    pub bio: Option<String>,
    pub expertise: Option<String>,
    pub is_verified: bool,
    pub verification_requested_at: Option<NaiveDateTime>,
}

impl InstructorProfileResponse {
    pub fn new(user: &user::Model, profile: instructor_profile::Model) -> Self {
        Self {
            uuid: user.uuid.clone(),
            email: user.email.clone(),
            username: user.username.clone(),
            bio: profile.bio,
            expertise: profile.expertise,
            is_verified: profile.is_verified,
            verification_requested_at: profile.verification_requested_at,
        }
    }
}
