pub mod enums;
pub mod instructor_profile;
pub mod user;
