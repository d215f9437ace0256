pub mod documents;
pub mod dtos;
pub mod entities;
pub mod error;
pub mod handlers;
pub mod notify;
pub mod router;
pub mod service;
