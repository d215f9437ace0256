pub mod bootstrap;
pub mod db;
pub mod modules;
pub mod routers;
pub mod shared;
