pub mod api;
pub mod authz;
pub mod config;
pub mod crypto;
pub mod db;
pub mod error;
pub mod forms;
pub mod session;
pub mod templates;
