pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod handlers;
pub mod models;
pub mod services;

// Exposto para os testes de integração rodarem o schema em sqlite::memory:.
pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();
