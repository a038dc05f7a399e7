pub mod config;
pub use config::AppState;
