pub mod catalog;
pub mod import;
pub mod stats;
pub mod visit;
