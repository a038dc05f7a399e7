pub mod catalog_service;
pub mod commit_service;
pub mod entity_resolver;
pub mod excel_service;
pub mod import_service;
pub mod row_validator;
pub mod session_service;
pub mod stats_service;
pub mod vision_service;
pub mod visit_service;

pub use catalog_service::CatalogService;
pub use commit_service::CommitEngine;
pub use entity_resolver::EntityResolver;
pub use excel_service::ExcelImportService;
pub use import_service::ImportService;
pub use row_validator::RowValidator;
pub use session_service::SessionStore;
pub use stats_service::StatsService;
pub use vision_service::{GeminiVision, OcrImportService, UnconfiguredVision, VisionBackend};
pub use visit_service::VisitService;
