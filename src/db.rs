pub mod client_repo;
pub use client_repo::ClientRepository;
pub mod material_repo;
pub use material_repo::MaterialRepository;
pub mod visit_repo;
pub use visit_repo::VisitRepository;
pub mod stats_repo;
pub use stats_repo::StatsRepository;
