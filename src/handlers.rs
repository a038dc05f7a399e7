pub mod clients;
pub mod dashboard;
pub mod imports;
pub mod materials;
pub mod visits;
