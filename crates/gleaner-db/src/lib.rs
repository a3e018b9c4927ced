pub mod config;
pub mod database;
pub mod repository;
pub mod update_repository;

pub use config::DatabaseConfig;
pub use database::Database;
pub use repository::ResultRepository;
pub use update_repository::UpdateRepository;
