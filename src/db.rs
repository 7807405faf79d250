pub mod athlete_repository;
pub mod error;
pub mod models;

pub use athlete_repository::{AthleteRepository, SqlDialect};
pub use error::DbError;
pub use models::*;
