mod error;
mod repository;
mod schema;

pub use error::DbError;
pub use repository::RasoiDb;
