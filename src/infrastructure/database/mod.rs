pub mod connection;
pub mod line_repo;
pub mod poem_repo;
pub mod utils;

pub use connection::DatabaseConnection;
pub use line_repo::LineRepositoryImpl;
pub use poem_repo::PoemRepositoryImpl;
