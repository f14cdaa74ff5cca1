pub mod commands;
pub mod queries;
pub mod routes;
pub mod types;

pub use routes::users_routes;
