pub mod commands;
pub mod locks;
pub mod queries;
pub mod routes;

pub use routes::datasets_routes;
