pub mod queries;
pub mod routes;

pub use routes::summary_routes;
