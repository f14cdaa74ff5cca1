pub mod queries;
pub mod routes;

pub use routes::equipment_routes;
