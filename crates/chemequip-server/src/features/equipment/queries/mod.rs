pub mod list;

pub use list::{ListEquipmentError, ListEquipmentQuery};
