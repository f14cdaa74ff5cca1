pub mod me;

pub use me::{GetCurrentUserError, GetCurrentUserQuery};
