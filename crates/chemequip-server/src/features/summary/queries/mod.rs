pub mod global;

pub use global::{GlobalSummary, GlobalSummaryError, GlobalSummaryQuery};
