//! Markers separating writes from reads
//!
//! Every request type implements exactly one of these. Commands change
//! state and run under the ingest/auth write paths; queries only read.

pub trait Command {}

pub trait Query {}
