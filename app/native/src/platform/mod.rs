//! Platform helpers: well-known paths and user path expansion.

pub mod path;
