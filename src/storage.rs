pub mod database;
/// Reading and writing delimited rows.
pub mod flat_file;

pub use database::{Database, FlushError, LoadError};
