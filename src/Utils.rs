//! different utility modules used throughout the project
/// logger setup: terminal and optional file output through simplelog
pub mod logger;
