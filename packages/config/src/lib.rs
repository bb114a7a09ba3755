// ABOUTME: Configuration package for Vitrine
// ABOUTME: Environment variable names and parsing helpers shared by all packages

pub mod constants;
pub mod env;

pub use env::{parse_env_or_default, parse_env_or_default_with_validation, parse_optional_env};
