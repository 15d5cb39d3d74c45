//! Configuration loading, env substitution, and validation.
//!
//! Config files: `rollcall.toml`, `rollcall.yaml`, `rollcall.yml` or
//! `rollcall.json`, searched in `./` then the user config directory.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{apply_env_overrides, config_dir, discover_and_load, find_config_file, load_config},
    schema::{ChecksConfig, RollcallConfig},
    validate::{Diagnostic, Severity, ValidationResult},
};
