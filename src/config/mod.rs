// src/config/mod.rs

//! Configuration loading and validation for sitepipe.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk, falling back to defaults (`loader.rs`).
//! - Validate value ranges and the stage graph (`validate.rs`).
//!
//! The project layout itself is not configurable; see [`crate::paths`].

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, load_or_default};
pub use model::{
    ConfigFile, ConfigSection, CssSection, FontsSection, ImagesSection, JsSection, RawConfigFile,
    ServerSection, StageMap, TaskConfig, WatchSection, default_stages,
};
pub use validate::{validate_config, validate_stages};
