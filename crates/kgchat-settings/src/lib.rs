//! # kgchat-settings
//!
//! Configuration for the kgchat agents, loaded from three layers (in priority order):
//! 1. **Compiled defaults** ([`KgchatSettings::default()`])
//! 2. **User file** `~/.kgchat/settings.json` (deep-merged over defaults)
//! 3. **Environment variables** (highest priority), e.g. `OPENAI_API_KEY`, `NEO4J_URL`
//!
//! # Usage
//!
//! ```no_run
//! use kgchat_settings::load_settings;
//!
//! let settings = load_settings().unwrap_or_default();
//! println!("model: {}", settings.llm.model);
//! ```

#![deny(unsafe_code)]

pub mod errors;
pub mod loader;
pub mod types;

pub use errors::{Result, SettingsError};
pub use loader::{
    deep_merge, load_settings, load_settings_from_explicit, load_settings_from_path, settings_path,
};
pub use types::*;
