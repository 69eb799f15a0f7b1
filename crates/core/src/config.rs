//! Process configuration, built once at startup.
//!
//! Values come from the process environment, optionally seeded from a
//! `.env` file in the working directory.

use crate::{Error, Result};
use std::path::PathBuf;

/// Environment variable holding the Gemini API key.
pub const API_KEY_VAR: &str = "GOOGLE_API_KEY";

/// Default generation model.
pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";

/// Default Gemini REST endpoint.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// Style template picked up from the working directory.
pub const DEFAULT_TEMPLATE: &str = "template.pptx";

/// Configuration shared by every component.
#[derive(Debug, Clone)]
pub struct Config {
    /// Gemini API key, if one is configured.
    pub api_key: Option<String>,

    /// Model used for content generation.
    pub model: String,

    /// Base URL of the Gemini REST API.
    pub api_base: String,

    /// Pandoc executable to try first.
    pub pandoc: PathBuf,

    /// Where a downloaded pandoc is installed. `None` uses the platform data dir.
    pub pandoc_install_dir: Option<PathBuf>,

    /// Style reference deck, used only if it exists.
    pub template: PathBuf,

    /// Log the models available to the key on startup.
    pub list_models: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            api_base: DEFAULT_API_BASE.to_string(),
            pandoc: PathBuf::from("pandoc"),
            pandoc_install_dir: None,
            template: PathBuf::from(DEFAULT_TEMPLATE),
            list_models: false,
        }
    }
}

impl Config {
    /// Load `.env` from the working directory, then read the environment.
    pub fn load() -> Result<Self> {
        match dotenvy::dotenv() {
            Ok(path) => log::debug!("Loaded environment from {}", path.display()),
            Err(e) if e.not_found() => {}
            Err(e) => return Err(Error::Config(format!("failed to load .env: {}", e))),
        }
        Self::from_env()
    }

    /// Build a configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a configuration from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        config.api_key = get(API_KEY_VAR);
        if let Some(model) = get("GEMINI_MODEL") {
            config.model = model;
        }
        if let Some(base) = get("GEMINI_API_BASE") {
            config.api_base = base.trim_end_matches('/').to_string();
        }
        if let Some(pandoc) = get("PANDOC") {
            config.pandoc = PathBuf::from(pandoc);
        }
        config.pandoc_install_dir = get("SLIDESGPT_PANDOC_DIR").map(PathBuf::from);
        if let Some(template) = get("SLIDESGPT_TEMPLATE") {
            config.template = PathBuf::from(template);
        }
        if let Some(flag) = get("SLIDESGPT_LIST_MODELS") {
            config.list_models = parse_flag(&flag)?;
        }

        Ok(config)
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the generation model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the API base URL.
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = base.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the pandoc executable.
    pub fn with_pandoc(mut self, pandoc: impl Into<PathBuf>) -> Self {
        self.pandoc = pandoc.into();
        self
    }

    /// Set the pandoc install directory.
    pub fn with_pandoc_install_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.pandoc_install_dir = Some(dir.into());
        self
    }

    /// Set the style template path.
    pub fn with_template(mut self, template: impl Into<PathBuf>) -> Self {
        self.template = template.into();
        self
    }

    /// Enable or disable model listing on startup.
    pub fn with_list_models(mut self, list: bool) -> Self {
        self.list_models = list;
        self
    }

    /// The API key, or [`Error::MissingApiKey`].
    pub fn require_api_key(&self) -> Result<&str> {
        self.api_key.as_deref().ok_or(Error::MissingApiKey)
    }
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(Error::Config(format!(
            "SLIDESGPT_LIST_MODELS must be a boolean, got '{}'",
            other
        ))),
    }
}
