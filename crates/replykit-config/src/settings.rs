//! Read-only boundary to persisted settings.

use std::path::PathBuf;

use tracing::warn;

use crate::loader::ConfigLoader;
use crate::schema::{Config, ReplyTemplate};

/// Source of the user settings the engine reads before each request.
///
/// The engine never writes settings; whichever component owns the store
/// (popup form, config file, test fixture) stays in charge of mutation.
pub trait SettingsSource: Send + Sync {
    /// Base URL of the reply-generation service.
    fn api_url(&self) -> String;

    /// Saved reply templates.
    fn templates(&self) -> Vec<ReplyTemplate>;
}

impl SettingsSource for Config {
    fn api_url(&self) -> String {
        self.service.api_url.clone()
    }

    fn templates(&self) -> Vec<ReplyTemplate> {
        self.templates.clone()
    }
}

/// Settings re-read from a TOML file on every access.
///
/// An unreadable or invalid file degrades to built-in defaults so a broken
/// edit never blocks a reply.
#[derive(Debug, Clone)]
pub struct FileSettings {
    path: PathBuf,
}

impl FileSettings {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn read(&self) -> Config {
        match ConfigLoader::load_or_default(&self.path) {
            Ok(config) => config,
            Err(e) => {
                warn!("Failed to read settings from {}: {}", self.path.display(), e);
                Config::default()
            }
        }
    }
}

impl SettingsSource for FileSettings {
    fn api_url(&self) -> String {
        self.read().service.api_url
    }

    fn templates(&self) -> Vec<ReplyTemplate> {
        self.read().templates
    }
}
