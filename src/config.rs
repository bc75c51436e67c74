//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/lorewiki/lorewiki.toml`
//! 3. Project config: `./wiki.toml` or the file given with `--config`
//! 4. Environment variables: `LOREWIKI_*` prefix
//! 5. Command-line flags (applied by the caller via [`Settings::override_with`])

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::application::ApplicationError;

/// Name of the project-local config file.
pub const PROJECT_CONFIG_FILE: &str = "wiki.toml";

/// Unified configuration for lorewiki.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Directory holding the YAML documents
    pub lib_dir: PathBuf,
    /// Directory the generated site is written to (replaced on every build)
    pub output_dir: PathBuf,
    /// Tree path of the generated timeline page
    pub timeline_node: String,
    /// Name of the link reference file inside `output_dir`
    pub links_file: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lib_dir: PathBuf::from("./lib"),
            output_dir: PathBuf::from("./docs"),
            timeline_node: "General/Timeline".into(),
            links_file: "links.md".into(),
        }
    }
}

/// Raw settings for intermediate parsing (`None` means "not specified").
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub lib_dir: Option<PathBuf>,
    pub output_dir: Option<PathBuf>,
    pub timeline_node: Option<String>,
    pub links_file: Option<String>,
}

/// Get the XDG config directory for lorewiki.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "lorewiki").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("lorewiki.toml"))
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables are left as written.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(raw.as_ref()) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(e) => {
            debug!("cannot expand {}: {}", raw, e);
            path.to_path_buf()
        }
    }
}

impl Settings {
    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.lib_dir = expand_path(&self.lib_dir);
        self.output_dir = expand_path(&self.output_dir);
    }

    /// Overlay config onto self: specified values win.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            lib_dir: overlay
                .lib_dir
                .clone()
                .unwrap_or_else(|| self.lib_dir.clone()),
            output_dir: overlay
                .output_dir
                .clone()
                .unwrap_or_else(|| self.output_dir.clone()),
            timeline_node: overlay
                .timeline_node
                .clone()
                .unwrap_or_else(|| self.timeline_node.clone()),
            links_file: overlay
                .links_file
                .clone()
                .unwrap_or_else(|| self.links_file.clone()),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_config` - Explicit project config file. Without it,
    ///   `./wiki.toml` is used when present.
    pub fn load(project_config: Option<&Path>) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                current = current.merge_with(&load_raw_settings(&global_path)?);
            }
        }

        match project_config {
            Some(path) => {
                if !path.exists() {
                    return Err(ApplicationError::Config {
                        message: format!("config file not found: {}", path.display()),
                    });
                }
                current = current.merge_with(&load_raw_settings(path)?);
            }
            None => {
                let local = Path::new(PROJECT_CONFIG_FILE);
                if local.exists() {
                    debug!("loading project config {}", local.display());
                    current = current.merge_with(&load_raw_settings(local)?);
                }
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply LOREWIKI_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(Environment::with_prefix("LOREWIKI").separator("__"))
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("lib_dir") {
            settings.lib_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("output_dir") {
            settings.output_dir = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("timeline_node") {
            settings.timeline_node = val;
        }
        if let Ok(val) = config.get_string("links_file") {
            settings.links_file = val;
        }

        Ok(settings)
    }

    /// Apply command-line values; an override of a differing value is logged.
    pub fn override_with(&mut self, lib_dir: Option<&Path>, output_dir: Option<&Path>) {
        if let Some(lib) = lib_dir {
            let lib = expand_path(lib);
            if lib != self.lib_dir {
                warn!(
                    "lib_dir {} overridden by command line: {}",
                    self.lib_dir.display(),
                    lib.display()
                );
            }
            self.lib_dir = lib;
        }
        if let Some(out) = output_dir {
            let out = expand_path(out);
            if out != self.output_dir {
                warn!(
                    "output_dir {} overridden by command line: {}",
                    self.output_dir.display(),
                    out.display()
                );
            }
            self.output_dir = out;
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# lorewiki configuration
#
# Locations (by precedence, lowest to highest):
#   Global:  ~/.config/lorewiki/lorewiki.toml
#   Project: ./wiki.toml (or --config <file>)
#   Env:     LOREWIKI_* environment variables
#   Flags:   --lib / --output on the command line

# Directory holding the YAML documents
# lib_dir = "./lib"

# Directory the site is generated into (removed and recreated on build)
# output_dir = "./docs"

# Tree path of the generated timeline page
# timeline_node = "General/Timeline"

# Link reference file written into output_dir
# links_file = "links.md"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
