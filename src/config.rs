//! Runtime configuration: the fixed color palette teams draw from.

use std::{env, fs, io::ErrorKind, path::PathBuf};

use serde::Deserialize;
use tracing::{info, warn};

/// Default location on disk where the console looks for the JSON palette.
const DEFAULT_CONFIG_PATH: &str = "config/palette.json";
/// Environment variable that overrides [`DEFAULT_CONFIG_PATH`].
const CONFIG_PATH_ENV: &str = "QUIZMASTER_CONFIG_PATH";
/// Fallback color returned when the palette is exhausted.
const FALLBACK_COLOR: &str = "#9e9e9e";

#[derive(Debug, Clone)]
/// Immutable team color palette shared across the application.
pub struct Palette {
    colors: Vec<String>,
}

impl Palette {
    /// Load the palette from disk, falling back to the baked-in default set.
    pub fn load() -> Self {
        let path = resolve_config_path();
        match fs::read_to_string(&path) {
            Ok(contents) => match serde_json::from_str::<RawConfig>(&contents) {
                Ok(raw) => {
                    let palette = Self { colors: raw.colors };
                    info!(
                        path = %path.display(),
                        count = palette.colors.len(),
                        "loaded team color palette from config"
                    );
                    palette
                }
                Err(err) => {
                    warn!(
                        path = %path.display(),
                        error = %err,
                        "failed to parse palette config; falling back to defaults"
                    );
                    Self::default()
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!(
                    path = %path.display(),
                    "palette config not found; using built-in defaults"
                );
                Self::default()
            }
            Err(err) => {
                warn!(
                    path = %path.display(),
                    error = %err,
                    "failed to read palette config; falling back to defaults"
                );
                Self::default()
            }
        }
    }

    /// All palette entries in order.
    pub fn colors(&self) -> &[String] {
        &self.colors
    }

    /// Return the first palette color that is not already listed in `used`.
    ///
    /// When every entry is taken we wrap around to [`FALLBACK_COLOR`] so
    /// callers always receive a value; distinctness is advisory anyway.
    pub fn first_unused_color(&self, used: &[String]) -> String {
        self.colors
            .iter()
            .find(|candidate| !used.contains(candidate))
            .cloned()
            .unwrap_or_else(|| FALLBACK_COLOR.to_string())
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            colors: default_colors(),
        }
    }
}

#[derive(Debug, Deserialize)]
/// JSON representation of the palette file at [`DEFAULT_CONFIG_PATH`].
struct RawConfig {
    colors: Vec<String>,
}

/// Resolve the configuration path taking the environment override into account.
fn resolve_config_path() -> PathBuf {
    env::var_os(CONFIG_PATH_ENV)
        .map(PathBuf::from)
        .filter(|path| !path.as_os_str().is_empty())
        .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_PATH))
}

/// Built-in palette shipped with the crate.
fn default_colors() -> Vec<String> {
    [
        "#e53935", "#1e88e5", "#43a047", "#fdd835", "#8e24aa", "#fb8c00", "#00acc1", "#d81b60",
        "#6d4c41", "#3949ab", "#7cb342", "#f4511e",
    ]
    .into_iter()
    .map(str::to_string)
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skips_colors_already_in_use() {
        let palette = Palette::default();
        let first = palette.first_unused_color(&[]);
        let second = palette.first_unused_color(&[first.clone()]);
        assert_ne!(first, second);
    }

    #[test]
    fn exhausted_palette_falls_back() {
        let palette = Palette::default();
        let used: Vec<String> = palette.colors().to_vec();
        assert_eq!(palette.first_unused_color(&used), FALLBACK_COLOR);
    }
}
