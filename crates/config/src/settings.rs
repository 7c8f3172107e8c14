// User settings
// Loaded from ~/.config/tabex/settings.json

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use serde::{Deserialize, Serialize};
use tabex_engine::options::Overrides;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Directory exports are written to when no output path is given
    #[serde(rename = "export.outputDir", skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Template used when none is named on the command line
    #[serde(rename = "export.defaultTemplate", skip_serializing_if = "Option::is_none")]
    pub default_template: Option<String>,

    /// Template id -> option key -> value
    #[serde(rename = "export.templateOverrides")]
    pub template_overrides: BTreeMap<String, Overrides>,
}

impl Settings {
    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("tabex")
            .join("settings.json")
    }

    /// Load settings from the default location, falling back to defaults
    pub fn load() -> Self {
        Self::load_from(&Self::config_path())
    }

    /// Load settings from `path`. A missing file yields defaults silently;
    /// unreadable or malformed files yield defaults with a warning.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => Self::parse(&contents).unwrap_or_else(|e| {
                warn!("error parsing {}: {e}; using default settings", path.display());
                Self::default()
            }),
            Err(e) => {
                warn!("error reading {}: {e}; using default settings", path.display());
                Self::default()
            }
        }
    }

    /// Parse settings JSON. Lines starting with `//` are comments.
    pub fn parse(contents: &str) -> Result<Self, serde_json::Error> {
        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");
        serde_json::from_str(&cleaned)
    }

    /// Stored option overrides for one template (empty when none)
    pub fn overrides_for(&self, template_id: &str) -> Overrides {
        self.template_overrides.get(template_id).cloned().unwrap_or_default()
    }
}
