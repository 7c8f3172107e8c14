use std::collections::BTreeMap;

use log::warn;
use serde::{Deserialize, Serialize};

use crate::catalog::{Category, TemplateDefinition};

// ---------------------------------------------------------------------------
// Option descriptors (static, per template)
// ---------------------------------------------------------------------------

/// One entry of a select option's enumerated choices.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SelectChoice {
    pub value: &'static str,
    pub label: &'static str,
}

/// Typed description of a template option, enough to build an options form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum OptionDescriptor {
    Boolean {
        default: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<&'static str>,
        #[serde(rename = "helperText", skip_serializing_if = "Option::is_none")]
        help: Option<&'static str>,
    },
    Text {
        default: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<&'static str>,
        #[serde(rename = "helperText", skip_serializing_if = "Option::is_none")]
        help: Option<&'static str>,
    },
    Number {
        default: f64,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<&'static str>,
        #[serde(rename = "helperText", skip_serializing_if = "Option::is_none")]
        help: Option<&'static str>,
    },
    Select {
        default: &'static str,
        #[serde(skip_serializing_if = "Option::is_none")]
        label: Option<&'static str>,
        #[serde(rename = "helperText", skip_serializing_if = "Option::is_none")]
        help: Option<&'static str>,
        options: &'static [SelectChoice],
    },
}

impl OptionDescriptor {
    pub fn default_value(&self) -> OptionValue {
        match self {
            Self::Boolean { default, .. } => OptionValue::Bool(*default),
            Self::Text { default, .. } | Self::Select { default, .. } => {
                OptionValue::Text(default.to_string())
            }
            Self::Number { default, .. } => OptionValue::Number(*default),
        }
    }
}

// ---------------------------------------------------------------------------
// Option values (user overrides + effective config)
// ---------------------------------------------------------------------------

/// A concrete option value supplied by a user or taken from a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl OptionValue {
    /// Parse loosely typed input such as a `key=value` command-line pair:
    /// `true`/`false` become booleans, numbers become numbers, everything
    /// else stays text.
    pub fn parse_loose(raw: &str) -> Self {
        match raw {
            "true" => return OptionValue::Bool(true),
            "false" => return OptionValue::Bool(false),
            _ => {}
        }
        match raw.trim().parse::<f64>() {
            Ok(n) if n.is_finite() && !raw.trim().is_empty() => OptionValue::Number(n),
            _ => OptionValue::Text(raw.to_string()),
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            OptionValue::Bool(b) => Some(*b),
            OptionValue::Text(s) => match s.as_str() {
                "true" => Some(true),
                "false" => Some(false),
                _ => None,
            },
            OptionValue::Number(_) => None,
        }
    }

    fn as_number(&self) -> Option<f64> {
        match self {
            OptionValue::Number(n) => Some(*n),
            OptionValue::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
            OptionValue::Bool(_) => None,
        }
    }

    /// Numbers and booleans rendered the way they would be typed.
    fn render_text(&self) -> String {
        match self {
            OptionValue::Text(s) => s.clone(),
            OptionValue::Number(n) => n.to_string(),
            OptionValue::Bool(b) => b.to_string(),
        }
    }
}

impl From<bool> for OptionValue {
    fn from(b: bool) -> Self {
        OptionValue::Bool(b)
    }
}

impl From<f64> for OptionValue {
    fn from(n: f64) -> Self {
        OptionValue::Number(n)
    }
}

impl From<&str> for OptionValue {
    fn from(s: &str) -> Self {
        OptionValue::Text(s.to_string())
    }
}

impl From<String> for OptionValue {
    fn from(s: String) -> Self {
        OptionValue::Text(s)
    }
}

/// Option key to value. Keys absent from a template are kept, like any
/// other override.
pub type Overrides = BTreeMap<String, OptionValue>;

/// Override key that carries a custom filename when no explicit one is set
/// on the [`TemplateSelection`].
pub const CUSTOM_FILENAME_KEY: &str = "customFilename";

/// What the user picked: a template, option overrides, and optionally a
/// filename to use instead of the generated one.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TemplateSelection {
    pub template_id: String,
    pub overrides: Overrides,
    pub custom_filename: Option<String>,
}

impl TemplateSelection {
    pub fn new(template_id: impl Into<String>) -> Self {
        Self { template_id: template_id.into(), ..Self::default() }
    }

    pub fn with_override(mut self, key: impl Into<String>, value: impl Into<OptionValue>) -> Self {
        self.overrides.insert(key.into(), value.into());
        self
    }

    pub fn with_custom_filename(mut self, name: impl Into<String>) -> Self {
        self.custom_filename = Some(name.into());
        self
    }

    /// The custom filename, if one was given and is non-empty. A numeric
    /// override such as `--set customFilename=2024` is rendered as text.
    pub fn effective_custom_filename(&self) -> Option<String> {
        let explicit = self.custom_filename.clone().filter(|s| !s.is_empty());
        explicit.or_else(|| {
            self.overrides
                .get(CUSTOM_FILENAME_KEY)
                .map(OptionValue::render_text)
                .filter(|s| !s.is_empty())
        })
    }
}

// ---------------------------------------------------------------------------
// Effective config
// ---------------------------------------------------------------------------

/// Effective options for one export: template defaults shallow-merged with
/// overrides, plus the template's category and kind for dispatch.
#[derive(Debug, Clone, PartialEq)]
pub struct ExportConfig {
    pub category: Category,
    pub kind: &'static str,
    values: BTreeMap<String, OptionValue>,
    descriptors: &'static [(&'static str, OptionDescriptor)],
}

impl ExportConfig {
    pub fn resolve(template: &TemplateDefinition, overrides: &Overrides) -> Self {
        let mut values: BTreeMap<String, OptionValue> = template
            .default_config
            .iter()
            .map(|(key, desc)| (key.to_string(), desc.default_value()))
            .collect();
        for (key, value) in overrides {
            values.insert(key.clone(), value.clone());
        }
        Self {
            category: template.category,
            kind: template.kind,
            values,
            descriptors: template.default_config,
        }
    }

    pub fn get(&self, key: &str) -> Option<&OptionValue> {
        self.values.get(key)
    }

    pub fn values(&self) -> &BTreeMap<String, OptionValue> {
        &self.values
    }

    /// Boolean option. Values of the wrong type fall back to the template
    /// default, then to `fallback`.
    pub fn bool_or(&self, key: &str, fallback: bool) -> bool {
        match self.values.get(key) {
            None => fallback,
            Some(v) => v.as_bool().unwrap_or_else(|| {
                warn!("option '{key}' expects a boolean, got {v:?}; using default");
                self.descriptor_default(key)
                    .and_then(|d| d.as_bool())
                    .unwrap_or(fallback)
            }),
        }
    }

    pub fn number_or(&self, key: &str, fallback: f64) -> f64 {
        match self.values.get(key) {
            None => fallback,
            Some(v) => v.as_number().unwrap_or_else(|| {
                warn!("option '{key}' expects a number, got {v:?}; using default");
                self.descriptor_default(key)
                    .and_then(|d| d.as_number())
                    .unwrap_or(fallback)
            }),
        }
    }

    /// Text option. Numbers and booleans are rendered as text.
    pub fn text_or(&self, key: &str, fallback: &str) -> String {
        match self.values.get(key) {
            None => fallback.to_string(),
            Some(v) => v.render_text(),
        }
    }

    fn descriptor_default(&self, key: &str) -> Option<OptionValue> {
        self.descriptors
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, d)| d.default_value())
    }
}
