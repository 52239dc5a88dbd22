//! Configuration for trait views and trait definitions.
//!
//! Trait definitions are usually authored as JSON, either as a bare name or
//! as an object:
//!
//! ```
//! use lattice_traits::TraitConfig;
//!
//! let traits = TraitConfig::list_from_json(r#"[
//!     "title",
//!     { "name": "width", "changeProp": 1, "min": 0, "placeholder": "auto" }
//! ]"#)?;
//!
//! assert_eq!(traits[0].name, "title");
//! assert!(traits[1].change_prop);
//! assert_eq!(traits[1].min.as_deref(), Some("0"));
//! # Ok::<(), lattice_traits::Error>(())
//! ```

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::error::{Error, Result};

/// Opaque handle to the editor that owns the trait views.
pub type EditorHandle = Arc<dyn Any + Send + Sync>;

/// Styling and identification context handed to every trait view.
#[derive(Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ViewConfig {
    /// Owning editor, never inspected by the views themselves.
    #[serde(skip)]
    pub em: Option<EditorHandle>,
    /// Prefix for classes owned by the trait panel (`{pfx}trait`).
    pub style_prefix: String,
    /// Prefix for classes shared with the rest of the editor (`{ppfx}field`).
    pub p_style_prefix: String,
}

impl ViewConfig {
    /// Create a configuration with both prefixes set.
    pub fn new(style_prefix: impl Into<String>, p_style_prefix: impl Into<String>) -> Self {
        Self {
            em: None,
            style_prefix: style_prefix.into(),
            p_style_prefix: p_style_prefix.into(),
        }
    }

    /// Attach the owning editor.
    pub fn with_editor(mut self, em: EditorHandle) -> Self {
        self.em = Some(em);
        self
    }

    /// Load a configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl fmt::Debug for ViewConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ViewConfig")
            .field("em", &self.em.is_some())
            .field("style_prefix", &self.style_prefix)
            .field("p_style_prefix", &self.p_style_prefix)
            .finish()
    }
}

/// Declarative definition of one trait.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TraitConfig {
    /// Key of the attribute or property being edited.
    pub name: String,
    /// Display label; the name is used when absent.
    pub label: Option<String>,
    /// Input variant selector, `text` when absent.
    #[serde(rename = "type")]
    pub trait_type: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub value: Option<String>,
    /// Edit a live target property instead of a stored attribute.
    #[serde(deserialize_with = "flag")]
    pub change_prop: bool,
    #[serde(deserialize_with = "scalar_string")]
    pub placeholder: Option<String>,
    #[serde(rename = "default", deserialize_with = "scalar_string")]
    pub default_value: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub min: Option<String>,
    #[serde(deserialize_with = "scalar_string")]
    pub max: Option<String>,
    #[serde(deserialize_with = "flag")]
    pub no_label: bool,
    /// Extra attributes for the view's root element.
    pub attributes: BTreeMap<String, String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum TraitEntry {
    Name(String),
    Full(TraitConfig),
}

impl From<TraitEntry> for TraitConfig {
    fn from(entry: TraitEntry) -> Self {
        match entry {
            TraitEntry::Name(name) => TraitConfig::named(name),
            TraitEntry::Full(config) => config,
        }
    }
}

impl TraitConfig {
    /// A definition with only a name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Load a single definition (object or bare name) from JSON.
    pub fn from_json(json: &str) -> Result<Self> {
        let entry: TraitEntry = serde_json::from_str(json)?;
        TraitConfig::from(entry).validated()
    }

    /// Load a list of definitions from a JSON array.
    pub fn list_from_json(json: &str) -> Result<Vec<Self>> {
        let entries: Vec<TraitEntry> = serde_json::from_str(json)?;
        entries
            .into_iter()
            .map(|entry| TraitConfig::from(entry).validated())
            .collect()
    }

    fn validated(self) -> Result<Self> {
        if self.name.trim().is_empty() {
            return Err(Error::MissingName);
        }
        Ok(self)
    }
}

/// Accept strings, numbers and booleans, storing them as text.
fn scalar_string<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(Value::Bool(b)) => Ok(Some(b.to_string())),
        Some(other) => Err(D::Error::custom(format!("expected a scalar, found {other}"))),
    }
}

/// Accept `true`/`false` as well as `1`/`0`.
fn flag<'de, D>(deserializer: D) -> std::result::Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(b)) => Ok(b),
        Some(Value::Number(n)) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
        Some(other) => Err(D::Error::custom(format!("expected a flag, found {other}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_view_config_from_json() {
        let config = ViewConfig::from_json(r#"{ "stylePrefix": "trt-", "pStylePrefix": "gjs-" }"#)
            .unwrap();
        assert_eq!(config.style_prefix, "trt-");
        assert_eq!(config.p_style_prefix, "gjs-");
        assert!(config.em.is_none());
    }

    #[test]
    fn test_view_config_defaults() {
        let config = ViewConfig::from_json("{}").unwrap();
        assert_eq!(config.style_prefix, "");
        assert_eq!(config.p_style_prefix, "");
    }

    #[test]
    fn test_trait_config_full() {
        let config = TraitConfig::from_json(
            r#"{
                "name": "data-size",
                "label": "Size",
                "type": "number",
                "value": 12,
                "changeProp": false,
                "default": "10",
                "max": 100,
                "noLabel": true,
                "attributes": { "data-test": "size" }
            }"#,
        )
        .unwrap();

        assert_eq!(config.name, "data-size");
        assert_eq!(config.label.as_deref(), Some("Size"));
        assert_eq!(config.trait_type.as_deref(), Some("number"));
        assert_eq!(config.value.as_deref(), Some("12"));
        assert_eq!(config.default_value.as_deref(), Some("10"));
        assert_eq!(config.max.as_deref(), Some("100"));
        assert_eq!(config.min, None);
        assert!(config.no_label);
        assert_eq!(config.attributes.get("data-test").map(String::as_str), Some("size"));
    }

    #[test]
    fn test_trait_config_bare_name() {
        let config = TraitConfig::from_json(r#""title""#).unwrap();
        assert_eq!(config, TraitConfig::named("title"));
    }

    #[test]
    fn test_trait_config_missing_name() {
        let err = TraitConfig::from_json(r#"{ "label": "Nameless" }"#).unwrap_err();
        assert!(matches!(err, Error::MissingName));
    }

    #[test]
    fn test_trait_config_rejects_nested_value() {
        let err = TraitConfig::from_json(r#"{ "name": "x", "value": [1, 2] }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
