//! Decoded PhpSpec configuration tree.
//!
//! The configuration file is untyped YAML, so it is held as a closed value enum
//! rather than a schema. Map key order is preserved from decode through encode:
//! rendered configurations are compared byte-for-byte, and PhpSpec itself is
//! sensitive to the position of `bootstrap`.

use crate::error::{AdapterError, Result};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::path::Path;

/// A single node of the configuration tree.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    Null,
    Bool(bool),
    Number(serde_yaml::Number),
    String(String),
    Sequence(Vec<ConfigValue>),
    Mapping(ConfigMap),
}

impl ConfigValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_mapping(&self) -> Option<&ConfigMap> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    pub fn as_mapping_mut(&mut self) -> Option<&mut ConfigMap> {
        match self {
            Self::Mapping(map) => Some(map),
            _ => None,
        }
    }

    /// Short name of the value's shape, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Sequence(_) => "list",
            Self::Mapping(_) => "map",
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(value: ConfigMap) -> Self {
        Self::Mapping(value)
    }
}

impl TryFrom<serde_yaml::Value> for ConfigValue {
    type Error = AdapterError;

    fn try_from(value: serde_yaml::Value) -> Result<Self> {
        use serde_yaml::Value;

        Ok(match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => Self::Number(n),
            Value::String(s) => Self::String(s),
            Value::Sequence(items) => Self::Sequence(
                items
                    .into_iter()
                    .map(Self::try_from)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::Mapping(mapping) => {
                let mut map = ConfigMap::new();
                for (key, value) in mapping {
                    map.insert(mapping_key(key)?, Self::try_from(value)?);
                }
                Self::Mapping(map)
            }
            Value::Tagged(tagged) => {
                return Err(AdapterError::UnsupportedYaml {
                    reason: format!("tagged value '{}' is not supported", tagged.tag),
                })
            }
        })
    }
}

/// PHP arrays only have string or integer keys; scalar keys are kept in their string form.
fn mapping_key(key: serde_yaml::Value) -> Result<String> {
    use serde_yaml::Value;

    match key {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(AdapterError::UnsupportedYaml {
            reason: format!("map keys must be scalars, found {:?}", other),
        }),
    }
}

impl Serialize for ConfigValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_unit(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Number(n) => n.serialize(serializer),
            Self::String(s) => serializer.serialize_str(s),
            Self::Sequence(items) => serializer.collect_seq(items),
            Self::Mapping(map) => map.serialize(serializer),
        }
    }
}

/// Insertion-ordered, string-keyed map.
///
/// Configuration maps hold a handful of entries, so lookups are linear scans.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMap {
    entries: Vec<(String, ConfigValue)>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_some()
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.position(key).map(|idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        self.position(key).map(move |idx| &mut self.entries[idx].1)
    }

    /// Insert a value. An existing key keeps its position and gets the new value;
    /// a new key is appended. Returns the previous value, if any.
    pub fn insert(&mut self, key: impl Into<String>, value: ConfigValue) -> Option<ConfigValue> {
        let key = key.into();
        match self.position(&key) {
            Some(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            None => {
                self.entries.push((key, value));
                None
            }
        }
    }

    /// Insert a value as the first entry, moving the key there if it already exists.
    pub fn insert_first(
        &mut self,
        key: impl Into<String>,
        value: ConfigValue,
    ) -> Option<ConfigValue> {
        let key = key.into();
        let previous = self.remove(&key);
        self.entries.insert(0, (key, value));
        previous
    }

    /// Remove a key, keeping the relative order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.position(key).map(|idx| self.entries.remove(idx).1)
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&str, &ConfigValue) -> bool) {
        self.entries.retain(|(k, v)| keep(k, v));
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&str, &mut ConfigValue)> {
        self.entries.iter_mut().map(|(k, v)| (k.as_str(), v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|(k, _)| k == key)
    }
}

impl<K: Into<String>> FromIterator<(K, ConfigValue)> for ConfigMap {
    fn from_iter<T: IntoIterator<Item = (K, ConfigValue)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl Serialize for ConfigMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_map(Some(self.entries.len()))?;
        for (key, value) in &self.entries {
            state.serialize_entry(key, value)?;
        }
        state.end()
    }
}

/// A fully decoded PhpSpec configuration file.
///
/// The top level is always a map; an empty file decodes to an empty map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigDocument {
    root: ConfigMap,
}

impl ConfigDocument {
    pub fn new(root: ConfigMap) -> Self {
        Self { root }
    }

    /// Decode YAML text into a document.
    pub fn decode(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }

        let mut value: serde_yaml::Value = serde_yaml::from_str(text)?;
        // PhpSpec reads its configuration with `<<: *anchor` merges resolved.
        value.apply_merge()?;

        match ConfigValue::try_from(value)? {
            ConfigValue::Null => Ok(Self::default()),
            ConfigValue::Mapping(root) => Ok(Self { root }),
            other => Err(AdapterError::UnsupportedYaml {
                reason: format!("expected a map at the top level, found a {}", other.kind()),
            }),
        }
    }

    /// Read and decode a configuration file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|e| AdapterError::io(path, e))?;
        tracing::debug!("Decoding PhpSpec configuration from {}", path.display());
        Self::decode(&text)
    }

    /// Render the document back to YAML. Empty maps are written as `{}`.
    pub fn encode(&self) -> Result<String> {
        Ok(serde_yaml::to_string(&self.root)?)
    }

    pub fn root(&self) -> &ConfigMap {
        &self.root
    }

    pub fn root_mut(&mut self) -> &mut ConfigMap {
        &mut self.root
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.root.get(key)
    }
}
