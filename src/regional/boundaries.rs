use anyhow::{anyhow, Context, Result};
use serde_json::Value;
use std::{collections::HashSet, fs, path::Path};
use tracing::info;

/// A GeoJSON feature collection whose features carry their region name as `id`.
#[derive(Debug, Clone)]
pub struct BoundarySet {
    key: String,
    collection: Value,
    names: HashSet<String>,
}

impl BoundarySet {
    pub fn load(path: &Path, key: &str) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("reading boundaries {}", path.display()))?;
        let set = Self::from_json(&text, key)
            .with_context(|| format!("parsing boundaries {}", path.display()))?;
        info!(path = %path.display(), regions = set.len(), "loaded boundaries");
        Ok(set)
    }

    /// Parse a feature collection and stamp each feature's `id` with
    /// `properties[key]`. Every feature must carry the property.
    pub fn from_json(text: &str, key: &str) -> Result<Self> {
        let mut collection: Value = serde_json::from_str(text)?;
        let features = collection
            .get_mut("features")
            .and_then(Value::as_array_mut)
            .ok_or_else(|| anyhow!("GeoJSON has no `features` array"))?;

        let mut names = HashSet::with_capacity(features.len());
        for (i, feature) in features.iter_mut().enumerate() {
            let name = feature
                .get("properties")
                .and_then(|p| p.get(key))
                .and_then(Value::as_str)
                .ok_or_else(|| anyhow!("feature {} has no `{}` property", i, key))?
                .to_string();
            let obj = feature
                .as_object_mut()
                .ok_or_else(|| anyhow!("feature {} is not an object", i))?;
            obj.insert("id".into(), Value::String(name.clone()));
            names.insert(name);
        }

        Ok(Self {
            key: key.to_string(),
            collection,
            names,
        })
    }

    /// Property path used by map renderers to match locations to features.
    pub fn feature_id_key(&self) -> String {
        format!("properties.{}", self.key)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn geojson(&self) -> &Value {
        &self.collection
    }
}
