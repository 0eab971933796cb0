use std::{
    collections::HashMap,
    sync::{Arc, RwLock},
};
use tracing::debug;

use super::spec::FigureSpec;
use crate::error::Result;
use crate::filter::Selection;

type Key = (String, Selection);

/// Memo of built figures keyed by `(table id, selection)`. Tables never
/// change during a run, so entries are never evicted.
#[derive(Debug, Default)]
pub struct FigureCache {
    map: RwLock<HashMap<Key, Arc<FigureSpec>>>,
}

impl FigureCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached figure for the key, building and storing it on a miss.
    /// Build errors are returned and not cached.
    pub fn get_or_build<F>(&self, table_id: &str, selection: &Selection, build: F) -> Result<Arc<FigureSpec>>
    where
        F: FnOnce() -> Result<FigureSpec>,
    {
        let key: Key = (table_id.to_string(), selection.clone());

        // Fast path under the read lock
        {
            let map_r = self.map.read().unwrap_or_else(|e| e.into_inner());
            if let Some(hit) = map_r.get(&key) {
                return Ok(Arc::clone(hit));
            }
        }

        let figure = Arc::new(build()?);

        let mut map_w = self.map.write().unwrap_or_else(|e| e.into_inner());
        // Another caller may have filled the slot while we were building.
        let cached = Arc::clone(map_w.entry(key).or_insert(figure));
        debug!(table = table_id, entries = map_w.len(), "cached figure");
        Ok(cached)
    }

    pub fn len(&self) -> usize {
        self.map.read().map(|m| m.len()).unwrap_or_else(|e| e.into_inner().len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
