// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! EntityResolver trait implementation

use crate::scanner::EntityIndex;
use crate::tokenizer::parse_entity_at;
use log::debug;
use rustc_hash::FxHashMap;
use std::sync::{Arc, RwLock};
use utsp_model::{DecodedEntity, EntityId, EntityResolver, IfcType};

/// Thread-safe entity resolver implementation
///
/// Instances are decoded lazily on first access and cached.
pub struct ResolverImpl {
    /// Raw IFC content (owned for thread safety)
    content: String,
    /// Offsets, type buckets and max id
    index: EntityIndex,
    /// Decoded entity cache (thread-safe)
    cache: RwLock<FxHashMap<u32, Arc<DecodedEntity>>>,
}

impl ResolverImpl {
    /// Create a new resolver over content and its scanned index
    pub fn new(content: String, index: EntityIndex) -> Self {
        Self {
            content,
            index,
            cache: RwLock::new(FxHashMap::default()),
        }
    }

    /// Get raw content
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Get the scanned index
    pub fn index(&self) -> &EntityIndex {
        &self.index
    }

    /// Decode and cache an entity
    fn decode_and_cache(&self, id: u32) -> Option<Arc<DecodedEntity>> {
        {
            let cache = self.cache.read().ok()?;
            if let Some(cached) = cache.get(&id) {
                return Some(Arc::clone(cached));
            }
        }

        let (start, end) = self.index.offsets.get(&id)?;

        let entity = match parse_entity_at(&self.content, *start, *end) {
            Ok(entity) => entity,
            Err(e) => {
                debug!("Skipping undecodable instance #{}: {}", id, e);
                return None;
            }
        };
        let arc = Arc::new(entity);

        if let Ok(mut cache) = self.cache.write() {
            cache.insert(id, Arc::clone(&arc));
        }

        Some(arc)
    }
}

impl EntityResolver for ResolverImpl {
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>> {
        self.decode_and_cache(id.0)
    }

    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>> {
        self.index
            .by_type
            .get(&ifc_type.step_name())
            .map(|ids| ids.iter().filter_map(|id| self.decode_and_cache(*id)).collect())
            .unwrap_or_default()
    }

    fn count_by_type(&self, ifc_type: &IfcType) -> usize {
        self.index
            .by_type
            .get(&ifc_type.step_name())
            .map(|v| v.len())
            .unwrap_or(0)
    }

    fn max_id(&self) -> u32 {
        self.index.max_id
    }

    fn entity_count(&self) -> usize {
        self.index.len()
    }
}
