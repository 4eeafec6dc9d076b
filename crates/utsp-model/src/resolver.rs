// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Instance lookup

use crate::{AttributeValue, DecodedEntity, EntityId, IfcType};
use std::sync::Arc;

/// Access to the instances of a model by id and by class
///
/// ```ignore
/// use utsp_model::{EntityResolver, IfcType};
///
/// fn owner_histories(resolver: &dyn EntityResolver) {
///     for proxy in resolver.entities_by_type(&IfcType::IfcBuildingElementProxy) {
///         let owner = proxy.get(1).and_then(|a| resolver.resolve_ref(a));
///         println!("{} -> {:?}", proxy.id, owner.map(|o| o.id));
///     }
/// }
/// ```
pub trait EntityResolver: Send + Sync {
    /// `None` for unknown ids and for instances that fail to decode
    fn get(&self, id: EntityId) -> Option<Arc<DecodedEntity>>;

    fn resolve_ref(&self, attr: &AttributeValue) -> Option<Arc<DecodedEntity>> {
        self.get(attr.as_entity_ref()?)
    }

    /// Follow every reference in a list attribute, skipping dangling ones
    fn resolve_ref_list(&self, attr: &AttributeValue) -> Vec<Arc<DecodedEntity>> {
        attr.as_list()
            .unwrap_or_default()
            .iter()
            .filter_map(|item| self.resolve_ref(item))
            .collect()
    }

    /// Instances of one class, in file order
    fn entities_by_type(&self, ifc_type: &IfcType) -> Vec<Arc<DecodedEntity>>;

    fn count_by_type(&self, ifc_type: &IfcType) -> usize;

    /// 0 when the DATA section is empty
    fn max_id(&self) -> u32;

    fn entity_count(&self) -> usize;
}

/// Lookups built on [`EntityResolver`]
pub trait EntityResolverExt: EntityResolver {
    fn get_or_err(&self, id: EntityId) -> crate::Result<Arc<DecodedEntity>> {
        self.get(id).ok_or(crate::ParseError::EntityNotFound(id))
    }

    /// Geometry items of a product, across all of its shape representations
    ///
    /// Product.Representation (6) -> IfcProductDefinitionShape.Representations (2)
    /// -> IfcShapeRepresentation.Items (3). Empty when any link is missing.
    fn representation_items(&self, product: &DecodedEntity) -> Vec<EntityId> {
        let Some(shape) = product.get(6).and_then(|a| self.resolve_ref(a)) else {
            return Vec::new();
        };
        let Some(reps) = shape.get(2) else {
            return Vec::new();
        };
        self.resolve_ref_list(reps)
            .iter()
            .filter_map(|rep| rep.get_refs(3))
            .flatten()
            .collect()
    }
}

impl<T: EntityResolver + ?Sized> EntityResolverExt for T {}
