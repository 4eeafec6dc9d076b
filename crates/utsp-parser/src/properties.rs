// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! PropertyReader trait implementation

use log::debug;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use utsp_model::{
    DecodedEntity, EntityId, EntityResolver, IfcType, Property, PropertyReader, PropertySet,
    PropertyValue,
};

/// Property reader implementation
pub struct PropertyReaderImpl {
    /// Reference to resolver for entity lookups
    resolver: Arc<dyn EntityResolver>,
    /// Cache: element ID -> property set IDs, in association order
    pset_cache: FxHashMap<u32, Vec<EntityId>>,
}

impl PropertyReaderImpl {
    /// Create a new property reader
    ///
    /// Walks every IfcRelDefinesByProperties once and records which property
    /// sets are attached to which elements.
    pub fn new(resolver: Arc<dyn EntityResolver>) -> Self {
        let mut pset_cache: FxHashMap<u32, Vec<EntityId>> = FxHashMap::default();

        for rel in resolver.entities_by_type(&IfcType::IfcRelDefinesByProperties) {
            // RelatedObjects at index 4, RelatingPropertyDefinition at index 5
            let Some(related_ids) = rel.get_refs(4) else {
                continue;
            };
            let Some(pset_id) = rel.get_ref(5) else {
                continue;
            };

            // Quantity sets and other definitions are not property sets
            let is_pset = resolver
                .get(pset_id)
                .is_some_and(|def| def.ifc_type == IfcType::IfcPropertySet);
            if !is_pset {
                continue;
            }

            for related_id in related_ids {
                pset_cache.entry(related_id.0).or_default().push(pset_id);
            }
        }

        debug!("Indexed property sets for {} elements", pset_cache.len());

        Self {
            resolver,
            pset_cache,
        }
    }

    /// Extract properties from a property set entity
    fn extract_properties(&self, pset: &DecodedEntity) -> Vec<Property> {
        // HasProperties at index 4
        let Some(prop_refs) = pset.get(4) else {
            return Vec::new();
        };

        self.resolver
            .resolve_ref_list(prop_refs)
            .iter()
            .filter_map(|prop| self.extract_single_property(prop))
            .collect()
    }

    /// Extract a single property from an IfcProperty entity
    ///
    /// Only single values carry a nominal value; every other property kind
    /// is kept by name with an absent value.
    fn extract_single_property(&self, prop: &DecodedEntity) -> Option<Property> {
        // Name at index 0
        let name = prop.get_string(0)?.to_string();

        let value = match prop.ifc_type {
            // NominalValue at index 2
            IfcType::IfcPropertySingleValue => prop.get(2).and_then(PropertyValue::from_attribute),
            _ => None,
        };

        Some(Property { name, value })
    }

    fn string_attr(&self, id: EntityId, index: usize) -> Option<String> {
        let entity = self.resolver.get(id)?;
        entity.get_string(index).map(|s| s.to_string())
    }
}

impl PropertyReader for PropertyReaderImpl {
    fn property_sets(&self, id: EntityId) -> Vec<PropertySet> {
        let Some(pset_ids) = self.pset_cache.get(&id.0) else {
            return Vec::new();
        };

        pset_ids
            .iter()
            .filter_map(|pset_id| self.resolver.get(*pset_id))
            .map(|pset| PropertySet {
                id: pset.id,
                // Name at index 2
                name: pset.get_string(2).unwrap_or_default().to_string(),
                properties: self.extract_properties(&pset),
            })
            .collect()
    }

    fn global_id(&self, id: EntityId) -> Option<String> {
        self.string_attr(id, 0)
    }

    fn name(&self, id: EntityId) -> Option<String> {
        self.string_attr(id, 2)
    }

    fn object_type(&self, id: EntityId) -> Option<String> {
        self.string_attr(id, 4)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver::ResolverImpl;
    use crate::scanner::EntityScanner;

    const TEST_IFC: &str = r#"ISO-10303-21;
HEADER;
FILE_SCHEMA(('IFC2X3'));
ENDSEC;
DATA;
#1=IFCBUILDINGELEMENTPROXY('guid-1',$,'Hull A',$,'Utsparing',$,$,$,$);
#2=IFCBUILDINGELEMENTPROXY('guid-2',$,$,$,$,$,$,$,$);
#10=IFCPROPERTYSET('ps1',$,'Pset_Empty',$,());
#11=IFCRELDEFINESBYPROPERTIES('r1',$,$,$,(#1),#10);
#20=IFCPROPERTYSET('ps2',$,'A4_Utsp',$,(#21,#22,#23,#24,#25));
#21=IFCPROPERTYSINGLEVALUE('A4_Utsp_ID',$,IFCLABEL('RIV_Hull-1'),$);
#22=IFCPROPERTYSINGLEVALUE('A4_Utsp_DimBredde',$,IFCLENGTHMEASURE(200),$);
#23=IFCPROPERTYSINGLEVALUE('A4_Utsp_Tetting',$,IFCBOOLEAN(.F.),$);
#24=IFCPROPERTYSINGLEVALUE('A4_Utsp_Fase',$,$,$);
#25=IFCPROPERTYENUMERATEDVALUE('A4_Utsp_Status',$,(IFCLABEL('Godkjent')),$);
#26=IFCRELDEFINESBYPROPERTIES('r2',$,$,$,(#1,#2),#20);
#30=IFCELEMENTQUANTITY('q1',$,'Qto_Proxy',$,$,());
#31=IFCRELDEFINESBYPROPERTIES('r3',$,$,$,(#1),#30);
ENDSEC;
END-ISO-10303-21;
"#;

    fn reader() -> PropertyReaderImpl {
        let index = EntityScanner::build_index(TEST_IFC);
        let resolver: Arc<dyn EntityResolver> =
            Arc::new(ResolverImpl::new(TEST_IFC.to_string(), index));
        PropertyReaderImpl::new(resolver)
    }

    #[test]
    fn test_property_sets_in_association_order() {
        let reader = reader();
        let psets = reader.property_sets(EntityId(1));
        let names: Vec<&str> = psets.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["Pset_Empty", "A4_Utsp"]);
        assert!(psets[0].properties.is_empty());
        assert_eq!(psets[1].id, EntityId(20));
    }

    #[test]
    fn test_shared_pset() {
        let reader = reader();
        let psets = reader.property_sets(EntityId(2));
        assert_eq!(psets.len(), 1);
        assert_eq!(psets[0].name, "A4_Utsp");
    }

    #[test]
    fn test_nominal_values() {
        let reader = reader();
        let psets = reader.property_sets(EntityId(1));
        let utsp = &psets[1];

        assert_eq!(
            utsp.get("A4_Utsp_ID").unwrap().value,
            Some(PropertyValue::Text("RIV_Hull-1".into()))
        );
        assert_eq!(
            utsp.get("A4_Utsp_DimBredde").unwrap().value,
            Some(PropertyValue::Real(200.0))
        );
        assert_eq!(
            utsp.get("A4_Utsp_Tetting").unwrap().value,
            Some(PropertyValue::Bool(false))
        );
        assert_eq!(utsp.get("A4_Utsp_Fase").unwrap().value, None);
        assert_eq!(utsp.get("A4_Utsp_Status").unwrap().value, None);
    }

    #[test]
    fn test_identity_attributes() {
        let reader = reader();
        assert_eq!(reader.global_id(EntityId(1)).as_deref(), Some("guid-1"));
        assert_eq!(reader.name(EntityId(1)).as_deref(), Some("Hull A"));
        assert_eq!(reader.object_type(EntityId(1)).as_deref(), Some("Utsparing"));
        assert_eq!(reader.name(EntityId(2)), None);
        assert!(reader.property_sets(EntityId(99)).is_empty());
    }
}
