//! Schemas of the exported collections.
//!
//! # Module Organization
//!
//! - [`constants`]: collection names, corner lookup tables and the unit scale
//! - [`models`]: row models and the corner mapping
//!
//! The functions here list each collection's properties in declaration order.
//! [`RecHitProperties::declare`] registers them on a collection and keeps the
//! handles for row writes.

pub mod constants;
pub mod models;

pub use constants::*;
pub use models::*;

use crate::error::StoreError;
use crate::store::{Collection, Item, Property, PropertyType, PropertyValue, V3d};

/// Properties of `Products_V1`.
pub fn products_schema() -> Vec<(&'static str, PropertyType)> {
    vec![(PRODUCT_PROPERTY, PropertyType::String)]
}

/// Properties of every `<Kind>RecHits_V2` collection, in declaration order.
pub fn rechit_schema() -> Vec<(&'static str, PropertyType)> {
    let mut schema = vec![
        ("energy", PropertyType::Double),
        ("eta", PropertyType::Double),
        ("phi", PropertyType::Double),
        ("time", PropertyType::Double),
        ("detid", PropertyType::Int),
    ];
    schema.extend(FRONT_NAMES.iter().map(|&n| (n, PropertyType::V3d)));
    schema.extend(BACK_NAMES.iter().map(|&n| (n, PropertyType::V3d)));
    schema.push(("deltaEta", PropertyType::Double));
    schema.push(("deltaPhi", PropertyType::Double));
    schema
}

fn default_for(ty: PropertyType) -> PropertyValue {
    match ty {
        PropertyType::Double => PropertyValue::Double(0.0),
        PropertyType::Int => PropertyValue::Int(0),
        PropertyType::String => PropertyValue::String(String::new()),
        PropertyType::V3d => PropertyValue::V3d(V3d::default()),
    }
}

/// Declare every `(name, type)` of `schema` on `collection` with a zero default.
pub fn declare_schema(
    collection: &mut Collection,
    schema: &[(&'static str, PropertyType)],
) -> Result<Vec<Property>, StoreError> {
    schema
        .iter()
        .map(|&(name, ty)| collection.add_property(name, default_for(ty)))
        .collect()
}

/// Handles for one rechit collection.
#[derive(Debug, Clone, Copy)]
pub struct RecHitProperties {
    energy: Property,
    eta: Property,
    phi: Property,
    time: Property,
    detid: Property,
    front: [Property; 4],
    back: [Property; 4],
    delta_eta: Property,
    delta_phi: Property,
}

impl RecHitProperties {
    /// Declare the rechit schema on `collection`. Idempotent.
    pub fn declare(collection: &mut Collection) -> Result<Self, StoreError> {
        let p = declare_schema(collection, &rechit_schema())?;
        Ok(Self {
            energy: p[0],
            eta: p[1],
            phi: p[2],
            time: p[3],
            detid: p[4],
            front: [p[5], p[6], p[7], p[8]],
            back: [p[9], p[10], p[11], p[12]],
            delta_eta: p[13],
            delta_phi: p[14],
        })
    }

    /// Append one row holding `record`.
    pub fn write(
        &self,
        collection: &mut Collection,
        record: &RecHitRecord,
    ) -> Result<Item, StoreError> {
        let item = collection.create();
        collection.set(item, self.energy, record.energy)?;
        collection.set(item, self.eta, record.eta)?;
        collection.set(item, self.phi, record.phi)?;
        collection.set(item, self.time, record.time)?;
        collection.set(item, self.detid, record.detid)?;
        collection.set(item, self.delta_eta, record.delta_eta)?;
        collection.set(item, self.delta_phi, record.delta_phi)?;
        for (property, corner) in self.front.iter().zip(record.front) {
            collection.set(item, *property, corner)?;
        }
        for (property, corner) in self.back.iter().zip(record.back) {
            collection.set(item, *property, corner)?;
        }
        Ok(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RecordStore;

    #[test]
    fn test_rechit_schema_order() {
        let names: Vec<&str> = rechit_schema().iter().map(|(n, _)| *n).collect();
        assert_eq!(
            names,
            vec![
                "energy", "eta", "phi", "time", "detid", "front_1", "front_2", "front_3",
                "front_4", "back_1", "back_2", "back_3", "back_4", "deltaEta", "deltaPhi"
            ]
        );
        let doubles = rechit_schema()
            .iter()
            .filter(|(_, t)| *t == PropertyType::Double)
            .count();
        let vectors = rechit_schema()
            .iter()
            .filter(|(_, t)| *t == PropertyType::V3d)
            .count();
        assert_eq!(doubles, 6);
        assert_eq!(vectors, 8);
    }

    #[test]
    fn test_declare_twice_same_handles() {
        let mut store = RecordStore::new();
        let coll = store.collection("EERecHits_V2");
        let first = RecHitProperties::declare(coll).unwrap();
        let second = RecHitProperties::declare(coll).unwrap();
        assert_eq!(first.energy, second.energy);
        assert_eq!(first.front, second.front);
        assert_eq!(first.delta_phi, second.delta_phi);
        assert_eq!(coll.properties().len(), rechit_schema().len());
    }

    #[test]
    fn test_declare_conflicting_schema() {
        let mut store = RecordStore::new();
        let coll = store.collection("EERecHits_V2");
        coll.add_property("detid", 0.0).unwrap();
        assert!(matches!(
            RecHitProperties::declare(coll),
            Err(StoreError::TypeConflict { .. })
        ));
    }

    #[test]
    fn test_write_record() {
        let mut store = RecordStore::new();
        let coll = store.collection("EERecHits_V2");
        let props = RecHitProperties::declare(coll).unwrap();
        let record = RecHitRecord {
            energy: 2.0,
            detid: -5,
            front: [V3d::new(1.0, 0.0, 0.0); 4],
            ..Default::default()
        };
        let item = props.write(coll, &record).unwrap();
        assert_eq!(coll.get(item, props.energy).unwrap().as_double(), Some(2.0));
        assert_eq!(coll.get(item, props.detid).unwrap().as_int(), Some(-5));
        assert_eq!(
            coll.get(item, props.front[3]).unwrap().as_v3d(),
            Some(V3d::new(1.0, 0.0, 0.0))
        );
        assert_eq!(
            coll.get(item, props.back[0]).unwrap().as_v3d(),
            Some(V3d::default())
        );
    }
}
