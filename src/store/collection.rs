use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::error::StoreError;

use super::types::{PropertyType, PropertyValue};

/// Process-unique identifier of a collection.
///
/// Ids are never reused, so handles issued by one [`super::RecordStore`]
/// cannot match a collection of another.
pub type CollectionId = u32;

static NEXT_COLLECTION_ID: AtomicU32 = AtomicU32::new(0);

/// Handle to a declared property column.
///
/// Handles are only valid against the collection that issued them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Property {
    collection: CollectionId,
    index: usize,
    ty: PropertyType,
}

impl Property {
    pub fn property_type(&self) -> PropertyType {
        self.ty
    }

    /// Position of the column in declaration order.
    pub fn index(&self) -> usize {
        self.index
    }
}

/// Handle to a row created with [`Collection::create`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Item {
    collection: CollectionId,
    row: usize,
}

impl Item {
    /// Position of the row in insertion order.
    pub fn row(&self) -> usize {
        self.row
    }
}

/// Declared column of a collection.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: String,
    pub ty: PropertyType,
    pub default: PropertyValue,
}

/// A named table of typed properties and ordered items.
#[derive(Debug)]
pub struct Collection {
    id: CollectionId,
    name: String,
    properties: Vec<PropertyDef>,
    // Key: property name -> index into `properties`
    by_name: HashMap<String, usize>,
    rows: Vec<Vec<PropertyValue>>,
}

impl Collection {
    pub(super) fn new(name: &str) -> Self {
        Self {
            id: NEXT_COLLECTION_ID.fetch_add(1, Ordering::Relaxed),
            name: name.to_string(),
            properties: Vec::new(),
            by_name: HashMap::new(),
            rows: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declare a property whose type is the tag of `default`.
    ///
    /// Re-declaring an existing name with the same type returns the existing
    /// handle. A different type is rejected. Rows created before the
    /// declaration are padded with `default`.
    pub fn add_property(
        &mut self,
        name: &str,
        default: impl Into<PropertyValue>,
    ) -> Result<Property, StoreError> {
        let default = default.into();
        let ty = default.property_type();

        if let Some(&index) = self.by_name.get(name) {
            let declared = self.properties[index].ty;
            if declared != ty {
                return Err(StoreError::TypeConflict {
                    collection: self.name.clone(),
                    property: name.to_string(),
                    declared,
                    requested: ty,
                });
            }
            return Ok(self.handle(index));
        }

        let index = self.properties.len();
        for row in &mut self.rows {
            row.push(default.clone());
        }
        self.properties.push(PropertyDef {
            name: name.to_string(),
            ty,
            default,
        });
        self.by_name.insert(name.to_string(), index);
        Ok(self.handle(index))
    }

    /// Look up a declared property by name.
    pub fn property(&self, name: &str) -> Option<Property> {
        self.by_name.get(name).map(|&index| self.handle(index))
    }

    /// Declared properties in declaration order.
    pub fn properties(&self) -> &[PropertyDef] {
        &self.properties
    }

    /// Append a row holding every property's default value.
    pub fn create(&mut self) -> Item {
        let row = self
            .properties
            .iter()
            .map(|p| p.default.clone())
            .collect();
        self.rows.push(row);
        Item {
            collection: self.id,
            row: self.rows.len() - 1,
        }
    }

    /// Assign `value` to `property` on `item`.
    pub fn set(
        &mut self,
        item: Item,
        property: Property,
        value: impl Into<PropertyValue>,
    ) -> Result<(), StoreError> {
        self.check_handles(item, property)?;
        let value = value.into();
        let def = &self.properties[property.index];
        if value.property_type() != def.ty {
            return Err(StoreError::TypeMismatch {
                collection: self.name.clone(),
                property: def.name.clone(),
                declared: def.ty,
                got: value.property_type(),
            });
        }
        self.rows[item.row][property.index] = value;
        Ok(())
    }

    /// Assign by property name, for callers that do not hold a handle.
    pub fn set_by_name(
        &mut self,
        item: Item,
        name: &str,
        value: impl Into<PropertyValue>,
    ) -> Result<(), StoreError> {
        let property = self
            .property(name)
            .ok_or_else(|| StoreError::UnknownProperty {
                collection: self.name.clone(),
                property: name.to_string(),
            })?;
        self.set(item, property, value)
    }

    pub fn get(&self, item: Item, property: Property) -> Result<&PropertyValue, StoreError> {
        self.check_handles(item, property)?;
        Ok(&self.rows[item.row][property.index])
    }

    /// Row values in property declaration order.
    pub fn row(&self, index: usize) -> Option<&[PropertyValue]> {
        self.rows.get(index).map(Vec::as_slice)
    }

    /// Handles to every row, in insertion order.
    pub fn items(&self) -> impl Iterator<Item = Item> + '_ {
        (0..self.rows.len()).map(move |row| Item {
            collection: self.id,
            row,
        })
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub(super) fn clear_items(&mut self) {
        self.rows.clear();
    }

    fn handle(&self, index: usize) -> Property {
        Property {
            collection: self.id,
            index,
            ty: self.properties[index].ty,
        }
    }

    fn check_handles(&self, item: Item, property: Property) -> Result<(), StoreError> {
        if property.collection != self.id
            || property.index >= self.properties.len()
            || property.ty != self.properties[property.index].ty
            || item.collection != self.id
            || item.row >= self.rows.len()
        {
            return Err(StoreError::ForeignHandle {
                collection: self.name.clone(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::V3d;

    #[test]
    fn test_add_property_is_idempotent() {
        let mut coll = Collection::new("Test_V1");
        let first = coll.add_property("energy", 0.0).unwrap();
        for _ in 0..5 {
            assert_eq!(coll.add_property("energy", 0.0).unwrap(), first);
        }
        assert_eq!(coll.properties().len(), 1);
    }

    #[test]
    fn test_add_property_type_conflict() {
        let mut coll = Collection::new("Test_V1");
        coll.add_property("detid", 0i32).unwrap();
        let err = coll.add_property("detid", 0.0).unwrap_err();
        assert!(matches!(err, StoreError::TypeConflict { .. }));
    }

    #[test]
    fn test_create_uses_defaults() {
        let mut coll = Collection::new("Test_V1");
        let e = coll.add_property("energy", 0.0).unwrap();
        let c = coll.add_property("front_1", V3d::default()).unwrap();
        let item = coll.create();
        assert_eq!(coll.get(item, e).unwrap(), &PropertyValue::Double(0.0));
        assert_eq!(coll.get(item, c).unwrap(), &PropertyValue::V3d(V3d::default()));
    }

    #[test]
    fn test_late_property_pads_existing_rows() {
        let mut coll = Collection::new("Test_V1");
        coll.add_property("energy", 0.0).unwrap();
        let first = coll.create();
        let name = coll.add_property("name", "none").unwrap();
        assert_eq!(coll.row(0).unwrap().len(), 2);
        assert_eq!(coll.get(first, name).unwrap().as_str(), Some("none"));
    }

    #[test]
    fn test_set_type_mismatch() {
        let mut coll = Collection::new("Test_V1");
        let e = coll.add_property("energy", 0.0).unwrap();
        let item = coll.create();
        let err = coll.set(item, e, 3i32).unwrap_err();
        assert!(matches!(err, StoreError::TypeMismatch { .. }));
        // Value is left untouched
        assert_eq!(coll.get(item, e).unwrap().as_double(), Some(0.0));
    }

    #[test]
    fn test_foreign_property_rejected() {
        let mut a = Collection::new("A_V1");
        let mut b = Collection::new("B_V1");
        let pa = a.add_property("x", 0.0).unwrap();
        b.add_property("x", 0.0).unwrap();
        let item = b.create();
        let err = b.set(item, pa, 1.0).unwrap_err();
        assert!(matches!(err, StoreError::ForeignHandle { .. }));
    }

    #[test]
    fn test_handle_from_other_store_rejected() {
        let mut store_a = crate::store::RecordStore::new();
        let mut store_b = crate::store::RecordStore::new();
        let energy = store_a
            .collection("EERecHits_V2")
            .add_property("energy", 0.0)
            .unwrap();

        let products = store_b.collection("Products_V1");
        let product = products.add_property("Product", "").unwrap();
        let item = products.create();
        assert_eq!(energy.index(), product.index());

        let err = products.set(item, energy, 1.5).unwrap_err();
        assert!(matches!(err, StoreError::ForeignHandle { .. }));
        assert_eq!(products.get(item, product).unwrap().as_str(), Some(""));
        assert!(products.get(item, energy).is_err());
    }

    #[test]
    fn test_set_by_name_unknown() {
        let mut coll = Collection::new("Test_V1");
        let item = coll.create();
        let err = coll.set_by_name(item, "missing", 1.0).unwrap_err();
        assert!(matches!(err, StoreError::UnknownProperty { .. }));
    }

    #[test]
    fn test_rows_keep_insertion_order() {
        let mut coll = Collection::new("Test_V1");
        let id = coll.add_property("detid", 0i32).unwrap();
        for i in 0..10 {
            let item = coll.create();
            coll.set(item, id, i).unwrap();
        }
        let ids: Vec<i32> = coll
            .items()
            .map(|item| coll.get(item, id).unwrap().as_int().unwrap())
            .collect();
        assert_eq!(ids, (0..10).collect::<Vec<_>>());
    }
}
