//! Fixed names and conventions of the exported collections.
//!
//! Downstream display code relies on these values; they are part of the
//! output format.

/// Provenance collection, one row per exporter per event.
pub const PRODUCTS_COLLECTION: &str = "Products_V1";

/// String property of [`PRODUCTS_COLLECTION`].
pub const PRODUCT_PROPERTY: &str = "Product";

/// Schema version suffix of every `<Kind>RecHits` collection.
pub const RECHIT_SCHEMA_VERSION: u32 = 2;

/// Number of corners of a well-formed calorimeter cell.
pub const CORNER_COUNT: usize = 8;

/// Geometry corners are in cm, the display works in m.
pub const CORNER_SCALE: f64 = 100.0;

/// Raw corner index written to `front_1..front_4`.
pub const FRONT_CORNERS: [usize; 4] = [3, 2, 1, 0];

/// Raw corner index written to `back_1..back_4`.
pub const BACK_CORNERS: [usize; 4] = [7, 6, 5, 4];

pub const FRONT_NAMES: [&str; 4] = ["front_1", "front_2", "front_3", "front_4"];

pub const BACK_NAMES: [&str; 4] = ["back_1", "back_2", "back_3", "back_4"];
