//! rechit-export library - calorimeter rechits into a schema-on-write record store.
//!
//! Each event, a [`RecHitExporter`] reads one rechit collection and the
//! calorimeter geometry, and writes one row per hit into a versioned
//! collection of a [`RecordStore`], plus one provenance row in `Products_V1`.
//! The store is then serialized as an ig JSON document for event display.
//!
//! # Modules
//!
//! - [`store`] - Generic collections of typed properties and ordered items
//! - [`schema`] - Collection names, rechit schema and the corner convention
//! - [`exporter`] - Per-event rechit to row transformation
//! - [`event`] / [`geometry`] - Data-source and geometry interfaces
//! - [`driver`] - Event loop over configured exporters
//! - [`output`] - ig JSON serialization and file layout
//!
//! # Example
//!
//! ```no_run
//! use rechit_export::{
//!     EventLoop, ExportConfig, IgPaths, LogSink, MemoryGeometry, StaticSetup,
//! };
//! use rechit_export::event::load_events;
//! use std::path::Path;
//!
//! let config = ExportConfig::load(Path::new("config.json"))?;
//! let geometry = MemoryGeometry::load(Path::new("geometry.json"))?;
//! let paths = IgPaths::new(Path::new("./out"));
//!
//! let mut event_loop = EventLoop::from_config(&config, LogSink::new())?;
//! for event in load_events(Path::new("events.json"))? {
//!     event_loop.process(&event, &StaticSetup::new(&geometry))?;
//!     paths.write_event(event.id, &event_loop.finish_event())?;
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

pub mod driver;
pub mod error;
pub mod event;
pub mod exporter;
pub mod geometry;
pub mod output;
pub mod schema;
pub mod sink;
pub mod store;

// Re-export for convenience
pub use driver::{EventLoop, ExportConfig};
pub use error::{ExportError, StoreError};
pub use event::{EventSetup, EventSource, InputTag, MemoryEvent, RecHit, StaticSetup};
pub use exporter::{DetectorKind, EventOutcome, ExporterConfig, RecHitExporter};
pub use geometry::{CaloGeometry, DetId, GlobalPoint, MemoryGeometry};
pub use output::{to_ig_json, IgPaths};
pub use sink::{ErrorSink, InMemorySink, LogSink};
pub use store::{Collection, PropertyType, PropertyValue, RecordStore, V3d};
