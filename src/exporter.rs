use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;
use serde::Deserialize;

use crate::error::ExportError;
use crate::event::{EventSetup, EventSource, InputTag, RecHit};
use crate::geometry::CaloGeometry;
use crate::schema::{
    declare_schema, product_string, products_schema, RecHitProperties, RecHitRecord,
    CORNER_COUNT, PRODUCTS_COLLECTION, RECHIT_SCHEMA_VERSION,
};
use crate::sink::ErrorSink;
use crate::store::{CollectionName, RecordStore};

/// Calorimeter partition whose rechits are exported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "String")]
pub enum DetectorKind {
    EB,
    EE,
    HB,
    HE,
    HF,
    HO,
}

impl DetectorKind {
    pub const ALL: [DetectorKind; 6] = [
        DetectorKind::EB,
        DetectorKind::EE,
        DetectorKind::HB,
        DetectorKind::HE,
        DetectorKind::HF,
        DetectorKind::HO,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            DetectorKind::EB => "EB",
            DetectorKind::EE => "EE",
            DetectorKind::HB => "HB",
            DetectorKind::HE => "HE",
            DetectorKind::HF => "HF",
            DetectorKind::HO => "HO",
        }
    }

    /// Friendly type name of the input collection.
    pub fn collection_type(&self) -> &'static str {
        match self {
            DetectorKind::EB | DetectorKind::EE => "EcalRecHitCollection",
            DetectorKind::HB | DetectorKind::HE => "HBHERecHitCollection",
            DetectorKind::HF => "HFRecHitCollection",
            DetectorKind::HO => "HORecHitCollection",
        }
    }

    /// Base name of the output collection, e.g. `EERecHits`.
    pub fn base_name(&self) -> String {
        format!("{self}RecHits")
    }

    /// Versioned output collection name, e.g. `EERecHits_V2`.
    pub fn output_collection(&self) -> CollectionName {
        CollectionName::new(&self.base_name(), RECHIT_SCHEMA_VERSION)
    }
}

impl fmt::Display for DetectorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for DetectorKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| {
                anyhow!("unknown detector kind '{s}', expected one of EB, EE, HB, HE, HF, HO")
            })
    }
}

impl TryFrom<String> for DetectorKind {
    type Error = anyhow::Error;

    fn try_from(s: String) -> anyhow::Result<Self> {
        s.parse()
    }
}

/// Construction parameters of one exporter.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ExporterConfig {
    pub detector: DetectorKind,
    /// `label[:instance[:process]]` of the input collection.
    #[serde(default)]
    pub input_tag: Option<String>,
}

impl ExporterConfig {
    pub fn new(detector: DetectorKind, input_tag: &str) -> Self {
        Self {
            detector,
            input_tag: Some(input_tag.to_string()),
        }
    }
}

/// What happened to one exporter in one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    /// Provenance row and `hits` rechit rows were written.
    Exported { hits: usize },
    /// Input was missing; an error was reported and nothing was written.
    Skipped,
}

/// Writes one detector partition's rechits into the record store.
pub struct RecHitExporter {
    detector: DetectorKind,
    input_tag: InputTag,
    collection: String,
    // Counters over the whole run
    events_exported: u64,
    events_skipped: u64,
    hits_exported: u64,
}

impl RecHitExporter {
    /// Build an exporter. Fails if the input tag is missing or malformed.
    pub fn new(config: &ExporterConfig) -> Result<Self, ExportError> {
        let module = config.detector.base_name();
        let raw = config
            .input_tag
            .as_deref()
            .ok_or_else(|| ExportError::MissingDependency {
                module: module.clone(),
                message: "no input tag configured".to_string(),
            })?;
        let input_tag = raw
            .parse::<InputTag>()
            .map_err(|e| ExportError::MissingDependency {
                module: module.clone(),
                message: e.to_string(),
            })?;

        Ok(Self {
            detector: config.detector,
            input_tag,
            collection: config.detector.output_collection().to_string(),
            events_exported: 0,
            events_skipped: 0,
            hits_exported: 0,
        })
    }

    pub fn detector(&self) -> DetectorKind {
        self.detector
    }

    pub fn input_tag(&self) -> &InputTag {
        &self.input_tag
    }

    /// Name of the rechit collection this exporter writes.
    pub fn collection_name(&self) -> &str {
        &self.collection
    }

    /// Provenance string written to `Products_V1`.
    pub fn product(&self) -> String {
        product_string(
            self.detector.collection_type(),
            &self.input_tag.label,
            &self.input_tag.instance,
            &self.input_tag.process,
        )
    }

    pub fn events_exported(&self) -> u64 {
        self.events_exported
    }

    pub fn events_skipped(&self) -> u64 {
        self.events_skipped
    }

    pub fn hits_exported(&self) -> u64 {
        self.hits_exported
    }

    /// Export one event.
    ///
    /// Missing geometry or a missing/invalid hit collection is reported to
    /// `sink` and yields [`EventOutcome::Skipped`] with nothing written.
    /// A cell that cannot be resolved or does not have eight corners is a
    /// [`ExportError::GeometryContractViolation`] and must stop the run.
    pub fn analyze(
        &mut self,
        event: &dyn EventSource,
        setup: &dyn EventSetup,
        store: &mut RecordStore,
        sink: &mut dyn ErrorSink,
    ) -> Result<EventOutcome, ExportError> {
        let Some(geometry) = setup.calo_geometry() else {
            self.skip(sink, "requires a valid CaloGeometryRecord".to_string());
            return Ok(EventOutcome::Skipped);
        };

        let type_name = self.detector.collection_type();
        let hits = match event.collection(type_name, &self.input_tag) {
            Some(collection) if collection.is_valid() => collection.hits(),
            _ => {
                self.skip(sink, format!("{} are not found.", self.product()));
                return Ok(EventOutcome::Skipped);
            }
        };

        // Resolve every hit first so a geometry violation writes nothing
        let records = hits
            .iter()
            .map(|hit| self.resolve(geometry, hit))
            .collect::<Result<Vec<_>, _>>()?;

        let products = store.collection(PRODUCTS_COLLECTION);
        let product = declare_schema(products, &products_schema())?[0];
        let item = products.create();
        products.set(item, product, self.product())?;

        let rechits = store.collection(&self.collection);
        let properties = RecHitProperties::declare(rechits)?;
        for record in &records {
            properties.write(rechits, record)?;
        }

        tracing::debug!(
            "{}: exported {} hits for {}",
            self.collection,
            hits.len(),
            event.id()
        );
        self.events_exported += 1;
        self.hits_exported += hits.len() as u64;
        Ok(EventOutcome::Exported { hits: hits.len() })
    }

    fn resolve(
        &self,
        geometry: &dyn CaloGeometry,
        hit: &RecHit,
    ) -> Result<RecHitRecord, ExportError> {
        let cell = geometry
            .cell(hit.detid)
            .ok_or_else(|| self.violation(hit, "no cell geometry".to_string()))?;
        let subdetector = geometry
            .subdetector(hit.detid)
            .ok_or_else(|| self.violation(hit, "no subdetector geometry".to_string()))?;

        RecHitRecord::resolve(hit, cell, subdetector).ok_or_else(|| {
            self.violation(
                hit,
                format!(
                    "expected {} corners, got {}",
                    CORNER_COUNT,
                    cell.corners().len()
                ),
            )
        })
    }

    fn violation(&self, hit: &RecHit, message: String) -> ExportError {
        ExportError::GeometryContractViolation {
            module: self.detector.base_name(),
            detid: hit.detid.raw(),
            message,
        }
    }

    fn skip(&mut self, sink: &mut dyn ErrorSink, what: String) {
        let err = ExportError::MissingOrInvalidInput {
            module: self.detector.base_name(),
            what,
        };
        sink.report(&err.to_string());
        self.events_skipped += 1;
    }
}
