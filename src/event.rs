//! Event data-source interfaces.
//!
//! An event exposes hit collections addressed by a product type name plus an
//! [`InputTag`] (label, instance, process). The event setup exposes the
//! geometry valid for that event. [`MemoryEvent`] is a serde-loadable
//! implementation used by the CLI and the tests.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use crate::geometry::{CaloGeometry, DetId};

/// Producer address of a collection within one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct InputTag {
    pub label: String,
    pub instance: String,
    pub process: String,
}

impl InputTag {
    pub fn new(label: &str, instance: &str, process: &str) -> Self {
        Self {
            label: label.to_string(),
            instance: instance.to_string(),
            process: process.to_string(),
        }
    }

    /// True if a product registered under `label:instance:process` satisfies this tag.
    ///
    /// An empty process matches any process.
    pub fn matches(&self, label: &str, instance: &str, process: &str) -> bool {
        self.label == label
            && self.instance == instance
            && (self.process.is_empty() || self.process == process)
    }
}

impl FromStr for InputTag {
    type Err = anyhow::Error;

    /// Parse `label[:instance[:process]]`.
    fn from_str(s: &str) -> Result<Self> {
        let parts: Vec<&str> = s.split(':').collect();
        if parts.len() > 3 {
            bail!("Input tag '{s}' has more than three ':'-separated fields");
        }
        let label = parts[0].trim();
        if label.is_empty() {
            bail!("Input tag '{s}' has an empty label");
        }
        Ok(Self::new(
            label,
            parts.get(1).map_or("", |p| p.trim()),
            parts.get(2).map_or("", |p| p.trim()),
        ))
    }
}

impl fmt::Display for InputTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.label, self.instance, self.process)
    }
}

/// One reconstructed calorimeter hit.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct RecHit {
    pub detid: DetId,
    pub energy: f32,
    #[serde(default)]
    pub time: f32,
}

impl RecHit {
    pub const fn new(detid: DetId, energy: f32, time: f32) -> Self {
        Self {
            detid,
            energy,
            time,
        }
    }
}

/// Result of looking up a hit collection in an event.
#[derive(Debug, Clone, Copy)]
pub struct HitCollection<'a> {
    hits: &'a [RecHit],
    valid: bool,
}

impl<'a> HitCollection<'a> {
    pub fn new(hits: &'a [RecHit], valid: bool) -> Self {
        Self { hits, valid }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn hits(&self) -> &'a [RecHit] {
        self.hits
    }
}

/// Run and event numbers.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
pub struct EventId {
    pub run: u32,
    pub event: u64,
}

impl fmt::Display for EventId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "run {} event {}", self.run, self.event)
    }
}

/// Per-event access to hit collections.
pub trait EventSource {
    fn id(&self) -> EventId;

    /// Look up the collection of `type_name` produced under `tag`.
    fn collection(&self, type_name: &str, tag: &InputTag) -> Option<HitCollection<'_>>;
}

/// Per-event access to conditions such as geometry.
pub trait EventSetup {
    fn calo_geometry(&self) -> Option<&dyn CaloGeometry>;
}

/// Event setup backed by a fixed geometry (or none).
#[derive(Clone, Copy, Default)]
pub struct StaticSetup<'g> {
    geometry: Option<&'g dyn CaloGeometry>,
}

impl<'g> StaticSetup<'g> {
    pub fn new(geometry: &'g dyn CaloGeometry) -> Self {
        Self {
            geometry: Some(geometry),
        }
    }

    /// A setup with no geometry record.
    pub fn empty() -> Self {
        Self { geometry: None }
    }
}

impl EventSetup for StaticSetup<'_> {
    fn calo_geometry(&self) -> Option<&dyn CaloGeometry> {
        self.geometry
    }
}

/// A product stored in a [`MemoryEvent`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Product {
    #[serde(rename = "type")]
    pub type_name: String,
    pub label: String,
    #[serde(default)]
    pub instance: String,
    #[serde(default)]
    pub process: String,
    #[serde(default = "default_valid")]
    pub valid: bool,
    #[serde(default)]
    pub hits: Vec<RecHit>,
}

fn default_valid() -> bool {
    true
}

/// Event held entirely in memory.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MemoryEvent {
    #[serde(flatten)]
    pub id: EventId,
    #[serde(default)]
    pub products: Vec<Product>,
}

impl MemoryEvent {
    pub fn new(run: u32, event: u64) -> Self {
        Self {
            id: EventId { run, event },
            products: Vec::new(),
        }
    }

    /// Add a valid product.
    pub fn with_hits(mut self, type_name: &str, tag: &InputTag, hits: Vec<RecHit>) -> Self {
        self.products.push(Product {
            type_name: type_name.to_string(),
            label: tag.label.clone(),
            instance: tag.instance.clone(),
            process: tag.process.clone(),
            valid: true,
            hits,
        });
        self
    }

    /// Add a product the data source marks invalid.
    pub fn with_invalid(mut self, type_name: &str, tag: &InputTag) -> Self {
        self.products.push(Product {
            type_name: type_name.to_string(),
            label: tag.label.clone(),
            instance: tag.instance.clone(),
            process: tag.process.clone(),
            valid: false,
            hits: Vec::new(),
        });
        self
    }
}

impl EventSource for MemoryEvent {
    fn id(&self) -> EventId {
        self.id
    }

    fn collection(&self, type_name: &str, tag: &InputTag) -> Option<HitCollection<'_>> {
        // Latest product wins when the tag leaves the process open
        self.products
            .iter()
            .rev()
            .find(|p| {
                p.type_name == type_name && tag.matches(&p.label, &p.instance, &p.process)
            })
            .map(|p| HitCollection::new(&p.hits, p.valid))
    }
}

#[derive(Deserialize)]
struct EventsFile {
    events: Vec<MemoryEvent>,
}

/// Load a `{"events": [...]}` document.
pub fn load_events(path: &Path) -> Result<Vec<MemoryEvent>> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read events file {}", path.display()))?;
    let file: EventsFile = serde_json::from_str(&json)
        .with_context(|| format!("Failed to parse events file {}", path.display()))?;
    Ok(file.events)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_tag_parse_full() {
        let tag: InputTag = "ecalRecHit:EcalRecHitsEE:RECO".parse().unwrap();
        assert_eq!(tag, InputTag::new("ecalRecHit", "EcalRecHitsEE", "RECO"));
        assert_eq!(tag.to_string(), "ecalRecHit:EcalRecHitsEE:RECO");
    }

    #[test]
    fn test_input_tag_parse_label_only() {
        let tag: InputTag = "hbhereco".parse().unwrap();
        assert_eq!(tag, InputTag::new("hbhereco", "", ""));
        assert_eq!(tag.to_string(), "hbhereco::");
    }

    #[test]
    fn test_input_tag_parse_errors() {
        assert!("".parse::<InputTag>().is_err());
        assert!(":inst:proc".parse::<InputTag>().is_err());
        assert!("a:b:c:d".parse::<InputTag>().is_err());
    }

    #[test]
    fn test_collection_lookup() {
        let tag = InputTag::new("L", "I", "P");
        let event = MemoryEvent::new(1, 1).with_hits(
            "EcalRecHitCollection",
            &tag,
            vec![RecHit::new(DetId(1), 1.0, 0.0)],
        );

        let found = event.collection("EcalRecHitCollection", &tag).unwrap();
        assert!(found.is_valid());
        assert_eq!(found.hits().len(), 1);

        assert!(event.collection("HFRecHitCollection", &tag).is_none());
        assert!(event
            .collection("EcalRecHitCollection", &InputTag::new("L", "other", "P"))
            .is_none());
    }

    #[test]
    fn test_empty_process_matches_latest() {
        let event = MemoryEvent::new(1, 1)
            .with_hits(
                "EcalRecHitCollection",
                &InputTag::new("L", "I", "RECO"),
                vec![RecHit::new(DetId(1), 1.0, 0.0)],
            )
            .with_hits(
                "EcalRecHitCollection",
                &InputTag::new("L", "I", "REPROCESS"),
                vec![
                    RecHit::new(DetId(1), 1.0, 0.0),
                    RecHit::new(DetId(2), 2.0, 0.0),
                ],
            );

        let found = event
            .collection("EcalRecHitCollection", &InputTag::new("L", "I", ""))
            .unwrap();
        assert_eq!(found.hits().len(), 2);
    }

    #[test]
    fn test_event_from_json() {
        let json = r#"{
            "events": [
                {
                    "run": 1,
                    "event": 7,
                    "products": [
                        {
                            "type": "EcalRecHitCollection",
                            "label": "ecalRecHit",
                            "instance": "EcalRecHitsEE",
                            "process": "RECO",
                            "hits": [{"detid": 42, "energy": 1.5, "time": 3.2}]
                        },
                        {
                            "type": "HFRecHitCollection",
                            "label": "hfreco",
                            "valid": false
                        }
                    ]
                }
            ]
        }"#;
        let file: EventsFile = serde_json::from_str(json).unwrap();
        let event = &file.events[0];
        assert_eq!(event.id(), EventId { run: 1, event: 7 });
        assert_eq!(event.products.len(), 2);
        assert_eq!(event.products[0].hits[0].detid, DetId(42));
        assert!(!event.products[1].valid);
    }
}
