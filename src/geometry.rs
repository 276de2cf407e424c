//! Calorimeter geometry interfaces.
//!
//! The exporter only needs three things from a geometry service: a cell's
//! position, its eight corners, and the angular granularity of the subdetector
//! that owns it. These are expressed as traits so any geometry backend can be
//! plugged in. [`MemoryGeometry`] is a table-backed implementation loaded from
//! JSON, used by the CLI and the tests.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// Raw detector identifier.
///
/// Layout of the 32-bit word:
/// - bits 28..32: detector (3 = ECAL, 4 = HCAL)
/// - bits 25..28: subdetector within the detector
/// - bits 0..25: cell index, opaque here
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(transparent)]
pub struct DetId(pub u32);

impl DetId {
    pub const fn new(det: u8, subdet: u8, index: u32) -> Self {
        DetId(((det as u32 & 0xF) << 28) | ((subdet as u32 & 0x7) << 25) | (index & 0x1FF_FFFF))
    }

    #[inline(always)]
    pub const fn raw(&self) -> u32 {
        self.0
    }

    #[inline(always)]
    pub const fn det(&self) -> u8 {
        ((self.0 >> 28) & 0xF) as u8
    }

    #[inline(always)]
    pub const fn subdet(&self) -> u8 {
        ((self.0 >> 25) & 0x7) as u8
    }
}

impl fmt::Display for DetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

/// Point in the global detector frame, in the geometry's native length unit (cm).
#[derive(Debug, Clone, Copy, Default, PartialEq, Deserialize)]
#[serde(from = "[f32; 3]")]
pub struct GlobalPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl From<[f32; 3]> for GlobalPoint {
    fn from(v: [f32; 3]) -> Self {
        GlobalPoint::new(v[0], v[1], v[2])
    }
}

impl GlobalPoint {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Point at distance `r` from the origin along direction (`eta`, `phi`).
    pub fn from_polar(r: f32, eta: f32, phi: f32) -> Self {
        let theta = 2.0 * (-eta).exp().atan();
        Self {
            x: r * theta.sin() * phi.cos(),
            y: r * theta.sin() * phi.sin(),
            z: r * theta.cos(),
        }
    }

    /// Transverse distance from the beam axis.
    pub fn perp(&self) -> f32 {
        self.x.hypot(self.y)
    }

    pub fn mag(&self) -> f32 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Pseudorapidity.
    pub fn eta(&self) -> f32 {
        (self.z / self.perp()).asinh()
    }

    /// Azimuthal angle in (-pi, pi].
    pub fn phi(&self) -> f32 {
        self.y.atan2(self.x)
    }
}

/// Geometry of a single calorimeter cell.
pub trait CellGeometry {
    /// Reference position of the cell (front-face centre).
    fn position(&self) -> GlobalPoint;

    /// Corners of the cell volume. Well-formed cells have exactly eight:
    /// indices 0..4 on one face and 4..8 on the other.
    fn corners(&self) -> &[GlobalPoint];
}

/// Per-subdetector queries keyed by cell id.
pub trait SubdetectorGeometry {
    fn delta_eta(&self, id: DetId) -> f32;
    fn delta_phi(&self, id: DetId) -> f32;
}

/// Geometry service resolving ids to cells and subdetectors.
pub trait CaloGeometry {
    fn cell(&self, id: DetId) -> Option<&dyn CellGeometry>;
    fn subdetector(&self, id: DetId) -> Option<&dyn SubdetectorGeometry>;
}

/// One cell entry of a geometry table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CellSpec {
    pub detid: DetId,
    pub position: GlobalPoint,
    pub corners: Vec<GlobalPoint>,
    #[serde(default)]
    pub delta_eta: f32,
    #[serde(default)]
    pub delta_phi: f32,
}

impl CellGeometry for CellSpec {
    fn position(&self) -> GlobalPoint {
        self.position
    }

    fn corners(&self) -> &[GlobalPoint] {
        &self.corners
    }
}

/// Cell table for one (detector, subdetector) pair.
#[derive(Debug, Default)]
pub struct MemorySubdetector {
    cells: HashMap<DetId, CellSpec>,
}

impl SubdetectorGeometry for MemorySubdetector {
    fn delta_eta(&self, id: DetId) -> f32 {
        self.cells.get(&id).map_or(0.0, |c| c.delta_eta)
    }

    fn delta_phi(&self, id: DetId) -> f32 {
        self.cells.get(&id).map_or(0.0, |c| c.delta_phi)
    }
}

#[derive(Deserialize)]
struct GeometryFile {
    cells: Vec<CellSpec>,
}

/// Table-backed [`CaloGeometry`].
#[derive(Debug, Default)]
pub struct MemoryGeometry {
    // Key: (det, subdet)
    subdetectors: HashMap<(u8, u8), MemorySubdetector>,
}

impl MemoryGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_cells(cells: impl IntoIterator<Item = CellSpec>) -> Self {
        let mut geometry = Self::new();
        for cell in cells {
            geometry.insert(cell);
        }
        geometry
    }

    /// Parse a `{"cells": [...]}` document.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let file: GeometryFile =
            serde_json::from_str(json).context("Failed to parse geometry JSON")?;
        Ok(Self::from_cells(file.cells))
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read geometry file {}", path.display()))?;
        let geometry = Self::from_json_str(&json)?;
        tracing::info!(
            "Loaded {} cells from {}",
            geometry.cell_count(),
            path.display()
        );
        Ok(geometry)
    }

    /// Add or replace a cell.
    pub fn insert(&mut self, cell: CellSpec) {
        let key = (cell.detid.det(), cell.detid.subdet());
        self.subdetectors
            .entry(key)
            .or_default()
            .cells
            .insert(cell.detid, cell);
    }

    pub fn cell_count(&self) -> usize {
        self.subdetectors.values().map(|s| s.cells.len()).sum()
    }
}

impl CaloGeometry for MemoryGeometry {
    fn cell(&self, id: DetId) -> Option<&dyn CellGeometry> {
        self.subdetectors
            .get(&(id.det(), id.subdet()))
            .and_then(|s| s.cells.get(&id))
            .map(|c| c as &dyn CellGeometry)
    }

    fn subdetector(&self, id: DetId) -> Option<&dyn SubdetectorGeometry> {
        self.subdetectors
            .get(&(id.det(), id.subdet()))
            .map(|s| s as &dyn SubdetectorGeometry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cube_corners() -> Vec<GlobalPoint> {
        (0..8)
            .map(|i| GlobalPoint::new(i as f32, i as f32, i as f32))
            .collect()
    }

    #[test]
    fn test_detid_fields() {
        let id = DetId::new(3, 2, 0x1234);
        assert_eq!(id.det(), 3);
        assert_eq!(id.subdet(), 2);
        assert_eq!(id.raw() & 0x1FF_FFFF, 0x1234);
    }

    #[test]
    fn test_polar_round_trip() {
        let p = GlobalPoint::from_polar(150.0, 0.1, 0.2);
        assert!((p.eta() - 0.1).abs() < 1e-5);
        assert!((p.phi() - 0.2).abs() < 1e-5);
        assert!((p.mag() - 150.0).abs() < 1e-3);
    }

    #[test]
    fn test_negative_eta_is_backward() {
        let p = GlobalPoint::from_polar(100.0, -2.0, 1.0);
        assert!(p.z < 0.0);
        assert!((p.eta() + 2.0).abs() < 1e-4);
    }

    #[test]
    fn test_memory_geometry_lookup() {
        let id = DetId::new(3, 2, 7);
        let geometry = MemoryGeometry::from_cells([CellSpec {
            detid: id,
            position: GlobalPoint::new(1.0, 0.0, 0.0),
            corners: cube_corners(),
            delta_eta: 0.01,
            delta_phi: 0.02,
        }]);

        let cell = geometry.cell(id).unwrap();
        assert_eq!(cell.corners().len(), 8);
        let sub = geometry.subdetector(id).unwrap();
        assert_eq!(sub.delta_eta(id), 0.01);
        assert_eq!(sub.delta_phi(id), 0.02);

        assert!(geometry.cell(DetId::new(3, 2, 8)).is_none());
        assert!(geometry.subdetector(DetId::new(4, 1, 7)).is_none());
    }

    #[test]
    fn test_geometry_from_json() {
        let json = r#"{
            "cells": [
                {
                    "detid": 42,
                    "position": [1.0, 2.0, 3.0],
                    "corners": [[0,0,0],[1,1,1],[2,2,2],[3,3,3],[4,4,4],[5,5,5],[6,6,6],[7,7,7]],
                    "delta_eta": 0.5
                }
            ]
        }"#;
        let geometry = MemoryGeometry::from_json_str(json).unwrap();
        assert_eq!(geometry.cell_count(), 1);
        let cell = geometry.cell(DetId(42)).unwrap();
        assert_eq!(cell.position(), GlobalPoint::new(1.0, 2.0, 3.0));
        assert_eq!(cell.corners()[7], GlobalPoint::new(7.0, 7.0, 7.0));
        assert_eq!(geometry.subdetector(DetId(42)).unwrap().delta_phi(DetId(42)), 0.0);
    }
}
