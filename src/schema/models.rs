//! Row models for the exported collections.

use crate::event::RecHit;
use crate::geometry::{CellGeometry, GlobalPoint, SubdetectorGeometry};
use crate::store::V3d;

use super::constants::{BACK_CORNERS, CORNER_COUNT, CORNER_SCALE, FRONT_CORNERS};

/// One rechit row, fully resolved against its cell geometry.
///
/// # Fields
/// - `energy`, `time`: copied from the hit, widened to f64
/// - `eta`, `phi`: cell position
/// - `detid`: raw id reinterpreted as i32
/// - `front`, `back`: corners after reordering and scaling to m
/// - `delta_eta`, `delta_phi`: subdetector granularity at this cell
///
/// Note: Cannot derive `Eq` because of the f64 fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RecHitRecord {
    pub energy: f64,
    pub eta: f64,
    pub phi: f64,
    pub time: f64,
    pub detid: i32,
    pub front: [V3d; 4],
    pub back: [V3d; 4],
    pub delta_eta: f64,
    pub delta_phi: f64,
}

impl RecHitRecord {
    /// Build the row for `hit`. Returns `None` if the cell does not have
    /// exactly [`CORNER_COUNT`] corners.
    pub fn resolve(
        hit: &RecHit,
        cell: &dyn CellGeometry,
        subdetector: &dyn SubdetectorGeometry,
    ) -> Option<Self> {
        let (front, back) = map_corners(cell.corners())?;
        let position = cell.position();
        Some(Self {
            energy: f64::from(hit.energy),
            eta: f64::from(position.eta()),
            phi: f64::from(position.phi()),
            time: f64::from(hit.time),
            detid: hit.detid.raw() as i32,
            front,
            back,
            delta_eta: f64::from(subdetector.delta_eta(hit.detid)),
            delta_phi: f64::from(subdetector.delta_phi(hit.detid)),
        })
    }
}

fn scale(p: &GlobalPoint) -> V3d {
    V3d::new(
        f64::from(p.x) / CORNER_SCALE,
        f64::from(p.y) / CORNER_SCALE,
        f64::from(p.z) / CORNER_SCALE,
    )
}

/// Reorder raw corners into (front, back) faces and convert cm to m.
///
/// `front[i]` is raw corner `FRONT_CORNERS[i]`, `back[i]` is raw corner
/// `BACK_CORNERS[i]`.
pub fn map_corners(corners: &[GlobalPoint]) -> Option<([V3d; 4], [V3d; 4])> {
    if corners.len() != CORNER_COUNT {
        return None;
    }
    let front = FRONT_CORNERS.map(|i| scale(&corners[i]));
    let back = BACK_CORNERS.map(|i| scale(&corners[i]));
    Some((front, back))
}

/// Provenance string `"<type>:<label>:<instance>:<process>"`.
pub fn product_string(type_name: &str, label: &str, instance: &str, process: &str) -> String {
    format!("{type_name}:{label}:{instance}:{process}")
}
