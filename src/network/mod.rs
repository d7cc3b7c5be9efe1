pub mod junction;
pub mod point;
pub mod spline;
mod structure;

pub use junction::{Connection, JunctionData, JunctionId};
pub use point::{ControlPoint, PointData, PointId, PointMode, SplinePoint, Twist};
pub use spline::{InterpolationMode, SplineData, SplineId};

use slotmap::SlotMap;

use crate::error::{ArgumentError, EntityError, Result};
use crate::math::rotation::{delta_angle, roll_degrees};
use crate::math::UnitQuaternion;

/// Central arena that owns all splines, points and junctions.
///
/// Entities reference each other via typed IDs (generational indices):
/// a spline owns its points, a junction only lists the points connected to
/// it, and a point refers back to its junction by ID.
#[derive(Debug, Default)]
pub struct SplineNetwork {
    splines: SlotMap<SplineId, SplineData>,
    points: SlotMap<PointId, SplinePoint>,
    junctions: SlotMap<JunctionId, JunctionData>,
}

impl SplineNetwork {
    /// Creates a new, empty network.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    // --- Spline lookup ---

    /// Returns a reference to the spline data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not in the network.
    pub fn spline(&self, id: SplineId) -> Result<&SplineData> {
        self.splines
            .get(id)
            .ok_or_else(|| EntityError::SplineNotFound.into())
    }

    pub(crate) fn spline_mut(&mut self, id: SplineId) -> Result<&mut SplineData> {
        self.splines
            .get_mut(id)
            .ok_or_else(|| EntityError::SplineNotFound.into())
    }

    /// Iterates over all splines in the network.
    pub fn splines(&self) -> impl Iterator<Item = (SplineId, &SplineData)> {
        self.splines.iter()
    }

    /// Returns `true` if the spline is alive.
    #[must_use]
    pub fn contains_spline(&self, id: SplineId) -> bool {
        self.splines.contains_key(id)
    }

    // --- Point lookup ---

    /// Returns a reference to a point by ID, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the point is not in the network.
    pub fn point(&self, id: PointId) -> Result<&SplinePoint> {
        self.points
            .get(id)
            .ok_or_else(|| EntityError::PointNotFound.into())
    }

    pub(crate) fn point_mut(&mut self, id: PointId) -> Result<&mut SplinePoint> {
        self.points
            .get_mut(id)
            .ok_or_else(|| EntityError::PointNotFound.into())
    }

    /// Resolves the point at `index` of `spline`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn point_id(&self, spline: SplineId, index: usize) -> Result<PointId> {
        let data = self.spline(spline)?;
        data.points.get(index).copied().ok_or_else(|| {
            ArgumentError::PointIndexOutOfRange {
                index,
                count: data.points.len(),
            }
            .into()
        })
    }

    /// Returns the point at `index` of `spline`.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` is out of range.
    pub fn point_at(&self, spline: SplineId, index: usize) -> Result<&SplinePoint> {
        self.point(self.point_id(spline, index)?)
    }

    // --- Junction lookup ---

    /// Returns a reference to the junction data, or an error if not found.
    ///
    /// # Errors
    ///
    /// Returns an error if the junction is not in the network.
    pub fn junction(&self, id: JunctionId) -> Result<&JunctionData> {
        self.junctions
            .get(id)
            .ok_or_else(|| EntityError::JunctionNotFound.into())
    }

    pub(crate) fn junction_mut(&mut self, id: JunctionId) -> Result<&mut JunctionData> {
        self.junctions
            .get_mut(id)
            .ok_or_else(|| EntityError::JunctionNotFound.into())
    }

    /// Iterates over all junctions in the network.
    pub fn junctions(&self) -> impl Iterator<Item = (JunctionId, &JunctionData)> {
        self.junctions.iter()
    }

    /// Returns `true` if the junction is alive.
    #[must_use]
    pub fn contains_junction(&self, id: JunctionId) -> bool {
        self.junctions.contains_key(id)
    }

    // --- Shared internals ---

    /// The live junction a point belongs to, if any.
    pub(crate) fn junction_of(&self, id: PointId) -> Result<Option<JunctionId>> {
        let junction = self.point(id)?.data.junction;
        Ok(junction.filter(|j| self.junctions.contains_key(*j)))
    }

    /// All points geometrically tied to `id`: its junction's connections, or `id` alone.
    pub(crate) fn junction_group(&self, id: PointId) -> Result<Vec<PointId>> {
        let mut group = vec![id];
        if let Some(j) = self.junction_of(id)? {
            group.extend(
                self.junction(j)?
                    .connections
                    .iter()
                    .copied()
                    .filter(|p| *p != id),
            );
        }
        Ok(group)
    }

    /// Sets a rotation, swinging the handles with it and folding its roll into the twist.
    pub(crate) fn apply_rotation(&mut self, id: PointId, rotation: UnitQuaternion) -> Result<()> {
        let point = self.point_mut(id)?;
        point.rotation = rotation;
        let twist = &mut point.data.twist;
        twist.angle += delta_angle(twist.angle, roll_degrees(&rotation));
        Ok(())
    }
}
