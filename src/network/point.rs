use crate::math::{Point3, UnitQuaternion, Vector3};

use super::junction::JunctionId;
use super::spline::SplineId;

slotmap::new_key_type! {
    /// Unique identifier for a spline point in the network.
    pub struct PointId;
}

/// Continuity constraint between the two tangent handles of a point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum PointMode {
    /// Handles move independently.
    #[default]
    Free,
    /// Handles stay collinear through the point; each keeps its own length.
    Aligned,
    /// Handles stay collinear and of equal length.
    Mirrored,
}

/// Roll applied along the curve around a point.
///
/// `t0` and `t1` are hold regions, as fractions of the curve before and
/// after the point, in which the angle is not interpolated.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Twist {
    /// Roll angle in degrees.
    pub angle: f64,
    pub t0: f64,
    pub t1: f64,
}

/// Per-point attributes shared across a junction.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointData {
    /// Weak reference to the junction the point belongs to.
    pub junction: Option<JunctionId>,
    pub twist: Twist,
    pub mode: PointMode,
}

impl PointData {
    /// Copy of the twist and mode, without the junction reference.
    #[must_use]
    pub fn detached(&self) -> Self {
        Self {
            junction: None,
            twist: self.twist,
            mode: self.mode,
        }
    }
}

/// A tangent handle owned by a spline point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlPoint {
    /// Offset from the owning point, in the point's local frame.
    pub offset: Vector3,
}

impl ControlPoint {
    /// Index of the paired handle on the same point.
    #[must_use]
    pub fn twin_index(index: usize) -> usize {
        (index + 1) % 2
    }
}

/// A vertex of a spline.
#[derive(Debug, Clone)]
pub struct SplinePoint {
    /// Owning spline.
    pub spline: SplineId,
    /// Position within the owning spline, kept in sync by insert/remove.
    pub index: usize,
    pub position: Point3,
    pub rotation: UnitQuaternion,
    pub data: PointData,
    pub ctrl_points: [ControlPoint; 2],
}

impl SplinePoint {
    /// Creates a point with identity rotation and unit handles behind and ahead of it.
    #[must_use]
    pub fn new(spline: SplineId, index: usize, position: Point3) -> Self {
        Self {
            spline,
            index,
            position,
            rotation: UnitQuaternion::identity(),
            data: PointData::default(),
            ctrl_points: [
                ControlPoint {
                    offset: -Vector3::z(),
                },
                ControlPoint {
                    offset: Vector3::z(),
                },
            ],
        }
    }

    /// World position of a handle.
    #[must_use]
    pub fn ctrl_point_position(&self, ctrl: usize) -> Point3 {
        self.position + self.rotation * self.ctrl_points[ctrl].offset
    }

    /// Places a handle at a world position.
    pub fn place_ctrl_point(&mut self, ctrl: usize, position: &Point3) {
        self.ctrl_points[ctrl].offset = self.rotation.inverse_transform_vector(&(position - self.position));
    }

    /// Changes the rotation while keeping both handles at their world positions.
    pub fn rotate_in_place(&mut self, rotation: UnitQuaternion) {
        let handles = [self.ctrl_point_position(0), self.ctrl_point_position(1)];
        self.rotation = rotation;
        for (ctrl, handle) in handles.iter().enumerate() {
            self.place_ctrl_point(ctrl, handle);
        }
    }
}
