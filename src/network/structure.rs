//! Structural edits: adding and removing splines and their points.

use tracing::debug;

use crate::error::{ArgumentError, Result};
use crate::math::{Isometry3, Point3, Vector3};

use super::point::{PointId, SplinePoint};
use super::spline::{InterpolationMode, SplineData, SplineId};
use super::SplineNetwork;

/// Distance of each point of a default spline from its origin.
const DEFAULT_HALF_LENGTH: f64 = 2.0;

impl SplineNetwork {
    /// Creates a spline through `positions`.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::TooFewPoints`] if fewer than two positions are given.
    pub fn add_spline(&mut self, positions: &[Point3], mode: InterpolationMode) -> Result<SplineId> {
        self.add_spline_with_origin(positions, mode, Isometry3::identity())
    }

    /// Creates a two-point spline centered on `origin`, running along +Z.
    ///
    /// # Errors
    ///
    /// Propagates errors from [`Self::add_spline`].
    pub fn add_default_spline(&mut self, origin: Point3, mode: InterpolationMode) -> Result<SplineId> {
        let offset = Vector3::z() * DEFAULT_HALF_LENGTH;
        self.add_spline_with_origin(
            &[origin - offset, origin + offset],
            mode,
            Isometry3::translation(origin.x, origin.y, origin.z),
        )
    }

    fn add_spline_with_origin(
        &mut self,
        positions: &[Point3],
        mode: InterpolationMode,
        origin: Isometry3,
    ) -> Result<SplineId> {
        if positions.len() < 2 {
            return Err(ArgumentError::TooFewPoints {
                count: positions.len(),
            }
            .into());
        }
        let spline = self.splines.insert(SplineData::new(mode, origin));
        let points: Vec<PointId> = positions
            .iter()
            .enumerate()
            .map(|(index, position)| self.points.insert(SplinePoint::new(spline, index, *position)))
            .collect();
        self.spline_mut(spline)?.points.clone_from(&points);
        if mode == InterpolationMode::CatmullRom {
            self.react_to_moves(&points)?;
        }
        debug!(?spline, points = positions.len(), ?mode, "spline created");
        Ok(spline)
    }

    /// Removes a spline and its points, collapsing junctions left with
    /// fewer than two connections.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn remove_spline(&mut self, spline: SplineId) -> Result<()> {
        let points = self.spline(spline)?.points.clone();
        for point in &points {
            self.detach_point(*point)?;
        }
        for point in points {
            self.points.remove(point);
        }
        self.splines.remove(spline);
        debug!(?spline, "spline removed");
        Ok(())
    }

    /// Inserts a point at `index`; following points are renumbered.
    ///
    /// A new first or last point copies mode, twist and handle lengths from
    /// its neighbor. It always keeps the given position; it is not moved onto
    /// the neighbor.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or `index` exceeds the point count.
    pub fn insert_point(&mut self, spline: SplineId, position: Point3, index: usize) -> Result<PointId> {
        let count = self.spline(spline)?.points_count();
        if index > count {
            return Err(ArgumentError::PointIndexOutOfRange { index, count }.into());
        }
        let id = self.points.insert(SplinePoint::new(spline, index, position));
        self.spline_mut(spline)?.points.insert(index, id);
        self.renumber(spline, index + 1)?;

        let interpolator = self.spline(spline)?.mode.interpolator();
        interpolator.on_point_inserted(self, id)?;
        debug!(?spline, index, "point inserted");
        Ok(id)
    }

    /// Inserts a point after the last one.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn append_point(&mut self, spline: SplineId, position: Point3) -> Result<PointId> {
        let count = self.spline(spline)?.points_count();
        self.insert_point(spline, position, count)
    }

    /// Inserts a point before the first one.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn prepend_point(&mut self, spline: SplineId, position: Point3) -> Result<PointId> {
        self.insert_point(spline, position, 0)
    }

    /// Removes the point at `index`, detaching it from its junction.
    ///
    /// # Errors
    ///
    /// Returns [`ArgumentError::TooFewPoints`] if the spline would be left
    /// with fewer than two points, or an error if `index` is out of range.
    pub fn remove_point(&mut self, spline: SplineId, index: usize) -> Result<()> {
        let id = self.point_id(spline, index)?;
        let count = self.spline(spline)?.points_count();
        if count <= 2 {
            return Err(ArgumentError::TooFewPoints { count: count - 1 }.into());
        }
        self.detach_point(id)?;
        self.spline_mut(spline)?.points.remove(index);
        self.points.remove(id);
        self.renumber(spline, index)?;
        debug!(?spline, index, "point removed");

        let neighbor = self.point_id(spline, index.min(count - 2))?;
        self.react_to_moves(&[neighbor])
    }

    /// Rigid transform of the spline.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn spline_origin(&self, spline: SplineId) -> Result<Isometry3> {
        Ok(self.spline(spline)?.origin)
    }

    /// Moves the spline origin, carrying every point rigidly with it, then
    /// pushes the new point transforms onto their junctions.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is not found.
    pub fn set_spline_origin(&mut self, spline: SplineId, origin: Isometry3) -> Result<()> {
        let data = self.spline_mut(spline)?;
        let delta = origin * data.origin.inverse();
        data.origin = origin;
        let points = data.points.clone();
        for point in points {
            let p = self.point_mut(point)?;
            p.position = delta * p.position;
            p.rotation = delta.rotation * p.rotation;
        }
        self.update_junctions(spline)
    }

    /// Drops the point from its junction and collapses the junction if needed.
    fn detach_point(&mut self, id: PointId) -> Result<()> {
        if let Some(junction) = self.junction_of(id)? {
            self.junction_mut(junction)?.connections.retain(|p| *p != id);
            self.point_mut(id)?.data.junction = None;
            self.collapse_junction(junction)?;
        }
        Ok(())
    }

    fn renumber(&mut self, spline: SplineId, from: usize) -> Result<()> {
        let points = self.spline(spline)?.points.clone();
        for (index, point) in points.into_iter().enumerate().skip(from) {
            self.point_mut(point)?.index = index;
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::SplineGraphError;
    use crate::math::UnitQuaternion;
    use approx::assert_relative_eq;

    fn line(net: &mut SplineNetwork) -> SplineId {
        net.add_spline(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.0, 0.0, 3.0),
                Point3::new(0.0, 0.0, 6.0),
            ],
            InterpolationMode::Bezier,
        )
        .unwrap()
    }

    #[test]
    fn single_point_spline_is_rejected() {
        let mut net = SplineNetwork::new();
        let err = net
            .add_spline(&[Point3::origin()], InterpolationMode::Bezier)
            .unwrap_err();
        assert!(matches!(
            err,
            SplineGraphError::Argument(ArgumentError::TooFewPoints { count: 1 })
        ));
    }

    #[test]
    fn default_spline_straddles_origin() {
        let mut net = SplineNetwork::new();
        let s = net
            .add_default_spline(Point3::new(1.0, 0.0, 0.0), InterpolationMode::CatmullRom)
            .unwrap();
        assert_relative_eq!(net.point_position(s, 0).unwrap(), Point3::new(1.0, 0.0, -2.0));
        assert_relative_eq!(net.point_position(s, 1).unwrap(), Point3::new(1.0, 0.0, 2.0));
        assert_relative_eq!(
            net.spline_origin(s).unwrap().translation.vector,
            Vector3::new(1.0, 0.0, 0.0)
        );
    }

    #[test]
    fn insert_renumbers_following_points() {
        let mut net = SplineNetwork::new();
        let s = line(&mut net);
        let id = net.insert_point(s, Point3::new(1.0, 0.0, 1.5), 1).unwrap();
        assert_eq!(net.point(id).unwrap().index, 1);
        for (index, point) in net.spline(s).unwrap().points().iter().enumerate() {
            assert_eq!(net.point(*point).unwrap().index, index);
        }
        assert_relative_eq!(net.point_position(s, 3).unwrap(), Point3::new(0.0, 0.0, 6.0));
    }

    #[test]
    fn end_insertion_keeps_the_given_position() {
        let mut net = SplineNetwork::new();
        let s = line(&mut net);
        net.prepend_point(s, Point3::new(2.0, 0.0, -3.0)).unwrap();
        net.append_point(s, Point3::new(-2.0, 1.0, 9.0)).unwrap();
        assert_relative_eq!(net.point_position(s, 0).unwrap(), Point3::new(2.0, 0.0, -3.0));
        assert_relative_eq!(net.point_position(s, 4).unwrap(), Point3::new(-2.0, 1.0, 9.0));
    }

    #[test]
    fn appended_point_copies_neighbor_data() {
        let mut net = SplineNetwork::new();
        let s = line(&mut net);
        net.set_point_mode(s, 2, crate::network::PointMode::Mirrored).unwrap();
        net.append_point(s, Point3::new(0.0, 0.0, 9.0)).unwrap();
        assert_eq!(net.point_mode(s, 3).unwrap(), crate::network::PointMode::Mirrored);
        assert_relative_eq!(
            net.ctrl_point_position(s, 3, 1).unwrap(),
            Point3::new(0.0, 0.0, 10.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn insert_past_the_end_is_an_error() {
        let mut net = SplineNetwork::new();
        let s = line(&mut net);
        assert!(net.insert_point(s, Point3::origin(), 4).is_err());
    }

    #[test]
    fn remove_keeps_at_least_two_points() {
        let mut net = SplineNetwork::new();
        let s = line(&mut net);
        net.remove_point(s, 1).unwrap();
        assert_eq!(net.spline(s).unwrap().points_count(), 2);
        assert_eq!(net.point_at(s, 1).unwrap().index, 1);
        assert!(matches!(
            net.remove_point(s, 0),
            Err(SplineGraphError::Argument(ArgumentError::TooFewPoints { .. }))
        ));
    }

    #[test]
    fn removing_a_point_collapses_its_junction() {
        let mut net = SplineNetwork::new();
        let a = line(&mut net);
        let b = line(&mut net);
        let j = net.add_junction(Point3::origin(), UnitQuaternion::identity());
        net.junction_connect(j, a, 0).unwrap();
        net.junction_connect(j, b, 0).unwrap();
        net.remove_point(b, 0).unwrap();
        assert!(!net.contains_junction(j));
        assert_eq!(net.point_at(a, 0).unwrap().data.junction, None);
    }

    #[test]
    fn removing_a_spline_frees_its_points() {
        let mut net = SplineNetwork::new();
        let s = line(&mut net);
        let p = net.point_id(s, 0).unwrap();
        net.remove_spline(s).unwrap();
        assert!(net.point(p).is_err());
        assert!(!net.contains_spline(s));
    }

    #[test]
    fn origin_moves_points_rigidly() {
        let mut net = SplineNetwork::new();
        let s = line(&mut net);
        net.set_spline_origin(s, Isometry3::translation(0.0, 5.0, 0.0)).unwrap();
        assert_relative_eq!(net.point_position(s, 2).unwrap(), Point3::new(0.0, 5.0, 6.0));
        assert_relative_eq!(net.point_local_position(s, 2).unwrap(), Point3::new(0.0, 0.0, 6.0));
    }
}
