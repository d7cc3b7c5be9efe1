use tracing::debug;

use crate::error::Result;
use crate::network::{SplineId, SplineNetwork};

/// Joins two spline points into one junction.
pub struct ConnectPoints {
    spline: SplineId,
    index: usize,
    other: SplineId,
    other_index: usize,
}

impl ConnectPoints {
    /// Creates a new `ConnectPoints` operation joining point `index` of
    /// `spline` with point `other_index` of `other`.
    #[must_use]
    pub fn new(spline: SplineId, index: usize, other: SplineId, other_index: usize) -> Self {
        Self {
            spline,
            index,
            other,
            other_index,
        }
    }

    /// Executes the operation.
    ///
    /// - Neither point has a junction: one is created at the first point.
    /// - Only the other point has one: that junction moves onto the first
    ///   point, which then joins it.
    /// - Only the first point has one: the other point joins it.
    /// - Both have distinct junctions: every connection of the other
    ///   junction moves over and the other junction is removed.
    ///
    /// Connecting a point to itself, or two points already sharing a
    /// junction, does nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if either spline is missing or either index is out of range.
    pub fn execute(&self, net: &mut SplineNetwork) -> Result<()> {
        let this_point = net.point_id(self.spline, self.index)?;
        let other_point = net.point_id(self.other, self.other_index)?;
        if this_point == other_point {
            return Ok(());
        }

        let this_junction = net.point_junction(self.spline, self.index)?;
        let other_junction = net.point_junction(self.other, self.other_index)?;
        let (position, rotation) = {
            let point = net.point(this_point)?;
            (point.position, point.rotation)
        };

        match (this_junction, other_junction) {
            (None, None) => {
                let junction = net.add_junction(position, rotation);
                net.junction_connect(junction, self.spline, self.index)?;
                net.junction_connect(junction, self.other, self.other_index)?;
            }
            (None, Some(junction)) => {
                net.set_junction_position(junction, position)?;
                net.set_junction_rotation(junction, rotation)?;
                net.junction_connect(junction, self.spline, self.index)?;
            }
            (Some(junction), None) => {
                net.junction_connect(junction, self.other, self.other_index)?;
            }
            (Some(junction), Some(other)) if junction == other => {}
            (Some(junction), Some(other)) => {
                for connection in net.junction_connections(other)? {
                    net.junction_connect(junction, connection.spline, connection.point_index)?;
                }
                if net.contains_junction(other) {
                    net.remove_junction(other)?;
                }
                debug!(?junction, removed = ?other, "junctions merged");
            }
        }
        Ok(())
    }
}
