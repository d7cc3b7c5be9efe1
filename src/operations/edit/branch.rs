use tracing::debug;

use crate::error::Result;
use crate::math::Point3;
use crate::network::{SplineId, SplineNetwork};

/// Grows a new two-point spline out of (or into) a spline point.
pub struct CreateBranch {
    spline: SplineId,
    index: usize,
    is_out: bool,
}

impl CreateBranch {
    /// Creates a new `CreateBranch` operation.
    ///
    /// With `is_out` the branch starts at the point; otherwise it ends there.
    #[must_use]
    pub fn new(spline: SplineId, index: usize, is_out: bool) -> Self {
        Self {
            spline,
            index,
            is_out,
        }
    }

    /// Executes the operation, returning the junction connection index of
    /// the new branch.
    ///
    /// A junction is created at the point first if it has none. The branch
    /// inherits the point's mode and the spline's interpolation mode, and is
    /// centered on the spline origin before being snapped onto the junction.
    ///
    /// # Errors
    ///
    /// Returns an error if the spline is missing or the index is out of range.
    pub fn execute(&self, net: &mut SplineNetwork) -> Result<usize> {
        let anchor = net.point_at(self.spline, self.index)?;
        let (position, rotation) = (anchor.position, anchor.rotation);
        let mode = net.point_mode(self.spline, self.index)?;
        let data = net.spline(self.spline)?;
        let (interpolation, origin) = (data.mode, data.origin);

        let junction = match net.point_junction(self.spline, self.index)? {
            Some(junction) => junction,
            None => {
                let junction = net.add_junction(position, rotation);
                net.junction_connect(junction, self.spline, self.index)?;
                junction
            }
        };

        let branch = net.add_default_spline(Point3::from(origin.translation.vector), interpolation)?;
        net.set_spline_mode(branch, mode)?;
        net.junction_connect(junction, branch, usize::from(!self.is_out))?;

        let connection = net.junction(junction)?.connections_count() - 1;
        debug!(?junction, ?branch, connection, is_out = self.is_out, "branch created");
        Ok(connection)
    }
}
