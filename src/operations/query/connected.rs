use std::collections::{HashSet, VecDeque};

use crate::error::Result;
use crate::network::{JunctionId, SplineId, SplineNetwork};

/// Splines and junctions reachable from a seed set, in discovery order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConnectedSet {
    pub splines: Vec<SplineId>,
    pub junctions: Vec<JunctionId>,
}

/// Collects every spline and junction linked to the seeds through junctions.
pub struct FindConnected {
    splines: Vec<SplineId>,
    junctions: Vec<JunctionId>,
}

impl FindConnected {
    /// Creates a new `FindConnected` query. Duplicate seeds are ignored.
    #[must_use]
    pub fn new(splines: Vec<SplineId>, junctions: Vec<JunctionId>) -> Self {
        Self { splines, junctions }
    }

    /// Executes the query.
    ///
    /// Seed splines come first in the result, followed by splines reached
    /// through junctions. Seeds from disjoint networks yield the union of
    /// those networks.
    ///
    /// # Errors
    ///
    /// Returns an error if a seed spline or junction is not in the network.
    pub fn execute(&self, net: &SplineNetwork) -> Result<ConnectedSet> {
        let mut found = ConnectedSet::default();
        let mut seen_splines = HashSet::new();
        let mut seen_junctions = HashSet::new();
        let mut queue = VecDeque::new();

        for junction in &self.junctions {
            net.junction(*junction)?;
            if seen_junctions.insert(*junction) {
                found.junctions.push(*junction);
                queue.push_back(*junction);
            }
        }
        for spline in &self.splines {
            net.spline(*spline)?;
            if seen_splines.insert(*spline) {
                found.splines.push(*spline);
            }
        }
        for spline in found.splines.clone() {
            Self::extract_junctions(net, spline, &mut seen_junctions, &mut found, &mut queue)?;
        }

        while let Some(junction) = queue.pop_front() {
            for connection in net.junction_connections(junction)? {
                if seen_splines.insert(connection.spline) {
                    found.splines.push(connection.spline);
                    Self::extract_junctions(net, connection.spline, &mut seen_junctions, &mut found, &mut queue)?;
                }
            }
        }
        Ok(found)
    }

    fn extract_junctions(
        net: &SplineNetwork,
        spline: SplineId,
        seen: &mut HashSet<JunctionId>,
        found: &mut ConnectedSet,
        queue: &mut VecDeque<JunctionId>,
    ) -> Result<()> {
        for index in 0..net.spline(spline)?.points_count() {
            if let Some(junction) = net.point_junction(spline, index)? {
                if seen.insert(junction) {
                    found.junctions.push(junction);
                    queue.push_back(junction);
                }
            }
        }
        Ok(())
    }
}
