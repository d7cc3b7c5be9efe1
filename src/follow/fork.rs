use crate::network::{JunctionId, SplineId, SplineNetwork};

/// What a follower is about to cross.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ForkArgs {
    pub junction: JunctionId,
    /// Spline the follower is on.
    pub spline: SplineId,
    /// Point of that spline the follower is landing on.
    pub point_index: usize,
    /// Signed speed; negative while travelling backward.
    pub speed: f64,
}

/// Chooses the connection a follower takes at a junction.
pub trait ForkHandler {
    /// Returns a connection index of `args.junction`, or `None` to leave the
    /// choice to the follower.
    fn on_fork(&mut self, net: &SplineNetwork, args: &ForkArgs) -> Option<usize>;
}

impl<F> ForkHandler for F
where
    F: FnMut(&SplineNetwork, &ForkArgs) -> Option<usize>,
{
    fn on_fork(&mut self, net: &SplineNetwork, args: &ForkArgs) -> Option<usize> {
        self(net, args)
    }
}

/// Never chooses.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFork;

impl ForkHandler for NoFork {
    fn on_fork(&mut self, _net: &SplineNetwork, _args: &ForkArgs) -> Option<usize> {
        None
    }
}

/// Picks among the connections that keep the direction of travel.
///
/// Moving forward, the candidates are the Out connections (or the In ones
/// if there are none); moving backward, the other way round. With
/// direction changes allowed every connection is a candidate. `selector`
/// receives the candidate count and returns the pick, taken modulo the count.
pub struct FlowFork<S> {
    selector: S,
    allow_direction_change: bool,
}

impl<S: FnMut(usize) -> usize> FlowFork<S> {
    #[must_use]
    pub fn new(selector: S) -> Self {
        Self {
            selector,
            allow_direction_change: false,
        }
    }

    #[must_use]
    pub fn with_direction_change(mut self, allow: bool) -> Self {
        self.allow_direction_change = allow;
        self
    }

    fn candidates(&self, net: &SplineNetwork, args: &ForkArgs) -> Option<Vec<usize>> {
        if self.allow_direction_change {
            let count = net.junction(args.junction).ok()?.connections_count();
            return Some((0..count).collect());
        }
        let outputs = net.junction_outputs(args.junction).ok()?;
        let inputs = net.junction_inputs(args.junction).ok()?;
        let (preferred, fallback) = if args.speed >= 0.0 {
            (outputs, inputs)
        } else {
            (inputs, outputs)
        };
        Some(if preferred.is_empty() { fallback } else { preferred })
    }
}

impl<S: FnMut(usize) -> usize> ForkHandler for FlowFork<S> {
    fn on_fork(&mut self, net: &SplineNetwork, args: &ForkArgs) -> Option<usize> {
        let candidates = self.candidates(net, args)?;
        if candidates.is_empty() {
            return None;
        }
        let pick = (self.selector)(candidates.len()) % candidates.len();
        candidates.get(pick).copied()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::math::Point3;
    use crate::network::InterpolationMode;
    use crate::operations::edit::CreateBranch;

    fn fork(net: &mut SplineNetwork) -> ForkArgs {
        let trunk = net
            .add_spline(
                &[Point3::new(0.0, 0.0, 0.0), Point3::new(0.0, 0.0, 3.0)],
                InterpolationMode::Bezier,
            )
            .unwrap();
        CreateBranch::new(trunk, 1, true).execute(net).unwrap();
        CreateBranch::new(trunk, 1, true).execute(net).unwrap();
        ForkArgs {
            junction: net.point_junction(trunk, 1).unwrap().unwrap(),
            spline: trunk,
            point_index: 1,
            speed: 1.0,
        }
    }

    #[test]
    fn forward_flow_picks_outputs() {
        let mut net = SplineNetwork::new();
        let args = fork(&mut net);
        let mut first = FlowFork::new(|_| 0);
        let mut second = FlowFork::new(|_| 1);
        assert_eq!(first.on_fork(&net, &args), Some(1));
        assert_eq!(second.on_fork(&net, &args), Some(2));
    }

    #[test]
    fn backward_flow_picks_inputs() {
        let mut net = SplineNetwork::new();
        let args = ForkArgs {
            speed: -1.0,
            ..fork(&mut net)
        };
        let mut handler = FlowFork::new(|n| n + 7);
        assert_eq!(handler.on_fork(&net, &args), Some(0));
    }

    #[test]
    fn direction_change_offers_everything() {
        let mut net = SplineNetwork::new();
        let args = fork(&mut net);
        let mut seen = Vec::new();
        let mut handler = FlowFork::new(|n| {
            seen.push(n);
            2
        })
        .with_direction_change(true);
        assert_eq!(handler.on_fork(&net, &args), Some(2));
        drop(handler);
        assert_eq!(seen, vec![3]);
    }

    #[test]
    fn closures_and_no_fork() {
        let mut net = SplineNetwork::new();
        let args = fork(&mut net);
        let mut fixed = |_: &SplineNetwork, _: &ForkArgs| Some(2);
        assert_eq!(fixed.on_fork(&net, &args), Some(2));
        assert_eq!(NoFork.on_fork(&net, &args), None);
    }
}
