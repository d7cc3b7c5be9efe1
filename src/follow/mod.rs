//! An actor that travels along a spline network over time.

mod fork;

pub use fork::{FlowFork, ForkArgs, ForkHandler, NoFork};

use tracing::{debug, trace};

use crate::error::Result;
use crate::math::rotation::twisted_look_rotation;
use crate::math::{Point3, UnitQuaternion, Vector3, TOLERANCE};
use crate::network::{JunctionId, SplineId, SplineNetwork};

/// Distance in `t` from a spline end at which the end counts as reached.
const END_EPSILON: f64 = 1e-9;

/// Tunables of a [`Follow`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FollowConfig {
    /// Travel speed in world units per second; negative runs backward.
    pub speed: f64,
    /// Starting parameter, wrapped into `[0, 1)`.
    pub offset: f64,
    /// Wrap around instead of completing at a spline end.
    pub is_loop: bool,
    /// Halt at a junction whose fork handler does not choose.
    pub stop_at_junction: bool,
    /// Up vector for the follower's orientation.
    pub up: Vector3,
}

impl Default for FollowConfig {
    fn default() -> Self {
        Self {
            speed: 5.0,
            offset: 0.0,
            is_loop: false,
            stop_at_junction: false,
            up: Vector3::y(),
        }
    }
}

impl FollowConfig {
    #[must_use]
    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    #[must_use]
    pub fn with_offset(mut self, offset: f64) -> Self {
        self.offset = offset;
        self
    }

    #[must_use]
    pub fn with_loop(mut self, is_loop: bool) -> Self {
        self.is_loop = is_loop;
        self
    }

    #[must_use]
    pub fn with_stop_at_junction(mut self, stop: bool) -> Self {
        self.stop_at_junction = stop;
        self
    }

    #[must_use]
    pub fn with_up(mut self, up: Vector3) -> Self {
        self.up = up;
        self
    }
}

/// Lifecycle of a [`Follow`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FollowState {
    /// Not moving: never started, stopped at a junction or paused.
    #[default]
    Idle,
    Advancing,
    /// Reached a spline end without looping.
    Completed,
}

/// Something that happened during one [`Follow::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowEvent {
    /// Moved onto `connection` of `junction`.
    Forked {
        junction: JunctionId,
        connection: usize,
    },
    /// Halted in front of `junction`.
    StoppedAtJunction { junction: JunctionId },
    Completed,
}

/// World placement of the follower.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Pose {
    pub position: Point3,
    pub rotation: UnitQuaternion,
}

/// A follower driven along the network tick by tick.
///
/// The follower starts running; on its first update (and on every
/// restart after completing) it is placed on its start spline at the
/// configured offset.
#[derive(Debug, Clone)]
pub struct Follow {
    config: FollowConfig,
    start: SplineId,
    spline: SplineId,
    t: f64,
    speed: f64,
    running: bool,
    was_running: bool,
    completed: bool,
    state: FollowState,
    pose: Pose,
}

impl Follow {
    #[must_use]
    pub fn new(spline: SplineId, config: FollowConfig) -> Self {
        Self {
            config,
            start: spline,
            spline,
            t: 0.0,
            speed: config.speed,
            running: true,
            was_running: false,
            completed: true,
            state: FollowState::Idle,
            pose: Pose {
                position: Point3::origin(),
                rotation: UnitQuaternion::identity(),
            },
        }
    }

    /// Requests the follower to run or pause. A completed follower restarts
    /// on its next update after being set running again.
    pub fn set_running(&mut self, running: bool) {
        self.running = running;
        if !running && self.state == FollowState::Advancing {
            self.state = FollowState::Idle;
        }
    }

    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    #[must_use]
    pub fn state(&self) -> FollowState {
        self.state
    }

    /// Spline currently travelled.
    #[must_use]
    pub fn spline(&self) -> SplineId {
        self.spline
    }

    /// Global parameter on the current spline.
    #[must_use]
    pub fn t(&self) -> f64 {
        self.t
    }

    /// Current signed speed; junction hand-offs may have flipped its sign.
    #[must_use]
    pub fn speed(&self) -> f64 {
        self.speed
    }

    #[must_use]
    pub fn pose(&self) -> Pose {
        self.pose
    }

    #[must_use]
    pub fn config(&self) -> &FollowConfig {
        &self.config
    }

    /// Advances the follower by `delta_time` seconds.
    ///
    /// # Errors
    ///
    /// Returns an error if the current spline was removed or the fork handler
    /// returned a connection index that does not exist.
    pub fn update<H>(&mut self, net: &SplineNetwork, delta_time: f64, handler: &mut H) -> Result<Vec<FollowEvent>>
    where
        H: ForkHandler + ?Sized,
    {
        let mut events = Vec::new();
        if self.running != self.was_running {
            if self.running && self.completed {
                self.restart(net)?;
            }
            self.was_running = self.running;
        }
        if self.running {
            self.state = FollowState::Advancing;
            self.advance(net, delta_time, handler, &mut events)?;
        }
        Ok(events)
    }

    fn restart(&mut self, net: &SplineNetwork) -> Result<()> {
        self.spline = self.start;
        self.t = (1.0 + self.config.offset % 1.0) % 1.0;
        self.completed = false;
        self.pose = self.pose_at(net)?;
        debug!(spline = ?self.spline, t = self.t, "follow restarted");
        Ok(())
    }

    /// Parameter change covering `delta_time` at curve speed `velocity`.
    ///
    /// A stalled curve is crossed in one step instead of dividing by zero.
    #[allow(clippy::cast_precision_loss, clippy::float_cmp)]
    fn delta_t(&self, net: &SplineNetwork, delta_time: f64, velocity: f64) -> Result<f64> {
        let distance = delta_time * self.speed;
        if velocity >= TOLERANCE {
            return Ok(distance / velocity);
        }
        if distance == 0.0 {
            return Ok(0.0);
        }
        trace!(spline = ?self.spline, t = self.t, "stalled curve crossed");
        let curves = net.spline(self.spline)?.curve_count().max(1);
        Ok(distance.signum() / curves as f64)
    }

    /// Arc-length correction factor at the current parameter.
    #[allow(clippy::cast_precision_loss)]
    fn curve_speed(&self, net: &SplineNetwork) -> Result<f64> {
        let curves = net.spline(self.spline)?.curve_count() as f64;
        Ok(net.velocity(self.spline, self.t)?.norm() * curves)
    }

    #[allow(clippy::float_cmp)]
    fn advance<H>(
        &mut self,
        net: &SplineNetwork,
        delta_time: f64,
        handler: &mut H,
        events: &mut Vec<FollowEvent>,
    ) -> Result<()>
    where
        H: ForkHandler + ?Sized,
    {
        let mut delta_time = delta_time;
        let mut allow_handoff = true;
        loop {
            let mut velocity = self.curve_speed(net)?;
            let mut delta_t = self.delta_t(net, delta_time, velocity)?;
            if delta_t == 0.0 {
                self.pose = self.pose_at(net)?;
                return Ok(());
            }

            let count = net.spline(self.spline)?.points_count();
            let backward = usize::from(delta_t < 0.0);
            let point_index = net.curve_index(self.spline, self.t)?.0 + backward;
            let next_t = self.t + delta_t;
            let end_of_spline = if delta_t > 0.0 {
                next_t >= 1.0 - END_EPSILON
            } else {
                next_t <= END_EPSILON
            };
            let next_point = if !end_of_spline {
                net.curve_index(self.spline, next_t)?.0 + backward
            } else if delta_t >= 0.0 {
                (point_index + 1) % count
            } else {
                (count + point_index - 1) % count
            };

            let mut continue_loop = self.config.is_loop;
            if point_index != next_point {
                if let Some(junction) = net.point_junction(self.spline, next_point)? {
                    let args = ForkArgs {
                        junction,
                        spline: self.spline,
                        point_index: next_point,
                        speed: self.speed,
                    };
                    let mut connection = handler.on_fork(net, &args);
                    if connection.is_none() {
                        if self.config.stop_at_junction {
                            self.running = false;
                            self.state = FollowState::Idle;
                            events.push(FollowEvent::StoppedAtJunction { junction });
                            debug!(?junction, "follow stopped at junction");
                            return Ok(());
                        }
                        if end_of_spline {
                            connection = if delta_t > 0.0 {
                                net.junction_first_out(junction)?
                                    .or(net.junction_first_in(junction)?)
                            } else {
                                net.junction_first_in(junction)?
                                    .or(net.junction_first_out(junction)?)
                            };
                            if connection.is_none() {
                                continue_loop = false;
                            }
                        }
                    }

                    if let Some(connection) = connection {
                        let landing_t = net.t_at(self.spline, next_point)?;
                        let remaining_t = self.t + delta_t - landing_t;
                        let remaining_time = if self.speed == 0.0 || remaining_t * delta_t <= 0.0 {
                            0.0
                        } else {
                            remaining_t * velocity / self.speed
                        };

                        let target = net.junction_connection(junction, connection)?;
                        let is_out = net.junction_is_out(junction, connection)?;
                        let is_in = net.junction_is_in(junction, connection)?;
                        self.spline = target.spline;
                        self.t = net.t_at(target.spline, target.point_index)?;
                        if (is_out && !is_in && self.speed < 0.0) || (is_in && !is_out && self.speed > 0.0) {
                            self.speed = -self.speed;
                        }
                        events.push(FollowEvent::Forked { junction, connection });
                        debug!(?junction, connection, spline = ?self.spline, speed = self.speed, "follow forked");

                        if allow_handoff {
                            allow_handoff = false;
                            delta_time = remaining_time;
                            continue;
                        }
                        velocity = self.curve_speed(net)?;
                        delta_t = self.delta_t(net, remaining_time, velocity)?;
                    }
                }
            }

            return self.move_or_stop(net, delta_t, end_of_spline, continue_loop, events);
        }
    }

    fn move_or_stop(
        &mut self,
        net: &SplineNetwork,
        delta_t: f64,
        end_of_spline: bool,
        continue_loop: bool,
        events: &mut Vec<FollowEvent>,
    ) -> Result<()> {
        self.t += delta_t;
        if end_of_spline && continue_loop {
            self.t = (1.0 + self.t % 1.0) % 1.0;
            if self.t >= 1.0 - END_EPSILON {
                self.t = 0.0;
            }
        } else {
            self.t = self.t.clamp(0.0, 1.0);
        }
        if self.t >= 1.0 - END_EPSILON {
            self.t = 1.0;
        } else if self.t <= END_EPSILON {
            self.t = 0.0;
        }
        if end_of_spline && !continue_loop {
            self.running = false;
            self.was_running = false;
            self.completed = true;
            self.state = FollowState::Completed;
            events.push(FollowEvent::Completed);
            debug!(spline = ?self.spline, t = self.t, "follow completed");
        }
        self.pose = self.pose_at(net)?;
        Ok(())
    }

    /// Curve position, facing along the curve and rolled by its twist.
    fn pose_at(&self, net: &SplineNetwork) -> Result<Pose> {
        let position = net.position(self.spline, self.t)?;
        let direction = net.direction(self.spline, self.t)?;
        let twist = net.twist_angle(self.spline, self.t)?;
        let rotation = twisted_look_rotation(twist, &direction, &self.config.up).unwrap_or(self.pose.rotation);
        Ok(Pose { position, rotation })
    }
}
