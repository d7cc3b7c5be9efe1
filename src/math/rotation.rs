//! Orientation helpers. Angles at this boundary are in degrees.
//!
//! Orientations follow a "+Z forward, +Y up" frame: the identity rotation
//! looks down +Z. Euler angles use the Z-X-Y composition (`q = Ry * Rx * Rz`),
//! so the roll of a rotation is its Z component.

use nalgebra::Unit;

use super::{UnitQuaternion, Vector3, TOLERANCE};

/// Rotation of `degrees` around `axis`. A degenerate axis yields the identity.
#[must_use]
pub fn angle_axis(degrees: f64, axis: &Vector3) -> UnitQuaternion {
    match Unit::try_new(*axis, TOLERANCE) {
        Some(axis) => UnitQuaternion::from_axis_angle(&axis, degrees.to_radians()),
        None => UnitQuaternion::identity(),
    }
}

/// Rotation whose +Z axis points along `forward` with +Y as close to `up` as possible.
///
/// Returns `None` when `forward` is zero-length. When `forward` is parallel to
/// `up` the shortest arc from +Z is used instead.
#[must_use]
pub fn look_rotation(forward: &Vector3, up: &Vector3) -> Option<UnitQuaternion> {
    let len = forward.norm();
    if len < TOLERANCE {
        return None;
    }
    let forward = forward / len;
    if forward.cross(up).norm() < TOLERANCE {
        let shortest = UnitQuaternion::rotation_between(&Vector3::z(), &forward);
        return Some(shortest.unwrap_or_else(|| angle_axis(180.0, &Vector3::y())));
    }
    Some(UnitQuaternion::face_towards(&forward, up))
}

/// Look rotation along `forward` rolled by `twist` degrees around it.
#[must_use]
pub fn twisted_look_rotation(twist: f64, forward: &Vector3, up: &Vector3) -> Option<UnitQuaternion> {
    look_rotation(forward, up).map(|look| angle_axis(twist, forward) * look)
}

/// Roll (Z Euler angle) of a rotation, in `[0, 360)`.
#[must_use]
pub fn roll_degrees(rotation: &UnitQuaternion) -> f64 {
    let m = rotation.to_rotation_matrix();
    let m = m.matrix();
    m[(1, 0)].atan2(m[(1, 1)]).to_degrees().rem_euclid(360.0)
}

/// Replaces the roll of `rotation` with `degrees`, keeping pitch and yaw.
#[must_use]
pub fn with_roll(rotation: &UnitQuaternion, degrees: f64) -> UnitQuaternion {
    let correction = degrees - roll_degrees(rotation);
    rotation * angle_axis(correction, &Vector3::z())
}

/// Shortest signed difference from `current` to `target`, in `(-180, 180]`.
#[must_use]
pub fn delta_angle(current: f64, target: f64) -> f64 {
    let delta = (target - current).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn look_along_z_is_identity() {
        let q = look_rotation(&Vector3::z(), &Vector3::y()).unwrap();
        assert_relative_eq!(q, UnitQuaternion::identity(), epsilon = 1e-12);
    }

    #[test]
    fn look_maps_z_onto_forward() {
        let forward = Vector3::new(1.0, 2.0, -3.0);
        let q = look_rotation(&forward, &Vector3::y()).unwrap();
        assert_relative_eq!(q * Vector3::z(), forward.normalize(), epsilon = 1e-12);
    }

    #[test]
    fn look_up_the_up_axis_still_faces_forward() {
        let q = look_rotation(&Vector3::y(), &Vector3::y()).unwrap();
        assert_relative_eq!(q * Vector3::z(), Vector3::y(), epsilon = 1e-12);
        let q = look_rotation(&-Vector3::z(), &Vector3::z()).unwrap();
        assert_relative_eq!(q * Vector3::z(), -Vector3::z(), epsilon = 1e-12);
    }

    #[test]
    fn zero_forward_has_no_look_rotation() {
        assert!(look_rotation(&Vector3::zeros(), &Vector3::y()).is_none());
    }

    #[test]
    fn roll_of_z_rotation() {
        let q = angle_axis(30.0, &Vector3::z());
        assert_relative_eq!(roll_degrees(&q), 30.0, epsilon = 1e-9);
        let q = angle_axis(-90.0, &Vector3::z());
        assert_relative_eq!(roll_degrees(&q), 270.0, epsilon = 1e-9);
    }

    #[test]
    fn with_roll_keeps_forward() {
        let base = look_rotation(&Vector3::new(1.0, 0.5, 1.0), &Vector3::y()).unwrap();
        let rolled = with_roll(&base, 45.0);
        assert_relative_eq!(roll_degrees(&rolled), 45.0, epsilon = 1e-9);
        assert_relative_eq!(rolled * Vector3::z(), base * Vector3::z(), epsilon = 1e-9);
    }

    #[test]
    fn delta_angle_wraps() {
        assert_relative_eq!(delta_angle(10.0, 350.0), -20.0);
        assert_relative_eq!(delta_angle(350.0, 10.0), 20.0);
        assert_relative_eq!(delta_angle(0.0, 180.0), 180.0);
        assert_relative_eq!(delta_angle(720.0, 45.0), 45.0);
    }
}
