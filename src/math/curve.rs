//! Cubic Bezier and Catmull-Rom evaluation over four control points.

use super::{Point3, Vector3};

/// Evaluates a cubic Bezier curve. `t` is clamped to `[0, 1]`.
#[must_use]
pub fn bezier(p0: &Point3, p1: &Point3, p2: &Point3, p3: &Point3, t: f64) -> Point3 {
    let t = t.clamp(0.0, 1.0);
    let u = 1.0 - t;
    Point3::from(
        p0.coords * (u * u * u)
            + p1.coords * (3.0 * u * u * t)
            + p2.coords * (3.0 * u * t * t)
            + p3.coords * (t * t * t),
    )
}

/// First derivative of [`bezier`] with respect to `t`. `t` is clamped to `[0, 1]`.
#[must_use]
pub fn bezier_derivative(p0: &Point3, p1: &Point3, p2: &Point3, p3: &Point3, t: f64) -> Vector3 {
    let t = t.clamp(0.0, 1.0);
    let u = 1.0 - t;
    (p1 - p0) * (3.0 * u * u) + (p2 - p1) * (6.0 * u * t) + (p3 - p2) * (3.0 * t * t)
}

/// Evaluates a uniform Catmull-Rom segment between `p1` and `p2`.
///
/// `p0` and `p3` are the outer anchors that shape the tangents at the
/// segment ends.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn catmull_rom(p0: &Point3, p1: &Point3, p2: &Point3, p3: &Point3, t: f64) -> Point3 {
    let (a, b, c, d) = (p0.coords, p1.coords, p2.coords, p3.coords);
    let t2 = t * t;
    let t3 = t2 * t;
    Point3::from(
        ((b * 2.0)
            + (c - a) * t
            + (a * 2.0 - b * 5.0 + c * 4.0 - d) * t2
            + (-a + b * 3.0 - c * 3.0 + d) * t3)
            * 0.5,
    )
}

/// First derivative of [`catmull_rom`] with respect to `t`.
#[must_use]
#[allow(clippy::many_single_char_names)]
pub fn catmull_rom_derivative(
    p0: &Point3,
    p1: &Point3,
    p2: &Point3,
    p3: &Point3,
    t: f64,
) -> Vector3 {
    let (a, b, c, d) = (p0.coords, p1.coords, p2.coords, p3.coords);
    ((c - a)
        + (a * 2.0 - b * 5.0 + c * 4.0 - d) * (2.0 * t)
        + (-a + b * 3.0 - c * 3.0 + d) * (3.0 * t * t))
        * 0.5
}
