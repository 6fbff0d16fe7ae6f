/// Computes the third side of a triangle from two sides and the included angle.
///
/// Used to turn an equilibrium angle into a distance constraint: given the two
/// equilibrium bond lengths `r1` and `r2` and the equilibrium angle `theta`
/// (radians) between them, returns the distance between the outer atoms by the
/// law of cosines.
pub fn triangle_third_side(r1: f64, r2: f64, theta: f64) -> f64 {
    (r1 * r1 + r2 * r2 - 2.0 * r1 * r2 * theta.cos()).sqrt()
}
