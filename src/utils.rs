/// Tolerance for comparing solution values
pub const EPSILON: f64 = 1e-5;

/// Whether `a` and `b` agree up to [`EPSILON`], relative to their magnitude
pub fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() <= EPSILON * a.abs().max(b.abs()).max(1.0)
}
