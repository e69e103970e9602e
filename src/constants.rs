//! Physical constants (SI units).

/// Speed of light in vacuum (m/s).
pub const C0: f64 = 299_792_458.0;

/// Vacuum permeability (H/m).
pub const MU0: f64 = 4.0e-7 * std::f64::consts::PI;

/// Vacuum permittivity (F/m).
pub const EPS0: f64 = 1.0 / (MU0 * C0 * C0);

/// Free-space wave impedance (Ohm).
pub const Z0: f64 = MU0 * C0;

/// 2π, used for every frequency to angular-frequency conversion.
pub const TWO_PI: f64 = 2.0 * std::f64::consts::PI;
