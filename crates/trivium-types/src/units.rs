//! Fixed-point conversions shared by the codec and the identity generator.
//!
//! Delta-angle travels three widths: f64 degrees in process, i32
//! milli-degrees (0.001°) on the wire, u16 centi-degrees (0.01°) in the
//! packed sub-fields. Entropy is f64 in [0,1] in process, u32 micro-units
//! on the wire, u16 q16 fraction in the cognitive record.

/// Clamp to the unit interval.
pub fn clamp01(v: f64) -> f64 {
    v.clamp(0.0, 1.0)
}

/// Degrees → wire milli-degrees.
pub fn delta_angle_to_wire(degrees: f64) -> i32 {
    (degrees * 1000.0).round().clamp(i32::MIN as f64, i32::MAX as f64) as i32
}

/// Wire milli-degrees → degrees.
pub fn delta_angle_from_wire(milli: i32) -> f64 {
    milli as f64 / 1000.0
}

/// Degrees → packed centi-degree sub-field (magnitude, clamped).
pub fn delta_angle_to_subfield(degrees: f64) -> u16 {
    (degrees.abs() * 100.0).round().min(u16::MAX as f64) as u16
}

/// Entropy fraction → wire micro-units.
pub fn entropy_to_wire(entropy: f64) -> u32 {
    (clamp01(entropy) * 1_000_000.0).round() as u32
}

/// Wire micro-units → entropy fraction.
pub fn entropy_from_wire(micro: u32) -> f64 {
    (micro as f64 / 1_000_000.0).min(1.0)
}

/// Entropy fraction → q16 cognitive-record slot value.
pub fn entropy_to_q16(entropy: f64) -> u16 {
    (clamp01(entropy) * u16::MAX as f64).round() as u16
}
