//! Unit Parsers
//!
//! Pure byte-to-physical-value decoders. No side effects and no failure
//! modes: bytes are 0-255 by type, callers own range policy on the result.

/// Common rail pressure: `A*256 + B` (kPa, 0-65535 for the 2-byte encoding)
pub fn rail_pressure_kpa(byte_a: u8, byte_b: u8) -> f64 {
    byte_a as f64 * 256.0 + byte_b as f64
}

/// Injector feedback: `(A - 128) * correction` (mm³/stroke).
///
/// Byte 128 is the zero-trim center. The correction factor is a per-vehicle
/// calibration constant from the vehicle profile.
pub fn injector_feedback_mm3(byte_a: u8, correction_factor: f64) -> f64 {
    (byte_a as f64 - 128.0) * correction_factor
}

/// Offset temperature: `A - 40` (°C), used by coolant and ATF sensors
pub fn temperature_c(byte_a: u8) -> f64 {
    byte_a as f64 - 40.0
}

/// Engine speed: `(A*256 + B) / 4` (rpm)
pub fn engine_rpm(byte_a: u8, byte_b: u8) -> f64 {
    (byte_a as f64 * 256.0 + byte_b as f64) / 4.0
}

/// Vehicle speed: `A` (km/h)
pub fn vehicle_speed_kmh(byte_a: u8) -> f64 {
    byte_a as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rail_pressure_decode() {
        // 0x88 0xB8 => 136*256 + 184 = 35000 kPa
        assert_eq!(rail_pressure_kpa(0x88, 0xB8), 35000.0);
        assert_eq!(rail_pressure_kpa(0, 0), 0.0);
        assert_eq!(rail_pressure_kpa(255, 255), 65535.0);
    }

    #[test]
    fn test_injector_feedback_center() {
        // Byte 128 is exactly zero trim for any correction factor
        assert_eq!(injector_feedback_mm3(128, 1.0), 0.0);
        assert_eq!(injector_feedback_mm3(128, 0.25), 0.0);
        assert_eq!(injector_feedback_mm3(128, 17.5), 0.0);
    }

    #[test]
    fn test_injector_feedback_decode() {
        assert_eq!(injector_feedback_mm3(130, 1.0), 2.0);
        assert_eq!(injector_feedback_mm3(120, 1.0), -8.0);
        assert_eq!(injector_feedback_mm3(132, 0.5), 2.0);
    }

    #[test]
    fn test_temperature_decode() {
        // 0x7D = 125, so temp = 125 - 40 = 85°C
        assert_eq!(temperature_c(0x7D), 85.0);
        assert_eq!(temperature_c(0), -40.0);
    }

    #[test]
    fn test_rpm_decode() {
        // Idle 800 rpm encodes as 800*4 = 3200 = 0x0C80
        assert_eq!(engine_rpm(0x0C, 0x80), 800.0);
    }

    proptest! {
        #[test]
        fn prop_rail_pressure_matches_formula(a in 0u8..=255, b in 0u8..=255) {
            prop_assert_eq!(rail_pressure_kpa(a, b), a as f64 * 256.0 + b as f64);
        }

        #[test]
        fn prop_rail_pressure_monotonic_in_a(a in 0u8..255, b in 0u8..=255) {
            prop_assert!(rail_pressure_kpa(a + 1, b) > rail_pressure_kpa(a, b));
        }

        #[test]
        fn prop_rail_pressure_monotonic_in_b(a in 0u8..=255, b in 0u8..255) {
            prop_assert!(rail_pressure_kpa(a, b + 1) > rail_pressure_kpa(a, b));
        }

        #[test]
        fn prop_injector_feedback_matches_formula(a in 0u8..=255, f in -10.0f64..10.0) {
            prop_assert_eq!(injector_feedback_mm3(a, f), (a as f64 - 128.0) * f);
        }
    }
}
