//! # Factory Calibration Module
//!
//! Decodes the board's 32-byte factory calibration block and converts raw
//! load cell values to kilograms.
//!
//! ## Calibration points
//!
//! Each quadrant carries three signed 16-bit reference readings, taken at
//! 0 kg, 17 kg and 34 kg of load. Conversion is a two-segment
//! piecewise-linear interpolation through those points: raw differences
//! below the 17 kg breakpoint scale over the first segment, everything at
//! or above it continues over the second. The factory curve is not a
//! straight line, so a single full-range fit would be wrong at both ends.

use super::protocol::{read_s16, CALIBRATION_BLOB_LEN};
use super::sample::Quadrant;

/// Weight at the first calibration breakpoint, in kg.
const SEGMENT_KG: f32 = 17.0;

/// Per-quadrant zero-point baseline, replaced wholesale on every tare.
pub type ZeroPoint = [f32; 4];

/// Factory calibration reference points for all four quadrants.
///
/// Parsed once per connection and immutable afterwards. All arrays are in
/// quadrant order top-right, bottom-right, top-left, bottom-left, matching
/// the sensor report decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationTable {
    /// Raw readings at 0 kg.
    pub kg0: [i16; 4],
    /// Raw readings at 17 kg.
    pub kg17: [i16; 4],
    /// Raw readings at 34 kg.
    pub kg34: [i16; 4],
}

impl CalibrationTable {
    /// Decode the 32-byte calibration blob (two concatenated memory blocks).
    ///
    /// The three calibration points sit at fixed offsets: 0 kg at bytes
    /// 4..12, 17 kg at 12..20, 34 kg at 20..28, each as four big-endian
    /// signed 16-bit values in quadrant order.
    #[must_use]
    pub fn from_blob(blob: &[u8; CALIBRATION_BLOB_LEN]) -> Self {
        let point = |base: usize| -> [i16; 4] {
            [
                read_s16(blob, base),
                read_s16(blob, base + 2),
                read_s16(blob, base + 4),
                read_s16(blob, base + 6),
            ]
        };

        Self {
            kg0: point(4),
            kg17: point(12),
            kg34: point(20),
        }
    }

    /// Convert one quadrant's raw reading to kilograms.
    ///
    /// `zero` is the tared baseline for this quadrant; the conversion
    /// interpolates the difference `raw - zero` through the factory curve.
    /// A zero-width calibration segment (corrupt calibration) yields 0, and
    /// negative results clamp to 0.
    ///
    /// # Examples
    ///
    /// ```
    /// use balance_bridge::board::calibration::CalibrationTable;
    /// use balance_bridge::board::sample::Quadrant;
    ///
    /// let table = CalibrationTable {
    ///     kg0: [0; 4],
    ///     kg17: [1000; 4],
    ///     kg34: [2000; 4],
    /// };
    ///
    /// // At the 17 kg point exactly
    /// let kg = table.weight_kg(Quadrant::TopRight, 1000, 0.0);
    /// assert_eq!(kg, 17.0);
    /// ```
    #[must_use]
    pub fn weight_kg(&self, quadrant: Quadrant, raw: i16, zero: f32) -> f32 {
        let i = quadrant as usize;
        let diff = raw as f32 - zero;

        let delta_17 = (i32::from(self.kg17[i]) - i32::from(self.kg0[i])) as f32;
        let delta_34 = (i32::from(self.kg34[i]) - i32::from(self.kg0[i])) as f32;

        if delta_17 == 0.0 {
            return 0.0;
        }

        let kg = if diff < delta_17 {
            SEGMENT_KG * (diff / delta_17)
        } else if delta_34 - delta_17 != 0.0 {
            SEGMENT_KG + SEGMENT_KG * ((diff - delta_17) / (delta_34 - delta_17))
        } else {
            0.0
        };

        kg.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// A well-formed table: second segment shallower than the first, like
    /// real load cells.
    fn table() -> CalibrationTable {
        CalibrationTable {
            kg0: [100, 200, 300, 400],
            kg17: [1100, 1200, 1300, 1400],
            kg34: [1900, 2000, 2100, 2200],
        }
    }

    /// Build a calibration blob carrying the given table.
    fn make_blob(table: &CalibrationTable) -> [u8; CALIBRATION_BLOB_LEN] {
        let mut blob = [0u8; CALIBRATION_BLOB_LEN];
        for (base, point) in [(4, table.kg0), (12, table.kg17), (20, table.kg34)] {
            for (i, value) in point.iter().enumerate() {
                let bytes = value.to_be_bytes();
                blob[base + i * 2] = bytes[0];
                blob[base + i * 2 + 1] = bytes[1];
            }
        }
        blob
    }

    // ==================== Blob Decode Tests ====================

    #[test]
    fn test_from_blob_offsets() {
        let blob = make_blob(&table());
        let decoded = CalibrationTable::from_blob(&blob);
        assert_eq!(decoded, table());
    }

    #[test]
    fn test_from_blob_repeated_decode_is_identical() {
        let blob = make_blob(&table());
        let first = CalibrationTable::from_blob(&blob);
        let second = CalibrationTable::from_blob(&blob);
        assert_eq!(first, second);
    }

    #[test]
    fn test_from_blob_negative_points() {
        let negatives = CalibrationTable {
            kg0: [-100, -1, -32768, 0],
            kg17: [900, 999, -31768, 1000],
            kg34: [1900, 1999, -30768, 2000],
        };
        let blob = make_blob(&negatives);
        assert_eq!(CalibrationTable::from_blob(&blob), negatives);
    }

    // ==================== Conversion Tests ====================

    #[test]
    fn test_weight_zero_at_zero_point() {
        let t = table();
        let kg = t.weight_kg(Quadrant::TopRight, 100, 100.0);
        assert_eq!(kg, 0.0);
    }

    #[test]
    fn test_weight_exactly_seventeen_at_breakpoint() {
        let t = table();
        // zero at the 0 kg point; raw at the 17 kg point
        let kg = t.weight_kg(Quadrant::TopRight, 1100, 100.0);
        assert_eq!(kg, 17.0);
    }

    #[test]
    fn test_weight_monotonic_in_first_segment() {
        let t = table();
        let mut last = -1.0;
        for raw in 101..1100 {
            let kg = t.weight_kg(Quadrant::TopRight, raw, 100.0);
            assert!(kg > last, "not increasing at raw={}", raw);
            last = kg;
        }
    }

    #[test]
    fn test_weight_monotonic_in_second_segment() {
        let t = table();
        let mut last = t.weight_kg(Quadrant::TopRight, 1100, 100.0);
        for raw in 1101..1900 {
            let kg = t.weight_kg(Quadrant::TopRight, raw, 100.0);
            assert!(kg > last, "not increasing at raw={}", raw);
            last = kg;
        }
    }

    #[test]
    fn test_weight_thirty_four_at_top_point() {
        let t = table();
        let kg = t.weight_kg(Quadrant::TopRight, 1900, 100.0);
        assert!((kg - 34.0).abs() < 1e-4);
    }

    #[test]
    fn test_weight_never_negative() {
        let t = table();
        for raw in [-32768, -1000, 0, 50, 99] {
            let kg = t.weight_kg(Quadrant::TopRight, raw, 100.0);
            assert!(kg >= 0.0, "negative weight at raw={}", raw);
        }
    }

    #[test]
    fn test_weight_uses_per_quadrant_points() {
        let t = table();
        // Each quadrant has its own 0 kg point; same raw value maps differently
        let tr = t.weight_kg(Quadrant::TopRight, 600, 100.0);
        let bl = t.weight_kg(Quadrant::BottomLeft, 600, 400.0);
        assert!((tr - 8.5).abs() < 1e-4);
        assert!((bl - 3.4).abs() < 1e-4);
    }

    #[test]
    fn test_weight_zero_span_guard() {
        let corrupt = CalibrationTable {
            kg0: [500; 4],
            kg17: [500; 4], // zero-width first segment
            kg34: [500; 4],
        };
        assert_eq!(corrupt.weight_kg(Quadrant::TopLeft, 5000, 500.0), 0.0);
    }

    #[test]
    fn test_weight_zero_second_span_guard() {
        let corrupt = CalibrationTable {
            kg0: [0; 4],
            kg17: [1000; 4],
            kg34: [1000; 4], // zero-width second segment
        };
        // First segment still works
        assert_eq!(corrupt.weight_kg(Quadrant::TopLeft, 500, 0.0), 8.5);
        // At or past the breakpoint the corrupt segment yields 0
        assert_eq!(corrupt.weight_kg(Quadrant::TopLeft, 1500, 0.0), 0.0);
    }

    #[test]
    fn test_weight_extreme_point_spread() {
        // Full i16 spread between points must not overflow the spans
        let wide = CalibrationTable {
            kg0: [-32768; 4],
            kg17: [0; 4],
            kg34: [32767; 4],
        };
        let kg = wide.weight_kg(Quadrant::TopRight, 0, -32768.0);
        assert_eq!(kg, 17.0);
    }

    #[test]
    fn test_weight_fractional_zero_point() {
        let t = table();
        // Tare means are fractional; conversion is continuous around them
        let just_above = t.weight_kg(Quadrant::TopRight, 101, 100.5);
        assert!(just_above > 0.0 && just_above < 0.02);
    }
}
