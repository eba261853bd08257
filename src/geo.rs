//! Simulated Geocoding
//!
//! Maps a free-text location label to a stable latitude/longitude pair near
//! the map's home region, without calling a geocoding service. The same label
//! always lands on the same pin, so re-fetching observations never moves
//! markers.
//!
//! The hash must reproduce 32-bit signed integer arithmetic exactly: overflow
//! wraps, it does not saturate. Changing the hash width would silently move
//! every pin in an existing deployment.

/// Map center: Islamabad.
pub const MAP_CENTER_LAT: f64 = 33.7379;
pub const MAP_CENTER_LNG: f64 = 73.0844;

/// Maximum offset from the center, in degrees, on each axis.
pub const SIMULATION_SPREAD: f64 = 0.05;

// Separate salts per axis so latitude and longitude offsets are uncorrelated
// (a shared hash would line every pin up on a diagonal).
const LAT_SALT: &str = "_lat_v2";
const LNG_SALT: &str = "_lng_v2";

/// A fabricated latitude/longitude pair derived from a location label.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize)]
pub struct SimulatedCoords {
    pub latitude: f64,
    pub longitude: f64,
}

/// 32-bit string hash over UTF-16 code units.
///
/// Accumulator update is `hash = (hash << 5) - hash + unit` with two's
/// complement wraparound on every step; the absolute value of the final
/// accumulator is returned. Iterating UTF-16 code units (not chars or bytes)
/// keeps the value identical to `String.charCodeAt` hashing on any input.
pub fn simple_hash(s: &str) -> u32 {
    let mut hash: i32 = 0;
    for unit in s.encode_utf16() {
        hash = hash
            .wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit));
    }
    // unsigned_abs: |i32::MIN| does not fit in i32
    hash.unsigned_abs()
}

fn axis_offset(location: &str, salt: &str) -> f64 {
    let hash = simple_hash(&format!("{}{}", location, salt));
    (f64::from(hash % 2000) / 1000.0 - 1.0) * SIMULATION_SPREAD
}

/// Simulated coordinates for a location label.
///
/// Deterministic in the exact string, case and whitespace included. The empty
/// label maps to the center itself.
pub fn simulated_coords(location: &str) -> SimulatedCoords {
    if location.is_empty() {
        return SimulatedCoords {
            latitude: MAP_CENTER_LAT,
            longitude: MAP_CENTER_LNG,
        };
    }

    SimulatedCoords {
        latitude: MAP_CENTER_LAT + axis_offset(location, LAT_SALT),
        longitude: MAP_CENTER_LNG + axis_offset(location, LNG_SALT),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_simple_hash_known_values() {
        assert_eq!(simple_hash(""), 0);
        assert_eq!(simple_hash("a"), 97);
        // 31 * 97 + 98
        assert_eq!(simple_hash("ab"), 3105);
    }

    #[test]
    fn test_simple_hash_wraps_on_long_input() {
        // Long enough to overflow a 32-bit accumulator many times over;
        // must wrap, not panic
        let long = "Margalla Hills National Park ".repeat(500);
        let _ = simple_hash(&long);
        assert_eq!(simple_hash(&long), simple_hash(&long));
    }

    #[test]
    fn test_simple_hash_unicode() {
        // Non-ASCII and non-BMP input must hash without panicking
        assert_eq!(simple_hash("مارگلہ"), simple_hash("مارگلہ"));
        let _ = simple_hash("🦜 Rawal Lake");
    }

    #[test]
    fn test_coords_deterministic() {
        let a = simulated_coords("Rawal Lake");
        let b = simulated_coords("Rawal Lake");
        assert_eq!(a.latitude.to_bits(), b.latitude.to_bits());
        assert_eq!(a.longitude.to_bits(), b.longitude.to_bits());
    }

    #[test]
    fn test_coords_case_sensitive() {
        let upper = simulated_coords("Rawal Lake");
        let lower = simulated_coords("rawal lake");
        assert_ne!(upper, lower);
    }

    #[test]
    fn test_coords_bounded() {
        for location in [
            "Margalla Hills",
            "Rawal Lake",
            "Shakarparian",
            "Daman-e-Koh viewpoint, trail 3",
            "x",
            "🦋",
        ] {
            let coords = simulated_coords(location);
            assert!(
                (coords.latitude - MAP_CENTER_LAT).abs() <= SIMULATION_SPREAD,
                "latitude out of bounds for {:?}: {}",
                location,
                coords.latitude
            );
            assert!(
                (coords.longitude - MAP_CENTER_LNG).abs() <= SIMULATION_SPREAD,
                "longitude out of bounds for {:?}: {}",
                location,
                coords.longitude
            );
        }
    }

    #[test]
    fn test_empty_string_is_map_center() {
        let coords = simulated_coords("");
        assert_abs_diff_eq!(coords.latitude, MAP_CENTER_LAT);
        assert_abs_diff_eq!(coords.longitude, MAP_CENTER_LNG);
    }

    #[test]
    fn test_salts_decorrelate_axes() {
        let coords = simulated_coords("Margalla Hills");
        let lat_offset = coords.latitude - MAP_CENTER_LAT;
        let lng_offset = coords.longitude - MAP_CENTER_LNG;
        assert_ne!(lat_offset, lng_offset);
    }
}
