//! Metric name normalisation.

/// Characters dropped from raw names before they become registry keys.
pub const STRIPPED_CHARS: [char; 3] = ['_', '-', '.'];

/// Normalise a raw metric name.
///
/// Only the fixed punctuation set in [`STRIPPED_CHARS`] is removed; the
/// result is otherwise kept as-is and validated by the exporter on
/// registration. `room_temp`, `room-temp` and `room.temp` all map to
/// `roomtemp`.
pub fn normalize_name(raw: &str) -> String {
    raw.chars().filter(|c| !STRIPPED_CHARS.contains(c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_fixed_punctuation() {
        assert_eq!(normalize_name("room_temp"), "roomtemp");
        assert_eq!(normalize_name("room-temp"), "roomtemp");
        assert_eq!(normalize_name("room.temp"), "roomtemp");
        assert_eq!(normalize_name("a_b-c.d"), "abcd");
    }

    #[test]
    fn keeps_everything_else() {
        assert_eq!(normalize_name("Temp:C"), "Temp:C");
        assert_eq!(normalize_name(""), "");
    }
}
