//! Regional plate format: two letters, 1-2 digits, 1-2 letters, 3-4 digits
//! (e.g. `AB12CD1234`).

use regex::Regex;
use std::sync::LazyLock;
use truckgate_types::PlateReading;

/// Plate pattern applied to the normalized response text
pub const PLATE_PATTERN: &str = r"[A-Z]{2}\d{1,2}[A-Z]{1,2}\d{3,4}";

static PLATE_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(PLATE_PATTERN).unwrap());

/// Uppercase and drop all whitespace
pub fn normalize_response(text: &str) -> String {
    text.chars()
        .filter(|c| !c.is_whitespace())
        .flat_map(char::to_uppercase)
        .collect()
}

/// Find the first plate-shaped substring in free text from the vision service.
pub fn extract_plate(text: &str) -> PlateReading {
    let normalized = normalize_response(text);
    match PLATE_RE.find(&normalized) {
        Some(m) => PlateReading::Recognized {
            plate: m.as_str().to_string(),
        },
        None => PlateReading::Unrecognized { raw: normalized },
    }
}
