//! Closest well-known aspect ratio

const GOLDEN: f64 = 1.618_033_988_749_895;

const KNOWN_RATIOS: &[(&str, f64)] = &[
    ("1:1.294", 1.0 / 1.294),
    ("1:1.545", 1.0 / 1.545),
    ("4:3", 4.0 / 3.0),
    ("1.375:1", 1.375),
    ("3:2", 3.0 / 2.0),
    ("16:9", 16.0 / 9.0),
    ("1.85:1", 1.85),
    ("1.96:1", 1.96),
    ("2.35:1", 2.35),
    ("√2:1", std::f64::consts::SQRT_2),
    ("1:√2", 1.0 / std::f64::consts::SQRT_2),
    ("Φ:1", GOLDEN),
    ("1:Φ", 1.0 / GOLDEN),
];

/// Name of the known ratio nearest to `width / height`.
///
/// `None` for a zero height.
pub fn known_ratio(width: u64, height: u64) -> Option<&'static str> {
    if height == 0 {
        return None;
    }
    let actual = width as f64 / height as f64;
    KNOWN_RATIOS
        .iter()
        .min_by(|(_, a), (_, b)| (actual - a).abs().total_cmp(&(actual - b).abs()))
        .map(|(name, _)| *name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_ratios_resolve() {
        assert_eq!(known_ratio(640, 480), Some("4:3"));
        assert_eq!(known_ratio(1920, 1080), Some("16:9"));
        assert_eq!(known_ratio(300, 200), Some("3:2"));
    }

    #[test]
    fn paper_and_golden_ratios() {
        assert_eq!(known_ratio(297, 210), Some("√2:1"));
        assert_eq!(known_ratio(210, 297), Some("1:√2"));
        assert_eq!(known_ratio(1618, 1000), Some("Φ:1"));
    }

    #[test]
    fn zero_height_has_no_ratio() {
        assert_eq!(known_ratio(10, 0), None);
    }
}
