use std::collections::HashSet;

/// The country searches are biased towards.
#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub country_code: String,
    pub country_name: String,
    pub native_names: Vec<String>,
}

impl Default for Region {
    fn default() -> Self {
        Self {
            country_code: "in".to_string(),
            country_name: "India".to_string(),
            native_names: vec!["भारत".to_string()],
        }
    }
}

impl Region {
    pub fn is_mentioned_in(&self, text: &str) -> bool {
        let haystack = text.to_lowercase();
        std::iter::once(&self.country_name)
            .chain(self.native_names.iter())
            .any(|name| haystack.contains(&name.to_lowercase()))
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedAddress {
    pub query: String,
    pub country_appended: bool,
}

/// Drops empty and repeated comma-separated segments (case-insensitive,
/// first occurrence wins) and appends the region's country name when the
/// address does not already mention it.
pub fn normalize_address(raw: &str, region: &Region) -> NormalizedAddress {
    let mut seen = HashSet::new();
    let segments: Vec<&str> = raw
        .split(',')
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .filter(|segment| seen.insert(segment.to_lowercase()))
        .collect();

    let mut query = segments.join(", ");
    let country_appended = !query.is_empty() && !region.is_mentioned_in(&query);
    if country_appended {
        query.push_str(", ");
        query.push_str(&region.country_name);
    }

    NormalizedAddress {
        query,
        country_appended,
    }
}

#[cfg(test)]
mod tests {
    use super::{Region, normalize_address};

    #[test]
    fn removes_duplicate_segment_and_appends_country() {
        let normalized = normalize_address(
            "Kalasalingam University, Kalasalingam University, Krishnankoil",
            &Region::default(),
        );
        assert_eq!(
            normalized.query,
            "Kalasalingam University, Krishnankoil, India"
        );
        assert!(normalized.country_appended);
    }

    #[test]
    fn dedup_ignores_case_and_keeps_first_spelling() {
        let normalized = normalize_address("Anna Nagar, ANNA NAGAR ,, Chennai", &Region::default());
        assert_eq!(normalized.query, "Anna Nagar, Chennai, India");
    }

    #[test]
    fn existing_country_marker_is_respected() {
        let latin = normalize_address("MG Road, Bengaluru, india", &Region::default());
        assert_eq!(latin.query, "MG Road, Bengaluru, india");
        assert!(!latin.country_appended);

        let native = normalize_address("नई दिल्ली, भारत", &Region::default());
        assert!(!native.country_appended);
    }

    #[test]
    fn normalization_is_idempotent() {
        let region = Region::default();
        let inputs = [
            "Kalasalingam University, Kalasalingam University, Krishnankoil",
            "  , Park Street,park street, Kolkata , ",
            "India",
            "Connaught Place",
        ];

        for input in inputs {
            let once = normalize_address(input, &region).query;
            let twice = normalize_address(&once, &region).query;
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn blank_input_normalizes_to_empty() {
        let normalized = normalize_address(" , ,", &Region::default());
        assert!(normalized.query.is_empty());
        assert!(!normalized.country_appended);
    }
}
