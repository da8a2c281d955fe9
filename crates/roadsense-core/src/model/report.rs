use rand::Rng;
use serde::{Deserialize, Serialize};

/// A persisted record of one detection event, the unit of sync.
///
/// Field names follow the durable JSON shape
/// `{id, userId, userName, latitude, longitude, confidence, imageUrl, timestamp, synced}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PotholeReport {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Detection score in `[0, 1]`
    pub confidence: f64,
    /// Reduced-fidelity snapshot, usually a `data:` URL
    #[serde(rename = "imageUrl")]
    pub image_snapshot: String,
    /// Capture instant, milliseconds since the Unix epoch
    pub timestamp: i64,
    pub synced: bool,
}

impl PotholeReport {
    pub fn has_valid_confidence(&self) -> bool {
        (0.0..=1.0).contains(&self.confidence)
    }
}

/// Generate a report id from the capture instant plus 32 random bits.
///
/// Two ids minted in the same millisecond collide with probability 2^-32;
/// the store still rejects duplicates.
pub fn new_report_id<R: Rng + ?Sized>(now_millis: i64, rng: &mut R) -> String {
    format!("{}-{:08x}", now_millis, rng.gen_range(0..=u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    fn sample() -> PotholeReport {
        PotholeReport {
            id: "r-1".to_string(),
            user_id: "2".to_string(),
            user_name: "John Doe".to_string(),
            latitude: 40.7128,
            longitude: -74.0060,
            confidence: 0.91,
            image_snapshot: "data:image/jpeg;base64,AAAA".to_string(),
            timestamp: 1_700_000_000_000,
            synced: false,
        }
    }

    #[test]
    fn test_report_wire_shape() -> anyhow::Result<()> {
        let json = serde_json::to_value(sample())?;

        for key in ["id", "userId", "userName", "latitude", "longitude", "confidence", "imageUrl", "timestamp", "synced"] {
            assert!(json.get(key).is_some(), "missing key {key}");
        }
        assert_eq!(json.as_object().map(|o| o.len()), Some(9));
        Ok(())
    }

    #[test]
    fn test_confidence_bounds() {
        let mut report = sample();
        assert!(report.has_valid_confidence());

        report.confidence = 1.2;
        assert!(!report.has_valid_confidence());

        report.confidence = f64::NAN;
        assert!(!report.has_valid_confidence());
    }

    #[test]
    fn test_ids_differ_within_same_millisecond() {
        let mut rng = StdRng::seed_from_u64(7);
        let a = new_report_id(1_000, &mut rng);
        let b = new_report_id(1_000, &mut rng);

        assert!(a.starts_with("1000-"));
        assert_ne!(a, b);
    }
}
