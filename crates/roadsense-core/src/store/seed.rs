//! Demo data written on first start

use crate::location::GeoPoint;
use crate::model::{PotholeReport, User, UserRole};
use rand::Rng;

/// Number of historical reports in the demo data set
pub const DEMO_REPORT_COUNT: usize = 15;

/// Whether to populate a never-written store with demo data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeedPolicy {
    /// Start with empty collections
    #[default]
    Empty,
    /// Write demo users and historical reports
    Demo,
}

pub fn demo_users() -> Vec<User> {
    vec![
        User::new("1", "Admin User", "admin@roadsense.com", UserRole::Admin)
            .with_avatar("https://picsum.photos/100/100"),
        User::new("2", "John Doe", "john@gmail.com", UserRole::User)
            .with_avatar("https://picsum.photos/101/101"),
    ]
}

/// Historical, already-synced reports scattered around the default location.
pub fn demo_reports<R: Rng + ?Sized>(now_millis: i64, rng: &mut R) -> Vec<PotholeReport> {
    let origin = GeoPoint::default();

    (0..DEMO_REPORT_COUNT)
        .map(|i| {
            let (user_id, user_name) = if i % 2 == 0 { ("2", "John Doe") } else { ("3", "Jane Smith") };
            PotholeReport {
                id: format!("seed-{i}"),
                user_id: user_id.to_string(),
                user_name: user_name.to_string(),
                latitude: origin.latitude + rng.gen_range(-0.05..0.05),
                longitude: origin.longitude + rng.gen_range(-0.05..0.05),
                confidence: rng.gen_range(0.85..0.99),
                image_snapshot: format!("https://picsum.photos/seed/{i}/400/300"),
                timestamp: now_millis - rng.gen_range(0..1_000_000_000),
                synced: true,
            }
        })
        .collect()
}
