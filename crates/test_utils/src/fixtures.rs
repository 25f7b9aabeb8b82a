//! Pre-built Test Fixtures
//!
//! Fixed dates, places and amounts so tests stay predictable.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use core_kernel::GeoPoint;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Fixture dates
pub struct DateFixtures;

impl DateFixtures {
    /// The "today" most listing tests validate against (Jan 15, 2025)
    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    /// A move-in date safely after [`DateFixtures::today`]
    pub fn move_in() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
    }

    /// A move-in date before [`DateFixtures::today`]
    pub fn past_move_in() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 12, 1).unwrap()
    }

    /// Move-in date relative to the real clock, for database tests
    pub fn move_in_from_now(days: i64) -> NaiveDate {
        Utc::now().date_naive() + Duration::days(days)
    }

    pub fn created_at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 10, 9, 30, 0).unwrap()
    }
}

/// Fixture locations
pub struct PlaceFixtures;

impl PlaceFixtures {
    pub fn waterloo() -> GeoPoint {
        GeoPoint::new(43.4643, -80.5204).unwrap()
    }

    /// About 1.5 km from [`PlaceFixtures::waterloo`]
    pub fn uptown_waterloo() -> GeoPoint {
        GeoPoint::new(43.4668, -80.5228).unwrap()
    }

    pub fn toronto() -> GeoPoint {
        GeoPoint::new(43.6532, -79.3832).unwrap()
    }

    pub fn vancouver() -> GeoPoint {
        GeoPoint::new(49.2827, -123.1207).unwrap()
    }
}

/// Fixture amounts
pub struct AmountFixtures;

impl AmountFixtures {
    pub fn rent() -> Decimal {
        dec!(1850.00)
    }

    pub fn budget_min() -> Decimal {
        dec!(1200.00)
    }

    pub fn budget_max() -> Decimal {
        dec!(2200.00)
    }

    pub fn utilities() -> Decimal {
        dec!(120.00)
    }
}

/// Fixture strings
pub struct StringFixtures;

impl StringFixtures {
    pub const PASSWORD: &'static str = "correct-horse-battery";
    pub const PHONE: &'static str = "+1-519-555-0123";

    pub fn email(n: usize) -> String {
        format!("user{}@example.com", n)
    }

    pub fn street_address() -> &'static str {
        "200 University Ave W"
    }

    pub fn postal_code() -> &'static str {
        "N2L 3G1"
    }
}
