//! Property-Based Test Generators
//!
//! Proptest strategies for marketplace values that respect the domain's
//! ranges.

use chrono::{Duration, NaiveDate};
use core_kernel::GeoPoint;
use proptest::prelude::*;
use rust_decimal::Decimal;

use domain_listing::{LaundryType, PaymentType, PropertyType};
use domain_review::review::{MAX_RATING, MIN_RATING};

use crate::fixtures::DateFixtures;

/// Any valid coordinate pair
pub fn geo_point_strategy() -> impl Strategy<Value = GeoPoint> {
    (-90.0f64..=90.0, -180.0f64..=180.0).prop_filter_map("in range", |(lat, lng)| GeoPoint::new(lat, lng))
}

/// Points within a few degrees of Waterloo, where listings cluster
pub fn nearby_point_strategy() -> impl Strategy<Value = GeoPoint> {
    (42.0f64..45.0, -82.0f64..-78.0).prop_filter_map("in range", |(lat, lng)| GeoPoint::new(lat, lng))
}

/// Search radii in kilometres
pub fn radius_strategy() -> impl Strategy<Value = f64> {
    0.0f64..500.0
}

/// Monthly rent in whole dollars
pub fn rent_strategy() -> impl Strategy<Value = Decimal> {
    (300i64..10_000).prop_map(Decimal::from)
}

/// `(min, max)` budget with `min <= max`
pub fn budget_range_strategy() -> impl Strategy<Value = (Decimal, Decimal)> {
    (300i64..5_000, 0i64..5_000).prop_map(|(min, extra)| (Decimal::from(min), Decimal::from(min + extra)))
}

pub fn rating_strategy() -> impl Strategy<Value = i32> {
    MIN_RATING..=MAX_RATING
}

/// Ratings outside the accepted range
pub fn invalid_rating_strategy() -> impl Strategy<Value = i32> {
    prop_oneof![i32::MIN..MIN_RATING, (MAX_RATING + 1)..=i32::MAX]
}

/// Move-in dates on or after [`DateFixtures::today`]
pub fn future_move_in_strategy() -> impl Strategy<Value = NaiveDate> {
    (0i64..730).prop_map(|days| DateFixtures::today() + Duration::days(days))
}

pub fn property_type_strategy() -> impl Strategy<Value = PropertyType> {
    proptest::sample::select(PropertyType::ALL)
}

pub fn payment_type_strategy() -> impl Strategy<Value = PaymentType> {
    proptest::sample::select(PaymentType::ALL)
}

pub fn laundry_type_strategy() -> impl Strategy<Value = LaundryType> {
    proptest::sample::select(LaundryType::ALL)
}

/// Free-text locations, including blanks and non-ASCII
pub fn location_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        "[A-Za-z ]{1,24}",
        "\\PC{1,16}",
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_budget_range_is_ordered((min, max) in budget_range_strategy()) {
            prop_assert!(min <= max);
        }

        #[test]
        fn test_move_in_is_not_in_the_past(date in future_move_in_strategy()) {
            prop_assert!(date >= DateFixtures::today());
        }
    }
}
