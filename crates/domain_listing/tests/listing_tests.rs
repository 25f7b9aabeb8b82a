//! Tests for listing posting, editing, pictures and search

use chrono::{Days, NaiveDate, Utc};
use proptest::prelude::*;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use core_kernel::{GeoPoint, ListingId, UserId, VerificationStatus};
use domain_listing::favorites::FavoriteToggle;
use domain_listing::interaction::{InteractionKind, ListingInteraction};
use domain_listing::listing::{LaundryType, Listing, ListingDraft, PaymentType, PropertyType};
use domain_listing::picture::{PictureSet, UploadedImage, MAX_EXTRA_PICTURES};
use domain_listing::search::{ListingQuery, RadiusFilter, SortOrder};

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn draft() -> ListingDraft {
    ListingDraft {
        price: Some(dec!(1850.00)),
        property_type: Some(PropertyType::Apartment),
        payment_type: Some(PaymentType::Cheque),
        bedrooms: Some(2),
        bathrooms: Some(1),
        sqft_area: Some(850),
        laundry_type: Some(LaundryType::InUnit),
        move_in_date: Some(today() + Days::new(30)),
        description: Some("Bright two bedroom near campus".to_string()),
        street_address: Some("250 Columbia St W".to_string()),
        city: Some("Waterloo".to_string()),
        postal_code: Some("N2L 0E6".to_string()),
        latitude: Some(43.4723),
        longitude: Some(-80.5449),
        ..Default::default()
    }
}

fn listing() -> Listing {
    draft().validate(UserId::new(), today()).unwrap()
}

fn image(name: &str) -> UploadedImage {
    UploadedImage {
        file_name: name.to_string(),
        content_type: Some("image/jpeg".to_string()),
        data: vec![0xFF, 0xD8, 0xFF],
    }
}

fn pictures(extras: usize) -> PictureSet {
    PictureSet {
        front: vec![image("front.jpg")],
        extras: (0..extras).map(|i| image(&format!("room{}.png", i))).collect(),
    }
}

fn params(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

// ============================================================================
// Posting Tests
// ============================================================================

mod posting_tests {
    use super::*;

    #[test]
    fn test_valid_listing() {
        let owner = UserId::new();
        let listing = draft().validate(owner, today()).unwrap();

        assert!(listing.is_owned_by(owner));
        assert_eq!(listing.verification_status, VerificationStatus::Unverified);
        assert_eq!(listing.parking_spaces, 0);
        assert!(!listing.pet_friendly);
        assert!(listing.location().is_some());
    }

    #[test]
    fn test_missing_bathrooms_and_sqft_area() {
        let mut d = draft();
        d.bathrooms = None;
        d.sqft_area = None;

        let errors = d.validate(UserId::new(), today()).unwrap_err();
        assert!(errors.contains("bathrooms"));
        assert!(errors.contains("sqft_area"));
        assert!(!errors.contains("price"));
    }

    #[test]
    fn test_negative_values() {
        let mut d = draft();
        d.price = Some(dec!(-1));
        d.bedrooms = Some(-2);
        d.condo_fee = Some(dec!(-10));

        let errors = d.validate(UserId::new(), today()).unwrap_err();
        assert!(errors.contains("price"));
        assert!(errors.contains("bedrooms"));
        assert!(errors.contains("condo_fee"));
    }

    #[test]
    fn test_move_in_date_in_past() {
        let mut d = draft();
        d.move_in_date = Some(today() - Days::new(1));

        let errors = d.validate(UserId::new(), today()).unwrap_err();
        assert_eq!(
            errors.messages("move_in_date"),
            ["Move-in date must be in the future.".to_string()]
        );
    }

    #[test]
    fn test_move_in_today_is_allowed() {
        let mut d = draft();
        d.move_in_date = Some(today());
        assert!(d.validate(UserId::new(), today()).is_ok());
    }

    #[test]
    fn test_half_coordinates_rejected() {
        let mut d = draft();
        d.longitude = None;
        let errors = d.validate(UserId::new(), today()).unwrap_err();
        assert!(errors.contains("latitude"));
    }

    #[test]
    fn test_from_form_builds_draft() {
        let fields = params(&[
            ("price", "1200.50"),
            ("property_type", "H"),
            ("payment_type", "D"),
            ("bedrooms", "3"),
            ("bathrooms", "2"),
            ("sqft_area", "1400"),
            ("move_in_date", "2099-09-01"),
            ("street_address", "10 King St E"),
            ("city", "Kitchener"),
            ("postal_code", "N2G 2K4"),
            ("pet_friendly", "true"),
            ("utilities_payable_by_tenant", "false"),
        ]);
        let d = ListingDraft::from_form(&fields).unwrap();
        assert_eq!(d.price, Some(dec!(1200.50)));
        assert_eq!(d.property_type, Some(PropertyType::House));
        assert_eq!(d.pet_friendly, Some(true));

        let listing = d.validate(UserId::new(), today()).unwrap();
        assert_eq!(listing.city, "Kitchener");
        assert!(listing.location().is_none());
    }

    #[test]
    fn test_serialized_price_is_string() {
        let json = serde_json::to_value(listing()).unwrap();
        assert_eq!(json["price"], "1850.00");
        assert_eq!(json["property_type"], "A");
        assert!(json.get("security_deposit_payable_by_tenant").is_some());
    }

    #[test]
    fn test_tenant_monthly_extras() {
        let mut d = draft();
        d.utilities_cost = Some(dec!(120));
        d.utilities_payable_by_tenant = Some(true);
        d.condo_fee = Some(dec!(300));
        d.security_deposit = Some(dec!(1850));
        d.security_deposit_payable_by_tenant = Some(true);
        let listing = d.validate(UserId::new(), today()).unwrap();
        assert_eq!(listing.fees.tenant_monthly_extras(), dec!(120));
    }
}

// ============================================================================
// Editing Tests
// ============================================================================

mod editing_tests {
    use super::*;

    #[test]
    fn test_partial_edit() {
        let mut l = listing();
        let patch = ListingDraft {
            price: Some(dec!(1999)),
            furnished: Some(true),
            ..Default::default()
        };
        patch.apply(&mut l, today()).unwrap();

        assert_eq!(l.price, dec!(1999));
        assert!(l.furnished);
        assert_eq!(l.bedrooms, 2);
    }

    #[test]
    fn test_invalid_edit_leaves_listing_unchanged() {
        let mut l = listing();
        let patch = ListingDraft {
            price: Some(dec!(-5)),
            city: Some("Toronto".to_string()),
            ..Default::default()
        };
        assert!(patch.apply(&mut l, today()).is_err());
        assert_eq!(l.city, "Waterloo");
        assert_eq!(l.price, dec!(1850.00));
    }

    #[test]
    fn test_edit_without_date_skips_date_check() {
        let mut l = listing();
        l.move_in_date = today() - Days::new(10);
        let patch = ListingDraft {
            description: Some("Updated".to_string()),
            ..Default::default()
        };
        assert!(patch.apply(&mut l, today()).is_ok());
    }

    #[test]
    fn test_edit_to_past_date_rejected() {
        let mut l = listing();
        let patch = ListingDraft {
            move_in_date: Some(today() - Days::new(1)),
            ..Default::default()
        };
        let errors = patch.apply(&mut l, today()).unwrap_err();
        assert!(errors.contains("move_in_date"));
    }
}

// ============================================================================
// Picture Tests
// ============================================================================

mod picture_tests {
    use super::*;

    #[test]
    fn test_valid_picture_set() {
        assert!(pictures(3).validate_for_create().is_ok());
        assert!(pictures(MAX_EXTRA_PICTURES).validate_for_create().is_ok());
    }

    #[test]
    fn test_no_pictures() {
        let errors = PictureSet::default().validate_for_create().unwrap_err();
        assert!(errors.contains("front_image"));
        assert!(errors.contains("images"));
    }

    #[test]
    fn test_too_few_and_too_many_extras() {
        assert!(pictures(2).validate_for_create().unwrap_err().contains("images"));
        assert!(pictures(MAX_EXTRA_PICTURES + 1)
            .validate_for_create()
            .unwrap_err()
            .contains("images"));
    }

    #[test]
    fn test_two_front_images() {
        let mut set = pictures(3);
        set.front.push(image("second.jpg"));
        let errors = set.validate_for_create().unwrap_err();
        assert!(errors.contains("front_image"));
    }

    #[test]
    fn test_non_image_rejected() {
        let mut set = pictures(3);
        set.extras[0] = UploadedImage {
            file_name: "notes.txt".to_string(),
            content_type: Some("text/plain".to_string()),
            data: b"hello".to_vec(),
        };
        let errors = set.validate_for_create().unwrap_err();
        assert_eq!(errors.messages("images"), ["Upload a valid image.".to_string()]);
    }

    #[test]
    fn test_update_allows_no_pictures() {
        assert!(PictureSet::default().validate_for_update().is_ok());
        assert!(pictures(1).validate_for_update().is_err());
    }

    #[test]
    fn test_layout_has_single_primary_first() {
        let listing_id = ListingId::new();
        let laid_out = pictures(4).layout(listing_id);

        assert_eq!(laid_out.len(), 5);
        assert_eq!(laid_out.iter().filter(|(p, _)| p.is_primary).count(), 1);
        assert!(laid_out[0].0.is_primary);
        assert_eq!(laid_out[0].0.position, 0);
        assert_eq!(laid_out[4].0.position, 4);
        assert!(laid_out[1].0.image.ends_with(".png"));
        assert!(laid_out[0]
            .0
            .image
            .starts_with(&format!("listing_pictures/{}/", listing_id.as_uuid())));
    }

    #[test]
    fn test_layout_extras_only_start_after_front() {
        let set = PictureSet { front: vec![], extras: vec![image("a.jpg"), image("b.jpg"), image("c.jpg")] };
        let laid_out = set.layout(ListingId::new());
        assert_eq!(laid_out[0].0.position, 1);
        assert!(laid_out.iter().all(|(p, _)| !p.is_primary));
    }
}

// ============================================================================
// Search Tests
// ============================================================================

mod search_tests {
    use super::*;

    #[test]
    fn test_query_parsing() {
        let q = ListingQuery::from_query(&params(&[
            ("min_price", "1000"),
            ("max_price", "2000"),
            ("bedrooms", "2"),
            ("property_type", "A"),
            ("pet_friendly", "true"),
            ("location", " waterloo "),
            ("sort", "price_desc"),
        ]));

        assert_eq!(q.min_price, Some(dec!(1000)));
        assert_eq!(q.bedrooms, Some(2));
        assert_eq!(q.property_type, Some(PropertyType::Apartment));
        assert_eq!(q.pet_friendly, Some(true));
        assert_eq!(q.location.as_deref(), Some("waterloo"));
        assert_eq!(q.sort, SortOrder::PriceDesc);
        assert!(q.radius.is_none());
    }

    #[test]
    fn test_invalid_values_are_ignored() {
        let q = ListingQuery::from_query(&params(&[
            ("min_price", "cheap"),
            ("furnished", "kinda"),
            ("sort", "random"),
            ("lat", "43.4"),
        ]));
        assert_eq!(q, ListingQuery::default());
    }

    #[test]
    fn test_radius_filter() {
        let near = listing();
        let mut far = listing();
        far.latitude = Some(43.6532);
        far.longitude = Some(-79.3832);
        let mut unplaced = listing();
        unplaced.latitude = None;
        unplaced.longitude = None;

        let q = ListingQuery::from_query(&params(&[
            ("lat", "43.4643"),
            ("lng", "-80.5204"),
            ("radius", "10"),
        ]));
        let kept = q.apply_radius(vec![near.clone(), far, unplaced]);

        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, near.id);
    }

    #[test]
    fn test_no_radius_keeps_everything() {
        let mut unplaced = listing();
        unplaced.latitude = None;
        let kept = ListingQuery::default().apply_radius(vec![listing(), unplaced]);
        assert_eq!(kept.len(), 2);
    }

    proptest! {
        #[test]
        fn prop_wider_radius_keeps_at_least_as_much(
            lat in 42.0f64..45.0,
            lng in -82.0f64..-78.0,
            r in 0.0f64..300.0,
            extra in 0.0f64..300.0,
        ) {
            let mut placed = listing();
            placed.latitude = Some(lat);
            placed.longitude = Some(lng);
            let query = |radius_km: f64| ListingQuery {
                radius: Some(RadiusFilter { center: GeoPoint::new(43.4643, -80.5204).unwrap(), radius_km }),
                ..ListingQuery::default()
            };

            let narrow = query(r).apply_radius(vec![placed.clone()]).len();
            let wide = query(r + extra).apply_radius(vec![placed]).len();
            prop_assert!(narrow <= wide);
        }
    }
}

// ============================================================================
// Favorites and Interactions
// ============================================================================

#[test]
fn test_favorite_toggle() {
    assert_eq!(FavoriteToggle::from_current(false), FavoriteToggle::Added);
    assert_eq!(FavoriteToggle::from_current(true), FavoriteToggle::Removed);
    assert!(FavoriteToggle::Added.is_favorite());
}

#[test]
fn test_interaction_record() {
    let interaction = ListingInteraction::record(UserId::new(), ListingId::new(), InteractionKind::Favourite);
    assert_eq!(interaction.kind.code(), "favourite");
    assert_eq!(serde_json::to_value(interaction.kind).unwrap(), "favourite");
}
