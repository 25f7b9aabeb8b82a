//! Listing search criteria
//!
//! The structured filters are pushed down to the database. The radius
//! filter is applied afterwards over the candidates that carry
//! coordinates, using the haversine distance.

use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

use core_kernel::{parse_flag, GeoPoint, UserId};

use crate::listing::{LaundryType, Listing, PropertyType};

/// Result ordering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    PriceAsc,
    PriceDesc,
    #[default]
    Newest,
    MoveIn,
}

impl FromStr for SortOrder {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(SortOrder::PriceAsc),
            "price_desc" => Ok(SortOrder::PriceDesc),
            "newest" => Ok(SortOrder::Newest),
            "move_in" => Ok(SortOrder::MoveIn),
            _ => Err(()),
        }
    }
}

/// Centre point and radius in kilometres
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadiusFilter {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl RadiusFilter {
    pub fn contains(&self, listing: &Listing) -> bool {
        listing
            .location()
            .is_some_and(|point| self.center.within_radius(&point, self.radius_km))
    }
}

/// Parsed `/listings/viewAll` query
///
/// Parameters that fail to parse are ignored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ListingQuery {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub property_type: Option<PropertyType>,
    pub laundry_type: Option<LaundryType>,
    pub pet_friendly: Option<bool>,
    pub shareable: Option<bool>,
    pub furnished: Option<bool>,
    pub heating: Option<bool>,
    pub ac: Option<bool>,
    pub parking: Option<i32>,
    /// Case-insensitive match on city, street address or postal code
    pub location: Option<String>,
    pub owner: Option<UserId>,
    pub radius: Option<RadiusFilter>,
    pub sort: SortOrder,
}

impl ListingQuery {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        fn parsed<T: FromStr>(params: &HashMap<String, String>, key: &str) -> Option<T> {
            params.get(key).and_then(|v| v.trim().parse().ok())
        }
        let flag = |key: &str| params.get(key).and_then(|v| parse_flag(v));

        let radius = match (
            parsed::<f64>(params, "lat"),
            parsed::<f64>(params, "lng"),
            parsed::<f64>(params, "radius"),
        ) {
            (Some(lat), Some(lng), Some(radius_km)) if radius_km >= 0.0 => {
                GeoPoint::new(lat, lng).map(|center| RadiusFilter { center, radius_km })
            }
            _ => None,
        };

        Self {
            min_price: parsed(params, "min_price"),
            max_price: parsed(params, "max_price"),
            bedrooms: parsed(params, "bedrooms"),
            bathrooms: parsed(params, "bathrooms"),
            property_type: parsed(params, "property_type"),
            laundry_type: parsed(params, "laundry_type"),
            pet_friendly: flag("pet_friendly"),
            shareable: flag("shareable"),
            furnished: flag("furnished"),
            heating: flag("heating"),
            ac: flag("ac"),
            parking: parsed(params, "parking"),
            location: params
                .get("location")
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty()),
            owner: parsed(params, "owner"),
            radius,
            sort: parsed(params, "sort").unwrap_or_default(),
        }
    }

    /// Drops candidates outside the radius, keeping their order
    ///
    /// Without a radius every candidate is kept. With one, listings lacking
    /// coordinates are dropped.
    pub fn apply_radius(&self, candidates: Vec<Listing>) -> Vec<Listing> {
        match &self.radius {
            None => candidates,
            Some(radius) => {
                let before = candidates.len();
                let kept: Vec<Listing> = candidates
                    .into_iter()
                    .filter(|listing| radius.contains(listing))
                    .collect();
                tracing::debug!(before, after = kept.len(), radius_km = radius.radius_km, "Applied radius filter");
                kept
            }
        }
    }
}
