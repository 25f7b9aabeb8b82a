//! Feature extraction
//!
//! The model columns are fixed and ordered:
//!
//! | # | column | source |
//! |---|--------|--------|
//! | 0 | preferred_location | [`LocationEncoder`] code of the user's preferred location |
//! | 1-2 | budget_min, budget_max | user budget, 0 when unset |
//! | 3-5 | listing_price, listing_lat, listing_lng | listing, coordinates 0 when unknown |
//! | 6-9 | pet_friendly, heating, ac, fridge | 0/1 |
//! | 10 | laundry_type | I=2, S=1, N=0 |
//! | 11-16 | heat, hydro, water, internet, furnished, shareable | 0/1 |

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use domain_account::User;
use domain_listing::{LaundryType, Listing};

pub const FEATURE_COUNT: usize = 17;

pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = [
    "preferred_location",
    "budget_min",
    "budget_max",
    "listing_price",
    "listing_lat",
    "listing_lng",
    "pet_friendly",
    "heating",
    "ac",
    "fridge",
    "laundry_type",
    "heat",
    "hydro",
    "water",
    "internet",
    "furnished",
    "shareable",
];

const FNV_OFFSET_BASIS: u32 = 0x811c_9dc5;
const FNV_PRIME: u32 = 0x0100_0193;

/// Deterministic categorical code for free-text locations
pub struct LocationEncoder;

impl LocationEncoder {
    /// FNV-1a (32-bit) of the trimmed, lowercased text; blank text encodes as 0
    pub fn encode(location: &str) -> u32 {
        let normalized = location.trim().to_lowercase();
        if normalized.is_empty() {
            return 0;
        }
        normalized
            .bytes()
            .fold(FNV_OFFSET_BASIS, |hash, byte| (hash ^ u32::from(byte)).wrapping_mul(FNV_PRIME))
    }

    pub fn encode_opt(location: Option<&str>) -> u32 {
        location.map_or(0, Self::encode)
    }
}

fn decimal(value: Option<Decimal>) -> f64 {
    value.and_then(|d| d.to_f64()).unwrap_or(0.0)
}

fn flag(value: bool) -> f64 {
    if value {
        1.0
    } else {
        0.0
    }
}

/// Feature row for one (user, listing) pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub preferred_location: f64,
    pub budget_min: f64,
    pub budget_max: f64,
    pub listing_price: f64,
    pub listing_lat: f64,
    pub listing_lng: f64,
    pub pet_friendly: f64,
    pub heating: f64,
    pub ac: f64,
    pub fridge: f64,
    pub laundry_type: f64,
    pub heat: f64,
    pub hydro: f64,
    pub water: f64,
    pub internet: f64,
    pub furnished: f64,
    pub shareable: f64,
    /// Code of the listing's city; context for the heuristic, not a model column
    #[serde(skip)]
    pub listing_location: f64,
}

impl FeatureVector {
    pub fn build(user: &User, listing: &Listing) -> Self {
        let laundry = match listing.laundry_type {
            LaundryType::InUnit => 2.0,
            LaundryType::Shared => 1.0,
            LaundryType::NoLaundry => 0.0,
        };

        Self {
            preferred_location: f64::from(LocationEncoder::encode_opt(user.preferred_location.as_deref())),
            budget_min: decimal(user.budget_min),
            budget_max: decimal(user.budget_max),
            listing_price: decimal(Some(listing.price)),
            listing_lat: listing.latitude.unwrap_or(0.0),
            listing_lng: listing.longitude.unwrap_or(0.0),
            pet_friendly: flag(listing.pet_friendly),
            heating: flag(listing.heating),
            ac: flag(listing.ac),
            fridge: flag(listing.fridge),
            laundry_type: laundry,
            heat: flag(listing.heat),
            hydro: flag(listing.hydro),
            water: flag(listing.water),
            internet: flag(listing.internet),
            furnished: flag(listing.furnished),
            shareable: flag(listing.shareable),
            listing_location: f64::from(LocationEncoder::encode(&listing.city)),
        }
    }

    /// Model columns in [`FEATURE_NAMES`] order
    pub fn to_row(&self) -> [f64; FEATURE_COUNT] {
        [
            self.preferred_location,
            self.budget_min,
            self.budget_max,
            self.listing_price,
            self.listing_lat,
            self.listing_lng,
            self.pet_friendly,
            self.heating,
            self.ac,
            self.fridge,
            self.laundry_type,
            self.heat,
            self.hydro,
            self.water,
            self.internet,
            self.furnished,
            self.shareable,
        ]
    }
}
