//! Listing aggregate, posting and editing

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::str::FromStr;

use core_kernel::{
    define_code_enum, parse_flag, FieldErrors, GeoPoint, ListingId, UserId, VerificationStatus,
};

define_code_enum!(
    PropertyType {
        House => "H",
        Apartment => "A",
        Condo => "C",
        Townhouse => "T",
    }
);

define_code_enum!(
    /// How rent is paid
    PaymentType {
        Cheque => "C",
        DirectDeposit => "D",
        Interac => "I",
        PreAuthorizedDebit => "P",
        Other => "X",
    }
);

define_code_enum!(
    LaundryType {
        InUnit => "I",
        Shared => "S",
        NoLaundry => "N",
    }
);

const NON_NEGATIVE: &str = "Ensure this value is greater than or equal to 0.";
const MOVE_IN_PAST: &str = "Move-in date must be in the future.";

/// Extra monthly or one-off costs and who pays them
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Fees {
    pub utilities_cost: Option<Decimal>,
    pub utilities_payable_by_tenant: bool,
    pub property_taxes: Option<Decimal>,
    pub property_taxes_payable_by_tenant: bool,
    pub condo_fee: Option<Decimal>,
    pub condo_fee_payable_by_tenant: bool,
    pub hoa_fee: Option<Decimal>,
    pub hoa_fee_payable_by_tenant: bool,
    pub security_deposit: Option<Decimal>,
    pub security_deposit_payable_by_tenant: bool,
}

impl Fees {
    fn amounts(&self) -> [(&'static str, Option<Decimal>); 5] {
        [
            ("utilities_cost", self.utilities_cost),
            ("property_taxes", self.property_taxes),
            ("condo_fee", self.condo_fee),
            ("hoa_fee", self.hoa_fee),
            ("security_deposit", self.security_deposit),
        ]
    }

    /// Sum of the recurring fees the tenant pays on top of rent
    pub fn tenant_monthly_extras(&self) -> Decimal {
        [
            (self.utilities_cost, self.utilities_payable_by_tenant),
            (self.condo_fee, self.condo_fee_payable_by_tenant),
            (self.hoa_fee, self.hoa_fee_payable_by_tenant),
        ]
        .into_iter()
        .filter(|(_, by_tenant)| *by_tenant)
        .filter_map(|(amount, _)| amount)
        .sum()
    }
}

/// A rentable property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: ListingId,
    pub owner_id: UserId,
    pub price: Decimal,
    pub property_type: PropertyType,
    pub payment_type: PaymentType,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub sqft_area: i32,
    pub laundry_type: LaundryType,
    pub parking_spaces: i32,
    pub heating: bool,
    pub ac: bool,
    pub extra_amenities: Option<String>,
    pub pet_friendly: bool,
    pub shareable: bool,
    pub fridge: bool,
    pub furnished: bool,
    /// Utility inclusions
    pub heat: bool,
    pub hydro: bool,
    pub water: bool,
    pub internet: bool,
    pub move_in_date: NaiveDate,
    pub description: String,
    pub unit_number: Option<String>,
    pub street_address: String,
    pub city: String,
    pub postal_code: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(flatten)]
    pub fees: Fees,
    pub verification_status: VerificationStatus,
    pub created_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.owner_id == user_id
    }

    /// Coordinates, when both are known and in range
    pub fn location(&self) -> Option<GeoPoint> {
        GeoPoint::new(self.latitude?, self.longitude?)
    }

    fn check_invariants(&self, errors: &mut FieldErrors) {
        errors.check(self.price >= Decimal::ZERO, "price", NON_NEGATIVE);
        errors.check(self.bedrooms >= 0, "bedrooms", NON_NEGATIVE);
        errors.check(self.bathrooms >= 0, "bathrooms", NON_NEGATIVE);
        errors.check(self.sqft_area >= 0, "sqft_area", NON_NEGATIVE);
        errors.check(self.parking_spaces >= 0, "parking_spaces", NON_NEGATIVE);

        for (field, value) in [
            ("street_address", &self.street_address),
            ("city", &self.city),
            ("postal_code", &self.postal_code),
        ] {
            if value.trim().is_empty() {
                errors.add(field, "This field may not be blank.");
            }
        }

        for (field, amount) in self.fees.amounts() {
            if let Some(amount) = amount {
                errors.check(amount >= Decimal::ZERO, field, NON_NEGATIVE);
            }
        }

        match (self.latitude, self.longitude) {
            (None, None) => {}
            (Some(lat), Some(lng)) => {
                if GeoPoint::new(lat, lng).is_none() {
                    errors.add("latitude", "Coordinates are out of range.");
                }
            }
            _ => errors.add("latitude", "Latitude and longitude must be given together."),
        }
    }
}

/// Listing fields as submitted by a landlord
///
/// Used both for posting, where the required fields must be present, and
/// for editing, where every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ListingDraft {
    pub price: Option<Decimal>,
    pub property_type: Option<PropertyType>,
    pub payment_type: Option<PaymentType>,
    pub bedrooms: Option<i32>,
    pub bathrooms: Option<i32>,
    pub sqft_area: Option<i32>,
    pub laundry_type: Option<LaundryType>,
    pub parking_spaces: Option<i32>,
    pub heating: Option<bool>,
    pub ac: Option<bool>,
    pub extra_amenities: Option<String>,
    pub pet_friendly: Option<bool>,
    pub shareable: Option<bool>,
    pub fridge: Option<bool>,
    pub furnished: Option<bool>,
    pub heat: Option<bool>,
    pub hydro: Option<bool>,
    pub water: Option<bool>,
    pub internet: Option<bool>,
    pub move_in_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub unit_number: Option<String>,
    pub street_address: Option<String>,
    pub city: Option<String>,
    pub postal_code: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub utilities_cost: Option<Decimal>,
    pub utilities_payable_by_tenant: Option<bool>,
    pub property_taxes: Option<Decimal>,
    pub property_taxes_payable_by_tenant: Option<bool>,
    pub condo_fee: Option<Decimal>,
    pub condo_fee_payable_by_tenant: Option<bool>,
    pub hoa_fee: Option<Decimal>,
    pub hoa_fee_payable_by_tenant: Option<bool>,
    pub security_deposit: Option<Decimal>,
    pub security_deposit_payable_by_tenant: Option<bool>,
}

/// Edits share the draft's shape; absent fields are left untouched
pub type ListingPatch = ListingDraft;

impl ListingDraft {
    /// Reads a draft from multipart text fields
    ///
    /// Empty values count as absent. Values that fail to parse are
    /// reported against their field.
    pub fn from_form(fields: &HashMap<String, String>) -> Result<Self, FieldErrors> {
        let mut form = FormReader { fields, errors: FieldErrors::new() };

        let draft = ListingDraft {
            price: form.parsed("price", "A valid number is required."),
            property_type: form.choice("property_type"),
            payment_type: form.choice("payment_type"),
            bedrooms: form.parsed("bedrooms", "A valid integer is required."),
            bathrooms: form.parsed("bathrooms", "A valid integer is required."),
            sqft_area: form.parsed("sqft_area", "A valid integer is required."),
            laundry_type: form.choice("laundry_type"),
            parking_spaces: form.parsed("parking_spaces", "A valid integer is required."),
            heating: form.flag("heating"),
            ac: form.flag("ac"),
            extra_amenities: form.text("extra_amenities"),
            pet_friendly: form.flag("pet_friendly"),
            shareable: form.flag("shareable"),
            fridge: form.flag("fridge"),
            furnished: form.flag("furnished"),
            heat: form.flag("heat"),
            hydro: form.flag("hydro"),
            water: form.flag("water"),
            internet: form.flag("internet"),
            move_in_date: form.parsed("move_in_date", "Date has wrong format. Use YYYY-MM-DD."),
            description: form.text("description"),
            unit_number: form.text("unit_number"),
            street_address: form.text("street_address"),
            city: form.text("city"),
            postal_code: form.text("postal_code"),
            latitude: form.parsed("latitude", "A valid number is required."),
            longitude: form.parsed("longitude", "A valid number is required."),
            utilities_cost: form.parsed("utilities_cost", "A valid number is required."),
            utilities_payable_by_tenant: form.flag("utilities_payable_by_tenant"),
            property_taxes: form.parsed("property_taxes", "A valid number is required."),
            property_taxes_payable_by_tenant: form.flag("property_taxes_payable_by_tenant"),
            condo_fee: form.parsed("condo_fee", "A valid number is required."),
            condo_fee_payable_by_tenant: form.flag("condo_fee_payable_by_tenant"),
            hoa_fee: form.parsed("hoa_fee", "A valid number is required."),
            hoa_fee_payable_by_tenant: form.flag("hoa_fee_payable_by_tenant"),
            security_deposit: form.parsed("security_deposit", "A valid number is required."),
            security_deposit_payable_by_tenant: form.flag("security_deposit_payable_by_tenant"),
        };

        form.errors.into_result()?;
        Ok(draft)
    }

    /// Validates a new listing posted by `owner_id`
    pub fn validate(self, owner_id: UserId, today: NaiveDate) -> Result<Listing, FieldErrors> {
        let mut errors = FieldErrors::new();

        fn require<T>(errors: &mut FieldErrors, field: &str, value: Option<T>) -> Option<T> {
            if value.is_none() {
                errors.required(field);
            }
            value
        }

        let price = require(&mut errors, "price", self.price);
        let property_type = require(&mut errors, "property_type", self.property_type);
        let payment_type = require(&mut errors, "payment_type", self.payment_type);
        let bedrooms = require(&mut errors, "bedrooms", self.bedrooms);
        let bathrooms = require(&mut errors, "bathrooms", self.bathrooms);
        let sqft_area = require(&mut errors, "sqft_area", self.sqft_area);
        let move_in_date = require(&mut errors, "move_in_date", self.move_in_date);
        let street_address = require(&mut errors, "street_address", self.street_address);
        let city = require(&mut errors, "city", self.city);
        let postal_code = require(&mut errors, "postal_code", self.postal_code);

        if let Some(date) = move_in_date {
            errors.check(date >= today, "move_in_date", MOVE_IN_PAST);
        }

        let (
            Some(price),
            Some(property_type),
            Some(payment_type),
            Some(bedrooms),
            Some(bathrooms),
            Some(sqft_area),
            Some(move_in_date),
            Some(street_address),
            Some(city),
            Some(postal_code),
        ) = (
            price,
            property_type,
            payment_type,
            bedrooms,
            bathrooms,
            sqft_area,
            move_in_date,
            street_address,
            city,
            postal_code,
        )
        else {
            return Err(errors);
        };

        let listing = Listing {
            id: ListingId::new_v7(),
            owner_id,
            price,
            property_type,
            payment_type,
            bedrooms,
            bathrooms,
            sqft_area,
            laundry_type: self.laundry_type.unwrap_or(LaundryType::NoLaundry),
            parking_spaces: self.parking_spaces.unwrap_or(0),
            heating: self.heating.unwrap_or(false),
            ac: self.ac.unwrap_or(false),
            extra_amenities: self.extra_amenities,
            pet_friendly: self.pet_friendly.unwrap_or(false),
            shareable: self.shareable.unwrap_or(false),
            fridge: self.fridge.unwrap_or(false),
            furnished: self.furnished.unwrap_or(false),
            heat: self.heat.unwrap_or(false),
            hydro: self.hydro.unwrap_or(false),
            water: self.water.unwrap_or(false),
            internet: self.internet.unwrap_or(false),
            move_in_date,
            description: self.description.unwrap_or_default(),
            unit_number: self.unit_number,
            street_address: street_address.trim().to_string(),
            city: city.trim().to_string(),
            postal_code: postal_code.trim().to_string(),
            latitude: self.latitude,
            longitude: self.longitude,
            fees: Fees {
                utilities_cost: self.utilities_cost,
                utilities_payable_by_tenant: self.utilities_payable_by_tenant.unwrap_or(false),
                property_taxes: self.property_taxes,
                property_taxes_payable_by_tenant: self.property_taxes_payable_by_tenant.unwrap_or(false),
                condo_fee: self.condo_fee,
                condo_fee_payable_by_tenant: self.condo_fee_payable_by_tenant.unwrap_or(false),
                hoa_fee: self.hoa_fee,
                hoa_fee_payable_by_tenant: self.hoa_fee_payable_by_tenant.unwrap_or(false),
                security_deposit: self.security_deposit,
                security_deposit_payable_by_tenant: self
                    .security_deposit_payable_by_tenant
                    .unwrap_or(false),
            },
            verification_status: VerificationStatus::Unverified,
            created_at: Utc::now(),
        };

        listing.check_invariants(&mut errors);
        errors.into_result()?;
        Ok(listing)
    }

    /// Applies an edit to `listing`, validating the merged result
    ///
    /// The move-in date is only checked when the edit changes it. On error
    /// the listing is left unchanged.
    pub fn apply(self, listing: &mut Listing, today: NaiveDate) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut merged = listing.clone();

        if let Some(date) = self.move_in_date {
            errors.check(date >= today, "move_in_date", MOVE_IN_PAST);
        }

        macro_rules! set {
            ($($field:ident),+ $(,)?) => {
                $( if let Some(v) = self.$field { merged.$field = v; } )+
            };
        }
        macro_rules! set_opt {
            ($($field:ident),+ $(,)?) => {
                $( if self.$field.is_some() { merged.$field = self.$field; } )+
            };
        }
        macro_rules! set_fee {
            ($($field:ident),+ $(,)?) => {
                $( if let Some(v) = self.$field { merged.fees.$field = v; } )+
            };
        }
        macro_rules! set_fee_opt {
            ($($field:ident),+ $(,)?) => {
                $( if self.$field.is_some() { merged.fees.$field = self.$field; } )+
            };
        }

        set!(
            price, property_type, payment_type, bedrooms, bathrooms, sqft_area, laundry_type,
            parking_spaces, heating, ac, pet_friendly, shareable, fridge, furnished, heat, hydro,
            water, internet, move_in_date, description, street_address, city, postal_code,
        );
        set_opt!(extra_amenities, unit_number, latitude, longitude);
        set_fee!(
            utilities_payable_by_tenant, property_taxes_payable_by_tenant,
            condo_fee_payable_by_tenant, hoa_fee_payable_by_tenant,
            security_deposit_payable_by_tenant,
        );
        set_fee_opt!(utilities_cost, property_taxes, condo_fee, hoa_fee, security_deposit);

        merged.check_invariants(&mut errors);
        errors.into_result()?;

        *listing = merged;
        Ok(())
    }
}

struct FormReader<'a> {
    fields: &'a HashMap<String, String>,
    errors: FieldErrors,
}

impl FormReader<'_> {
    fn raw(&self, field: &str) -> Option<&str> {
        self.fields
            .get(field)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    fn text(&mut self, field: &str) -> Option<String> {
        self.raw(field).map(str::to_string)
    }

    fn parsed<T: FromStr>(&mut self, field: &str, message: &str) -> Option<T> {
        let raw = self.raw(field)?;
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.add(field, message);
                None
            }
        }
    }

    fn choice<T: FromStr>(&mut self, field: &str) -> Option<T> {
        let raw = self.raw(field)?.to_string();
        match raw.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                self.errors.add(field, format!("\"{}\" is not a valid choice.", raw));
                None
            }
        }
    }

    fn flag(&mut self, field: &str) -> Option<bool> {
        let raw = self.raw(field)?;
        let value = parse_flag(raw);
        if value.is_none() {
            self.errors.add(field, "Must be a valid boolean.");
        }
        value
    }
}
