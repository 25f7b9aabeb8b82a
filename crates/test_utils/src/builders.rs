//! Test Data Builders
//!
//! Builders for the marketplace aggregates. Tests set the fields they care
//! about and take defaults for everything else. The built values skip
//! domain validation so tests can also reach states the API would refuse.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;

use core_kernel::{GeoPoint, GroupId, ListingId, ReviewId, RoommateId, UserId, VerificationStatus};
use domain_account::{Occupation, RoommateProfile, Sex, User};
use domain_group::{Group, GroupMember, GroupStatus};
use domain_listing::{
    Fees, LaundryType, Listing, ListingDraft, PaymentType, PropertyType, UploadedImage,
};
use domain_review::{Review, RevieweeRole};

use crate::fixtures::{AmountFixtures, DateFixtures, PlaceFixtures, StringFixtures};

/// Builder for [`User`]
pub struct UserBuilder {
    user: User,
}

impl Default for UserBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl UserBuilder {
    pub fn new() -> Self {
        let id = UserId::new_v7();
        Self {
            user: User {
                id,
                email: format!("{}@example.com", id.as_uuid().simple()),
                password_hash: String::new(),
                first_name: "Alex".to_string(),
                last_name: "Martin".to_string(),
                age: Some(24),
                sex: Some(Sex::Other),
                city: Some("Waterloo".to_string()),
                preferred_location: Some("Waterloo".to_string()),
                id_verification_status: VerificationStatus::Unverified,
                budget_min: Some(AmountFixtures::budget_min()),
                budget_max: Some(AmountFixtures::budget_max()),
                yearly_income: None,
                profile_picture: None,
                phone_number: Some(StringFixtures::PHONE.to_string()),
                phone_verified: false,
                email_verified: true,
                terms_accepted: true,
                receive_email_notifications: true,
                receive_sms_notifications: false,
                facebook_link: None,
                instagram_link: None,
                last_login: None,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.user.email = email.into();
        self
    }

    pub fn with_password_hash(mut self, hash: impl Into<String>) -> Self {
        self.user.password_hash = hash.into();
        self
    }

    pub fn with_budget(mut self, min: Option<Decimal>, max: Option<Decimal>) -> Self {
        self.user.budget_min = min;
        self.user.budget_max = max;
        self
    }

    pub fn with_preferred_location(mut self, location: Option<&str>) -> Self {
        self.user.preferred_location = location.map(str::to_string);
        self
    }

    pub fn unverified_email(mut self) -> Self {
        self.user.email_verified = false;
        self
    }

    pub fn build(self) -> User {
        self.user
    }
}

/// Builder for [`RoommateProfile`]
pub struct RoommateBuilder {
    profile: RoommateProfile,
}

impl RoommateBuilder {
    pub fn for_user(user_id: UserId) -> Self {
        Self {
            profile: RoommateProfile {
                id: RoommateId::new_v7(),
                user_id,
                description: "Quiet grad student, early riser.".to_string(),
                move_in_date: Some(DateFixtures::move_in()),
                stay_length: Some(12),
                occupation: Some(Occupation::Student),
                roommate_budget: Some(AmountFixtures::budget_max()),
                smoke_friendly: false,
                cannabis_friendly: false,
                pet_friendly: true,
                couple_friendly: false,
                gender_preference: None,
                open_to_message: true,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_occupation(mut self, occupation: Occupation) -> Self {
        self.profile.occupation = Some(occupation);
        self
    }

    pub fn with_budget(mut self, budget: Decimal) -> Self {
        self.profile.roommate_budget = Some(budget);
        self
    }

    pub fn with_gender_preference(mut self, sex: Sex) -> Self {
        self.profile.gender_preference = Some(sex);
        self
    }

    pub fn pet_friendly(mut self, value: bool) -> Self {
        self.profile.pet_friendly = value;
        self
    }

    pub fn build(self) -> RoommateProfile {
        self.profile
    }
}

/// Builder for [`Listing`]
pub struct ListingBuilder {
    listing: Listing,
}

impl ListingBuilder {
    pub fn owned_by(owner_id: UserId) -> Self {
        let at = PlaceFixtures::waterloo();
        Self {
            listing: Listing {
                id: ListingId::new_v7(),
                owner_id,
                price: AmountFixtures::rent(),
                property_type: PropertyType::Apartment,
                payment_type: PaymentType::DirectDeposit,
                bedrooms: 2,
                bathrooms: 1,
                sqft_area: 850,
                laundry_type: LaundryType::InUnit,
                parking_spaces: 1,
                heating: true,
                ac: true,
                extra_amenities: None,
                pet_friendly: false,
                shareable: true,
                fridge: true,
                furnished: false,
                heat: true,
                hydro: false,
                water: true,
                internet: false,
                move_in_date: DateFixtures::move_in(),
                description: "Bright two bedroom near campus.".to_string(),
                unit_number: Some("1204".to_string()),
                street_address: StringFixtures::street_address().to_string(),
                city: "Waterloo".to_string(),
                postal_code: StringFixtures::postal_code().to_string(),
                latitude: Some(at.lat),
                longitude: Some(at.lng),
                fees: Fees {
                    utilities_cost: Some(AmountFixtures::utilities()),
                    utilities_payable_by_tenant: true,
                    ..Fees::default()
                },
                verification_status: VerificationStatus::Unverified,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_price(mut self, price: Decimal) -> Self {
        self.listing.price = price;
        self
    }

    pub fn with_bedrooms(mut self, bedrooms: i32) -> Self {
        self.listing.bedrooms = bedrooms;
        self
    }

    pub fn with_property_type(mut self, property_type: PropertyType) -> Self {
        self.listing.property_type = property_type;
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.listing.city = city.into();
        self
    }

    pub fn at(mut self, point: Option<GeoPoint>) -> Self {
        self.listing.latitude = point.map(|p| p.lat);
        self.listing.longitude = point.map(|p| p.lng);
        self
    }

    pub fn with_move_in(mut self, date: NaiveDate) -> Self {
        self.listing.move_in_date = date;
        self
    }

    pub fn pet_friendly(mut self, value: bool) -> Self {
        self.listing.pet_friendly = value;
        self
    }

    pub fn build(self) -> Listing {
        self.listing
    }
}

/// A draft that passes listing validation against [`DateFixtures::today`]
pub fn valid_listing_draft() -> ListingDraft {
    ListingDraft {
        price: Some(AmountFixtures::rent()),
        property_type: Some(PropertyType::Apartment),
        payment_type: Some(PaymentType::Interac),
        bedrooms: Some(2),
        bathrooms: Some(1),
        sqft_area: Some(850),
        move_in_date: Some(DateFixtures::move_in()),
        street_address: Some(StringFixtures::street_address().to_string()),
        city: Some("Waterloo".to_string()),
        postal_code: Some(StringFixtures::postal_code().to_string()),
        ..ListingDraft::default()
    }
}

/// An in-memory upload with a valid image extension
pub fn uploaded_image(name: &str) -> UploadedImage {
    UploadedImage {
        file_name: name.to_string(),
        content_type: Some("image/jpeg".to_string()),
        data: vec![0xFF, 0xD8, 0xFF, 0xE0],
    }
}

/// Builder for [`Group`]
pub struct GroupBuilder {
    group: Group,
}

impl GroupBuilder {
    pub fn on_listing(listing_id: ListingId, owner_id: RoommateId) -> Self {
        let now = Utc::now();
        Self {
            group: Group {
                id: GroupId::new_v7(),
                name: "Spring sublet crew".to_string(),
                listing_id,
                owner_id,
                members: vec![GroupMember { roommate_id: owner_id, joined_at: now }],
                description: None,
                move_in_date: DateFixtures::move_in(),
                move_in_ready: false,
                group_status: GroupStatus::Open,
                created_at: now,
            },
        }
    }

    /// Adds members in order, each joining after the previous one
    pub fn with_members(mut self, members: &[RoommateId]) -> Self {
        for (offset, roommate_id) in members.iter().enumerate() {
            let joined_at = self.group.created_at + chrono::Duration::seconds(offset as i64 + 1);
            self.group.members.push(GroupMember { roommate_id: *roommate_id, joined_at });
        }
        self
    }

    pub fn with_status(mut self, status: GroupStatus) -> Self {
        self.group.group_status = status;
        self
    }

    pub fn build(self) -> Group {
        self.group
    }
}

/// Builder for [`Review`]
pub struct ReviewBuilder {
    review: Review,
}

impl ReviewBuilder {
    pub fn between(reviewer_id: UserId, reviewee_id: UserId) -> Self {
        Self {
            review: Review {
                id: ReviewId::new_v7(),
                reviewer_id,
                reviewee_id,
                rating: 4,
                comment: Some("Paid rent on time.".to_string()),
                reviewee_role: RevieweeRole::Tenant,
                created_at: Utc::now(),
            },
        }
    }

    pub fn with_rating(mut self, rating: i32) -> Self {
        self.review.rating = rating;
        self
    }

    pub fn with_role(mut self, role: RevieweeRole) -> Self {
        self.review.reviewee_role = role;
        self
    }

    pub fn build(self) -> Review {
        self.review
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_built_users_have_distinct_emails() {
        let a = UserBuilder::new().build();
        let b = UserBuilder::new().build();
        assert_ne!(a.email, b.email);
    }

    #[test]
    fn test_valid_draft_validates() {
        let owner = UserId::new_v7();
        let listing = valid_listing_draft()
            .validate(owner, DateFixtures::today())
            .unwrap();
        assert_eq!(listing.owner_id, owner);
    }

    #[test]
    fn test_group_members_keep_join_order() {
        let owner = RoommateId::new_v7();
        let (a, b) = (RoommateId::new_v7(), RoommateId::new_v7());
        let group = GroupBuilder::on_listing(ListingId::new_v7(), owner)
            .with_members(&[a, b])
            .build();
        assert_eq!(group.member_ids(), vec![owner, a, b]);
    }
}
