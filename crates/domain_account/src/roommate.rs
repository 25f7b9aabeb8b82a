//! Roommate profiles and the roommate directory filter

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use core_kernel::{define_code_enum, parse_flag, FieldErrors, RoommateId, UserId};

use crate::user::Sex;
use crate::validation::check_non_negative;

define_code_enum!(
    /// Occupation of a roommate
    Occupation {
        Student => "S",
        Employed => "E",
        NotEmployed => "N",
    }
);

/// A user's roommate-search profile (one per user)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoommateProfile {
    pub id: RoommateId,
    pub user_id: UserId,
    pub description: String,
    pub move_in_date: Option<NaiveDate>,
    /// Intended stay in months
    pub stay_length: Option<i32>,
    pub occupation: Option<Occupation>,
    pub roommate_budget: Option<Decimal>,
    pub smoke_friendly: bool,
    pub cannabis_friendly: bool,
    pub pet_friendly: bool,
    pub couple_friendly: bool,
    pub gender_preference: Option<Sex>,
    pub open_to_message: bool,
    pub created_at: DateTime<Utc>,
}

fn check_stay_length(errors: &mut FieldErrors, stay_length: Option<i32>) {
    if let Some(months) = stay_length {
        errors.check(
            months >= 1,
            "stay_length",
            "Ensure this value is greater than or equal to 1.",
        );
    }
}

/// Payload for publishing a roommate profile
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoommateDraft {
    pub description: Option<String>,
    pub move_in_date: Option<NaiveDate>,
    pub stay_length: Option<i32>,
    pub occupation: Option<Occupation>,
    pub roommate_budget: Option<Decimal>,
    #[serde(default)]
    pub smoke_friendly: bool,
    #[serde(default)]
    pub cannabis_friendly: bool,
    #[serde(default)]
    pub pet_friendly: bool,
    #[serde(default)]
    pub couple_friendly: bool,
    pub gender_preference: Option<Sex>,
    pub open_to_message: Option<bool>,
}

impl RoommateDraft {
    pub fn validate(self, user_id: UserId) -> Result<RoommateProfile, FieldErrors> {
        let mut errors = FieldErrors::new();

        let description = self.description.unwrap_or_default().trim().to_string();
        if description.is_empty() {
            errors.required("description");
        }
        check_stay_length(&mut errors, self.stay_length);
        check_non_negative(&mut errors, "roommate_budget", self.roommate_budget);

        errors.into_result()?;

        Ok(RoommateProfile {
            id: RoommateId::new_v7(),
            user_id,
            description,
            move_in_date: self.move_in_date,
            stay_length: self.stay_length,
            occupation: self.occupation,
            roommate_budget: self.roommate_budget,
            smoke_friendly: self.smoke_friendly,
            cannabis_friendly: self.cannabis_friendly,
            pet_friendly: self.pet_friendly,
            couple_friendly: self.couple_friendly,
            gender_preference: self.gender_preference,
            open_to_message: self.open_to_message.unwrap_or(true),
            created_at: Utc::now(),
        })
    }
}

/// Partial roommate profile edit
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoommatePatch {
    pub description: Option<String>,
    pub move_in_date: Option<NaiveDate>,
    pub stay_length: Option<i32>,
    pub occupation: Option<Occupation>,
    pub roommate_budget: Option<Decimal>,
    pub smoke_friendly: Option<bool>,
    pub cannabis_friendly: Option<bool>,
    pub pet_friendly: Option<bool>,
    pub couple_friendly: Option<bool>,
    pub gender_preference: Option<Sex>,
    pub open_to_message: Option<bool>,
}

impl RoommatePatch {
    pub fn apply(self, profile: &mut RoommateProfile) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();

        if let Some(description) = self.description.as_deref() {
            if description.trim().is_empty() {
                errors.add("description", "This field may not be blank.");
            }
        }
        check_stay_length(&mut errors, self.stay_length);
        check_non_negative(&mut errors, "roommate_budget", self.roommate_budget);

        errors.into_result()?;

        if let Some(v) = self.description {
            profile.description = v.trim().to_string();
        }
        if self.move_in_date.is_some() {
            profile.move_in_date = self.move_in_date;
        }
        if self.stay_length.is_some() {
            profile.stay_length = self.stay_length;
        }
        if self.occupation.is_some() {
            profile.occupation = self.occupation;
        }
        if self.roommate_budget.is_some() {
            profile.roommate_budget = self.roommate_budget;
        }
        if let Some(v) = self.smoke_friendly {
            profile.smoke_friendly = v;
        }
        if let Some(v) = self.cannabis_friendly {
            profile.cannabis_friendly = v;
        }
        if let Some(v) = self.pet_friendly {
            profile.pet_friendly = v;
        }
        if let Some(v) = self.couple_friendly {
            profile.couple_friendly = v;
        }
        if self.gender_preference.is_some() {
            profile.gender_preference = self.gender_preference;
        }
        if let Some(v) = self.open_to_message {
            profile.open_to_message = v;
        }
        Ok(())
    }
}

/// Filters for the public roommate directory
///
/// Built from raw query parameters. Values that do not parse are dropped
/// instead of failing the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RoommateFilter {
    pub smoke_friendly: Option<bool>,
    pub cannabis_friendly: Option<bool>,
    pub pet_friendly: Option<bool>,
    pub couple_friendly: Option<bool>,
    pub open_to_message: Option<bool>,
    pub gender_preference: Option<Sex>,
    pub occupation: Option<Occupation>,
    pub max_budget: Option<Decimal>,
}

impl RoommateFilter {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let flag = |key: &str| params.get(key).and_then(|v| parse_flag(v));

        Self {
            smoke_friendly: flag("smoke_friendly"),
            cannabis_friendly: flag("cannabis_friendly"),
            pet_friendly: flag("pet_friendly"),
            couple_friendly: flag("couple_friendly"),
            open_to_message: flag("open_to_message"),
            gender_preference: params.get("gender_preference").and_then(|v| v.parse().ok()),
            occupation: params.get("occupation").and_then(|v| v.parse().ok()),
            max_budget: params.get("max_budget").and_then(|v| v.trim().parse().ok()),
        }
    }

    pub fn matches(&self, profile: &RoommateProfile) -> bool {
        fn eq<T: PartialEq>(wanted: &Option<T>, actual: &T) -> bool {
            wanted.as_ref().map_or(true, |w| w == actual)
        }

        eq(&self.smoke_friendly, &profile.smoke_friendly)
            && eq(&self.cannabis_friendly, &profile.cannabis_friendly)
            && eq(&self.pet_friendly, &profile.pet_friendly)
            && eq(&self.couple_friendly, &profile.couple_friendly)
            && eq(&self.open_to_message, &profile.open_to_message)
            && self
                .gender_preference
                .map_or(true, |g| profile.gender_preference == Some(g))
            && self.occupation.map_or(true, |o| profile.occupation == Some(o))
            && self.max_budget.map_or(true, |max| {
                profile.roommate_budget.map_or(false, |budget| budget <= max)
            })
    }
}
