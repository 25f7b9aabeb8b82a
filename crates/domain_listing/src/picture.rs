//! Listing pictures
//!
//! A new listing needs exactly one front image, which becomes the single
//! primary picture, and between `MIN_EXTRA_PICTURES` and
//! `MAX_EXTRA_PICTURES` additional images. Errors are keyed by the form
//! field names `front_image` and `images`.

use serde::{Deserialize, Serialize};

use core_kernel::{FieldErrors, ListingId, PictureId};

pub const MIN_EXTRA_PICTURES: usize = 3;
pub const MAX_EXTRA_PICTURES: usize = 10;

pub const FRONT_IMAGE_FIELD: &str = "front_image";
pub const IMAGES_FIELD: &str = "images";

const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A stored picture of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingPicture {
    pub id: PictureId,
    pub listing_id: ListingId,
    /// Path relative to the media root
    pub image: String,
    pub position: i32,
    pub is_primary: bool,
}

/// An uploaded file before it is written to storage
#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedImage {
    /// Lowercased extension of the original file name
    pub fn extension(&self) -> Option<String> {
        self.file_name
            .rsplit_once('.')
            .map(|(_, ext)| ext.to_ascii_lowercase())
            .filter(|ext| ALLOWED_EXTENSIONS.contains(&ext.as_str()))
    }

    fn is_image(&self) -> bool {
        let content_type_ok = self
            .content_type
            .as_deref()
            .map_or(true, |ct| ct.starts_with("image/"));
        content_type_ok && self.extension().is_some() && !self.data.is_empty()
    }

    /// Storage path for this upload under the listing's folder
    pub fn storage_path(&self, listing_id: ListingId, picture_id: PictureId) -> String {
        let ext = self.extension().unwrap_or_else(|| "jpg".to_string());
        format!("listing_pictures/{}/{}.{}", listing_id.as_uuid(), picture_id.as_uuid(), ext)
    }
}

/// Pictures submitted with a listing form
#[derive(Debug, Clone, Default)]
pub struct PictureSet {
    pub front: Vec<UploadedImage>,
    pub extras: Vec<UploadedImage>,
}

impl PictureSet {
    pub fn is_empty(&self) -> bool {
        self.front.is_empty() && self.extras.is_empty()
    }

    fn check_front(&self, errors: &mut FieldErrors) {
        match self.front.len() {
            0 => errors.add(FRONT_IMAGE_FIELD, "A front image is required."),
            1 => {}
            _ => errors.add(FRONT_IMAGE_FIELD, "Only one front image may be uploaded."),
        }
    }

    fn check_extras(&self, errors: &mut FieldErrors) {
        let count = self.extras.len();
        if count < MIN_EXTRA_PICTURES {
            errors.add(
                IMAGES_FIELD,
                format!("At least {} additional pictures are required.", MIN_EXTRA_PICTURES),
            );
        } else if count > MAX_EXTRA_PICTURES {
            errors.add(
                IMAGES_FIELD,
                format!("No more than {} additional pictures may be uploaded.", MAX_EXTRA_PICTURES),
            );
        }
    }

    fn check_types(&self, errors: &mut FieldErrors) {
        if self.front.iter().any(|img| !img.is_image()) {
            errors.add(FRONT_IMAGE_FIELD, "Upload a valid image.");
        }
        if self.extras.iter().any(|img| !img.is_image()) {
            errors.add(IMAGES_FIELD, "Upload a valid image.");
        }
    }

    /// Rules for a newly posted listing
    pub fn validate_for_create(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        self.check_front(&mut errors);
        self.check_extras(&mut errors);
        self.check_types(&mut errors);
        errors.into_result()
    }

    /// Rules for an edit: each part is optional, but when given it replaces
    /// the existing pictures and must satisfy the same bounds
    pub fn validate_for_update(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if !self.front.is_empty() {
            self.check_front(&mut errors);
        }
        if !self.extras.is_empty() {
            self.check_extras(&mut errors);
        }
        self.check_types(&mut errors);
        errors.into_result()
    }

    /// Assigns ids, storage paths and positions
    ///
    /// The front image is position 0 and primary; extras follow in upload
    /// order starting at 1. Returns each picture paired with the upload it was made from.
    pub fn layout(self, listing_id: ListingId) -> Vec<(ListingPicture, UploadedImage)> {
        let offset = usize::from(self.front.is_empty());
        let front = self.front.into_iter().map(|img| (img, true));
        let extras = self.extras.into_iter().map(|img| (img, false));

        front
            .chain(extras)
            .enumerate()
            .map(|(position, (upload, is_primary))| {
                let id = PictureId::new_v7();
                let picture = ListingPicture {
                    id,
                    listing_id,
                    image: upload.storage_path(listing_id, id),
                    position: (position + offset) as i32,
                    is_primary,
                };
                (picture, upload)
            })
            .collect()
    }
}
