//! Request extractors that reject with [`ApiError`]

use std::collections::HashMap;

use axum::{
    async_trait,
    extract::{FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
};

use domain_listing::picture::{FRONT_IMAGE_FIELD, IMAGES_FIELD};
use domain_listing::{ListingDraft, PictureSet, UploadedImage};

use crate::error::ApiError;

/// `Json` whose rejections use the API error body
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct AppJson<T>(pub T);

/// Listing fields and pictures, sent either as multipart or as JSON
///
/// JSON bodies never carry pictures.
#[derive(Debug, Default)]
pub struct ListingForm {
    pub draft: ListingDraft,
    pub pictures: PictureSet,
}

fn is_multipart(req: &Request) -> bool {
    req.headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"))
}

#[async_trait]
impl<S> FromRequest<S> for ListingForm
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_multipart(&req) {
            let AppJson(draft) = AppJson::<ListingDraft>::from_request(req, state).await?;
            return Ok(Self { draft, pictures: PictureSet::default() });
        }

        let mut multipart = Multipart::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        let mut fields = HashMap::new();
        let mut pictures = PictureSet::default();
        while let Some(field) = multipart.next_field().await? {
            let name = field.name().unwrap_or_default().to_string();
            if name == FRONT_IMAGE_FIELD || name == IMAGES_FIELD {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let content_type = field.content_type().map(str::to_string);
                let data = field.bytes().await?.to_vec();
                let image = UploadedImage { file_name, content_type, data };
                if name == FRONT_IMAGE_FIELD {
                    pictures.front.push(image);
                } else {
                    pictures.extras.push(image);
                }
            } else {
                fields.insert(name, field.text().await?);
            }
        }

        let draft = ListingDraft::from_form(&fields)?;
        Ok(Self { draft, pictures })
    }
}
