//! Listing repository
//!
//! Structured search filters are pushed into SQL with a `QueryBuilder`;
//! the radius filter is left to [`ListingQuery::apply_radius`] over the
//! rows that come back.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection, PgPool, Postgres, QueryBuilder};
use tracing::{debug, info};
use uuid::Uuid;

use core_kernel::{ListingId, PictureId, UserId};
use domain_listing::{Fees, Listing, ListingPicture, ListingQuery, SortOrder};

use crate::error::{decode, DatabaseError};

pub(crate) const LISTING_COLUMNS: &str = "id, owner_id, price, property_type, payment_type, \
    bedrooms, bathrooms, sqft_area, laundry_type, parking_spaces, heating, ac, extra_amenities, \
    pet_friendly, shareable, fridge, furnished, heat, hydro, water, internet, move_in_date, \
    description, unit_number, street_address, city, postal_code, latitude, longitude, \
    utilities_cost, utilities_payable_by_tenant, property_taxes, property_taxes_payable_by_tenant, \
    condo_fee, condo_fee_payable_by_tenant, hoa_fee, hoa_fee_payable_by_tenant, security_deposit, \
    security_deposit_payable_by_tenant, verification_status, created_at";

/// Repository for listings and their pictures
#[derive(Debug, Clone)]
pub struct ListingRepository {
    pool: PgPool,
}

impl ListingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn get(&self, id: ListingId) -> Result<Listing, DatabaseError> {
        self.find(id)
            .await?
            .ok_or_else(|| DatabaseError::not_found("Listing", id))
    }

    pub async fn find(&self, id: ListingId) -> Result<Option<Listing>, DatabaseError> {
        let sql = format!("SELECT {} FROM listings WHERE id = $1", LISTING_COLUMNS);
        let row = sqlx::query_as::<_, ListingRow>(&sql)
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.map(Listing::try_from).transpose()
    }

    /// Loads a listing only if `owner` owns it
    ///
    /// Someone else's listing is reported as missing, same as an unknown id.
    pub async fn get_owned(&self, id: ListingId, owner: UserId) -> Result<Listing, DatabaseError> {
        match self.find(id).await? {
            Some(listing) if listing.is_owned_by(owner) => Ok(listing),
            _ => Err(DatabaseError::not_found("Listing", id)),
        }
    }

    /// Runs a search
    ///
    /// # Arguments
    ///
    /// * `query` - parsed filters; the radius part is applied after the SQL
    pub async fn search(&self, query: &ListingQuery) -> Result<Vec<Listing>, DatabaseError> {
        let mut builder = search_query(query);
        let rows = builder
            .build_query_as::<ListingRow>()
            .fetch_all(&self.pool)
            .await?;
        let candidates = rows
            .into_iter()
            .map(Listing::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        debug!(candidates = candidates.len(), sort = ?query.sort, "Listing search");
        Ok(query.apply_radius(candidates))
    }

    pub async fn list_all(&self) -> Result<Vec<Listing>, DatabaseError> {
        let sql = format!("SELECT {} FROM listings ORDER BY created_at DESC", LISTING_COLUMNS);
        let rows = sqlx::query_as::<_, ListingRow>(&sql).fetch_all(&self.pool).await?;
        rows.into_iter().map(Listing::try_from).collect()
    }

    /// Inserts a listing together with its pictures in one transaction
    pub async fn insert_with_pictures(
        &self,
        listing: &Listing,
        pictures: &[ListingPicture],
    ) -> Result<(), DatabaseError> {
        let mut tx = self.pool.begin().await?;
        insert_listing(&mut tx, listing, pictures).await?;
        tx.commit().await?;
        info!(listing_id = %listing.id, pictures = pictures.len(), "Created listing");
        Ok(())
    }

    /// Writes an edit: every editable column of `listing` and, when
    /// `pictures` is not empty, the picture swap, in one transaction
    ///
    /// A submitted primary picture replaces the old front image and
    /// submitted extras replace the old extras. Returns the stored paths of
    /// the pictures removed.
    pub async fn update_with_pictures(
        &self,
        listing: &Listing,
        pictures: &[ListingPicture],
    ) -> Result<Vec<String>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        update_listing(&mut tx, listing).await?;
        let removed = if pictures.is_empty() {
            Vec::new()
        } else {
            replace_pictures(&mut tx, listing.id, pictures).await?
        };
        tx.commit().await?;

        debug!(listing_id = %listing.id, removed = removed.len(), added = pictures.len(), "Updated listing");
        Ok(removed)
    }

    /// Deletes a listing and returns the stored image paths it had
    pub async fn delete(&self, id: ListingId) -> Result<Vec<String>, DatabaseError> {
        let mut tx = self.pool.begin().await?;
        let images = sqlx::query_scalar::<_, String>("SELECT image FROM listing_pictures WHERE listing_id = $1")
            .bind(id.as_uuid())
            .fetch_all(&mut *tx)
            .await?;
        let result = sqlx::query("DELETE FROM listings WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&mut *tx)
            .await?;
        if result.rows_affected() == 0 {
            return Err(DatabaseError::not_found("Listing", id));
        }
        tx.commit().await?;
        info!(listing_id = %id, "Deleted listing");
        Ok(images)
    }

    /// Pictures of a listing by position
    pub async fn pictures(&self, listing_id: ListingId) -> Result<Vec<ListingPicture>, DatabaseError> {
        let rows = sqlx::query_as::<_, PictureRow>(
            "SELECT id, listing_id, image, position, is_primary FROM listing_pictures WHERE listing_id = $1 ORDER BY position",
        )
        .bind(listing_id.as_uuid())
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().map(ListingPicture::from).collect())
    }
}

/// Inserts the listing row and its pictures on `conn`
pub(crate) async fn insert_listing(
    conn: &mut PgConnection,
    listing: &Listing,
    pictures: &[ListingPicture],
) -> Result<(), DatabaseError> {
    sqlx::query(
        r#"
        INSERT INTO listings (
            id, owner_id, price, property_type, payment_type, bedrooms, bathrooms, sqft_area,
            laundry_type, parking_spaces, heating, ac, extra_amenities, pet_friendly, shareable,
            fridge, furnished, heat, hydro, water, internet, move_in_date, description,
            unit_number, street_address, city, postal_code, latitude, longitude,
            utilities_cost, utilities_payable_by_tenant, property_taxes,
            property_taxes_payable_by_tenant, condo_fee, condo_fee_payable_by_tenant,
            hoa_fee, hoa_fee_payable_by_tenant, security_deposit,
            security_deposit_payable_by_tenant, verification_status, created_at
        ) VALUES (
            $1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18,
            $19, $20, $21, $22, $23, $24, $25, $26, $27, $28, $29, $30, $31, $32, $33, $34,
            $35, $36, $37, $38, $39, $40, $41
        )
        "#,
    )
    .bind(listing.id.as_uuid())
    .bind(listing.owner_id.as_uuid())
    .bind(listing.price)
    .bind(listing.property_type.code())
    .bind(listing.payment_type.code())
    .bind(listing.bedrooms)
    .bind(listing.bathrooms)
    .bind(listing.sqft_area)
    .bind(listing.laundry_type.code())
    .bind(listing.parking_spaces)
    .bind(listing.heating)
    .bind(listing.ac)
    .bind(&listing.extra_amenities)
    .bind(listing.pet_friendly)
    .bind(listing.shareable)
    .bind(listing.fridge)
    .bind(listing.furnished)
    .bind(listing.heat)
    .bind(listing.hydro)
    .bind(listing.water)
    .bind(listing.internet)
    .bind(listing.move_in_date)
    .bind(&listing.description)
    .bind(&listing.unit_number)
    .bind(&listing.street_address)
    .bind(&listing.city)
    .bind(&listing.postal_code)
    .bind(listing.latitude)
    .bind(listing.longitude)
    .bind(listing.fees.utilities_cost)
    .bind(listing.fees.utilities_payable_by_tenant)
    .bind(listing.fees.property_taxes)
    .bind(listing.fees.property_taxes_payable_by_tenant)
    .bind(listing.fees.condo_fee)
    .bind(listing.fees.condo_fee_payable_by_tenant)
    .bind(listing.fees.hoa_fee)
    .bind(listing.fees.hoa_fee_payable_by_tenant)
    .bind(listing.fees.security_deposit)
    .bind(listing.fees.security_deposit_payable_by_tenant)
    .bind(listing.verification_status.code())
    .bind(listing.created_at)
    .execute(&mut *conn)
    .await?;

    for picture in pictures {
        insert_picture(&mut *conn, picture).await?;
    }
    Ok(())
}

async fn update_listing(conn: &mut PgConnection, listing: &Listing) -> Result<(), DatabaseError> {
    let result = sqlx::query(
        r#"
        UPDATE listings SET
            price = $2, property_type = $3, payment_type = $4, bedrooms = $5, bathrooms = $6,
            sqft_area = $7, laundry_type = $8, parking_spaces = $9, heating = $10, ac = $11,
            extra_amenities = $12, pet_friendly = $13, shareable = $14, fridge = $15,
            furnished = $16, heat = $17, hydro = $18, water = $19, internet = $20,
            move_in_date = $21, description = $22, unit_number = $23, street_address = $24,
            city = $25, postal_code = $26, latitude = $27, longitude = $28,
            utilities_cost = $29, utilities_payable_by_tenant = $30, property_taxes = $31,
            property_taxes_payable_by_tenant = $32, condo_fee = $33,
            condo_fee_payable_by_tenant = $34, hoa_fee = $35, hoa_fee_payable_by_tenant = $36,
            security_deposit = $37, security_deposit_payable_by_tenant = $38
        WHERE id = $1
        "#,
    )
    .bind(listing.id.as_uuid())
    .bind(listing.price)
    .bind(listing.property_type.code())
    .bind(listing.payment_type.code())
    .bind(listing.bedrooms)
    .bind(listing.bathrooms)
    .bind(listing.sqft_area)
    .bind(listing.laundry_type.code())
    .bind(listing.parking_spaces)
    .bind(listing.heating)
    .bind(listing.ac)
    .bind(&listing.extra_amenities)
    .bind(listing.pet_friendly)
    .bind(listing.shareable)
    .bind(listing.fridge)
    .bind(listing.furnished)
    .bind(listing.heat)
    .bind(listing.hydro)
    .bind(listing.water)
    .bind(listing.internet)
    .bind(listing.move_in_date)
    .bind(&listing.description)
    .bind(&listing.unit_number)
    .bind(&listing.street_address)
    .bind(&listing.city)
    .bind(&listing.postal_code)
    .bind(listing.latitude)
    .bind(listing.longitude)
    .bind(listing.fees.utilities_cost)
    .bind(listing.fees.utilities_payable_by_tenant)
    .bind(listing.fees.property_taxes)
    .bind(listing.fees.property_taxes_payable_by_tenant)
    .bind(listing.fees.condo_fee)
    .bind(listing.fees.condo_fee_payable_by_tenant)
    .bind(listing.fees.hoa_fee)
    .bind(listing.fees.hoa_fee_payable_by_tenant)
    .bind(listing.fees.security_deposit)
    .bind(listing.fees.security_deposit_payable_by_tenant)
    .execute(conn)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("Listing", listing.id));
    }
    Ok(())
}

/// Deletes the pictures the submitted ones replace and inserts the new ones
async fn replace_pictures(
    conn: &mut PgConnection,
    listing_id: ListingId,
    pictures: &[ListingPicture],
) -> Result<Vec<String>, DatabaseError> {
    let replace_front = pictures.iter().any(|p| p.is_primary);
    let replace_extras = pictures.iter().any(|p| !p.is_primary);

    let removed = sqlx::query_scalar::<_, String>(
        r#"
        DELETE FROM listing_pictures
        WHERE listing_id = $1 AND ((is_primary AND $2) OR (NOT is_primary AND $3))
        RETURNING image
        "#,
    )
    .bind(listing_id.as_uuid())
    .bind(replace_front)
    .bind(replace_extras)
    .fetch_all(&mut *conn)
    .await?;

    for picture in pictures {
        insert_picture(&mut *conn, picture).await?;
    }
    Ok(removed)
}

async fn insert_picture(conn: &mut PgConnection, picture: &ListingPicture) -> Result<(), DatabaseError> {
    sqlx::query(
        "INSERT INTO listing_pictures (id, listing_id, image, position, is_primary) VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(picture.id.as_uuid())
    .bind(picture.listing_id.as_uuid())
    .bind(&picture.image)
    .bind(picture.position)
    .bind(picture.is_primary)
    .execute(conn)
    .await?;
    Ok(())
}

fn order_clause(sort: SortOrder) -> &'static str {
    match sort {
        SortOrder::PriceAsc => " ORDER BY price ASC, created_at DESC",
        SortOrder::PriceDesc => " ORDER BY price DESC, created_at DESC",
        SortOrder::Newest => " ORDER BY created_at DESC",
        SortOrder::MoveIn => " ORDER BY move_in_date ASC, created_at DESC",
    }
}

/// Escapes `%`, `_` and `\` so user text matches literally inside ILIKE
fn like_pattern(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len() + 2);
    escaped.push('%');
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped.push('%');
    escaped
}

fn search_query(query: &ListingQuery) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {} FROM listings WHERE TRUE", LISTING_COLUMNS));

    if let Some(min) = query.min_price {
        builder.push(" AND price >= ").push_bind(min);
    }
    if let Some(max) = query.max_price {
        builder.push(" AND price <= ").push_bind(max);
    }
    if let Some(bedrooms) = query.bedrooms {
        builder.push(" AND bedrooms >= ").push_bind(bedrooms);
    }
    if let Some(bathrooms) = query.bathrooms {
        builder.push(" AND bathrooms >= ").push_bind(bathrooms);
    }
    if let Some(parking) = query.parking {
        builder.push(" AND parking_spaces >= ").push_bind(parking);
    }
    if let Some(property_type) = query.property_type {
        builder.push(" AND property_type = ").push_bind(property_type.code());
    }
    if let Some(laundry_type) = query.laundry_type {
        builder.push(" AND laundry_type = ").push_bind(laundry_type.code());
    }

    for (column, wanted) in [
        ("pet_friendly", query.pet_friendly),
        ("shareable", query.shareable),
        ("furnished", query.furnished),
        ("heating", query.heating),
        ("ac", query.ac),
    ] {
        if let Some(wanted) = wanted {
            builder.push(format!(" AND {} = ", column)).push_bind(wanted);
        }
    }

    if let Some(location) = &query.location {
        let pattern = like_pattern(location);
        builder
            .push(" AND (city ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR street_address ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR postal_code ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(owner) = query.owner {
        builder.push(" AND owner_id = ").push_bind(Uuid::from(owner));
    }
    if query.radius.is_some() {
        builder.push(" AND latitude IS NOT NULL AND longitude IS NOT NULL");
    }

    builder.push(order_clause(query.sort));
    builder
}

/// Database row for a listing
#[derive(Debug, Clone, FromRow)]
pub struct ListingRow {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub price: Decimal,
    pub property_type: String,
    pub payment_type: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub sqft_area: i32,
    pub laundry_type: String,
    pub parking_spaces: i32,
    pub heating: bool,
    pub ac: bool,
    pub extra_amenities: Option<String>,
    pub pet_friendly: bool,
    pub shareable: bool,
    pub fridge: bool,
    pub furnished: bool,
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
    pub verification_status: String,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<ListingRow> for Listing {
    type Error = DatabaseError;

    fn try_from(row: ListingRow) -> Result<Self, Self::Error> {
        Ok(Listing {
            id: ListingId::from_uuid(row.id),
            owner_id: UserId::from_uuid(row.owner_id),
            price: row.price,
            property_type: decode(&row.property_type)?,
            payment_type: decode(&row.payment_type)?,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            sqft_area: row.sqft_area,
            laundry_type: decode(&row.laundry_type)?,
            parking_spaces: row.parking_spaces,
            heating: row.heating,
            ac: row.ac,
            extra_amenities: row.extra_amenities,
            pet_friendly: row.pet_friendly,
            shareable: row.shareable,
            fridge: row.fridge,
            furnished: row.furnished,
            heat: row.heat,
            hydro: row.hydro,
            water: row.water,
            internet: row.internet,
            move_in_date: row.move_in_date,
            description: row.description,
            unit_number: row.unit_number,
            street_address: row.street_address,
            city: row.city,
            postal_code: row.postal_code,
            latitude: row.latitude,
            longitude: row.longitude,
            fees: Fees {
                utilities_cost: row.utilities_cost,
                utilities_payable_by_tenant: row.utilities_payable_by_tenant,
                property_taxes: row.property_taxes,
                property_taxes_payable_by_tenant: row.property_taxes_payable_by_tenant,
                condo_fee: row.condo_fee,
                condo_fee_payable_by_tenant: row.condo_fee_payable_by_tenant,
                hoa_fee: row.hoa_fee,
                hoa_fee_payable_by_tenant: row.hoa_fee_payable_by_tenant,
                security_deposit: row.security_deposit,
                security_deposit_payable_by_tenant: row.security_deposit_payable_by_tenant,
            },
            verification_status: decode(&row.verification_status)?,
            created_at: row.created_at,
        })
    }
}

/// Database row for a listing picture
#[derive(Debug, Clone, FromRow)]
pub struct PictureRow {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub image: String,
    pub position: i32,
    pub is_primary: bool,
}

impl From<PictureRow> for ListingPicture {
    fn from(row: PictureRow) -> Self {
        ListingPicture {
            id: PictureId::from_uuid(row.id),
            listing_id: ListingId::from_uuid(row.listing_id),
            image: row.image,
            position: row.position,
            is_primary: row.is_primary,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn query(pairs: &[(&str, &str)]) -> ListingQuery {
        let params: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        ListingQuery::from_query(&params)
    }

    #[test]
    fn test_empty_query_sql() {
        let sql = search_query(&ListingQuery::default()).into_sql();
        assert!(sql.ends_with("WHERE TRUE ORDER BY created_at DESC"));
    }

    #[test]
    fn test_filters_become_bound_parameters() {
        let sql = search_query(&query(&[
            ("min_price", "900"),
            ("bedrooms", "2"),
            ("pet_friendly", "true"),
            ("location", "waterloo"),
            ("sort", "price_asc"),
        ]))
        .into_sql();

        assert!(sql.contains("price >= $1"));
        assert!(sql.contains("bedrooms >= $2"));
        assert!(sql.contains("pet_friendly = $3"));
        assert!(sql.contains("city ILIKE $4 OR street_address ILIKE $5 OR postal_code ILIKE $6"));
        assert!(sql.ends_with("ORDER BY price ASC, created_at DESC"));
        assert!(!sql.contains("waterloo"));
    }

    #[test]
    fn test_radius_requires_coordinates() {
        let sql = search_query(&query(&[("lat", "43.4"), ("lng", "-80.5"), ("radius", "5")])).into_sql();
        assert!(sql.contains("latitude IS NOT NULL AND longitude IS NOT NULL"));
    }

    #[test]
    fn test_like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("N2L"), "%N2L%");
        assert_eq!(like_pattern("100%_"), "%100\\%\\_%");
    }
}
