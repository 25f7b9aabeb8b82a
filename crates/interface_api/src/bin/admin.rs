//! Nestmate - Admin CLI
//!
//! # Usage
//!
//! ```bash
//! # Fill a development database with generated data
//! cargo run --bin nestmate-admin -- seed --users 40 --listings 25
//!
//! # Dump training examples for the recommendation model
//! cargo run --bin nestmate-admin -- export-training --output training.jsonl
//!
//! # Drop revoked tokens that have expired anyway
//! cargo run --bin nestmate-admin -- purge-tokens
//! ```
//!
//! The database URL is read from `--database-url`, `API_DATABASE_URL` or
//! `DATABASE_URL`, in that order.

use std::collections::{HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use anyhow::{anyhow, bail, Context, Result};
use chrono::{Duration, Utc};
use clap::{Parser, Subcommand};
use fake::faker::address::en::{BuildingNumber, CityName, StreetName, ZipCode};
use fake::faker::internet::en::SafeEmail;
use fake::faker::lorem::en::{Paragraph, Sentence};
use fake::faker::name::en::{FirstName, LastName};
use fake::Fake;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use core_kernel::{UserId, VerificationStatus};
use domain_account::password::hash_password;
use domain_account::{Occupation, RoommateDraft, RoommateProfile, Sex, User};
use domain_group::{Group, GroupDraft, GroupStatus};
use domain_listing::{
    InteractionKind, LaundryType, Listing, ListingDraft, ListingInteraction, PaymentType,
    PropertyType,
};
use domain_recommend::build_training_set;
use domain_review::{Review, ReviewDraft, RevieweeRole};
use infra_db::repositories::{InteractionRepository, ListingRepository, TokenRepository, UserRepository};
use infra_db::{create_pool, insert_batch, DatabaseConfig, DatabasePool, SeedBatch};

const SEED_CITIES: &[&str] = &["Toronto", "Ottawa", "Montreal", "Vancouver", "Calgary"];

#[derive(Parser)]
#[command(name = "nestmate-admin")]
#[command(about = "Maintenance tasks for the Nestmate database")]
struct Cli {
    #[arg(long, global = true)]
    database_url: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert generated users, listings, groups, reviews and interactions
    Seed {
        #[arg(long, default_value_t = 30)]
        users: usize,
        #[arg(long, default_value_t = 20)]
        listings: usize,
        #[arg(long, default_value_t = 8)]
        groups: usize,
        #[arg(long, default_value_t = 40)]
        reviews: usize,
        #[arg(long, default_value_t = 200)]
        interactions: usize,
        /// Password shared by every generated account
        #[arg(long, default_value = "nestmate-seed")]
        password: String,
        /// Fixed RNG seed for reproducible data
        #[arg(long)]
        rng_seed: Option<u64>,
    },
    /// Write recommendation training examples as JSON lines
    ExportTraining {
        /// Output file; stdout when omitted
        #[arg(long, short)]
        output: Option<PathBuf>,
    },
    /// Delete revoked-token entries past their expiry
    PurgeTokens,
}

/// How much to generate
#[derive(Debug, Clone, Copy)]
struct SeedCounts {
    users: usize,
    listings: usize,
    groups: usize,
    reviews: usize,
    interactions: usize,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let url = database_url(cli.database_url)?;
    let pool = create_pool(DatabaseConfig::new(url).max_connections(2).min_connections(1))
        .await
        .context("connecting to the database")?;

    match cli.command {
        Commands::Seed { users, listings, groups, reviews, interactions, password, rng_seed } => {
            let counts = SeedCounts { users, listings, groups, reviews, interactions };
            seed(&pool, counts, &password, rng_seed).await
        }
        Commands::ExportTraining { output } => export_training(&pool, output).await,
        Commands::PurgeTokens => {
            let purged = TokenRepository::new(pool).purge_expired(Utc::now()).await?;
            tracing::info!(purged, "Purged expired revoked tokens");
            Ok(())
        }
    }
}

fn database_url(flag: Option<String>) -> Result<String> {
    flag.or_else(|| std::env::var("API_DATABASE_URL").ok())
        .or_else(|| std::env::var("DATABASE_URL").ok())
        .ok_or_else(|| anyhow!("no database URL; pass --database-url or set DATABASE_URL"))
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();
}

async fn seed(pool: &DatabasePool, counts: SeedCounts, password: &str, rng_seed: Option<u64>) -> Result<()> {
    if counts.users < 2 {
        bail!("seeding needs at least two users");
    }
    let mut rng = match rng_seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let password_hash = hash_password(password)?;

    let batch = generate_batch(&mut rng, counts, &password_hash)?;
    tracing::info!(rows = batch.total(), "Generated seed data");
    insert_batch(pool, &batch).await?;
    Ok(())
}

fn generate_batch(rng: &mut StdRng, counts: SeedCounts, password_hash: &str) -> Result<SeedBatch> {
    let mut batch = SeedBatch::default();
    let today = Utc::now().date_naive();

    for n in 0..counts.users {
        batch.users.push(fake_user(rng, n, password_hash));
    }

    // Roughly two thirds of the users look for roommates
    for user in &batch.users {
        if rng.gen_bool(0.66) {
            batch.roommates.push(fake_roommate(rng, user)?);
        }
    }

    // A third of the users act as landlords
    let landlords: Vec<UserId> = batch.users.iter().step_by(3).map(|u| u.id).collect();
    for _ in 0..counts.listings {
        let owner = *landlords.choose(rng).ok_or_else(|| anyhow!("no landlords to own listings"))?;
        batch.listings.push((fake_listing(rng, owner, today)?, Vec::new()));
    }

    for _ in 0..counts.groups {
        let Some((listing, _)) = batch.listings.choose(rng) else { break };
        let tenants: Vec<&RoommateProfile> = batch
            .roommates
            .iter()
            .filter(|r| r.user_id != listing.owner_id)
            .collect();
        if let Some(group) = fake_group(rng, listing, &tenants)? {
            batch.groups.push(group);
        }
    }

    let mut reviewed = HashSet::new();
    for _ in 0..counts.reviews {
        let pair: Vec<&User> = batch.users.choose_multiple(rng, 2).collect();
        let &[reviewer, reviewee] = pair.as_slice() else { break };
        if !reviewed.insert((reviewer.id, reviewee.id)) {
            continue;
        }
        batch.reviews.push(fake_review(rng, reviewer.id, reviewee.id)?);
    }

    for _ in 0..counts.interactions {
        let (Some(user), Some((listing, _))) = (batch.users.choose(rng), batch.listings.choose(rng)) else {
            break;
        };
        if listing.is_owned_by(user.id) {
            continue;
        }
        let kind = if rng.gen_bool(0.25) { InteractionKind::Favourite } else { InteractionKind::Click };
        batch.interactions.push(ListingInteraction::record(user.id, listing.id, kind));
    }

    Ok(batch)
}

fn fake_user(rng: &mut StdRng, n: usize, password_hash: &str) -> User {
    let first_name: String = FirstName().fake_with_rng(rng);
    let last_name: String = LastName().fake_with_rng(rng);
    // Suffix keeps emails unique across a batch
    let local: String = SafeEmail().fake_with_rng(rng);
    let email = format!("{}+{}", n, local).to_lowercase();
    let budget_min = Decimal::from(rng.gen_range(5..=15) * 100);
    let budget_max = budget_min + Decimal::from(rng.gen_range(5..=25) * 100);
    let city = SEED_CITIES.choose(rng).map(|c| c.to_string());

    User {
        id: UserId::new_v7(),
        email,
        password_hash: password_hash.to_string(),
        first_name,
        last_name,
        age: Some(rng.gen_range(18..=65)),
        sex: Sex::ALL.choose(rng).copied(),
        preferred_location: city.clone(),
        city,
        id_verification_status: VerificationStatus::ALL
            .choose(rng)
            .copied()
            .unwrap_or_default(),
        budget_min: Some(budget_min),
        budget_max: Some(budget_max),
        yearly_income: Some(Decimal::from(rng.gen_range(20..=150) * 1000)),
        profile_picture: None,
        phone_number: Some(format!("+1416555{:04}", rng.gen_range(0..10_000))),
        phone_verified: rng.gen_bool(0.5),
        email_verified: true,
        terms_accepted: true,
        receive_email_notifications: rng.gen_bool(0.7),
        receive_sms_notifications: rng.gen_bool(0.3),
        facebook_link: None,
        instagram_link: None,
        last_login: None,
        created_at: Utc::now(),
    }
}

fn fake_roommate(rng: &mut StdRng, user: &User) -> Result<RoommateProfile> {
    let draft = RoommateDraft {
        description: Some(Paragraph(1..3).fake_with_rng(rng)),
        move_in_date: Some(Utc::now().date_naive() + Duration::days(rng.gen_range(7..90))),
        stay_length: Some(rng.gen_range(3..=24)),
        occupation: Occupation::ALL.choose(rng).copied(),
        roommate_budget: user.budget_max,
        smoke_friendly: rng.gen_bool(0.2),
        cannabis_friendly: rng.gen_bool(0.2),
        pet_friendly: rng.gen_bool(0.5),
        couple_friendly: rng.gen_bool(0.3),
        gender_preference: None,
        open_to_message: Some(true),
    };
    draft
        .validate(user.id)
        .map_err(|e| anyhow!("generated roommate profile rejected: {}", e))
}

fn fake_listing(rng: &mut StdRng, owner: UserId, today: chrono::NaiveDate) -> Result<Listing> {
    let city: String = match SEED_CITIES.choose(rng) {
        Some(city) => city.to_string(),
        None => CityName().fake_with_rng(rng),
    };
    let building: String = BuildingNumber().fake_with_rng(rng);
    let street: String = StreetName().fake_with_rng(rng);

    let draft = ListingDraft {
        price: Some(Decimal::from(rng.gen_range(6..=40) * 100)),
        property_type: PropertyType::ALL.choose(rng).copied(),
        payment_type: PaymentType::ALL.choose(rng).copied(),
        bedrooms: Some(rng.gen_range(1..=5)),
        bathrooms: Some(rng.gen_range(1..=3)),
        sqft_area: Some(rng.gen_range(400..=2500)),
        laundry_type: LaundryType::ALL.choose(rng).copied(),
        parking_spaces: Some(rng.gen_range(0..=2)),
        heating: Some(true),
        ac: Some(rng.gen_bool(0.6)),
        pet_friendly: Some(rng.gen_bool(0.5)),
        shareable: Some(rng.gen_bool(0.7)),
        fridge: Some(true),
        furnished: Some(rng.gen_bool(0.4)),
        internet: Some(rng.gen_bool(0.5)),
        move_in_date: Some(today + Duration::days(rng.gen_range(7..120))),
        description: Some(Paragraph(2..4).fake_with_rng(rng)),
        street_address: Some(format!("{} {}", building, street)),
        city: Some(city),
        postal_code: Some(ZipCode().fake_with_rng(rng)),
        latitude: Some(rng.gen_range(43.60..43.85)),
        longitude: Some(rng.gen_range(-79.55..-79.25)),
        utilities_cost: Some(Decimal::from(rng.gen_range(50..=200))),
        utilities_payable_by_tenant: Some(rng.gen_bool(0.5)),
        ..Default::default()
    };
    draft
        .validate(owner, today)
        .map_err(|e| anyhow!("generated listing rejected: {}", e))
}

/// A group with its owner and up to three more members; `None` when the
/// listing has no eligible tenants
fn fake_group(rng: &mut StdRng, listing: &Listing, tenants: &[&RoommateProfile]) -> Result<Option<Group>> {
    let size = rng.gen_range(1..=4);
    let picked: Vec<&&RoommateProfile> = tenants.choose_multiple(rng, size).collect();
    let Some((owner, others)) = picked.split_first() else {
        return Ok(None);
    };

    let draft = GroupDraft {
        name: Some(Sentence(2..4).fake_with_rng(rng)),
        description: Some(Sentence(5..12).fake_with_rng(rng)),
        move_in_date: Some(listing.move_in_date),
        move_in_ready: rng.gen_bool(0.5),
        group_status: Some(GroupStatus::Open.code().to_string()),
    };
    let mut group = draft.validate(listing.id, owner.id)?;
    for member in others {
        group.join(member.id, false)?;
    }
    Ok(Some(group))
}

fn fake_review(rng: &mut StdRng, reviewer: UserId, reviewee: UserId) -> Result<Review> {
    let draft = ReviewDraft {
        rating: Some(rng.gen_range(1..=5)),
        comment: Some(Sentence(4..16).fake_with_rng(rng)),
        reviewee_role: RevieweeRole::ALL.choose(rng).copied(),
    };
    Ok(draft.validate(reviewer, reviewee, false)?)
}

async fn export_training(pool: &DatabasePool, output: Option<PathBuf>) -> Result<()> {
    let users: HashMap<UserId, User> = UserRepository::new(pool.clone())
        .list_all()
        .await?
        .into_iter()
        .map(|u| (u.id, u))
        .collect();
    let listings: HashMap<_, Listing> = ListingRepository::new(pool.clone())
        .list_all()
        .await?
        .into_iter()
        .map(|l| (l.id, l))
        .collect();
    let interactions = InteractionRepository::new(pool.clone()).list_all().await?;

    let rows = interactions.iter().filter_map(|i| {
        let user = users.get(&i.user_id)?;
        let listing = listings.get(&i.listing_id)?;
        Some((user, listing, i.kind))
    });
    let examples = build_training_set(rows);

    let mut out: Box<dyn Write> = match &output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };
    for example in &examples {
        writeln!(out, "{}", example.to_json_line()?)?;
    }
    out.flush()?;

    tracing::info!(
        interactions = interactions.len(),
        examples = examples.len(),
        "Exported training examples"
    );
    Ok(())
}
