//! Bootstrap data.
//!
//! ```text
//! seed admin    # admin@court.gov.sa / Admin123!
//! seed courts   # five Riyadh courts
//! seed all
//! ```

use server::auth::password::hash_password;
use server::db;
use server::repo;
use server::repo::user::NewUser;
use shared_types::{AppError, CourtContact, CreateCourtRequest};
use sqlx::{Pool, Postgres};

const ADMIN_EMAIL: &str = "admin@court.gov.sa";
const ADMIN_PASSWORD: &str = "Admin123!";
const ADMIN_NAME: &str = "المدير العام";

const RIYADH: &str = "الرياض";

/// name, name_en, type, level, jurisdiction
const COURTS: &[(&str, &str, &str, i32, &str)] = &[
    ("المحكمة العليا", "Supreme Court", "supreme_court", 1, "mixed"),
    ("محكمة الاستئناف بالرياض", "Riyadh Court of Appeal", "appeal_court", 2, "mixed"),
    ("المحكمة العامة بالرياض", "Riyadh General Court", "general_court", 3, "civil"),
    ("المحكمة التجارية بالرياض", "Riyadh Commercial Court", "commercial_court", 3, "commercial"),
    ("محكمة الأحوال الشخصية بالرياض", "Riyadh Family Court", "family_court", 3, "family"),
];

async fn seed_admin(pool: &Pool<Postgres>) -> Result<(), AppError> {
    if repo::user::find_by_email(pool, ADMIN_EMAIL).await?.is_some() {
        tracing::info!(email = ADMIN_EMAIL, "admin already exists");
        return Ok(());
    }
    let password_hash = hash_password(ADMIN_PASSWORD)?;
    let admin = repo::user::create(
        pool,
        NewUser {
            name: ADMIN_NAME,
            email: ADMIN_EMAIL,
            password_hash: &password_hash,
            role: "admin",
            court_id: None,
        },
    )
    .await?;
    tracing::info!(user_id = %admin.id, email = ADMIN_EMAIL, "admin created");
    Ok(())
}

fn court_request(
    (name, name_en, court_type, level, jurisdiction): (&str, &str, &str, i32, &str),
) -> CreateCourtRequest {
    let contact = if court_type == "supreme_court" {
        CourtContact {
            phone: Some("+966114012345".to_string()),
            email: Some("info@supremecourt.gov.sa".to_string()),
            ..CourtContact::default()
        }
    } else {
        CourtContact::default()
    };
    CreateCourtRequest {
        name: name.to_string(),
        name_en: Some(name_en.to_string()),
        court_type: court_type.to_string(),
        level,
        jurisdiction: jurisdiction.to_string(),
        city: RIYADH.to_string(),
        region: RIYADH.to_string(),
        district: None,
        address: (court_type == "supreme_court").then(|| "طريق الملك فهد، الرياض".to_string()),
        latitude: None,
        longitude: None,
        contact,
        working_hours: None,
        established_date: None,
        status: Some("active".to_string()),
        parent_court_id: None,
        settings: None,
    }
}

async fn seed_courts(pool: &Pool<Postgres>) -> Result<(), AppError> {
    let mut created = 0;
    for &entry in COURTS {
        if repo::court::find_by_name(pool, entry.0).await?.is_some() {
            continue;
        }
        let court = repo::court::create(pool, court_request(entry)).await?;
        tracing::info!(court_id = %court.id, name = %court.name, "court created");
        created += 1;
    }
    tracing::info!(created, total = COURTS.len(), "courts seeded");
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,sqlx=warn".into()),
        )
        .init();

    let target = std::env::args().nth(1).unwrap_or_else(|| "all".to_string());
    let pool = db::create_pool()?;
    db::run_migrations(&pool).await?;

    match target.as_str() {
        "admin" => seed_admin(&pool).await?,
        "courts" => seed_courts(&pool).await?,
        "all" => {
            seed_admin(&pool).await?;
            seed_courts(&pool).await?;
        }
        other => return Err(format!("unknown seed target `{other}` (admin|courts|all)").into()),
    }
    Ok(())
}
