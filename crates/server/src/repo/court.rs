use shared_types::{
    AppError, Court, CourtContact, CourtSettings, CourtStatistics, CreateCourtRequest,
    UpdateCourtRequest, WorkingHours,
};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::error_convert::SqlxErrorExt;
use crate::text::like_pattern;

const COURT_COLUMNS: &str = "id, name, name_en, court_type, level, jurisdiction, city, region, \
     district, address, latitude, longitude, contact, working_hours, established_date, \
     status, parent_court_id, settings, created_at, updated_at";

pub async fn create(pool: &Pool<Postgres>, req: CreateCourtRequest) -> Result<Court, AppError> {
    let sql = format!(
        r#"
        INSERT INTO courts
            (id, name, name_en, court_type, level, jurisdiction, city, region, district,
             address, latitude, longitude, contact, working_hours, established_date,
             status, parent_court_id, settings)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
        RETURNING {COURT_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Court>(&sql)
        .bind(Uuid::new_v4())
        .bind(req.name.trim())
        .bind(req.name_en.as_deref())
        .bind(&req.court_type)
        .bind(req.level)
        .bind(&req.jurisdiction)
        .bind(req.city.trim())
        .bind(req.region.trim())
        .bind(req.district.as_deref())
        .bind(req.address.as_deref())
        .bind(req.latitude)
        .bind(req.longitude)
        .bind(sqlx::types::Json(&req.contact))
        .bind(sqlx::types::Json(req.working_hours.unwrap_or_default()))
        .bind(req.established_date)
        .bind(req.status.as_deref().unwrap_or("active"))
        .bind(req.parent_court_id)
        .bind(sqlx::types::Json(req.settings.unwrap_or_default()))
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_id(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<Court>, AppError> {
    let sql = format!("SELECT {COURT_COLUMNS} FROM courts WHERE id = $1");
    sqlx::query_as::<_, Court>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn exists(pool: &Pool<Postgres>, id: Uuid) -> Result<bool, AppError> {
    sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM courts WHERE id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

pub async fn find_by_name(pool: &Pool<Postgres>, name: &str) -> Result<Option<Court>, AppError> {
    let sql = format!("SELECT {COURT_COLUMNS} FROM courts WHERE name = $1");
    sqlx::query_as::<_, Court>(&sql)
        .bind(name)
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Number formats for a court, falling back to the defaults.
pub async fn settings(pool: &Pool<Postgres>, id: Uuid) -> Result<Option<CourtSettings>, AppError> {
    let row: Option<sqlx::types::Json<CourtSettings>> =
        sqlx::query_scalar("SELECT settings FROM courts WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .map_err(SqlxErrorExt::into_app_error)?;
    Ok(row.map(|json| json.0))
}

pub struct CourtFilter<'a> {
    pub court_type: Option<&'a str>,
    pub jurisdiction: Option<&'a str>,
    pub city: Option<&'a str>,
    pub status: &'a str,
    pub q: Option<&'a str>,
}

/// Paginated listing sorted by name.
pub async fn list(
    pool: &Pool<Postgres>,
    filter: CourtFilter<'_>,
    offset: i64,
    limit: i64,
) -> Result<(Vec<Court>, i64), AppError> {
    let pattern = filter.q.map(like_pattern);
    let city = filter.city.map(like_pattern);
    let clause = r#"
        WHERE status = $1
          AND ($2::TEXT IS NULL OR court_type = $2)
          AND ($3::TEXT IS NULL OR jurisdiction = $3)
          AND ($4::TEXT IS NULL OR city ILIKE $4)
          AND ($5::TEXT IS NULL OR name ILIKE $5 OR name_en ILIKE $5
               OR city ILIKE $5 OR region ILIKE $5)
    "#;

    let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM courts {clause}"))
        .bind(filter.status)
        .bind(filter.court_type)
        .bind(filter.jurisdiction)
        .bind(city.as_deref())
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    let sql = format!(
        "SELECT {COURT_COLUMNS} FROM courts {clause} ORDER BY name ASC LIMIT $6 OFFSET $7"
    );
    let rows = sqlx::query_as::<_, Court>(&sql)
        .bind(filter.status)
        .bind(filter.court_type)
        .bind(filter.jurisdiction)
        .bind(city.as_deref())
        .bind(pattern.as_deref())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)?;

    Ok((rows, total))
}

pub async fn sub_courts(pool: &Pool<Postgres>, parent_id: Uuid) -> Result<Vec<Court>, AppError> {
    let sql = format!(
        "SELECT {COURT_COLUMNS} FROM courts WHERE parent_court_id = $1 ORDER BY name ASC"
    );
    sqlx::query_as::<_, Court>(&sql)
        .bind(parent_id)
        .fetch_all(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}

/// Case and judgment aggregates for one court.
pub async fn statistics(pool: &Pool<Postgres>, id: Uuid) -> Result<CourtStatistics, AppError> {
    sqlx::query_as::<_, CourtStatistics>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM cases WHERE court_id = $1) AS total_cases,
            (SELECT COUNT(*) FROM cases WHERE court_id = $1
                AND status NOT IN ('decided', 'final', 'archived', 'cancelled')) AS active_cases,
            (SELECT COUNT(*) FROM cases WHERE court_id = $1
                AND status IN ('decided', 'final', 'archived', 'cancelled')) AS closed_cases,
            (SELECT COUNT(*) FROM judgments WHERE court_id = $1) AS total_judgments,
            (SELECT AVG(EXTRACT(EPOCH FROM (decision_date - filed_at)) / 86400.0)::FLOAT8
               FROM cases WHERE court_id = $1 AND decision_date IS NOT NULL) AS average_processing_time
        "#,
    )
    .bind(id)
    .fetch_one(pool)
    .await
    .map_err(SqlxErrorExt::into_app_error)
}

pub async fn update(
    pool: &Pool<Postgres>,
    id: Uuid,
    req: UpdateCourtRequest,
) -> Result<Option<Court>, AppError> {
    let sql = format!(
        r#"
        UPDATE courts SET
            name = COALESCE($2, name),
            name_en = COALESCE($3, name_en),
            court_type = COALESCE($4, court_type),
            level = COALESCE($5, level),
            jurisdiction = COALESCE($6, jurisdiction),
            city = COALESCE($7, city),
            region = COALESCE($8, region),
            contact = COALESCE($9, contact),
            working_hours = COALESCE($10, working_hours),
            status = COALESCE($11, status),
            settings = COALESCE($12, settings),
            updated_at = NOW()
        WHERE id = $1
        RETURNING {COURT_COLUMNS}
        "#
    );
    sqlx::query_as::<_, Court>(&sql)
        .bind(id)
        .bind(req.name.as_deref())
        .bind(req.name_en.as_deref())
        .bind(req.court_type.as_deref())
        .bind(req.level)
        .bind(req.jurisdiction.as_deref())
        .bind(req.city.as_deref())
        .bind(req.region.as_deref())
        .bind(req.contact.map(sqlx::types::Json::<CourtContact>))
        .bind(req.working_hours.map(sqlx::types::Json::<WorkingHours>))
        .bind(req.status.as_deref())
        .bind(req.settings.map(sqlx::types::Json::<CourtSettings>))
        .fetch_optional(pool)
        .await
        .map_err(SqlxErrorExt::into_app_error)
}
