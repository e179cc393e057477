use shared_types::AppError;

/// Convert a sqlx::Error into an AppError.
pub fn sqlx_to_app_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::RowNotFound => AppError::not_found("المورد غير موجود"),
        sqlx::Error::Database(db_err) => {
            // PostgreSQL unique constraint violation (error code 23505)
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or_default();
                let detail = db_err.message();
                return AppError::conflict(conflict_message(constraint, detail));
            }
            tracing::error!(error = %err, "database error");
            AppError::database(err.to_string())
        }
        _ => {
            tracing::error!(error = %err, "database error");
            AppError::database(err.to_string())
        }
    }
}

fn conflict_message(constraint: &str, detail: &str) -> &'static str {
    let hit = |needle: &str| constraint.contains(needle) || detail.contains(needle);
    if hit("email") {
        "البريد الإلكتروني مستخدم بالفعل"
    } else if hit("case_number") {
        "رقم القضية موجود بالفعل"
    } else if hit("judgment_number") {
        "رقم الحكم موجود بالفعل"
    } else {
        "السجل موجود بالفعل"
    }
}

/// Extension trait providing `.into_app_error()` on sqlx::Error.
pub trait SqlxErrorExt {
    fn into_app_error(self) -> AppError;
}

impl SqlxErrorExt for sqlx::Error {
    fn into_app_error(self) -> AppError {
        sqlx_to_app_error(self)
    }
}

/// Trait for validating request DTOs before processing.
pub trait ValidateRequest {
    fn validate_request(&self) -> Result<(), AppError>;
}

impl<T: validator::Validate> ValidateRequest for T {
    fn validate_request(&self) -> Result<(), AppError> {
        self.validate().map_err(AppError::from)
    }
}

/// Reject a value that is not in its enumeration list.
pub fn ensure_choice(field: &str, value: &str, allowed: &[&str]) -> Result<(), AppError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(AppError::invalid_choice(field, value, allowed))
    }
}

/// Parse a path id, mapping failure to 400.
pub fn parse_id(raw: &str) -> Result<uuid::Uuid, AppError> {
    uuid::Uuid::parse_str(raw).map_err(|_| AppError::bad_request("معرف غير صالح"))
}
