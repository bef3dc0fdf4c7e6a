use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

/// Error taxonomy surfaced by every handler.
///
/// `Unauthorized` means the request carried no usable identity;
/// `Forbidden` means the identity was valid but lacked privilege.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }
}

fn map_db_error(e: &sqlx::Error) -> Option<ApiError> {
    match e {
        sqlx::Error::RowNotFound => Some(ApiError::NotFound("Resource not found".into())),
        sqlx::Error::Database(db) => match db.kind() {
            // Creating a comment/like against a missing post or user.
            sqlx::error::ErrorKind::ForeignKeyViolation => {
                Some(ApiError::NotFound("Referenced resource not found".into()))
            }
            // Races that slip past a handler's existence pre-check, e.g.
            // two concurrent signups with the same email.
            sqlx::error::ErrorKind::UniqueViolation => {
                Some(ApiError::Validation("Resource already exists".into()))
            }
            _ => None,
        },
        _ => None,
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        map_db_error(&e).unwrap_or_else(|| Self::Internal(e.into()))
    }
}

/// Repo functions return `anyhow::Result`, so database failures arrive
/// here wrapped (possibly with context). Walk the chain so constraint
/// violations still map to their client-facing statuses instead of 500.
impl From<anyhow::Error> for ApiError {
    fn from(e: anyhow::Error) -> Self {
        if let Some(mapped) = e
            .chain()
            .find_map(|cause| cause.downcast_ref::<sqlx::Error>().and_then(map_db_error))
        {
            return mapped;
        }
        Self::Internal(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
            ApiError::Unauthorized(m) => (StatusCode::UNAUTHORIZED, m),
            ApiError::Forbidden(m) => (StatusCode::FORBIDDEN, m),
            ApiError::Validation(m) => (StatusCode::BAD_REQUEST, m),
            ApiError::Internal(e) => {
                error!(error = %e, "internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Something went wrong".into(),
                )
            }
        };
        (status, Json(json!({ "message": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping() {
        assert_eq!(
            ApiError::not_found("User").into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Unauthorized("no token".into())
                .into_response()
                .status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("Access denied".into())
                .into_response()
                .status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::Validation("missing field".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApiError::Internal(anyhow::anyhow!("boom"))
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn internal_error_does_not_leak_cause() {
        let resp = ApiError::Internal(anyhow::anyhow!("connection to db-host:5432 refused"))
            .into_response();
        // Body is the generic envelope; the cause only goes to the log.
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn anyhow_wrapped_db_error_maps_like_the_bare_one() {
        // The path every handler takes: repo returns anyhow::Result, the
        // sqlx cause rides inside.
        let wrapped = anyhow::Error::new(sqlx::Error::RowNotFound);
        let err: ApiError = wrapped.into();
        assert!(matches!(err, ApiError::NotFound(_)));
        assert_eq!(err.into_response().status(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn context_layers_do_not_hide_the_db_cause() {
        use anyhow::Context;
        let wrapped = Err::<(), _>(sqlx::Error::RowNotFound)
            .context("load user")
            .unwrap_err();
        let err: ApiError = wrapped.into();
        assert!(matches!(err, ApiError::NotFound(_)));
    }

    #[test]
    fn anyhow_without_db_cause_stays_internal() {
        let err: ApiError = anyhow::anyhow!("disk on fire").into();
        assert!(matches!(err, ApiError::Internal(_)));
    }
}
