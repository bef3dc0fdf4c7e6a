use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use tracing::warn;
use uuid::Uuid;

use crate::auth::dto::{JwtKeys, Role};
use crate::error::ApiError;

/// The resolved caller, decoded from the bearer token and threaded
/// explicitly through handler signatures. Handlers that take an
/// `Identity` argument cannot run without one: a missing or invalid
/// token short-circuits with 401 before any controller logic.
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: Uuid,
    pub role: Role,
    pub email: String,
    pub name: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admin-only operations (user management, aggregate analytics,
    /// appointment status changes).
    pub fn require_admin(&self) -> Result<(), ApiError> {
        if self.is_admin() {
            Ok(())
        } else {
            warn!(user_id = %self.id, "admin-only access denied");
            Err(ApiError::Forbidden("Access denied".into()))
        }
    }

    /// Permit iff the caller owns the resource or is an admin. Both being
    /// true at once is a permit; neither is a 403.
    pub fn require_self_or_admin(&self, owner_id: Uuid) -> Result<(), ApiError> {
        if self.id == owner_id || self.is_admin() {
            Ok(())
        } else {
            warn!(user_id = %self.id, %owner_id, "self-or-admin access denied");
            Err(ApiError::Forbidden("Access denied".into()))
        }
    }

    /// Exact ownership, no admin override. Used where the original system
    /// granted admins no shortcut (deleting one's own comments/likes).
    pub fn require_owner(&self, owner_id: Uuid) -> Result<(), ApiError> {
        if self.id == owner_id {
            Ok(())
        } else {
            warn!(user_id = %self.id, %owner_id, "owner-only access denied");
            Err(ApiError::Forbidden("Access denied".into()))
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
    JwtKeys: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let keys = JwtKeys::from_ref(state);

        let auth_header = parts
            .headers
            .get(axum::http::header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::Unauthorized("Missing Authorization header".into()))?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .or_else(|| auth_header.strip_prefix("bearer "))
            .ok_or_else(|| ApiError::Unauthorized("Invalid Authorization header".into()))?;

        let claims = keys.verify(token).map_err(|_| {
            warn!("invalid or expired token");
            ApiError::Unauthorized("Invalid or expired token".into())
        })?;

        Ok(Identity {
            id: claims.id,
            role: claims.role,
            email: claims.email,
            name: claims.username,
        })
    }
}

#[cfg(test)]
mod policy_tests {
    use super::*;

    fn identity(role: Role) -> Identity {
        Identity {
            id: Uuid::new_v4(),
            role,
            email: "u@example.com".into(),
            name: "u".into(),
        }
    }

    #[test]
    fn admin_check() {
        assert!(identity(Role::Admin).require_admin().is_ok());
        let err = identity(Role::User).require_admin().unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn self_or_admin_permits_owner() {
        let me = identity(Role::User);
        assert!(me.require_self_or_admin(me.id).is_ok());
    }

    #[test]
    fn self_or_admin_permits_admin_over_anyone() {
        let admin = identity(Role::Admin);
        assert!(admin.require_self_or_admin(Uuid::new_v4()).is_ok());
    }

    #[test]
    fn self_or_admin_permits_admin_acting_on_self() {
        // Both arms true at once: still a plain permit.
        let admin = identity(Role::Admin);
        assert!(admin.require_self_or_admin(admin.id).is_ok());
    }

    #[test]
    fn self_or_admin_denies_stranger_with_forbidden() {
        let me = identity(Role::User);
        let err = me.require_self_or_admin(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn owner_only_denies_admin() {
        let admin = identity(Role::Admin);
        let err = admin.require_owner(Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, ApiError::Forbidden(_)));
    }

    #[test]
    fn owner_only_permits_owner() {
        let me = identity(Role::User);
        assert!(me.require_owner(me.id).is_ok());
    }
}

#[cfg(test)]
mod extractor_tests {
    use super::*;
    use crate::state::AppState;
    use axum::extract::FromRef;
    use axum::http::Request;

    fn parts_with_auth(value: Option<&str>) -> Parts {
        let mut builder = Request::builder().uri("/");
        if let Some(v) = value {
            builder = builder.header(axum::http::header::AUTHORIZATION, v);
        }
        let (parts, _) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn missing_header_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(None);
        let err = Identity::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn wrong_scheme_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Basic dXNlcjpwYXNz"));
        let err = Identity::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn garbage_token_is_unauthorized() {
        let state = AppState::fake();
        let mut parts = parts_with_auth(Some("Bearer not.a.jwt"));
        let err = Identity::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert!(matches!(err, ApiError::Unauthorized(_)));
    }

    #[tokio::test]
    async fn valid_token_resolves_full_identity() {
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let id = Uuid::new_v4();
        let token = keys.sign(id, Role::Admin, "boss@example.com", "boss").unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        let identity = Identity::from_request_parts(&mut parts, &state)
            .await
            .unwrap();
        assert_eq!(identity.id, id);
        assert_eq!(identity.role, Role::Admin);
        assert_eq!(identity.email, "boss@example.com");
        assert_eq!(identity.name, "boss");
    }

    #[tokio::test]
    async fn token_stays_valid_without_any_db_lookup() {
        // Stateless sessions: the extractor consults only the secret, so a
        // token issued for a since-deleted account still authenticates. The
        // controller's own lookup is what surfaces not-found afterwards.
        let state = AppState::fake();
        let keys = JwtKeys::from_ref(&state);
        let token = keys
            .sign(Uuid::new_v4(), Role::User, "ghost@example.com", "ghost")
            .unwrap();

        let mut parts = parts_with_auth(Some(&format!("Bearer {token}")));
        assert!(Identity::from_request_parts(&mut parts, &state)
            .await
            .is_ok());
    }
}
