/// Per-request authentication context
///
/// The API's JWT middleware validates the bearer token and inserts an
/// [`AuthContext`] into the request extensions; handlers extract it with
/// Axum's `Extension` extractor.
///
/// # Example
///
/// ```
/// use rollcall_shared::auth::context::AuthContext;
/// use rollcall_shared::auth::jwt::{Claims, TokenType};
/// use rollcall_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// let claims = Claims::new(Uuid::new_v4(), UserRole::Teacher, TokenType::Access);
/// let auth = AuthContext::from_claims(&claims);
/// assert!(!auth.is_admin());
/// ```
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::jwt::Claims;
use crate::models::user::UserRole;

/// Identity of the authenticated caller
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthContext {
    /// Authenticated user ID
    pub user_id: Uuid,

    /// Role carried by the access token
    pub role: UserRole,
}

impl AuthContext {
    /// Builds the context from validated access-token claims
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role: claims.role,
        }
    }

    /// Whether the caller is an admin
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }

    /// Whether the caller holds the student role
    pub fn is_student(&self) -> bool {
        self.role == UserRole::Student
    }
}
