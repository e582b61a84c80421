/// Role-based authorization checks
///
/// Rollcall uses a flat role hierarchy carried in the JWT:
/// student < teacher < admin. Checks are pure functions over the
/// [`AuthContext`]; no database round trip is needed.
///
/// # Example
///
/// ```
/// use rollcall_shared::auth::authorization::require_role;
/// use rollcall_shared::auth::context::AuthContext;
/// use rollcall_shared::models::user::UserRole;
/// use uuid::Uuid;
///
/// # fn example(auth: &AuthContext) -> Result<(), Box<dyn std::error::Error>> {
/// // Marking attendance needs teacher or admin
/// require_role(auth, UserRole::Teacher)?;
/// # Ok(())
/// # }
/// ```
use uuid::Uuid;

use super::context::AuthContext;
use crate::models::user::UserRole;

/// Error type for authorization checks
#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// Caller's role is below the required one
    #[error("Requires {required} role or higher")]
    InsufficientRole { required: UserRole },

    /// Caller may only access their own resource
    #[error("Not authorized to access this resource")]
    NotOwner,
}

/// Requires the caller to hold `required` or a higher role
pub fn require_role(auth: &AuthContext, required: UserRole) -> Result<(), AuthzError> {
    if auth.role.outranks_or_is(required) {
        Ok(())
    } else {
        Err(AuthzError::InsufficientRole { required })
    }
}

/// Requires the caller to be an admin
pub fn require_admin(auth: &AuthContext) -> Result<(), AuthzError> {
    require_role(auth, UserRole::Admin)
}

/// Allows staff (teacher/admin) through; otherwise the caller must be the
/// named user
///
/// Used for endpoints like a student fetching their own report.
pub fn require_self_or_role(
    auth: &AuthContext,
    owner_id: Uuid,
    required: UserRole,
) -> Result<(), AuthzError> {
    if auth.user_id == owner_id {
        return Ok(());
    }
    require_role(auth, required).map_err(|_| AuthzError::NotOwner)
}
