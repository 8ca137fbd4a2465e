//! Role-based access policy.
//!
//! Every mutation runs [`allow`] after its parent objects were resolved and
//! before the request body is looked at.

use yamdb_common::{AppError, AppResult};
use yamdb_db::entities::user;

/// What the request does to the resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Read,
    Create,
    Update,
    Delete,
}

impl Action {
    /// Whether the action leaves state untouched.
    #[must_use]
    pub const fn is_safe(self) -> bool {
        matches!(self, Self::Read)
    }
}

/// Access policy attached to a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Policy {
    /// Anyone reads; admins write. Categories, genres and titles.
    AdminOrReadOnly,
    /// Anyone reads; signed-in users create; the author or staff edit.
    /// Reviews and comments.
    AuthorOrStaff,
    /// Admins only, for every action. User management.
    AdminOnly,
    /// Any signed-in user. The caller's own profile.
    Authenticated,
}

/// Decide whether `actor` may perform `action` under `policy`.
///
/// `owner_id` is the author of the target object, when there is one.
/// Anonymous callers get `Unauthorized` where a user is required; signed-in
/// callers without the needed role get `Forbidden`.
pub fn allow(
    actor: Option<&user::Model>,
    policy: Policy,
    action: Action,
    owner_id: Option<i64>,
) -> AppResult<()> {
    match policy {
        Policy::AdminOrReadOnly => {
            if action.is_safe() {
                return Ok(());
            }
            require_admin(actor)
        }
        Policy::AuthorOrStaff => {
            if action.is_safe() {
                return Ok(());
            }
            let actor = actor.ok_or(AppError::Unauthorized)?;
            match action {
                Action::Create => Ok(()),
                _ if owner_id == Some(actor.id) || actor.is_moderator() || actor.is_admin() => {
                    Ok(())
                }
                _ => Err(AppError::Forbidden(
                    "only the author, a moderator or an admin can change this".to_string(),
                )),
            }
        }
        Policy::AdminOnly => require_admin(actor),
        Policy::Authenticated => actor.map(|_| ()).ok_or(AppError::Unauthorized),
    }
}

fn require_admin(actor: Option<&user::Model>) -> AppResult<()> {
    let actor = actor.ok_or(AppError::Unauthorized)?;
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(
            "admin privileges are required".to_string(),
        ))
    }
}
