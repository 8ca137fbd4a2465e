//! User entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Access level of a user.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    #[sea_orm(string_value = "user")]
    User,
    #[sea_orm(string_value = "moderator")]
    Moderator,
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl UserRole {
    /// Lowercase wire name of the role.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Moderator => "moderator",
            Self::Admin => "admin",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub username: String,

    /// Login identifier; confirmation codes are mailed here.
    #[sea_orm(unique)]
    pub email: String,

    pub role: UserRole,

    #[sea_orm(column_type = "Text", nullable)]
    pub bio: Option<String>,

    pub first_name: String,

    pub last_name: String,

    /// Staff-equivalent flag; grants admin rights regardless of role.
    #[sea_orm(default_value = false)]
    pub is_superuser: bool,

    /// Set on every successful token exchange.
    #[sea_orm(nullable)]
    pub last_login: Option<DateTimeWithTimeZone>,

    pub date_joined: DateTimeWithTimeZone,
}

impl Model {
    /// Admin role or superuser.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin || self.is_superuser
    }

    /// Moderator role.
    #[must_use]
    pub fn is_moderator(&self) -> bool {
        self.role == UserRole::Moderator
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::review::Entity")]
    Reviews,
    #[sea_orm(has_many = "super::comment::Entity")]
    Comments,
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Reviews.def()
    }
}

impl Related<super::comment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Comments.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
