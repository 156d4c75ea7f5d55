//! Profile entity (role and contact details for an account).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Assigned once at signup and immutable afterwards.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[sea_orm(string_value = "patient")]
    Patient,
    #[sea_orm(string_value = "volunteer")]
    Volunteer,
}

impl Role {
    /// Whether this role may create and cancel transport requests.
    #[must_use]
    pub const fn is_patient(self) -> bool {
        matches!(self, Self::Patient)
    }

    /// Whether this role may accept and reject transport requests.
    #[must_use]
    pub const fn is_volunteer(self) -> bool {
        matches!(self, Self::Volunteer)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "profile")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    pub role: Role,

    #[sea_orm(default_value = "")]
    pub phone: String,

    /// Argon2 password hash
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_predicates() {
        assert!(Role::Patient.is_patient());
        assert!(!Role::Patient.is_volunteer());
        assert!(Role::Volunteer.is_volunteer());
        assert!(!Role::Volunteer.is_patient());
    }
}
