//! Transport request entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle status of a transport request.
///
/// `Done` is reserved for an administrative path; no handler produces it.
#[derive(
    Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
#[serde(rename_all = "lowercase")]
pub enum RequestStatus {
    #[sea_orm(string_value = "open")]
    Open,
    #[sea_orm(string_value = "accepted")]
    Accepted,
    #[sea_orm(string_value = "done")]
    Done,
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl RequestStatus {
    /// Whether no further transitions are defined from this status.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Done | Self::Cancelled)
    }

    /// Human-readable label.
    #[must_use]
    pub const fn display(self) -> &'static str {
        match self {
            Self::Open => "Open",
            Self::Accepted => "Accepted",
            Self::Done => "Done",
            Self::Cancelled => "Cancelled",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transport_request")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// The patient who created the request
    pub patient_id: String,

    pub pickup_address: String,

    pub destination: String,

    pub requested_time: DateTimeWithTimeZone,

    #[sea_orm(column_type = "Text", default_value = "")]
    pub notes: String,

    pub status: RequestStatus,

    /// Set when every registered volunteer has rejected the request
    #[sea_orm(default_value = false)]
    pub no_volunteers_available: bool,

    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::PatientId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Patient,

    #[sea_orm(has_one = "super::assignment::Entity")]
    Assignment,

    #[sea_orm(has_many = "super::rejection::Entity")]
    Rejection,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Patient.def()
    }
}

impl Related<super::assignment::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Assignment.def()
    }
}

impl Related<super::rejection::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Rejection.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
