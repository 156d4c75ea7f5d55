//! Assignment entity (binds one volunteer to one accepted request).

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "assignment")]
pub struct Model {
    /// One-to-one with the transport request
    #[sea_orm(primary_key, auto_increment = false)]
    pub request_id: String,

    pub volunteer_id: String,

    pub accepted_at: DateTimeWithTimeZone,

    #[sea_orm(column_type = "Text", default_value = "")]
    pub comment: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::transport_request::Entity",
        from = "Column::RequestId",
        to = "super::transport_request::Column::Id",
        on_delete = "Cascade"
    )]
    Request,

    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::VolunteerId",
        to = "super::user::Column::Id",
        on_delete = "Cascade"
    )]
    Volunteer,
}

impl Related<super::transport_request::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Request.def()
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Volunteer.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
