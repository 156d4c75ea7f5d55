//! Create rejection table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Rejection::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Rejection::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Rejection::RequestId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Rejection::VolunteerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Rejection::Reason).text().not_null().default(""))
                    .col(
                        ColumnDef::new(Rejection::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rejection_request")
                            .from(Rejection::Table, Rejection::RequestId)
                            .to(TransportRequest::Table, TransportRequest::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_rejection_volunteer")
                            .from(Rejection::Table, Rejection::VolunteerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (request_id, volunteer_id) - one rejection per volunteer per request
        manager
            .create_index(
                Index::create()
                    .name("idx_rejection_request_volunteer")
                    .table(Rejection::Table)
                    .col(Rejection::RequestId)
                    .col(Rejection::VolunteerId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: volunteer_id (for excluding already-rejected requests)
        manager
            .create_index(
                Index::create()
                    .name("idx_rejection_volunteer_id")
                    .table(Rejection::Table)
                    .col(Rejection::VolunteerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Rejection::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Rejection {
    Table,
    Id,
    RequestId,
    VolunteerId,
    Reason,
    CreatedAt,
}

#[derive(Iden)]
enum TransportRequest {
    Table,
    Id,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
