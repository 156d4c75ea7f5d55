//! Create assignment table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Assignment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Assignment::RequestId)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Assignment::VolunteerId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Assignment::AcceptedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Assignment::Comment)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_request")
                            .from(Assignment::Table, Assignment::RequestId)
                            .to(TransportRequest::Table, TransportRequest::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_assignment_volunteer")
                            .from(Assignment::Table, Assignment::VolunteerId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: volunteer_id (for the accepted-requests listing)
        manager
            .create_index(
                Index::create()
                    .name("idx_assignment_volunteer_id")
                    .table(Assignment::Table)
                    .col(Assignment::VolunteerId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Assignment::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Assignment {
    Table,
    RequestId,
    VolunteerId,
    AcceptedAt,
    Comment,
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
