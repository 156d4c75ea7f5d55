//! Create transport request table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TransportRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransportRequest::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransportRequest::PatientId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransportRequest::PickupAddress)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransportRequest::Destination)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransportRequest::RequestedTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(TransportRequest::Notes)
                            .text()
                            .not_null()
                            .default(""),
                    )
                    .col(
                        ColumnDef::new(TransportRequest::Status)
                            .string_len(20)
                            .not_null()
                            .default("open"),
                    )
                    .col(
                        ColumnDef::new(TransportRequest::NoVolunteersAvailable)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(TransportRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transport_request_patient")
                            .from(TransportRequest::Table, TransportRequest::PatientId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: (status, created_at) for the open-request listings
        manager
            .create_index(
                Index::create()
                    .name("idx_transport_request_status_created")
                    .table(TransportRequest::Table)
                    .col(TransportRequest::Status)
                    .col(TransportRequest::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // Index: patient_id (for per-patient listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_transport_request_patient_id")
                    .table(TransportRequest::Table)
                    .col(TransportRequest::PatientId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransportRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum TransportRequest {
    Table,
    Id,
    PatientId,
    PickupAddress,
    Destination,
    RequestedTime,
    Notes,
    Status,
    NoVolunteersAvailable,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
