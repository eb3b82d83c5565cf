use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Shipments::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Shipments::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Shipments::CustomerId).integer().not_null())
                    .col(
                        ColumnDef::new(Shipments::SourceCustomerId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Shipments::ProductId).integer().not_null())
                    .col(ColumnDef::new(Shipments::Quantity).integer().not_null())
                    .col(
                        ColumnDef::new(Shipments::ShipmentDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Shipments::RmaTicket).string().null())
                    .col(
                        ColumnDef::new(Shipments::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shipments_customer")
                            .from(Shipments::Table, Shipments::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shipments_source_customer")
                            .from(Shipments::Table, Shipments::SourceCustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_shipments_product")
                            .from(Shipments::Table, Shipments::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shipments_source_customer_product")
                    .table(Shipments::Table)
                    .col(Shipments::SourceCustomerId)
                    .col(Shipments::ProductId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_shipments_created_at")
                    .table(Shipments::Table)
                    .col(Shipments::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Shipments::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Shipments {
    Table,
    Id,
    CustomerId,
    SourceCustomerId,
    ProductId,
    Quantity,
    ShipmentDate,
    RmaTicket,
    CreatedAt,
}

#[derive(Iden)]
enum Customers {
    Table,
    Id,
}

#[derive(Iden)]
enum Products {
    Table,
    Id,
}
