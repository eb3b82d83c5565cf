use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InboundTransactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InboundTransactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InboundTransactions::CustomerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundTransactions::ProductId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundTransactions::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InboundTransactions::InboundDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(InboundTransactions::Remarks).string().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inbound_transactions_customer")
                            .from(
                                InboundTransactions::Table,
                                InboundTransactions::CustomerId,
                            )
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inbound_transactions_product")
                            .from(InboundTransactions::Table, InboundTransactions::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_inbound_transactions_inbound_date")
                    .table(InboundTransactions::Table)
                    .col(InboundTransactions::InboundDate)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InboundTransactions::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InboundTransactions {
    Table,
    Id,
    CustomerId,
    ProductId,
    Quantity,
    InboundDate,
    Remarks,
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
