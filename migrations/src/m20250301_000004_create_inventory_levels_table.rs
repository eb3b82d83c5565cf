use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(InventoryLevels::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(InventoryLevels::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::CustomerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::ProductId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::Quantity)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::TargetStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::SafetyStock)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(InventoryLevels::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_levels_customer")
                            .from(InventoryLevels::Table, InventoryLevels::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_inventory_levels_product")
                            .from(InventoryLevels::Table, InventoryLevels::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        // One ledger record per (customer, product); the allocator relies on this
        manager
            .create_index(
                Index::create()
                    .name("idx_inventory_levels_customer_product")
                    .table(InventoryLevels::Table)
                    .col(InventoryLevels::CustomerId)
                    .col(InventoryLevels::ProductId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(InventoryLevels::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum InventoryLevels {
    Table,
    Id,
    CustomerId,
    ProductId,
    Quantity,
    TargetStock,
    SafetyStock,
    UpdatedAt,
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
