use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CustomerProducts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CustomerProducts::CustomerId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(CustomerProducts::ProductId)
                            .integer()
                            .not_null(),
                    )
                    .primary_key(
                        Index::create()
                            .col(CustomerProducts::CustomerId)
                            .col(CustomerProducts::ProductId),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_products_customer")
                            .from(CustomerProducts::Table, CustomerProducts::CustomerId)
                            .to(Customers::Table, Customers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_customer_products_product")
                            .from(CustomerProducts::Table, CustomerProducts::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(CustomerProducts::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum CustomerProducts {
    Table,
    CustomerId,
    ProductId,
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
