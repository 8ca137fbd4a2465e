//! Create category and genre tables migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Category::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Category::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Category::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Category::Slug).string_len(50).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Genre::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Genre::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Genre::Name).string_len(256).not_null())
                    .col(ColumnDef::new(Genre::Slug).string_len(50).not_null().unique_key())
                    .to_owned(),
            )
            .await?;

        // Index: name (default ordering and search)
        manager
            .create_index(
                Index::create()
                    .name("idx_category_name")
                    .table(Category::Table)
                    .col(Category::Name)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_genre_name")
                    .table(Genre::Table)
                    .col(Genre::Name)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Genre::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Category::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Category {
    Table,
    Id,
    Name,
    Slug,
}

#[derive(Iden)]
pub enum Genre {
    Table,
    Id,
    Name,
    Slug,
}
