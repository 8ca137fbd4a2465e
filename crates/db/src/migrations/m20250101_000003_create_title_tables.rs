//! Create title and genre_title tables migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000002_create_category_genre_tables::{Category, Genre};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Title::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Title::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Title::Name).string_len(200).not_null())
                    .col(ColumnDef::new(Title::Year).integer().not_null())
                    .col(ColumnDef::new(Title::Description).text())
                    .col(ColumnDef::new(Title::CategoryId).big_integer())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_title_category")
                            .from(Title::Table, Title::CategoryId)
                            .to(Category::Table, Category::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_title_category_id")
                    .table(Title::Table)
                    .col(Title::CategoryId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_title_year")
                    .table(Title::Table)
                    .col(Title::Year)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(GenreTitle::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GenreTitle::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GenreTitle::GenreId).big_integer())
                    .col(ColumnDef::new(GenreTitle::TitleId).big_integer().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_genre_title_genre")
                            .from(GenreTitle::Table, GenreTitle::GenreId)
                            .to(Genre::Table, Genre::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_genre_title_title")
                            .from(GenreTitle::Table, GenreTitle::TitleId)
                            .to(Title::Table, Title::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: title_id (genres of a title)
        manager
            .create_index(
                Index::create()
                    .name("idx_genre_title_title_id")
                    .table(GenreTitle::Table)
                    .col(GenreTitle::TitleId)
                    .to_owned(),
            )
            .await?;

        // Index: genre_id (titles of a genre, genre filter)
        manager
            .create_index(
                Index::create()
                    .name("idx_genre_title_genre_id")
                    .table(GenreTitle::Table)
                    .col(GenreTitle::GenreId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GenreTitle::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Title::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Title {
    Table,
    Id,
    Name,
    Year,
    Description,
    CategoryId,
}

#[derive(Iden)]
enum GenreTitle {
    Table,
    Id,
    GenreId,
    TitleId,
}
