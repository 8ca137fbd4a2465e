//! Create review and comment tables migration.

use sea_orm_migration::prelude::*;

use super::m20250101_000001_create_user_table::User;
use super::m20250101_000003_create_title_tables::Title;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Review::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Review::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Review::TitleId).big_integer().not_null())
                    .col(ColumnDef::new(Review::AuthorId).big_integer().not_null())
                    .col(ColumnDef::new(Review::Text).text().not_null())
                    .col(ColumnDef::new(Review::Score).integer().not_null())
                    .col(
                        ColumnDef::new(Review::PubDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(Expr::col(Review::Score).between(1, 10))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_title")
                            .from(Review::Table, Review::TitleId)
                            .to(Title::Table, Title::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_review_author")
                            .from(Review::Table, Review::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Unique index: (author_id, title_id) - one review per author per title
        manager
            .create_index(
                Index::create()
                    .name("unique_review")
                    .table(Review::Table)
                    .col(Review::AuthorId)
                    .col(Review::TitleId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Index: title_id (reviews of a title, rating aggregate)
        manager
            .create_index(
                Index::create()
                    .name("idx_review_title_id")
                    .table(Review::Table)
                    .col(Review::TitleId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Comment::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Comment::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Comment::ReviewId).big_integer().not_null())
                    .col(ColumnDef::new(Comment::AuthorId).big_integer().not_null())
                    .col(ColumnDef::new(Comment::Text).text().not_null())
                    .col(
                        ColumnDef::new(Comment::PubDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_review")
                            .from(Comment::Table, Comment::ReviewId)
                            .to(Review::Table, Review::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_comment_author")
                            .from(Comment::Table, Comment::AuthorId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: review_id (comments of a review)
        manager
            .create_index(
                Index::create()
                    .name("idx_comment_review_id")
                    .table(Comment::Table)
                    .col(Comment::ReviewId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Comment::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Review::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Review {
    Table,
    Id,
    TitleId,
    AuthorId,
    Text,
    Score,
    PubDate,
}

#[derive(Iden)]
enum Comment {
    Table,
    Id,
    ReviewId,
    AuthorId,
    Text,
    PubDate,
}
