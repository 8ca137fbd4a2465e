//! Create user table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(User::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(User::Username).string_len(150).not_null().unique_key())
                    .col(ColumnDef::new(User::Email).string_len(254).not_null().unique_key())
                    .col(
                        ColumnDef::new(User::Role)
                            .string_len(16)
                            .not_null()
                            .default("user"),
                    )
                    .col(ColumnDef::new(User::Bio).text())
                    .col(ColumnDef::new(User::FirstName).string_len(150).not_null().default(""))
                    .col(ColumnDef::new(User::LastName).string_len(150).not_null().default(""))
                    .col(ColumnDef::new(User::IsSuperuser).boolean().not_null().default(false))
                    .col(ColumnDef::new(User::LastLogin).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(User::DateJoined)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Index: role (admin listings)
        manager
            .create_index(
                Index::create()
                    .name("idx_user_role")
                    .table(User::Table)
                    .col(User::Role)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(User::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum User {
    Table,
    Id,
    Username,
    Email,
    Role,
    Bio,
    FirstName,
    LastName,
    IsSuperuser,
    LastLogin,
    DateJoined,
}
