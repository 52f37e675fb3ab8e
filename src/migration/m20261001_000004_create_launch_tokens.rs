//! Create launch_tokens table.
//!
//! `id` is the SHA-256 of the token handed to the client. `used_at` is set by
//! a single conditional UPDATE on first redemption.

use sea_orm_migration::prelude::*;

use super::m20261001_000003_create_mail_accounts::MailAccounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(LaunchTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(LaunchTokens::Id)
                            .string_len(64)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(LaunchTokens::AccountId).uuid().not_null())
                    .col(ColumnDef::new(LaunchTokens::Backend).string_len(20).not_null())
                    .col(
                        ColumnDef::new(LaunchTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(LaunchTokens::UsedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(LaunchTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_launch_tokens_account_id")
                            .from(LaunchTokens::Table, LaunchTokens::AccountId)
                            .to(MailAccounts::Table, MailAccounts::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_launch_tokens_expires_at")
                    .table(LaunchTokens::Table)
                    .col(LaunchTokens::ExpiresAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(LaunchTokens::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum LaunchTokens {
    Table,
    Id,
    AccountId,
    Backend,
    ExpiresAt,
    UsedAt,
    CreatedAt,
}
