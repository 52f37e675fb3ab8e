//! Create mail_accounts table.

use sea_orm_migration::prelude::*;

use super::m20261001_000001_create_users::Users;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MailAccounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MailAccounts::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MailAccounts::UserId).uuid().not_null())
                    .col(ColumnDef::new(MailAccounts::Name).string_len(100).not_null())
                    .col(ColumnDef::new(MailAccounts::Email).string_len(255).not_null())
                    .col(
                        ColumnDef::new(MailAccounts::Username)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MailAccounts::EncryptedPassword).text().not_null())
                    .col(
                        ColumnDef::new(MailAccounts::ImapHost)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MailAccounts::ImapPort).integer().not_null())
                    .col(
                        ColumnDef::new(MailAccounts::ImapSecurity)
                            .string_len(10)
                            .not_null()
                            .default("ssl"),
                    )
                    .col(
                        ColumnDef::new(MailAccounts::SmtpHost)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MailAccounts::SmtpPort).integer().not_null())
                    .col(
                        ColumnDef::new(MailAccounts::SmtpSecurity)
                            .string_len(10)
                            .not_null()
                            .default("starttls"),
                    )
                    .col(
                        ColumnDef::new(MailAccounts::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(MailAccounts::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_mail_accounts_user_id")
                            .from(MailAccounts::Table, MailAccounts::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_mail_accounts_user_id")
                    .table(MailAccounts::Table)
                    .col(MailAccounts::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MailAccounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(super) enum MailAccounts {
    Table,
    Id,
    UserId,
    Name,
    Email,
    Username,
    EncryptedPassword,
    ImapHost,
    ImapPort,
    ImapSecurity,
    SmtpHost,
    SmtpPort,
    SmtpSecurity,
    CreatedAt,
    UpdatedAt,
}
