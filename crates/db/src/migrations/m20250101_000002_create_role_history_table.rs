//! Create role history table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RoleHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RoleHistory::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(RoleHistory::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(RoleHistory::ChangedById)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(RoleHistory::OldRole).string_len(16).not_null())
                    .col(ColumnDef::new(RoleHistory::NewRole).string_len(16).not_null())
                    .col(ColumnDef::new(RoleHistory::Reason).text())
                    .col(
                        ColumnDef::new(RoleHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_history_user")
                            .from(RoleHistory::Table, RoleHistory::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_role_history_changed_by")
                            .from(RoleHistory::Table, RoleHistory::ChangedById)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_role_history_user_created_at")
                    .table(RoleHistory::Table)
                    .col(RoleHistory::UserId)
                    .col(RoleHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RoleHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RoleHistory {
    Table,
    Id,
    UserId,
    ChangedById,
    OldRole,
    NewRole,
    Reason,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
