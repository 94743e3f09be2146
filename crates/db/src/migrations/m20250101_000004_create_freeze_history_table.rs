//! Create freeze history table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(FreezeHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FreezeHistory::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(FreezeHistory::UserId)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FreezeHistory::Reason).text().not_null())
                    .col(
                        ColumnDef::new(FreezeHistory::DurationDays)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FreezeHistory::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FreezeHistory::EndDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(FreezeHistory::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(FreezeHistory::UnfrozenAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(FreezeHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_freeze_history_user")
                            .from(FreezeHistory::Table, FreezeHistory::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_freeze_history_one_active
                ON freeze_history (user_id)
                WHERE is_active;
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FreezeHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum FreezeHistory {
    Table,
    Id,
    UserId,
    Reason,
    DurationDays,
    StartDate,
    EndDate,
    IsActive,
    UnfrozenAt,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
