//! Create ban history table migration.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(BanHistory::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(BanHistory::Id)
                            .string_len(32)
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(BanHistory::UserId).string_len(32).not_null())
                    .col(
                        ColumnDef::new(BanHistory::BannedById)
                            .string_len(32)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BanHistory::Reason).text().not_null())
                    .col(
                        ColumnDef::new(BanHistory::DurationKind)
                            .string_len(16)
                            .not_null(),
                    )
                    .col(ColumnDef::new(BanHistory::DurationDays).integer())
                    .col(
                        ColumnDef::new(BanHistory::StartDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(BanHistory::EndDate).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(BanHistory::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(BanHistory::UnbannedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(BanHistory::UnbannedBy).string_len(32))
                    .col(
                        ColumnDef::new(BanHistory::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ban_history_user")
                            .from(BanHistory::Table, BanHistory::UserId)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_ban_history_banned_by")
                            .from(BanHistory::Table, BanHistory::BannedById)
                            .to(User::Table, User::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_ban_history_user_created_at")
                    .table(BanHistory::Table)
                    .col(BanHistory::UserId)
                    .col(BanHistory::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // At most one active ban per user
        manager
            .get_connection()
            .execute_unprepared(
                r"
                CREATE UNIQUE INDEX IF NOT EXISTS idx_ban_history_one_active
                ON ban_history (user_id)
                WHERE is_active;
                ",
            )
            .await?;

        // end_date is NULL exactly for permanent bans
        manager
            .get_connection()
            .execute_unprepared(
                r"
                ALTER TABLE ban_history
                ADD CONSTRAINT chk_ban_history_end_date
                CHECK ((duration_kind = 'permanent') = (end_date IS NULL));
                ",
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(BanHistory::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum BanHistory {
    Table,
    Id,
    UserId,
    BannedById,
    Reason,
    DurationKind,
    DurationDays,
    StartDate,
    EndDate,
    IsActive,
    UnbannedAt,
    UnbannedBy,
    CreatedAt,
}

#[derive(Iden)]
enum User {
    Table,
    Id,
}
