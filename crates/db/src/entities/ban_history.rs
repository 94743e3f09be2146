//! Ban history entity.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// What a ban row records.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, DeriveActiveEnum,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
#[serde(rename_all = "lowercase")]
pub enum BanDurationKind {
    /// Fixed number of days; `duration_days` and `end_date` are set.
    #[sea_orm(string_value = "days")]
    Days,
    /// No end date.
    #[sea_orm(string_value = "permanent")]
    Permanent,
    /// Marker row appended when a ban is lifted.
    #[sea_orm(string_value = "unban")]
    Unban,
}

impl BanDurationKind {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Days => "days",
            Self::Permanent => "permanent",
            Self::Unban => "unban",
        }
    }
}

/// A ban, or the record of a ban being lifted.
///
/// Only the unban fields of an active row are ever updated, and at most one
/// row per user is active. `end_date` is `None` exactly when the kind is
/// [`BanDurationKind::Permanent`].
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ban_history")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    /// The banned user.
    pub user_id: String,
    /// The actor who issued the ban (or lifted it, for unban rows).
    pub banned_by_id: String,
    #[sea_orm(column_type = "Text")]
    pub reason: String,
    pub duration_kind: BanDurationKind,
    #[sea_orm(nullable)]
    pub duration_days: Option<i32>,
    pub start_date: DateTimeWithTimeZone,
    #[sea_orm(nullable)]
    pub end_date: Option<DateTimeWithTimeZone>,
    pub is_active: bool,
    #[sea_orm(nullable)]
    pub unbanned_at: Option<DateTimeWithTimeZone>,
    #[sea_orm(nullable)]
    pub unbanned_by: Option<String>,
    pub created_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Subject,
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::BannedById",
        to = "super::user::Column::Id",
        on_update = "NoAction",
        on_delete = "Restrict"
    )]
    Issuer,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Subject.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
