//! Entity для таблицы command_logs (только добавление записей).

use crate::enums::{CommandSource, RiskLevel};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "command_logs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    pub server_id: String,

    /// Идентификатор терминальной сессии
    pub session_id: String,

    pub command: String,

    pub output_summary: Option<String>,

    pub risk_level: Option<RiskLevel>,

    pub source: CommandSource,

    /// Время выполнения (ISO-8601)
    pub executed_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::servers::Entity",
        from = "Column::ServerId",
        to = "super::servers::Column::Id",
        on_delete = "Cascade"
    )]
    Server,
}

impl Related<super::servers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Server.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
