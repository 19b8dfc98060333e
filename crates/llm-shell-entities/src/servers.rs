//! Entity для таблицы servers.

use crate::enums::AuthType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "servers")]
pub struct Model {
    /// UUID первичного ключа
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,

    /// Группа (NULL после удаления группы)
    pub group_id: Option<String>,

    /// Отображаемое имя
    pub label: String,

    pub host: String,

    pub port: i32,

    pub username: String,

    pub auth_type: AuthType,

    /// Ключевая пара (NULL после удаления ключа)
    pub key_id: Option<String>,

    pub proxy_jump: Option<String>,

    /// Команда, выполняемая после подключения
    pub startup_cmd: Option<String>,

    pub notes: Option<String>,

    /// Цвет метки `#RRGGBB`
    pub color: Option<String>,

    pub sort_order: i32,

    /// Время последнего подключения (ISO-8601)
    pub last_connected_at: Option<String>,

    /// Время создания (ISO-8601)
    pub created_at: String,

    /// Время последнего изменения (ISO-8601)
    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::server_groups::Entity",
        from = "Column::GroupId",
        to = "super::server_groups::Column::Id",
        on_delete = "SetNull"
    )]
    ServerGroup,

    #[sea_orm(
        belongs_to = "super::keypairs::Entity",
        from = "Column::KeyId",
        to = "super::keypairs::Column::Id",
        on_delete = "SetNull"
    )]
    KeyPair,

    #[sea_orm(has_many = "super::command_logs::Entity")]
    CommandLogs,
}

impl Related<super::server_groups::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServerGroup.def()
    }
}

impl Related<super::keypairs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::KeyPair.def()
    }
}

impl Related<super::command_logs::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::CommandLogs.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
