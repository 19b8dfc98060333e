//! Строковые перечисления, хранящиеся в колонках TEXT.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Способ аутентификации SSH.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum AuthType {
    #[sea_orm(string_value = "key")]
    Key,
    #[sea_orm(string_value = "password")]
    Password,
}

/// Уровень риска команды.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    #[sea_orm(string_value = "low")]
    Low,
    #[sea_orm(string_value = "medium")]
    Medium,
    #[sea_orm(string_value = "high")]
    High,
}

/// Источник команды: введена вручную или предложена ассистентом.
#[derive(Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum CommandSource {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "ai")]
    Ai,
}
