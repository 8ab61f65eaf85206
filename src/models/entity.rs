use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use sqlx::types::Json;

use crate::error::AppError;

/// 实体的开放属性文档，键顺序按插入保留
pub type Attributes = serde_json::Map<String, serde_json::Value>;

pub const ENTITY_NAME_MAX_LEN: usize = 50;
pub const ENTITY_IMAGE_MAX_LEN: usize = 120;

/// 可被收藏的目录实体类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EntityKind {
    Character,
    Vehicle,
    Planet,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [
        EntityKind::Character,
        EntityKind::Vehicle,
        EntityKind::Planet,
    ];

    /// 实体表名
    pub fn table(self) -> &'static str {
        match self {
            EntityKind::Character => "character",
            EntityKind::Vehicle => "vehicle",
            EntityKind::Planet => "planet",
        }
    }

    /// 收藏关联表名
    pub fn link_table(self) -> &'static str {
        match self {
            EntityKind::Character => "fav_characters",
            EntityKind::Vehicle => "fav_vehicles",
            EntityKind::Planet => "fav_planets",
        }
    }

    /// 关联表中指向实体的列名
    pub fn link_column(self) -> &'static str {
        match self {
            EntityKind::Character => "character_id",
            EntityKind::Vehicle => "vehicle_id",
            EntityKind::Planet => "planet_id",
        }
    }

    /// URL 路径段
    pub fn segment(self) -> &'static str {
        match self {
            EntityKind::Character => "characters",
            EntityKind::Vehicle => "vehicles",
            EntityKind::Planet => "planets",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

impl FromStr for EntityKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::ALL
            .into_iter()
            .find(|kind| kind.segment() == s || kind.table() == s)
            .ok_or_else(|| AppError::NotFound(format!("Unknown catalog kind: {}", s)))
    }
}

/// 角色/载具/星球的数据库记录
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct EntityRecord {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub attributes: Option<Json<Attributes>>,
}

/// 实体对外的序列化视图
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityView {
    pub id: i32,
    pub name: String,
    pub image: Option<String>,
    pub attributes: Option<Attributes>,
}

impl EntityRecord {
    pub fn serialize(&self) -> EntityView {
        EntityView {
            id: self.id,
            name: self.name.clone(),
            image: self.image.clone(),
            attributes: self.attributes.as_ref().map(|Json(doc)| doc.clone()),
        }
    }
}

/// 创建或替换实体时的字段
#[derive(Debug, Clone, Deserialize)]
pub struct NewEntity {
    pub name: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub attributes: Option<Attributes>,
}

impl NewEntity {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::Validation("name is required".into()));
        }
        if self.name.chars().count() > ENTITY_NAME_MAX_LEN {
            return Err(AppError::Validation(format!(
                "name must be at most {} characters",
                ENTITY_NAME_MAX_LEN
            )));
        }
        if let Some(image) = &self.image {
            if image.chars().count() > ENTITY_IMAGE_MAX_LEN {
                return Err(AppError::Validation(format!(
                    "image must be at most {} characters",
                    ENTITY_IMAGE_MAX_LEN
                )));
            }
        }
        Ok(())
    }

    pub(crate) fn into_record(self, id: i32) -> EntityRecord {
        EntityRecord {
            id,
            name: self.name,
            image: self.image,
            attributes: self.attributes.map(Json),
        }
    }
}
