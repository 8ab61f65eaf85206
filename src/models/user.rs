use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::entity::{EntityKind, EntityRecord, EntityView};
use crate::error::AppError;
use crate::utils::hash_password;

pub const EMAIL_MAX_LEN: usize = 120;
pub const PERSON_NAME_MAX_LEN: usize = 50;

/// 用户数据库记录，password 列保存的是 bcrypt 哈希
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    pub id: i32,
    pub email: String,
    pub password: String,
    pub name: Option<String>,
    pub lastname: Option<String>,
}

/// 写入存储的新用户，密码已哈希
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub name: Option<String>,
    pub lastname: Option<String>,
}

impl NewUser {
    pub(crate) fn into_user(self, id: i32) -> User {
        User {
            id,
            email: self.email,
            password: self.password_hash,
            name: self.name,
            lastname: self.lastname,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub lastname: Option<String>,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(AppError::Validation("a valid email is required".into()));
        }
        if email.chars().count() > EMAIL_MAX_LEN {
            return Err(AppError::Validation(format!(
                "email must be at most {} characters",
                EMAIL_MAX_LEN
            )));
        }
        if self.password.is_empty() {
            return Err(AppError::Validation("password is required".into()));
        }
        for (field, value) in [("name", &self.name), ("lastname", &self.lastname)] {
            if value
                .as_ref()
                .is_some_and(|v| v.chars().count() > PERSON_NAME_MAX_LEN)
            {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    field, PERSON_NAME_MAX_LEN
                )));
            }
        }
        Ok(())
    }

    /// 校验并哈希密码，明文密码不会进入存储层
    pub fn into_new_user(self, bcrypt_cost: u32) -> Result<NewUser, AppError> {
        self.validate()?;
        let password_hash = hash_password(&self.password, bcrypt_cost)?;

        Ok(NewUser {
            email: self.email.trim().to_string(),
            password_hash,
            name: self.name,
            lastname: self.lastname,
        })
    }
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// 不含收藏列表的用户视图，用于列表和"被谁收藏"查询
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    pub lastname: Option<String>,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            lastname: user.lastname.clone(),
        }
    }
}

/// 已加载收藏的用户
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user: User,
    pub fav_characters: Vec<EntityRecord>,
    pub fav_vehicles: Vec<EntityRecord>,
    pub fav_planets: Vec<EntityRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserView {
    pub id: i32,
    pub email: String,
    pub name: Option<String>,
    pub lastname: Option<String>,
    pub fav_characters: Vec<EntityView>,
    pub fav_vehicles: Vec<EntityView>,
    pub fav_planets: Vec<EntityView>,
}

impl UserProfile {
    pub fn favorites(&self, kind: EntityKind) -> &[EntityRecord] {
        match kind {
            EntityKind::Character => &self.fav_characters,
            EntityKind::Vehicle => &self.fav_vehicles,
            EntityKind::Planet => &self.fav_planets,
        }
    }

    pub fn serialize(&self) -> UserView {
        let views = |kind: EntityKind| -> Vec<EntityView> {
            self.favorites(kind).iter().map(EntityRecord::serialize).collect()
        };

        UserView {
            id: self.user.id,
            email: self.user.email.clone(),
            name: self.user.name.clone(),
            lastname: self.user.lastname.clone(),
            fav_characters: views(EntityKind::Character),
            fav_vehicles: views(EntityKind::Vehicle),
            fav_planets: views(EntityKind::Planet),
        }
    }
}
