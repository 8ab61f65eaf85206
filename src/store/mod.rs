// 存储层
// 收藏关联只存一份
// "用户的收藏"和"收藏了某实体的用户"是同一关联集合的两个查询方向

mod memory;
mod postgres;

use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{EntityKind, EntityRecord, NewEntity, NewUser, User, UserProfile};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError>;
    async fn get_user(&self, user_id: i32) -> Result<Option<User>, AppError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError>;
    async fn list_users(&self) -> Result<Vec<User>, AppError>;
    /// 同时删除该用户的全部收藏关联
    async fn delete_user(&self, user_id: i32) -> Result<bool, AppError>;

    async fn create_entity(
        &self,
        kind: EntityKind,
        entity: NewEntity,
    ) -> Result<EntityRecord, AppError>;
    async fn get_entity(&self, kind: EntityKind, id: i32) -> Result<Option<EntityRecord>, AppError>;
    async fn list_entities(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, AppError>;
    /// 替换 name/image/attributes，id 不变
    async fn update_entity(
        &self,
        kind: EntityKind,
        id: i32,
        entity: NewEntity,
    ) -> Result<Option<EntityRecord>, AppError>;
    /// 同时删除指向该实体的收藏关联
    async fn delete_entity(&self, kind: EntityKind, id: i32) -> Result<bool, AppError>;

    /// 返回是否新建了关联；任一端不存在时返回 NotFound
    async fn add_favorite(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<bool, AppError>;
    async fn remove_favorite(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<bool, AppError>;
    /// 按实体 id 排序
    async fn favorites_of(
        &self,
        user_id: i32,
        kind: EntityKind,
    ) -> Result<Vec<EntityRecord>, AppError>;
    /// 按用户 id 排序
    async fn favorited_by(&self, kind: EntityKind, entity_id: i32) -> Result<Vec<User>, AppError>;

    async fn load_profile(&self, user_id: i32) -> Result<Option<UserProfile>, AppError> {
        let Some(user) = self.get_user(user_id).await? else {
            return Ok(None);
        };

        Ok(Some(UserProfile {
            fav_characters: self.favorites_of(user.id, EntityKind::Character).await?,
            fav_vehicles: self.favorites_of(user.id, EntityKind::Vehicle).await?,
            fav_planets: self.favorites_of(user.id, EntityKind::Planet).await?,
            user,
        }))
    }
}
