use std::collections::{BTreeMap, BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::CatalogStore;
use crate::error::AppError;
use crate::models::{EntityKind, EntityRecord, NewEntity, NewUser, User};

#[derive(Default)]
struct EntityTable {
    next_id: i32,
    rows: BTreeMap<i32, EntityRecord>,
    /// (user_id, entity_id)
    links: BTreeSet<(i32, i32)>,
}

#[derive(Default)]
struct State {
    next_user_id: i32,
    users: BTreeMap<i32, User>,
    entities: HashMap<EntityKind, EntityTable>,
}

impl State {
    fn table(&self, kind: EntityKind) -> Option<&EntityTable> {
        self.entities.get(&kind)
    }

    fn table_mut(&mut self, kind: EntityKind) -> &mut EntityTable {
        self.entities.entry(kind).or_default()
    }
}

/// 内存存储，用于测试和未配置数据库时的本地开发
/// 主键、唯一约束和级联删除规则与数据库一致
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut state = self.state.write().await;
        if state.users.values().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict(format!(
                "User with email {} already exists",
                new_user.email
            )));
        }

        state.next_user_id += 1;
        let user = new_user.into_user(state.next_user_id);
        state.users.insert(user.id, user.clone());
        tracing::debug!("Created user {}", user.id);
        Ok(user)
    }

    async fn get_user(&self, user_id: i32) -> Result<Option<User>, AppError> {
        Ok(self.state.read().await.users.get(&user_id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let state = self.state.read().await;
        Ok(state.users.values().find(|u| u.email == email).cloned())
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        Ok(self.state.read().await.users.values().cloned().collect())
    }

    async fn delete_user(&self, user_id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if state.users.remove(&user_id).is_none() {
            return Ok(false);
        }
        for table in state.entities.values_mut() {
            table.links.retain(|&(uid, _)| uid != user_id);
        }
        Ok(true)
    }

    async fn create_entity(
        &self,
        kind: EntityKind,
        entity: NewEntity,
    ) -> Result<EntityRecord, AppError> {
        let mut state = self.state.write().await;
        let table = state.table_mut(kind);
        table.next_id += 1;
        let record = entity.into_record(table.next_id);
        table.rows.insert(record.id, record.clone());
        tracing::debug!("Created {} {}", kind, record.id);
        Ok(record)
    }

    async fn get_entity(
        &self,
        kind: EntityKind,
        id: i32,
    ) -> Result<Option<EntityRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state.table(kind).and_then(|t| t.rows.get(&id).cloned()))
    }

    async fn list_entities(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .table(kind)
            .map(|t| t.rows.values().cloned().collect())
            .unwrap_or_default())
    }

    async fn update_entity(
        &self,
        kind: EntityKind,
        id: i32,
        entity: NewEntity,
    ) -> Result<Option<EntityRecord>, AppError> {
        let mut state = self.state.write().await;
        let table = state.table_mut(kind);
        match table.rows.get_mut(&id) {
            Some(row) => {
                *row = entity.into_record(id);
                Ok(Some(row.clone()))
            }
            None => Ok(None),
        }
    }

    async fn delete_entity(&self, kind: EntityKind, id: i32) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        let table = state.table_mut(kind);
        if table.rows.remove(&id).is_none() {
            return Ok(false);
        }
        table.links.retain(|&(_, eid)| eid != id);
        Ok(true)
    }

    async fn add_favorite(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        if !state.users.contains_key(&user_id) {
            return Err(AppError::NotFound(format!("User {} not found", user_id)));
        }
        let table = state.table_mut(kind);
        if !table.rows.contains_key(&entity_id) {
            return Err(AppError::NotFound(format!("{} {} not found", kind, entity_id)));
        }
        Ok(table.links.insert((user_id, entity_id)))
    }

    async fn remove_favorite(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<bool, AppError> {
        let mut state = self.state.write().await;
        Ok(state.table_mut(kind).links.remove(&(user_id, entity_id)))
    }

    async fn favorites_of(
        &self,
        user_id: i32,
        kind: EntityKind,
    ) -> Result<Vec<EntityRecord>, AppError> {
        let state = self.state.read().await;
        let Some(table) = state.table(kind) else {
            return Ok(Vec::new());
        };

        Ok(table
            .links
            .range((user_id, i32::MIN)..=(user_id, i32::MAX))
            .filter_map(|(_, entity_id)| table.rows.get(entity_id).cloned())
            .collect())
    }

    async fn favorited_by(&self, kind: EntityKind, entity_id: i32) -> Result<Vec<User>, AppError> {
        let state = self.state.read().await;
        let Some(table) = state.table(kind) else {
            return Ok(Vec::new());
        };

        Ok(table
            .links
            .iter()
            .filter(|&&(_, eid)| eid == entity_id)
            .filter_map(|(user_id, _)| state.users.get(user_id).cloned())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Attributes;
    use serde_json::json;

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.into(),
            password_hash: "hash".into(),
            name: None,
            lastname: None,
        }
    }

    fn new_entity(name: &str) -> NewEntity {
        NewEntity {
            name: name.into(),
            image: None,
            attributes: None,
        }
    }

    #[tokio::test]
    async fn test_ids_unique_per_kind() {
        let store = MemoryStore::new();
        let a = store.create_entity(EntityKind::Character, new_entity("Luke")).await.unwrap();
        let b = store.create_entity(EntityKind::Character, new_entity("Han")).await.unwrap();
        let p = store.create_entity(EntityKind::Planet, new_entity("Tatooine")).await.unwrap();
        assert_ne!(a.id, b.id);
        assert_eq!(p.id, 1);

        store.delete_entity(EntityKind::Character, b.id).await.unwrap();
        let c = store.create_entity(EntityKind::Character, new_entity("Chewie")).await.unwrap();
        assert!(c.id > b.id);
    }

    #[tokio::test]
    async fn test_duplicate_email_conflicts() {
        let store = MemoryStore::new();
        store.create_user(new_user("a@b.com")).await.unwrap();
        let err = store.create_user(new_user("a@b.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_favorites_both_directions() {
        let store = MemoryStore::new();
        let ana = store.create_user(new_user("ana@b.com")).await.unwrap();
        let ben = store.create_user(new_user("ben@b.com")).await.unwrap();
        let xwing = store.create_entity(EntityKind::Vehicle, new_entity("X-wing")).await.unwrap();

        assert!(store.add_favorite(ana.id, EntityKind::Vehicle, xwing.id).await.unwrap());
        assert!(store.add_favorite(ben.id, EntityKind::Vehicle, xwing.id).await.unwrap());
        assert!(!store.add_favorite(ana.id, EntityKind::Vehicle, xwing.id).await.unwrap());

        let favs = store.favorites_of(ana.id, EntityKind::Vehicle).await.unwrap();
        assert_eq!(favs, vec![xwing.clone()]);

        let fans = store.favorited_by(EntityKind::Vehicle, xwing.id).await.unwrap();
        assert_eq!(fans.iter().map(|u| u.id).collect::<Vec<_>>(), vec![ana.id, ben.id]);

        // 同 id 的其他类型实体不受影响
        assert!(store.favorites_of(ana.id, EntityKind::Planet).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_favorite_requires_both_endpoints() {
        let store = MemoryStore::new();
        let ana = store.create_user(new_user("ana@b.com")).await.unwrap();
        let err = store.add_favorite(ana.id, EntityKind::Planet, 42).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));

        let hoth = store.create_entity(EntityKind::Planet, new_entity("Hoth")).await.unwrap();
        let err = store.add_favorite(99, EntityKind::Planet, hoth.id).await.unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_entity_cascades_links() {
        let store = MemoryStore::new();
        let ana = store.create_user(new_user("ana@b.com")).await.unwrap();
        let leia = store.create_entity(EntityKind::Character, new_entity("Leia")).await.unwrap();
        let luke = store.create_entity(EntityKind::Character, new_entity("Luke")).await.unwrap();
        store.add_favorite(ana.id, EntityKind::Character, leia.id).await.unwrap();
        store.add_favorite(ana.id, EntityKind::Character, luke.id).await.unwrap();

        assert!(store.delete_entity(EntityKind::Character, leia.id).await.unwrap());

        let profile = store.load_profile(ana.id).await.unwrap().unwrap();
        assert_eq!(profile.fav_characters, vec![luke]);
        assert!(store.favorited_by(EntityKind::Character, leia.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_user_cascades_links() {
        let store = MemoryStore::new();
        let ana = store.create_user(new_user("ana@b.com")).await.unwrap();
        let naboo = store.create_entity(EntityKind::Planet, new_entity("Naboo")).await.unwrap();
        store.add_favorite(ana.id, EntityKind::Planet, naboo.id).await.unwrap();

        assert!(store.delete_user(ana.id).await.unwrap());
        assert!(store.favorited_by(EntityKind::Planet, naboo.id).await.unwrap().is_empty());
        assert!(store.load_profile(ana.id).await.unwrap().is_none());
        assert!(!store.delete_user(ana.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_update_keeps_id() {
        let store = MemoryStore::new();
        let falcon = store
            .create_entity(EntityKind::Vehicle, new_entity("Falcon"))
            .await
            .unwrap();

        let attributes: Attributes = json!({"class": "freighter"}).as_object().cloned().unwrap();
        let updated = store
            .update_entity(
                EntityKind::Vehicle,
                falcon.id,
                NewEntity {
                    name: "Millennium Falcon".into(),
                    image: None,
                    attributes: Some(attributes.clone()),
                },
            )
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.id, falcon.id);
        assert_eq!(updated.serialize().attributes, Some(attributes));

        assert!(
            store
                .update_entity(EntityKind::Vehicle, 404, new_entity("Ghost"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_profile_matches_links() {
        let store = MemoryStore::new();
        let ana = store.create_user(new_user("ana@b.com")).await.unwrap();
        for name in ["Leia", "Luke", "Han"] {
            let c = store.create_entity(EntityKind::Character, new_entity(name)).await.unwrap();
            store.add_favorite(ana.id, EntityKind::Character, c.id).await.unwrap();
        }
        store.create_entity(EntityKind::Character, new_entity("Vader")).await.unwrap();

        let profile = store.load_profile(ana.id).await.unwrap().unwrap();
        let view = profile.serialize();
        assert_eq!(view.fav_characters.len(), 3);
        for (view, record) in view.fav_characters.iter().zip(&profile.fav_characters) {
            assert_eq!(view, &record.serialize());
        }
    }
}
