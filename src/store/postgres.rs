use async_trait::async_trait;
use sqlx::types::Json;
use sqlx::{Executor, PgPool, postgres::PgPoolOptions};

use super::CatalogStore;
use crate::config::Config;
use crate::error::AppError;
use crate::models::{EntityKind, EntityRecord, NewEntity, NewUser, User};
use crate::schema::{LINK_USER_COLUMN, Schema, USER_TABLE, quote_ident};

const USER_COLUMNS: &str = r#""id", "email", "password", "name", "lastname""#;
const ENTITY_COLUMNS: &str = r#""id", "name", "image", "attributes""#;

/// Postgres 存储，表名来自 EntityKind，均为固定标识符
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn connect(database_url: &str, config: &Config) -> Result<Self, sqlx::Error> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .after_connect(|conn, _meta| {
                Box::pin(async move {
                    conn.execute("SET application_name = 'favorites_backend';")
                        .await?;
                    Ok(())
                })
            })
            .connect(database_url)
            .await?;

        Ok(Self::new(pool))
    }

    /// 按依赖顺序建表，已存在的表跳过
    pub async fn migrate(&self, schema: &Schema) -> Result<(), sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        for statement in schema.create_statements() {
            tracing::debug!("Applying schema: {}", statement);
            sqlx::query(&statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;

        tracing::info!("Schema ready ({} tables)", schema.tables().len());
        Ok(())
    }
}

fn user_table() -> String {
    quote_ident(USER_TABLE)
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn create_user(&self, new_user: NewUser) -> Result<User, AppError> {
        let sql = format!(
            "INSERT INTO {} (email, password, name, lastname) VALUES ($1, $2, $3, $4) RETURNING {}",
            user_table(),
            USER_COLUMNS
        );

        let user = sqlx::query_as::<_, User>(&sql)
            .bind(&new_user.email)
            .bind(&new_user.password_hash)
            .bind(&new_user.name)
            .bind(&new_user.lastname)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                let err = AppError::from(e);
                if err.is_server_error() {
                    tracing::error!("Failed to create user {}: {:?}", new_user.email, err);
                } else {
                    tracing::debug!("Rejected user {}: {}", new_user.email, err);
                }
                err
            })?;

        tracing::info!("Created user: {}", user.id);
        Ok(user)
    }

    async fn get_user(&self, user_id: i32) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE id = $1", USER_COLUMNS, user_table());
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {} FROM {} WHERE email = $1", USER_COLUMNS, user_table());
        let user = sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn list_users(&self) -> Result<Vec<User>, AppError> {
        let sql = format!("SELECT {} FROM {} ORDER BY id", USER_COLUMNS, user_table());
        let users = sqlx::query_as::<_, User>(&sql).fetch_all(&self.pool).await?;

        Ok(users)
    }

    async fn delete_user(&self, user_id: i32) -> Result<bool, AppError> {
        // 关联行由 ON DELETE CASCADE 清理
        let sql = format!("DELETE FROM {} WHERE id = $1", user_table());
        let result = sqlx::query(&sql).bind(user_id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn create_entity(
        &self,
        kind: EntityKind,
        entity: NewEntity,
    ) -> Result<EntityRecord, AppError> {
        let sql = format!(
            "INSERT INTO {} (name, image, attributes) VALUES ($1, $2, $3) RETURNING {}",
            quote_ident(kind.table()),
            ENTITY_COLUMNS
        );

        let record = sqlx::query_as::<_, EntityRecord>(&sql)
            .bind(&entity.name)
            .bind(&entity.image)
            .bind(entity.attributes.map(Json))
            .fetch_one(&self.pool)
            .await?;

        tracing::info!("Created {}: {}", kind, record.id);
        Ok(record)
    }

    async fn get_entity(
        &self,
        kind: EntityKind,
        id: i32,
    ) -> Result<Option<EntityRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} WHERE id = $1",
            ENTITY_COLUMNS,
            quote_ident(kind.table())
        );
        let record = sqlx::query_as::<_, EntityRecord>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn list_entities(&self, kind: EntityKind) -> Result<Vec<EntityRecord>, AppError> {
        let sql = format!(
            "SELECT {} FROM {} ORDER BY id",
            ENTITY_COLUMNS,
            quote_ident(kind.table())
        );
        let records = sqlx::query_as::<_, EntityRecord>(&sql)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn update_entity(
        &self,
        kind: EntityKind,
        id: i32,
        entity: NewEntity,
    ) -> Result<Option<EntityRecord>, AppError> {
        let sql = format!(
            "UPDATE {} SET name = $1, image = $2, attributes = $3 WHERE id = $4 RETURNING {}",
            quote_ident(kind.table()),
            ENTITY_COLUMNS
        );
        let record = sqlx::query_as::<_, EntityRecord>(&sql)
            .bind(&entity.name)
            .bind(&entity.image)
            .bind(entity.attributes.map(Json))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record)
    }

    async fn delete_entity(&self, kind: EntityKind, id: i32) -> Result<bool, AppError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", quote_ident(kind.table()));
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn add_favorite(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<bool, AppError> {
        // 外键不存在时 Postgres 返回 23503，转换为 NotFound
        let sql = format!(
            "INSERT INTO {} ({}, {}) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            quote_ident(kind.link_table()),
            quote_ident(LINK_USER_COLUMN),
            quote_ident(kind.link_column())
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(entity_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_favorite(
        &self,
        user_id: i32,
        kind: EntityKind,
        entity_id: i32,
    ) -> Result<bool, AppError> {
        let sql = format!(
            "DELETE FROM {} WHERE {} = $1 AND {} = $2",
            quote_ident(kind.link_table()),
            quote_ident(LINK_USER_COLUMN),
            quote_ident(kind.link_column())
        );
        let result = sqlx::query(&sql)
            .bind(user_id)
            .bind(entity_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn favorites_of(
        &self,
        user_id: i32,
        kind: EntityKind,
    ) -> Result<Vec<EntityRecord>, AppError> {
        let sql = format!(
            r#"
            SELECT e.id, e.name, e.image, e.attributes
            FROM {entity} e
            JOIN {link} l ON l.{entity_col} = e.id
            WHERE l.{user_col} = $1
            ORDER BY e.id
            "#,
            entity = quote_ident(kind.table()),
            link = quote_ident(kind.link_table()),
            entity_col = quote_ident(kind.link_column()),
            user_col = quote_ident(LINK_USER_COLUMN),
        );
        let records = sqlx::query_as::<_, EntityRecord>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(records)
    }

    async fn favorited_by(&self, kind: EntityKind, entity_id: i32) -> Result<Vec<User>, AppError> {
        let sql = format!(
            r#"
            SELECT u.id, u.email, u.password, u.name, u.lastname
            FROM {user} u
            JOIN {link} l ON l.{user_col} = u.id
            WHERE l.{entity_col} = $1
            ORDER BY u.id
            "#,
            user = user_table(),
            link = quote_ident(kind.link_table()),
            entity_col = quote_ident(kind.link_column()),
            user_col = quote_ident(LINK_USER_COLUMN),
        );
        let users = sqlx::query_as::<_, User>(&sql)
            .bind(entity_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(users)
    }
}
