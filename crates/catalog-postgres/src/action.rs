//! PostgreSQL-backed [`ActionStore`].

use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use catalog_engine::entities::Action;
use catalog_engine::filter::Filter;
use catalog_engine::store::ActionStore;
use sqlx_core::executor::Executor;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use time::OffsetDateTime;

use crate::error::map_sqlx_error;
use crate::filter_apply;
use crate::{PgCatalogStore, PgCatalogTransaction};

type ActionTuple = (
    String,
    String,
    String,
    String,
    bool,
    Option<String>,
    OffsetDateTime,
    OffsetDateTime,
    Option<OffsetDateTime>,
    Option<String>,
    i64,
);

const COLUMNS: &str = "id, name, description, category, is_static, service_id, \
    created_at, updated_at, deleted_at, deleted_by, version";

fn from_tuple(row: ActionTuple) -> Action {
    Action {
        id: row.0,
        name: row.1,
        description: row.2,
        category: row.3,
        is_static: row.4,
        service_id: row.5,
        created_at: row.6,
        updated_at: row.7,
        deleted_at: row.8,
        deleted_by: row.9,
        version: row.10,
    }
}

async fn create<'c, E>(executor: E, action: Action) -> CatalogResult<Action>
where
    E: Executor<'c, Database = Postgres>,
{
    query(
        r#"
        INSERT INTO actions (id, name, description, category, is_static, service_id,
            created_at, updated_at, deleted_at, deleted_by, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&action.id)
    .bind(&action.name)
    .bind(&action.description)
    .bind(&action.category)
    .bind(action.is_static)
    .bind(&action.service_id)
    .bind(action.created_at)
    .bind(action.updated_at)
    .bind(action.deleted_at)
    .bind(&action.deleted_by)
    .bind(action.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(action)
}

async fn get_by_id<'c, E>(executor: E, id: &str) -> CatalogResult<Action>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM actions WHERE id = $1 AND deleted_at IS NULL");
    let row: Option<ActionTuple> = query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple)
        .ok_or_else(|| CatalogError::not_found(format!("action '{id}'")))
}

async fn get_by_name<'c, E>(executor: E, name: &str) -> CatalogResult<Action>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM actions WHERE name = $1 AND deleted_at IS NULL");
    let row: Option<ActionTuple> = query_as(&sql)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple)
        .ok_or_else(|| CatalogError::not_found(format!("action '{name}'")))
}

async fn update<'c, E>(executor: E, mut action: Action) -> CatalogResult<Action>
where
    E: Executor<'c, Database = Postgres>,
{
    action.updated_at = OffsetDateTime::now_utc();
    action.version += 1;
    let result = query(
        r#"
        UPDATE actions
        SET description = $2, category = $3, is_static = $4, service_id = $5,
            updated_at = $6, version = $7
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(&action.id)
    .bind(&action.description)
    .bind(&action.category)
    .bind(action.is_static)
    .bind(&action.service_id)
    .bind(action.updated_at)
    .bind(action.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("action '{}'", action.id)));
    }
    Ok(action)
}

async fn reject_if_static<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let is_static: Option<(bool,)> = query_as("SELECT is_static FROM actions WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    match is_static {
        Some((true,)) => Err(CatalogError::failed_precondition(format!(
            "action '{id}' is static and cannot be deleted"
        ))),
        Some((false,)) => Ok(()),
        None => Err(CatalogError::not_found(format!("action '{id}'"))),
    }
}

async fn delete<'c, E>(executor: &mut E, id: &str) -> CatalogResult<()>
where
    for<'a> &'a mut E: Executor<'a, Database = Postgres>,
{
    reject_if_static(&mut *executor, id).await?;
    query("DELETE FROM actions WHERE id = $1")
        .bind(id)
        .execute(&mut *executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(())
}

async fn soft_delete<'c, E>(executor: &mut E, id: &str, deleted_by: &str) -> CatalogResult<()>
where
    for<'a> &'a mut E: Executor<'a, Database = Postgres>,
{
    reject_if_static(&mut *executor, id).await?;
    let result = query(
        "UPDATE actions SET deleted_at = $2, deleted_by = $3, version = version + 1
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(OffsetDateTime::now_utc())
    .bind(deleted_by)
    .execute(&mut *executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("action '{id}'")));
    }
    Ok(())
}

async fn restore<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query(
        "UPDATE actions SET deleted_at = NULL, deleted_by = NULL, version = version + 1
         WHERE id = $1 AND deleted_at IS NOT NULL",
    )
    .bind(id)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "action '{id}' is not deleted"
        )));
    }
    Ok(())
}

async fn exists<'c, E>(executor: E, id: &str) -> CatalogResult<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<(i32,)> =
        query_as("SELECT 1 FROM actions WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(map_sqlx_error)?;
    Ok(row.is_some())
}

async fn list<'c, E>(executor: E, limit: i64, offset: i64) -> CatalogResult<Vec<Action>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM actions WHERE deleted_at IS NULL
         ORDER BY created_at LIMIT $1 OFFSET $2"
    );
    let rows: Vec<ActionTuple> = query_as(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(from_tuple).collect())
}

async fn count<'c, E>(executor: E) -> CatalogResult<i64>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: (i64,) = query_as("SELECT COUNT(*) FROM actions WHERE deleted_at IS NULL")
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.0)
}

async fn find<'c, E>(executor: E, filter: &Filter) -> CatalogResult<Vec<Action>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM actions");
    let rows: Vec<ActionTuple> = query_as(&sql)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    let all: Vec<Action> = rows.into_iter().map(from_tuple).collect();
    Ok(filter_apply::apply(all, filter, Action::is_deleted))
}

#[async_trait]
impl ActionStore for PgCatalogStore {
    async fn create(&self, action: Action) -> CatalogResult<Action> {
        create(&self.pool, action).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<Action> {
        get_by_id(&self.pool, id).await
    }
    async fn get_by_name(&self, name: &str) -> CatalogResult<Action> {
        get_by_name(&self.pool, name).await
    }
    async fn update(&self, action: Action) -> CatalogResult<Action> {
        update(&self.pool, action).await
    }
    async fn delete(&self, id: &str) -> CatalogResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        delete(&mut *conn, id).await
    }
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()> {
        let mut conn = self.pool.acquire().await.map_err(map_sqlx_error)?;
        soft_delete(&mut *conn, id, deleted_by).await
    }
    async fn restore(&self, id: &str) -> CatalogResult<()> {
        restore(&self.pool, id).await
    }
    async fn exists(&self, id: &str) -> CatalogResult<bool> {
        exists(&self.pool, id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Action>> {
        list(&self.pool, limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        count(&self.pool).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Action>> {
        find(&self.pool, filter).await
    }
}

#[async_trait]
impl ActionStore for PgCatalogTransaction {
    async fn create(&self, action: Action) -> CatalogResult<Action> {
        let mut guard = self.tx.lock().await;
        create(self.active(&mut guard)?.as_mut(), action).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<Action> {
        let mut guard = self.tx.lock().await;
        get_by_id(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn get_by_name(&self, name: &str) -> CatalogResult<Action> {
        let mut guard = self.tx.lock().await;
        get_by_name(self.active(&mut guard)?.as_mut(), name).await
    }
    async fn update(&self, action: Action) -> CatalogResult<Action> {
        let mut guard = self.tx.lock().await;
        update(self.active(&mut guard)?.as_mut(), action).await
    }
    async fn delete(&self, id: &str) -> CatalogResult<()> {
        let mut guard = self.tx.lock().await;
        delete(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()> {
        let mut guard = self.tx.lock().await;
        soft_delete(self.active(&mut guard)?.as_mut(), id, deleted_by).await
    }
    async fn restore(&self, id: &str) -> CatalogResult<()> {
        let mut guard = self.tx.lock().await;
        restore(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn exists(&self, id: &str) -> CatalogResult<bool> {
        let mut guard = self.tx.lock().await;
        exists(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Action>> {
        let mut guard = self.tx.lock().await;
        list(self.active(&mut guard)?.as_mut(), limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        let mut guard = self.tx.lock().await;
        count(self.active(&mut guard)?.as_mut()).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Action>> {
        let mut guard = self.tx.lock().await;
        find(self.active(&mut guard)?.as_mut(), filter).await
    }
}
