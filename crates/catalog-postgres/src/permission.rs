//! PostgreSQL-backed [`PermissionStore`].

use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use catalog_engine::entities::Permission;
use catalog_engine::filter::Filter;
use catalog_engine::store::PermissionStore;
use sqlx_core::executor::Executor;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use time::OffsetDateTime;

use crate::error::map_sqlx_error;
use crate::filter_apply;
use crate::{PgCatalogStore, PgCatalogTransaction};

type PermissionTuple = (
    String,
    String,
    String,
    String,
    String,
    OffsetDateTime,
    OffsetDateTime,
    Option<OffsetDateTime>,
    Option<String>,
    i64,
);

const COLUMNS: &str = "id, name, resource_id, action_id, description, \
    created_at, updated_at, deleted_at, deleted_by, version";

fn from_tuple(row: PermissionTuple) -> Permission {
    Permission {
        id: row.0,
        name: row.1,
        resource_id: row.2,
        action_id: row.3,
        description: row.4,
        created_at: row.5,
        updated_at: row.6,
        deleted_at: row.7,
        deleted_by: row.8,
        version: row.9,
    }
}

async fn create<'c, E>(executor: E, permission: Permission) -> CatalogResult<Permission>
where
    E: Executor<'c, Database = Postgres>,
{
    query(
        r#"
        INSERT INTO permissions (id, name, resource_id, action_id, description,
            created_at, updated_at, deleted_at, deleted_by, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&permission.id)
    .bind(&permission.name)
    .bind(&permission.resource_id)
    .bind(&permission.action_id)
    .bind(&permission.description)
    .bind(permission.created_at)
    .bind(permission.updated_at)
    .bind(permission.deleted_at)
    .bind(&permission.deleted_by)
    .bind(permission.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(permission)
}

async fn get_by_id<'c, E>(executor: E, id: &str) -> CatalogResult<Permission>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM permissions WHERE id = $1 AND deleted_at IS NULL");
    let row: Option<PermissionTuple> = query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple)
        .ok_or_else(|| CatalogError::not_found(format!("permission '{id}'")))
}

async fn get_by_name<'c, E>(executor: E, name: &str) -> CatalogResult<Permission>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM permissions WHERE name = $1 AND deleted_at IS NULL");
    let row: Option<PermissionTuple> = query_as(&sql)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple)
        .ok_or_else(|| CatalogError::not_found(format!("permission '{name}'")))
}

async fn get_by_resource_and_action<'c, E>(
    executor: E,
    resource_id: &str,
    action_id: &str,
) -> CatalogResult<Permission>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM permissions
         WHERE resource_id = $1 AND action_id = $2 AND deleted_at IS NULL"
    );
    let row: Option<PermissionTuple> = query_as(&sql)
        .bind(resource_id)
        .bind(action_id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple).ok_or_else(|| {
        CatalogError::not_found(format!(
            "permission for resource '{resource_id}' and action '{action_id}'"
        ))
    })
}

async fn update<'c, E>(executor: E, mut permission: Permission) -> CatalogResult<Permission>
where
    E: Executor<'c, Database = Postgres>,
{
    permission.updated_at = OffsetDateTime::now_utc();
    permission.version += 1;
    let result = query(
        r#"
        UPDATE permissions
        SET description = $2, updated_at = $3, version = $4
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(&permission.id)
    .bind(&permission.description)
    .bind(permission.updated_at)
    .bind(permission.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "permission '{}'",
            permission.id
        )));
    }
    Ok(permission)
}

async fn delete<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query("DELETE FROM permissions WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("permission '{id}'")));
    }
    Ok(())
}

async fn soft_delete<'c, E>(executor: E, id: &str, deleted_by: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query(
        "UPDATE permissions SET deleted_at = $2, deleted_by = $3, version = version + 1
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(OffsetDateTime::now_utc())
    .bind(deleted_by)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("permission '{id}'")));
    }
    Ok(())
}

async fn restore<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query(
        "UPDATE permissions SET deleted_at = NULL, deleted_by = NULL, version = version + 1
         WHERE id = $1 AND deleted_at IS NOT NULL",
    )
    .bind(id)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "permission '{id}' is not deleted"
        )));
    }
    Ok(())
}

async fn exists<'c, E>(executor: E, id: &str) -> CatalogResult<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<(i32,)> =
        query_as("SELECT 1 FROM permissions WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(map_sqlx_error)?;
    Ok(row.is_some())
}

async fn list<'c, E>(executor: E, limit: i64, offset: i64) -> CatalogResult<Vec<Permission>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM permissions WHERE deleted_at IS NULL
         ORDER BY created_at LIMIT $1 OFFSET $2"
    );
    let rows: Vec<PermissionTuple> = query_as(&sql)
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
    let row: (i64,) = query_as("SELECT COUNT(*) FROM permissions WHERE deleted_at IS NULL")
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.0)
}

async fn find<'c, E>(executor: E, filter: &Filter) -> CatalogResult<Vec<Permission>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM permissions");
    let rows: Vec<PermissionTuple> = query_as(&sql)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    let all: Vec<Permission> = rows.into_iter().map(from_tuple).collect();
    Ok(filter_apply::apply(all, filter, Permission::is_deleted))
}

#[async_trait]
impl PermissionStore for PgCatalogStore {
    async fn create(&self, permission: Permission) -> CatalogResult<Permission> {
        create(&self.pool, permission).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<Permission> {
        get_by_id(&self.pool, id).await
    }
    async fn get_by_name(&self, name: &str) -> CatalogResult<Permission> {
        get_by_name(&self.pool, name).await
    }
    async fn get_by_resource_and_action(
        &self,
        resource_id: &str,
        action_id: &str,
    ) -> CatalogResult<Permission> {
        get_by_resource_and_action(&self.pool, resource_id, action_id).await
    }
    async fn update(&self, permission: Permission) -> CatalogResult<Permission> {
        update(&self.pool, permission).await
    }
    async fn delete(&self, id: &str) -> CatalogResult<()> {
        delete(&self.pool, id).await
    }
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()> {
        soft_delete(&self.pool, id, deleted_by).await
    }
    async fn restore(&self, id: &str) -> CatalogResult<()> {
        restore(&self.pool, id).await
    }
    async fn exists(&self, id: &str) -> CatalogResult<bool> {
        exists(&self.pool, id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Permission>> {
        list(&self.pool, limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        count(&self.pool).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Permission>> {
        find(&self.pool, filter).await
    }
}

#[async_trait]
impl PermissionStore for PgCatalogTransaction {
    async fn create(&self, permission: Permission) -> CatalogResult<Permission> {
        let mut guard = self.tx.lock().await;
        create(self.active(&mut guard)?.as_mut(), permission).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<Permission> {
        let mut guard = self.tx.lock().await;
        get_by_id(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn get_by_name(&self, name: &str) -> CatalogResult<Permission> {
        let mut guard = self.tx.lock().await;
        get_by_name(self.active(&mut guard)?.as_mut(), name).await
    }
    async fn get_by_resource_and_action(
        &self,
        resource_id: &str,
        action_id: &str,
    ) -> CatalogResult<Permission> {
        let mut guard = self.tx.lock().await;
        get_by_resource_and_action(self.active(&mut guard)?.as_mut(), resource_id, action_id)
            .await
    }
    async fn update(&self, permission: Permission) -> CatalogResult<Permission> {
        let mut guard = self.tx.lock().await;
        update(self.active(&mut guard)?.as_mut(), permission).await
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
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Permission>> {
        let mut guard = self.tx.lock().await;
        list(self.active(&mut guard)?.as_mut(), limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        let mut guard = self.tx.lock().await;
        count(self.active(&mut guard)?.as_mut()).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Permission>> {
        let mut guard = self.tx.lock().await;
        find(self.active(&mut guard)?.as_mut(), filter).await
    }
}
