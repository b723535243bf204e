//! PostgreSQL-backed [`RolePermissionStore`].

use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use catalog_engine::entities::RolePermission;
use catalog_engine::filter::Filter;
use catalog_engine::store::RolePermissionStore;
use sqlx_core::executor::Executor;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use time::OffsetDateTime;

use crate::error::map_sqlx_error;
use crate::filter_apply;
use crate::{PgCatalogStore, PgCatalogTransaction};

type RolePermissionTuple = (
    String,
    String,
    String,
    bool,
    OffsetDateTime,
    OffsetDateTime,
    Option<OffsetDateTime>,
    Option<String>,
    i64,
);

const COLUMNS: &str =
    "id, role_id, permission_id, is_active, created_at, updated_at, deleted_at, deleted_by, version";

fn from_tuple(row: RolePermissionTuple) -> RolePermission {
    RolePermission {
        id: row.0,
        role_id: row.1,
        permission_id: row.2,
        is_active: row.3,
        created_at: row.4,
        updated_at: row.5,
        deleted_at: row.6,
        deleted_by: row.7,
        version: row.8,
    }
}

async fn create<'c, E>(executor: E, link: RolePermission) -> CatalogResult<RolePermission>
where
    E: Executor<'c, Database = Postgres>,
{
    query(
        r#"
        INSERT INTO role_permissions (id, role_id, permission_id, is_active,
            created_at, updated_at, deleted_at, deleted_by, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(&link.id)
    .bind(&link.role_id)
    .bind(&link.permission_id)
    .bind(link.is_active)
    .bind(link.created_at)
    .bind(link.updated_at)
    .bind(link.deleted_at)
    .bind(&link.deleted_by)
    .bind(link.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(link)
}

async fn get_by_id<'c, E>(executor: E, id: &str) -> CatalogResult<RolePermission>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM role_permissions WHERE id = $1");
    let row: Option<RolePermissionTuple> = query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple)
        .ok_or_else(|| CatalogError::not_found(format!("role-permission link '{id}'")))
}

async fn update<'c, E>(executor: E, mut link: RolePermission) -> CatalogResult<RolePermission>
where
    E: Executor<'c, Database = Postgres>,
{
    link.updated_at = OffsetDateTime::now_utc();
    link.version += 1;
    let result = query(
        r#"
        UPDATE role_permissions
        SET is_active = $2, updated_at = $3, deleted_at = $4, deleted_by = $5, version = $6
        WHERE id = $1
        "#,
    )
    .bind(&link.id)
    .bind(link.is_active)
    .bind(link.updated_at)
    .bind(link.deleted_at)
    .bind(&link.deleted_by)
    .bind(link.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "role-permission link '{}'",
            link.id
        )));
    }
    Ok(link)
}

async fn delete<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query("DELETE FROM role_permissions WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "role-permission link '{id}'"
        )));
    }
    Ok(())
}

async fn exists<'c, E>(executor: E, id: &str) -> CatalogResult<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<(i32,)> = query_as("SELECT 1 FROM role_permissions WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.is_some())
}

async fn list<'c, E>(executor: E, limit: i64, offset: i64) -> CatalogResult<Vec<RolePermission>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM role_permissions ORDER BY created_at LIMIT $1 OFFSET $2");
    let rows: Vec<RolePermissionTuple> = query_as(&sql)
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
    let row: (i64,) = query_as("SELECT COUNT(*) FROM role_permissions")
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.0)
}

async fn find<'c, E>(executor: E, filter: &Filter) -> CatalogResult<Vec<RolePermission>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM role_permissions");
    let rows: Vec<RolePermissionTuple> = query_as(&sql)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    let all: Vec<RolePermission> = rows.into_iter().map(from_tuple).collect();
    Ok(filter_apply::apply(all, filter, |link| link.deleted_at.is_some()))
}

async fn list_by_role<'c, E>(executor: E, role_id: &str) -> CatalogResult<Vec<RolePermission>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM role_permissions WHERE role_id = $1 AND deleted_at IS NULL
         ORDER BY created_at"
    );
    let rows: Vec<RolePermissionTuple> = query_as(&sql)
        .bind(role_id)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(from_tuple).collect())
}

async fn list_by_permission<'c, E>(
    executor: E,
    permission_id: &str,
) -> CatalogResult<Vec<RolePermission>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM role_permissions WHERE permission_id = $1 AND deleted_at IS NULL
         ORDER BY created_at"
    );
    let rows: Vec<RolePermissionTuple> = query_as(&sql)
        .bind(permission_id)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(from_tuple).collect())
}

#[async_trait]
impl RolePermissionStore for PgCatalogStore {
    async fn create(&self, link: RolePermission) -> CatalogResult<RolePermission> {
        create(&self.pool, link).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<RolePermission> {
        get_by_id(&self.pool, id).await
    }
    async fn update(&self, link: RolePermission) -> CatalogResult<RolePermission> {
        update(&self.pool, link).await
    }
    async fn delete(&self, id: &str) -> CatalogResult<()> {
        delete(&self.pool, id).await
    }
    async fn exists(&self, id: &str) -> CatalogResult<bool> {
        exists(&self.pool, id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<RolePermission>> {
        list(&self.pool, limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        count(&self.pool).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<RolePermission>> {
        find(&self.pool, filter).await
    }
    async fn list_by_role(&self, role_id: &str) -> CatalogResult<Vec<RolePermission>> {
        list_by_role(&self.pool, role_id).await
    }
    async fn list_by_permission(&self, permission_id: &str) -> CatalogResult<Vec<RolePermission>> {
        list_by_permission(&self.pool, permission_id).await
    }
}

#[async_trait]
impl RolePermissionStore for PgCatalogTransaction {
    async fn create(&self, link: RolePermission) -> CatalogResult<RolePermission> {
        let mut guard = self.tx.lock().await;
        create(self.active(&mut guard)?.as_mut(), link).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<RolePermission> {
        let mut guard = self.tx.lock().await;
        get_by_id(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn update(&self, link: RolePermission) -> CatalogResult<RolePermission> {
        let mut guard = self.tx.lock().await;
        update(self.active(&mut guard)?.as_mut(), link).await
    }
    async fn delete(&self, id: &str) -> CatalogResult<()> {
        let mut guard = self.tx.lock().await;
        delete(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn exists(&self, id: &str) -> CatalogResult<bool> {
        let mut guard = self.tx.lock().await;
        exists(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<RolePermission>> {
        let mut guard = self.tx.lock().await;
        list(self.active(&mut guard)?.as_mut(), limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        let mut guard = self.tx.lock().await;
        count(self.active(&mut guard)?.as_mut()).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<RolePermission>> {
        let mut guard = self.tx.lock().await;
        find(self.active(&mut guard)?.as_mut(), filter).await
    }
    async fn list_by_role(&self, role_id: &str) -> CatalogResult<Vec<RolePermission>> {
        let mut guard = self.tx.lock().await;
        list_by_role(self.active(&mut guard)?.as_mut(), role_id).await
    }
    async fn list_by_permission(&self, permission_id: &str) -> CatalogResult<Vec<RolePermission>> {
        let mut guard = self.tx.lock().await;
        list_by_permission(self.active(&mut guard)?.as_mut(), permission_id).await
    }
}
