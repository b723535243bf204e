//! PostgreSQL-backed [`RoleStore`].

use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use catalog_engine::entities::{Role, RoleScope};
use catalog_engine::filter::Filter;
use catalog_engine::store::RoleStore;
use sqlx_core::executor::Executor;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use time::OffsetDateTime;

use crate::error::map_sqlx_error;
use crate::filter_apply;
use crate::{PgCatalogStore, PgCatalogTransaction};

type RoleTuple = (
    String,
    String,
    String,
    String,
    Option<String>,
    Option<String>,
    String,
    bool,
    OffsetDateTime,
    OffsetDateTime,
    Option<OffsetDateTime>,
    Option<String>,
    i64,
);

const COLUMNS: &str = "id, name, description, scope, organization_id, parent_id, service_id, \
    is_active, created_at, updated_at, deleted_at, deleted_by, version";

fn scope_to_db(scope: RoleScope) -> &'static str {
    match scope {
        RoleScope::Global => "GLOBAL",
        RoleScope::Org => "ORG",
    }
}

fn scope_from_db(scope: &str) -> CatalogResult<RoleScope> {
    match scope {
        "GLOBAL" => Ok(RoleScope::Global),
        "ORG" => Ok(RoleScope::Org),
        other => Err(CatalogError::internal(format!(
            "unrecognized role scope '{other}' in storage"
        ))),
    }
}

fn from_tuple(row: RoleTuple) -> CatalogResult<Role> {
    Ok(Role {
        id: row.0,
        name: row.1,
        description: row.2,
        scope: scope_from_db(&row.3)?,
        organization_id: row.4,
        parent_id: row.5,
        service_id: row.6,
        is_active: row.7,
        created_at: row.8,
        updated_at: row.9,
        deleted_at: row.10,
        deleted_by: row.11,
        version: row.12,
    })
}

async fn create<'c, E>(executor: E, role: Role) -> CatalogResult<Role>
where
    E: Executor<'c, Database = Postgres>,
{
    query(
        r#"
        INSERT INTO roles (id, name, description, scope, organization_id, parent_id,
            service_id, is_active, created_at, updated_at, deleted_at, deleted_by, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
        "#,
    )
    .bind(&role.id)
    .bind(&role.name)
    .bind(&role.description)
    .bind(scope_to_db(role.scope))
    .bind(&role.organization_id)
    .bind(&role.parent_id)
    .bind(&role.service_id)
    .bind(role.is_active)
    .bind(role.created_at)
    .bind(role.updated_at)
    .bind(role.deleted_at)
    .bind(&role.deleted_by)
    .bind(role.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(role)
}

async fn get_by_id<'c, E>(executor: E, id: &str) -> CatalogResult<Role>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM roles WHERE id = $1 AND deleted_at IS NULL");
    let row: Option<RoleTuple> = query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    match row {
        Some(row) => from_tuple(row),
        None => Err(CatalogError::not_found(format!("role '{id}'"))),
    }
}

async fn get_by_service_and_name<'c, E>(
    executor: E,
    service_id: &str,
    name: &str,
) -> CatalogResult<Role>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM roles
         WHERE service_id = $1 AND name = $2 AND deleted_at IS NULL"
    );
    let row: Option<RoleTuple> = query_as(&sql)
        .bind(service_id)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    match row {
        Some(row) => from_tuple(row),
        None => Err(CatalogError::not_found(format!(
            "role '{name}' for service '{service_id}'"
        ))),
    }
}

async fn update<'c, E>(executor: E, mut role: Role) -> CatalogResult<Role>
where
    E: Executor<'c, Database = Postgres>,
{
    role.updated_at = OffsetDateTime::now_utc();
    role.version += 1;
    let result = query(
        r#"
        UPDATE roles
        SET description = $2, scope = $3, organization_id = $4, parent_id = $5,
            is_active = $6, updated_at = $7, version = $8
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(&role.id)
    .bind(&role.description)
    .bind(scope_to_db(role.scope))
    .bind(&role.organization_id)
    .bind(&role.parent_id)
    .bind(role.is_active)
    .bind(role.updated_at)
    .bind(role.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("role '{}'", role.id)));
    }
    Ok(role)
}

async fn delete<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query("DELETE FROM roles WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("role '{id}'")));
    }
    Ok(())
}

async fn soft_delete<'c, E>(executor: E, id: &str, deleted_by: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query(
        "UPDATE roles SET deleted_at = $2, deleted_by = $3, version = version + 1
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(OffsetDateTime::now_utc())
    .bind(deleted_by)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("role '{id}'")));
    }
    Ok(())
}

async fn restore<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query(
        "UPDATE roles SET deleted_at = NULL, deleted_by = NULL, version = version + 1
         WHERE id = $1 AND deleted_at IS NOT NULL",
    )
    .bind(id)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("role '{id}' is not deleted")));
    }
    Ok(())
}

async fn exists<'c, E>(executor: E, id: &str) -> CatalogResult<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<(i32,)> = query_as("SELECT 1 FROM roles WHERE id = $1 AND deleted_at IS NULL")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.is_some())
}

async fn list<'c, E>(executor: E, limit: i64, offset: i64) -> CatalogResult<Vec<Role>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM roles WHERE deleted_at IS NULL
         ORDER BY created_at LIMIT $1 OFFSET $2"
    );
    let rows: Vec<RoleTuple> = query_as(&sql)
        .bind(limit)
        .bind(offset)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    rows.into_iter().map(from_tuple).collect()
}

async fn count<'c, E>(executor: E) -> CatalogResult<i64>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: (i64,) = query_as("SELECT COUNT(*) FROM roles WHERE deleted_at IS NULL")
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.0)
}

async fn find<'c, E>(executor: E, filter: &Filter) -> CatalogResult<Vec<Role>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM roles");
    let rows: Vec<RoleTuple> = query_as(&sql)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    let all: Vec<Role> = rows
        .into_iter()
        .map(from_tuple)
        .collect::<CatalogResult<_>>()?;
    Ok(filter_apply::apply(all, filter, Role::is_deleted))
}

async fn list_by_service<'c, E>(executor: E, service_id: &str) -> CatalogResult<Vec<Role>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM roles WHERE service_id = $1 AND deleted_at IS NULL
         ORDER BY created_at"
    );
    let rows: Vec<RoleTuple> = query_as(&sql)
        .bind(service_id)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    rows.into_iter().map(from_tuple).collect()
}

#[async_trait]
impl RoleStore for PgCatalogStore {
    async fn create(&self, role: Role) -> CatalogResult<Role> {
        create(&self.pool, role).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<Role> {
        get_by_id(&self.pool, id).await
    }
    async fn get_by_service_and_name(&self, service_id: &str, name: &str) -> CatalogResult<Role> {
        get_by_service_and_name(&self.pool, service_id, name).await
    }
    async fn update(&self, role: Role) -> CatalogResult<Role> {
        update(&self.pool, role).await
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
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Role>> {
        list(&self.pool, limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        count(&self.pool).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Role>> {
        find(&self.pool, filter).await
    }
    async fn list_by_service(&self, service_id: &str) -> CatalogResult<Vec<Role>> {
        list_by_service(&self.pool, service_id).await
    }
}

#[async_trait]
impl RoleStore for PgCatalogTransaction {
    async fn create(&self, role: Role) -> CatalogResult<Role> {
        let mut guard = self.tx.lock().await;
        create(self.active(&mut guard)?.as_mut(), role).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<Role> {
        let mut guard = self.tx.lock().await;
        get_by_id(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn get_by_service_and_name(&self, service_id: &str, name: &str) -> CatalogResult<Role> {
        let mut guard = self.tx.lock().await;
        get_by_service_and_name(self.active(&mut guard)?.as_mut(), service_id, name).await
    }
    async fn update(&self, role: Role) -> CatalogResult<Role> {
        let mut guard = self.tx.lock().await;
        update(self.active(&mut guard)?.as_mut(), role).await
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
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Role>> {
        let mut guard = self.tx.lock().await;
        list(self.active(&mut guard)?.as_mut(), limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        let mut guard = self.tx.lock().await;
        count(self.active(&mut guard)?.as_mut()).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Role>> {
        let mut guard = self.tx.lock().await;
        find(self.active(&mut guard)?.as_mut(), filter).await
    }
    async fn list_by_service(&self, service_id: &str) -> CatalogResult<Vec<Role>> {
        let mut guard = self.tx.lock().await;
        list_by_service(self.active(&mut guard)?.as_mut(), service_id).await
    }
}
