//! PostgreSQL-backed [`ResourceStore`].

use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use catalog_engine::entities::Resource;
use catalog_engine::filter::Filter;
use catalog_engine::store::ResourceStore;
use sqlx_core::executor::Executor;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use time::OffsetDateTime;

use crate::error::map_sqlx_error;
use crate::filter_apply;
use crate::{PgCatalogStore, PgCatalogTransaction};

type ResourceTuple = (
    String,
    String,
    String,
    String,
    Option<String>,
    OffsetDateTime,
    OffsetDateTime,
    Option<OffsetDateTime>,
    Option<String>,
    i64,
);

const COLUMNS: &str = "id, name, resource_type, description, service_name, \
    created_at, updated_at, deleted_at, deleted_by, version";

fn from_tuple(row: ResourceTuple) -> Resource {
    Resource {
        id: row.0,
        name: row.1,
        resource_type: row.2,
        description: row.3,
        service_name: row.4,
        created_at: row.5,
        updated_at: row.6,
        deleted_at: row.7,
        deleted_by: row.8,
        version: row.9,
    }
}

async fn create<'c, E>(executor: E, resource: Resource) -> CatalogResult<Resource>
where
    E: Executor<'c, Database = Postgres>,
{
    query(
        r#"
        INSERT INTO resources (id, name, resource_type, description, service_name,
            created_at, updated_at, deleted_at, deleted_by, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&resource.id)
    .bind(&resource.name)
    .bind(&resource.resource_type)
    .bind(&resource.description)
    .bind(&resource.service_name)
    .bind(resource.created_at)
    .bind(resource.updated_at)
    .bind(resource.deleted_at)
    .bind(&resource.deleted_by)
    .bind(resource.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(resource)
}

async fn get_by_id<'c, E>(executor: E, id: &str) -> CatalogResult<Resource>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM resources WHERE id = $1 AND deleted_at IS NULL");
    let row: Option<ResourceTuple> = query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple)
        .ok_or_else(|| CatalogError::not_found(format!("resource '{id}'")))
}

async fn get_by_name<'c, E>(executor: E, name: &str) -> CatalogResult<Resource>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM resources WHERE name = $1 AND deleted_at IS NULL");
    let row: Option<ResourceTuple> = query_as(&sql)
        .bind(name)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple)
        .ok_or_else(|| CatalogError::not_found(format!("resource '{name}'")))
}

async fn update<'c, E>(executor: E, mut resource: Resource) -> CatalogResult<Resource>
where
    E: Executor<'c, Database = Postgres>,
{
    resource.updated_at = OffsetDateTime::now_utc();
    resource.version += 1;
    let result = query(
        r#"
        UPDATE resources
        SET resource_type = $2, description = $3, service_name = $4, updated_at = $5, version = $6
        WHERE id = $1 AND deleted_at IS NULL
        "#,
    )
    .bind(&resource.id)
    .bind(&resource.resource_type)
    .bind(&resource.description)
    .bind(&resource.service_name)
    .bind(resource.updated_at)
    .bind(resource.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("resource '{}'", resource.id)));
    }
    Ok(resource)
}

async fn delete<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query("DELETE FROM resources WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("resource '{id}'")));
    }
    Ok(())
}

async fn soft_delete<'c, E>(executor: E, id: &str, deleted_by: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query(
        "UPDATE resources SET deleted_at = $2, deleted_by = $3, version = version + 1
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(OffsetDateTime::now_utc())
    .bind(deleted_by)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!("resource '{id}'")));
    }
    Ok(())
}

async fn restore<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query(
        "UPDATE resources SET deleted_at = NULL, deleted_by = NULL, version = version + 1
         WHERE id = $1 AND deleted_at IS NOT NULL",
    )
    .bind(id)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "resource '{id}' is not deleted"
        )));
    }
    Ok(())
}

async fn exists<'c, E>(executor: E, id: &str) -> CatalogResult<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<(i32,)> =
        query_as("SELECT 1 FROM resources WHERE id = $1 AND deleted_at IS NULL")
            .bind(id)
            .fetch_optional(executor)
            .await
            .map_err(map_sqlx_error)?;
    Ok(row.is_some())
}

async fn list<'c, E>(executor: E, limit: i64, offset: i64) -> CatalogResult<Vec<Resource>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM resources WHERE deleted_at IS NULL
         ORDER BY created_at LIMIT $1 OFFSET $2"
    );
    let rows: Vec<ResourceTuple> = query_as(&sql)
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
    let row: (i64,) = query_as("SELECT COUNT(*) FROM resources WHERE deleted_at IS NULL")
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.0)
}

async fn find<'c, E>(executor: E, filter: &Filter) -> CatalogResult<Vec<Resource>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM resources");
    let rows: Vec<ResourceTuple> = query_as(&sql)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    let all: Vec<Resource> = rows.into_iter().map(from_tuple).collect();
    Ok(filter_apply::apply(all, filter, Resource::is_deleted))
}

#[async_trait]
impl ResourceStore for PgCatalogStore {
    async fn create(&self, resource: Resource) -> CatalogResult<Resource> {
        create(&self.pool, resource).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<Resource> {
        get_by_id(&self.pool, id).await
    }
    async fn get_by_name(&self, name: &str) -> CatalogResult<Resource> {
        get_by_name(&self.pool, name).await
    }
    async fn update(&self, resource: Resource) -> CatalogResult<Resource> {
        update(&self.pool, resource).await
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
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Resource>> {
        list(&self.pool, limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        count(&self.pool).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Resource>> {
        find(&self.pool, filter).await
    }
}

#[async_trait]
impl ResourceStore for PgCatalogTransaction {
    async fn create(&self, resource: Resource) -> CatalogResult<Resource> {
        let mut guard = self.tx.lock().await;
        create(self.active(&mut guard)?.as_mut(), resource).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<Resource> {
        let mut guard = self.tx.lock().await;
        get_by_id(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn get_by_name(&self, name: &str) -> CatalogResult<Resource> {
        let mut guard = self.tx.lock().await;
        get_by_name(self.active(&mut guard)?.as_mut(), name).await
    }
    async fn update(&self, resource: Resource) -> CatalogResult<Resource> {
        let mut guard = self.tx.lock().await;
        update(self.active(&mut guard)?.as_mut(), resource).await
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
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<Resource>> {
        let mut guard = self.tx.lock().await;
        list(self.active(&mut guard)?.as_mut(), limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        let mut guard = self.tx.lock().await;
        count(self.active(&mut guard)?.as_mut()).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<Resource>> {
        let mut guard = self.tx.lock().await;
        find(self.active(&mut guard)?.as_mut(), filter).await
    }
}
