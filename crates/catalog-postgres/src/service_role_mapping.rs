//! PostgreSQL-backed [`ServiceRoleMappingStore`].

use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use catalog_engine::entities::ServiceRoleMapping;
use catalog_engine::filter::Filter;
use catalog_engine::store::ServiceRoleMappingStore;
use sqlx_core::executor::Executor;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use time::OffsetDateTime;

use crate::error::map_sqlx_error;
use crate::filter_apply;
use crate::{PgCatalogStore, PgCatalogTransaction};

type MappingTuple = (
    String,
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

const COLUMNS: &str = "id, service_id, service_name, role_id, is_active, \
    created_at, updated_at, deleted_at, deleted_by, version";

fn from_tuple(row: MappingTuple) -> ServiceRoleMapping {
    ServiceRoleMapping {
        id: row.0,
        service_id: row.1,
        service_name: row.2,
        role_id: row.3,
        is_active: row.4,
        created_at: row.5,
        updated_at: row.6,
        deleted_at: row.7,
        deleted_by: row.8,
        version: row.9,
    }
}

async fn create<'c, E>(executor: E, mapping: ServiceRoleMapping) -> CatalogResult<ServiceRoleMapping>
where
    E: Executor<'c, Database = Postgres>,
{
    query(
        r#"
        INSERT INTO service_role_mappings (id, service_id, service_name, role_id, is_active,
            created_at, updated_at, deleted_at, deleted_by, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
        "#,
    )
    .bind(&mapping.id)
    .bind(&mapping.service_id)
    .bind(&mapping.service_name)
    .bind(&mapping.role_id)
    .bind(mapping.is_active)
    .bind(mapping.created_at)
    .bind(mapping.updated_at)
    .bind(mapping.deleted_at)
    .bind(&mapping.deleted_by)
    .bind(mapping.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(mapping)
}

async fn get_by_id<'c, E>(executor: E, id: &str) -> CatalogResult<ServiceRoleMapping>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM service_role_mappings WHERE id = $1");
    let row: Option<MappingTuple> = query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple)
        .ok_or_else(|| CatalogError::not_found(format!("service-role mapping '{id}'")))
}

async fn get_by_service_and_role<'c, E>(
    executor: E,
    service_id: &str,
    role_id: &str,
) -> CatalogResult<ServiceRoleMapping>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM service_role_mappings
         WHERE service_id = $1 AND role_id = $2"
    );
    let row: Option<MappingTuple> = query_as(&sql)
        .bind(service_id)
        .bind(role_id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple).ok_or_else(|| {
        CatalogError::not_found(format!(
            "mapping of role '{role_id}' to service '{service_id}'"
        ))
    })
}

async fn update<'c, E>(
    executor: E,
    mapping: ServiceRoleMapping,
) -> CatalogResult<ServiceRoleMapping>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query(
        r#"
        UPDATE service_role_mappings
        SET service_name = $2, is_active = $3, updated_at = $4, version = $5
        WHERE id = $1
        "#,
    )
    .bind(&mapping.id)
    .bind(&mapping.service_name)
    .bind(mapping.is_active)
    .bind(mapping.updated_at)
    .bind(mapping.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "service-role mapping '{}'",
            mapping.id
        )));
    }
    Ok(mapping)
}

async fn exists<'c, E>(executor: E, id: &str) -> CatalogResult<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<(i32,)> = query_as("SELECT 1 FROM service_role_mappings WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.is_some())
}

async fn list<'c, E>(executor: E, limit: i64, offset: i64) -> CatalogResult<Vec<ServiceRoleMapping>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql =
        format!("SELECT {COLUMNS} FROM service_role_mappings ORDER BY created_at LIMIT $1 OFFSET $2");
    let rows: Vec<MappingTuple> = query_as(&sql)
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
    let row: (i64,) = query_as("SELECT COUNT(*) FROM service_role_mappings")
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.0)
}

async fn find<'c, E>(executor: E, filter: &Filter) -> CatalogResult<Vec<ServiceRoleMapping>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM service_role_mappings");
    let rows: Vec<MappingTuple> = query_as(&sql)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    let all: Vec<ServiceRoleMapping> = rows.into_iter().map(from_tuple).collect();
    Ok(filter_apply::apply(all, filter, |_| false))
}

async fn list_by_service<'c, E>(
    executor: E,
    service_id: &str,
) -> CatalogResult<Vec<ServiceRoleMapping>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM service_role_mappings WHERE service_id = $1 ORDER BY created_at"
    );
    let rows: Vec<MappingTuple> = query_as(&sql)
        .bind(service_id)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(from_tuple).collect())
}

#[async_trait]
impl ServiceRoleMappingStore for PgCatalogStore {
    async fn create(&self, mapping: ServiceRoleMapping) -> CatalogResult<ServiceRoleMapping> {
        create(&self.pool, mapping).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<ServiceRoleMapping> {
        get_by_id(&self.pool, id).await
    }
    async fn get_by_service_and_role(
        &self,
        service_id: &str,
        role_id: &str,
    ) -> CatalogResult<ServiceRoleMapping> {
        get_by_service_and_role(&self.pool, service_id, role_id).await
    }
    async fn update(&self, mapping: ServiceRoleMapping) -> CatalogResult<ServiceRoleMapping> {
        update(&self.pool, mapping).await
    }
    async fn exists(&self, id: &str) -> CatalogResult<bool> {
        exists(&self.pool, id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<ServiceRoleMapping>> {
        list(&self.pool, limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        count(&self.pool).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<ServiceRoleMapping>> {
        find(&self.pool, filter).await
    }
    async fn list_by_service(&self, service_id: &str) -> CatalogResult<Vec<ServiceRoleMapping>> {
        list_by_service(&self.pool, service_id).await
    }
}

#[async_trait]
impl ServiceRoleMappingStore for PgCatalogTransaction {
    async fn create(&self, mapping: ServiceRoleMapping) -> CatalogResult<ServiceRoleMapping> {
        let mut guard = self.tx.lock().await;
        create(self.active(&mut guard)?.as_mut(), mapping).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<ServiceRoleMapping> {
        let mut guard = self.tx.lock().await;
        get_by_id(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn get_by_service_and_role(
        &self,
        service_id: &str,
        role_id: &str,
    ) -> CatalogResult<ServiceRoleMapping> {
        let mut guard = self.tx.lock().await;
        get_by_service_and_role(self.active(&mut guard)?.as_mut(), service_id, role_id).await
    }
    async fn update(&self, mapping: ServiceRoleMapping) -> CatalogResult<ServiceRoleMapping> {
        let mut guard = self.tx.lock().await;
        update(self.active(&mut guard)?.as_mut(), mapping).await
    }
    async fn exists(&self, id: &str) -> CatalogResult<bool> {
        let mut guard = self.tx.lock().await;
        exists(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<ServiceRoleMapping>> {
        let mut guard = self.tx.lock().await;
        list(self.active(&mut guard)?.as_mut(), limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        let mut guard = self.tx.lock().await;
        count(self.active(&mut guard)?.as_mut()).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<ServiceRoleMapping>> {
        let mut guard = self.tx.lock().await;
        find(self.active(&mut guard)?.as_mut(), filter).await
    }
    async fn list_by_service(&self, service_id: &str) -> CatalogResult<Vec<ServiceRoleMapping>> {
        let mut guard = self.tx.lock().await;
        list_by_service(self.active(&mut guard)?.as_mut(), service_id).await
    }
}
