//! PostgreSQL-backed [`UserRoleStore`].

use async_trait::async_trait;
use catalog_core::{CatalogError, CatalogResult};
use catalog_engine::entities::UserRole;
use catalog_engine::filter::Filter;
use catalog_engine::store::UserRoleStore;
use sqlx_core::executor::Executor;
use sqlx_core::query::query;
use sqlx_core::query_as::query_as;
use sqlx_postgres::Postgres;
use time::OffsetDateTime;

use crate::error::map_sqlx_error;
use crate::filter_apply;
use crate::{PgCatalogStore, PgCatalogTransaction};

type UserRoleTuple = (
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
    "id, user_id, role_id, is_active, created_at, updated_at, deleted_at, deleted_by, version";

fn from_tuple(row: UserRoleTuple) -> UserRole {
    UserRole {
        id: row.0,
        user_id: row.1,
        role_id: row.2,
        is_active: row.3,
        created_at: row.4,
        updated_at: row.5,
        deleted_at: row.6,
        deleted_by: row.7,
        version: row.8,
    }
}

async fn create<'c, E>(executor: E, assignment: UserRole) -> CatalogResult<UserRole>
where
    E: Executor<'c, Database = Postgres>,
{
    query(
        r#"
        INSERT INTO user_roles (id, user_id, role_id, is_active,
            created_at, updated_at, deleted_at, deleted_by, version)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(&assignment.id)
    .bind(&assignment.user_id)
    .bind(&assignment.role_id)
    .bind(assignment.is_active)
    .bind(assignment.created_at)
    .bind(assignment.updated_at)
    .bind(assignment.deleted_at)
    .bind(&assignment.deleted_by)
    .bind(assignment.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;
    Ok(assignment)
}

async fn get_by_id<'c, E>(executor: E, id: &str) -> CatalogResult<UserRole>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM user_roles WHERE id = $1");
    let row: Option<UserRoleTuple> = query_as(&sql)
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple)
        .ok_or_else(|| CatalogError::not_found(format!("user-role assignment '{id}'")))
}

async fn get_by_user_and_role<'c, E>(
    executor: E,
    user_id: &str,
    role_id: &str,
) -> CatalogResult<UserRole>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM user_roles
         WHERE user_id = $1 AND role_id = $2
         ORDER BY created_at DESC LIMIT 1"
    );
    let row: Option<UserRoleTuple> = query_as(&sql)
        .bind(user_id)
        .bind(role_id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    row.map(from_tuple).ok_or_else(|| {
        CatalogError::not_found(format!(
            "assignment of role '{role_id}' to user '{user_id}'"
        ))
    })
}

async fn update<'c, E>(executor: E, mut assignment: UserRole) -> CatalogResult<UserRole>
where
    E: Executor<'c, Database = Postgres>,
{
    assignment.updated_at = OffsetDateTime::now_utc();
    assignment.version += 1;
    let result = query(
        r#"
        UPDATE user_roles
        SET is_active = $2, updated_at = $3, deleted_at = $4, deleted_by = $5, version = $6
        WHERE id = $1
        "#,
    )
    .bind(&assignment.id)
    .bind(assignment.is_active)
    .bind(assignment.updated_at)
    .bind(assignment.deleted_at)
    .bind(&assignment.deleted_by)
    .bind(assignment.version)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "user-role assignment '{}'",
            assignment.id
        )));
    }
    Ok(assignment)
}

async fn delete<'c, E>(executor: E, id: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query("DELETE FROM user_roles WHERE id = $1")
        .bind(id)
        .execute(executor)
        .await
        .map_err(map_sqlx_error)?;
    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "user-role assignment '{id}'"
        )));
    }
    Ok(())
}

async fn soft_delete<'c, E>(executor: E, id: &str, deleted_by: &str) -> CatalogResult<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = query(
        "UPDATE user_roles SET deleted_at = $2, deleted_by = $3, is_active = false, version = version + 1
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .bind(OffsetDateTime::now_utc())
    .bind(deleted_by)
    .execute(executor)
    .await
    .map_err(map_sqlx_error)?;

    if result.rows_affected() == 0 {
        return Err(CatalogError::not_found(format!(
            "user-role assignment '{id}'"
        )));
    }
    Ok(())
}

async fn exists<'c, E>(executor: E, id: &str) -> CatalogResult<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    let row: Option<(i32,)> = query_as("SELECT 1 FROM user_roles WHERE id = $1")
        .bind(id)
        .fetch_optional(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.is_some())
}

async fn list<'c, E>(executor: E, limit: i64, offset: i64) -> CatalogResult<Vec<UserRole>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM user_roles ORDER BY created_at LIMIT $1 OFFSET $2");
    let rows: Vec<UserRoleTuple> = query_as(&sql)
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
    let row: (i64,) = query_as("SELECT COUNT(*) FROM user_roles")
        .fetch_one(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(row.0)
}

async fn find<'c, E>(executor: E, filter: &Filter) -> CatalogResult<Vec<UserRole>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!("SELECT {COLUMNS} FROM user_roles");
    let rows: Vec<UserRoleTuple> = query_as(&sql)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    let all: Vec<UserRole> = rows.into_iter().map(from_tuple).collect();
    Ok(filter_apply::apply(all, filter, |a| a.deleted_at.is_some()))
}

async fn list_by_user<'c, E>(executor: E, user_id: &str) -> CatalogResult<Vec<UserRole>>
where
    E: Executor<'c, Database = Postgres>,
{
    let sql = format!(
        "SELECT {COLUMNS} FROM user_roles WHERE user_id = $1 AND deleted_at IS NULL
         ORDER BY created_at"
    );
    let rows: Vec<UserRoleTuple> = query_as(&sql)
        .bind(user_id)
        .fetch_all(executor)
        .await
        .map_err(map_sqlx_error)?;
    Ok(rows.into_iter().map(from_tuple).collect())
}

#[async_trait]
impl UserRoleStore for PgCatalogStore {
    async fn create(&self, assignment: UserRole) -> CatalogResult<UserRole> {
        create(&self.pool, assignment).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<UserRole> {
        get_by_id(&self.pool, id).await
    }
    async fn get_by_user_and_role(&self, user_id: &str, role_id: &str) -> CatalogResult<UserRole> {
        get_by_user_and_role(&self.pool, user_id, role_id).await
    }
    async fn update(&self, assignment: UserRole) -> CatalogResult<UserRole> {
        update(&self.pool, assignment).await
    }
    async fn delete(&self, id: &str) -> CatalogResult<()> {
        delete(&self.pool, id).await
    }
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()> {
        soft_delete(&self.pool, id, deleted_by).await
    }
    async fn exists(&self, id: &str) -> CatalogResult<bool> {
        exists(&self.pool, id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<UserRole>> {
        list(&self.pool, limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        count(&self.pool).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<UserRole>> {
        find(&self.pool, filter).await
    }
    async fn list_by_user(&self, user_id: &str) -> CatalogResult<Vec<UserRole>> {
        list_by_user(&self.pool, user_id).await
    }
}

#[async_trait]
impl UserRoleStore for PgCatalogTransaction {
    async fn create(&self, assignment: UserRole) -> CatalogResult<UserRole> {
        let mut guard = self.tx.lock().await;
        create(self.active(&mut guard)?.as_mut(), assignment).await
    }
    async fn get_by_id(&self, id: &str) -> CatalogResult<UserRole> {
        let mut guard = self.tx.lock().await;
        get_by_id(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn get_by_user_and_role(&self, user_id: &str, role_id: &str) -> CatalogResult<UserRole> {
        let mut guard = self.tx.lock().await;
        get_by_user_and_role(self.active(&mut guard)?.as_mut(), user_id, role_id).await
    }
    async fn update(&self, assignment: UserRole) -> CatalogResult<UserRole> {
        let mut guard = self.tx.lock().await;
        update(self.active(&mut guard)?.as_mut(), assignment).await
    }
    async fn delete(&self, id: &str) -> CatalogResult<()> {
        let mut guard = self.tx.lock().await;
        delete(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn soft_delete(&self, id: &str, deleted_by: &str) -> CatalogResult<()> {
        let mut guard = self.tx.lock().await;
        soft_delete(self.active(&mut guard)?.as_mut(), id, deleted_by).await
    }
    async fn exists(&self, id: &str) -> CatalogResult<bool> {
        let mut guard = self.tx.lock().await;
        exists(self.active(&mut guard)?.as_mut(), id).await
    }
    async fn list(&self, limit: i64, offset: i64) -> CatalogResult<Vec<UserRole>> {
        let mut guard = self.tx.lock().await;
        list(self.active(&mut guard)?.as_mut(), limit, offset).await
    }
    async fn count(&self) -> CatalogResult<i64> {
        let mut guard = self.tx.lock().await;
        count(self.active(&mut guard)?.as_mut()).await
    }
    async fn find(&self, filter: &Filter) -> CatalogResult<Vec<UserRole>> {
        let mut guard = self.tx.lock().await;
        find(self.active(&mut guard)?.as_mut(), filter).await
    }
    async fn list_by_user(&self, user_id: &str) -> CatalogResult<Vec<UserRole>> {
        let mut guard = self.tx.lock().await;
        list_by_user(self.active(&mut guard)?.as_mut(), user_id).await
    }
}
