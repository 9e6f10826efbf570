use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::member::{Member, MembershipScope, Role};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait MemberRepository: Send + Sync {
    async fn add_member(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid, role: Role) -> Result<Member, AppError>;
    async fn get_member(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid) -> Result<Option<Member>, AppError>;
    async fn list_members(&self, scope: MembershipScope, parent_id: &Uuid) -> Result<Vec<Member>, AppError>;
    async fn update_member_role(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid, role: Role) -> Result<Member, AppError>;
    async fn remove_member(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid) -> Result<(), AppError>;
}

/// Membership table and parent column for a scope. Both come from this fixed
/// mapping, never from input.
fn member_table(scope: MembershipScope) -> (&'static str, &'static str) {
    match scope {
        MembershipScope::Organization => ("organization_members", "organization_id"),
        MembershipScope::Workspace => ("workspace_members", "workspace_id"),
    }
}

#[async_trait::async_trait]
impl MemberRepository for PostgresRepository {
    async fn add_member(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid, role: Role) -> Result<Member, AppError> {
        let (table, parent) = member_table(scope);
        let query = format!(
            r#"
            INSERT INTO {table} ({parent}, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, {parent} AS parent_id, user_id, role, created_at
            "#
        );
        let member = sqlx::query_as::<_, Member>(&query)
            .bind(parent_id)
            .bind(user_id)
            .bind(role)
            .fetch_one(&self.pool)
            .await?;

        Ok(member)
    }

    async fn get_member(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid) -> Result<Option<Member>, AppError> {
        let (table, parent) = member_table(scope);
        let query = format!("SELECT id, {parent} AS parent_id, user_id, role, created_at FROM {table} WHERE {parent} = $1 AND user_id = $2");
        let member = sqlx::query_as::<_, Member>(&query)
            .bind(parent_id)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(member)
    }

    async fn list_members(&self, scope: MembershipScope, parent_id: &Uuid) -> Result<Vec<Member>, AppError> {
        let (table, parent) = member_table(scope);
        let query = format!("SELECT id, {parent} AS parent_id, user_id, role, created_at FROM {table} WHERE {parent} = $1 ORDER BY created_at ASC");
        let members = sqlx::query_as::<_, Member>(&query).bind(parent_id).fetch_all(&self.pool).await?;

        Ok(members)
    }

    async fn update_member_role(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid, role: Role) -> Result<Member, AppError> {
        let (table, parent) = member_table(scope);
        let query = format!(
            r#"
            UPDATE {table}
            SET role = $3
            WHERE {parent} = $1 AND user_id = $2
            RETURNING id, {parent} AS parent_id, user_id, role, created_at
            "#
        );
        let member = sqlx::query_as::<_, Member>(&query)
            .bind(parent_id)
            .bind(user_id)
            .bind(role)
            .fetch_optional(&self.pool)
            .await?;

        member.ok_or_else(|| AppError::NotFound(format!("User is not a member of this {}", scope.label())))
    }

    async fn remove_member(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid) -> Result<(), AppError> {
        let (table, parent) = member_table(scope);
        let query = format!("DELETE FROM {table} WHERE {parent} = $1 AND user_id = $2");
        let result = sqlx::query(&query).bind(parent_id).bind(user_id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound(format!("User is not a member of this {}", scope.label())));
        }
        Ok(())
    }
}
