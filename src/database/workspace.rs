use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::workspace::{DEFAULT_TIMEZONE, Workspace, WorkspaceRequest, WorkspaceUpdateRequest};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait WorkspaceRepository: Send + Sync {
    async fn create_workspace(&self, request: &WorkspaceRequest) -> Result<Workspace, AppError>;
    async fn get_workspace_by_id(&self, id: &Uuid) -> Result<Option<Workspace>, AppError>;
    async fn get_workspace_by_slug(&self, organization_id: &Uuid, slug: &str) -> Result<Option<Workspace>, AppError>;
    async fn list_workspaces_for_organization(&self, organization_id: &Uuid) -> Result<Vec<Workspace>, AppError>;
    /// Workspaces the user holds a workspace membership in.
    async fn list_workspaces_for_user(&self, user_id: &Uuid) -> Result<Vec<Workspace>, AppError>;
    async fn update_workspace(&self, id: &Uuid, request: &WorkspaceUpdateRequest) -> Result<Workspace, AppError>;
    async fn delete_workspace(&self, id: &Uuid) -> Result<(), AppError>;
}

const WORKSPACE_COLUMNS: &str = "w.id, w.organization_id, w.name, w.slug, w.description, w.timezone, w.is_active, w.created_at";

#[async_trait::async_trait]
impl WorkspaceRepository for PostgresRepository {
    async fn create_workspace(&self, request: &WorkspaceRequest) -> Result<Workspace, AppError> {
        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            INSERT INTO workspaces (organization_id, name, slug, description, timezone)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, organization_id, name, slug, description, timezone, is_active, created_at
            "#,
        )
        .bind(request.organization_id)
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(request.timezone.as_deref().unwrap_or(DEFAULT_TIMEZONE))
        .fetch_one(&self.pool)
        .await?;

        Ok(workspace)
    }

    async fn get_workspace_by_id(&self, id: &Uuid) -> Result<Option<Workspace>, AppError> {
        let query = format!("SELECT {WORKSPACE_COLUMNS} FROM workspaces w WHERE w.id = $1");
        let workspace = sqlx::query_as::<_, Workspace>(&query).bind(id).fetch_optional(&self.pool).await?;

        Ok(workspace)
    }

    async fn get_workspace_by_slug(&self, organization_id: &Uuid, slug: &str) -> Result<Option<Workspace>, AppError> {
        let query = format!("SELECT {WORKSPACE_COLUMNS} FROM workspaces w WHERE w.organization_id = $1 AND w.slug = $2");
        let workspace = sqlx::query_as::<_, Workspace>(&query)
            .bind(organization_id)
            .bind(slug)
            .fetch_optional(&self.pool)
            .await?;

        Ok(workspace)
    }

    async fn list_workspaces_for_organization(&self, organization_id: &Uuid) -> Result<Vec<Workspace>, AppError> {
        let query = format!("SELECT {WORKSPACE_COLUMNS} FROM workspaces w WHERE w.organization_id = $1 ORDER BY w.created_at ASC");
        let workspaces = sqlx::query_as::<_, Workspace>(&query).bind(organization_id).fetch_all(&self.pool).await?;

        Ok(workspaces)
    }

    async fn list_workspaces_for_user(&self, user_id: &Uuid) -> Result<Vec<Workspace>, AppError> {
        let query = format!(
            r#"
            SELECT {WORKSPACE_COLUMNS}
            FROM workspaces w
            JOIN workspace_members m ON m.workspace_id = w.id
            WHERE m.user_id = $1
            ORDER BY w.created_at ASC
            "#
        );
        let workspaces = sqlx::query_as::<_, Workspace>(&query).bind(user_id).fetch_all(&self.pool).await?;

        Ok(workspaces)
    }

    async fn update_workspace(&self, id: &Uuid, request: &WorkspaceUpdateRequest) -> Result<Workspace, AppError> {
        let workspace = sqlx::query_as::<_, Workspace>(
            r#"
            UPDATE workspaces
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                timezone = COALESCE($6, timezone),
                is_active = COALESCE($7, is_active)
            WHERE id = $1
            RETURNING id, organization_id, name, slug, description, timezone, is_active, created_at
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.slug)
        .bind(request.description.is_some())
        .bind(request.description.clone().flatten())
        .bind(&request.timezone)
        .bind(request.is_active)
        .fetch_one(&self.pool)
        .await?;

        Ok(workspace)
    }

    async fn delete_workspace(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM workspaces WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Workspace not found".to_string()));
        }
        Ok(())
    }
}
