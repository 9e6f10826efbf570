use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::organization::{Organization, OrganizationRequest, OrganizationUpdateRequest};
use uuid::Uuid;

#[async_trait::async_trait]
pub trait OrganizationRepository: Send + Sync {
    async fn create_organization(&self, request: &OrganizationRequest) -> Result<Organization, AppError>;
    async fn get_organization_by_id(&self, id: &Uuid) -> Result<Option<Organization>, AppError>;
    async fn get_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, AppError>;
    /// Organizations the user holds any membership in.
    async fn list_organizations_for_user(&self, user_id: &Uuid) -> Result<Vec<Organization>, AppError>;
    async fn update_organization(&self, id: &Uuid, request: &OrganizationUpdateRequest) -> Result<Organization, AppError>;
    async fn delete_organization(&self, id: &Uuid) -> Result<(), AppError>;
}

const ORGANIZATION_COLUMNS: &str = "o.id, o.name, o.slug, o.description, o.logo_url, o.created_at";

#[async_trait::async_trait]
impl OrganizationRepository for PostgresRepository {
    async fn create_organization(&self, request: &OrganizationRequest) -> Result<Organization, AppError> {
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            INSERT INTO organizations (name, slug, description, logo_url)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, slug, description, logo_url, created_at
            "#,
        )
        .bind(&request.name)
        .bind(&request.slug)
        .bind(&request.description)
        .bind(&request.logo_url)
        .fetch_one(&self.pool)
        .await?;

        Ok(organization)
    }

    async fn get_organization_by_id(&self, id: &Uuid) -> Result<Option<Organization>, AppError> {
        let query = format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations o WHERE o.id = $1");
        let organization = sqlx::query_as::<_, Organization>(&query).bind(id).fetch_optional(&self.pool).await?;

        Ok(organization)
    }

    async fn get_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, AppError> {
        let query = format!("SELECT {ORGANIZATION_COLUMNS} FROM organizations o WHERE o.slug = $1");
        let organization = sqlx::query_as::<_, Organization>(&query).bind(slug).fetch_optional(&self.pool).await?;

        Ok(organization)
    }

    async fn list_organizations_for_user(&self, user_id: &Uuid) -> Result<Vec<Organization>, AppError> {
        let query = format!(
            r#"
            SELECT {ORGANIZATION_COLUMNS}
            FROM organizations o
            JOIN organization_members m ON m.organization_id = o.id
            WHERE m.user_id = $1
            ORDER BY o.created_at ASC
            "#
        );
        let organizations = sqlx::query_as::<_, Organization>(&query).bind(user_id).fetch_all(&self.pool).await?;

        Ok(organizations)
    }

    async fn update_organization(&self, id: &Uuid, request: &OrganizationUpdateRequest) -> Result<Organization, AppError> {
        // Nullable columns carry a "present" flag so an explicit null clears them.
        let organization = sqlx::query_as::<_, Organization>(
            r#"
            UPDATE organizations
            SET name = COALESCE($2, name),
                slug = COALESCE($3, slug),
                description = CASE WHEN $4 THEN $5 ELSE description END,
                logo_url = CASE WHEN $6 THEN $7 ELSE logo_url END
            WHERE id = $1
            RETURNING id, name, slug, description, logo_url, created_at
            "#,
        )
        .bind(id)
        .bind(&request.name)
        .bind(&request.slug)
        .bind(request.description.is_some())
        .bind(request.description.clone().flatten())
        .bind(request.logo_url.is_some())
        .bind(request.logo_url.clone().flatten())
        .fetch_one(&self.pool)
        .await?;

        Ok(organization)
    }

    async fn delete_organization(&self, id: &Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM organizations WHERE id = $1").bind(id).execute(&self.pool).await?;
        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Organization not found".to_string()));
        }
        Ok(())
    }
}
