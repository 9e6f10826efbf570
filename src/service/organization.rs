use tracing::info;
use uuid::Uuid;

use crate::database::member::MemberRepository;
use crate::database::organization::OrganizationRepository;
use crate::error::app_error::AppError;
use crate::models::member::{AddMemberRequest, Member, MembershipScope, Role};
use crate::models::organization::{Organization, OrganizationRequest, OrganizationUpdateRequest};
use crate::service::membership::{MemberAction, MembershipPolicy};

pub struct OrganizationService<'a, R: OrganizationRepository + MemberRepository + ?Sized> {
    repository: &'a R,
}

impl<'a, R: OrganizationRepository + MemberRepository + ?Sized> OrganizationService<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        OrganizationService { repository }
    }

    fn policy(&self) -> MembershipPolicy<'a, R> {
        MembershipPolicy::new(self.repository, MembershipScope::Organization)
    }

    async fn find(&self, id: &Uuid) -> Result<Organization, AppError> {
        self.repository
            .get_organization_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))
    }

    /// Any authenticated user may create an organization and becomes its owner.
    pub async fn create_organization(&self, user_id: &Uuid, request: &OrganizationRequest) -> Result<(Organization, Member), AppError> {
        let organization = self.repository.create_organization(request).await?;
        let membership = self
            .repository
            .add_member(MembershipScope::Organization, &organization.id, user_id, Role::Owner)
            .await?;

        info!(organization_id = %organization.id, slug = %organization.slug, user_id = %user_id, "organization created");
        Ok((organization, membership))
    }

    pub async fn get_organization(&self, id: &Uuid, user_id: &Uuid) -> Result<Organization, AppError> {
        let organization = self.find(id).await?;
        self.policy().require(id, user_id, MemberAction::View).await?;
        Ok(organization)
    }

    pub async fn get_organization_by_slug(&self, slug: &str, user_id: &Uuid) -> Result<Organization, AppError> {
        let organization = self
            .repository
            .get_organization_by_slug(slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
        self.policy().require(&organization.id, user_id, MemberAction::View).await?;
        Ok(organization)
    }

    pub async fn list_organizations(&self, user_id: &Uuid) -> Result<Vec<Organization>, AppError> {
        self.repository.list_organizations_for_user(user_id).await
    }

    pub async fn update_organization(&self, id: &Uuid, user_id: &Uuid, request: &OrganizationUpdateRequest) -> Result<Organization, AppError> {
        let organization = self.find(id).await?;
        self.policy().require(id, user_id, MemberAction::UpdateSettings).await?;
        if request.is_empty() {
            return Ok(organization);
        }

        let organization = self.repository.update_organization(id, request).await?;
        info!(organization_id = %id, user_id = %user_id, "organization updated");
        Ok(organization)
    }

    /// Deleting an organization cascades to its workspaces and memberships.
    pub async fn delete_organization(&self, id: &Uuid, user_id: &Uuid) -> Result<(), AppError> {
        self.find(id).await?;
        self.policy().require(id, user_id, MemberAction::Delete).await?;

        self.repository.delete_organization(id).await?;
        info!(organization_id = %id, user_id = %user_id, "organization deleted");
        Ok(())
    }

    pub async fn list_members(&self, id: &Uuid, user_id: &Uuid) -> Result<Vec<Member>, AppError> {
        self.find(id).await?;
        self.policy().list_members(id, user_id).await
    }

    pub async fn add_member(&self, id: &Uuid, user_id: &Uuid, request: &AddMemberRequest) -> Result<Member, AppError> {
        self.find(id).await?;
        self.policy().add_member(id, user_id, request).await
    }

    pub async fn change_member_role(&self, id: &Uuid, user_id: &Uuid, target_user_id: &Uuid, role: Role) -> Result<Member, AppError> {
        self.find(id).await?;
        self.policy().change_member_role(id, user_id, target_user_id, role).await
    }

    pub async fn remove_member(&self, id: &Uuid, user_id: &Uuid, target_user_id: &Uuid) -> Result<(), AppError> {
        self.find(id).await?;
        self.policy().remove_member(id, user_id, target_user_id).await
    }
}
