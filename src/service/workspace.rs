use tracing::info;
use uuid::Uuid;

use crate::database::member::MemberRepository;
use crate::database::organization::OrganizationRepository;
use crate::database::workspace::WorkspaceRepository;
use crate::error::app_error::AppError;
use crate::models::member::{AddMemberRequest, Member, MembershipScope, Role};
use crate::models::workspace::{Workspace, WorkspaceRequest, WorkspaceUpdateRequest};
use crate::service::membership::{MemberAction, MembershipPolicy};

pub struct WorkspaceService<'a, R: WorkspaceRepository + OrganizationRepository + MemberRepository + ?Sized> {
    repository: &'a R,
}

impl<'a, R: WorkspaceRepository + OrganizationRepository + MemberRepository + ?Sized> WorkspaceService<'a, R> {
    pub fn new(repository: &'a R) -> Self {
        WorkspaceService { repository }
    }

    fn policy(&self) -> MembershipPolicy<'a, R> {
        MembershipPolicy::new(self.repository, MembershipScope::Workspace)
    }

    fn organization_policy(&self) -> MembershipPolicy<'a, R> {
        MembershipPolicy::new(self.repository, MembershipScope::Organization)
    }

    async fn find(&self, id: &Uuid) -> Result<Workspace, AppError> {
        self.repository
            .get_workspace_by_id(id)
            .await?
            .ok_or_else(|| AppError::NotFound("Workspace not found".to_string()))
    }

    async fn ensure_organization(&self, organization_id: &Uuid) -> Result<(), AppError> {
        self.repository
            .get_organization_by_id(organization_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;
        Ok(())
    }

    /// Needs an admin or owner membership in the organization; the creator becomes workspace owner.
    pub async fn create_workspace(&self, user_id: &Uuid, request: &WorkspaceRequest) -> Result<(Workspace, Member), AppError> {
        self.ensure_organization(&request.organization_id).await?;
        self.organization_policy()
            .require(&request.organization_id, user_id, MemberAction::CreateWorkspace)
            .await?;

        let workspace = self.repository.create_workspace(request).await?;
        let membership = self.repository.add_member(MembershipScope::Workspace, &workspace.id, user_id, Role::Owner).await?;

        info!(workspace_id = %workspace.id, organization_id = %workspace.organization_id, user_id = %user_id, "workspace created");
        Ok((workspace, membership))
    }

    pub async fn get_workspace(&self, id: &Uuid, user_id: &Uuid) -> Result<Workspace, AppError> {
        let workspace = self.find(id).await?;
        self.policy().require(id, user_id, MemberAction::View).await?;
        Ok(workspace)
    }

    pub async fn get_workspace_by_slug(&self, organization_id: &Uuid, slug: &str, user_id: &Uuid) -> Result<Workspace, AppError> {
        let workspace = self
            .repository
            .get_workspace_by_slug(organization_id, slug)
            .await?
            .ok_or_else(|| AppError::NotFound("Workspace not found".to_string()))?;
        self.policy().require(&workspace.id, user_id, MemberAction::View).await?;
        Ok(workspace)
    }

    pub async fn list_workspaces(&self, user_id: &Uuid) -> Result<Vec<Workspace>, AppError> {
        self.repository.list_workspaces_for_user(user_id).await
    }

    /// All workspaces of an organization, visible to any of its members.
    pub async fn list_organization_workspaces(&self, organization_id: &Uuid, user_id: &Uuid) -> Result<Vec<Workspace>, AppError> {
        self.ensure_organization(organization_id).await?;
        self.organization_policy().require(organization_id, user_id, MemberAction::View).await?;
        self.repository.list_workspaces_for_organization(organization_id).await
    }

    pub async fn update_workspace(&self, id: &Uuid, user_id: &Uuid, request: &WorkspaceUpdateRequest) -> Result<Workspace, AppError> {
        let workspace = self.find(id).await?;
        self.policy().require(id, user_id, MemberAction::UpdateSettings).await?;
        if request.is_empty() {
            return Ok(workspace);
        }

        let workspace = self.repository.update_workspace(id, request).await?;
        info!(workspace_id = %id, user_id = %user_id, "workspace updated");
        Ok(workspace)
    }

    pub async fn delete_workspace(&self, id: &Uuid, user_id: &Uuid) -> Result<(), AppError> {
        self.find(id).await?;
        self.policy().require(id, user_id, MemberAction::Delete).await?;

        self.repository.delete_workspace(id).await?;
        info!(workspace_id = %id, user_id = %user_id, "workspace deleted");
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
