use tracing::info;
use uuid::Uuid;

use crate::database::member::MemberRepository;
use crate::error::app_error::AppError;
use crate::models::member::{AddMemberRequest, Member, MembershipScope, Role};

/// Something a caller may attempt against an organization or workspace.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum MemberAction {
    View,
    CreateWorkspace,
    UpdateSettings,
    Delete,
    AddMember,
    RemoveMember,
    ChangeMemberRole,
}

impl MemberAction {
    pub fn allowed_roles(self) -> &'static [Role] {
        match self {
            MemberAction::View => &[Role::Owner, Role::Admin, Role::Member],
            MemberAction::CreateWorkspace | MemberAction::UpdateSettings | MemberAction::AddMember | MemberAction::RemoveMember => &[Role::Owner, Role::Admin],
            MemberAction::Delete | MemberAction::ChangeMemberRole => &[Role::Owner],
        }
    }

    fn forbidden_message(self, scope: MembershipScope) -> String {
        let scope = scope.label();
        match self {
            MemberAction::View => format!("You don't have access to this {}", scope),
            MemberAction::CreateWorkspace => format!("Only {} admins and owners can create workspaces", scope),
            MemberAction::UpdateSettings => format!("Only {} admins and owners can update settings", scope),
            MemberAction::Delete => format!("Only {} owners can delete {}s", scope, scope),
            MemberAction::AddMember => format!("Only {} admins and owners can add members", scope),
            MemberAction::RemoveMember => format!("Only {} admins and owners can remove members", scope),
            MemberAction::ChangeMemberRole => format!("Only {} owners can change member roles", scope),
        }
    }
}

/// Checks the caller's membership against the roles the action allows.
pub fn authorize(scope: MembershipScope, membership: Option<&Member>, action: MemberAction) -> Result<Role, AppError> {
    match membership {
        Some(member) if action.allowed_roles().contains(&member.role) => Ok(member.role),
        _ => Err(AppError::Forbidden(action.forbidden_message(scope))),
    }
}

pub fn ensure_not_self(requester_id: &Uuid, target_user_id: &Uuid) -> Result<(), AppError> {
    if requester_id == target_user_id {
        return Err(AppError::Invariant("You cannot change your own role".to_string()));
    }
    Ok(())
}

/// Rejects removing `target_user_id` when it is the only owner left, whoever asks.
pub fn ensure_owner_remains(members: &[Member], target_user_id: &Uuid) -> Result<(), AppError> {
    let target_is_owner = members.iter().any(|m| m.user_id == *target_user_id && m.role == Role::Owner);
    let owners = members.iter().filter(|m| m.role == Role::Owner).count();

    if target_is_owner && owners <= 1 {
        return Err(AppError::Invariant("Cannot remove the last owner. Transfer ownership first.".to_string()));
    }
    Ok(())
}

/// Membership rules shared by organizations and workspaces.
pub struct MembershipPolicy<'a, R: MemberRepository + ?Sized> {
    repository: &'a R,
    scope: MembershipScope,
}

impl<'a, R: MemberRepository + ?Sized> MembershipPolicy<'a, R> {
    pub fn new(repository: &'a R, scope: MembershipScope) -> Self {
        MembershipPolicy { repository, scope }
    }

    /// Returns the caller's membership if it allows `action`.
    pub async fn require(&self, parent_id: &Uuid, user_id: &Uuid, action: MemberAction) -> Result<Member, AppError> {
        let membership = self.repository.get_member(self.scope, parent_id, user_id).await?;
        authorize(self.scope, membership.as_ref(), action)?;
        membership.ok_or_else(|| AppError::Forbidden(action.forbidden_message(self.scope)))
    }

    pub async fn list_members(&self, parent_id: &Uuid, requester_id: &Uuid) -> Result<Vec<Member>, AppError> {
        self.require(parent_id, requester_id, MemberAction::View).await?;
        self.repository.list_members(self.scope, parent_id).await
    }

    pub async fn add_member(&self, parent_id: &Uuid, requester_id: &Uuid, request: &AddMemberRequest) -> Result<Member, AppError> {
        self.require(parent_id, requester_id, MemberAction::AddMember).await?;

        if request.role == Role::Owner {
            return Err(AppError::Invariant("New members can only be added as admin or member".to_string()));
        }

        if self.repository.get_member(self.scope, parent_id, &request.user_id).await?.is_some() {
            return Err(AppError::Conflict(format!("User is already a member of this {}", self.scope.label())));
        }

        info!(scope = self.scope.label(), parent_id = %parent_id, user_id = %request.user_id, role = %request.role, "adding member");
        self.repository.add_member(self.scope, parent_id, &request.user_id, request.role).await
    }

    pub async fn change_member_role(&self, parent_id: &Uuid, requester_id: &Uuid, target_user_id: &Uuid, role: Role) -> Result<Member, AppError> {
        ensure_not_self(requester_id, target_user_id)?;
        self.require(parent_id, requester_id, MemberAction::ChangeMemberRole).await?;

        info!(scope = self.scope.label(), parent_id = %parent_id, user_id = %target_user_id, role = %role, "changing member role");
        self.repository.update_member_role(self.scope, parent_id, target_user_id, role).await
    }

    pub async fn remove_member(&self, parent_id: &Uuid, requester_id: &Uuid, target_user_id: &Uuid) -> Result<(), AppError> {
        self.require(parent_id, requester_id, MemberAction::RemoveMember).await?;

        let members = self.repository.list_members(self.scope, parent_id).await?;
        if !members.iter().any(|m| m.user_id == *target_user_id) {
            return Err(AppError::NotFound(format!("User is not a member of this {}", self.scope.label())));
        }
        ensure_owner_remains(&members, target_user_id)?;

        info!(scope = self.scope.label(), parent_id = %parent_id, user_id = %target_user_id, "removing member");
        self.repository.remove_member(self.scope, parent_id, target_user_id).await
    }
}
