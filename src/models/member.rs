use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::fmt;
use uuid::Uuid;
use validator::{Validate, ValidationError};

#[derive(Serialize, Deserialize, Debug, Copy, Clone, Eq, PartialEq, Hash, JsonSchema, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "member_role", rename_all = "lowercase")]
pub enum Role {
    Owner,
    Admin,
    Member,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Owner => "owner",
            Role::Admin => "admin",
            Role::Member => "member",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which kind of parent a membership belongs to.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum MembershipScope {
    Organization,
    Workspace,
}

impl MembershipScope {
    pub fn label(self) -> &'static str {
        match self {
            MembershipScope::Organization => "organization",
            MembershipScope::Workspace => "workspace",
        }
    }
}

/// A user's role in an organization or workspace; `parent_id` points at whichever
/// the scope names. Unique per (parent, user).
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Member {
    pub id: Uuid,
    pub parent_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub user_id: Uuid,
    #[serde(default = "default_new_member_role")]
    #[validate(custom(function = "validate_new_member_role"))]
    pub role: Role,
}

#[derive(Deserialize, Debug, JsonSchema)]
pub struct UpdateMemberRoleRequest {
    pub role: Role,
}

fn default_new_member_role() -> Role {
    Role::Member
}

// Ownership is only ever granted through a role change by an existing owner.
fn validate_new_member_role(role: &Role) -> Result<(), ValidationError> {
    match role {
        Role::Admin | Role::Member => Ok(()),
        Role::Owner => Err(ValidationError::new("invalid_role").with_message("New members can only be added as admin or member".into())),
    }
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationMemberResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&Member> for OrganizationMemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            organization_id: member.parent_id,
            user_id: member.user_id,
            role: member.role,
            created_at: member.created_at,
        }
    }
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceMemberResponse {
    pub id: Uuid,
    pub workspace_id: Uuid,
    pub user_id: Uuid,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&Member> for WorkspaceMemberResponse {
    fn from(member: &Member) -> Self {
        Self {
            id: member.id,
            workspace_id: member.parent_id,
            user_id: member.user_id,
            role: member.role,
            created_at: member.created_at,
        }
    }
}
