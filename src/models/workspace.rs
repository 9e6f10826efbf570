use chrono::{DateTime, Utc};
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::double_option;
use crate::models::member::{Member, WorkspaceMemberResponse};

pub const DEFAULT_TIMEZONE: &str = "UTC";

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Workspace {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceRequest {
    pub organization_id: Uuid,
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Slug must be between 1 and 100 characters"))]
    #[validate(custom(function = "crate::models::organization::validate_slug"))]
    pub slug: String,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(length(max = 100, message = "Timezone must be at most 100 characters"))]
    #[validate(custom(function = "validate_timezone"))]
    pub timezone: Option<String>,
}

/// Partial update. `description` accepts `null` to clear the value.
#[derive(Deserialize, Debug, Clone, Default, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceUpdateRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Slug must be between 1 and 100 characters"))]
    #[validate(custom(function = "crate::models::organization::validate_slug"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<Option<String>>,
    #[validate(length(max = 100, message = "Timezone must be at most 100 characters"))]
    #[validate(custom(function = "validate_timezone"))]
    pub timezone: Option<String>,
    pub is_active: Option<bool>,
}

impl WorkspaceUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.description.is_none() && self.timezone.is_none() && self.is_active.is_none()
    }
}

fn validate_timezone(tz: &str) -> Result<(), ValidationError> {
    if tz.parse::<chrono_tz::Tz>().is_ok() {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_timezone").with_message("Timezone must be a valid IANA time zone name".into()))
    }
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceResponse {
    pub id: Uuid,
    pub organization_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub timezone: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl From<&Workspace> for WorkspaceResponse {
    fn from(workspace: &Workspace) -> Self {
        Self {
            id: workspace.id,
            organization_id: workspace.organization_id,
            name: workspace.name.clone(),
            slug: workspace.slug.clone(),
            description: workspace.description.clone(),
            timezone: workspace.timezone.clone(),
            is_active: workspace.is_active,
            created_at: workspace.created_at,
        }
    }
}

/// A freshly created workspace with the creator's owner membership.
#[derive(Serialize, Debug, JsonSchema)]
pub struct CreatedWorkspaceResponse {
    pub workspace: WorkspaceResponse,
    pub membership: WorkspaceMemberResponse,
}

impl From<&(Workspace, Member)> for CreatedWorkspaceResponse {
    fn from((workspace, membership): &(Workspace, Member)) -> Self {
        Self {
            workspace: workspace.into(),
            membership: membership.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timezone_must_be_iana_name() {
        assert!(validate_timezone("Europe/Lisbon").is_ok());
        assert!(validate_timezone("UTC").is_ok());
        assert!(validate_timezone("Mars/Olympus").is_err());
    }

    #[test]
    fn create_request_timezone_is_optional() {
        let request: WorkspaceRequest =
            serde_json::from_str(r#"{"organizationId":"6f1c1c3e-0d5b-4d8f-9f0e-6d4b3b0f1a2c","name":"Sales","slug":"sales"}"#).unwrap();
        assert!(request.timezone.is_none());
        assert!(request.validate().is_ok());
    }

    #[test]
    fn update_request_rejects_unknown_timezone() {
        let patch = WorkspaceUpdateRequest {
            timezone: Some("Nowhere/Special".to_string()),
            ..Default::default()
        };
        let errors = patch.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("timezone"));
    }

    #[test]
    fn response_is_camel_case() {
        let workspace = Workspace {
            id: Uuid::new_v4(),
            organization_id: Uuid::new_v4(),
            name: "Sales".to_string(),
            slug: "sales".to_string(),
            description: None,
            timezone: DEFAULT_TIMEZONE.to_string(),
            is_active: true,
            created_at: Utc::now(),
        };
        let json = serde_json::to_value(WorkspaceResponse::from(&workspace)).unwrap();
        assert_eq!(json["organizationId"], workspace.organization_id.to_string());
        assert_eq!(json["isActive"], true);
        assert_eq!(json["timezone"], "UTC");
    }
}
