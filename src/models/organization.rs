use chrono::{DateTime, Utc};
use regex::Regex;
use rocket::serde::{Deserialize, Serialize};
use schemars::JsonSchema;
use std::sync::LazyLock;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::double_option;
use crate::models::member::{Member, OrganizationMemberResponse};

static SLUG_PATTERN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[a-z0-9-]+$").expect("slug pattern is valid"));

#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Deserialize, Debug, Clone, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: String,
    #[validate(length(min = 1, max = 100, message = "Slug must be between 1 and 100 characters"))]
    #[validate(custom(function = "crate::models::organization::validate_slug"))]
    pub slug: String,
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<String>,
}

/// Partial update. `description` and `logoUrl` accept `null` to clear the value.
#[derive(Deserialize, Debug, Clone, Default, Validate, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationUpdateRequest {
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    pub name: Option<String>,
    #[validate(length(min = 1, max = 100, message = "Slug must be between 1 and 100 characters"))]
    #[validate(custom(function = "crate::models::organization::validate_slug"))]
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "double_option")]
    #[validate(url(message = "Logo URL must be a valid URL"))]
    pub logo_url: Option<Option<String>>,
}

impl OrganizationUpdateRequest {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.slug.is_none() && self.description.is_none() && self.logo_url.is_none()
    }
}

pub fn validate_slug(slug: &str) -> Result<(), ValidationError> {
    if SLUG_PATTERN.is_match(slug) {
        Ok(())
    } else {
        Err(ValidationError::new("invalid_slug").with_message("Slug may only contain lowercase letters, digits and hyphens".into()))
    }
}

#[derive(Serialize, Debug, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationResponse {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub logo_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<&Organization> for OrganizationResponse {
    fn from(organization: &Organization) -> Self {
        Self {
            id: organization.id,
            name: organization.name.clone(),
            slug: organization.slug.clone(),
            description: organization.description.clone(),
            logo_url: organization.logo_url.clone(),
            created_at: organization.created_at,
        }
    }
}

/// A freshly created organization with the creator's owner membership.
#[derive(Serialize, Debug, JsonSchema)]
pub struct CreatedOrganizationResponse {
    pub organization: OrganizationResponse,
    pub membership: OrganizationMemberResponse,
}

impl From<&(Organization, Member)> for CreatedOrganizationResponse {
    fn from((organization, membership): &(Organization, Member)) -> Self {
        Self {
            organization: organization.into(),
            membership: membership.into(),
        }
    }
}
