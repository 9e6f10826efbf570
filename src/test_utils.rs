use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;
use rocket::http::Header;
use rocket::local::asynchronous::Client;
use uuid::Uuid;

use crate::config::Config;
use crate::database::SharedRepository;
use crate::database::booking::BookingRepository;
use crate::database::member::MemberRepository;
use crate::database::organization::OrganizationRepository;
use crate::database::workspace::WorkspaceRepository;
use crate::error::app_error::AppError;
use crate::identity::{IdentityProvider, SharedIdentityProvider};
use crate::models::booking::{Booking, BookingRequest, BookingUpdateRequest};
use crate::models::member::{Member, MembershipScope, Role};
use crate::models::organization::{Organization, OrganizationRequest, OrganizationUpdateRequest};
use crate::models::session::{AuthSession, Session};
use crate::models::user::User;
use crate::models::workspace::{DEFAULT_TIMEZONE, Workspace, WorkspaceRequest, WorkspaceUpdateRequest};

#[derive(Default)]
struct Tables {
    bookings: Vec<Booking>,
    organizations: Vec<Organization>,
    workspaces: Vec<Workspace>,
    organization_members: Vec<Member>,
    workspace_members: Vec<Member>,
}

impl Tables {
    fn members(&mut self, scope: MembershipScope) -> &mut Vec<Member> {
        match scope {
            MembershipScope::Organization => &mut self.organization_members,
            MembershipScope::Workspace => &mut self.workspace_members,
        }
    }

    fn remove_workspace(&mut self, id: &Uuid) {
        self.workspaces.retain(|w| w.id != *id);
        self.workspace_members.retain(|m| m.parent_id != *id);
    }
}

/// Storage double honoring the same uniqueness and cascade rules as the schema.
#[derive(Default)]
pub struct InMemoryRepository {
    tables: Mutex<Tables>,
}

impl InMemoryRepository {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn booking_count(&self) -> usize {
        self.tables().bookings.len()
    }
}

fn slug_taken() -> AppError {
    AppError::Conflict("Slug is already in use".to_string())
}

#[async_trait]
impl BookingRepository for InMemoryRepository {
    async fn create_booking(&self, user_id: &Uuid, request: &BookingRequest) -> Result<Booking, AppError> {
        let booking = Booking {
            id: Uuid::new_v4(),
            user_id: *user_id,
            title: request.title.clone(),
            start_time: request.start_time,
            end_time: request.end_time,
            created_at: Utc::now(),
        };
        self.tables().bookings.push(booking.clone());
        Ok(booking)
    }

    async fn get_booking_by_id(&self, id: &Uuid) -> Result<Option<Booking>, AppError> {
        Ok(self.tables().bookings.iter().find(|b| b.id == *id).cloned())
    }

    async fn list_bookings_for_user(&self, user_id: &Uuid) -> Result<Vec<Booking>, AppError> {
        let mut bookings: Vec<Booking> = self.tables().bookings.iter().filter(|b| b.user_id == *user_id).cloned().collect();
        bookings.sort_by_key(|b| b.start_time);
        Ok(bookings)
    }

    async fn update_booking(&self, id: &Uuid, request: &BookingUpdateRequest) -> Result<Booking, AppError> {
        let mut tables = self.tables();
        let booking = tables
            .bookings
            .iter_mut()
            .find(|b| b.id == *id)
            .ok_or_else(|| AppError::NotFound("Booking not found".to_string()))?;

        if let Some(title) = &request.title {
            booking.title = title.clone();
        }
        if let Some(start_time) = request.start_time {
            booking.start_time = start_time;
        }
        if let Some(end_time) = request.end_time {
            booking.end_time = end_time;
        }
        Ok(booking.clone())
    }

    async fn delete_booking(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tables = self.tables();
        let before = tables.bookings.len();
        tables.bookings.retain(|b| b.id != *id);
        if tables.bookings.len() == before {
            return Err(AppError::NotFound("Booking not found".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl OrganizationRepository for InMemoryRepository {
    async fn create_organization(&self, request: &OrganizationRequest) -> Result<Organization, AppError> {
        let mut tables = self.tables();
        if tables.organizations.iter().any(|o| o.slug == request.slug) {
            return Err(slug_taken());
        }

        let organization = Organization {
            id: Uuid::new_v4(),
            name: request.name.clone(),
            slug: request.slug.clone(),
            description: request.description.clone(),
            logo_url: request.logo_url.clone(),
            created_at: Utc::now(),
        };
        tables.organizations.push(organization.clone());
        Ok(organization)
    }

    async fn get_organization_by_id(&self, id: &Uuid) -> Result<Option<Organization>, AppError> {
        Ok(self.tables().organizations.iter().find(|o| o.id == *id).cloned())
    }

    async fn get_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, AppError> {
        Ok(self.tables().organizations.iter().find(|o| o.slug == slug).cloned())
    }

    async fn list_organizations_for_user(&self, user_id: &Uuid) -> Result<Vec<Organization>, AppError> {
        let tables = self.tables();
        let mut organizations: Vec<Organization> = tables
            .organizations
            .iter()
            .filter(|o| tables.organization_members.iter().any(|m| m.parent_id == o.id && m.user_id == *user_id))
            .cloned()
            .collect();
        organizations.sort_by_key(|o| o.created_at);
        Ok(organizations)
    }

    async fn update_organization(&self, id: &Uuid, request: &OrganizationUpdateRequest) -> Result<Organization, AppError> {
        let mut tables = self.tables();
        let slug_clash = request.slug.as_ref().is_some_and(|slug| tables.organizations.iter().any(|o| o.slug == *slug && o.id != *id));
        if slug_clash {
            return Err(slug_taken());
        }

        let organization = tables
            .organizations
            .iter_mut()
            .find(|o| o.id == *id)
            .ok_or_else(|| AppError::NotFound("Organization not found".to_string()))?;

        if let Some(name) = &request.name {
            organization.name = name.clone();
        }
        if let Some(slug) = &request.slug {
            organization.slug = slug.clone();
        }
        if let Some(description) = &request.description {
            organization.description = description.clone();
        }
        if let Some(logo_url) = &request.logo_url {
            organization.logo_url = logo_url.clone();
        }
        Ok(organization.clone())
    }

    async fn delete_organization(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tables = self.tables();
        if !tables.organizations.iter().any(|o| o.id == *id) {
            return Err(AppError::NotFound("Organization not found".to_string()));
        }

        tables.organizations.retain(|o| o.id != *id);
        tables.organization_members.retain(|m| m.parent_id != *id);
        let workspace_ids: Vec<Uuid> = tables.workspaces.iter().filter(|w| w.organization_id == *id).map(|w| w.id).collect();
        for workspace_id in &workspace_ids {
            tables.remove_workspace(workspace_id);
        }
        Ok(())
    }
}

#[async_trait]
impl WorkspaceRepository for InMemoryRepository {
    async fn create_workspace(&self, request: &WorkspaceRequest) -> Result<Workspace, AppError> {
        let mut tables = self.tables();
        if tables
            .workspaces
            .iter()
            .any(|w| w.organization_id == request.organization_id && w.slug == request.slug)
        {
            return Err(slug_taken());
        }

        let workspace = Workspace {
            id: Uuid::new_v4(),
            organization_id: request.organization_id,
            name: request.name.clone(),
            slug: request.slug.clone(),
            description: request.description.clone(),
            timezone: request.timezone.clone().unwrap_or_else(|| DEFAULT_TIMEZONE.to_string()),
            is_active: true,
            created_at: Utc::now(),
        };
        tables.workspaces.push(workspace.clone());
        Ok(workspace)
    }

    async fn get_workspace_by_id(&self, id: &Uuid) -> Result<Option<Workspace>, AppError> {
        Ok(self.tables().workspaces.iter().find(|w| w.id == *id).cloned())
    }

    async fn get_workspace_by_slug(&self, organization_id: &Uuid, slug: &str) -> Result<Option<Workspace>, AppError> {
        Ok(self
            .tables()
            .workspaces
            .iter()
            .find(|w| w.organization_id == *organization_id && w.slug == slug)
            .cloned())
    }

    async fn list_workspaces_for_organization(&self, organization_id: &Uuid) -> Result<Vec<Workspace>, AppError> {
        let mut workspaces: Vec<Workspace> = self.tables().workspaces.iter().filter(|w| w.organization_id == *organization_id).cloned().collect();
        workspaces.sort_by_key(|w| w.created_at);
        Ok(workspaces)
    }

    async fn list_workspaces_for_user(&self, user_id: &Uuid) -> Result<Vec<Workspace>, AppError> {
        let tables = self.tables();
        let mut workspaces: Vec<Workspace> = tables
            .workspaces
            .iter()
            .filter(|w| tables.workspace_members.iter().any(|m| m.parent_id == w.id && m.user_id == *user_id))
            .cloned()
            .collect();
        workspaces.sort_by_key(|w| w.created_at);
        Ok(workspaces)
    }

    async fn update_workspace(&self, id: &Uuid, request: &WorkspaceUpdateRequest) -> Result<Workspace, AppError> {
        let mut tables = self.tables();
        let organization_id = tables
            .workspaces
            .iter()
            .find(|w| w.id == *id)
            .map(|w| w.organization_id)
            .ok_or_else(|| AppError::NotFound("Workspace not found".to_string()))?;
        let slug_clash = request
            .slug
            .as_ref()
            .is_some_and(|slug| tables.workspaces.iter().any(|w| w.organization_id == organization_id && w.slug == *slug && w.id != *id));
        if slug_clash {
            return Err(slug_taken());
        }

        let workspace = tables
            .workspaces
            .iter_mut()
            .find(|w| w.id == *id)
            .ok_or_else(|| AppError::NotFound("Workspace not found".to_string()))?;

        if let Some(name) = &request.name {
            workspace.name = name.clone();
        }
        if let Some(slug) = &request.slug {
            workspace.slug = slug.clone();
        }
        if let Some(description) = &request.description {
            workspace.description = description.clone();
        }
        if let Some(timezone) = &request.timezone {
            workspace.timezone = timezone.clone();
        }
        if let Some(is_active) = request.is_active {
            workspace.is_active = is_active;
        }
        Ok(workspace.clone())
    }

    async fn delete_workspace(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tables = self.tables();
        if !tables.workspaces.iter().any(|w| w.id == *id) {
            return Err(AppError::NotFound("Workspace not found".to_string()));
        }
        tables.remove_workspace(id);
        Ok(())
    }
}

#[async_trait]
impl MemberRepository for InMemoryRepository {
    async fn add_member(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid, role: Role) -> Result<Member, AppError> {
        let mut tables = self.tables();
        let members = tables.members(scope);
        if members.iter().any(|m| m.parent_id == *parent_id && m.user_id == *user_id) {
            return Err(AppError::Conflict(format!("User is already a member of this {}", scope.label())));
        }

        let member = Member {
            id: Uuid::new_v4(),
            parent_id: *parent_id,
            user_id: *user_id,
            role,
            created_at: Utc::now(),
        };
        members.push(member.clone());
        Ok(member)
    }

    async fn get_member(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid) -> Result<Option<Member>, AppError> {
        Ok(self
            .tables()
            .members(scope)
            .iter()
            .find(|m| m.parent_id == *parent_id && m.user_id == *user_id)
            .cloned())
    }

    async fn list_members(&self, scope: MembershipScope, parent_id: &Uuid) -> Result<Vec<Member>, AppError> {
        let mut members: Vec<Member> = self.tables().members(scope).iter().filter(|m| m.parent_id == *parent_id).cloned().collect();
        members.sort_by_key(|m| m.created_at);
        Ok(members)
    }

    async fn update_member_role(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid, role: Role) -> Result<Member, AppError> {
        let mut tables = self.tables();
        let member = tables
            .members(scope)
            .iter_mut()
            .find(|m| m.parent_id == *parent_id && m.user_id == *user_id)
            .ok_or_else(|| AppError::NotFound(format!("User is not a member of this {}", scope.label())))?;
        member.role = role;
        Ok(member.clone())
    }

    async fn remove_member(&self, scope: MembershipScope, parent_id: &Uuid, user_id: &Uuid) -> Result<(), AppError> {
        let mut tables = self.tables();
        let members = tables.members(scope);
        let before = members.len();
        members.retain(|m| !(m.parent_id == *parent_id && m.user_id == *user_id));
        if members.len() == before {
            return Err(AppError::NotFound(format!("User is not a member of this {}", scope.label())));
        }
        Ok(())
    }
}

struct Account {
    user: User,
    password: String,
}

#[derive(Default)]
struct IdentityState {
    accounts: HashMap<String, Account>,
    access_tokens: HashMap<String, Uuid>,
    refresh_tokens: HashMap<String, (Uuid, String)>,
}

impl IdentityState {
    fn issue(&mut self, user: &User) -> AuthSession {
        let session = Session {
            access_token: format!("access-{}", Uuid::new_v4()),
            refresh_token: format!("refresh-{}", Uuid::new_v4()),
        };
        self.access_tokens.insert(session.access_token.clone(), user.id);
        self.refresh_tokens
            .insert(session.refresh_token.clone(), (user.id, session.access_token.clone()));
        AuthSession { user: user.clone(), session }
    }

    fn user(&self, id: &Uuid) -> Option<&User> {
        self.accounts.values().map(|a| &a.user).find(|u| u.id == *id)
    }

    fn sign_up(&mut self, username: &str, password: &str) -> Result<AuthSession, AppError> {
        if self.accounts.contains_key(username) {
            return Err(AppError::CreateUser("Failed to create user: User already registered".to_string()));
        }

        let user = User {
            id: Uuid::new_v4(),
            username: username.to_string(),
            created_at: Utc::now(),
            email_confirmed: false,
        };
        self.accounts.insert(
            username.to_string(),
            Account {
                user: user.clone(),
                password: password.to_string(),
            },
        );
        Ok(self.issue(&user))
    }
}

/// Identity provider double: opaque tokens, rotation on refresh, revocation on sign-out.
#[derive(Default)]
pub struct FakeIdentityProvider {
    state: Mutex<IdentityState>,
}

impl FakeIdentityProvider {
    fn state(&self) -> MutexGuard<'_, IdentityState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Registers `username` with the password `lovelace1` and returns its first session.
    pub fn register(&self, username: &str) -> AuthSession {
        self.state().sign_up(username, "lovelace1").expect("username is free")
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    async fn sign_up(&self, username: &str, password: &str) -> Result<AuthSession, AppError> {
        self.state().sign_up(username, password)
    }

    async fn sign_in(&self, username: &str, password: &str) -> Result<AuthSession, AppError> {
        let mut state = self.state();
        let user = match state.accounts.get(username) {
            Some(account) if account.password == password => account.user.clone(),
            _ => return Err(AppError::InvalidCredentials("Failed to login user: Invalid login credentials".to_string())),
        };
        Ok(state.issue(&user))
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AppError> {
        let mut state = self.state();
        state.access_tokens.remove(access_token);
        state.refresh_tokens.retain(|_, (_, access)| access != access_token);
        Ok(())
    }

    async fn verify(&self, access_token: &str) -> Result<User, AppError> {
        let state = self.state();
        state
            .access_tokens
            .get(access_token)
            .and_then(|id| state.user(id))
            .cloned()
            .ok_or_else(|| AppError::InvalidCredentials("Invalid token".to_string()))
    }

    async fn refresh(&self, refresh_token: &str) -> Result<AuthSession, AppError> {
        let mut state = self.state();
        let (user_id, access_token) = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or_else(|| AppError::TokenRefresh("Failed to refresh token: Invalid Refresh Token".to_string()))?;
        state.access_tokens.remove(&access_token);

        let user = state
            .user(&user_id)
            .cloned()
            .ok_or_else(|| AppError::TokenRefresh("Failed to refresh token: User not found".to_string()))?;
        Ok(state.issue(&user))
    }
}

/// A fully assembled gateway over in-memory storage and identity.
pub struct TestApp {
    pub client: Client,
    pub repo: Arc<InMemoryRepository>,
    pub identity: Arc<FakeIdentityProvider>,
}

impl TestApp {
    pub async fn new() -> Self {
        let repo = Arc::new(InMemoryRepository::default());
        let identity = Arc::new(FakeIdentityProvider::default());

        let shared_repo: SharedRepository = repo.clone();
        let shared_identity: SharedIdentityProvider = identity.clone();
        let rocket = crate::assemble(&Config::default(), shared_repo, shared_identity).expect("valid rocket configuration");
        let client = Client::tracked(rocket).await.expect("valid rocket instance");

        Self { client, repo, identity }
    }

    /// Registers a user and returns an access token for it.
    pub fn token_for(&self, username: &str) -> String {
        self.user_for(username).1
    }

    pub fn user_for(&self, username: &str) -> (Uuid, String) {
        let auth = self.identity.register(username);
        (auth.user.id, auth.session.access_token)
    }

    pub fn bearer(token: &str) -> Header<'static> {
        Header::new("Authorization", format!("Bearer {}", token))
    }
}
