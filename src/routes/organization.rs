use crate::auth::CurrentUser;
use crate::database::SharedRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::member::{AddMemberRequest, OrganizationMemberResponse, UpdateMemberRoleRequest};
use crate::models::organization::{CreatedOrganizationResponse, OrganizationRequest, OrganizationResponse, OrganizationUpdateRequest};
use crate::models::response::{ApiResponse, MessageResponse};
use crate::models::workspace::WorkspaceResponse;
use crate::routes::parse_uuid;
use crate::service::organization::OrganizationService;
use crate::service::workspace::WorkspaceService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, patch, post};
use rocket_okapi::openapi;
use validator::Validate;

/// Create an organization owned by the caller
#[openapi(tag = "Organizations")]
#[post("/", data = "<payload>")]
pub async fn create_organization(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    payload: JsonBody<OrganizationRequest>,
) -> Result<(Status, Json<ApiResponse<CreatedOrganizationResponse>>), AppError> {
    payload.validate()?;

    let created = OrganizationService::new(repo.inner().as_ref())
        .create_organization(&current_user.id, &payload)
        .await?;
    Ok((Status::Created, Json(ApiResponse::new(CreatedOrganizationResponse::from(&created)))))
}

/// List the organizations the caller belongs to
#[openapi(tag = "Organizations")]
#[get("/")]
pub async fn list_organizations(repo: &State<SharedRepository>, current_user: CurrentUser) -> Result<Json<ApiResponse<Vec<OrganizationResponse>>>, AppError> {
    let organizations = OrganizationService::new(repo.inner().as_ref()).list_organizations(&current_user.id).await?;
    Ok(Json(ApiResponse::new(organizations.iter().map(OrganizationResponse::from).collect())))
}

/// Look up an organization by its slug
#[openapi(tag = "Organizations")]
#[get("/by-slug/<slug>")]
pub async fn get_organization_by_slug(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    slug: &str,
) -> Result<Json<ApiResponse<OrganizationResponse>>, AppError> {
    let organization = OrganizationService::new(repo.inner().as_ref())
        .get_organization_by_slug(slug, &current_user.id)
        .await?;
    Ok(Json(ApiResponse::new(OrganizationResponse::from(&organization))))
}

/// Get an organization by ID
#[openapi(tag = "Organizations")]
#[get("/<id>")]
pub async fn get_organization(repo: &State<SharedRepository>, current_user: CurrentUser, id: &str) -> Result<Json<ApiResponse<OrganizationResponse>>, AppError> {
    let organization_id = parse_uuid(id, "organization id")?;

    let organization = OrganizationService::new(repo.inner().as_ref())
        .get_organization(&organization_id, &current_user.id)
        .await?;
    Ok(Json(ApiResponse::new(OrganizationResponse::from(&organization))))
}

/// Update organization settings (admin or owner)
#[openapi(tag = "Organizations")]
#[patch("/<id>", data = "<payload>")]
pub async fn update_organization(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<OrganizationUpdateRequest>,
) -> Result<Json<ApiResponse<OrganizationResponse>>, AppError> {
    payload.validate()?;
    let organization_id = parse_uuid(id, "organization id")?;

    let organization = OrganizationService::new(repo.inner().as_ref())
        .update_organization(&organization_id, &current_user.id, &payload)
        .await?;
    Ok(Json(ApiResponse::new(OrganizationResponse::from(&organization))))
}

/// Delete an organization with its workspaces (owner only)
#[openapi(tag = "Organizations")]
#[delete("/<id>")]
pub async fn delete_organization(repo: &State<SharedRepository>, current_user: CurrentUser, id: &str) -> Result<Json<MessageResponse>, AppError> {
    let organization_id = parse_uuid(id, "organization id")?;

    OrganizationService::new(repo.inner().as_ref())
        .delete_organization(&organization_id, &current_user.id)
        .await?;
    Ok(Json(MessageResponse::new("Organization deleted")))
}

/// List the members of an organization
#[openapi(tag = "Organizations")]
#[get("/<id>/members", rank = 2)]
pub async fn list_members(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    id: &str,
) -> Result<Json<ApiResponse<Vec<OrganizationMemberResponse>>>, AppError> {
    let organization_id = parse_uuid(id, "organization id")?;

    let members = OrganizationService::new(repo.inner().as_ref())
        .list_members(&organization_id, &current_user.id)
        .await?;
    Ok(Json(ApiResponse::new(members.iter().map(OrganizationMemberResponse::from).collect())))
}

/// Add a member as admin or member (admin or owner)
#[openapi(tag = "Organizations")]
#[post("/<id>/members", data = "<payload>")]
pub async fn add_member(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<AddMemberRequest>,
) -> Result<(Status, Json<ApiResponse<OrganizationMemberResponse>>), AppError> {
    payload.validate()?;
    let organization_id = parse_uuid(id, "organization id")?;

    let member = OrganizationService::new(repo.inner().as_ref())
        .add_member(&organization_id, &current_user.id, &payload)
        .await?;
    Ok((Status::Created, Json(ApiResponse::new(OrganizationMemberResponse::from(&member)))))
}

/// Change a member's role (owner only, never your own)
#[openapi(tag = "Organizations")]
#[patch("/<id>/members/<user_id>", data = "<payload>")]
pub async fn change_member_role(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    id: &str,
    user_id: &str,
    payload: JsonBody<UpdateMemberRoleRequest>,
) -> Result<Json<ApiResponse<OrganizationMemberResponse>>, AppError> {
    let organization_id = parse_uuid(id, "organization id")?;
    let target_user_id = parse_uuid(user_id, "user id")?;

    let member = OrganizationService::new(repo.inner().as_ref())
        .change_member_role(&organization_id, &current_user.id, &target_user_id, payload.role)
        .await?;
    Ok(Json(ApiResponse::new(OrganizationMemberResponse::from(&member))))
}

/// Remove a member (admin or owner); the last owner stays
#[openapi(tag = "Organizations")]
#[delete("/<id>/members/<user_id>")]
pub async fn remove_member(repo: &State<SharedRepository>, current_user: CurrentUser, id: &str, user_id: &str) -> Result<Json<MessageResponse>, AppError> {
    let organization_id = parse_uuid(id, "organization id")?;
    let target_user_id = parse_uuid(user_id, "user id")?;

    OrganizationService::new(repo.inner().as_ref())
        .remove_member(&organization_id, &current_user.id, &target_user_id)
        .await?;
    Ok(Json(MessageResponse::new("Member removed")))
}

/// List the workspaces of an organization
#[openapi(tag = "Organizations")]
#[get("/<id>/workspaces", rank = 2)]
pub async fn list_organization_workspaces(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    id: &str,
) -> Result<Json<ApiResponse<Vec<WorkspaceResponse>>>, AppError> {
    let organization_id = parse_uuid(id, "organization id")?;

    let workspaces = WorkspaceService::new(repo.inner().as_ref())
        .list_organization_workspaces(&organization_id, &current_user.id)
        .await?;
    Ok(Json(ApiResponse::new(workspaces.iter().map(WorkspaceResponse::from).collect())))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![
        create_organization,
        list_organizations,
        get_organization_by_slug,
        get_organization,
        update_organization,
        delete_organization,
        list_members,
        add_member,
        change_member_role,
        remove_member,
        list_organization_workspaces
    ]
}
