use crate::auth::CurrentUser;
use crate::database::SharedRepository;
use crate::error::app_error::AppError;
use crate::error::json::JsonBody;
use crate::models::member::{AddMemberRequest, UpdateMemberRoleRequest, WorkspaceMemberResponse};
use crate::models::response::{ApiResponse, MessageResponse};
use crate::models::workspace::{CreatedWorkspaceResponse, WorkspaceRequest, WorkspaceResponse, WorkspaceUpdateRequest};
use crate::routes::parse_uuid;
use crate::service::workspace::WorkspaceService;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{State, delete, get, patch, post};
use rocket_okapi::openapi;
use validator::Validate;

/// Create a workspace inside an organization (organization admin or owner)
#[openapi(tag = "Workspaces")]
#[post("/", data = "<payload>")]
pub async fn create_workspace(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    payload: JsonBody<WorkspaceRequest>,
) -> Result<(Status, Json<ApiResponse<CreatedWorkspaceResponse>>), AppError> {
    payload.validate()?;

    let created = WorkspaceService::new(repo.inner().as_ref()).create_workspace(&current_user.id, &payload).await?;
    Ok((Status::Created, Json(ApiResponse::new(CreatedWorkspaceResponse::from(&created)))))
}

/// List the workspaces the caller belongs to
#[openapi(tag = "Workspaces")]
#[get("/")]
pub async fn list_workspaces(repo: &State<SharedRepository>, current_user: CurrentUser) -> Result<Json<ApiResponse<Vec<WorkspaceResponse>>>, AppError> {
    let workspaces = WorkspaceService::new(repo.inner().as_ref()).list_workspaces(&current_user.id).await?;
    Ok(Json(ApiResponse::new(workspaces.iter().map(WorkspaceResponse::from).collect())))
}

/// Look up a workspace by its slug within an organization
#[openapi(tag = "Workspaces")]
#[get("/by-slug/<organization_id>/<slug>")]
pub async fn get_workspace_by_slug(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    organization_id: &str,
    slug: &str,
) -> Result<Json<ApiResponse<WorkspaceResponse>>, AppError> {
    let organization_id = parse_uuid(organization_id, "organization id")?;

    let workspace = WorkspaceService::new(repo.inner().as_ref())
        .get_workspace_by_slug(&organization_id, slug, &current_user.id)
        .await?;
    Ok(Json(ApiResponse::new(WorkspaceResponse::from(&workspace))))
}

/// Get a workspace by ID
#[openapi(tag = "Workspaces")]
#[get("/<id>")]
pub async fn get_workspace(repo: &State<SharedRepository>, current_user: CurrentUser, id: &str) -> Result<Json<ApiResponse<WorkspaceResponse>>, AppError> {
    let workspace_id = parse_uuid(id, "workspace id")?;

    let workspace = WorkspaceService::new(repo.inner().as_ref()).get_workspace(&workspace_id, &current_user.id).await?;
    Ok(Json(ApiResponse::new(WorkspaceResponse::from(&workspace))))
}

/// Update workspace settings (admin or owner)
#[openapi(tag = "Workspaces")]
#[patch("/<id>", data = "<payload>")]
pub async fn update_workspace(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<WorkspaceUpdateRequest>,
) -> Result<Json<ApiResponse<WorkspaceResponse>>, AppError> {
    payload.validate()?;
    let workspace_id = parse_uuid(id, "workspace id")?;

    let workspace = WorkspaceService::new(repo.inner().as_ref())
        .update_workspace(&workspace_id, &current_user.id, &payload)
        .await?;
    Ok(Json(ApiResponse::new(WorkspaceResponse::from(&workspace))))
}

/// Delete a workspace (owner only)
#[openapi(tag = "Workspaces")]
#[delete("/<id>")]
pub async fn delete_workspace(repo: &State<SharedRepository>, current_user: CurrentUser, id: &str) -> Result<Json<MessageResponse>, AppError> {
    let workspace_id = parse_uuid(id, "workspace id")?;

    WorkspaceService::new(repo.inner().as_ref()).delete_workspace(&workspace_id, &current_user.id).await?;
    Ok(Json(MessageResponse::new("Workspace deleted")))
}

#[openapi(tag = "Workspaces")]
#[get("/<id>/members")]
pub async fn list_members(repo: &State<SharedRepository>, current_user: CurrentUser, id: &str) -> Result<Json<ApiResponse<Vec<WorkspaceMemberResponse>>>, AppError> {
    let workspace_id = parse_uuid(id, "workspace id")?;

    let members = WorkspaceService::new(repo.inner().as_ref()).list_members(&workspace_id, &current_user.id).await?;
    Ok(Json(ApiResponse::new(members.iter().map(WorkspaceMemberResponse::from).collect())))
}

#[openapi(tag = "Workspaces")]
#[post("/<id>/members", data = "<payload>")]
pub async fn add_member(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    id: &str,
    payload: JsonBody<AddMemberRequest>,
) -> Result<(Status, Json<ApiResponse<WorkspaceMemberResponse>>), AppError> {
    payload.validate()?;
    let workspace_id = parse_uuid(id, "workspace id")?;

    let member = WorkspaceService::new(repo.inner().as_ref())
        .add_member(&workspace_id, &current_user.id, &payload)
        .await?;
    Ok((Status::Created, Json(ApiResponse::new(WorkspaceMemberResponse::from(&member)))))
}

#[openapi(tag = "Workspaces")]
#[patch("/<id>/members/<user_id>", data = "<payload>")]
pub async fn change_member_role(
    repo: &State<SharedRepository>,
    current_user: CurrentUser,
    id: &str,
    user_id: &str,
    payload: JsonBody<UpdateMemberRoleRequest>,
) -> Result<Json<ApiResponse<WorkspaceMemberResponse>>, AppError> {
    let workspace_id = parse_uuid(id, "workspace id")?;
    let target_user_id = parse_uuid(user_id, "user id")?;

    let member = WorkspaceService::new(repo.inner().as_ref())
        .change_member_role(&workspace_id, &current_user.id, &target_user_id, payload.role)
        .await?;
    Ok(Json(ApiResponse::new(WorkspaceMemberResponse::from(&member))))
}

#[openapi(tag = "Workspaces")]
#[delete("/<id>/members/<user_id>")]
pub async fn remove_member(repo: &State<SharedRepository>, current_user: CurrentUser, id: &str, user_id: &str) -> Result<Json<MessageResponse>, AppError> {
    let workspace_id = parse_uuid(id, "workspace id")?;
    let target_user_id = parse_uuid(user_id, "user id")?;

    WorkspaceService::new(repo.inner().as_ref())
        .remove_member(&workspace_id, &current_user.id, &target_user_id)
        .await?;
    Ok(Json(MessageResponse::new("Member removed")))
}

pub fn routes() -> (Vec<rocket::Route>, okapi::openapi3::OpenApi) {
    rocket_okapi::openapi_get_routes_spec![
        create_workspace,
        list_workspaces,
        get_workspace_by_slug,
        get_workspace,
        update_workspace,
        delete_workspace,
        list_members,
        add_member,
        change_member_role,
        remove_member
    ]
}

#[cfg(test)]
mod tests {
    use crate::test_utils::TestApp;
    use rocket::http::{ContentType, Status};
    use serde_json::{Value, json};

    async fn post_json(app: &TestApp, uri: &str, token: &str, body: Value) -> (Status, Value) {
        let response = app
            .client
            .post(uri)
            .header(ContentType::JSON)
            .header(TestApp::bearer(token))
            .body(body.to_string())
            .dispatch()
            .await;
        let status = response.status();
        (status, response.into_json().await.unwrap_or(Value::Null))
    }

    #[rocket::async_test]
    async fn outsider_cannot_rename_workspace() {
        let app = TestApp::new().await;
        let owner = app.token_for("u@example.com");
        let outsider = app.token_for("v@example.com");

        let (status, body) = post_json(&app, "/api/v1/organizations", &owner, json!({"name": "Acme", "slug": "acme"})).await;
        assert_eq!(status, Status::Created);
        let organization_id = body["data"]["organization"]["id"].as_str().unwrap().to_string();

        let (status, body) = post_json(&app, "/api/v1/workspaces", &owner, json!({"organizationId": organization_id, "name": "Sales", "slug": "sales"})).await;
        assert_eq!(status, Status::Created);
        assert_eq!(body["data"]["workspace"]["timezone"], "UTC");
        assert_eq!(body["data"]["membership"]["role"], "owner");
        let workspace_id = body["data"]["workspace"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/workspaces/{}", workspace_id);
        let response = app
            .client
            .patch(uri.as_str())
            .header(ContentType::JSON)
            .header(TestApp::bearer(&outsider))
            .body(json!({"name": "Hijacked"}).to_string())
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::Forbidden);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["code"], "forbidden");

        let slug_uri = format!("/api/v1/workspaces/by-slug/{}/sales", organization_id);
        let response = app.client.get(slug_uri.as_str()).header(TestApp::bearer(&owner)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["data"]["name"], "Sales");
    }

    #[rocket::async_test]
    async fn slug_lookup_takes_organization_and_slug_segments() {
        let app = TestApp::new().await;
        let owner = app.token_for("u@example.com");
        let outsider = app.token_for("v@example.com");

        let (_, body) = post_json(&app, "/api/v1/organizations", &owner, json!({"name": "Acme", "slug": "acme"})).await;
        let organization_id = body["data"]["organization"]["id"].as_str().unwrap().to_string();
        let (_, body) = post_json(&app, "/api/v1/workspaces", &owner, json!({"organizationId": organization_id, "name": "Sales", "slug": "sales"})).await;
        let workspace_id = body["data"]["workspace"]["id"].as_str().unwrap().to_string();

        let uri = format!("/api/v1/workspaces/by-slug/{}/sales", organization_id);
        let response = app.client.get(uri.as_str()).header(TestApp::bearer(&owner)).dispatch().await;
        assert_eq!(response.status(), Status::Ok);
        let body: Value = response.into_json().await.unwrap();
        assert_eq!(body["data"]["id"], workspace_id.as_str());

        let response = app.client.get(uri.as_str()).header(TestApp::bearer(&outsider)).dispatch().await;
        assert_eq!(response.status(), Status::Forbidden);

        let missing = format!("/api/v1/workspaces/by-slug/{}/support", organization_id);
        let response = app.client.get(missing.as_str()).header(TestApp::bearer(&owner)).dispatch().await;
        assert_eq!(response.status(), Status::NotFound);

        let response = app
            .client
            .get("/api/v1/workspaces/by-slug/not-a-uuid/sales")
            .header(TestApp::bearer(&owner))
            .dispatch()
            .await;
        assert_eq!(response.status(), Status::BadRequest);
    }

    #[rocket::async_test]
    async fn plain_org_member_cannot_create_workspace() {
        let app = TestApp::new().await;
        let owner = app.token_for("u@example.com");
        let (member_id, member) = app.user_for("m@example.com");

        let (_, body) = post_json(&app, "/api/v1/organizations", &owner, json!({"name": "Acme", "slug": "acme"})).await;
        let organization_id = body["data"]["organization"]["id"].as_str().unwrap().to_string();
        let members_uri = format!("/api/v1/organizations/{}/members", organization_id);
        let (status, _) = post_json(&app, &members_uri, &owner, json!({"userId": member_id})).await;
        assert_eq!(status, Status::Created);

        let (status, body) = post_json(&app, "/api/v1/workspaces", &member, json!({"organizationId": organization_id, "name": "Sales", "slug": "sales"})).await;
        assert_eq!(status, Status::Forbidden);
        assert_eq!(body["code"], "forbidden");
    }

    #[rocket::async_test]
    async fn unknown_timezone_is_rejected() {
        let app = TestApp::new().await;
        let owner = app.token_for("u@example.com");
        let (_, body) = post_json(&app, "/api/v1/organizations", &owner, json!({"name": "Acme", "slug": "acme"})).await;
        let organization_id = body["data"]["organization"]["id"].as_str().unwrap().to_string();

        let (status, body) = post_json(
            &app,
            "/api/v1/workspaces",
            &owner,
            json!({"organizationId": organization_id, "name": "Sales", "slug": "sales", "timezone": "Mars/Olympus"}),
        )
        .await;
        assert_eq!(status, Status::UnprocessableEntity);
        assert!(body["errors"]["timezone"].is_array());
    }

    #[rocket::async_test]
    async fn workspace_owner_cannot_be_added_twice() {
        let app = TestApp::new().await;
        let (owner_id, owner) = app.user_for("u@example.com");
        let (_, body) = post_json(&app, "/api/v1/organizations", &owner, json!({"name": "Acme", "slug": "acme"})).await;
        let organization_id = body["data"]["organization"]["id"].as_str().unwrap().to_string();
        let (_, body) = post_json(&app, "/api/v1/workspaces", &owner, json!({"organizationId": organization_id, "name": "Sales", "slug": "sales"})).await;
        let workspace_id = body["data"]["workspace"]["id"].as_str().unwrap().to_string();

        let members_uri = format!("/api/v1/workspaces/{}/members", workspace_id);
        let (status, body) = post_json(&app, &members_uri, &owner, json!({"userId": owner_id, "role": "admin"})).await;
        assert_eq!(status, Status::Conflict);
        assert_eq!(body["code"], "conflict");
    }
}
