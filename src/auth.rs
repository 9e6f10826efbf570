use crate::error::app_error::{AppError, stash_guard_error};
use crate::identity::SharedIdentityProvider;
use crate::models::user::User;
use crate::service::auth::AuthService;
use rocket::http::Status;
use rocket::outcome::Outcome;
use rocket::request::{FromRequest, Outcome as RequestOutcome, Request};
use rocket_okapi::r#gen::OpenApiGenerator;
use rocket_okapi::okapi::openapi3::{Object, Responses, SecurityRequirement, SecurityScheme, SecuritySchemeData};
use rocket_okapi::request::{OpenApiFromRequest, RequestHeaderInput};
use uuid::Uuid;

/// The caller behind a verified bearer token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub user: User,
}

/// Extracts the token from an `Authorization: Bearer <token>` header value.
pub(crate) fn parse_bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() { None } else { Some(token) }
}

async fn authenticate(req: &Request<'_>) -> Result<CurrentUser, AppError> {
    let token = req
        .headers()
        .get_one("Authorization")
        .and_then(parse_bearer_token)
        .ok_or_else(|| AppError::Unauthorized("Missing or invalid authorization header".to_string()))?;

    let identity = req
        .rocket()
        .state::<SharedIdentityProvider>()
        .ok_or_else(|| AppError::Internal("Identity provider is not configured".to_string()))?;

    let user = AuthService::new(identity.as_ref()).verify(token).await?;
    Ok(CurrentUser { id: user.id, user })
}

#[rocket::async_trait]
impl<'r> FromRequest<'r> for CurrentUser {
    type Error = AppError;

    async fn from_request(req: &'r Request<'_>) -> RequestOutcome<Self, Self::Error> {
        // The token is verified at most once per request, whichever guard asks first.
        let mut failure = None;
        let cached = req
            .local_cache_async(async {
                match authenticate(req).await {
                    Ok(user) => Some(user),
                    Err(err) => {
                        failure = Some(err);
                        None
                    }
                }
            })
            .await;

        match cached {
            Some(user) => Outcome::Success(user.clone()),
            None => {
                let err = failure.unwrap_or_else(|| AppError::Unauthorized("Authentication required".to_string()));
                stash_guard_error(req, &err);
                Outcome::Error((Status::from(&err), err))
            }
        }
    }
}

impl<'a> OpenApiFromRequest<'a> for CurrentUser {
    fn from_request_input(_gen: &mut OpenApiGenerator, _name: String, _required: bool) -> rocket_okapi::Result<RequestHeaderInput> {
        let security_scheme = SecurityScheme {
            description: Some("Bearer access token issued by POST /auth/login or /auth/register.".to_string()),
            data: SecuritySchemeData::Http {
                scheme: "bearer".to_string(),
                bearer_format: Some("JWT".to_string()),
            },
            extensions: Object::default(),
        };

        let mut security_req = SecurityRequirement::new();
        security_req.insert("bearerAuth".to_string(), Vec::new());

        Ok(RequestHeaderInput::Security("bearerAuth".to_string(), security_scheme, security_req))
    }

    fn get_responses(_gen: &mut OpenApiGenerator) -> rocket_okapi::Result<Responses> {
        use rocket_okapi::okapi::openapi3::{RefOr, Response};
        let mut responses = Responses::default();
        responses.responses.insert(
            "401".to_string(),
            RefOr::Object(Response {
                description: "Unauthorized - Authentication required".to_string(),
                ..Default::default()
            }),
        );
        Ok(responses)
    }
}
