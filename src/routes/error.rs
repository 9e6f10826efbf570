use crate::error::app_error::ErrorResponse;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{Request, catch};

fn code_for(status: Status) -> &'static str {
    match status.code {
        400 | 413 => "bad_request",
        401 => "unauthorized",
        403 => "forbidden",
        404 => "not_found",
        409 => "conflict",
        422 => "validation_error",
        500..=599 => "internal_error",
        _ => "error",
    }
}

fn envelope(status: Status, req: &Request<'_>, fallback: &str) -> (Status, Json<ErrorResponse>) {
    // Guards that failed leave their own envelope behind.
    let body = req
        .local_cache(|| None::<ErrorResponse>)
        .clone()
        .unwrap_or_else(|| ErrorResponse::new(code_for(status), fallback));
    (status, Json(body))
}

#[catch(404)]
pub fn not_found(req: &Request) -> (Status, Json<ErrorResponse>) {
    envelope(Status::NotFound, req, "Resource not found")
}

#[catch(default)]
pub fn default_catcher(status: Status, req: &Request) -> (Status, Json<ErrorResponse>) {
    let reason = status.reason().unwrap_or("Request failed");
    envelope(status, req, reason)
}

#[cfg(test)]
mod tests {
    use super::code_for;
    use rocket::http::Status;

    #[test]
    fn catcher_codes_follow_status() {
        assert_eq!(code_for(Status::Unauthorized), "unauthorized");
        assert_eq!(code_for(Status::UnprocessableEntity), "validation_error");
        assert_eq!(code_for(Status::PayloadTooLarge), "bad_request");
        assert_eq!(code_for(Status::ServiceUnavailable), "internal_error");
        assert_eq!(code_for(Status::ImATeapot), "error");
    }
}
