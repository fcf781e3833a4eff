use axum::{
    extract::Request,
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DatabaseConnection, EntityTrait};
use serde_json::json;
use tower_cookies::Cookies;

use crate::entities::user;
use crate::roles::{Action, Role};

pub const SESSION_COOKIE: &str = "medtrack_user";

/// Authenticated staff member, attached to the request by [`auth_middleware`].
#[derive(Clone, Copy, Debug)]
pub struct AuthUser {
    pub id: i32,
    pub role: Role,
}

pub async fn auth_middleware(cookies: Cookies, mut request: Request, next: Next) -> Response {
    let user_id = match cookies
        .get(SESSION_COOKIE)
        .and_then(|c| c.value().parse::<i32>().ok())
    {
        Some(id) => id,
        None => return unauthorized(),
    };

    // Extension layers wrap the router outside this middleware, so the
    // connection is already present on the request.
    let db = match request.extensions().get::<DatabaseConnection>() {
        Some(db) => db.clone(),
        None => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Database unavailable"})),
            )
                .into_response()
        }
    };

    match user::Entity::find_by_id(user_id).one(&db).await {
        Ok(Some(u)) => match Role::parse(&u.role) {
            Some(role) => {
                request
                    .extensions_mut()
                    .insert(AuthUser { id: u.id, role });
                next.run(request).await
            }
            None => unauthorized(),
        },
        Ok(None) => unauthorized(),
        Err(e) => {
            tracing::error!("Failed to load session user: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "Database error"})),
            )
                .into_response()
        }
    }
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Unauthorized"})),
    )
        .into_response()
}

/// Capability gate used at the top of mutating handlers.
pub fn require(auth: &AuthUser, action: Action) -> Result<(), Response> {
    if auth.role.allows(action) {
        Ok(())
    } else {
        Err((
            StatusCode::FORBIDDEN,
            Json(json!({"error": "Your role does not permit this operation"})),
        )
            .into_response())
    }
}
