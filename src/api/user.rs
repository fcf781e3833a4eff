use crate::api::middleware::{require, AuthUser};
use crate::entities::user;
use crate::roles::{Action, Role};
use axum::{
    extract::{Extension, Json, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryOrder, Set};
use serde_json::json;

// All user management is administrator-only; self-registration lives in auth.

pub async fn list_users(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManageUsers) {
        return denied;
    }

    match user::Entity::find()
        .order_by_asc(user::Column::Username)
        .all(&db)
        .await
    {
        Ok(users) => (StatusCode::OK, Json(users)).into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

#[derive(serde::Deserialize)]
pub struct UpdateUserRequest {
    username: Option<String>,
    role: Option<String>,
}

pub async fn update_user(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i32>,
    Json(payload): Json<UpdateUserRequest>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManageUsers) {
        return denied;
    }

    let role = match payload.role.as_deref() {
        Some(raw) => match Role::parse(raw) {
            Some(role) => Some(role),
            None => {
                return (
                    StatusCode::BAD_REQUEST,
                    Json(json!({"error": "Role must be administrator, doctor or nurse"})),
                )
                    .into_response()
            }
        },
        None => None,
    };

    let user = match user::Entity::find_by_id(user_id).one(&db).await {
        Ok(Some(u)) => u,
        Ok(None) => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({"error": "User not found"})),
            )
                .into_response()
        }
        Err(e) => {
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": e.to_string()})),
            )
                .into_response()
        }
    };

    let mut active_user = user.into_active_model();
    if let Some(username) = payload.username {
        active_user.username = Set(username);
    }
    if let Some(role) = role {
        active_user.role = Set(role.as_str().to_string());
    }
    active_user.updated_at = Set(chrono::Utc::now().naive_utc());

    match active_user.update(&db).await {
        Ok(u) => (
            StatusCode::OK,
            Json(json!({"id": u.id, "username": u.username, "role": u.role})),
        )
            .into_response(),
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}

pub async fn delete_user(
    Extension(db): Extension<DatabaseConnection>,
    Extension(auth): Extension<AuthUser>,
    Path(user_id): Path<i32>,
) -> Response {
    if let Err(denied) = require(&auth, Action::ManageUsers) {
        return denied;
    }

    match user::Entity::delete_by_id(user_id).exec(&db).await {
        Ok(res) if res.rows_affected == 0 => (
            StatusCode::NOT_FOUND,
            Json(json!({"error": "User not found"})),
        )
            .into_response(),
        Ok(_) => {
            metrics::gauge!("medtrack_users_total").decrement(1.0);
            (StatusCode::OK, Json(json!({"message": "User deleted"}))).into_response()
        }
        Err(e) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({"error": e.to_string()})),
        )
            .into_response(),
    }
}
