use std::collections::HashMap;

use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{CreateUserInput, Role, UpdateUserInput},
    pagination::PaginationQuery,
    services::UserService,
};

/// Lists users. Admin only.
///
/// ## Query Parameters:
/// - Pagination as for `/api/tasks`.
/// - `email`, `full_name` (optional): case-insensitive partial match.
/// - `role` (optional): `admin` or `user`.
/// - `created_at_*`, `updated_at_*` (optional): inclusive RFC 3339 bounds.
///
/// ## Responses:
/// - `200 OK`: `{ "items": [...], "total_count": n, "pages": n }`.
/// - `403 Forbidden`: If the caller is not an admin.
#[get("")]
pub async fn get_users(
    user: CurrentUser,
    service: web::Data<UserService>,
    pagination: web::Query<PaginationQuery>,
    params: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Admin)?;

    let page = service.list(&pagination, &params).await?;
    Ok(HttpResponse::Ok().json(page))
}

#[post("")]
pub async fn create_user(
    user: CurrentUser,
    service: web::Data<UserService>,
    user_data: web::Json<CreateUserInput>,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Admin)?;
    user_data.validate()?;

    let created = service.create(user_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(created))
}

#[get("/{id}")]
pub async fn get_user(
    user: CurrentUser,
    service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Admin)?;

    let found = service.get_by_id(user_id.into_inner()).await?;
    Ok(HttpResponse::Ok().json(found))
}

/// Partially updates a user. A new password is hashed before it is stored.
#[patch("/{id}")]
pub async fn update_user(
    user: CurrentUser,
    service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
    user_data: web::Json<UpdateUserInput>,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Admin)?;
    user_data.validate()?;

    let updated = service
        .update(user_id.into_inner(), user_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(updated))
}

#[delete("/{id}")]
pub async fn delete_user(
    user: CurrentUser,
    service: web::Data<UserService>,
    user_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    user.require_role(Role::Admin)?;

    service.delete(user_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
