use std::collections::HashMap;

use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use uuid::Uuid;
use validator::Validate;

use crate::{
    auth::CurrentUser,
    error::AppError,
    models::{CreateTaskInput, UpdateTaskInput},
    pagination::PaginationQuery,
    services::{parse_relations, TaskService},
};

/// Retrieves one page of the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `page`, `limit`, `sort_key` (or `sortKey`), `sort_asc` (or `sortAsc`): pagination.
///   Invalid values fall back to defaults instead of failing.
/// - `title` (optional): case-insensitive partial match.
/// - `status`, `priority` (optional): exact match.
/// - `due_date_start`, `due_date_end`, `created_at_start`, `created_at_end`,
///   `updated_at_start`, `updated_at_end` (optional): inclusive RFC 3339 bounds.
/// - `relations` (optional): comma-separated; `user` embeds the owner.
///
/// ## Responses:
/// - `200 OK`: `{ "items": [...], "total_count": n, "pages": n }`.
/// - `400 Bad Request`: If a filter value has the wrong format.
/// - `401 Unauthorized`: If the request lacks a valid access token.
#[get("")]
pub async fn get_tasks(
    user: CurrentUser,
    service: web::Data<TaskService>,
    pagination: web::Query<PaginationQuery>,
    params: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let relations = parse_relations(params.get("relations").map(String::as_str));
    let page = service
        .list(user.id(), &pagination, &params, &relations)
        .await?;

    Ok(HttpResponse::Ok().json(page))
}

/// Creates a new task owned by the authenticated user.
///
/// ## Responses:
/// - `201 Created`: Returns the new `Task`.
/// - `422 Unprocessable Entity`: If validation fails (e.g. empty title).
#[post("")]
pub async fn create_task(
    user: CurrentUser,
    service: web::Data<TaskService>,
    task_data: web::Json<CreateTaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = service.create(user.id(), task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(task))
}

/// Retrieves a specific task by its ID.
///
/// Tasks of other users are reported as `404 Not Found`.
#[get("/{id}")]
pub async fn get_task(
    user: CurrentUser,
    service: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    params: web::Query<HashMap<String, String>>,
) -> Result<impl Responder, AppError> {
    let relations = parse_relations(params.get("relations").map(String::as_str));
    let task = service
        .get_by_id(user.id(), task_id.into_inner(), &relations)
        .await?;

    Ok(HttpResponse::Ok().json(task))
}

/// Partially updates a task. Absent fields are left unchanged.
#[patch("/{id}")]
pub async fn update_task(
    user: CurrentUser,
    service: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskInput>,
) -> Result<impl Responder, AppError> {
    task_data.validate()?;

    let task = service
        .update(user.id(), task_id.into_inner(), task_data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(task))
}

#[delete("/{id}")]
pub async fn delete_task(
    user: CurrentUser,
    service: web::Data<TaskService>,
    task_id: web::Path<Uuid>,
) -> Result<impl Responder, AppError> {
    service.delete(user.id(), task_id.into_inner()).await?;
    Ok(HttpResponse::NoContent().finish())
}
