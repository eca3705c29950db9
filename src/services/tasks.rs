use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::Page;
use crate::error::AppError;
use crate::filter::{translate_filter, ConditionSet};
use crate::models::{CreateTaskInput, Task, TaskFilter, TaskPatch, UpdateTaskInput, User};
use crate::pagination::{PaginationDefaults, PaginationQuery};
use crate::repository::Repository;

/// Task operations, always scoped to the calling user.
#[derive(Clone)]
pub struct TaskService {
    tasks: Arc<dyn Repository<Task>>,
    users: Arc<dyn Repository<User>>,
    defaults: PaginationDefaults,
}

impl TaskService {
    pub fn new(tasks: Arc<dyn Repository<Task>>, users: Arc<dyn Repository<User>>) -> Self {
        Self {
            tasks,
            users,
            defaults: PaginationDefaults::default(),
        }
    }

    pub fn with_defaults(mut self, defaults: PaginationDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    fn owned(caller: Uuid, id: Uuid) -> ConditionSet {
        ConditionSet::new().eq("id", id).eq("user_id", caller)
    }

    /// Lists the caller's tasks matching `filter`, one page at a time.
    ///
    /// The `user_id` scope is appended after the filter's own conditions, so a filter
    /// can narrow the result but never widen it to other users' tasks.
    pub async fn list(
        &self,
        caller: Uuid,
        pagination: &PaginationQuery,
        filter: &HashMap<String, String>,
        relations: &[String],
    ) -> Result<Page<Task>, AppError> {
        let pagination = pagination.resolve(&self.defaults);
        let conditions = translate_filter::<TaskFilter>(filter)?.eq("user_id", caller);

        let result = self
            .tasks
            .find_and_count(&conditions, relations, &pagination)
            .await?;
        Ok(Page::from_result(result, pagination.limit))
    }

    pub async fn get_by_id(
        &self,
        caller: Uuid,
        id: Uuid,
        relations: &[String],
    ) -> Result<Task, AppError> {
        self.tasks
            .find_one(&Self::owned(caller, id), relations)
            .await?
            .ok_or_else(|| AppError::NotFound("Task not found".into()))
    }

    pub async fn create(&self, caller: Uuid, input: CreateTaskInput) -> Result<Task, AppError> {
        let owner = self
            .users
            .find_one(&ConditionSet::new().eq("id", caller), &[])
            .await?;
        if owner.is_none() {
            return Err(AppError::NotFound("User not found".into()));
        }

        let task = self.tasks.insert(&Task::new(input, caller)).await?;
        log::info!("task {} created by user {}", task.id, caller);
        Ok(task)
    }

    pub async fn update(
        &self,
        caller: Uuid,
        id: Uuid,
        input: UpdateTaskInput,
    ) -> Result<Task, AppError> {
        let patch = TaskPatch::from(input);
        let outcome = self.tasks.update_by(&Self::owned(caller, id), &patch).await?;

        let task = outcome
            .updated_entity
            .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
        log::info!("task {} updated by user {}", id, caller);
        Ok(task)
    }

    pub async fn delete(&self, caller: Uuid, id: Uuid) -> Result<(), AppError> {
        let removed = self.tasks.delete_by(&Self::owned(caller, id)).await?;
        if removed == 0 {
            return Err(AppError::NotFound("Task not found".into()));
        }
        log::info!("task {} deleted by user {}", id, caller);
        Ok(())
    }
}
