use std::collections::HashMap;
use std::sync::Arc;

use uuid::Uuid;

use super::Page;
use crate::auth::hash_password;
use crate::error::AppError;
use crate::filter::{translate_filter, ConditionSet};
use crate::models::{CreateUserInput, Task, UpdateUserInput, User, UserFilter, UserPatch};
use crate::pagination::{PaginationDefaults, PaginationQuery};
use crate::repository::Repository;

/// User administration. Callers are expected to have checked the admin role.
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn Repository<User>>,
    tasks: Arc<dyn Repository<Task>>,
    defaults: PaginationDefaults,
    bcrypt_cost: u32,
}

impl UserService {
    pub fn new(
        users: Arc<dyn Repository<User>>,
        tasks: Arc<dyn Repository<Task>>,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users,
            tasks,
            defaults: PaginationDefaults::default(),
            bcrypt_cost,
        }
    }

    fn by_id(id: Uuid) -> ConditionSet {
        ConditionSet::new().eq("id", id)
    }

    async fn ensure_email_free(&self, email: &str, except: Option<Uuid>) -> Result<(), AppError> {
        let existing = self
            .users
            .find_one(&ConditionSet::new().eq("email", email), &[])
            .await?;
        match existing {
            Some(user) if Some(user.id) != except => {
                Err(AppError::Conflict("Email already registered".into()))
            }
            _ => Ok(()),
        }
    }

    pub async fn list(
        &self,
        pagination: &PaginationQuery,
        filter: &HashMap<String, String>,
    ) -> Result<Page<User>, AppError> {
        let pagination = pagination.resolve(&self.defaults);
        let conditions = translate_filter::<UserFilter>(filter)?;

        let result = self
            .users
            .find_and_count(&conditions, &[], &pagination)
            .await?;
        Ok(Page::from_result(result, pagination.limit))
    }

    pub async fn get_by_id(&self, id: Uuid) -> Result<User, AppError> {
        self.users
            .find_one(&Self::by_id(id), &[])
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".into()))
    }

    pub async fn create(&self, input: CreateUserInput) -> Result<User, AppError> {
        self.ensure_email_free(&input.email, None).await?;

        let password_hash = hash_password(&input.password, self.bcrypt_cost)?;
        let user = User::new(
            input.email,
            input.full_name,
            input.role.unwrap_or_default(),
            password_hash,
        );
        let user = self.users.insert(&user).await?;
        log::info!("user {} created with role {}", user.id, user.role.label());
        Ok(user)
    }

    pub async fn update(&self, id: Uuid, input: UpdateUserInput) -> Result<User, AppError> {
        if let Some(email) = &input.email {
            self.ensure_email_free(email, Some(id)).await?;
        }

        let password_hash = match &input.password {
            Some(password) => Some(hash_password(password, self.bcrypt_cost)?),
            None => None,
        };
        let patch = UserPatch {
            email: input.email,
            full_name: input.full_name,
            password_hash,
            role: input.role,
        };

        let outcome = self.users.update_by(&Self::by_id(id), &patch).await?;
        let user = outcome
            .updated_entity
            .ok_or_else(|| AppError::NotFound("User not found".into()))?;
        log::info!("user {} updated", id);
        Ok(user)
    }

    /// Deletes a user and the tasks they own. Postgres cascades on its own, so the
    /// task delete only removes rows there if the foreign key is missing.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        if self.users.delete_by(&Self::by_id(id)).await? == 0 {
            return Err(AppError::NotFound("User not found".into()));
        }
        let tasks = self
            .tasks
            .delete_by(&ConditionSet::new().eq("user_id", id))
            .await?;
        log::info!("user {} deleted along with {} task(s)", id, tasks);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::verify_password;
    use crate::models::{CreateTaskInput, Role, TaskPriority, TaskStatus};
    use crate::repository::MemoryRepository;
    use chrono::Utc;

    fn service() -> UserService {
        UserService::new(
            Arc::new(MemoryRepository::<User>::new()),
            Arc::new(MemoryRepository::<Task>::new()),
            4,
        )
    }

    fn create_input(email: &str) -> CreateUserInput {
        CreateUserInput {
            email: email.into(),
            full_name: "Jane Doe".into(),
            password: "password123".into(),
            role: None,
        }
    }

    #[actix_rt::test]
    async fn test_create_hashes_password_and_defaults_role() {
        let service = service();
        let user = service.create(create_input("jane@example.com")).await.unwrap();

        assert_eq!(user.role, Role::User);
        assert_ne!(user.password_hash, "password123");
        assert!(verify_password("password123", &user.password_hash).unwrap());
    }

    #[actix_rt::test]
    async fn test_duplicate_email_is_conflict() {
        let service = service();
        service.create(create_input("jane@example.com")).await.unwrap();
        let other = service.create(create_input("john@example.com")).await.unwrap();

        assert!(matches!(
            service.create(create_input("jane@example.com")).await,
            Err(AppError::Conflict(_))
        ));

        let steal = UpdateUserInput {
            email: Some("jane@example.com".into()),
            ..Default::default()
        };
        assert!(matches!(
            service.update(other.id, steal).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[actix_rt::test]
    async fn test_update_keeps_own_email_and_rehashes() {
        let service = service();
        let user = service.create(create_input("jane@example.com")).await.unwrap();

        let updated = service
            .update(
                user.id,
                UpdateUserInput {
                    email: Some("jane@example.com".into()),
                    password: Some("new-password".into()),
                    role: Some(Role::Admin),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.role, Role::Admin);
        assert!(verify_password("new-password", &updated.password_hash).unwrap());
    }

    #[actix_rt::test]
    async fn test_missing_user_is_not_found() {
        let service = service();
        let id = Uuid::new_v4();

        assert!(matches!(service.get_by_id(id).await, Err(AppError::NotFound(_))));
        assert!(matches!(
            service.update(id, UpdateUserInput::default()).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(service.delete(id).await, Err(AppError::NotFound(_))));
    }

    #[actix_rt::test]
    async fn test_list_filters_by_role() {
        let service = service();
        service.create(create_input("a@example.com")).await.unwrap();
        service
            .create(CreateUserInput {
                role: Some(Role::Admin),
                ..create_input("b@example.com")
            })
            .await
            .unwrap();

        let filter = HashMap::from([("role".to_string(), "admin".to_string())]);
        let page = service
            .list(&PaginationQuery::default(), &filter)
            .await
            .unwrap();

        assert_eq!(page.total_count, 1);
        assert_eq!(page.pages, 1);
        assert_eq!(page.items[0].email, "b@example.com");
    }

    #[actix_rt::test]
    async fn test_delete_removes_owned_tasks() {
        let users = Arc::new(MemoryRepository::<User>::new());
        let tasks = Arc::new(MemoryRepository::<Task>::new());
        let service = UserService::new(users, tasks.clone(), 4);

        let doomed = service.create(create_input("doomed@example.com")).await.unwrap();
        let keeper = service.create(create_input("keeper@example.com")).await.unwrap();
        for owner in [doomed.id, doomed.id, keeper.id] {
            let task = Task::new(
                CreateTaskInput {
                    title: "Chore".into(),
                    description: None,
                    status: TaskStatus::Todo,
                    priority: TaskPriority::Low,
                    due_date: Utc::now(),
                },
                owner,
            );
            tasks.insert(&task).await.unwrap();
        }

        service.delete(doomed.id).await.unwrap();

        let remaining = tasks
            .find_and_count(
                &ConditionSet::new(),
                &[],
                &PaginationQuery::default().resolve(&PaginationDefaults::default()),
            )
            .await
            .unwrap();
        assert_eq!(remaining.total_count, 1);
        assert_eq!(remaining.items[0].user_id, keeper.id);
    }
}
