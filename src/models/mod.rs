pub mod task;
pub mod user;

pub use task::{CreateTaskInput, Task, TaskFilter, TaskPatch, TaskPriority, TaskStatus, UpdateTaskInput};
pub use user::{CreateUserInput, Role, UpdateUserInput, User, UserFilter, UserPatch, UserSummary};
