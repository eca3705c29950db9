#![doc = "The `taskboard` library crate."]
#![doc = ""]
#![doc = "Domain models, the generic paginated repository with its filter and pagination"]
#![doc = "layers, the services built on them, authentication, routing and error handling."]
#![doc = "The binary (`main.rs`) wires these to PostgreSQL and starts the HTTP server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod filter;
pub mod models;
pub mod pagination;
pub mod repository;
pub mod routes;
pub mod services;

use std::sync::Arc;

use actix_web::web;

use crate::auth::TokenIssuer;
use crate::config::Config;
use crate::models::{Task, User};
use crate::repository::Repository;
use crate::services::{AuthService, TaskService, UserService};

/// Shared state registered on every worker's `App`.
#[derive(Clone)]
pub struct AppState {
    pub config: web::Data<Config>,
    pub issuer: web::Data<TokenIssuer>,
    pub auth: web::Data<AuthService>,
    pub tasks: web::Data<TaskService>,
    pub users: web::Data<UserService>,
}

impl AppState {
    /// Builds the services over the given stores.
    pub fn new(
        config: Config,
        users: Arc<dyn Repository<User>>,
        tasks: Arc<dyn Repository<Task>>,
    ) -> Self {
        let issuer = TokenIssuer::from_config(&config);
        Self {
            auth: web::Data::new(AuthService::new(
                users.clone(),
                issuer.clone(),
                config.bcrypt_cost,
            )),
            tasks: web::Data::new(TaskService::new(tasks.clone(), users.clone())),
            users: web::Data::new(UserService::new(users, tasks, config.bcrypt_cost)),
            issuer: web::Data::new(issuer),
            config: web::Data::new(config),
        }
    }

    /// Registers the state and mounts the routes. Pass to `App::configure`.
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(self.config.clone())
            .app_data(self.issuer.clone())
            .app_data(self.auth.clone())
            .app_data(self.tasks.clone())
            .app_data(self.users.clone())
            .app_data(web::QueryConfig::default().error_handler(|err, _req| {
                error::AppError::BadRequest(format!("Invalid query string: {}", err)).into()
            }));
        routes::config(cfg);
    }
}
