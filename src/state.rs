use std::sync::Arc;

use crate::auth::TokenService;
use crate::services::{AuthService, ProjectService, TaskService};
use crate::store::{MemoryStore, ProjectStore, TaskStore, UserStore};

/// Everything a handler needs, shared through `web::Data<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub projects: ProjectService,
    pub tasks: TaskService,
}

impl AppState {
    /// Wires all services to one store backend.
    pub fn new<S>(store: Arc<S>, tokens: TokenService, bcrypt_cost: u32) -> Self
    where
        S: UserStore + ProjectStore + TaskStore + 'static,
    {
        let users: Arc<dyn UserStore> = store.clone();
        let projects: Arc<dyn ProjectStore> = store.clone();
        let tasks: Arc<dyn TaskStore> = store;

        Self {
            auth: AuthService::new(users, tokens, bcrypt_cost),
            projects: ProjectService::new(projects.clone(), tasks.clone()),
            tasks: TaskService::new(tasks, projects),
        }
    }

    /// State over a fresh `MemoryStore`.
    pub fn in_memory(tokens: TokenService, bcrypt_cost: u32) -> Self {
        Self::new(Arc::new(MemoryStore::new()), tokens, bcrypt_cost)
    }

    pub fn tokens(&self) -> &TokenService {
        self.auth.tokens()
    }
}
