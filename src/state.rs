use std::sync::Arc;

use crate::auth::{AuthenticatedUserResolver, TokenIssuer};
use crate::services::{TaskService, UserService};
use crate::store::{TaskStore, UserStore};

/// Everything a request handler needs, shared across workers through
/// `web::Data<AppState>`.
pub struct AppState {
    pub users: UserService,
    pub tasks: TaskService,
    pub resolver: AuthenticatedUserResolver,
    pub tokens: TokenIssuer,
}

impl AppState {
    pub fn new(
        users: Arc<dyn UserStore>,
        tasks: Arc<dyn TaskStore>,
        tokens: TokenIssuer,
        bcrypt_cost: u32,
    ) -> Self {
        Self {
            users: UserService::new(users.clone(), bcrypt_cost),
            tasks: TaskService::new(tasks),
            resolver: AuthenticatedUserResolver::new(users),
            tokens,
        }
    }
}
