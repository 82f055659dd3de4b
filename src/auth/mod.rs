pub mod extractors;
pub mod middleware;
pub mod password;
pub mod resolver;
pub mod token;

pub use extractors::CurrentUser;
pub use middleware::AuthMiddleware;
pub use password::{hash_password, verify_password};
pub use resolver::{AuthenticatedUserResolver, Principal};
pub use token::{Claims, TokenIssuer};
