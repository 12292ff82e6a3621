//! # recipes-auth
//!
//! Stateless identity and authorization core for the recipes backend.
//!
//! ## Modules
//!
//! - `password`: Argon2id hashing and registration password policy
//! - `roles`: complete role-binding resolution for an identity
//! - `jwt`: signed session token issuance and validation
//! - `context`: per-request identity context handed to downstream code
//! - `service`: registration, login, and current-identity flows
//! - `error`: typed outcomes of the flows above

pub mod context;
pub mod error;
pub mod jwt;
pub mod password;
pub mod roles;
pub mod service;

pub use context::{IdentityContext, Principal, bearer_token};
pub use error::{AuthError, TokenRejection};
pub use jwt::{Claims, IssuedToken, TokenIssuer, TokenValidator};
pub use password::{PasswordHasher, PasswordValidator};
pub use roles::RoleResolver;
pub use service::{AuthResponse, AuthService, LoginRequest, RegisterRequest, UserSummary};
