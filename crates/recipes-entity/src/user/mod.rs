//! Identity and role entities.

pub mod model;
pub mod role;

pub use model::{NewUser, User};
pub use role::{Role, ADMINISTRATOR, STANDARD_USER};
