//! # recipes-entity
//!
//! Domain entity models for the identity core. Every struct here is either
//! a database row (deriving `sqlx::FromRow`) or a value object passed into
//! the credential store.

pub mod user;
