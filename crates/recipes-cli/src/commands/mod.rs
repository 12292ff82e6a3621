//! CLI command definitions and dispatch.

pub mod account;
pub mod migrate;
pub mod token;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use crate::output::OutputFormat;
use recipes_auth::AuthService;
use recipes_core::config::AppConfig;
use recipes_core::error::AppError;
use recipes_database::PgCredentialStore;

/// Recipes identity administration
#[derive(Debug, Parser)]
#[command(name = "recipes", version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config/default.toml")]
    pub config: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Apply pending database migrations
    Migrate,
    /// Register a new identity and print its first token
    Register(account::RegisterArgs),
    /// Log in and print a fresh token
    Login(account::LoginArgs),
    /// Bind an additional role to an identity
    Grant(account::GrantArgs),
    /// Validate a token and show the identity it carries
    Inspect(token::InspectArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self, config: AppConfig) -> Result<(), AppError> {
        match &self.command {
            Commands::Migrate => migrate::execute(&config).await,
            Commands::Register(args) => account::register(args, &config, self.format).await,
            Commands::Login(args) => account::login(args, &config, self.format).await,
            Commands::Grant(args) => account::grant(args, &config, self.format).await,
            Commands::Inspect(args) => token::inspect(args, &config, self.format),
        }
    }
}

/// Helper: load configuration from file and environment
pub fn load_config(config_path: &str) -> Result<AppConfig, AppError> {
    AppConfig::load(config_path)
}

/// Helper: create database pool from config
pub async fn create_db_pool(config: &AppConfig) -> Result<sqlx::PgPool, AppError> {
    recipes_database::connection::connect(&config.database).await
}

/// Helper: build the auth service over the PostgreSQL credential store
pub async fn create_auth_service(config: &AppConfig) -> Result<AuthService, AppError> {
    let pool = create_db_pool(config).await?;
    AuthService::new(&config.auth, Arc::new(PgCredentialStore::new(pool)))
}
