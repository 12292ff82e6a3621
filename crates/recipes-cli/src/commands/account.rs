//! Registration, login, and role-grant commands.

use clap::Args;
use serde::Serialize;

use recipes_auth::{AuthResponse, LoginRequest, RegisterRequest};
use recipes_core::config::AppConfig;
use recipes_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for the register command
#[derive(Debug, Args)]
pub struct RegisterArgs {
    /// Desired username
    pub username: String,
    /// Email address
    pub email: String,
    /// Password
    #[arg(short, long)]
    pub password: String,
}

/// Arguments for the login command
#[derive(Debug, Args)]
pub struct LoginArgs {
    /// Username or email
    pub login: String,
    /// Password
    #[arg(short, long)]
    pub password: String,
}

/// Arguments for the grant command
#[derive(Debug, Args)]
pub struct GrantArgs {
    /// Username or email of the identity
    pub login: String,
    /// Role name to bind
    pub role: String,
}

#[derive(Debug, Serialize)]
struct GrantResult<'a> {
    login: &'a str,
    roles: Vec<String>,
}

/// Register an identity with the default role
pub async fn register(
    args: &RegisterArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let service = super::create_auth_service(config).await?;
    let response = service
        .register(RegisterRequest {
            username: args.username.clone(),
            email: args.email.clone(),
            password: args.password.clone(),
        })
        .await?;

    print_response(&response, format, "Identity registered");
    Ok(())
}

/// Log in by username or email
pub async fn login(
    args: &LoginArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let service = super::create_auth_service(config).await?;
    let response = service
        .login(LoginRequest {
            login: args.login.clone(),
            password: args.password.clone(),
        })
        .await?;

    print_response(&response, format, "Login successful");
    Ok(())
}

/// Bind a role to an existing identity
pub async fn grant(
    args: &GrantArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let service = super::create_auth_service(config).await?;
    let roles = service.assign_role(&args.login, &args.role).await?;

    match format {
        OutputFormat::Json => output::print_json(&GrantResult {
            login: &args.login,
            roles: roles.into_iter().collect(),
        }),
        OutputFormat::Text => {
            output::print_success(&format!("Role '{}' bound to '{}'", args.role, args.login));
            output::print_kv("Roles", &output::join(&roles));
            println!("  Tokens issued earlier keep their previous authorities.");
        }
    }
    Ok(())
}

fn print_response(response: &AuthResponse, format: OutputFormat, headline: &str) {
    match format {
        OutputFormat::Json => output::print_json(response),
        OutputFormat::Text => {
            output::print_success(headline);
            output::print_kv("User", &response.user.username);
            output::print_kv("User ID", &response.user.id.to_string());
            output::print_kv("Roles", &output::join(&response.user.roles));
            output::print_kv("Expires", &response.expires_at.to_rfc3339());
            output::print_kv("Token", &response.token);
        }
    }
}
