//! Token inspection command.

use chrono::{DateTime, Utc};
use clap::Args;
use serde::Serialize;

use recipes_auth::{IdentityContext, TokenValidator, bearer_token};
use recipes_core::config::AppConfig;
use recipes_core::error::AppError;

use crate::output::{self, OutputFormat};

/// Arguments for the inspect command
#[derive(Debug, Args)]
pub struct InspectArgs {
    /// Token, or a full `Bearer <token>` header value
    pub token: String,
}

#[derive(Debug, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum Inspection {
    Anonymous,
    Rejected {
        reason: String,
    },
    Authenticated {
        user_id: String,
        username: String,
        authorities: Vec<String>,
        issued_at: DateTime<Utc>,
        expires_at: DateTime<Utc>,
    },
}

impl From<&IdentityContext> for Inspection {
    fn from(ctx: &IdentityContext) -> Self {
        match ctx {
            IdentityContext::Anonymous => Self::Anonymous,
            IdentityContext::Rejected(reason) => Self::Rejected {
                reason: reason.to_string(),
            },
            IdentityContext::Authenticated(p) => Self::Authenticated {
                user_id: p.user_id.to_string(),
                username: p.username.clone(),
                authorities: p.authorities.iter().cloned().collect(),
                issued_at: p.issued_at,
                expires_at: p.expires_at,
            },
        }
    }
}

/// Validate a token offline; no database access is needed.
pub fn inspect(
    args: &InspectArgs,
    config: &AppConfig,
    format: OutputFormat,
) -> Result<(), AppError> {
    let validator = TokenValidator::new(&config.auth);
    let raw = args.token.trim();
    let token = bearer_token(raw).unwrap_or(raw);

    let ctx = IdentityContext::resolve(Some(token), &validator, Utc::now());
    let inspection = Inspection::from(&ctx);

    match format {
        OutputFormat::Json => output::print_json(&inspection),
        OutputFormat::Text => match &inspection {
            Inspection::Anonymous => println!("No token presented."),
            Inspection::Rejected { .. } => {}
            Inspection::Authenticated {
                user_id,
                username,
                authorities,
                issued_at,
                expires_at,
            } => {
                output::print_success("Token accepted");
                output::print_kv("User", username);
                output::print_kv("User ID", user_id);
                output::print_kv("Authorities", &output::join(authorities));
                output::print_kv("Issued", &issued_at.to_rfc3339());
                output::print_kv("Expires", &expires_at.to_rfc3339());
            }
        },
    }

    if let IdentityContext::Rejected(reason) = ctx {
        return Err(recipes_auth::AuthError::InvalidToken(reason).into());
    }
    Ok(())
}
