//! Session commands: login, logout, status, check.

use chatbot_admin::config::AuthConfig;
use chatbot_admin::models::SessionView;
use chatbot_admin::services::auth::{AllowListGate, GateDecision};
use chatbot_admin_core::CredentialAttempt;

use super::{CliError, Context};

/// Sign in and store the session.
pub async fn login(email: &str, answer1: &str, answer2: &str) -> Result<(), CliError> {
    let ctx = Context::from_env()?;
    let attempt = CredentialAttempt::new(email, answer1, answer2);

    let signed_in = ctx.auth.sign_in(&ctx.slot, attempt).await?;

    tracing::info!("{}", signed_in.notice);
    tracing::info!("Session saved to {}", ctx.slot.path().display());
    Ok(())
}

/// Remove the stored session.
pub async fn logout() -> Result<(), CliError> {
    let ctx = Context::from_env()?;
    let notice = ctx.auth.sign_out(&ctx.slot).await?;
    tracing::info!("{notice}");
    Ok(())
}

/// Show the stored session and re-run the authorization check.
pub async fn status() -> Result<(), CliError> {
    let ctx = Context::from_env()?;

    let Some(session) = ctx.auth.restore(&ctx.slot).await? else {
        tracing::info!("Not signed in");
        return Ok(());
    };

    let view = SessionView::from(&session);
    let authorized = ctx.auth.is_authorized(Some(&session)).await;

    tracing::info!("");
    tracing::info!("  Email:      {}", view.email);
    tracing::info!("  Name:       {} {}", view.given_name, view.family_name);
    tracing::info!("  Id:         {}", view.id);
    tracing::info!("  Role:       {}", view.role.as_deref().unwrap_or("-"));
    tracing::info!("  Authorized: {}", if authorized { "yes" } else { "no" });
    tracing::info!("");
    Ok(())
}

/// Evaluate the allow-list gate without contacting the backend.
pub fn check(email: &str, answer1: &str, answer2: &str) -> Result<(), CliError> {
    let config = AuthConfig::from_env()?;
    let attempt = CredentialAttempt::new(email, answer1, answer2);

    let message = evaluate(&config, &attempt);
    tracing::info!("{message}");
    Ok(())
}

fn evaluate(config: &AuthConfig, attempt: &CredentialAttempt) -> String {
    match AllowListGate::new(config.policy.clone()).evaluate(attempt) {
        GateDecision::Allowed { email } => {
            format!("Allowed: {email} passes the allow-list")
        }
        GateDecision::Denied(denial) => {
            format!("Denied: {}", denial.message(config.denial_mode))
        }
    }
}

#[cfg(test)]
mod tests {
    use chatbot_admin::services::auth::{AccessPolicy, DenialMode};

    use super::*;

    fn config(denial_mode: DenialMode) -> AuthConfig {
        AuthConfig {
            policy: AccessPolicy::new(["admin@example.com"], ["Rex", "Unico"], "Luna"),
            denial_mode,
            ..AuthConfig::default()
        }
    }

    #[test]
    fn test_check_allows_listed_admin() {
        let attempt = CredentialAttempt::new(" Admin@Example.com ", "unico", " LUNA ");
        assert_eq!(
            evaluate(&config(DenialMode::Detailed), &attempt),
            "Allowed: admin@example.com passes the allow-list"
        );
    }

    #[test]
    fn test_check_reports_reason() {
        let attempt = CredentialAttempt::new("other@example.com", "rex", "luna");
        assert_eq!(
            evaluate(&config(DenialMode::Detailed), &attempt),
            "Denied: email not authorized"
        );

        let attempt = CredentialAttempt::new("admin@example.com", "rex", "max");
        assert_eq!(
            evaluate(&config(DenialMode::Detailed), &attempt),
            "Denied: answer 2 incorrect"
        );
    }

    #[test]
    fn test_check_generic_mode_hides_reason() {
        let attempt = CredentialAttempt::new("other@example.com", "rex", "luna");
        assert_eq!(
            evaluate(&config(DenialMode::Generic), &attempt),
            "Denied: access denied"
        );
    }
}
