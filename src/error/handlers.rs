//! Human-readable descriptions of failed service calls

use crate::service::CallFailure;

/// Which remote call a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    SignIn,
    Registration,
}

impl CallStage {
    pub fn label(&self) -> &'static str {
        match self {
            CallStage::SignIn => "sign-in",
            CallStage::Registration => "registration",
        }
    }
}

/// Standard handler mapping call failures to operator-facing messages
pub struct HttpErrorHandler;

impl HttpErrorHandler {
    /// Describe a failure of the given stage
    pub fn describe(stage: CallStage, failure: &CallFailure) -> String {
        match (stage, failure) {
            (CallStage::SignIn, CallFailure::Rejected { status }) => Self::auth_status(*status),
            (CallStage::Registration, CallFailure::Rejected { status }) => {
                Self::registration_status(*status)
            }
            (stage, CallFailure::MalformedResponse { detail }) => {
                format!("Unexpected {} response: {}", stage.label(), detail)
            }
            (stage, CallFailure::Transport { detail }) => {
                format!("Could not reach {} endpoint: {}", stage.label(), detail)
            }
            (stage, CallFailure::TimedOut) => format!("{} request timed out", capitalize(stage.label())),
        }
    }

    fn auth_status(status: u16) -> String {
        match status {
            400 => "Invalid sign-in request (HTTP 400)".to_string(),
            401 => "Credentials rejected (HTTP 401)".to_string(),
            403 => "Account access denied (HTTP 403)".to_string(),
            404 => "Sign-in endpoint not found (HTTP 404)".to_string(),
            429 => "Rate limited during sign-in (HTTP 429)".to_string(),
            500..=599 => format!("Sign-in service error (HTTP {})", status),
            _ => format!("Sign-in failed (HTTP {})", status),
        }
    }

    fn registration_status(status: u16) -> String {
        match status {
            400 => "Invalid child, class or course identifier (HTTP 400)".to_string(),
            401 => "Token not accepted for registration (HTTP 401)".to_string(),
            403 => "Registration forbidden for this account (HTTP 403)".to_string(),
            404 => "Class or course not found (HTTP 404)".to_string(),
            409 => "Already registered or queue position taken (HTTP 409)".to_string(),
            429 => "Rate limited during registration (HTTP 429)".to_string(),
            500..=599 => format!("Registration service error (HTTP {})", status),
            _ => format!("Registration failed (HTTP {})", status),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_conflict_reads_as_already_registered() {
        let msg = HttpErrorHandler::describe(
            CallStage::Registration,
            &CallFailure::Rejected { status: 409 },
        );
        assert!(msg.starts_with("Already registered"));
    }

    #[test]
    fn test_same_status_differs_by_stage() {
        let failure = CallFailure::Rejected { status: 401 };
        let sign_in = HttpErrorHandler::describe(CallStage::SignIn, &failure);
        let registration = HttpErrorHandler::describe(CallStage::Registration, &failure);
        assert_eq!(sign_in, "Credentials rejected (HTTP 401)");
        assert_ne!(sign_in, registration);
    }

    #[test]
    fn test_timeout_and_transport_messages() {
        assert_eq!(
            HttpErrorHandler::describe(CallStage::SignIn, &CallFailure::TimedOut),
            "Sign-in request timed out"
        );
        let msg = HttpErrorHandler::describe(
            CallStage::Registration,
            &CallFailure::Transport {
                detail: "connection refused".to_string(),
            },
        );
        assert!(msg.contains("registration endpoint"));
        assert!(msg.contains("connection refused"));
    }
}
