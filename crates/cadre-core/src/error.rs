//! Error taxonomy shared by every runtime component.

use std::any::Any;

use serde_json::{Value, json};
use thiserror::Error;

/// Errors reported by the mediator, toolbox and module registry.
///
/// These are *kinds*, not transport errors: each one is routed through the
/// [`ErrorSink`](crate::ErrorSink) before it is returned to a caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CadreError {
    /// An operation referenced a module name with no active definition.
    #[error("undefined module: {name}")]
    UndefinedModule {
        /// The module name that was looked up.
        name: String,
    },

    /// A malformed call (empty topic, empty name, duplicate registration).
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A subscriber failed while a topic was being published.
    #[error("handler failure on topic '{topic}' (subscription #{subscription}): {message}")]
    HandlerFailure {
        /// Topic being published.
        topic: String,
        /// Sequence number of the failing subscription.
        subscription: u64,
        /// Error message or panic payload.
        message: String,
    },

    /// A module creator or lifecycle hook panicked.
    #[error("module '{module}' (instance '{instance}') failed in {stage}: {message}")]
    ModuleFailure {
        /// Module name.
        module: String,
        /// Instance id.
        instance: String,
        /// `create`, `start`, `stop` or `destroy`.
        stage: &'static str,
        /// Panic payload.
        message: String,
    },
}

impl CadreError {
    /// Shorthand for [`CadreError::UndefinedModule`].
    #[must_use]
    pub fn undefined_module(name: impl Into<String>) -> Self {
        Self::UndefinedModule { name: name.into() }
    }

    /// Shorthand for [`CadreError::InvalidArgument`].
    #[must_use]
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument(message.into())
    }

    /// Stable, machine-readable name of the error kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UndefinedModule { .. } => "undefined_module",
            Self::InvalidArgument(_) => "invalid_argument",
            Self::HandlerFailure { .. } => "handler_failure",
            Self::ModuleFailure { .. } => "module_failure",
        }
    }

    /// Structured context handed to the error sink alongside the message.
    #[must_use]
    pub fn context(&self) -> Value {
        match self {
            Self::UndefinedModule { name } => json!({
                "kind": self.kind(),
                "module": name,
            }),
            Self::InvalidArgument(message) => json!({
                "kind": self.kind(),
                "detail": message,
            }),
            Self::HandlerFailure {
                topic,
                subscription,
                message,
            } => json!({
                "kind": self.kind(),
                "topic": topic,
                "subscription": subscription,
                "detail": message,
            }),
            Self::ModuleFailure {
                module,
                instance,
                stage,
                message,
            } => json!({
                "kind": self.kind(),
                "module": module,
                "instance": instance,
                "stage": stage,
                "detail": message,
            }),
        }
    }
}

/// Result type for runtime operations.
pub type CadreResult<T> = Result<T, CadreError>;

/// Best-effort text of a panic payload caught with `catch_unwind`.
#[must_use]
pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = CadreError::undefined_module("radar");
        assert_eq!(err.to_string(), "undefined module: radar");

        let err = CadreError::HandlerFailure {
            topic: "user:connected".into(),
            subscription: 4,
            message: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "handler failure on topic 'user:connected' (subscription #4): boom"
        );
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(CadreError::undefined_module("x").kind(), "undefined_module");
        assert_eq!(
            CadreError::invalid_argument("empty topic").kind(),
            "invalid_argument"
        );
    }

    #[test]
    fn test_error_context_carries_fields() {
        let ctx = CadreError::HandlerFailure {
            topic: "todo:add".into(),
            subscription: 7,
            message: "nope".into(),
        }
        .context();

        assert_eq!(ctx["kind"], "handler_failure");
        assert_eq!(ctx["topic"], "todo:add");
        assert_eq!(ctx["subscription"], 7);
        assert_eq!(ctx["detail"], "nope");
    }

    #[test]
    fn test_module_failure_context() {
        let err = CadreError::ModuleFailure {
            module: "logger".into(),
            instance: "main".into(),
            stage: "start",
            message: "boom".into(),
        };
        assert_eq!(
            err.to_string(),
            "module 'logger' (instance 'main') failed in start: boom"
        );
        let ctx = err.context();
        assert_eq!(ctx["kind"], "module_failure");
        assert_eq!(ctx["stage"], "start");
    }

    #[test]
    fn test_panic_message_payloads() {
        let caught = std::panic::catch_unwind(|| panic!("static text")).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "static text");

        let code = 7;
        let caught = std::panic::catch_unwind(|| panic!("code {code}")).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "code 7");

        let caught = std::panic::catch_unwind(|| std::panic::panic_any(3_u8)).unwrap_err();
        assert_eq!(panic_message(caught.as_ref()), "panicked");
    }
}
