//! Side effects requested by engine operations.
//!
//! Engine operations never write audit records or send messages themselves.
//! They return an [`Outcome`] listing the effects in order, and an
//! [`EffectExecutor`] carries them out afterwards.

use std::sync::Arc;

use tracing::warn;

use crate::audit::{AuditEvent, AuditSink};
use crate::auth::AuthError;
use crate::delivery::{DeliveryChannel, DeliveryKind, DeliveryRequest};

/// One side effect to perform.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Audit(AuditEvent),
    Deliver(DeliveryRequest),
}

/// Result of an engine operation plus the effects it requests.
#[derive(Debug)]
#[must_use = "effects are only performed when the outcome is executed"]
pub struct Outcome<T> {
    pub result: Result<T, AuthError>,
    pub effects: Vec<Effect>,
}

impl<T> Outcome<T> {
    pub fn new(result: Result<T, AuthError>, effects: Vec<Effect>) -> Self {
        Self { result, effects }
    }

    /// Transform the success value, keeping the effects.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            result: self.result.map(f),
            effects: self.effects,
        }
    }

    pub fn audit_events(&self) -> impl Iterator<Item = &AuditEvent> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Audit(event) => Some(event),
            Effect::Deliver(_) => None,
        })
    }

    pub fn deliveries(&self) -> impl Iterator<Item = &DeliveryRequest> {
        self.effects.iter().filter_map(|e| match e {
            Effect::Deliver(request) => Some(request),
            Effect::Audit(_) => None,
        })
    }
}

/// A message that could not be handed to the delivery channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeliveryWarning {
    pub kind: DeliveryKind,
    pub recipient: String,
    pub reason: String,
}

impl DeliveryWarning {
    /// Text suitable for showing to the caller.
    pub fn message(&self) -> String {
        match self.kind {
            DeliveryKind::Credentials => {
                "Account created, but the credentials email could not be sent".to_string()
            }
            DeliveryKind::ResetLink => {
                "The password reset email could not be sent. Please try again".to_string()
            }
            DeliveryKind::ResetConfirmation => {
                "Password reset, but the confirmation email could not be sent".to_string()
            }
            DeliveryKind::VerificationCode => {
                "The verification code email could not be sent. Please try again".to_string()
            }
        }
    }
}

/// Successful operation, possibly degraded by failed deliveries.
#[derive(Debug)]
pub struct Completion<T> {
    pub value: T,
    pub warnings: Vec<DeliveryWarning>,
}

impl<T> Completion<T> {
    /// The mutation happened but at least one message did not go out.
    pub fn is_degraded(&self) -> bool {
        !self.warnings.is_empty()
    }
}

/// Performs the effects of an [`Outcome`].
#[derive(Clone)]
pub struct EffectExecutor {
    audit: Arc<dyn AuditSink>,
    delivery: Arc<dyn DeliveryChannel>,
}

impl EffectExecutor {
    pub fn new(audit: Arc<dyn AuditSink>, delivery: Arc<dyn DeliveryChannel>) -> Self {
        Self { audit, delivery }
    }

    /// Perform every effect in order, then hand back the operation result.
    ///
    /// Audit failures are logged and dropped. Delivery failures become
    /// warnings on an otherwise successful result.
    pub async fn run<T>(&self, outcome: Outcome<T>) -> Result<Completion<T>, AuthError> {
        let mut warnings = Vec::new();

        for effect in &outcome.effects {
            match effect {
                Effect::Audit(event) => {
                    if let Err(e) = self.audit.record(event).await {
                        warn!(error = %e, action = %event.action, "Failed to record audit event");
                    }
                }
                Effect::Deliver(request) => {
                    if let Err(e) = self.delivery.send(request).await {
                        warn!(
                            error = %e,
                            kind = %request.kind(),
                            recipient = %request.recipient,
                            "Delivery failed"
                        );
                        warnings.push(DeliveryWarning {
                            kind: request.kind(),
                            recipient: request.recipient.clone(),
                            reason: e.to_string(),
                        });
                    }
                }
            }
        }

        outcome
            .result
            .map(|value| Completion { value, warnings })
    }
}
