//! Domain errors for the demodesk review pipeline.

use thiserror::Error;
use uuid::Uuid;

use crate::domain::models::usage::ResourceClass;

/// Domain-level errors surfaced by the review pipeline core.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Gate: a track cannot leave second listen unrated.
    #[error("track must be given an energy rating before it can advance")]
    EnergyRequired,

    /// Gate: a track cannot be scheduled before its contract is signed.
    #[error("contract must be signed before the track can be scheduled")]
    ContractNotSigned,

    /// Gate: the track is in a final state (vault or archived).
    #[error("track is already in a final state")]
    AlreadyFinal,

    /// Gate: this organization requires an explicit rejection reason.
    #[error("a rejection reason is required")]
    ReasonRequired,

    #[error("not permitted to {action}")]
    Forbidden { action: String },

    #[error("plan limit reached for {0}")]
    QuotaExceeded(ResourceClass),

    #[error("could not resolve workspace scope: {0}")]
    ScopeResolutionFailed(String),

    #[error("track not found: {0}")]
    TrackNotFound(Uuid),

    #[error("staff member not found: {0}")]
    StaffNotFound(Uuid),

    #[error("organization not found: {0}")]
    OrganizationNotFound(Uuid),

    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Transient failure talking to the backing store.
    #[error("store error: {0}")]
    Store(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

pub type DomainResult<T> = Result<T, DomainError>;

impl DomainError {
    pub fn forbidden(action: impl Into<String>) -> Self {
        Self::Forbidden { action: action.into() }
    }

    /// Expected, user-facing workflow outcomes. Surfaced as a message,
    /// never retried.
    pub fn is_gate_error(&self) -> bool {
        matches!(
            self,
            Self::EnergyRequired | Self::ContractNotSigned | Self::AlreadyFinal | Self::ReasonRequired
        )
    }

    /// Whether a silent retry of a read is reasonable.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Store(_))
    }
}

impl From<sqlx::Error> for DomainError {
    fn from(err: sqlx::Error) -> Self {
        DomainError::Store(err.to_string())
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        DomainError::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gate_error_family() {
        assert!(DomainError::EnergyRequired.is_gate_error());
        assert!(DomainError::ContractNotSigned.is_gate_error());
        assert!(DomainError::AlreadyFinal.is_gate_error());
        assert!(DomainError::ReasonRequired.is_gate_error());
        assert!(!DomainError::forbidden("vote").is_gate_error());
        assert!(!DomainError::Store("timeout".into()).is_gate_error());
    }

    #[test]
    fn test_only_store_errors_are_transient() {
        assert!(DomainError::Store("timeout".into()).is_transient());
        assert!(!DomainError::EnergyRequired.is_transient());
        assert!(!DomainError::QuotaExceeded(ResourceClass::Tracks).is_transient());
    }
}
