use thiserror::Error;

use phillet_gateway::GatewayError;

use crate::validation::ValidationErrors;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// Rejected before any network call.
    #[error("{0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl From<ValidationErrors> for StoreError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl StoreError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Gateway(e) if e.is_unauthorized())
    }
}
