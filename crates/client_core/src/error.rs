use std::fmt;

use shared::{
    domain::{SpeciesId, UserId},
    error::{ApiError, ErrorCode},
};
use thiserror::Error;

use crate::fields::FieldName;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    #[error("this field is required")]
    Required,
    #[error("'{0}' is not one of the known kingdoms")]
    UnknownKingdom(String),
    #[error("'{0}' is not a whole number")]
    NotAnInteger(String),
    #[error("must be at least {min}")]
    BelowMinimum { min: i64 },
    #[error("'{input}' is not a valid URL: {reason}")]
    InvalidUrl { input: String, reason: String },
}

/// Every field that failed validation, in table order.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub struct ValidationErrors(pub Vec<(FieldName, FieldError)>);

impl ValidationErrors {
    pub fn get(&self, field: FieldName) -> Option<&FieldError> {
        self.0
            .iter()
            .find(|(name, _)| *name == field)
            .map(|(_, err)| err)
    }

    pub fn fields(&self) -> impl Iterator<Item = FieldName> + '_ {
        self.0.iter().map(|(name, _)| *name)
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (field, err)) in self.0.iter().enumerate() {
            if index > 0 {
                f.write_str("; ")?;
            }
            write!(f, "{}: {err}", field.label())?;
        }
        Ok(())
    }
}

/// Failure reported by the data store for one mutation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("no species {id} owned by user {owner}")]
    NoMatch { id: SpeciesId, owner: UserId },
    #[error("{0}")]
    Backend(String),
}

impl StoreError {
    pub fn backend(err: impl fmt::Display) -> Self {
        Self::Backend(err.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CardError {
    #[error("{operation} is not available while the card is {mode}")]
    InvalidTransition {
        operation: &'static str,
        mode: &'static str,
    },
    #[error("user {viewer} does not own species {species}")]
    AuthorizationMismatch { viewer: UserId, species: SpeciesId },
    #[error("a {0} request is already in flight")]
    Busy(&'static str),
    #[error("invalid species fields: {0}")]
    Validation(#[from] ValidationErrors),
}

impl From<&CardError> for ApiError {
    fn from(value: &CardError) -> Self {
        let code = match value {
            CardError::InvalidTransition { .. } => ErrorCode::Internal,
            CardError::AuthorizationMismatch { .. } => ErrorCode::Forbidden,
            CardError::Busy(_) => ErrorCode::Busy,
            CardError::Validation(_) => ErrorCode::Validation,
        };
        ApiError::new(code, value.to_string())
    }
}

impl From<&StoreError> for ApiError {
    fn from(value: &StoreError) -> Self {
        let code = match value {
            StoreError::NoMatch { .. } => ErrorCode::NotFound,
            StoreError::Backend(_) => ErrorCode::Storage,
        };
        ApiError::new(code, value.to_string())
    }
}
