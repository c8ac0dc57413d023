//! The module contains the error the engine can throw.
//!
//! Validation failures ([`MissingDate`], [`InvalidAmount`] and
//! [`NonFiniteAmount`]) are raised before anything touches the database.
//!
//!  [`MissingDate`]: EngineError::MissingDate
//!  [`InvalidAmount`]: EngineError::InvalidAmount
//!  [`NonFiniteAmount`]: EngineError::NonFiniteAmount
use sea_orm::DbErr;
use thiserror::Error;

/// Engine custom errors.
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Error: Date is required")]
    MissingDate,
    #[error("Error: Invalid price")]
    InvalidAmount(String),
    #[error("Error: Invalid numeric value")]
    NonFiniteAmount(String),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl EngineError {
    /// Whether the error comes from user input rather than the store.
    pub fn is_validation(&self) -> bool {
        !matches!(self, Self::Database(_))
    }
}

impl PartialEq for EngineError {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::MissingDate, Self::MissingDate) => true,
            (Self::InvalidAmount(a), Self::InvalidAmount(b)) => a == b,
            (Self::NonFiniteAmount(a), Self::NonFiniteAmount(b)) => a == b,
            (Self::Database(a), Self::Database(b)) => a.to_string() == b.to_string(),
            _ => false,
        }
    }
}
