use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::{ClientId, PaymentId, PromotionId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum BillingError {
    #[error("invalid input: {message}")]
    InvalidInput {
        message: String,
    },

    #[error("invalid amount: {amount}")]
    InvalidAmount {
        amount: String,
    },

    #[error("no subscription period could be resolved")]
    MissingPeriod,

    #[error("promotion not found: {id}")]
    PromotionNotFound {
        id: PromotionId,
    },

    #[error("promotion {id} is inactive or outside its validity window on {reference_date}")]
    PromotionInactive {
        id: PromotionId,
        reference_date: NaiveDate,
    },

    #[error("client already has payment {payment_id} covering {start} to {end}")]
    OverlapConflict {
        payment_id: PaymentId,
        start: NaiveDate,
        end: NaiveDate,
    },

    #[error("client not found: {id}")]
    ClientNotFound {
        id: ClientId,
    },

    #[error("payment not found: {id}")]
    PaymentNotFound {
        id: PaymentId,
    },

    #[error("payment already deleted: {id}")]
    PaymentAlreadyDeleted {
        id: PaymentId,
    },

    #[error("notes too long: {length} characters, maximum {max}")]
    NotesTooLong {
        length: usize,
        max: usize,
    },

    #[error("invalid date: {message}")]
    InvalidDate {
        message: String,
    },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration {
        message: String,
    },

    #[error("storage error: {message}")]
    Storage {
        message: String,
    },
}

/// machine-readable error category for the request-handling layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    InvalidInput,
    InvalidAmount,
    MissingPeriod,
    PromotionNotFound,
    PromotionInactive,
    OverlapConflict,
    NotFound,
    Internal,
}

impl ErrorKind {
    /// suggested http status for this kind
    pub fn http_status(&self) -> u16 {
        match self {
            ErrorKind::InvalidInput
            | ErrorKind::InvalidAmount
            | ErrorKind::MissingPeriod
            | ErrorKind::PromotionNotFound => 400,
            ErrorKind::PromotionInactive => 422,
            ErrorKind::OverlapConflict => 409,
            ErrorKind::NotFound => 404,
            ErrorKind::Internal => 500,
        }
    }
}

impl BillingError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        BillingError::InvalidInput {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::InvalidInput { .. }
            | BillingError::NotesTooLong { .. }
            | BillingError::InvalidDate { .. }
            | BillingError::PaymentAlreadyDeleted { .. } => ErrorKind::InvalidInput,
            BillingError::InvalidAmount { .. } => ErrorKind::InvalidAmount,
            BillingError::MissingPeriod => ErrorKind::MissingPeriod,
            BillingError::PromotionNotFound { .. } => ErrorKind::PromotionNotFound,
            BillingError::PromotionInactive { .. } => ErrorKind::PromotionInactive,
            BillingError::OverlapConflict { .. } => ErrorKind::OverlapConflict,
            BillingError::ClientNotFound { .. } | BillingError::PaymentNotFound { .. } => {
                ErrorKind::NotFound
            }
            BillingError::InvalidConfiguration { .. } | BillingError::Storage { .. } => {
                ErrorKind::Internal
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, BillingError>;
