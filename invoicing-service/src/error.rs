//! Domain errors raised by the invoice lifecycle engine and reminder scheduler.

use service_core::error::AppError;
use thiserror::Error;

/// Broad classification of an [`InvoiceError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    BusinessRule,
    Storage,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::BusinessRule => "business_rule",
            ErrorKind::Storage => "storage",
        }
    }
}

#[derive(Debug, Error)]
pub enum InvoiceError {
    #[error("due date cannot be in the past")]
    InvalidDueDate,

    #[error("discount cannot exceed the invoice subtotal")]
    DiscountExceedsSubtotal,

    #[error("amount is out of range")]
    AmountOutOfRange,

    #[error("payment amount exceeds invoice total amount")]
    PaymentExceedsTotal,

    #[error("payment amount is less than invoice total amount")]
    PaymentInsufficientForFull,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Storage(#[from] AppError),
}

impl InvoiceError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            InvoiceError::InvalidDueDate
            | InvoiceError::DiscountExceedsSubtotal
            | InvoiceError::AmountOutOfRange => {
                ErrorKind::Validation
            }
            InvoiceError::PaymentExceedsTotal | InvoiceError::PaymentInsufficientForFull => {
                ErrorKind::BusinessRule
            }
            InvoiceError::NotFound(_) => ErrorKind::NotFound,
            InvoiceError::Storage(_) => ErrorKind::Storage,
        }
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        crate::services::metrics::ERRORS_TOTAL
            .with_label_values(&[err.kind().as_str()])
            .inc();

        match err {
            InvoiceError::Storage(inner) => inner,
            InvoiceError::NotFound(_) => AppError::NotFound(anyhow::anyhow!(err.to_string())),
            InvoiceError::InvalidDueDate
            | InvoiceError::DiscountExceedsSubtotal
            | InvoiceError::AmountOutOfRange => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            InvoiceError::PaymentExceedsTotal | InvoiceError::PaymentInsufficientForFull => {
                AppError::UnprocessableEntity(anyhow::anyhow!(err.to_string()))
            }
        }
    }
}
