//! Customer context extraction.
//!
//! The gateway in front of this service authenticates the caller and passes
//! the customer id in `x-customer-id`. This service trusts that header.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use service_core::error::AppError;

pub const CUSTOMER_ID_HEADER: &str = "x-customer-id";

/// Customer on whose behalf the request runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CustomerContext {
    pub customer_id: i64,
}

#[async_trait]
impl<S> FromRequestParts<S> for CustomerContext
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let customer_id = parts
            .headers
            .get(CUSTOMER_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|id| *id > 0)
            .ok_or_else(|| {
                AppError::Forbidden(anyhow::anyhow!(
                    "Missing or invalid x-customer-id header"
                ))
            })?;

        tracing::Span::current().record("customer_id", customer_id);

        Ok(CustomerContext { customer_id })
    }
}
