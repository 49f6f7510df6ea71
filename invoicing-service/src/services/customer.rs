//! Customer lookup.

use std::sync::Arc;

use crate::error::InvoiceError;
use crate::models::Customer;
use crate::services::store::CustomerStore;

pub struct CustomerService {
    store: Arc<dyn CustomerStore>,
}

impl CustomerService {
    pub fn new(store: Arc<dyn CustomerStore>) -> Self {
        Self { store }
    }

    /// Resolve the customer behind a request, failing with `NotFound`.
    pub async fn get_customer(&self, customer_id: i64) -> Result<Customer, InvoiceError> {
        self.store
            .get_customer_by_id(customer_id)
            .await?
            .ok_or(InvoiceError::NotFound("customer"))
    }
}
