//! Request and response shapes for the HTTP API.

mod invoice;
mod pagination;
mod response;

pub use invoice::{
    ConfirmPaymentRequest, CreateInvoiceRequest, InvoiceItemRequest, PaymentConfirmation,
    PaymentInfoRequest, SenderRequest, SetRemindersRequest, ShareableLinkResponse,
};
pub use pagination::{Pagination, PaginationQuery};
pub use response::{ApiResponse, PagedResponse};
