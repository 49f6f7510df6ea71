//! Services module for invoicing-service.

pub mod audit;
pub mod customer;
pub mod database;
pub mod invoice;
pub mod memory;
pub mod metrics;
pub mod reminder;
pub mod store;

pub use audit::AuditService;
pub use customer::CustomerService;
pub use database::Database;
pub use invoice::{InvoiceDraft, InvoiceService};
pub use memory::MemoryStore;
pub use metrics::{get_metrics, init_metrics};
pub use reminder::ReminderService;
