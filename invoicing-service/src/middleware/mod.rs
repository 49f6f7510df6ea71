pub mod customer;

pub use customer::{CustomerContext, CUSTOMER_ID_HEADER};
