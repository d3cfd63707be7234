//! Customer routes - Customer list, search, pagination, edit form
//!
//! Structure:
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{
    api_customers,
    customer_options,
    htmx_customers_list,
    htmx_customers_reload,
    htmx_customer_delete,
    htmx_customer_save,
};

pub use page::{
    page_customers,
    page_customer,
};
