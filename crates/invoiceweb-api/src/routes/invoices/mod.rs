//! Invoice routes - Invoice list, search, pagination, edit form
//!
//! Features:
//! - List invoices with pagination
//! - Search by customer name, status label or amount prefix
//! - Optimistic delete with rollback
//! - Create and edit form
//!
//! Structure:
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: Full page rendering

pub mod api;
pub mod page;

pub use api::{
    api_invoices,
    htmx_invoices_list,
    htmx_invoices_reload,
    htmx_invoice_delete,
    htmx_invoice_save,
};

pub use page::{
    page_invoices,
    page_invoice,
};
