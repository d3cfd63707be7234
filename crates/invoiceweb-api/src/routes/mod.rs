//! Route modules for the API server
//!
//! Each collection module follows a consistent structure:
//! - mod.rs: Module declaration and exports
//! - api.rs: JSON API and HTMX endpoints
//! - page.rs: Full page rendering

pub mod auth;
pub mod customers;
pub mod invoices;

use serde::Deserialize;

use crate::ApiError;
use invoiceweb_core::{CoreError, CoreResult, InvoiceStatus, ListView, Record, RecordId};
use invoiceweb_utils::escape_html;

/// Search and page parameters of list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    pub q: Option<String>,
    pub page: Option<usize>,
}

/// Fetch the collection unless the view already holds it
pub(crate) async fn ensure_loaded<R: Record>(view: &ListView<R>) -> CoreResult<()> {
    if view.state().is_loading {
        view.load().await
    } else {
        Ok(())
    }
}

/// Apply list parameters to the view; a new term always returns to page 1
pub(crate) fn apply_query<R: Record>(view: &ListView<R>, query: &ListQuery) {
    if let Some(term) = &query.q {
        view.set_search_term(term);
    }
    if let Some(page) = query.page {
        view.set_page(page);
    }
}

/// `new` opens the create form; anything else must be a record id
pub(crate) fn parse_record_id(raw: &str) -> Result<Option<RecordId>, ApiError> {
    if raw == "new" {
        return Ok(None);
    }
    raw.parse().map(Some).map_err(|_| ApiError::NotFound {
        resource: raw.to_string(),
    })
}

/// Badge colours of an invoice status
pub(crate) fn status_badge(status: InvoiceStatus) -> String {
    let colors = match status.css_class() {
        "success" => "bg-green-100 text-green-800",
        "danger" => "bg-red-100 text-red-800",
        _ => "bg-blue-100 text-blue-800",
    };
    format!(
        "<span class='px-2 py-1 rounded-full text-xs font-medium {}'>{}</span>",
        colors,
        status.label()
    )
}

/// Message under the form field a validation error points at
pub(crate) fn field_error(error: Option<&CoreError>, field: &str) -> String {
    match error {
        Some(CoreError::Validation { field: f, message }) if f == field => format!(
            "<p class='text-sm text-red-600 mt-1'>{}</p>",
            escape_html(message)
        ),
        _ => String::new(),
    }
}

/// Banner for errors not tied to a form field
pub(crate) fn form_error(error: Option<&CoreError>, fields: &[&str]) -> String {
    match error {
        Some(CoreError::Validation { field, .. }) if fields.contains(&field.as_str()) => String::new(),
        Some(error) if error.is_user_visible() => format!(
            "<div class='mb-4 px-4 py-2 rounded-lg bg-red-50 text-red-700'>{}</div>",
            escape_html(&error.to_string())
        ),
        _ => String::new(),
    }
}
