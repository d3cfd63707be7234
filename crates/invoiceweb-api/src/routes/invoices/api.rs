//! Invoices API endpoints - JSON API and HTMX partial responses
//!
//! Endpoints:
//! - api_invoices: Filtered, paginated invoices (JSON)
//! - htmx_invoices_list: Invoice list (HTML fragment)
//! - htmx_invoices_reload: Fetch again, bypassing the cache (HTML fragment)
//! - htmx_invoice_delete: Optimistic delete (HTML fragment)
//! - htmx_invoice_save: Create or update from the form (HTMX)

use axum::extract::{Form, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use std::str::FromStr;

use super::page::{render_invoice_form, render_invoices_table};
use crate::routes::customers::customer_options;
use crate::routes::{apply_query, ensure_loaded, parse_record_id, ListQuery};
use crate::{fragment_response, is_htmx_request, ApiError, AppState};
use invoiceweb_core::{InvoiceDraft, InvoiceStatus, Invoice, ListPage, RecordId};

/// Get invoices with search and pagination (JSON API)
pub async fn api_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListPage<Invoice>>, ApiError> {
    ensure_loaded(&state.invoices).await?;
    let term = query.q.unwrap_or_default();
    Ok(Json(state.invoices.query(&term, query.page.unwrap_or(1))))
}

/// HTMX: Invoice list - Partial page update
pub async fn htmx_invoices_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Html<String> {
    if let Err(e) = ensure_loaded(&state.invoices).await {
        log::debug!(target: "invoiceweb::api", "Invoice list not loaded: {}", e);
    }
    apply_query(&state.invoices, &query);
    fragment_response(&state, &render_invoices_table(&state, &state.invoices.page()))
}

/// HTMX: Reload invoices from the data source
pub async fn htmx_invoices_reload(State(state): State<AppState>) -> Html<String> {
    if let Err(e) = state.invoices.reload().await {
        log::debug!(target: "invoiceweb::api", "Invoice reload failed: {}", e);
    }
    fragment_response(&state, &render_invoices_table(&state, &state.invoices.page()))
}

/// HTMX: Delete an invoice; the list is restored if the data source refuses
pub async fn htmx_invoice_delete(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Html<String> {
    if let Err(e) = state.invoices.remove(id).await {
        log::debug!(target: "invoiceweb::api", "Delete of invoice #{} not applied: {}", id, e);
    }
    fragment_response(&state, &render_invoices_table(&state, &state.invoices.page()))
}

/// Invoice form fields
#[derive(Debug, Deserialize)]
pub struct InvoiceForm {
    #[serde(default)]
    pub amount: String,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub customer: String,
}

impl InvoiceForm {
    /// Unparsable fields become values the validation rejects
    pub fn to_draft(&self) -> InvoiceDraft {
        InvoiceDraft {
            amount: Decimal::from_str(self.amount.trim().replace(',', ".").as_str()).unwrap_or(Decimal::ZERO),
            status: InvoiceStatus::from_str(&self.status).unwrap_or(InvoiceStatus::Sent),
            customer_id: self.customer.trim().parse().unwrap_or(0),
        }
    }
}

/// HTMX: Save the invoice form
pub async fn htmx_invoice_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Form(form): Form<InvoiceForm>,
) -> Result<Response, ApiError> {
    let id = parse_record_id(&raw_id)?;
    let draft = form.to_draft();

    match state.invoice_editor.save(id, &draft).await {
        Ok(_) => {
            if is_htmx_request(&headers) {
                Ok(([("HX-Redirect", "/invoices")], "").into_response())
            } else {
                Ok(Redirect::to("/invoices").into_response())
            }
        }
        Err(error) => {
            let customers = customer_options(&state).await.unwrap_or_default();
            let form_html = render_invoice_form(id, &draft, &customers, Some(&error));
            Ok(fragment_response(&state, &form_html).into_response())
        }
    }
}
