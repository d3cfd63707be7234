//! Customers API endpoints - JSON API and HTMX partial responses
//!
//! Endpoints:
//! - api_customers: Filtered, paginated customers (JSON)
//! - htmx_customers_list: Customer list (HTML fragment)
//! - htmx_customers_reload: Fetch again, bypassing the cache (HTML fragment)
//! - htmx_customer_delete: Optimistic delete (HTML fragment)
//! - htmx_customer_save: Create or update from the form (HTMX)

use axum::extract::{Form, Path, Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::Json;
use serde::Deserialize;

use super::page::{render_customer_form, render_customers_table};
use crate::routes::{apply_query, ensure_loaded, parse_record_id, ListQuery};
use crate::{fragment_response, is_htmx_request, ApiError, AppState};
use invoiceweb_core::{CoreResult, Customer, CustomerDraft, DataSource, ListPage, Record, RecordId};

/// Customer choices of the invoice form, shared through the result cache
pub async fn customer_options(state: &AppState) -> CoreResult<Vec<Customer>> {
    if let Some(customers) = state.cache.get::<Customer>(Customer::COLLECTION) {
        return Ok(customers);
    }
    let customers = state.customer_source.find_all().await?;
    state.cache.set(Customer::COLLECTION, customers.clone());
    Ok(customers)
}

/// Get customers with search and pagination (JSON API)
pub async fn api_customers(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<ListPage<Customer>>, ApiError> {
    ensure_loaded(&state.customers).await?;
    let term = query.q.unwrap_or_default();
    Ok(Json(state.customers.query(&term, query.page.unwrap_or(1))))
}

/// HTMX: Customer list - Partial page update
pub async fn htmx_customers_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Html<String> {
    if let Err(e) = ensure_loaded(&state.customers).await {
        log::debug!(target: "invoiceweb::api", "Customer list not loaded: {}", e);
    }
    apply_query(&state.customers, &query);
    fragment_response(&state, &render_customers_table(&state, &state.customers.page()))
}

/// HTMX: Reload customers from the data source
pub async fn htmx_customers_reload(State(state): State<AppState>) -> Html<String> {
    if let Err(e) = state.customers.reload().await {
        log::debug!(target: "invoiceweb::api", "Customer reload failed: {}", e);
    }
    fragment_response(&state, &render_customers_table(&state, &state.customers.page()))
}

/// HTMX: Delete a customer; refused while the customer owns invoices
pub async fn htmx_customer_delete(
    State(state): State<AppState>,
    Path(id): Path<RecordId>,
) -> Html<String> {
    if let Err(e) = state.customers.remove(id).await {
        log::debug!(target: "invoiceweb::api", "Delete of customer #{} not applied: {}", id, e);
    }
    fragment_response(&state, &render_customers_table(&state, &state.customers.page()))
}

/// Customer form fields
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerForm {
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub company: String,
}

impl CustomerForm {
    pub fn to_draft(&self) -> CustomerDraft {
        let company = self.company.trim();
        CustomerDraft {
            first_name: self.first_name.clone(),
            last_name: self.last_name.clone(),
            email: self.email.clone(),
            company: if company.is_empty() { None } else { Some(company.to_string()) },
        }
    }
}

/// HTMX: Save the customer form
pub async fn htmx_customer_save(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Form(form): Form<CustomerForm>,
) -> Result<Response, ApiError> {
    let id = parse_record_id(&raw_id)?;
    let draft = form.to_draft();

    match state.customer_editor.save(id, &draft).await {
        Ok(_) => {
            if is_htmx_request(&headers) {
                Ok(([("HX-Redirect", "/customers")], "").into_response())
            } else {
                Ok(Redirect::to("/customers").into_response())
            }
        }
        Err(error) => {
            let form_html = render_customer_form(id, &draft, None, Some(&error));
            Ok(fragment_response(&state, &form_html).into_response())
        }
    }
}
