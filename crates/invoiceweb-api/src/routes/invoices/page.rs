//! Invoices page rendering - Full page endpoints
//!
//! Endpoints:
//! - page_invoices: Invoice list page
//! - page_invoice: Create or edit form
//!
//! Helper functions:
//! - render_invoices_table: List fragment, also served by the HTMX endpoints
//! - render_invoice_form: Form fragment, also served after a failed save

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Html;
use rust_decimal::Decimal;

use crate::routes::customers::customer_options;
use crate::routes::{field_error, form_error, parse_record_id, status_badge};
use crate::{delete_button, link_to, page_response, pagination_html, search_box, table_loader, AppState, CUSTOMER_ROUTE, INVOICE_ROUTE};
use invoiceweb_core::{CoreError, Customer, Invoice, InvoiceDraft, InvoiceStatus, ListPage, RecordId};
use invoiceweb_utils::{escape_html, format_date};

const CONTENT: &str = "#invoices-content";

/// Invoices page - Mounts the list view and shows the first page
pub async fn page_invoices(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    state.invoices.mount();
    // failures are reported through a toast; the table shows its loader
    if let Err(e) = state.invoices.load().await {
        log::debug!(target: "invoiceweb::api", "Invoice list not loaded: {}", e);
    }
    let page = state.invoices.page();

    let inner_content = format!(
        r#"<div class='flex items-center justify-between mb-4'>
            <h2 class='text-2xl font-bold'>Liste des factures</h2>
            <a href='{}' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Créer une facture</a>
        </div>
        {}
        <div id='invoices-content' class='bg-white rounded-xl shadow-sm p-6'>{}</div>"#,
        INVOICE_ROUTE.replace(":id", "new"),
        search_box("/invoices/list", CONTENT, &page.search_term),
        render_invoices_table(&state, &page)
    );

    Html(page_response(&state, &headers, "Factures", "/invoices", &inner_content))
}

/// Invoice list fragment
pub fn render_invoices_table(state: &AppState, page: &ListPage<Invoice>) -> String {
    if page.is_loading {
        return table_loader("/invoices/reload", CONTENT);
    }

    let mut html = String::from(
        "<table class='w-full text-left'><thead><tr class='border-b text-sm text-gray-500'>\
         <th class='py-2'>Numéro</th><th>Client</th><th class='text-center'>Statut</th>\
         <th class='text-center'>Date d'envoi</th><th class='text-center'>Montant</th><th></th>\
         </tr></thead><tbody>",
    );

    if page.items.is_empty() {
        html.push_str("<tr><td colspan='6' class='text-center py-8 text-gray-500'>Aucune facture</td></tr>");
    }

    for invoice in &page.items {
        html.push_str(&format!(
            r#"<tr id='invoice-{}' class='border-b hover:bg-gray-50'>
                <td class='py-2'>{}</td>
                <td><a href='{}' class='text-indigo-600 hover:underline'>{}</a></td>
                <td class='text-center'>{}</td>
                <td class='text-center'>{}</td>
                <td class='text-center'>{}</td>
                <td class='text-right whitespace-nowrap'>
                    <a href='{}' class='px-2 py-1 text-sm bg-indigo-600 text-white rounded'>Editer</a>
                    {}
                </td>
            </tr>"#,
            invoice.id,
            invoice.chrono,
            link_to(CUSTOMER_ROUTE, invoice.customer.id),
            escape_html(&invoice.customer.full_name()),
            status_badge(invoice.status),
            format_date(&invoice.sent_at),
            state.amount(invoice.amount),
            link_to(INVOICE_ROUTE, invoice.id),
            delete_button(&link_to(INVOICE_ROUTE, invoice.id), CONTENT)
        ));
    }
    html.push_str("</tbody></table>");

    if page.show_pagination {
        html.push_str(&pagination_html(page.pagination(), "/invoices/list", CONTENT));
    }
    html
}

/// Invoice edit page; `new` opens an empty form
pub async fn page_invoice(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Html<String> {
    let inner_content = match parse_record_id(&raw_id) {
        Err(_) => not_found_html(),
        Ok(None) => {
            let customers = customer_options(&state).await.unwrap_or_default();
            render_invoice_form(None, &InvoiceDraft::default(), &customers, None)
        }
        Ok(Some(id)) => match state.invoice_editor.fetch(id).await {
            Ok(invoice) => {
                let customers = customer_options(&state).await.unwrap_or_default();
                render_invoice_form(Some(id), &InvoiceDraft::from(&invoice), &customers, None)
            }
            Err(CoreError::NotFound { .. }) => not_found_html(),
            Err(error) => render_invoice_form(Some(id), &InvoiceDraft::default(), &[], Some(&error)),
        },
    };

    Html(page_response(&state, &headers, "Facture", "/invoices", &inner_content))
}

fn not_found_html() -> String {
    "<div class='bg-white rounded-xl shadow-sm p-6 text-center'>\
     <p class='text-gray-600 mb-4'>Facture introuvable</p>\
     <a href='/invoices' class='text-indigo-600 hover:underline'>Retour à la liste</a></div>"
        .to_string()
}

/// Create/edit form
pub fn render_invoice_form(
    id: Option<RecordId>,
    draft: &InvoiceDraft,
    customers: &[Customer],
    error: Option<&CoreError>,
) -> String {
    let (title, action) = match id {
        Some(id) => ("Modification de la facture", link_to(INVOICE_ROUTE, id)),
        None => ("Création d'une facture", "/invoices/new".to_string()),
    };
    let amount = if draft.amount > Decimal::ZERO {
        draft.amount.normalize().to_string()
    } else {
        String::new()
    };

    let customer_options: String = customers
        .iter()
        .map(|c| {
            format!(
                "<option value='{}' {}>{}</option>",
                c.id,
                if c.id == draft.customer_id { "selected" } else { "" },
                escape_html(&c.full_name())
            )
        })
        .collect();

    let status_options: String = InvoiceStatus::ALL
        .iter()
        .map(|s| {
            format!(
                "<option value='{}' {}>{}</option>",
                s,
                if *s == draft.status { "selected" } else { "" },
                s.label()
            )
        })
        .collect();

    format!(
        r#"<form id='invoice-form' hx-post='{}' hx-target='this' hx-swap='outerHTML' class='bg-white rounded-xl shadow-sm p-6 space-y-4'>
            <h2 class='text-2xl font-bold'>{}</h2>
            {}
            <div>
                <label class='block text-sm font-medium mb-1' for='amount'>Montant</label>
                <input id='amount' name='amount' type='number' step='0.01' value='{}' placeholder='Montant de la facture' class='w-full px-4 py-2 border rounded-lg'>
                {}
            </div>
            <div>
                <label class='block text-sm font-medium mb-1' for='customer'>Client</label>
                <select id='customer' name='customer' class='w-full px-4 py-2 border rounded-lg'>
                    <option value='0'>Choisir un client</option>{}
                </select>
                {}
            </div>
            <div>
                <label class='block text-sm font-medium mb-1' for='status'>Statut</label>
                <select id='status' name='status' class='w-full px-4 py-2 border rounded-lg'>{}</select>
            </div>
            <div class='flex gap-4 items-center'>
                <button type='submit' class='px-4 py-2 bg-green-600 text-white rounded-lg hover:bg-green-700'>Enregistrer</button>
                <a href='/invoices' class='text-indigo-600 hover:underline'>Retour à la liste</a>
            </div>
        </form>"#,
        action,
        title,
        form_error(error, &["amount", "customer"]),
        amount,
        field_error(error, "amount"),
        customer_options,
        field_error(error, "customer"),
        status_options
    )
}
