//! Customers page rendering - Full page endpoints
//!
//! Endpoints:
//! - page_customers: Customer list page
//! - page_customer: Create or edit form

use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::Html;

use crate::routes::{field_error, form_error, parse_record_id};
use crate::{delete_button, link_to, page_response, pagination_html, search_box, table_loader, AppState, CUSTOMER_ROUTE};
use invoiceweb_core::{CoreError, Customer, CustomerDraft, ListPage, RecordId};
use invoiceweb_utils::escape_html;

const CONTENT: &str = "#customers-content";

/// Customers page - Mounts the list view and shows the first page
pub async fn page_customers(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    state.customers.mount();
    if let Err(e) = state.customers.load().await {
        log::debug!(target: "invoiceweb::api", "Customer list not loaded: {}", e);
    }
    let page = state.customers.page();

    let inner_content = format!(
        r#"<div class='flex items-center justify-between mb-4'>
            <h2 class='text-2xl font-bold'>Liste des clients</h2>
            <a href='{}' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Créer un client</a>
        </div>
        {}
        <div id='customers-content' class='bg-white rounded-xl shadow-sm p-6'>{}</div>"#,
        CUSTOMER_ROUTE.replace(":id", "new"),
        search_box("/customers/list", CONTENT, &page.search_term),
        render_customers_table(&state, &page)
    );

    Html(page_response(&state, &headers, "Clients", "/customers", &inner_content))
}

/// Customer list fragment
pub fn render_customers_table(state: &AppState, page: &ListPage<Customer>) -> String {
    if page.is_loading {
        return table_loader("/customers/reload", CONTENT);
    }

    let mut html = String::from(
        "<table class='w-full text-left'><thead><tr class='border-b text-sm text-gray-500'>\
         <th class='py-2'>Id.</th><th>Client</th><th>Email</th><th>Entreprise</th>\
         <th class='text-center'>Factures</th><th class='text-center'>Montant total</th><th></th>\
         </tr></thead><tbody>",
    );

    if page.items.is_empty() {
        html.push_str("<tr><td colspan='7' class='text-center py-8 text-gray-500'>Aucun client</td></tr>");
    }

    for customer in &page.items {
        // customers owning invoices cannot be deleted
        let delete_button = if customer.invoices.is_empty() {
            delete_button(&link_to(CUSTOMER_ROUTE, customer.id), CONTENT)
        } else {
            "<button disabled class='px-2 py-1 text-sm bg-red-300 text-white rounded cursor-not-allowed'>Supprimer</button>"
                .to_string()
        };

        html.push_str(&format!(
            r#"<tr id='customer-{}' class='border-b hover:bg-gray-50'>
                <td class='py-2'>{}</td>
                <td><a href='{}' class='text-indigo-600 hover:underline'>{}</a></td>
                <td>{}</td>
                <td>{}</td>
                <td class='text-center'><span class='px-2 py-1 rounded-full text-xs bg-blue-100 text-blue-800'>{}</span></td>
                <td class='text-center'>{}</td>
                <td class='text-right'>{}</td>
            </tr>"#,
            customer.id,
            customer.id,
            link_to(CUSTOMER_ROUTE, customer.id),
            escape_html(&customer.full_name()),
            escape_html(&customer.email),
            escape_html(customer.company.as_deref().unwrap_or("")),
            customer.invoices.len(),
            state.amount(customer.total_amount()),
            delete_button
        ));
    }
    html.push_str("</tbody></table>");

    if page.show_pagination {
        html.push_str(&pagination_html(page.pagination(), "/customers/list", CONTENT));
    }
    html
}

/// Customer edit page; `new` opens an empty form
pub async fn page_customer(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Html<String> {
    let inner_content = match parse_record_id(&raw_id) {
        Err(_) => not_found_html(),
        Ok(None) => render_customer_form(None, &CustomerDraft::default(), None, None),
        Ok(Some(id)) => match state.customer_editor.fetch(id).await {
            Ok(customer) => {
                let totals = totals_html(&state, &customer);
                render_customer_form(Some(id), &CustomerDraft::from(&customer), Some(&totals), None)
            }
            Err(CoreError::NotFound { .. }) => not_found_html(),
            Err(error) => render_customer_form(Some(id), &CustomerDraft::default(), None, Some(&error)),
        },
    };

    Html(page_response(&state, &headers, "Client", "/customers", &inner_content))
}

fn not_found_html() -> String {
    "<div class='bg-white rounded-xl shadow-sm p-6 text-center'>\
     <p class='text-gray-600 mb-4'>Client introuvable</p>\
     <a href='/customers' class='text-indigo-600 hover:underline'>Retour à la liste</a></div>"
        .to_string()
}

fn totals_html(state: &AppState, customer: &Customer) -> String {
    format!(
        "<div class='grid grid-cols-3 gap-4 text-center'>\
         <div><p class='text-sm text-gray-500'>Factures</p><p class='text-xl font-bold'>{}</p></div>\
         <div><p class='text-sm text-gray-500'>Montant total</p><p class='text-xl font-bold'>{}</p></div>\
         <div><p class='text-sm text-gray-500'>Reste à payer</p><p class='text-xl font-bold text-red-600'>{}</p></div>\
         </div>",
        customer.invoices.len(),
        state.amount(customer.total_amount()),
        state.amount(customer.unpaid_amount())
    )
}

fn text_input(name: &str, label: &str, value: &str, placeholder: &str, error: Option<&CoreError>) -> String {
    format!(
        "<div><label class='block text-sm font-medium mb-1' for='{name}'>{label}</label>\
         <input id='{name}' name='{name}' type='text' value='{value}' placeholder='{placeholder}' \
         class='w-full px-4 py-2 border rounded-lg'>{error}</div>",
        name = name,
        label = label,
        value = escape_html(value),
        placeholder = placeholder,
        error = field_error(error, name)
    )
}

/// Create/edit form; `totals` is shown above the fields when editing
pub fn render_customer_form(
    id: Option<RecordId>,
    draft: &CustomerDraft,
    totals: Option<&str>,
    error: Option<&CoreError>,
) -> String {
    let (title, action) = match id {
        Some(id) => ("Modification du client", link_to(CUSTOMER_ROUTE, id)),
        None => ("Création d'un client", "/customers/new".to_string()),
    };

    format!(
        r#"<form id='customer-form' hx-post='{}' hx-target='this' hx-swap='outerHTML' class='bg-white rounded-xl shadow-sm p-6 space-y-4'>
            <h2 class='text-2xl font-bold'>{}</h2>
            {}
            {}
            {}
            {}
            {}
            {}
            <div class='flex gap-4 items-center'>
                <button type='submit' class='px-4 py-2 bg-green-600 text-white rounded-lg hover:bg-green-700'>Enregistrer</button>
                <a href='/customers' class='text-indigo-600 hover:underline'>Retour à la liste</a>
            </div>
        </form>"#,
        action,
        title,
        totals.unwrap_or(""),
        form_error(error, &["firstName", "lastName", "email"]),
        text_input("firstName", "Prénom", &draft.first_name, "Prénom du client", error),
        text_input("lastName", "Nom de famille", &draft.last_name, "Nom de famille du client", error),
        text_input("email", "Email", &draft.email, "Adresse email du client", error),
        text_input("company", "Entreprise", draft.company.as_deref().unwrap_or(""), "Entreprise du client", error)
    )
}
