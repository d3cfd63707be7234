//! HTTP server with HTMX support
//!
//! Routes are organized into modules:
//! - routes::invoices: Invoice list, search, pagination, edit form
//! - routes::customers: Customer list, search, pagination, edit form
//! - routes::auth: Login and logout
//!
//! Every private route goes through [`require_auth`].

pub mod error;
pub mod routes;

use axum::extract::{Request, State};
use axum::http::{HeaderMap, Method};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::Router;
use rust_decimal::Decimal;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};

use invoiceweb_config::Config;
use invoiceweb_core::{
    Authenticator, Customer, Invoice, ListView, Notifier, Pagination, RecordEditor, RecordId,
    ResultCache, SourceRef, ToastKind, ToastQueue, ViewOptions,
};
use invoiceweb_utils::{escape_html, format_amount, generate_id};

pub use error::ApiError;

/// Route template of the invoice edit page
pub const INVOICE_ROUTE: &str = "/invoices/:id";

/// Route template of the customer edit page
pub const CUSTOMER_ROUTE: &str = "/customers/:id";

/// Fill a route template with a record id
pub fn link_to(template: &str, id: RecordId) -> String {
    template.replace(":id", &id.to_string())
}

/// Application state
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub invoices: Arc<ListView<Invoice>>,
    pub customers: Arc<ListView<Customer>>,
    pub invoice_editor: Arc<RecordEditor<Invoice>>,
    pub customer_editor: Arc<RecordEditor<Customer>>,
    /// Customer choices of the invoice form
    pub customer_source: SourceRef<Customer>,
    pub cache: Arc<ResultCache>,
    pub toasts: Arc<ToastQueue>,
    pub auth: Arc<dyn Authenticator>,
}

impl AppState {
    pub fn new(
        config: Config,
        invoice_source: SourceRef<Invoice>,
        customer_source: SourceRef<Customer>,
        auth: Arc<dyn Authenticator>,
        cache: Arc<ResultCache>,
    ) -> Self {
        let toasts = Arc::new(ToastQueue::new());
        let notifier: Arc<dyn Notifier> = toasts.clone();
        let options = ViewOptions::from_config(&config);

        Self {
            invoices: Arc::new(ListView::new(
                invoice_source.clone(),
                notifier.clone(),
                cache.clone(),
                options,
            )),
            customers: Arc::new(ListView::new(
                customer_source.clone(),
                notifier.clone(),
                cache.clone(),
                options,
            )),
            invoice_editor: Arc::new(RecordEditor::new(invoice_source, notifier.clone(), cache.clone())),
            customer_editor: Arc::new(RecordEditor::new(customer_source.clone(), notifier, cache.clone())),
            customer_source,
            cache,
            toasts,
            auth,
            config: Arc::new(config),
        }
    }

    /// Amount in the configured currency format
    pub fn amount(&self, amount: Decimal) -> String {
        let currency = &self.config.currency;
        format_amount(
            amount,
            currency.decimal_places,
            &currency.thousands_separator,
            &currency.decimal_separator,
            &currency.symbol,
        )
    }
}

/// Create the application router
pub fn create_router(state: AppState) -> Router {
    use routes::auth::{login_submit, logout, page_login, page_register, register_submit};
    use routes::customers::{
        api_customers, htmx_customer_delete, htmx_customer_save, htmx_customers_list,
        htmx_customers_reload, page_customer, page_customers,
    };
    use routes::invoices::{
        api_invoices, htmx_invoice_delete, htmx_invoice_save, htmx_invoices_list,
        htmx_invoices_reload, page_invoice, page_invoices,
    };

    let private = Router::new()
        // API endpoints
        .route("/api/invoices", get(api_invoices))
        .route("/api/customers", get(api_customers))
        // HTMX page routes
        .route("/invoices", get(page_invoices))
        .route("/customers", get(page_customers))
        // HTMX partial routes
        .route("/invoices/list", get(htmx_invoices_list))
        .route("/invoices/reload", post(htmx_invoices_reload))
        .route("/customers/list", get(htmx_customers_list))
        .route("/customers/reload", post(htmx_customers_reload))
        // Edit, save and delete
        .route(
            INVOICE_ROUTE,
            get(page_invoice).post(htmx_invoice_save).delete(htmx_invoice_delete),
        )
        .route(
            CUSTOMER_ROUTE,
            get(page_customer).post(htmx_customer_save).delete(htmx_customer_delete),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .route("/api/health", get(health_check))
        .route("/", get(index_page))
        .route("/login", get(page_login).post(login_submit))
        .route("/register", get(page_register).post(register_submit))
        .route("/logout", get(logout))
        .merge(private)
        .layer(CorsLayer::new().allow_origin(Any).allow_methods([Method::GET]))
        .with_state(state)
}

/// Redirect visitors without a session to the login page
pub async fn require_auth(State(state): State<AppState>, request: Request, next: Next) -> Response {
    if state.auth.is_authenticated() {
        return next.run(request).await;
    }

    log::debug!(target: "invoiceweb::auth", "Anonymous request to {}", request.uri().path());
    if request.uri().path().starts_with("/api/") {
        ApiError::Unauthorized.into_response()
    } else if is_htmx_request(request.headers()) {
        ([("HX-Redirect", "/login")], "").into_response()
    } else {
        Redirect::to("/login").into_response()
    }
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}

// ==================== Template Functions ====================

const TOAST_SCRIPT: &str = r#"<script>
function armToasts() {
    document.querySelectorAll('#toasts .toast:not([data-armed])').forEach(function (toast) {
        toast.dataset.armed = '1';
        setTimeout(function () { toast.remove(); }, parseInt(toast.dataset.autoclose, 10));
    });
}
document.addEventListener('DOMContentLoaded', armToasts);
document.addEventListener('htmx:afterSettle', armToasts);
</script>"#;

/// Base HTML template
pub fn base_html(title: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="fr">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{} - invoiceweb</title>
    <script src="https://unpkg.com/htmx.org@1.9.10"></script>
    <script src="https://cdn.tailwindcss.com"></script>
    <style>
        .htmx-indicator {{ opacity: 0; transition: opacity 0.3s; }}
        .htmx-request .htmx-indicator {{ opacity: 1; }}
        .htmx-request.htmx-indicator {{ opacity: 1; }}
    </style>
</head>
<body class="bg-gray-50 text-gray-900">
    {}
    {}
</body>
</html>"#,
        escape_html(title),
        content,
        TOAST_SCRIPT
    )
}

/// Top navigation bar
pub fn nav_bar(current_path: &str, authenticated: bool) -> String {
    let links = [("/customers", "Clients"), ("/invoices", "Factures")];

    let mut nav = String::from(
        "<nav class='bg-indigo-600 text-white'><div class='max-w-6xl mx-auto px-4 flex items-center h-14 gap-6'>\
         <a href='/' class='text-lg font-bold'>invoiceweb</a><ul class='flex gap-2 flex-1'>",
    );
    for (path, label) in &links {
        let active_class = if current_path.starts_with(path) {
            "bg-indigo-700"
        } else {
            "hover:bg-indigo-500"
        };
        nav.push_str(&format!(
            "<li><a href='{}' class='px-3 py-2 rounded-lg {}'>{}</a></li>",
            path, active_class, label
        ));
    }
    nav.push_str("</ul>");
    if authenticated {
        nav.push_str("<a href='/logout' class='px-3 py-2 rounded-lg bg-red-500 hover:bg-red-600'>Déconnexion</a>");
    } else {
        nav.push_str("<a href='/register' class='px-3 py-2 rounded-lg hover:bg-indigo-500'>Inscription</a>");
        nav.push_str("<a href='/login' class='px-3 py-2 rounded-lg bg-green-500 hover:bg-green-600'>Connexion</a>");
    }
    nav.push_str("</div></nav>");
    nav
}

/// Check if request is from HTMX (partial page update)
pub fn is_htmx_request(headers: &HeaderMap) -> bool {
    headers.get("hx-request").is_some()
}

/// Pending toasts; `oob` appends them to the existing container
pub fn toasts_html(state: &AppState, oob: bool) -> String {
    let auto_close = state.config.notifications.auto_close_ms;
    let items: String = state
        .toasts
        .drain()
        .iter()
        .map(|toast| {
            let color = match toast.kind {
                ToastKind::Success => "bg-green-600",
                ToastKind::Error => "bg-red-600",
            };
            format!(
                "<div id='toast-{}' class='toast px-4 py-2 rounded-lg shadow text-white {}' data-autoclose='{}'>{}</div>",
                generate_id(),
                color,
                auto_close,
                escape_html(&toast.message)
            )
        })
        .collect();

    if oob {
        if items.is_empty() {
            return String::new();
        }
        format!("<div hx-swap-oob='beforeend:#toasts'>{}</div>", items)
    } else {
        format!(
            "<div id='toasts' class='fixed {} z-50 space-y-2'>{}</div>",
            state.config.notifications.position.css(),
            items
        )
    }
}

/// Wrap content for full page or HTMX partial
pub fn page_response(
    state: &AppState,
    headers: &HeaderMap,
    title: &str,
    current_path: &str,
    inner_content: &str,
) -> String {
    if is_htmx_request(headers) {
        format!("{}{}", inner_content, toasts_html(state, true))
    } else {
        base_html(
            title,
            &format!(
                "{}<main class='max-w-6xl mx-auto px-4 pt-8'>{}</main>{}",
                nav_bar(current_path, state.auth.is_authenticated()),
                inner_content,
                toasts_html(state, false)
            ),
        )
    }
}

/// Fragment response carrying pending toasts
pub fn fragment_response(state: &AppState, inner_content: &str) -> Html<String> {
    Html(format!("{}{}", inner_content, toasts_html(state, true)))
}

/// Pagination control swapping `target` with `list_path?page=N`
pub fn pagination_html(pagination: Pagination, list_path: &str, target: &str) -> String {
    let button = |page: usize, label: &str, enabled: bool, active: bool| {
        let class = if active {
            "bg-indigo-600 text-white"
        } else if enabled {
            "bg-white hover:bg-gray-100"
        } else {
            "bg-gray-100 text-gray-400 cursor-not-allowed"
        };
        let action = if enabled && !active {
            format!("hx-get='{}?page={}' hx-target='{}'", list_path, page, target)
        } else {
            String::from("disabled")
        };
        format!(
            "<li><button {} class='px-3 py-1 border rounded {}'>{}</button></li>",
            action, class, label
        )
    };

    let mut html = String::from("<ul class='flex gap-1 justify-center mt-4'>");
    html.push_str(&button(pagination.previous(), "&laquo;", pagination.has_previous(), false));
    for page in pagination.pages() {
        html.push_str(&button(page, &page.to_string(), true, page == pagination.current));
    }
    html.push_str(&button(pagination.next(), "&raquo;", pagination.has_next(), false));
    html.push_str("</ul>");
    html
}

/// Search box swapping `target` with `list_path?q=...`
pub fn search_box(list_path: &str, target: &str, value: &str) -> String {
    format!(
        "<input type='text' name='q' value='{}' placeholder='Rechercher...' \
         hx-get='{}' hx-target='{}' hx-trigger='keyup changed delay:300ms' \
         class='w-full px-4 py-2 border rounded-lg mb-4'>",
        escape_html(value),
        list_path,
        target
    )
}

/// Placeholder shown while a collection has not loaded
pub fn table_loader(reload_path: &str, target: &str) -> String {
    format!(
        "<div class='text-center py-12 text-gray-500 space-y-3'>\
         <p class='animate-pulse'>Chargement...</p>\
         <button hx-post='{}' hx-target='{}' class='px-4 py-2 bg-gray-100 rounded-lg hover:bg-gray-200'>Recharger</button>\
         </div>",
        reload_path, target
    )
}

/// Delete button; the row is hidden as soon as the request starts and the
/// returned table fragment puts it back if the deletion is refused
pub fn delete_button(delete_path: &str, target: &str) -> String {
    format!(
        "<button hx-delete='{}' hx-target='{}' hx-on::before-request=\"this.closest('tr').style.display='none'\" \
         class='px-2 py-1 text-sm bg-red-600 text-white rounded'>Supprimer</button>",
        delete_path, target
    )
}

/// Home page
async fn index_page(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let inner_content = r#"<div class='bg-white rounded-xl shadow-sm p-10 text-center'>
        <h1 class='text-3xl font-bold mb-4'>Gestion des factures</h1>
        <p class='text-gray-600 mb-6'>Consultez vos clients et suivez vos factures.</p>
        <div class='flex gap-4 justify-center'>
            <a href='/customers' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Clients</a>
            <a href='/invoices' class='px-4 py-2 bg-indigo-600 text-white rounded-lg hover:bg-indigo-700'>Factures</a>
        </div>
    </div>"#;

    Html(page_response(&state, &headers, "Accueil", "/", inner_content))
}

/// Start the HTTP server and serve until Ctrl+C
pub async fn start_server(state: AppState) -> anyhow::Result<()> {
    let addr = format!("{}:{}", state.config.server.host, state.config.server.port);
    let router = create_router(state);

    let listener = TcpListener::bind(&addr).await?;
    log::info!("Starting invoiceweb server on http://{}", addr);
    log::info!("Available routes:");
    log::info!("  - /invoices (Invoice list)");
    log::info!("  - /customers (Customer list)");
    log::info!("  - /login, /logout, /register");
    log::info!("  - /api/* (JSON API endpoints)");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    log::info!("Server stopped gracefully");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        log::error!("Failed to listen for shutdown signal: {}", e);
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use invoiceweb_core::store::{CustomerFixture, Fixtures, InvoiceFixture};
    use async_trait::async_trait;
    use invoiceweb_core::{
        CoreError, CoreResult, DataSource, InvoiceDraft, InvoiceStatus, MemoryStore, StaticAuthenticator,
    };

    pub fn fixtures(invoice_count: u64) -> Fixtures {
        Fixtures {
            customers: vec![
                CustomerFixture {
                    id: 1,
                    first_name: "Alice".to_string(),
                    last_name: "Martin".to_string(),
                    email: "alice@example.com".to_string(),
                    company: Some("Acme".to_string()),
                },
                CustomerFixture {
                    id: 2,
                    first_name: "Bruno".to_string(),
                    last_name: "Leroy".to_string(),
                    email: "bruno@example.com".to_string(),
                    company: None,
                },
            ],
            invoices: (1..=invoice_count)
                .map(|id| InvoiceFixture {
                    id,
                    chrono: id as u32,
                    amount: Decimal::from(100 * id),
                    sent_at: chrono::Utc::now(),
                    status: if id == 1 { InvoiceStatus::Paid } else { InvoiceStatus::Sent },
                    customer_id: 1,
                })
                .collect(),
        }
    }

    /// State over a memory store; `credentials` enables the login gate
    pub fn state(invoice_count: u64, credentials: Option<(&str, &str)>) -> AppState {
        let store = Arc::new(MemoryStore::new(fixtures(invoice_count)).unwrap());
        let auth = StaticAuthenticator::new(
            credentials.map(|(u, p)| (u.to_string(), p.to_string())),
        );
        AppState::new(
            Config::default(),
            store.clone(),
            store,
            Arc::new(auth),
            Arc::new(ResultCache::default()),
        )
    }

    /// Invoice source that cannot be reached
    pub struct UnreachableSource;

    #[async_trait]
    impl DataSource<Invoice> for UnreachableSource {
        async fn find_all(&self) -> CoreResult<Vec<Invoice>> {
            Err(unreachable_error())
        }

        async fn find(&self, _id: RecordId) -> CoreResult<Invoice> {
            Err(unreachable_error())
        }

        async fn delete(&self, _id: RecordId) -> CoreResult<()> {
            Err(unreachable_error())
        }

        async fn create(&self, _draft: &InvoiceDraft) -> CoreResult<Invoice> {
            Err(unreachable_error())
        }

        async fn update(&self, _id: RecordId, _draft: &InvoiceDraft) -> CoreResult<Invoice> {
            Err(unreachable_error())
        }
    }

    fn unreachable_error() -> CoreError {
        CoreError::Transport {
            message: "connection refused".to_string(),
        }
    }

    /// State whose invoice source always fails
    pub fn unreachable_invoices_state() -> AppState {
        let store = Arc::new(MemoryStore::new(fixtures(0)).unwrap());
        AppState::new(
            Config::default(),
            Arc::new(UnreachableSource),
            store,
            Arc::new(StaticAuthenticator::new(None)),
            Arc::new(ResultCache::default()),
        )
    }

    pub async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }
}

#[cfg(test)]
mod tests {
    use super::testing::{body_text, state};
    use super::*;
    use axum::body::Body;
    use axum::http::StatusCode;
    use tower::ServiceExt;

    #[test]
    fn test_link_to() {
        assert_eq!(link_to(INVOICE_ROUTE, 42), "/invoices/42");
        assert_eq!(link_to(CUSTOMER_ROUTE, 7), "/customers/7");
    }

    #[test]
    fn test_pagination_html_marks_current_page() {
        let html = pagination_html(Pagination { current: 2, page_count: 3 }, "/invoices/list", "#invoices-content");
        assert!(html.contains("hx-get='/invoices/list?page=1'"));
        assert!(html.contains("hx-get='/invoices/list?page=3'"));
        assert!(!html.contains("hx-get='/invoices/list?page=2'"));
    }

    #[test]
    fn test_toasts_are_drained_once() {
        let state = state(0, None);
        state.toasts.success("Suppression de la facture : réussie");
        let html = toasts_html(&state, true);
        assert!(html.contains("hx-swap-oob"));
        assert!(html.contains("data-autoclose='3000'"));
        assert!(toasts_html(&state, true).is_empty());
    }

    #[test]
    fn test_amount_formatting_follows_config() {
        let state = state(0, None);
        assert_eq!(state.amount(Decimal::from(1500)), "1 500,00 €");
    }

    #[tokio::test]
    async fn test_health_check() {
        let router = create_router(state(0, None));
        let response = router
            .oneshot(axum::http::Request::builder().uri("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn test_private_page_redirects_to_login() {
        let router = create_router(state(3, Some(("admin", "secret"))));
        let response = router
            .clone()
            .oneshot(axum::http::Request::builder().uri("/invoices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], "/login");

        let response = router
            .oneshot(axum::http::Request::builder().uri("/api/invoices").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_htmx_request_gets_hx_redirect() {
        let router = create_router(state(3, Some(("admin", "secret"))));
        let response = router
            .oneshot(
                axum::http::Request::builder()
                    .uri("/invoices/list")
                    .header("hx-request", "true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.headers()["hx-redirect"], "/login");
    }

    #[tokio::test]
    async fn test_home_page_is_public() {
        let router = create_router(state(0, Some(("admin", "secret"))));
        let response = router
            .oneshot(axum::http::Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_text(response).await;
        assert!(body.contains("Connexion"));
        assert!(body.contains("href='/register'"));
        assert!(body.contains("id='toasts'"));
    }
}
