//! Login, logout and registration
//!
//! Endpoints:
//! - page_login: Login form
//! - login_submit: Check credentials and open the session
//! - logout: Close the session and reset the list views
//! - page_register: Sign-up form
//! - register_submit: Create the account, then send the user to the login page

use axum::extract::{Form, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use serde::Deserialize;

use crate::routes::{field_error, form_error};
use crate::{page_response, AppState};
use invoiceweb_core::{CoreError, Notifier, Registration};
use invoiceweb_utils::escape_html;

const LOGIN_FAILED: &str =
    "Aucun compte ne possède cette adresse email ou alors les informations ne correspondent pas !";
const REGISTER_FIELDS: [&str; 5] = ["firstName", "lastName", "email", "password", "passwordConfirm"];

/// Login form fields
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Login page
pub async fn page_login(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    Html(page_response(&state, &headers, "Connexion", "/login", &render_login_form("", None)))
}

/// Check credentials; on success go to the customers page
pub async fn login_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth.login(form.username.trim(), &form.password).await {
        Ok(()) => {
            state.toasts.success("Vous êtes désormais connecté");
            Redirect::to("/customers").into_response()
        }
        Err(e) => {
            log::debug!(target: "invoiceweb::auth", "Login failed: {}", e);
            let content = render_login_form(&form.username, Some(LOGIN_FAILED));
            Html(page_response(&state, &headers, "Connexion", "/login", &content)).into_response()
        }
    }
}

/// Close the session; mounted views are discarded so no stale result lands
pub async fn logout(State(state): State<AppState>) -> Redirect {
    state.auth.logout();
    state.invoices.unmount();
    state.customers.unmount();
    state.toasts.success("Vous êtes désormais déconnecté");
    Redirect::to("/login")
}

/// Sign-up page
pub async fn page_register(State(state): State<AppState>, headers: HeaderMap) -> Html<String> {
    let content = render_register_form(&Registration::default(), None);
    Html(page_response(&state, &headers, "Inscription", "/register", &content))
}

/// Create the account; the form is shown again with the first problem
pub async fn register_submit(
    State(state): State<AppState>,
    headers: HeaderMap,
    Form(registration): Form<Registration>,
) -> Response {
    match state.auth.register(&registration).await {
        Ok(()) => {
            state.toasts.success("Vous êtes désormais inscrit, vous pouvez vous connecter !");
            Redirect::to("/login").into_response()
        }
        Err(error) => {
            log::debug!(target: "invoiceweb::auth", "Registration refused: {}", error);
            state.toasts.error("Des erreurs dans votre formulaire !");
            let content = render_register_form(&registration, Some(&error));
            Html(page_response(&state, &headers, "Inscription", "/register", &content)).into_response()
        }
    }
}

fn register_input(name: &str, label: &str, kind: &str, value: &str, error: Option<&CoreError>) -> String {
    format!(
        "<div><label class='block text-sm font-medium mb-1' for='{name}'>{label}</label>\
         <input id='{name}' name='{name}' type='{kind}' value='{value}' class='w-full px-4 py-2 border rounded-lg'>{error}</div>",
        name = name,
        label = label,
        kind = kind,
        value = escape_html(value),
        error = field_error(error, name)
    )
}

// passwords are never echoed back
fn render_register_form(registration: &Registration, error: Option<&CoreError>) -> String {
    format!(
        r#"<form method='post' action='/register' class='max-w-md mx-auto bg-white rounded-xl shadow-sm p-6 space-y-4'>
            <h2 class='text-2xl font-bold'>Inscription</h2>
            {}
            {}
            {}
            {}
            {}
            {}
            <div class='flex gap-4 items-center'>
                <button type='submit' class='px-4 py-2 bg-green-600 text-white rounded-lg hover:bg-green-700'>Confirmation</button>
                <a href='/login' class='text-indigo-600 hover:underline'>J'ai déjà un compte</a>
            </div>
        </form>"#,
        form_error(error, &REGISTER_FIELDS),
        register_input("firstName", "Prénom", "text", &registration.first_name, error),
        register_input("lastName", "Nom de famille", "text", &registration.last_name, error),
        register_input("email", "Adresse email", "email", &registration.email, error),
        register_input("password", "Mot de passe", "password", "", error),
        register_input("passwordConfirm", "Confirmation de mot de passe", "password", "", error)
    )
}

fn render_login_form(username: &str, error: Option<&str>) -> String {
    let error_html = error
        .map(|message| {
            format!(
                "<p class='text-sm text-red-600 mt-1'>{}</p>",
                escape_html(message)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<form method='post' action='/login' class='max-w-md mx-auto bg-white rounded-xl shadow-sm p-6 space-y-4'>
            <h2 class='text-2xl font-bold'>Connexion à l'application</h2>
            <div>
                <label class='block text-sm font-medium mb-1' for='username'>Adresse email</label>
                <input id='username' name='username' type='email' value='{}' placeholder='Adresse email de connexion' class='w-full px-4 py-2 border rounded-lg'>
                {}
            </div>
            <div>
                <label class='block text-sm font-medium mb-1' for='password'>Mot de passe</label>
                <input id='password' name='password' type='password' class='w-full px-4 py-2 border rounded-lg'>
            </div>
            <button type='submit' class='px-4 py-2 bg-green-600 text-white rounded-lg hover:bg-green-700'>Je me connecte !</button>
        </form>"#,
        escape_html(username),
        error_html
    )
}
