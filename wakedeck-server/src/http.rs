/**
 * HTTP WAKEDECK - Serveur du dashboard
 *
 * RÔLE :
 * Expose les pages HTML et les actions (ajout host/client, réveil, commande SSH).
 * Toutes les actions répondent par une redirection ; leurs messages sont
 * affichés par la page suivante.
 *
 * ROUTES :
 * - GET/POST /                dashboard (ping de tous les hosts)
 * - GET/POST /hosts-config    formulaire host
 * - GET/POST /clients-config  formulaire client
 * - GET /wakeup?host-label=   magic packet
 * - GET /command?host-label=&client=   commande SSH du client
 * - GET /about, GET /README
 *
 * MIDDLEWARES :
 * - sans fichier de configuration, les routes qui en dépendent redirigent
 *   vers /hosts-config avant d'atteindre le handler
 * - en-têtes anti-cache sur toutes les réponses
 */

use axum::extract::{Form, Query, Request, State};
use axum::http::{header, HeaderValue};
use axum::middleware::{self, Next};
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::{error, warn};

use crate::admin::{self, ClientForm, HostForm};
use crate::dashboard::load_dashboard;
use crate::dispatch;
use crate::notices::Notice;
use crate::pages;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
struct WakeParams {
    #[serde(rename = "host-label")]
    host_label: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CommandParams {
    #[serde(rename = "host-label")]
    host_label: Option<String>,
    client: Option<String>,
}

pub fn build_router(app_state: AppState) -> Router {
    let gated = Router::new()
        .route("/", get(index).post(index))
        .route("/clients-config", get(clients_config_form).post(clients_config_submit))
        .route("/wakeup", get(wakeup))
        .route("/command", get(run_client_command))
        .route_layer(middleware::from_fn_with_state(app_state.clone(), require_config));

    Router::new()
        .route("/hosts-config", get(hosts_config_form).post(hosts_config_submit))
        .route("/about", get(about))
        .route("/README", get(readme))
        .merge(gated)
        .with_state(app_state)
        .layer(middleware::from_fn(no_cache))
        .layer(TraceLayer::new_for_http())
}

async fn require_config(State(app): State<AppState>, req: Request, next: Next) -> Response {
    if !app.store.exists() {
        return Redirect::to("/hosts-config").into_response();
    }
    next.run(req).await
}

async fn no_cache(req: Request, next: Next) -> Response {
    let mut res = next.run(req).await;
    let headers = res.headers_mut();
    headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-cache, no-store, must-revalidate"));
    headers.insert(header::EXPIRES, HeaderValue::from_static("0"));
    headers.insert(header::PRAGMA, HeaderValue::from_static("no-cache"));
    res
}

fn redirect_to(next: admin::Next) -> Redirect {
    match next {
        admin::Next::Dashboard => Redirect::to("/"),
        admin::Next::HostForm => Redirect::to("/hosts-config"),
        admin::Next::ClientForm => Redirect::to("/clients-config"),
    }
}

// GET/POST / (dashboard)
async fn index(State(app): State<AppState>) -> Html<String> {
    let views = match load_dashboard(&app.store, app.prober.clone()).await {
        Ok(views) => views,
        Err(e) => {
            error!(error = %e, "dashboard cannot load configuration");
            app.notices.push(Notice::danger(format!("Could not read configuration: {e}")));
            Vec::new()
        }
    };
    Html(pages::dashboard(&views, &app.notices.drain()))
}

// GET /hosts-config
async fn hosts_config_form(State(app): State<AppState>) -> Html<String> {
    Html(pages::hosts_form(&app.notices.drain()))
}

// POST /hosts-config
async fn hosts_config_submit(State(app): State<AppState>, Form(form): Form<HostForm>) -> Redirect {
    let outcome = admin::register_host(&app.store, app.prober.as_ref(), &form).await;
    app.notices.extend(outcome.notices);
    redirect_to(outcome.next)
}

// GET /clients-config (liste des hosts pour le select)
async fn clients_config_form(State(app): State<AppState>) -> Response {
    match app.store.load() {
        Ok(doc) => Html(pages::clients_form(&doc.host_names(), &app.notices.drain())).into_response(),
        Err(e) => {
            error!(error = %e, "client form cannot load configuration");
            app.notices.push(Notice::danger(format!("Could not read configuration: {e}")));
            Redirect::to("/").into_response()
        }
    }
}

// POST /clients-config
async fn clients_config_submit(State(app): State<AppState>, Form(form): Form<ClientForm>) -> Redirect {
    let outcome = admin::register_client(&app.store, &form);
    app.notices.extend(outcome.notices);
    redirect_to(outcome.next)
}

// GET /wakeup?host-label=
async fn wakeup(State(app): State<AppState>, Query(params): Query<WakeParams>) -> Redirect {
    let notices = dispatch::wake(&app.store, app.waker.as_ref(), params.host_label.as_deref());
    app.notices.extend(notices);
    Redirect::to("/")
}

// GET /command?host-label=&client=
async fn run_client_command(State(app): State<AppState>, Query(params): Query<CommandParams>) -> Redirect {
    let notices = dispatch::run_command(
        &app.store,
        app.shell.as_ref(),
        params.host_label.as_deref(),
        params.client.as_deref(),
    )
    .await;
    app.notices.extend(notices);
    Redirect::to("/")
}

// GET /about
async fn about(State(app): State<AppState>) -> Html<String> {
    Html(pages::about(&app.notices.drain()))
}

// GET /README
async fn readme(State(app): State<AppState>) -> Html<String> {
    let path = &app.settings.readme_path;
    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "readme not readable");
            app.notices.push(Notice::warning(format!("README not available: {e}")));
            String::new()
        }
    };
    Html(pages::readme(&text, &app.notices.drain()))
}
