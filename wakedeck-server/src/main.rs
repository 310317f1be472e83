/**
 * WAKEDECK SERVER - Point d'entrée du dashboard LAN
 *
 * RÔLE : Chargement des réglages, construction de l'état partagé
 * (store JSON, notices, sonde ICMP, Wake-on-LAN, SSH) puis serveur HTTP.
 *
 * UTILITÉ : Réveiller les machines du réseau local et y lancer des commandes
 * préconfigurées depuis un navigateur.
 */

mod admin;
mod dashboard;
mod dispatch;
mod http;
mod models;
mod notices;
mod pages;
mod probe;
mod settings;
mod ssh;
mod state;
mod store;
mod wol;

use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::notices::NoticeBoard;
use crate::probe::IcmpProber;
use crate::settings::ServerSettings;
use crate::ssh::OpenSshShell;
use crate::state::AppState;
use crate::store::ConfigStore;
use crate::wol::UdpWol;

#[tokio::main]
async fn main() -> Result<()> {
    // .env optionnel
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("wakedeck_server=info,tower_http=info")),
        )
        .init();

    let settings = ServerSettings::load().await.context("Failed to load settings")?;

    let store = ConfigStore::new(settings.data_file.clone());
    if store.exists() {
        info!(path = %store.path().display(), "host configuration found");
    } else {
        warn!(path = %store.path().display(), "no host configuration yet, first host will create it");
    }

    let shell = OpenSshShell::from_conf(&settings.ssh).context("Invalid ssh.extra_args")?;

    // fabrique l'état unique pour Axum
    let app_state = AppState {
        store: Arc::new(store),
        notices: NoticeBoard::new(),
        prober: Arc::new(IcmpProber::new(settings.probe.timeout())),
        waker: Arc::new(UdpWol::from_conf(&settings.wol)),
        shell: Arc::new(shell),
        settings: Arc::new(settings),
    };

    let addr = app_state.settings.listen;
    let app = http::build_router(app_state);

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("HTTP server failed")?;

    Ok(())
}
