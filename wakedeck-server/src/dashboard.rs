use std::sync::Arc;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use crate::models::{ConfigDocument, HostView, Reachability};
use crate::probe::Prober;
use crate::store::{ConfigStore, StoreError};

/// Recharge la configuration et sonde tous les hosts
pub async fn load_dashboard(store: &ConfigStore, prober: Arc<dyn Prober>) -> Result<Vec<HostView>, StoreError> {
    let doc = store.load()?;
    Ok(sweep(doc, prober).await)
}

/// Sonde tous les hosts en parallèle ; l'ordre du document est conservé.
/// Une sonde qui échoue (ou panique) n'affecte que son host.
pub async fn sweep(doc: ConfigDocument, prober: Arc<dyn Prober>) -> Vec<HostView> {
    let mut statuses = vec![Reachability::Indeterminate; doc.hosts.len()];

    let mut join_set = JoinSet::new();
    for (idx, host) in doc.hosts.iter().enumerate() {
        let prober = prober.clone();
        let ip = host.ip_address.clone();
        join_set.spawn(async move { (idx, prober.probe(&ip).await) });
    }

    while let Some(joined) = join_set.join_next().await {
        match joined {
            Ok((idx, status)) => statuses[idx] = status,
            Err(e) => warn!(error = %e, "probe task failed"),
        }
    }

    let checked_at = OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default();
    let views: Vec<HostView> = doc
        .hosts
        .into_iter()
        .zip(statuses)
        .map(|(host, status)| HostView {
            host,
            status,
            checked_at: checked_at.clone(),
        })
        .collect();

    debug!(hosts = views.len(), "ping sweep done");
    views
}
