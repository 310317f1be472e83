/**
 * ADMIN - Enregistrement des hosts et des clients
 *
 * RÔLE :
 * Validation des formulaires puis mutation du ConfigStore. Pas d'édition ni
 * de suppression : un nom déjà pris est refusé.
 *
 * RETOUR :
 * `AdminOutcome` = notices à afficher + page vers laquelle rediriger.
 */

use serde::Deserialize;
use tracing::{error, info, warn};

use crate::models::Reachability;
use crate::notices::Notice;
use crate::probe::Prober;
use crate::store::{ConfigStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Dashboard,
    HostForm,
    ClientForm,
}

#[derive(Debug)]
pub struct AdminOutcome {
    pub notices: Vec<Notice>,
    pub next: Next,
}

impl AdminOutcome {
    fn new(next: Next, notices: Vec<Notice>) -> Self {
        Self { notices, next }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct HostForm {
    pub host_name: Option<String>,
    pub ssh_username: Option<String>,
    pub ip_address: Option<String>,
    pub mac_address: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ClientForm {
    pub host_name: Option<String>,
    pub client_name: Option<String>,
    pub resolution: Option<String>,
    pub ssh_command: Option<String>,
}

/// Valeur telle que saisie, `None` si absente ou faite d'espaces
fn field(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.trim().is_empty())
}

fn storage_failure(e: &StoreError) -> Notice {
    error!(error = %e, "configuration write failed");
    Notice::danger(format!("Could not save configuration: {e}"))
}

pub async fn register_host(store: &ConfigStore, prober: &dyn Prober, form: &HostForm) -> AdminOutcome {
    let (Some(name), Some(user), Some(ip), Some(mac)) = (
        field(&form.host_name),
        field(&form.ssh_username),
        field(&form.ip_address),
        field(&form.mac_address),
    ) else {
        return AdminOutcome::new(Next::HostForm, vec![Notice::danger("Must fill all fields")]);
    };

    match store.register_host(name, user, ip, mac) {
        Ok(()) => {}
        Err(e) if e.is_conflict() => {
            // pas encore d'édition : retour au dashboard
            warn!(host = %name, "host already registered");
            return AdminOutcome::new(
                Next::Dashboard,
                vec![Notice::danger("A host with this name already exists, consider editing it instead")],
            );
        }
        Err(e) => return AdminOutcome::new(Next::Dashboard, vec![storage_failure(&e)]),
    }

    let mut notices = vec![Notice::success("Host added successfully!")];

    // retour utilisateur uniquement, indépendant de la persistance
    let feedback = match prober.probe(ip).await {
        Reachability::Reachable => Notice::success("Host is reachable by the server"),
        Reachability::Unreachable => Notice::warning("Could not reach entered IP, may be incorrect"),
        Reachability::Indeterminate => Notice::warning(
            "The server can't ping the host, run with elevated privileges for more functionality",
        ),
    };
    notices.push(feedback);

    info!(host = %name, ip = %ip, "host registered from form");
    AdminOutcome::new(Next::Dashboard, notices)
}

pub fn register_client(store: &ConfigStore, form: &ClientForm) -> AdminOutcome {
    let (Some(host), Some(name), Some(command)) = (
        field(&form.host_name),
        field(&form.client_name),
        field(&form.ssh_command),
    ) else {
        return AdminOutcome::new(
            Next::ClientForm,
            vec![Notice::danger("All required fields must be filled")],
        );
    };
    let resolution = field(&form.resolution);

    match store.add_client(host, name, resolution, command) {
        Ok(()) => AdminOutcome::new(Next::Dashboard, vec![Notice::success("Client added successfully")]),
        Err(StoreError::UnknownHost(h)) => AdminOutcome::new(
            Next::Dashboard,
            vec![Notice::danger(format!("Invalid client entered! Host '{h}' doesn't exist."))],
        ),
        Err(StoreError::ClientExists { .. }) => AdminOutcome::new(
            Next::Dashboard,
            vec![Notice::danger(
                "Invalid client entered! Make sure you're not trying to add a client that already exists.",
            )],
        ),
        Err(e) => AdminOutcome::new(Next::Dashboard, vec![storage_failure(&e)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notices::Level;
    use async_trait::async_trait;
    use tempfile::TempDir;

    struct FixedProber(Reachability);

    #[async_trait]
    impl Prober for FixedProber {
        async fn probe(&self, _ip_address: &str) -> Reachability {
            self.0
        }
    }

    fn temp_store() -> (TempDir, ConfigStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = ConfigStore::new(dir.path().join("config.json"));
        (dir, store)
    }

    fn host_form(name: &str) -> HostForm {
        HostForm {
            host_name: Some(name.into()),
            ssh_username: Some("mark".into()),
            ip_address: Some("192.168.1.20".into()),
            mac_address: Some("AA:BB:CC:DD:EE:FF".into()),
        }
    }

    fn client_form(host: &str, name: &str, resolution: &str) -> ClientForm {
        ClientForm {
            host_name: Some(host.into()),
            client_name: Some(name.into()),
            resolution: Some(resolution.into()),
            ssh_command: Some("start steam".into()),
        }
    }

    #[tokio::test]
    async fn test_first_host_creates_config() {
        let (_dir, store) = temp_store();
        let out = register_host(&store, &FixedProber(Reachability::Reachable), &host_form("office-pc")).await;

        assert_eq!(out.next, Next::Dashboard);
        assert_eq!(
            out.notices,
            vec![
                Notice::success("Host added successfully!"),
                Notice::success("Host is reachable by the server"),
            ]
        );
        let doc = store.load().unwrap();
        assert_eq!(doc.host_names(), vec!["office-pc".to_string()]);
    }

    #[tokio::test]
    async fn test_probe_feedback_variants() {
        let (_dir, store) = temp_store();

        let out = register_host(&store, &FixedProber(Reachability::Unreachable), &host_form("a")).await;
        assert_eq!(out.notices[1], Notice::warning("Could not reach entered IP, may be incorrect"));

        let out = register_host(&store, &FixedProber(Reachability::Indeterminate), &host_form("b")).await;
        assert_eq!(out.notices[1].level, Level::Warning);
        assert!(out.notices[1].text.contains("elevated privileges"));
    }

    #[tokio::test]
    async fn test_missing_field_no_mutation() {
        let (_dir, store) = temp_store();
        let mut form = host_form("office-pc");
        form.mac_address = Some("   ".into());

        let out = register_host(&store, &FixedProber(Reachability::Reachable), &form).await;
        assert_eq!(out.next, Next::HostForm);
        assert_eq!(out.notices, vec![Notice::danger("Must fill all fields")]);
        assert!(!store.exists());
    }

    #[tokio::test]
    async fn test_duplicate_host_reports_conflict() {
        let (_dir, store) = temp_store();
        let prober = FixedProber(Reachability::Reachable);
        register_host(&store, &prober, &host_form("office-pc")).await;

        let out = register_host(&store, &prober, &host_form("office-pc")).await;
        assert_eq!(out.next, Next::Dashboard);
        assert_eq!(out.notices.len(), 1);
        assert!(out.notices[0].text.starts_with("A host with this name already exists"));
        assert_eq!(store.load().unwrap().hosts.len(), 1);
    }

    #[tokio::test]
    async fn test_client_add_then_duplicate() {
        let (_dir, store) = temp_store();
        register_host(&store, &FixedProber(Reachability::Reachable), &host_form("office-pc")).await;

        let out = register_client(&store, &client_form("office-pc", "games", ""));
        assert_eq!(out.notices, vec![Notice::success("Client added successfully")]);

        let out = register_client(&store, &client_form("office-pc", "games", "1920x1080"));
        assert_eq!(out.next, Next::Dashboard);
        assert!(out.notices[0].text.contains("already exists"));

        let doc = store.load().unwrap();
        let clients = &doc.host("office-pc").unwrap().clients;
        assert_eq!(clients.len(), 1);
        // résolution vide normalisée en absente
        assert_eq!(clients[0].resolution, None);
    }

    #[tokio::test]
    async fn test_client_unknown_host_distinct_message() {
        let (_dir, store) = temp_store();
        register_host(&store, &FixedProber(Reachability::Reachable), &host_form("office-pc")).await;

        let out = register_client(&store, &client_form("printer", "queue", "1024x768"));
        assert_eq!(
            out.notices,
            vec![Notice::danger("Invalid client entered! Host 'printer' doesn't exist.")]
        );
    }

    #[test]
    fn test_client_missing_fields() {
        let (_dir, store) = temp_store();
        let form = ClientForm {
            host_name: Some("office-pc".into()),
            client_name: None,
            resolution: None,
            ssh_command: Some("start steam".into()),
        };
        let out = register_client(&store, &form);
        assert_eq!(out.next, Next::ClientForm);
        assert_eq!(out.notices, vec![Notice::danger("All required fields must be filled")]);
    }

    #[tokio::test]
    async fn test_client_command_stored_verbatim() {
        let (_dir, store) = temp_store();
        register_host(&store, &FixedProber(Reachability::Reachable), &host_form("office-pc")).await;

        let mut form = client_form("office-pc", "games", "");
        form.ssh_command = Some("  echo 'a  b' ".into());
        let out = register_client(&store, &form);
        assert_eq!(out.notices, vec![Notice::success("Client added successfully")]);

        let doc = store.load().unwrap();
        assert_eq!(doc.host("office-pc").unwrap().clients[0].ssh_command, "  echo 'a  b' ");
    }
}
