/**
 * CONFIG STORE - Persistance du registre hosts/clients
 *
 * RÔLE :
 * Un seul fichier JSON `{ "hosts": [...] }` contient toute la configuration.
 * Chaque lecture recharge le fichier, chaque écriture le remplace entièrement.
 *
 * FONCTIONNEMENT :
 * - load → mutation en mémoire → save (fichier complet)
 * - save écrit dans `<fichier>.tmp` puis rename : jamais de fichier à moitié écrit
 * - un verrou réentrant sérialise les cycles load/save du process : plus de mise
 *   à jour perdue entre deux requêtes concurrentes ; les opérations composées
 *   (register_host → create/add_host → load/save) le reprennent sans blocage
 * - unicité par scan linéaire : nom de host global, nom de client par host
 */

use parking_lot::ReentrantMutex;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::models::{Client, ConfigDocument, Host};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("configuration file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("invalid configuration file: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("host '{0}' already exists")]
    HostExists(String),
    #[error("host '{0}' does not exist")]
    UnknownHost(String),
    #[error("client '{client}' already exists on host '{host}'")]
    ClientExists { host: String, client: String },
}

impl StoreError {
    /// Conflit de nom (host ou client déjà présent)
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::HostExists(_) | StoreError::ClientExists { .. })
    }
}

pub struct ConfigStore {
    path: PathBuf,
    lock: ReentrantMutex<()>,
}

impl ConfigStore {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: path.into(),
            lock: ReentrantMutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Écrit un document neuf avec un seul host, sans client.
    /// Écrase sans condition : l'appelant vérifie `exists()` avant.
    pub fn create(
        &self,
        host_name: &str,
        ssh_username: &str,
        ip_address: &str,
        mac_address: &str,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let doc = ConfigDocument {
            hosts: vec![Host::new(host_name, ssh_username, ip_address, mac_address)],
        };
        self.save(&doc)?;
        info!(host = %host_name, path = %self.path.display(), "configuration created");
        Ok(())
    }

    pub fn load(&self) -> Result<ConfigDocument, StoreError> {
        let _guard = self.lock.lock();
        let content = match fs::read_to_string(&self.path) {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StoreError::NotFound(self.path.clone()))
            }
            Err(e) => return Err(e.into()),
        };
        let doc: ConfigDocument = serde_json::from_str(&content)?;
        debug!(hosts = doc.hosts.len(), "configuration loaded");
        Ok(doc)
    }

    /// Remplace le fichier complet (`<fichier>.tmp` puis rename).
    pub fn save(&self, doc: &ConfigDocument) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let json = serde_json::to_string_pretty(doc)?;
        let mut tmp = self.path.clone().into_os_string();
        tmp.push(".tmp");
        let tmp = PathBuf::from(tmp);

        fs::write(&tmp, json)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    /// Ajoute un host. `HostExists` (sans écriture) si le nom est déjà pris.
    pub fn add_host(
        &self,
        name: &str,
        ssh_username: &str,
        ip_address: &str,
        mac_address: &str,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut doc = self.load()?;

        if doc.host(name).is_some() {
            return Err(StoreError::HostExists(name.to_string()));
        }

        doc.hosts.push(Host::new(name, ssh_username, ip_address, mac_address));
        self.save(&doc)?;
        info!(host = %name, hosts = doc.hosts.len(), "host added");
        Ok(())
    }

    /// Premier host : `create` si le fichier n'existe pas, sinon `add_host`.
    /// Test d'existence et écriture sous le même verrou.
    pub fn register_host(
        &self,
        name: &str,
        ssh_username: &str,
        ip_address: &str,
        mac_address: &str,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        if self.exists() {
            self.add_host(name, ssh_username, ip_address, mac_address)
        } else {
            self.create(name, ssh_username, ip_address, mac_address)
        }
    }

    /// Ajoute un client à un host existant.
    /// `UnknownHost` ou `ClientExists` : rien n'est écrit.
    pub fn add_client(
        &self,
        host_name: &str,
        client_name: &str,
        resolution: Option<&str>,
        ssh_command: &str,
    ) -> Result<(), StoreError> {
        let _guard = self.lock.lock();
        let mut doc = self.load()?;

        let host = doc
            .hosts
            .iter_mut()
            .find(|h| h.name == host_name)
            .ok_or_else(|| StoreError::UnknownHost(host_name.to_string()))?;

        if host.clients.iter().any(|c| c.name == client_name) {
            return Err(StoreError::ClientExists {
                host: host_name.to_string(),
                client: client_name.to_string(),
            });
        }

        host.clients.push(Client {
            name: client_name.to_string(),
            resolution: resolution.map(str::to_string),
            ssh_command: ssh_command.to_string(),
        });
        self.save(&doc)?;
        info!(host = %host_name, client = %client_name, "client added");
        Ok(())
    }
}
