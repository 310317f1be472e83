use serde::{Deserialize, Serialize};

/// Document racine persisté : `{ "hosts": [...] }`
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq, Default)]
pub struct ConfigDocument {
    pub hosts: Vec<Host>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Host {
    pub name: String,
    pub ssh_username: String,
    pub ip_address: String,  // IPv4 attendue, non validée
    pub mac_address: String, // ex: AA:BB:CC:DD:EE:FF, non validée
    #[serde(default)]
    pub clients: Vec<Client>,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Client {
    pub name: String,
    pub resolution: Option<String>, // sérialisé `null` si absent
    pub ssh_command: String,
}

impl Host {
    pub fn new(name: &str, ssh_username: &str, ip_address: &str, mac_address: &str) -> Self {
        Self {
            name: name.to_string(),
            ssh_username: ssh_username.to_string(),
            ip_address: ip_address.to_string(),
            mac_address: mac_address.to_string(),
            clients: Vec::new(),
        }
    }

    pub fn client(&self, name: &str) -> Option<&Client> {
        self.clients.iter().find(|c| c.name == name)
    }
}

impl ConfigDocument {
    pub fn host(&self, name: &str) -> Option<&Host> {
        self.hosts.iter().find(|h| h.name == name)
    }

    pub fn host_names(&self) -> Vec<String> {
        self.hosts.iter().map(|h| h.name.clone()).collect()
    }
}

/// Résultat d'une sonde ICMP, uniquement pour l'affichage
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Reachability {
    Reachable,
    Unreachable,
    /// Sonde impossible (ex: pas de droits pour ouvrir un socket ICMP)
    Indeterminate,
}

impl Reachability {
    pub fn as_str(&self) -> &'static str {
        match self {
            Reachability::Reachable => "reachable",
            Reachability::Unreachable => "unreachable",
            Reachability::Indeterminate => "indeterminate",
        }
    }
}

/// Host enrichi pour le dashboard (jamais persisté)
#[derive(Debug, Serialize, Clone)]
pub struct HostView {
    pub host: Host,
    pub status: Reachability,
    pub checked_at: String, // RFC3339
}
