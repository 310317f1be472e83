/**
 * DISPATCH - Actions sur un host existant
 *
 * - wake : magic packet vers la MAC du host
 * - run_command : commande SSH préconfigurée d'un client du host
 *
 * Les deux résolvent les labels contre la configuration relue du disque et
 * rendent uniquement des notices : aucune erreur ne remonte au serveur.
 */

use tracing::{error, info, warn};

use crate::models::ConfigDocument;
use crate::notices::Notice;
use crate::ssh::RemoteShell;
use crate::store::ConfigStore;
use crate::wol::{parse_mac, PacketSender, WolError};

const MISSING_HOST_LABEL: &str = "Expected a host label but did not receive any";
const MISSING_CLIENT_LABEL: &str = "Expected a client label but did not receive any";
const UNKNOWN_HOST: &str = "This host doesn't exist!";
const UNKNOWN_CLIENT: &str = "This client doesn't exist!";

// label comparé tel quel ; seuls les espaces comptent comme absents
fn non_empty(label: Option<&str>) -> Option<&str> {
    label.filter(|l| !l.trim().is_empty())
}

fn load_or_notice(store: &ConfigStore) -> Result<ConfigDocument, Notice> {
    store.load().map_err(|e| {
        error!(error = %e, "cannot load configuration");
        Notice::danger(format!("Could not read configuration: {e}"))
    })
}

/// Envoie un magic packet au host `host_label`.
pub fn wake(store: &ConfigStore, sender: &dyn PacketSender, host_label: Option<&str>) -> Vec<Notice> {
    let Some(label) = non_empty(host_label) else {
        return vec![Notice::danger(MISSING_HOST_LABEL)];
    };
    let doc = match load_or_notice(store) {
        Ok(doc) => doc,
        Err(n) => return vec![n],
    };
    let Some(host) = doc.host(label) else {
        warn!(host = %label, "wake requested for unknown host");
        return vec![Notice::danger(UNKNOWN_HOST)];
    };

    let result = parse_mac(&host.mac_address).and_then(|mac| sender.send_magic_packet(mac));
    match result {
        Ok(()) => {
            info!(host = %host.name, mac = %host.mac_address, "magic packet sent");
            vec![Notice::success("Sent magic packet!")]
        }
        Err(WolError::InvalidMac(mac)) => {
            warn!(host = %host.name, mac = %mac, "invalid MAC address");
            vec![Notice::danger(
                "Invalid MAC address! Are you sure the host is configured correctly?",
            )]
        }
        Err(e) => {
            error!(host = %host.name, error = %e, "WOL send error");
            vec![Notice::danger(format!("Could not send magic packet: {e}"))]
        }
    }
}

/// Exécute la commande du client `client_label` sur le host `host_label`.
pub async fn run_command(
    store: &ConfigStore,
    shell: &dyn RemoteShell,
    host_label: Option<&str>,
    client_label: Option<&str>,
) -> Vec<Notice> {
    let Some(host_label) = non_empty(host_label) else {
        return vec![Notice::danger(MISSING_HOST_LABEL)];
    };
    let Some(client_label) = non_empty(client_label) else {
        return vec![Notice::danger(MISSING_CLIENT_LABEL)];
    };
    let doc = match load_or_notice(store) {
        Ok(doc) => doc,
        Err(n) => return vec![n],
    };
    let Some(host) = doc.host(host_label) else {
        return vec![Notice::danger(UNKNOWN_HOST)];
    };
    let Some(client) = host.client(client_label) else {
        return vec![Notice::danger(UNKNOWN_CLIENT)];
    };

    match shell.exec(&host.ssh_username, &host.ip_address, &client.ssh_command).await {
        Ok(output) if output.stderr_lines.is_empty() => {
            vec![Notice::success("Command ran successfully")]
        }
        Ok(output) => {
            warn!(
                host = %host.name,
                client = %client.name,
                lines = output.stderr_lines.len(),
                "remote command wrote to stderr"
            );
            let mut notices = vec![
                Notice::danger("Command execution may have failed"),
                Notice::warning(format!("Command sent: {}", client.ssh_command)),
            ];
            notices.extend(output.stderr_lines.into_iter().map(Notice::warning));
            notices
        }
        Err(e) => {
            error!(host = %host.name, error = %e, "ssh failure");
            vec![
                Notice::danger(format!("Error: {e}")),
                Notice::danger("Make sure you've copied over SSH keys."),
            ]
        }
    }
}
