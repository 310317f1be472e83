use std::net::{Ipv4Addr, SocketAddrV4, UdpSocket};
use tracing::debug;

use crate::settings::WolConf;

pub const MAGIC_PACKET_LEN: usize = 102;

#[derive(Debug, thiserror::Error)]
pub enum WolError {
    #[error("invalid MAC address: {0}")]
    InvalidMac(String),
    #[error("socket error: {0}")]
    Socket(#[from] std::io::Error),
}

/// Accepte `AA:BB:CC:DD:EE:FF`, `aa-bb-cc-dd-ee-ff`, `aabb.ccdd.eeff` ou 12 hex bruts.
pub fn parse_mac(mac: &str) -> Result<[u8; 6], WolError> {
    let mut hex = String::with_capacity(12);
    for c in mac.trim().chars() {
        match c {
            c if c.is_ascii_hexdigit() => hex.push(c),
            ':' | '-' | '.' => {}
            _ => return Err(WolError::InvalidMac(mac.to_string())),
        }
    }
    if hex.len() != 12 {
        return Err(WolError::InvalidMac(mac.to_string()));
    }

    let mut out = [0u8; 6];
    for (i, byte) in out.iter_mut().enumerate() {
        *byte = u8::from_str_radix(&hex[i * 2..i * 2 + 2], 16)
            .map_err(|_| WolError::InvalidMac(mac.to_string()))?;
    }
    Ok(out)
}

pub fn magic_packet(mac: [u8; 6]) -> [u8; MAGIC_PACKET_LEN] {
    let mut pkt = [0u8; MAGIC_PACKET_LEN];
    // 6 x 0xFF
    pkt[..6].fill(0xFF);
    // 16 fois l'adresse MAC
    for chunk in pkt[6..].chunks_exact_mut(6) {
        chunk.copy_from_slice(&mac);
    }
    pkt
}

/// Envoi d'un magic packet pour une MAC déjà parsée
pub trait PacketSender: Send + Sync {
    fn send_magic_packet(&self, mac: [u8; 6]) -> Result<(), WolError>;
}

/// Envoie le magic packet en UDP broadcast
pub struct UdpWol {
    target: SocketAddrV4,
}

impl UdpWol {
    pub fn new(broadcast: Ipv4Addr, port: u16) -> Self {
        Self { target: SocketAddrV4::new(broadcast, port) }
    }

    pub fn from_conf(conf: &WolConf) -> Self {
        Self::new(conf.broadcast, conf.port)
    }
}

impl PacketSender for UdpWol {
    fn send_magic_packet(&self, mac: [u8; 6]) -> Result<(), WolError> {
        let pkt = magic_packet(mac);
        let sock = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0))?;
        sock.set_broadcast(true)?;
        sock.send_to(&pkt, self.target)?;
        debug!(target_addr = %self.target, "magic packet sent");
        Ok(())
    }
}
