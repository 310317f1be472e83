/**
 * PROBE ICMP - Sonde de joignabilité des hosts
 *
 * RÔLE : un echo ICMP par host, borné par un timeout, uniquement pour
 * l'affichage (dashboard + retour après ajout d'un host).
 *
 * FONCTIONNEMENT :
 * - socket ICMP "datagram" (ping non privilégié Linux) sinon socket RAW
 * - aucun socket possible (droits) → Indeterminate
 * - réponse echo reçue avant le timeout → Reachable, sinon Unreachable
 */

use async_trait::async_trait;
use socket2::{Domain, Protocol, Socket, Type};
use std::io::{self, ErrorKind};
use std::net::{IpAddr, Ipv4Addr, SocketAddr, SocketAddrV4};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;
use tokio::net::UdpSocket;
use tracing::debug;

use crate::models::Reachability;

const ICMP_ECHO_REQUEST: u8 = 8;
const ICMP_ECHO_REPLY: u8 = 0;
const ICMP_HEADER_LEN: usize = 8;
const PAYLOAD: &[u8; 32] = b"wakedeck-reachability-probe-0001";

#[async_trait]
pub trait Prober: Send + Sync {
    async fn probe(&self, ip_address: &str) -> Reachability;
}

pub struct IcmpProber {
    timeout: Duration,
    ident: u16,
    seq: AtomicU16,
}

impl IcmpProber {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ident: (std::process::id() & 0xFFFF) as u16,
            seq: AtomicU16::new(1),
        }
    }

    async fn echo(&self, addr: Ipv4Addr) -> Reachability {
        let (socket, raw) = match open_icmp_socket() {
            Ok(s) => s,
            Err(e) => {
                debug!(ip = %addr, error = %e, "cannot open ICMP socket");
                return Reachability::Indeterminate;
            }
        };

        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let request = echo_request(self.ident, seq);
        let target = SocketAddr::V4(SocketAddrV4::new(addr, 0));

        if let Err(e) = socket.send_to(&request, target).await {
            debug!(ip = %addr, error = %e, "ICMP send failed");
            return if e.kind() == ErrorKind::PermissionDenied {
                Reachability::Indeterminate
            } else {
                Reachability::Unreachable
            };
        }

        let wait_reply = async {
            let mut buf = [0u8; 1500];
            loop {
                let (len, from) = socket.recv_from(&mut buf).await?;
                if from.ip() != IpAddr::V4(addr) {
                    continue;
                }
                let icmp = if raw { strip_ipv4_header(&buf[..len]) } else { Some(&buf[..len]) };
                // socket datagram : le noyau réécrit l'identifiant
                let ident = if raw { Some(self.ident) } else { None };
                if icmp.is_some_and(|p| is_echo_reply(p, ident, seq)) {
                    return Ok::<_, io::Error>(());
                }
            }
        };

        match tokio::time::timeout(self.timeout, wait_reply).await {
            Ok(Ok(())) => Reachability::Reachable,
            Ok(Err(e)) => {
                debug!(ip = %addr, error = %e, "ICMP receive failed");
                Reachability::Unreachable
            }
            Err(_) => Reachability::Unreachable,
        }
    }
}

#[async_trait]
impl Prober for IcmpProber {
    async fn probe(&self, ip_address: &str) -> Reachability {
        let resolved = tokio::time::timeout(self.timeout, resolve_v4(ip_address)).await;
        let Ok(Some(addr)) = resolved else {
            debug!(ip = %ip_address, "address does not resolve to IPv4");
            return Reachability::Unreachable;
        };
        self.echo(addr).await
    }
}

async fn resolve_v4(host: &str) -> Option<Ipv4Addr> {
    let host = host.trim();
    if let Ok(ip) = host.parse::<Ipv4Addr>() {
        return Some(ip);
    }
    tokio::net::lookup_host((host, 0))
        .await
        .ok()?
        .find_map(|a| match a.ip() {
            IpAddr::V4(v4) => Some(v4),
            IpAddr::V6(_) => None,
        })
}

/// Socket ICMP non bloquant : `(socket, raw)`
fn open_icmp_socket() -> io::Result<(UdpSocket, bool)> {
    let (socket, raw) = match Socket::new(Domain::IPV4, Type::DGRAM, Some(Protocol::ICMPV4)) {
        Ok(s) => (s, false),
        Err(_) => (Socket::new(Domain::IPV4, Type::RAW, Some(Protocol::ICMPV4))?, true),
    };
    socket.set_nonblocking(true)?;
    let socket = UdpSocket::from_std(socket.into())?;
    Ok((socket, raw))
}

fn checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = 0;
    for chunk in data.chunks(2) {
        let word = match chunk {
            [hi, lo] => u16::from_be_bytes([*hi, *lo]),
            [hi] => u16::from_be_bytes([*hi, 0]),
            _ => 0,
        };
        sum += u32::from(word);
    }
    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}

fn echo_request(ident: u16, seq: u16) -> Vec<u8> {
    let mut pkt = Vec::with_capacity(ICMP_HEADER_LEN + PAYLOAD.len());
    pkt.extend_from_slice(&[ICMP_ECHO_REQUEST, 0, 0, 0]);
    pkt.extend_from_slice(&ident.to_be_bytes());
    pkt.extend_from_slice(&seq.to_be_bytes());
    pkt.extend_from_slice(PAYLOAD);
    let sum = checksum(&pkt);
    pkt[2..4].copy_from_slice(&sum.to_be_bytes());
    pkt
}

fn strip_ipv4_header(packet: &[u8]) -> Option<&[u8]> {
    let ihl = usize::from(*packet.first()? & 0x0F) * 4;
    packet.get(ihl..)
}

fn is_echo_reply(icmp: &[u8], ident: Option<u16>, seq: u16) -> bool {
    if icmp.len() < ICMP_HEADER_LEN || icmp[0] != ICMP_ECHO_REPLY {
        return false;
    }
    let reply_ident = u16::from_be_bytes([icmp[4], icmp[5]]);
    let reply_seq = u16::from_be_bytes([icmp[6], icmp[7]]);
    reply_seq == seq && ident.map_or(true, |id| id == reply_ident)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_echo_request_checksum_verifies() {
        let pkt = echo_request(0x1234, 7);
        assert_eq!(pkt.len(), 40);
        assert_eq!(pkt[0], ICMP_ECHO_REQUEST);
        assert_eq!(&pkt[4..8], &[0x12, 0x34, 0x00, 0x07]);
        // un paquet correct se re-somme à zéro
        assert_eq!(checksum(&pkt), 0);
    }

    #[test]
    fn test_checksum_odd_length() {
        assert_eq!(checksum(&[0xFF]), 0x00FF);
        assert_eq!(checksum(&[]), 0xFFFF);
    }

    #[test]
    fn test_is_echo_reply_matching() {
        let mut reply = echo_request(0x1234, 7);
        reply[0] = ICMP_ECHO_REPLY;

        assert!(is_echo_reply(&reply, Some(0x1234), 7));
        assert!(is_echo_reply(&reply, None, 7));
        assert!(!is_echo_reply(&reply, Some(0x4321), 7));
        assert!(!is_echo_reply(&reply, None, 8));
        assert!(!is_echo_reply(&echo_request(0x1234, 7), None, 7));
        assert!(!is_echo_reply(&reply[..4], None, 7));
    }

    #[test]
    fn test_strip_ipv4_header() {
        let mut packet = vec![0x45u8];
        packet.extend_from_slice(&[0u8; 19]);
        packet.extend_from_slice(&[ICMP_ECHO_REPLY, 0, 0, 0]);
        assert_eq!(strip_ipv4_header(&packet), Some(&[ICMP_ECHO_REPLY, 0, 0, 0][..]));
        assert_eq!(strip_ipv4_header(&[]), None);
        assert_eq!(strip_ipv4_header(&[0x4F, 0, 0]), None);
    }

    #[tokio::test]
    async fn test_unresolvable_address_is_unreachable() {
        let prober = IcmpProber::new(Duration::from_millis(200));
        assert_eq!(prober.probe("").await, Reachability::Unreachable);
        assert_eq!(prober.probe("not an ip !").await, Reachability::Unreachable);
    }
}
