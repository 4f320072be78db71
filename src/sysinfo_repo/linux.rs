// Linux-specific helpers: /proc socket tables, socket ownership, resolver config.

use crate::models::RawConnection;
use std::path::Path;

/// Host resolver configuration.
pub(super) const RESOLV_CONF: &str = "/etc/resolv.conf";

/// `nameserver` entries from resolv.conf content, in file order.
pub(super) fn parse_nameservers(content: &str) -> Vec<String> {
    let mut servers = Vec::new();
    for line in content.lines() {
        let line = line.trim();
        if line.starts_with('#') || line.starts_with(';') {
            continue;
        }
        let mut parts = line.split_whitespace();
        if parts.next() == Some("nameserver")
            && let Some(addr) = parts.next()
        {
            servers.push(addr.to_string());
        }
    }
    servers
}

/// Reads resolver addresses from `path`. A missing file means no resolvers are configured.
pub(super) fn read_nameservers(path: &Path) -> anyhow::Result<Vec<String>> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(parse_nameservers(&content)),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(anyhow::anyhow!("read {}: {}", path.display(), e)),
    }
}

/// TCP and TCP6 sockets with their owning process, when it can be inspected.
#[cfg(target_os = "linux")]
pub(super) fn list_connections() -> anyhow::Result<Vec<RawConnection>> {
    let owners = socket_owners()?;
    let mut entries = procfs::net::tcp()?;
    match procfs::net::tcp6() {
        Ok(v6) => entries.extend(v6),
        // IPv6 may be disabled; the IPv4 table is still usable.
        Err(e) => tracing::debug!(error = %e, "tcp6 table unavailable"),
    }
    Ok(entries
        .into_iter()
        .map(|entry| {
            let owner = owners.get(&entry.inode);
            let (peer_address, peer_port) = peer_of(entry.remote_address);
            RawConnection {
                state: map_tcp_state(&entry.state),
                process: owner.map(|(_, name)| name.clone()),
                pid: owner.map(|(pid, _)| *pid),
                peer_address,
                peer_port,
            }
        })
        .collect())
}

#[cfg(not(target_os = "linux"))]
pub(super) fn list_connections() -> anyhow::Result<Vec<RawConnection>> {
    anyhow::bail!(
        "connection listing is not supported on {}",
        std::env::consts::OS
    )
}

/// Socket inode -> (pid, comm) for every process whose fd table we may read.
#[cfg(target_os = "linux")]
fn socket_owners() -> anyhow::Result<std::collections::HashMap<u64, (u32, String)>> {
    use procfs::process::{FDTarget, all_processes};

    let mut owners = std::collections::HashMap::new();
    for process in all_processes()?.flatten() {
        // Other users' fd tables are unreadable without privileges; their sockets stay unattributed.
        let Ok(fds) = process.fd() else {
            continue;
        };
        let Ok(stat) = process.stat() else {
            continue;
        };
        let pid = process.pid() as u32;
        for fd in fds.flatten() {
            if let FDTarget::Socket(inode) = fd.target {
                owners.insert(inode, (pid, stat.comm.clone()));
            }
        }
    }
    Ok(owners)
}

/// Peer address and port; unspecified peers are reported as absent, IPv4-mapped IPv6 as IPv4.
#[cfg(target_os = "linux")]
fn peer_of(addr: std::net::SocketAddr) -> (Option<String>, Option<u16>) {
    let ip = addr.ip().to_canonical();
    if ip.is_unspecified() {
        return (None, None);
    }
    (Some(ip.to_string()), Some(addr.port()))
}

#[cfg(target_os = "linux")]
#[allow(unreachable_patterns)]
fn map_tcp_state(state: &procfs::net::TcpState) -> crate::models::ConnectionState {
    use crate::models::ConnectionState;
    use procfs::net::TcpState;

    match state {
        TcpState::Established => ConnectionState::Established,
        TcpState::SynSent => ConnectionState::SynSent,
        TcpState::SynRecv | TcpState::NewSynRecv => ConnectionState::SynRecv,
        TcpState::FinWait1 => ConnectionState::FinWait1,
        TcpState::FinWait2 => ConnectionState::FinWait2,
        TcpState::TimeWait => ConnectionState::TimeWait,
        TcpState::Close => ConnectionState::Close,
        TcpState::CloseWait => ConnectionState::CloseWait,
        TcpState::LastAck => ConnectionState::LastAck,
        TcpState::Listen => ConnectionState::Listen,
        TcpState::Closing => ConnectionState::Closing,
        _ => ConnectionState::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_nameservers_skips_comments_and_other_directives() {
        let content = "\
# Generated by NetworkManager
search lan
nameserver 192.168.1.1
; nameserver 9.9.9.9
nameserver   1.1.1.1
options edns0
nameserver
";
        assert_eq!(parse_nameservers(content), vec!["192.168.1.1", "1.1.1.1"]);
    }

    #[test]
    fn read_nameservers_missing_file_is_empty() {
        let dir = tempfile::TempDir::new().unwrap();
        let servers = read_nameservers(&dir.path().join("resolv.conf")).unwrap();
        assert!(servers.is_empty());
    }

    #[test]
    fn read_nameservers_reads_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("resolv.conf");
        std::fs::write(&path, "nameserver 8.8.8.8\nnameserver 8.8.4.4\n").unwrap();
        assert_eq!(read_nameservers(&path).unwrap(), vec!["8.8.8.8", "8.8.4.4"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn peer_of_normalizes_addresses() {
        let mapped: std::net::SocketAddr = "[::ffff:93.184.216.34]:443".parse().unwrap();
        assert_eq!(
            peer_of(mapped),
            (Some("93.184.216.34".to_string()), Some(443))
        );
        let unspecified: std::net::SocketAddr = "0.0.0.0:0".parse().unwrap();
        assert_eq!(peer_of(unspecified), (None, None));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn map_tcp_state_covers_established_and_listen() {
        use crate::models::ConnectionState;
        use procfs::net::TcpState;
        assert_eq!(
            map_tcp_state(&TcpState::Established),
            ConnectionState::Established
        );
        assert_eq!(map_tcp_state(&TcpState::Listen), ConnectionState::Listen);
        assert_eq!(
            map_tcp_state(&TcpState::NewSynRecv),
            ConnectionState::SynRecv
        );
    }
}
