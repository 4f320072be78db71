// Monotonic sets of previously observed identities (process names, remote hosts)

use std::collections::HashSet;
use std::net::IpAddr;

#[derive(Debug, Clone, Default)]
pub struct IdentitySet {
    members: HashSet<String>,
}

impl IdentitySet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `value`. Returns true only when it is a first occurrence outside warm-up,
    /// i.e. when the caller should alert.
    pub fn observe(&mut self, value: &str, warm_up: bool) -> bool {
        if self.members.contains(value) {
            return false;
        }
        self.members.insert(value.to_owned());
        !warm_up
    }

    pub fn contains(&self, value: &str) -> bool {
        self.members.contains(value)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

/// True for loopback addresses of either family, or when `addr` starts with any of `prefixes`
/// (loopback and private IPv4 ranges by default).
pub fn is_excluded_host(addr: &str, prefixes: &[String]) -> bool {
    addr.parse::<IpAddr>().is_ok_and(|ip| ip.is_loopback())
        || prefixes.iter().any(|p| addr.starts_with(p.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn warm_up_records_silently() {
        let mut set = IdentitySet::new();
        assert!(!set.observe("chrome", true));
        assert!(set.contains("chrome"));
        assert!(!set.observe("chrome", false));
    }

    #[test]
    fn first_occurrence_after_warm_up_fires_once() {
        let mut set = IdentitySet::new();
        assert!(set.observe("curl", false));
        assert!(!set.observe("curl", false));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn default_prefixes_exclude_loopback_and_private() {
        let prefixes: Vec<String> = vec!["127.".into(), "10.".into(), "192.168.".into()];
        assert!(is_excluded_host("127.0.0.1", &prefixes));
        assert!(is_excluded_host("10.1.2.3", &prefixes));
        assert!(is_excluded_host("192.168.1.50", &prefixes));
        assert!(!is_excluded_host("93.184.216.34", &prefixes));
        assert!(!is_excluded_host("172.16.0.1", &prefixes));
    }

    #[test]
    fn loopback_is_excluded_without_a_matching_prefix() {
        assert!(is_excluded_host("::1", &[]));
        assert!(is_excluded_host("127.0.0.53", &[]));
        assert!(!is_excluded_host("2606:2800:220:1::1", &[]));
        assert!(!is_excluded_host("not-an-address", &[]));
    }
}
