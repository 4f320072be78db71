// DNS server baseline and change detection

use std::collections::BTreeSet;

use crate::models::{Alert, InterfaceConfig};

#[derive(Debug, Clone, Default)]
pub struct DnsState {
    servers: BTreeSet<String>,
}

impl DnsState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flattens every interface's resolvers into one order-independent set, dropping blanks.
    pub fn servers_in(interfaces: &[InterfaceConfig]) -> BTreeSet<String> {
        interfaces
            .iter()
            .flat_map(|i| i.dns_servers.iter())
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_owned)
            .collect()
    }

    /// Compares `current` to the baseline. Warm-up seeds the baseline silently; afterwards any
    /// difference replaces it and yields one alert listing the new servers.
    pub fn observe(&mut self, current: BTreeSet<String>, warm_up: bool) -> Option<Alert> {
        if warm_up {
            self.servers = current;
            return None;
        }
        if current == self.servers {
            return None;
        }
        let servers: Vec<&String> = current.iter().collect();
        let alert = Alert::dns_change(&servers);
        self.servers = current;
        Some(alert)
    }

    pub fn servers(&self) -> &BTreeSet<String> {
        &self.servers
    }
}
