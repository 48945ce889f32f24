//! BSSID blocklist.

use stumbler_types::Bssid;

use crate::config::BlocklistConfig;

/// Rejects access points whose hardware address should not be collected.
///
/// Blocked are the all-zero and broadcast addresses, addresses whose hex form
/// starts with a configured OUI prefix, and optionally locally administered
/// addresses.
#[derive(Debug, Clone, Default)]
pub struct BssidBlocklist {
    prefixes: Vec<String>,
    block_locally_administered: bool,
}

impl BssidBlocklist {
    /// Create a blocklist from lower- or upper-case hex prefixes.
    pub fn new<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            prefixes: prefixes
                .into_iter()
                .map(|p| p.as_ref().to_ascii_lowercase())
                .collect(),
            block_locally_administered: false,
        }
    }

    /// Build the blocklist from configuration.
    pub fn from_config(config: &BlocklistConfig) -> Self {
        Self::new(&config.bssid_oui_prefixes)
            .block_locally_administered(config.block_locally_administered)
    }

    /// Also block locally administered addresses.
    #[must_use]
    pub fn block_locally_administered(mut self, enable: bool) -> Self {
        self.block_locally_administered = enable;
        self
    }

    /// Whether the address is blocked.
    pub fn contains(&self, bssid: &Bssid) -> bool {
        if *bssid == Bssid::ZERO || *bssid == Bssid::BROADCAST {
            return true;
        }
        if self.block_locally_administered && bssid.is_locally_administered() {
            return true;
        }

        let hex = bssid.to_hex();
        self.prefixes.iter().any(|prefix| hex.starts_with(prefix))
    }
}
