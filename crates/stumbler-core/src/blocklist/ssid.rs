//! SSID blocklist.

use crate::config::BlocklistConfig;

/// Rejects access points by network name.
///
/// Exact names are compared case-insensitively; prefixes and suffixes are
/// case-sensitive, matching how hotspot firmwares name their networks. The
/// `_nomap` suffix is how owners opt their network out of collection.
#[derive(Debug, Clone, Default)]
pub struct SsidBlocklist {
    exact: Vec<String>,
    prefixes: Vec<String>,
    suffixes: Vec<String>,
}

impl SsidBlocklist {
    /// Build the blocklist from configuration.
    pub fn from_config(config: &BlocklistConfig) -> Self {
        Self {
            exact: config
                .ssid_exact
                .iter()
                .map(|s| s.to_lowercase())
                .collect(),
            prefixes: config.ssid_prefixes.clone(),
            suffixes: config.ssid_suffixes.clone(),
        }
    }

    /// Whether the network name is blocked.
    pub fn contains(&self, ssid: &str) -> bool {
        if !self.exact.is_empty() && self.exact.contains(&ssid.to_lowercase()) {
            return true;
        }
        self.prefixes.iter().any(|p| ssid.starts_with(p.as_str()))
            || self.suffixes.iter().any(|s| ssid.ends_with(s.as_str()))
    }
}
