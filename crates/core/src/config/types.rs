use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub mediathek: MediathekConfig,
    #[serde(default)]
    pub rulesets: RulesetConfig,
    #[serde(default)]
    pub episodes: EpisodeLookupConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
    /// Externally reachable base URL, used to build download links.
    #[serde(default = "default_public_url")]
    pub public_url: String,
    /// Newznab API key. When unset, any `apikey` is accepted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: default_public_url(),
            api_key: None,
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::from([0, 0, 0, 0])
}

fn default_port() -> u16 {
    5007
}

fn default_public_url() -> String {
    "http://localhost:5007".to_string()
}

/// Content search API (MediathekViewWeb) configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MediathekConfig {
    /// Base URL (e.g., "https://mediathekviewweb.de")
    #[serde(default = "default_mediathek_url")]
    pub url: String,
    /// Number of results requested per query.
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for MediathekConfig {
    fn default() -> Self {
        Self {
            url: default_mediathek_url(),
            page_size: default_page_size(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_mediathek_url() -> String {
    "https://mediathekviewweb.de".to_string()
}

fn default_page_size() -> u32 {
    1000
}

/// Ruleset metadata service configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RulesetConfig {
    /// Base URL of the metadata API (serves `rulesets.php`).
    #[serde(default = "default_ruleset_url")]
    pub url: String,
    /// Hard cap on pages fetched per refresh.
    #[serde(default = "default_max_pages")]
    pub max_pages: u32,
    /// Background refresh interval in seconds.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval_secs: u64,
    /// Refresh the index before every uncached search.
    #[serde(default = "default_true")]
    pub refresh_on_search: bool,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for RulesetConfig {
    fn default() -> Self {
        Self {
            url: default_ruleset_url(),
            max_pages: default_max_pages(),
            refresh_interval_secs: default_refresh_interval(),
            refresh_on_search: true,
            timeout_secs: default_timeout(),
        }
    }
}

fn default_ruleset_url() -> String {
    "https://mediathekarr.pcjones.de/metadata/api".to_string()
}

fn default_max_pages() -> u32 {
    99
}

fn default_refresh_interval() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}

/// Episode database lookup configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EpisodeLookupConfig {
    /// Base URL of the episode lookup service (serves `get_show.php`).
    #[serde(default = "default_episodes_url")]
    pub url: String,
    /// How long resolved shows are kept in memory, in seconds.
    #[serde(default = "default_episode_cache_ttl")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

impl Default for EpisodeLookupConfig {
    fn default() -> Self {
        Self {
            url: default_episodes_url(),
            cache_ttl_secs: default_episode_cache_ttl(),
            timeout_secs: default_timeout(),
        }
    }
}

fn default_episodes_url() -> String {
    "https://mediathekarr.pcjones.de/api/v1".to_string()
}

fn default_episode_cache_ttl() -> u64 {
    12 * 60 * 60
}

/// Search result cache configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_cache_ttl")]
    pub ttl_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_cache_ttl(),
        }
    }
}

fn default_cache_ttl() -> u64 {
    600
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: SanitizedServerConfig,
    pub mediathek: MediathekConfig,
    pub rulesets: RulesetConfig,
    pub episodes: EpisodeLookupConfig,
    pub cache: CacheConfig,
}

/// Sanitized server config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedServerConfig {
    pub host: IpAddr,
    pub port: u16,
    pub public_url: String,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: SanitizedServerConfig {
                host: config.server.host,
                port: config.server.port,
                public_url: config.server.public_url.clone(),
                api_key_configured: config
                    .server
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            mediathek: config.mediathek.clone(),
            rulesets: config.rulesets.clone(),
            episodes: config.episodes.clone(),
            cache: config.cache.clone(),
        }
    }
}
