pub mod cache;
pub mod config;
pub mod episodes;
pub mod matching;
pub mod mediathek;
pub mod metrics;
pub mod release;
pub mod ruleset;
pub mod search;
pub mod testing;

pub use cache::{CacheKey, ResultCache};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use episodes::{CachedEpisodeLookup, EpisodeLookup, EpisodeLookupError, HttpEpisodeLookup};
pub use mediathek::{ItemSource, MediathekClient, MediathekError};
pub use release::{DownloadReference, DownloadReferenceError};
pub use ruleset::{HttpRulesetSource, RefreshTrigger, RulesetSource, RulesetStore};
pub use search::{SearchError, SearchMode, SearchRequest, SearchService};
