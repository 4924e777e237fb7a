//! Feedgraph
//!
//! A multi-tenant activity-feed engine:
//! - Entities publish timestamped activities into per-entity stream chains
//! - Users follow entities; each user's feed chain stays sorted by the
//!   followed entities' most recent activity
//! - Feed reads lazily merge the chains — no global re-sort, no
//!   materialized feed
//!
//! The engine is written against the [`store::GraphStore`] trait; the
//! bundled [`store::InMemoryGraphStore`] keeps nodes and edges in an arena
//! keyed by stable identifiers. HTTP routing, tenant administration, and
//! process bootstrap live in the consuming façade, not here.

pub mod error;
pub mod events;
pub mod feed;
pub mod store;

use anyhow::Result;
use serde::Deserialize;
use std::path::Path;
use std::sync::Arc;

// ============================================================================
// YAML config structs (deserialization targets)
// ============================================================================

/// Top-level YAML configuration file structure
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct YamlConfig {
    pub server: ServerYamlConfig,
    pub events: EventsYamlConfig,
}

/// Server configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerYamlConfig {
    pub default_page_size: usize,
    pub max_page_size: usize,
}

impl Default for ServerYamlConfig {
    fn default() -> Self {
        Self {
            default_page_size: 25,
            max_page_size: 500,
        }
    }
}

/// Events configuration section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EventsYamlConfig {
    pub channel_capacity: usize,
}

impl Default for EventsYamlConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 1024,
        }
    }
}

// ============================================================================
// Runtime config (what the engine actually uses)
// ============================================================================

/// Engine configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Page size a consuming façade should substitute when a caller omits
    /// one. The engine itself only enforces `max_page_size`; a literal
    /// `count == 0` reads as an empty page.
    pub default_page_size: usize,
    pub max_page_size: usize,
    pub event_channel_capacity: usize,
}

impl Config {
    /// Load configuration from environment variables only.
    /// Equivalent to `from_yaml_and_env(None)`.
    pub fn from_env() -> Result<Self> {
        Self::from_yaml_and_env(None)
    }

    /// Load configuration from an optional YAML file, then override with
    /// env vars.
    ///
    /// Priority: env var > YAML > default
    ///
    /// If `yaml_path` is None, tries "config.yaml" in CWD. A missing file
    /// falls back to pure env vars / defaults.
    pub fn from_yaml_and_env(yaml_path: Option<&Path>) -> Result<Self> {
        dotenvy::dotenv().ok();
        let yaml = Self::load_yaml(yaml_path);

        let env_usize = |key: &str| {
            std::env::var(key)
                .ok()
                .and_then(|s| s.parse::<usize>().ok())
        };
        Ok(Self {
            default_page_size: env_usize("FEEDGRAPH_DEFAULT_PAGE_SIZE")
                .unwrap_or(yaml.server.default_page_size),
            max_page_size: env_usize("FEEDGRAPH_MAX_PAGE_SIZE").unwrap_or(yaml.server.max_page_size),
            event_channel_capacity: env_usize("FEEDGRAPH_EVENT_CHANNEL_CAPACITY")
                .unwrap_or(yaml.events.channel_capacity),
        })
    }

    /// Try to load and parse a YAML config file. Returns defaults on any
    /// failure.
    fn load_yaml(yaml_path: Option<&Path>) -> YamlConfig {
        let default_path = Path::new("config.yaml");
        let path = yaml_path.unwrap_or(default_path);

        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_yaml::from_str(&contents) {
                Ok(config) => {
                    tracing::info!("Loaded config from {}", path.display());
                    config
                }
                Err(e) => {
                    tracing::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                    YamlConfig::default()
                }
            },
            Err(_) => {
                tracing::debug!(
                    "No config file at {}, using env vars / defaults",
                    path.display()
                );
                YamlConfig::default()
            }
        }
    }
}

// ============================================================================
// Shared state
// ============================================================================

/// Shared application state handed to a consuming façade
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<feed::FeedEngine>,
    pub events: Arc<events::EventBus>,
    pub config: Arc<Config>,
}

impl AppState {
    /// Wire the engine over the bundled in-memory store.
    pub fn in_memory(config: Config) -> Self {
        let store: Arc<dyn store::GraphStore> = Arc::new(store::InMemoryGraphStore::new());
        Self::with_store(config, store)
    }

    /// Wire the engine over any store implementation.
    pub fn with_store(config: Config, store: Arc<dyn store::GraphStore>) -> Self {
        let events = Arc::new(events::EventBus::new(config.event_channel_capacity));
        let engine = Arc::new(
            feed::FeedEngine::new(store)
                .with_event_emitter(events.clone())
                .with_limits(feed::PageLimits {
                    max_page_size: config.max_page_size,
                }),
        );
        Self {
            engine,
            events,
            config: Arc::new(config),
        }
    }
}

/// Initialize tracing with an env-filter (`RUST_LOG`) and a fmt layer.
/// Intended for the consuming façade's bootstrap and for tests.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}

// ============================================================================
// Tests
// ============================================================================
