//! Application configuration management.

use serde::Deserialize;

use crate::error::AppResult;

/// Application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Workflow behaviour switches.
    #[serde(default)]
    pub workflow: WorkflowConfig,
    /// Record intake numbering.
    #[serde(default)]
    pub intake: IntakeConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// State that losing bids are forced into when another bid wins.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LosingBidState {
    /// Losing bids are marked rejected.
    #[default]
    Rejected,
    /// Losing bids are marked lost.
    Lost,
}

/// Workflow configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowConfig {
    /// Target state for bids that lose to a winning bid.
    #[serde(default)]
    pub losing_bid_state: LosingBidState,
    /// Remove non-primary vendor links when an RFQ is confirmed.
    #[serde(default = "default_prune_unselected_vendors")]
    pub prune_unselected_vendors: bool,
}

fn default_prune_unselected_vendors() -> bool {
    true
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            losing_bid_state: LosingBidState::default(),
            prune_unselected_vendors: default_prune_unselected_vendors(),
        }
    }
}

/// Reference numbering for newly created records.
#[derive(Debug, Clone, Deserialize)]
pub struct IntakeConfig {
    /// Prefix of application tracking numbers.
    #[serde(default = "default_tracking_prefix")]
    pub tracking_prefix: String,
    /// Zero-padded width of the tracking number sequence.
    #[serde(default = "default_tracking_width")]
    pub tracking_width: usize,
    /// Prefix of RFQ references.
    #[serde(default = "default_rfq_prefix")]
    pub rfq_prefix: String,
    /// Zero-padded width of the RFQ reference sequence.
    #[serde(default = "default_rfq_width")]
    pub rfq_width: usize,
}

fn default_tracking_prefix() -> String {
    "NID".to_string()
}

fn default_tracking_width() -> usize {
    5
}

fn default_rfq_prefix() -> String {
    "RFQ".to_string()
}

fn default_rfq_width() -> usize {
    4
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            tracking_prefix: default_tracking_prefix(),
            tracking_width: default_tracking_width(),
            rfq_prefix: default_rfq_prefix(),
            rfq_width: default_rfq_width(),
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `tracing` filter directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "vetted=info,seeder=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> AppResult<Self> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("VETTED")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        Ok(config.try_deserialize()?)
    }
}
