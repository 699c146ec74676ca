// Public modules
pub mod types;
pub mod config;
pub mod parsing;
pub mod error;
pub mod metrics;
pub mod kubernetes;
pub mod collector;

// Re-export commonly used items
pub use types::*;
pub use config::{load_config, load_config_with_env, EnvironmentProvider, SystemEnvironment, MockEnvironment};
pub use parsing::{parse_window, DurationError, Quantity, QuantityError};
pub use error::FetchError;
pub use metrics::{ContainerMetrics, PodMetrics, PodMetricsSource};
pub use kubernetes::KubeMetricsSource;
pub use collector::{calculate_usage, create_container_metrics_snapshots, MetricsClient};
