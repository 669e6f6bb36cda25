use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `BRANDFORGE__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_node_id")]
    pub node_id: String,
    #[serde(default)]
    pub workflow: WorkflowSettings,
    #[serde(default)]
    pub critique: CritiqueSettings,
}

/// Retry budgets and variation counts for the workflow engine.
#[derive(Debug, Clone, Deserialize)]
pub struct WorkflowSettings {
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_max_enhance_passes")]
    pub max_enhance_passes: u32,
    #[serde(default = "default_num_variations")]
    pub num_variations: usize,
}

/// Score thresholds and evaluator bounds for the critique stage.
#[derive(Debug, Clone, Deserialize)]
pub struct CritiqueSettings {
    /// Minimum overall score for a variation to pass.
    #[serde(default = "default_overall_threshold")]
    pub overall_threshold: f64,
    /// Minimum score any single dimension must reach. A dimension below
    /// this floor fails the variation regardless of the overall average.
    #[serde(default = "default_dimension_floor")]
    pub dimension_floor: f64,
    /// Overall score at or above which the refinement policy approves.
    #[serde(default = "default_approve_threshold")]
    pub approve_threshold: f64,
    /// Overall score below which the refinement policy rejects outright.
    #[serde(default = "default_reject_threshold")]
    pub reject_threshold: f64,
    /// Safety dimension score below which the run is rejected
    /// unconditionally.
    #[serde(default = "default_safety_floor")]
    pub safety_floor: f64,
    #[serde(default = "default_evaluator_timeout_ms")]
    pub evaluator_timeout_ms: u64,
}

// Default functions
fn default_node_id() -> String {
    "forge-01".to_string()
}
fn default_max_retries() -> u32 {
    3
}
fn default_max_enhance_passes() -> u32 {
    2
}
fn default_num_variations() -> usize {
    1
}
fn default_overall_threshold() -> f64 {
    0.6
}
fn default_dimension_floor() -> f64 {
    0.4
}
fn default_approve_threshold() -> f64 {
    0.7
}
fn default_reject_threshold() -> f64 {
    0.3
}
fn default_safety_floor() -> f64 {
    0.3
}
fn default_evaluator_timeout_ms() -> u64 {
    30_000
}

impl Default for WorkflowSettings {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            max_enhance_passes: default_max_enhance_passes(),
            num_variations: default_num_variations(),
        }
    }
}

impl Default for CritiqueSettings {
    fn default() -> Self {
        Self {
            overall_threshold: default_overall_threshold(),
            dimension_floor: default_dimension_floor(),
            approve_threshold: default_approve_threshold(),
            reject_threshold: default_reject_threshold(),
            safety_floor: default_safety_floor(),
            evaluator_timeout_ms: default_evaluator_timeout_ms(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            node_id: default_node_id(),
            workflow: WorkflowSettings::default(),
            critique: CritiqueSettings::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder().add_source(
            config::Environment::with_prefix("BRANDFORGE")
                .separator("__")
                .try_parsing(true)
                .list_separator(","),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.workflow.max_retries, 3);
        assert_eq!(config.workflow.max_enhance_passes, 2);
        assert_eq!(config.critique.overall_threshold, 0.6);
        assert_eq!(config.critique.dimension_floor, 0.4);
        assert_eq!(config.critique.approve_threshold, 0.7);
        assert_eq!(config.critique.safety_floor, 0.3);
    }
}
