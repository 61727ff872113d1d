use serde::{Deserialize, Serialize};

use crate::util::fractional_index::DEFAULT_REBALANCE_THRESHOLD;

/// Configuration from outliner.toml
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutlinerConfig {
    #[serde(default)]
    pub ordering: OrderingConfig,
    #[serde(default)]
    pub search: SearchConfig,
    #[serde(default)]
    pub export: ExportConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderingConfig {
    /// Order keys longer than this trigger a rekey of their sibling set
    #[serde(default = "default_rebalance_threshold")]
    pub rebalance_threshold: usize,
}

impl Default for OrderingConfig {
    fn default() -> Self {
        OrderingConfig {
            rebalance_threshold: DEFAULT_REBALANCE_THRESHOLD,
        }
    }
}

fn default_rebalance_threshold() -> usize {
    DEFAULT_REBALANCE_THRESHOLD
}

/// Defaults for new searches
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchConfig {
    #[serde(default = "default_true")]
    pub case_insensitive: bool,
    #[serde(default)]
    pub whole_words: bool,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            case_insensitive: true,
            whole_words: false,
        }
    }
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Name written into the OPML generator comment
    #[serde(default = "default_generator")]
    pub generator: String,
}

impl Default for ExportConfig {
    fn default() -> Self {
        ExportConfig {
            generator: default_generator(),
        }
    }
}

fn default_generator() -> String {
    "outliner".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: OutlinerConfig = toml::from_str("").unwrap();
        assert_eq!(config, OutlinerConfig::default());
        assert_eq!(config.ordering.rebalance_threshold, 50);
        assert!(config.search.case_insensitive);
        assert_eq!(config.export.generator, "outliner");
    }

    #[test]
    fn test_partial_config() {
        let config: OutlinerConfig = toml::from_str(
            r#"
[ordering]
rebalance_threshold = 12

[search]
whole_words = true
"#,
        )
        .unwrap();
        assert_eq!(config.ordering.rebalance_threshold, 12);
        assert!(config.search.whole_words);
        assert!(config.search.case_insensitive);
    }
}
