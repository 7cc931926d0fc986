//! CLI configuration
//!
//! Log levels per hook target, layered over one global level.

use tracing::Level;
use vuepart_config::Hook;

/// CLI log configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub global: Level,
    pub resolve: Option<Level>,
    pub load: Option<Level>,
    pub transform: Option<Level>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            global: Level::INFO,
            resolve: None,
            load: None,
            transform: None,
        }
    }
}

impl LogConfig {
    /// Config with every target at `global`
    pub fn with_global(global: Level) -> Self {
        Self {
            global,
            ..Self::default()
        }
    }

    /// Get log level for a specific target
    pub fn level_for(&self, target: &str) -> Level {
        match target {
            "vuepart::resolve" => self.resolve.unwrap_or(self.global),
            "vuepart::load" => self.load.unwrap_or(self.global),
            "vuepart::transform" => self.transform.unwrap_or(self.global),
            _ => self.global,
        }
    }

    /// Level for a hook's target
    pub fn level_for_hook(&self, hook: Hook) -> Level {
        self.level_for(&hook.target())
    }
}

/// Parse a level name; `silent` keeps only errors
pub fn parse_level(name: &str) -> Option<Level> {
    match name.to_lowercase().as_str() {
        "silent" | "error" => Some(Level::ERROR),
        "warn" => Some(Level::WARN),
        "info" => Some(Level::INFO),
        "debug" => Some(Level::DEBUG),
        "trace" => Some(Level::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_falls_back_to_global() {
        let config = LogConfig {
            global: Level::WARN,
            load: Some(Level::TRACE),
            ..LogConfig::default()
        };
        assert_eq!(config.level_for("vuepart::load"), Level::TRACE);
        assert_eq!(config.level_for("vuepart::resolve"), Level::WARN);
        assert_eq!(config.level_for("vuepart"), Level::WARN);
        assert_eq!(config.level_for_hook(Hook::Load), Level::TRACE);
        assert_eq!(config.level_for_hook(Hook::Transform), Level::WARN);
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG"), Some(Level::DEBUG));
        assert_eq!(parse_level("silent"), Some(Level::ERROR));
        assert_eq!(parse_level("loud"), None);
    }
}
