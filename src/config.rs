use std::path::PathBuf;

use log::LevelFilter;

use crate::error::{Result, TreeError};

/// Construction-time settings for an [`RbTree`](crate::RbTree).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TreeConfig {
    /// Shows up in log lines so several trees can be told apart.
    pub name: Option<String>,
    /// Maximum number of nodes the backing pool will ever hold.
    /// `None` lets the pool grow until the allocator refuses.
    pub capacity: Option<usize>,
    /// Number of node blocks to set aside at creation.
    pub initial_reserve: usize,
}

impl TreeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    pub fn with_initial_reserve(mut self, blocks: usize) -> Self {
        self.initial_reserve = blocks;
        self
    }

    pub fn validate(&self) -> Result<()> {
        match self.capacity {
            Some(0) => Err(TreeError::InvalidArgument("pool capacity must be non-zero")),
            Some(capacity) if self.initial_reserve > capacity => {
                Err(TreeError::InvalidArgument("initial reserve exceeds pool capacity"))
            }
            _ => Ok(()),
        }
    }
}

/// Where log output goes when [`init_logging`](crate::logging::init_logging) installs a logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogConfig {
    pub terminal_level: LevelFilter,
    /// Also write everything at or above the given level to this file.
    pub file: Option<(PathBuf, LevelFilter)>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            terminal_level: LevelFilter::Warn,
            file: None,
        }
    }
}

impl LogConfig {
    pub fn with_file(mut self, path: impl Into<PathBuf>, level: LevelFilter) -> Self {
        self.file = Some((path.into(), level));
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        TreeConfig::default().validate().unwrap();
        TreeConfig::new().with_capacity(1).with_initial_reserve(1).validate().unwrap();
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let err = TreeConfig::new().with_capacity(0).validate().unwrap_err();
        assert!(matches!(err, TreeError::InvalidArgument(_)));
    }

    #[test]
    fn reserve_above_capacity_is_rejected() {
        let err = TreeConfig::new().with_capacity(4).with_initial_reserve(5).validate().unwrap_err();
        assert!(matches!(err, TreeError::InvalidArgument(_)));
    }

    #[test]
    fn builder_sets_fields() {
        let config = TreeConfig::new().with_name("threads").with_capacity(128).with_initial_reserve(16);
        assert_eq!(config.name.as_deref(), Some("threads"));
        assert_eq!(config.capacity, Some(128));
        assert_eq!(config.initial_reserve, 16);
    }
}
