//! Compiler configuration.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `XTENS_QUERY_STRATEGY` | jsonb | Leaf strategy (`json` or `jsonb`) |
//! | `XTENS_QUERY_MAX_DEPTH` | 16 | Maximum nesting depth of related entities |
//!
//! # Example
//!
//! ```rust
//! use xtens_query::{CompilerConfig, StrategyKind};
//!
//! // Create from environment
//! let config = CompilerConfig::from_env();
//!
//! // Or create programmatically
//! let config = CompilerConfig {
//!     strategy: StrategyKind::Json,
//!     ..Default::default()
//! };
//! assert!(config.validate().is_ok());
//! ```

use std::fmt;
use std::str::FromStr;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use crate::compiler::{JsonPathStrategy, JsonbContainmentStrategy, LeafStrategy};

/// Leaf strategy selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    /// Typed path reads, usable on plain JSON columns.
    Json,
    /// JSONB containment, able to use a GIN index.
    #[default]
    Jsonb,
}

impl StrategyKind {
    /// Returns the configuration name.
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::Json => "json",
            StrategyKind::Jsonb => "jsonb",
        }
    }

    /// Instantiates the strategy.
    pub fn build(&self) -> Box<dyn LeafStrategy> {
        match self {
            StrategyKind::Json => Box::new(JsonPathStrategy::new()),
            StrategyKind::Jsonb => Box::new(JsonbContainmentStrategy::new()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "json" => Ok(StrategyKind::Json),
            "jsonb" => Ok(StrategyKind::Jsonb),
            _ => Err(format!("unknown query strategy: {}", s)),
        }
    }
}

/// Configuration of a [`QueryCompiler`](crate::QueryCompiler).
#[derive(Debug, Clone, PartialEq, Eq, Parser, Deserialize)]
#[command(name = "xtens-query")]
#[command(about = "Metadata query compiler")]
#[serde(default)]
pub struct CompilerConfig {
    /// Leaf strategy.
    #[arg(long, env = "XTENS_QUERY_STRATEGY", value_enum, default_value = "jsonb")]
    pub strategy: StrategyKind,

    /// Maximum nesting depth of related entities below the root.
    #[arg(long, env = "XTENS_QUERY_MAX_DEPTH", default_value = "16")]
    pub max_depth: usize,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::Jsonb,
            max_depth: 16,
        }
    }
}

impl CompilerConfig {
    /// Creates a configuration from environment variables.
    ///
    /// Process arguments are never read. Unparseable values fall back to the
    /// defaults.
    pub fn from_env() -> Self {
        Self::try_parse_from(["xtens-query"]).unwrap_or_default()
    }

    /// Validates the configuration and returns errors if any.
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.max_depth == 0 {
            errors.push("Max depth cannot be 0".to_string());
        }

        if self.max_depth > 64 {
            errors.push("Max depth cannot exceed 64".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Creates a configuration suitable for testing.
    ///
    /// Uses the path strategy, whose output does not depend on JSONB.
    pub fn for_testing() -> Self {
        Self {
            strategy: StrategyKind::Json,
            max_depth: 4,
        }
    }
}
