//! Service configuration
//!
//! Every field has a serde default, so a partial JSON file is enough.

use civicdesk_core::{IdentifierGenerator, TransitionTable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the complaint services
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceConfig {
    // === Identifiers ===
    /// Leading segment of every complaint id
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,

    /// Zero-padding of the sequence segment
    #[serde(default = "default_sequence_width")]
    pub sequence_width: usize,

    /// Fresh-sequence retries after an id collision
    #[serde(default = "default_max_id_retries")]
    pub max_id_retries: u32,

    // === Statistics ===
    /// Age after which a cached summary is recomputed
    #[serde(default = "default_stats_ttl_secs")]
    pub stats_ttl_secs: u64,

    // === Workflow ===
    /// Let closed/rejected complaints reopen to in_progress
    #[serde(default)]
    pub allow_terminal_reopen: bool,
}

fn default_id_prefix() -> String {
    "CMP".to_string()
}

fn default_sequence_width() -> usize {
    6
}

fn default_max_id_retries() -> u32 {
    3
}

fn default_stats_ttl_secs() -> u64 {
    60
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            id_prefix: default_id_prefix(),
            sequence_width: default_sequence_width(),
            max_id_retries: default_max_id_retries(),
            stats_ttl_secs: default_stats_ttl_secs(),
            allow_terminal_reopen: false,
        }
    }
}

impl ServiceConfig {
    /// Load configuration from a JSON file
    pub fn from_file(path: &std::path::Path) -> Result<Self, std::io::Error> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
    }

    /// Reject settings that would produce unparseable ids
    pub fn validate(&self) -> Result<(), String> {
        if self.id_prefix.is_empty() {
            return Err("id_prefix must not be empty".to_string());
        }
        if !self.id_prefix.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(format!("id_prefix must be alphanumeric: {}", self.id_prefix));
        }
        if !(1..=20).contains(&self.sequence_width) {
            return Err(format!(
                "sequence_width must be between 1 and 20: {}",
                self.sequence_width
            ));
        }
        Ok(())
    }

    pub fn generator(&self) -> IdentifierGenerator {
        IdentifierGenerator::new(&self.id_prefix, self.sequence_width)
    }

    pub fn transition_table(&self) -> TransitionTable {
        if self.allow_terminal_reopen {
            TransitionTable::with_terminal_reopen()
        } else {
            TransitionTable::permissive()
        }
    }

    pub fn stats_ttl(&self) -> Duration {
        Duration::from_secs(self.stats_ttl_secs)
    }
}
