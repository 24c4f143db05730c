use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::block::normalize_ident;

/// Canonical biome name, normalized the same way block identifiers are.
#[derive(Clone, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct BiomeKey(String);

impl BiomeKey {
    pub fn new(name: &str) -> Self {
        BiomeKey(normalize_ident(name))
    }

    pub fn plains() -> Self {
        BiomeKey("plains".to_string())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BiomeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
