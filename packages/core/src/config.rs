//! JSON description of a parameter tree's structure.
//!
//! ```json
//! {
//!   "name": "audio",
//!   "endianness": "little",
//!   "children": [
//!     {"type": "component", "name": "mixer", "children": [
//!       {"type": "bit_block", "name": "ctrl", "size": 2, "bits": [
//!         {"name": "gain", "pos": 4, "size": 4},
//!         {"name": "mute", "pos": 0, "size": 1}
//!       ]}
//!     ]},
//!     {"type": "integer", "name": "volume", "size": 1, "max": 100},
//!     {"type": "boolean", "name": "enabled"}
//!   ]
//! }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::blackboard::Endianness;
use crate::error::Error;

/// Root of a structure description.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct StructureConfig {
    pub name: String,
    #[serde(default)]
    pub endianness: Endianness,
    #[serde(default)]
    pub children: Vec<NodeConfig>,
}

/// One element of the tree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeConfig {
    /// A named group of elements.
    Component {
        name: String,
        #[serde(default)]
        children: Vec<NodeConfig>,
    },
    /// A register of `size` bytes split into bit fields.
    BitBlock {
        name: String,
        size: usize,
        bits: Vec<BitConfig>,
    },
    /// An unsigned integer of `size` bytes.
    Integer {
        name: String,
        size: usize,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max: Option<u64>,
    },
    /// A one byte flag.
    Boolean { name: String },
}

impl NodeConfig {
    pub fn name(&self) -> &str {
        match self {
            NodeConfig::Component { name, .. }
            | NodeConfig::BitBlock { name, .. }
            | NodeConfig::Integer { name, .. }
            | NodeConfig::Boolean { name } => name,
        }
    }
}

/// A bit field inside a [`NodeConfig::BitBlock`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BitConfig {
    pub name: String,
    pub pos: u32,
    pub size: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<u64>,
}

impl StructureConfig {
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|source| Error::Config {
            origin: "<inline>".to_string(),
            source,
        })
    }

    /// Read and parse a structure file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| Error::Io {
            path: path.to_path_buf(),
            source,
        })?;

        tracing::debug!("loaded structure from {}", path.display());
        serde_json::from_str(&text).map_err(|source| Error::Config {
            origin: path.display().to_string(),
            source,
        })
    }
}
