//! paramfs core: parameters laid out on a blackboard
//!
//! This layer knows what the bytes mean:
//! - `PathNavigator`: validated slash paths consumed segment by segment
//! - `Blackboard`: the byte image every parameter lives in
//! - `BitParameter` / `BitParameterBlock`: bit fields sharing one register
//! - `IntegerParameter`: whole-register integers and booleans
//! - `AreaConfiguration` / `SyncerSet`: what a write commits, and to whom
//! - `ParameterTree`: the structure, built from a JSON description
//!
//! # Example
//!
//! ```rust
//! use paramfs_core::{ParameterTree, StructureConfig, SyncerSet};
//!
//! let config = StructureConfig::from_json(r#"{
//!     "name": "audio",
//!     "children": [
//!         {"type": "bit_block", "name": "ctrl", "size": 1, "bits": [
//!             {"name": "gain", "pos": 4, "size": 4}
//!         ]}
//!     ]
//! }"#).unwrap();
//! let tree = ParameterTree::from_config(&config, SyncerSet::new()).unwrap();
//!
//! let mut blackboard = tree.new_blackboard();
//! let mut ctx = tree.context(&mut blackboard);
//! tree.set_value("audio/ctrl/gain", "0xA", &mut ctx).unwrap();
//! assert_eq!(tree.get_value("audio/ctrl/gain", &mut ctx).unwrap(), "10");
//! assert_eq!(blackboard.as_bytes(), &[0xA0]);
//! ```

mod access;
mod area;
mod bit_parameter;
mod blackboard;
mod block;
mod config;
mod error;
mod integer;
mod path;
mod tree;

pub use access::{AccessContext, AccessError, ParameterValue};
pub use area::{AreaConfiguration, RegisterFile, SyncError, Syncer, SyncerSet};
pub use bit_parameter::{BitField, BitParameter, LayoutError};
pub use blackboard::{Blackboard, Endianness};
pub use block::BitParameterBlock;
pub use config::{BitConfig, NodeConfig, StructureConfig};
pub use error::Error;
pub use integer::IntegerParameter;
pub use path::{PathError, PathNavigator, SEPARATOR};
pub use tree::{Node, Parameter, ParameterTree, TreeError};
