//! paramfs: hierarchical hardware parameters addressed by path.
//!
//! Parameters live in a tree described by a JSON structure file. Each leaf
//! maps to bytes of a shared blackboard; bit fields share a register block
//! and writes to one never disturb its siblings. Every write commits the
//! touched area through the tree's syncers.
//!
//! - [`wire`]: length-prefixed frames and protocol packets
//! - [`core`]: paths, parameters, areas and the tree
//! - [`remote`]: command table, TCP server and client

pub use paramfs_core as core;
pub use paramfs_remote as remote;
pub use paramfs_wire as wire;

pub use paramfs_core::{
    AccessContext, AreaConfiguration, BitParameter, Blackboard, Error, ParameterTree,
    PathNavigator, StructureConfig, SyncerSet,
};
pub use paramfs_remote::{Client, ParameterManager, Server, ServerConfig};
pub use paramfs_wire::{Message, Packet};
