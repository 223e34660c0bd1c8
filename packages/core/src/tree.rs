//! The parameter tree: components, blocks and leaves laid out on one
//! blackboard.

use crate::access::{AccessContext, AccessError};
use crate::area::{AreaConfiguration, SyncerSet};
use crate::bit_parameter::BitParameter;
use crate::blackboard::{Blackboard, Endianness};
use crate::block::BitParameterBlock;
use crate::config::{NodeConfig, StructureConfig};
use crate::error::Error;
use crate::integer::IntegerParameter;
use crate::path::{PathError, PathNavigator, SEPARATOR};

/// Errors raised while building or walking a parameter tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error(transparent)]
    Path(#[from] PathError),

    #[error("no element '{remaining}' under '{parent}'")]
    NotFound { parent: String, remaining: String },

    #[error("'{path}' is not a parameter")]
    NotAParameter { path: String },

    #[error("invalid element name '{name}' under '{parent}': {reason}")]
    InvalidName {
        parent: String,
        name: String,
        reason: String,
    },

    #[error("duplicate element '{name}' under '{parent}'")]
    Duplicate { parent: String, name: String },

    #[error("invalid layout for '{path}': {message}")]
    InvalidLayout { path: String, message: String },
}

/// An element of the tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Component { name: String, children: Vec<Node> },
    BitBlock(BitParameterBlock),
    Integer(IntegerParameter),
}

impl Node {
    pub fn name(&self) -> &str {
        match self {
            Node::Component { name, .. } => name,
            Node::BitBlock(block) => block.name(),
            Node::Integer(p) => last_segment(p.path()),
        }
    }
}

fn last_segment(path: &str) -> &str {
    path.rsplit(SEPARATOR).next().unwrap_or(path)
}

/// A leaf found by [`ParameterTree::resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Parameter<'a> {
    Bit(&'a BitParameter),
    Integer(&'a IntegerParameter),
}

impl<'a> Parameter<'a> {
    pub fn path(&self) -> &'a str {
        match self {
            Parameter::Bit(p) => p.path(),
            Parameter::Integer(p) => p.path(),
        }
    }

    pub fn is_boolean(&self) -> bool {
        match self {
            Parameter::Bit(p) => p.is_boolean(),
            Parameter::Integer(p) => p.is_boolean(),
        }
    }

    pub fn set_value_string(
        &self,
        text: &str,
        ctx: &mut AccessContext<'_>,
    ) -> Result<(), AccessError> {
        match self {
            Parameter::Bit(p) => p.set_value_string(text, ctx),
            Parameter::Integer(p) => p.set_value_string(text, ctx),
        }
    }

    pub fn value_string(&self, ctx: &mut AccessContext<'_>) -> Result<String, AccessError> {
        match self {
            Parameter::Bit(p) => p.value_string(ctx),
            Parameter::Integer(p) => p.value_string(ctx),
        }
    }

    pub fn create_area_configuration(&self, syncers: &SyncerSet) -> AreaConfiguration {
        match self {
            Parameter::Bit(p) => p.create_area_configuration(syncers),
            Parameter::Integer(p) => p.create_area_configuration(syncers),
        }
    }
}

/// A parameter structure with its blackboard layout and syncers.
///
/// Offsets are assigned in declaration order. Paths are written without a
/// leading slash and start with the root name, e.g. `audio/mixer/gain`.
#[derive(Debug, Clone)]
pub struct ParameterTree {
    name: String,
    children: Vec<Node>,
    footprint: usize,
    endianness: Endianness,
    syncers: SyncerSet,
}

impl ParameterTree {
    /// Build the tree described by `config`; every write is committed
    /// through `syncers`.
    pub fn from_config(config: &StructureConfig, syncers: SyncerSet) -> Result<Self, TreeError> {
        check_name("", &config.name)?;

        let mut offset = 0;
        let children = build_children(&config.name, &config.children, &mut offset)?;
        tracing::debug!(
            root = %config.name,
            footprint = offset,
            "built parameter tree"
        );

        Ok(Self {
            name: config.name.clone(),
            children,
            footprint: offset,
            endianness: config.endianness,
            syncers,
        })
    }

    pub fn root_name(&self) -> &str {
        &self.name
    }

    pub fn children(&self) -> &[Node] {
        &self.children
    }

    /// Total blackboard size in bytes.
    pub fn footprint(&self) -> usize {
        self.footprint
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn syncers(&self) -> &SyncerSet {
        &self.syncers
    }

    /// A zeroed blackboard sized for this tree.
    pub fn new_blackboard(&self) -> Blackboard {
        Blackboard::new(self.footprint)
    }

    /// An access context over `blackboard` using this tree's byte order.
    pub fn context<'b>(&self, blackboard: &'b mut Blackboard) -> AccessContext<'b> {
        AccessContext::new(blackboard).with_endianness(self.endianness)
    }

    /// Find the leaf at `path`.
    pub fn resolve(&self, path: &str) -> Result<Parameter<'_>, TreeError> {
        let mut nav = PathNavigator::parse(path)?;
        nav.navigate_through(&self.name)?;

        let mut children = &self.children;
        loop {
            let remaining = nav.current_path();
            let parent = nav.consumed_path();
            let Some(segment) = nav.next_segment() else {
                return Err(TreeError::NotAParameter {
                    path: path.to_string(),
                });
            };

            let node = children
                .iter()
                .find(|n| n.name() == segment)
                .ok_or_else(|| TreeError::NotFound {
                    parent,
                    remaining,
                })?;

            match node {
                Node::Component { children: next, .. } => children = next,
                Node::BitBlock(block) => {
                    let remaining = nav.current_path();
                    let Some(segment) = nav.next_segment() else {
                        return Err(TreeError::NotAParameter {
                            path: path.to_string(),
                        });
                    };
                    let bit = block.bit(segment).ok_or_else(|| TreeError::NotFound {
                        parent: block.path().to_string(),
                        remaining,
                    })?;
                    return leaf(&nav, bit.path(), Parameter::Bit(bit));
                }
                Node::Integer(p) => return leaf(&nav, p.path(), Parameter::Integer(p)),
            }
        }
    }

    /// Every leaf path in declaration order.
    pub fn list_parameters(&self) -> Vec<String> {
        let mut paths = Vec::new();
        collect_paths(&self.children, &mut paths);
        paths
    }

    /// Read the parameter at `path` in its string form.
    pub fn get_value(&self, path: &str, ctx: &mut AccessContext<'_>) -> Result<String, Error> {
        let parameter = self.resolve(path)?;
        Ok(parameter.value_string(ctx)?)
    }

    /// Write the parameter at `path` and commit its area.
    pub fn set_value(
        &self,
        path: &str,
        text: &str,
        ctx: &mut AccessContext<'_>,
    ) -> Result<(), Error> {
        let parameter = self.resolve(path)?;
        parameter.set_value_string(text, ctx)?;

        let area = parameter.create_area_configuration(&self.syncers);
        area.commit(ctx.blackboard())?;
        Ok(())
    }

    /// Write several parameters, flushing each touched area once.
    ///
    /// Every path is resolved before anything is written. If one write
    /// fails, the areas already touched are restored and nothing is
    /// committed. Returns the number of areas committed.
    pub fn set_values<P, V>(
        &self,
        values: impl IntoIterator<Item = (P, V)>,
        ctx: &mut AccessContext<'_>,
    ) -> Result<usize, Error>
    where
        P: AsRef<str>,
        V: AsRef<str>,
    {
        let mut writes = Vec::new();
        for (path, text) in values {
            writes.push((self.resolve(path.as_ref())?, text));
        }

        let mut areas: Vec<AreaConfiguration> = Vec::new();
        for (parameter, _) in &writes {
            let area = parameter.create_area_configuration(&self.syncers);
            match areas.iter_mut().find(|a| a.same_area(&area)) {
                Some(existing) => existing.merge_from(&area),
                None => areas.push(area),
            }
        }

        for area in &mut areas {
            area.save(ctx.blackboard())?;
        }

        for (parameter, text) in &writes {
            if let Err(e) = parameter.set_value_string(text.as_ref(), ctx) {
                for area in &areas {
                    area.restore(ctx.blackboard_mut())?;
                }
                return Err(e.into());
            }
        }

        for area in &areas {
            area.commit(ctx.blackboard())?;
        }
        Ok(areas.len())
    }
}

fn leaf<'a>(
    nav: &PathNavigator,
    path: &str,
    parameter: Parameter<'a>,
) -> Result<Parameter<'a>, TreeError> {
    if nav.is_exhausted() {
        Ok(parameter)
    } else {
        Err(TreeError::NotFound {
            parent: path.to_string(),
            remaining: nav.current_path(),
        })
    }
}

fn check_name(parent: &str, name: &str) -> Result<(), TreeError> {
    let reason = if name.is_empty() {
        "empty name"
    } else if name.contains(SEPARATOR) {
        "name contains '/'"
    } else {
        return Ok(());
    };
    Err(TreeError::InvalidName {
        parent: parent.to_string(),
        name: name.to_string(),
        reason: reason.to_string(),
    })
}

fn build_children(
    parent: &str,
    configs: &[NodeConfig],
    offset: &mut usize,
) -> Result<Vec<Node>, TreeError> {
    let mut nodes: Vec<Node> = Vec::with_capacity(configs.len());
    for config in configs {
        let name = config.name();
        check_name(parent, name)?;
        if nodes.iter().any(|n| n.name() == name) {
            return Err(TreeError::Duplicate {
                parent: parent.to_string(),
                name: name.to_string(),
            });
        }

        let path = format!("{}{}{}", parent, SEPARATOR, name);
        let node = match config {
            NodeConfig::Component { children, .. } => Node::Component {
                name: name.to_string(),
                children: build_children(&path, children, offset)?,
            },
            NodeConfig::BitBlock { size, bits, .. } => {
                let mut block = BitParameterBlock::new(path.as_str(), *offset, *size)?;
                for bit in bits {
                    check_name(&path, &bit.name)?;
                    block.add_bit(&bit.name, bit.pos, bit.size, bit.max)?;
                }
                *offset += block.footprint();
                Node::BitBlock(block)
            }
            NodeConfig::Integer { size, min, max, .. } => {
                let p = IntegerParameter::new(path.as_str(), *offset, *size, *min, *max)?;
                *offset += p.footprint();
                Node::Integer(p)
            }
            NodeConfig::Boolean { .. } => {
                let p = IntegerParameter::boolean(path.as_str(), *offset);
                *offset += p.footprint();
                Node::Integer(p)
            }
        };
        nodes.push(node);
    }
    Ok(nodes)
}

fn collect_paths(nodes: &[Node], paths: &mut Vec<String>) {
    for node in nodes {
        match node {
            Node::Component { children, .. } => collect_paths(children, paths),
            Node::BitBlock(block) => {
                paths.extend(block.bits().iter().map(|b| b.path().to_string()))
            }
            Node::Integer(p) => paths.push(p.path().to_string()),
        }
    }
}
