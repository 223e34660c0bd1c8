//! The parameter state a server exposes.

use std::fmt;
use std::str::FromStr;

use paramfs_core::{
    AccessContext, Blackboard, Error as CoreError, ParameterTree, StructureConfig, SyncerSet,
};

/// How parameter values are printed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Dec,
    Hex,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Dec => f.write_str("dec"),
            OutputFormat::Hex => f.write_str("hex"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dec" => Ok(OutputFormat::Dec),
            "hex" => Ok(OutputFormat::Hex),
            other => Err(format!("unknown output format '{}' (expected dec or hex)", other)),
        }
    }
}

/// A parameter tree, its main blackboard, and output settings.
#[derive(Debug)]
pub struct ParameterManager {
    tree: ParameterTree,
    blackboard: Blackboard,
    output_format: OutputFormat,
}

impl ParameterManager {
    pub fn new(tree: ParameterTree) -> Self {
        let blackboard = tree.new_blackboard();
        Self {
            tree,
            blackboard,
            output_format: OutputFormat::default(),
        }
    }

    pub fn from_config(config: &StructureConfig, syncers: SyncerSet) -> Result<Self, CoreError> {
        Ok(Self::new(ParameterTree::from_config(config, syncers)?))
    }

    pub fn tree(&self) -> &ParameterTree {
        &self.tree
    }

    pub fn blackboard(&self) -> &Blackboard {
        &self.blackboard
    }

    pub fn output_format(&self) -> OutputFormat {
        self.output_format
    }

    pub fn set_output_format(&mut self, format: OutputFormat) {
        self.output_format = format;
    }

    pub fn list_parameters(&self) -> Vec<String> {
        self.tree.list_parameters()
    }

    pub fn get_value(&mut self, path: &str) -> Result<String, CoreError> {
        let (tree, mut ctx) = self.split();
        tree.get_value(path, &mut ctx)
    }

    pub fn set_value(&mut self, path: &str, value: &str) -> Result<(), CoreError> {
        let (tree, mut ctx) = self.split();
        tree.set_value(path, value, &mut ctx)
    }

    /// Write several parameters, flushing each touched area once.
    pub fn set_values<P, V>(
        &mut self,
        values: impl IntoIterator<Item = (P, V)>,
    ) -> Result<usize, CoreError>
    where
        P: AsRef<str>,
        V: AsRef<str>,
    {
        let (tree, mut ctx) = self.split();
        tree.set_values(values, &mut ctx)
    }

    fn split(&mut self) -> (&ParameterTree, AccessContext<'_>) {
        let hex = self.output_format == OutputFormat::Hex;
        let ctx = self.tree.context(&mut self.blackboard).with_hex_output(hex);
        (&self.tree, ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ParameterManager {
        let config = StructureConfig::from_json(
            r#"{"name": "dev", "children": [
                {"type": "bit_block", "name": "ctrl", "size": 1, "bits": [
                    {"name": "mode", "pos": 0, "size": 3},
                    {"name": "on", "pos": 7, "size": 1}
                ]},
                {"type": "integer", "name": "level", "size": 2}
            ]}"#,
        )
        .unwrap();
        ParameterManager::from_config(&config, SyncerSet::new()).unwrap()
    }

    #[test]
    fn output_format_parsing() {
        assert_eq!("hex".parse::<OutputFormat>(), Ok(OutputFormat::Hex));
        assert_eq!("dec".parse::<OutputFormat>(), Ok(OutputFormat::Dec));
        assert!("oct".parse::<OutputFormat>().is_err());
        assert_eq!(OutputFormat::Hex.to_string(), "hex");
    }

    #[test]
    fn values_follow_output_format() {
        let mut manager = manager();
        manager.set_value("dev/level", "300").unwrap();
        assert_eq!(manager.get_value("dev/level").unwrap(), "300");

        manager.set_output_format(OutputFormat::Hex);
        assert_eq!(manager.get_value("dev/level").unwrap(), "0x012C");
        assert_eq!(manager.blackboard().as_bytes(), &[0, 0x2C, 0x01]);
    }

    #[test]
    fn batch_write() {
        let mut manager = manager();
        let committed = manager
            .set_values([("dev/ctrl/mode", "5"), ("dev/ctrl/on", "true")])
            .unwrap();
        assert_eq!(committed, 1);
        assert_eq!(manager.blackboard().as_bytes()[0], 0b1000_0101);
    }
}
