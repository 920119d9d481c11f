//! # Building blocks
//!
//! An analyte name such as `H5N4F1` is a sequence of building-block names with
//! counts. Each block is described by a small `.block` text file holding its
//! monoisotopic mass, an optional charge (charge carriers such as `proton`)
//! and the number of atoms per element whose isotopes vary naturally.
//!
//! ```text
//! # proton.block
//! mass: 1.00727646677
//! charge: 1
//! ```

mod error;
mod parser;

pub use error::BlockError;
pub use parser::parse_block;

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use log::{debug, warn};

use crate::isotopes::Element;

/// One building block
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// File stem of the block file
    pub name: String,
    /// Monoisotopic mass (Da)
    pub mass: f64,
    /// Charge, present for charge carriers
    pub charge: Option<i32>,
    /// Atom counts per element
    pub elements: BTreeMap<Element, u32>,
}

impl Block {
    pub fn new(name: &str, mass: f64) -> Self {
        Self {
            name: name.to_string(),
            mass,
            charge: None,
            elements: BTreeMap::new(),
        }
    }

    pub fn with_charge(mut self, charge: i32) -> Self {
        self.charge = Some(charge);
        self
    }

    pub fn with_element(mut self, element: Element, count: u32) -> Self {
        self.elements.insert(element, count);
        self
    }

    /// Number of atoms of `element`; zero when the block does not list it
    pub fn count(&self, element: Element) -> u32 {
        self.elements.get(&element).copied().unwrap_or(0)
    }

    pub fn is_charge_carrier(&self) -> bool {
        matches!(self.charge, Some(c) if c != 0)
    }
}

/// All blocks available to a batch, keyed by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockSet {
    blocks: BTreeMap<String, Block>,
}

impl BlockSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `*.block` file in `dir`.
    ///
    /// Files that fail to parse are logged and skipped; a directory without a
    /// single usable block is an error.
    pub fn from_dir<P: AsRef<Path>>(dir: P) -> Result<Self, BlockError> {
        let dir = dir.as_ref();
        if !dir.is_dir() {
            return Err(BlockError::NotADirectory(dir.to_path_buf()));
        }

        let mut paths: Vec<_> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("block"))
            .collect();
        paths.sort();

        let mut set = BlockSet::new();
        for path in paths {
            let Some(name) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let content = fs::read_to_string(&path)?;
            match parse_block(name, &content) {
                Ok(block) => {
                    debug!("Loaded block '{}' ({:.6} Da)", block.name, block.mass);
                    set.insert(block);
                }
                Err(e) => warn!("Skipping block file {}: {}", path.display(), e),
            }
        }

        if set.is_empty() {
            return Err(BlockError::EmptyDirectory(dir.to_path_buf()));
        }
        Ok(set)
    }

    pub fn insert(&mut self, block: Block) {
        self.blocks.insert(block.name.clone(), block);
    }

    pub fn get(&self, name: &str) -> Option<&Block> {
        self.blocks.get(name)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Block> {
        self.blocks.values()
    }

    /// Blocks with a non-zero charge, `proton` first when present
    pub fn charge_carriers(&self) -> Vec<&Block> {
        let mut carriers: Vec<&Block> = self.iter().filter(|b| b.is_charge_carrier()).collect();
        carriers.sort_by_key(|b| b.name != "proton");
        carriers
    }
}

impl FromIterator<Block> for BlockSet {
    fn from_iter<I: IntoIterator<Item = Block>>(iter: I) -> Self {
        let mut set = BlockSet::new();
        for block in iter {
            set.insert(block);
        }
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_from_dir_skips_broken_blocks() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("proton.block"), "mass: 1.00727646677\ncharge: 1\n").unwrap();
        fs::write(dir.path().join("H.block"), "mass: 162.0528\ncarbons: 6\n").unwrap();
        fs::write(dir.path().join("bad.block"), "mass: 1\nweird: 2\n").unwrap();
        fs::write(dir.path().join("notes.txt"), "mass: 5\n").unwrap();

        let set = BlockSet::from_dir(dir.path()).unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.get("bad").is_none());
        assert!(set.get("notes").is_none());
        assert_eq!(set.get("H").unwrap().count(Element::Carbon), 6);
    }

    #[test]
    fn test_empty_dir_is_error() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            BlockSet::from_dir(dir.path()),
            Err(BlockError::EmptyDirectory(_))
        ));
    }

    #[test]
    fn test_charge_carriers_put_proton_first() {
        let set: BlockSet = [
            Block::new("H", 162.05),
            Block::new("ammonium", 18.03).with_charge(1),
            Block::new("proton", 1.007).with_charge(1),
            Block::new("neutral", 3.0).with_charge(0),
        ]
        .into_iter()
        .collect();
        let names: Vec<&str> = set.charge_carriers().iter().map(|b| b.name.as_str()).collect();
        assert_eq!(names, vec!["proton", "ammonium"]);
    }
}
