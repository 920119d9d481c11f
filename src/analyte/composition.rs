use std::collections::BTreeMap;

use crate::blocks::{Block, BlockSet};
use crate::isotopes::Element;

use super::AnalyteError;

/// Split an analyte name into `(unit, count)` pairs.
///
/// The name is cut into maximal runs of digits and non-digits, which must
/// alternate starting with a unit: `H5N4F1` gives `[("H", 5), ("N", 4), ("F", 1)]`.
pub fn parse_name(name: &str) -> Result<Vec<(String, u32)>, AnalyteError> {
    let invalid = |reason: &str| AnalyteError::InvalidName {
        name: name.to_string(),
        reason: reason.to_string(),
    };

    let mut runs: Vec<&str> = Vec::new();
    let mut start = 0;
    let mut prev_digit: Option<bool> = None;
    for (i, c) in name.char_indices() {
        let digit = c.is_ascii_digit();
        if let Some(prev) = prev_digit {
            if prev != digit {
                runs.push(&name[start..i]);
                start = i;
            }
        }
        prev_digit = Some(digit);
    }
    if start < name.len() {
        runs.push(&name[start..]);
    }

    if runs.is_empty() {
        return Err(invalid("empty name"));
    }
    if runs[0].starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("name must start with a block name"));
    }
    if runs.len() % 2 != 0 {
        return Err(invalid("last block has no count"));
    }

    runs.chunks(2)
        .map(|pair| {
            let count = pair[1]
                .parse::<u32>()
                .map_err(|_| invalid("block count out of range"))?;
            Ok((pair[0].to_string(), count))
        })
        .collect()
}

fn resolve<'a>(
    name: &str,
    blocks: &'a BlockSet,
) -> Result<Vec<(&'a Block, u32)>, AnalyteError> {
    parse_name(name)?
        .into_iter()
        .map(|(unit, count)| {
            blocks
                .get(&unit)
                .map(|block| (block, count))
                .ok_or_else(|| AnalyteError::UnknownBlock {
                    analyte: name.to_string(),
                    unit,
                })
        })
        .collect()
}

/// Monoisotopic mass of an analyte: the sum of its block masses times their counts
pub fn monoisotopic_mass(name: &str, blocks: &BlockSet) -> Result<f64, AnalyteError> {
    Ok(resolve(name, blocks)?
        .into_iter()
        .map(|(block, count)| block.mass * count as f64)
        .sum())
}

/// Atom counts per element whose isotopes vary naturally
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Composition {
    counts: BTreeMap<Element, u64>,
}

impl Composition {
    pub fn count(&self, element: Element) -> u64 {
        self.counts.get(&element).copied().unwrap_or(0)
    }

    pub fn add(&mut self, element: Element, atoms: u64) {
        *self.counts.entry(element).or_insert(0) += atoms;
    }
}

/// Variable elemental composition of an analyte, summed over its blocks.
///
/// Only [`Element::VARIABLE`] contribute; elements a block does not list count as zero.
pub fn variable_composition(name: &str, blocks: &BlockSet) -> Result<Composition, AnalyteError> {
    let mut composition = Composition::default();
    for element in Element::VARIABLE {
        composition.add(element, 0);
    }
    for (block, count) in resolve(name, blocks)? {
        for element in Element::VARIABLE {
            composition.add(element, block.count(element) as u64 * count as u64);
        }
    }
    Ok(composition)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glycan_blocks() -> BlockSet {
        [
            Block::new("H", 162.0528234185)
                .with_element(Element::Carbon, 6)
                .with_element(Element::Hydrogen, 10)
                .with_element(Element::Oxygen, 5),
            Block::new("N", 203.0793725207)
                .with_element(Element::Carbon, 8)
                .with_element(Element::Hydrogen, 13)
                .with_element(Element::Nitrogen, 1)
                .with_element(Element::Oxygen, 5),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_parse_name_tokens() {
        let parts = parse_name("H5N4").unwrap();
        assert_eq!(parts, vec![("H".to_string(), 5), ("N".to_string(), 4)]);
        let parts = parse_name("proton2").unwrap();
        assert_eq!(parts, vec![("proton".to_string(), 2)]);
        let parts = parse_name("Neu5Ac1H3").unwrap();
        assert_eq!(parts[0], ("Neu".to_string(), 5));
        assert_eq!(parts[1], ("Ac".to_string(), 1));
    }

    #[test]
    fn test_parse_name_rejects_bad_grammar() {
        assert!(matches!(parse_name("5H"), Err(AnalyteError::InvalidName { .. })));
        assert!(matches!(parse_name("H5N"), Err(AnalyteError::InvalidName { .. })));
        assert!(matches!(parse_name(""), Err(AnalyteError::InvalidName { .. })));
    }

    #[test]
    fn test_monoisotopic_mass() {
        let mass = monoisotopic_mass("H5N4", &glycan_blocks()).unwrap();
        assert!((mass - (5.0 * 162.0528234185 + 4.0 * 203.0793725207)).abs() < 1e-9);
    }

    #[test]
    fn test_unknown_block() {
        let err = monoisotopic_mass("H5F1", &glycan_blocks()).unwrap_err();
        assert_eq!(
            err,
            AnalyteError::UnknownBlock {
                analyte: "H5F1".to_string(),
                unit: "F".to_string()
            }
        );
    }

    #[test]
    fn test_variable_composition() {
        let composition = variable_composition("H5N4", &glycan_blocks()).unwrap();
        assert_eq!(composition.count(Element::Carbon), 62);
        assert_eq!(composition.count(Element::Hydrogen), 102);
        assert_eq!(composition.count(Element::Nitrogen), 4);
        assert_eq!(composition.count(Element::Oxygen), 45);
        assert_eq!(composition.count(Element::Sulfur), 0);
    }
}
