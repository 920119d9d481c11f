use std::collections::BTreeMap;

use crate::isotopes::Element;

use super::{Block, BlockError};

/// Parse the contents of one `.block` file.
///
/// Lines are `key: value`; blank lines and lines starting with `#` are
/// skipped. `mass` is required, `charge` must be an integer and every other
/// key must be a plural element name with a non-negative integer count.
pub fn parse_block(name: &str, content: &str) -> Result<Block, BlockError> {
    let mut mass = None;
    let mut charge = None;
    let mut elements = BTreeMap::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }

        let (key, value) = trimmed
            .split_once(':')
            .ok_or_else(|| BlockError::MalformedLine {
                block: name.to_string(),
                line: trimmed.to_string(),
            })?;
        let key = key.trim();
        let value = value.trim();
        let invalid = || BlockError::InvalidValue {
            block: name.to_string(),
            key: key.to_string(),
            value: value.to_string(),
        };

        match key {
            "mass" => {
                let parsed: f64 = value.parse().map_err(|_| invalid())?;
                if !parsed.is_finite() {
                    return Err(invalid());
                }
                mass = Some(parsed);
            }
            "charge" => {
                charge = Some(value.parse::<i32>().map_err(|_| invalid())?);
            }
            other => {
                let element =
                    Element::from_block_key(other).ok_or_else(|| BlockError::UnknownKey {
                        block: name.to_string(),
                        key: other.to_string(),
                    })?;
                let count: u32 = value.parse().map_err(|_| invalid())?;
                elements.insert(element, count);
            }
        }
    }

    let mass = mass.ok_or_else(|| BlockError::MissingMass(name.to_string()))?;
    Ok(Block {
        name: name.to_string(),
        mass,
        charge,
        elements,
    })
}
