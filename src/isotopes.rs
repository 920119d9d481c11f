//! Natural isotope masses and abundances.
//!
//! Values follow the NIST "Atomic Weights and Isotopic Compositions" tables.
//! Every element lists its isotopes from light to heavy; the first entry is the
//! isotope the monoisotopic mass of a molecule is built from.

use std::fmt;
use std::str::FromStr;

/// One stable isotope of an element
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Isotope {
    /// Isotope label, e.g. `C13`
    pub id: &'static str,
    /// Exact mass (Da)
    pub mass: f64,
    /// Natural abundance as a fraction
    pub abundance: f64,
}

const fn iso(id: &'static str, mass: f64, abundance: f64) -> Isotope {
    Isotope { id, mass, abundance }
}

const CARBON: &[Isotope] = &[
    iso("C12", 12.000000000, 0.9893),
    iso("C13", 13.003354835, 0.0107),
];
const HYDROGEN: &[Isotope] = &[
    iso("H1", 1.007825032, 0.999885),
    iso("H2", 2.014101778, 0.000115),
];
const NITROGEN: &[Isotope] = &[
    iso("N14", 14.003074004, 0.99636),
    iso("N15", 15.000108899, 0.00364),
];
const OXYGEN: &[Isotope] = &[
    iso("O16", 15.994914620, 0.99757),
    iso("O17", 16.999131757, 0.00038),
    iso("O18", 17.999159613, 0.00205),
];
const SULFUR: &[Isotope] = &[
    iso("S32", 31.972071174, 0.9499),
    iso("S33", 32.971458910, 0.0075),
    iso("S34", 33.967867004, 0.0425),
    iso("S36", 35.96708071, 0.0001),
];
const SODIUM: &[Isotope] = &[iso("Na23", 22.989769282, 1.0)];
const POTASSIUM: &[Isotope] = &[
    iso("K39", 38.963706486, 0.93258),
    iso("K40", 39.96399817, 0.00012),
    iso("K41", 40.961825258, 0.06730),
];
const IRON: &[Isotope] = &[
    iso("Fe54", 53.9396090, 0.05845),
    iso("Fe56", 55.9349363, 0.91754),
    iso("Fe57", 56.9353928, 0.02119),
    iso("Fe58", 57.9332744, 0.00282),
];
const FLUORINE: &[Isotope] = &[iso("F19", 18.998403163, 1.0)];
const CHLORINE: &[Isotope] = &[
    iso("Cl35", 34.96885268, 0.7576),
    iso("Cl37", 36.96590260, 0.2424),
];

/// Elements with tabulated isotope data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Element {
    Carbon,
    Hydrogen,
    Nitrogen,
    Oxygen,
    Sulfur,
    Sodium,
    Potassium,
    Iron,
    Fluorine,
    Chlorine,
}

impl Element {
    /// Elements whose atom counts can be declared in a block file, in the
    /// order isotopologue combinations are expanded.
    pub const VARIABLE: [Element; 8] = [
        Element::Carbon,
        Element::Hydrogen,
        Element::Nitrogen,
        Element::Oxygen,
        Element::Sulfur,
        Element::Sodium,
        Element::Potassium,
        Element::Iron,
    ];

    /// Isotopes of this element, lightest first
    pub fn isotopes(&self) -> &'static [Isotope] {
        match self {
            Element::Carbon => CARBON,
            Element::Hydrogen => HYDROGEN,
            Element::Nitrogen => NITROGEN,
            Element::Oxygen => OXYGEN,
            Element::Sulfur => SULFUR,
            Element::Sodium => SODIUM,
            Element::Potassium => POTASSIUM,
            Element::Iron => IRON,
            Element::Fluorine => FLUORINE,
            Element::Chlorine => CHLORINE,
        }
    }

    /// Lower-case element name (`carbon`, `hydrogen`, ...)
    pub fn name(&self) -> &'static str {
        match self {
            Element::Carbon => "carbon",
            Element::Hydrogen => "hydrogen",
            Element::Nitrogen => "nitrogen",
            Element::Oxygen => "oxygen",
            Element::Sulfur => "sulfur",
            Element::Sodium => "sodium",
            Element::Potassium => "potassium",
            Element::Iron => "iron",
            Element::Fluorine => "fluorine",
            Element::Chlorine => "chlorine",
        }
    }

    /// Plural key used in block files (`carbons`, `hydrogens`, ...)
    pub fn block_key(&self) -> String {
        format!("{}s", self.name())
    }

    /// Resolve a plural block-file key back to its element
    pub fn from_block_key(key: &str) -> Option<Self> {
        key.strip_suffix('s').and_then(|name| name.parse().ok())
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Element {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "carbon" => Ok(Element::Carbon),
            "hydrogen" => Ok(Element::Hydrogen),
            "nitrogen" => Ok(Element::Nitrogen),
            "oxygen" => Ok(Element::Oxygen),
            "sulfur" => Ok(Element::Sulfur),
            "sodium" => Ok(Element::Sodium),
            "potassium" => Ok(Element::Potassium),
            "iron" => Ok(Element::Iron),
            "fluorine" => Ok(Element::Fluorine),
            "chlorine" => Ok(Element::Chlorine),
            other => Err(format!("unknown element '{}'", other)),
        }
    }
}

/// Mass difference between carbon-13 and carbon-12 (Da)
pub fn c13_c12_mass_diff() -> f64 {
    CARBON[1].mass - CARBON[0].mass
}
