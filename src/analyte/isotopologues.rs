//! Theoretical isotopologue ladders.
//!
//! Heavy-isotope incorporation per element follows a binomial distribution.
//! The per-isotope distributions are combined over their Cartesian product,
//! masses closer than the instrument resolution are pooled, and the most
//! probable pooled masses are kept until the requested isotopic fraction is
//! covered.

use serde::Serialize;

use crate::isotopes::Element;

use super::Composition;

/// Masses closer than this (Da) are not resolved by the instrument
pub const MERGE_EPSILON: f64 = 0.5;

/// Probability at or below which a decreasing binomial tail is cut off
const NEGLIGIBLE_PROBABILITY: f64 = 0.001;

/// One pooled isotopic variant of a molecule
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Isotopologue {
    /// Neutral mass (Da)
    pub mass: f64,
    /// Fraction of all molecules with this mass
    pub probability: f64,
    /// Position in the full mass-ordered ladder; 0 is monoisotopic
    pub index: usize,
}

/// Heavy-isotope incorporation for one heavy isotope of an element
#[derive(Debug, Clone, PartialEq)]
pub struct HeavyIsotopeDistribution {
    pub isotope: &'static str,
    /// `(mass difference, probability)` for 0, 1, 2, ... heavy atoms
    pub terms: Vec<(f64, f64)>,
}

/// Binomial distribution of heavy-isotope counts among `atoms` atoms of `element`.
///
/// Returns one distribution per non-lightest isotope. Each list grows from
/// zero substitutions until a probability is at or below 0.001 and lower than
/// the one before it; that last term is kept.
pub fn heavy_isotope_distribution(element: Element, atoms: u64) -> Vec<HeavyIsotopeDistribution> {
    let isotopes = element.isotopes();
    let light_mass = isotopes[0].mass;

    isotopes[1..]
        .iter()
        .map(|isotope| {
            let p = isotope.abundance;
            let mut terms = Vec::new();
            let mut coefficient = 1.0_f64;
            let mut last_probability = 0.0;

            for n in 0..=atoms {
                if n > 0 {
                    coefficient = coefficient * (atoms - n + 1) as f64 / n as f64;
                }
                let probability =
                    coefficient * p.powi(n as i32) * (1.0 - p).powi((atoms - n) as i32);
                terms.push(((isotope.mass - light_mass) * n as f64, probability));

                if probability <= NEGLIGIBLE_PROBABILITY && probability < last_probability {
                    break;
                }
                last_probability = probability;
            }

            HeavyIsotopeDistribution {
                isotope: isotope.id,
                terms,
            }
        })
        .collect()
}

/// Pool `(mass, probability)` pairs whose masses are closer than `epsilon`.
///
/// Pairs are sorted by mass and a new group starts wherever the gap to the
/// previous mass is at least `epsilon`. Each group becomes its
/// probability-weighted mean mass with the summed probability.
pub fn merge_isotopic_masses(mass_probs: &[(f64, f64)], epsilon: f64) -> Vec<(f64, f64)> {
    let mut sorted = mass_probs.to_vec();
    sorted.sort_by(|a, b| a.0.total_cmp(&b.0));

    let mut merged = Vec::new();
    let mut group: Vec<(f64, f64)> = Vec::new();
    for pair in sorted {
        if let Some(last) = group.last() {
            if pair.0 - last.0 >= epsilon {
                merged.push(pool(&group));
                group.clear();
            }
        }
        group.push(pair);
    }
    if !group.is_empty() {
        merged.push(pool(&group));
    }
    merged
}

fn pool(group: &[(f64, f64)]) -> (f64, f64) {
    let total: f64 = group.iter().map(|(_, p)| p).sum();
    let mass = if total > 0.0 {
        group.iter().map(|(m, p)| m * p).sum::<f64>() / total
    } else {
        group.iter().map(|(m, _)| m).sum::<f64>() / group.len() as f64
    };
    (mass, total)
}

/// Keep the most probable entries until their summed probability exceeds
/// `min_isotopic_fraction`, returned in ascending mass order.
///
/// `merged` must be mass ordered; each entry's index is its position there.
pub fn select_isotopologues(merged: &[(f64, f64)], min_isotopic_fraction: f64) -> Vec<Isotopologue> {
    let mut ranked: Vec<Isotopologue> = merged
        .iter()
        .enumerate()
        .map(|(index, &(mass, probability))| Isotopologue {
            mass,
            probability,
            index,
        })
        .collect();
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    let mut selected = Vec::new();
    let mut contribution = 0.0;
    for isotopologue in ranked {
        contribution += isotopologue.probability;
        selected.push(isotopologue);
        if contribution > min_isotopic_fraction {
            break;
        }
    }

    selected.sort_by(|a, b| a.mass.total_cmp(&b.mass));
    selected
}

/// All heavy-isotope combinations of `composition` as `(mass, probability)` pairs
pub fn isotopic_combinations(monoisotopic_mass: f64, composition: &Composition) -> Vec<(f64, f64)> {
    let mut combinations = vec![(monoisotopic_mass, 1.0)];
    for element in Element::VARIABLE {
        for distribution in heavy_isotope_distribution(element, composition.count(element)) {
            let mut next = Vec::with_capacity(combinations.len() * distribution.terms.len());
            for &(mass, probability) in &combinations {
                for &(diff, p) in &distribution.terms {
                    next.push((mass + diff, probability * p));
                }
            }
            combinations = next;
        }
    }
    combinations
}

/// Selected isotopologues of a molecule
pub fn isotopologues(
    monoisotopic_mass: f64,
    composition: &Composition,
    min_isotopic_fraction: f64,
) -> Vec<Isotopologue> {
    let combinations = isotopic_combinations(monoisotopic_mass, composition);
    let merged = merge_isotopic_masses(&combinations, MERGE_EPSILON);
    select_isotopologues(&merged, min_isotopic_fraction)
}
