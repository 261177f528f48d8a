use common::Venue;
use connector::PerpDexEntry;

use crate::registry::RefreshWarning;

/// Ordered venue table: the implicit primary venue followed by each
/// deployed venue from the raw listing.
#[derive(Clone, Debug)]
pub struct VenueCatalog {
    venues: Vec<Venue>,
}

impl Default for VenueCatalog {
    fn default() -> Self {
        Self {
            venues: vec![Venue::primary()],
        }
    }
}

impl VenueCatalog {
    /// Build from the raw venue listing. Null entries mark the implicit
    /// primary venue and are skipped when assigning offsets; a repeated
    /// name is surfaced as a warning and the first occurrence wins.
    pub fn build(entries: &[Option<PerpDexEntry>], warnings: &mut Vec<RefreshWarning>) -> Self {
        let mut venues = vec![Venue::primary()];
        let mut venue_index = 0u32;
        for entry in entries.iter().flatten() {
            if venues.iter().any(|v| v.name == entry.name) {
                warnings.push(RefreshWarning::DuplicateVenue {
                    name: entry.name.clone(),
                });
                continue;
            }
            venue_index += 1;
            venues.push(Venue {
                name: entry.name.clone(),
                full_name: entry.full_name.clone(),
                venue_index,
                offset: Venue::offset_for(venue_index),
            });
        }
        Self { venues }
    }

    pub fn primary(&self) -> &Venue {
        &self.venues[0]
    }

    /// Deployed venues only, in offset order.
    pub fn deployed(&self) -> impl Iterator<Item = &Venue> {
        self.venues.iter().skip(1)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Venue> {
        self.venues.iter()
    }

    pub fn get(&self, name: &str) -> Option<&Venue> {
        self.venues.iter().find(|v| v.name == name)
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(name: &str) -> Option<PerpDexEntry> {
        Some(PerpDexEntry {
            name: name.to_string(),
            full_name: format!("{name} markets"),
        })
    }

    #[test]
    fn offsets_skip_the_null_primary_slot() {
        let mut warnings = Vec::new();
        let catalog = VenueCatalog::build(&[None, entry("alpha"), entry("beta")], &mut warnings);

        assert!(warnings.is_empty());
        assert_eq!(catalog.len(), 3);
        assert_eq!(catalog.primary().offset, 0);
        assert_eq!(catalog.primary().venue_index, 0);

        let alpha = catalog.get("alpha").unwrap();
        assert_eq!(alpha.venue_index, 1);
        assert_eq!(alpha.offset, 110_000);

        let beta = catalog.get("beta").unwrap();
        assert_eq!(beta.venue_index, 2);
        assert_eq!(beta.offset, 120_000);
    }

    #[test]
    fn offsets_strictly_increase() {
        let mut warnings = Vec::new();
        let catalog = VenueCatalog::build(
            &[None, entry("a"), entry("b"), entry("c")],
            &mut warnings,
        );
        let offsets: Vec<u32> = catalog.deployed().map(|v| v.offset).collect();
        assert_eq!(offsets, vec![110_000, 120_000, 130_000]);
    }

    #[test]
    fn duplicate_names_keep_the_first_occurrence() {
        let mut warnings = Vec::new();
        let catalog = VenueCatalog::build(
            &[None, entry("alpha"), entry("alpha"), entry("beta")],
            &mut warnings,
        );

        assert_eq!(
            warnings,
            vec![RefreshWarning::DuplicateVenue {
                name: "alpha".to_string()
            }]
        );
        assert_eq!(catalog.len(), 3);
        // the duplicate does not consume an index
        assert_eq!(catalog.get("beta").unwrap().venue_index, 2);
    }
}
