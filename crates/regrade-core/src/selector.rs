//! Test selection: which catalog scenes run, in catalog order.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::catalog::Catalog;
use crate::domain::{SceneEntry, SelectedTest, Tag};

/// A predicate that pulls scenes into the run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Inclusion {
    /// Every scene.
    All,
    /// Every scene not tagged `sampled`.
    AllButSampling,
    /// Scenes carrying this tag.
    HasTag(Tag),
}

impl Inclusion {
    pub fn matches(&self, entry: &SceneEntry) -> bool {
        match self {
            Inclusion::All => true,
            Inclusion::AllButSampling => !entry.has_tag(Tag::Sampled),
            Inclusion::HasTag(tag) => entry.has_tag(*tag),
        }
    }
}

/// Inclusion predicates (OR'd) plus an optional id substring filter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    pub inclusions: Vec<Inclusion>,
    pub filter: Option<String>,
}

impl Selection {
    pub fn new(inclusions: Vec<Inclusion>) -> Self {
        Self {
            inclusions,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }

    fn includes(&self, entry: &SceneEntry) -> bool {
        self.inclusions.iter().any(|inc| inc.matches(entry))
    }

    fn passes_filter(&self, entry: &SceneEntry) -> bool {
        match &self.filter {
            Some(needle) => entry.id.contains(needle.as_str()),
            None => true,
        }
    }
}

/// Select the tests to run.
///
/// The filter only narrows what the inclusions already picked. No inclusions
/// or no matches yields an empty list.
pub fn select(catalog: &Catalog, selection: &Selection, examples_dir: &Path) -> Vec<SelectedTest> {
    catalog
        .entries()
        .iter()
        .filter(|entry| selection.includes(entry) && selection.passes_filter(entry))
        .map(|entry| SelectedTest::from_entry(entry, examples_dir))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(tests: &[SelectedTest]) -> Vec<&str> {
        tests.iter().map(|t| t.id.as_str()).collect()
    }

    #[test]
    fn test_no_inclusions_selects_nothing() {
        let selected = select(&Catalog::builtin(), &Selection::default(), Path::new("."));
        assert!(selected.is_empty());
    }

    #[test]
    fn test_filter_alone_selects_nothing() {
        let selection = Selection::default().with_filter("bunny");
        let selected = select(&Catalog::builtin(), &selection, Path::new("."));
        assert!(selected.is_empty());
    }

    #[test]
    fn test_all_selects_catalog_order() {
        let catalog = Catalog::builtin();
        let selected = select(&catalog, &Selection::new(vec![Inclusion::All]), Path::new("."));
        let expected: Vec<&str> = catalog.entries().iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids(&selected), expected);
    }

    #[test]
    fn test_all_but_sampling_excludes_sampled() {
        let selected = select(
            &Catalog::builtin(),
            &Selection::new(vec![Inclusion::AllButSampling]),
            Path::new("."),
        );
        assert_eq!(selected.len(), 12);
        assert!(selected.iter().all(|t| !t.id.ends_with("-sampled")));
    }

    #[test]
    fn test_matcap_only() {
        let selected = select(
            &Catalog::builtin(),
            &Selection::new(vec![Inclusion::HasTag(Tag::Matcap)]),
            Path::new("/ex"),
        );
        assert_eq!(ids(&selected), vec!["matcap_bunny", "matcap_head", "matcap_sphere"]);
        assert_eq!(
            selected[0].spec_path,
            std::path::PathBuf::from("/ex/matcap_bunny.json")
        );
    }

    #[test]
    fn test_inclusions_are_ored_without_duplicates() {
        let selected = select(
            &Catalog::builtin(),
            &Selection::new(vec![
                Inclusion::HasTag(Tag::Normals),
                Inclusion::HasTag(Tag::Sampled),
            ]),
            Path::new("."),
        );
        assert_eq!(
            ids(&selected),
            vec![
                "pbr_cube2",
                "pbr_robot",
                "pbr_boombox-normals-direct",
                "pbr_boombox-normals-sampled",
                "pbr_boombox-nonormals-sampled",
            ]
        );
    }

    #[test]
    fn test_filter_narrows_only() {
        let catalog = Catalog::builtin();
        let base = Selection::new(vec![Inclusion::HasTag(Tag::Direct)]);
        let unfiltered = select(&catalog, &base, Path::new("."));
        let filtered = select(&catalog, &base.clone().with_filter("boombox"), Path::new("."));

        assert_eq!(
            ids(&filtered),
            vec!["pbr_boombox-nonormals-direct", "pbr_boombox-normals-direct"]
        );
        assert!(filtered.iter().all(|t| unfiltered.contains(t)));
    }
}
