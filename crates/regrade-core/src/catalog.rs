//! Scene catalog: the registry of scenes the harness knows how to grade.

use std::collections::HashSet;
use std::path::Path;

use crate::domain::{RegradeError, Result, SceneEntry, Tag};

const BUILTIN_SCENES: &[(&str, &[Tag])] = &[
    ("pbr_boombox-nonormals-direct", &[Tag::Pbr, Tag::Direct]),
    ("pbr_bunny", &[Tag::Pbr, Tag::Direct]),
    ("pbr_cube2", &[Tag::Pbr, Tag::Direct, Tag::Normals]),
    ("pbr_earth", &[Tag::Pbr, Tag::Direct]),
    ("pbr_robot", &[Tag::Pbr, Tag::Direct, Tag::Normals]),
    ("pbr_sphere-dielectric-direct-lights", &[Tag::Pbr, Tag::Direct]),
    ("pbr_sphere-dielectric-direct", &[Tag::Pbr, Tag::Direct]),
    ("pbr_sphere-metal-direct", &[Tag::Pbr, Tag::Direct]),
    ("pbr_boombox-normals-direct", &[Tag::Pbr, Tag::Direct, Tag::Normals]),
    ("pbr_boombox-normals-sampled", &[Tag::Pbr, Tag::Sampled, Tag::Normals]),
    ("pbr_boombox-nonormals-sampled", &[Tag::Pbr, Tag::Sampled]),
    ("matcap_bunny", &[Tag::Matcap]),
    ("matcap_head", &[Tag::Matcap]),
    ("matcap_sphere", &[Tag::Matcap]),
];

/// Ordered, immutable set of scenes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Catalog {
    entries: Vec<SceneEntry>,
}

impl Catalog {
    /// The stock scene set.
    pub fn builtin() -> Self {
        let entries = BUILTIN_SCENES
            .iter()
            .map(|(id, tags)| SceneEntry::new(*id, tags.iter().copied()))
            .collect();
        Self { entries }
    }

    /// Build a catalog from entries, rejecting empty or duplicate ids.
    pub fn from_entries(entries: Vec<SceneEntry>) -> Result<Self> {
        let mut seen = HashSet::new();
        for entry in &entries {
            if entry.id.trim().is_empty() {
                return Err(RegradeError::Catalog("scene id must not be empty".to_string()));
            }
            if !seen.insert(entry.id.as_str()) {
                return Err(RegradeError::Catalog(format!(
                    "duplicate scene id: {}",
                    entry.id
                )));
            }
        }
        Ok(Self { entries })
    }

    /// Load a catalog from a JSON array of `{"id": ..., "tags": [...]}`.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RegradeError::MissingPath {
                what: "catalog file",
                path: path.to_path_buf(),
            });
        }
        let raw = std::fs::read_to_string(path)?;
        let entries: Vec<SceneEntry> = serde_json::from_str(&raw)
            .map_err(|e| RegradeError::Catalog(format!("{}: {e}", path.display())))?;
        Self::from_entries(entries)
    }

    pub fn entries(&self) -> &[SceneEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_catalog_shape() {
        let catalog = Catalog::builtin();
        assert_eq!(catalog.len(), 14);
        assert_eq!(catalog.entries()[0].id, "pbr_boombox-nonormals-direct");
        assert_eq!(catalog.entries()[13].id, "matcap_sphere");

        let sampled = catalog
            .entries()
            .iter()
            .filter(|e| e.has_tag(Tag::Sampled))
            .count();
        assert_eq!(sampled, 2);

        let matcap = catalog
            .entries()
            .iter()
            .filter(|e| e.has_tag(Tag::Matcap))
            .count();
        assert_eq!(matcap, 3);
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let entries = vec![
            SceneEntry::new("pbr_bunny", [Tag::Pbr]),
            SceneEntry::new("pbr_bunny", [Tag::Direct]),
        ];
        let err = Catalog::from_entries(entries).unwrap_err();
        assert!(err.to_string().contains("duplicate scene id"));
    }

    #[test]
    fn test_from_json_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        std::fs::write(
            &path,
            r#"[{"id": "toon_cube", "tags": ["matcap"]}, {"id": "pbr_cube", "tags": ["pbr", "direct"]}]"#,
        )
        .expect("write");

        let catalog = Catalog::from_json_file(&path).expect("load");
        assert_eq!(catalog.len(), 2);
        assert!(catalog.entries()[0].has_tag(Tag::Matcap));
        assert!(catalog.entries()[1].has_tag(Tag::Direct));
    }

    #[test]
    fn test_from_json_file_rejects_unknown_tag() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("catalog.json");
        std::fs::write(&path, r#"[{"id": "x_y", "tags": ["shiny"]}]"#).expect("write");

        let err = Catalog::from_json_file(&path).unwrap_err();
        assert!(matches!(err, RegradeError::Catalog(_)));
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = Catalog::from_json_file(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(err.is_configuration());
    }
}
