//! Scene identities: catalog entries and the tests selected from them.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::{Path, PathBuf};

/// Separator between a scene's category and the rest of its id.
pub const CATEGORY_SEPARATOR: char = '_';

/// Descriptive tag attached to a catalog scene.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Tag {
    /// Physically based shading.
    Pbr,
    /// Lit by direct (punctual) lights only.
    Direct,
    /// Lit by sampling an environment map.
    Sampled,
    /// Uses tangent-space normal maps.
    Normals,
    /// Material-capture shading.
    Matcap,
}

impl Tag {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tag::Pbr => "pbr",
            Tag::Direct => "direct",
            Tag::Sampled => "sampled",
            Tag::Normals => "normals",
            Tag::Matcap => "matcap",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scene registered in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SceneEntry {
    /// Scene identifier, also the stem of its spec and image files.
    pub id: String,

    /// Tag set; membership is exact, never substring.
    pub tags: BTreeSet<Tag>,
}

impl SceneEntry {
    pub fn new(id: impl Into<String>, tags: impl IntoIterator<Item = Tag>) -> Self {
        Self {
            id: id.into(),
            tags: tags.into_iter().collect(),
        }
    }

    pub fn has_tag(&self, tag: Tag) -> bool {
        self.tags.contains(&tag)
    }
}

/// A scene chosen for this run, with the spec file the renderer consumes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SelectedTest {
    pub id: String,
    pub spec_path: PathBuf,
}

impl SelectedTest {
    /// Build a selected test whose spec lives at `<examples_dir>/<id>.json`.
    pub fn from_entry(entry: &SceneEntry, examples_dir: &Path) -> Self {
        Self {
            id: entry.id.clone(),
            spec_path: examples_dir.join(format!("{}.json", entry.id)),
        }
    }

    /// Report category: the id prefix before the first separator.
    pub fn category(&self) -> &str {
        category_of(&self.id)
    }

    /// File name of the frame the renderer writes for this test.
    pub fn output_file_name(&self) -> String {
        format!("{}.png", self.id)
    }

    /// File name of the visualised difference image.
    pub fn diff_file_name(&self) -> String {
        format!("{}-diff.png", self.id)
    }
}

/// Category of a scene id. An id without separator is its own category.
pub fn category_of(id: &str) -> &str {
    id.split(CATEGORY_SEPARATOR).next().unwrap_or(id)
}
