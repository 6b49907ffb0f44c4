//! Media classification: which category a source file falls into and which
//! output filename it produces.
//!
//! Classification is a pure function of the filename. Whether an entry is a
//! directory is decided by the caller before a name ever reaches
//! [`Classifier::classify`].

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::config::SyncConfig;

/// Extension of every transcoded video output.
pub const VIDEO_OUTPUT_EXTENSION: &str = "webm";

/// Extension of every transcoded image output.
pub const IMAGE_OUTPUT_EXTENSION: &str = "webp";

// ---------------------------------------------------------------------------
// Category
// ---------------------------------------------------------------------------

/// Processing strategy for a source file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    /// Transcoded to a single `.webm` output.
    Video,
    /// Transcoded to a single `.webp` output.
    ConvertibleImage,
    /// Copied unchanged under the same name.
    PassThrough,
    /// Excluded from all processing.
    Ignored,
}

impl Category {
    /// How the output of this category is produced, or `None` for
    /// [`Category::Ignored`].
    pub fn output_class(self) -> Option<OutputClass> {
        match self {
            Self::Video | Self::ConvertibleImage => Some(OutputClass::Transcode),
            Self::PassThrough => Some(OutputClass::Copy),
            Self::Ignored => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Video => write!(f, "video"),
            Self::ConvertibleImage => write!(f, "image"),
            Self::PassThrough => write!(f, "passthrough"),
            Self::Ignored => write!(f, "ignored"),
        }
    }
}

// ---------------------------------------------------------------------------
// OutputClass
// ---------------------------------------------------------------------------

/// Whether an output is produced by an external transcode or by a copy.
///
/// The two classes use different comparisons when deciding whether an
/// existing output is still current.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputClass {
    Transcode,
    Copy,
}

// ---------------------------------------------------------------------------
// SourceFile
// ---------------------------------------------------------------------------

/// One classified entry of the intake directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Filename including extension.
    pub name: String,
    /// Lower-cased extension without the leading dot (empty if none).
    pub extension: String,
    /// Derived from `extension`.
    pub category: Category,
}

impl SourceFile {
    /// The output filename this source maps to, or `None` when ignored.
    ///
    /// Videos become `<base>.webm`, convertible images `<base>.webp`, and
    /// pass-through files keep their name.
    pub fn output_name(&self) -> Option<String> {
        let base = || {
            Path::new(&self.name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| self.name.clone())
        };

        match self.category {
            Category::Video => Some(format!("{}.{VIDEO_OUTPUT_EXTENSION}", base())),
            Category::ConvertibleImage => Some(format!("{}.{IMAGE_OUTPUT_EXTENSION}", base())),
            Category::PassThrough => Some(self.name.clone()),
            Category::Ignored => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Classifier
// ---------------------------------------------------------------------------

/// Maps filenames to categories using configured extension sets.
#[derive(Debug, Clone)]
pub struct Classifier {
    video: BTreeSet<String>,
    image: BTreeSet<String>,
    passthrough: BTreeSet<String>,
}

impl Classifier {
    /// Build a classifier from raw extension lists.
    ///
    /// Extensions are normalised (leading dot stripped, lower-cased).
    /// `passthrough` entries only take effect for extensions that are also in
    /// `image`; image extensions outside it are convertible.
    pub fn new<S: AsRef<str>>(video: &[S], image: &[S], passthrough: &[S]) -> Self {
        Self {
            video: normalize_all(video),
            image: normalize_all(image),
            passthrough: normalize_all(passthrough),
        }
    }

    /// Build a classifier from the `sync` configuration section.
    pub fn from_config(config: &SyncConfig) -> Self {
        Self::new(
            &config.video_extensions,
            &config.image_extensions,
            &config.passthrough_extensions,
        )
    }

    /// Classify a filename.
    ///
    /// Hidden files (leading `.`), names denoting a directory (trailing `/`),
    /// and unrecognised extensions are [`Category::Ignored`]. Video
    /// extensions take precedence if a configuration lists an extension in
    /// both sets.
    pub fn classify(&self, filename: &str) -> Category {
        if filename.is_empty() || filename.starts_with('.') || filename.ends_with('/') {
            return Category::Ignored;
        }

        let ext = extension_of(filename);
        if ext.is_empty() {
            Category::Ignored
        } else if self.video.contains(&ext) {
            Category::Video
        } else if self.image.contains(&ext) {
            if self.passthrough.contains(&ext) {
                Category::PassThrough
            } else {
                Category::ConvertibleImage
            }
        } else {
            Category::Ignored
        }
    }

    /// Classify a filename and bundle the result as a [`SourceFile`].
    pub fn source(&self, filename: &str) -> SourceFile {
        SourceFile {
            name: filename.to_string(),
            extension: extension_of(filename),
            category: self.classify(filename),
        }
    }
}

impl Default for Classifier {
    fn default() -> Self {
        Self::from_config(&SyncConfig::default())
    }
}

/// Normalise a configured extension: strip a leading dot and lower-case.
pub fn normalize_extension(ext: &str) -> String {
    ext.trim().trim_start_matches('.').to_lowercase()
}

fn normalize_all<S: AsRef<str>>(exts: &[S]) -> BTreeSet<String> {
    exts.iter()
        .map(|e| normalize_extension(e.as_ref()))
        .filter(|e| !e.is_empty())
        .collect()
}

fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn output_of(classifier: &Classifier, name: &str) -> Option<String> {
        classifier.source(name).output_name()
    }

    #[test]
    fn video_extensions_map_to_webm() {
        let c = Classifier::default();
        for ext in ["mp4", "webm", "mov", "avi", "mkv", "mpeg", "ts"] {
            let name = format!("clip.{ext}");
            assert_eq!(c.classify(&name), Category::Video, "{name}");
            assert_eq!(output_of(&c, &name).as_deref(), Some("clip.webm"));
        }
    }

    #[test]
    fn convertible_images_map_to_webp() {
        let c = Classifier::default();
        for ext in ["jpg", "jpeg", "png"] {
            let name = format!("dog.{ext}");
            assert_eq!(c.classify(&name), Category::ConvertibleImage, "{name}");
            assert_eq!(output_of(&c, &name).as_deref(), Some("dog.webp"));
        }
    }

    #[test]
    fn passthrough_keeps_name() {
        let c = Classifier::default();
        assert_eq!(c.classify("party.gif"), Category::PassThrough);
        assert_eq!(output_of(&c, "party.gif").as_deref(), Some("party.gif"));
        assert_eq!(c.classify("Sticker.WEBP"), Category::PassThrough);
        assert_eq!(output_of(&c, "Sticker.WEBP").as_deref(), Some("Sticker.WEBP"));
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let c = Classifier::default();
        assert_eq!(c.classify("HOLIDAY.MP4"), Category::Video);
        assert_eq!(output_of(&c, "HOLIDAY.MP4").as_deref(), Some("HOLIDAY.webm"));
        assert_eq!(c.source("Dog.JpEg").extension, "jpeg");
    }

    #[test]
    fn only_last_extension_is_replaced() {
        let c = Classifier::default();
        assert_eq!(output_of(&c, "a.b.c.png").as_deref(), Some("a.b.c.webp"));
    }

    #[test]
    fn ignored_names() {
        let c = Classifier::default();
        assert_eq!(c.classify(".DS_Store"), Category::Ignored);
        assert_eq!(c.classify(".hidden.mp4"), Category::Ignored);
        assert_eq!(c.classify("notes.txt"), Category::Ignored);
        assert_eq!(c.classify("README"), Category::Ignored);
        assert_eq!(c.classify("trailing."), Category::Ignored);
        assert_eq!(c.classify("folder.mp4/"), Category::Ignored);
        assert_eq!(c.classify(""), Category::Ignored);
        assert_eq!(output_of(&c, "notes.txt"), None);
    }

    #[test]
    fn configured_extensions_are_normalised() {
        let c = Classifier::new(&[".MKV"], &["PNG", ".Gif"], &["gif"]);
        assert_eq!(c.classify("a.mkv"), Category::Video);
        assert_eq!(c.classify("a.mp4"), Category::Ignored);
        assert_eq!(c.classify("a.png"), Category::ConvertibleImage);
        assert_eq!(c.classify("a.gif"), Category::PassThrough);
    }

    #[test]
    fn passthrough_outside_image_set_is_ignored() {
        let c = Classifier::new(&["mp4"], &["png"], &["gif"]);
        assert_eq!(c.classify("a.gif"), Category::Ignored);
    }

    #[test]
    fn output_class_per_category() {
        assert_eq!(Category::Video.output_class(), Some(OutputClass::Transcode));
        assert_eq!(
            Category::ConvertibleImage.output_class(),
            Some(OutputClass::Transcode)
        );
        assert_eq!(Category::PassThrough.output_class(), Some(OutputClass::Copy));
        assert_eq!(Category::Ignored.output_class(), None);
    }

    #[test]
    fn category_display() {
        assert_eq!(Category::Video.to_string(), "video");
        assert_eq!(Category::ConvertibleImage.to_string(), "image");
        assert_eq!(Category::PassThrough.to_string(), "passthrough");
    }
}
