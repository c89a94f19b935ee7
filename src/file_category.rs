//! File categorization by extension.
//!
//! A fixed table maps an extension (with its leading dot, compared
//! case-sensitively) to a [`Category`]. Anything the table does not know,
//! including files without an extension, lands in [`Category::Others`].
//!
//! # Examples
//!
//! ```
//! use smart_organizer::file_category::{Category, classify};
//! use std::path::Path;
//!
//! assert_eq!(classify(Path::new("notes.txt")), Category::Documents);
//! assert_eq!(classify(Path::new("holiday.png")), Category::Images);
//! assert_eq!(classify(Path::new("data.xyz")), Category::Others);
//! ```

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

/// The bucket a file is sorted into.
///
/// The directory created under the target root carries the category label
/// verbatim (see [`Category::dir_name`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum Category {
    /// Text and office documents (TXT, DOCX, PDF)
    Documents,
    /// Raster images (JPG, PNG)
    Images,
    /// Video files (MP4)
    Videos,
    /// Audio files (MP3)
    Music,
    /// Log files
    Logs,
    /// Everything the table does not recognize
    Others,
}

impl Category {
    /// Every category, in table order.
    pub const ALL: [Category; 6] = [
        Category::Documents,
        Category::Images,
        Category::Videos,
        Category::Music,
        Category::Logs,
        Category::Others,
    ];

    /// Returns the directory name for this category.
    ///
    /// # Examples
    ///
    /// ```
    /// use smart_organizer::file_category::Category;
    ///
    /// assert_eq!(Category::Documents.dir_name(), "Documents");
    /// assert_eq!(Category::Others.dir_name(), "Others");
    /// ```
    pub fn dir_name(&self) -> &'static str {
        match self {
            Category::Documents => "Documents",
            Category::Images => "Images",
            Category::Videos => "Videos",
            Category::Music => "Music",
            Category::Logs => "Logs",
            Category::Others => "Others",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

static STANDARD_MAPPER: LazyLock<FileMapper> = LazyLock::new(FileMapper::new);

/// Maps file extensions to categories.
///
/// Keys include the leading separator (`".txt"`, not `"txt"`) and are matched
/// exactly, so `"REPORT.PDF"` is not a document.
#[derive(Debug, Clone)]
pub struct FileMapper {
    extension_map: HashMap<&'static str, Category>,
}

impl FileMapper {
    /// Builds a mapper holding the standard extension table.
    pub fn new() -> Self {
        let extension_map = [
            (".txt", Category::Documents),
            (".docx", Category::Documents),
            (".pdf", Category::Documents),
            (".jpg", Category::Images),
            (".png", Category::Images),
            (".mp4", Category::Videos),
            (".mp3", Category::Music),
            (".log", Category::Logs),
        ]
        .into_iter()
        .collect();

        Self { extension_map }
    }

    /// The process-wide mapper, built on first use and never modified.
    pub fn standard() -> &'static FileMapper {
        &STANDARD_MAPPER
    }

    /// Looks up an extension given with its leading dot.
    ///
    /// # Examples
    ///
    /// ```
    /// use smart_organizer::file_category::{Category, FileMapper};
    ///
    /// let mapper = FileMapper::standard();
    /// assert_eq!(mapper.extension_to_category(".mp3"), Some(Category::Music));
    /// assert_eq!(mapper.extension_to_category("mp3"), None);
    /// assert_eq!(mapper.extension_to_category(".MP3"), None);
    /// ```
    pub fn extension_to_category(&self, ext: &str) -> Option<Category> {
        self.extension_map.get(ext).copied()
    }

    /// Determines the category of a path from its final extension.
    pub fn categorize(&self, path: &Path) -> Category {
        extension_key(path)
            .and_then(|key| self.extension_to_category(&key))
            .unwrap_or(Category::Others)
    }
}

impl Default for FileMapper {
    fn default() -> Self {
        Self::new()
    }
}

/// Returns the extension of `path` with its leading dot, if it has one.
///
/// Dotfiles such as `.bashrc` have no extension; `file.` yields `"."`.
/// Extensions that are not valid UTF-8 yield `None`.
pub fn extension_key(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{ext}"))
}

/// Classifies a path with the standard table.
pub fn classify(path: &Path) -> Category {
    FileMapper::standard().categorize(path)
}
