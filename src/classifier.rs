//! Resolves file names to category names.

use crate::file_category::CategoryTable;

/// Category for every file whose extension no rule claims.
pub const FALLBACK_CATEGORY: &str = "Others";

/// Prefix marking a hidden file. Hidden files are never classified.
pub const HIDDEN_MARKER: char = '.';

/// Returns true if the file name is hidden and must be left alone.
pub fn is_hidden(file_name: &str) -> bool {
    file_name.starts_with(HIDDEN_MARKER)
}

/// Returns the lowercased extension of a file name, including its dot.
///
/// A name without a `.`, or ending in one, has the empty extension.
///
/// # Examples
///
/// ```
/// use foldertidy::classifier::extension_of;
///
/// assert_eq!(extension_of("Report.PDF"), ".pdf");
/// assert_eq!(extension_of("backup.tar.gz"), ".gz");
/// assert_eq!(extension_of("Makefile"), "");
/// assert_eq!(extension_of("draft."), "");
/// ```
pub fn extension_of(file_name: &str) -> String {
    match file_name.rfind('.') {
        Some(dot) if dot + 1 < file_name.len() => file_name[dot..].to_lowercase(),
        _ => String::new(),
    }
}

/// Classifies plain file names against an immutable category table.
#[derive(Debug, Clone, Default)]
pub struct Classifier {
    table: CategoryTable,
}

impl Classifier {
    pub fn new(table: CategoryTable) -> Self {
        Self { table }
    }

    pub fn table(&self) -> &CategoryTable {
        &self.table
    }

    /// Returns the category for a file name, or [`FALLBACK_CATEGORY`].
    ///
    /// The caller is expected to have filtered out hidden names and
    /// anything that is not a regular file.
    ///
    /// # Examples
    ///
    /// ```
    /// use foldertidy::classifier::Classifier;
    ///
    /// let classifier = Classifier::default();
    /// assert_eq!(classifier.classify("a.jpg"), "Images");
    /// assert_eq!(classifier.classify("notes.xyz"), "Others");
    /// ```
    pub fn classify(&self, file_name: &str) -> &str {
        self.table
            .lookup(&extension_of(file_name))
            .unwrap_or(FALLBACK_CATEGORY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::file_category::CategoryRule;

    #[test]
    fn test_classify_known_extensions() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("a.jpg"), "Images");
        assert_eq!(classifier.classify("b.pdf"), "Documents");
        assert_eq!(classifier.classify("main.rs"), "Code");
        assert_eq!(classifier.classify("setup.exe"), "Executables");
    }

    #[test]
    fn test_classify_is_case_insensitive() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("HOLIDAY.JPEG"), "Images");
    }

    #[test]
    fn test_unknown_extension_goes_to_others() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("data.xyz"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_no_extension_goes_to_others() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("README"), FALLBACK_CATEGORY);
        assert_eq!(classifier.classify("draft."), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_uses_final_suffix_only() {
        let classifier = Classifier::default();
        assert_eq!(classifier.classify("backup.tar.gz"), "Archives");
        assert_eq!(classifier.classify("photo.jpg.txt"), "Documents");
    }

    #[test]
    fn test_classify_is_deterministic() {
        let classifier = Classifier::default();
        for name in ["a.json", "b.csv", "c.deb", "d", "e.", "f.unknown"] {
            let first = classifier.classify(name).to_string();
            for _ in 0..5 {
                assert_eq!(classifier.classify(name), first);
            }
        }
    }

    #[test]
    fn test_custom_table_is_respected() {
        let classifier = Classifier::new(CategoryTable::new(vec![CategoryRule::new(
            "Ebooks",
            [".epub", ".mobi"],
            "",
        )]));
        assert_eq!(classifier.classify("novel.epub"), "Ebooks");
        assert_eq!(classifier.classify("a.jpg"), FALLBACK_CATEGORY);
    }

    #[test]
    fn test_hidden_marker() {
        assert!(is_hidden(".bashrc"));
        assert!(is_hidden(".hidden"));
        assert!(!is_hidden("visible.txt"));
    }

    #[test]
    fn test_extension_of_edge_cases() {
        assert_eq!(extension_of("a.JPG"), ".jpg");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(extension_of("trailing."), "");
        assert_eq!(extension_of("a.b.c"), ".c");
    }
}
