/// Category table mapping file extensions to category names.
///
/// The table is an ordered list of [`CategoryRule`]s supplied at
/// construction. Lookups are case-insensitive and, should two rules ever
/// declare the same extension, the rule declared first wins.
///
/// # Examples
///
/// ```
/// use foldertidy::file_category::CategoryTable;
///
/// let table = CategoryTable::default();
/// assert_eq!(table.lookup(".jpg"), Some("Images"));
/// assert_eq!(table.lookup("PDF"), Some("Documents"));
/// assert_eq!(table.lookup(".xyz"), None);
/// ```
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// A named bucket and the extensions that belong to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryRule {
    name: String,
    extensions: BTreeSet<String>,
    #[serde(default)]
    description: String,
}

impl CategoryRule {
    /// Creates a rule, normalizing every extension to lowercase with a
    /// leading `.`. Empty extensions are dropped.
    ///
    /// # Examples
    ///
    /// ```
    /// use foldertidy::file_category::CategoryRule;
    ///
    /// let rule = CategoryRule::new("Images", ["JPG", ".png"], "Pictures");
    /// assert!(rule.extensions().contains(".jpg"));
    /// assert!(rule.extensions().contains(".png"));
    /// ```
    pub fn new<I, S>(name: impl Into<String>, extensions: I, description: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            name: name.into(),
            extensions: extensions
                .into_iter()
                .filter_map(|ext| normalize_extension(ext.as_ref()))
                .collect(),
            description: description.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn extensions(&self) -> &BTreeSet<String> {
        &self.extensions
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Re-applies extension normalization, for rules that came from a
    /// deserializer rather than [`CategoryRule::new`].
    pub(crate) fn normalized(self) -> Self {
        Self::new(self.name, self.extensions, self.description)
    }
}

/// Lowercases an extension and ensures it starts with a single `.`.
/// Returns `None` for an empty extension.
fn normalize_extension(ext: &str) -> Option<String> {
    let trimmed = ext.trim().trim_start_matches('.');
    if trimmed.is_empty() {
        None
    } else {
        Some(format!(".{}", trimmed.to_lowercase()))
    }
}

/// Ordered, immutable extension → category mapping.
#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CategoryRule>,
    index: HashMap<String, usize>,
}

impl CategoryTable {
    /// Builds a table from rules in priority order.
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let mut index = HashMap::new();
        for (position, rule) in rules.iter().enumerate() {
            for ext in &rule.extensions {
                // Declaration order wins on overlap.
                index.entry(ext.clone()).or_insert(position);
            }
        }
        Self { rules, index }
    }

    /// Looks up the category owning an extension.
    ///
    /// The extension may be given with or without its leading dot and in
    /// any case. An empty extension never matches.
    pub fn lookup(&self, extension: &str) -> Option<&str> {
        let key = normalize_extension(extension)?;
        self.index
            .get(&key)
            .map(|&position| self.rules[position].name())
    }

    /// Rules in priority order.
    pub fn rules(&self) -> &[CategoryRule] {
        &self.rules
    }

    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(CategoryRule::name)
    }

    /// The built-in rules, in priority order.
    pub fn standard_rules() -> Vec<CategoryRule> {
        vec![
            CategoryRule::new(
                "Documents",
                [
                    ".pdf", ".doc", ".docx", ".txt", ".rtf", ".odt", ".xls", ".xlsx", ".ppt",
                    ".pptx", ".odp", ".ods", ".csv", ".md", ".tex", ".epub", ".mobi",
                ],
                "Documents and text files",
            ),
            CategoryRule::new(
                "Images",
                [
                    ".jpg", ".jpeg", ".png", ".gif", ".bmp", ".tiff", ".tif", ".svg", ".webp",
                    ".ico", ".raw", ".psd", ".ai", ".eps", ".heic",
                ],
                "Images and graphics",
            ),
            CategoryRule::new(
                "Videos",
                [
                    ".mp4", ".avi", ".mkv", ".mov", ".wmv", ".flv", ".webm", ".m4v", ".3gp",
                    ".mpg", ".mpeg", ".m2v", ".mts",
                ],
                "Video files",
            ),
            CategoryRule::new(
                "Audio",
                [
                    ".mp3", ".wav", ".flac", ".aac", ".ogg", ".wma", ".m4a", ".opus", ".aiff",
                    ".au", ".ra", ".amr",
                ],
                "Audio files",
            ),
            CategoryRule::new(
                "Archives",
                [
                    ".zip", ".rar", ".7z", ".tar", ".gz", ".bz2", ".xz", ".tgz", ".deb", ".rpm",
                ],
                "Compressed archives",
            ),
            CategoryRule::new(
                "Code",
                [
                    ".py", ".js", ".html", ".css", ".java", ".cpp", ".c", ".h", ".php", ".rb",
                    ".go", ".rs", ".ts", ".jsx", ".tsx", ".vue", ".scss", ".sass", ".less",
                    ".sql", ".xml", ".json", ".yaml", ".yml", ".toml", ".sh",
                ],
                "Source code and markup files",
            ),
            CategoryRule::new(
                "Executables",
                [
                    ".exe", ".msi", ".dmg", ".pkg", ".deb", ".rpm", ".app", ".run", ".bin",
                    ".appimage",
                ],
                "Executable and installer files",
            ),
            CategoryRule::new(
                "Fonts",
                [".ttf", ".otf", ".woff", ".woff2", ".eot", ".fon", ".fnt"],
                "Font files",
            ),
            CategoryRule::new(
                "3D_Models",
                [
                    ".obj", ".fbx", ".dae", ".3ds", ".blend", ".ma", ".mb", ".max", ".c4d",
                    ".skp", ".stl", ".ply",
                ],
                "3D model files",
            ),
            CategoryRule::new(
                "Data",
                [
                    ".db", ".sqlite", ".sqlite3", ".json", ".xml", ".csv", ".tsv", ".log",
                    ".bak", ".tmp",
                ],
                "Data and database files",
            ),
        ]
    }
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(Self::standard_rules())
    }
}
