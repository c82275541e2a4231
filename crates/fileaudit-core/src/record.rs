//! Inventory records, columns, and snapshots.
//!
//! A [`Snapshot`] is a rectangular inventory of filesystem metadata: one
//! [`FileRecord`] per file, plus a [`ColumnSet`] recording which optional
//! columns the source actually carried. Column presence and per-row value
//! presence are distinct: a snapshot may carry a `Hash` column while
//! individual rows still have no hash.

use chrono::NaiveDateTime;
use compact_str::CompactString;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

/// An optional column a snapshot may carry.
///
/// `name` and `relative_path` are always present and are not modeled here;
/// everything else is negotiated with the loading collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Column {
    /// Caller-supplied content fingerprint, assumed collision-free.
    Hash,
    /// Absolute path.
    FullPath,
    /// Size in bytes.
    Size,
    /// Creation timestamp.
    Created,
    /// Modification timestamp.
    Modified,
    /// Access timestamp.
    Accessed,
    /// Octal-like permission encoding.
    PermOctal,
    /// Hidden flag.
    Hidden,
    /// Read-only flag.
    ReadOnly,
    /// Owning user.
    Owner,
    /// MIME type.
    MimeType,
    /// File extension.
    Extension,
    /// Parent folder.
    Folder,
    /// Root of the inventoried tree.
    Root,
}

impl Column {
    /// Stable column name as used in tabular output.
    pub fn as_str(&self) -> &'static str {
        match self {
            Column::Hash => "hash",
            Column::FullPath => "full_path",
            Column::Size => "size",
            Column::Created => "created",
            Column::Modified => "modified",
            Column::Accessed => "accessed",
            Column::PermOctal => "perm_octal",
            Column::Hidden => "hidden",
            Column::ReadOnly => "read_only",
            Column::Owner => "owner",
            Column::MimeType => "mime_type",
            Column::Extension => "extension",
            Column::Folder => "folder",
            Column::Root => "root",
        }
    }
}

/// Set of columns present in a snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnSet(Vec<Column>);

impl ColumnSet {
    /// Create an empty column set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check whether a column is present.
    pub fn contains(&self, column: Column) -> bool {
        self.0.contains(&column)
    }

    /// Mark a column as present.
    pub fn insert(&mut self, column: Column) {
        if !self.0.contains(&column) {
            self.0.push(column);
        }
    }

    /// Builder-style insertion.
    pub fn with(mut self, column: Column) -> Self {
        self.insert(column);
        self
    }

    /// Iterate over present columns.
    pub fn iter(&self) -> impl Iterator<Item = Column> + '_ {
        self.0.iter().copied()
    }
}

impl FromIterator<Column> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = Column>>(iter: I) -> Self {
        let mut set = Self::new();
        for column in iter {
            set.insert(column);
        }
        set
    }
}

/// One inventory row.
///
/// All optional fields model optional columns; loaders coerce unparsable
/// values to `None` (see the `coerce` module) rather than failing.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into, strip_option))]
pub struct FileRecord {
    /// File name (not a path).
    pub name: CompactString,

    /// Path relative to the inventoried root.
    pub relative_path: CompactString,

    /// Absolute path, when the source recorded one.
    #[builder(default)]
    pub full_path: Option<CompactString>,

    /// Extension without the leading dot.
    #[builder(default)]
    pub extension: Option<CompactString>,

    /// Parent folder.
    #[builder(default)]
    pub folder: Option<CompactString>,

    /// Root of the inventoried tree.
    #[builder(default)]
    pub root: Option<CompactString>,

    /// Owning user.
    #[builder(default)]
    pub owner: Option<CompactString>,

    /// MIME type.
    #[builder(default)]
    pub mime_type: Option<CompactString>,

    /// Size in bytes. Negative or unparsable source values become `None`.
    #[builder(default)]
    pub size: Option<u64>,

    /// Caller-supplied content fingerprint.
    #[builder(default)]
    pub hash: Option<CompactString>,

    /// Creation time (timezone-naive).
    #[builder(default)]
    pub created: Option<NaiveDateTime>,

    /// Modification time (timezone-naive).
    #[builder(default)]
    pub modified: Option<NaiveDateTime>,

    /// Access time (timezone-naive).
    #[builder(default)]
    pub accessed: Option<NaiveDateTime>,

    /// Octal-like permission encoding, e.g. "0644".
    #[builder(default)]
    pub perm_octal: Option<CompactString>,

    /// Hidden flag.
    #[builder(default)]
    pub hidden: Option<bool>,

    /// Read-only flag.
    #[builder(default)]
    pub read_only: Option<bool>,
}

impl FileRecord {
    /// Create a record builder.
    pub fn builder() -> FileRecordBuilder {
        FileRecordBuilder::default()
    }

    /// Full path when recorded, otherwise the relative path.
    pub fn preferred_path(&self) -> &str {
        self.full_path.as_deref().unwrap_or(&self.relative_path)
    }

    /// Length in characters of the preferred path.
    pub fn path_len(&self) -> usize {
        self.preferred_path().chars().count()
    }

    /// Number of segments in the relative path.
    ///
    /// Empty segments, `.` and `..` are ignored; both `/` and `\` count as
    /// separators.
    pub fn depth(&self) -> usize {
        self.relative_path
            .split(['/', '\\'])
            .filter(|s| !s.is_empty() && *s != "." && *s != "..")
            .count()
    }
}

/// A full in-memory inventory: records plus the columns they carry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// All inventory rows, in source order.
    pub records: Vec<FileRecord>,

    /// Columns the source carried.
    pub columns: ColumnSet,
}

impl Snapshot {
    /// Create a snapshot from records and an explicit column set.
    pub fn new(records: Vec<FileRecord>, columns: ColumnSet) -> Self {
        Self { records, columns }
    }

    /// Create a snapshot, inferring column presence from the records.
    ///
    /// A column is considered present when any record carries a value for
    /// it. Loaders that know the source schema should prefer [`Snapshot::new`]
    /// with an explicit set, since an all-missing column is indistinguishable
    /// from an absent one here.
    pub fn with_inferred_columns(records: Vec<FileRecord>) -> Self {
        let mut columns = ColumnSet::new();
        for record in &records {
            if record.hash.is_some() {
                columns.insert(Column::Hash);
            }
            if record.full_path.is_some() {
                columns.insert(Column::FullPath);
            }
            if record.size.is_some() {
                columns.insert(Column::Size);
            }
            if record.created.is_some() {
                columns.insert(Column::Created);
            }
            if record.modified.is_some() {
                columns.insert(Column::Modified);
            }
            if record.accessed.is_some() {
                columns.insert(Column::Accessed);
            }
            if record.perm_octal.is_some() {
                columns.insert(Column::PermOctal);
            }
            if record.hidden.is_some() {
                columns.insert(Column::Hidden);
            }
            if record.read_only.is_some() {
                columns.insert(Column::ReadOnly);
            }
            if record.owner.is_some() {
                columns.insert(Column::Owner);
            }
            if record.mime_type.is_some() {
                columns.insert(Column::MimeType);
            }
            if record.extension.is_some() {
                columns.insert(Column::Extension);
            }
            if record.folder.is_some() {
                columns.insert(Column::Folder);
            }
            if record.root.is_some() {
                columns.insert(Column::Root);
            }
        }
        Self { records, columns }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the snapshot is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Check whether a column is present.
    pub fn has_column(&self, column: Column) -> bool {
        self.columns.contains(column)
    }
}
