//! Structure-preserving values documents
//!
//! A [`Document`] is the live, editable form of the user's values file. It
//! keeps key order, and for YAML it also keeps comments, blank lines, key
//! spelling and the source text of every value that was never edited, so
//! that saving a document reproduces the untouched regions byte for byte.
//!
//! Documents are addressed with key paths already split into segments:
//!
//! ```
//! use valgrade::document::{Document, Format};
//!
//! let mut doc = Document::parse("# replicas\nreplicas: 1 # default\n", Format::Yaml).unwrap();
//! doc.set(&["replicas"], &serde_yaml::Value::from(3)).unwrap();
//! assert_eq!(doc.render().unwrap(), "# replicas\nreplicas: 3 # default\n");
//! ```

mod json;
mod yaml;

use std::fs;
use std::path::Path;

use serde_yaml::{Mapping, Value};

use crate::error::{Error, Result};
use crate::value;

/// Indentation used for nesting levels that have no source layout.
pub(crate) const DEFAULT_INDENT: usize = 2;

/// Serialization format of a values document, chosen by file extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Yaml,
    Json,
}

impl Format {
    /// Detect the format from a file extension (`.yaml`, `.yml`, `.json`).
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("")
            .to_ascii_lowercase();
        match extension.as_str() {
            "yaml" | "yml" => Ok(Format::Yaml),
            "json" => Ok(Format::Json),
            _ => Err(Error::UnsupportedFormat {
                path: path.display().to_string(),
                extension,
            }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Format::Yaml => "YAML",
            Format::Json => "JSON",
        }
    }
}

/// A node of the editable document tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Scalar(Value),
    Sequence(Vec<Node>),
    Mapping(MappingNode),
}

impl Node {
    /// Build an undecorated node tree from a value.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::Mapping(mapping) => Node::Mapping(MappingNode {
                entries: mapping
                    .iter()
                    .map(|(key, value)| Entry::new(&value::key_string(key), Node::from_value(value)))
                    .collect(),
                child_indent: None,
            }),
            Value::Sequence(items) => Node::Sequence(items.iter().map(Node::from_value).collect()),
            scalar => Node::Scalar(scalar.clone()),
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Node::Scalar(value) => value.clone(),
            Node::Sequence(items) => Value::Sequence(items.iter().map(Node::to_value).collect()),
            Node::Mapping(mapping) => Value::Mapping(
                mapping
                    .entries
                    .iter()
                    .map(|entry| (Value::String(entry.key.clone()), entry.value.to_value()))
                    .collect::<Mapping>(),
            ),
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Node::Scalar(_) => "Scalar",
            Node::Sequence(_) => "Sequence",
            Node::Mapping(_) => "Mapping",
        }
    }

    pub fn as_mapping(&self) -> Option<&MappingNode> {
        match self {
            Node::Mapping(mapping) => Some(mapping),
            _ => None,
        }
    }
}

/// An ordered mapping of entries.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingNode {
    entries: Vec<Entry>,
    /// Column of the children in the source, when known.
    child_indent: Option<usize>,
}

impl MappingNode {
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|entry| entry.key.as_str())
    }

    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.entries.iter().find(|entry| entry.key == key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn get_mut(&mut self, key: &str) -> Option<&mut Entry> {
        self.entries.iter_mut().find(|entry| entry.key == key)
    }

    fn position(&self, key: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.key == key)
    }

    fn entry_or_insert(&mut self, key: &str) -> &mut Entry {
        let index = match self.position(key) {
            Some(index) => index,
            None => {
                self.entries
                    .push(Entry::new(key, Node::Mapping(MappingNode::default())));
                self.entries.len() - 1
            }
        };
        &mut self.entries[index]
    }
}

/// One key/value pair of a mapping, with the source layout around it.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    pub key: String,
    pub value: Node,
    decor: Decor,
}

impl Entry {
    fn new(key: &str, value: Node) -> Self {
        Self {
            key: key.to_string(),
            value,
            decor: Decor::default(),
        }
    }

    /// Comment lines attached directly above this entry, if any.
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.decor
            .leading
            .iter()
            .map(|line| line.trim())
            .filter(|line| line.starts_with('#'))
    }
}

/// Source layout of an entry. Empty for entries created by edits.
#[derive(Debug, Clone, Default, PartialEq)]
struct Decor {
    /// Blank and comment lines preceding the key, verbatim.
    leading: Vec<String>,
    /// The key as spelled in the source, including quotes.
    key_repr: Option<String>,
    /// Whitespace and comment after the value on the key line.
    trailing: Option<String>,
    /// Source text of the value while it is unedited.
    value_repr: Option<ValueRepr>,
}

#[derive(Debug, Clone, PartialEq)]
struct ValueRepr {
    /// Text after the colon on the key line, without the trailing comment.
    head: String,
    /// Continuation lines, verbatim.
    body: Vec<String>,
}

/// An editable values document.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    format: Format,
    root: Node,
    header: Vec<String>,
    footer: Vec<String>,
    indent: usize,
    line_ends: yaml::LineEnds,
}

impl Document {
    /// Parse document text.
    ///
    /// An empty document is an empty mapping.
    pub fn parse(text: &str, format: Format) -> Result<Self> {
        match format {
            Format::Yaml => {
                let parsed = yaml::parse(text)?;
                Ok(Self {
                    format,
                    root: parsed.root,
                    header: parsed.header,
                    footer: parsed.footer,
                    indent: parsed.indent,
                    line_ends: parsed.line_ends,
                })
            }
            Format::Json => Ok(Self::from_value(&json::parse(text)?, format)),
        }
    }

    /// Build a document without any source layout.
    pub fn from_value(value: &Value, format: Format) -> Self {
        let root = match value::stringify_keys(value.clone()) {
            Value::Null => Node::Mapping(MappingNode::default()),
            other => Node::from_value(&other),
        };
        Self {
            format,
            root,
            header: Vec::new(),
            footer: Vec::new(),
            indent: DEFAULT_INDENT,
            line_ends: yaml::LineEnds::default(),
        }
    }

    /// Load a document, picking the format from the file extension.
    pub fn load(path: &Path) -> Result<Self> {
        let format = Format::from_path(path)?;
        let text = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::parse(&text, format).map_err(|err| match err {
            Error::Format { message } => Error::Format {
                message: format!("{}: {}", path.display(), message),
            },
            other => other,
        })
    }

    /// Save the document in the format implied by `path`, which may differ
    /// from the format it was loaded from.
    pub fn save(&self, path: &Path) -> Result<()> {
        let format = Format::from_path(path)?;
        let text = self.render_as(format)?;
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|source| Error::Write {
                path: parent.display().to_string(),
                source,
            })?;
        }
        fs::write(path, text).map_err(|source| Error::Write {
            path: path.display().to_string(),
            source,
        })
    }

    /// Render in the document's own format.
    pub fn render(&self) -> Result<String> {
        self.render_as(self.format)
    }

    pub fn render_as(&self, format: Format) -> Result<String> {
        match format {
            Format::Yaml => yaml::render(self),
            Format::Json => json::render(&self.to_value()),
        }
    }

    pub fn format(&self) -> Format {
        self.format
    }

    pub fn root(&self) -> &Node {
        &self.root
    }

    /// The document content as a plain value tree.
    pub fn to_value(&self) -> Value {
        self.root.to_value()
    }

    /// Resolve a path. The empty path is the root.
    pub fn get(&self, path: &[&str]) -> Result<&Node> {
        let mut current = &self.root;
        for (depth, segment) in path.iter().enumerate() {
            let Node::Mapping(mapping) = current else {
                return Err(type_mismatch(path, depth, current));
            };
            current = &mapping
                .get(segment)
                .ok_or_else(|| Error::PathNotFound {
                    path: path.join("."),
                })?
                .value;
        }
        Ok(current)
    }

    /// Write `value` at `path`.
    ///
    /// Missing intermediates, and intermediates that are not mappings, become
    /// empty mappings. An existing entry keeps its position, key spelling and
    /// comments; only its value is replaced.
    pub fn set(&mut self, path: &[&str], value: &Value) -> Result<()> {
        let Some((last, parents)) = path.split_last() else {
            return Err(Error::EmptyPath);
        };

        let mut mapping = ensure_mapping(&mut self.root);
        for segment in parents {
            let entry = mapping.entry_or_insert(segment);
            entry.decor.value_repr = None;
            mapping = ensure_mapping(&mut entry.value);
        }

        let node = Node::from_value(&value::stringify_keys(value.clone()));
        match mapping.get_mut(last) {
            Some(entry) => {
                entry.value = node;
                entry.decor.value_repr = None;
            }
            None => mapping.entries.push(Entry::new(last, node)),
        }
        Ok(())
    }

    /// Remove the entry at `path`, returning its value. Sibling order is kept.
    pub fn delete(&mut self, path: &[&str]) -> Result<Node> {
        let Some((last, parents)) = path.split_last() else {
            return Err(Error::EmptyPath);
        };
        self.get(path)?;

        let mut current = &mut self.root;
        for segment in parents {
            current = match current {
                Node::Mapping(mapping) => match mapping.get_mut(segment) {
                    Some(entry) => {
                        entry.decor.value_repr = None;
                        &mut entry.value
                    }
                    None => return Err(Error::PathNotFound { path: path.join(".") }),
                },
                _ => return Err(Error::PathNotFound { path: path.join(".") }),
            };
        }

        let Node::Mapping(mapping) = current else {
            return Err(Error::PathNotFound { path: path.join(".") });
        };
        let index = mapping
            .position(last)
            .ok_or_else(|| Error::PathNotFound { path: path.join(".") })?;
        Ok(mapping.entries.remove(index).value)
    }
}

fn type_mismatch(path: &[&str], depth: usize, found: &Node) -> Error {
    let at = if depth == 0 {
        "<root>".to_string()
    } else {
        path[..depth].join(".")
    };
    Error::TypeMismatch {
        path: path.join("."),
        at,
        found: found.kind_name(),
    }
}

fn ensure_mapping(node: &mut Node) -> &mut MappingNode {
    if !matches!(node, Node::Mapping(_)) {
        *node = Node::Mapping(MappingNode::default());
    }
    match node {
        Node::Mapping(mapping) => mapping,
        _ => unreachable!("node was just replaced by a mapping"),
    }
}
