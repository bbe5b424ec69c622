//! Comment-preserving YAML load and render
//!
//! The value tree comes from `serde_yaml`. Source positions come from a second
//! pass over the marked events of `yaml-rust2`: each block mapping key is
//! located by its event, and the lines between one key and the next belong to
//! that entry. The text around those spans is then split into layout: the
//! comment and blank lines above an entry, the key as written, the trailing
//! comment, and the verbatim text of its value. Rendering writes that text
//! back for every entry that was not edited and falls back to `serde_yaml`
//! output for the rest.
//!
//! Block mappings are followed key by key. Any other value (scalars, block
//! scalars, sequences, flow collections) is kept as an opaque chunk of lines,
//! accepted only if re-parsing the chunk yields the same value.
//!
//! When the layout cannot be recovered (flow-style roots, complex or tagged
//! keys) the document is rendered without source layout.

use log::debug;
use serde_yaml::{Mapping, Value};
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use super::{Document, Entry, MappingNode, Node, ValueRepr, DEFAULT_INDENT};
use crate::error::{Error, Result};
use crate::value;

pub(super) struct Parsed {
    pub root: Node,
    pub header: Vec<String>,
    pub footer: Vec<String>,
    pub indent: usize,
    pub line_ends: LineEnds,
}

/// Line terminator style of the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct LineEnds {
    /// Lines end with `\r\n`.
    pub crlf: bool,
    /// The last line is terminated.
    pub final_newline: bool,
}

impl Default for LineEnds {
    fn default() -> Self {
        Self {
            crlf: false,
            final_newline: true,
        }
    }
}

impl LineEnds {
    fn detect(text: &str) -> Self {
        Self {
            crlf: text
                .find('\n')
                .is_some_and(|end| text[..end].ends_with('\r')),
            final_newline: text.is_empty() || text.ends_with('\n'),
        }
    }

    fn apply(self, mut out: String) -> String {
        if self.crlf {
            out = out.replace('\n', "\r\n");
        }
        if !self.final_newline {
            let trimmed = out
                .strip_suffix("\r\n")
                .or_else(|| out.strip_suffix('\n'))
                .map(str::len);
            if let Some(len) = trimmed {
                out.truncate(len);
            }
        }
        out
    }
}

pub(super) fn parse(text: &str) -> Result<Parsed> {
    let parsed: Value = serde_yaml::from_str(text).map_err(format_error)?;
    let value = match value::stringify_keys(parsed) {
        Value::Null => Value::Mapping(Mapping::new()),
        other => other,
    };
    let line_ends = LineEnds::detect(text);

    let undecorated = |value: &Value| Parsed {
        root: Node::from_value(value),
        header: Vec::new(),
        footer: Vec::new(),
        indent: DEFAULT_INDENT,
        line_ends,
    };

    if !value.is_mapping() {
        return Ok(undecorated(&value));
    }

    let index = LineIndex::new(text);
    let mut collector = SpanCollector::new(&index);
    if let Err(err) = Parser::new_from_str(text).load(&mut collector, false) {
        debug!("Source positions unavailable ({}), document will be rendered canonically", err);
        return Ok(undecorated(&value));
    }

    let mut root = Node::from_value(&value);
    let lines: Vec<&str> = text.lines().collect();
    match decorate(&mut root, &lines, collector.root.as_ref()) {
        Some(layout) => Ok(Parsed {
            root,
            header: layout.header,
            footer: layout.footer,
            indent: layout.indent,
            line_ends,
        }),
        None => {
            debug!("Source layout not recognized, document will be rendered canonically");
            Ok(undecorated(&value))
        }
    }
}

pub(super) fn render(document: &Document) -> Result<String> {
    let mut out = String::new();
    push_lines(&mut out, &document.header);
    match &document.root {
        Node::Mapping(mapping) => {
            let indent = mapping.child_indent.unwrap_or(0);
            render_mapping(&mut out, mapping, indent, document.indent)?
        }
        other => out.push_str(&to_yaml(&other.to_value())?),
    }
    push_lines(&mut out, &document.footer);
    Ok(document.line_ends.apply(out))
}

fn render_mapping(out: &mut String, mapping: &MappingNode, indent: usize, unit: usize) -> Result<()> {
    let pad = " ".repeat(indent);
    for entry in &mapping.entries {
        push_lines(out, &entry.decor.leading);
        let key = match &entry.decor.key_repr {
            Some(repr) => repr.clone(),
            None => quote_key(&entry.key)?,
        };
        let trailing = entry.decor.trailing.as_deref().unwrap_or("");

        if let Some(repr) = &entry.decor.value_repr {
            out.push_str(&format!("{}{}:{}{}\n", pad, key, repr.head, trailing));
            push_lines(out, &repr.body);
            continue;
        }

        match &entry.value {
            Node::Mapping(child) if !child.is_empty() => {
                out.push_str(&format!("{}{}:{}\n", pad, key, trailing));
                let child_indent = child.child_indent.unwrap_or(indent + unit);
                render_mapping(out, child, child_indent, unit)?;
            }
            Node::Sequence(items) if !items.is_empty() => {
                out.push_str(&format!("{}{}:{}\n", pad, key, trailing));
                let nested = " ".repeat(indent + unit);
                for line in to_yaml(&entry.value.to_value())?.lines() {
                    push_padded(out, &nested, line);
                }
            }
            node => {
                let value = node.to_value();
                let text = to_yaml(&value)?;
                let mut lines = text.lines();
                let first = lines.next().unwrap_or("");
                out.push_str(&format!("{}{}: {}{}\n", pad, key, first, trailing));

                // Block scalar lines from serde_yaml are already indented.
                let continuation = if value.is_string() {
                    pad.clone()
                } else {
                    " ".repeat(indent + unit)
                };
                for line in lines {
                    push_padded(out, &continuation, line);
                }
            }
        }
    }
    Ok(())
}

fn push_lines(out: &mut String, lines: &[String]) {
    for line in lines {
        out.push_str(line);
        out.push('\n');
    }
}

fn push_padded(out: &mut String, pad: &str, line: &str) {
    if !line.is_empty() {
        out.push_str(pad);
        out.push_str(line);
    }
    out.push('\n');
}

fn to_yaml(value: &Value) -> Result<String> {
    serde_yaml::to_string(value).map_err(format_error)
}

fn quote_key(key: &str) -> Result<String> {
    let text = to_yaml(&Value::String(key.to_string()))?;
    let text = text.trim_end();
    if text.contains('\n') {
        serde_json::to_string(key).map_err(|err| Error::Format {
            message: err.to_string(),
        })
    } else {
        Ok(text.to_string())
    }
}

fn format_error(err: serde_yaml::Error) -> Error {
    Error::Format {
        message: err.to_string(),
    }
}

struct Layout {
    header: Vec<String>,
    footer: Vec<String>,
    indent: usize,
}

/// Line and column (in characters) of an event, both zero based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Position {
    line: usize,
    col: usize,
}

/// Character offsets of line starts, for turning marker offsets into
/// positions.
struct LineIndex {
    starts: Vec<usize>,
}

impl LineIndex {
    fn new(text: &str) -> Self {
        let mut starts = vec![0];
        for (offset, ch) in text.chars().enumerate() {
            if ch == '\n' {
                starts.push(offset + 1);
            }
        }
        Self { starts }
    }

    fn position(&self, marker: &Marker) -> Position {
        let offset = marker.index();
        let line = self.starts.partition_point(|start| *start <= offset).saturating_sub(1);
        Position {
            line,
            col: offset - self.starts[line],
        }
    }
}

/// Source spans of the nodes of a document, as far as layout needs them.
#[derive(Debug)]
enum Span {
    Scalar {
        text: String,
        style: TScalarStyle,
        at: Position,
    },
    Mapping {
        at: Position,
        entries: Vec<EntrySpan>,
    },
    Sequence {
        at: Position,
    },
    Alias {
        at: Position,
    },
}

impl Span {
    fn at(&self) -> Position {
        match self {
            Span::Scalar { at, .. }
            | Span::Mapping { at, .. }
            | Span::Sequence { at }
            | Span::Alias { at } => *at,
        }
    }
}

#[derive(Debug)]
struct EntrySpan {
    key: Span,
    value: Span,
}

enum Frame {
    Mapping {
        at: Position,
        entries: Vec<EntrySpan>,
        key: Option<Span>,
    },
    Sequence {
        at: Position,
    },
}

/// Builds the span tree from marked parser events. Children of sequences are
/// not kept since sequences are laid out as a whole.
struct SpanCollector<'a> {
    index: &'a LineIndex,
    stack: Vec<Frame>,
    root: Option<Span>,
}

impl<'a> SpanCollector<'a> {
    fn new(index: &'a LineIndex) -> Self {
        Self {
            index,
            stack: Vec::new(),
            root: None,
        }
    }

    fn complete(&mut self, span: Span) {
        match self.stack.last_mut() {
            None => self.root = Some(span),
            Some(Frame::Sequence { .. }) => {}
            Some(Frame::Mapping { entries, key, .. }) => match key.take() {
                None => *key = Some(span),
                Some(key) => entries.push(EntrySpan { key, value: span }),
            },
        }
    }
}

impl MarkedEventReceiver for SpanCollector<'_> {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        let at = self.index.position(&marker);
        match ev {
            Event::Scalar(text, style, ..) => self.complete(Span::Scalar { text, style, at }),
            Event::Alias(..) => self.complete(Span::Alias { at }),
            Event::SequenceStart(..) => self.stack.push(Frame::Sequence { at }),
            Event::MappingStart(..) => self.stack.push(Frame::Mapping {
                at,
                entries: Vec::new(),
                key: None,
            }),
            Event::SequenceEnd | Event::MappingEnd => match self.stack.pop() {
                Some(Frame::Sequence { at }) => self.complete(Span::Sequence { at }),
                Some(Frame::Mapping { at, entries, .. }) => {
                    self.complete(Span::Mapping { at, entries })
                }
                None => {}
            },
            _ => {}
        }
    }
}

/// Attach layout to the entries of `root` from the source lines and spans.
///
/// Returns `None` when the spans do not describe a block mapping document.
fn decorate(root: &mut Node, lines: &[&str], span: Option<&Span>) -> Option<Layout> {
    let mut decorator = Decorator {
        lines,
        cursor: 0,
        unit: None,
    };

    let mut header = Vec::new();
    match (span, root) {
        // Empty and comment-only documents
        (None | Some(Span::Scalar { .. }), _) => {}
        (Some(Span::Mapping { at, entries }), Node::Mapping(mapping)) => {
            if char_at(lines, *at) == Some('{') {
                return None;
            }
            if let Some(first) = entries.first() {
                mapping.child_indent = Some(first.key.at().col);
                decorator.mapping(mapping, entries, lines.len())?;
                if let Some(entry) = mapping.entries.first_mut() {
                    header = std::mem::take(&mut entry.decor.leading);
                }
            }
        }
        _ => return None,
    }

    Some(Layout {
        header,
        footer: to_strings(&lines[decorator.cursor..]),
        indent: decorator.unit.unwrap_or(DEFAULT_INDENT),
    })
}

struct Decorator<'a> {
    lines: &'a [&'a str],
    /// First line not yet attached to an entry.
    cursor: usize,
    /// Indentation step of the first nested mapping.
    unit: Option<usize>,
}

impl Decorator<'_> {
    /// Decorate the entries of a block mapping whose lines end before `bound`.
    fn mapping(&mut self, mapping: &mut MappingNode, spans: &[EntrySpan], bound: usize) -> Option<()> {
        for (i, span) in spans.iter().enumerate() {
            let next = spans.get(i + 1).map_or(bound, |next| next.key.at().line);
            self.entry(mapping, span, next)?;
        }
        Some(())
    }

    fn entry(&mut self, mapping: &mut MappingNode, span: &EntrySpan, next: usize) -> Option<()> {
        let Span::Scalar { text, style, at } = &span.key else {
            debug!("Complex key at line {}", span.key.at().line + 1);
            return None;
        };
        if at.line < self.cursor || at.line >= next || indentation(self.lines.get(at.line)?) != at.col {
            return None;
        }
        let line = self.lines[at.line];
        let (name, colon) = locate_key(line, at.col, text, style)?;

        let Some(entry) = mapping.get_mut(&name) else {
            debug!("No entry for key '{}' at line {}", name, at.line + 1);
            return None;
        };
        let (head, trailing) = split_comment(&line[colon + 1..]);
        entry.decor.leading = to_strings(&self.lines[self.cursor..at.line]);
        entry.decor.key_repr = Some(line[at.col..colon].to_string());
        entry.decor.trailing = trailing.map(str::to_string);
        self.cursor = at.line + 1;

        let children = match (&span.value, &entry.value) {
            (Span::Mapping { entries, .. }, Node::Mapping(child))
                if head.trim().is_empty() && !child.is_empty() =>
            {
                entries.first().map(|first| (entries, first.key.at()))
            }
            _ => None,
        };
        if let Some((entries, first)) = children {
            if first.line <= at.line || first.col <= at.col {
                return None;
            }
            let Node::Mapping(child) = &mut entry.value else {
                return None;
            };
            child.child_indent = Some(first.col);
            self.unit.get_or_insert(first.col - at.col);
            return self.mapping(child, entries, next);
        }

        let end = self.value_end(at.line, next, at.col, &span.value);
        let body = &self.lines[at.line + 1..end];
        if repr_matches(head, body, at.col, &entry.value) {
            entry.decor.value_repr = Some(ValueRepr {
                head: head.to_string(),
                body: to_strings(body),
            });
        }
        self.cursor = end;
        Some(())
    }

    /// Index one past the last line of the value whose key is on
    /// `lines[start]`, given that the next key is on `lines[next]`.
    ///
    /// Trailing blank and comment lines are left out, except blank lines a
    /// keep-chomping block scalar (`|+`, `>+`) holds as content.
    fn value_end(&self, start: usize, next: usize, indent: usize, span: &Span) -> usize {
        let range = start + 1..next;
        match span {
            Span::Scalar { at, .. }
                if at.line == start && matches!(char_at(self.lines, *at), Some('|' | '>')) =>
            {
                let content_indent = self.lines[range.clone()]
                    .iter()
                    .find(|line| !line.trim().is_empty() && indentation(line) > indent)
                    .map(|line| indentation(line));

                let mut end = start + 1;
                for j in range {
                    let line = self.lines[j];
                    if line.trim().is_empty() {
                        continue;
                    }
                    let trail_comment = line.trim_start().starts_with('#')
                        && content_indent.map_or(true, |width| indentation(line) < width);
                    if trail_comment {
                        break;
                    }
                    end = j + 1;
                }
                if keeps_trailing_lines(self.lines[start], at.col) {
                    while end < next && self.lines[end].trim().is_empty() {
                        end += 1;
                    }
                }
                end
            }
            _ => range
                .filter(|j| !is_trivia(self.lines[*j]))
                .last()
                .map_or(start + 1, |j| j + 1),
        }
    }
}

fn to_strings(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| line.to_string()).collect()
}

fn char_at(lines: &[&str], at: Position) -> Option<char> {
    lines.get(at.line)?.chars().nth(at.col)
}

/// Whether the block scalar header at `col` carries the keep indicator.
fn keeps_trailing_lines(line: &str, col: usize) -> bool {
    line.chars()
        .skip(col)
        .take_while(|ch| !ch.is_whitespace())
        .any(|ch| ch == '+')
}

/// Find the key that the parser reported at `col` of `line`.
///
/// Returns the key as addressed in paths and the byte offset of the `:` that
/// ends it. `col` is the indentation of the line, so it is also a byte offset.
fn locate_key(line: &str, col: usize, text: &str, style: &TScalarStyle) -> Option<(String, usize)> {
    let rest = line.get(col..)?;
    let (len, name) = match style {
        TScalarStyle::Plain => {
            if !rest.starts_with(text) {
                return None;
            }
            let key: Value = serde_yaml::from_str(text).ok()?;
            (text.len(), value::key_string(&key))
        }
        TScalarStyle::SingleQuoted => {
            if !rest.starts_with('\'') {
                return None;
            }
            (text.len() + text.matches('\'').count() + 2, text.to_string())
        }
        TScalarStyle::DoubleQuoted => (double_quoted_len(rest)?, text.to_string()),
        _ => return None,
    };

    let after = rest.get(len..)?;
    let gap = after.len() - after.trim_start_matches(|ch| ch == ' ' || ch == '\t').len();
    after[gap..]
        .starts_with(':')
        .then(|| (name, col + len + gap))
}

/// Length of the double-quoted scalar that opens `text`, quotes included.
fn double_quoted_len(text: &str) -> Option<usize> {
    let mut chars = text.char_indices();
    if chars.next()?.1 != '"' {
        return None;
    }
    while let Some((idx, ch)) = chars.next() {
        match ch {
            '\\' => {
                chars.next();
            }
            '"' => return Some(idx + 1),
            _ => {}
        }
    }
    None
}

/// Blank lines, comments and document markers.
fn is_trivia(line: &str) -> bool {
    let trimmed = line.trim();
    trimmed.is_empty()
        || trimmed.starts_with('#')
        || trimmed == "---"
        || trimmed == "..."
        || trimmed.starts_with("--- #")
}

fn indentation(line: &str) -> usize {
    line.len() - line.trim_start_matches(' ').len()
}

/// Whether the source chunk parses back to exactly `node`.
fn repr_matches(head: &str, body: &[&str], indent: usize, node: &Node) -> bool {
    let mut text = format!("__v:{}\n", head);
    for line in body {
        let stripped = if indentation(line) >= indent {
            &line[indent..]
        } else {
            line.trim_start()
        };
        text.push_str(stripped);
        text.push('\n');
    }
    match serde_yaml::from_str::<Value>(&text) {
        Ok(parsed) => value::stringify_keys(parsed)
            .get("__v")
            .is_some_and(|value| *value == node.to_value()),
        Err(_) => false,
    }
}

/// Split the text after a key's colon into the value and the trailing
/// comment (with the whitespace before it).
fn split_comment(text: &str) -> (&str, Option<&str>) {
    let mut quote: Option<char> = None;
    let mut prev: Option<char> = None;
    let mut chars = text.char_indices().peekable();

    while let Some((idx, ch)) = chars.next() {
        match quote {
            Some('\'') => {
                if ch == '\'' {
                    if chars.peek().is_some_and(|(_, next)| *next == '\'') {
                        chars.next();
                    } else {
                        quote = None;
                    }
                }
            }
            Some(_) => {
                if ch == '\\' {
                    chars.next();
                } else if ch == '"' {
                    quote = None;
                }
            }
            None => match ch {
                '#' if prev.map_or(true, char::is_whitespace) => {
                    let start = text[..idx].trim_end().len();
                    return (&text[..start], Some(&text[start..]));
                }
                '\'' | '"' if prev.map_or(true, |p| p.is_whitespace() || "[{,".contains(p)) => {
                    quote = Some(ch)
                }
                _ => {}
            },
        }
        prev = Some(ch);
    }
    (text, None)
}
