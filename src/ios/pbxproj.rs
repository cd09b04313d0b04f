//! Reader and editor for Xcode `project.pbxproj` files
//!
//! The project file is an OpenStep-style ASCII property list:
//!
//! ```text
//! // !$*UTF8*$!
//! {
//!     objects = {
//!         13B07F941A680F5B00A75B9A /* Debug */ = {
//!             isa = XCBuildConfiguration;
//!             buildSettings = {
//!                 PRODUCT_NAME = HelloWorld;
//!             };
//!             name = Debug;
//!         };
//!     };
//! }
//! ```
//!
//! Parsing keeps the byte span of every node. Edits are spliced into the
//! original text, so comments, ordering and whitespace that were not edited
//! stay byte-for-byte identical after [`XcodeProject::save`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use thiserror::Error;

/// `isa` of build configuration objects
pub const ISA_BUILD_CONFIGURATION: &str = "XCBuildConfiguration";
/// `isa` of configuration list objects
pub const ISA_CONFIGURATION_LIST: &str = "XCConfigurationList";
/// `isa` of native target objects
pub const ISA_NATIVE_TARGET: &str = "PBXNativeTarget";

/// Byte range into the project text, end exclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}

/// Error raised for malformed project files
#[derive(Debug, Error)]
#[error("{message} at line {line}, column {column}")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// A parsed value together with its location
#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub span: Span,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    String(String),
    Array(Vec<Node>),
    Dict(Vec<DictEntry>),
}

#[derive(Debug, Clone)]
pub struct DictEntry {
    pub key: String,
    pub key_span: Span,
    pub value: Node,
}

impl Node {
    pub fn as_str(&self) -> Option<&str> {
        match &self.kind {
            NodeKind::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Node]> {
        match &self.kind {
            NodeKind::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn entries(&self) -> Option<&[DictEntry]> {
        match &self.kind {
            NodeKind::Dict(entries) => Some(entries),
            _ => None,
        }
    }

    /// Look up a dictionary entry
    pub fn get(&self, key: &str) -> Option<&Node> {
        self.entry(key).map(|e| &e.value)
    }

    pub fn entry(&self, key: &str) -> Option<&DictEntry> {
        self.entries()?.iter().find(|e| e.key == key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(Node::as_str)
    }
}

/// Parse the text of a project file
pub fn parse(src: &str) -> Result<Node, ParseError> {
    let mut parser = Parser { src, pos: 0 };
    parser.skip_trivia()?;
    let root = parser.parse_value()?;
    parser.skip_trivia()?;
    if parser.pos < src.len() {
        return Err(parser.error("Unexpected trailing content"));
    }
    Ok(root)
}

struct Parser<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn bytes(&self) -> &'a [u8] {
        self.src.as_bytes()
    }

    fn peek(&self) -> Option<u8> {
        self.bytes().get(self.pos).copied()
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        let consumed = &self.src[..self.pos.min(self.src.len())];
        let line = consumed.matches('\n').count() + 1;
        let column = consumed.len() - consumed.rfind('\n').map_or(0, |i| i + 1) + 1;
        ParseError {
            message: message.into(),
            line,
            column,
        }
    }

    /// Skip whitespace, `/* */` and `//` comments
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match self.peek() {
                Some(b) if b.is_ascii_whitespace() => self.pos += 1,
                Some(b'/') => match self.bytes().get(self.pos + 1) {
                    Some(b'*') => {
                        let Some(end) = self.src[self.pos + 2..].find("*/") else {
                            return Err(self.error("Unterminated comment"));
                        };
                        self.pos += 2 + end + 2;
                    }
                    Some(b'/') => {
                        self.pos = self.src[self.pos..]
                            .find('\n')
                            .map_or(self.src.len(), |i| self.pos + i + 1);
                    }
                    _ => return Ok(()),
                },
                _ => return Ok(()),
            }
        }
    }

    fn expect(&mut self, byte: u8) -> Result<(), ParseError> {
        self.skip_trivia()?;
        if self.peek() == Some(byte) {
            self.pos += 1;
            Ok(())
        } else {
            Err(self.error(format!("Expected '{}'", byte as char)))
        }
    }

    fn parse_value(&mut self) -> Result<Node, ParseError> {
        self.skip_trivia()?;
        match self.peek() {
            Some(b'{') => self.parse_dict(),
            Some(b'(') => self.parse_array(),
            Some(_) => {
                let start = self.pos;
                let value = self.parse_string()?;
                Ok(Node {
                    kind: NodeKind::String(value),
                    span: Span { start, end: self.pos },
                })
            }
            None => Err(self.error("Unexpected end of file")),
        }
    }

    fn parse_dict(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut entries = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.error("Unterminated dictionary")),
                Some(_) => {
                    let key_start = self.pos;
                    let key = self.parse_string()?;
                    let key_span = Span { start: key_start, end: self.pos };
                    self.expect(b'=')?;
                    let value = self.parse_value()?;
                    self.expect(b';')?;
                    entries.push(DictEntry { key, key_span, value });
                }
            }
        }

        Ok(Node {
            kind: NodeKind::Dict(entries),
            span: Span { start, end: self.pos },
        })
    }

    fn parse_array(&mut self) -> Result<Node, ParseError> {
        let start = self.pos;
        self.pos += 1;
        let mut items = Vec::new();

        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b')') => {
                    self.pos += 1;
                    break;
                }
                None => return Err(self.error("Unterminated array")),
                Some(_) => {
                    items.push(self.parse_value()?);
                    self.skip_trivia()?;
                    match self.peek() {
                        Some(b',') => self.pos += 1,
                        Some(b')') => {}
                        _ => return Err(self.error("Expected ',' or ')'")),
                    }
                }
            }
        }

        Ok(Node {
            kind: NodeKind::Array(items),
            span: Span { start, end: self.pos },
        })
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        match self.peek() {
            Some(b'"') => self.parse_quoted(),
            Some(b) if is_unquoted_byte(b) => {
                let start = self.pos;
                while self.peek().is_some_and(is_unquoted_byte) {
                    self.pos += 1;
                }
                Ok(self.src[start..self.pos].to_string())
            }
            _ => Err(self.error("Expected a string")),
        }
    }

    fn parse_quoted(&mut self) -> Result<String, ParseError> {
        self.pos += 1;
        let mut out = String::new();
        let src = self.src;
        let mut chars = src[self.pos..].char_indices();

        while let Some((offset, c)) = chars.next() {
            match c {
                '"' => {
                    self.pos += offset + 1;
                    return Ok(out);
                }
                '\\' => match chars.next() {
                    Some((_, 'n')) => out.push('\n'),
                    Some((_, 't')) => out.push('\t'),
                    Some((_, 'r')) => out.push('\r'),
                    Some((_, other)) => out.push(other),
                    None => break,
                },
                c => out.push(c),
            }
        }

        Err(self.error("Unterminated string"))
    }
}

fn is_unquoted_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'_' | b'$' | b'+' | b'/' | b':' | b'.' | b'-')
}

/// Format a string the way Xcode writes it: bare when possible, quoted otherwise
pub fn format_string(value: &str) -> String {
    if !value.is_empty() && value.bytes().all(is_unquoted_byte) {
        return value.to_string();
    }

    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// A build configuration object (`isa = XCBuildConfiguration`)
#[derive(Debug, Clone, Copy)]
pub struct BuildConfiguration<'a> {
    pub id: &'a str,
    settings: Option<&'a Node>,
}

impl<'a> BuildConfiguration<'a> {
    /// Read a string build setting
    pub fn setting(&self, key: &str) -> Option<&'a str> {
        self.settings?.get_str(key)
    }

    pub fn has_setting(&self, key: &str) -> bool {
        self.settings.and_then(|s| s.get(key)).is_some()
    }

    /// Test bundles point `TEST_HOST` at the app they are injected into
    pub fn is_test_host(&self) -> bool {
        self.has_setting("TEST_HOST")
    }
}

/// Text edit applied to the project file
struct Edit {
    span: Span,
    text: String,
}

/// An Xcode project loaded from `project.pbxproj`
#[derive(Debug)]
pub struct XcodeProject {
    path: PathBuf,
    contents: String,
    root: Node,
}

impl XcodeProject {
    /// Open a project from a `.xcodeproj` bundle or its `project.pbxproj`
    pub fn open(path: &Path) -> Result<Self> {
        let pbxproj = if path.extension().is_some_and(|e| e == "xcodeproj") {
            path.join("project.pbxproj")
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&pbxproj)
            .with_context(|| format!("Failed to read {}", pbxproj.display()))?;
        Self::from_contents(pbxproj, contents)
    }

    pub fn from_contents(path: PathBuf, contents: String) -> Result<Self> {
        let root = parse(&contents).with_context(|| format!("Failed to parse {}", path.display()))?;
        if root.get("objects").and_then(Node::entries).is_none() {
            bail!("{} has no objects section", path.display());
        }
        Ok(Self { path, contents, root })
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[cfg(test)]
    pub fn contents(&self) -> &str {
        &self.contents
    }

    fn objects(&self) -> &[DictEntry] {
        self.root
            .get("objects")
            .and_then(Node::entries)
            .unwrap_or_default()
    }

    fn object(&self, id: &str) -> Option<&Node> {
        self.objects().iter().find(|e| e.key == id).map(|e| &e.value)
    }

    /// All objects with the given `isa`, as `(id, object)` pairs
    pub fn objects_of_isa<'a>(&'a self, isa: &'a str) -> impl Iterator<Item = (&'a str, &'a Node)> + 'a {
        self.objects()
            .iter()
            .filter(move |e| e.value.get_str("isa") == Some(isa))
            .map(|e| (e.key.as_str(), &e.value))
    }

    /// Every `XCBuildConfiguration` in file order
    pub fn build_configurations(&self) -> Vec<BuildConfiguration<'_>> {
        self.objects_of_isa(ISA_BUILD_CONFIGURATION)
            .map(|(id, obj)| BuildConfiguration {
                id,
                settings: obj.get("buildSettings"),
            })
            .collect()
    }

    /// Names of native targets keyed by the ids of their build configurations
    fn target_names_by_configuration(&self) -> HashMap<&str, &str> {
        let mut names = HashMap::new();
        for (_, target) in self.objects_of_isa(ISA_NATIVE_TARGET) {
            let (Some(name), Some(list_id)) =
                (target.get_str("name"), target.get_str("buildConfigurationList"))
            else {
                continue;
            };
            let Some(list) = self.object(list_id) else {
                continue;
            };
            if list.get_str("isa") != Some(ISA_CONFIGURATION_LIST) {
                continue;
            }
            for config in list
                .get("buildConfigurations")
                .and_then(Node::as_array)
                .unwrap_or_default()
            {
                if let Some(id) = config.as_str() {
                    names.insert(id, name);
                }
            }
        }
        names
    }

    /// The first `PRODUCT_NAME` set on a non-test build configuration.
    ///
    /// `$(TARGET_NAME)` is resolved to the name of the owning native target.
    pub fn product_name(&self) -> Option<String> {
        let targets = self.target_names_by_configuration();
        self.build_configurations().into_iter().find_map(|config| {
            if config.is_test_host() {
                return None;
            }
            let product = config.setting("PRODUCT_NAME")?;
            match targets.get(config.id) {
                Some(target) => Some(product.replace("$(TARGET_NAME)", target)),
                None if product.contains("$(TARGET_NAME)") => None,
                None => Some(product.to_string()),
            }
        })
    }

    /// Set `key = value` in the `buildSettings` of every configuration
    /// accepted by `filter`. Returns how many configurations were changed.
    pub fn set_build_setting<F>(&mut self, key: &str, value: &str, filter: F) -> Result<usize>
    where
        F: Fn(&BuildConfiguration<'_>) -> bool,
    {
        let formatted = format_string(value);
        let mut edits = Vec::new();

        for config in self.build_configurations() {
            if !filter(&config) {
                continue;
            }
            let Some(settings) = config.settings else {
                continue;
            };
            edits.push(self.setting_edit(settings, key, &formatted)?);
        }

        let changed = edits.len();
        self.apply_edits(edits)?;
        Ok(changed)
    }

    fn setting_edit(&self, settings: &Node, key: &str, formatted: &str) -> Result<Edit> {
        let Some(entries) = settings.entries() else {
            bail!("buildSettings is not a dictionary");
        };

        if let Some(existing) = entries.iter().find(|e| e.key == key) {
            return Ok(Edit {
                span: existing.value.span,
                text: formatted.to_string(),
            });
        }

        let key_text = format_string(key);
        let close = settings.span.end - 1;
        let inner = &self.contents[settings.span.start + 1..close];

        if !inner.contains('\n') {
            return Ok(Edit {
                span: Span { start: close, end: close },
                text: format!(" {} = {}; ", key_text, formatted),
            });
        }

        // Xcode keeps build settings sorted by key
        let anchor = entries
            .iter()
            .find(|e| e.key.as_str() > key)
            .map(|e| e.key_span.start)
            .unwrap_or(close);
        let line_start = self.line_start(anchor);

        let indent = match entries.first() {
            Some(first) => self.contents[self.line_start(first.key_span.start)..first.key_span.start].to_string(),
            None => format!("{}\t", &self.contents[line_start..close]),
        };

        Ok(Edit {
            span: Span { start: line_start, end: line_start },
            text: format!("{}{} = {};\n", indent, key_text, formatted),
        })
    }

    fn line_start(&self, offset: usize) -> usize {
        self.contents[..offset].rfind('\n').map_or(0, |i| i + 1)
    }

    fn apply_edits(&mut self, mut edits: Vec<Edit>) -> Result<()> {
        if edits.is_empty() {
            return Ok(());
        }

        edits.sort_by(|a, b| b.span.start.cmp(&a.span.start));
        let mut contents = self.contents.clone();
        for edit in edits {
            contents.replace_range(edit.span.start..edit.span.end, &edit.text);
        }

        self.root = parse(&contents).context("Edited project file no longer parses")?;
        self.contents = contents;
        Ok(())
    }

    /// Write the project back to disk
    pub fn save(&self) -> Result<()> {
        fs::write(&self.path, &self.contents)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }
}
