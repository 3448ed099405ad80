//! Comment/string-aware line classification
//!
//! Every regular expression used to recognise SimpleVB statements lives here.
//! The builder and the validator only see [`LineClass`], so a real lexer can
//! replace this module without touching them.
//!
//! Known imprecision: string detection toggles on every `"`, so an escaped
//! quote (`""`) inside a literal is only handled by toggle parity. Statement
//! separators (`:`) are not split.

use std::sync::LazyLock;

use regex::Regex;

use crate::models::symbol::SymbolKind;

const MODIFIERS: &str = "Public|Private|Protected|Friend|Shared|Overrides|Overridable|Overloads|\
NotOverridable|MustOverride|MustInherit|NotInheritable|Partial|Shadows|ReadOnly|WriteOnly|Default|\
Static|Async|Iterator|Widening|Narrowing|Declare|Delegate|Ansi|Unicode|Auto";

static HEADER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)^((?:(?:{MODIFIERS})\s+)*)(Sub|Function|Class|Module|Property|Structure|Interface|Enum|Namespace)\s+([\p{{L}}_]\w*(?:\.[\p{{L}}_]\w*)*)"
    ))
    .expect("header regex")
});

static END_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^End\s+(Sub|Function|Class|Module|Property|Structure|Interface|Enum|Namespace|Get|Set|If|While|Select|Try|With|Using|SyncLock)\b",
    )
    .expect("end regex")
});

static SHORT_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(Next|Loop|Wend)\b").expect("short end regex"));

static REGION_END_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^#End\s+Region\b").expect("region end regex"));

static REGION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)^#Region\b\s*(?:"([^"]*)")?"#).expect("region regex")
});

static IMPORTS_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^Imports\s+(?:([\p{L}_]\w*)\s*=\s*)?([\p{L}_][\w.]*)").expect("imports regex")
});

static IMPLEMENTS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^Implements\s+(.+)$").expect("implements regex"));

static LIB_ALIAS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?i)^(?:Lib|Alias)\s+"[^"]*"\s*"#).expect("lib regex"));

static CLAUSE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:Implements|Handles)\b").expect("clause regex"));

static CONTROL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(If|For|While|Do|Select|Try|With|Using|SyncLock)\b").expect("control regex")
});

static ACCESSOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(?:(?:Public|Private|Protected|Friend)\s+)*(Get|Set)\s*(?:\(.*)?$")
        .expect("accessor regex")
});

static THEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\bThen\b").expect("then regex"));

static BRANCH_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(ElseIf|Else\s+If|Else|Case|Catch|Finally)\b").expect("branch regex")
});

static DECLARATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^((?:(?:Dim|Const|Static|Public|Private|Protected|Friend|Shared|ReadOnly|WithEvents|Shadows)\s+)+)(.+)$",
    )
    .expect("declaration regex")
});

static DECLARATOR_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^([\p{L}_]\w*)\s*(?:\([^)]*\))?\??\s*(?:As\s+(New\s+)?(.+?))?\s*$")
        .expect("declarator regex")
});

static TYPE_TAIL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s+(?:With|From)\b.*$").expect("type tail regex"));

static ENUM_MEMBER_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([\p{L}_]\w*)\s*(?:=.*)?$").expect("enum member regex"));

static TERMINATOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)^(Return|Throw)\b").expect("terminator regex"));

static TODO_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(TODO|FIXME)\b").expect("todo regex"));

static NUMBER_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+(?:\.\d+)?[A-Za-z]{0,2}\b").expect("number regex")
});

const KEYWORDS: &[&str] = &[
    "addhandler", "alias", "and", "andalso", "as", "byref", "byval", "call", "case", "catch",
    "class", "const", "declare", "default", "delegate", "dim", "do", "each", "else", "elseif",
    "end", "enum", "erase", "error", "event", "exit", "false", "finally", "for", "friend",
    "function", "get", "goto", "handles", "if", "implements", "imports", "in", "inherits",
    "interface", "is", "isnot", "let", "lib", "loop", "me", "mod", "module", "mustinherit",
    "mustoverride", "mybase", "namespace", "new", "next", "not", "nothing", "notinheritable",
    "notoverridable", "of", "on", "operator", "optional", "or", "orelse", "overloads",
    "overridable", "overrides", "paramarray", "partial", "private", "property", "protected",
    "public", "raiseevent", "readonly", "redim", "removehandler", "resume", "return", "select",
    "set", "shadows", "shared", "static", "step", "structure", "sub", "synclock", "then",
    "throw", "to", "true", "try", "until", "using", "wend", "when", "while", "with",
    "withevents", "writeonly",
];

/// Kinds of delimited regions tracked on a block stack
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockType {
    Sub,
    Function,
    Class,
    Module,
    Property,
    Structure,
    Interface,
    Enum,
    Namespace,
    Region,
    Get,
    Set,
    If,
    For,
    While,
    Do,
    Select,
    Try,
    With,
    Using,
    SyncLock,
}

impl BlockType {
    pub fn from_keyword(word: &str) -> Option<Self> {
        let block = match word.to_ascii_lowercase().as_str() {
            "sub" => Self::Sub,
            "function" => Self::Function,
            "class" => Self::Class,
            "module" => Self::Module,
            "property" => Self::Property,
            "structure" => Self::Structure,
            "interface" => Self::Interface,
            "enum" => Self::Enum,
            "namespace" => Self::Namespace,
            "get" => Self::Get,
            "set" => Self::Set,
            "if" => Self::If,
            "for" | "next" => Self::For,
            "while" | "wend" => Self::While,
            "do" | "loop" => Self::Do,
            "select" => Self::Select,
            "try" => Self::Try,
            "with" => Self::With,
            "using" => Self::Using,
            "synclock" => Self::SyncLock,
            _ => return None,
        };
        Some(block)
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Sub => "Sub",
            Self::Function => "Function",
            Self::Class => "Class",
            Self::Module => "Module",
            Self::Property => "Property",
            Self::Structure => "Structure",
            Self::Interface => "Interface",
            Self::Enum => "Enum",
            Self::Namespace => "Namespace",
            Self::Region => "#Region",
            Self::Get => "Get",
            Self::Set => "Set",
            Self::If => "If",
            Self::For => "For",
            Self::While => "While",
            Self::Do => "Do",
            Self::Select => "Select",
            Self::Try => "Try",
            Self::With => "With",
            Self::Using => "Using",
            Self::SyncLock => "SyncLock",
        }
    }

    /// Canonical statement that closes this block
    pub fn closing_statement(&self) -> &'static str {
        match self {
            Self::Sub => "End Sub",
            Self::Function => "End Function",
            Self::Class => "End Class",
            Self::Module => "End Module",
            Self::Property => "End Property",
            Self::Structure => "End Structure",
            Self::Interface => "End Interface",
            Self::Enum => "End Enum",
            Self::Namespace => "End Namespace",
            Self::Region => "#End Region",
            Self::Get => "End Get",
            Self::Set => "End Set",
            Self::If => "End If",
            Self::For => "Next",
            Self::While => "End While",
            Self::Do => "Loop",
            Self::Select => "End Select",
            Self::Try => "End Try",
            Self::With => "End With",
            Self::Using => "End Using",
            Self::SyncLock => "End SyncLock",
        }
    }

    /// Symbol kind produced when this block is a declaration
    pub fn symbol_kind(&self) -> Option<SymbolKind> {
        let kind = match self {
            Self::Sub => SymbolKind::Method,
            Self::Function => SymbolKind::Function,
            Self::Class => SymbolKind::Class,
            Self::Module => SymbolKind::Module,
            Self::Property => SymbolKind::Property,
            Self::Structure => SymbolKind::Structure,
            Self::Interface => SymbolKind::Interface,
            Self::Enum => SymbolKind::Enum,
            Self::Namespace | Self::Region => SymbolKind::Namespace,
            _ => return None,
        };
        Some(kind)
    }

    /// Blocks whose body is executable code
    pub fn is_method_like(&self) -> bool {
        matches!(
            self,
            Self::Sub | Self::Function | Self::Property | Self::Get | Self::Set
        )
    }

    pub fn is_control(&self) -> bool {
        matches!(
            self,
            Self::If
                | Self::For
                | Self::While
                | Self::Do
                | Self::Select
                | Self::Try
                | Self::With
                | Self::Using
                | Self::SyncLock
        )
    }
}

/// A closing statement and the block type it closes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockEnd {
    pub block: BlockType,
    /// Normalized statement as written (`End Sub`, `Next`, `Wend`, ...)
    pub statement: String,
}

/// Parsed declaration header (`[modifiers] Sub|Function|... Name[(Of T)][(args)] [As T]`)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub block: BlockType,
    pub modifiers: Vec<String>,
    pub name: String,
    /// Byte offset of the name in the line
    pub name_offset: usize,
    /// Generic parameter list without parentheses (`Of T`)
    pub type_params: Option<String>,
    /// Argument list without parentheses
    pub params: Option<String>,
    /// Byte offset of `params` in the line
    pub params_offset: usize,
    pub return_type: Option<String>,
    /// Line ends with the `_` continuation marker
    pub continued: bool,
}

impl Header {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers
            .iter()
            .any(|m| m.eq_ignore_ascii_case(modifier))
    }

    /// Members that are declared without a body
    pub fn is_bodyless(&self) -> bool {
        self.has_modifier("MustOverride") || self.has_modifier("Declare") || self.has_modifier("Delegate")
    }

    /// Whether this header opens a block that needs a closing statement
    ///
    /// `next_code` is the next non-empty code line, used to tell expanded
    /// properties (followed by `Get`/`Set`) from auto-implemented ones.
    pub fn opens_block(&self, inside_interface: bool, next_code: Option<&str>) -> bool {
        match self.block {
            BlockType::Sub | BlockType::Function => !inside_interface && !self.is_bodyless(),
            BlockType::Property => {
                !inside_interface
                    && !self.is_bodyless()
                    && next_code.is_some_and(|line| ACCESSOR_RE.is_match(line))
            }
            _ => true,
        }
    }

    /// Signature summary used as symbol detail
    pub fn detail(&self) -> String {
        let mut detail = self.block.keyword().to_string();
        if let Some(type_params) = &self.type_params {
            detail.push_str(&format!("({})", type_params));
        }
        if matches!(
            self.block,
            BlockType::Sub | BlockType::Function | BlockType::Property
        ) {
            detail.push_str(&format!("({})", self.params.as_deref().unwrap_or("")));
            if let Some(return_type) = &self.return_type {
                detail.push_str(" As ");
                detail.push_str(return_type);
            }
        }
        detail
    }
}

/// Start of a control-flow block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlStart {
    pub block: BlockType,
    /// `If` carries a `Then`
    pub has_then: bool,
    /// `If ... Then <statement>` on one line; never opens a block
    pub single_line: bool,
}

/// Branch separators inside a control block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    ElseIf,
    Else,
    Case,
    Catch,
    Finally,
}

impl Branch {
    pub fn keyword(&self) -> &'static str {
        match self {
            Self::ElseIf => "ElseIf",
            Self::Else => "Else",
            Self::Case => "Case",
            Self::Catch => "Catch",
            Self::Finally => "Finally",
        }
    }
}

/// A single declared name in a `Dim`/`Const`/field statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declarator {
    pub name: String,
    /// Byte offset of the name in the line
    pub offset: usize,
    /// Type written on this declarator (`As T`)
    pub own_type: Option<String>,
    /// Type after applying the VB rule that `Dim a, b As T` types both
    pub effective_type: Option<String>,
    pub has_initializer: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub modifiers: Vec<String>,
    pub declarators: Vec<Declarator>,
}

impl Declaration {
    pub fn has_modifier(&self, modifier: &str) -> bool {
        self.modifiers
            .iter()
            .any(|m| m.eq_ignore_ascii_case(modifier))
    }

    pub fn is_const(&self) -> bool {
        self.has_modifier("Const")
    }

    pub fn is_dim(&self) -> bool {
        self.has_modifier("Dim")
    }
}

/// Classification of one stripped source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass {
    Empty,
    BlockEnd(BlockEnd),
    Header(Header),
    Region { name: String, name_offset: usize },
    Imports { name: String, offset: usize, alias: bool },
    /// `Implements A, B`: names with their byte offsets
    Implements(Vec<(String, usize)>),
    Control(ControlStart),
    Branch(Branch),
    Declaration(Declaration),
    Plain,
}

/// Truncate a line at the first apostrophe outside a string literal
///
/// Returns a prefix of `line`, so columns computed on the result are valid on
/// the original line.
pub fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (index, ch) in line.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            '\'' if !in_string => return &line[..index],
            _ => {}
        }
    }
    line
}

/// Comment text following the code part of a line, if any
pub fn comment_part(line: &str) -> Option<&str> {
    let code = strip_comment(line);
    (code.len() < line.len()).then(|| &line[code.len() + 1..])
}

/// Replace string literal contents with spaces, keeping byte offsets
pub fn mask_strings(code: &str) -> String {
    let mut out = String::with_capacity(code.len());
    let mut in_string = false;
    for ch in code.chars() {
        if ch == '"' {
            in_string = !in_string;
            out.push(ch);
        } else if in_string {
            out.extend(std::iter::repeat_n(' ', ch.len_utf8()));
        } else {
            out.push(ch);
        }
    }
    out
}

/// Column (in chars) of a byte offset within a line
pub fn char_col(line: &str, byte: usize) -> u32 {
    line.get(..byte.min(line.len()))
        .map(|prefix| prefix.chars().count())
        .unwrap_or(0) as u32
}

/// Line ends with the `_` continuation marker
pub fn is_continued(code: &str) -> bool {
    let trimmed = code.trim_end();
    trimmed == "_" || trimmed.ends_with(" _") || trimmed.ends_with("\t_")
}

pub fn is_keyword(word: &str) -> bool {
    let lower = word.to_ascii_lowercase();
    KEYWORDS.binary_search(&lower.as_str()).is_ok()
}

/// `Return ...` or `Throw ...` as a whole statement
pub fn is_terminator(trimmed: &str) -> bool {
    TERMINATOR_RE.is_match(trimmed)
}

/// Next non-empty code line after `index`, comment-stripped and trimmed
pub fn next_code_line<'a>(lines: &[&'a str], index: usize) -> Option<&'a str> {
    lines
        .iter()
        .skip(index + 1)
        .map(|line| strip_comment(line).trim())
        .find(|code| !code.is_empty())
}

/// First `TODO`/`FIXME` marker in a comment: byte offset and marker
pub fn todo_marker(comment: &str) -> Option<(usize, &str)> {
    TODO_RE.find(comment).map(|m| (m.start(), m.as_str()))
}

/// Numeric literals (with any type suffix) in a string-masked code line
pub fn numeric_literals(masked: &str) -> Vec<(usize, &str)> {
    NUMBER_RE
        .find_iter(masked)
        .map(|m| (m.start(), m.as_str()))
        .collect()
}

/// Whole-word, case-insensitive occurrence of an identifier
pub fn contains_word(haystack: &str, word: &str) -> bool {
    if word.is_empty() {
        return false;
    }
    let haystack = haystack.to_ascii_lowercase();
    let word = word.to_ascii_lowercase();
    let is_ident = |c: char| c.is_alphanumeric() || c == '_';

    haystack.match_indices(&word).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + word.len()..].chars().next();
        !before.is_some_and(is_ident) && !after.is_some_and(is_ident)
    })
}

/// Split on top-level commas, respecting brackets and string literals
///
/// Returns each piece with its byte offset in `s`.
pub fn split_top_level(s: &str) -> Vec<(usize, &str)> {
    let mut pieces = Vec::new();
    let mut depth = 0usize;
    let mut in_string = false;
    let mut start = 0;

    for (index, ch) in s.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            _ if in_string => {}
            '(' | '{' | '<' => depth += 1,
            ')' | '}' | '>' => depth = depth.saturating_sub(1),
            ',' if depth == 0 => {
                pieces.push((start, &s[start..index]));
                start = index + 1;
            }
            _ => {}
        }
    }
    pieces.push((start, &s[start..]));
    pieces
}

/// Byte index of the first top-level `=` in `s`
fn top_level_assignment(s: &str) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    for (index, ch) in s.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            _ if in_string => {}
            '(' | '{' => depth += 1,
            ')' | '}' => depth = depth.saturating_sub(1),
            '=' if depth == 0 => return Some(index),
            _ => {}
        }
    }
    None
}

/// Split a leading parenthesized group: `"(a, (b)) rest"` -> `("a, (b)", " rest")`
fn take_group(s: &str) -> Option<(&str, &str)> {
    if !s.starts_with('(') {
        return None;
    }
    let mut depth = 0usize;
    let mut in_string = false;
    for (index, ch) in s.char_indices() {
        match ch {
            '"' => in_string = !in_string,
            _ if in_string => {}
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    return Some((&s[1..index], &s[index + 1..]));
                }
            }
            _ => {}
        }
    }
    None
}

fn is_generic_params(inner: &str) -> bool {
    strip_keyword(inner.trim_start(), "of ").is_some()
}

/// Rest of `text` after a leading ASCII keyword, matched case-insensitively
fn strip_keyword<'a>(text: &'a str, keyword: &str) -> Option<&'a str> {
    let rest = text.get(keyword.len()..)?;
    let head = text.get(..keyword.len())?;
    (!rest.is_empty() && head.eq_ignore_ascii_case(keyword)).then_some(rest)
}

/// Classify a comment-stripped line (untrimmed; offsets refer to it)
pub fn classify(code: &str) -> LineClass {
    let text = code.trim();
    if text.is_empty() {
        return LineClass::Empty;
    }
    let indent = code.len() - code.trim_start().len();

    if let Some(end) = parse_block_end(text) {
        return LineClass::BlockEnd(end);
    }
    if let Some(header) = parse_header(code) {
        return LineClass::Header(header);
    }
    if let Some(caps) = REGION_RE.captures(text) {
        let (name, name_offset) = match caps.get(1) {
            Some(m) => (m.as_str().to_string(), indent + m.start()),
            None => ("Region".to_string(), indent),
        };
        return LineClass::Region { name, name_offset };
    }
    if let Some(caps) = IMPORTS_RE.captures(text) {
        let (name, alias) = match (caps.get(1), caps.get(2)) {
            (Some(alias), _) => (alias, true),
            (None, Some(target)) => (target, false),
            _ => return LineClass::Plain,
        };
        return LineClass::Imports {
            name: name.as_str().to_string(),
            offset: indent + name.start(),
            alias,
        };
    }
    if let Some(caps) = IMPLEMENTS_RE.captures(text)
        && let Some(list) = caps.get(1)
    {
        let names = split_top_level(list.as_str())
            .into_iter()
            .filter_map(|(offset, piece)| {
                let name = piece.trim().trim_end_matches('_').trim();
                if name.is_empty() {
                    return None;
                }
                let lead = piece.len() - piece.trim_start().len();
                Some((name.to_string(), indent + list.start() + offset + lead))
            })
            .collect();
        return LineClass::Implements(names);
    }
    if let Some(control) = parse_control(text) {
        return LineClass::Control(control);
    }
    if let Some(caps) = BRANCH_RE.captures(text) {
        let word = caps[1].to_ascii_lowercase();
        let branch = match word.as_str() {
            "else" => Branch::Else,
            "case" => Branch::Case,
            "catch" => Branch::Catch,
            "finally" => Branch::Finally,
            _ => Branch::ElseIf,
        };
        return LineClass::Branch(branch);
    }
    if let Some(declaration) = parse_declaration(code) {
        return LineClass::Declaration(declaration);
    }
    LineClass::Plain
}

fn parse_block_end(text: &str) -> Option<BlockEnd> {
    if REGION_END_RE.is_match(text) {
        return Some(BlockEnd {
            block: BlockType::Region,
            statement: "#End Region".to_string(),
        });
    }
    if let Some(caps) = END_RE.captures(text) {
        let block = BlockType::from_keyword(&caps[1])?;
        return Some(BlockEnd {
            block,
            statement: format!("End {}", block.keyword()),
        });
    }
    let caps = SHORT_END_RE.captures(text)?;
    let block = BlockType::from_keyword(&caps[1])?;
    let word = caps[1].to_ascii_lowercase();
    let statement = match word.as_str() {
        "next" => "Next",
        "loop" => "Loop",
        _ => "Wend",
    };
    Some(BlockEnd {
        block,
        statement: statement.to_string(),
    })
}

/// Parse a declaration header from an untrimmed code line
pub fn parse_header(code: &str) -> Option<Header> {
    let indent = code.len() - code.trim_start().len();
    let text = code.trim();
    let caps = HEADER_RE.captures(text)?;

    let block = BlockType::from_keyword(&caps[2])?;
    let modifiers = caps[1].split_whitespace().map(str::to_string).collect();
    let name_match = caps.get(3)?;
    let continued = is_continued(text);

    let mut rest_offset = indent + caps.get(0)?.end();
    let mut rest = &text[caps.get(0)?.end()..];

    let mut header = Header {
        block,
        modifiers,
        name: name_match.as_str().to_string(),
        name_offset: indent + name_match.start(),
        type_params: None,
        params: None,
        params_offset: rest_offset,
        return_type: None,
        continued,
    };

    // Declare Function Foo Lib "user32" Alias "FooW" (...)
    while let Some(m) = LIB_ALIAS_RE.find(rest.trim_start()) {
        let skipped = rest.len() - rest.trim_start().len() + m.end();
        rest_offset += skipped;
        rest = &rest[skipped..];
    }

    for _ in 0..2 {
        let lead = rest.len() - rest.trim_start().len();
        let candidate = &rest[lead..];
        if !candidate.starts_with('(') {
            break;
        }
        match take_group(candidate) {
            Some((inner, after)) => {
                if header.type_params.is_none()
                    && header.params.is_none()
                    && is_generic_params(inner)
                {
                    header.type_params = Some(inner.trim().to_string());
                } else {
                    header.params = Some(inner.trim().to_string());
                    header.params_offset = rest_offset + lead + 1;
                }
                rest_offset += lead + 1 + inner.len() + 1;
                rest = after;
            }
            None => {
                // Argument list continues on the next line
                let inner = candidate[1..].trim_end().trim_end_matches('_');
                header.params = Some(inner.trim().to_string());
                header.params_offset = rest_offset + lead + 1;
                rest = "";
                break;
            }
        }
    }

    let tail = rest.trim();
    if let Some(after_as) = strip_keyword(tail, "as ") {
        let mut return_type = after_as.trim_start();
        if let Some(m) = CLAUSE_RE.find(return_type) {
            return_type = &return_type[..m.start()];
        }
        let return_type = return_type.trim_end().trim_end_matches('_').trim();
        if !return_type.is_empty() {
            header.return_type = Some(return_type.to_string());
        }
    }

    Some(header)
}

fn parse_control(text: &str) -> Option<ControlStart> {
    if let Some(caps) = ACCESSOR_RE.captures(text) {
        let block = BlockType::from_keyword(&caps[1])?;
        return Some(ControlStart {
            block,
            has_then: false,
            single_line: false,
        });
    }

    let caps = CONTROL_RE.captures(text)?;
    let block = BlockType::from_keyword(&caps[1])?;
    if block != BlockType::If {
        return Some(ControlStart {
            block,
            has_then: false,
            single_line: false,
        });
    }

    let masked = mask_strings(text);
    let then = THEN_RE.find(&masked);
    let single_line = then.is_some_and(|m| {
        let after = masked[m.end()..].trim();
        !after.is_empty() && after != "_"
    });
    Some(ControlStart {
        block,
        has_then: then.is_some(),
        single_line,
    })
}

/// Parse `Dim`/`Const`/field declarations from an untrimmed code line
pub fn parse_declaration(code: &str) -> Option<Declaration> {
    let indent = code.len() - code.trim_start().len();
    let text = code.trim();
    let caps = DECLARATION_RE.captures(text)?;
    let modifiers: Vec<String> = caps[1].split_whitespace().map(str::to_string).collect();
    let body = caps.get(2)?;

    let mut declarators = Vec::new();
    for (offset, piece) in split_top_level(body.as_str()) {
        let (head, has_initializer) = match top_level_assignment(piece) {
            Some(eq) => (&piece[..eq], true),
            None => (piece, false),
        };
        let head_trimmed = head.trim();
        let m = DECLARATOR_RE.captures(head_trimmed)?;
        let name = m.get(1)?;
        if is_keyword(name.as_str()) {
            return None;
        }
        let own_type = m.get(3).map(|t| {
            let mut type_name = TYPE_TAIL_RE.replace(t.as_str(), "").to_string();
            if m.get(2).is_some() {
                type_name = strip_constructor_args(&type_name);
            }
            type_name.trim().to_string()
        });
        let lead = piece.len() - piece.trim_start().len();
        declarators.push(Declarator {
            name: name.as_str().to_string(),
            offset: indent + body.start() + offset + lead + name.start(),
            own_type,
            effective_type: None,
            has_initializer,
        });
    }

    let declaration = Declaration {
        modifiers,
        declarators,
    };
    let explicit = declaration.is_dim() || declaration.is_const() || declaration.has_modifier("Static");
    let typed = declaration
        .declarators
        .iter()
        .any(|d| d.own_type.is_some() || d.has_initializer);
    if !explicit && !typed {
        return None;
    }

    Some(apply_shared_types(declaration))
}

/// `Dim a, b As T` declares both as `T`; initialized names keep their own type
fn apply_shared_types(mut declaration: Declaration) -> Declaration {
    let mut shared: Option<String> = None;
    for declarator in declaration.declarators.iter_mut().rev() {
        if let Some(own) = &declarator.own_type {
            shared = Some(own.clone());
            declarator.effective_type = Some(own.clone());
        } else if !declarator.has_initializer {
            declarator.effective_type = shared.clone();
        }
    }
    declaration
}

/// `Foo(1, 2)` -> `Foo`, keeping generic arguments (`List(Of T)`)
fn strip_constructor_args(type_name: &str) -> String {
    let trimmed = type_name.trim();
    if let Some(open) = trimmed.rfind('(')
        && trimmed.ends_with(')')
        && !is_generic_params(&trimmed[open + 1..])
    {
        return trimmed[..open].trim_end().to_string();
    }
    trimmed.to_string()
}

/// `Name [= value]` inside an `Enum` block
pub fn parse_enum_member(code: &str) -> Option<(String, usize)> {
    let indent = code.len() - code.trim_start().len();
    let caps = ENUM_MEMBER_RE.captures(code.trim())?;
    let name = caps.get(1)?;
    if is_keyword(name.as_str()) {
        return None;
    }
    Some((name.as_str().to_string(), indent + name.start()))
}

/// An argument in a header's parameter list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argument {
    pub name: String,
    /// Byte offset of the name in the line
    pub offset: usize,
    /// `x As Integer = 5` with passing modifiers removed
    pub signature: String,
}

/// Decompose a parameter list, respecting nested brackets
pub fn parse_arguments(params: &str, params_offset: usize) -> Vec<Argument> {
    split_top_level(params)
        .into_iter()
        .filter_map(|(offset, piece)| {
            let mut rest = piece.trim_start();
            let mut consumed = piece.len() - rest.len();

            // Attributes: <Out()> ByRef x As Integer
            while rest.starts_with('<') {
                let close = rest.find('>')?;
                let after = &rest[close + 1..];
                let trimmed = after.trim_start();
                consumed += close + 1 + (after.len() - trimmed.len());
                rest = trimmed;
            }

            loop {
                let word_end = rest
                    .find(|c: char| c.is_whitespace())
                    .unwrap_or(rest.len());
                let word = &rest[..word_end];
                let is_modifier = ["ByVal", "ByRef", "Optional", "ParamArray"]
                    .iter()
                    .any(|m| m.eq_ignore_ascii_case(word));
                if !is_modifier || word_end == rest.len() {
                    break;
                }
                let after = &rest[word_end..];
                let trimmed = after.trim_start();
                consumed += word_end + (after.len() - trimmed.len());
                rest = trimmed;
            }

            let name_len = rest
                .find(|c: char| !(c.is_alphanumeric() || c == '_'))
                .unwrap_or(rest.len());
            if name_len == 0 {
                return None;
            }
            let name = &rest[..name_len];
            if name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
                return None;
            }

            Some(Argument {
                name: name.to_string(),
                offset: params_offset + offset + consumed,
                signature: rest.trim_end().trim_end_matches('_').trim_end().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_sorted_for_binary_search() {
        let mut sorted = KEYWORDS.to_vec();
        sorted.sort_unstable();
        assert_eq!(sorted, KEYWORDS);
    }

    #[test]
    fn test_strip_comment_truncates() {
        assert_eq!(strip_comment("x = 1 ' set x"), "x = 1 ");
        assert_eq!(strip_comment("s = \"it's\" ' note"), "s = \"it's\" ");
        assert_eq!(strip_comment("no comment"), "no comment");
        assert_eq!(strip_comment("' whole line"), "");
    }

    #[test]
    fn test_strip_comment_doubled_quotes_by_parity() {
        // "" toggles twice, so the apostrophe after the literal is still a comment
        assert_eq!(strip_comment("s = \"say \"\"hi\"\"\" ' c"), "s = \"say \"\"hi\"\"\" ");
    }

    #[test]
    fn test_comment_part() {
        assert_eq!(comment_part("x = 1 ' TODO: fix"), Some(" TODO: fix"));
        assert_eq!(comment_part("x = 1"), None);
    }

    #[test]
    fn test_strip_keyword_on_multibyte_text() {
        assert_eq!(strip_keyword("Of T", "of "), Some("T"));
        assert_eq!(strip_keyword("as Integer", "as "), Some("Integer"));
        assert_eq!(strip_keyword("größe As Integer", "of "), None);
        assert_eq!(strip_keyword("ÄÖ", "as "), None);
        assert_eq!(strip_keyword("As ", "as "), None);
        assert!(!is_generic_params("größe)"));
    }

    #[test]
    fn test_mask_strings_keeps_offsets() {
        let code = "x = \"a 42 é\" + 7";
        let masked = mask_strings(code);
        assert_eq!(masked.len(), code.len());
        assert!(!masked.contains("42"));
        assert_eq!(masked.find('7'), code.find('7'));
    }

    #[test]
    fn test_split_top_level_respects_nesting() {
        let pieces: Vec<&str> = split_top_level("a As List(Of Integer), b As Dictionary(Of String, Integer), c As String = \"x,y\"")
            .into_iter()
            .map(|(_, p)| p.trim())
            .collect();
        assert_eq!(
            pieces,
            vec![
                "a As List(Of Integer)",
                "b As Dictionary(Of String, Integer)",
                "c As String = \"x,y\""
            ]
        );
    }

    #[test]
    fn test_classify_block_ends() {
        let ends = [
            ("End Sub", BlockType::Sub, "End Sub"),
            ("end function", BlockType::Function, "End Function"),
            ("Next i", BlockType::For, "Next"),
            ("Loop While x > 0", BlockType::Do, "Loop"),
            ("Wend", BlockType::While, "Wend"),
            ("End While", BlockType::While, "End While"),
            ("#End Region", BlockType::Region, "#End Region"),
        ];
        for (line, block, statement) in ends {
            match classify(line) {
                LineClass::BlockEnd(end) => {
                    assert_eq!(end.block, block, "{line}");
                    assert_eq!(end.statement, statement, "{line}");
                }
                other => panic!("{line}: {other:?}"),
            }
        }
        assert_eq!(classify("End"), LineClass::Plain);
        assert_eq!(classify("NextItem()"), LineClass::Plain);
    }

    #[test]
    fn test_parse_sub_header() {
        let header = parse_header("Public Sub MySub(x As Integer, y As String)").unwrap();
        assert_eq!(header.block, BlockType::Sub);
        assert_eq!(header.name, "MySub");
        assert_eq!(header.name_offset, 11);
        assert_eq!(header.params.as_deref(), Some("x As Integer, y As String"));
        assert_eq!(header.params_offset, 17);
        assert_eq!(header.detail(), "Sub(x As Integer, y As String)");
    }

    #[test]
    fn test_parse_generic_function_header() {
        let header =
            parse_header("    Function Pick(Of T)(items As List(Of T)) As T Implements IPicker.Pick")
                .unwrap();
        assert_eq!(header.name, "Pick");
        assert_eq!(header.type_params.as_deref(), Some("Of T"));
        assert_eq!(header.params.as_deref(), Some("items As List(Of T)"));
        assert_eq!(header.return_type.as_deref(), Some("T"));
        assert_eq!(header.detail(), "Function(Of T)(items As List(Of T)) As T");
    }

    #[test]
    fn test_parse_header_without_params() {
        let header = parse_header("Public Class Customer").unwrap();
        assert_eq!(header.block, BlockType::Class);
        assert_eq!(header.params, None);
        assert_eq!(header.detail(), "Class");

        let header = parse_header("Function Answer").unwrap();
        assert_eq!(header.return_type, None);
        assert_eq!(header.detail(), "Function()");
    }

    #[test]
    fn test_parse_declare_header() {
        let header =
            parse_header("Private Declare Function Beep Lib \"kernel32\" (ByVal f As Integer) As Integer")
                .unwrap();
        assert!(header.is_bodyless());
        assert_eq!(header.params.as_deref(), Some("ByVal f As Integer"));
        assert_eq!(header.return_type.as_deref(), Some("Integer"));
    }

    #[test]
    fn test_continued_header() {
        let header = parse_header("Function Total(a As Integer, _").unwrap();
        assert!(header.continued);
        assert_eq!(header.params.as_deref(), Some("a As Integer,"));
        assert_eq!(header.return_type, None);
    }

    #[test]
    fn test_property_opens_block_only_with_accessor() {
        let header = parse_header("Public Property Name As String").unwrap();
        assert!(!header.opens_block(false, Some("Public Property Age As Integer")));
        assert!(header.opens_block(false, Some("Get")));
        assert!(header.opens_block(false, Some("Private Set(value As String)")));
        assert!(!header.opens_block(true, Some("Get")));
    }

    #[test]
    fn test_interface_members_do_not_open_blocks() {
        let header = parse_header("Sub Draw()").unwrap();
        assert!(header.opens_block(false, None));
        assert!(!header.opens_block(true, None));
        let header = parse_header("Public MustOverride Function Area() As Double").unwrap();
        assert!(!header.opens_block(false, None));
    }

    #[test]
    fn test_classify_if_forms() {
        assert_eq!(
            classify("If x > 1 Then"),
            LineClass::Control(ControlStart {
                block: BlockType::If,
                has_then: true,
                single_line: false
            })
        );
        assert_eq!(
            classify("If x > 1 Then y = 2"),
            LineClass::Control(ControlStart {
                block: BlockType::If,
                has_then: true,
                single_line: true
            })
        );
        assert_eq!(
            classify("If s = \"Then\" _"),
            LineClass::Control(ControlStart {
                block: BlockType::If,
                has_then: false,
                single_line: false
            })
        );
    }

    #[test]
    fn test_classify_branches_and_controls() {
        assert_eq!(classify("Else"), LineClass::Branch(Branch::Else));
        assert_eq!(classify("ElseIf y Then"), LineClass::Branch(Branch::ElseIf));
        assert_eq!(classify("Case Else"), LineClass::Branch(Branch::Case));
        assert_eq!(classify("Catch ex As Exception"), LineClass::Branch(Branch::Catch));
        assert!(matches!(
            classify("Select Case value"),
            LineClass::Control(ControlStart { block: BlockType::Select, .. })
        ));
        assert!(matches!(
            classify("For Each item In items"),
            LineClass::Control(ControlStart { block: BlockType::For, .. })
        ));
        assert!(matches!(
            classify("Get"),
            LineClass::Control(ControlStart { block: BlockType::Get, .. })
        ));
        assert_eq!(classify("Set x = y"), LineClass::Plain);
        assert_eq!(classify("DoWork()"), LineClass::Plain);
    }

    #[test]
    fn test_classify_region_imports_implements() {
        assert_eq!(
            classify("#Region \"Helpers\""),
            LineClass::Region {
                name: "Helpers".to_string(),
                name_offset: 9
            }
        );
        assert_eq!(
            classify("Imports System.Text"),
            LineClass::Imports {
                name: "System.Text".to_string(),
                offset: 8,
                alias: false
            }
        );
        assert_eq!(
            classify("    Implements IShape, IComparable(Of Shape)"),
            LineClass::Implements(vec![
                ("IShape".to_string(), 15),
                ("IComparable(Of Shape)".to_string(), 23)
            ])
        );
    }

    #[test]
    fn test_parse_multi_declarator_dim() {
        let declaration = parse_declaration("    Dim a, b As String, c = 5").unwrap();
        assert!(declaration.is_dim());
        let names: Vec<_> = declaration.declarators.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(declaration.declarators[0].offset, 8);
        assert_eq!(declaration.declarators[1].offset, 11);
        assert_eq!(declaration.declarators[0].own_type, None);
        assert_eq!(declaration.declarators[0].effective_type.as_deref(), Some("String"));
        assert_eq!(declaration.declarators[2].effective_type, None);
        assert!(declaration.declarators[2].has_initializer);
    }

    #[test]
    fn test_parse_declaration_new_and_generics() {
        let declaration = parse_declaration("Private items As New List(Of String)").unwrap();
        assert_eq!(declaration.declarators[0].own_type.as_deref(), Some("List(Of String)"));

        let declaration = parse_declaration("Dim sb As New StringBuilder(64)").unwrap();
        assert_eq!(declaration.declarators[0].own_type.as_deref(), Some("StringBuilder"));

        let declaration = parse_declaration("Dim p As New Point() With {.X = 1}").unwrap();
        assert_eq!(declaration.declarators.len(), 1);
        assert_eq!(declaration.declarators[0].own_type.as_deref(), Some("Point"));
    }

    #[test]
    fn test_parse_declaration_rejects_non_declarations() {
        assert!(parse_declaration("Public Event Changed As EventHandler").is_none());
        assert!(parse_declaration("Private x").is_none());
        assert!(parse_declaration("Dim x").is_some());
        assert!(parse_declaration("Const MAX = 10").unwrap().is_const());
    }

    #[test]
    fn test_parse_arguments() {
        let line = "Sub Run(ByVal count As Integer, Optional ByRef names As List(Of String) = Nothing, <Out> x)";
        let header = parse_header(line).unwrap();
        let args = parse_arguments(header.params.as_deref().unwrap(), header.params_offset);
        let names: Vec<_> = args.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["count", "names", "x"]);
        assert_eq!(&line[args[0].offset..args[0].offset + 5], "count");
        assert_eq!(&line[args[1].offset..args[1].offset + 5], "names");
        assert_eq!(&line[args[2].offset..args[2].offset + 1], "x");
        assert_eq!(args[0].signature, "count As Integer");
        assert_eq!(args[1].signature, "names As List(Of String) = Nothing");
    }

    #[test]
    fn test_parse_arguments_empty() {
        assert!(parse_arguments("", 0).is_empty());
        assert!(parse_arguments("   ", 0).is_empty());
    }

    #[test]
    fn test_enum_member() {
        assert_eq!(parse_enum_member("    Red = 1"), Some(("Red".to_string(), 4)));
        assert_eq!(parse_enum_member("Green"), Some(("Green".to_string(), 0)));
        assert_eq!(parse_enum_member("Call Foo()"), None);
        assert_eq!(parse_enum_member("End"), None);
    }

    #[test]
    fn test_terminators_and_continuations() {
        assert!(is_terminator("Return x"));
        assert!(is_terminator("Throw New Exception()"));
        assert!(!is_terminator("ReturnValue = 1"));
        assert!(is_continued("If a AndAlso _"));
        assert!(!is_continued("my_var"));
    }

    #[test]
    fn test_todo_marker() {
        assert_eq!(todo_marker(" TODO: tidy"), Some((1, "TODO")));
        assert_eq!(todo_marker(" see FIXME later"), Some((5, "FIXME")));
        assert_eq!(todo_marker(" TODOS are fine"), None);
        assert_eq!(todo_marker(" todo lowercase"), None);
    }

    #[test]
    fn test_numeric_literals() {
        let found: Vec<_> = numeric_literals("x = 42 + y2 * 3.5 + 10L - &H1F")
            .into_iter()
            .map(|(_, lit)| lit)
            .collect();
        assert_eq!(found, vec!["42", "3.5", "10L"]);
        assert!(numeric_literals(&mask_strings("s = \"99\"")).is_empty());
    }

    #[test]
    fn test_contains_word() {
        assert!(contains_word("Return Total + 1", "total"));
        assert!(contains_word("Log($\"{x}\")", "x"));
        assert!(!contains_word("Dim maxValue = 1", "max"));
        assert!(!contains_word("my_x = 2", "x"));
        assert!(!contains_word("anything", ""));
    }

    #[test]
    fn test_char_col() {
        let line = "é = x";
        assert_eq!(char_col(line, line.find('x').unwrap()), 4);
        assert_eq!(char_col(line, 99), 5);
    }
}
