//! Recursive descent parser for Svelte markup.

use crate::ast::*;
use crate::error::{ParseError, ParseErrorKind};
use crate::lexer::{token_at, Lexer, Token, TokenKind};
use crate::ParseResult;
use smol_str::SmolStr;
use source_map::Span;

/// HTML void elements that are self-closing and should not have closing tags.
/// See: https://developer.mozilla.org/en-US/docs/Glossary/Void_element
const HTML_VOID_ELEMENTS: &[&str] = &[
    "area", "base", "br", "col", "embed", "hr", "img", "input", "link", "meta", "param", "source",
    "track", "wbr",
];

/// Returns true if the given element name is an HTML void element.
fn is_void_element(name: &str) -> bool {
    HTML_VOID_ELEMENTS
        .iter()
        .any(|void| void.eq_ignore_ascii_case(name))
}

/// The Svelte markup parser.
pub struct Parser<'src> {
    /// The source being parsed.
    source: &'src str,
    /// Current byte position.
    pos: usize,
    /// Names of the elements currently open, innermost last.
    open_tags: Vec<SmolStr>,
    /// Top-level script blocks found so far.
    scripts: Vec<Script>,
    /// Top-level style blocks found so far.
    styles: Vec<Style>,
    /// Parse errors collected during parsing.
    errors: Vec<ParseError>,
}

impl<'src> Parser<'src> {
    /// Creates a new parser.
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            pos: 0,
            open_tags: Vec::new(),
            scripts: Vec::new(),
            styles: Vec::new(),
            errors: Vec::new(),
        }
    }

    /// Parses the source into a document.
    pub fn parse(mut self) -> ParseResult {
        let span = Span::from_usize(0, self.source.len());
        let nodes = self.parse_children();
        ParseResult {
            document: Document {
                scripts: self.scripts,
                styles: self.styles,
                fragment: Fragment { nodes, span },
                span,
            },
            errors: self.errors,
        }
    }

    // === Token helpers ===

    fn at_end(&self) -> bool {
        self.pos >= self.source.len()
    }

    fn rest(&self) -> &'src str {
        &self.source[self.pos..]
    }

    /// Returns the next token without consuming it. Whitespace is skipped,
    /// so the token may start after the cursor.
    fn peek_token(&self) -> Token {
        token_at(self.source, self.pos)
    }

    /// True if `token` starts exactly at the cursor.
    fn is_adjacent(&self, token: Token) -> bool {
        token.span.start_usize() == self.pos
    }

    fn bump(&mut self, token: Token) {
        self.pos = token.span.end_usize();
    }

    /// True if the `<` token is followed directly by a tag name.
    fn opens_tag(&self, angle: Token) -> bool {
        let name = token_at(self.source, angle.span.end_usize());
        name.kind == TokenKind::Name
            && name.span.start == angle.span.end
            && name
                .span
                .text(self.source)
                .starts_with(|c: char| c.is_ascii_alphabetic())
    }

    /// True if a tag, closing tag, comment or mustache starts at `offset`.
    fn markup_at(&self, offset: usize) -> bool {
        let token = token_at(self.source, offset);
        token.span.start_usize() == offset
            && match token.kind {
                TokenKind::LAngle => self.opens_tag(token),
                TokenKind::LAngleSlash | TokenKind::CommentOpen | TokenKind::LAngleBang => true,
                kind => kind.opens_brace(),
            }
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }

    // === Template ===

    /// Parses nodes until the closing tag of the innermost open element (which
    /// is consumed) or the end of input.
    fn parse_children(&mut self) -> Vec<TemplateNode> {
        let mut nodes = Vec::new();
        loop {
            if self.at_end() {
                if let Some(open) = self.open_tags.last() {
                    let kind = ParseErrorKind::UnclosedTag {
                        tag_name: open.to_string(),
                    };
                    self.error(kind, Span::empty(self.source.len() as u32));
                }
                return nodes;
            }

            let token = self.peek_token();
            let node = match token.kind {
                _ if !self.is_adjacent(token) => Some(self.parse_text()),
                TokenKind::LAngleSlash => {
                    if self.parse_closing_tag(token) {
                        return nodes;
                    }
                    continue;
                }
                TokenKind::CommentOpen | TokenKind::LAngleBang => Some(self.parse_comment(token)),
                TokenKind::LAngle if self.opens_tag(token) => self.parse_element(token),
                kind if kind.opens_brace() => Some(self.parse_mustache(kind)),
                _ => Some(self.parse_text()),
            };
            nodes.extend(node);
        }
    }

    /// Handles `</name>`. Returns true when the innermost open element is
    /// finished, either because the tag closes it or because it closes an
    /// ancestor (left unconsumed for that ancestor).
    fn parse_closing_tag(&mut self, open: Token) -> bool {
        let start = open.span.start_usize();
        let name_token = token_at(self.source, open.span.end_usize());
        let (name, name_end) = match name_token.kind {
            TokenKind::Name => (
                name_token.span.text(self.source),
                name_token.span.end_usize(),
            ),
            _ => ("", open.span.end_usize()),
        };
        let span = Span::from_usize(start, name_end);

        match self.open_tags.last() {
            Some(open) if open.as_str() == name => {
                self.consume_closing_tag(name_end);
                true
            }
            Some(open) if self.open_tags.iter().any(|tag| tag == name) => {
                let kind = ParseErrorKind::UnclosedTag {
                    tag_name: open.to_string(),
                };
                self.error(kind, span);
                true
            }
            Some(open) => {
                let kind = ParseErrorKind::MismatchedClosingTag {
                    expected: open.to_string(),
                    found: name.to_string(),
                };
                self.error(kind, span);
                self.consume_closing_tag(name_end);
                false
            }
            None => {
                let kind = ParseErrorKind::UnexpectedClosingTag {
                    tag_name: name.to_string(),
                };
                self.error(kind, span);
                self.consume_closing_tag(name_end);
                false
            }
        }
    }

    /// Skips to just past the `>` that ends a closing tag.
    fn consume_closing_tag(&mut self, from: usize) {
        for token in Lexer::at(self.source, from) {
            match token.kind {
                TokenKind::RAngle => {
                    self.bump(token);
                    return;
                }
                TokenKind::Eof => break,
                _ => {}
            }
        }
        let kind = ParseErrorKind::UnexpectedEof {
            expected: TokenKind::RAngle.name().to_string(),
        };
        self.error(kind, Span::empty(self.source.len() as u32));
        self.pos = self.source.len();
    }

    fn parse_comment(&mut self, open: Token) -> TemplateNode {
        let start = open.span.start_usize();
        let terminator = match open.kind {
            TokenKind::CommentOpen => "-->",
            _ => ">",
        };
        let body_start = open.span.end_usize();
        self.pos = match self.source[body_start..].find(terminator) {
            Some(i) => body_start + i + terminator.len(),
            None => {
                let kind = ParseErrorKind::UnexpectedEof {
                    expected: format!("'{}'", terminator),
                };
                self.error(kind, Span::from_usize(start, self.source.len()));
                self.source.len()
            }
        };
        TemplateNode::Comment(Comment {
            span: Span::from_usize(start, self.pos),
        })
    }

    fn parse_text(&mut self) -> TemplateNode {
        let start = self.pos;
        // Always consume at least one char so a stray `<` cannot stall us.
        self.pos += self.rest().chars().next().map_or(1, char::len_utf8);
        loop {
            match self.rest().find(['<', '{']) {
                Some(i) if self.markup_at(self.pos + i) => {
                    self.pos += i;
                    break;
                }
                Some(i) => self.pos += i + 1,
                None => {
                    self.pos = self.source.len();
                    break;
                }
            }
        }
        let text = &self.source[start..self.pos];
        TemplateNode::Text(Text {
            span: Span::from_usize(start, self.pos),
            is_whitespace: text.trim().is_empty(),
        })
    }

    fn parse_mustache(&mut self, opener: TokenKind) -> TemplateNode {
        let start = self.pos;
        let Some(close) = find_closing_brace(self.source, start) else {
            self.error(
                ParseErrorKind::UnclosedExpression,
                Span::from_usize(start, self.source.len()),
            );
            self.pos = self.source.len();
            return TemplateNode::Text(Text {
                span: Span::from_usize(start, self.pos),
                is_whitespace: false,
            });
        };
        self.pos = close + 1;

        let kind = match opener {
            TokenKind::LBraceHash => MustacheKind::BlockOpen,
            TokenKind::LBraceColon => MustacheKind::BlockContinue,
            TokenKind::LBraceSlash => MustacheKind::BlockClose,
            TokenKind::LBraceAt => MustacheKind::Special,
            _ => MustacheKind::Expression,
        };
        let expression_start = match kind {
            MustacheKind::Expression => start + 1,
            _ => start + 2,
        };
        TemplateNode::Mustache(MustacheTag {
            span: Span::from_usize(start, self.pos),
            expression_span: Span::from_usize(expression_start, close),
            kind,
        })
    }

    /// Parses an element, slot, or (at the top level) a script/style block.
    ///
    /// Returns `None` for top-level script and style blocks, which are stored
    /// on the document instead of the template.
    fn parse_element(&mut self, open: Token) -> Option<TemplateNode> {
        let start = open.span.start_usize();
        let name_token = token_at(self.source, open.span.end_usize());
        self.bump(name_token);
        let name = SmolStr::new(name_token.span.text(self.source));
        let attributes = self.parse_attributes();

        let end = self.peek_token();
        let self_closing = match end.kind {
            TokenKind::SlashRAngle => {
                self.bump(end);
                true
            }
            TokenKind::RAngle => {
                self.bump(end);
                false
            }
            _ => {
                let kind = ParseErrorKind::UnexpectedEof {
                    expected: TokenKind::RAngle.name().to_string(),
                };
                self.error(kind, Span::from_usize(start, self.source.len()));
                self.pos = self.source.len();
                true
            }
        };

        let raw_text = name.eq_ignore_ascii_case("script") || name.eq_ignore_ascii_case("style");
        if raw_text && !self_closing {
            return self.parse_raw_text_element(start, name, attributes);
        }

        let children = if self_closing || is_void_element(&name) {
            Vec::new()
        } else {
            self.open_tags.push(name.clone());
            let children = self.parse_children();
            self.open_tags.pop();
            children
        };
        let span = Span::from_usize(start, self.pos);

        Some(if name == "slot" {
            TemplateNode::Slot(Slot {
                span,
                attributes,
                children,
                self_closing,
            })
        } else {
            TemplateNode::Element(Element {
                span,
                name,
                attributes,
                children,
                self_closing,
            })
        })
    }

    /// Parses the body of `<script>`/`<style>` verbatim up to its closing tag.
    fn parse_raw_text_element(
        &mut self,
        start: usize,
        name: SmolStr,
        attributes: Vec<Attribute>,
    ) -> Option<TemplateNode> {
        let content_start = self.pos;
        let closing = format!("</{}", name);
        let content_end = match self.rest().find(&closing) {
            Some(i) => {
                self.consume_closing_tag(content_start + i + closing.len());
                content_start + i
            }
            None => {
                let kind = ParseErrorKind::UnclosedTag {
                    tag_name: name.to_string(),
                };
                self.error(kind, Span::from_usize(start, self.source.len()));
                self.pos = self.source.len();
                self.source.len()
            }
        };
        let span = Span::from_usize(start, self.pos);
        let content_span = Span::from_usize(content_start, content_end);

        if !self.open_tags.is_empty() {
            return Some(TemplateNode::Element(Element {
                span,
                name,
                attributes,
                children: vec![TemplateNode::Text(Text {
                    span: content_span,
                    is_whitespace: content_span.text(self.source).trim().is_empty(),
                })],
                self_closing: false,
            }));
        }

        if name.eq_ignore_ascii_case("script") {
            let context = if is_module_context(&attributes) {
                ScriptContext::Module
            } else {
                ScriptContext::Default
            };
            let lang = match attribute_text(&attributes, "lang") {
                Some("ts") | Some("typescript") => ScriptLang::TypeScript,
                _ => ScriptLang::JavaScript,
            };
            self.scripts.push(Script {
                span,
                content_span,
                lang,
                context,
                attributes,
            });
        } else {
            self.styles.push(Style {
                span,
                content_span,
                attributes,
            });
        }
        None
    }

    // === Attributes ===

    fn parse_attributes(&mut self) -> Vec<Attribute> {
        let mut attributes = Vec::new();
        loop {
            let token = self.peek_token();
            match token.kind {
                TokenKind::RAngle | TokenKind::SlashRAngle | TokenKind::Eof => return attributes,
                TokenKind::Name => attributes.push(self.parse_attribute(token)),
                kind if kind.opens_brace() => {
                    self.pos = token.span.start_usize();
                    attributes.extend(self.parse_spread_or_shorthand());
                }
                kind => {
                    let message = format!("unexpected {}", kind.name());
                    self.error(ParseErrorKind::InvalidAttribute { message }, token.span);
                    self.bump(token);
                }
            }
        }
    }

    fn parse_attribute(&mut self, name_token: Token) -> Attribute {
        let start = name_token.span.start_usize();
        self.bump(name_token);
        let name = SmolStr::new(name_token.span.text(self.source));

        let eq = self.peek_token();
        let values = if eq.kind == TokenKind::Eq {
            self.bump(eq);
            self.parse_attribute_value()
        } else {
            Vec::new()
        };

        Attribute::Normal(NormalAttribute {
            span: Span::from_usize(start, self.pos),
            name,
            values,
        })
    }

    fn parse_attribute_value(&mut self) -> Vec<AttributeValue> {
        let token = self.peek_token();
        match token.kind {
            TokenKind::DoubleQuote | TokenKind::SingleQuote => {
                self.bump(token);
                let quote = if token.kind == TokenKind::DoubleQuote {
                    '"'
                } else {
                    '\''
                };
                self.parse_quoted_value(quote)
            }
            kind if kind.opens_brace() => {
                self.pos = token.span.start_usize();
                self.parse_expression_value().into_iter().collect()
            }
            TokenKind::RAngle | TokenKind::SlashRAngle | TokenKind::Eof => {
                let kind = ParseErrorKind::InvalidAttribute {
                    message: "missing attribute value".to_string(),
                };
                self.error(kind, token.span);
                Vec::new()
            }
            _ => {
                self.pos = token.span.start_usize();
                self.parse_unquoted_value()
            }
        }
    }

    /// Parses text and `{expr}` fragments up to the closing `quote`. An empty
    /// value yields a single empty text fragment, so `title=""` is distinct
    /// from a bare `title`.
    fn parse_quoted_value(&mut self, quote: char) -> Vec<AttributeValue> {
        let open = self.pos;
        let mut values = Vec::new();
        loop {
            let text_start = self.pos;
            let Some(i) = self.rest().find([quote, '{']) else {
                self.pos = self.source.len();
                if self.pos > text_start {
                    values.push(self.text_value(text_start));
                }
                let kind = ParseErrorKind::UnexpectedEof {
                    expected: format!("closing {}", quote),
                };
                self.error(kind, Span::empty(self.source.len() as u32));
                break;
            };
            self.pos += i;
            if i > 0 {
                values.push(self.text_value(text_start));
            }
            if self.rest().starts_with(quote) {
                self.pos += 1;
                break;
            }
            match self.parse_expression_value() {
                Some(value) => values.push(value),
                None => break,
            }
        }
        if values.is_empty() {
            values.push(AttributeValue::Text(TextValue {
                span: Span::empty(open as u32),
                raw: String::new(),
            }));
        }
        values
    }

    /// Parses an unquoted value: adjacent tokens up to whitespace, `>` or `/>`.
    fn parse_unquoted_value(&mut self) -> Vec<AttributeValue> {
        let mut values = Vec::new();
        let mut text_start: Option<usize> = None;
        loop {
            let token = self.peek_token();
            if !self.is_adjacent(token) {
                break;
            }
            match token.kind {
                TokenKind::RAngle | TokenKind::SlashRAngle | TokenKind::Eof => break,
                kind if kind.opens_brace() => {
                    if let Some(start) = text_start.take() {
                        values.push(self.text_value(start));
                    }
                    match self.parse_expression_value() {
                        Some(value) => values.push(value),
                        None => break,
                    }
                }
                _ => {
                    text_start.get_or_insert(self.pos);
                    self.bump(token);
                }
            }
        }
        if let Some(start) = text_start {
            values.push(self.text_value(start));
        }
        values
    }

    /// A text fragment from `start` to the cursor.
    fn text_value(&self, start: usize) -> AttributeValue {
        AttributeValue::Text(TextValue {
            span: Span::from_usize(start, self.pos),
            raw: self.source[start..self.pos].to_string(),
        })
    }

    fn parse_expression_value(&mut self) -> Option<AttributeValue> {
        let start = self.pos;
        let Some(close) = find_closing_brace(self.source, start) else {
            self.error(
                ParseErrorKind::UnclosedExpression,
                Span::from_usize(start, self.source.len()),
            );
            self.pos = self.source.len();
            return None;
        };
        self.pos = close + 1;
        Some(AttributeValue::Expression(ExpressionValue {
            span: Span::from_usize(start, self.pos),
            expression_span: Span::from_usize(start + 1, close),
        }))
    }

    /// Parses `{...spread}` or the shorthand `{name}`.
    fn parse_spread_or_shorthand(&mut self) -> Option<Attribute> {
        let start = self.pos;
        let value = self.parse_expression_value()?;
        let AttributeValue::Expression(expression) = value else {
            return None;
        };
        let span = Span::from_usize(start, self.pos);
        let inner = expression.expression_span.text(self.source);
        let trimmed = inner.trim_start();

        if let Some(spread) = trimmed.strip_prefix("...") {
            let offset = expression.expression_span.end_usize() - spread.len();
            return Some(Attribute::Spread(SpreadAttribute {
                span,
                expression_span: Span::from_usize(offset, expression.expression_span.end_usize()),
            }));
        }

        let name = trimmed.trim_end();
        if name.is_empty() {
            let kind = ParseErrorKind::InvalidAttribute {
                message: "empty shorthand attribute".to_string(),
            };
            self.error(kind, span);
            return None;
        }
        Some(Attribute::Normal(NormalAttribute {
            span,
            name: SmolStr::new(name),
            values: vec![AttributeValue::Expression(expression)],
        }))
    }
}

fn attribute_text<'a>(attributes: &'a [Attribute], name: &str) -> Option<&'a str> {
    attributes.iter().find_map(|attr| match attr {
        Attribute::Normal(normal) if normal.name == name => normal.first_text(),
        _ => None,
    })
}

/// `context="module"` (Svelte 3/4) or the bare `module` attribute (Svelte 5).
fn is_module_context(attributes: &[Attribute]) -> bool {
    attribute_text(attributes, "context") == Some("module")
        || attributes.iter().any(|attr| {
            matches!(attr, Attribute::Normal(normal) if normal.name == "module" && normal.values.is_empty())
        })
}

/// Finds the `}` matching the `{` at `open`, skipping braces inside strings,
/// template literals and comments.
pub(crate) fn find_closing_brace(source: &str, open: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut depth = 0usize;
    // Brace depths at which a template literal substitution was entered.
    let mut substitutions: Vec<usize> = Vec::new();
    let mut i = open;

    while i < bytes.len() {
        match bytes[i] {
            b'{' => depth += 1,
            b'}' => {
                if substitutions.last() == Some(&depth) {
                    substitutions.pop();
                    depth -= 1;
                    i = resume_template(bytes, i + 1, &mut depth, &mut substitutions)?;
                    continue;
                }
                depth -= 1;
                if depth == 0 {
                    return Some(i);
                }
            }
            b'"' | b'\'' => {
                i = skip_string(bytes, i)?;
                continue;
            }
            b'`' => {
                i = resume_template(bytes, i + 1, &mut depth, &mut substitutions)?;
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'/') => {
                i = bytes[i..]
                    .iter()
                    .position(|&b| b == b'\n')
                    .map_or(bytes.len(), |p| i + p);
                continue;
            }
            b'/' if bytes.get(i + 1) == Some(&b'*') => {
                i = source[i + 2..].find("*/").map(|p| i + 2 + p + 2)?;
                continue;
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Scans template literal text from `i`. Returns the index after the closing
/// backtick, or after `${` (recording the substitution depth).
fn resume_template(
    bytes: &[u8],
    mut i: usize,
    depth: &mut usize,
    substitutions: &mut Vec<usize>,
) -> Option<usize> {
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b'`' => return Some(i + 1),
            b'$' if bytes.get(i + 1) == Some(&b'{') => {
                *depth += 1;
                substitutions.push(*depth);
                return Some(i + 2);
            }
            _ => i += 1,
        }
    }
    None
}

/// Skips a quoted string starting at `i`, returning the index after it.
fn skip_string(bytes: &[u8], i: usize) -> Option<usize> {
    let quote = bytes[i];
    let mut j = i + 1;
    while j < bytes.len() {
        match bytes[j] {
            b'\\' => j += 2,
            b if b == quote => return Some(j + 1),
            _ => j += 1,
        }
    }
    None
}
