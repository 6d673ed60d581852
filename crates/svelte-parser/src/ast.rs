//! AST types for Svelte component markup.
//!
//! The tree is intentionally shallow: it models what the TSX transformer needs
//! (script and style blocks, elements, `<slot>` definitions and their
//! attributes) and keeps everything else as spans into the source.

use smol_str::SmolStr;
use source_map::Span;

/// A parsed Svelte component.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Document {
    /// Top-level `<script>` blocks, in source order.
    pub scripts: Vec<Script>,
    /// Top-level `<style>` blocks, in source order.
    pub styles: Vec<Style>,
    /// The template markup (everything that is not a script or style block).
    pub fragment: Fragment,
    /// The span of the entire document.
    pub span: Span,
}

impl Document {
    /// Returns the instance script: the first `<script>` that is not
    /// module-level.
    pub fn instance_script(&self) -> Option<&Script> {
        self.scripts
            .iter()
            .find(|script| script.context != ScriptContext::Module)
    }

    /// Returns the module-level script (`<script context="module">`).
    pub fn module_script(&self) -> Option<&Script> {
        self.scripts
            .iter()
            .find(|script| script.context == ScriptContext::Module)
    }
}

/// A `<script>` block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Script {
    /// The span of the entire block, from `<script` through `</script>`.
    pub span: Span,
    /// The span of just the script content.
    pub content_span: Span,
    /// The script language (js or ts).
    pub lang: ScriptLang,
    /// The script context (module or instance).
    pub context: ScriptContext,
    /// Attributes on the opening tag.
    pub attributes: Vec<Attribute>,
}

/// The language of a script block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ScriptLang {
    /// JavaScript (default).
    #[default]
    JavaScript,
    /// TypeScript (`lang="ts"`).
    TypeScript,
}

/// The context of a script block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum ScriptContext {
    /// Instance script, run once per component instance.
    #[default]
    Default,
    /// Module script (`context="module"` or the bare `module` attribute).
    Module,
}

/// A `<style>` block.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Style {
    /// The span of the entire block including tags.
    pub span: Span,
    /// The span of just the style content.
    pub content_span: Span,
    /// Attributes on the opening tag.
    pub attributes: Vec<Attribute>,
}

/// A sequence of template nodes.
#[derive(Debug, Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Fragment {
    /// The child nodes.
    pub nodes: Vec<TemplateNode>,
    /// The span of the fragment.
    pub span: Span,
}

/// A node in the template.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum TemplateNode {
    /// An element or component, `<div>` / `<Widget>`.
    Element(Element),
    /// A slot definition, `<slot>`.
    Slot(Slot),
    /// Text content.
    Text(Text),
    /// An HTML comment.
    Comment(Comment),
    /// A mustache tag: `{expr}`, `{#if ...}`, `{:else}`, `{/if}`, `{@html ...}`.
    Mustache(MustacheTag),
}

impl TemplateNode {
    /// Returns the span of this node.
    pub fn span(&self) -> Span {
        match self {
            TemplateNode::Element(n) => n.span,
            TemplateNode::Slot(n) => n.span,
            TemplateNode::Text(n) => n.span,
            TemplateNode::Comment(n) => n.span,
            TemplateNode::Mustache(n) => n.span,
        }
    }

    /// Returns the child nodes of this node, if it can have any.
    pub fn children(&self) -> &[TemplateNode] {
        match self {
            TemplateNode::Element(n) => &n.children,
            TemplateNode::Slot(n) => &n.children,
            TemplateNode::Text(_) | TemplateNode::Comment(_) | TemplateNode::Mustache(_) => &[],
        }
    }
}

/// An element or component.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Element {
    /// The span of the element.
    pub span: Span,
    /// The tag name.
    pub name: SmolStr,
    /// The attributes.
    pub attributes: Vec<Attribute>,
    /// The child nodes.
    pub children: Vec<TemplateNode>,
    /// Whether the tag was written `<name />`.
    pub self_closing: bool,
}

/// A `<slot>` definition.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Slot {
    /// The span of the slot element.
    pub span: Span,
    /// The attributes; `name` selects the slot, the rest are slot props.
    pub attributes: Vec<Attribute>,
    /// Fallback content.
    pub children: Vec<TemplateNode>,
    /// Whether the tag was written `<slot />`.
    pub self_closing: bool,
}

impl Slot {
    /// Returns the attribute with the given name.
    pub fn attribute(&self, name: &str) -> Option<&NormalAttribute> {
        self.attributes.iter().find_map(|attr| match attr {
            Attribute::Normal(normal) if normal.name == name => Some(normal),
            _ => None,
        })
    }
}

/// Text content.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Text {
    /// The span of the text.
    pub span: Span,
    /// Whether this text is only whitespace.
    pub is_whitespace: bool,
}

/// An HTML comment.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Comment {
    /// The span of the comment, including `<!--` and `-->`.
    pub span: Span,
}

/// A mustache tag.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MustacheTag {
    /// The span of the tag including braces.
    pub span: Span,
    /// The span between the braces and any sigil (`#`, `:`, `/`, `@`).
    pub expression_span: Span,
    /// What the tag does.
    pub kind: MustacheKind,
}

/// The kind of a mustache tag, decided by its leading sigil.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum MustacheKind {
    /// `{expr}`
    Expression,
    /// `{#if ...}`, `{#each ...}`
    BlockOpen,
    /// `{:else}`, `{:then x}`
    BlockContinue,
    /// `{/if}`
    BlockClose,
    /// `{@html ...}`, `{@debug ...}`
    Special,
}

/// An attribute on an element, slot, script or style tag.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum Attribute {
    /// `name`, `name="text {expr}"`, `name={expr}` or the shorthand `{name}`.
    Normal(NormalAttribute),
    /// A spread attribute `{...obj}`.
    Spread(SpreadAttribute),
}

impl Attribute {
    /// Returns the span of this attribute.
    pub fn span(&self) -> Span {
        match self {
            Attribute::Normal(a) => a.span,
            Attribute::Spread(a) => a.span,
        }
    }
}

/// A named attribute.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct NormalAttribute {
    /// The span of the attribute.
    pub span: Span,
    /// The attribute name.
    pub name: SmolStr,
    /// The value fragments in source order. Empty for boolean attributes.
    pub values: Vec<AttributeValue>,
}

impl NormalAttribute {
    /// Returns the raw text of the first fragment if it is plain text.
    pub fn first_text(&self) -> Option<&str> {
        match self.values.first()? {
            AttributeValue::Text(text) => Some(text.raw.as_str()),
            AttributeValue::Expression(_) => None,
        }
    }
}

/// One fragment of an attribute value.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum AttributeValue {
    /// Plain text, as written (entities are not decoded).
    Text(TextValue),
    /// An expression `{expr}`.
    Expression(ExpressionValue),
}

impl AttributeValue {
    /// Returns the span of this fragment.
    pub fn span(&self) -> Span {
        match self {
            AttributeValue::Text(t) => t.span,
            AttributeValue::Expression(e) => e.span,
        }
    }
}

/// A plain-text attribute fragment.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TextValue {
    /// The span of the text.
    pub span: Span,
    /// The raw text.
    pub raw: String,
}

/// An expression attribute fragment.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct ExpressionValue {
    /// The span including braces.
    pub span: Span,
    /// The span of just the expression.
    pub expression_span: Span,
}

/// A spread attribute `{...obj}`.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct SpreadAttribute {
    /// The span of the attribute.
    pub span: Span,
    /// The span of the spread expression (after `...`).
    pub expression_span: Span,
}
