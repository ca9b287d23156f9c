//! Dialect-neutral syntax tree.
//!
//! Every dialect adapter lowers its parser's output into these types before
//! conversion. The canonicalization engine only ever reads them.
//!
//! Spans are byte ranges into the document source the tree was parsed from.
//! They are used to reproduce expressions verbatim, so they must cover the
//! exact source text of the node.

use std::ops::Range;

/// Byte range into the document source.
pub type Span = Range<usize>;

/// Attributes and nested blocks of one configuration scope.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Body {
    /// Attributes in declaration order
    pub attributes: Vec<Attribute>,
    /// Blocks in declaration order
    pub blocks: Vec<Block>,
}

/// A `name = expression` pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub expr: Expression,
}

/// A typed, optionally labeled, nested scope such as
/// `resource "aws_instance" "web" { ... }`.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    /// Block type (`resource` above)
    pub kind: String,
    /// Positional labels (`aws_instance`, `web` above)
    pub labels: Vec<String>,
    pub body: Body,
    /// The whole block, from its type keyword to the closing brace
    pub span: Span,
}

/// An expression node together with its source span.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    pub span: Span,
}

/// Expression kinds the engine distinguishes.
///
/// The set is closed. Anything a dialect cannot map onto one of the modeled
/// kinds becomes [`ExprKind::Dynamic`] and is reproduced from source.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    /// A scalar literal.
    Literal(Literal),
    /// A quoted or heredoc template made of literal text and interpolations.
    Template(Template),
    /// A template consisting of a single interpolation, e.g. `"${var.x}"`.
    TemplateWrap(Box<Expression>),
    /// `[a, b, c]`
    Tuple(Vec<Expression>),
    /// `{ key = value, ... }`
    Object(Vec<ObjectItem>),
    /// A bare identifier or attribute traversal (`foo`, `var.x`).
    Reference,
    /// `cond ? a : b`, or the body of an `%{if}` directive.
    Conditional(Box<Conditional>),
    /// The body of an `%{for}` directive.
    TemplateFor(Box<TemplateFor>),
    /// Function calls, operators, splats, for-expressions and anything else
    /// that is preserved verbatim.
    Dynamic,
}

/// Scalar literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Null,
    Bool(bool),
    Number(serde_json::Number),
    String(String),
}

impl Literal {
    /// Native JSON value of the literal.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Null => serde_json::Value::Null,
            Self::Bool(value) => serde_json::Value::Bool(*value),
            Self::Number(number) => serde_json::Value::Number(number.clone()),
            Self::String(value) => serde_json::Value::String(value.clone()),
        }
    }

    /// String form used when the literal is inlined into a template.
    ///
    /// Returns `None` for `null`, which has no string representation.
    #[must_use]
    pub fn coerce_to_string(&self) -> Option<String> {
        match self {
            Self::Null => None,
            Self::Bool(value) => Some(value.to_string()),
            Self::Number(number) => Some(number.to_string()),
            Self::String(value) => Some(value.clone()),
        }
    }
}

/// Ordered template parts.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Template {
    pub parts: Vec<TemplatePart>,
}

impl Template {
    /// The template's text when it contains no interpolations at all.
    #[must_use]
    pub fn as_literal(&self) -> Option<String> {
        self.parts
            .iter()
            .map(|part| match part {
                TemplatePart::Literal(text) => Some(text.as_str()),
                TemplatePart::Interpolation(_) | TemplatePart::Directive(_) => None,
            })
            .collect()
    }
}

/// One piece of a template.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplatePart {
    /// Literal text, already unescaped.
    Literal(String),
    /// `${...}` interpolation.
    Interpolation(Expression),
    /// A lowered `%{if}` or `%{for}` directive: an [`ExprKind::Conditional`]
    /// or [`ExprKind::TemplateFor`] whose branches are templates.
    Directive(Expression),
}

/// One `key = value` item of an object constructor.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectItem {
    pub key: Expression,
    pub value: Expression,
}

/// Condition and both branches of a conditional.
///
/// For an `%{if}` directive the branches are [`ExprKind::Template`]
/// expressions; a missing `%{else}` is an empty template.
#[derive(Debug, Clone, PartialEq)]
pub struct Conditional {
    pub condition: Expression,
    pub true_result: Expression,
    pub false_result: Expression,
}

/// `%{for key, value in collection}body%{endfor}`
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateFor {
    pub key_var: Option<String>,
    pub value_var: String,
    pub collection: Expression,
    pub body: Expression,
}
