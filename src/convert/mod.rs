//! Canonicalization engine.
//!
//! Converts a [`syntax::Body`](crate::syntax::Body) into a JSON-compatible
//! [`serde_json::Value`] that policy evaluation can match rules against.
//!
//! # Conversion Rules
//!
//! - Attributes map to their evaluated values (last one wins on duplicates).
//! - Unlabeled blocks collect into an array under their type key.
//! - Labeled blocks nest one object level per label; repeated paths merge into
//!   arrays.
//! - Literal-only templates become plain strings; interpolated templates are
//!   rebuilt with `${...}`, `%{if}` and `%{for}` markers.
//! - Everything that is not statically known is kept as `"${<source>}"`.
//!
//! # Example
//!
//! ```rust
//! use iac_canon::convert::{ConversionContext, Converter};
//! use iac_canon::syntax::{Attribute, Body, Expression, ExprKind};
//!
//! let source = "name = var.name";
//! let body = Body {
//!     attributes: vec![Attribute {
//!         name: "name".to_string(),
//!         expr: Expression { kind: ExprKind::Reference, span: 7..15 },
//!     }],
//!     blocks: vec![],
//! };
//!
//! let converter = Converter::new(ConversionContext::new(source.as_bytes()));
//! let value = converter.convert_body(&body).unwrap();
//! assert_eq!(value["name"], "${var.name}");
//! ```

mod body;
mod expr;
mod resources;
mod template;

pub use resources::RESOURCE_BLOCK;

use crate::error::{IacCanonError, Result};
use crate::syntax::{Body, Expression, Span};
use crate::types::ResourceConfig;
use serde_json::{Map, Value};
use std::path::Path;

/// Default ceiling on syntax tree nesting.
pub const DEFAULT_MAX_NESTING_DEPTH: usize = 64;

/// Read-only view of the document source, used to reproduce expressions
/// verbatim.
#[derive(Debug, Clone, Copy)]
pub struct ConversionContext<'src> {
    source: &'src [u8],
}

impl<'src> ConversionContext<'src> {
    /// Wrap the raw bytes the syntax tree was parsed from.
    #[must_use]
    pub fn new(source: &'src [u8]) -> Self {
        Self { source }
    }

    /// Exact source text covered by `span`.
    ///
    /// # Errors
    ///
    /// Returns an `UpstreamLoad` error if the span lies outside the source or
    /// splits a UTF-8 sequence, which means the adapter produced a bad tree.
    pub fn source_text(&self, span: &Span) -> Result<&'src str> {
        let bytes = self.source.get(span.clone()).ok_or_else(|| {
            crate::err!(UpstreamLoad {
                file: std::path::PathBuf::new(),
                message: format!(
                    "expression span {}..{} is outside the {}-byte source",
                    span.start,
                    span.end,
                    self.source.len()
                ),
                line: None,
                column: None,
            })
        })?;

        std::str::from_utf8(bytes).map_err(|e| {
            crate::err!(UpstreamLoad {
                file: std::path::PathBuf::new(),
                message: format!("expression span {}..{} is not valid UTF-8: {e}", span.start, span.end),
                line: None,
                column: None,
            })
        })
    }

    /// 1-based line containing byte `offset`.
    #[must_use]
    pub fn line_of(&self, offset: usize) -> usize {
        let end = offset.min(self.source.len());
        self.source[..end].iter().filter(|byte| **byte == b'\n').count() + 1
    }
}

/// Converts one document's syntax tree into its canonical value.
///
/// A converter is created per document and holds nothing but the source
/// context and the depth ceiling.
#[derive(Debug, Clone, Copy)]
pub struct Converter<'src> {
    ctx: ConversionContext<'src>,
    max_depth: usize,
}

impl<'src> Converter<'src> {
    /// Create a converter with the default nesting ceiling.
    #[must_use]
    pub fn new(ctx: ConversionContext<'src>) -> Self {
        Self {
            ctx,
            max_depth: DEFAULT_MAX_NESTING_DEPTH,
        }
    }

    /// Override the nesting ceiling.
    #[must_use]
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Convert a whole body into a JSON object.
    ///
    /// # Errors
    ///
    /// Returns the first structural, evaluation, or depth error encountered;
    /// no partial object is returned.
    pub fn convert_body(&self, body: &Body) -> Result<Map<String, Value>> {
        self.body(body, 0)
    }

    /// Convert a single expression.
    ///
    /// # Errors
    ///
    /// Returns the first evaluation or depth error encountered.
    pub fn convert_expression(&self, expr: &Expression) -> Result<Value> {
        self.expression(expr, 0)
    }

    /// Step one level deeper, failing once the ceiling is crossed.
    fn descend(&self, depth: usize) -> Result<usize> {
        let depth = depth + 1;
        if depth > self.max_depth {
            return Err(crate::err!(NestingTooDeep {
                limit: self.max_depth,
            }));
        }
        Ok(depth)
    }

    /// `${<source>}` marker for an expression that is not evaluated.
    fn marker(&self, expr: &Expression) -> Result<String> {
        Ok(format!("${{{}}}", self.ctx.source_text(&expr.span)?))
    }
}

/// Convert `body`, parsed from `source`, into its canonical value.
///
/// # Errors
///
/// See [`Converter::convert_body`].
pub fn to_canonical_value(source: &str, body: &Body, max_depth: usize) -> Result<Value> {
    let converter = Converter::new(ConversionContext::new(source.as_bytes())).with_max_depth(max_depth);
    let object = converter.convert_body(body)?;
    tracing::trace!(keys = object.len(), "Converted document body");
    Ok(Value::Object(object))
}

/// Resource records of `body`, parsed from `source` and loaded from `file`.
///
/// # Errors
///
/// See [`Converter::resource_configs`].
pub fn resource_configs(source: &str, body: &Body, file: &Path, max_depth: usize) -> Result<Vec<ResourceConfig>> {
    Converter::new(ConversionContext::new(source.as_bytes()))
        .with_max_depth(max_depth)
        .resource_configs(body, file)
}

/// Evaluation error for an expression, quoting its source when available.
fn evaluation_error(ctx: &ConversionContext<'_>, expr: &Expression, message: &str) -> IacCanonError {
    let expression = ctx
        .source_text(&expr.span)
        .map_or_else(|_| format!("<{}..{}>", expr.span.start, expr.span.end), str::to_owned);
    crate::err!(ExpressionEvaluation {
        expression,
        message: message.to_string(),
    })
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;
    use crate::syntax::ExprKind;

    #[test]
    fn test_source_text() {
        let ctx = ConversionContext::new(b"a = var.x");
        assert_eq!(ctx.source_text(&(4..9)).unwrap(), "var.x");
        assert!(ctx.source_text(&(4..20)).is_err());
    }

    #[test]
    fn test_source_text_rejects_split_utf8() {
        let source = "x = \"é\"";
        let ctx = ConversionContext::new(source.as_bytes());
        let start = source.find('é').unwrap();
        assert!(ctx.source_text(&(start..start + 1)).is_err());
    }

    #[test]
    fn test_line_of() {
        let ctx = ConversionContext::new(b"a = 1\nb = 2\n\nc = 3");
        assert_eq!(ctx.line_of(0), 1);
        assert_eq!(ctx.line_of(6), 2);
        assert_eq!(ctx.line_of(13), 4);
        assert_eq!(ctx.line_of(1000), 4);
    }

    #[test]
    fn test_depth_ceiling() {
        let mut nested = number(1);
        for _ in 0..10 {
            nested = expr(ExprKind::Tuple(vec![nested]));
        }
        let converter = Converter::new(ConversionContext::new(b"")).with_max_depth(5);
        let err = converter.convert_expression(&nested).unwrap_err();
        assert!(matches!(err, IacCanonError::NestingTooDeep { limit: 5, .. }));

        let converter = Converter::new(ConversionContext::new(b""));
        assert!(converter.convert_expression(&nested).is_ok());
    }

    #[test]
    fn test_deep_block_nesting_fails() {
        let mut nested = body(vec![], vec![]);
        for _ in 0..20 {
            nested = body(vec![], vec![block("inner", &[], nested)]);
        }
        let err = to_canonical_value("", &nested, 8).unwrap_err();
        assert_eq!(err.category(), "structural");
    }

    #[test]
    fn test_to_canonical_value_is_deterministic() {
        let source = r#"name = var.name"#;
        let tree = body(
            vec![
                attribute("name", reference(source, "var.name")),
                attribute("count", number(2)),
            ],
            vec![block("rule", &[], body(vec![attribute("id", string("r1"))], vec![]))],
        );

        let first = serde_json::to_string(&to_canonical_value(source, &tree, 16).unwrap()).unwrap();
        let second = serde_json::to_string(&to_canonical_value(source, &tree, 16).unwrap()).unwrap();
        assert_eq!(first, second);
    }
}
