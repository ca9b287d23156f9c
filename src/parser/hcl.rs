//! Terraform/HCL dialect adapter.
//!
//! Parses `.tf` files with `hcl-edit`, which keeps byte spans for every
//! expression, and lowers the result into the [`syntax`](crate::syntax)
//! model.

use crate::error::{IacCanonError, Result};
use crate::parser::{DialectRegistry, IacDialect, LoadedDocument};
use crate::syntax::{
    Attribute, Block, Body, Conditional, ExprKind, Expression, Literal, ObjectItem, Span, Template,
    TemplateFor, TemplatePart,
};

use hcl_edit::expr::{Conditional as HclConditional, Expression as HclExpression, ObjectKey};
use hcl_edit::repr::Span as _;
use hcl_edit::structure::{Body as HclBody, Structure};
use hcl_edit::template::{Directive, Element, Template as HclTemplate};
use std::path::{Path, PathBuf};

/// File extensions to scan for Terraform files.
pub const TERRAFORM_EXTENSIONS: &[&str] = &[".tf"];

/// Register the Terraform adapters. `v14` is registered first and is the
/// default.
pub(super) fn register(registry: &mut DialectRegistry) {
    registry.register("terraform", "v14", terraform_v14);
    registry.register("terraform", "v12", terraform_v12);
}

fn terraform_v14() -> Box<dyn IacDialect> {
    Box::new(HclParser::new("v14"))
}

fn terraform_v12() -> Box<dyn IacDialect> {
    Box::new(HclParser::new("v12"))
}

/// HCL parser for Terraform files.
///
/// Both registered Terraform versions share the HCL2 grammar, so they only
/// differ in the version they report.
#[derive(Debug, Clone)]
pub struct HclParser {
    version: &'static str,
}

impl HclParser {
    /// Create a Terraform adapter reporting `version`.
    #[must_use]
    pub fn new(version: &'static str) -> Self {
        Self { version }
    }
}

impl IacDialect for HclParser {
    fn name(&self) -> &'static str {
        "terraform"
    }

    fn version(&self) -> &'static str {
        self.version
    }

    fn extensions(&self) -> &'static [&'static str] {
        TERRAFORM_EXTENSIONS
    }

    fn load_source(&self, source: String, path: &Path) -> Result<LoadedDocument> {
        let parsed = hcl_edit::parser::parse_body(&source).map_err(|e| {
            IacCanonError::upstream_load(path.to_path_buf(), e.to_string(), file!(), line!())
        })?;

        let body = Lowering { file: path }.body(&parsed)?;
        tracing::debug!(
            file = %path.display(),
            attributes = body.attributes.len(),
            blocks = body.blocks.len(),
            "Parsed HCL document"
        );

        Ok(LoadedDocument {
            path: path.to_path_buf(),
            source,
            body,
        })
    }
}

/// Lowers an `hcl-edit` tree into the dialect-neutral syntax model.
struct Lowering<'a> {
    file: &'a Path,
}

impl Lowering<'_> {
    fn body(&self, body: &HclBody) -> Result<Body> {
        let mut out = Body::default();
        for structure in body.iter() {
            match structure {
                Structure::Attribute(attribute) => out.attributes.push(Attribute {
                    name: attribute.key.value().as_str().to_string(),
                    expr: self.expression(&attribute.value)?,
                }),
                Structure::Block(block) => out.blocks.push(Block {
                    kind: block.ident.value().as_str().to_string(),
                    labels: block.labels.iter().map(|label| label.as_str().to_string()).collect(),
                    body: self.body(&block.body)?,
                    span: self.span(block.span().or_else(|| block.ident.span()))?,
                }),
            }
        }
        Ok(out)
    }

    fn expression(&self, expr: &HclExpression) -> Result<Expression> {
        let span = self.span(expression_span(expr))?;

        let kind = match expr {
            HclExpression::Null(_) => ExprKind::Literal(Literal::Null),
            HclExpression::Bool(value) => ExprKind::Literal(Literal::Bool(*value.value())),
            HclExpression::Number(number) => match to_json_number(number.value()) {
                Some(number) => ExprKind::Literal(Literal::Number(number)),
                None => ExprKind::Dynamic,
            },
            HclExpression::String(value) => ExprKind::Literal(Literal::String(value.value().clone())),
            HclExpression::Array(array) => ExprKind::Tuple(
                array
                    .iter()
                    .map(|element| self.expression(element))
                    .collect::<Result<_>>()?,
            ),
            HclExpression::Object(object) => ExprKind::Object(
                object
                    .iter()
                    .map(|(key, value)| {
                        Ok(ObjectItem {
                            key: self.object_key(key)?,
                            value: self.expression(value.expr())?,
                        })
                    })
                    .collect::<Result<_>>()?,
            ),
            HclExpression::StringTemplate(template) => self.template_kind(template)?,
            HclExpression::HeredocTemplate(heredoc) => self.template_kind(&heredoc.template)?,
            HclExpression::Variable(_) | HclExpression::Traversal(_) => ExprKind::Reference,
            HclExpression::Conditional(conditional) => match self.conditional(conditional) {
                Ok(conditional) => ExprKind::Conditional(Box::new(conditional)),
                // The whole conditional is still reproducible from its own span.
                Err(e) => {
                    tracing::trace!(error = %e, "Keeping conditional verbatim");
                    ExprKind::Dynamic
                }
            },
            _ => ExprKind::Dynamic,
        };

        Ok(Expression { kind, span })
    }

    fn conditional(&self, conditional: &HclConditional) -> Result<Conditional> {
        Ok(Conditional {
            condition: self.expression(&conditional.cond_expr)?,
            true_result: self.expression(&conditional.true_expr)?,
            false_result: self.expression(&conditional.false_expr)?,
        })
    }

    fn object_key(&self, key: &ObjectKey) -> Result<Expression> {
        match key {
            ObjectKey::Ident(ident) => Ok(Expression {
                kind: ExprKind::Reference,
                span: self.span(ident.span())?,
            }),
            ObjectKey::Expression(expr) => self.expression(expr),
        }
    }

    /// A template made of exactly one interpolation unwraps to that
    /// expression; anything else, a lone directive included, stays a
    /// template.
    fn template_kind(&self, template: &HclTemplate) -> Result<ExprKind> {
        let mut template = self.template(template, false, false)?;
        if let [TemplatePart::Interpolation(_)] = template.parts.as_slice() {
            if let Some(TemplatePart::Interpolation(inner)) = template.parts.pop() {
                return Ok(ExprKind::TemplateWrap(Box::new(inner)));
            }
        }
        Ok(ExprKind::Template(template))
    }

    /// Lower template elements, applying `~` whitespace stripping to the
    /// literals next to each marker. `trim_first`/`trim_last` carry the strip
    /// flags of the enclosing directive markers.
    fn template(&self, template: &HclTemplate, trim_first: bool, trim_last: bool) -> Result<Template> {
        let elements: Vec<&Element> = template.iter().collect();
        let mut parts = Vec::with_capacity(elements.len());

        for (index, element) in elements.iter().enumerate() {
            let part = match element {
                Element::Literal(literal) => {
                    let trim_start = if index == 0 {
                        trim_first
                    } else {
                        strip_markers(elements[index - 1]).1
                    };
                    let trim_end = match elements.get(index + 1) {
                        Some(next) => strip_markers(next).0,
                        None => trim_last,
                    };

                    let mut text = literal.value().as_str();
                    if trim_start {
                        text = text.trim_start();
                    }
                    if trim_end {
                        text = text.trim_end();
                    }
                    TemplatePart::Literal(text.to_string())
                }
                Element::Interpolation(interpolation) => {
                    TemplatePart::Interpolation(self.expression(&interpolation.expr)?)
                }
                Element::Directive(directive) => TemplatePart::Directive(self.directive(directive)?),
            };
            parts.push(part);
        }
        Ok(Template { parts })
    }

    /// Directives become expressions carrying the span of their controlling
    /// expression.
    fn directive(&self, directive: &Directive) -> Result<Expression> {
        match directive {
            Directive::If(if_directive) => {
                let if_expr = &if_directive.if_expr;
                let endif_strip = if_directive.endif_expr.strip;
                let condition = self.expression(&if_expr.cond_expr)?;
                let span = condition.span.clone();

                let (true_result, false_result) = match &if_directive.else_expr {
                    Some(else_expr) => (
                        self.template(&if_expr.template, if_expr.strip.strip_end(), else_expr.strip.strip_start())?,
                        self.template(&else_expr.template, else_expr.strip.strip_end(), endif_strip.strip_start())?,
                    ),
                    None => (
                        self.template(&if_expr.template, if_expr.strip.strip_end(), endif_strip.strip_start())?,
                        Template::default(),
                    ),
                };

                Ok(Expression {
                    kind: ExprKind::Conditional(Box::new(Conditional {
                        condition,
                        true_result: template_expression(true_result, &span),
                        false_result: template_expression(false_result, &span),
                    })),
                    span,
                })
            }
            Directive::For(for_directive) => {
                let for_expr = &for_directive.for_expr;
                let collection = self.expression(&for_expr.collection_expr)?;
                let span = collection.span.clone();
                let body = self.template(
                    &for_expr.template,
                    for_expr.strip.strip_end(),
                    for_directive.endfor_expr.strip.strip_start(),
                )?;

                Ok(Expression {
                    kind: ExprKind::TemplateFor(Box::new(TemplateFor {
                        key_var: for_expr
                            .key_var
                            .as_ref()
                            .map(|key| key.value().as_str().to_string()),
                        value_var: for_expr.value_var.value().as_str().to_string(),
                        collection,
                        body: template_expression(body, &span),
                    })),
                    span,
                })
            }
        }
    }

    fn span(&self, span: Option<Span>) -> Result<Span> {
        span.ok_or_else(|| missing_span(self.file))
    }
}

/// Source span of an expression.
///
/// `hcl-edit` only records spans on expression terms and on the outermost
/// expression of an attribute, interpolation or branch. Traversals, binary
/// operations and conditionals built from a term in the middle of an
/// expression carry none, so theirs is rebuilt from their operands.
fn expression_span(expr: &HclExpression) -> Option<Span> {
    if let Some(span) = expr.span() {
        return Some(span);
    }

    match expr {
        HclExpression::Traversal(traversal) => {
            let start = expression_span(&traversal.expr)?.start;
            let end = traversal.operators.last()?.span()?.end;
            Some(start..end)
        }
        HclExpression::BinaryOp(op) => {
            Some(expression_span(&op.lhs_expr)?.start..expression_span(&op.rhs_expr)?.end)
        }
        HclExpression::Conditional(conditional) => Some(
            expression_span(&conditional.cond_expr)?.start..expression_span(&conditional.false_expr)?.end,
        ),
        _ => None,
    }
}

/// Whether the markers around a template element strip the whitespace of
/// the literal before and after it.
fn strip_markers(element: &Element) -> (bool, bool) {
    match element {
        Element::Literal(_) => (false, false),
        Element::Interpolation(interpolation) => {
            (interpolation.strip.strip_start(), interpolation.strip.strip_end())
        }
        Element::Directive(Directive::If(directive)) => (
            directive.if_expr.strip.strip_start(),
            directive.endif_expr.strip.strip_end(),
        ),
        Element::Directive(Directive::For(directive)) => (
            directive.for_expr.strip.strip_start(),
            directive.endfor_expr.strip.strip_end(),
        ),
    }
}

fn template_expression(template: Template, span: &Span) -> Expression {
    Expression {
        kind: ExprKind::Template(template),
        span: span.clone(),
    }
}

fn missing_span(file: &Path) -> IacCanonError {
    IacCanonError::upstream_load(
        PathBuf::from(file),
        "parser produced an expression without a source span".to_string(),
        file!(),
        line!(),
    )
}

/// Integers stay integers; everything else goes through `f64`.
fn to_json_number(number: &hcl_edit::Number) -> Option<serde_json::Number> {
    if let Some(value) = number.as_i64() {
        return Some(value.into());
    }
    if let Some(value) = number.as_u64() {
        return Some(value.into());
    }
    number.as_f64().and_then(serde_json::Number::from_f64)
}
