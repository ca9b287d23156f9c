//! Template reconstruction.
//!
//! Interpolated templates cannot be evaluated without variables, so they are
//! rebuilt as normalized template strings instead:
//!
//! | part                      | rendering                                      |
//! |---------------------------|------------------------------------------------|
//! | literal text              | verbatim                                       |
//! | literal interpolation     | the literal as a string                        |
//! | conditional / `%{if}`     | `%{if <cond>}<true>[%{else}<false>]%{endif}`   |
//! | `%{for}`                  | `%{for [<key>, ]<value> in <coll>}<body>%{endfor}` |
//! | anything else             | `${<source>}`                                  |

use super::{evaluation_error, Converter};
use crate::error::Result;
use crate::syntax::{Conditional, ExprKind, Expression, Template, TemplateFor, TemplatePart};

impl Converter<'_> {
    /// Render a template to a string.
    pub(super) fn template(&self, template: &Template, depth: usize) -> Result<String> {
        if let Some(literal) = template.as_literal() {
            return Ok(literal);
        }

        let mut rendered = String::new();
        for part in &template.parts {
            match part {
                TemplatePart::Literal(text) => rendered.push_str(text),
                TemplatePart::Interpolation(expr) | TemplatePart::Directive(expr) => {
                    rendered.push_str(&self.string_part(expr, depth)?);
                }
            }
        }
        Ok(rendered)
    }

    /// Render an expression embedded in a template (or used as an object key).
    pub(super) fn string_part(&self, expr: &Expression, depth: usize) -> Result<String> {
        let depth = self.descend(depth)?;

        match &expr.kind {
            ExprKind::Literal(literal) => literal
                .coerce_to_string()
                .ok_or_else(|| evaluation_error(&self.ctx, expr, "null cannot be converted to a string")),
            ExprKind::Template(template) => self.template(template, depth),
            ExprKind::TemplateWrap(inner) => self.string_part(inner, depth),
            ExprKind::Conditional(conditional) => self.if_directive(conditional, depth),
            ExprKind::TemplateFor(for_directive) => self.for_directive(for_directive, depth),
            ExprKind::Tuple(_) | ExprKind::Object(_) | ExprKind::Reference | ExprKind::Dynamic => {
                self.marker(expr)
            }
        }
    }

    fn if_directive(&self, conditional: &Conditional, depth: usize) -> Result<String> {
        let condition = self.ctx.source_text(&conditional.condition.span)?;
        let true_result = self.string_part(&conditional.true_result, depth)?;
        let false_result = self.string_part(&conditional.false_result, depth)?;

        let mut rendered = format!("%{{if {condition}}}{true_result}");
        if !false_result.is_empty() {
            rendered.push_str("%{else}");
            rendered.push_str(&false_result);
        }
        rendered.push_str("%{endif}");
        Ok(rendered)
    }

    fn for_directive(&self, for_directive: &TemplateFor, depth: usize) -> Result<String> {
        let collection = self.ctx.source_text(&for_directive.collection.span)?;
        let body = self.string_part(&for_directive.body, depth)?;

        let mut rendered = String::from("%{for ");
        if let Some(key_var) = &for_directive.key_var {
            rendered.push_str(key_var);
            rendered.push_str(", ");
        }
        rendered.push_str(&for_directive.value_var);
        rendered.push_str(" in ");
        rendered.push_str(collection);
        rendered.push('}');
        rendered.push_str(&body);
        rendered.push_str("%{endfor}");
        Ok(rendered)
    }
}
