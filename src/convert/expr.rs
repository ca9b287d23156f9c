//! Expression evaluation.

use super::Converter;
use crate::error::Result;
use crate::syntax::{ExprKind, Expression};
use serde_json::{Map, Value};

impl Converter<'_> {
    /// Convert one expression into a JSON value.
    pub(super) fn expression(&self, expr: &Expression, depth: usize) -> Result<Value> {
        let depth = self.descend(depth)?;

        match &expr.kind {
            ExprKind::Literal(literal) => Ok(literal.to_json()),
            ExprKind::Template(template) => self.template(template, depth).map(Value::String),
            ExprKind::TemplateWrap(inner) => self.expression(inner, depth),
            ExprKind::Tuple(elements) => elements
                .iter()
                .map(|element| self.expression(element, depth))
                .collect::<Result<Vec<_>>>()
                .map(Value::Array),
            ExprKind::Object(items) => {
                let mut object = Map::new();
                for item in items {
                    let key = self.object_key(&item.key, depth)?;
                    let value = self.expression(&item.value, depth)?;
                    object.insert(key, value);
                }
                Ok(Value::Object(object))
            }
            // Not evaluated here: kept verbatim for the policy engine.
            ExprKind::Reference
            | ExprKind::Conditional(_)
            | ExprKind::TemplateFor(_)
            | ExprKind::Dynamic => self.marker(expr).map(Value::String),
        }
    }

    /// Object keys: references are taken verbatim, anything else is rendered
    /// like template content.
    fn object_key(&self, key: &Expression, depth: usize) -> Result<String> {
        match key.kind {
            ExprKind::Reference => Ok(self.ctx.source_text(&key.span)?.to_owned()),
            _ => self.string_part(key, depth),
        }
    }
}
