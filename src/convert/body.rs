//! Body conversion and block aggregation.

use super::Converter;
use crate::error::Result;
use crate::syntax::{Block, Body};
use serde_json::{Map, Value};

impl Converter<'_> {
    /// Convert a scope into an object: attributes first, then blocks.
    pub(super) fn body(&self, body: &Body, depth: usize) -> Result<Map<String, Value>> {
        let depth = self.descend(depth)?;
        let mut out = Map::new();

        for attribute in &body.attributes {
            let value = self.expression(&attribute.expr, depth)?;
            out.insert(attribute.name.clone(), value);
        }

        for block in &body.blocks {
            self.aggregate_block(block, &mut out, depth)?;
        }

        Ok(out)
    }

    /// Fold `block` into `out`.
    ///
    /// The type and every label but the last open (or reuse) one object level
    /// each; the converted body lands under the last label. Unlabeled blocks
    /// always collect into an array under their type key.
    fn aggregate_block(&self, block: &Block, out: &mut Map<String, Value>, depth: usize) -> Result<()> {
        tracing::trace!(kind = %block.kind, labels = ?block.labels, "Aggregating block");

        let value = Value::Object(self.body(&block.body, depth)?);

        let Some((leaf, intermediate)) = block.labels.split_last() else {
            merge_list(out, &block.kind, value, true);
            return Ok(());
        };

        let mut cursor = out;
        for segment in std::iter::once(&block.kind).chain(intermediate) {
            cursor = match cursor
                .entry(segment.clone())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(inner) => inner,
                existing => {
                    return Err(crate::err!(StructuralAmbiguity {
                        path: block_path(block),
                        message: format!(
                            "'{segment}' already holds {} instead of an object",
                            describe(existing)
                        ),
                    }));
                }
            };
        }

        merge_list(cursor, leaf, value, false);
        Ok(())
    }
}

/// Insert `value` under `key`, turning collisions into arrays.
///
/// An existing array is appended to and any other existing value is promoted
/// to a two-element array. With `always_list` a fresh key starts as a
/// one-element array instead of holding `value` directly.
fn merge_list(map: &mut Map<String, Value>, key: &str, value: Value, always_list: bool) {
    match map.get_mut(key) {
        None => {
            let value = if always_list { Value::Array(vec![value]) } else { value };
            map.insert(key.to_owned(), value);
        }
        Some(Value::Array(list)) => list.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
    }
}

/// Dotted `type.label.label` path used in error messages.
fn block_path(block: &Block) -> String {
    std::iter::once(block.kind.as_str())
        .chain(block.labels.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join(".")
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::{ConversionContext, Converter};
    use crate::error::IacCanonError;
    use crate::syntax::Body;
    use pretty_assertions::assert_eq;
    use serde_json::{json, Value};

    fn convert(source: &str, tree: &Body) -> crate::error::Result<Value> {
        Converter::new(ConversionContext::new(source.as_bytes()))
            .convert_body(tree)
            .map(Value::Object)
    }

    #[test]
    fn test_flat_attributes() {
        let tree = body(
            vec![
                attribute("name", string("web")),
                attribute("count", number(3)),
                attribute("enabled", expr(crate::syntax::ExprKind::Literal(crate::syntax::Literal::Bool(true)))),
            ],
            vec![],
        );

        assert_eq!(
            convert("", &tree).unwrap(),
            json!({"name": "web", "count": 3, "enabled": true})
        );
    }

    #[test]
    fn test_duplicate_attribute_last_wins() {
        let tree = body(
            vec![attribute("name", string("first")), attribute("name", string("second"))],
            vec![],
        );
        assert_eq!(convert("", &tree).unwrap(), json!({"name": "second"}));
    }

    #[test]
    fn test_unlabeled_blocks_collect_in_order() {
        let tree = body(
            vec![],
            vec![
                block("rule", &[], body(vec![attribute("id", number(1))], vec![])),
                block("rule", &[], body(vec![attribute("id", number(2))], vec![])),
            ],
        );

        assert_eq!(
            convert("", &tree).unwrap(),
            json!({"rule": [{"id": 1}, {"id": 2}]})
        );
    }

    #[test]
    fn test_single_unlabeled_block_is_array() {
        let tree = body(vec![], vec![block("ingress", &[], body(vec![attribute("port", number(443))], vec![]))]);
        assert_eq!(convert("", &tree).unwrap(), json!({"ingress": [{"port": 443}]}));
    }

    #[test]
    fn test_labels_nest_objects() {
        let tree = body(
            vec![],
            vec![block(
                "resource",
                &["aws_instance", "web"],
                body(vec![attribute("ami", string("ami-123"))], vec![]),
            )],
        );

        assert_eq!(
            convert("", &tree).unwrap(),
            json!({"resource": {"aws_instance": {"web": {"ami": "ami-123"}}}})
        );
    }

    #[test]
    fn test_shared_label_prefix_lands_as_siblings() {
        let tree = body(
            vec![],
            vec![
                block("resource", &["aws_instance", "web"], body(vec![attribute("n", number(1))], vec![])),
                block("resource", &["aws_instance", "db"], body(vec![attribute("n", number(2))], vec![])),
                block("resource", &["aws_s3_bucket", "logs"], body(vec![], vec![])),
            ],
        );

        assert_eq!(
            convert("", &tree).unwrap(),
            json!({
                "resource": {
                    "aws_instance": {"web": {"n": 1}, "db": {"n": 2}},
                    "aws_s3_bucket": {"logs": {}}
                }
            })
        );
    }

    #[test]
    fn test_repeated_label_path_merges_into_array() {
        let tree = body(
            vec![],
            vec![
                block("provider", &["aws"], body(vec![attribute("region", string("us-east-1"))], vec![])),
                block("provider", &["aws"], body(vec![attribute("region", string("eu-west-1"))], vec![])),
                block("provider", &["aws"], body(vec![attribute("region", string("ap-south-1"))], vec![])),
            ],
        );

        assert_eq!(
            convert("", &tree).unwrap(),
            json!({
                "provider": {
                    "aws": [
                        {"region": "us-east-1"},
                        {"region": "eu-west-1"},
                        {"region": "ap-south-1"}
                    ]
                }
            })
        );
    }

    #[test]
    fn test_label_path_through_scalar_is_ambiguous() {
        let tree = body(
            vec![attribute("resource", string("oops"))],
            vec![block("resource", &["aws_instance", "web"], body(vec![], vec![]))],
        );

        let err = convert("", &tree).unwrap_err();
        match err {
            IacCanonError::StructuralAmbiguity { path, .. } => {
                assert_eq!(path, "resource.aws_instance.web");
            }
            other => panic!("Expected StructuralAmbiguity, got {other:?}"),
        }
    }

    #[test]
    fn test_label_path_through_block_array_is_ambiguous() {
        let tree = body(
            vec![],
            vec![
                block("dynamic", &[], body(vec![], vec![])),
                block("dynamic", &["ingress"], body(vec![], vec![])),
            ],
        );

        assert!(matches!(
            convert("", &tree),
            Err(IacCanonError::StructuralAmbiguity { .. })
        ));
    }

    #[test]
    fn test_nested_error_aborts_whole_document() {
        let tree = body(
            vec![attribute("name", string("ok"))],
            vec![block(
                "outer",
                &[],
                body(
                    vec![attribute("value", string("x"))],
                    vec![block("value", &["a"], body(vec![], vec![]))],
                ),
            )],
        );

        assert!(convert("", &tree).is_err());
    }

    #[test]
    fn test_unlabeled_block_after_attribute_promotes() {
        let tree = body(
            vec![attribute("tags", string("legacy"))],
            vec![block("tags", &[], body(vec![attribute("env", string("prod"))], vec![]))],
        );

        assert_eq!(
            convert("", &tree).unwrap(),
            json!({"tags": ["legacy", {"env": "prod"}]})
        );
    }

    #[test]
    fn test_nested_blocks_recurse() {
        let tree = body(
            vec![],
            vec![block(
                "resource",
                &["aws_security_group", "sg"],
                body(
                    vec![attribute("name", string("sg"))],
                    vec![
                        block("ingress", &[], body(vec![attribute("from_port", number(22))], vec![])),
                        block("ingress", &[], body(vec![attribute("from_port", number(443))], vec![])),
                    ],
                ),
            )],
        );

        assert_eq!(
            convert("", &tree).unwrap(),
            json!({
                "resource": {
                    "aws_security_group": {
                        "sg": {
                            "name": "sg",
                            "ingress": [{"from_port": 22}, {"from_port": 443}]
                        }
                    }
                }
            })
        );
    }
}
