//! Template expansion: replace registered placeholder ops with resolver output.

use super::registry::Resolvers;
use crate::model::{Attribute, Delta, Insert, Op};

/// Expand a template against one level's resolvers.
///
/// Every op that names a registered placeholder is replaced by the op its
/// resolver returns; every other op, including placeholders unknown at this
/// level, is copied unchanged. Inline styles and object references on the
/// placeholder op carry over to a resolved op that is not cooked. The template itself is never
/// modified, so it can be reused for every text or object of a run.
///
/// A block resolution owns the line it sits on: if the next template op is
/// a literal text starting with `\n`, that one newline is dropped.
pub fn expand<S>(template: &Delta, resolvers: &Resolvers<S>, scope: &S) -> Delta {
    let mut ops = Vec::with_capacity(template.ops.len());
    let mut after_block = false;

    for op in &template.ops {
        if let Some(name) = op.placeholder_name() {
            if let Some(resolver) = resolvers.get(name) {
                let mut resolved = resolver(scope);
                if !resolved.is_cooked() {
                    inherit_inline(&mut resolved, op);
                }
                after_block = resolved.is_block();
                ops.push(resolved);
                continue;
            }
            log::trace!("Leaving unknown placeholder '{}' inert", name);
        }

        let mut op = op.clone();
        if std::mem::take(&mut after_block) {
            if let Insert::Text(text) = &mut op.insert {
                if let Some(rest) = text.strip_prefix('\n') {
                    if rest.is_empty() {
                        continue;
                    }
                    *text = rest.to_string();
                }
            }
        }
        ops.push(op);
    }

    Delta::from_ops(ops)
}

fn inherit_inline(resolved: &mut Op, placeholder: &Op) {
    for attribute in placeholder.attributes.iter() {
        if matches!(attribute, Attribute::Style(_) | Attribute::Object(_)) {
            resolved.attributes.insert(attribute.clone());
        }
    }
}

/// Remove newlines from text inserts, dropping ops left empty.
pub fn strip_newlines(delta: Delta) -> Delta {
    let ops = delta
        .ops
        .into_iter()
        .filter_map(|mut op| {
            if let Insert::Text(text) = &mut op.insert {
                if text.contains('\n') {
                    *text = text.replace('\n', "");
                    if text.is_empty() {
                        return None;
                    }
                }
            }
            Some(op)
        })
        .collect();
    Delta::from_ops(ops)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::InlineStyle;
    use pretty_assertions::assert_eq;

    struct Names {
        first: &'static str,
    }

    fn resolvers() -> Resolvers<Names> {
        let mut resolvers = Resolvers::new();
        resolvers.register("first", |s: &Names| Op::text(s.first));
        resolvers.register("block", |_: &Names| Op::cooked("BLOCK", true));
        resolvers
    }

    #[test]
    fn test_replaces_only_matching_op() {
        let template = Delta::from_ops(vec![
            Op::text("Dear ").with_style(InlineStyle::Italic),
            Op::placeholder("first"),
            Op::text("!\n"),
        ]);
        let out = expand(&template, &resolvers(), &Names { first: "Ada" });

        assert_eq!(out.ops.len(), 3);
        assert_eq!(out.ops[0], template.ops[0]);
        assert_eq!(out.ops[1].as_text(), Some("Ada"));
        assert_eq!(out.ops[2], template.ops[2]);
    }

    #[test]
    fn test_placeholder_styles_carry_over() {
        let template = Delta::from_ops(vec![
            Op::placeholder("first").with_style(InlineStyle::Bold),
            Op::placeholder("block").with_style(InlineStyle::Bold),
        ]);
        let out = expand(&template, &resolvers(), &Names { first: "Ada" });
        assert!(out.ops[0].attributes.has_style(InlineStyle::Bold));
        assert!(!out.ops[1].attributes.has_style(InlineStyle::Bold));
    }

    #[test]
    fn test_unknown_placeholder_is_inert() {
        let template = Delta::from_ops(vec![Op::placeholder("missing"), Op::text("\n")]);
        let out = expand(&template, &resolvers(), &Names { first: "x" });
        assert_eq!(out, template);
    }

    #[test]
    fn test_block_swallows_one_leading_newline() {
        let template = Delta::from_ops(vec![
            Op::placeholder("block"),
            Op::text("\n\nafter"),
            Op::placeholder("block"),
            Op::text("\n"),
        ]);
        let out = expand(&template, &resolvers(), &Names { first: "x" });

        assert_eq!(out.ops.len(), 3);
        assert_eq!(out.ops[1].as_text(), Some("\nafter"));
        assert!(out.ops[2].is_block());
    }

    #[test]
    fn test_inline_resolution_keeps_newline() {
        let template = Delta::from_ops(vec![Op::placeholder("first"), Op::text("\n")]);
        let out = expand(&template, &resolvers(), &Names { first: "x" });
        assert_eq!(out.ops[1].as_text(), Some("\n"));
    }

    #[test]
    fn test_template_is_reusable() {
        let template = Delta::from_ops(vec![Op::placeholder("first")]);
        let resolvers = resolvers();
        let a = expand(&template, &resolvers, &Names { first: "a" });
        let b = expand(&template, &resolvers, &Names { first: "b" });
        assert_eq!(a.ops[0].as_text(), Some("a"));
        assert_eq!(b.ops[0].as_text(), Some("b"));
        assert_eq!(template.ops[0].placeholder_name(), Some("first"));
    }

    #[test]
    fn test_strip_newlines() {
        let delta = Delta::from_ops(vec![Op::text("\n"), Op::text("[a\nb]"), Op::placeholder("p")]);
        let out = strip_newlines(delta);
        assert_eq!(out.ops.len(), 2);
        assert_eq!(out.ops[0].as_text(), Some("[ab]"));
    }
}
