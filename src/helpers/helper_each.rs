use crate::error::RenderError;
use crate::helpers::{HelperDef, HelperResult};
use crate::output::SafeString;
use crate::render::Helper;
use crate::value::Value;

#[derive(Clone, Copy)]
pub struct EachHelper;

impl HelperDef for EachHelper {
    fn call(&self, h: &Helper) -> HelperResult {
        let collection = h.param(0).map(|v| v.as_data()).unwrap_or(&Value::Null);
        Ok(Value::Safe(each(h, collection)?))
    }
}

/// Render the block once per element of `collection`, or the inverse when
/// there is nothing to iterate.
pub(crate) fn each(h: &Helper, collection: &Value) -> Result<SafeString, RenderError> {
    let mut out = SafeString::new();
    match collection {
        Value::Array(items) if !items.is_empty() => {
            let last = items.len() - 1;
            for (i, item) in items.iter().enumerate() {
                trace!("each: rendering item {}", i);
                let scope = h
                    .scope_for(item.clone())
                    .with_iteration(i, i == 0, i == last);
                out.grow(h.render_scope(scope)?);
            }
        }
        Value::Object(map) if !map.is_empty() => {
            let last = map.len() - 1;
            for (i, (k, v)) in map.iter().enumerate() {
                trace!("each: rendering key {}", k);
                let scope = h
                    .scope_for(v.clone())
                    .with_iteration(i, i == 0, i == last)
                    .with_key(k.clone());
                out.grow(h.render_scope(scope)?);
            }
        }
        _ => {
            out.grow(h.render_inverse(h.this().clone())?);
        }
    }
    Ok(out)
}

pub static EACH_HELPER: EachHelper = EachHelper;

#[cfg(test)]
mod test {
    use serde_json::json;

    use crate::render_template;

    #[test]
    fn test_each_array() {
        assert_eq!(
            render_template(
                "{{#each this}}{{@index}}:{{this}}{{#if @first}}(first){{/if}}{{#if @last}}(last){{/if}} {{/each}}",
                &json!(["a", "b", "c"])
            )
            .unwrap(),
            "0:a(first) 1:b 2:c(last) "
        );
    }

    #[test]
    fn test_each_object() {
        assert_eq!(
            render_template(
                "{{#each this}}{{@key}}={{this}};{{/each}}",
                &json!({"b": 2, "a": 1})
            )
            .unwrap(),
            "a=1;b=2;"
        );
    }

    #[test]
    fn test_each_empty_renders_inverse() {
        let t = "{{#each items}}{{this}}{{else}}none{{/each}}";
        assert_eq!(render_template(t, &json!({"items": []})).unwrap(), "none");
        assert_eq!(render_template(t, &json!({})).unwrap(), "none");
        assert_eq!(render_template(t, &json!({"items": 5})).unwrap(), "none");
        assert_eq!(
            render_template("{{#each items}}{{this}}{{/each}}", &json!({"items": []})).unwrap(),
            ""
        );
    }

    #[test]
    fn test_each_parent_access() {
        assert_eq!(
            render_template(
                "{{#each goodbyes}}{{text}} cruel {{../name}}! {{/each}}",
                &json!({"goodbyes": [{"text": "goodbye"}, {"text": "Goodbye"}], "name": "world"})
            )
            .unwrap(),
            "goodbye cruel world! Goodbye cruel world! "
        );
    }

    #[test]
    fn test_nested_each_data() {
        assert_eq!(
            render_template(
                "{{#each outer}}{{#each inner}}{{@../index}}.{{@index}} {{/each}}{{/each}}",
                &json!({"outer": [{"inner": [1, 2]}, {"inner": [3]}]})
            )
            .unwrap(),
            "0.0 0.1 1.0 "
        );
    }
}
