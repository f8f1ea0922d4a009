use std::collections::BTreeMap;
use std::sync::Arc;

use crate::compiler::CompiledTemplate;
use crate::context::Scope;
use crate::value::Value;

/// A partial as supplied to a render call.
///
/// Source text is compiled the first time the partial is used in a render,
/// with the settings of the template being rendered.
#[derive(Clone, Debug)]
pub enum Partial {
    Source(String),
    Compiled(Arc<CompiledTemplate>),
}

impl<'a> From<&'a str> for Partial {
    fn from(source: &'a str) -> Partial {
        Partial::Source(source.to_owned())
    }
}

impl From<String> for Partial {
    fn from(source: String) -> Partial {
        Partial::Source(source)
    }
}

impl From<CompiledTemplate> for Partial {
    fn from(t: CompiledTemplate) -> Partial {
        Partial::Compiled(Arc::new(t))
    }
}

impl From<Arc<CompiledTemplate>> for Partial {
    fn from(t: Arc<CompiledTemplate>) -> Partial {
        Partial::Compiled(t)
    }
}

/// Scope a partial body runs in.
///
/// A positional argument becomes the new context. Without one the calling
/// scope itself is the context, so the partial keeps seeing `@index` and
/// the other iteration variables of its caller. Named arguments shadow the
/// context either way.
pub(crate) fn partial_scope(
    current: &Arc<Scope>,
    context: Option<Value>,
    overrides: BTreeMap<String, Value>,
) -> Scope {
    let context = context.unwrap_or_else(|| Value::Scope(current.clone()));
    Scope::new(
        context,
        Value::Scope(current.clone()),
        current.root_arc().clone(),
    )
    .with_overrides(overrides)
}

#[cfg(test)]
mod test {
    use std::collections::BTreeMap;
    use std::sync::Arc;

    use serde_json::json;

    use super::partial_scope;
    use crate::context::Scope;
    use crate::value::Value;

    fn top() -> Arc<Scope> {
        let data = Value::from(json!({"name": "top", "item": {"name": "item"}}));
        Arc::new(Scope::new(data.clone(), Value::Null, Arc::new(data)))
    }

    #[test]
    fn test_scope_without_argument() {
        let current = top();
        let s = partial_scope(&current, None, BTreeMap::new());
        assert_eq!(*s.get("name"), Value::from("top"));
        assert_eq!(*s.this(), *current.this());
    }

    #[test]
    fn test_scope_with_argument_and_overrides() {
        let current = top();
        let item = current.get("item").into_owned();
        let mut overrides = BTreeMap::new();
        overrides.insert("extra".to_owned(), Value::from(1));
        let s = partial_scope(&current, Some(item), overrides);
        assert_eq!(*s.get("name"), Value::from("item"));
        assert_eq!(*s.get("extra"), Value::from(1));
        assert!(matches!(s.parent(), Value::Scope(p) if Arc::ptr_eq(p, &current)));
    }
}
