use std::borrow::Cow;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::json::path::PathSeg;
use crate::value::{Value, NULL};

/// A node of the context chain built while rendering.
///
/// Scopes are created for the top level of a render, for every block body,
/// every `each` iteration and every partial call. A scope never changes after
/// it is built and only points to scopes built before it.
#[derive(Debug)]
pub struct Scope {
    context: Value,
    parent: Value,
    root: Arc<Value>,
    overrides: Option<BTreeMap<String, Value>>,
    index: Option<usize>,
    key: Option<String>,
    first: Option<bool>,
    last: Option<bool>,
}

impl Scope {
    pub fn new(context: Value, parent: Value, root: Arc<Value>) -> Scope {
        Scope {
            context,
            parent,
            root,
            overrides: None,
            index: None,
            key: None,
            first: None,
            last: None,
        }
    }

    /// Names that shadow the context, as given to a partial call.
    pub fn with_overrides(mut self, overrides: BTreeMap<String, Value>) -> Scope {
        if !overrides.is_empty() {
            self.overrides = Some(overrides);
        }
        self
    }

    /// Iteration metadata for a scope created by `each`.
    pub fn with_iteration(mut self, index: usize, first: bool, last: bool) -> Scope {
        self.index = Some(index);
        self.first = Some(first);
        self.last = Some(last);
        self
    }

    pub fn with_key(mut self, key: String) -> Scope {
        self.key = Some(key);
        self
    }

    /// Current data, looking through scopes wrapped as context.
    pub fn this(&self) -> &Value {
        self.context.as_data()
    }

    pub fn context(&self) -> &Value {
        &self.context
    }

    pub fn parent(&self) -> &Value {
        &self.parent
    }

    pub fn root(&self) -> &Value {
        &self.root
    }

    pub(crate) fn root_arc(&self) -> &Arc<Value> {
        &self.root
    }

    /// Look up `name` on this scope: `@` variables and `this` first, then the
    /// overrides, then the context.
    pub fn get(&self, name: &str) -> Cow<'_, Value> {
        match name {
            "@root" => return Cow::Borrowed(&*self.root),
            "@_parent" => return Cow::Borrowed(&self.parent),
            "this" => return Cow::Borrowed(&self.context),
            "@index" if self.index.is_some() => return Cow::Owned(Value::from(self.index)),
            "@key" if self.key.is_some() => return Cow::Owned(Value::from(self.key.clone())),
            "@first" if self.first.is_some() => return Cow::Owned(Value::from(self.first)),
            "@last" if self.last.is_some() => return Cow::Owned(Value::from(self.last)),
            _ => {}
        }
        if let Some(v) = self.overrides.as_ref().and_then(|o| o.get(name)) {
            return Cow::Borrowed(v);
        }
        pick(&self.context, name)
    }
}

/// Mapping, index and scope lookup on a single value. Anything that cannot be
/// looked up yields null.
fn pick<'a>(value: &'a Value, name: &str) -> Cow<'a, Value> {
    match value {
        Value::Scope(s) => s.get(name),
        Value::Object(map) => map.get(name).map(Cow::Borrowed).unwrap_or(Cow::Borrowed(&NULL)),
        Value::Array(items) => name
            .parse::<usize>()
            .ok()
            .and_then(|i| items.get(i))
            .map(Cow::Borrowed)
            .unwrap_or(Cow::Borrowed(&NULL)),
        _ => Cow::Borrowed(&NULL),
    }
}

fn step<'a>(value: Cow<'a, Value>, name: &str) -> Cow<'a, Value> {
    match value {
        Cow::Borrowed(v) => pick(v, name),
        Cow::Owned(v) => Cow::Owned(pick(&v, name).into_owned()),
    }
}

/// Walk `context` along `segs`.
///
/// `..` moves to the parent scope. `@..` does the same and reads the next
/// name as an `@` variable of that parent. A path made only of `.`/`this`
/// yields the current data rather than the scope wrapping it.
pub fn resolve<'a>(context: &'a Value, segs: &[PathSeg]) -> Cow<'a, Value> {
    if segs.iter().all(|s| *s == PathSeg::Current) {
        return Cow::Borrowed(context.as_data());
    }

    let mut current = Cow::Borrowed(context);
    let mut carry_data = false;
    for seg in segs {
        if let Value::Null = *current {
            return Cow::Borrowed(&NULL);
        }
        current = match seg {
            PathSeg::Current => continue,
            PathSeg::Parent => step(current, "@_parent"),
            PathSeg::ParentData => {
                carry_data = true;
                step(current, "@_parent")
            }
            PathSeg::Named(name) if carry_data => {
                carry_data = false;
                step(current, &format!("@{}", name))
            }
            PathSeg::Named(name) => step(current, name),
        };
    }
    current
}
