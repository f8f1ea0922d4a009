use crate::helpers::{HelperDef, HelperResult};
use crate::render::Helper;
use crate::value::Value;

#[derive(Clone, Copy)]
pub struct LookupHelper;

impl HelperDef for LookupHelper {
    fn call(&self, h: &Helper) -> HelperResult {
        let (collection, key) = match (h.param(0), h.param(1)) {
            (Some(c), Some(k)) => (c, k),
            _ => return Ok(Value::Null),
        };

        let found = match collection {
            Value::Scope(s) => s.get(&key.render()).into_owned(),
            Value::Array(items) => key
                .as_u64()
                .or_else(|| key.as_str().and_then(|s| s.parse().ok()))
                .and_then(|i| items.get(i as usize))
                .cloned()
                .unwrap_or(Value::Null),
            Value::Object(map) => map.get(&key.render()).cloned().unwrap_or(Value::Null),
            _ => Value::Null,
        };
        Ok(found)
    }
}

pub static LOOKUP_HELPER: LookupHelper = LookupHelper;
