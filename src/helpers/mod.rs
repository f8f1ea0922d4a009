use std::collections::HashMap;

use crate::error::RenderError;
use crate::render::Helper;
use crate::value::Value;

pub use self::helper_each::EACH_HELPER;
pub use self::helper_if::{IF_HELPER, UNLESS_HELPER};
pub use self::helper_log::LOG_HELPER;
pub use self::helper_lookup::LOOKUP_HELPER;
pub use self::helper_missing::{BLOCK_HELPER_MISSING, HELPER_MISSING};
pub use self::helper_with::WITH_HELPER;

/// Value a helper hands back to the template. Block helpers return the
/// rendered body as `Value::Safe` so it is not escaped again.
pub type HelperResult = Result<Value, RenderError>;

/// Helper definition
///
/// Helpers get the current scope through `h.this()`, evaluated arguments
/// through `h.param(i)` and `h.hash_get(name)`, and when called as a block,
/// the body and the `{{else}}` branch through `h.render` and
/// `h.render_inverse`.
///
/// A plain closure can be used as a helper:
///
/// ```
/// use whisker::{Helper, HelperResult, Value};
///
/// let upper = Value::function(|h: &Helper| -> HelperResult {
///     let s = h.param(0).map(|v| v.render()).unwrap_or_default();
///     Ok(Value::from(s.to_uppercase()))
/// });
/// assert!(upper.is_callable());
/// ```
pub trait HelperDef: Send + Sync {
    fn call(&self, h: &Helper) -> HelperResult;
}

impl<F> HelperDef for F
where
    F: Send + Sync + for<'a, 'b> Fn(&'a Helper<'b>) -> HelperResult,
{
    fn call(&self, h: &Helper) -> HelperResult {
        (*self)(h)
    }
}

lazy_static! {
    pub(crate) static ref BUILTIN_HELPERS: HashMap<&'static str, Value> = {
        let mut m = HashMap::new();
        m.insert("if", Value::function(IF_HELPER));
        m.insert("unless", Value::function(UNLESS_HELPER));
        m.insert("each", Value::function(EACH_HELPER));
        m.insert("with", Value::function(WITH_HELPER));
        m.insert("lookup", Value::function(LOOKUP_HELPER));
        m.insert("log", Value::function(LOG_HELPER));
        m.insert("blockHelperMissing", Value::function(BLOCK_HELPER_MISSING));
        m.insert("helperMissing", Value::function(HELPER_MISSING));
        m
    };
}

/// Call `value` with no arguments when it is a function. `if` and
/// `blockHelperMissing` use this to evaluate function values in data.
pub(crate) fn call_value(value: &Value, h: &Helper) -> HelperResult {
    match value {
        Value::Function(f) => f.call(&h.without_arguments()),
        v => Ok(v.clone()),
    }
}

mod helper_each;
mod helper_if;
mod helper_log;
mod helper_lookup;
mod helper_missing;
mod helper_with;
