use crate::error::{RenderError, RenderErrorReason};
use crate::helpers::helper_each::each;
use crate::helpers::{call_value, HelperDef, HelperResult};
use crate::render::Helper;
use crate::value::Value;

/// Handles `{{#name}}...{{/name}}` when `name` is not a helper. The looked
/// up value arrives as the first argument.
#[derive(Clone, Copy)]
pub struct BlockHelperMissing;

impl HelperDef for BlockHelperMissing {
    fn call(&self, h: &Helper) -> HelperResult {
        let param = h.param(0).cloned().unwrap_or(Value::Null);
        let context = call_value(&param, h)?;

        let out = match context.as_data() {
            Value::String(s) if s.is_empty() => h.render(context.clone())?,
            v if !v.is_truthy() => h.render_inverse(h.this().clone())?,
            Value::Array(_) => each(h, context.as_data())?,
            Value::Bool(true) => h.render(h.this().clone())?,
            _ => h.render(context.clone())?,
        };
        Ok(Value::Safe(out))
    }
}

/// Called for a simple name that is neither a helper nor present in the
/// data. A plain read renders empty, a call with arguments is an error.
#[derive(Clone, Copy)]
pub struct HelperMissing;

impl HelperDef for HelperMissing {
    fn call(&self, h: &Helper) -> HelperResult {
        if h.params().is_empty() && h.hash().is_empty() {
            return Ok(Value::Null);
        }
        Err(RenderError::from(RenderErrorReason::MissingProperty(
            h.name().to_owned(),
        )))
    }
}

pub static BLOCK_HELPER_MISSING: BlockHelperMissing = BlockHelperMissing;
pub static HELPER_MISSING: HelperMissing = HelperMissing;
