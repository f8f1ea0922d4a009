use crate::error::{RenderError, RenderErrorReason};
use crate::helpers::{call_value, HelperDef, HelperResult};
use crate::render::Helper;
use crate::value::Value;

#[derive(Clone, Copy)]
pub struct IfHelper {
    positive: bool,
}

impl HelperDef for IfHelper {
    fn call(&self, h: &Helper) -> HelperResult {
        let param = h.param(0).ok_or_else(|| {
            RenderError::from(RenderErrorReason::ParamNotFound(h.name().to_owned(), 0))
        })?;

        let value = call_value(param, h)?;
        let mut truthy = value.is_truthy();
        if !self.positive {
            truthy = !truthy;
        }

        let out = if truthy {
            h.render(h.this().clone())?
        } else {
            h.render_inverse(h.this().clone())?
        };
        Ok(Value::Safe(out))
    }
}

pub static IF_HELPER: IfHelper = IfHelper { positive: true };
pub static UNLESS_HELPER: IfHelper = IfHelper { positive: false };
