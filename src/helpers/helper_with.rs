use crate::helpers::{HelperDef, HelperResult};
use crate::render::Helper;
use crate::value::Value;

#[derive(Clone, Copy)]
pub struct WithHelper;

impl HelperDef for WithHelper {
    fn call(&self, h: &Helper) -> HelperResult {
        let context = h.param(0).cloned().unwrap_or(Value::Null);
        Ok(Value::Safe(h.render(context)?))
    }
}

pub static WITH_HELPER: WithHelper = WithHelper;
