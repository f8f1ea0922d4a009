use crate::helpers::{HelperDef, HelperResult};
use crate::render::Helper;
use crate::value::Value;

#[derive(Clone, Copy)]
pub struct LogHelper;

impl HelperDef for LogHelper {
    fn call(&self, h: &Helper) -> HelperResult {
        let message = h
            .params()
            .iter()
            .map(|v| v.render())
            .collect::<Vec<String>>()
            .join(" ");
        let level = h
            .hash_get("level")
            .and_then(|v| v.as_str())
            .unwrap_or("info");

        match level {
            "trace" => trace!("{}", message),
            "debug" => debug!("{}", message),
            "info" => info!("{}", message),
            "warn" => warn!("{}", message),
            "error" => error!("{}", message),
            _ => {}
        };
        Ok(Value::Null)
    }
}

pub static LOG_HELPER: LogHelper = LogHelper;
