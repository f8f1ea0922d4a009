/// Macro that allows you to quickly define a helper by passing a name and a
/// closure-like body over typed parameters.
///
/// # Examples
///
/// ```rust
/// #[macro_use] extern crate whisker;
///
/// use std::collections::HashMap;
/// use whisker::{Compiler, Helpers, Partials, Value};
///
/// whisker_helper!(is_above_10: |x: u64| x > 10);
///
/// # fn main() {
/// let mut helpers: Helpers = HashMap::new();
/// helpers.insert("is-above-10".to_owned(), Value::function(is_above_10));
///
/// let t = Compiler::new()
///     .compile("{{#if (is-above-10 12)}}great!{{else}}okay{{/if}}")
///     .unwrap();
/// let result = t.render(Value::Null, &helpers, &Partials::new(), None).unwrap();
/// assert_eq!(result.to_string(), "great!");
/// # }
/// ```
#[macro_export]
macro_rules! whisker_helper {
    ($struct_name:ident: |$($name:ident: $tpe:tt),*| $body:expr ) => {
        #[allow(non_camel_case_types)]
        #[derive(Clone, Copy)]
        pub struct $struct_name;

        impl $crate::HelperDef for $struct_name {
            #[allow(unused_assignments, unused_mut, unused_variables)]
            fn call(&self, h: &$crate::Helper) -> $crate::HelperResult {
                let mut param_idx = 0;

                $(
                    let $name = h.param(param_idx)
                        .ok_or_else(|| $crate::RenderError::from(
                            $crate::RenderErrorReason::ParamNotFound(
                                stringify!($struct_name).to_owned(),
                                param_idx,
                            )
                        ))
                        .and_then(|x|
                                  $crate::whisker_helper!(@as_value x, $tpe)
                                  .ok_or_else(|| $crate::RenderError::from(
                                      $crate::RenderErrorReason::InvalidParamType(
                                          stringify!($struct_name).to_owned(),
                                          stringify!($tpe),
                                      )
                                  ))
                        )?;
                    param_idx += 1;
                )*

                let result = $body;
                Ok($crate::Value::from(result))
            }
        }
    };

    (@as_value $x:ident, object) => { $x.as_object() };
    (@as_value $x:ident, array) => { $x.as_array() };
    (@as_value $x:ident, str) => { $x.as_str() };
    (@as_value $x:ident, i64) => { $x.as_i64() };
    (@as_value $x:ident, u64) => { $x.as_u64() };
    (@as_value $x:ident, f64) => { $x.as_f64() };
    (@as_value $x:ident, bool) => { $x.as_bool() };
    (@as_value $x:ident, null) => { $x.as_null() };
    (@as_value $x:ident, Value) => { Some($x) };
}

#[cfg(test)]
mod test {
    use std::collections::HashMap;

    use serde_json::json;

    use crate::error::RenderErrorReason;
    use crate::{Compiler, Helpers, Partials, Value};

    whisker_helper!(concat: |a: str, b: str| format!("{}{}", a, b));
    whisker_helper!(sum: |x: i64, y: i64| x + y);
    whisker_helper!(both: |x: bool, y: bool| x && y);

    fn helpers() -> Helpers {
        let mut helpers: Helpers = HashMap::new();
        helpers.insert("concat".to_owned(), Value::function(concat));
        helpers.insert("sum".to_owned(), Value::function(sum));
        helpers.insert("both".to_owned(), Value::function(both));
        helpers
    }

    #[test]
    fn test_macro_helper() {
        let t = Compiler::new()
            .compile("{{concat a \"!\"}} {{sum 1 (sum x 3)}} {{#if (both true flag)}}yes{{/if}}")
            .unwrap();
        let out = t
            .render(
                Value::from(json!({"a": "hi", "x": 2, "flag": true})),
                &helpers(),
                &Partials::new(),
                None,
            )
            .unwrap();
        assert_eq!(out, "hi! 6 yes");
    }

    #[test]
    fn test_macro_helper_param_errors() {
        let t = Compiler::new().compile("{{sum 1}}").unwrap();
        let e = t
            .render(Value::Null, &helpers(), &Partials::new(), None)
            .unwrap_err();
        assert!(matches!(e.reason(), RenderErrorReason::ParamNotFound(_, 1)));

        let t = Compiler::new().compile("{{sum 1 \"two\"}}").unwrap();
        let e = t
            .render(Value::Null, &helpers(), &Partials::new(), None)
            .unwrap_err();
        assert!(matches!(e.reason(), RenderErrorReason::InvalidParamType(_, "i64")));
    }
}
