#![doc(html_root_url = "https://docs.rs/whisker/0.3.0")]
//! # Whisker
//!
//! [Handlebars](http://handlebarsjs.com/) style templates, compiled once into
//! an instruction list and rendered any number of times against data.
//!
//! ## Getting started
//!
//! ```
//! use serde_json::json;
//! use whisker::{Compiler, Helpers, Partials, Value};
//!
//! let template = Compiler::new()
//!     .compile("{{#each goodbyes}}{{text}} cruel {{../name}}! {{/each}}")
//!     .unwrap();
//! let data = json!({
//!     "goodbyes": [{"text": "goodbye"}, {"text": "Goodbye"}],
//!     "name": "world"
//! });
//! let out = template
//!     .render(Value::from(data), &Helpers::new(), &Partials::new(), None)
//!     .unwrap();
//! assert_eq!(out.to_string(), "goodbye cruel world! Goodbye cruel world! ");
//! ```
//!
//! ## Templates
//!
//! The usual handlebars syntax is supported:
//!
//! * `{{path}}` writes a value with HTML escaping, `{{{path}}}` and
//!   `{{&path}}` write it as is.
//! * `{{#name args}}...{{else}}...{{/name}}` calls a block helper, or works
//!   as a section over the value `name` when no helper has that name.
//! * `{{^name}}...{{/name}}` renders when `name` is falsy.
//! * `{{> partial arg key=value}}` renders a partial.
//! * `(helper args)` passes a helper result as an argument.
//! * `{{! comment }}` and `{{!-- comment --}}` render nothing.
//!
//! Paths use `.` or `/` between segments, `[...]` for segments with any
//! character, `../` for the enclosing scope and `@index`, `@key`, `@first`,
//! `@last`, `@root` for data variables. `@../index` reads a data variable of
//! the enclosing scope.
//!
//! Lines holding only a block tag are removed from the output, together with
//! their indentation. `Compiler::strip_standalone(false)` keeps them.
//!
//! ## Helpers
//!
//! Built-in helpers are `if`, `unless`, `each`, `with`, `lookup` and `log`,
//! plus `helperMissing` and `blockHelperMissing` which handle names that are
//! not helpers. Helpers passed to a render call are used before the built-in
//! ones, so a built-in can be replaced by passing one with the same name.
//!
//! A helper is anything implementing [`HelperDef`], closures included. The
//! [`whisker_helper!`] macro defines one from typed parameters.
//!
//! ## Logging
//!
//! Compile and render steps are reported through the `log` crate, as is the
//! output of the `log` helper. No logger is installed by this crate.
//!

#[macro_use]
extern crate lazy_static;
#[macro_use]
extern crate log;
#[macro_use]
extern crate pest_derive;
#[macro_use]
extern crate quick_error;

pub use self::compiler::{CompiledTemplate, Compiler, EscapeFn};
pub use self::context::{resolve, Scope};
pub use self::error::{
    RenderError, RenderErrorReason, TemplateError, TemplateErrorReason, TemplateRenderError,
};
pub use self::helpers::{HelperDef, HelperResult};
pub use self::json::path::{Path, PathSeg};
pub use self::output::{Output, SafeString};
pub use self::partial::Partial;
pub use self::render::{Helper, HelperOptions, Helpers, Partials};
pub use self::support::str::{escape_html, no_escape};
pub use self::value::{to_value, Value};

use serde::Serialize;

#[macro_use]
mod macros;
mod compiler;
mod context;
mod error;
mod grammar;
mod helpers;
mod json;
mod output;
mod partial;
mod render;
mod sources;
mod support;
mod template;
mod value;
mod whitespace;

/// Compile `template_string` and render it once with `data`.
///
/// ```
/// let out = whisker::render_template("Hello {{name}}!", &serde_json::json!({"name": "you"}));
/// assert_eq!(out.unwrap(), "Hello you!");
/// ```
pub fn render_template<T>(template_string: &str, data: &T) -> Result<String, TemplateRenderError>
where
    T: Serialize,
{
    let template = Compiler::new().compile(template_string)?;
    Ok(template.render_data(data)?)
}
