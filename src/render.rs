use std::cell::RefCell;
use std::collections::{BTreeMap, HashMap};
use std::io::Write;
use std::sync::Arc;

use serde::Serialize;

use crate::compiler::{Argument, Call, CompiledTemplate, Compiler, Constant, Instruction, Settings};
use crate::context::{resolve, Scope};
use crate::error::{RenderError, RenderErrorReason};
use crate::helpers::BUILTIN_HELPERS;
use crate::output::{Output, SafeString, WriteOutput};
use crate::partial::{self, Partial};
use crate::value::{to_value, Value};

/// Helpers supplied to a render call, merged over the built-in helpers.
pub type Helpers = HashMap<String, Value>;

/// Partials supplied to a render call.
pub type Partials = HashMap<String, Partial>;

/// State shared by every scope of one render call.
pub(crate) struct RenderContext<'rc> {
    helpers: &'rc Helpers,
    partials: &'rc Partials,
    compiled_partials: RefCell<HashMap<String, Arc<CompiledTemplate>>>,
    settings: Settings,
}

impl<'rc> RenderContext<'rc> {
    fn new(helpers: &'rc Helpers, partials: &'rc Partials, settings: Settings) -> RenderContext<'rc> {
        RenderContext {
            helpers,
            partials,
            compiled_partials: RefCell::new(HashMap::new()),
            settings,
        }
    }

    /// Caller helpers win over built-ins of the same name.
    pub(crate) fn get_helper(&self, name: &str) -> Option<&Value> {
        self.helpers
            .get(name)
            .or_else(|| BUILTIN_HELPERS.get(name))
    }

    /// Compiled form of partial `name`. Partials given as source are
    /// compiled on first use and kept for the rest of the render.
    fn get_partial(&self, name: &str) -> Result<Arc<CompiledTemplate>, RenderError> {
        if let Some(t) = self.compiled_partials.borrow().get(name) {
            return Ok(t.clone());
        }

        let compiled = match self.partials.get(name) {
            Some(Partial::Compiled(t)) => t.clone(),
            Some(Partial::Source(source)) => {
                debug!("compiling partial {}", name);
                let t = Compiler::with_settings(self.settings.clone())
                    .compile_with_name(name, source)
                    .map_err(|e| RenderErrorReason::PartialCompile(name.to_owned(), e))?;
                Arc::new(t)
            }
            None => return Err(RenderErrorReason::PartialNotFound(name.to_owned()).into()),
        };
        self.compiled_partials
            .borrow_mut()
            .insert(name.to_owned(), compiled.clone());
        Ok(compiled)
    }
}

/// The body and `{{else}}` branch of a block helper call.
pub struct HelperOptions<'a> {
    template: Option<&'a CompiledTemplate>,
    inverse: Option<&'a CompiledTemplate>,
    scope: &'a Arc<Scope>,
    rc: &'a RenderContext<'a>,
}

impl<'a> HelperOptions<'a> {
    pub fn template(&self) -> Option<&'a CompiledTemplate> {
        self.template
    }

    pub fn inverse(&self) -> Option<&'a CompiledTemplate> {
        self.inverse
    }

    /// Render the body with `context` as `this`.
    pub fn render(&self, context: Value) -> Result<SafeString, RenderError> {
        self.render_in(self.template, context)
    }

    /// Render the `{{else}}` branch, empty when the block has none.
    pub fn render_inverse(&self, context: Value) -> Result<SafeString, RenderError> {
        self.render_in(self.inverse, context)
    }

    pub fn render_scope(&self, scope: Scope) -> Result<SafeString, RenderError> {
        let mut out = SafeString::new();
        if let Some(t) = self.template {
            render_scope(t, &Arc::new(scope), self.rc, &mut out)?;
        }
        Ok(out)
    }

    fn render_in(
        &self,
        template: Option<&CompiledTemplate>,
        context: Value,
    ) -> Result<SafeString, RenderError> {
        let mut out = SafeString::new();
        if let Some(t) = template {
            let scope = match context {
                Value::Scope(s) => s,
                v => Arc::new(child_scope(self.scope, v)),
            };
            render_scope(t, &scope, self.rc, &mut out)?;
        }
        Ok(out)
    }
}

fn child_scope(parent: &Arc<Scope>, context: Value) -> Scope {
    trace!("new scope under {:?}", parent.this());
    Scope::new(
        context,
        Value::Scope(parent.clone()),
        parent.root_arc().clone(),
    )
}

/// What a helper sees of its call site.
pub struct Helper<'a> {
    name: &'a str,
    this: Value,
    scope: &'a Arc<Scope>,
    params: Vec<Value>,
    hash: BTreeMap<String, Value>,
    options: Option<HelperOptions<'a>>,
}

impl<'a> Helper<'a> {
    pub fn name(&self) -> &str {
        self.name
    }

    /// The calling scope, as a `Value::Scope`.
    pub fn this(&self) -> &Value {
        &self.this
    }

    pub fn scope(&self) -> &Arc<Scope> {
        self.scope
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    pub fn param(&self, idx: usize) -> Option<&Value> {
        self.params.get(idx)
    }

    pub fn hash(&self) -> &BTreeMap<String, Value> {
        &self.hash
    }

    pub fn hash_get(&self, key: &str) -> Option<&Value> {
        self.hash.get(key)
    }

    pub fn options(&self) -> Option<&HelperOptions<'a>> {
        self.options.as_ref()
    }

    pub fn is_block(&self) -> bool {
        self.options.is_some()
    }

    /// Render the block body with `context` as `this`. A `Value::Scope` is
    /// used as is, anything else gets a new scope under the calling one.
    pub fn render(&self, context: Value) -> Result<SafeString, RenderError> {
        match self.options {
            Some(ref o) => o.render(context),
            None => Ok(SafeString::new()),
        }
    }

    pub fn render_inverse(&self, context: Value) -> Result<SafeString, RenderError> {
        match self.options {
            Some(ref o) => o.render_inverse(context),
            None => Ok(SafeString::new()),
        }
    }

    /// A new scope under the calling one, to be rendered with
    /// `render_scope`.
    pub fn scope_for(&self, context: Value) -> Scope {
        child_scope(self.scope, context)
    }

    pub fn render_scope(&self, scope: Scope) -> Result<SafeString, RenderError> {
        match self.options {
            Some(ref o) => o.render_scope(scope),
            None => Ok(SafeString::new()),
        }
    }

    /// Same call site with no arguments and no block.
    pub(crate) fn without_arguments(&self) -> Helper<'a> {
        Helper {
            name: self.name,
            this: self.this.clone(),
            scope: self.scope,
            params: Vec::new(),
            hash: BTreeMap::new(),
            options: None,
        }
    }
}

fn eval_arg<'a>(
    t: &'a CompiledTemplate,
    arg: &'a Argument,
    scope: &'a Arc<Scope>,
    rc: &'a RenderContext<'a>,
) -> Result<Value, RenderError> {
    match arg {
        Argument::Constant(idx) => match t.constant(*idx) {
            Some(Constant::Literal(v)) => Ok(v.clone()),
            _ => Ok(Value::Null),
        },
        Argument::Path(path) => {
            let this = Value::Scope(scope.clone());
            let value = resolve(&this, path.segs()).into_owned();
            Ok(value)
        }
        Argument::Subexpr(call) => {
            let name = call.helper.as_deref().unwrap_or(&call.raw);
            match rc.get_helper(name) {
                Some(Value::Function(f)) => {
                    let h = build_helper(t, call, name, scope, rc, None)?;
                    f.call(&h)
                }
                Some(v) => Ok(v.clone()),
                None => Err(RenderErrorReason::MissingProperty(name.to_owned()).into()),
            }
        }
    }
}

/// `this` handed to a helper. A top-level scope has no parent, so it is
/// wrapped once more to let `..` in a helper body reach the top-level data.
fn helper_this(scope: &Arc<Scope>) -> Value {
    if let Value::Null = scope.parent() {
        let wrapper = Scope::new(
            scope.context().clone(),
            Value::Scope(scope.clone()),
            scope.root_arc().clone(),
        );
        Value::Scope(Arc::new(wrapper))
    } else {
        Value::Scope(scope.clone())
    }
}

fn build_helper<'a>(
    t: &'a CompiledTemplate,
    call: &'a Call,
    name: &'a str,
    scope: &'a Arc<Scope>,
    rc: &'a RenderContext<'a>,
    options: Option<HelperOptions<'a>>,
) -> Result<Helper<'a>, RenderError> {
    let params = call
        .params
        .iter()
        .map(|a| eval_arg(t, a, scope, rc))
        .collect::<Result<Vec<_>, _>>()?;
    let hash = call
        .hash
        .iter()
        .map(|(k, a)| Ok((k.clone(), eval_arg(t, a, scope, rc)?)))
        .collect::<Result<BTreeMap<_, _>, RenderError>>()?;
    Ok(Helper {
        name,
        this: helper_this(scope),
        scope,
        params,
        hash,
        options,
    })
}

fn expand<'a>(
    t: &'a CompiledTemplate,
    call: &'a Call,
    scope: &'a Arc<Scope>,
    rc: &'a RenderContext<'a>,
) -> Result<Value, RenderError> {
    let value = match call.helper.as_deref().and_then(|n| rc.get_helper(n)) {
        Some(h) => h.clone(),
        None => eval_arg(t, &call.head, scope, rc)?,
    };

    if let Value::Function(ref f) = value {
        trace!("calling helper {}", call.raw);
        let h = build_helper(t, call, &call.raw, scope, rc, None)?;
        return f.call(&h);
    }

    if let (Value::Null, Some(name)) = (&value, call.helper.as_deref()) {
        if let Some(Value::Function(missing)) = rc.get_helper("helperMissing") {
            let h = build_helper(t, call, name, scope, rc, None)?;
            return missing.call(&h);
        }
    }
    Ok(value)
}

fn write_value(
    value: &Value,
    escape: bool,
    settings: &Settings,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    match value {
        Value::Safe(s) => s.write_to(out)?,
        v => {
            let text = v.render();
            if escape {
                out.write(&(settings.escape_fn)(&text))?;
            } else {
                out.write(&text)?;
            }
        }
    }
    Ok(())
}

fn render_block<'a>(
    t: &'a CompiledTemplate,
    call: &'a Call,
    options: HelperOptions<'a>,
    scope: &'a Arc<Scope>,
    rc: &'a RenderContext<'a>,
) -> Result<Value, RenderError> {
    let helper = call.helper.as_deref().and_then(|n| rc.get_helper(n));
    if let Some(Value::Function(f)) = helper {
        debug!("block helper {}", call.raw);
        let h = build_helper(t, call, &call.raw, scope, rc, Some(options))?;
        return f.call(&h);
    }

    let value = match helper {
        Some(v) => v.clone(),
        None => eval_arg(t, &call.head, scope, rc)?,
    };
    match rc.get_helper("blockHelperMissing") {
        Some(Value::Function(missing)) => {
            let h = Helper {
                name: &call.raw,
                this: helper_this(scope),
                scope,
                params: vec![value],
                hash: BTreeMap::new(),
                options: Some(options),
            };
            missing.call(&h)
        }
        _ => Ok(Value::Null),
    }
}

fn render_inverted<'a>(
    t: &'a CompiledTemplate,
    call: &'a Call,
    body: Option<&'a CompiledTemplate>,
    scope: &'a Arc<Scope>,
    rc: &'a RenderContext<'a>,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    if let Some(Value::Function(f)) = call.helper.as_deref().and_then(|n| rc.get_helper(n)) {
        let options = HelperOptions {
            template: None,
            inverse: body,
            scope,
            rc,
        };
        let h = build_helper(t, call, &call.raw, scope, rc, Some(options))?;
        let result = f.call(&h)?;
        return write_value(&result, false, &t.settings, out);
    }

    let value = eval_arg(t, &call.head, scope, rc)?;
    if !value.is_truthy() {
        if let Some(body) = body {
            render_scope(body, scope, rc, out)?;
        }
    }
    Ok(())
}

fn render_partial<'a>(
    t: &'a CompiledTemplate,
    name: &str,
    context: Option<&'a Argument>,
    overrides: &'a [(String, Argument)],
    scope: &'a Arc<Scope>,
    rc: &'a RenderContext<'a>,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    let partial = rc.get_partial(name)?;
    let context = match context {
        Some(arg) => Some(eval_arg(t, arg, scope, rc)?),
        None => None,
    };
    let overrides = overrides
        .iter()
        .map(|(k, a)| Ok((k.clone(), eval_arg(t, a, scope, rc)?)))
        .collect::<Result<BTreeMap<_, _>, RenderError>>()?;

    debug!("expanding partial {}", name);
    let partial_scope = Arc::new(partial::partial_scope(scope, context, overrides));
    render_scope(&partial, &partial_scope, rc, out)
        .map_err(|e| e.in_template(partial.name().map(|n| n.to_owned())))
}

/// Run the instructions of `t` against `scope`.
pub(crate) fn render_scope<'a>(
    t: &'a CompiledTemplate,
    scope: &'a Arc<Scope>,
    rc: &'a RenderContext<'a>,
    out: &mut dyn Output,
) -> Result<(), RenderError> {
    for ins in &t.instructions {
        match ins {
            Instruction::Append(idx) => {
                if let Some(Constant::Text(s)) = t.constant(*idx) {
                    out.write(s)?;
                }
            }
            Instruction::Expand { call, escape } => {
                let value = expand(t, call, scope, rc)?;
                write_value(&value, *escape, &t.settings, out)?;
            }
            Instruction::Block {
                call,
                program,
                inverse,
            } => {
                let options = HelperOptions {
                    template: t.program(*program),
                    inverse: inverse.and_then(|i| t.program(i)),
                    scope,
                    rc,
                };
                let value = render_block(t, call, options, scope, rc)?;
                write_value(&value, false, &t.settings, out)?;
            }
            Instruction::InvertedBlock { call, program } => {
                render_inverted(t, call, t.program(*program), scope, rc, out)?;
            }
            Instruction::Partial {
                name,
                context,
                overrides,
            } => {
                render_partial(t, name, context.as_ref(), overrides, scope, rc, out)?;
            }
        }
    }
    Ok(())
}

impl CompiledTemplate {
    /// Render with `context` as the top-level data. `root` is what `@root`
    /// refers to and defaults to `context`.
    pub fn render(
        &self,
        context: Value,
        helpers: &Helpers,
        partials: &Partials,
        root: Option<&Value>,
    ) -> Result<SafeString, RenderError> {
        let mut out = SafeString::new();
        self.render_output(context, helpers, partials, root, &mut out)?;
        Ok(out)
    }

    /// Serialize `data` and render it with no extra helpers or partials.
    pub fn render_data<T: Serialize>(&self, data: &T) -> Result<String, RenderError> {
        let out = self.render(to_value(data)?, &Helpers::new(), &Partials::new(), None)?;
        Ok(out.into_string())
    }

    /// Render straight into `writer`.
    pub fn render_to_write<W: Write>(
        &self,
        context: Value,
        helpers: &Helpers,
        partials: &Partials,
        writer: &mut W,
    ) -> Result<(), RenderError> {
        let mut out = WriteOutput::new(writer);
        self.render_output(context, helpers, partials, None, &mut out)
    }

    fn render_output(
        &self,
        context: Value,
        helpers: &Helpers,
        partials: &Partials,
        root: Option<&Value>,
        out: &mut dyn Output,
    ) -> Result<(), RenderError> {
        let scope = match context {
            Value::Scope(s) => s,
            v => {
                let root = Arc::new(root.cloned().unwrap_or_else(|| v.clone()));
                Arc::new(Scope::new(v, Value::Null, root))
            }
        };
        let rc = RenderContext::new(helpers, partials, self.settings.clone());
        debug!("rendering template {:?}", self.name);
        render_scope(self, &scope, &rc, out).map_err(|e| e.in_template(self.name.clone()))
    }
}
