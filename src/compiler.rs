use std::fmt;
use std::path::Path as FsPath;
use std::sync::Arc;

use crate::error::{TemplateError, TemplateErrorReason};
use crate::json::path::Path;
use crate::sources::{FileSource, Source};
use crate::support::str::escape_html;
use crate::template::{
    HelperTemplate, Parameter, PartialTemplate, Template, TemplateElement, TemplateMapping,
};
use crate::value::Value;
use crate::whitespace;

/// Escape function applied to `{{expression}}` output.
pub type EscapeFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Settings a template is compiled with. Partials given as source text are
/// compiled with the settings of the template that calls them.
#[derive(Clone)]
pub(crate) struct Settings {
    pub(crate) escape_fn: EscapeFn,
    pub(crate) strip_standalone: bool,
}

impl Default for Settings {
    fn default() -> Settings {
        Settings {
            escape_fn: Arc::new(escape_html),
            strip_standalone: true,
        }
    }
}

#[derive(Debug)]
pub(crate) enum Constant {
    Text(String),
    Literal(Value),
    Program(Arc<CompiledTemplate>),
}

/// How an argument gets its value at render time.
#[derive(Debug)]
pub(crate) enum Argument {
    Constant(usize),
    Path(Path),
    Subexpr(Box<Call>),
}

/// A head with its arguments. `helper` is set when the head is a simple name
/// and may therefore refer to a helper.
#[derive(Debug)]
pub(crate) struct Call {
    pub(crate) head: Argument,
    pub(crate) raw: String,
    pub(crate) helper: Option<String>,
    pub(crate) params: Vec<Argument>,
    pub(crate) hash: Vec<(String, Argument)>,
}

#[derive(Debug)]
pub(crate) enum Instruction {
    Append(usize),
    Expand {
        call: Call,
        escape: bool,
    },
    Block {
        call: Call,
        program: usize,
        inverse: Option<usize>,
    },
    InvertedBlock {
        call: Call,
        program: usize,
    },
    Partial {
        name: String,
        context: Option<Argument>,
        overrides: Vec<(String, Argument)>,
    },
}

/// An executable template: a constant pool and the instructions that use
/// it. Block bodies are nested compiled templates in the pool.
pub struct CompiledTemplate {
    pub(crate) name: Option<String>,
    pub(crate) constants: Vec<Constant>,
    pub(crate) instructions: Vec<Instruction>,
    pub(crate) settings: Settings,
}

impl CompiledTemplate {
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub(crate) fn constant(&self, idx: usize) -> Option<&Constant> {
        self.constants.get(idx)
    }

    pub(crate) fn program(&self, idx: usize) -> Option<&CompiledTemplate> {
        match self.constants.get(idx) {
            Some(Constant::Program(p)) => Some(p),
            _ => None,
        }
    }
}

impl fmt::Debug for CompiledTemplate {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("CompiledTemplate")
            .field("name", &self.name)
            .field("constants", &self.constants)
            .field("instructions", &self.instructions)
            .finish()
    }
}

#[derive(Default)]
struct Frame {
    constants: Vec<Constant>,
    instructions: Vec<Instruction>,
}

/// Turns template source into a `CompiledTemplate`.
///
/// A compiler keeps a stack of half-built frames while it works, one per
/// nested block body, so it compiles one template at a time. Use one
/// compiler per thread.
pub struct Compiler {
    frames: Vec<Frame>,
    name: Option<String>,
    settings: Settings,
}

impl Default for Compiler {
    fn default() -> Compiler {
        Compiler::new()
    }
}

impl Compiler {
    pub fn new() -> Compiler {
        Compiler {
            frames: Vec::new(),
            name: None,
            settings: Settings::default(),
        }
    }

    pub(crate) fn with_settings(settings: Settings) -> Compiler {
        Compiler {
            frames: Vec::new(),
            name: None,
            settings,
        }
    }

    /// Name used for compiled templates and error messages.
    pub fn with_name<S: Into<String>>(mut self, name: S) -> Compiler {
        self.name = Some(name.into());
        self
    }

    /// Replace HTML escaping of `{{expression}}` output.
    pub fn with_escape_fn<F>(mut self, escape_fn: F) -> Compiler
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.settings.escape_fn = Arc::new(escape_fn);
        self
    }

    /// Toggle removal of lines holding only a block tag. On by default.
    pub fn strip_standalone(mut self, enable: bool) -> Compiler {
        self.settings.strip_standalone = enable;
        self
    }

    pub fn compile(&mut self, source: &str) -> Result<CompiledTemplate, TemplateError> {
        let name = self.name.clone();
        self.compile_named(name, source)
    }

    pub fn compile_with_name(
        &mut self,
        name: &str,
        source: &str,
    ) -> Result<CompiledTemplate, TemplateError> {
        self.compile_named(Some(name.to_owned()), source)
    }

    /// Compile raw bytes. Input that is not UTF-8 text is rejected before
    /// parsing.
    pub fn compile_bytes(&mut self, source: &[u8]) -> Result<CompiledTemplate, TemplateError> {
        let text = std::str::from_utf8(source)
            .map_err(|_| self.named(TemplateError::of(TemplateErrorReason::InvalidSource)))?;
        self.compile(text)
    }

    /// Read and compile a template file. The file path becomes the template
    /// name unless one was set.
    pub fn compile_file<P: AsRef<FsPath>>(
        &mut self,
        path: P,
    ) -> Result<CompiledTemplate, TemplateError> {
        let path = path.as_ref();
        let name = self
            .name
            .clone()
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        let text = FileSource::new(path.to_path_buf(), name.clone()).load()?;
        self.compile_named(Some(name), &text)
    }

    fn named(&self, e: TemplateError) -> TemplateError {
        match self.name {
            Some(ref n) if e.template_name.is_none() => e.in_template(n.clone()),
            _ => e,
        }
    }

    fn compile_named(
        &mut self,
        name: Option<String>,
        source: &str,
    ) -> Result<CompiledTemplate, TemplateError> {
        let in_template = |e: TemplateError| match name {
            Some(ref n) => e.in_template(n.clone()),
            None => e,
        };
        let tree = Template::parse(source).map_err(in_template)?;
        let elements = if self.settings.strip_standalone {
            whitespace::normalize(tree.elements)
        } else {
            tree.elements
        };

        self.frames.clear();
        let mut compiled = self.compile_program(&elements, source).map_err(in_template)?;
        compiled.name = name;
        debug!(
            "compiled template {:?}: {} instructions",
            compiled.name,
            compiled.instructions.len()
        );
        Ok(compiled)
    }

    fn current(&mut self) -> &mut Frame {
        if self.frames.is_empty() {
            self.frames.push(Frame::default());
        }
        let last = self.frames.len() - 1;
        &mut self.frames[last]
    }

    fn compile_program(
        &mut self,
        elements: &[TemplateElement],
        source: &str,
    ) -> Result<CompiledTemplate, TemplateError> {
        self.frames.push(Frame::default());
        let result = self.compile_elements(elements, source);
        let frame = self.frames.pop().unwrap_or_default();
        result?;
        Ok(CompiledTemplate {
            name: None,
            constants: frame.constants,
            instructions: frame.instructions,
            settings: self.settings.clone(),
        })
    }

    fn compile_elements(
        &mut self,
        elements: &[TemplateElement],
        source: &str,
    ) -> Result<(), TemplateError> {
        for el in elements {
            match el {
                TemplateElement::Literal(s)
                | TemplateElement::Whitespace(s)
                | TemplateElement::Newline(s) => self.append_text(s),
                TemplateElement::Comment(_) => {}
                TemplateElement::Expression(h, m) => {
                    let call = self.compile_call(h, source, *m)?;
                    self.emit(Instruction::Expand { call, escape: true });
                }
                TemplateElement::HtmlExpression(h, m) => {
                    let call = self.compile_call(h, source, *m)?;
                    self.emit(Instruction::Expand {
                        call,
                        escape: false,
                    });
                }
                TemplateElement::HelperBlock(h, m) => {
                    let call = self.compile_call(h, source, *m)?;
                    let program = self.compile_body(h.template.as_ref(), source)?;
                    let inverse = match h.inverse {
                        Some(ref inv) => Some(self.compile_body(Some(inv), source)?),
                        None => None,
                    };
                    self.emit(Instruction::Block {
                        call,
                        program,
                        inverse,
                    });
                }
                TemplateElement::InvertedBlock(h, m) => {
                    let call = self.compile_call(h, source, *m)?;
                    let program = self.compile_body(h.template.as_ref(), source)?;
                    self.emit(Instruction::InvertedBlock { call, program });
                }
                TemplateElement::Partial(p, m) => {
                    let ins = self.compile_partial(p, source, *m)?;
                    self.emit(ins);
                }
            }
        }
        Ok(())
    }

    fn emit(&mut self, ins: Instruction) {
        self.current().instructions.push(ins);
    }

    fn add_constant(&mut self, c: Constant) -> usize {
        let frame = self.current();
        frame.constants.push(c);
        frame.constants.len() - 1
    }

    /// Append literal text, merging it into the previous append when that
    /// one is literal text too.
    fn append_text(&mut self, s: &str) {
        let frame = self.current();
        if let Some(Instruction::Append(idx)) = frame.instructions.last() {
            if let Some(Constant::Text(ref mut text)) = frame.constants.get_mut(*idx) {
                text.push_str(s);
                return;
            }
        }
        let idx = self.add_constant(Constant::Text(s.to_owned()));
        self.emit(Instruction::Append(idx));
    }

    fn compile_body(
        &mut self,
        body: Option<&Template>,
        source: &str,
    ) -> Result<usize, TemplateError> {
        let elements = body.map(|t| t.elements.as_slice()).unwrap_or(&[]);
        let program = self.compile_program(elements, source)?;
        Ok(self.add_constant(Constant::Program(Arc::new(program))))
    }

    fn compile_call(
        &mut self,
        h: &HelperTemplate,
        source: &str,
        mapping: TemplateMapping,
    ) -> Result<Call, TemplateError> {
        let head = self.compile_arg(&h.name, source, mapping)?;
        let helper = h
            .name
            .as_path()
            .and_then(|p| p.simple_name())
            .map(|s| s.to_owned());
        let params = h
            .params
            .iter()
            .map(|p| self.compile_arg(p, source, mapping))
            .collect::<Result<Vec<_>, _>>()?;
        let hash = h
            .hash
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.compile_arg(v, source, mapping)?)))
            .collect::<Result<Vec<_>, TemplateError>>()?;
        Ok(Call {
            head,
            raw: h.raw_name.clone(),
            helper,
            params,
            hash,
        })
    }

    fn compile_arg(
        &mut self,
        param: &Parameter,
        source: &str,
        mapping: TemplateMapping,
    ) -> Result<Argument, TemplateError> {
        match param {
            Parameter::Literal(j) => Ok(Argument::Constant(
                self.add_constant(Constant::Literal(Value::from(j))),
            )),
            Parameter::Path(p) => Ok(Argument::Path(p.clone())),
            Parameter::Subexpression(sub) => {
                let call = self.compile_call(sub, source, mapping)?;
                if call.helper.is_none() {
                    let TemplateMapping(line, col) = mapping;
                    return Err(TemplateError::of(TemplateErrorReason::InvalidSubexpression(
                        sub.raw_name.clone(),
                    ))
                    .at(source, line, col));
                }
                Ok(Argument::Subexpr(Box::new(call)))
            }
        }
    }

    fn compile_partial(
        &mut self,
        p: &PartialTemplate,
        source: &str,
        mapping: TemplateMapping,
    ) -> Result<Instruction, TemplateError> {
        if p.params.len() > 1 {
            let TemplateMapping(line, col) = mapping;
            return Err(TemplateError::of(TemplateErrorReason::PartialArity(
                p.name.clone(),
                p.params.len(),
            ))
            .at(source, line, col));
        }
        let context = match p.params.first() {
            Some(param) => Some(self.compile_arg(param, source, mapping)?),
            None => None,
        };
        let overrides = p
            .hash
            .iter()
            .map(|(k, v)| Ok((k.clone(), self.compile_arg(v, source, mapping)?)))
            .collect::<Result<Vec<_>, TemplateError>>()?;
        Ok(Instruction::Partial {
            name: p.name.clone(),
            context,
            overrides,
        })
    }
}
