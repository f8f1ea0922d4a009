use std::error::Error;
use std::fmt;
use std::io::Error as IOError;

use serde_json::error::Error as SerdeError;

quick_error! {
    /// Template parsing and compilation error
    #[derive(PartialEq, Debug, Clone)]
    pub enum TemplateErrorReason {
        MismatchingClosedHelper(open: String, closed: String) {
            display("helper {:?} was opened, but {:?} is closing", open, closed)
        }
        InvalidSyntax(message: String) {
            display("invalid handlebars syntax: {}", message)
        }
        PartialArity(name: String, count: usize) {
            display("partial {:?} takes at most one positional argument, {} given", name, count)
        }
        InvalidSubexpression(raw: String) {
            display("subexpression {:?} must name a helper", raw)
        }
        InvalidSource {
            display("template source is not valid UTF-8")
        }
        Io(message: String) {
            display("cannot read template: {}", message)
        }
    }
}

/// Error on parsing or compiling a template.
#[derive(Debug, PartialEq, Clone)]
pub struct TemplateError {
    pub reason: TemplateErrorReason,
    pub template_name: Option<String>,
    pub line_no: Option<usize>,
    pub column_no: Option<usize>,
    segment: Option<String>,
}

impl TemplateError {
    pub fn of(e: TemplateErrorReason) -> TemplateError {
        TemplateError {
            reason: e,
            template_name: None,
            line_no: None,
            column_no: None,
            segment: None,
        }
    }

    /// Attach a 1-based position and the surrounding source lines.
    pub fn at(mut self, template_str: &str, line_no: usize, column_no: usize) -> TemplateError {
        self.line_no = Some(line_no);
        self.column_no = Some(column_no);
        self.segment = Some(template_segment(template_str, line_no, column_no));
        self
    }

    pub fn in_template(mut self, name: String) -> TemplateError {
        self.template_name = Some(name);
        self
    }

    pub fn reason(&self) -> &TemplateErrorReason {
        &self.reason
    }
}

impl Error for TemplateError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.reason)
    }
}

/// Convert a byte offset into a 1-based (line, column) pair. Columns count
/// characters, not bytes.
pub(crate) fn line_col(template_str: &str, offset: usize) -> (usize, usize) {
    let offset = offset.min(template_str.len());
    let before = template_str.get(..offset).unwrap_or(template_str);
    let line = before.matches('\n').count() + 1;
    let col = match before.rfind('\n') {
        Some(nl) => before[nl + 1..].chars().count() + 1,
        None => before.chars().count() + 1,
    };
    (line, col)
}

fn template_segment(template_str: &str, line: usize, col: usize) -> String {
    let line_start = if line >= 3 { line - 3 } else { 0 };
    let line_end = line + 1;
    let line = line.saturating_sub(1);
    let col = col.saturating_sub(1);

    let mut buf = String::new();
    for (line_count, line_content) in template_str.lines().enumerate() {
        if line_count >= line_start && line_count <= line_end {
            buf.push_str(&format!("{}\n", line_content));
            if line_count == line {
                for c in 0..line_content.chars().count().max(col + 1) {
                    if c != col {
                        buf.push('-');
                    } else {
                        buf.push('^');
                    }
                }
                buf.push('\n');
            }
        }
    }

    buf
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match (self.line_no, self.column_no, &self.segment) {
            (Some(line), Some(col), Some(seg)) => write!(
                f,
                "Template \"{}\" line {}, col {}: {}\n\n{}",
                self.template_name
                    .as_deref()
                    .unwrap_or("Unnamed template"),
                line,
                col,
                self.reason,
                seg
            ),
            _ => write!(f, "{}", self.reason),
        }
    }
}

quick_error! {
    /// Reason of a failed render
    #[derive(Debug)]
    pub enum RenderErrorReason {
        PartialNotFound(name: String) {
            display("Partial \"{}\" not defined", name)
        }
        MissingProperty(name: String) {
            display("Could not find property {}", name)
        }
        PartialCompile(name: String, err: TemplateError) {
            display("Partial \"{}\" failed to compile: {}", name, err)
            source(err)
        }
        ParamNotFound(helper: String, index: usize) {
            display("Param {} not found for helper \"{}\"", index, helper)
        }
        InvalidParamType(helper: String, expected: &'static str) {
            display("Helper \"{}\" expects {}", helper, expected)
        }
        Io(err: IOError) {
            display("{}", err)
            from()
            source(err)
        }
        Serialize(err: SerdeError) {
            display("cannot convert data: {}", err)
            from()
            source(err)
        }
        Other(desc: String) {
            display("{}", desc)
        }
    }
}

/// Error when rendering data on template.
#[derive(Debug)]
pub struct RenderError {
    pub reason: RenderErrorReason,
    pub template_name: Option<String>,
}

impl RenderError {
    pub fn new<T: AsRef<str>>(desc: T) -> RenderError {
        RenderErrorReason::Other(desc.as_ref().to_owned()).into()
    }

    pub fn in_template(mut self, name: Option<String>) -> RenderError {
        if self.template_name.is_none() {
            self.template_name = name;
        }
        self
    }

    pub fn reason(&self) -> &RenderErrorReason {
        &self.reason
    }
}

impl fmt::Display for RenderError {
    fn fmt(&self, f: &mut fmt::Formatter) -> Result<(), fmt::Error> {
        match self.template_name {
            Some(ref name) => write!(f, "Error rendering \"{}\": {}", name, self.reason),
            None => write!(f, "{}", self.reason),
        }
    }
}

impl Error for RenderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.reason)
    }
}

impl From<RenderErrorReason> for RenderError {
    fn from(reason: RenderErrorReason) -> RenderError {
        RenderError {
            reason,
            template_name: None,
        }
    }
}

impl From<IOError> for RenderError {
    fn from(e: IOError) -> RenderError {
        RenderErrorReason::from(e).into()
    }
}

impl From<SerdeError> for RenderError {
    fn from(e: SerdeError) -> RenderError {
        RenderErrorReason::from(e).into()
    }
}

quick_error! {
    #[derive(Debug)]
    pub enum TemplateRenderError {
        TemplateError(err: TemplateError) {
            from()
            source(err)
            display("{}", err)
        }
        RenderError(err: RenderError) {
            from()
            source(err)
            display("{}", err)
        }
    }
}
