use std::collections::BTreeMap;

use pest::error::{ErrorVariant, InputLocation};
use pest::iterators::{Pair, Pairs};
use pest::Parser;
use serde_json::value::Value as Json;

use crate::error::{line_col, TemplateError, TemplateErrorReason};
use crate::grammar::{HandlebarsParser, Rule};
use crate::json::path::Path;

/// Parsed token tree of a template source. The tree keeps every whitespace
/// run and line break as its own element, so later passes can tell which
/// lines hold nothing but a block tag.
#[derive(PartialEq, Clone, Debug, Default)]
pub struct Template {
    pub elements: Vec<TemplateElement>,
}

/// 1-based line and column of an element in its source.
#[derive(PartialEq, Eq, Clone, Copy, Debug, Default)]
pub struct TemplateMapping(pub usize, pub usize);

#[derive(PartialEq, Clone, Debug)]
pub enum Parameter {
    Path(Path),
    Literal(Json),
    Subexpression(Box<HelperTemplate>),
}

impl Parameter {
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Parameter::Path(p) => Some(p),
            _ => None,
        }
    }
}

/// An expression, block or subexpression: a head followed by arguments.
#[derive(PartialEq, Clone, Debug)]
pub struct HelperTemplate {
    pub name: Parameter,
    pub raw_name: String,
    pub params: Vec<Parameter>,
    pub hash: BTreeMap<String, Parameter>,
    pub template: Option<Template>,
    pub inverse: Option<Template>,
}

impl HelperTemplate {
    fn new(name: Parameter, raw_name: &str) -> HelperTemplate {
        HelperTemplate {
            name,
            raw_name: raw_name.to_owned(),
            params: Vec::new(),
            hash: BTreeMap::new(),
            template: None,
            inverse: None,
        }
    }
}

#[derive(PartialEq, Clone, Debug)]
pub struct PartialTemplate {
    pub name: String,
    pub params: Vec<Parameter>,
    pub hash: BTreeMap<String, Parameter>,
}

#[derive(PartialEq, Clone, Debug)]
pub enum TemplateElement {
    Literal(String),
    Whitespace(String),
    Newline(String),
    Comment(String),
    Expression(Box<HelperTemplate>, TemplateMapping),
    HtmlExpression(Box<HelperTemplate>, TemplateMapping),
    HelperBlock(Box<HelperTemplate>, TemplateMapping),
    InvertedBlock(Box<HelperTemplate>, TemplateMapping),
    Partial(Box<PartialTemplate>, TemplateMapping),
}

impl TemplateElement {
    pub fn is_newline(&self) -> bool {
        matches!(self, TemplateElement::Newline(_))
    }

    pub fn is_whitespace(&self) -> bool {
        matches!(self, TemplateElement::Whitespace(_))
    }
}

fn mapping_of(pair: &Pair<Rule>) -> TemplateMapping {
    let (line, col) = pair.as_span().start_pos().line_col();
    TemplateMapping(line, col)
}

fn syntax_error(source: &str, e: pest::error::Error<Rule>) -> TemplateError {
    let offset = match e.location {
        InputLocation::Pos(p) => p,
        InputLocation::Span((start, _)) => start,
    };
    let message = match e.variant {
        ErrorVariant::ParsingError { ref positives, .. } if !positives.is_empty() => {
            let expected: Vec<String> = positives.iter().map(|r| format!("{:?}", r)).collect();
            format!("expected {}", expected.join(" or "))
        }
        ErrorVariant::ParsingError { .. } => "unexpected input".to_owned(),
        ErrorVariant::CustomError { ref message } => message.clone(),
    };
    let (line, col) = line_col(source, offset);
    TemplateError::of(TemplateErrorReason::InvalidSyntax(message)).at(source, line, col)
}

/// Undo the only escape a string literal knows: a backslash before the
/// enclosing quote. Every other backslash is kept as-is.
fn unescape_string(content: &str, quote: char) -> String {
    let mut buf = String::with_capacity(content.len());
    let mut chars = content.chars().peekable();
    while let Some(c) = chars.next() {
        if c == '\\' && chars.peek() == Some(&quote) {
            continue;
        }
        buf.push(c);
    }
    buf
}

impl Template {
    /// Tokenize `source` into a tree. Nothing is normalized or compiled yet.
    pub fn parse(source: &str) -> Result<Template, TemplateError> {
        let mut pairs =
            HandlebarsParser::parse(Rule::template, source).map_err(|e| syntax_error(source, e))?;
        let elements = match pairs.next() {
            Some(root) => parse_elements(source, root.into_inner())?,
            None => Vec::new(),
        };
        debug!("parsed {} top level elements", elements.len());
        Ok(Template { elements })
    }
}

fn parse_elements(source: &str, pairs: Pairs<Rule>) -> Result<Vec<TemplateElement>, TemplateError> {
    let mut elements = Vec::new();
    for pair in pairs {
        let mapping = mapping_of(&pair);
        let el = match pair.as_rule() {
            Rule::literal => TemplateElement::Literal(pair.as_str().to_owned()),
            Rule::whitespace => TemplateElement::Whitespace(pair.as_str().to_owned()),
            Rule::newline => TemplateElement::Newline(pair.as_str().to_owned()),
            Rule::comment => {
                let text = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
                TemplateElement::Comment(text.to_owned())
            }
            Rule::expression => {
                TemplateElement::Expression(Box::new(parse_exp_line(&pair)?), mapping)
            }
            Rule::html_expression => {
                TemplateElement::HtmlExpression(Box::new(parse_exp_line(&pair)?), mapping)
            }
            Rule::helper_block => {
                TemplateElement::HelperBlock(Box::new(parse_block(source, pair)?), mapping)
            }
            Rule::inverted_block => {
                TemplateElement::InvertedBlock(Box::new(parse_block(source, pair)?), mapping)
            }
            Rule::partial => TemplateElement::Partial(Box::new(parse_partial(pair)?), mapping),
            _ => continue,
        };
        elements.push(el);
    }
    Ok(elements)
}

/// Find the `exp_line` child of a tag and build its head and arguments.
fn parse_exp_line(pair: &Pair<Rule>) -> Result<HelperTemplate, TemplateError> {
    match pair.clone().into_inner().find(|p| p.as_rule() == Rule::exp_line) {
        Some(line) => parse_call(line.into_inner()),
        None => Err(TemplateError::of(TemplateErrorReason::InvalidSyntax(
            "missing expression".to_owned(),
        ))),
    }
}

/// First pair is the head, the rest are arguments.
fn parse_call(mut pairs: Pairs<Rule>) -> Result<HelperTemplate, TemplateError> {
    let head = pairs.next().ok_or_else(|| {
        TemplateError::of(TemplateErrorReason::InvalidSyntax(
            "missing helper name".to_owned(),
        ))
    })?;
    let raw_name = head.as_str().to_owned();
    let mut helper = HelperTemplate::new(parse_param(head)?, &raw_name);
    for pair in pairs {
        if pair.as_rule() == Rule::hash {
            let mut kv = pair.into_inner();
            if let (Some(key), Some(value)) = (kv.next(), kv.next()) {
                helper.hash.insert(key.as_str().to_owned(), parse_param(value)?);
            }
        } else {
            helper.params.push(parse_param(pair)?);
        }
    }
    Ok(helper)
}

fn parse_param(pair: Pair<Rule>) -> Result<Parameter, TemplateError> {
    let param = match pair.as_rule() {
        Rule::path => Parameter::Path(Path::from_pair(pair)),
        Rule::string_literal => {
            let quote = pair.as_str().chars().next().unwrap_or('"');
            let content = pair.into_inner().next().map(|p| p.as_str()).unwrap_or("");
            Parameter::Literal(Json::String(unescape_string(content, quote)))
        }
        Rule::number_literal => {
            let n = serde_json::from_str::<Json>(pair.as_str()).map_err(|e| {
                TemplateError::of(TemplateErrorReason::InvalidSyntax(e.to_string()))
            })?;
            Parameter::Literal(n)
        }
        Rule::boolean_literal => Parameter::Literal(Json::Bool(pair.as_str() == "true")),
        Rule::null_literal => Parameter::Literal(Json::Null),
        Rule::subexpression => Parameter::Subexpression(Box::new(parse_call(pair.into_inner())?)),
        _ => {
            return Err(TemplateError::of(TemplateErrorReason::InvalidSyntax(
                format!("unexpected {:?}", pair.as_str()),
            )))
        }
    };
    Ok(param)
}

fn parse_block(source: &str, pair: Pair<Rule>) -> Result<HelperTemplate, TemplateError> {
    let mut helper = parse_exp_line(&pair)?;
    let mut bodies = Vec::with_capacity(2);
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::block_body => bodies.push(Template {
                elements: parse_elements(source, p.into_inner())?,
            }),
            Rule::block_end => {
                let closed = p
                    .clone()
                    .into_inner()
                    .next()
                    .map(|c| c.as_str())
                    .unwrap_or("");
                if closed != helper.raw_name {
                    let TemplateMapping(line, col) = mapping_of(&p);
                    return Err(TemplateError::of(
                        TemplateErrorReason::MismatchingClosedHelper(
                            helper.raw_name.clone(),
                            closed.to_owned(),
                        ),
                    )
                    .at(source, line, col));
                }
            }
            _ => {}
        }
    }
    let mut bodies = bodies.into_iter();
    helper.template = Some(bodies.next().unwrap_or_default());
    helper.inverse = bodies.next();
    Ok(helper)
}

fn parse_partial(pair: Pair<Rule>) -> Result<PartialTemplate, TemplateError> {
    let mut partial = PartialTemplate {
        name: String::new(),
        params: Vec::new(),
        hash: BTreeMap::new(),
    };
    for p in pair.into_inner() {
        match p.as_rule() {
            Rule::partial_id | Rule::partial_id_bracketed | Rule::partial_id_quoted => {
                partial.name = p.as_str().to_owned();
            }
            Rule::hash => {
                let mut kv = p.into_inner();
                if let (Some(key), Some(value)) = (kv.next(), kv.next()) {
                    partial.hash.insert(key.as_str().to_owned(), parse_param(value)?);
                }
            }
            _ => partial.params.push(parse_param(p)?),
        }
    }
    Ok(partial)
}
