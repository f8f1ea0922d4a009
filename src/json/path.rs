use std::fmt;

use pest::iterators::Pair;
use pest::Parser;

use crate::error::{TemplateError, TemplateErrorReason};
use crate::grammar::{HandlebarsParser, Rule};

/// One step of a data path.
#[derive(PartialEq, Eq, Clone, Debug)]
pub enum PathSeg {
    /// a plain or bracketed name, or a numeric index
    Named(String),
    /// `.` or `this`
    Current,
    /// `../`, moves to the enclosing scope
    Parent,
    /// `@../`, moves to the enclosing scope and reads the next segment as
    /// one of its `@` variables
    ParentData,
}

#[derive(PartialEq, Eq, Clone, Debug)]
pub struct Path {
    segs: Vec<PathSeg>,
    raw: String,
}

impl Path {
    pub(crate) fn new(raw: &str, segs: Vec<PathSeg>) -> Path {
        Path {
            segs,
            raw: raw.to_owned(),
        }
    }

    /// Parse a standalone path expression like `../people/[0].name`.
    pub fn parse(raw: &str) -> Result<Path, TemplateError> {
        let pair = HandlebarsParser::parse(Rule::path, raw)
            .ok()
            .and_then(|mut p| p.next())
            .filter(|p| p.as_span().end() == raw.len())
            .ok_or_else(|| {
                TemplateError::of(TemplateErrorReason::InvalidSyntax(format!(
                    "invalid path {:?}",
                    raw
                )))
            })?;
        Ok(Path::from_pair(pair))
    }

    pub(crate) fn from_pair(pair: Pair<Rule>) -> Path {
        let raw = pair.as_str();
        let segs = pair
            .into_inner()
            .filter_map(|seg| match seg.as_rule() {
                Rule::path_raw_id => Some(PathSeg::Named(seg.as_str().to_owned())),
                Rule::path_id if seg.as_str() == "this" => Some(PathSeg::Current),
                Rule::path_id => Some(PathSeg::Named(seg.as_str().to_owned())),
                Rule::path_parent => Some(PathSeg::Parent),
                Rule::path_parent_data => Some(PathSeg::ParentData),
                Rule::path_current => Some(PathSeg::Current),
                _ => None,
            })
            .collect();
        Path::new(raw, segs)
    }

    pub fn segs(&self) -> &[PathSeg] {
        &self.segs
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// A single plain name. Only simple paths are looked up as helpers.
    pub fn simple_name(&self) -> Option<&str> {
        match self.segs.as_slice() {
            [PathSeg::Named(name)] => Some(name),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_named_paths(name_segs: &[&str]) -> Path {
        let segs = name_segs
            .iter()
            .map(|n| PathSeg::Named((*n).to_string()))
            .collect();
        Path::new(&name_segs.join("/"), segs)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
