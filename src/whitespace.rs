//! Removal of "standalone" block tag lines.
//!
//! A block open, `{{else}}` or close tag that is the only thing on its line
//! (apart from indentation) should not leave an empty line in the output.
//! The pass looks at the whitespace and newline tokens right around each tag
//! and drops the indentation before it and the line break after it.

use std::collections::VecDeque;

use crate::template::{Template, TemplateElement};

/// Normalize a whole template. The start and the end of the source count as
/// line boundaries.
pub fn normalize(elements: Vec<TemplateElement>) -> Vec<TemplateElement> {
    normalize_seq(elements, true, true)
}

/// Number of trailing tokens to drop when `seq` ends at the start of a line,
/// i.e. with a newline optionally followed by indentation.
fn trailing_line_start(seq: &[TemplateElement], starts_line: bool) -> Option<usize> {
    match seq {
        [] if starts_line => Some(0),
        [.., last] if last.is_newline() => Some(0),
        [ws] if ws.is_whitespace() && starts_line => Some(1),
        [.., nl, ws] if ws.is_whitespace() && nl.is_newline() => Some(1),
        _ => None,
    }
}

/// Number of leading tokens to drop when `seq` starts with the rest of an
/// empty line: optional indentation and then a newline.
fn leading_line_end<'a, I>(mut seq: I, ends_line: bool) -> Option<usize>
where
    I: Iterator<Item = &'a TemplateElement>,
{
    match (seq.next(), seq.next()) {
        (None, _) if ends_line => Some(0),
        (Some(nl), _) if nl.is_newline() => Some(1),
        (Some(ws), Some(nl)) if ws.is_whitespace() && nl.is_newline() => Some(2),
        (Some(ws), None) if ws.is_whitespace() && ends_line => Some(1),
        _ => None,
    }
}

fn take_body(t: &mut Option<Template>) -> Vec<TemplateElement> {
    t.take().map(|t| t.elements).unwrap_or_default()
}

fn normalize_seq(
    elements: Vec<TemplateElement>,
    starts_line: bool,
    ends_line: bool,
) -> Vec<TemplateElement> {
    let mut rest: VecDeque<TemplateElement> = elements.into();
    let mut out: Vec<TemplateElement> = Vec::with_capacity(rest.len());
    // `out[line_base..]` is the current output line
    let mut line_base = 0;
    let mut base_starts_line = starts_line;

    while let Some(el) = rest.pop_front() {
        let (mut helper, mapping, inverted) = match el {
            TemplateElement::HelperBlock(h, m) => (h, m, false),
            TemplateElement::InvertedBlock(h, m) => (h, m, true),
            other => {
                out.push(other);
                continue;
            }
        };
        let mut body = take_body(&mut helper.template);
        let mut inverse = helper.inverse.take().map(|t| t.elements);

        // open tag
        let open_standalone = match (
            trailing_line_start(&out[line_base..], base_starts_line),
            leading_line_end(body.iter(), false),
        ) {
            (Some(pre), Some(post)) => {
                out.truncate(out.len() - pre);
                body.drain(..post);
                true
            }
            _ => false,
        };

        // else tag
        let mut else_standalone = false;
        if let Some(ref mut inv) = inverse {
            if let (Some(pre), Some(post)) = (
                trailing_line_start(&body, open_standalone),
                leading_line_end(inv.iter(), false),
            ) {
                body.truncate(body.len() - pre);
                inv.drain(..post);
                else_standalone = true;
            }
        }

        // close tag
        let (last, last_starts_line) = match inverse {
            Some(ref mut inv) => (inv, else_standalone),
            None => (&mut body, open_standalone),
        };
        let close_standalone = match (
            trailing_line_start(last, last_starts_line),
            leading_line_end(rest.iter(), ends_line),
        ) {
            (Some(pre), Some(post)) => {
                last.truncate(last.len() - pre);
                rest.drain(..post);
                true
            }
            _ => false,
        };

        let body_ends_line = if inverse.is_some() {
            else_standalone
        } else {
            close_standalone
        };
        helper.template = Some(Template {
            elements: normalize_seq(body, open_standalone, body_ends_line),
        });
        helper.inverse = inverse.map(|inv| Template {
            elements: normalize_seq(inv, else_standalone, close_standalone),
        });

        out.push(if inverted {
            TemplateElement::InvertedBlock(helper, mapping)
        } else {
            TemplateElement::HelperBlock(helper, mapping)
        });
        if close_standalone {
            line_base = out.len();
            base_starts_line = true;
        }
    }

    out
}

#[cfg(test)]
mod test {
    use super::normalize;
    use crate::template::{Template, TemplateElement};

    fn flatten(elements: &[TemplateElement]) -> String {
        let mut buf = String::new();
        for e in elements {
            match e {
                TemplateElement::Literal(s)
                | TemplateElement::Whitespace(s)
                | TemplateElement::Newline(s) => buf.push_str(s),
                TemplateElement::HelperBlock(h, _) | TemplateElement::InvertedBlock(h, _) => {
                    buf.push('<');
                    buf.push_str(&flatten(&h.template.as_ref().unwrap().elements));
                    if let Some(ref inv) = h.inverse {
                        buf.push('|');
                        buf.push_str(&flatten(&inv.elements));
                    }
                    buf.push('>');
                }
                TemplateElement::Expression(h, _) => {
                    buf.push('$');
                    buf.push_str(&h.raw_name);
                }
                _ => {}
            }
        }
        buf
    }

    fn clean(source: &str) -> String {
        let t = Template::parse(source).unwrap();
        flatten(&normalize(t.elements))
    }

    #[test]
    fn test_standalone_block_lines() {
        assert_eq!(clean("{{#a}}\nx\n{{/a}}\n"), "<x\n>");
        assert_eq!(clean("top\n  {{#a}}\n  x\n  {{/a}}\nbottom"), "top\n<  x\n>bottom");
        assert_eq!(clean("{{#a}}  \nx\n  {{/a}}  "), "<x\n>");
    }

    #[test]
    fn test_inline_blocks_untouched() {
        assert_eq!(clean("a {{#b}}c{{/b}} d\n"), "a <c> d\n");
        assert_eq!(clean("{{#a}}x\n{{/a}}\n"), "<x\n>");
        assert_eq!(clean("a{{#b}}\nx\n{{/b}}"), "a<\nx\n>");
        assert_eq!(clean("{{#a}}\nx{{/a}}\n"), "<x>\n");
    }

    #[test]
    fn test_else_line() {
        assert_eq!(
            clean("{{#if a}}\n  yes\n  {{else}}\n  no\n{{/if}}\n"),
            "<  yes\n|  no\n>"
        );
        assert_eq!(clean("{{#if a}}\nyes\n{{^}}\nno\n{{/if}}"), "<yes\n|no\n>");
        assert_eq!(clean("{{#if a}}yes {{else}} no{{/if}}"), "<yes | no>");
    }

    #[test]
    fn test_consecutive_blocks() {
        assert_eq!(
            clean("{{#a}}\nx\n{{/a}}\n  {{#b}}\ny\n{{/b}}\n"),
            "<x\n><y\n>"
        );
    }

    #[test]
    fn test_inverted_block_lines() {
        assert_eq!(clean("{{^a}}\n  none\n{{/a}}\n"), "<  none\n>");
    }

    #[test]
    fn test_nested_blocks() {
        assert_eq!(clean("{{#a}}\n{{#b}}\nx\n{{/b}}\n{{/a}}\n"), "<<x\n>>");
        assert_eq!(
            clean("<ul>\n  {{#each xs}}\n  <li>{{this}}</li>\n  {{/each}}\n</ul>\n"),
            "<ul>\n<  <li>$this</li>\n></ul>\n"
        );
    }

    #[test]
    fn test_other_whitespace_kept() {
        assert_eq!(clean("  a  \n\n  b"), "  a  \n\n  b");
        assert_eq!(clean("{{x}}\n  {{y}}\n"), "$x\n  $y\n");
    }
}
