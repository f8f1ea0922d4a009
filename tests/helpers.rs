use std::collections::{BTreeMap, HashMap};

use serde_derive::Serialize;
use serde_json::json;
use whisker::*;

whisker_helper!(upper: |s: str| s.to_uppercase());
whisker_helper!(count: |xs: array| xs.len());

#[test]
fn test_helper_with_space_param() {
    let mut helpers: Helpers = HashMap::new();
    helpers.insert(
        "echo".to_owned(),
        Value::function(|h: &Helper| -> HelperResult {
            assert_eq!(2, h.params().len());
            let result = h
                .params()
                .iter()
                .map(|p| p.render())
                .collect::<Vec<String>>()
                .join(", ");
            Ok(Value::from(result))
        }),
    );
    let t = Compiler::new()
        .compile("Output: {{echo \"Mozilla Firefox\" \"Google Chrome\"}}")
        .unwrap();
    let out = t
        .render(Value::from(json!({})), &helpers, &Partials::new(), None)
        .unwrap();
    assert_eq!(out, "Output: Mozilla Firefox, Google Chrome");
}

#[test]
fn test_simple_literals() {
    let mut helpers: Helpers = HashMap::new();
    helpers.insert(
        "hello".to_owned(),
        Value::function(|h: &Helper| -> HelperResult {
            assert_eq!(h.param(1), Some(&Value::from(12)));
            assert_eq!(h.param(2), Some(&Value::from(true)));
            assert_eq!(h.param(3), Some(&Value::from(false)));
            let rendered: Vec<String> = h.params().iter().map(|v| v.render()).collect();
            Ok(Value::from(format!(
                "Hello {} {} times: {} {}",
                rendered[0], rendered[1], rendered[2], rendered[3]
            )))
        }),
    );
    let t = Compiler::new()
        .compile("Message: {{hello \"world\" 12 true false}}")
        .unwrap();
    let out = t
        .render(Value::from(json!({})), &helpers, &Partials::new(), None)
        .unwrap();
    assert_eq!(out, "Message: Hello world 12 times: true false");
}

#[test]
fn test_null_and_undefined_literals() {
    let mut helpers: Helpers = HashMap::new();
    helpers.insert(
        "hello".to_owned(),
        Value::function(|h: &Helper| -> HelperResult {
            let who = h.param(0).map(|v| v.render()).unwrap_or_default();
            Ok(Value::from(format!("Hello {}", who)))
        }),
    );
    let t = Compiler::new()
        .compile("Message: {{{hello null}}}|{{{hello undefined}}}")
        .unwrap();
    let out = t
        .render(Value::Null, &helpers, &Partials::new(), None)
        .unwrap();
    assert_eq!(out, "Message: Hello |Hello ");
}

#[test]
fn test_functions_in_data() {
    let mut data = BTreeMap::new();
    data.insert(
        "awesome".to_owned(),
        Value::function(|h: &Helper| -> HelperResult {
            Ok(h.param(0).cloned().unwrap_or_else(|| Value::from("Awesome")))
        }),
    );
    data.insert("frank".to_owned(), Value::from("Frank"));
    let data = Value::Object(data);

    let t = Compiler::new()
        .compile("{{awesome}} {{{awesome}}} {{awesome frank}}")
        .unwrap();
    let out = t
        .render(data, &Helpers::new(), &Partials::new(), None)
        .unwrap();
    assert_eq!(out, "Awesome Awesome Frank");
}

#[test]
fn test_non_callable_helper_values() {
    let mut helpers: Helpers = HashMap::new();
    helpers.insert("helper".to_owned(), Value::from("helper"));
    helpers.insert("lookup".to_owned(), Value::from(json!([{}])));
    let render = |source: &str, data: serde_json::Value| {
        Compiler::new()
            .compile(source)
            .unwrap()
            .render(Value::from(data), &helpers, &Partials::new(), None)
            .unwrap()
            .into_string()
    };
    assert_eq!(
        render(
            "{{#outer}}{{#inner}}{{helper}}{{/inner}}{{/outer}}",
            json!({"outer": {"inner": {"unused": []}}})
        ),
        "helper"
    );
    assert_eq!(
        render("{{#lookup}}Explicit{{/lookup}}", json!({"lookup": []})),
        "Explicit"
    );
    assert_eq!(render("test: {{.}}", json!(null)), "test: ");
}

#[test]
fn test_block_helper_with_inverse() {
    let mut helpers: Helpers = HashMap::new();
    helpers.insert(
        "list".to_owned(),
        Value::function(|h: &Helper| -> HelperResult {
            let items = match h.param(0).and_then(|v| v.as_array()) {
                Some(items) if !items.is_empty() => items,
                _ => return Ok(Value::Safe(h.render_inverse(h.this().clone())?)),
            };
            let mut out = SafeString::from("<ul>");
            for item in items {
                out.push_str("<li>");
                out.grow(h.render(item.clone())?);
                out.push_str("</li>");
            }
            out.push_str("</ul>");
            Ok(Value::Safe(out))
        }),
    );
    let t = Compiler::new()
        .compile("{{#list people}}{{name}}{{else}}<p>{{none}}</p>{{/list}}")
        .unwrap();
    let out = t
        .render(
            Value::from(json!({"people": [{"name": "A&B"}, {"name": "C"}], "none": "x"})),
            &helpers,
            &Partials::new(),
            None,
        )
        .unwrap();
    assert_eq!(out, "<ul><li>A&amp;B</li><li>C</li></ul>");
    let out = t
        .render(
            Value::from(json!({"people": [], "none": "nobody"})),
            &helpers,
            &Partials::new(),
            None,
        )
        .unwrap();
    assert_eq!(out, "<p>nobody</p>");
}

#[test]
fn test_hash_arguments() {
    let mut helpers: Helpers = HashMap::new();
    helpers.insert(
        "link".to_owned(),
        Value::function(|h: &Helper| -> HelperResult {
            let mut attrs: Vec<String> = h
                .hash()
                .iter()
                .map(|(k, v)| format!("{}=\"{}\"", k, escape_html(&v.render())))
                .collect();
            attrs.sort();
            let text = h.param(0).map(|v| escape_html(&v.render())).unwrap_or_default();
            Ok(Value::Safe(SafeString::from(format!(
                "<a {}>{}</a>",
                attrs.join(" "),
                text
            ))))
        }),
    );
    let t = Compiler::new()
        .compile("{{link title href=url class=\"big\" rel=none}}")
        .unwrap();
    let out = t
        .render(
            Value::from(json!({"title": "<home>", "url": "/"})),
            &helpers,
            &Partials::new(),
            None,
        )
        .unwrap();
    assert_eq!(out, "<a class=\"big\" href=\"/\" rel=\"\">&lt;home&gt;</a>");
}

#[test]
fn test_macro_helpers() {
    let mut helpers: Helpers = HashMap::new();
    helpers.insert("upper".to_owned(), Value::function(upper));
    helpers.insert("count".to_owned(), Value::function(count));
    let t = Compiler::new()
        .compile("{{upper name}} has {{count pets}} pets")
        .unwrap();
    let out = t
        .render(
            Value::from(json!({"name": "kim", "pets": ["cat", "dog"]})),
            &helpers,
            &Partials::new(),
            None,
        )
        .unwrap();
    assert_eq!(out, "KIM has 2 pets");
}

#[derive(Serialize)]
struct Person {
    name: String,
    age: u16,
    tags: Vec<String>,
}

#[test]
fn test_render_serializable_data() {
    let t = Compiler::new()
        .compile("{{name}} ({{age}}){{#each tags}} #{{this}}{{/each}}")
        .unwrap();
    let p = Person {
        name: "Ada".to_owned(),
        age: 36,
        tags: vec!["math".to_owned(), "code".to_owned()],
    };
    assert_eq!(t.render_data(&p).unwrap(), "Ada (36) #math #code");
    assert_eq!(
        render_template("{{name}}", &p).unwrap(),
        "Ada"
    );
}

#[test]
fn test_helpers_are_reentrant_across_threads() {
    let t = std::sync::Arc::new(
        Compiler::new()
            .compile("{{#each xs}}{{this}}{{/each}}")
            .unwrap(),
    );
    let handles: Vec<_> = (0..4)
        .map(|i| {
            let t = t.clone();
            std::thread::spawn(move || t.render_data(&json!({ "xs": [i, i] })).unwrap())
        })
        .collect();
    let outs: Vec<String> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    assert_eq!(outs, vec!["00", "11", "22", "33"]);
}
