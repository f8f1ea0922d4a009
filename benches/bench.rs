#[macro_use]
extern crate criterion;
#[macro_use]
extern crate serde_derive;

use std::collections::{BTreeMap, HashMap};

use criterion::Criterion;
use serde_json::value::Value as Json;
use whisker::{to_value, Compiler, Helpers, Partial, Partials};

#[derive(Serialize)]
struct DataWrapper {
    v: String,
}

#[derive(Serialize)]
struct RowWrapper {
    real: Vec<DataWrapper>,
    dummy: Vec<DataWrapper>,
}

#[derive(Serialize)]
struct NestedRowWrapper {
    parent: Vec<Vec<DataWrapper>>,
}

static SOURCE: &str = "<html>
  <head>
    <title>{{year}}</title>
  </head>
  <body>
    <h1>CSL {{year}}</h1>
    <ul>
    {{#each teams}}
      <li class=\"{{#if @first}}champion{{/if}}\">
      <b>{{name}}</b>: {{score}}
      </li>
    {{/each}}
    </ul>
  </body>
</html>";

fn make_data() -> BTreeMap<String, Json> {
    let mut data = BTreeMap::new();

    data.insert("year".to_string(), Json::from("2015"));

    let mut teams = Vec::new();

    for v in [
        ("Jiangsu", 43u16),
        ("Beijing", 27u16),
        ("Guangzhou", 22u16),
        ("Shandong", 12u16),
    ]
    .iter()
    {
        let (name, score) = *v;
        let mut t = serde_json::Map::new();
        t.insert("name".to_string(), Json::from(name));
        t.insert("score".to_string(), Json::from(score));
        teams.push(Json::Object(t))
    }

    data.insert("teams".to_string(), Json::Array(teams));
    data
}

fn parse_template(c: &mut Criterion) {
    c.bench_function("parse_template", move |b| {
        let mut compiler = Compiler::new();
        b.iter(|| compiler.compile(SOURCE).ok().unwrap())
    });
}

fn render_template(c: &mut Criterion) {
    let template = Compiler::new()
        .compile(SOURCE)
        .expect("Invalid template format");
    let data = to_value(&make_data()).unwrap();
    let helpers = Helpers::new();
    let partials = Partials::new();

    c.bench_function("render_template", move |b| {
        b.iter(|| {
            template
                .render(data.clone(), &helpers, &partials, None)
                .ok()
                .unwrap()
        })
    });
}

fn large_loop_helper(c: &mut Criterion) {
    let template = Compiler::new()
        .compile("BEFORE\n{{#each real}}{{this.v}}{{/each}}AFTER")
        .expect("Invalid template format");

    let real: Vec<DataWrapper> = (1..1000)
        .map(|i| DataWrapper {
            v: format!("n={}", i),
        })
        .collect();
    let dummy: Vec<DataWrapper> = (1..1000)
        .map(|i| DataWrapper {
            v: format!("n={}", i),
        })
        .collect();
    let rows = RowWrapper { real, dummy };

    c.bench_function("large_loop_helper", move |b| {
        b.iter(|| template.render_data(&rows).ok().unwrap())
    });
}

fn large_nested_loop(c: &mut Criterion) {
    let template = Compiler::new()
        .compile("BEFORE\n{{#each parent}}{{#each this}}{{this.v}}{{/each}}{{/each}}AFTER")
        .expect("Invalid template format");

    let parent: Vec<Vec<DataWrapper>> = (1..100)
        .map(|_| {
            (1..10)
                .map(|v| DataWrapper {
                    v: format!("v={}", v),
                })
                .collect()
        })
        .collect();

    let rows = NestedRowWrapper { parent };

    c.bench_function("large_nested_loop", move |b| {
        b.iter(|| template.render_data(&rows).ok().unwrap())
    });
}

fn partial_in_loop(c: &mut Criterion) {
    let template = Compiler::new()
        .compile("{{#each real}}{{> row}}{{/each}}")
        .expect("Invalid template format");
    let mut partials: Partials = HashMap::new();
    partials.insert("row".to_owned(), Partial::from("<td>{{@index}}: {{v}}</td>"));

    let real: Vec<DataWrapper> = (1..500)
        .map(|i| DataWrapper {
            v: format!("n={}", i),
        })
        .collect();
    let data = to_value(&RowWrapper {
        real,
        dummy: Vec::new(),
    })
    .unwrap();
    let helpers = Helpers::new();

    c.bench_function("partial_in_loop", move |b| {
        b.iter(|| {
            template
                .render(data.clone(), &helpers, &partials, None)
                .ok()
                .unwrap()
        })
    });
}

criterion_group!(
    benches,
    parse_template,
    render_template,
    large_loop_helper,
    large_nested_loop,
    partial_in_loop
);
criterion_main!(benches);
