#[derive(Parser)]
#[grammar = "grammar.pest"]
pub struct HandlebarsParser;
