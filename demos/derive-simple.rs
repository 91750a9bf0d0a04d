//! Deriving a generator for a plain struct.

use quill::*;

#[derive(Generate, Debug, Clone, PartialEq)]
struct Simple {
    value: i32,
    label: Option<String>,
}

fn main() {
    let gen = Simple::generate();
    let prop = for_all_named(gen, "simple", |simple: &Simple| simple.value < 100);
    println!("{}", prop.run(&Config::default()));
}
