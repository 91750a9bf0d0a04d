//! Example demonstrating bit-stream shrinking.
//!
//! Logs at DEBUG so each stream the shrinker adopts is printed.

use quill_core::*;

fn main() {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::DEBUG)
        .init();

    // Integer shrinking: stops exactly at the threshold
    println!("Testing integer shrinking (should fail at exactly 1000)");
    let int_prop = for_all_named(Gen::<u64>::any(), "x", |&x| x < 1000);
    println!("{}", int_prop.run(&Config::default()));
    println!();

    // Collection shrinking: removes elements, then simplifies the rest
    println!("Testing vector shrinking (should fail with three zeros)");
    let vec_prop = for_all_named(Gen::vec_of(Gen::<i16>::any()), "v", |v| v.len() < 3);
    println!("{}", vec_prop.run(&Config::default()));
    println!();

    // Replaying the minimal stream reproduces the failure
    println!("Replaying the minimal stream of a string property");
    let string_prop = for_all_named(Gen::<String>::ascii(), "s", |s| !s.contains('!'));
    if let TestResult::Fail { bits, .. } = string_prop.run(&Config::default()) {
        let replayed = string_prop.replay(&bits);
        println!("replayed {:?} -> {}", bits, replayed.counterexample());
    }
}
