//! Basic example demonstrating quill property-based testing.

use quill::*;

fn main() {
    println!("quill Property-Based Testing Examples");
    println!();

    // Example 1: Simple boolean property
    println!("Testing boolean property: all booleans are either true or false");
    let bool_prop = for_all(Gen::bool(), |&b| b || !b);
    println!("{}", bool_prop.run(&Config::default()));
    println!();

    // Example 2: Reversing twice is the identity
    println!("Testing vector property: reverse(reverse(xs)) == xs");
    let reverse_prop = for_all_named(Gen::vec_of(Gen::<i32>::any()), "xs", |xs| {
        let mut twice = xs.clone();
        twice.reverse();
        twice.reverse();
        &twice == xs
    });
    println!("{}", reverse_prop.run(&Config::default()));
    println!();

    // Example 3: Property that should fail (to demonstrate shrinking)
    println!("Testing property that should fail: all integers are positive");
    let positive_prop = for_all_named(Gen::<i32>::range(-10, 10), "x", |&x| x > 0);
    match positive_prop.run(&Config::default().with_tests(20)) {
        TestResult::Fail {
            counterexample,
            tests_run,
            shrinks_performed,
            ..
        } => {
            println!("Positive property failed as expected:");
            println!("  Counterexample: {counterexample}");
            println!("  Tests run: {tests_run}");
            println!("  Shrinks performed: {shrinks_performed}");
        }
        result => println!("Unexpected result: {result}"),
    }
    println!();

    // Example 4: Drawing several values inside one property
    println!("Testing a multi-draw property: sorting keeps every element");
    let sort_prop = property(|case| {
        let mut xs = case.draw(&Gen::vec_of(Gen::<u8>::any()), "xs")?;
        let extra = case.draw(&Gen::<u8>::any(), "extra")?;
        xs.push(extra);
        let mut sorted = xs.clone();
        sorted.sort();
        ensure_eq!(sorted.len(), xs.len());
        ensure!(sorted.contains(&extra), "lost {extra}");
        Ok(())
    });
    println!("{}", sort_prop.run(&Config::default()));
}
