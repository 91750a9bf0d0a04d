//! String and character generator properties

use crate::{arbitrary_seed, sample};
use quill::*;

/// Property: character generators stay inside their classes
pub fn test_character_generator_ranges() {
    let prop = for_all_named(arbitrary_seed(), "seed", |&seed| {
        let ranged = sample(&Gen::<char>::range('a', 'f'), seed);
        let ascii = sample(&Gen::<char>::ascii(), seed);
        let alpha = sample(&Gen::<char>::ascii_alpha(), seed);
        let alnum = sample(&Gen::<char>::ascii_alphanumeric(), seed);
        let any = sample(&Gen::<char>::any(), seed);

        matches!(ranged, Ok('a'..='f'))
            && matches!(ascii, Ok(c) if (' '..='~').contains(&c))
            && matches!(alpha, Ok(c) if c.is_ascii_alphabetic())
            && matches!(alnum, Ok(c) if c.is_ascii_alphanumeric())
            && matches!(any, Ok(c) if !(0xD800..0xE000).contains(&(c as u32)))
    });

    match prop.run(&Config::default().with_tests(200)) {
        TestResult::Pass { .. } => println!("✓ Character generator ranges property passed"),
        result => panic!("Character generator ranges property failed: {result}"),
    }
}

/// Property: string lengths are counted in characters and stay in bounds
pub fn test_string_lengths() {
    let gen = Gen::string_of_n(Gen::<char>::any(), Some(2), Some(5));
    assert_eq!(gen.name(), "string_of_n(chars(), 2, 5)");

    let prop = for_all_named(gen, "s", |s| (2..=5).contains(&s.chars().count()));
    match prop.run(&Config::default()) {
        TestResult::Pass { .. } => {}
        result => panic!("String length property failed: {result}"),
    }

    // Shrinking a string keeps the characters as simple as possible.
    let prop = for_all_named(Gen::<String>::ascii_alpha(), "s", |s| s.len() < 2);
    match prop.run(&Config::default().with_seed(5)) {
        TestResult::Fail { counterexample, .. } => {
            assert_eq!(counterexample, "s = \"aa\"");
            println!("✓ String lengths property passed");
        }
        result => panic!("Short string property should fail: {result}"),
    }
}
