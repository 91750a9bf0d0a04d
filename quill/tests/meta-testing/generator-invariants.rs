//! Generator invariant properties
//!
//! These properties check that generators respect their bounds, name
//! themselves after their construction, and decode the same bits to the same
//! value every time.

use crate::{arbitrary_seed, replay, sample, samples};
use quill::*;

/// Property: integer generators stay within their bounds
pub fn test_integer_ranges_respected() {
    let prop = for_all_named(
        Gen::tuple((Gen::<i32>::any(), Gen::<i32>::any(), arbitrary_seed())),
        "(a, b, seed)",
        |&(a, b, seed)| {
            let (lo, hi) = (a.min(b), a.max(b));
            let wide = sample(&Gen::<i32>::range(lo, hi), seed);
            let above = sample(&Gen::<i8>::at_least(lo as i8), seed);
            let below = sample(&Gen::<u16>::at_most(hi as u16), seed);
            matches!(wide, Ok(x) if lo <= x && x <= hi)
                && matches!(above, Ok(x) if x >= lo as i8)
                && matches!(below, Ok(x) if x <= hi as u16)
        },
    );

    match prop.run(&Config::default().with_tests(200)) {
        TestResult::Pass { .. } => println!("✓ Integer ranges respected property passed"),
        result => panic!("Integer ranges respected property failed: {result}"),
    }
}

/// Property: collection sizes stay within their bounds
pub fn test_collection_sizes_respected() {
    let prop = for_all_named(
        Gen::tuple((
            Gen::<usize>::range(0, 6),
            Gen::<usize>::range(0, 12),
            arbitrary_seed(),
        )),
        "(a, b, seed)",
        |&(a, b, seed)| {
            let (lo, hi) = (a.min(b), a.max(b));
            let in_bounds = |len: usize| lo <= len && len <= hi;

            let vec_gen = Gen::vec_of_n(Gen::<u8>::any(), Some(lo), Some(hi));
            let vec_ok = match sample(&vec_gen, seed) {
                Ok(v) => in_bounds(v.len()),
                Err(_) => false,
            };
            // Sets and maps may give up on duplicates, but never break bounds.
            let set_gen = Gen::hash_set_of_n(Gen::<u32>::any(), Some(lo), Some(hi));
            let set_ok = match sample(&set_gen, seed) {
                Ok(s) => in_bounds(s.len()),
                Err(stop) => matches!(stop, Stop::Invalid(_)),
            };
            let map_gen = Gen::hash_map_of_n(Gen::<u32>::any(), Gen::bool(), Some(lo), Some(hi));
            let map_ok = match sample(&map_gen, seed) {
                Ok(m) => in_bounds(m.len()),
                Err(stop) => matches!(stop, Stop::Invalid(_)),
            };
            vec_ok && set_ok && map_ok
        },
    );

    match prop.run(&Config::default()) {
        TestResult::Pass { .. } => println!("✓ Collection sizes respected property passed"),
        result => panic!("Collection sizes respected property failed: {result}"),
    }
}

/// Generator names reflect how they were built
pub fn test_generator_names() {
    assert_eq!(Gen::<i32>::any().name(), "i32s()");
    assert_eq!(Gen::<i32>::range(1, 10).name(), "i32_range(1, 10)");
    assert_eq!(Gen::<u8>::at_least(3).name(), "u8_min(3)");
    assert_eq!(Gen::<i16>::at_most(-2).name(), "i16_max(-2)");
    assert_eq!(Gen::vec_of(Gen::<u8>::any()).name(), "vec_of(u8s())");
    assert_eq!(Gen::option_of(Gen::bool(), true).name(), "option_of(bool())");
    assert_eq!(Gen::<f64>::range(0.0, 1.0).name(), "f64_range(0.0, 1.0)");
    assert_eq!(Gen::<char>::range('a', 'f').name(), "char_range('a', 'f')");
    assert_eq!(Gen::<u8>::any().named("small").to_string(), "small");
    println!("✓ Generator names property passed");
}

/// Property: a generator is a pure function of the bits it consumes
pub fn test_same_bits_same_value() {
    let gen = Gen::tuple((
        Gen::vec_of(Gen::<i64>::any()),
        Gen::option_of(Gen::<f64>::any(), true),
        Gen::<String>::ascii(),
        Gen::one_of(vec![
            Gen::<u8>::any().map(u32::from),
            Gen::<u32>::range(1000, 2000),
        ]),
    ));

    let prop = for_all_named(arbitrary_seed(), "seed", move |&seed| {
        let words = words_used(&gen, seed);
        let first = replay(&gen, words.clone());
        let second = replay(&gen, words);
        match (first, second, sample(&gen, seed)) {
            (Ok(a), Ok(b), Ok(c)) => {
                let (a, b, c) = (format!("{a:?}"), format!("{b:?}"), format!("{c:?}"));
                a == b && b == c
            }
            _ => false,
        }
    });

    match prop.run(&Config::default().with_tests(50)) {
        TestResult::Pass { .. } => println!("✓ Same bits same value property passed"),
        result => panic!("Same bits same value property failed: {result}"),
    }

    // Sanity check of the sampling helper itself.
    assert_eq!(samples(&Gen::<u8>::range(7, 7), 1, 3), vec![7, 7, 7]);
}

/// Words a random draw of `gen` consumes.
fn words_used<T: std::fmt::Debug + 'static>(gen: &Gen<T>, seed: Seed) -> Vec<u64> {
    let gen = gen.clone();
    let prop = property(move |case| {
        case.draw(&gen, "")?;
        Ok(())
    });
    let config = Config::default();
    prop.execute(BitStream::random(seed, config.max_words), config.filter_tries)
        .recording
        .data
}
