//! Shrinking correctness properties
//!
//! These properties ensure that shrinking behaves correctly - that it always
//! produces simpler failures and converges to minimal counterexamples.

use quill::*;
use std::cmp::Ordering;

/// Property: an integer threshold failure shrinks to exactly the threshold
pub fn test_integer_shrinks_to_threshold() {
    let prop = for_all_named(Gen::<i64>::any(), "x", |&x| x < 1000);

    for seed in 0..3 {
        match prop.run(&Config::default().with_seed(seed)) {
            TestResult::Fail { draws, .. } => {
                assert_eq!(draws.len(), 1);
                assert_eq!(draws[0].to_string(), "x = 1000");
            }
            result => panic!("Integer threshold property should fail: {result:?}"),
        }
    }
    println!("✓ Integer shrinks to threshold property passed");
}

/// Property: a length failure shrinks to the shortest vector of zeros
pub fn test_vector_shrinks_to_zeros() {
    let prop = for_all_named(Gen::vec_of(Gen::<u8>::any()), "v", |v| v.len() < 3);

    match prop.run(&Config::default().with_seed(17)) {
        TestResult::Fail { counterexample, .. } => {
            assert_eq!(counterexample, "v = [0, 0, 0]");
            println!("✓ Vector shrinks to zeros property passed");
        }
        result => panic!("Vector length property should fail: {result:?}"),
    }
}

/// Property: every accepted shrink records a strictly simpler stream
pub fn test_steps_are_monotone() {
    let prop = for_all_named(Gen::vec_of(Gen::<u16>::any()), "v", |v| {
        v.iter().map(|&x| x as u64).sum::<u64>() < 2000
    });

    for seed in 0..5 {
        let TestResult::Fail {
            shrink_steps,
            shrinks_performed,
            bits,
            ..
        } = prop.run(&Config::default().with_seed(seed))
        else {
            panic!("Sum property should fail for seed {seed}");
        };

        assert_eq!(shrink_steps.len(), shrinks_performed + 1);
        assert_eq!(shrink_steps[0].step, 0);
        assert_eq!(shrink_steps[0].pass, "original");
        for pair in shrink_steps.windows(2) {
            assert_eq!(compare_bits(&pair[1].bits, &pair[0].bits), Ordering::Less);
        }
        assert_eq!(shrink_steps.last().map(|step| &step.bits), Some(&bits));
    }
    println!("✓ Shrink steps are monotone property passed");
}

/// Property: the same seed always shrinks to the same report
pub fn test_shrinking_is_deterministic() {
    let prop = for_all_named(
        Gen::tuple_of(Gen::<u32>::any(), Gen::<String>::ascii()),
        "(n, s)",
        |(n, s)| (*n as usize) < 100 || s.len() < 2,
    );
    let config = Config::default().with_seed(2024);
    assert_eq!(prop.run(&config), prop.run(&config));
    println!("✓ Shrinking is deterministic property passed");
}

/// Property: replaying the reported words reproduces the reported failure
pub fn test_replay_reproduces_failure() {
    let prop = property(|case| {
        let xs = case.draw(&Gen::vec_of(Gen::<i32>::any()), "xs")?;
        let n = case.draw(&Gen::<usize>::any(), "n")?;
        ensure!(xs.len() <= n % 4, "too many elements");
        Ok(())
    });

    for seed in 0..5 {
        let TestResult::Fail {
            bits,
            draws,
            failure,
            ..
        } = prop.run(&Config::default().with_seed(seed))
        else {
            panic!("Replay property should fail for seed {seed}");
        };

        let replayed = prop.replay(&bits);
        assert_eq!(replayed.draws, draws);
        assert_eq!(replayed.failure(), Some(&failure));
        assert_eq!(replayed.recording.data, bits);

        let bytes = replayed.recording.to_bytes();
        assert_eq!(Recording::words_from_bytes(&bytes), Ok(bits));
    }
    println!("✓ Replay reproduces failure property passed");
}
