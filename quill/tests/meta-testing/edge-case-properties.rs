//! Edge case properties
//!
//! Boundary behaviour: unsatisfiable filters, the all-zero stream, invalid
//! generator construction and replay overruns.

use crate::replay;
use quill::*;

/// An always-false filter gives up with `Unsatisfied`
pub fn test_filter_gives_up() {
    let never = Gen::<u32>::any().filter(|_| false);
    let prop = for_all_named(never, "x", |_| true);
    let config = Config::default()
        .with_tests(3)
        .with_filter_tries(7)
        .with_discard_ratio(1);

    match prop.run(&config) {
        TestResult::Discard {
            limit,
            tests_run,
            reason,
            ..
        } => {
            assert_eq!(limit, 3);
            assert_eq!(tests_run, 0);
            assert_eq!(reason, Invalid::Unsatisfied { tries: 7 });
            println!("✓ Filter gives up passed");
        }
        result => panic!("Always-false filter should give up: {result}"),
    }
}

/// The all-zero stream decodes to the simplest value of every generator
pub fn test_zero_stream_is_simplest() {
    let zeros = || vec![0; 64];
    assert_eq!(replay(&Gen::<i32>::any(), zeros()).unwrap(), 0);
    assert_eq!(replay(&Gen::<i32>::range(-50, -10), zeros()).unwrap(), -10);
    assert_eq!(replay(&Gen::<u64>::range(5, 9), zeros()).unwrap(), 5);
    assert!(!replay(&Gen::bool(), zeros()).unwrap());
    assert_eq!(replay(&Gen::<f64>::range(0.5, 100.0), zeros()).unwrap(), 1.0);
    assert_eq!(replay(&Gen::vec_of(Gen::<u8>::any()), zeros()).unwrap(), Vec::<u8>::new());
    assert_eq!(replay(&Gen::option_of(Gen::<u8>::any(), true), zeros()).unwrap(), None);
    assert_eq!(replay(&Gen::<String>::ascii(), zeros()).unwrap(), "");
    println!("✓ Zero stream is simplest passed");
}

/// Invalid construction is an error from `try_*` and a panic otherwise
pub fn test_invalid_generators_are_errors() {
    assert!(matches!(
        Gen::<i32>::try_range(5, 1),
        Err(QuillError::InvalidGenerator { .. })
    ));
    assert!(Gen::<f64>::try_range(f64::NAN, 1.0).is_err());
    assert!(Gen::<f32>::try_range(2.0, 1.0).is_err());
    assert!(Gen::<u8>::try_one_of(Vec::new()).is_err());
    assert!(Gen::try_frequency(vec![(0, Gen::<u8>::any())]).is_err());
    assert!(Gen::try_vec_of_n(Gen::bool(), Some(3), Some(2)).is_err());
    assert!(Gen::<char>::try_range('z', 'a').is_err());

    let panicked = std::panic::catch_unwind(|| Gen::<u16>::range(9, 3));
    assert!(panicked.is_err());
    println!("✓ Invalid generators are errors passed");
}

/// Reading past recorded words is invalid, not a failure
pub fn test_replay_overrun_is_invalid() {
    let result = replay(&Gen::vec_of_n(Gen::<u8>::byte(), Some(4), None), vec![1, 1]);
    assert!(matches!(result, Err(Stop::Invalid(Invalid::Overrun))));

    let prop = for_all(Gen::<u64>::any(), |_| false);
    let execution = prop.replay(&[]);
    assert_eq!(execution.outcome, Outcome::Invalid(Invalid::Overrun));
    println!("✓ Replay overrun is invalid passed");
}
