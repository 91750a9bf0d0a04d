//! Integration properties
//!
//! End-to-end workflows through `Property::run`: failure reports, seeds,
//! runtime faults, discards and the default configuration.

use quill::*;

/// A failing property reports a reproducible, minimal failure
pub fn test_simple_failing_property_workflow() {
    let prop = property(|case| {
        let a = case.draw(&Gen::<u8>::any(), "a")?;
        let b = case.draw(&Gen::<u8>::any(), "b")?;
        ensure!(a as u16 + b as u16 <= 300, "a + b overflowed 300");
        Ok(())
    });

    let result = prop.run_with_context(
        &Config::default(),
        Some("test_simple_failing_property_workflow"),
        Some(module_path!()),
    );
    let TestResult::Fail {
        seed,
        tests_run,
        failure,
        draws,
        ..
    } = &result
    else {
        panic!("Sum property should fail: {result}");
    };

    assert!(*tests_run >= 1);
    assert_eq!(failure.kind, FailureKind::Assertion);
    assert_eq!(failure.message, "a + b overflowed 300");
    let site = failure.site.as_ref().expect("assertions record their site");
    assert!(site.file.ends_with("integration-properties.rs"));
    let labels: Vec<&str> = draws.iter().map(|d| d.label.as_str()).collect();
    assert_eq!(labels, ["a", "b"]);
    let sum: u16 = draws.iter().map(|d| d.value.parse::<u16>().unwrap()).sum();
    assert_eq!(sum, 301);

    let rerun = prop.run_with_context(
        &Config::default().with_seed(*seed),
        Some("test_simple_failing_property_workflow"),
        Some(module_path!()),
    );
    assert_eq!(rerun, result);

    assert!(matches!(
        result.into_result(),
        Err(QuillError::PropertyFailed { .. })
    ));
    println!("✓ Simple failing property workflow passed");
}

/// Panics are runtime faults, attributed to the engine or to user code
pub fn test_fault_origins() {
    let user = property(|case| {
        let n = case.draw(&Gen::<u32>::any(), "n")?;
        assert!(n < 50, "n was {n}");
        Ok(())
    });
    let TestResult::Fail { failure, draws, .. } = user.run(&Config::default()) else {
        panic!("User panic should fail the property");
    };
    assert_eq!(failure.kind, FailureKind::RuntimeFault);
    assert_eq!(failure.origin, Some(FaultOrigin::User));
    assert_eq!(failure.message, "n was 50");
    assert_eq!(draws[0].value, "50");
    assert!(failure.title().starts_with("Runtime Fault at "));

    // An inverted range is the caller's mistake, reported at the call site.
    let inverted = property(|case| {
        let hi = case.draw(&Gen::<i32>::range(-10, 0), "hi")?;
        let _ = Gen::<i32>::range(1, hi);
        Ok(())
    });
    let TestResult::Fail { failure, .. } = inverted.run(&Config::default()) else {
        panic!("Inverted range should fail the property");
    };
    assert_eq!(failure.kind, FailureKind::RuntimeFault);
    assert_eq!(failure.origin, Some(FaultOrigin::User));
    assert!(failure.message.contains("invalid range [1, 0] for i32"));
    let site = failure.site.as_ref().expect("panics record their site");
    assert!(site.file.ends_with("integration-properties.rs"), "{site}");
    assert!(failure.title().starts_with("Runtime Fault at "));

    let inverted_vec = property(|case| {
        let min = case.draw(&Gen::<usize>::range(3, 5), "min")?;
        let _ = Gen::vec_of_n(Gen::bool(), Some(min), Some(1));
        Ok(())
    });
    let TestResult::Fail { failure, .. } = inverted_vec.run(&Config::default()) else {
        panic!("Inverted size bounds should fail the property");
    };
    assert_eq!(failure.origin, Some(FaultOrigin::User));

    // Sites inside quill-core are engine faults.
    let engine_site = Site::new("quill-core/src/shrink.rs", 1, 1);
    assert_eq!(fault::classify(Some(&engine_site)), FaultOrigin::Engine);

    let mapped = Gen::<u8>::any().map(|x| {
        if x > 100 {
            panic!("mapped {x}");
        }
        x
    });
    let path = vec![mapped.name().to_string()];
    let TestResult::Fail { failure, .. } = for_all(mapped, |_| true).run(&Config::default()) else {
        panic!("Panicking map should fail the property");
    };
    assert_eq!(failure.origin, Some(FaultOrigin::User));
    assert_eq!(failure.message, "mapped 101");
    assert_eq!(failure.generator_path, path);
    println!("✓ Fault origins passed");
}

/// The policy knobs have their documented defaults
pub fn test_default_knobs() {
    let config = Config::default();
    assert_eq!(config.test_limit, 100);
    assert_eq!(config.shrink_limit, 1000);
    assert_eq!(config.discard_ratio, 10);
    assert_eq!(config.discard_limit(), 1000);
    assert_eq!(config.max_words, 8192);
    assert_eq!(config.filter_tries, 100);
    assert_eq!(config.seed, None);

    let custom = Config::default()
        .with_tests(5)
        .with_shrinks(6)
        .with_discard_ratio(7)
        .with_max_words(8)
        .with_filter_tries(9)
        .with_seed(10);
    assert_eq!(
        (custom.test_limit, custom.shrink_limit, custom.discard_ratio),
        (5, 6, 7)
    );
    assert_eq!((custom.max_words, custom.filter_tries, custom.seed), (8, 9, Some(10)));
    assert!(matches!(
        Config::default().with_filter_tries(0).validate(),
        Err(QuillError::InvalidConfig { .. })
    ));
    println!("✓ Default knobs passed");
}

/// Assumptions discard executions without failing them
pub fn test_assume_discards() {
    let prop = property(|case| {
        let n = case.draw(&Gen::<u8>::any(), "n")?;
        case.assume(n % 2 == 0)?;
        ensure!(n % 2 == 0);
        Ok(())
    });

    match prop.run(&Config::default()) {
        TestResult::Pass {
            tests_run,
            discarded,
            ..
        } => {
            assert_eq!(tests_run, 100);
            assert!(discarded > 0);
            println!("✓ Assume discards passed");
        }
        result => panic!("Assume property should pass: {result}"),
    }
}

/// The failure report carries everything needed to reproduce the failure
pub fn test_report_format() {
    let prop = for_all_named(Gen::<u32>::any(), "x", |&x| x < 1000);
    let config = Config::default().with_seed(8);
    let result = prop.run_with_context(&config, Some("small"), Some("reports"));
    let report = result.to_string();

    assert!(report.starts_with("━━━ reports ━━━\n  ✗ small failed after "));
    assert!(report.contains("Shrinking progression:"));
    assert!(report.contains("=== Assertion Failure at "));
    assert!(report.contains("condition returned false"));
    assert!(report.contains("Draw structure:"));
    assert!(report.contains("Replay bits: ["));
    assert!(report.contains("Seed: 8"));
    assert!(report.ends_with("Minimal counterexample: x = 1000"));

    let passing = for_all(Gen::bool(), |_| true).run_with_context(&config, Some("ok"), None);
    assert_eq!(passing.to_string(), "  ✓ ok passed 100 tests.");
    println!("✓ Report format passed");
}
