//! Option generator meta tests
//!
//! These properties test optional values: the presence coin, its
//! distribution, and shrinking toward `None`.

use crate::{replay, samples};
use quill::*;

/// Both `None` and `Some` show up; `some_of` never yields `None`
pub fn test_option_generation_distribution() {
    let values = samples(&Gen::option_of(Gen::<i32>::range(1, 100), true), 9, 1000);
    let some = values.iter().filter(|v| v.is_some()).count();
    assert!((350..=650).contains(&some), "{some} of 1000 options were Some");
    assert!(values.iter().flatten().all(|x| (1..=100).contains(x)));

    let always = Gen::option_of(Gen::<i32>::range(1, 100), false);
    assert_eq!(always.name(), "some_of(i32_range(1, 100))");
    assert!(samples(&always, 10, 200).iter().all(Option::is_some));
    assert_eq!(replay(&always, vec![0; 4]).unwrap(), Some(1));
    println!("✓ Option generation distribution passed");
}

/// Property: a failure that does not need the value shrinks to `None`
pub fn test_option_shrinks_to_none() {
    let prop = property(|case| {
        let flag = case.draw(&Gen::option_of(Gen::<u64>::any(), true), "flag")?;
        let n = case.draw(&Gen::<u8>::any(), "n")?;
        ensure!(n < 10 || flag.is_some_and(|x| x > 0));
        Ok(())
    });

    match prop.run(&Config::default().with_seed(3)) {
        TestResult::Fail { counterexample, .. } => {
            assert_eq!(counterexample, "flag = None, n = 10");
            println!("✓ Option shrinks to none passed");
        }
        result => panic!("Option property should fail: {result}"),
    }
}
