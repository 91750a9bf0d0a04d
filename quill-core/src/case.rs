//! The draw context handed to a property for one execution.

use crate::bits::{BitStream, Recording};
use crate::error::{Drawn, Failure, Invalid, Site, Stop};
use crate::gen::Gen;
use std::fmt::Debug;
use std::panic::Location;

/// One execution of a property: a bit stream plus the values drawn from it.
pub struct Case {
    bits: BitStream,
    filter_tries: usize,
    depth: usize,
    draws: Vec<Drawn>,
}

impl Case {
    pub fn new(bits: BitStream, filter_tries: usize) -> Self {
        Case {
            bits,
            filter_tries,
            depth: 0,
            draws: Vec::new(),
        }
    }

    /// Draw a value from `gen`.
    ///
    /// Top-level draws are recorded under `label` for failure reports; draws
    /// made from inside another generator are not.
    pub fn draw<T>(&mut self, gen: &Gen<T>, label: &str) -> Result<T, Stop>
    where
        T: Debug + 'static,
    {
        self.depth += 1;
        let value = gen.draw_in(self);
        self.depth -= 1;

        let value = value?;
        if self.depth == 0 {
            self.draws.push(Drawn {
                label: label.to_string(),
                value: format!("{value:?}"),
            });
        }
        Ok(value)
    }

    /// An assertion failure at the caller's location.
    ///
    /// ```
    /// use quill_core::*;
    ///
    /// let prop = property(|case| {
    ///     let n = case.draw(&Gen::<u8>::any(), "n")?;
    ///     if n == 200 {
    ///         return Err(case.fail("200 is not allowed"));
    ///     }
    ///     Ok(())
    /// });
    /// # let _ = prop;
    /// ```
    #[track_caller]
    pub fn fail(&self, message: impl Into<String>) -> Stop {
        let mut failure = Failure::assertion(message, Site::from(Location::caller()));
        failure.generator_path = self.bits.open_generators();
        Stop::Failed(failure)
    }

    /// Discard this execution unless `condition` holds.
    #[track_caller]
    pub fn assume(&self, condition: bool) -> Result<(), Stop> {
        if condition {
            Ok(())
        } else {
            let site = Site::from(Location::caller());
            Err(Invalid::Assumption(format!("assumption at {site} does not hold")).into())
        }
    }

    /// Raw access to the bit stream, for decoders.
    pub fn bits(&mut self) -> &mut BitStream {
        &mut self.bits
    }

    pub fn filter_tries(&self) -> usize {
        self.filter_tries
    }

    /// Values drawn at top level so far.
    pub fn draws(&self) -> &[Drawn] {
        &self.draws
    }

    pub(crate) fn open_generators(&self) -> Vec<String> {
        self.bits.open_generators()
    }

    pub(crate) fn finish(self) -> (Vec<Drawn>, Recording) {
        (self.draws, self.bits.into_recording())
    }
}

/// Fail the property unless `cond` holds.
///
/// Expands to an early `return Err(..)`, so it can only be used inside a
/// function returning `Result<_, Stop>`.
#[macro_export]
macro_rules! ensure {
    ($cond:expr $(,)?) => {
        $crate::ensure!($cond, "condition failed: {}", stringify!($cond))
    };
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::Stop::Failed($crate::Failure::assertion(
                format!($($arg)+),
                $crate::Site::new(file!(), line!(), column!()),
            )));
        }
    };
}

/// Fail the property unless both expressions are equal.
#[macro_export]
macro_rules! ensure_eq {
    ($left:expr, $right:expr $(,)?) => {
        match (&$left, &$right) {
            (left, right) => {
                $crate::ensure!(
                    *left == *right,
                    "{} != {}: {:?} != {:?}",
                    stringify!($left),
                    stringify!($right),
                    left,
                    right
                );
            }
        }
    };
}
