//! Turning panics inside a property into failure records.
//!
//! A process-wide panic hook is installed once. While a property runs under
//! [`catch`] on the current thread, the hook records the panic message,
//! location and backtrace instead of printing them; panics on other threads
//! (or outside [`catch`]) go to the previously installed hook.

use crate::error::{Failure, FailureKind, FaultOrigin, Site};
use std::any::Any;
use std::backtrace::{Backtrace, BacktraceStatus};
use std::cell::{Cell, RefCell};
use std::panic::{self, AssertUnwindSafe};
use std::sync::Once;

static HOOK: Once = Once::new();

struct Captured {
    message: String,
    site: Option<Site>,
    backtrace: Option<String>,
}

thread_local! {
    static CAPTURING: Cell<bool> = const { Cell::new(false) };
    static CAPTURED: RefCell<Option<Captured>> = const { RefCell::new(None) };
}

fn install_hook() {
    HOOK.call_once(|| {
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            if !CAPTURING.with(Cell::get) {
                previous(info);
                return;
            }

            let backtrace = Backtrace::capture();
            let captured = Captured {
                message: payload_message(info.payload()),
                site: info.location().map(Site::from),
                backtrace: match backtrace.status() {
                    BacktraceStatus::Captured => Some(backtrace.to_string()),
                    _ => None,
                },
            };
            CAPTURED.with(|slot| *slot.borrow_mut() = Some(captured));
        }));
    });
}

fn payload_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with a non-string payload".to_string()
    }
}

/// Whether a panic raised at `site` comes from quill's own code.
pub fn classify(site: Option<&Site>) -> FaultOrigin {
    let engine = site.is_some_and(|site| {
        site.file
            .split(['/', '\\'])
            .any(|dir| dir == "quill-core" || dir.starts_with("quill-core-"))
    });
    if engine {
        FaultOrigin::Engine
    } else {
        FaultOrigin::User
    }
}

/// Run `f`, converting a panic into a runtime fault.
pub fn catch<R>(f: impl FnOnce() -> R) -> Result<R, Failure> {
    install_hook();
    let was_capturing = CAPTURING.with(|capturing| capturing.replace(true));
    let result = panic::catch_unwind(AssertUnwindSafe(f));
    CAPTURING.with(|capturing| capturing.set(was_capturing));

    result.map_err(|payload| {
        let captured = CAPTURED.with(|slot| slot.borrow_mut().take());
        let (message, site, backtrace) = match captured {
            Some(captured) => (captured.message, captured.site, captured.backtrace),
            None => (payload_message(payload.as_ref()), None, None),
        };
        Failure {
            kind: FailureKind::RuntimeFault,
            origin: Some(classify(site.as_ref())),
            message,
            site,
            backtrace,
            generator_path: Vec::new(),
        }
    })
}
