//! Internal compiler errors.
//!
//! An ICE means the input broke an invariant that upstream validation should have
//! enforced. It is reported through an optional hook and then panics; it is never
//! turned into a [`crate::CompilerError`].

use std::fmt;
use std::sync::OnceLock;

/// Callback invoked with the full ICE message before the panic.
pub type IceHook = fn(&str);

static HOOK: OnceLock<IceHook> = OnceLock::new();

/// Install the process-wide ICE hook.
///
/// Call this once from the driver's initialization routine. Returns the rejected
/// hook if one is already installed.
pub fn set_hook(hook: IceHook) -> Result<(), IceHook> {
    HOOK.set(hook)
}

/// Report an internal compiler error and abort code generation.
#[cold]
#[track_caller]
pub fn report(args: fmt::Arguments<'_>) -> ! {
    let message = format!("internal compiler error: {}", args);
    log::error!("{}", message);
    if let Some(hook) = HOOK.get() {
        hook(&message);
    }
    panic!("{}", message)
}

/// Raise an internal compiler error with a formatted message.
#[macro_export]
macro_rules! ice {
    ($($arg:tt)*) => {
        $crate::ice::report(format_args!($($arg)*))
    };
}
