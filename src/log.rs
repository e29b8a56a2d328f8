//! Internal logging macros.
//!
//! With the `log` feature these forward to the `log` facade; without it they
//! expand to nothing beyond type-checking their arguments.

#[cfg(feature = "log")]
pub(crate) use ::log::{debug, trace, warn};

#[cfg(not(feature = "log"))]
macro_rules! __noop {
    ($($arg:tt)+) => {
        match format_args!($($arg)+) {
            _ => {}
        }
    };
}

#[cfg(not(feature = "log"))]
pub(crate) use {__noop as debug, __noop as trace, __noop as warn};
