// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Logger installation for hosts that call dynobj from C.
//!
//! The core only emits through the `log` facade. These entry points install
//! an `env_logger` whose default filter covers the `dynobj` and `dynobj_c`
//! targets, leaving other crates of the host at `warn`.

use std::ffi::CStr;
use std::os::raw::c_char;

use log::LevelFilter;

use super::DynobjError;

/// Log level for the dynobj targets
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynobjLogLevel {
    DynobjLogOff = 0,
    DynobjLogError = 1,
    DynobjLogWarn = 2,
    DynobjLogInfo = 3,
    DynobjLogDebug = 4,
    DynobjLogTrace = 5,
}

impl From<DynobjLogLevel> for LevelFilter {
    fn from(level: DynobjLogLevel) -> Self {
        match level {
            DynobjLogLevel::DynobjLogOff => LevelFilter::Off,
            DynobjLogLevel::DynobjLogError => LevelFilter::Error,
            DynobjLogLevel::DynobjLogWarn => LevelFilter::Warn,
            DynobjLogLevel::DynobjLogInfo => LevelFilter::Info,
            DynobjLogLevel::DynobjLogDebug => LevelFilter::Debug,
            DynobjLogLevel::DynobjLogTrace => LevelFilter::Trace,
        }
    }
}

/// Filter directive for `level` on the dynobj targets.
fn default_filter(level: DynobjLogLevel) -> String {
    let level = LevelFilter::from(level).as_str().to_ascii_lowercase();
    format!("warn,dynobj={level},dynobj_c={level}")
}

fn install(builder: &mut env_logger::Builder) -> DynobjError {
    match builder.format_timestamp_millis().try_init() {
        Ok(()) => DynobjError::DynobjOk,
        Err(_) => DynobjError::DynobjOperationFailed, // Already initialized
    }
}

/// Initialize logging for the dynobj targets
///
/// `RUST_LOG`, when set, replaces the default filter.
///
/// # Safety
/// Must be called from a single thread during initialization.
///
/// # Returns
/// `DynobjError::DynobjOk` on success, `DynobjError::DynobjOperationFailed` if a
/// logger is already installed
///
/// # Example (C)
/// ```c
/// dynobj_logging_init(DYNOBJ_LOG_DEBUG);
/// ```
#[no_mangle]
pub unsafe extern "C" fn dynobj_logging_init(level: DynobjLogLevel) -> DynobjError {
    let env = env_logger::Env::default().default_filter_or(default_filter(level));
    install(&mut env_logger::Builder::from_env(env))
}

/// Initialize logging with an explicit filter, ignoring `RUST_LOG`
///
/// # Safety
/// - `filter` must be a valid null-terminated C string or NULL.
///
/// # Returns
/// `DynobjError::DynobjInvalidArgument` for NULL, non-UTF-8 or blank filters
///
/// # Example (C)
/// ```c
/// dynobj_logging_init_with_filter("dynobj::dispatch=trace,info");
/// ```
#[no_mangle]
pub unsafe extern "C" fn dynobj_logging_init_with_filter(filter: *const c_char) -> DynobjError {
    if filter.is_null() {
        return DynobjError::DynobjInvalidArgument;
    }
    let Ok(filter) = CStr::from_ptr(filter).to_str() else {
        return DynobjError::DynobjInvalidArgument;
    };
    if filter.trim().is_empty() {
        return DynobjError::DynobjInvalidArgument;
    }

    install(env_logger::Builder::new().parse_filters(filter))
}
