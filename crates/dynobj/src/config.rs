// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Global configuration - single source of truth for wire constants.
//!
//! # Architecture
//!
//! - **Level 1 (Static)**: compile-time constants (signature tokens, separators, limits)
//! - **Level 2 (Dynamic)**: [`RuntimeConfig`] holding the [`DispatchConfig`] read on every call
//!
//! The dispatch path only ever loads the config through an `ArcSwap`, so
//! swapping it at runtime never blocks a worker thread.
//!
//! ```
//! use dynobj::config::{DispatchConfig, RuntimeConfig};
//!
//! let config = RuntimeConfig::new();
//! config.set_dispatch(DispatchConfig {
//!     log_panics: false,
//!     ..DispatchConfig::default()
//! });
//! assert!(!config.dispatch().log_panics);
//! ```

use arc_swap::ArcSwap;
use std::sync::{Arc, OnceLock};

// =======================================================================
// Signature vocabulary (wire contract, must stay byte-identical)
// =======================================================================

pub const SIG_VOID: u8 = b'v';
pub const SIG_BOOL: u8 = b'b';
pub const SIG_INT8: u8 = b'c';
pub const SIG_UINT8: u8 = b'C';
pub const SIG_INT16: u8 = b'w';
pub const SIG_UINT16: u8 = b'W';
pub const SIG_INT32: u8 = b'i';
pub const SIG_UINT32: u8 = b'I';
pub const SIG_INT64: u8 = b'l';
pub const SIG_UINT64: u8 = b'L';
pub const SIG_FLOAT: u8 = b'f';
pub const SIG_DOUBLE: u8 = b'd';
pub const SIG_STRING: u8 = b's';
pub const SIG_DYNAMIC: u8 = b'm';
pub const SIG_OBJECT: u8 = b'o';
pub const SIG_LIST_BEGIN: u8 = b'[';
pub const SIG_LIST_END: u8 = b']';
pub const SIG_MAP_BEGIN: u8 = b'{';
pub const SIG_MAP_END: u8 = b'}';
pub const SIG_TUPLE_BEGIN: u8 = b'(';
pub const SIG_TUPLE_END: u8 = b')';

/// Separator between a method name and its parameter envelope (`echo::(s)`).
pub const METHOD_SEPARATOR: &str = "::";

/// Separator between the return signature and the method signature in the
/// complete form used by foreign registrations (`s echo::(s)`).
pub const COMPLETE_SEPARATOR: char = ' ';

// =======================================================================
// Limits
// =======================================================================

/// Default upper bound on an incoming argument buffer (64 MiB).
pub const DEFAULT_MAX_ARGUMENT_BYTES: usize = 64 * 1024 * 1024;

/// Maximum container nesting accepted by the signature parser and the codec.
pub const MAX_NESTING_DEPTH: usize = 32;

// =======================================================================
// Runtime configuration
// =======================================================================

/// Settings read by the dispatch pipeline and the conversion engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchConfig {
    /// Argument buffers larger than this are rejected with `BadArguments`.
    pub max_argument_bytes: usize,
    /// Log a warning when a method panics. The panic is always turned into
    /// `MethodFailed`.
    pub log_panics: bool,
    /// Log a warning when the dynamic fallback conversion fails.
    pub warn_on_fallback: bool,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            max_argument_bytes: DEFAULT_MAX_ARGUMENT_BYTES,
            log_panics: true,
            warn_on_fallback: true,
        }
    }
}

/// Runtime configuration store.
pub struct RuntimeConfig {
    dispatch: ArcSwap<DispatchConfig>,
}

impl RuntimeConfig {
    #[must_use]
    pub fn new() -> Self {
        Self::with_dispatch(DispatchConfig::default())
    }

    #[must_use]
    pub fn with_dispatch(dispatch: DispatchConfig) -> Self {
        Self {
            dispatch: ArcSwap::from_pointee(dispatch),
        }
    }

    /// Process-wide configuration used by [`crate::dispatch::meta_call`].
    pub fn global() -> &'static RuntimeConfig {
        static GLOBAL: OnceLock<RuntimeConfig> = OnceLock::new();
        GLOBAL.get_or_init(RuntimeConfig::new)
    }

    /// Current dispatch settings (lock-free snapshot).
    pub fn dispatch(&self) -> Arc<DispatchConfig> {
        self.dispatch.load_full()
    }

    /// Replace the dispatch settings; in-flight calls keep their snapshot.
    pub fn set_dispatch(&self, dispatch: DispatchConfig) {
        log::debug!("dispatch config updated: {:?}", dispatch);
        self.dispatch.store(Arc::new(dispatch));
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_dispatch_config() {
        let config = RuntimeConfig::new();
        let dispatch = config.dispatch();
        assert_eq!(dispatch.max_argument_bytes, DEFAULT_MAX_ARGUMENT_BYTES);
        assert!(dispatch.log_panics);
        assert!(dispatch.warn_on_fallback);
    }

    #[test]
    fn test_swap_keeps_old_snapshot() {
        let config = RuntimeConfig::new();
        let before = config.dispatch();
        config.set_dispatch(DispatchConfig {
            max_argument_bytes: 16,
            ..DispatchConfig::default()
        });
        assert_eq!(before.max_argument_bytes, DEFAULT_MAX_ARGUMENT_BYTES);
        assert_eq!(config.dispatch().max_argument_bytes, 16);
    }
}
