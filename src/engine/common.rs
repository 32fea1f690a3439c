// src/engine/common.rs
//
// Common utilities shared across engine modules.
// Provides unified error handling and the codec panic boundary.

use crate::error::RecompressError;
use std::any::Any;
use std::panic::{catch_unwind, AssertUnwindSafe};

/// Result type used by every engine module.
pub type EngineResult<T> = std::result::Result<T, RecompressError>;

/// Run a codec call, turning a panic into `InternalPanic`.
///
/// mozjpeg reports libjpeg errors by unwinding, so every call into it has to
/// go through here (or [`run_with_panic_as`]).
pub fn run_with_panic_policy<T, F>(stage: &'static str, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T>,
{
    run_with_panic_as(stage, RecompressError::internal_panic, f)
}

/// Like [`run_with_panic_policy`] but lets the caller pick the error a panic
/// becomes, e.g. a decode failure for corrupt input.
pub fn run_with_panic_as<T, F, E>(stage: &'static str, on_panic: E, f: F) -> EngineResult<T>
where
    F: FnOnce() -> EngineResult<T>,
    E: FnOnce(String) -> RecompressError,
{
    match catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => Err(on_panic(format!("{stage}: {}", panic_message(&payload)))),
    }
}

fn panic_message(payload: &Box<dyn Any + Send>) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_panic_becomes_internal_error() {
        let result: EngineResult<()> = run_with_panic_policy("test:stage", || panic!("kaboom"));
        let err = result.unwrap_err();
        assert!(matches!(err, RecompressError::InternalPanic { .. }));
        assert!(err.to_string().contains("test:stage: kaboom"));
    }

    #[test]
    fn test_panic_mapping_is_configurable() {
        let result: EngineResult<()> =
            run_with_panic_as("decode:test", RecompressError::decode_failed, || {
                panic!("{}", String::from("bad huffman table"))
            });
        assert!(matches!(
            result.unwrap_err(),
            RecompressError::DecodeFailed { .. }
        ));
    }

    #[test]
    fn test_ok_and_err_pass_through() {
        assert_eq!(run_with_panic_policy("ok", || Ok(7)).unwrap(), 7);
        let err = run_with_panic_policy::<(), _>("err", || {
            Err(RecompressError::decode_failed("plain error"))
        })
        .unwrap_err();
        assert!(matches!(err, RecompressError::DecodeFailed { .. }));
    }
}
