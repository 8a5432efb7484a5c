use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

/// Run a trigger callback, turning a panic into `None`.
///
/// The engine keeps processing later triggers and events either way.
pub(crate) fn guarded<T>(trigger_id: &str, stage: &'static str, f: impl FnOnce() -> T) -> Option<T> {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(value) => Some(value),
        Err(payload) => {
            tracing::error!(
                trigger = trigger_id,
                stage,
                panic = %panic_message(payload.as_ref()),
                "Trigger callback panicked"
            );
            None
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "Unknown panic".to_string())
}
