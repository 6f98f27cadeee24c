//! Progress callbacks
//!
//! The library reports each workflow step through [`ProgressCallback`] so
//! front ends (CLI, GUI, tests) decide how steps are shown.

use std::sync::Arc;
use std::sync::atomic::{AtomicI32, Ordering};

/// State of a step when it starts
#[derive(Debug, Clone)]
pub struct ProgressInfo {
    /// Step number, formatted as hex
    pub prefix: String,
    pub message: String,
}

/// Implement this trait to display workflow steps
pub trait ProgressCallback: Send + Sync {
    /// Start a new step and return its id
    fn start(&self, info: ProgressInfo) -> ProgressId;

    fn update_message(&self, id: ProgressId, message: String);

    /// Finish a step; `final_message` is `"Aborted"` when the step failed
    fn finish(&self, id: ProgressId, final_message: String);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ProgressId(pub u64);

/// Callback that shows nothing
#[derive(Debug, Default)]
pub struct NoOpProgressCallback;

impl ProgressCallback for NoOpProgressCallback {
    fn start(&self, _info: ProgressInfo) -> ProgressId {
        ProgressId(0)
    }

    fn update_message(&self, _id: ProgressId, _message: String) {}

    fn finish(&self, _id: ProgressId, _final_message: String) {}
}

pub type ProgressCallbackArc = Arc<dyn ProgressCallback>;

pub fn no_op_progress_callback() -> ProgressCallbackArc {
    Arc::new(NoOpProgressCallback)
}

/// Numbers steps and hands out [`ProgressHandler`]s
pub struct ProgressHelper {
    callback: ProgressCallbackArc,
    step_counter: AtomicI32,
}

impl ProgressHelper {
    pub fn new(callback: ProgressCallbackArc, initial_step: i32) -> Self {
        Self {
            callback,
            step_counter: AtomicI32::new(initial_step),
        }
    }

    fn next_step(&self) -> i32 {
        self.step_counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn create_spinner(&self, message: impl Into<String>) -> ProgressHandler {
        let step = self.next_step();
        let info = ProgressInfo {
            prefix: format!("0x{:02X}", step),
            message: message.into(),
        };
        let id = self.callback.start(info);
        ProgressHandler {
            callback: Arc::clone(&self.callback),
            id,
        }
    }

    /// Run `f` as one step, finishing the spinner with `done` or `"Aborted"`.
    pub fn run_step<T, E>(
        &self,
        message: impl Into<String>,
        f: impl FnOnce(&ProgressHandler) -> Result<T, E>,
        done: impl FnOnce(&T) -> String,
    ) -> Result<T, E> {
        let handler = self.create_spinner(message);
        match f(&handler) {
            Ok(value) => {
                let message = done(&value);
                handler.finish_with_message(message);
                Ok(value)
            }
            Err(e) => {
                handler.finish_with_message("Aborted");
                Err(e)
            }
        }
    }
}

/// Handle to a single running step
pub struct ProgressHandler {
    callback: ProgressCallbackArc,
    id: ProgressId,
}

impl ProgressHandler {
    pub fn set_message(&self, message: impl Into<String>) {
        self.callback.update_message(self.id, message.into());
    }

    pub fn finish_with_message(self, message: impl Into<String>) {
        self.callback.finish(self.id, message.into());
    }
}
