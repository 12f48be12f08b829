//! Global WASM state — singleton runtime holding the config, rubric and year.
//!
//! WASM is single-threaded; a thread-local keeps each native test thread
//! on its own runtime.

use std::cell::RefCell;

use decision_lab_core::curriculum::KeyValueRepository;
use decision_lab_core::{CurriculumConfig, CurriculumYear, Rubric};

use crate::host::HostStore;

/// The complete runtime state.
pub struct Runtime {
    pub config: CurriculumConfig,
    pub repo: KeyValueRepository<HostStore>,
    pub rubric: Option<Rubric>,
    pub year: Option<CurriculumYear>,
    /// JSON buffer for the last result (week slice, score, error message).
    pub result_buffer: String,
}

thread_local! {
    static RUNTIME: RefCell<Option<Runtime>> = const { RefCell::new(None) };
}

/// Initialize the global runtime. Replaces any existing runtime.
pub fn init(config: CurriculumConfig) {
    let rt = Runtime {
        repo: KeyValueRepository::new(HostStore, config.storage_key.clone()),
        config,
        rubric: None,
        year: None,
        result_buffer: String::new(),
    };
    RUNTIME.with(|cell| *cell.borrow_mut() = Some(rt));
}

/// Run `f` against the runtime. `None` when `dl_init` has not been called.
pub fn with<R>(f: impl FnOnce(&mut Runtime) -> R) -> Option<R> {
    RUNTIME.with(|cell| cell.borrow_mut().as_mut().map(f))
}
