mod host;
mod state;

use chrono::{DateTime, NaiveDateTime};
use decision_lab_core::curriculum::CurriculumRepository;
use decision_lab_core::schedule;
use decision_lab_core::{load_or_generate, CurriculumConfig, CurriculumYear, Rubric};

use host::{LOG_INFO, LOG_WARN};
use state::Runtime;

// Return codes shared by the exports. Non-negative values mean success.
const ERR_UTF8: i32 = -1;
const ERR_PARSE: i32 = -2;
const ERR_INVALID: i32 = -3;
const ERR_NOT_INITIALIZED: i32 = -4;
const ERR_GENERATION: i32 = -5;
const ERR_STORAGE: i32 = -6;
const ERR_NO_YEAR: i32 = -7;
const ERR_NO_RUBRIC: i32 = -8;
const ERR_TIME: i32 = -9;

// ── Helper: read string from WASM memory ─────────────────────────────

fn read_str(ptr: *const u8, len: u32) -> Option<&'static str> {
    let bytes = unsafe { std::slice::from_raw_parts(ptr, len as usize) };
    std::str::from_utf8(bytes).ok()
}

/// Host clocks pass local wall-clock milliseconds since the Unix epoch.
fn local_time(now_ms: f64) -> Option<NaiveDateTime> {
    if !now_ms.is_finite() {
        return None;
    }
    DateTime::from_timestamp_millis(now_ms as i64).map(|dt| dt.naive_utc())
}

/// Store `message` in the result buffer and hand back `code`.
fn fail(rt: &mut Runtime, code: i32, message: String) -> i32 {
    host::log(LOG_WARN, &message);
    rt.result_buffer = message;
    code
}

/// Store a JSON result and return its byte length.
fn succeed<T: serde::Serialize>(rt: &mut Runtime, value: &T) -> i32 {
    match serde_json::to_string(value) {
        Ok(json) => {
            rt.result_buffer = json;
            rt.result_buffer.len() as i32
        }
        Err(e) => fail(rt, ERR_PARSE, e.to_string()),
    }
}

/// Run an export body against the runtime, needing a year and a clock.
fn with_year_at(now_ms: f64, f: impl FnOnce(&mut Runtime, NaiveDateTime) -> i32) -> i32 {
    state::with(|rt| {
        let Some(now) = local_time(now_ms) else {
            return fail(rt, ERR_TIME, format!("invalid time {now_ms}"));
        };
        if rt.year.is_none() {
            return fail(rt, ERR_NO_YEAR, "no curriculum year loaded".to_string());
        }
        f(rt, now)
    })
    .unwrap_or(ERR_NOT_INITIALIZED)
}

// ── LIFECYCLE EXPORTS ────────────────────────────────────────────────

/// Initialize the runtime with a JSON curriculum config.
/// Returns 0 on success, negative on error.
#[unsafe(no_mangle)]
pub extern "C" fn dl_init(config_ptr: *const u8, config_len: u32) -> i32 {
    let config_str = match read_str(config_ptr, config_len) {
        Some(s) => s,
        None => return ERR_UTF8,
    };

    let config = match CurriculumConfig::from_json(config_str) {
        Ok(c) => c,
        Err(_) => return ERR_PARSE,
    };

    if config.validate().is_err() {
        return ERR_INVALID;
    }

    state::init(config);
    host::log(LOG_INFO, "decision-lab: runtime initialized");
    0
}

// ── MEMORY MANAGEMENT ────────────────────────────────────────────────

/// Allocate memory in WASM linear memory (for host to write into).
#[unsafe(no_mangle)]
pub extern "C" fn dl_alloc(size: u32) -> *mut u8 {
    match std::alloc::Layout::from_size_align(size.max(1) as usize, 1) {
        Ok(layout) => unsafe { std::alloc::alloc(layout) },
        Err(_) => std::ptr::null_mut(),
    }
}

/// Deallocate memory in WASM linear memory.
#[unsafe(no_mangle)]
pub extern "C" fn dl_dealloc(ptr: *mut u8, size: u32) {
    if ptr.is_null() {
        return;
    }
    if let Ok(layout) = std::alloc::Layout::from_size_align(size.max(1) as usize, 1) {
        unsafe { std::alloc::dealloc(ptr, layout) }
    }
}

// ── CATALOG ──────────────────────────────────────────────────────────

/// Load the scoring rubric. Returns 0 on success.
#[unsafe(no_mangle)]
pub extern "C" fn dl_load_rubric(json_ptr: *const u8, json_len: u32) -> i32 {
    let Some(json) = read_str(json_ptr, json_len) else {
        return ERR_UTF8;
    };
    state::with(|rt| match Rubric::from_json(json) {
        Ok(rubric) => {
            host::log(
                LOG_INFO,
                &format!("decision-lab: rubric loaded with {} criteria", rubric.criteria.len()),
            );
            rt.rubric = Some(rubric);
            0
        }
        Err(e) => fail(rt, ERR_INVALID, e.to_string()),
    })
    .unwrap_or(ERR_NOT_INITIALIZED)
}

/// Install a serialized year and persist it. Returns 0 on success.
#[unsafe(no_mangle)]
pub extern "C" fn dl_load_year(json_ptr: *const u8, json_len: u32) -> i32 {
    let Some(json) = read_str(json_ptr, json_len) else {
        return ERR_UTF8;
    };
    state::with(|rt| {
        let year = match CurriculumYear::from_json(json) {
            Ok(year) => year,
            Err(e) => return fail(rt, ERR_PARSE, e.to_string()),
        };
        if let Err(e) = year.validate() {
            return fail(rt, ERR_INVALID, e.to_string());
        }
        if let Err(e) = rt.repo.save(&year) {
            return fail(rt, ERR_STORAGE, e.to_string());
        }
        rt.year = Some(year);
        0
    })
    .unwrap_or(ERR_NOT_INITIALIZED)
}

/// Reuse the stored year or generate its replacement.
/// Returns the number of weeks in the active year, negative on error.
#[unsafe(no_mangle)]
pub extern "C" fn dl_refresh(now_ms: f64) -> i32 {
    state::with(|rt| {
        let Some(now) = local_time(now_ms) else {
            return fail(rt, ERR_TIME, format!("invalid time {now_ms}"));
        };
        match load_or_generate(&mut rt.repo, now, &rt.config) {
            Ok(year) => {
                let weeks = year.week_count() as i32;
                rt.result_buffer = year.id.clone();
                rt.year = Some(year);
                weeks
            }
            Err(decision_lab_core::curriculum::CurriculumError::Repository(e)) => {
                fail(rt, ERR_STORAGE, e.to_string())
            }
            Err(e) => fail(rt, ERR_GENERATION, e.to_string()),
        }
    })
    .unwrap_or(ERR_NOT_INITIALIZED)
}

// ── SCHEDULE ─────────────────────────────────────────────────────────

/// Current week's scenarios as JSON. Returns bytes in the result buffer.
#[unsafe(no_mangle)]
pub extern "C" fn dl_current_week(now_ms: f64) -> i32 {
    with_year_at(now_ms, |rt, now| {
        let Some(year) = rt.year.as_ref() else {
            return ERR_NO_YEAR;
        };
        let week = schedule::current_week(year, now);
        let value = serde_json::json!({
            "week": week,
            "weekStart": schedule::week_start(year, week),
            "scenarios": year.week(week),
        });
        succeed(rt, &value)
    })
}

/// Today's scenario as JSON, `null` outside the year.
#[unsafe(no_mangle)]
pub extern "C" fn dl_today(now_ms: f64) -> i32 {
    with_year_at(now_ms, |rt, now| {
        let Some(year) = rt.year.as_ref() else {
            return ERR_NO_YEAR;
        };
        let today = schedule::today_scenario(year, now).cloned();
        succeed(rt, &today)
    })
}

/// Month-grouped unlock preview of the whole year as JSON.
#[unsafe(no_mangle)]
pub extern "C" fn dl_preview(now_ms: f64) -> i32 {
    with_year_at(now_ms, |rt, now| {
        let Some(year) = rt.year.as_ref() else {
            return ERR_NO_YEAR;
        };
        let months = schedule::month_preview(year, now);
        succeed(rt, &months)
    })
}

// ── SCORING ──────────────────────────────────────────────────────────

/// Score a justification against the loaded rubric.
/// Returns bytes of the JSON result, negative on error.
#[unsafe(no_mangle)]
pub extern "C" fn dl_score(text_ptr: *const u8, text_len: u32) -> i32 {
    let Some(text) = read_str(text_ptr, text_len) else {
        return ERR_UTF8;
    };
    state::with(|rt| {
        let Some(rubric) = rt.rubric.as_ref() else {
            return fail(rt, ERR_NO_RUBRIC, "no rubric loaded".to_string());
        };
        let result = rubric.score(text);
        succeed(rt, &result)
    })
    .unwrap_or(ERR_NOT_INITIALIZED)
}

// ── RESULT BUFFER ────────────────────────────────────────────────────

/// Byte length of the result buffer.
#[unsafe(no_mangle)]
pub extern "C" fn dl_result_len() -> u32 {
    state::with(|rt| rt.result_buffer.len() as u32).unwrap_or(0)
}

/// Copy the result buffer into host memory. Returns bytes written.
#[unsafe(no_mangle)]
pub extern "C" fn dl_result_read(out_ptr: *mut u8, max_len: u32) -> u32 {
    state::with(|rt| {
        let bytes = rt.result_buffer.as_bytes();
        let copy_len = bytes.len().min(max_len as usize);
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), out_ptr, copy_len);
        }
        copy_len as u32
    })
    .unwrap_or(0)
}

// ── TESTS ────────────────────────────────────────────────────────────
