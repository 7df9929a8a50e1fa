//! C FFI bindings for hue-core
//!
//! The in-game hook copies the game's line table into a session, calls
//! `hue_session_apply`, then copies the lines and language map back.

use hue_core::bundled::LANGUAGE;
use hue_core::logging::{init_file_logging, LOG_FILE_NAME};
use hue_core::{subtitle_language_index, Applied, Config, HostTables, Localizer};
use std::collections::HashMap;
use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::{fs, ptr};
use tracing::{debug, error};

/// `hue_session_apply` result when nothing was done
pub const HUE_APPLY_FAILED: i64 = -1;

/// `hue_session_apply` result when the translation was already active
pub const HUE_APPLY_ALREADY_ACTIVE: i64 = -2;

/// Opaque handle to the game state of one language switch
pub struct FfiSession {
    lines: Vec<String>,
    selected_language: String,
    language_columns: HashMap<String, usize>,
}

unsafe fn to_str<'a>(s: *const c_char) -> Option<&'a str> {
    if s.is_null() {
        None
    } else {
        CStr::from_ptr(s).to_str().ok()
    }
}

fn into_c_string(s: &str) -> *mut c_char {
    CString::new(s)
        .map(|s| s.into_raw())
        .unwrap_or(ptr::null_mut())
}

fn start_logging(dir: &Path, config: &Config) {
    static LOGGING: Once = Once::new();
    LOGGING.call_once(|| {
        let _ = fs::create_dir_all(dir);
        if let Err(e) = init_file_logging(&dir.join(LOG_FILE_NAME), &config.log_level) {
            eprintln!("HueZh: {}", e);
        }
    });
}

/// Create a session for the game's currently selected language
///
/// # Safety
/// - `selected_language` must be a valid C string or null
/// - Free the session with `hue_session_free`
#[no_mangle]
pub unsafe extern "C" fn hue_session_new(selected_language: *const c_char) -> *mut FfiSession {
    let selected_language = to_str(selected_language).unwrap_or_default().to_string();
    Box::into_raw(Box::new(FfiSession {
        lines: Vec::new(),
        selected_language,
        language_columns: HashMap::new(),
    }))
}

/// Free a session
///
/// # Safety
/// - `session` must be a valid pointer returned by `hue_session_new` or null
#[no_mangle]
pub unsafe extern "C" fn hue_session_free(session: *mut FfiSession) {
    if !session.is_null() {
        drop(Box::from_raw(session));
    }
}

/// Append one raw line of the game's line table
///
/// # Safety
/// - `session` must be a valid pointer returned by `hue_session_new`
/// - `line` must be a valid UTF-8 C string
/// - Returns false if either argument is invalid
#[no_mangle]
pub unsafe extern "C" fn hue_session_push_line(
    session: *mut FfiSession,
    line: *const c_char,
) -> bool {
    if session.is_null() {
        return false;
    }
    let session = &mut *session;
    match to_str(line) {
        Some(line) => {
            session.lines.push(line.to_string());
            true
        }
        None => false,
    }
}

/// Record that `language` is shown from column `index`
///
/// # Safety
/// - `session` must be a valid pointer returned by `hue_session_new`
/// - `language` must be a valid UTF-8 C string
#[no_mangle]
pub unsafe extern "C" fn hue_session_set_language_column(
    session: *mut FfiSession,
    language: *const c_char,
    index: usize,
) -> bool {
    if session.is_null() {
        return false;
    }
    let session = &mut *session;
    match to_str(language) {
        Some(language) => {
            session.language_columns.insert(language.to_string(), index);
            true
        }
        None => false,
    }
}

/// Install the translation kept in `data_dir`
///
/// Returns the number of lines translated, [`HUE_APPLY_ALREADY_ACTIVE`]
/// if the translation was already active, or [`HUE_APPLY_FAILED`] if
/// nothing was done. Never unwinds.
///
/// # Safety
/// - `session` must be a valid pointer returned by `hue_session_new`
/// - `data_dir` must be a valid UTF-8 C string
#[no_mangle]
pub unsafe extern "C" fn hue_session_apply(
    session: *mut FfiSession,
    data_dir: *const c_char,
) -> i64 {
    if session.is_null() {
        return HUE_APPLY_FAILED;
    }
    let dir = match to_str(data_dir) {
        Some(dir) => PathBuf::from(dir),
        None => return HUE_APPLY_FAILED,
    };

    let session = &mut *session;
    let applied = panic::catch_unwind(AssertUnwindSafe(|| {
        let localizer = Localizer::from_data_dir(&dir);
        start_logging(&dir, localizer.config());
        localizer.apply(HostTables {
            lines: &mut session.lines,
            selected_language: &mut session.selected_language,
            language_columns: &mut session.language_columns,
        })
    }));

    let code = match applied {
        Ok(Some(Applied::Merged(report))) => report.updated as i64,
        Ok(Some(Applied::AlreadyActive)) => HUE_APPLY_ALREADY_ACTIVE,
        Ok(None) => HUE_APPLY_FAILED,
        Err(_) => {
            error!("Language hook setup panicked");
            HUE_APPLY_FAILED
        }
    };
    debug!("hue_session_apply returns {}", code);
    code
}

/// Get the number of lines in a session
///
/// # Safety
/// - `session` must be a valid pointer returned by `hue_session_new`
#[no_mangle]
pub unsafe extern "C" fn hue_session_line_count(session: *const FfiSession) -> usize {
    if session.is_null() {
        return 0;
    }
    let session = &*session;
    session.lines.len()
}

/// Get a line by index
///
/// # Safety
/// - `session` must be a valid pointer returned by `hue_session_new`
/// - Returns null if index is out of bounds
/// - Caller must free the returned string with `hue_free_string`
#[no_mangle]
pub unsafe extern "C" fn hue_session_line(session: *const FfiSession, index: usize) -> *mut c_char {
    if session.is_null() {
        return ptr::null_mut();
    }
    let session = &*session;
    session
        .lines
        .get(index)
        .map(|line| into_c_string(line))
        .unwrap_or(ptr::null_mut())
}

/// Get the selected language name
///
/// # Safety
/// - `session` must be a valid pointer returned by `hue_session_new`
/// - Caller must free the returned string with `hue_free_string`
#[no_mangle]
pub unsafe extern "C" fn hue_session_selected_language(session: *const FfiSession) -> *mut c_char {
    if session.is_null() {
        return ptr::null_mut();
    }
    let session = &*session;
    into_c_string(&session.selected_language)
}

/// Get the column shown for `language`, or -1 if it has none
///
/// # Safety
/// - `session` must be a valid pointer returned by `hue_session_new`
/// - `language` must be a valid UTF-8 C string
#[no_mangle]
pub unsafe extern "C" fn hue_session_language_column(
    session: *const FfiSession,
    language: *const c_char,
) -> isize {
    if session.is_null() {
        return -1;
    }
    let session = &*session;
    to_str(language)
        .and_then(|language| session.language_columns.get(language))
        .map(|&index| index as isize)
        .unwrap_or(-1)
}

/// Column the subtitle table must read for the configured column mode
///
/// # Safety
/// - `data_dir` must be a valid UTF-8 C string or null for the default directory
#[no_mangle]
pub unsafe extern "C" fn hue_subtitle_language_index(data_dir: *const c_char) -> usize {
    let dir = to_str(data_dir)
        .map(PathBuf::from)
        .unwrap_or_else(hue_core::config::default_data_dir);
    let config = Config::load_or_create(dir.join(Config::FILE_NAME));
    subtitle_language_index(config.column_mode)
}

/// Name of the language this library installs
#[no_mangle]
pub extern "C" fn hue_language() -> *mut c_char {
    into_c_string(LANGUAGE)
}

/// Free a string returned by other FFI functions
///
/// # Safety
/// - `s` must be a valid pointer returned by a hue_* function or null
#[no_mangle]
pub unsafe extern "C" fn hue_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(s: &str) -> CString {
        CString::new(s).unwrap()
    }

    unsafe fn take(s: *mut c_char) -> String {
        let text = CStr::from_ptr(s).to_str().unwrap().to_string();
        hue_free_string(s);
        text
    }

    #[test]
    fn test_session_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let dir_c = c(dir.path().to_str().unwrap());

        unsafe {
            let session = hue_session_new(c("english").as_ptr());
            for line in ["Column,english", "Menu_NewGame,New Game", "Menu_Quit,Quit", "Odd,Thing"] {
                assert!(hue_session_push_line(session, c(line).as_ptr()));
            }
            assert!(hue_session_set_language_column(session, c("english").as_ptr(), 1));

            assert_eq!(hue_session_apply(session, dir_c.as_ptr()), 2);
            assert_eq!(hue_session_line_count(session), 4);
            assert_eq!(take(hue_session_line(session, 0)), "Column,chinese");
            assert_eq!(take(hue_session_line(session, 3)), "Odd,Thing");
            assert!(hue_session_line(session, 4).is_null());
            assert_eq!(take(hue_session_selected_language(session)), "chinese");
            assert_eq!(hue_session_language_column(session, c("chinese").as_ptr()), 1);
            assert_eq!(hue_session_language_column(session, c("english").as_ptr()), -1);

            // Second switch to the same language only reselects the column
            assert_eq!(
                hue_session_apply(session, dir_c.as_ptr()),
                HUE_APPLY_ALREADY_ACTIVE
            );

            hue_session_free(session);
        }
    }

    #[test]
    fn test_null_arguments_are_rejected() {
        unsafe {
            assert!(!hue_session_push_line(ptr::null_mut(), c("x").as_ptr()));
            assert_eq!(hue_session_apply(ptr::null_mut(), ptr::null()), HUE_APPLY_FAILED);
            assert_eq!(hue_session_line_count(ptr::null()), 0);

            let session = hue_session_new(ptr::null());
            assert!(!hue_session_push_line(session, ptr::null()));
            assert_eq!(hue_session_apply(session, ptr::null()), HUE_APPLY_FAILED);
            hue_session_free(session);
        }
    }

    #[test]
    fn test_subtitle_index_follows_config() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config {
            column_mode: hue_core::ColumnMode::Append,
            ..Config::default()
        };
        config.save(dir.path().join(Config::FILE_NAME)).unwrap();

        let dir_c = c(dir.path().to_str().unwrap());
        assert_eq!(unsafe { hue_subtitle_language_index(dir_c.as_ptr()) }, 2);
        assert_eq!(take_language(), LANGUAGE);
    }

    #[test]
    fn test_merge_with_nothing_translated_is_not_already_active() {
        let dir = tempfile::tempdir().unwrap();
        let dir_c = c(dir.path().to_str().unwrap());

        unsafe {
            let session = hue_session_new(c("english").as_ptr());
            for line in ["Column,english", "Odd,Thing"] {
                assert!(hue_session_push_line(session, c(line).as_ptr()));
            }

            assert_eq!(hue_session_apply(session, dir_c.as_ptr()), 0);
            assert_eq!(take(hue_session_line(session, 0)), "Column,chinese");
            assert_eq!(take(hue_session_selected_language(session)), "chinese");

            hue_session_free(session);
        }
    }

    fn take_language() -> String {
        unsafe { take(hue_language()) }
    }
}
