//! Operations behind the exported entry points, in the shape the installer
//! script expects: string in, integer (or nothing) out.

use crate::{
    cache::{purge_matching, CacheHive},
    config::{default_cache_locations, TASKBAR_PIN_FAIL, TASKBAR_PIN_OK},
    error::CoreResult,
};

/// Sweeps every default cache location for values naming `image_name`.
pub fn clear_cache_in<H: CacheHive>(hive: &H, image_name: &str) -> usize {
    default_cache_locations()
        .iter()
        .map(|location| purge_matching(hive, location, image_name))
        .sum()
}

/// Maps a pin attempt onto the result code pushed back to the installer.
/// `Unavailable` hands over to the shell verb.
pub fn pin_result_code(result: CoreResult<()>, verb_fallback: impl FnOnce() -> i32) -> i32 {
    match result {
        Ok(()) => TASKBAR_PIN_OK,
        Err(err) if err.is_unavailable() => {
            log::warn!("{err}, falling back to the taskbarpin verb");
            verb_fallback()
        }
        Err(err) => {
            log::warn!("taskbar pin failed: {err}");
            TASKBAR_PIN_FAIL
        }
    }
}

#[cfg(windows)]
pub use self::native::*;

#[cfg(windows)]
mod native {
    use std::path::Path;

    use crate::{
        config::{VERB_TASKBAR_PIN, VERB_TASKBAR_UNPIN},
        error::CoreResult,
        os_version::supports_pinned_list,
        pin::PinAction,
        registry::RegistryHive,
        shortcut::set_shortcut_app_id as stamp_app_id,
        taskband::{invoke_shell_verb, taskbar_set_pin_state},
    };

    use super::{clear_cache_in, pin_result_code};

    pub fn clear_cache(image_name: &str) {
        let purged = clear_cache_in(&RegistryHive, image_name);
        log::debug!("cleared {purged} cache value(s) for {image_name:?}");
    }

    pub fn taskbar_pin(path: &str) -> i32 {
        if !supports_pinned_list() {
            return invoke_shell_verb(VERB_TASKBAR_PIN, path);
        }
        pin_result_code(taskbar_set_pin_state(path, PinAction::Pin), || {
            invoke_shell_verb(VERB_TASKBAR_PIN, path)
        })
    }

    pub fn taskbar_unpin(path: &str) -> i32 {
        invoke_shell_verb(VERB_TASKBAR_UNPIN, path)
    }

    pub fn set_shortcut_app_id(shortcut: &str, app_id: &str) -> CoreResult<()> {
        stamp_app_id(Path::new(shortcut), app_id)
    }
}
