pub mod cache;
pub mod config;
pub mod error;
pub mod os_version;
pub mod pin;
pub mod plugin;
pub mod shortcut;
#[cfg_attr(not(windows), allow(dead_code))]
mod utils;

#[cfg(windows)]
mod com;
#[cfg(windows)]
pub mod nsis;
#[cfg(windows)]
pub mod registry;
#[cfg(windows)]
pub mod taskband;

pub use error::{CoreError, CoreResult};

#[cfg(windows)]
#[allow(non_snake_case)]
mod exports {
    use std::ffi::c_void;

    use windows::Win32::Foundation::HWND;

    use crate::{
        config::TASKBAR_PIN_FAIL,
        nsis::{PluginStack, StackEntry},
        plugin::{clear_cache, set_shortcut_app_id, taskbar_pin, taskbar_unpin},
    };

    /// `ClearCache <image name>`
    #[no_mangle]
    pub unsafe extern "C" fn ClearCache(
        _hwnd_parent: HWND,
        string_size: i32,
        _variables: *mut u16,
        stacktop: *mut *mut StackEntry,
        _extra: *mut c_void,
    ) {
        let mut stack = PluginStack::new(string_size, stacktop);
        match stack.pop_string() {
            Some(image_name) => clear_cache(&image_name),
            None => log::warn!("ClearCache called without an image name"),
        }
    }

    /// Older installer scripts call the cache sweep by this name.
    #[no_mangle]
    pub unsafe extern "C" fn Clear(
        hwnd_parent: HWND,
        string_size: i32,
        variables: *mut u16,
        stacktop: *mut *mut StackEntry,
        extra: *mut c_void,
    ) {
        ClearCache(hwnd_parent, string_size, variables, stacktop, extra)
    }

    /// `TaskbarPin <path>` pushes 42, 31, or the shell verb's result.
    #[no_mangle]
    pub unsafe extern "C" fn TaskbarPin(
        _hwnd_parent: HWND,
        string_size: i32,
        _variables: *mut u16,
        stacktop: *mut *mut StackEntry,
        _extra: *mut c_void,
    ) {
        let mut stack = PluginStack::new(string_size, stacktop);
        let code = match stack.pop_string() {
            Some(path) => taskbar_pin(&path),
            None => TASKBAR_PIN_FAIL,
        };
        stack.push_int(code);
    }

    /// `TaskbarUnpin <path>` pushes the shell verb's result.
    #[no_mangle]
    pub unsafe extern "C" fn TaskbarUnpin(
        _hwnd_parent: HWND,
        string_size: i32,
        _variables: *mut u16,
        stacktop: *mut *mut StackEntry,
        _extra: *mut c_void,
    ) {
        let mut stack = PluginStack::new(string_size, stacktop);
        let code = match stack.pop_string() {
            Some(path) => taskbar_unpin(&path),
            None => 0,
        };
        stack.push_int(code);
    }

    /// `SetShortcutAppId <shortcut> <app id>`
    #[no_mangle]
    pub unsafe extern "C" fn SetShortcutAppId(
        _hwnd_parent: HWND,
        string_size: i32,
        _variables: *mut u16,
        stacktop: *mut *mut StackEntry,
        _extra: *mut c_void,
    ) {
        let mut stack = PluginStack::new(string_size, stacktop);
        let (Some(shortcut), Some(app_id)) = (stack.pop_string(), stack.pop_string()) else {
            log::warn!("SetShortcutAppId needs a shortcut path and an app id");
            return;
        };
        if let Err(err) = set_shortcut_app_id(&shortcut, &app_id) {
            log::warn!("failed to stamp app id on {shortcut:?}: {err}");
        }
    }

    #[no_mangle]
    pub unsafe extern "C" fn SetLnkAppId(
        hwnd_parent: HWND,
        string_size: i32,
        variables: *mut u16,
        stacktop: *mut *mut StackEntry,
        extra: *mut c_void,
    ) {
        SetShortcutAppId(hwnd_parent, string_size, variables, stacktop, extra)
    }
}
