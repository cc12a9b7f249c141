//! The installer's plugin calling convention: arguments arrive on a linked
//! stack of fixed-size UTF-16 strings and results are pushed back the same way.

use std::{mem::size_of, ptr};

use windows::Win32::{
    Foundation::{GlobalFree, HGLOBAL},
    System::Memory::{GlobalAlloc, GPTR},
};

use crate::error::{CoreError, CoreResult};

/// One node of the host's string stack. `text` is really `string_size` units long.
#[repr(C)]
pub struct StackEntry {
    next: *mut StackEntry,
    text: [u16; 1],
}

pub struct PluginStack {
    string_size: usize,
    top: *mut *mut StackEntry,
}

impl PluginStack {
    /// # Safety
    /// `top` must be the stack pointer the host passed to the export, valid for
    /// the duration of the call.
    pub unsafe fn new(string_size: i32, top: *mut *mut StackEntry) -> Self {
        Self {
            string_size: string_size.max(0) as usize,
            top,
        }
    }

    pub fn pop_string(&mut self) -> Option<String> {
        unsafe {
            if self.top.is_null() || (*self.top).is_null() {
                return None;
            }

            let entry = *self.top;
            let text = ptr::addr_of!((*entry).text) as *const u16;
            let mut len = 0;
            while len < self.string_size && *text.add(len) != 0 {
                len += 1;
            }
            let value = String::from_utf16_lossy(std::slice::from_raw_parts(text, len));

            *self.top = (*entry).next;
            let _ = GlobalFree(HGLOBAL(entry.cast()));
            Some(value)
        }
    }

    pub fn push_string(&mut self, value: &str) -> CoreResult<()> {
        if self.top.is_null() || self.string_size == 0 {
            return Err(CoreError::InvalidInput("plugin stack unavailable".into()));
        }

        unsafe {
            let bytes = size_of::<StackEntry>() + self.string_size * size_of::<u16>();
            let memory = GlobalAlloc(GPTR, bytes)
                .map_err(|err| CoreError::failed("GlobalAlloc stack entry", err))?;
            let entry = memory.0 as *mut StackEntry;

            // GPTR zero-fills, so the copy stays NUL-terminated
            let text = ptr::addr_of_mut!((*entry).text) as *mut u16;
            for (i, unit) in value.encode_utf16().take(self.string_size - 1).enumerate() {
                *text.add(i) = unit;
            }

            (*entry).next = *self.top;
            *self.top = entry;
        }
        Ok(())
    }

    pub fn push_int(&mut self, value: i32) {
        if let Err(err) = self.push_string(&value.to_string()) {
            log::warn!("failed to push result {value}: {err}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::ptr;

    use super::*;

    #[test]
    fn values_pop_in_reverse_push_order() {
        let mut top: *mut StackEntry = ptr::null_mut();
        let mut stack = unsafe { PluginStack::new(1024, &mut top) };

        stack.push_int(42);
        stack.push_string("C:\\Users\\me\\Desktop\\App.lnk").unwrap();

        assert_eq!(stack.pop_string().as_deref(), Some("C:\\Users\\me\\Desktop\\App.lnk"));
        assert_eq!(stack.pop_string().as_deref(), Some("42"));
        assert_eq!(stack.pop_string(), None);
        assert!(top.is_null());
    }

    #[test]
    fn pushed_strings_are_cut_to_the_host_size() {
        let mut top: *mut StackEntry = ptr::null_mut();
        let mut stack = unsafe { PluginStack::new(4, &mut top) };

        stack.push_string("abcdef").unwrap();
        assert_eq!(stack.pop_string().as_deref(), Some("abc"));
    }

    #[test]
    fn missing_stack_rejects_pushes() {
        let mut stack = unsafe { PluginStack::new(1024, ptr::null_mut()) };
        assert!(stack.push_string("31").is_err());
        assert_eq!(stack.pop_string(), None);
    }
}
