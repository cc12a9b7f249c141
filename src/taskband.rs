//! Taskbar pinning through the shell's unpublished pinned-list component.
//!
//! The component has no public type library. Its method table is declared by
//! position below: only `Release` (slot 2) and the mutate method (slot 16) are
//! ever called. Every other slot is reserved and must not be invoked.

use std::{ffi::c_void, ptr};

use windows::{
    core::{IUnknown, IUnknown_Vtbl, Interface, GUID, HRESULT, HSTRING, PCWSTR},
    Win32::{
        Foundation::HWND,
        System::Com::{CoCreateInstance, CLSCTX_ALL},
        UI::{
            Shell::{Common::ITEMIDLIST, ILCreateFromPathW, ILFree, ShellExecuteW},
            WindowsAndMessaging::SW_HIDE,
        },
    },
};

use crate::{
    com::ComScope,
    error::{CoreError, CoreResult},
    pin::{set_pin_state, PinAction, PinBackend, PinnedList},
};

pub const CLSID_TASKBAND_PIN: GUID = GUID::from_u128(0x90aa3a4e_1cba_4233_b8bb_535773d48449);
pub const IID_PINNED_LIST3: GUID = GUID::from_u128(0x0dd79ae2_d156_45d4_9eeb_3b549769e940);

#[repr(C)]
struct PinnedListVtbl {
    base: IUnknown_Vtbl,
    // slots 3..=15
    reserved: [*const c_void; 13],
    modify: unsafe extern "system" fn(
        this: *mut c_void,
        unpin: *const ITEMIDLIST,
        pin: *const ITEMIDLIST,
        context: i32,
    ) -> HRESULT,
}

/// Absolute shell identifier list, freed on drop.
pub struct ItemIdList(*mut ITEMIDLIST);

impl ItemIdList {
    pub fn from_path(path: &str) -> CoreResult<Self> {
        let pidl = unsafe { ILCreateFromPathW(&HSTRING::from(path)) };
        if pidl.is_null() {
            return Err(CoreError::InvalidInput(format!("cannot resolve {path:?}")));
        }
        Ok(Self(pidl))
    }

    fn as_ptr(&self) -> *const ITEMIDLIST {
        self.0
    }
}

impl Drop for ItemIdList {
    fn drop(&mut self) {
        unsafe { ILFree(Some(self.0 as *const _)) };
    }
}

/// Owned reference to the pinned-list component. Released on drop.
pub struct PinnedListHandle(*mut c_void);

impl PinnedListHandle {
    fn vtbl(&self) -> &PinnedListVtbl {
        unsafe { &*(*(self.0 as *const *const PinnedListVtbl)) }
    }
}

impl PinnedList for PinnedListHandle {
    type Item = ItemIdList;

    fn modify(&self, unpin: Option<&ItemIdList>, pin: Option<&ItemIdList>, context: i32) -> CoreResult<()> {
        let unpin = unpin.map_or(ptr::null(), ItemIdList::as_ptr);
        let pin = pin.map_or(ptr::null(), ItemIdList::as_ptr);
        let hr = unsafe { (self.vtbl().modify)(self.0, unpin, pin, context) };
        hr.ok()
            .map_err(|err| CoreError::failed("pinned list modify", err))
    }
}

impl Drop for PinnedListHandle {
    fn drop(&mut self) {
        unsafe { (self.vtbl().base.Release)(self.0) };
    }
}

/// Pin backend talking to the live shell. COM must already be initialized on
/// the calling thread.
pub struct TaskbandPin;

impl PinBackend for TaskbandPin {
    type Item = ItemIdList;
    type List = PinnedListHandle;

    fn resolve(&self, path: &str) -> CoreResult<ItemIdList> {
        ItemIdList::from_path(path)
    }

    fn activate(&self) -> CoreResult<PinnedListHandle> {
        let unknown: IUnknown = unsafe { CoCreateInstance(&CLSID_TASKBAND_PIN, None, CLSCTX_ALL) }
            .map_err(|err| CoreError::Unavailable(format!("taskband pin component ({err})")))?;

        let unknown_ptr = unknown.as_raw();
        let unknown_vtbl = unsafe { &*(*(unknown_ptr as *const *const IUnknown_Vtbl)) };
        let mut list: *mut c_void = ptr::null_mut();
        let hr = unsafe { (unknown_vtbl.QueryInterface)(unknown_ptr, &IID_PINNED_LIST3, &mut list) };
        if hr.is_err() || list.is_null() {
            return Err(CoreError::Unavailable(format!("pinned list interface ({hr:?})")));
        }

        Ok(PinnedListHandle(list))
    }
}

/// Pins or unpins `path` inside its own COM scope.
pub fn taskbar_set_pin_state(path: &str, action: PinAction) -> CoreResult<()> {
    let _com = ComScope::enter()?;
    set_pin_state(&TaskbandPin, path, action)
}

/// Runs a shell verb such as `taskbarpin` on `path` and returns the raw
/// `ShellExecuteW` result (greater than 32 on success).
pub fn invoke_shell_verb(verb: &str, path: &str) -> i32 {
    let result = unsafe {
        ShellExecuteW(
            HWND(0),
            &HSTRING::from(verb),
            &HSTRING::from(path),
            PCWSTR::null(),
            PCWSTR::null(),
            SW_HIDE,
        )
    };
    log::debug!("shell verb {verb:?} on {path:?} returned {}", result.0);
    result.0 as i32
}
