use windows::{
    core::HRESULT,
    Win32::{
        Foundation::RPC_E_CHANGED_MODE,
        System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED},
    },
};

use crate::error::{CoreError, CoreResult};

/// Apartment membership for one exported call.
///
/// Each plugin entry point that creates shell objects enters a scope before
/// the first COM call and leaves it on return to the installer, so nothing
/// COM-related outlives the call. All COM objects created inside the scope
/// must be dropped before the scope itself.
pub struct ComScope {
    owns_apartment: bool,
}

impl ComScope {
    /// Joins a single-threaded apartment. A thread the host already placed in
    /// a multithreaded apartment is used as is and left alone on exit.
    pub fn enter() -> CoreResult<Self> {
        let hr = unsafe { CoInitializeEx(None, COINIT_APARTMENTTHREADED) };
        Self::from_init_result(hr)
    }

    fn from_init_result(hr: HRESULT) -> CoreResult<Self> {
        if hr.is_ok() {
            // S_FALSE still takes a reference that has to be balanced
            return Ok(Self { owns_apartment: true });
        }
        if hr == RPC_E_CHANGED_MODE {
            log::debug!("thread already in a multithreaded apartment");
            return Ok(Self { owns_apartment: false });
        }
        Err(CoreError::Failed(format!("CoInitializeEx failed: {hr}")))
    }
}

impl Drop for ComScope {
    fn drop(&mut self) {
        if self.owns_apartment {
            unsafe { CoUninitialize() };
        }
    }
}
