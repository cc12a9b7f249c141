use crate::config::PINNED_LIST_MIN_BUILD;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtVersion {
    pub major: u32,
    pub minor: u32,
    pub build: u32,
}

impl NtVersion {
    /// `RtlGetNtVersionNumbers` reports the build with checked/free flags in
    /// the high byte.
    pub fn from_raw(major: u32, minor: u32, raw_build: u32) -> Self {
        Self {
            major,
            minor,
            build: raw_build & 0x00FF_FFFF,
        }
    }

    pub fn has_pinned_list(&self) -> bool {
        self.build >= PINNED_LIST_MIN_BUILD
    }
}

#[cfg(windows)]
mod probe {
    use once_cell::sync::Lazy;
    use windows::{
        core::{s, w},
        Win32::System::LibraryLoader::{GetModuleHandleW, GetProcAddress},
    };

    use super::NtVersion;
    use crate::error::{CoreError, CoreResult};

    type RtlGetNtVersionNumbers = unsafe extern "system" fn(*mut u32, *mut u32, *mut u32);

    static NT_VERSION: Lazy<Option<NtVersion>> = Lazy::new(|| match query_nt_version() {
        Ok(version) => {
            log::debug!("running on NT {}.{} build {}", version.major, version.minor, version.build);
            Some(version)
        }
        Err(err) => {
            log::warn!("cannot probe the OS version: {err}");
            None
        }
    });

    pub fn current() -> Option<NtVersion> {
        *NT_VERSION
    }

    fn query_nt_version() -> CoreResult<NtVersion> {
        unsafe {
            let ntdll = GetModuleHandleW(w!("ntdll.dll"))
                .map_err(|err| CoreError::failed("GetModuleHandleW(ntdll.dll)", err))?;
            let proc = GetProcAddress(ntdll, s!("RtlGetNtVersionNumbers"))
                .ok_or_else(|| CoreError::from_win32("GetProcAddress(RtlGetNtVersionNumbers)"))?;
            let query: RtlGetNtVersionNumbers = std::mem::transmute(proc);

            let (mut major, mut minor, mut build) = (0u32, 0u32, 0u32);
            query(&mut major, &mut minor, &mut build);
            Ok(NtVersion::from_raw(major, minor, build))
        }
    }
}

/// Version of the running kernel, probed once per process.
#[cfg(windows)]
pub fn current() -> Option<NtVersion> {
    probe::current()
}

/// Whether the running OS ships the pinned-list component. False when the
/// version cannot be probed.
#[cfg(windows)]
pub fn supports_pinned_list() -> bool {
    current().is_some_and(|version| version.has_pinned_list())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_flags_are_masked_off() {
        let version = NtVersion::from_raw(10, 0, 0xF000_4A65);
        assert_eq!(version.build, 19045);
        assert!(version.has_pinned_list());
    }

    #[test]
    fn windows_8_1_lacks_pinned_list() {
        assert!(!NtVersion::from_raw(6, 3, 9600).has_pinned_list());
    }

    #[test]
    fn first_windows_10_build_has_pinned_list() {
        assert!(NtVersion::from_raw(10, 0, 10240).has_pinned_list());
    }

    #[cfg(windows)]
    #[test]
    fn running_kernel_is_probed_once() {
        let version = current().unwrap();
        assert!(version.major >= 6);
        assert_eq!(current(), Some(version));
    }
}
