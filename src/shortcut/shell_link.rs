use std::{ffi::c_void, path::Path, ptr};

use windows::{
    core::{Interface, GUID, HSTRING, PCWSTR, PROPVARIANT},
    Win32::{
        Foundation::MAX_PATH,
        System::Com::{
            CoCreateInstance, CoTaskMemFree, IPersistFile,
            StructuredStorage::{PropVariantClear, PropVariantToStringAlloc},
            CLSCTX_INPROC_SERVER, STGM, STGM_READ, STGM_READWRITE,
        },
        UI::Shell::{
            IShellLinkW,
            PropertiesSystem::{IPropertyStore, PROPERTYKEY},
            SHChangeNotify, ShellLink, SHCNE_ASSOCCHANGED, SHCNE_CREATE, SHCNF_IDLIST, SHCNF_PATH,
            SLGP_RAWPATH,
        },
    },
};

use super::{
    apply_properties, read_shortcut, AccessMode, LinkSession, PropertyStore, ShellChange,
    ShellLinkHost, ShortcutProperties, ShortcutSnapshot,
};
use crate::{
    com::ComScope,
    config::PropertyKey,
    error::{CoreError, CoreResult},
    utils::{string_from_wide, wide_path},
};

// GetArguments truncates silently to the buffer it is given, so read with
// room for the longest command line the shell accepts.
const MAX_ARGUMENTS: usize = 32768;

/// `IShellLinkW` plus the `IPersistFile` queried from it.
pub struct ShellLinkSession {
    // released before the link it was queried from
    persist: IPersistFile,
    link: IShellLinkW,
}

impl ShellLinkSession {
    fn create() -> CoreResult<Self> {
        unsafe {
            let link: IShellLinkW = CoCreateInstance(&ShellLink, None, CLSCTX_INPROC_SERVER)
                .map_err(|err| CoreError::failed("CoCreateInstance(IShellLinkW)", err))?;
            let persist: IPersistFile = link
                .cast()
                .map_err(|err| CoreError::failed("QueryInterface(IPersistFile)", err))?;
            Ok(Self { persist, link })
        }
    }

    fn load(path: &Path, mode: STGM) -> CoreResult<Self> {
        let session = Self::create()?;
        let wide = wide_path(path);
        unsafe { session.persist.Load(PCWSTR(wide.as_ptr()), mode) }
            .map_err(|err| CoreError::InvalidInput(format!("cannot load {path:?}: {err}")))?;
        Ok(session)
    }
}

fn hstring(value: &str) -> HSTRING {
    HSTRING::from(value)
}

impl LinkSession for ShellLinkSession {
    type Store = LinkPropertyStore;

    fn target(&self) -> CoreResult<String> {
        let mut buffer = [0u16; MAX_PATH as usize];
        unsafe {
            self.link
                .GetPath(&mut buffer, ptr::null_mut(), SLGP_RAWPATH.0 as u32)
        }
        .map_err(|err| CoreError::failed("IShellLinkW::GetPath", err))?;
        Ok(string_from_wide(&buffer))
    }

    fn set_target(&self, target: &str) -> CoreResult<()> {
        unsafe { self.link.SetPath(&hstring(target)) }
            .map_err(|err| CoreError::failed("IShellLinkW::SetPath", err))
    }

    fn set_working_dir(&self, working_dir: &str) -> CoreResult<()> {
        unsafe { self.link.SetWorkingDirectory(&hstring(working_dir)) }
            .map_err(|err| CoreError::failed("IShellLinkW::SetWorkingDirectory", err))
    }

    fn arguments(&self) -> CoreResult<String> {
        let mut buffer = vec![0u16; MAX_ARGUMENTS];
        unsafe { self.link.GetArguments(&mut buffer) }
            .map_err(|err| CoreError::failed("IShellLinkW::GetArguments", err))?;
        Ok(string_from_wide(&buffer))
    }

    fn set_arguments(&self, arguments: &str) -> CoreResult<()> {
        unsafe { self.link.SetArguments(&hstring(arguments)) }
            .map_err(|err| CoreError::failed("IShellLinkW::SetArguments", err))
    }

    fn set_description(&self, description: &str) -> CoreResult<()> {
        unsafe { self.link.SetDescription(&hstring(description)) }
            .map_err(|err| CoreError::failed("IShellLinkW::SetDescription", err))
    }

    fn set_icon(&self, icon: &str, index: i32) -> CoreResult<()> {
        unsafe { self.link.SetIconLocation(&hstring(icon), index) }
            .map_err(|err| CoreError::failed("IShellLinkW::SetIconLocation", err))
    }

    fn property_store(&self) -> CoreResult<LinkPropertyStore> {
        let store: IPropertyStore = self
            .link
            .cast()
            .map_err(|err| CoreError::failed("QueryInterface(IPropertyStore)", err))?;
        Ok(LinkPropertyStore(store))
    }

    fn save(&self, path: &Path) -> CoreResult<()> {
        let wide = wide_path(path);
        unsafe { self.persist.Save(PCWSTR(wide.as_ptr()), true) }
            .map_err(|err| CoreError::InvalidInput(format!("cannot save {path:?}: {err}")))
    }
}

pub struct LinkPropertyStore(IPropertyStore);

fn property_key(key: &PropertyKey) -> PROPERTYKEY {
    PROPERTYKEY {
        fmtid: GUID::from_u128(key.fmtid),
        pid: key.pid,
    }
}

impl PropertyStore for LinkPropertyStore {
    fn set_string(&self, key: &PropertyKey, value: &str) -> CoreResult<()> {
        let key = property_key(key);
        let mut variant = PROPVARIANT::from(value);
        let result = unsafe { self.0.SetValue(&key, &variant) };
        unsafe {
            let _ = PropVariantClear(&mut variant);
        }
        result.map_err(|err| CoreError::failed("IPropertyStore::SetValue", err))
    }

    fn string(&self, key: &PropertyKey) -> CoreResult<Option<String>> {
        let key = property_key(key);
        unsafe {
            let mut variant = self
                .0
                .GetValue(&key)
                .map_err(|err| CoreError::failed("IPropertyStore::GetValue", err))?;
            let text = PropVariantToStringAlloc(&variant);
            let _ = PropVariantClear(&mut variant);

            let text = text.map_err(|err| CoreError::failed("PropVariantToStringAlloc", err))?;
            let value = text.to_string();
            CoTaskMemFree(Some(text.0 as *const c_void));

            let value = value.map_err(|err| CoreError::Other(anyhow::anyhow!("property is not UTF-16: {err}")))?;
            Ok(Some(value).filter(|value| !value.is_empty()))
        }
    }

    fn commit(&self) -> CoreResult<()> {
        unsafe { self.0.Commit() }.map_err(|err| CoreError::failed("IPropertyStore::Commit", err))
    }
}

/// The live shell's link objects. COM must already be initialized on the
/// calling thread.
pub struct ShellLinks;

impl ShellLinkHost for ShellLinks {
    type Session = ShellLinkSession;

    fn create_session(&self) -> CoreResult<ShellLinkSession> {
        ShellLinkSession::create()
    }

    fn load_session(&self, path: &Path, mode: AccessMode) -> CoreResult<ShellLinkSession> {
        let mode = match mode {
            AccessMode::Read => STGM_READ,
            AccessMode::ReadWrite => STGM_READWRITE,
        };
        ShellLinkSession::load(path, mode)
    }

    fn notify(&self, change: ShellChange, path: &Path) {
        unsafe {
            match change {
                // TODO: try SHCNE_UPDATEITEM on the link path instead of a full broadcast
                ShellChange::Updated => SHChangeNotify(SHCNE_ASSOCCHANGED, SHCNF_IDLIST, None, None),
                ShellChange::Created => {
                    let wide = wide_path(path);
                    SHChangeNotify(SHCNE_CREATE, SHCNF_PATH, Some(wide.as_ptr() as *const c_void), None);
                }
            }
        }
    }
}

/// Applies `properties` to the shortcut at `shortcut` inside a COM scope.
pub fn write_shortcut(shortcut: &Path, properties: &ShortcutProperties) -> CoreResult<()> {
    let _com = ComScope::enter()?;
    apply_properties(&ShellLinks, shortcut, properties)
}

/// Stamps `app_id` onto the shortcut at `shortcut`, creating the shortcut if
/// it does not exist.
pub fn set_shortcut_app_id(shortcut: &Path, app_id: &str) -> CoreResult<()> {
    let mut properties = ShortcutProperties::new();
    properties.set_app_id(app_id);
    write_shortcut(shortcut, &properties)
}

pub fn read_shortcut_file(shortcut: &Path) -> CoreResult<ShortcutSnapshot> {
    let _com = ComScope::enter()?;
    read_shortcut(&ShellLinks, shortcut)
}
