use std::io;

use windows::{
    core::PWSTR,
    Win32::{
        Foundation::{ERROR_NO_MORE_ITEMS, ERROR_SUCCESS},
        System::Registry::{RegEnumValueW, HKEY},
    },
};
use winreg::{
    enums::{HKEY_CLASSES_ROOT, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, KEY_READ, KEY_WRITE},
    RegKey,
};

use crate::{
    cache::{CacheHive, ValueTable},
    config::{CacheLocation, Hive},
    error::{CoreError, CoreResult},
    utils::string_from_wide,
};

// Longest value name the registry allows, in characters.
const MAX_VALUE_NAME: usize = 16383;

/// Opens cache keys from the predefined registry hives.
pub struct RegistryHive;

impl CacheHive for RegistryHive {
    type Table = CacheKey;

    fn open_read_write(&self, location: &CacheLocation) -> CoreResult<CacheKey> {
        let root = RegKey::predef(predef_for(location.hive));
        let key = root
            .open_subkey_with_flags(&location.sub_path, KEY_READ | KEY_WRITE)
            .map_err(|err| match err.kind() {
                io::ErrorKind::NotFound => CoreError::NotFound(location.sub_path.clone()),
                _ => CoreError::Io(err),
            })?;
        Ok(CacheKey { key })
    }
}

fn predef_for(hive: Hive) -> winreg::HKEY {
    match hive {
        Hive::ClassesRoot => HKEY_CLASSES_ROOT,
        Hive::CurrentUser => HKEY_CURRENT_USER,
        Hive::LocalMachine => HKEY_LOCAL_MACHINE,
    }
}

/// One open cache key. Closed when dropped.
pub struct CacheKey {
    key: RegKey,
}

impl ValueTable for CacheKey {
    fn value_count(&self) -> CoreResult<u32> {
        let info = self.key.query_info()?;
        Ok(info.values)
    }

    fn value_name(&self, index: u32) -> CoreResult<String> {
        let mut buffer = vec![0u16; MAX_VALUE_NAME + 1];
        let mut len = buffer.len() as u32;
        let status = unsafe {
            RegEnumValueW(
                HKEY(self.key.raw_handle()),
                index,
                PWSTR(buffer.as_mut_ptr()),
                &mut len,
                None,
                None,
                None,
                None,
            )
        };

        if status == ERROR_NO_MORE_ITEMS {
            return Err(CoreError::NotFound(format!("cache value #{index}")));
        }
        if status != ERROR_SUCCESS {
            return Err(CoreError::Failed(format!(
                "RegEnumValueW #{index} failed (code {})",
                status.0
            )));
        }

        buffer.truncate(len as usize);
        Ok(string_from_wide(&buffer))
    }

    fn delete_value(&self, name: &str) -> CoreResult<()> {
        self.key.delete_value(name)?;
        Ok(())
    }
}
