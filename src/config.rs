//! Fixed locations and constants the plugin operates on. Nothing here is read
//! from the environment.

/// Registry hive holding a cache location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hive {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheLocation {
    pub hive: Hive,
    pub sub_path: String,
}

pub const MUI_CACHE_PATH: &str = "Local Settings\\Software\\Microsoft\\Windows\\Shell\\MuiCache";

pub fn default_cache_locations() -> Vec<CacheLocation> {
    // UFH\SHC under HKCU and the firewall rules under HKLM also key on the
    // image name, but clearing them needs elevation or a user SID.
    vec![CacheLocation {
        hive: Hive::ClassesRoot,
        sub_path: MUI_CACHE_PATH.to_string(),
    }]
}

/// Pushed back by `TaskbarPin` when the pinned-list component accepted the call.
pub const TASKBAR_PIN_OK: i32 = 42;
/// Pushed back by `TaskbarPin` when the pinned-list component rejected the call.
pub const TASKBAR_PIN_FAIL: i32 = 31;

/// First Windows 10 build; older builds lack the pinned-list component.
pub const PINNED_LIST_MIN_BUILD: u32 = 10240;

pub const VERB_TASKBAR_PIN: &str = "taskbarpin";
pub const VERB_TASKBAR_UNPIN: &str = "taskbarunpin";

/// Context tag for the pinned-list mutate call: the desktop shell's view.
pub const PLMC_EXPLORER: i32 = 4;

/// Identifies one property in a shell property store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PropertyKey {
    pub fmtid: u128,
    pub pid: u32,
}

/// `System.AppUserModel.ID`
pub const PKEY_APP_USER_MODEL_ID: PropertyKey = PropertyKey {
    fmtid: 0x9F4C2855_9F79_4B39_A8D0_E1D42DE1D5F3,
    pid: 5,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mui_cache_is_the_only_default_location() {
        let locations = default_cache_locations();
        assert_eq!(locations.len(), 1);
        assert_eq!(locations[0].hive, Hive::ClassesRoot);
        assert!(locations[0].sub_path.ends_with("\\Shell\\MuiCache"));
    }

    #[test]
    fn pin_sentinels_differ() {
        assert_ne!(TASKBAR_PIN_OK, TASKBAR_PIN_FAIL);
    }
}
