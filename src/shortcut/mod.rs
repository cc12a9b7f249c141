//! Creating and updating `.lnk` files through the shell's link object.

#[cfg(windows)]
mod shell_link;

#[cfg(windows)]
pub use shell_link::{
    read_shortcut_file, set_shortcut_app_id, write_shortcut, LinkPropertyStore, ShellLinkSession, ShellLinks,
};

use std::{
    ops::{BitOr, BitOrAssign},
    path::Path,
};

use crate::{
    config::{PropertyKey, PKEY_APP_USER_MODEL_ID},
    error::CoreResult,
};

/// Set of shortcut properties present in a [`ShortcutProperties`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ShortcutFields(u32);

impl ShortcutFields {
    pub const TARGET: Self = Self(1 << 0);
    pub const WORKING_DIR: Self = Self(1 << 1);
    pub const ARGUMENTS: Self = Self(1 << 2);
    pub const DESCRIPTION: Self = Self(1 << 3);
    pub const ICON: Self = Self(1 << 4);
    pub const APP_ID: Self = Self(1 << 5);
    pub const ALL: Self = Self(0b11_1111);

    pub const fn empty() -> Self {
        Self(0)
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for ShortcutFields {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for ShortcutFields {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

/// Desired state of a shortcut. Only fields raised through a setter are
/// written; the getters return `None` for everything else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutProperties {
    target: String,
    working_dir: String,
    arguments: String,
    description: String,
    icon: String,
    icon_index: i32,
    app_id: String,
    fields: ShortcutFields,
}

impl ShortcutProperties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_target(&mut self, target: impl Into<String>) -> &mut Self {
        self.target = target.into();
        self.fields |= ShortcutFields::TARGET;
        self
    }

    pub fn set_working_dir(&mut self, working_dir: impl Into<String>) -> &mut Self {
        self.working_dir = working_dir.into();
        self.fields |= ShortcutFields::WORKING_DIR;
        self
    }

    pub fn set_arguments(&mut self, arguments: impl Into<String>) -> &mut Self {
        self.arguments = arguments.into();
        self.fields |= ShortcutFields::ARGUMENTS;
        self
    }

    /// Callers keep this within the shell's tooltip limit (`INFOTIPSIZE`).
    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = description.into();
        self.fields |= ShortcutFields::DESCRIPTION;
        self
    }

    pub fn set_icon(&mut self, icon: impl Into<String>, index: i32) -> &mut Self {
        self.icon = icon.into();
        self.icon_index = index;
        self.fields |= ShortcutFields::ICON;
        self
    }

    pub fn set_app_id(&mut self, app_id: impl Into<String>) -> &mut Self {
        self.app_id = app_id.into();
        self.fields |= ShortcutFields::APP_ID;
        self
    }

    pub fn fields(&self) -> ShortcutFields {
        self.fields
    }

    pub fn has(&self, field: ShortcutFields) -> bool {
        self.fields.contains(field)
    }

    pub fn target(&self) -> Option<&str> {
        self.present(ShortcutFields::TARGET, &self.target)
    }

    pub fn working_dir(&self) -> Option<&str> {
        self.present(ShortcutFields::WORKING_DIR, &self.working_dir)
    }

    pub fn arguments(&self) -> Option<&str> {
        self.present(ShortcutFields::ARGUMENTS, &self.arguments)
    }

    pub fn description(&self) -> Option<&str> {
        self.present(ShortcutFields::DESCRIPTION, &self.description)
    }

    pub fn icon(&self) -> Option<(&str, i32)> {
        self.present(ShortcutFields::ICON, &self.icon)
            .map(|icon| (icon, self.icon_index))
    }

    pub fn app_id(&self) -> Option<&str> {
        self.present(ShortcutFields::APP_ID, &self.app_id)
    }

    fn present<'a>(&self, field: ShortcutFields, value: &'a str) -> Option<&'a str> {
        self.has(field).then_some(value)
    }
}

/// Generic property store exposed by a link object.
pub trait PropertyStore {
    fn set_string(&self, key: &PropertyKey, value: &str) -> CoreResult<()>;
    fn string(&self, key: &PropertyKey) -> CoreResult<Option<String>>;
    fn commit(&self) -> CoreResult<()>;
}

/// A link object paired with its persistence capability. Both are released
/// when the session drops.
pub trait LinkSession {
    type Store: PropertyStore;

    fn target(&self) -> CoreResult<String>;
    fn set_target(&self, target: &str) -> CoreResult<()>;
    fn set_working_dir(&self, working_dir: &str) -> CoreResult<()>;
    fn arguments(&self) -> CoreResult<String>;
    fn set_arguments(&self, arguments: &str) -> CoreResult<()>;
    fn set_description(&self, description: &str) -> CoreResult<()>;
    fn set_icon(&self, icon: &str, index: i32) -> CoreResult<()>;
    fn property_store(&self) -> CoreResult<Self::Store>;
    fn save(&self, path: &Path) -> CoreResult<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    ReadWrite,
}

/// Shell notification emitted after a successful save.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShellChange {
    Updated,
    Created,
}

pub trait ShellLinkHost {
    type Session: LinkSession;

    fn shortcut_exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    /// A link object not bound to any file.
    fn create_session(&self) -> CoreResult<Self::Session>;

    /// A link object loaded from `path`.
    fn load_session(&self, path: &Path, mode: AccessMode) -> CoreResult<Self::Session>;

    fn notify(&self, change: ShellChange, path: &Path);
}

/// Creates or updates the shortcut at `shortcut_path`. Nothing is saved when
/// any present field fails to apply. Absent arguments are carried over from
/// the existing shortcut.
pub fn apply_properties<H: ShellLinkHost>(
    host: &H,
    shortcut_path: &Path,
    properties: &ShortcutProperties,
) -> CoreResult<()> {
    let existed = host.shortcut_exists(shortcut_path);

    let old_session = if existed {
        match host.load_session(shortcut_path, AccessMode::Read) {
            Ok(session) => Some(session),
            Err(err) => {
                log::warn!("cannot read existing shortcut {shortcut_path:?}, nothing inherited: {err}");
                None
            }
        }
    } else {
        None
    };

    let session = if existed {
        host.load_session(shortcut_path, AccessMode::ReadWrite)?
    } else {
        host.create_session()?
    };

    if let Some(target) = properties.target() {
        session.set_target(target)?;
    }

    if let Some(working_dir) = properties.working_dir() {
        session.set_working_dir(working_dir)?;
    }

    match (properties.arguments(), old_session.as_ref()) {
        (Some(arguments), _) => session.set_arguments(arguments)?,
        (None, Some(old)) => match old.arguments() {
            Ok(current) => {
                if let Err(err) = session.set_arguments(&current) {
                    log::warn!("failed to carry arguments over to {shortcut_path:?}: {err}");
                }
            }
            Err(err) => log::trace!("existing shortcut arguments unreadable: {err}"),
        },
        (None, None) => {}
    }

    if let Some(description) = properties.description() {
        session.set_description(description)?;
    }

    if let Some((icon, index)) = properties.icon() {
        session.set_icon(icon, index)?;
    }

    if let Some(app_id) = properties.app_id() {
        let store = session.property_store()?;
        store.set_string(&PKEY_APP_USER_MODEL_ID, app_id)?;
        store.commit()?;
    }

    // the read handle on the same file must be gone before saving over it
    drop(old_session);

    session.save(shortcut_path)?;
    drop(session);

    let change = if existed {
        ShellChange::Updated
    } else {
        ShellChange::Created
    };
    log::debug!("shortcut {shortcut_path:?} {change:?}");
    host.notify(change, shortcut_path);
    Ok(())
}

/// Fields read back from a shortcut on disk.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShortcutSnapshot {
    pub target: String,
    pub arguments: String,
    pub app_id: Option<String>,
}

pub fn read_shortcut<H: ShellLinkHost>(host: &H, shortcut_path: &Path) -> CoreResult<ShortcutSnapshot> {
    let session = host.load_session(shortcut_path, AccessMode::Read)?;
    let app_id = session.property_store()?.string(&PKEY_APP_USER_MODEL_ID)?;
    Ok(ShortcutSnapshot {
        target: session.target()?,
        arguments: session.arguments()?,
        app_id,
    })
}
