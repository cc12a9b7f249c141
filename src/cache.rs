use crate::config::CacheLocation;
use crate::error::CoreResult;

/// Index-addressed view of the values under one open registry key.
///
/// Deleting a value shifts every later index down by one.
pub trait ValueTable {
    fn value_count(&self) -> CoreResult<u32>;
    fn value_name(&self, index: u32) -> CoreResult<String>;
    fn delete_value(&self, name: &str) -> CoreResult<()>;
}

/// Opens cache keys for read+write. An absent key reports `CoreError::NotFound`.
pub trait CacheHive {
    type Table: ValueTable;

    fn open_read_write(&self, location: &CacheLocation) -> CoreResult<Self::Table>;
}

/// Deletes every value under `location` whose name contains `substring`
/// (case-sensitive). Best-effort: failures are logged and swallowed. Returns
/// the number of values deleted.
pub fn purge_matching<H: CacheHive>(hive: &H, location: &CacheLocation, substring: &str) -> usize {
    if substring.is_empty() {
        log::debug!("empty cache substring, nothing to purge");
        return 0;
    }

    let table = match hive.open_read_write(location) {
        Ok(table) => table,
        Err(err) if err.is_not_found() => {
            log::debug!("cache key {:?} absent, nothing to purge", location.sub_path);
            return 0;
        }
        Err(err) => {
            log::warn!("failed to open cache key {:?}: {err}", location.sub_path);
            return 0;
        }
    };

    let deleted = purge_values(&table, substring);
    drop(table);
    log::debug!(
        "purged {deleted} value(s) matching {substring:?} from {:?}",
        location.sub_path
    );
    deleted
}

/// Index-stable sweep over an open table. The count is read once; after a
/// deletion the index stays put and the local count shrinks by one.
pub fn purge_values<T: ValueTable>(table: &T, substring: &str) -> usize {
    let mut remaining = match table.value_count() {
        Ok(count) => count,
        Err(err) => {
            log::warn!("failed to query cache value count: {err}");
            return 0;
        }
    };

    let mut deleted = 0;
    let mut index = 0;
    while index < remaining {
        let name = match table.value_name(index) {
            Ok(name) => name,
            Err(err) => {
                log::trace!("skip cache value #{index}: {err}");
                index += 1;
                continue;
            }
        };

        if name.contains(substring) {
            match table.delete_value(&name) {
                Ok(()) => deleted += 1,
                Err(err) => log::warn!("failed to delete cache value {name:?}: {err}"),
            }
            remaining -= 1;
            continue;
        }

        index += 1;
    }

    deleted
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};

    use super::*;
    use crate::config::{Hive, MUI_CACHE_PATH};
    use crate::error::CoreError;

    struct MemoryTable {
        values: RefCell<Vec<String>>,
        unreadable: Vec<u32>,
        open: Option<std::rc::Rc<Cell<i32>>>,
    }

    impl MemoryTable {
        fn with_values(names: &[&str]) -> Self {
            Self {
                values: RefCell::new(names.iter().map(|name| name.to_string()).collect()),
                unreadable: Vec::new(),
                open: None,
            }
        }

        fn names(&self) -> Vec<String> {
            self.values.borrow().clone()
        }
    }

    impl ValueTable for MemoryTable {
        fn value_count(&self) -> CoreResult<u32> {
            Ok(self.values.borrow().len() as u32)
        }

        fn value_name(&self, index: u32) -> CoreResult<String> {
            if self.unreadable.contains(&index) {
                return Err(CoreError::Failed(format!("enum value {index}")));
            }
            self.values
                .borrow()
                .get(index as usize)
                .cloned()
                .ok_or_else(|| CoreError::NotFound(format!("value #{index}")))
        }

        fn delete_value(&self, name: &str) -> CoreResult<()> {
            let mut values = self.values.borrow_mut();
            let position = values
                .iter()
                .position(|value| value == name)
                .ok_or_else(|| CoreError::NotFound(name.to_string()))?;
            values.remove(position);
            Ok(())
        }
    }

    impl Drop for MemoryTable {
        fn drop(&mut self) {
            if let Some(open) = &self.open {
                open.set(open.get() - 1);
            }
        }
    }

    struct MemoryHive {
        keys: RefCell<Vec<(String, Vec<String>)>>,
        open: std::rc::Rc<Cell<i32>>,
    }

    impl CacheHive for MemoryHive {
        type Table = MemoryTable;

        fn open_read_write(&self, location: &CacheLocation) -> CoreResult<MemoryTable> {
            let keys = self.keys.borrow();
            let (_, names) = keys
                .iter()
                .find(|(path, _)| path == &location.sub_path)
                .ok_or_else(|| CoreError::NotFound(location.sub_path.clone()))?;
            self.open.set(self.open.get() + 1);
            Ok(MemoryTable {
                values: RefCell::new(names.clone()),
                unreadable: Vec::new(),
                open: Some(self.open.clone()),
            })
        }
    }

    fn mui_location() -> CacheLocation {
        CacheLocation {
            hive: Hive::ClassesRoot,
            sub_path: MUI_CACHE_PATH.to_string(),
        }
    }

    #[test]
    fn adjacent_matches_are_all_deleted() {
        let table = MemoryTable::with_values(&[
            "C:\\app\\app.exe.FriendlyAppName",
            "C:\\app\\app.exe.ApplicationCompany",
            "C:\\other\\tool.exe.FriendlyAppName",
            "C:\\app\\app.exe.Extra",
        ]);

        let deleted = purge_values(&table, "app.exe");

        assert_eq!(deleted, 3);
        assert_eq!(table.names(), vec!["C:\\other\\tool.exe.FriendlyAppName"]);
    }

    #[test]
    fn survivors_keep_their_relative_order() {
        let names = ["a1", "xb", "a2", "xc", "xd", "a3", "x"];
        let table = MemoryTable::with_values(&names);

        let deleted = purge_values(&table, "x");

        assert_eq!(deleted, 4);
        assert_eq!(table.names(), vec!["a1", "a2", "a3"]);
    }

    #[test]
    fn leaves_n_minus_k_values_none_matching() {
        for stride in 1..5usize {
            let names: Vec<String> = (0..17)
                .map(|i| if i % stride == 0 { format!("hit-{i}") } else { format!("keep-{i}") })
                .collect();
            let refs: Vec<&str> = names.iter().map(String::as_str).collect();
            let expected: Vec<String> = names.iter().filter(|n| !n.contains("hit")).cloned().collect();
            let table = MemoryTable::with_values(&refs);

            let deleted = purge_values(&table, "hit");

            assert_eq!(deleted, names.len() - expected.len());
            assert_eq!(table.names(), expected);
        }
    }

    #[test]
    fn match_is_case_sensitive() {
        let table = MemoryTable::with_values(&["APP.EXE", "app.exe"]);

        assert_eq!(purge_values(&table, "app.exe"), 1);
        assert_eq!(table.names(), vec!["APP.EXE"]);
    }

    #[test]
    fn unreadable_entries_are_skipped() {
        let table = MemoryTable {
            values: RefCell::new(vec!["app.exe".into(), "app.exe.2".into(), "keep".into()]),
            unreadable: vec![0],
            open: None,
        };

        let deleted = purge_values(&table, "app.exe");

        assert_eq!(deleted, 1);
        assert_eq!(table.names(), vec!["app.exe", "keep"]);
    }

    #[test]
    fn missing_key_is_a_silent_no_op() {
        let hive = MemoryHive {
            keys: RefCell::new(Vec::new()),
            open: Default::default(),
        };

        assert_eq!(purge_matching(&hive, &mui_location(), "app.exe"), 0);
        assert_eq!(hive.open.get(), 0);
    }

    #[test]
    fn key_is_closed_after_sweep() {
        let hive = MemoryHive {
            keys: RefCell::new(vec![(
                MUI_CACHE_PATH.to_string(),
                vec!["C:\\app.exe.FriendlyAppName".into()],
            )]),
            open: Default::default(),
        };

        assert_eq!(purge_matching(&hive, &mui_location(), "app.exe"), 1);
        assert_eq!(hive.open.get(), 0);
    }

    #[test]
    fn empty_substring_deletes_nothing() {
        let hive = MemoryHive {
            keys: RefCell::new(vec![(MUI_CACHE_PATH.to_string(), vec!["anything".into()])]),
            open: Default::default(),
        };

        assert_eq!(purge_matching(&hive, &mui_location(), ""), 0);
    }
}
