use crate::{config::PLMC_EXPLORER, error::CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinAction {
    Pin,
    Unpin,
}

/// A live handle to the taskbar's pinned-items list. Dropping it releases the
/// underlying component.
pub trait PinnedList {
    type Item;

    /// Removes `unpin` and adds `pin`; either side may be absent.
    fn modify(&self, unpin: Option<&Self::Item>, pin: Option<&Self::Item>, context: i32) -> CoreResult<()>;
}

pub trait PinBackend {
    /// Resolved shell identifier for a filesystem path. Freed on drop.
    type Item;
    type List: PinnedList<Item = Self::Item>;

    /// Fails with `CoreError::InvalidInput` when the path cannot be resolved.
    fn resolve(&self, path: &str) -> CoreResult<Self::Item>;

    /// Fails with `CoreError::Unavailable` when the component is absent.
    fn activate(&self) -> CoreResult<Self::List>;
}

/// Pins or unpins `path` with a single mutate call. The list handle and the
/// resolved item are released on every exit path.
pub fn set_pin_state<B: PinBackend>(backend: &B, path: &str, action: PinAction) -> CoreResult<()> {
    let item = backend.resolve(path)?;
    let list = backend.activate()?;

    let result = match action {
        PinAction::Pin => list.modify(None, Some(&item), PLMC_EXPLORER),
        PinAction::Unpin => list.modify(Some(&item), None, PLMC_EXPLORER),
    };

    drop(list);
    drop(item);

    match &result {
        Ok(()) => log::debug!("{action:?} applied to {path:?}"),
        Err(err) => log::debug!("{action:?} of {path:?} rejected: {err}"),
    }
    result
}

#[cfg(test)]
mod tests {
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
    };

    use super::*;
    use crate::error::CoreError;

    #[derive(Default)]
    struct Counters {
        live_lists: Cell<i32>,
        live_items: Cell<i32>,
        activations: Cell<u32>,
        calls: RefCell<Vec<(Option<String>, Option<String>, i32)>>,
    }

    struct FakeItem {
        path: String,
        counters: Rc<Counters>,
    }

    impl Drop for FakeItem {
        fn drop(&mut self) {
            self.counters.live_items.set(self.counters.live_items.get() - 1);
        }
    }

    struct FakeList {
        counters: Rc<Counters>,
        reject: bool,
    }

    impl PinnedList for FakeList {
        type Item = FakeItem;

        fn modify(&self, unpin: Option<&FakeItem>, pin: Option<&FakeItem>, context: i32) -> CoreResult<()> {
            self.counters.calls.borrow_mut().push((
                unpin.map(|item| item.path.clone()),
                pin.map(|item| item.path.clone()),
                context,
            ));
            if self.reject {
                Err(CoreError::Failed("modify rejected".into()))
            } else {
                Ok(())
            }
        }
    }

    impl Drop for FakeList {
        fn drop(&mut self) {
            self.counters.live_lists.set(self.counters.live_lists.get() - 1);
        }
    }

    struct FakeShell {
        counters: Rc<Counters>,
        component_present: bool,
        reject: bool,
    }

    impl FakeShell {
        fn new() -> Self {
            Self {
                counters: Rc::default(),
                component_present: true,
                reject: false,
            }
        }
    }

    impl PinBackend for FakeShell {
        type Item = FakeItem;
        type List = FakeList;

        fn resolve(&self, path: &str) -> CoreResult<FakeItem> {
            if path.is_empty() {
                return Err(CoreError::InvalidInput("empty path".into()));
            }
            self.counters.live_items.set(self.counters.live_items.get() + 1);
            Ok(FakeItem {
                path: path.to_string(),
                counters: self.counters.clone(),
            })
        }

        fn activate(&self) -> CoreResult<FakeList> {
            self.counters.activations.set(self.counters.activations.get() + 1);
            if !self.component_present {
                return Err(CoreError::Unavailable("pinned list".into()));
            }
            self.counters.live_lists.set(self.counters.live_lists.get() + 1);
            Ok(FakeList {
                counters: self.counters.clone(),
                reject: self.reject,
            })
        }
    }

    #[test]
    fn pin_then_unpin_drains_every_handle() {
        let shell = FakeShell::new();
        let path = "C:\\Users\\me\\Desktop\\App.lnk";

        set_pin_state(&shell, path, PinAction::Pin).unwrap();
        set_pin_state(&shell, path, PinAction::Unpin).unwrap();

        assert_eq!(shell.counters.live_lists.get(), 0);
        assert_eq!(shell.counters.live_items.get(), 0);
        assert_eq!(shell.counters.activations.get(), 2);
        assert_eq!(
            *shell.counters.calls.borrow(),
            vec![
                (None, Some(path.to_string()), PLMC_EXPLORER),
                (Some(path.to_string()), None, PLMC_EXPLORER),
            ]
        );
    }

    #[test]
    fn missing_component_reports_unavailable() {
        let mut shell = FakeShell::new();
        shell.component_present = false;

        let err = set_pin_state(&shell, "C:\\app.exe", PinAction::Pin).unwrap_err();

        assert!(err.is_unavailable(), "unexpected error: {err}");
        assert_eq!(shell.counters.live_items.get(), 0);
        assert!(shell.counters.calls.borrow().is_empty());
    }

    #[test]
    fn unresolvable_path_never_activates_component() {
        let shell = FakeShell::new();

        let err = set_pin_state(&shell, "", PinAction::Pin).unwrap_err();

        assert!(matches!(err, CoreError::InvalidInput(_)));
        assert_eq!(shell.counters.activations.get(), 0);
    }

    #[test]
    fn rejected_mutation_fails_and_still_releases() {
        let mut shell = FakeShell::new();
        shell.reject = true;

        let err = set_pin_state(&shell, "C:\\app.exe", PinAction::Unpin).unwrap_err();

        assert!(matches!(err, CoreError::Failed(_)));
        assert_eq!(shell.counters.live_lists.get(), 0);
        assert_eq!(shell.counters.live_items.get(), 0);
        assert_eq!(shell.counters.calls.borrow().len(), 1);
    }
}
