//! Suggestion panels and the document-level dismiss rule

use super::render::{RenderedItem, Suggestion};

/// Inputs that own a suggestion panel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Binding {
    QuickSearch,
    FromLocation,
    ToLocation,
}

impl Binding {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::QuickSearch => "quick-search",
            Self::FromLocation => "from-location",
            Self::ToLocation => "to-location",
        }
    }
}

/// Where a pointer event landed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerTarget {
    Input(Binding),
    Panel(Binding),
    Elsewhere,
}

impl PointerTarget {
    /// Whether the event landed on `binding`'s input or on its panel
    pub fn is_inside(&self, binding: Binding) -> bool {
        matches!(self, Self::Input(b) | Self::Panel(b) if *b == binding)
    }
}

/// A dropdown list that is either open with rows or hidden
#[derive(Debug, Clone, PartialEq)]
pub struct Panel<T> {
    open: bool,
    items: Vec<T>,
}

impl<T> Default for Panel<T> {
    fn default() -> Self {
        Self {
            open: false,
            items: Vec::new(),
        }
    }
}

impl<T> Panel<T> {
    /// Replace the rows; the panel opens only when there is something to show
    pub fn show(&mut self, items: Vec<T>) {
        self.open = !items.is_empty();
        self.items = items;
    }

    /// Close without discarding rows. Returns true if it was open.
    pub fn hide(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn items(&self) -> &[T] {
        &self.items
    }

    /// Row `index`, only while the panel is open
    pub fn get(&self, index: usize) -> Option<&T> {
        if self.open {
            self.items.get(index)
        } else {
            None
        }
    }
}

/// One rendered suggestion row
#[derive(Debug, Clone, PartialEq)]
pub struct PanelItem {
    pub suggestion: Suggestion,
    pub view: RenderedItem,
}

impl PanelItem {
    pub fn new(suggestion: Suggestion, query: &str) -> Self {
        let view = suggestion.render(query);
        Self { suggestion, view }
    }
}

/// Something that owns a panel bound to an input
pub trait Dismissable {
    fn binding(&self) -> Binding;

    /// Close the panel. Returns true if it was open.
    fn close_panel(&self) -> bool;
}

/// Close every panel whose input and panel were both missed by the pointer.
///
/// Each pair is judged on its own, so one click elsewhere can close several
/// panels. Returns how many were actually open.
pub fn dismiss_outside(target: PointerTarget, owners: &[&dyn Dismissable]) -> usize {
    owners
        .iter()
        .filter(|owner| !target.is_inside(owner.binding()))
        .filter(|owner| owner.close_panel())
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    struct Fake {
        binding: Binding,
        open: Cell<bool>,
    }

    impl Fake {
        fn open(binding: Binding) -> Self {
            Self {
                binding,
                open: Cell::new(true),
            }
        }
    }

    impl Dismissable for Fake {
        fn binding(&self) -> Binding {
            self.binding
        }

        fn close_panel(&self) -> bool {
            self.open.replace(false)
        }
    }

    #[test]
    fn test_panel_opens_only_with_items() {
        let mut panel: Panel<String> = Panel::default();
        panel.show(vec![]);
        assert!(!panel.is_open());

        panel.show(vec!["Huế".into()]);
        assert!(panel.is_open());
        assert_eq!(panel.get(0).map(String::as_str), Some("Huế"));

        assert!(panel.hide());
        assert!(!panel.hide());
        assert_eq!(panel.items().len(), 1);
        assert!(panel.get(0).is_none());
    }

    #[test]
    fn test_click_elsewhere_closes_all_open_panels() {
        let quick = Fake::open(Binding::QuickSearch);
        let from = Fake::open(Binding::FromLocation);
        let to = Fake::open(Binding::ToLocation);
        to.open.set(false);

        let closed = dismiss_outside(PointerTarget::Elsewhere, &[&quick, &from, &to]);
        assert_eq!(closed, 2);
        assert!(!quick.open.get());
        assert!(!from.open.get());
    }

    #[test]
    fn test_click_on_own_input_or_panel_keeps_it_open() {
        let quick = Fake::open(Binding::QuickSearch);
        let from = Fake::open(Binding::FromLocation);

        dismiss_outside(PointerTarget::Input(Binding::QuickSearch), &[&quick, &from]);
        assert!(quick.open.get());
        assert!(!from.open.get());

        from.open.set(true);
        dismiss_outside(PointerTarget::Panel(Binding::FromLocation), &[&quick, &from]);
        assert!(!quick.open.get());
        assert!(from.open.get());
    }
}
