//! "All" plus per-item checkbox groups that drive the filters.
//!
//! The group never asks a control to notify. User toggles arrive through
//! [`CheckboxGroup::changed`]; every cascading update goes through
//! [`Checkbox::set_checked_silent`], so one user action produces exactly one
//! [`SelectionChanged`].

/// What the group needs from a checkbox, whatever draws it.
pub trait Checkbox {
    fn label(&self) -> &str;
    fn is_checked(&self) -> bool;
    /// Programmatic update. Must not be reported back as a user change.
    fn set_checked_silent(&mut self, checked: bool);
}

/// Plain checkbox state used by the terminal UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckItem {
    pub label: String,
    pub checked: bool,
}

impl CheckItem {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            checked: false,
        }
    }
}

impl Checkbox for CheckItem {
    fn label(&self) -> &str {
        &self.label
    }

    fn is_checked(&self) -> bool {
        self.checked
    }

    fn set_checked_silent(&mut self, checked: bool) {
        self.checked = checked;
    }
}

/// A control inside a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    All,
    Item(usize),
}

impl Control {
    /// Control at `position` in display order, where "all" comes first.
    pub fn from_position(position: usize) -> Self {
        match position {
            0 => Control::All,
            n => Control::Item(n - 1),
        }
    }
}

/// Emitted once per settled transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionChanged {
    /// Checked item labels in item order. Never includes "all".
    pub labels: Vec<String>,
}

pub struct CheckboxGroup<C> {
    all: C,
    items: Vec<C>,
}

impl<C: Checkbox> CheckboxGroup<C> {
    /// Build a group and bring the "all" control in line with the items.
    pub fn new(all: C, items: Vec<C>) -> Self {
        let mut group = Self { all, items };
        group.sync_all();
        group
    }

    pub fn all(&self) -> &C {
        &self.all
    }

    pub fn items(&self) -> &[C] {
        &self.items
    }

    pub fn control(&self, control: Control) -> Option<&C> {
        match control {
            Control::All => Some(&self.all),
            Control::Item(i) => self.items.get(i),
        }
    }

    /// Number of controls including "all".
    pub fn len(&self) -> usize {
        self.items.len() + 1
    }

    pub fn selected_labels(&self) -> Vec<String> {
        self.items
            .iter()
            .filter(|c| c.is_checked())
            .map(|c| c.label().to_string())
            .collect()
    }

    /// Handle a user change of `control` to `value`.
    ///
    /// Toolkits that flip the widget before reporting the change can pass
    /// the already-applied value; setting it again is harmless.
    pub fn changed(&mut self, control: Control, value: bool) -> Option<SelectionChanged> {
        match control {
            Control::All => {
                self.all.set_checked_silent(value);
                for item in &mut self.items {
                    item.set_checked_silent(value);
                }
                // An empty group stays "all checked".
                self.sync_all();
            }
            Control::Item(i) => {
                self.items.get_mut(i)?.set_checked_silent(value);
                self.sync_all();
            }
        }
        Some(SelectionChanged {
            labels: self.selected_labels(),
        })
    }

    /// Flip `control` as if the user clicked it.
    pub fn toggle(&mut self, control: Control) -> Option<SelectionChanged> {
        let current = self.control(control)?.is_checked();
        self.changed(control, !current)
    }

    fn sync_all(&mut self) {
        let all_checked = self.items.iter().all(|c| c.is_checked());
        if self.all.is_checked() != all_checked {
            self.all.set_checked_silent(all_checked);
        }
    }
}

impl CheckboxGroup<CheckItem> {
    /// Unchecked group with one item per label.
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a str>) -> Self {
        Self::new(
            CheckItem::new("all"),
            labels.into_iter().map(CheckItem::new).collect(),
        )
    }
}
