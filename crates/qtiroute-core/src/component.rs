//! The structural component capability shared by tests, test parts, sections
//! and item references: an optional time limit and an optional item session
//! control. Definition components can also declare them; item occurrences only
//! read through to their item.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::definition::{ItemRef, ItemSessionControl, Section, Test, TestPart, TimeLimits};

/// The kind of a structural component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComponentKind {
    Test,
    TestPart,
    Section,
    ItemRef,
}

impl fmt::Display for ComponentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ComponentKind::Test => "test",
            ComponentKind::TestPart => "test part",
            ComponentKind::Section => "section",
            ComponentKind::ItemRef => "item",
        };
        write!(f, "{s}")
    }
}

/// Read access to the policies a structural level may declare.
///
/// `None` means the level does not declare the policy; callers walk the
/// enclosing levels to resolve the effective value.
pub trait StructuralComponent {
    fn kind(&self) -> ComponentKind;

    fn time_limits(&self) -> Option<&TimeLimits>;

    fn item_session_control(&self) -> Option<&ItemSessionControl>;

    fn has_time_limits(&self) -> bool {
        self.time_limits().is_some()
    }

    fn has_item_session_control(&self) -> bool {
        self.item_session_control().is_some()
    }
}

/// Declaring policies on a definition component.
pub trait StructuralComponentMut: StructuralComponent {
    fn set_time_limits(&mut self, limits: Option<TimeLimits>);

    fn set_item_session_control(&mut self, control: Option<ItemSessionControl>);
}

macro_rules! structural_component {
    ($ty:ty, $kind:expr) => {
        impl StructuralComponent for $ty {
            fn kind(&self) -> ComponentKind {
                $kind
            }

            fn time_limits(&self) -> Option<&TimeLimits> {
                self.time_limits.as_ref()
            }

            fn item_session_control(&self) -> Option<&ItemSessionControl> {
                self.item_session_control.as_ref()
            }
        }

        impl StructuralComponentMut for $ty {
            fn set_time_limits(&mut self, limits: Option<TimeLimits>) {
                self.time_limits = limits;
            }

            fn set_item_session_control(&mut self, control: Option<ItemSessionControl>) {
                self.item_session_control = control;
            }
        }

        impl $ty {
            pub fn identifier(&self) -> &str {
                &self.identifier
            }
        }
    };
}

/// Components the definition arena can re-key.
macro_rules! renamable {
    ($($ty:ty),+) => {
        $(
            impl $ty {
                pub(crate) fn set_identifier(&mut self, identifier: impl Into<String>) {
                    self.identifier = identifier.into();
                }
            }
        )+
    };
}

structural_component!(Test, ComponentKind::Test);
structural_component!(TestPart, ComponentKind::TestPart);
structural_component!(Section, ComponentKind::Section);
structural_component!(ItemRef, ComponentKind::ItemRef);

renamable!(TestPart, Section, ItemRef);
