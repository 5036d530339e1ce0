//! Typeahead suggestions: quick search and province lookup
//!
//! keystroke → controller → debounce → backend → cache → panel → select/submit

pub mod cache;
pub mod controller;
pub mod panel;
pub mod province;
pub mod render;
pub mod sequence;

pub use cache::{CacheEntry, SuggestionCache};
pub use controller::{AutocompleteController, ControllerState, QUICK_SEARCH_DELAY};
pub use panel::{dismiss_outside, Binding, Dismissable, Panel, PanelItem, PointerTarget};
pub use province::{ProvinceLookup, PROVINCE_DELAY};
pub use render::{RenderedItem, Selection, Suggestion};
