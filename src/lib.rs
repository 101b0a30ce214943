//! Dog agility record book: versioned XML persistence of a calendar, a
//! training log, a venue configuration, info notes and the dogs' records,
//! and the engine that brings a book up to date with a newer reference
//! configuration.

pub mod action;
pub mod adapter;
pub mod book;
pub mod calendar;
pub mod config;
pub mod dog;
pub mod element;
pub mod error;
pub mod info;
pub mod integration;
pub mod training;
pub mod types;

pub use action::{ActionCounts, ActionList, ActionOutcome, ConfigAction, ConfirmationCallback};
pub use book::{AgilityRecordBook, UpdateReport};
pub use element::{AttribLookup, ElementNode};
pub use error::{ArbError, CollectingErrorCallback, ErrorCallback, Localization};
pub use info::{Info, InfoItem, InfoItemList};
pub use training::{Training, TrainingList};
pub use types::{ArbDate, ArbVersion, CURRENT_DOC_VERSION};
