//! The whole record book: calendar, training log, configuration, info notes
//! and dogs under one `AgilityBook` root.

use crate::action::{ActionCounts, ConfirmationCallback};
use crate::calendar::{CalendarList, TREE_CALENDAR};
use crate::config::{Config, TREE_CONFIG};
use crate::dog::{DogList, RunScoringKind, TREE_DOG};
use crate::element::{AttribLookup, ElementNode};
use crate::error::{ErrorCallback, LoadContext, Localization};
use crate::info::{Info, TREE_INFO};
use crate::training::{TrainingList, TREE_TRAINING};
use crate::types::{ArbVersion, CURRENT_DOC_VERSION};
use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const TREE_BOOK: &str = "AgilityBook";
const ATTRIB_BOOK_VERSION: &str = "Book";
const ATTRIB_BOOK_PGM_VERSION: &str = "ver";
const ATTRIB_BOOK_TIMESTAMP: &str = "timestamp";
const DTD: &str = include_str!("AgilityRecordBook.dtd");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateReport {
    pub actions: ActionCounts,
    pub config_changed: bool,
    pub stale_multiqs: usize,
    pub deleted_runs: usize,
    pub cleared_tables: usize,
    pub cleared_sub_names: usize,
}

impl UpdateReport {
    pub fn changed(&self) -> bool {
        self.actions.changed()
            || self.config_changed
            || self.stale_multiqs > 0
            || self.deleted_runs > 0
            || self.cleared_tables > 0
            || self.cleared_sub_names > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgilityRecordBook {
    pub calendar: CalendarList,
    pub training: TrainingList,
    pub config: Config,
    pub info: Info,
    pub dogs: DogList,
}

impl AgilityRecordBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dtd() -> &'static str {
        DTD
    }

    /// Reads a book document. Calendar, training, info and dog entries that
    /// fail to load are reported and skipped; a bad root, version or
    /// configuration rejects the book.
    pub fn load(tree: &ElementNode, text: &Localization, callback: &mut dyn ErrorCallback) -> Option<Self> {
        if tree.name() != TREE_BOOK {
            callback.log_message(&text.error_invalid_doc_structure(Some(&text.invalid_root(TREE_BOOK))));
            return None;
        }
        let version = match tree.get_attrib_version(ATTRIB_BOOK_VERSION) {
            AttribLookup::Found(version) => version,
            _ => {
                callback.log_message(&text.error_missing_attribute(TREE_BOOK, ATTRIB_BOOK_VERSION, None));
                return None;
            }
        };
        if version < ArbVersion::new(1, 0) || version > CURRENT_DOC_VERSION {
            if version.major() == CURRENT_DOC_VERSION.major() {
                let msg = text.warning_newer_doc(version);
                warn!(%version, "reading a newer document");
                callback.log_message(&msg);
            } else {
                callback.log_message(&text.error_invalid_attribute_value(
                    TREE_BOOK,
                    ATTRIB_BOOK_VERSION,
                    Some(&text.unknown_version(version)),
                ));
                return None;
            }
        }

        let mut book = Self::new();
        let mut ctx = LoadContext::new(version, text, callback);
        for element in tree.elements().iter().filter(|e| e.name() == TREE_CALENDAR) {
            if !book.calendar.load(element, &mut ctx) {
                debug!("skipped calendar entry");
            }
        }
        book.calendar.sort();
        for element in tree.elements().iter().filter(|e| e.name() == TREE_TRAINING) {
            if !book.training.load(element, &mut ctx) {
                debug!("skipped training entry");
            }
        }
        book.training.sort();

        let mut configs = tree.elements().iter().filter(|e| e.name() == TREE_CONFIG);
        let Some(config) = configs.next() else {
            ctx.invalid_structure(Some(&text.missing_config(TREE_CONFIG)));
            return None;
        };
        if configs.next().is_some() {
            ctx.invalid_structure(Some(&text.invalid_config(TREE_CONFIG)));
            return None;
        }
        if !book.config.load(config, &mut ctx) {
            return None;
        }

        for element in tree.elements().iter().filter(|e| e.name() == TREE_DOG) {
            if !book.dogs.load(element, &mut ctx) {
                debug!("skipped dog");
            }
        }
        if let Some(element) = tree.find_element(TREE_INFO, 0).and_then(|i| tree.element(i)) {
            book.info.load(element, &mut ctx);
        }
        info!(
            %version,
            calendar = book.calendar.len(),
            training = book.training.len(),
            dogs = book.dogs.len(),
            "loaded record book"
        );
        Some(book)
    }

    pub fn save(&self, tree: &mut ElementNode, program_version: &str) -> bool {
        tree.clear();
        tree.set_name(TREE_BOOK);
        tree.add_attrib_version(ATTRIB_BOOK_VERSION, CURRENT_DOC_VERSION);
        tree.add_attrib(ATTRIB_BOOK_PGM_VERSION, program_version);
        tree.add_attrib(
            ATTRIB_BOOK_TIMESTAMP,
            Local::now().format("%Y-%m-%d %H:%M:%S").to_string(),
        );
        self.calendar.save(tree)
            && self.training.save(tree)
            && self.config.save(tree)
            && self.info.save(tree)
            && self.dogs.save(tree)
    }

    /// Brings the book up to date with a newer reference configuration.
    ///
    /// Pending actions run first and cascade into the dogs. After a refused
    /// delete the reference is merged only if the callback still allows it.
    /// Runs of trials with a hosting club are then checked against the
    /// resulting configuration whether or not the merge ran.
    pub fn update(
        &mut self,
        new_config: &Config,
        text: &Localization,
        info: &mut String,
        callback: &mut dyn ConfirmationCallback,
    ) -> UpdateReport {
        let mut report = UpdateReport::default();
        if !new_config.actions.is_empty() {
            report.actions =
                new_config
                    .actions
                    .apply(&mut self.config, Some(&mut self.dogs), text, info, callback);
        }
        if report.actions.declined == 0 || callback.can_continue() {
            report.config_changed = self.config.update(0, new_config, text, info);
        }

        let venues: Vec<String> = self.config.venues.iter().map(|v| v.name.clone()).collect();
        for venue in &venues {
            report.stale_multiqs += self.dogs.delete_stale_multiqs(&self.config, venue);
        }

        let (mut deleted, mut tables, mut sub_names) = (String::new(), String::new(), String::new());
        let config = &self.config;
        for dog in self.dogs.iter_mut() {
            for title in dog.titles.iter_mut() {
                if let Some(config_title) = config.venues.find_title(&title.venue, &title.name) {
                    if title.instance == 0 && config_title.multiple > 1 {
                        title.instance = 1;
                    }
                    title.show_instance_one = config_title.multiple == 1;
                    title.style = config_title.style;
                }
            }
            for trial in dog.trials.iter_mut() {
                let Some(venue) = trial.clubs.primary_club().map(|c| c.venue.clone()) else {
                    continue;
                };
                report.deleted_runs += trial.runs.retain(|run| {
                    let Some((_, scoring)) =
                        config
                            .venues
                            .find_event(&venue, &run.event, &run.division, &run.level, &run.date)
                    else {
                        deleted.push_str(&format!("   {}\n", run.describe(&venue)));
                        return false;
                    };
                    if !scoring.has_table && run.scoring.has_table {
                        run.scoring.has_table = false;
                        tables.push_str(&format!("   {}\n", run.describe(&venue)));
                        report.cleared_tables += 1;
                    }
                    if !scoring.has_sub_names && !run.sub_name.is_empty() {
                        run.sub_name.clear();
                        sub_names.push_str(&format!("   {}\n", run.describe(&venue)));
                        report.cleared_sub_names += 1;
                    }
                    run.scoring.set_kind(RunScoringKind::from_style(scoring.style));
                    true
                });
            }
        }

        if report.deleted_runs > 0 {
            let msg = text.warn_deleted_runs(report.deleted_runs, &deleted);
            warn!(runs = report.deleted_runs, "deleted runs that no longer match the configuration");
            callback.post_delete(&msg);
            info.push_str(&format!("\n{msg}\n"));
        }
        if report.cleared_tables > 0 {
            info.push_str(&format!("\n{}\n", text.update_table_runs(report.cleared_tables, &tables)));
        }
        if report.cleared_sub_names > 0 {
            info.push_str(&format!(
                "\n{}\n",
                text.update_subname_runs(report.cleared_sub_names, &sub_names)
            ));
        }
        info!(
            applied = report.actions.applied,
            config_changed = report.config_changed,
            deleted_runs = report.deleted_runs,
            "updated record book"
        );
        report
    }
}
