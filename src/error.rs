use crate::element::{AttribLookup, ElementNode};
use crate::types::{ArbDate, ArbVersion};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ArbError {
    #[error("i/o error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("xml parse failed: {0}")]
    Xml(String),
    #[error("settings parse failed: {0}")]
    Settings(String),
    #[error("load failed: {0}")]
    Load(String),
    #[error("save failed: {0}")]
    Save(String),
}

pub trait ErrorCallback {
    fn log_message(&mut self, msg: &str);
}

#[derive(Debug, Default, Clone)]
pub struct CollectingErrorCallback {
    messages: Vec<String>,
}

impl CollectingErrorCallback {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn text(&self) -> String {
        self.messages.join("\n")
    }
}

impl ErrorCallback for CollectingErrorCallback {
    fn log_message(&mut self, msg: &str) {
        self.messages.push(msg.to_string());
    }
}

/// Message text for diagnostics and update reports.
///
/// The fixed phrases are fields so a caller can substitute its own wording;
/// everything else is composed from them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Localization {
    pub invalid_file_format: String,
    pub missing_attrib: String,
    pub bad_attrib: String,
    pub valid_values: String,
    pub invalid_date: String,
    pub invalid_doc_structure: String,
    pub added: String,
    pub updated: String,
    pub deleted: String,
    pub identical: String,
    pub reordered: String,
}

impl Default for Localization {
    fn default() -> Self {
        Self {
            invalid_file_format: "Invalid file format: Element '".to_string(),
            missing_attrib: "' is missing required attribute '".to_string(),
            bad_attrib: "' has an invalid value for attribute '".to_string(),
            valid_values: "Valid values: ".to_string(),
            invalid_date: "Invalid date: ".to_string(),
            invalid_doc_structure: "Invalid document structure".to_string(),
            added: "added".to_string(),
            updated: "updated".to_string(),
            deleted: "deleted".to_string(),
            identical: "identical".to_string(),
            reordered: "reordered".to_string(),
        }
    }
}

impl Localization {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn error_missing_attribute(&self, element: &str, attrib: &str, msg: Option<&str>) -> String {
        let mut s = format!(
            "{}{}{}{}'.",
            self.invalid_file_format, element, self.missing_attrib, attrib
        );
        if let Some(m) = msg {
            s.push(' ');
            s.push_str(m);
        }
        s
    }

    pub fn error_invalid_attribute_value(
        &self,
        element: &str,
        attrib: &str,
        msg: Option<&str>,
    ) -> String {
        let mut s = format!(
            "{}{}{}{}'.",
            self.invalid_file_format, element, self.bad_attrib, attrib
        );
        if let Some(m) = msg {
            s.push(' ');
            s.push_str(m);
        }
        s
    }

    pub fn error_invalid_doc_structure(&self, msg: Option<&str>) -> String {
        match msg {
            Some(m) => format!("{}: {}", self.invalid_doc_structure, m),
            None => self.invalid_doc_structure.clone(),
        }
    }

    pub fn valid_values(&self, values: &str) -> String {
        format!("{}{}", self.valid_values, values)
    }

    pub fn valid_values_bool(&self) -> String {
        self.valid_values("'y', 'n'")
    }

    pub fn invalid_date_value(&self, raw: &str) -> String {
        format!("{}{}", self.invalid_date, raw)
    }

    pub fn unknown_version(&self, version: ArbVersion) -> String {
        format!("Unknown document version {version}")
    }

    pub fn invalid_root(&self, expected: &str) -> String {
        format!("The root element must be '{expected}'")
    }

    pub fn missing_config(&self, expected: &str) -> String {
        format!("Missing required '{expected}' element")
    }

    pub fn invalid_config(&self, expected: &str) -> String {
        format!("Only one '{expected}' element is allowed")
    }

    pub fn invalid_venue_config(&self, first: &str, second: &str) -> String {
        format!("'{first}' elements must appear before '{second}' elements")
    }

    pub fn invalid_reference(&self, what: &str, value: &str) -> String {
        format!("Invalid {what}: {value}")
    }

    fn counts(&self, label: &str, parts: &[(usize, &str)]) -> String {
        let rendered = parts
            .iter()
            .map(|(n, what)| format!("{n} {what}"))
            .collect::<Vec<_>>()
            .join(", ");
        format!("{label}: {rendered}")
    }

    fn added_updated_identical(
        &self,
        label: &str,
        added: usize,
        updated: usize,
        skipped: usize,
    ) -> String {
        self.counts(
            label,
            &[
                (added, self.added.as_str()),
                (updated, self.updated.as_str()),
                (skipped, self.identical.as_str()),
            ],
        )
    }

    pub fn update_cal_sites(&self, new: usize, updated: usize, skipped: usize) -> String {
        self.added_updated_identical("Calendar Sites", new, updated, skipped)
    }

    pub fn update_faults(&self, new: usize, skipped: usize) -> String {
        self.counts(
            "Faults",
            &[(new, self.added.as_str()), (skipped, self.identical.as_str())],
        )
    }

    pub fn update_other_pts(&self, new: usize, updated: usize, skipped: usize) -> String {
        self.added_updated_identical("Other Points", new, updated, skipped)
    }

    pub fn update_venues(&self, new: usize, updated: usize, skipped: usize) -> String {
        self.added_updated_identical("Venues", new, updated, skipped)
    }

    pub fn update_lifetime_names(&self, new: usize, skipped: usize) -> String {
        self.counts(
            "Lifetime Names",
            &[(new, self.added.as_str()), (skipped, self.identical.as_str())],
        )
    }

    pub fn update_divisions(&self, added: usize, updated: usize, skipped: usize) -> String {
        self.added_updated_identical("Divisions", added, updated, skipped)
    }

    pub fn update_divisions_reordered(&self) -> String {
        format!("Divisions: {}", self.reordered)
    }

    pub fn update_events(&self, added: usize, updated: usize, skipped: usize) -> String {
        self.added_updated_identical("Events", added, updated, skipped)
    }

    pub fn update_events_reordered(&self) -> String {
        format!("Events: {}", self.reordered)
    }

    pub fn update_multiqs(&self, added: usize, deleted: usize, skipped: usize) -> String {
        self.counts(
            "Multiple Qs",
            &[
                (added, self.added.as_str()),
                (deleted, self.deleted.as_str()),
                (skipped, self.identical.as_str()),
            ],
        )
    }

    pub fn update_multiqs_reordered(&self) -> String {
        format!("Multiple Qs: {}", self.reordered)
    }

    pub fn update_levels(&self, added: usize, updated: usize, skipped: usize) -> String {
        self.added_updated_identical("Levels", added, updated, skipped)
    }

    pub fn update_levels_reordered(&self) -> String {
        format!("Levels: {}", self.reordered)
    }

    pub fn update_titles(&self, added: usize, updated: usize, skipped: usize) -> String {
        self.added_updated_identical("Titles", added, updated, skipped)
    }

    pub fn update_titles_reordered(&self) -> String {
        format!("Titles: {}", self.reordered)
    }

    pub fn update_sublevels(&self, added: usize, updated: usize, skipped: usize) -> String {
        self.added_updated_identical("Sublevels", added, updated, skipped)
    }

    pub fn update_sublevels_reordered(&self) -> String {
        format!("Sublevels: {}", self.reordered)
    }

    pub fn update_rules(
        &self,
        added: usize,
        deleted: usize,
        updated: usize,
        skipped: usize,
    ) -> String {
        format!(
            " {}",
            self.counts(
                "Scoring Methods",
                &[
                    (added, self.added.as_str()),
                    (deleted, self.deleted.as_str()),
                    (updated, self.updated.as_str()),
                    (skipped, self.identical.as_str()),
                ],
            )
        )
    }

    fn with_changes(mut base: String, changes: usize) -> String {
        if changes > 0 {
            base.push_str(&format!(", {changes} related items updated"));
        }
        base
    }

    pub fn action_delete_cal_plugin(&self, name: &str) -> String {
        format!("Deleted calendar plugin '{name}'")
    }

    pub fn action_rename_other_points(&self, old: &str, new: &str, changes: usize) -> String {
        Self::with_changes(format!("Renamed other points '{old}' to '{new}'"), changes)
    }

    pub fn action_pre_delete_other_points(&self, name: &str, changes: usize) -> String {
        format!("Deleting other points '{name}' will affect {changes} related items")
    }

    pub fn action_delete_other_points(&self, name: &str) -> String {
        format!("Deleted other points '{name}'")
    }

    pub fn action_rename_venue(&self, old: &str, new: &str, changes: usize) -> String {
        Self::with_changes(format!("Renamed venue '{old}' to '{new}'"), changes)
    }

    pub fn action_pre_delete_venue(&self, name: &str, changes: usize) -> String {
        format!("Deleting venue '{name}' will affect {changes} related items")
    }

    pub fn action_delete_venue(&self, name: &str) -> String {
        format!("Deleted venue '{name}'")
    }

    pub fn action_rename_multiq(&self, venue: &str, old: &str, new: &str, changes: usize) -> String {
        Self::with_changes(
            format!("Renamed multiple Q '{old}' to '{new}' in venue '{venue}'"),
            changes,
        )
    }

    pub fn action_pre_delete_multiq(&self, venue: &str, name: &str, changes: usize) -> String {
        format!("Deleting multiple Q '{name}' in venue '{venue}' will affect {changes} related items")
    }

    pub fn action_delete_multiq(&self, venue: &str, name: &str) -> String {
        format!("Deleted multiple Q '{name}' in venue '{venue}'")
    }

    pub fn action_rename_division(&self, venue: &str, old: &str, new: &str, changes: usize) -> String {
        Self::with_changes(
            format!("Renamed division '{old}' to '{new}' in venue '{venue}'"),
            changes,
        )
    }

    pub fn action_pre_delete_division(&self, venue: &str, name: &str, changes: usize) -> String {
        format!("Deleting division '{name}' in venue '{venue}' will affect {changes} related items")
    }

    pub fn action_delete_division(&self, venue: &str, name: &str) -> String {
        format!("Deleted division '{name}' in venue '{venue}'")
    }

    pub fn action_rename_level(&self, venue: &str, old: &str, new: &str, changes: usize) -> String {
        Self::with_changes(
            format!("Renamed level '{old}' to '{new}' in venue '{venue}'"),
            changes,
        )
    }

    pub fn action_pre_delete_level(&self, venue: &str, name: &str, changes: usize) -> String {
        format!("Deleting level '{name}' in venue '{venue}' will affect {changes} related items")
    }

    pub fn action_delete_level(&self, venue: &str, name: &str) -> String {
        format!("Deleted level '{name}' in venue '{venue}'")
    }

    pub fn action_rename_title(&self, venue: &str, old: &str, new: &str, changes: usize) -> String {
        Self::with_changes(
            format!("Renamed title '{old}' to '{new}' in venue '{venue}'"),
            changes,
        )
    }

    pub fn action_pre_delete_title(&self, venue: &str, name: &str, changes: usize) -> String {
        format!("Deleting title '{name}' in venue '{venue}' will affect {changes} related items")
    }

    pub fn action_delete_title(&self, venue: &str, name: &str) -> String {
        format!("Deleted title '{name}' in venue '{venue}'")
    }

    pub fn action_rename_event(&self, venue: &str, old: &str, new: &str, changes: usize) -> String {
        Self::with_changes(
            format!("Renamed event '{old}' to '{new}' in venue '{venue}'"),
            changes,
        )
    }

    pub fn action_pre_delete_event(&self, venue: &str, name: &str, changes: usize) -> String {
        format!("Deleting event '{name}' in venue '{venue}' will affect {changes} related items")
    }

    pub fn action_delete_event(&self, venue: &str, name: &str) -> String {
        format!("Deleted event '{name}' in venue '{venue}'")
    }

    pub fn action_rename_lifetime_name(
        &self,
        venue: &str,
        old: &str,
        new: &str,
        event_changes: usize,
    ) -> String {
        let base = format!("Renamed lifetime name '{old}' to '{new}' in venue '{venue}'");
        if event_changes == 0 {
            base
        } else {
            format!("{base}, {event_changes} event rules updated")
        }
    }

    pub fn action_delete_lifetime_name(&self, venue: &str, name: &str, event_changes: usize) -> String {
        let base = format!("Deleted lifetime name '{name}' in venue '{venue}'");
        if event_changes == 0 {
            base
        } else {
            format!("{base}, {event_changes} event rules updated")
        }
    }

    pub fn action_not_applicable(&self, verb: &str, target: &str) -> String {
        format!("Skipped {verb} of {target}: not found in the configuration")
    }

    pub fn warn_deleted_runs(&self, runs: usize, detail: &str) -> String {
        format!("{runs} runs were deleted because they no longer match the configuration.\n{detail}")
    }

    pub fn update_table_runs(&self, runs: usize, detail: &str) -> String {
        format!("{runs} runs no longer have a table.\n{detail}")
    }

    pub fn update_subname_runs(&self, runs: usize, detail: &str) -> String {
        format!("{runs} runs had their sub-name removed.\n{detail}")
    }

    pub fn warning_newer_doc(&self, version: ArbVersion) -> String {
        format!("Document version {version} is newer than this program; some data may be lost on save")
    }
}

/// State threaded through every `load`: the document version being read,
/// the message text, and the sink for diagnostics.
pub struct LoadContext<'a> {
    version: ArbVersion,
    text: &'a Localization,
    callback: &'a mut dyn ErrorCallback,
}

impl<'a> LoadContext<'a> {
    pub fn new(
        version: ArbVersion,
        text: &'a Localization,
        callback: &'a mut dyn ErrorCallback,
    ) -> Self {
        Self {
            version,
            text,
            callback,
        }
    }

    pub fn version(&self) -> ArbVersion {
        self.version
    }

    pub fn text(&self) -> &'a Localization {
        self.text
    }

    pub fn log(&mut self, msg: impl AsRef<str>) {
        self.callback.log_message(msg.as_ref());
    }

    pub fn missing_attribute(&mut self, element: &str, attrib: &str) {
        warn!(element, attrib, "missing required attribute");
        let msg = self.text.error_missing_attribute(element, attrib, None);
        self.log(msg);
    }

    pub fn invalid_attribute(&mut self, element: &str, attrib: &str, hint: Option<&str>) {
        warn!(element, attrib, "invalid attribute value");
        let msg = self.text.error_invalid_attribute_value(element, attrib, hint);
        self.log(msg);
    }

    pub fn invalid_bool(&mut self, element: &str, attrib: &str) {
        let hint = self.text.valid_values_bool();
        self.invalid_attribute(element, attrib, Some(&hint));
    }

    pub fn invalid_date(&mut self, element: &str, attrib: &str, raw: &str) {
        let hint = self.text.invalid_date_value(raw);
        self.invalid_attribute(element, attrib, Some(&hint));
    }

    pub fn required(&mut self, tree: &ElementNode, attrib: &str) -> Option<String> {
        match tree.attrib(attrib) {
            Some(v) if !v.is_empty() => Some(v.to_string()),
            _ => {
                self.missing_attribute(tree.name(), attrib);
                None
            }
        }
    }

    /// Optional `y`/`n` attribute. Returns false (after logging) when present
    /// but unparsable; `slot` keeps its default when absent.
    pub fn read_bool(&mut self, tree: &ElementNode, attrib: &str, slot: &mut bool) -> bool {
        if tree.get_attrib_bool(attrib).assign(slot).is_err() {
            self.invalid_bool(tree.name(), attrib);
            return false;
        }
        true
    }

    pub fn read_date(&mut self, tree: &ElementNode, attrib: &str, slot: &mut ArbDate) -> bool {
        if let Err(raw) = tree.get_attrib_date(attrib).assign(slot) {
            self.invalid_date(tree.name(), attrib, &raw);
            return false;
        }
        true
    }

    pub fn read_number<T: FromStr>(&mut self, tree: &ElementNode, attrib: &str, slot: &mut T) -> bool {
        if tree.get_attrib_parsed(attrib).assign(slot).is_err() {
            self.invalid_attribute(tree.name(), attrib, None);
            return false;
        }
        true
    }

    pub fn required_number<T: FromStr>(&mut self, tree: &ElementNode, attrib: &str) -> Option<T> {
        match tree.get_attrib_parsed(attrib) {
            AttribLookup::Found(v) => Some(v),
            AttribLookup::NotFound => {
                self.missing_attribute(tree.name(), attrib);
                None
            }
            AttribLookup::Invalid(_) => {
                self.invalid_attribute(tree.name(), attrib, None);
                None
            }
        }
    }

    pub fn invalid_structure(&mut self, msg: Option<&str>) {
        warn!(detail = msg.unwrap_or_default(), "invalid document structure");
        let msg = self.text.error_invalid_doc_structure(msg);
        self.log(msg);
    }
}
