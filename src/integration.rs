//! File-level entry points: reading and writing books, reading reference
//! configurations, and running a whole update session from settings.

use crate::action::ConfirmationCallback;
use crate::book::{AgilityRecordBook, UpdateReport};
use crate::config::Config;
use crate::element::ElementNode;
use crate::error::{ArbError, CollectingErrorCallback, Localization};
use crate::types::ArbDate;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

pub fn load_book_file(
    path: impl AsRef<Path>,
    text: &Localization,
) -> Result<(AgilityRecordBook, CollectingErrorCallback), ArbError> {
    let tree = ElementNode::load_xml_file(path)?;
    let mut callback = CollectingErrorCallback::new();
    match AgilityRecordBook::load(&tree, text, &mut callback) {
        Some(book) => Ok((book, callback)),
        None => Err(ArbError::Load(callback.text())),
    }
}

pub fn save_book_file(
    book: &AgilityRecordBook,
    path: impl AsRef<Path>,
    program_version: &str,
) -> Result<(), ArbError> {
    let mut tree = ElementNode::new("");
    if !book.save(&mut tree, program_version) {
        return Err(ArbError::Save(path.as_ref().display().to_string()));
    }
    tree.save_xml_file(path)
}

pub fn load_config_file(
    path: impl AsRef<Path>,
    text: &Localization,
) -> Result<(Config, CollectingErrorCallback), ArbError> {
    let tree = ElementNode::load_xml_file(path)?;
    let mut callback = CollectingErrorCallback::new();
    match Config::load_document(&tree, text, &mut callback) {
        Some(config) => Ok((config, callback)),
        None => Err(ArbError::Load(callback.text())),
    }
}

fn default_confirm_deletes() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateSettings {
    pub book: PathBuf,
    pub reference: PathBuf,
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default = "default_confirm_deletes")]
    pub confirm_deletes: bool,
    #[serde(default)]
    pub trim_calendar_before: Option<NaiveDate>,
}

impl UpdateSettings {
    pub fn new(book: impl Into<PathBuf>, reference: impl Into<PathBuf>) -> Self {
        Self {
            book: book.into(),
            reference: reference.into(),
            output: None,
            confirm_deletes: default_confirm_deletes(),
            trim_calendar_before: None,
        }
    }

    pub fn from_yaml_str(input: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(input)
    }

    pub fn from_json_str(input: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(input)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ArbError> {
        let path_ref = path.as_ref();
        let raw = fs::read_to_string(path_ref).map_err(|source| ArbError::Io {
            path: path_ref.to_path_buf(),
            source,
        })?;
        let ext = path_ref
            .extension()
            .and_then(|v| v.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match ext.as_str() {
            "yaml" | "yml" => {
                Self::from_yaml_str(&raw).map_err(|e| ArbError::Settings(format!("yaml: {e}")))
            }
            "json" => Self::from_json_str(&raw).map_err(|e| ArbError::Settings(format!("json: {e}"))),
            _ => Err(ArbError::Settings(format!(
                "unsupported settings extension '{ext}'; expected .yaml/.yml/.json"
            ))),
        }
    }

    pub fn output_path(&self) -> &Path {
        self.output.as_deref().unwrap_or(&self.book)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SessionOutcome {
    pub report: UpdateReport,
    pub info: String,
    pub warnings: Vec<String>,
    pub trimmed_calendar: usize,
}

/// Loads the book and reference, runs the update, trims the calendar if
/// asked, and saves the result.
pub fn run_update_session(
    settings: &UpdateSettings,
    text: &Localization,
    callback: &mut dyn ConfirmationCallback,
    program_version: &str,
) -> Result<SessionOutcome, ArbError> {
    let (mut book, book_log) = load_book_file(&settings.book, text)?;
    let (reference, reference_log) = load_config_file(&settings.reference, text)?;

    let mut outcome = SessionOutcome {
        warnings: book_log
            .messages()
            .iter()
            .chain(reference_log.messages())
            .cloned()
            .collect(),
        ..SessionOutcome::default()
    };
    outcome.report = book.update(&reference, text, &mut outcome.info, callback);
    if let Some(cutoff) = settings.trim_calendar_before {
        outcome.trimmed_calendar = book.calendar.trim_entries(&ArbDate::from_naive(cutoff));
    }

    let output = settings.output_path();
    save_book_file(&book, output, program_version)?;
    info!(
        output = %output.display(),
        changed = outcome.report.changed(),
        trimmed = outcome.trimmed_calendar,
        "saved record book"
    );
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StaticConfirmation;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    const BOOK: &str = r#"<AgilityBook Book="15.0">
        <Calendar DateStart="2023-01-01" DateEnd="2023-01-02" Venue="AKC"/>
        <Calendar DateStart="2025-01-01" DateEnd="2025-01-02" Venue="AKC"/>
        <Configuration version="1">
            <Venue Name="AKC">
                <Division Name="Standard"><Level Name="Novice"/></Division>
                <Event Name="JWW"><Scoring Division="*" Level="*" type="FaultsThenTime"/></Event>
            </Venue>
        </Configuration>
        <Dog CallName="Rex">
            <Trial>
                <Club Venue="AKC">Dog Club</Club>
                <Run Date="2024-03-02" Division="Standard" Level="Novice" Event="JWW"/>
            </Trial>
        </Dog>
    </AgilityBook>"#;

    const REFERENCE: &str = r#"<DefaultConfig Book="15.0">
        <Configuration version="2">
            <Action Verb="DeleteEvent" Config="2" Venue="AKC" OldName="JWW"/>
            <Venue Name="AKC">
                <Division Name="Standard"><Level Name="Novice"/></Division>
                <Event Name="FAST"><Scoring Division="*" Level="*" type="ScoreThenTime"/></Event>
            </Venue>
        </Configuration>
    </DefaultConfig>"#;

    #[test]
    fn settings_parse_from_yaml_json_and_path() {
        let yaml = "book: dogs.arb\nreference: default.xml\ntrim_calendar_before: 2024-01-01\n";
        let settings = UpdateSettings::from_yaml_str(yaml).unwrap();
        assert!(settings.confirm_deletes);
        assert_eq!(settings.output_path(), Path::new("dogs.arb"));
        assert_eq!(settings.trim_calendar_before, NaiveDate::from_ymd_opt(2024, 1, 1));

        let json = r#"{"book":"a.arb","reference":"b.xml","output":"c.arb","confirm_deletes":false}"#;
        let settings = UpdateSettings::from_json_str(json).unwrap();
        assert!(!settings.confirm_deletes);
        assert_eq!(settings.output_path(), Path::new("c.arb"));

        let dir = tempdir().unwrap();
        let path = dir.path().join("session.yml");
        fs::write(&path, yaml).unwrap();
        assert_eq!(UpdateSettings::from_path(&path).unwrap().book, PathBuf::from("dogs.arb"));

        let bad = dir.path().join("session.toml");
        fs::write(&bad, yaml).unwrap();
        assert!(matches!(UpdateSettings::from_path(&bad), Err(ArbError::Settings(_))));
    }

    #[test]
    fn load_failures_carry_the_diagnostics() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.arb");
        fs::write(&path, r#"<AgilityBook Book="15.0"/>"#).unwrap();
        let err = load_book_file(&path, &Localization::new()).unwrap_err();
        match err {
            ArbError::Load(msg) => assert!(msg.contains("Configuration")),
            other => panic!("unexpected error {other}"),
        }
        assert!(matches!(
            load_book_file(dir.path().join("missing.arb"), &Localization::new()),
            Err(ArbError::Io { .. })
        ));
    }

    #[test]
    fn session_updates_and_saves() {
        let dir = tempdir().unwrap();
        let book_path = dir.path().join("dogs.arb");
        let reference_path = dir.path().join("default.xml");
        fs::write(&book_path, BOOK).unwrap();
        fs::write(&reference_path, REFERENCE).unwrap();

        let mut settings = UpdateSettings::new(&book_path, &reference_path);
        settings.output = Some(dir.path().join("out.arb"));
        settings.trim_calendar_before = NaiveDate::from_ymd_opt(2024, 1, 1);

        let text = Localization::new();
        let mut confirm = StaticConfirmation::new(true);
        let outcome = run_update_session(&settings, &text, &mut confirm, "test").unwrap();
        assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
        assert_eq!(outcome.report.actions.applied, 1);
        assert_eq!(outcome.trimmed_calendar, 1);
        assert_eq!(confirm.pre_delete_messages().len(), 1);

        let (saved, _) = load_book_file(dir.path().join("out.arb"), &text).unwrap();
        assert_eq!(saved.config.version, 2);
        assert_eq!(saved.calendar.len(), 1);
        assert!(saved.config.venues.find_venue("AKC").unwrap().events.find_event("JWW").is_none());
        assert_eq!(saved.dogs.count_events_in_use("AKC", "JWW"), 0);
    }

    #[test]
    fn declined_session_keeps_the_runs() {
        let dir = tempdir().unwrap();
        let book_path = dir.path().join("dogs.arb");
        let reference_path = dir.path().join("default.xml");
        fs::write(&book_path, BOOK).unwrap();
        fs::write(&reference_path, REFERENCE).unwrap();

        let settings = UpdateSettings::new(&book_path, &reference_path);
        let text = Localization::new();
        let mut confirm = StaticConfirmation::new(false);
        let outcome = run_update_session(&settings, &text, &mut confirm, "test").unwrap();
        assert_eq!(outcome.report.actions.declined, 1);
        assert!(!outcome.report.config_changed);

        let (saved, _) = load_book_file(&book_path, &text).unwrap();
        assert_eq!(saved.config.version, 1);
        assert_eq!(saved.dogs.count_events_in_use("AKC", "JWW"), 1);
    }
}
