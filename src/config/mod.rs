//! The configuration graph: venues and everything a venue defines, plus
//! the shared calendar sites, fault types and other points categories.

pub mod calsite;
pub mod division;
pub mod event;
pub mod fault;
pub mod multiq;
pub mod otherpoints;
pub mod scoring;
pub mod title;
pub mod venue;

pub use calsite::{CalSite, CalSiteList};
pub use division::{Division, DivisionList, Level, LevelList, SubLevel, SubLevelList};
pub use event::{Event, EventList};
pub use fault::{Fault, FaultList};
pub use multiq::{MultiQ, MultiQItem, MultiQList};
pub use otherpoints::{OtherPoints, OtherPointsList, OtherPointsTally};
pub use scoring::{
    LifetimePoints, LifetimePointsList, PlaceInfo, PlaceInfoList, Scoring, ScoringList, ScoringStyle,
    TitlePoints, TitlePointsList, WILDCARD,
};
pub use title::{Title, TitleList, TitleStyle};
pub use venue::{LifetimeName, LifetimeNameList, Venue, VenueList};

use crate::action::{ActionList, TREE_ACTION};
use crate::dog::DogTitle;
use crate::element::ElementNode;
use crate::error::{ErrorCallback, LoadContext, Localization};
use crate::types::CURRENT_DOC_VERSION;
use calsite::TREE_CALSITE;
use fault::TREE_FAULTTYPE;
use otherpoints::TREE_OTHERPTS;
use serde::{Deserialize, Serialize};
use tracing::debug;
use venue::TREE_VENUE;

pub const TREE_CONFIG: &str = "Configuration";
pub const TREE_DEFAULT_CONFIG: &str = "DefaultConfig";
const ATTRIB_CONFIG_VERSION: &str = "version";
const ATTRIB_CONFIG_UPDATE: &str = "update";
const ATTRIB_BOOK_VERSION: &str = "Book";

pub(crate) trait Named {
    fn name(&self) -> &str;
}

/// Puts entries named in `reference` first, in reference order. The rest
/// keep their relative order at the end.
pub(crate) fn reorder_by<T: Named>(items: &mut Vec<T>, reference: &[T]) {
    let mut remaining = std::mem::take(items);
    let mut ordered = Vec::with_capacity(remaining.len());
    for wanted in reference {
        if let Some(index) = remaining.iter().position(|item| item.name() == wanted.name()) {
            ordered.push(remaining.remove(index));
        }
    }
    ordered.append(&mut remaining);
    *items = ordered;
}

pub(crate) fn indents(indent: usize) -> (String, String) {
    let base = "   ".repeat(indent.saturating_sub(1));
    (format!("{base}-"), format!("{base}   "))
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub version: i16,
    pub update: bool,
    pub actions: ActionList,
    pub cal_sites: CalSiteList,
    pub venues: VenueList,
    pub faults: FaultList,
    pub other_points: OtherPointsList,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: 0,
            update: true,
            actions: ActionList::default(),
            cal_sites: CalSiteList::default(),
            venues: VenueList::default(),
            faults: FaultList::default(),
            other_points: OtherPointsList::default(),
        }
    }
}

/// Pending actions and the update flag are session state, not content.
impl PartialEq for Config {
    fn eq(&self, other: &Self) -> bool {
        self.version == other.version
            && self.cal_sites == other.cal_sites
            && self.venues == other.venues
            && self.faults == other.faults
            && self.other_points == other.other_points
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_CONFIG {
            return false;
        }
        if !ctx.read_bool(tree, ATTRIB_CONFIG_UPDATE, &mut self.update) {
            return false;
        }
        // An unreadable revision leaves the default.
        if let Some(version) = tree.get_attrib_parsed::<i16>(ATTRIB_CONFIG_VERSION).found() {
            self.version = version;
        }
        for element in tree.elements() {
            let ok = match element.name() {
                TREE_ACTION => self.actions.load(element, ctx),
                TREE_CALSITE => self.cal_sites.load(element, ctx),
                TREE_VENUE => self
                    .venues
                    .load(element, &mut self.faults, &mut self.other_points, ctx),
                TREE_FAULTTYPE => self.faults.load(element, ctx),
                TREE_OTHERPTS => self.other_points.load(element, ctx),
                _ => true,
            };
            if !ok {
                debug!(element = element.name(), "skipped configuration entry");
            }
        }
        self.venues.sort();
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let config = tree.add_element_node(TREE_CONFIG, None);
        if !self.update {
            config.add_attrib_bool(ATTRIB_CONFIG_UPDATE, false);
        }
        config.add_attrib_int(ATTRIB_CONFIG_VERSION, i64::from(self.version));
        self.cal_sites.save(config)
            && self.venues.save(config)
            && self.faults.save(config)
            && self.other_points.save(config)
    }

    /// Loads a reference configuration document: either a bare
    /// `Configuration` element (read at the current document version) or a
    /// `DefaultConfig` root whose `Book` attribute names the version.
    pub fn load_document(root: &ElementNode, text: &Localization, callback: &mut dyn ErrorCallback) -> Option<Self> {
        let mut ctx_version = CURRENT_DOC_VERSION;
        let tree = match root.name() {
            TREE_CONFIG => root,
            TREE_DEFAULT_CONFIG => {
                if let Some(version) = root.get_attrib_version(ATTRIB_BOOK_VERSION).found() {
                    ctx_version = version;
                }
                let Some(index) = root.find_element(TREE_CONFIG, 0) else {
                    callback.log_message(&text.missing_config(TREE_CONFIG));
                    return None;
                };
                root.element(index)?
            }
            _ => {
                callback.log_message(&text.invalid_root(TREE_DEFAULT_CONFIG));
                return None;
            }
        };
        let mut config = Config::default();
        let mut ctx = LoadContext::new(ctx_version, text, callback);
        config.load(tree, &mut ctx).then_some(config)
    }

    /// Merges a newer reference configuration into this one, appending a
    /// human-readable report to `info`. Returns true if anything changed.
    pub fn update(&mut self, indent: usize, other: &Config, text: &Localization, info: &mut String) -> bool {
        let mut changes = 0;

        let (mut added, mut updated, mut skipped) = (0, 0, 0);
        for site in other.cal_sites.iter() {
            match self.cal_sites.find_site_mut(&site.name) {
                Some(existing) if *existing == *site => skipped += 1,
                Some(existing) => {
                    *existing = site.clone();
                    updated += 1;
                }
                None => {
                    self.cal_sites.push(site.clone());
                    added += 1;
                }
            }
        }
        if added > 0 || updated > 0 {
            self.cal_sites.sort();
            info.push_str(&text.update_cal_sites(added, updated, skipped));
            info.push('\n');
        }

        let (mut added, mut skipped) = (0, 0);
        for fault in other.faults.iter() {
            if self.faults.find_fault(&fault.name).is_some() {
                skipped += 1;
            } else if self.faults.add_fault(&fault.name) {
                added += 1;
            }
        }
        if added > 0 {
            changes += added;
            info.push_str(&text.update_faults(added, skipped));
            info.push('\n');
        }

        let (mut added, mut updated, mut skipped) = (0, 0, 0);
        for points in other.other_points.iter() {
            match self.other_points.find_other_points_mut(&points.name) {
                Some(existing) if *existing == *points => skipped += 1,
                Some(existing) => {
                    *existing = points.clone();
                    updated += 1;
                }
                None => {
                    self.other_points.add_other_points(points.clone());
                    added += 1;
                }
            }
        }
        if added > 0 || updated > 0 {
            changes += added + updated;
            info.push_str(&text.update_other_pts(added, updated, skipped));
            info.push('\n');
        }

        let (mut added, mut updated, mut skipped) = (0, 0, 0);
        let mut venue_info = String::new();
        for venue in other.venues.iter() {
            match self.venues.find_venue_mut(&venue.name) {
                Some(existing) if *existing == *venue => skipped += 1,
                Some(existing) => {
                    if existing.update(indent + 1, venue, text, &mut venue_info) {
                        updated += 1;
                    }
                }
                None => {
                    self.venues.add_venue(venue.clone());
                    added += 1;
                    venue_info.push_str(&format!("+{}\n", venue.name));
                }
            }
        }
        if added > 0 || updated > 0 {
            changes += added + updated;
            info.push_str(&text.update_venues(added, updated, skipped));
            info.push('\n');
        }
        info.push_str(&venue_info);

        self.version = self.version.max(other.version);
        if changes == 0 {
            return false;
        }
        self.update = true;
        true
    }

    pub fn title_nice_name(&self, venue: &str, title: &str) -> String {
        self.venues
            .find_title(venue, title)
            .map_or_else(|| title.to_string(), |t| t.nice_name().to_string())
    }

    pub fn title_complete_name(&self, title: &DogTitle, abbrev_first: bool) -> String {
        match self.venues.find_title(&title.venue, &title.name) {
            Some(config_title) => {
                config_title.complete_name(title.instance, title.show_instance_one, abbrev_first)
            }
            None => title.generic_name(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CollectingErrorCallback;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, PartialEq)]
    struct Item(&'static str, u8);

    impl Named for Item {
        fn name(&self) -> &str {
            self.0
        }
    }

    const CONFIG: &str = r#"<Configuration version="5">
        <CalSite name="Events" search="http://example.com/?q=!L!"/>
        <Venue Name="USDAA"><Division Name="Championship"><Level Name="Masters"/></Division></Venue>
        <Venue Name="AKC"><Division Name="Standard"><Level Name="Open"/></Division></Venue>
        <Venue Name="Broken"><Division Name=""/></Venue>
        <FaultType>Refusal</FaultType>
        <OtherPts Name="Breed" Count="All"/>
    </Configuration>"#;

    fn load(xml: &str) -> (Option<Config>, CollectingErrorCallback) {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let config = Config::load_document(&ElementNode::load_xml_str(xml).unwrap(), &text, &mut cb);
        (config, cb)
    }

    #[test]
    fn reorder_by_follows_reference_then_keeps_the_rest() {
        let mut items = vec![Item("c", 0), Item("x", 1), Item("a", 2), Item("y", 3), Item("b", 4)];
        let reference = [Item("a", 9), Item("b", 9), Item("c", 9), Item("z", 9)];
        reorder_by(&mut items, &reference);
        let names: Vec<_> = items.iter().map(|i| i.0).collect();
        assert_eq!(names, ["a", "b", "c", "x", "y"]);
        assert_eq!(items[0].1, 2);
    }

    #[test]
    fn load_skips_bad_venues_and_sorts() {
        let (config, cb) = load(CONFIG);
        let config = config.unwrap();
        assert_eq!(cb.messages().len(), 1);
        let names: Vec<_> = config.venues.iter().map(|v| v.name.as_str()).collect();
        assert_eq!(names, ["AKC", "USDAA"]);
        assert_eq!(config.version, 5);
        assert!(config.update);
        assert_eq!(config.faults.len(), 1);
        assert_eq!(config.other_points.len(), 1);
    }

    #[test]
    fn bad_update_flag_is_fatal() {
        let (config, cb) = load(r#"<Configuration update="maybe"/>"#);
        assert!(config.is_none());
        assert!(cb.text().contains("'update'"));
    }

    #[test]
    fn default_config_wrapper_is_unwrapped() {
        let xml = format!(r#"<DefaultConfig Book="14.0">{CONFIG}</DefaultConfig>"#);
        let (config, _) = load(&xml);
        assert_eq!(config.unwrap().venues.len(), 2);
        let (config, cb) = load(r#"<DefaultConfig Book="14.0"/>"#);
        assert!(config.is_none());
        assert!(cb.text().contains("Missing required 'Configuration'"));
    }

    #[test]
    fn save_then_load_is_equal() {
        let (config, _) = load(CONFIG);
        let mut config = config.unwrap();
        config.update = false;
        let mut root = ElementNode::new("AgilityBook");
        assert!(config.save(&mut root));
        let saved = root.element(0).unwrap();
        assert_eq!(saved.attrib("update"), Some("n"));
        let (reloaded, _) = load(&saved.save_xml());
        let reloaded = reloaded.unwrap();
        assert_eq!(reloaded, config);
        assert!(!reloaded.update);
    }

    #[test]
    fn update_merges_and_reports() {
        let (current, _) = load(CONFIG);
        let mut current = current.unwrap();
        let mut reference = current.clone();
        reference.version = 7;
        reference.faults.add_fault("Knocked bar");
        reference.venues.add_venue(Venue::new("CPE"));
        let mut akc = reference.venues.find_venue("AKC").unwrap().clone();
        akc.divisions.add_division(Division::new("Preferred"));
        reference.venues.delete_venue("AKC");
        reference.venues.add_venue(akc);

        let text = Localization::new();
        let mut info = String::new();
        assert!(current.update(0, &reference, &text, &mut info));
        assert_eq!(
            info,
            "Faults: 1 added, 1 identical\n\
             Venues: 1 added, 1 updated, 1 identical\n\
             -AKC\n   Divisions: 1 added, 0 updated, 1 identical\n   +Preferred\n\
             +CPE\n"
        );
        assert_eq!(current.version, 7);
        assert_eq!(current, reference);

        let mut info = String::new();
        assert!(!current.update(0, &reference, &text, &mut info));
        assert!(info.is_empty());
    }
}
