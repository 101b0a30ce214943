use super::division::{DivisionList, TREE_DIVISION};
use super::event::{Event, EventList, TREE_EVENT};
use super::fault::{Fault, FaultList, TREE_FAULTTYPE};
use super::multiq::{MultiQList, TREE_MULTIQ};
use super::otherpoints::{OtherPointsList, TREE_OTHERPTS};
use super::scoring::Scoring;
use super::title::{Title, TitleList, TREE_TITLES};
use super::{indents, Named};
use crate::element::ElementNode;
use crate::error::{LoadContext, Localization};
use crate::types::{ArbDate, ArbVersion, VERSION_CONFIG_OTHERPTS};
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const TREE_VENUE: &str = "Venue";
const TREE_VENUE_DESC: &str = "Desc";
const TREE_VENUE_LIFETIMENAME: &str = "LifetimeName";
const ATTRIB_VENUE_NAME: &str = "Name";
const ATTRIB_VENUE_LONGNAME: &str = "LongName";
const ATTRIB_VENUE_URL: &str = "URL";
const ATTRIB_VENUE_ICON: &str = "icon";
const ATTRIB_VENUE_LIFETIMENAME: &str = "LifetimeName";
const ATTRIB_LIFETIMENAME_NAME: &str = "Name";

const VERSION_LIFETIME_NAMES: ArbVersion = ArbVersion::new(14, 4);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeName {
    pub name: String,
}

impl Named for LifetimeName {
    fn name(&self) -> &str {
        &self.name
    }
}

impl LifetimeName {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
        }
    }

    pub fn load(&mut self, tree: &ElementNode, _ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_VENUE_LIFETIMENAME {
            return false;
        }
        tree.read_attrib(ATTRIB_LIFETIMENAME_NAME, &mut self.name);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        tree.add_element_node(TREE_VENUE_LIFETIMENAME, None)
            .add_attrib(ATTRIB_LIFETIMENAME_NAME, self.name.as_str());
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifetimeNameList {
    names: Vec<LifetimeName>,
}

impl LifetimeNameList {
    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LifetimeName> {
        self.names.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut name = LifetimeName::default();
        if !name.load(tree, ctx) {
            return false;
        }
        self.names.push(name);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.names.iter().all(|n| n.save(tree))
    }

    pub fn find_lifetime_name(&self, name: &str) -> Option<&LifetimeName> {
        self.names.iter().find(|n| n.name == name)
    }

    pub fn add_lifetime_name(&mut self, name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        if self.find_lifetime_name(name).is_some() {
            return false;
        }
        self.names.push(LifetimeName::new(name));
        true
    }

    pub fn rename_lifetime_name(&mut self, old_name: &str, new_name: &str) -> bool {
        match self.names.iter_mut().find(|n| n.name == old_name) {
            Some(found) => {
                found.name = new_name.to_string();
                true
            }
            None => false,
        }
    }

    pub fn delete_lifetime_name(&mut self, name: &str) -> bool {
        match self.names.iter().position(|n| n.name == name) {
            Some(index) => {
                self.names.remove(index);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Venue {
    pub name: String,
    pub long_name: String,
    pub url: String,
    pub desc: String,
    pub icon: i16,
    pub lifetime_names: LifetimeNameList,
    pub titles: TitleList,
    pub divisions: DivisionList,
    pub events: EventList,
    pub multiqs: MultiQList,
}

impl Default for Venue {
    fn default() -> Self {
        Self {
            name: String::new(),
            long_name: String::new(),
            url: String::new(),
            desc: String::new(),
            icon: -1,
            lifetime_names: LifetimeNameList::default(),
            titles: TitleList::default(),
            divisions: DivisionList::default(),
            events: EventList::default(),
            multiqs: MultiQList::default(),
        }
    }
}

impl Named for Venue {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Venue {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        self.name.clone()
    }

    /// Divisions must precede events, and both must precede multi-Qs.
    /// Pre-3.0 venues carried fault types and other points, which move to
    /// the configuration lists.
    pub fn load(
        &mut self,
        tree: &ElementNode,
        faults: &mut FaultList,
        other_points: &mut OtherPointsList,
        ctx: &mut LoadContext<'_>,
    ) -> bool {
        if tree.name() != TREE_VENUE {
            return false;
        }
        let Some(name) = ctx.required(tree, ATTRIB_VENUE_NAME) else {
            return false;
        };
        self.name = name;
        tree.read_attrib(ATTRIB_VENUE_LONGNAME, &mut self.long_name);
        tree.read_attrib(ATTRIB_VENUE_URL, &mut self.url);
        let version = ctx.version();
        if version < VERSION_LIFETIME_NAMES {
            if let Some(lifetime) = tree.attrib(ATTRIB_VENUE_LIFETIMENAME) {
                self.lifetime_names.add_lifetime_name(lifetime);
            }
        }
        if !ctx.read_number(tree, ATTRIB_VENUE_ICON, &mut self.icon) {
            return false;
        }

        for element in tree.elements() {
            let ok = match element.name() {
                TREE_VENUE_DESC => {
                    self.desc = element.value().to_string();
                    true
                }
                TREE_VENUE_LIFETIMENAME => self.lifetime_names.load(element, ctx),
                TREE_TITLES => self.titles.load(element, ctx, false),
                TREE_DIVISION => {
                    if !self.events.is_empty() {
                        let msg = ctx.text().invalid_venue_config(TREE_DIVISION, TREE_EVENT);
                        ctx.invalid_structure(Some(&msg));
                        return false;
                    }
                    self.divisions.load(element, ctx, &mut self.titles)
                }
                TREE_EVENT => self.events.load(&self.divisions, element, ctx),
                TREE_MULTIQ => self.multiqs.load(&self.divisions, &self.events, element, ctx),
                TREE_FAULTTYPE if version < VERSION_CONFIG_OTHERPTS => {
                    let mut fault = Fault::default();
                    if fault.load(element, ctx) && faults.find_fault(&fault.name).is_none() {
                        faults.add_fault(&fault.name);
                    }
                    true
                }
                TREE_OTHERPTS if version < VERSION_CONFIG_OTHERPTS => {
                    other_points.load(element, ctx);
                    true
                }
                _ => true,
            };
            if !ok {
                debug!(venue = %self.name, element = element.name(), "venue child failed to load");
                return false;
            }
        }

        if version < VERSION_LIFETIME_NAMES {
            if self.lifetime_names.is_empty() && self.events.has_lifetime_points() {
                self.lifetime_names.add_lifetime_name("");
            }
            if self.lifetime_names.len() == 1 {
                if let Some(only) = self.lifetime_names.iter().next().map(|n| n.name.clone()) {
                    if !only.is_empty() {
                        self.events.name_unnamed_lifetime_points(&only);
                    }
                }
            }
        }
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let venue = tree.add_element_node(TREE_VENUE, None);
        venue.add_attrib(ATTRIB_VENUE_NAME, self.name.as_str());
        if !self.long_name.is_empty() {
            venue.add_attrib(ATTRIB_VENUE_LONGNAME, self.long_name.as_str());
        }
        if !self.url.is_empty() {
            venue.add_attrib(ATTRIB_VENUE_URL, self.url.as_str());
        }
        venue.add_attrib_int(ATTRIB_VENUE_ICON, i64::from(self.icon));
        if !self.desc.is_empty() {
            venue
                .add_element_node(TREE_VENUE_DESC, None)
                .set_value(self.desc.as_str());
        }
        self.lifetime_names.save(venue)
            && self.titles.save(venue)
            && self.divisions.save(venue)
            && self.events.save(venue)
            && self.multiqs.save(venue)
    }

    pub fn update(&mut self, indent: usize, other: &Venue, text: &Localization, info: &mut String) -> bool {
        if self.name != other.name {
            return false;
        }
        let (indent_name, indent_buffer) = indents(indent);
        let mut report = String::new();
        let mut changes = false;

        if self.long_name != other.long_name {
            self.long_name = other.long_name.clone();
            changes = true;
        }
        if self.url != other.url {
            self.url = other.url.clone();
            changes = true;
        }
        if self.desc != other.desc {
            self.desc = other.desc.clone();
            changes = true;
        }
        if self.icon != other.icon {
            self.icon = other.icon;
            changes = true;
        }

        if self.lifetime_names != other.lifetime_names {
            let (mut added, mut skipped) = (0, 0);
            for name in other.lifetime_names.iter() {
                if self.lifetime_names.add_lifetime_name(&name.name) {
                    added += 1;
                } else {
                    skipped += 1;
                }
            }
            if added > 0 {
                report.push_str(&format!(
                    "{indent_buffer}{}\n",
                    text.update_lifetime_names(added, skipped)
                ));
            }
        }

        if self.titles != other.titles {
            let (mut added, mut changed, mut skipped) = (0, 0, 0);
            for title in other.titles.iter() {
                match self.titles.find_title_mut(&title.name) {
                    Some(existing) if *existing == *title => skipped += 1,
                    Some(existing) => {
                        *existing = title.clone();
                        changed += 1;
                    }
                    None => {
                        self.titles.add_title(title.clone());
                        added += 1;
                    }
                }
            }
            self.titles.reorder_by(&other.titles);
            let line = if added > 0 || changed > 0 {
                text.update_titles(added, changed, skipped)
            } else {
                text.update_titles_reordered()
            };
            report.push_str(&format!("{indent_buffer}{line}\n"));
        }

        if self.divisions != other.divisions {
            let mut details = String::new();
            let (mut added, mut changed, mut skipped) = (0, 0, 0);
            for division in other.divisions.iter() {
                match self.divisions.find_division_mut(&division.name) {
                    Some(existing) if *existing == *division => skipped += 1,
                    Some(existing) => {
                        if existing.update(indent + 1, division, text, &mut details) {
                            changed += 1;
                        }
                    }
                    None => {
                        self.divisions.add_division(division.clone());
                        added += 1;
                        details.push_str(&format!("{indent_buffer}+{}\n", division.name));
                    }
                }
            }
            self.divisions.reorder_by(&other.divisions);
            if added > 0 || changed > 0 {
                report.push_str(&format!(
                    "{indent_buffer}{}\n{details}",
                    text.update_divisions(added, changed, skipped)
                ));
            } else {
                report.push_str(&format!("{indent_buffer}{}\n", text.update_divisions_reordered()));
            }
        }

        if self.events != other.events {
            let mut details = String::new();
            let (mut added, mut changed, mut skipped) = (0, 0, 0);
            for event in other.events.iter() {
                match self.events.find_event_mut(&event.name) {
                    Some(existing) if *existing == *event => skipped += 1,
                    Some(existing) => {
                        if existing.update(indent + 1, event, text, &mut details) {
                            changed += 1;
                        }
                    }
                    None => {
                        self.events.add_event(event.clone());
                        added += 1;
                        details.push_str(&format!("{indent_buffer}+{}\n", event.name));
                    }
                }
            }
            self.events.reorder_by(&other.events);
            if added > 0 || changed > 0 {
                report.push_str(&format!(
                    "{indent_buffer}{}\n{details}",
                    text.update_events(added, changed, skipped)
                ));
            } else {
                report.push_str(&format!("{indent_buffer}{}\n", text.update_events_reordered()));
            }
        }

        if self.multiqs != other.multiqs {
            let (mut added, mut deleted, mut skipped) = (0, 0, 0);
            for mine in self.multiqs.iter() {
                if other.multiqs.find_equal(mine).is_some() {
                    skipped += 1;
                } else {
                    deleted += 1;
                }
            }
            for theirs in other.multiqs.iter() {
                if self.multiqs.find_equal(theirs).is_none() {
                    added += 1;
                }
            }
            self.multiqs = other.multiqs.clone();
            let line = if added > 0 || deleted > 0 {
                text.update_multiqs(added, deleted, skipped)
            } else {
                text.update_multiqs_reordered()
            };
            report.push_str(&format!("{indent_buffer}{line}\n"));
        }

        if !report.is_empty() {
            changes = true;
            info.push_str(&format!("{indent_name}{}\n{report}", self.name));
        }
        changes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VenueList {
    venues: Vec<Venue>,
}

impl VenueList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.venues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.venues.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Venue> {
        self.venues.iter()
    }

    pub fn load(
        &mut self,
        tree: &ElementNode,
        faults: &mut FaultList,
        other_points: &mut OtherPointsList,
        ctx: &mut LoadContext<'_>,
    ) -> bool {
        let mut venue = Venue::default();
        if !venue.load(tree, faults, other_points, ctx) {
            return false;
        }
        self.venues.push(venue);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.venues.iter().all(|v| v.save(tree))
    }

    pub fn sort(&mut self) {
        self.venues
            .sort_by_cached_key(|v| v.name.to_lowercase());
    }

    pub fn find_venue(&self, name: &str) -> Option<&Venue> {
        self.venues.iter().find(|v| v.name == name)
    }

    pub fn find_venue_mut(&mut self, name: &str) -> Option<&mut Venue> {
        self.venues.iter_mut().find(|v| v.name == name)
    }

    pub fn add_venue(&mut self, venue: Venue) -> bool {
        if venue.name.is_empty() || self.find_venue(&venue.name).is_some() {
            return false;
        }
        self.venues.push(venue);
        self.sort();
        true
    }

    pub fn delete_venue(&mut self, name: &str) -> usize {
        match self.venues.iter().position(|v| v.name == name) {
            Some(index) => {
                self.venues.remove(index);
                1
            }
            None => 0,
        }
    }

    pub fn verify_venue(&self, name: &str) -> bool {
        self.find_venue(name).is_some()
    }

    pub fn verify_multiq(&self, venue: &str, multiq: &str, use_short_name: bool) -> bool {
        self.find_venue(venue)
            .is_some_and(|v| v.multiqs.find_multiq(multiq, use_short_name).is_some())
    }

    pub fn verify_level(&self, venue: &str, division: &str, level: &str) -> bool {
        self.find_venue(venue)
            .is_some_and(|v| v.divisions.verify_level(division, level))
    }

    pub fn verify_event(&self, venue: &str, division: &str, level: &str, event: &str, date: &ArbDate) -> bool {
        self.find_event(venue, event, division, level, date).is_some()
    }

    pub fn find_event(
        &self,
        venue: &str,
        event: &str,
        division: &str,
        level: &str,
        date: &ArbDate,
    ) -> Option<(&Event, &Scoring)> {
        let venue = self.find_venue(venue)?;
        let parent = venue
            .divisions
            .find_division(division)?
            .levels
            .find_sub_level(level)?;
        venue
            .events
            .find_event_scoring(event, division, &parent.name, date)
    }

    pub fn find_title(&self, venue: &str, title: &str) -> Option<&Title> {
        self.find_venue(venue)?.titles.find_title(title)
    }

    pub fn find_title_complete_name(&self, venue: &str, name: &str, abbrev_first: bool) -> Option<&Title> {
        self.find_venue(venue)?
            .titles
            .find_title_complete_name(name, 0, false, abbrev_first)
    }
}
