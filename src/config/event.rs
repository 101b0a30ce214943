use super::division::DivisionList;
use super::scoring::{Scoring, ScoringList, TREE_SCORING};
use super::{indents, reorder_by, Named};
use crate::element::ElementNode;
use crate::error::{LoadContext, Localization};
use crate::types::{ArbDate, ArbVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TREE_EVENT: &str = "Event";
const TREE_EVENT_DESC: &str = "Desc";
const TREE_EVENT_SUBNAME: &str = "SubName";
const ATTRIB_EVENT_NAME: &str = "Name";
const ATTRIB_EVENT_SHORTNAME: &str = "ShortName";
const ATTRIB_EVENT_HASPARTNER: &str = "hasPartner";
const ATTRIB_EVENT_HASTABLE: &str = "hasTable";
const ATTRIB_EVENT_HASSUBNAMES: &str = "hasSubNames";

const VERSION_SCORING_SUBNAMES: ArbVersion = ArbVersion::new(15, 0);

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub short_name: String,
    pub desc: String,
    pub has_partner: bool,
    pub scorings: ScoringList,
}

impl Named for Event {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Event {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        self.name.clone()
    }

    pub fn verify_event(&self, division: &str, level: &str, date: &ArbDate) -> bool {
        self.scorings.verify_event(division, level, date)
    }

    pub fn find_event(&self, division: &str, level: &str, date: &ArbDate) -> Option<&Scoring> {
        self.scorings.find_event(division, level, date)
    }

    pub fn load(&mut self, divisions: &DivisionList, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_EVENT {
            return false;
        }
        let Some(name) = ctx.required(tree, ATTRIB_EVENT_NAME) else {
            return false;
        };
        self.name = name;
        tree.read_attrib(ATTRIB_EVENT_SHORTNAME, &mut self.short_name);
        if !ctx.read_bool(tree, ATTRIB_EVENT_HASPARTNER, &mut self.has_partner) {
            return false;
        }

        let legacy = ctx.version() < VERSION_SCORING_SUBNAMES;
        let mut has_table = false;
        let mut has_sub_names = false;
        if legacy
            && (!ctx.read_bool(tree, ATTRIB_EVENT_HASTABLE, &mut has_table)
                || !ctx.read_bool(tree, ATTRIB_EVENT_HASSUBNAMES, &mut has_sub_names))
        {
            return false;
        }

        let mut sub_names = BTreeSet::new();
        for element in tree.elements() {
            match element.name() {
                TREE_EVENT_DESC => self.desc = element.value().to_string(),
                TREE_SCORING => {
                    if !self.scorings.load(divisions, element, ctx) {
                        return false;
                    }
                }
                TREE_EVENT_SUBNAME if legacy => {
                    sub_names.insert(element.value().to_string());
                }
                _ => {}
            }
        }

        if legacy && (has_table || has_sub_names) {
            for scoring in self.scorings.iter_mut() {
                scoring.has_table = has_table;
                scoring.has_sub_names = has_sub_names;
                scoring.sub_names = sub_names.clone();
            }
        }
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let event = tree.add_element_node(TREE_EVENT, None);
        event.add_attrib(ATTRIB_EVENT_NAME, self.name.as_str());
        if !self.desc.is_empty() {
            event
                .add_element_node(TREE_EVENT_DESC, None)
                .set_value(self.desc.as_str());
        }
        if !self.short_name.is_empty() {
            event.add_attrib(ATTRIB_EVENT_SHORTNAME, self.short_name.as_str());
        }
        if self.has_partner {
            event.add_attrib_bool(ATTRIB_EVENT_HASPARTNER, true);
        }
        self.scorings.save(event)
    }

    pub fn update(&mut self, indent: usize, other: &Event, text: &Localization, info: &mut String) -> bool {
        let (_, indent_buffer) = indents(indent);
        let mut changes = false;
        if self.short_name != other.short_name {
            self.short_name = other.short_name.clone();
            changes = true;
        }
        if self.desc != other.desc {
            self.desc = other.desc.clone();
            changes = true;
        }
        if self.has_partner != other.has_partner {
            self.has_partner = other.has_partner;
            changes = true;
        }

        if self.scorings != other.scorings {
            let same_key = |a: &Scoring, b: &Scoring| a.division == b.division && a.level == b.level;
            let (mut added, mut deleted, mut changed, mut skipped) = (0, 0, 0, 0);
            for mine in self.scorings.iter() {
                match other.scorings.iter().find(|theirs| same_key(mine, theirs)) {
                    Some(theirs) if mine == theirs => skipped += 1,
                    Some(_) => changed += 1,
                    None => deleted += 1,
                }
            }
            for theirs in other.scorings.iter() {
                if !self.scorings.iter().any(|mine| same_key(mine, theirs)) {
                    added += 1;
                }
            }
            self.scorings = other.scorings.clone();
            if added > 0 || deleted > 0 || changed > 0 {
                info.push_str(&format!(
                    "{indent_buffer}{}{}\n",
                    self.name,
                    text.update_rules(added, deleted, changed, skipped)
                ));
                changes = true;
            }
        }
        changes
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventList {
    events: Vec<Event>,
}

impl EventList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Event> {
        self.events.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Event> {
        self.events.iter_mut()
    }

    pub fn load(&mut self, divisions: &DivisionList, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut event = Event::default();
        if !event.load(divisions, tree, ctx) {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.events.iter().all(|e| e.save(tree))
    }

    pub fn reorder_by(&mut self, reference: &EventList) {
        if self != reference {
            reorder_by(&mut self.events, &reference.events);
        }
    }

    pub fn verify_event(&self, event: &str, division: &str, level: &str, date: &ArbDate) -> bool {
        self.find_event(event)
            .is_some_and(|e| e.verify_event(division, level, date))
    }

    pub fn find_event(&self, name: &str) -> Option<&Event> {
        self.events.iter().find(|e| e.name == name)
    }

    pub fn find_event_mut(&mut self, name: &str) -> Option<&mut Event> {
        self.events.iter_mut().find(|e| e.name == name)
    }

    pub fn find_event_scoring(
        &self,
        event: &str,
        division: &str,
        level: &str,
        date: &ArbDate,
    ) -> Option<(&Event, &Scoring)> {
        let found = self.find_event(event)?;
        found
            .find_event(division, level, date)
            .map(|scoring| (found, scoring))
    }

    pub fn add_event(&mut self, event: Event) -> bool {
        if event.name.is_empty() || self.find_event(&event.name).is_some() {
            return false;
        }
        self.events.push(event);
        true
    }

    pub fn delete_event(&mut self, name: &str) -> bool {
        match self.events.iter().position(|e| e.name == name) {
            Some(index) => {
                self.events.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn rename_division(&mut self, old_div: &str, new_div: &str) -> usize {
        self.events
            .iter_mut()
            .map(|e| e.scorings.rename_division(old_div, new_div))
            .sum()
    }

    pub fn delete_division(&mut self, division: &str) -> usize {
        self.events
            .iter_mut()
            .map(|e| e.scorings.delete_division(division))
            .sum()
    }

    pub fn rename_level(&mut self, division: &str, old_level: &str, new_level: &str) -> usize {
        self.events
            .iter_mut()
            .map(|e| e.scorings.rename_level(division, old_level, new_level))
            .sum()
    }

    pub fn delete_level(&mut self, division: &str, level: &str) -> usize {
        self.events
            .iter_mut()
            .map(|e| e.scorings.delete_level(division, level))
            .sum()
    }

    pub fn rename_lifetime_name(&mut self, old_name: &str, new_name: &str) -> usize {
        self.events
            .iter_mut()
            .map(|e| e.scorings.rename_lifetime_name(old_name, new_name))
            .sum()
    }

    pub fn delete_lifetime_name(&mut self, name: &str) -> usize {
        self.events
            .iter_mut()
            .map(|e| e.scorings.delete_lifetime_name(name))
            .sum()
    }

    pub fn has_lifetime_points(&self) -> bool {
        self.events
            .iter()
            .flat_map(|e| e.scorings.iter())
            .any(|s| !s.lifetime_points.is_empty())
    }

    pub(crate) fn name_unnamed_lifetime_points(&mut self, name: &str) -> usize {
        self.rename_lifetime_name("", name)
    }
}
