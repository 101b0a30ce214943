use super::division::DivisionList;
use super::event::EventList;
use super::{reorder_by, Named};
use crate::element::ElementNode;
use crate::error::LoadContext;
use crate::types::ArbDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TREE_MULTIQ: &str = "MultiQ";
const TREE_MULTIQ_ITEM: &str = "MultiQItem";
const ATTRIB_MULTIQ_NAME: &str = "Name";
const ATTRIB_MULTIQ_SHORTNAME: &str = "SName";
const ATTRIB_MULTIQ_VALID_FROM: &str = "ValidFrom";
const ATTRIB_MULTIQ_VALID_TO: &str = "ValidTo";
const ATTRIB_MULTIQ_ITEM_DIV: &str = "Div";
const ATTRIB_MULTIQ_ITEM_LEVEL: &str = "Level";
const ATTRIB_MULTIQ_ITEM_EVENT: &str = "Event";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MultiQItem {
    pub division: String,
    pub level: String,
    pub event: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiQ {
    pub name: String,
    pub short_name: String,
    pub valid_from: ArbDate,
    pub valid_to: ArbDate,
    items: BTreeSet<MultiQItem>,
}

impl Named for MultiQ {
    fn name(&self) -> &str {
        &self.name
    }
}

impl MultiQ {
    pub fn new(name: impl AsRef<str>, short_name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            short_name: short_name.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        self.name.clone()
    }

    pub fn load(
        &mut self,
        divisions: &DivisionList,
        events: &EventList,
        tree: &ElementNode,
        ctx: &mut LoadContext<'_>,
    ) -> bool {
        if tree.name() != TREE_MULTIQ {
            return false;
        }
        let Some(name) = tree.attrib(ATTRIB_MULTIQ_NAME) else {
            ctx.missing_attribute(TREE_MULTIQ, ATTRIB_MULTIQ_NAME);
            return false;
        };
        self.name = name.to_string();
        let Some(short_name) = tree.attrib(ATTRIB_MULTIQ_SHORTNAME) else {
            ctx.missing_attribute(TREE_MULTIQ, ATTRIB_MULTIQ_SHORTNAME);
            return false;
        };
        self.short_name = short_name.to_string();
        if !ctx.read_date(tree, ATTRIB_MULTIQ_VALID_FROM, &mut self.valid_from)
            || !ctx.read_date(tree, ATTRIB_MULTIQ_VALID_TO, &mut self.valid_to)
        {
            return false;
        }

        for element in tree.elements().iter().filter(|e| e.name() == TREE_MULTIQ_ITEM) {
            let Some(item) = load_item(divisions, events, element, ctx) else {
                return false;
            };
            self.items.insert(item);
        }
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let multiq = tree.add_element_node(TREE_MULTIQ, None);
        multiq.add_attrib(ATTRIB_MULTIQ_NAME, self.name.as_str());
        multiq.add_attrib(ATTRIB_MULTIQ_SHORTNAME, self.short_name.as_str());
        multiq.add_attrib_date(ATTRIB_MULTIQ_VALID_FROM, &self.valid_from);
        multiq.add_attrib_date(ATTRIB_MULTIQ_VALID_TO, &self.valid_to);
        for item in &self.items {
            let node = multiq.add_element_node(TREE_MULTIQ_ITEM, None);
            node.add_attrib(ATTRIB_MULTIQ_ITEM_DIV, item.division.as_str());
            node.add_attrib(ATTRIB_MULTIQ_ITEM_LEVEL, item.level.as_str());
            node.add_attrib(ATTRIB_MULTIQ_ITEM_EVENT, item.event.as_str());
        }
        true
    }

    pub fn items(&self) -> impl Iterator<Item = &MultiQItem> {
        self.items.iter()
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn add_item(&mut self, division: &str, level: &str, event: &str) -> bool {
        if division.is_empty() || level.is_empty() || event.is_empty() {
            return false;
        }
        self.items.insert(MultiQItem {
            division: division.to_string(),
            level: level.to_string(),
            event: event.to_string(),
        })
    }

    pub fn remove_item(&mut self, division: &str, level: &str, event: &str) -> bool {
        let before = self.items.len();
        self.items
            .retain(|i| !(i.division == division && i.level == level && i.event == event));
        self.items.len() != before
    }

    pub fn remove_all_items(&mut self) -> bool {
        let had_items = !self.items.is_empty();
        self.items.clear();
        had_items
    }

    fn rewrite_items(&mut self, mut rewrite: impl FnMut(&mut MultiQItem) -> bool) -> usize {
        let mut count = 0;
        self.items = std::mem::take(&mut self.items)
            .into_iter()
            .map(|mut item| {
                if rewrite(&mut item) {
                    count += 1;
                }
                item
            })
            .collect();
        count
    }

    fn remove_items(&mut self, mut matches: impl FnMut(&MultiQItem) -> bool) -> usize {
        let before = self.items.len();
        self.items.retain(|item| !matches(item));
        before - self.items.len()
    }

    pub fn rename_division(&mut self, old_div: &str, new_div: &str) -> usize {
        if old_div == new_div {
            return 0;
        }
        self.rewrite_items(|item| {
            if item.division == old_div {
                item.division = new_div.to_string();
                true
            } else {
                false
            }
        })
    }

    pub fn delete_division(&mut self, division: &str) -> usize {
        self.remove_items(|item| item.division == division)
    }

    pub fn rename_level(&mut self, division: &str, old_level: &str, new_level: &str) -> usize {
        if old_level == new_level {
            return 0;
        }
        self.rewrite_items(|item| {
            if item.division == division && item.level == old_level {
                item.level = new_level.to_string();
                true
            } else {
                false
            }
        })
    }

    pub fn delete_level(&mut self, level: &str) -> usize {
        self.remove_items(|item| item.level == level)
    }

    pub fn rename_event(&mut self, old_event: &str, new_event: &str) -> usize {
        if old_event == new_event {
            return 0;
        }
        self.rewrite_items(|item| {
            if item.event == old_event {
                item.event = new_event.to_string();
                true
            } else {
                false
            }
        })
    }

    pub fn delete_event(&mut self, event: &str) -> usize {
        self.remove_items(|item| item.event == event)
    }
}

fn load_item(
    divisions: &DivisionList,
    events: &EventList,
    element: &ElementNode,
    ctx: &mut LoadContext<'_>,
) -> Option<MultiQItem> {
    let division = ctx.required(element, ATTRIB_MULTIQ_ITEM_DIV)?;
    let level = ctx.required(element, ATTRIB_MULTIQ_ITEM_LEVEL)?;
    let event = ctx.required(element, ATTRIB_MULTIQ_ITEM_EVENT)?;

    let Some(div) = divisions.find_division(&division) else {
        let hint = ctx.text().invalid_reference("division name", &division);
        ctx.invalid_attribute(TREE_MULTIQ_ITEM, ATTRIB_MULTIQ_ITEM_DIV, Some(&hint));
        return None;
    };
    // The item may name a sublevel; events are defined against its level.
    let Some(parent) = div.levels.find_sub_level(&level) else {
        let hint = ctx
            .text()
            .invalid_reference("division/level", &format!("{division}/{level}"));
        ctx.invalid_attribute(TREE_MULTIQ_ITEM, ATTRIB_MULTIQ_ITEM_LEVEL, Some(&hint));
        return None;
    };
    if !events.verify_event(&event, &division, &parent.name, &ArbDate::invalid()) {
        let hint = ctx
            .text()
            .invalid_reference("event name", &format!("{division}/{level}/{event}"));
        ctx.invalid_attribute(TREE_MULTIQ_ITEM, ATTRIB_MULTIQ_ITEM_EVENT, Some(&hint));
        return None;
    }
    Some(MultiQItem {
        division,
        level,
        event,
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MultiQList {
    multiqs: Vec<MultiQ>,
}

impl MultiQList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.multiqs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.multiqs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, MultiQ> {
        self.multiqs.iter()
    }

    pub fn load(
        &mut self,
        divisions: &DivisionList,
        events: &EventList,
        tree: &ElementNode,
        ctx: &mut LoadContext<'_>,
    ) -> bool {
        let mut multiq = MultiQ::default();
        if !multiq.load(divisions, events, tree, ctx) {
            return false;
        }
        self.multiqs.push(multiq);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.multiqs.iter().all(|m| m.save(tree))
    }

    pub fn reorder_by(&mut self, reference: &MultiQList) {
        if self != reference {
            reorder_by(&mut self.multiqs, &reference.multiqs);
        }
    }

    pub fn find_multiq(&self, name: &str, use_short_name: bool) -> Option<&MultiQ> {
        self.multiqs.iter().find(|m| {
            if use_short_name {
                m.short_name == name
            } else {
                m.name == name
            }
        })
    }

    pub fn find_multiq_mut(&mut self, name: &str) -> Option<&mut MultiQ> {
        self.multiqs.iter_mut().find(|m| m.name == name)
    }

    pub fn find_equal(&self, multiq: &MultiQ) -> Option<&MultiQ> {
        self.multiqs.iter().find(|m| *m == multiq)
    }

    pub fn add_multiq(&mut self, multiq: MultiQ) -> bool {
        if self.find_equal(&multiq).is_some() {
            return false;
        }
        self.multiqs.push(multiq);
        true
    }

    pub fn delete_multiq(&mut self, multiq: &MultiQ) -> bool {
        match self.multiqs.iter().position(|m| m == multiq) {
            Some(index) => {
                self.multiqs.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn delete_multiq_by_name(&mut self, name: &str) -> bool {
        match self.multiqs.iter().position(|m| m.name == name) {
            Some(index) => {
                self.multiqs.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn rename_division(&mut self, old_div: &str, new_div: &str) -> usize {
        self.multiqs
            .iter_mut()
            .map(|m| m.rename_division(old_div, new_div))
            .sum()
    }

    pub fn delete_division(&mut self, division: &str) -> usize {
        self.multiqs.iter_mut().map(|m| m.delete_division(division)).sum()
    }

    pub fn rename_level(&mut self, division: &str, old_level: &str, new_level: &str) -> usize {
        self.multiqs
            .iter_mut()
            .map(|m| m.rename_level(division, old_level, new_level))
            .sum()
    }

    pub fn delete_level(&mut self, level: &str) -> usize {
        self.multiqs.iter_mut().map(|m| m.delete_level(level)).sum()
    }

    pub fn rename_event(&mut self, old_event: &str, new_event: &str) -> usize {
        self.multiqs
            .iter_mut()
            .map(|m| m.rename_event(old_event, new_event))
            .sum()
    }

    pub fn delete_event(&mut self, event: &str) -> usize {
        self.multiqs.iter_mut().map(|m| m.delete_event(event)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::venue::Venue;
    use crate::config::{FaultList, OtherPointsList};
    use crate::error::{CollectingErrorCallback, Localization};
    use crate::types::CURRENT_DOC_VERSION;

    const VENUE: &str = r#"<Venue Name="AKC">
        <Division Name="Standard">
            <Level Name="Novice"><SubLevel Name="Novice A"/><SubLevel Name="Novice B"/></Level>
            <Level Name="Excellent"/>
        </Division>
        <Event Name="Agility">
            <Scoring Division="Standard" Level="*" type="FaultsThenTime"/>
        </Event>
        <Event Name="Jumpers">
            <Scoring Division="Standard" Level="Excellent" type="FaultsThenTime"/>
        </Event>
        <MultiQ Name="Double Q" SName="QQ">
            <MultiQItem Div="Standard" Level="Excellent" Event="Agility"/>
            <MultiQItem Div="Standard" Level="Excellent" Event="Jumpers"/>
        </MultiQ>
    </Venue>"#;

    fn load_venue(xml: &str) -> (Option<Venue>, CollectingErrorCallback) {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut venue = Venue::default();
        let ok = {
            let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
            venue.load(
                &ElementNode::load_xml_str(xml).unwrap(),
                &mut FaultList::new(),
                &mut OtherPointsList::new(),
                &mut ctx,
            )
        };
        (ok.then_some(venue), cb)
    }

    #[test]
    fn items_are_verified_against_the_venue() {
        let (venue, cb) = load_venue(VENUE);
        assert!(cb.is_empty(), "{}", cb.text());
        let venue = venue.unwrap();
        let multiq = venue.multiqs.find_multiq("QQ", true).unwrap();
        assert_eq!(multiq.item_count(), 2);
    }

    #[test]
    fn sublevel_items_resolve_through_their_level() {
        let xml = VENUE.replace(
            r#"<MultiQItem Div="Standard" Level="Excellent" Event="Jumpers"/>"#,
            r#"<MultiQItem Div="Standard" Level="Novice A" Event="Agility"/>"#,
        );
        let (venue, cb) = load_venue(&xml);
        assert!(venue.is_some(), "{}", cb.text());
    }

    #[test]
    fn unknown_event_is_rejected() {
        let xml = VENUE.replace(r#"Event="Jumpers""#, r#"Event="Snooker""#);
        let (venue, cb) = load_venue(&xml);
        assert!(venue.is_none());
        assert!(cb.text().contains("Invalid event name: Standard/Excellent/Snooker"));
    }

    #[test]
    fn rename_and_delete_count_items() {
        let mut multiq = MultiQ::new("Double Q", "QQ");
        assert!(multiq.add_item("Standard", "Excellent", "Agility"));
        assert!(multiq.add_item("Standard", "Excellent", "Jumpers"));
        assert!(!multiq.add_item("Standard", "Excellent", "Jumpers"));
        assert!(!multiq.add_item("", "Excellent", "Jumpers"));

        assert_eq!(multiq.rename_level("Standard", "Excellent", "Masters"), 2);
        assert_eq!(multiq.rename_level("Standard", "Excellent", "Masters"), 0);
        assert_eq!(multiq.rename_event("Jumpers", "JWW"), 1);
        assert!(multiq
            .items()
            .any(|i| i.level == "Masters" && i.event == "JWW"));
        assert_eq!(multiq.delete_event("Agility"), 1);
        assert_eq!(multiq.delete_division("Standard"), 1);
        assert_eq!(multiq.item_count(), 0);
    }

    #[test]
    fn add_multiq_rejects_structural_duplicates() {
        let mut list = MultiQList::new();
        assert!(list.add_multiq(MultiQ::new("Double Q", "QQ")));
        assert!(!list.add_multiq(MultiQ::new("Double Q", "QQ")));
        assert!(list.delete_multiq_by_name("Double Q"));
        assert!(list.is_empty());
    }
}
