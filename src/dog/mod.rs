//! The dog side of the record book. Everything here names config entities
//! by string, so config edits cascade through the count/rename/delete
//! helpers on [`DogList`].

mod existing;
mod regnum;
mod run;
mod title;
mod trial;

pub use existing::{ExistingPointType, ExistingPoints, ExistingPointsList};
pub use regnum::{RegNum, RegNumList};
pub use run::{
    Partner, QualifyType, Run, RunList, RunNotes, RunOtherPoints, RunScoring, RunScoringKind,
};
pub use title::{DogTitle, DogTitleList};
pub use trial::{Club, ClubList, Trial, TrialList};

use crate::config::Config;
use crate::element::ElementNode;
use crate::error::LoadContext;
use crate::types::ArbDate;
use existing::TREE_EXISTING_PTS;
use regnum::TREE_REGNUM;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use title::TREE_TITLE;
use tracing::debug;
use trial::TREE_TRIAL;

pub const TREE_DOG: &str = "Dog";
const TREE_REGNAME: &str = "RegisteredName";
const TREE_BREED: &str = "Breed";
const TREE_NOTE: &str = "Note";
const ATTRIB_DOG_CALLNAME: &str = "CallName";
const ATTRIB_DOG_DOB: &str = "DOB";
const ATTRIB_DOG_DECEASED: &str = "Deceased";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Dog {
    pub call_name: String,
    pub dob: ArbDate,
    pub deceased: ArbDate,
    pub registered_name: String,
    pub breed: String,
    pub note: String,
    pub existing_points: ExistingPointsList,
    pub reg_nums: RegNumList,
    pub titles: DogTitleList,
    pub trials: TrialList,
}

impl Dog {
    pub fn new(call_name: impl AsRef<str>) -> Self {
        Self {
            call_name: call_name.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        self.call_name.clone()
    }

    pub fn search_strings(&self, strings: &mut BTreeSet<String>) -> usize {
        let mut count = 0;
        for text in [
            self.call_name.clone(),
            self.dob.to_iso_string(),
            self.deceased.to_iso_string(),
            self.registered_name.clone(),
            self.breed.clone(),
            self.note.clone(),
        ] {
            if !text.is_empty() {
                strings.insert(text);
                count += 1;
            }
        }
        count += self
            .existing_points
            .iter()
            .map(|p| p.search_strings(strings))
            .sum::<usize>();
        count += self
            .reg_nums
            .iter()
            .map(|r| r.search_strings(strings))
            .sum::<usize>();
        count += self
            .titles
            .iter()
            .map(|t| t.search_strings(strings))
            .sum::<usize>();
        count
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_DOG {
            return false;
        }
        let Some(call_name) = ctx.required(tree, ATTRIB_DOG_CALLNAME) else {
            return false;
        };
        self.call_name = call_name;
        for (attrib, slot) in [
            (ATTRIB_DOG_DOB, &mut self.dob),
            (ATTRIB_DOG_DECEASED, &mut self.deceased),
        ] {
            if !ctx.read_date(tree, attrib, slot) {
                return false;
            }
        }

        for element in tree.elements() {
            let loaded = match element.name() {
                TREE_REGNAME => {
                    self.registered_name = element.value().to_string();
                    true
                }
                TREE_BREED => {
                    self.breed = element.value().to_string();
                    true
                }
                TREE_NOTE => {
                    self.note = element.value().to_string();
                    true
                }
                TREE_EXISTING_PTS => self.existing_points.load(element, ctx),
                TREE_REGNUM => self.reg_nums.load(element, ctx),
                TREE_TITLE => self.titles.load(element, ctx),
                TREE_TRIAL => self.trials.load(element, ctx),
                _ => true,
            };
            if !loaded {
                debug!(dog = %self.call_name, element = element.name(), "skipped unreadable entry");
            }
        }
        self.existing_points.sort();
        self.reg_nums.sort();
        self.titles.sort();
        self.trials.sort(true);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let dog = tree.add_element_node(TREE_DOG, None);
        dog.add_attrib(ATTRIB_DOG_CALLNAME, self.call_name.as_str());
        if self.dob.is_valid() {
            dog.add_attrib_date(ATTRIB_DOG_DOB, &self.dob);
        }
        if self.deceased.is_valid() {
            dog.add_attrib_date(ATTRIB_DOG_DECEASED, &self.deceased);
        }
        for (name, value) in [
            (TREE_REGNAME, &self.registered_name),
            (TREE_BREED, &self.breed),
            (TREE_NOTE, &self.note),
        ] {
            if !value.is_empty() {
                dog.add_element_node(name, None).set_value(value.as_str());
            }
        }
        self.existing_points.save(dog)
            && self.reg_nums.save(dog)
            && self.titles.save(dog)
            && self.trials.save(dog)
    }

    pub fn count_venue_refs(&self, venue: &str) -> usize {
        self.existing_points.count_in_venue(venue)
            + self.reg_nums.count_in_venue(venue)
            + self.titles.count_in_venue(venue)
            + self.trials.count_in_venue(venue)
    }

    pub fn rename_venue(&mut self, old_venue: &str, new_venue: &str) -> usize {
        self.existing_points.rename_venue(old_venue, new_venue)
            + self.reg_nums.rename_venue(old_venue, new_venue)
            + self.titles.rename_venue(old_venue, new_venue)
            + self.trials.rename_venue(old_venue, new_venue)
    }

    pub fn delete_venue(&mut self, venue: &str) -> usize {
        self.existing_points.delete_venue(venue)
            + self.reg_nums.delete_venue(venue)
            + self.titles.delete_venue(venue)
            + self.trials.delete_venue(venue)
    }

    pub fn delete_division(&mut self, config: &Config, venue: &str, division: &str) -> usize {
        self.existing_points.delete_division(venue, division)
            + self.trials.delete_division(config, venue, division)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DogList {
    dogs: Vec<Dog>,
}

impl DogList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.dogs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dogs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Dog> {
        self.dogs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Dog> {
        self.dogs.iter_mut()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut dog = Dog::default();
        if !dog.load(tree, ctx) {
            return false;
        }
        self.dogs.push(dog);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.dogs.iter().all(|d| d.save(tree))
    }

    pub fn add_dog(&mut self, dog: Dog) -> bool {
        self.dogs.push(dog);
        true
    }

    pub fn delete_dog(&mut self, dog: &Dog) -> bool {
        match self.dogs.iter().position(|d| d == dog) {
            Some(index) => {
                self.dogs.remove(index);
                true
            }
            None => false,
        }
    }

    fn sum(&self, f: impl Fn(&Dog) -> usize) -> usize {
        self.dogs.iter().map(f).sum()
    }

    fn sum_mut(&mut self, mut f: impl FnMut(&mut Dog) -> usize) -> usize {
        self.dogs.iter_mut().map(|d| f(d)).sum()
    }

    pub fn count_venue_refs(&self, venue: &str) -> usize {
        self.sum(|d| d.count_venue_refs(venue))
    }

    pub fn rename_venue(&mut self, old_venue: &str, new_venue: &str) -> usize {
        self.sum_mut(|d| d.rename_venue(old_venue, new_venue))
    }

    pub fn delete_venue(&mut self, venue: &str) -> usize {
        self.sum_mut(|d| d.delete_venue(venue))
    }

    pub fn count_other_points(&self, name: &str) -> usize {
        self.sum(|d| d.existing_points.count_other_points(name) + d.trials.count_other_points(name))
    }

    pub fn rename_other_points(&mut self, old_name: &str, new_name: &str) -> usize {
        self.sum_mut(|d| {
            d.existing_points.rename_other_points(old_name, new_name)
                + d.trials.rename_other_points(old_name, new_name)
        })
    }

    pub fn delete_other_points(&mut self, name: &str) -> usize {
        self.sum_mut(|d| d.existing_points.delete_other_points(name) + d.trials.delete_other_points(name))
    }

    pub fn count_multiq(&self, venue: &str, name: &str) -> usize {
        self.sum(|d| d.existing_points.count_multiq(venue, name))
    }

    pub fn rename_multiq(&mut self, venue: &str, old_name: &str, new_name: &str) -> usize {
        self.sum_mut(|d| d.existing_points.rename_multiq(venue, old_name, new_name))
    }

    pub fn delete_stale_multiqs(&mut self, config: &Config, venue: &str) -> usize {
        let exists = |name: &str| {
            config
                .venues
                .find_venue(venue)
                .is_some_and(|v| v.multiqs.find_multiq(name, false).is_some())
        };
        self.sum_mut(|d| d.existing_points.delete_stale_multiqs(venue, exists))
    }

    pub fn count_runs_in_division(&self, venue: &str, division: &str) -> usize {
        self.sum(|d| d.trials.count_divisions_in_use(venue, division))
    }

    pub fn count_existing_in_division(&self, venue: &str, division: &str) -> usize {
        self.sum(|d| d.existing_points.count_in_division(venue, division))
    }

    pub fn rename_division(&mut self, venue: &str, old_div: &str, new_div: &str) -> usize {
        self.sum_mut(|d| {
            d.existing_points.rename_division(venue, old_div, new_div)
                + d.trials.rename_division(venue, old_div, new_div)
        })
    }

    pub fn delete_division(&mut self, config: &Config, venue: &str, division: &str) -> usize {
        self.sum_mut(|d| d.delete_division(config, venue, division))
    }

    pub fn count_levels_in_use(&self, venue: &str, division: &str, level: &str) -> usize {
        self.sum(|d| {
            d.existing_points.count_in_level(venue, division, level)
                + d.trials.count_levels_in_use(venue, division, level)
        })
    }

    pub fn rename_level(&mut self, venue: &str, division: &str, old_level: &str, new_level: &str) -> usize {
        self.sum_mut(|d| {
            d.existing_points.rename_level(venue, division, old_level, new_level)
                + d.trials.rename_level(venue, division, old_level, new_level)
        })
    }

    pub fn delete_level(&mut self, venue: &str, division: &str, level: &str) -> usize {
        self.sum_mut(|d| {
            d.existing_points.delete_level(venue, division, level)
                + d.trials.delete_level(venue, division, level)
        })
    }

    pub fn count_titles_in_use(&self, venue: &str, title: &str) -> usize {
        self.sum(|d| d.titles.count_titles_in_use(venue, title))
    }

    pub fn rename_title(&mut self, venue: &str, old_name: &str, new_name: &str) -> usize {
        self.sum_mut(|d| d.titles.rename_title(venue, old_name, new_name))
    }

    pub fn delete_title(&mut self, venue: &str, title: &str) -> usize {
        self.sum_mut(|d| d.titles.delete_titles(venue, title))
    }

    pub fn count_events_in_use(&self, venue: &str, event: &str) -> usize {
        self.sum(|d| {
            d.existing_points.count_in_event(venue, event) + d.trials.count_events_in_use(venue, event)
        })
    }

    pub fn rename_event(&mut self, venue: &str, old_event: &str, new_event: &str) -> usize {
        self.sum_mut(|d| {
            d.existing_points.rename_event(venue, old_event, new_event)
                + d.trials.rename_event(venue, old_event, new_event)
        })
    }

    pub fn delete_event(&mut self, venue: &str, event: &str) -> usize {
        self.sum_mut(|d| {
            d.existing_points.delete_event(venue, event) + d.trials.delete_event(venue, event)
        })
    }

    pub fn count_lifetime_name(&self, venue: &str, name: &str) -> usize {
        self.sum(|d| d.existing_points.count_lifetime_name(venue, name))
    }

    pub fn rename_lifetime_name(&mut self, venue: &str, old_name: &str, new_name: &str) -> usize {
        self.sum_mut(|d| d.existing_points.rename_lifetime_name(venue, old_name, new_name))
    }

    pub fn delete_lifetime_name(&mut self, venue: &str, name: &str) -> usize {
        self.sum_mut(|d| d.existing_points.delete_lifetime_name(venue, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectingErrorCallback, Localization};
    use crate::types::CURRENT_DOC_VERSION;
    use pretty_assertions::assert_eq;

    const DOG: &str = r#"<Dog CallName="Rex" DOB="2018-04-01">
        <RegisteredName>Rex of the Ring</RegisteredName>
        <Breed>Border Collie</Breed>
        <ExistingPoints Date="2019-01-01" Type="MQ" Venue="AKC" MultiQ="QQ" Pts="2"/>
        <ExistingPoints Date="2019-01-01" Type="Other" Other="Breed" Venue="AKC" Div="Standard" Level="Open" Event="JWW" Pts="4"/>
        <RegNum Venue="AKC" Number="DN1"/>
        <Title Venue="AKC" Name="OA" Date="2020-02-02"/>
        <Title Venue="Missing"/>
        <Trial Verified="n">
            <Club Venue="AKC">Club</Club>
            <Run Date="2020-02-02" Division="Standard" Level="Open" Event="JWW">
                <Placement Q="Q" Place="1"><OtherPoints Name="Breed" Points="1"/></Placement>
            </Run>
        </Trial>
    </Dog>"#;

    fn load_dog(xml: &str) -> (Option<Dog>, CollectingErrorCallback) {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut dog = Dog::default();
        let ok = {
            let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
            dog.load(&ElementNode::load_xml_str(xml).unwrap(), &mut ctx)
        };
        (ok.then_some(dog), cb)
    }

    #[test]
    fn load_skips_bad_children() {
        let (dog, cb) = load_dog(DOG);
        let dog = dog.unwrap();
        assert_eq!(cb.messages().len(), 1);
        assert_eq!(dog.generic_name(), "Rex");
        assert_eq!(dog.breed, "Border Collie");
        assert_eq!(dog.existing_points.len(), 2);
        assert_eq!(dog.titles.len(), 1);
        assert_eq!(dog.trials.len(), 1);
        assert_eq!(dog.count_venue_refs("AKC"), 5);
    }

    #[test]
    fn invalid_birth_date_is_fatal() {
        let (dog, cb) = load_dog(r#"<Dog CallName="Rex" DOB="someday"/>"#);
        assert!(dog.is_none());
        assert!(cb.text().contains("'DOB'"));
    }

    #[test]
    fn save_then_load_is_equal() {
        let (dog, _) = load_dog(DOG);
        let dog = dog.unwrap();
        let mut root = ElementNode::new("AgilityBook");
        assert!(dog.save(&mut root));
        let (reloaded, cb) = load_dog(&root.element(0).unwrap().save_xml());
        assert!(cb.is_empty());
        assert_eq!(reloaded.unwrap(), dog);
    }

    #[test]
    fn same_day_trials_survive_a_round_trip() {
        let xml = r#"<Dog CallName="Rex">
            <Trial><Club Venue="AKC">First</Club>
                <Run Date="2024-01-06" Division="Standard" Level="Open" Event="JWW"/></Trial>
            <Trial><Club Venue="AKC">Second</Club>
                <Run Date="2024-01-06" Division="Standard" Level="Open" Event="JWW"/></Trial>
        </Dog>"#;
        let dog = load_dog(xml).0.unwrap();
        let clubs: Vec<_> = dog
            .trials
            .iter()
            .map(|t| t.clubs.primary_club().unwrap().name.clone())
            .collect();
        assert_eq!(clubs, ["First", "Second"]);

        let mut root = ElementNode::new("AgilityBook");
        assert!(dog.save(&mut root));
        let reloaded = load_dog(&root.element(0).unwrap().save_xml()).0.unwrap();
        assert_eq!(reloaded, dog);
    }

    #[test]
    fn search_strings_collect_text() {
        let (dog, _) = load_dog(DOG);
        let mut strings = BTreeSet::new();
        dog.unwrap().search_strings(&mut strings);
        assert!(strings.contains("Rex of the Ring"));
        assert!(strings.contains("DN1"));
        assert!(strings.contains("2018-04-01"));
    }

    #[test]
    fn list_cascades_cover_runs_and_points() {
        let (dog, _) = load_dog(DOG);
        let mut dogs = DogList::new();
        dogs.add_dog(dog.unwrap());
        assert_eq!(dogs.count_other_points("Breed"), 2);
        assert_eq!(dogs.rename_other_points("Breed", "Group"), 2);
        assert_eq!(dogs.count_events_in_use("AKC", "JWW"), 2);
        assert_eq!(dogs.rename_event("AKC", "JWW", "Jumpers"), 2);
        assert_eq!(dogs.count_levels_in_use("AKC", "Standard", "Open"), 2);
        assert_eq!(dogs.rename_venue("AKC", "American"), 5);
        assert_eq!(dogs.count_multiq("American", "QQ"), 1);
        assert_eq!(dogs.delete_title("American", "OA"), 1);
        assert_eq!(dogs.delete_event("American", "Jumpers"), 2);
        let dog = dogs.iter().next().unwrap();
        assert!(dog.trials.is_empty());
    }
}
