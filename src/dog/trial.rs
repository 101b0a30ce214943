use super::run::{Run, RunList, TREE_RUN};
use crate::config::Config;
use crate::element::ElementNode;
use crate::error::LoadContext;
use crate::types::{ArbDate, ArbVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

pub const TREE_TRIAL: &str = "Trial";
pub const TREE_CLUB: &str = "Club";
const TREE_LOCATION: &str = "Location";
const TREE_NOTE: &str = "Note";
const ATTRIB_TRIAL_VERIFIED: &str = "Verified";
const ATTRIB_CLUB_VENUE: &str = "Venue";
const ATTRIB_CLUB_NAME: &str = "Name";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Club {
    pub name: String,
    pub venue: String,
}

impl Club {
    pub fn new(name: &str, venue: &str) -> Self {
        Self {
            name: name.to_string(),
            venue: venue.to_string(),
        }
    }

    pub fn generic_name(&self) -> String {
        self.name.clone()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_CLUB {
            return false;
        }
        if ctx.version() == ArbVersion::new(1, 0) {
            let Some(name) = ctx.required(tree, ATTRIB_CLUB_NAME) else {
                return false;
            };
            self.name = name;
        } else {
            self.name = tree.value().to_string();
        }
        match ctx.required(tree, ATTRIB_CLUB_VENUE) {
            Some(venue) => {
                self.venue = venue;
                true
            }
            None => false,
        }
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let club = tree.add_element_node(TREE_CLUB, None);
        club.add_attrib(ATTRIB_CLUB_VENUE, self.venue.as_str());
        if !self.name.is_empty() {
            club.set_value(self.name.as_str());
        }
        true
    }
}

/// Clubs hosting a trial. The first one is the primary club and decides
/// which venue runs are scored in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubList {
    clubs: Vec<Club>,
}

impl ClubList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.clubs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clubs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Club> {
        self.clubs.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut club = Club::default();
        if !club.load(tree, ctx) {
            return false;
        }
        self.clubs.push(club);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.clubs.iter().all(|c| c.save(tree))
    }

    pub fn primary_club(&self) -> Option<&Club> {
        self.clubs.first()
    }

    pub fn find_venue(&self, venue: &str) -> Option<&Club> {
        self.clubs.iter().find(|c| c.venue == venue)
    }

    pub fn add_club(&mut self, name: &str, venue: &str) -> bool {
        self.clubs.push(Club::new(name, venue));
        true
    }

    pub fn delete_club(&mut self, name: &str, venue: &str) -> bool {
        match self
            .clubs
            .iter()
            .position(|c| c.name == name && c.venue == venue)
        {
            Some(index) => {
                self.clubs.remove(index);
                true
            }
            None => false,
        }
    }

    fn rename_venue(&mut self, old_venue: &str, new_venue: &str) -> usize {
        let mut count = 0;
        for club in self.clubs.iter_mut().filter(|c| c.venue == old_venue) {
            club.venue = new_venue.to_string();
            count += 1;
        }
        count
    }

    fn delete_venue(&mut self, venue: &str) -> usize {
        let before = self.clubs.len();
        self.clubs.retain(|c| c.venue != venue);
        before - self.clubs.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Trial {
    pub location: String,
    pub note: String,
    pub verified: bool,
    pub clubs: ClubList,
    pub runs: RunList,
}

impl Trial {
    pub fn generic_name(&self) -> String {
        let club = self
            .clubs
            .primary_club()
            .map(|c| c.name.as_str())
            .unwrap_or_default();
        match (club.is_empty(), self.location.is_empty()) {
            (false, false) => format!("{club} {}", self.location),
            (false, true) => club.to_string(),
            _ => self.location.clone(),
        }
    }

    pub fn search_strings(&self, strings: &mut BTreeSet<String>) -> usize {
        let mut count = 0;
        for text in [&self.location, &self.note] {
            if !text.is_empty() {
                strings.insert(text.clone());
                count += 1;
            }
        }
        for club in self.clubs.iter().filter(|c| !c.name.is_empty()) {
            strings.insert(club.name.clone());
            count += 1;
        }
        for run in self.runs.iter() {
            count += run.search_strings(strings);
        }
        count
    }

    pub fn has_venue(&self, venue: &str) -> bool {
        self.clubs.find_venue(venue).is_some()
    }

    pub fn start_date(&self) -> ArbDate {
        self.runs.start_date()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_TRIAL {
            return false;
        }
        if !ctx.read_bool(tree, ATTRIB_TRIAL_VERIFIED, &mut self.verified) {
            return false;
        }
        for element in tree.elements() {
            match element.name() {
                TREE_LOCATION => self.location = element.value().to_string(),
                TREE_NOTE => self.note = element.value().to_string(),
                TREE_CLUB => {
                    self.clubs.load(element, ctx);
                }
                TREE_RUN => {
                    if !self.runs.load(element, ctx) {
                        debug!(trial = %self.generic_name(), "skipped unreadable run");
                    }
                }
                _ => {}
            }
        }
        self.runs.sort();
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let trial = tree.add_element_node(TREE_TRIAL, None);
        trial.add_attrib_bool(ATTRIB_TRIAL_VERIFIED, self.verified);
        if !self.location.is_empty() {
            trial.add_element_node(TREE_LOCATION, None).set_value(self.location.as_str());
        }
        if !self.note.is_empty() {
            trial.add_element_node(TREE_NOTE, None).set_value(self.note.as_str());
        }
        self.clubs.save(trial) && self.runs.save(trial)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrialList {
    trials: Vec<Trial>,
}

impl TrialList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.trials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trials.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Trial> {
        self.trials.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Trial> {
        self.trials.iter_mut()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut trial = Trial::default();
        if !trial.load(tree, ctx) {
            return false;
        }
        self.trials.push(trial);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.trials.iter().all(|t| t.save(tree))
    }

    pub fn sort(&mut self, descending: bool) {
        if descending {
            self.trials.sort_by(|a, b| b.start_date().cmp(&a.start_date()));
        } else {
            self.trials.sort_by_key(Trial::start_date);
        }
    }

    pub fn add_trial(&mut self, trial: Trial) -> bool {
        self.trials.push(trial);
        true
    }

    pub fn delete_trial(&mut self, trial: &Trial) -> bool {
        match self.trials.iter().position(|t| t == trial) {
            Some(index) => {
                self.trials.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn count_in_venue(&self, venue: &str) -> usize {
        self.trials.iter().filter(|t| t.has_venue(venue)).count()
    }

    pub fn rename_venue(&mut self, old_venue: &str, new_venue: &str) -> usize {
        self.trials
            .iter_mut()
            .map(|t| t.clubs.rename_venue(old_venue, new_venue))
            .sum()
    }

    pub fn delete_venue(&mut self, venue: &str) -> usize {
        let mut count = 0;
        self.trials.retain_mut(|trial| {
            let removed = trial.clubs.delete_venue(venue);
            count += removed;
            !(removed > 0 && trial.clubs.is_empty())
        });
        count
    }

    fn count_runs(&self, venue: &str, pred: impl Fn(&Run) -> bool) -> usize {
        self.trials
            .iter()
            .filter(|t| t.has_venue(venue))
            .map(|t| t.runs.iter().filter(|r| pred(r)).count())
            .sum()
    }

    fn update_runs(
        &mut self,
        venue: &str,
        pred: impl Fn(&Run) -> bool,
        mut apply: impl FnMut(&mut Run),
    ) -> usize {
        let mut count = 0;
        for trial in self.trials.iter_mut().filter(|t| t.has_venue(venue)) {
            for run in trial.runs.iter_mut().filter(|r| pred(r)) {
                apply(run);
                count += 1;
            }
        }
        count
    }

    fn delete_runs(
        &mut self,
        trial_filter: impl Fn(&Trial) -> bool,
        pred: impl Fn(&Run) -> bool,
    ) -> usize {
        let mut count = 0;
        self.trials.retain_mut(|trial| {
            if !trial_filter(trial) {
                return true;
            }
            let removed = trial.runs.retain(|r| !pred(r));
            count += removed;
            !(removed > 0 && trial.runs.is_empty())
        });
        count
    }

    pub fn count_divisions_in_use(&self, venue: &str, division: &str) -> usize {
        self.count_runs(venue, |r| r.division == division)
    }

    pub fn rename_division(&mut self, venue: &str, old_div: &str, new_div: &str) -> usize {
        self.update_runs(venue, |r| r.division == old_div, |r| r.division = new_div.to_string())
    }

    /// Runs are only deleted from trials where exactly one hosting club's
    /// venue defines the division.
    pub fn delete_division(&mut self, config: &Config, venue: &str, division: &str) -> usize {
        self.delete_runs(
            |trial| {
                trial.has_venue(venue)
                    && trial
                        .clubs
                        .iter()
                        .filter(|c| {
                            config
                                .venues
                                .find_venue(&c.venue)
                                .is_some_and(|v| v.divisions.find_division(division).is_some())
                        })
                        .count()
                        == 1
            },
            |r| r.division == division,
        )
    }

    pub fn count_levels_in_use(&self, venue: &str, division: &str, level: &str) -> usize {
        self.count_runs(venue, |r| r.division == division && r.level == level)
    }

    pub fn rename_level(&mut self, venue: &str, division: &str, old_level: &str, new_level: &str) -> usize {
        self.update_runs(
            venue,
            |r| r.division == division && r.level == old_level,
            |r| r.level = new_level.to_string(),
        )
    }

    pub fn delete_level(&mut self, venue: &str, division: &str, level: &str) -> usize {
        self.delete_runs(
            |trial| trial.has_venue(venue),
            |r| r.division == division && r.level == level,
        )
    }

    pub fn count_events_in_use(&self, venue: &str, event: &str) -> usize {
        self.count_runs(venue, |r| r.event == event)
    }

    pub fn rename_event(&mut self, venue: &str, old_event: &str, new_event: &str) -> usize {
        self.update_runs(venue, |r| r.event == old_event, |r| r.event = new_event.to_string())
    }

    pub fn delete_event(&mut self, venue: &str, event: &str) -> usize {
        self.delete_runs(|trial| trial.has_venue(venue), |r| r.event == event)
    }

    pub fn count_other_points(&self, name: &str) -> usize {
        self.trials
            .iter()
            .flat_map(|t| t.runs.iter())
            .map(|r| r.count_other_points(name))
            .sum()
    }

    pub fn rename_other_points(&mut self, old_name: &str, new_name: &str) -> usize {
        self.trials
            .iter_mut()
            .flat_map(|t| t.runs.iter_mut())
            .map(|r| r.rename_other_points(old_name, new_name))
            .sum()
    }

    pub fn delete_other_points(&mut self, name: &str) -> usize {
        self.trials
            .iter_mut()
            .flat_map(|t| t.runs.iter_mut())
            .map(|r| r.delete_other_points(name))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectingErrorCallback, Localization};
    use crate::types::CURRENT_DOC_VERSION;
    use pretty_assertions::assert_eq;

    fn trial(clubs: &[(&str, &str)], runs: &[(u32, &str, &str, &str)]) -> Trial {
        let mut trial = Trial::default();
        for (name, venue) in clubs {
            trial.clubs.add_club(name, venue);
        }
        for (day, div, level, event) in runs {
            trial
                .runs
                .add_run(Run::new(ArbDate::new(2024, 6, *day), div, level, event));
        }
        trial
    }

    #[test]
    fn load_sorts_runs_and_tolerates_bad_ones() {
        let xml = r#"<Trial Verified="y">
            <Location>Fairgrounds</Location>
            <Club Venue="AKC">Dog Club</Club>
            <Run Date="2024-06-02" Division="Standard" Level="Open" Event="Jumpers"/>
            <Run Date="2024-06-01" Division="Standard" Level="Open" Event="Standard"/>
            <Run Date="bogus" Division="Standard" Level="Open" Event="Standard"/>
        </Trial>"#;
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut trial = Trial::default();
        {
            let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
            assert!(trial.load(&ElementNode::load_xml_str(xml).unwrap(), &mut ctx));
        }
        assert_eq!(cb.messages().len(), 1);
        assert!(trial.verified);
        assert_eq!(trial.generic_name(), "Dog Club Fairgrounds");
        assert_eq!(trial.runs.len(), 2);
        assert_eq!(trial.start_date(), ArbDate::new(2024, 6, 1));
        assert_eq!(trial.runs.iter().next().unwrap().event, "Standard");
    }

    #[test]
    fn list_sorts_descending() {
        let mut list = TrialList::new();
        list.add_trial(trial(&[("A", "AKC")], &[(1, "D", "L", "E")]));
        list.add_trial(trial(&[("B", "AKC")], &[(9, "D", "L", "E")]));
        list.sort(true);
        assert_eq!(list.iter().next().unwrap().clubs.primary_club().unwrap().name, "B");
    }

    #[test]
    fn descending_sort_keeps_same_day_trials_in_place() {
        let mut list = TrialList::new();
        list.add_trial(trial(&[("first", "AKC")], &[(6, "D", "L", "E")]));
        list.add_trial(trial(&[("second", "AKC")], &[(6, "D", "L", "E")]));
        list.add_trial(trial(&[("older", "AKC")], &[(1, "D", "L", "E")]));
        let names = |list: &TrialList| -> Vec<String> {
            list.iter()
                .map(|t| t.clubs.primary_club().unwrap().name.clone())
                .collect()
        };
        list.sort(true);
        assert_eq!(names(&list), ["first", "second", "older"]);
        list.sort(true);
        assert_eq!(names(&list), ["first", "second", "older"]);
    }

    #[test]
    fn venue_delete_drops_trials_without_clubs() {
        let mut list = TrialList::new();
        list.add_trial(trial(&[("A", "AKC")], &[(1, "D", "L", "E")]));
        list.add_trial(trial(&[("B", "AKC"), ("C", "UKC")], &[(2, "D", "L", "E")]));
        assert_eq!(list.count_in_venue("AKC"), 2);
        assert_eq!(list.rename_venue("UKC", "UKI"), 1);
        assert_eq!(list.delete_venue("AKC"), 2);
        assert_eq!(list.len(), 1);
        assert!(list.iter().next().unwrap().has_venue("UKI"));
    }

    #[test]
    fn run_cascades_are_limited_to_the_venue() {
        let mut list = TrialList::new();
        list.add_trial(trial(
            &[("A", "AKC")],
            &[(1, "Standard", "Open", "JWW"), (2, "Standard", "Novice", "JWW")],
        ));
        list.add_trial(trial(&[("U", "UKC")], &[(3, "Standard", "Open", "JWW")]));
        assert_eq!(list.count_levels_in_use("AKC", "Standard", "Open"), 1);
        assert_eq!(list.rename_event("AKC", "JWW", "Jumpers"), 2);
        assert_eq!(list.count_events_in_use("UKC", "JWW"), 1);
        assert_eq!(list.delete_level("AKC", "Standard", "Open"), 1);
        assert_eq!(list.len(), 2);
        assert_eq!(list.delete_event("AKC", "Jumpers"), 1);
        assert_eq!(list.len(), 1);
    }
}
