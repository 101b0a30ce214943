use crate::element::{AttribLookup, ElementNode};
use crate::error::LoadContext;
use crate::types::{ArbDate, VERSION_CAL_ENTERED};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

pub const TREE_CALENDAR: &str = "Calendar";
const ATTRIB_CAL_START: &str = "DateStart";
const ATTRIB_CAL_END: &str = "DateEnd";
const ATTRIB_CAL_OPENING: &str = "DateOpening";
const ATTRIB_CAL_DRAW: &str = "DateDraw";
const ATTRIB_CAL_CLOSING: &str = "DateClosing";
const ATTRIB_CAL_MAYBE: &str = "isTentative";
const ATTRIB_CAL_LOCATION: &str = "Location";
const ATTRIB_CAL_CLUB: &str = "Club";
const ATTRIB_CAL_VENUE: &str = "Venue";
const ATTRIB_CAL_PLANON: &str = "PlanOn";
const ATTRIB_CAL_ENTERED: &str = "Entered";
const ATTRIB_CAL_ACCOMMODATION: &str = "Acc";
const ATTRIB_CAL_CONFIRMATION: &str = "Confirm";
const ATTRIB_CAL_SECEMAIL: &str = "SecEmail";
const ATTRIB_CAL_PREMIUMURL: &str = "PremiumURL";
const ATTRIB_CAL_ONLINEURL: &str = "OnlineURL";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryStatus {
    #[default]
    Not,
    Entered,
    Pending,
    Planning,
}

impl EntryStatus {
    pub fn code(self) -> &'static str {
        match self {
            Self::Not => "N",
            Self::Entered => "E",
            Self::Pending => "O",
            Self::Planning => "P",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(Self::Not),
            "E" => Some(Self::Entered),
            "O" => Some(Self::Pending),
            "P" => Some(Self::Planning),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accommodation {
    #[default]
    None,
    Todo,
    Confirmed,
}

impl Accommodation {
    pub fn code(self) -> &'static str {
        match self {
            Self::None => "N",
            Self::Todo => "T",
            Self::Confirmed => "C",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N" => Some(Self::None),
            "T" => Some(Self::Todo),
            "C" => Some(Self::Confirmed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UidType {
    Event,
    Todo,
}

/// One trial listing on the user's calendar.
///
/// Start and end are independent; nothing here enforces `start <= end`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Calendar {
    pub date_start: ArbDate,
    pub date_end: ArbDate,
    pub date_opening: ArbDate,
    pub date_draw: ArbDate,
    pub date_closing: ArbDate,
    pub tentative: bool,
    pub location: String,
    pub club: String,
    pub venue: String,
    pub entered: EntryStatus,
    pub accommodation: Accommodation,
    pub confirmation: String,
    pub sec_email: String,
    pub premium_url: String,
    pub online_url: String,
    pub note: String,
}

impl Calendar {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generic_name(&self) -> String {
        format!("{} {} {}", self.venue, self.club, self.location)
    }

    pub fn uid(&self, kind: UidType) -> String {
        let mut s = String::from(match kind {
            UidType::Event => "e",
            UidType::Todo => "t",
        });
        s.push_str(&self.date_start.to_compact_string());
        s.push_str(&self.date_end.to_compact_string());
        s.push_str(&self.date_opening.to_compact_string());
        s.push_str(&self.date_draw.to_compact_string());
        s.push_str(&self.date_closing.to_compact_string());
        s
    }

    pub fn search_strings(&self, strings: &mut BTreeSet<String>) -> usize {
        let mut items = 0;
        strings.insert(self.date_start.to_iso_string());
        strings.insert(self.date_end.to_iso_string());
        items += 2;
        for date in [&self.date_opening, &self.date_draw, &self.date_closing] {
            if date.is_valid() {
                strings.insert(date.to_iso_string());
                items += 1;
            }
        }
        for text in [
            &self.location,
            &self.club,
            &self.venue,
            &self.confirmation,
            &self.sec_email,
            &self.premium_url,
            &self.online_url,
            &self.note,
        ] {
            if !text.is_empty() {
                strings.insert(text.clone());
                items += 1;
            }
        }
        items
    }

    pub fn is_before(&self, date: &ArbDate) -> bool {
        self.date_start < *date && self.date_end < *date
    }

    pub fn in_range(&self, date: &ArbDate) -> bool {
        date.is_between(&self.date_start, &self.date_end)
    }

    pub fn is_range_overlapped(&self, first: &ArbDate, second: &ArbDate) -> bool {
        self.date_start.is_between(first, second) || self.date_end.is_between(first, second)
    }

    pub fn is_match(&self, other: &Calendar, exact: bool) -> bool {
        if exact {
            self == other
        } else {
            self.date_start == other.date_start
                && self.date_end == other.date_end
                && self.venue == other.venue
                && self.club == other.club
        }
    }

    pub fn update(&mut self, other: &Calendar) -> bool {
        let mut changed = false;
        for (mine, theirs) in [
            (&mut self.date_start, &other.date_start),
            (&mut self.date_end, &other.date_end),
            (&mut self.date_opening, &other.date_opening),
            (&mut self.date_draw, &other.date_draw),
            (&mut self.date_closing, &other.date_closing),
        ] {
            if theirs.is_valid() && mine != theirs {
                *mine = *theirs;
                changed = true;
            }
        }
        if self.tentative != other.tentative {
            self.tentative = other.tentative;
            changed = true;
        }
        for (mine, theirs) in [
            (&mut self.location, &other.location),
            (&mut self.club, &other.club),
            (&mut self.venue, &other.venue),
            (&mut self.sec_email, &other.sec_email),
            (&mut self.premium_url, &other.premium_url),
            (&mut self.online_url, &other.online_url),
            (&mut self.note, &other.note),
        ] {
            if !theirs.is_empty() && mine != theirs {
                mine.clone_from(theirs);
                changed = true;
            }
        }
        changed
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_CALENDAR {
            return false;
        }
        for (attrib, slot) in [
            (ATTRIB_CAL_START, &mut self.date_start),
            (ATTRIB_CAL_END, &mut self.date_end),
        ] {
            match tree.get_attrib_date(attrib) {
                AttribLookup::Found(d) => *slot = d,
                AttribLookup::NotFound => {
                    ctx.missing_attribute(TREE_CALENDAR, attrib);
                    return false;
                }
                AttribLookup::Invalid(raw) => {
                    ctx.invalid_date(TREE_CALENDAR, attrib, &raw);
                    return false;
                }
            }
        }
        for (attrib, slot) in [
            (ATTRIB_CAL_OPENING, &mut self.date_opening),
            (ATTRIB_CAL_DRAW, &mut self.date_draw),
            (ATTRIB_CAL_CLOSING, &mut self.date_closing),
        ] {
            if let Err(raw) = tree.get_attrib_date(attrib).assign(slot) {
                ctx.invalid_date(TREE_CALENDAR, attrib, &raw);
                return false;
            }
        }
        if tree
            .get_attrib_bool(ATTRIB_CAL_MAYBE)
            .assign(&mut self.tentative)
            .is_err()
        {
            ctx.invalid_bool(TREE_CALENDAR, ATTRIB_CAL_MAYBE);
            return false;
        }
        tree.read_attrib(ATTRIB_CAL_LOCATION, &mut self.location);
        tree.read_attrib(ATTRIB_CAL_CLUB, &mut self.club);
        tree.read_attrib(ATTRIB_CAL_VENUE, &mut self.venue);

        if ctx.version() < VERSION_CAL_ENTERED {
            self.entered = if tree.attrib(ATTRIB_CAL_PLANON) == Some("y") {
                EntryStatus::Planning
            } else {
                EntryStatus::Not
            };
        } else {
            if let Some(code) = tree.attrib(ATTRIB_CAL_ENTERED) {
                match EntryStatus::from_code(code) {
                    Some(status) => self.entered = status,
                    None => {
                        let hint = ctx.text().valid_values("'E', 'O', 'P', 'N'");
                        ctx.invalid_attribute(TREE_CALENDAR, ATTRIB_CAL_ENTERED, Some(&hint));
                        return false;
                    }
                }
            }
            if let Some(code) = tree.attrib(ATTRIB_CAL_ACCOMMODATION) {
                match Accommodation::from_code(code) {
                    Some(acc) => self.accommodation = acc,
                    None => {
                        let hint = ctx.text().valid_values("'N', 'T', 'C'");
                        ctx.invalid_attribute(
                            TREE_CALENDAR,
                            ATTRIB_CAL_ACCOMMODATION,
                            Some(&hint),
                        );
                        return false;
                    }
                }
            }
            tree.read_attrib(ATTRIB_CAL_CONFIRMATION, &mut self.confirmation);
        }
        tree.read_attrib(ATTRIB_CAL_SECEMAIL, &mut self.sec_email);
        tree.read_attrib(ATTRIB_CAL_PREMIUMURL, &mut self.premium_url);
        tree.read_attrib(ATTRIB_CAL_ONLINEURL, &mut self.online_url);
        self.note = tree.value().to_string();
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let cal = tree.add_element_node(TREE_CALENDAR, None);
        cal.add_attrib_date(ATTRIB_CAL_START, &self.date_start);
        cal.add_attrib_date(ATTRIB_CAL_END, &self.date_end);
        cal.add_attrib_date(ATTRIB_CAL_OPENING, &self.date_opening);
        cal.add_attrib_date(ATTRIB_CAL_DRAW, &self.date_draw);
        cal.add_attrib_date(ATTRIB_CAL_CLOSING, &self.date_closing);
        if self.tentative {
            cal.add_attrib_bool(ATTRIB_CAL_MAYBE, true);
        }
        cal.add_attrib(ATTRIB_CAL_LOCATION, self.location.as_str());
        cal.add_attrib(ATTRIB_CAL_CLUB, self.club.as_str());
        cal.add_attrib(ATTRIB_CAL_VENUE, self.venue.as_str());
        cal.add_attrib(ATTRIB_CAL_ENTERED, self.entered.code());
        cal.add_attrib(ATTRIB_CAL_ACCOMMODATION, self.accommodation.code());
        for (attrib, text) in [
            (ATTRIB_CAL_CONFIRMATION, &self.confirmation),
            (ATTRIB_CAL_SECEMAIL, &self.sec_email),
            (ATTRIB_CAL_PREMIUMURL, &self.premium_url),
            (ATTRIB_CAL_ONLINEURL, &self.online_url),
        ] {
            if !text.is_empty() {
                cal.add_attrib(attrib, text.as_str());
            }
        }
        if !self.note.is_empty() {
            cal.set_value(self.note.as_str());
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarList {
    entries: Vec<Calendar>,
}

impl CalendarList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Calendar> {
        self.entries.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Calendar> {
        self.entries.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut cal = Calendar::new();
        if !cal.load(tree, ctx) {
            return false;
        }
        self.entries.push(cal);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.entries.iter().all(|cal| cal.save(tree))
    }

    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.date_start.cmp(&b.date_start));
    }

    pub fn all_entered(&self) -> Vec<&Calendar> {
        self.entries
            .iter()
            .filter(|c| matches!(c.entered, EntryStatus::Entered | EntryStatus::Pending))
            .collect()
    }

    pub fn trim_entries(&mut self, date: &ArbDate) -> usize {
        if !date.is_valid() {
            return 0;
        }
        let before = self.entries.len();
        self.entries.retain(|c| !c.is_before(date));
        let trimmed = before - self.entries.len();
        debug!(trimmed, cutoff = %date, "trimmed calendar");
        trimmed
    }

    pub fn find_calendar(&self, cal: &Calendar, exact: bool) -> Option<&Calendar> {
        self.entries.iter().find(|c| c.is_match(cal, exact))
    }

    pub fn add_calendar(&mut self, cal: Calendar) -> bool {
        if !cal.date_start.is_valid() || !cal.date_end.is_valid() {
            return false;
        }
        self.entries.push(cal);
        true
    }

    pub fn delete_calendar(&mut self, cal: &Calendar) -> bool {
        match self.entries.iter().position(|c| c == cal) {
            Some(index) => {
                self.entries.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectingErrorCallback, Localization};
    use crate::types::ArbVersion;

    fn parse(xml: &str) -> ElementNode {
        ElementNode::load_xml_str(xml).unwrap()
    }

    fn load_one(xml: &str, version: ArbVersion) -> (Option<Calendar>, CollectingErrorCallback) {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut cal = Calendar::new();
        let ok = {
            let mut ctx = LoadContext::new(version, &text, &mut cb);
            cal.load(&parse(xml), &mut ctx)
        };
        (ok.then_some(cal), cb)
    }

    const V1: &str = r#"<Calendar DateStart="2003-07-12" DateEnd="2003-07-13" PlanOn="y" Location="Hollister" Club="Bay Team" Venue="USDAA"/>"#;

    #[test]
    fn plan_on_only_counts_for_first_format() {
        let (v1, _) = load_one(V1, ArbVersion::new(1, 0));
        let (v2, _) = load_one(V1, ArbVersion::new(2, 0));
        assert_eq!(v1.unwrap().entered, EntryStatus::Planning);
        assert_eq!(v2.unwrap().entered, EntryStatus::Not);
    }

    #[test]
    fn missing_start_date_is_fatal_and_logged() {
        let (cal, cb) = load_one(r#"<Calendar DateEnd="2003-07-13"/>"#, ArbVersion::new(2, 0));
        assert!(cal.is_none());
        assert_eq!(cb.messages().len(), 1);
        assert!(cb.messages()[0].contains("DateStart"));
    }

    #[test]
    fn invalid_values_are_fatal_and_logged() {
        let bad = [
            r#"<Calendar DateStart="2003-13-45" DateEnd="2003-07-13"/>"#,
            r#"<Calendar DateStart="2003-07-12" DateEnd="2003-07-13" DateDraw="soon"/>"#,
            r#"<Calendar DateStart="2003-07-12" DateEnd="2003-07-13" isTentative="maybe"/>"#,
            r#"<Calendar DateStart="2003-07-12" DateEnd="2003-07-13" Entered="X"/>"#,
            r#"<Calendar DateStart="2003-07-12" DateEnd="2003-07-13" Acc="Z"/>"#,
        ];
        for xml in bad {
            let (cal, cb) = load_one(xml, ArbVersion::new(2, 0));
            assert!(cal.is_none(), "{xml}");
            assert_eq!(cb.messages().len(), 1, "{xml}");
        }
    }

    #[test]
    fn save_then_load_round_trips() {
        let mut cal = Calendar::new();
        cal.date_start = ArbDate::new(2006, 9, 2);
        cal.date_end = ArbDate::new(2006, 9, 3);
        cal.date_closing = ArbDate::new(2006, 8, 20);
        cal.tentative = true;
        cal.club = "Bay Team".to_string();
        cal.venue = "USDAA".to_string();
        cal.entered = EntryStatus::Pending;
        cal.accommodation = Accommodation::Todo;
        cal.confirmation = "A123".to_string();
        cal.note = "bring crate".to_string();

        let mut root = ElementNode::new("AgilityBook");
        assert!(cal.save(&mut root));
        let saved = root.element(0).unwrap();
        assert_eq!(saved.attrib("isTentative"), Some("y"));
        assert_eq!(saved.attrib("DateOpening"), None);
        assert_eq!(saved.attrib("SecEmail"), None);

        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut ctx = LoadContext::new(ArbVersion::new(15, 0), &text, &mut cb);
        let mut loaded = Calendar::new();
        assert!(loaded.load(saved, &mut ctx));
        assert_eq!(loaded, cal);
    }

    #[test]
    fn tentative_flag_omitted_when_false() {
        let mut cal = Calendar::new();
        cal.date_start = ArbDate::new(2006, 9, 2);
        cal.date_end = ArbDate::new(2006, 9, 3);
        let mut root = ElementNode::new("AgilityBook");
        cal.save(&mut root);
        assert_eq!(root.element(0).unwrap().attrib("isTentative"), None);
    }

    #[test]
    fn list_loads_mixed_versions_sorts_and_finds() {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut list = CalendarList::new();
        let later = parse(
            r#"<Calendar DateStart="2004-05-01" DateEnd="2004-05-02" Entered="E" Venue="AKC"/>"#,
        );
        {
            let mut ctx = LoadContext::new(ArbVersion::new(2, 0), &text, &mut cb);
            assert!(list.load(&later, &mut ctx));
        }
        {
            let mut ctx = LoadContext::new(ArbVersion::new(1, 0), &text, &mut cb);
            assert!(list.load(&parse(V1), &mut ctx));
        }
        assert_eq!(list.len(), 2);
        list.sort();
        assert_eq!(list.get(0).unwrap().date_start, ArbDate::new(2003, 7, 12));

        let copy = list.get(1).unwrap().clone();
        let found = list.find_calendar(&copy, true).unwrap();
        assert!(!std::ptr::eq(found, &copy));
        assert_eq!(*found, copy);
        assert_eq!(list.all_entered().len(), 1);
    }

    #[test]
    fn sort_is_stable_and_idempotent() {
        let mut list = CalendarList::new();
        for club in ["first", "second", "third"] {
            let mut cal = Calendar::new();
            cal.date_start = ArbDate::new(2005, 1, if club == "third" { 1 } else { 5 });
            cal.date_end = cal.date_start;
            cal.club = club.to_string();
            assert!(list.add_calendar(cal));
        }
        list.sort();
        let once: Vec<String> = list.iter().map(|c| c.club.clone()).collect();
        assert_eq!(once, vec!["third", "first", "second"]);
        list.sort();
        let twice: Vec<String> = list.iter().map(|c| c.club.clone()).collect();
        assert_eq!(once, twice);
    }

    #[test]
    fn add_requires_start_and_end() {
        let mut list = CalendarList::new();
        let mut cal = Calendar::new();
        cal.date_start = ArbDate::new(2005, 1, 1);
        assert!(!list.add_calendar(cal.clone()));
        assert_eq!(list.len(), 0);
        cal.date_end = ArbDate::new(2005, 1, 2);
        assert!(list.add_calendar(cal.clone()));
        assert!(list.delete_calendar(&cal));
        assert!(!list.delete_calendar(&cal));
    }

    #[test]
    fn trim_removes_past_entries_once() {
        let mut list = CalendarList::new();
        for (start, end) in [(1, 2), (5, 9), (10, 11)] {
            let mut cal = Calendar::new();
            cal.date_start = ArbDate::new(2005, 3, start);
            cal.date_end = ArbDate::new(2005, 3, end);
            list.add_calendar(cal);
        }
        let cutoff = ArbDate::new(2005, 3, 8);
        assert_eq!(list.trim_entries(&cutoff), 1);
        assert_eq!(list.trim_entries(&cutoff), 0);
        assert_eq!(list.trim_entries(&ArbDate::invalid()), 0);
        assert_eq!(list.len(), 2);
    }

    #[test]
    fn range_queries() {
        let mut cal = Calendar::new();
        cal.date_start = ArbDate::new(2005, 3, 5);
        cal.date_end = ArbDate::new(2005, 3, 6);
        assert!(cal.in_range(&ArbDate::new(2005, 3, 6)));
        assert!(!cal.in_range(&ArbDate::new(2005, 3, 7)));
        assert!(cal.is_range_overlapped(&ArbDate::new(2005, 3, 6), &ArbDate::new(2005, 3, 30)));
        assert!(!cal.is_range_overlapped(&ArbDate::new(2005, 3, 7), &ArbDate::new(2005, 3, 30)));
        assert!(cal.is_before(&ArbDate::new(2005, 3, 7)));
        assert!(!cal.is_before(&ArbDate::new(2005, 3, 6)));
    }

    #[test]
    fn uid_and_search_strings() {
        let mut cal = Calendar::new();
        cal.date_start = ArbDate::new(2005, 3, 5);
        cal.date_end = ArbDate::new(2005, 3, 6);
        cal.venue = "AKC".to_string();
        cal.club = "AKC".to_string();
        assert_eq!(cal.uid(UidType::Event), "e2005030520050306");
        assert_eq!(cal.uid(UidType::Todo), "t2005030520050306");
        let mut set = BTreeSet::new();
        assert_eq!(cal.search_strings(&mut set), 4);
        assert_eq!(set.len(), 3);
        assert_eq!(cal.generic_name(), "AKC AKC ");
    }

    #[test]
    fn update_merges_only_set_fields() {
        let mut mine = Calendar::new();
        mine.date_start = ArbDate::new(2005, 3, 5);
        mine.club = "Old".to_string();
        mine.note = "keep".to_string();
        let mut theirs = Calendar::new();
        theirs.club = "New".to_string();
        assert!(mine.update(&theirs));
        assert_eq!(mine.club, "New");
        assert_eq!(mine.note, "keep");
        assert_eq!(mine.date_start, ArbDate::new(2005, 3, 5));
        assert!(!mine.update(&theirs));
    }

    #[test]
    fn loose_match_ignores_notes() {
        let mut a = Calendar::new();
        a.date_start = ArbDate::new(2005, 3, 5);
        a.date_end = ArbDate::new(2005, 3, 6);
        a.venue = "AKC".to_string();
        let mut b = a.clone();
        b.note = "different".to_string();
        assert!(a.is_match(&b, false));
        assert!(!a.is_match(&b, true));
    }
}
