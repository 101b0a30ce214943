use crate::element::ElementNode;
use crate::error::LoadContext;
use crate::types::{ArbDate, VERSION_EXISTING_MQ, VERSION_EXISTING_SPEED};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub const TREE_EXISTING_PTS: &str = "ExistingPoints";
const ATTRIB_EXISTING_PTS_DATE: &str = "Date";
const ATTRIB_EXISTING_PTS_TYPE: &str = "Type";
const ATTRIB_EXISTING_PTS_OTHER: &str = "Other";
const ATTRIB_EXISTING_PTS_VENUE: &str = "Venue";
const ATTRIB_EXISTING_PTS_MULTIQ: &str = "MultiQ";
const ATTRIB_EXISTING_PTS_DIV: &str = "Div";
const ATTRIB_EXISTING_PTS_LEVEL: &str = "Level";
const ATTRIB_EXISTING_PTS_EVENT: &str = "Event";
const ATTRIB_EXISTING_PTS_SUBNAME: &str = "SubName";
const ATTRIB_EXISTING_PTS_POINTS: &str = "Pts";

const LEGACY_DOUBLE_Q: &str = "Double Q";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ExistingPointType {
    #[default]
    OtherPoints,
    Lifetime,
    Run,
    Speed,
    MultiQ,
    SuperQ,
}

impl ExistingPointType {
    pub const ALL: [ExistingPointType; 6] = [
        Self::OtherPoints,
        Self::Lifetime,
        Self::Run,
        Self::Speed,
        Self::MultiQ,
        Self::SuperQ,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::OtherPoints => "Other",
            Self::Lifetime => "Lifetime",
            Self::Run => "Run",
            Self::Speed => "Speed",
            Self::MultiQ => "MQ",
            Self::SuperQ => "SQ",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.code() == code)
    }

    fn has_type_name(self) -> bool {
        matches!(self, Self::OtherPoints | Self::Lifetime)
    }

    fn has_event(self) -> bool {
        matches!(
            self,
            Self::OtherPoints | Self::Lifetime | Self::Run | Self::SuperQ
        )
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistingPoints {
    pub date: ArbDate,
    pub kind: ExistingPointType,
    pub type_name: String,
    pub venue: String,
    pub multi_q: String,
    pub division: String,
    pub level: String,
    pub event: String,
    pub sub_name: String,
    pub points: f64,
    pub comment: String,
}

impl ExistingPoints {
    pub fn generic_name(&self) -> String {
        format!("{} {} {}", self.kind.code(), self.venue, self.points)
    }

    pub fn search_strings(&self, strings: &mut BTreeSet<String>) -> usize {
        let mut count = 0;
        for text in [
            self.date.to_iso_string(),
            self.type_name.clone(),
            self.comment.clone(),
        ] {
            if !text.is_empty() {
                strings.insert(text);
                count += 1;
            }
        }
        count
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_EXISTING_PTS {
            return false;
        }
        if !ctx.read_date(tree, ATTRIB_EXISTING_PTS_DATE, &mut self.date) {
            return false;
        }
        let Some(code) = ctx.required(tree, ATTRIB_EXISTING_PTS_TYPE) else {
            return false;
        };
        let version = ctx.version();
        let mut converted_qq = false;
        self.kind = match ExistingPointType::from_code(&code) {
            Some(kind) => kind,
            None if version < VERSION_EXISTING_SPEED && code == "Mach" => ExistingPointType::Speed,
            None if version < VERSION_EXISTING_MQ && code == "QQ" => {
                converted_qq = true;
                ExistingPointType::MultiQ
            }
            None => {
                let codes = ExistingPointType::ALL
                    .iter()
                    .map(|t| t.code())
                    .collect::<Vec<_>>()
                    .join(", ");
                let hint = ctx.text().valid_values(&codes);
                ctx.invalid_attribute(TREE_EXISTING_PTS, ATTRIB_EXISTING_PTS_TYPE, Some(&hint));
                return false;
            }
        };

        if self.kind.has_type_name() {
            let Some(type_name) = ctx.required(tree, ATTRIB_EXISTING_PTS_OTHER) else {
                return false;
            };
            self.type_name = type_name;
        }
        let Some(venue) = ctx.required(tree, ATTRIB_EXISTING_PTS_VENUE) else {
            return false;
        };
        self.venue = venue;

        if self.kind == ExistingPointType::MultiQ {
            if converted_qq {
                self.multi_q = LEGACY_DOUBLE_Q.to_string();
            } else {
                let Some(multi_q) = ctx.required(tree, ATTRIB_EXISTING_PTS_MULTIQ) else {
                    return false;
                };
                self.multi_q = multi_q;
            }
        } else {
            let Some(division) = ctx.required(tree, ATTRIB_EXISTING_PTS_DIV) else {
                return false;
            };
            let Some(level) = ctx.required(tree, ATTRIB_EXISTING_PTS_LEVEL) else {
                return false;
            };
            self.division = division;
            self.level = level;
        }

        if self.kind.has_event() {
            let Some(event) = ctx.required(tree, ATTRIB_EXISTING_PTS_EVENT) else {
                return false;
            };
            self.event = event;
            tree.read_attrib(ATTRIB_EXISTING_PTS_SUBNAME, &mut self.sub_name);
        }

        if !ctx.read_number(tree, ATTRIB_EXISTING_PTS_POINTS, &mut self.points) {
            return false;
        }
        self.comment = tree.value().to_string();
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let points = tree.add_element_node(TREE_EXISTING_PTS, None);
        points.add_attrib_date(ATTRIB_EXISTING_PTS_DATE, &self.date);
        points.add_attrib(ATTRIB_EXISTING_PTS_TYPE, self.kind.code());
        if self.kind.has_type_name() {
            points.add_attrib(ATTRIB_EXISTING_PTS_OTHER, self.type_name.as_str());
        }
        points.add_attrib(ATTRIB_EXISTING_PTS_VENUE, self.venue.as_str());
        if self.kind == ExistingPointType::MultiQ {
            points.add_attrib(ATTRIB_EXISTING_PTS_MULTIQ, self.multi_q.as_str());
        } else {
            points.add_attrib(ATTRIB_EXISTING_PTS_DIV, self.division.as_str());
            points.add_attrib(ATTRIB_EXISTING_PTS_LEVEL, self.level.as_str());
        }
        if self.kind.has_event() {
            points.add_attrib(ATTRIB_EXISTING_PTS_EVENT, self.event.as_str());
            if !self.sub_name.is_empty() {
                points.add_attrib(ATTRIB_EXISTING_PTS_SUBNAME, self.sub_name.as_str());
            }
        }
        points.add_attrib_double(ATTRIB_EXISTING_PTS_POINTS, self.points, 2);
        if !self.comment.is_empty() {
            points.set_value(self.comment.as_str());
        }
        true
    }

    fn sort_key(&self, other: &Self) -> Ordering {
        self.kind
            .cmp(&other.kind)
            .then_with(|| self.type_name.cmp(&other.type_name))
            .then_with(|| self.venue.cmp(&other.venue))
            .then_with(|| self.event.cmp(&other.event))
            .then_with(|| self.date.cmp(&other.date))
            .then_with(|| self.division.cmp(&other.division))
            .then_with(|| self.level.cmp(&other.level))
    }

    fn uses_division(&self) -> bool {
        self.kind != ExistingPointType::MultiQ
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExistingPointsList {
    points: Vec<ExistingPoints>,
}

impl ExistingPointsList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ExistingPoints> {
        self.points.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut points = ExistingPoints::default();
        if !points.load(tree, ctx) {
            return false;
        }
        self.points.push(points);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.points.iter().all(|p| p.save(tree))
    }

    pub fn sort(&mut self) {
        self.points.sort_by(ExistingPoints::sort_key);
    }

    pub fn add_existing_points(&mut self, points: ExistingPoints) -> bool {
        self.points.push(points);
        true
    }

    pub fn delete_existing_points(&mut self, points: &ExistingPoints) -> bool {
        match self.points.iter().position(|p| p == points) {
            Some(index) => {
                self.points.remove(index);
                true
            }
            None => false,
        }
    }

    fn count_where(&self, pred: impl Fn(&ExistingPoints) -> bool) -> usize {
        self.points.iter().filter(|p| pred(p)).count()
    }

    fn update_where(
        &mut self,
        pred: impl Fn(&ExistingPoints) -> bool,
        mut apply: impl FnMut(&mut ExistingPoints),
    ) -> usize {
        let mut count = 0;
        for points in self.points.iter_mut().filter(|p| pred(p)) {
            apply(points);
            count += 1;
        }
        count
    }

    fn delete_where(&mut self, pred: impl Fn(&ExistingPoints) -> bool) -> usize {
        let before = self.points.len();
        self.points.retain(|p| !pred(p));
        before - self.points.len()
    }

    pub fn count_in_venue(&self, venue: &str) -> usize {
        self.count_where(|p| p.venue == venue)
    }

    pub fn rename_venue(&mut self, old_venue: &str, new_venue: &str) -> usize {
        self.update_where(|p| p.venue == old_venue, |p| p.venue = new_venue.to_string())
    }

    pub fn delete_venue(&mut self, venue: &str) -> usize {
        self.delete_where(|p| p.venue == venue)
    }

    pub fn count_in_division(&self, venue: &str, division: &str) -> usize {
        self.count_where(|p| p.uses_division() && p.venue == venue && p.division == division)
    }

    pub fn rename_division(&mut self, venue: &str, old_div: &str, new_div: &str) -> usize {
        self.update_where(
            |p| p.uses_division() && p.venue == venue && p.division == old_div,
            |p| p.division = new_div.to_string(),
        )
    }

    pub fn delete_division(&mut self, venue: &str, division: &str) -> usize {
        self.delete_where(|p| p.uses_division() && p.venue == venue && p.division == division)
    }

    pub fn count_in_level(&self, venue: &str, division: &str, level: &str) -> usize {
        self.count_where(|p| {
            p.uses_division() && p.venue == venue && p.division == division && p.level == level
        })
    }

    pub fn rename_level(&mut self, venue: &str, division: &str, old_level: &str, new_level: &str) -> usize {
        self.update_where(
            |p| p.uses_division() && p.venue == venue && p.division == division && p.level == old_level,
            |p| p.level = new_level.to_string(),
        )
    }

    pub fn delete_level(&mut self, venue: &str, division: &str, level: &str) -> usize {
        self.delete_where(|p| {
            p.uses_division() && p.venue == venue && p.division == division && p.level == level
        })
    }

    pub fn count_in_event(&self, venue: &str, event: &str) -> usize {
        self.count_where(|p| p.kind.has_event() && p.venue == venue && p.event == event)
    }

    pub fn rename_event(&mut self, venue: &str, old_event: &str, new_event: &str) -> usize {
        self.update_where(
            |p| p.kind.has_event() && p.venue == venue && p.event == old_event,
            |p| p.event = new_event.to_string(),
        )
    }

    pub fn delete_event(&mut self, venue: &str, event: &str) -> usize {
        self.delete_where(|p| p.kind.has_event() && p.venue == venue && p.event == event)
    }

    pub fn count_other_points(&self, name: &str) -> usize {
        self.count_where(|p| p.kind == ExistingPointType::OtherPoints && p.type_name == name)
    }

    pub fn rename_other_points(&mut self, old_name: &str, new_name: &str) -> usize {
        self.update_where(
            |p| p.kind == ExistingPointType::OtherPoints && p.type_name == old_name,
            |p| p.type_name = new_name.to_string(),
        )
    }

    pub fn delete_other_points(&mut self, name: &str) -> usize {
        self.delete_where(|p| p.kind == ExistingPointType::OtherPoints && p.type_name == name)
    }

    pub fn count_lifetime_name(&self, venue: &str, name: &str) -> usize {
        self.count_where(|p| {
            p.kind == ExistingPointType::Lifetime && p.venue == venue && p.type_name == name
        })
    }

    pub fn rename_lifetime_name(&mut self, venue: &str, old_name: &str, new_name: &str) -> usize {
        self.update_where(
            |p| p.kind == ExistingPointType::Lifetime && p.venue == venue && p.type_name == old_name,
            |p| p.type_name = new_name.to_string(),
        )
    }

    pub fn delete_lifetime_name(&mut self, venue: &str, name: &str) -> usize {
        self.delete_where(|p| {
            p.kind == ExistingPointType::Lifetime && p.venue == venue && p.type_name == name
        })
    }

    pub fn count_multiq(&self, venue: &str, name: &str) -> usize {
        self.count_where(|p| p.kind == ExistingPointType::MultiQ && p.venue == venue && p.multi_q == name)
    }

    pub fn rename_multiq(&mut self, venue: &str, old_name: &str, new_name: &str) -> usize {
        self.update_where(
            |p| p.kind == ExistingPointType::MultiQ && p.venue == venue && p.multi_q == old_name,
            |p| p.multi_q = new_name.to_string(),
        )
    }

    pub fn delete_multiq(&mut self, venue: &str, name: &str) -> usize {
        self.delete_where(|p| p.kind == ExistingPointType::MultiQ && p.venue == venue && p.multi_q == name)
    }

    pub fn delete_stale_multiqs(&mut self, venue: &str, exists: impl Fn(&str) -> bool) -> usize {
        self.delete_where(|p| p.kind == ExistingPointType::MultiQ && p.venue == venue && !exists(&p.multi_q))
    }
}
