use crate::config::ScoringStyle;
use crate::element::{AttribLookup, ElementNode};
use crate::error::LoadContext;
use crate::types::ArbDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

pub const TREE_RUN: &str = "Run";
const TREE_CONDITIONS: &str = "Conditions";
const TREE_JUDGE: &str = "Judge";
const TREE_HANDLER: &str = "Handler";
const TREE_PARTNER: &str = "Partner";
const TREE_BY_TIME: &str = "ByTime";
const TREE_BY_OPENCLOSE: &str = "ByOpenClose";
const TREE_BY_POINTS: &str = "ByPoints";
const TREE_PLACEMENT: &str = "Placement";
const TREE_PLACEMENT_OTHERPOINTS: &str = "OtherPoints";
const TREE_NOTES: &str = "Notes";
const TREE_FAULTS: &str = "Faults";
const TREE_OTHER: &str = "Other";
const TREE_RUN_LINK: &str = "Link";
const ATTRIB_RUN_DATE: &str = "Date";
const ATTRIB_RUN_DIVISION: &str = "Division";
const ATTRIB_RUN_LEVEL: &str = "Level";
const ATTRIB_RUN_HEIGHT: &str = "Height";
const ATTRIB_RUN_EVENT: &str = "Event";
const ATTRIB_RUN_SUBNAME: &str = "SubName";
const ATTRIB_PARTNER_HANDLER: &str = "Handler";
const ATTRIB_PARTNER_DOG: &str = "Dog";
const ATTRIB_PARTNER_REGNUM: &str = "RegNum";
const ATTRIB_SCORING_FAULTS: &str = "CourseFaults";
const ATTRIB_SCORING_TIME: &str = "Time";
const ATTRIB_SCORING_HAS_TABLE: &str = "hasTable";
const ATTRIB_SCORING_SCT: &str = "SCT";
const ATTRIB_SCORING_SCT2: &str = "SCT2";
const ATTRIB_SCORING_BONUSTITLEPTS: &str = "bonusTitlePts";
const ATTRIB_SCORING_OBSTACLES: &str = "obstacles";
const ATTRIB_BY_TIME_YARDS: &str = "Yards";
const ATTRIB_BY_OPENCLOSE_NEEDOPEN: &str = "NeedOpenPts";
const ATTRIB_BY_OPENCLOSE_NEEDCLOSE: &str = "NeedClosePts";
const ATTRIB_BY_OPENCLOSE_GOTOPEN: &str = "OpenPts";
const ATTRIB_BY_OPENCLOSE_GOTCLOSE: &str = "ClosePts";
const ATTRIB_BY_POINTS_NEED: &str = "NeedPts";
const ATTRIB_BY_POINTS_GOT: &str = "Points";
const ATTRIB_PLACEMENT_Q: &str = "Q";
const ATTRIB_PLACEMENT_PLACE: &str = "Place";
const ATTRIB_PLACEMENT_INCLASS: &str = "InClass";
const ATTRIB_PLACEMENT_DOGSQD: &str = "DogsQd";
const ATTRIB_PLACEMENT_OTHERPOINTS_NAME: &str = "Name";
const ATTRIB_PLACEMENT_OTHERPOINTS_POINTS: &str = "Points";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualifyType {
    #[default]
    NotApplicable,
    Qualified,
    NotQualified,
    Eliminated,
    DidNotRun,
    SuperQ,
}

impl QualifyType {
    pub const ALL: [QualifyType; 6] = [
        Self::NotApplicable,
        Self::Qualified,
        Self::NotQualified,
        Self::Eliminated,
        Self::DidNotRun,
        Self::SuperQ,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::NotApplicable => "NA",
            Self::Qualified => "Q",
            Self::NotQualified => "NQ",
            Self::Eliminated => "E",
            Self::DidNotRun => "DNR",
            Self::SuperQ => "SQ",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|q| q.code() == code)
    }

    pub fn is_qualified(self) -> bool {
        matches!(self, Self::Qualified | Self::SuperQ)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunScoringKind {
    #[default]
    NotSet,
    ByTime,
    ByOpenClose,
    ByPoints,
}

impl RunScoringKind {
    pub fn from_style(style: ScoringStyle) -> Self {
        match style {
            ScoringStyle::FaultsThenTime
            | ScoringStyle::Faults100ThenTime
            | ScoringStyle::Faults200ThenTime
            | ScoringStyle::TimePlusFaults => Self::ByTime,
            ScoringStyle::OcScoreThenTime => Self::ByOpenClose,
            ScoringStyle::ScoreThenTime => Self::ByPoints,
        }
    }

    fn from_tree_name(name: &str) -> Option<Self> {
        match name {
            TREE_BY_TIME => Some(Self::ByTime),
            TREE_BY_OPENCLOSE => Some(Self::ByOpenClose),
            TREE_BY_POINTS => Some(Self::ByPoints),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunScoring {
    pub kind: RunScoringKind,
    pub has_table: bool,
    pub course_faults: i16,
    pub time: f64,
    pub sct: f64,
    pub sct2: f64,
    pub yards: f64,
    pub need_open_pts: i16,
    pub need_close_pts: i16,
    pub open_pts: i16,
    pub close_pts: i16,
    pub bonus_title_pts: f64,
    pub obstacles: i16,
}

impl RunScoring {
    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let Some(kind) = RunScoringKind::from_tree_name(tree.name()) else {
            return false;
        };
        self.kind = kind;
        let common = ctx.read_number(tree, ATTRIB_SCORING_TIME, &mut self.time)
            && ctx.read_number(tree, ATTRIB_SCORING_FAULTS, &mut self.course_faults)
            && ctx.read_number(tree, ATTRIB_SCORING_BONUSTITLEPTS, &mut self.bonus_title_pts)
            && ctx.read_number(tree, ATTRIB_SCORING_OBSTACLES, &mut self.obstacles)
            && ctx.read_number(tree, ATTRIB_SCORING_SCT, &mut self.sct);
        if !common {
            return false;
        }
        match kind {
            RunScoringKind::ByTime => {
                // A bad table flag is reported but not fatal.
                if tree
                    .get_attrib_bool(ATTRIB_SCORING_HAS_TABLE)
                    .assign(&mut self.has_table)
                    .is_err()
                {
                    ctx.invalid_bool(tree.name(), ATTRIB_SCORING_HAS_TABLE);
                    self.has_table = false;
                }
                ctx.read_number(tree, ATTRIB_BY_TIME_YARDS, &mut self.yards)
            }
            RunScoringKind::ByOpenClose => {
                ctx.read_number(tree, ATTRIB_SCORING_SCT2, &mut self.sct2)
                    && ctx.read_number(tree, ATTRIB_BY_OPENCLOSE_NEEDOPEN, &mut self.need_open_pts)
                    && ctx.read_number(tree, ATTRIB_BY_OPENCLOSE_NEEDCLOSE, &mut self.need_close_pts)
                    && ctx.read_number(tree, ATTRIB_BY_OPENCLOSE_GOTOPEN, &mut self.open_pts)
                    && ctx.read_number(tree, ATTRIB_BY_OPENCLOSE_GOTCLOSE, &mut self.close_pts)
            }
            RunScoringKind::ByPoints => {
                ctx.read_number(tree, ATTRIB_BY_POINTS_NEED, &mut self.need_open_pts)
                    && ctx.read_number(tree, ATTRIB_BY_POINTS_GOT, &mut self.open_pts)
            }
            RunScoringKind::NotSet => false,
        }
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        match self.kind {
            RunScoringKind::NotSet => {}
            RunScoringKind::ByTime => {
                let scoring = tree.add_element_node(TREE_BY_TIME, None);
                if self.has_table {
                    scoring.add_attrib_bool(ATTRIB_SCORING_HAS_TABLE, true);
                }
                scoring.add_attrib_int(ATTRIB_SCORING_FAULTS, i64::from(self.course_faults));
                scoring.add_attrib_double(ATTRIB_SCORING_TIME, self.time, 3);
                scoring.add_attrib_double(ATTRIB_SCORING_SCT, self.sct, 3);
                scoring.add_attrib_double(ATTRIB_BY_TIME_YARDS, self.yards, 3);
                self.save_bonus(scoring);
            }
            RunScoringKind::ByOpenClose => {
                let scoring = tree.add_element_node(TREE_BY_OPENCLOSE, None);
                if self.course_faults > 0 {
                    scoring.add_attrib_int(ATTRIB_SCORING_FAULTS, i64::from(self.course_faults));
                }
                scoring.add_attrib_double(ATTRIB_SCORING_TIME, self.time, 3);
                if self.sct > 0.0 {
                    scoring.add_attrib_double(ATTRIB_SCORING_SCT, self.sct, 3);
                }
                if self.sct2 > 0.0 {
                    scoring.add_attrib_double(ATTRIB_SCORING_SCT2, self.sct2, 3);
                }
                scoring.add_attrib_int(ATTRIB_BY_OPENCLOSE_NEEDOPEN, i64::from(self.need_open_pts));
                scoring.add_attrib_int(ATTRIB_BY_OPENCLOSE_NEEDCLOSE, i64::from(self.need_close_pts));
                scoring.add_attrib_int(ATTRIB_BY_OPENCLOSE_GOTOPEN, i64::from(self.open_pts));
                scoring.add_attrib_int(ATTRIB_BY_OPENCLOSE_GOTCLOSE, i64::from(self.close_pts));
                self.save_bonus(scoring);
            }
            RunScoringKind::ByPoints => {
                let scoring = tree.add_element_node(TREE_BY_POINTS, None);
                if self.course_faults > 0 {
                    scoring.add_attrib_int(ATTRIB_SCORING_FAULTS, i64::from(self.course_faults));
                }
                scoring.add_attrib_double(ATTRIB_SCORING_TIME, self.time, 3);
                if self.sct > 0.0 {
                    scoring.add_attrib_double(ATTRIB_SCORING_SCT, self.sct, 3);
                }
                scoring.add_attrib_int(ATTRIB_BY_POINTS_NEED, i64::from(self.need_open_pts));
                scoring.add_attrib_int(ATTRIB_BY_POINTS_GOT, i64::from(self.open_pts));
                self.save_bonus(scoring);
            }
        }
        true
    }

    fn save_bonus(&self, scoring: &mut ElementNode) {
        scoring.add_attrib_double(ATTRIB_SCORING_BONUSTITLEPTS, self.bonus_title_pts, 2);
        if self.obstacles > 0 {
            scoring.add_attrib_int(ATTRIB_SCORING_OBSTACLES, i64::from(self.obstacles));
        }
    }

    pub fn set_kind(&mut self, kind: RunScoringKind) {
        if self.kind == kind {
            return;
        }
        self.kind = kind;
        if kind != RunScoringKind::ByTime {
            self.has_table = false;
            self.yards = 0.0;
        }
        if kind != RunScoringKind::ByOpenClose {
            self.sct2 = 0.0;
            self.need_close_pts = 0;
            self.close_pts = 0;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Partner {
    pub handler: String,
    pub dog: String,
    pub reg_num: String,
}

impl Partner {
    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_PARTNER {
            return false;
        }
        let (Some(handler), Some(dog)) = (
            ctx.required(tree, ATTRIB_PARTNER_HANDLER),
            ctx.required(tree, ATTRIB_PARTNER_DOG),
        ) else {
            return false;
        };
        self.handler = handler;
        self.dog = dog;
        tree.read_attrib(ATTRIB_PARTNER_REGNUM, &mut self.reg_num);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let partner = tree.add_element_node(TREE_PARTNER, None);
        partner.add_attrib(ATTRIB_PARTNER_HANDLER, self.handler.as_str());
        partner.add_attrib(ATTRIB_PARTNER_DOG, self.dog.as_str());
        if !self.reg_num.is_empty() {
            partner.add_attrib(ATTRIB_PARTNER_REGNUM, self.reg_num.as_str());
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunOtherPoints {
    pub name: String,
    pub points: f64,
}

impl RunOtherPoints {
    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_PLACEMENT_OTHERPOINTS {
            return false;
        }
        let Some(name) = ctx.required(tree, ATTRIB_PLACEMENT_OTHERPOINTS_NAME) else {
            return false;
        };
        self.name = name;
        ctx.read_number(tree, ATTRIB_PLACEMENT_OTHERPOINTS_POINTS, &mut self.points)
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let other = tree.add_element_node(TREE_PLACEMENT_OTHERPOINTS, None);
        other.add_attrib(ATTRIB_PLACEMENT_OTHERPOINTS_NAME, self.name.as_str());
        other.add_attrib_double(ATTRIB_PLACEMENT_OTHERPOINTS_POINTS, self.points, 2);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunNotes {
    pub faults: Vec<String>,
    pub note: String,
}

impl RunNotes {
    pub fn is_empty(&self) -> bool {
        self.faults.is_empty() && self.note.is_empty()
    }

    pub fn load(&mut self, tree: &ElementNode) -> bool {
        if tree.name() != TREE_NOTES {
            return false;
        }
        for element in tree.elements() {
            match element.name() {
                TREE_FAULTS => self.faults.push(element.value().to_string()),
                TREE_OTHER => self.note = element.value().to_string(),
                _ => {}
            }
        }
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        if self.is_empty() {
            return true;
        }
        let notes = tree.add_element_node(TREE_NOTES, None);
        for fault in &self.faults {
            notes.add_element_node(TREE_FAULTS, None).set_value(fault.as_str());
        }
        if !self.note.is_empty() {
            notes.add_element_node(TREE_OTHER, None).set_value(self.note.as_str());
        }
        true
    }
}

/// A single run. Division, level and event are names in the venue of
/// the trial's primary club.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Run {
    pub date: ArbDate,
    pub division: String,
    pub level: String,
    pub height: String,
    pub event: String,
    pub sub_name: String,
    pub conditions: String,
    pub judge: String,
    pub handler: String,
    pub partners: Vec<Partner>,
    pub scoring: RunScoring,
    pub q: QualifyType,
    pub place: i16,
    pub in_class: i16,
    pub dogs_qd: i16,
    pub other_points: Vec<RunOtherPoints>,
    pub notes: RunNotes,
    pub links: BTreeSet<String>,
}

impl Default for Run {
    fn default() -> Self {
        Self {
            date: ArbDate::default(),
            division: String::new(),
            level: String::new(),
            height: String::new(),
            event: String::new(),
            sub_name: String::new(),
            conditions: String::new(),
            judge: String::new(),
            handler: String::new(),
            partners: Vec::new(),
            scoring: RunScoring::default(),
            q: QualifyType::default(),
            place: 0,
            in_class: 0,
            dogs_qd: -1,
            other_points: Vec::new(),
            notes: RunNotes::default(),
            links: BTreeSet::new(),
        }
    }
}

impl Run {
    pub fn new(date: ArbDate, division: &str, level: &str, event: &str) -> Self {
        Self {
            date,
            division: division.to_string(),
            level: level.to_string(),
            event: event.to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        format!("{} {}/{}", self.event, self.division, self.level)
    }

    pub(crate) fn describe(&self, venue: &str) -> String {
        format!(
            "{} {} {} {}/{}",
            self.date.to_iso_string(),
            venue,
            self.event,
            self.division,
            self.level
        )
    }

    pub fn search_strings(&self, strings: &mut BTreeSet<String>) -> usize {
        let mut count = 0;
        for text in [
            self.date.to_iso_string(),
            self.generic_name(),
            self.sub_name.clone(),
            self.conditions.clone(),
            self.judge.clone(),
            self.handler.clone(),
            self.notes.note.clone(),
        ] {
            if !text.is_empty() {
                strings.insert(text);
                count += 1;
            }
        }
        for partner in &self.partners {
            strings.insert(partner.handler.clone());
            strings.insert(partner.dog.clone());
            count += 2;
        }
        count
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_RUN {
            return false;
        }
        match tree.get_attrib_date(ATTRIB_RUN_DATE) {
            AttribLookup::Found(date) => self.date = date,
            AttribLookup::NotFound => {
                ctx.missing_attribute(TREE_RUN, ATTRIB_RUN_DATE);
                return false;
            }
            AttribLookup::Invalid(raw) => {
                ctx.invalid_date(TREE_RUN, ATTRIB_RUN_DATE, &raw);
                return false;
            }
        }
        let Some(division) = ctx.required(tree, ATTRIB_RUN_DIVISION) else {
            return false;
        };
        let Some(level) = ctx.required(tree, ATTRIB_RUN_LEVEL) else {
            return false;
        };
        tree.read_attrib(ATTRIB_RUN_HEIGHT, &mut self.height);
        let Some(event) = ctx.required(tree, ATTRIB_RUN_EVENT) else {
            return false;
        };
        self.division = division;
        self.level = level;
        self.event = event;
        tree.read_attrib(ATTRIB_RUN_SUBNAME, &mut self.sub_name);

        for element in tree.elements() {
            match element.name() {
                TREE_CONDITIONS => self.conditions = element.value().to_string(),
                TREE_JUDGE => self.judge = element.value().to_string(),
                TREE_HANDLER => self.handler = element.value().to_string(),
                TREE_PARTNER => {
                    let mut partner = Partner::default();
                    if partner.load(element, ctx) {
                        self.partners.push(partner);
                    }
                }
                TREE_BY_TIME | TREE_BY_OPENCLOSE | TREE_BY_POINTS => {
                    let mut scoring = RunScoring::default();
                    if scoring.load(element, ctx) {
                        self.scoring = scoring;
                    } else {
                        debug!(run = %self.generic_name(), "ignored unreadable score sheet");
                    }
                }
                TREE_PLACEMENT => {
                    if !self.load_placement(element, ctx) {
                        return false;
                    }
                }
                TREE_NOTES => {
                    self.notes.load(element);
                }
                TREE_RUN_LINK => {
                    self.links.insert(element.value().to_string());
                }
                _ => {}
            }
        }
        true
    }

    fn load_placement(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let Some(code) = ctx.required(tree, ATTRIB_PLACEMENT_Q) else {
            return false;
        };
        match QualifyType::from_code(&code) {
            Some(q) => self.q = q,
            None => {
                let codes = QualifyType::ALL
                    .iter()
                    .map(|q| q.code())
                    .collect::<Vec<_>>()
                    .join(", ");
                let hint = ctx.text().valid_values(&codes);
                ctx.invalid_attribute(TREE_PLACEMENT, ATTRIB_PLACEMENT_Q, Some(&hint));
                return false;
            }
        }
        if !(ctx.read_number(tree, ATTRIB_PLACEMENT_PLACE, &mut self.place)
            && ctx.read_number(tree, ATTRIB_PLACEMENT_INCLASS, &mut self.in_class)
            && ctx.read_number(tree, ATTRIB_PLACEMENT_DOGSQD, &mut self.dogs_qd))
        {
            return false;
        }
        for element in tree.elements() {
            let mut other = RunOtherPoints::default();
            if other.load(element, ctx) {
                self.other_points.push(other);
            }
        }
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let run = tree.add_element_node(TREE_RUN, None);
        run.add_attrib_date(ATTRIB_RUN_DATE, &self.date);
        run.add_attrib(ATTRIB_RUN_DIVISION, self.division.as_str());
        run.add_attrib(ATTRIB_RUN_LEVEL, self.level.as_str());
        if !self.height.is_empty() {
            run.add_attrib(ATTRIB_RUN_HEIGHT, self.height.as_str());
        }
        run.add_attrib(ATTRIB_RUN_EVENT, self.event.as_str());
        if !self.sub_name.is_empty() {
            run.add_attrib(ATTRIB_RUN_SUBNAME, self.sub_name.as_str());
        }
        for (name, value) in [
            (TREE_CONDITIONS, &self.conditions),
            (TREE_JUDGE, &self.judge),
            (TREE_HANDLER, &self.handler),
        ] {
            if !value.is_empty() {
                run.add_element_node(name, None).set_value(value.as_str());
            }
        }
        if !self.partners.iter().all(|p| p.save(run)) || !self.scoring.save(run) {
            return false;
        }
        if self.place > 0 || self.q != QualifyType::NotApplicable {
            let placement = run.add_element_node(TREE_PLACEMENT, None);
            placement.add_attrib(ATTRIB_PLACEMENT_Q, self.q.code());
            placement.add_attrib_int(ATTRIB_PLACEMENT_PLACE, i64::from(self.place));
            if self.in_class > 0 {
                placement.add_attrib_int(ATTRIB_PLACEMENT_INCLASS, i64::from(self.in_class));
            }
            if self.dogs_qd >= 0 {
                placement.add_attrib_int(ATTRIB_PLACEMENT_DOGSQD, i64::from(self.dogs_qd));
            }
            if !self.other_points.iter().all(|o| o.save(placement)) {
                return false;
            }
        }
        if !self.notes.save(run) {
            return false;
        }
        for link in self.links.iter().filter(|l| !l.is_empty()) {
            run.add_element_node(TREE_RUN_LINK, None).set_value(link.as_str());
        }
        true
    }

    pub fn count_other_points(&self, name: &str) -> usize {
        self.other_points.iter().filter(|o| o.name == name).count()
    }

    pub fn rename_other_points(&mut self, old_name: &str, new_name: &str) -> usize {
        let mut count = 0;
        for other in self.other_points.iter_mut().filter(|o| o.name == old_name) {
            other.name = new_name.to_string();
            count += 1;
        }
        count
    }

    pub fn delete_other_points(&mut self, name: &str) -> usize {
        let before = self.other_points.len();
        self.other_points.retain(|o| o.name != name);
        before - self.other_points.len()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunList {
    runs: Vec<Run>,
}

impl RunList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Run> {
        self.runs.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Run> {
        self.runs.iter_mut()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut run = Run::default();
        if !run.load(tree, ctx) {
            return false;
        }
        self.runs.push(run);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.runs.iter().all(|r| r.save(tree))
    }

    pub fn sort(&mut self) {
        self.runs.sort_by(|a, b| a.date.cmp(&b.date));
    }

    pub fn start_date(&self) -> ArbDate {
        self.runs.iter().map(|r| r.date).min().unwrap_or_default()
    }

    pub fn end_date(&self) -> ArbDate {
        self.runs.iter().map(|r| r.date).max().unwrap_or_default()
    }

    pub fn add_run(&mut self, run: Run) -> bool {
        self.runs.push(run);
        true
    }

    pub fn delete_run(&mut self, run: &Run) -> bool {
        match self.runs.iter().position(|r| r == run) {
            Some(index) => {
                self.runs.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn retain(&mut self, mut keep: impl FnMut(&mut Run) -> bool) -> usize {
        let before = self.runs.len();
        self.runs.retain_mut(|r| keep(r));
        before - self.runs.len()
    }
}
