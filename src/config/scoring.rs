use super::division::DivisionList;
use crate::element::ElementNode;
use crate::error::LoadContext;
use crate::types::{ArbDate, ArbVersion};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TREE_SCORING: &str = "Scoring";
const TREE_NOTE: &str = "Note";
const TREE_SCORING_SUBNAME: &str = "SubName";
const TREE_PLACE_INFO: &str = "PlaceInfo";
const TREE_TITLE_POINTS: &str = "TitlePoints";
const TREE_LIFETIME_POINTS: &str = "LifetimePoints";
const TREE_LIFETIME_POINTS_OLD: &str = "LifeTime";
const TREE_PLACEMENTS: &str = "Placements";

const ATTRIB_SCORING_VALIDFROM: &str = "ValidFrom";
const ATTRIB_SCORING_VALIDTO: &str = "ValidTo";
const ATTRIB_SCORING_DIVISION: &str = "Division";
const ATTRIB_SCORING_LEVEL: &str = "Level";
const ATTRIB_SCORING_TYPE: &str = "type";
const ATTRIB_SCORING_DROPFRACTIONS: &str = "dropFractions";
const ATTRIB_SCORING_TIMEFAULTS_CLEAN_Q: &str = "cleanQ";
const ATTRIB_SCORING_TIMEFAULTS_UNDER: &str = "underTF";
const ATTRIB_SCORING_TIMEFAULTS_OVER: &str = "overTF";
const ATTRIB_SCORING_SUBTRACT_TIMEFAULTS: &str = "subtractTF";
const ATTRIB_SCORING_TF_MULTIPLIER: &str = "timeFault";
const ATTRIB_SCORING_OPENINGPTS: &str = "OpeningPts";
const ATTRIB_SCORING_CLOSINGPTS: &str = "ClosingPts";
const ATTRIB_SCORING_SUPERQ: &str = "superQ";
const ATTRIB_SCORING_SPEEDPTS: &str = "speedPts";
const ATTRIB_SCORING_BONUSPTS: &str = "bonusPts";
const ATTRIB_SCORING_HAS_TABLE: &str = "hasTable";
const ATTRIB_SCORING_HASSUBNAMES: &str = "hasSubNames";

const ATTRIB_PLACE_INFO_PLACE: &str = "Place";
const ATTRIB_PLACE_INFO_VALUE: &str = "Value";
const ATTRIB_PLACE_INFO_MUSTQ: &str = "MustQ";
const ATTRIB_TITLE_POINTS_POINTS: &str = "Points";
const ATTRIB_TITLE_POINTS_FAULTS: &str = "Faults";
const ATTRIB_LIFETIME_POINTS_NAME: &str = "Name";
const ATTRIB_LIFETIME_POINTS_SPEEDPTS: &str = "speedPts";
const ATTRIB_LIFETIME_POINTS_POINTS: &str = "Points";
const ATTRIB_LIFETIME_POINTS_FAULTS: &str = "Faults";

pub const WILDCARD: &str = "*";

const VERSION_SCORING_DATE: ArbVersion = ArbVersion::new(8, 0);
const VERSION_FT100_DROPS_FRACTIONS: ArbVersion = ArbVersion::new(3, 0);
const VERSION_SCORING_CHILDREN: ArbVersion = ArbVersion::new(5, 0);
const VERSION_LIFETIME_POINTS: ArbVersion = ArbVersion::new(10, 0);
const VERSION_SPEED_PTS_RENAMED: ArbVersion = ArbVersion::new(10, 1);
const VERSION_SPEED_PLACE_INFO: ArbVersion = ArbVersion::new(12, 3);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoringStyle {
    #[default]
    FaultsThenTime,
    Faults100ThenTime,
    Faults200ThenTime,
    OcScoreThenTime,
    ScoreThenTime,
    TimePlusFaults,
}

impl ScoringStyle {
    pub const ALL: [ScoringStyle; 6] = [
        Self::FaultsThenTime,
        Self::Faults100ThenTime,
        Self::Faults200ThenTime,
        Self::OcScoreThenTime,
        Self::ScoreThenTime,
        Self::TimePlusFaults,
    ];

    pub fn code(self) -> &'static str {
        match self {
            Self::FaultsThenTime => "FaultsThenTime",
            Self::Faults100ThenTime => "Faults100ThenTime",
            Self::Faults200ThenTime => "Faults200ThenTime",
            Self::OcScoreThenTime => "OCScoreThenTime",
            Self::ScoreThenTime => "ScoreThenTime",
            Self::TimePlusFaults => "TimePlusFaults",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.code() == code)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TitlePoints {
    pub points: f64,
    pub faults: f64,
}

impl TitlePoints {
    fn load(
        &mut self,
        tree: &ElementNode,
        ctx: &mut LoadContext<'_>,
        lifetime: &mut LifetimePointsList,
    ) -> bool {
        if tree.name() != TREE_TITLE_POINTS {
            return false;
        }
        let Some(points) = ctx.required_number(tree, ATTRIB_TITLE_POINTS_POINTS) else {
            return false;
        };
        let Some(faults) = ctx.required_number(tree, ATTRIB_TITLE_POINTS_FAULTS) else {
            return false;
        };
        self.points = points;
        self.faults = faults;
        if ctx.version() < VERSION_LIFETIME_POINTS
            && tree.get_attrib_bool(TREE_LIFETIME_POINTS_OLD).found() == Some(true)
        {
            lifetime.add_lifetime_points("", false, points, faults);
        }
        true
    }

    fn save(&self, tree: &mut ElementNode) -> bool {
        let node = tree.add_element_node(TREE_TITLE_POINTS, None);
        node.add_attrib_double(ATTRIB_TITLE_POINTS_POINTS, self.points, 2);
        node.add_attrib_double(ATTRIB_TITLE_POINTS_FAULTS, self.faults, 2);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TitlePointsList {
    items: Vec<TitlePoints>,
}

impl TitlePointsList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TitlePoints> {
        self.items.iter()
    }

    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| a.faults.total_cmp(&b.faults));
    }

    pub fn title_points(&self, faults: f64) -> f64 {
        self.items
            .iter()
            .find(|p| faults <= p.faults)
            .map_or(0.0, |p| p.points)
    }

    pub fn find_title_points(&self, faults: f64) -> Option<&TitlePoints> {
        self.items.iter().find(|p| p.faults == faults)
    }

    pub fn add_title_points(&mut self, points: f64, faults: f64) -> bool {
        if self.find_title_points(faults).is_some() {
            return false;
        }
        self.items.push(TitlePoints { points, faults });
        self.sort();
        true
    }

    pub fn delete_title_points(&mut self, faults: f64) -> bool {
        match self.items.iter().position(|p| p.faults == faults) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimePoints {
    pub name: String,
    pub use_speed_pts: bool,
    pub points: f64,
    pub faults: f64,
}

impl LifetimePoints {
    fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        match tree.name() {
            // Older files: no name, points required.
            TREE_LIFETIME_POINTS_OLD => {
                let Some(points) = ctx.required_number(tree, ATTRIB_LIFETIME_POINTS_POINTS) else {
                    return false;
                };
                self.points = points;
            }
            TREE_LIFETIME_POINTS => {
                tree.read_attrib(ATTRIB_LIFETIME_POINTS_NAME, &mut self.name);
                if !ctx.read_bool(tree, ATTRIB_LIFETIME_POINTS_SPEEDPTS, &mut self.use_speed_pts)
                    || !ctx.read_number(tree, ATTRIB_LIFETIME_POINTS_POINTS, &mut self.points)
                {
                    return false;
                }
            }
            _ => return false,
        }
        let Some(faults) = ctx.required_number(tree, ATTRIB_LIFETIME_POINTS_FAULTS) else {
            return false;
        };
        self.faults = faults;
        true
    }

    fn save(&self, tree: &mut ElementNode) -> bool {
        let node = tree.add_element_node(TREE_LIFETIME_POINTS, None);
        if !self.name.is_empty() {
            node.add_attrib(ATTRIB_LIFETIME_POINTS_NAME, self.name.as_str());
        }
        node.add_attrib_bool(ATTRIB_LIFETIME_POINTS_SPEEDPTS, self.use_speed_pts);
        if !self.use_speed_pts {
            node.add_attrib_double(ATTRIB_LIFETIME_POINTS_POINTS, self.points, 2);
        }
        node.add_attrib_double(ATTRIB_LIFETIME_POINTS_FAULTS, self.faults, 2);
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifetimePointsList {
    items: Vec<LifetimePoints>,
}

impl LifetimePointsList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LifetimePoints> {
        self.items.iter()
    }

    pub fn sort(&mut self) {
        self.items.sort_by(|a, b| {
            a.name
                .cmp(&b.name)
                .then_with(|| a.faults.total_cmp(&b.faults))
        });
    }

    pub fn lifetime_points(&self, name: &str, faults: f64, speed_pts: i16) -> f64 {
        self.items
            .iter()
            .find(|p| p.name == name && faults <= p.faults)
            .map_or(0.0, |p| {
                if p.use_speed_pts {
                    f64::from(speed_pts)
                } else {
                    p.points
                }
            })
    }

    pub fn find_lifetime_points(&self, name: &str, faults: f64) -> Option<&LifetimePoints> {
        self.items
            .iter()
            .find(|p| p.name == name && p.faults == faults)
    }

    pub fn add_lifetime_points(&mut self, name: &str, use_speed_pts: bool, points: f64, faults: f64) -> bool {
        if self.find_lifetime_points(name, faults).is_some() {
            return false;
        }
        self.items.push(LifetimePoints {
            name: name.to_string(),
            use_speed_pts,
            points: if use_speed_pts { 0.0 } else { points },
            faults,
        });
        self.sort();
        true
    }

    pub fn delete_lifetime_points(&mut self, name: &str, faults: f64) -> bool {
        match self
            .items
            .iter()
            .position(|p| p.name == name && p.faults == faults)
        {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn rename_lifetime_name(&mut self, old_name: &str, new_name: &str) -> usize {
        let mut count = 0;
        for item in self.items.iter_mut().filter(|p| p.name == old_name) {
            item.name = new_name.to_string();
            count += 1;
        }
        if count > 0 {
            self.sort();
        }
        count
    }

    pub fn delete_lifetime_name(&mut self, name: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|p| p.name != name);
        before - self.items.len()
    }
}

/// Value of a placement. A place of `-1` matches any place not listed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PlaceInfo {
    pub place: i16,
    pub value: f64,
    pub must_q: bool,
}

impl Default for PlaceInfo {
    fn default() -> Self {
        Self {
            place: 0,
            value: 0.0,
            must_q: true,
        }
    }
}

impl PlaceInfo {
    fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_PLACE_INFO {
            return false;
        }
        let Some(place) = ctx.required_number(tree, ATTRIB_PLACE_INFO_PLACE) else {
            return false;
        };
        let Some(value) = ctx.required_number(tree, ATTRIB_PLACE_INFO_VALUE) else {
            return false;
        };
        self.place = place;
        self.value = value;
        ctx.read_bool(tree, ATTRIB_PLACE_INFO_MUSTQ, &mut self.must_q)
    }

    fn save(&self, tree: &mut ElementNode) -> bool {
        let node = tree.add_element_node(TREE_PLACE_INFO, None);
        node.add_attrib_int(ATTRIB_PLACE_INFO_PLACE, i64::from(self.place));
        node.add_attrib_double(ATTRIB_PLACE_INFO_VALUE, self.value, 2);
        if !self.must_q {
            node.add_attrib_bool(ATTRIB_PLACE_INFO_MUSTQ, false);
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceInfoList {
    items: Vec<PlaceInfo>,
}

impl PlaceInfoList {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlaceInfo> {
        self.items.iter()
    }

    pub fn sort(&mut self) {
        self.items.sort_by_key(|p| p.place);
    }

    pub fn find_place_info(&self, place: i16) -> Option<&PlaceInfo> {
        self.items.iter().find(|p| p.place == place).or_else(|| {
            if place > 0 {
                self.items.iter().find(|p| p.place == -1)
            } else {
                None
            }
        })
    }

    pub fn place_value(&self, place: i16) -> Option<f64> {
        self.find_place_info(place).map(|p| p.value)
    }

    pub fn add_place_info(&mut self, place: i16, value: f64, must_q: bool) -> bool {
        if self.items.iter().any(|p| p.place == place) {
            return false;
        }
        self.items.push(PlaceInfo {
            place,
            value,
            must_q,
        });
        self.sort();
        true
    }

    pub fn delete_place_info(&mut self, place: i16) -> bool {
        match self.items.iter().position(|p| p.place == place) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }

    fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut info = PlaceInfo::default();
        if !info.load(tree, ctx) {
            return false;
        }
        self.items.push(info);
        true
    }

    fn save(&self, tree: &mut ElementNode) -> bool {
        self.items.iter().all(|p| p.save(tree))
    }
}

/// A date-ranged scoring method for one division/level of an event.
/// Division and level may be [`WILDCARD`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scoring {
    pub valid_from: ArbDate,
    pub valid_to: ArbDate,
    pub division: String,
    pub level: String,
    pub style: ScoringStyle,
    pub drop_fractions: bool,
    pub clean_q: bool,
    pub time_faults_under: bool,
    pub time_faults_over: bool,
    pub subtract_time_faults: bool,
    pub time_fault_multiplier: i16,
    pub note: String,
    pub opening_pts: i16,
    pub closing_pts: i16,
    pub super_q: bool,
    pub speed_pts: bool,
    pub bonus_pts: bool,
    pub has_table: bool,
    pub has_sub_names: bool,
    pub sub_names: BTreeSet<String>,
    pub place_info: PlaceInfoList,
    pub title_points: TitlePointsList,
    pub lifetime_points: LifetimePointsList,
    pub placements: PlaceInfoList,
}

impl Default for Scoring {
    fn default() -> Self {
        Self {
            valid_from: ArbDate::invalid(),
            valid_to: ArbDate::invalid(),
            division: String::new(),
            level: String::new(),
            style: ScoringStyle::FaultsThenTime,
            drop_fractions: false,
            clean_q: false,
            time_faults_under: false,
            time_faults_over: false,
            subtract_time_faults: false,
            time_fault_multiplier: 1,
            note: String::new(),
            opening_pts: 0,
            closing_pts: 0,
            super_q: false,
            speed_pts: false,
            bonus_pts: false,
            has_table: false,
            has_sub_names: false,
            sub_names: BTreeSet::new(),
            place_info: PlaceInfoList::default(),
            title_points: TitlePointsList::default(),
            lifetime_points: LifetimePointsList::default(),
            placements: PlaceInfoList::default(),
        }
    }
}

impl Scoring {
    pub fn new(division: impl AsRef<str>, level: impl AsRef<str>) -> Self {
        Self {
            division: division.as_ref().to_string(),
            level: level.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        format!("{} {}", self.division, self.level)
    }

    pub fn is_valid_on(&self, date: &ArbDate) -> bool {
        if !date.is_valid() {
            return true;
        }
        !((self.valid_from.is_valid() && *date < self.valid_from)
            || (self.valid_to.is_valid() && *date > self.valid_to))
    }

    fn matches(&self, division: &str, level: &str) -> bool {
        (self.division == division || self.division == WILDCARD || division == WILDCARD)
            && (self.level == level || self.level == WILDCARD || level == WILDCARD)
    }

    pub fn load(&mut self, divisions: &DivisionList, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_SCORING {
            return false;
        }
        let version = ctx.version();
        if version == VERSION_SCORING_DATE {
            if let Some(date) = tree.get_attrib_date("Date").found() {
                self.valid_from = date;
            }
        }
        if !ctx.read_date(tree, ATTRIB_SCORING_VALIDFROM, &mut self.valid_from)
            || !ctx.read_date(tree, ATTRIB_SCORING_VALIDTO, &mut self.valid_to)
        {
            return false;
        }
        let Some(division) = ctx.required(tree, ATTRIB_SCORING_DIVISION) else {
            return false;
        };
        let Some(level) = ctx.required(tree, ATTRIB_SCORING_LEVEL) else {
            return false;
        };
        if !divisions.verify_level(&division, &level) {
            let hint = ctx
                .text()
                .invalid_reference("division/level", &format!("{division}/{level}"));
            ctx.invalid_attribute(TREE_SCORING, ATTRIB_SCORING_LEVEL, Some(&hint));
            return false;
        }
        self.division = division;
        self.level = level;

        let Some(style) = ctx.required(tree, ATTRIB_SCORING_TYPE) else {
            return false;
        };
        match ScoringStyle::from_code(&style) {
            Some(s) => self.style = s,
            None => {
                let codes = ScoringStyle::ALL.map(ScoringStyle::code).join(", ");
                let hint = ctx.text().valid_values(&codes);
                ctx.invalid_attribute(TREE_SCORING, ATTRIB_SCORING_TYPE, Some(&hint));
                return false;
            }
        }
        if self.style == ScoringStyle::Faults100ThenTime && version <= VERSION_FT100_DROPS_FRACTIONS {
            self.drop_fractions = true;
        }

        let flags: [(&str, &mut bool); 10] = [
            (ATTRIB_SCORING_DROPFRACTIONS, &mut self.drop_fractions),
            (ATTRIB_SCORING_TIMEFAULTS_CLEAN_Q, &mut self.clean_q),
            (ATTRIB_SCORING_TIMEFAULTS_UNDER, &mut self.time_faults_under),
            (ATTRIB_SCORING_TIMEFAULTS_OVER, &mut self.time_faults_over),
            (ATTRIB_SCORING_SUBTRACT_TIMEFAULTS, &mut self.subtract_time_faults),
            (ATTRIB_SCORING_SUPERQ, &mut self.super_q),
            (ATTRIB_SCORING_SPEEDPTS, &mut self.speed_pts),
            (ATTRIB_SCORING_BONUSPTS, &mut self.bonus_pts),
            (ATTRIB_SCORING_HAS_TABLE, &mut self.has_table),
            (ATTRIB_SCORING_HASSUBNAMES, &mut self.has_sub_names),
        ];
        for (attrib, slot) in flags {
            if !ctx.read_bool(tree, attrib, slot) {
                return false;
            }
        }
        if !ctx.read_number(tree, ATTRIB_SCORING_TF_MULTIPLIER, &mut self.time_fault_multiplier) {
            return false;
        }

        if version >= VERSION_SCORING_CHILDREN {
            self.load_children(tree, ctx)
        } else {
            self.load_pre_v5(tree, ctx)
        }
    }

    fn load_children(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let version = ctx.version();
        if version < VERSION_SPEED_PTS_RENAMED && !ctx.read_bool(tree, "machPts", &mut self.speed_pts) {
            return false;
        }
        if self.speed_pts && version < VERSION_SPEED_PLACE_INFO {
            self.place_info.add_place_info(1, 2.0, true);
            self.place_info.add_place_info(2, 1.5, true);
        }
        if !ctx.read_number(tree, ATTRIB_SCORING_OPENINGPTS, &mut self.opening_pts)
            || !ctx.read_number(tree, ATTRIB_SCORING_CLOSINGPTS, &mut self.closing_pts)
        {
            return false;
        }
        for element in tree.elements() {
            let ok = match element.name() {
                TREE_NOTE => {
                    self.note = element.value().to_string();
                    true
                }
                TREE_SCORING_SUBNAME => {
                    self.sub_names.insert(element.value().to_string());
                    true
                }
                TREE_PLACE_INFO => self.place_info.load(element, ctx),
                TREE_TITLE_POINTS => {
                    let mut points = TitlePoints::default();
                    let ok = points.load(element, ctx, &mut self.lifetime_points);
                    if ok {
                        self.title_points.items.push(points);
                    }
                    ok
                }
                TREE_LIFETIME_POINTS | TREE_LIFETIME_POINTS_OLD if version >= VERSION_LIFETIME_POINTS => {
                    let mut points = LifetimePoints::default();
                    let ok = points.load(element, ctx);
                    if ok {
                        self.lifetime_points.items.push(points);
                    }
                    ok
                }
                TREE_PLACEMENTS => element
                    .elements()
                    .iter()
                    .filter(|p| p.name() == TREE_PLACE_INFO)
                    .all(|p| self.placements.load(p, ctx)),
                _ => true,
            };
            if !ok {
                return false;
            }
        }
        self.place_info.sort();
        self.title_points.sort();
        self.lifetime_points.sort();
        self.placements.sort();
        true
    }

    fn load_pre_v5(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let Some(clean) = ctx.required_number::<i16>(tree, "Clean") else {
            return false;
        };
        if clean > 0 {
            self.title_points.add_title_points(f64::from(clean), 0.0);
        }
        let faults_allowed = tree.get_attrib_parsed::<i16>("FaultsAllowed").found().unwrap_or(0);
        let with_faults = tree.get_attrib_parsed::<i16>("WithFaults").found().unwrap_or(0);
        if faults_allowed > 0 && with_faults > 0 {
            self.title_points
                .add_title_points(f64::from(with_faults), f64::from(faults_allowed));
        }
        if ctx.version() >= VERSION_FT100_DROPS_FRACTIONS {
            self.note = tree.value().to_string();
        }
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let scoring = tree.add_element_node(TREE_SCORING, None);
        scoring.add_attrib_date(ATTRIB_SCORING_VALIDFROM, &self.valid_from);
        scoring.add_attrib_date(ATTRIB_SCORING_VALIDTO, &self.valid_to);
        scoring.add_attrib(ATTRIB_SCORING_DIVISION, self.division.as_str());
        scoring.add_attrib(ATTRIB_SCORING_LEVEL, self.level.as_str());
        scoring.add_attrib(ATTRIB_SCORING_TYPE, self.style.code());
        let flags = [
            (ATTRIB_SCORING_DROPFRACTIONS, self.drop_fractions),
            (ATTRIB_SCORING_TIMEFAULTS_CLEAN_Q, self.clean_q),
            (ATTRIB_SCORING_TIMEFAULTS_UNDER, self.time_faults_under),
            (ATTRIB_SCORING_TIMEFAULTS_OVER, self.time_faults_over),
            (ATTRIB_SCORING_SUBTRACT_TIMEFAULTS, self.subtract_time_faults),
            (ATTRIB_SCORING_SUPERQ, self.super_q),
            (ATTRIB_SCORING_SPEEDPTS, self.speed_pts),
            (ATTRIB_SCORING_BONUSPTS, self.bonus_pts),
            (ATTRIB_SCORING_HAS_TABLE, self.has_table),
            (ATTRIB_SCORING_HASSUBNAMES, self.has_sub_names),
        ];
        for (attrib, value) in flags.into_iter().filter(|(_, v)| *v) {
            scoring.add_attrib_bool(attrib, value);
        }
        if self.time_fault_multiplier > 1 {
            scoring.add_attrib_int(ATTRIB_SCORING_TF_MULTIPLIER, i64::from(self.time_fault_multiplier));
        }
        if self.opening_pts > 0 {
            scoring.add_attrib_int(ATTRIB_SCORING_OPENINGPTS, i64::from(self.opening_pts));
        }
        if self.closing_pts > 0 {
            scoring.add_attrib_int(ATTRIB_SCORING_CLOSINGPTS, i64::from(self.closing_pts));
        }
        if !self.note.is_empty() {
            scoring.add_element_node(TREE_NOTE, None).set_value(self.note.as_str());
        }
        for sub_name in &self.sub_names {
            scoring
                .add_element_node(TREE_SCORING_SUBNAME, None)
                .set_value(sub_name.as_str());
        }
        if self.speed_pts && !self.place_info.save(scoring) {
            return false;
        }
        if !self.title_points.iter().all(|p| p.save(scoring))
            || !self.lifetime_points.iter().all(|p| p.save(scoring))
        {
            return false;
        }
        if !self.placements.is_empty() {
            let node = scoring.add_element_node(TREE_PLACEMENTS, None);
            if !self.placements.save(node) {
                return false;
            }
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringList {
    items: Vec<Scoring>,
}

impl ScoringList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Scoring> {
        self.items.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Scoring> {
        self.items.iter_mut()
    }

    pub fn load(&mut self, divisions: &DivisionList, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut scoring = Scoring::default();
        if !scoring.load(divisions, tree, ctx) {
            return false;
        }
        self.items.push(scoring);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.items.iter().all(|s| s.save(tree))
    }

    /// Every method for `division`/`level` valid on `date`, wildcards on
    /// either side included. With `title_points`, only methods that earn
    /// title or lifetime points are returned.
    pub fn find_all_events(
        &self,
        division: &str,
        level: &str,
        date: &ArbDate,
        title_points: bool,
    ) -> Vec<&Scoring> {
        self.items
            .iter()
            .filter(|s| s.matches(division, level) && s.is_valid_on(date))
            .filter(|s| !title_points || !s.title_points.is_empty() || !s.lifetime_points.is_empty())
            .collect()
    }

    pub fn find_event(&self, division: &str, level: &str, date: &ArbDate) -> Option<&Scoring> {
        self.find_all_events(division, level, date, false)
            .into_iter()
            .next()
    }

    pub fn verify_event(&self, division: &str, level: &str, date: &ArbDate) -> bool {
        self.find_event(division, level, date).is_some()
    }

    pub fn add_scoring(&mut self) -> &mut Scoring {
        self.items.push(Scoring::new(WILDCARD, WILDCARD));
        let last = self.items.len() - 1;
        &mut self.items[last]
    }

    pub fn push(&mut self, scoring: Scoring) {
        self.items.push(scoring);
    }

    pub fn delete_scoring(&mut self, division: &str, level: &str) -> usize {
        let before = self.items.len();
        self.items
            .retain(|s| !(s.division == division && s.level == level));
        before - self.items.len()
    }

    pub fn rename_division(&mut self, old_div: &str, new_div: &str) -> usize {
        let mut count = 0;
        for s in self.items.iter_mut().filter(|s| s.division == old_div) {
            s.division = new_div.to_string();
            count += 1;
        }
        count
    }

    pub fn delete_division(&mut self, division: &str) -> usize {
        let before = self.items.len();
        self.items.retain(|s| s.division != division);
        before - self.items.len()
    }

    pub fn rename_level(&mut self, division: &str, old_level: &str, new_level: &str) -> usize {
        let mut count = 0;
        for s in self
            .items
            .iter_mut()
            .filter(|s| s.level == old_level && (s.division == division || s.division == WILDCARD))
        {
            s.level = new_level.to_string();
            count += 1;
        }
        count
    }

    pub fn delete_level(&mut self, division: &str, level: &str) -> usize {
        let before = self.items.len();
        self.items
            .retain(|s| !(s.level == level && (s.division == division || s.division == WILDCARD)));
        before - self.items.len()
    }

    pub fn rename_lifetime_name(&mut self, old_name: &str, new_name: &str) -> usize {
        self.items
            .iter_mut()
            .map(|s| s.lifetime_points.rename_lifetime_name(old_name, new_name))
            .sum()
    }

    pub fn delete_lifetime_name(&mut self, name: &str) -> usize {
        self.items
            .iter_mut()
            .map(|s| s.lifetime_points.delete_lifetime_name(name))
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::division::Division;
    use crate::config::division::Level;
    use crate::error::{CollectingErrorCallback, Localization};
    use crate::types::CURRENT_DOC_VERSION;

    fn divisions() -> DivisionList {
        let mut list = DivisionList::new();
        let mut div = Division::new("Standard");
        div.levels.add_level(Level::new("Novice"));
        div.levels.add_level(Level::new("Open"));
        list.add_division(div);
        list
    }

    fn load_at(xml: &str, version: ArbVersion) -> (Option<Scoring>, CollectingErrorCallback) {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut scoring = Scoring::default();
        let ok = {
            let mut ctx = LoadContext::new(version, &text, &mut cb);
            scoring.load(&divisions(), &ElementNode::load_xml_str(xml).unwrap(), &mut ctx)
        };
        (ok.then_some(scoring), cb)
    }

    fn load(xml: &str) -> (Option<Scoring>, CollectingErrorCallback) {
        load_at(xml, CURRENT_DOC_VERSION)
    }

    #[test]
    fn loads_children_and_sorts_points() {
        let (scoring, cb) = load(
            r#"<Scoring Division="Standard" Level="Novice" type="Faults100ThenTime" cleanQ="y" timeFault="3">
                <Note>Course time</Note>
                <SubName>Gamble</SubName>
                <TitlePoints Points="5" Faults="5"/>
                <TitlePoints Points="10" Faults="0"/>
                <LifetimePoints Name="Gold" speedPts="n" Points="2" Faults="0"/>
                <Placements><PlaceInfo Place="1" Value="4"/><PlaceInfo Place="-1" Value="1" MustQ="n"/></Placements>
            </Scoring>"#,
        );
        assert!(cb.is_empty(), "{}", cb.text());
        let scoring = scoring.unwrap();
        assert_eq!(scoring.style, ScoringStyle::Faults100ThenTime);
        assert!(!scoring.drop_fractions);
        assert!(scoring.clean_q);
        assert_eq!(scoring.time_fault_multiplier, 3);
        assert_eq!(scoring.note, "Course time");
        assert!(scoring.sub_names.contains("Gamble"));
        assert_eq!(scoring.title_points.iter().next().unwrap().faults, 0.0);
        assert_eq!(scoring.title_points.title_points(3.0), 5.0);
        assert_eq!(scoring.title_points.title_points(6.0), 0.0);
        assert_eq!(scoring.lifetime_points.lifetime_points("Gold", 0.0, 0), 2.0);
        assert_eq!(scoring.placements.place_value(1), Some(4.0));
        assert_eq!(scoring.placements.place_value(7), Some(1.0));
    }

    #[test]
    fn unknown_division_level_is_rejected() {
        let (scoring, cb) = load(r#"<Scoring Division="Standard" Level="Masters" type="FaultsThenTime"/>"#);
        assert!(scoring.is_none());
        assert!(cb.text().contains("Standard/Masters"));
    }

    #[test]
    fn wildcards_verify() {
        let (scoring, _) = load(r#"<Scoring Division="*" Level="*" type="ScoreThenTime"/>"#);
        assert!(scoring.is_some());
    }

    #[test]
    fn bad_type_lists_all_styles() {
        let (scoring, cb) = load(r#"<Scoring Division="Standard" Level="Open" type="Guesswork"/>"#);
        assert!(scoring.is_none());
        assert!(cb
            .text()
            .contains("FaultsThenTime, Faults100ThenTime, Faults200ThenTime, OCScoreThenTime, ScoreThenTime, TimePlusFaults"));
    }

    #[test]
    fn old_documents_migrate_points() {
        let (scoring, cb) = load_at(
            r#"<Scoring Division="Standard" Level="Open" type="Faults100ThenTime" Clean="10" FaultsAllowed="5" WithFaults="5">Old note</Scoring>"#,
            ArbVersion::new(3, 0),
        );
        assert!(cb.is_empty(), "{}", cb.text());
        let scoring = scoring.unwrap();
        assert!(scoring.drop_fractions);
        assert_eq!(scoring.title_points.len(), 2);
        assert_eq!(scoring.note, "Old note");

        let (scoring, _) = load_at(
            r#"<Scoring Division="Standard" Level="Open" type="FaultsThenTime" machPts="y"><TitlePoints Points="10" Faults="0" LifeTime="y"/></Scoring>"#,
            ArbVersion::new(9, 0),
        );
        let scoring = scoring.unwrap();
        assert!(scoring.speed_pts);
        assert_eq!(scoring.place_info.place_value(2), Some(1.5));
        assert_eq!(scoring.lifetime_points.len(), 1);
    }

    #[test]
    fn save_then_load_is_equal() {
        let mut scoring = Scoring::new("Standard", "Open");
        scoring.valid_from = ArbDate::new(2020, 1, 1);
        scoring.speed_pts = true;
        scoring.place_info.add_place_info(1, 2.0, true);
        scoring.title_points.add_title_points(10.0, 0.0);
        scoring.lifetime_points.add_lifetime_points("", true, 0.0, 0.0);
        scoring.placements.add_place_info(1, 3.0, false);
        scoring.note = "n".to_string();
        let mut root = ElementNode::new("Event");
        assert!(scoring.save(&mut root));
        let (reloaded, cb) = load(&root.element(0).unwrap().save_xml());
        assert!(cb.is_empty(), "{}", cb.text());
        assert_eq!(reloaded.unwrap(), scoring);
    }

    #[test]
    fn find_event_honors_dates_and_wildcards() {
        let mut list = ScoringList::new();
        let mut old = Scoring::new("Standard", "*");
        old.valid_to = ArbDate::new(2009, 12, 31);
        list.push(old);
        let mut new = Scoring::new("Standard", "Open");
        new.valid_from = ArbDate::new(2010, 1, 1);
        new.style = ScoringStyle::TimePlusFaults;
        list.push(new);

        let found = list
            .find_event("Standard", "Open", &ArbDate::new(2011, 5, 1))
            .unwrap();
        assert_eq!(found.style, ScoringStyle::TimePlusFaults);
        assert!(list.verify_event("Standard", "Novice", &ArbDate::new(2005, 1, 1)));
        assert!(!list.verify_event("Standard", "Novice", &ArbDate::new(2011, 1, 1)));
        assert_eq!(list.find_all_events("Standard", "Open", &ArbDate::invalid(), false).len(), 2);
        assert!(list.find_all_events("Standard", "Open", &ArbDate::invalid(), true).is_empty());
    }
}
