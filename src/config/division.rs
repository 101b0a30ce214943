use super::scoring::WILDCARD;
use super::title::{TitleList, TREE_TITLES};
use super::{indents, reorder_by, Named};
use crate::element::ElementNode;
use crate::error::{LoadContext, Localization};
use crate::types::ArbVersion;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub const TREE_DIVISION: &str = "Division";
const TREE_LEVEL: &str = "Level";
const TREE_SUBLEVEL: &str = "SubLevel";
const ATTRIB_DIVISION_NAME: &str = "Name";
const ATTRIB_LEVEL_NAME: &str = "Name";
const ATTRIB_SUBLEVEL_NAME: &str = "Name";

const VERSION_VENUE_TITLES: ArbVersion = ArbVersion::new(12, 0);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLevel {
    pub name: String,
}

impl Named for SubLevel {
    fn name(&self) -> &str {
        &self.name
    }
}

impl SubLevel {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
        }
    }

    pub fn generic_name(&self) -> String {
        self.name.clone()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_SUBLEVEL {
            return false;
        }
        match ctx.required(tree, ATTRIB_SUBLEVEL_NAME) {
            Some(name) => {
                self.name = name;
                true
            }
            None => false,
        }
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        tree.add_element_node(TREE_SUBLEVEL, None)
            .add_attrib(ATTRIB_SUBLEVEL_NAME, self.name.as_str());
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubLevelList {
    sub_levels: Vec<SubLevel>,
}

impl SubLevelList {
    pub fn len(&self) -> usize {
        self.sub_levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sub_levels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, SubLevel> {
        self.sub_levels.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut sub_level = SubLevel::default();
        if !sub_level.load(tree, ctx) {
            return false;
        }
        self.sub_levels.push(sub_level);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.sub_levels.iter().all(|s| s.save(tree))
    }

    pub fn reorder_by(&mut self, reference: &SubLevelList) {
        if self != reference {
            reorder_by(&mut self.sub_levels, &reference.sub_levels);
        }
    }

    pub fn find_sub_level(&self, name: &str) -> Option<&SubLevel> {
        self.sub_levels.iter().find(|s| s.name == name)
    }

    pub fn find_sub_level_mut(&mut self, name: &str) -> Option<&mut SubLevel> {
        self.sub_levels.iter_mut().find(|s| s.name == name)
    }

    pub fn add_sub_level(&mut self, name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        if name.is_empty() || self.find_sub_level(name).is_some() {
            return false;
        }
        self.sub_levels.push(SubLevel::new(name));
        true
    }

    pub fn delete_sub_level(&mut self, name: &str) -> bool {
        match self.sub_levels.iter().position(|s| s.name == name) {
            Some(index) => {
                self.sub_levels.remove(index);
                true
            }
            None => false,
        }
    }
}

/// A level. Runs name one of its sublevels, or the level itself when it
/// has none.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub sub_levels: SubLevelList,
}

impl Named for Level {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Level {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        self.name.clone()
    }

    pub fn is_leaf(&self) -> bool {
        self.sub_levels.is_empty()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_LEVEL {
            return false;
        }
        let Some(name) = ctx.required(tree, ATTRIB_LEVEL_NAME) else {
            return false;
        };
        self.name = name;
        tree.elements()
            .iter()
            .filter(|e| e.name() == TREE_SUBLEVEL)
            .all(|e| self.sub_levels.load(e, ctx))
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let level = tree.add_element_node(TREE_LEVEL, None);
        level.add_attrib(ATTRIB_LEVEL_NAME, self.name.as_str());
        self.sub_levels.save(level)
    }

    pub fn update(&mut self, indent: usize, other: &Level, text: &Localization, info: &mut String) -> bool {
        if self.name != other.name {
            return false;
        }
        let (indent_name, indent_buffer) = indents(indent);
        let mut report = String::new();
        if self.sub_levels != other.sub_levels {
            let mut added = 0;
            let mut skipped = 0;
            for sub_level in other.sub_levels.iter() {
                if self.sub_levels.add_sub_level(&sub_level.name) {
                    added += 1;
                } else {
                    skipped += 1;
                }
            }
            self.sub_levels.reorder_by(&other.sub_levels);
            report.push_str(&indent_buffer);
            if added > 0 {
                report.push_str(&text.update_sublevels(added, 0, skipped));
            } else {
                report.push_str(&text.update_sublevels_reordered());
            }
            report.push('\n');
        }
        if report.is_empty() {
            return false;
        }
        info.push_str(&format!("{indent_name}{}\n{report}", self.name));
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelList {
    levels: Vec<Level>,
}

impl LevelList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.levels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Level> {
        self.levels.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut level = Level::default();
        if !level.load(tree, ctx) {
            return false;
        }
        self.levels.push(level);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.levels.iter().all(|l| l.save(tree))
    }

    pub fn reorder_by(&mut self, reference: &LevelList) {
        if self != reference {
            reorder_by(&mut self.levels, &reference.levels);
        }
    }

    pub fn verify_level(&self, name: &str, allow_wildcard: bool) -> bool {
        (allow_wildcard && name == WILDCARD) || self.find_level(name).is_some()
    }

    pub fn find_level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| l.name == name)
    }

    pub fn find_level_mut(&mut self, name: &str) -> Option<&mut Level> {
        self.levels.iter_mut().find(|l| l.name == name)
    }

    pub fn find_sub_level(&self, name: &str) -> Option<&Level> {
        self.levels.iter().find(|l| {
            if l.is_leaf() {
                l.name == name
            } else {
                l.sub_levels.find_sub_level(name).is_some()
            }
        })
    }

    pub fn add_level(&mut self, level: Level) -> bool {
        if level.name.is_empty() || self.find_sub_level(&level.name).is_some() {
            return false;
        }
        self.levels.push(level);
        true
    }

    pub fn delete_level(&mut self, name: &str) -> bool {
        match self.levels.iter().position(|l| l.name == name) {
            Some(index) => {
                self.levels.remove(index);
                true
            }
            None => false,
        }
    }

    /// Removes a sublevel from whichever level holds it. `Some(true)` means
    /// the parent became a leaf and had to be renamed (suffixed with `?`)
    /// to stay distinct from the other runnable names.
    pub fn delete_sub_level(&mut self, name: &str) -> Option<bool> {
        let index = self
            .levels
            .iter()
            .position(|l| l.sub_levels.find_sub_level(name).is_some())?;
        let mut renamed = false;
        if self.levels[index].sub_levels.len() == 1 {
            let mut new_name = self.levels[index].name.clone();
            while self.find_sub_level(&new_name).is_some() {
                new_name.push('?');
                renamed = true;
            }
            self.levels[index].name = new_name;
        }
        self.levels[index].sub_levels.delete_sub_level(name);
        Some(renamed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Division {
    pub name: String,
    pub levels: LevelList,
}

impl Named for Division {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Division {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        self.name.clone()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>, venue_titles: &mut TitleList) -> bool {
        if tree.name() != TREE_DIVISION {
            return false;
        }
        let Some(name) = ctx.required(tree, ATTRIB_DIVISION_NAME) else {
            return false;
        };
        self.name = name;
        for element in tree.elements() {
            match element.name() {
                TREE_LEVEL => {
                    if !self.levels.load(element, ctx) {
                        return false;
                    }
                }
                TREE_TITLES if ctx.version() < VERSION_VENUE_TITLES => {
                    if !venue_titles.load(element, ctx, true) {
                        debug!(division = %self.name, "skipped duplicate division title");
                    }
                }
                _ => {}
            }
        }
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let division = tree.add_element_node(TREE_DIVISION, None);
        division.add_attrib(ATTRIB_DIVISION_NAME, self.name.as_str());
        self.levels.save(division)
    }

    pub fn update(&mut self, indent: usize, other: &Division, text: &Localization, info: &mut String) -> bool {
        let (indent_name, indent_buffer) = indents(indent);
        let mut report = String::new();
        if self.levels != other.levels {
            let mut details = String::new();
            let (mut added, mut changed, mut skipped) = (0, 0, 0);
            for level in other.levels.iter() {
                match self.levels.find_level_mut(&level.name) {
                    Some(existing) if *existing == *level => skipped += 1,
                    Some(existing) => {
                        if existing.update(indent + 1, level, text, &mut details) {
                            changed += 1;
                        }
                    }
                    None => {
                        if self.levels.add_level(level.clone()) {
                            added += 1;
                            details.push_str(&format!("{indent_buffer}+{}\n", level.name));
                        }
                    }
                }
            }
            self.levels.reorder_by(&other.levels);
            report.push_str(&indent_buffer);
            if added > 0 || changed > 0 {
                report.push_str(&text.update_levels(added, changed, skipped));
                report.push('\n');
                report.push_str(&details);
            } else {
                report.push_str(&text.update_levels_reordered());
                report.push('\n');
            }
        }
        if report.is_empty() {
            return false;
        }
        info.push_str(&format!("{indent_name}{}\n{report}", self.name));
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DivisionList {
    divisions: Vec<Division>,
}

impl DivisionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.divisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.divisions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Division> {
        self.divisions.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>, venue_titles: &mut TitleList) -> bool {
        let mut division = Division::default();
        if !division.load(tree, ctx, venue_titles) {
            return false;
        }
        self.divisions.push(division);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.divisions.iter().all(|d| d.save(tree))
    }

    pub fn reorder_by(&mut self, reference: &DivisionList) {
        if self != reference {
            reorder_by(&mut self.divisions, &reference.divisions);
        }
    }

    /// Both names may be `*`. A wildcard division passes if any division
    /// has the level.
    pub fn verify_level(&self, division: &str, level: &str) -> bool {
        if division == WILDCARD {
            return self.divisions.iter().any(|d| d.levels.verify_level(level, true));
        }
        self.find_division(division)
            .is_some_and(|d| d.levels.verify_level(level, true))
    }

    pub fn find_division(&self, name: &str) -> Option<&Division> {
        self.divisions.iter().find(|d| d.name == name)
    }

    pub fn find_division_mut(&mut self, name: &str) -> Option<&mut Division> {
        self.divisions.iter_mut().find(|d| d.name == name)
    }

    pub fn add_division(&mut self, division: Division) -> bool {
        if division.name.is_empty() || self.find_division(&division.name).is_some() {
            return false;
        }
        self.divisions.push(division);
        true
    }

    pub fn delete_division(&mut self, name: &str) -> usize {
        match self.divisions.iter().position(|d| d.name == name) {
            Some(index) => {
                self.divisions.remove(index);
                1
            }
            None => 0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectingErrorCallback, Localization};
    use crate::types::CURRENT_DOC_VERSION;
    use pretty_assertions::assert_eq;

    fn standard() -> Division {
        let mut div = Division::new("Standard");
        let mut novice = Level::new("Novice");
        novice.sub_levels.add_sub_level("Novice A");
        novice.sub_levels.add_sub_level("Novice B");
        div.levels.add_level(novice);
        div.levels.add_level(Level::new("Open"));
        div
    }

    #[test]
    fn find_sub_level_resolves_parent_or_leaf() {
        let div = standard();
        assert_eq!(div.levels.find_sub_level("Novice B").unwrap().name, "Novice");
        assert_eq!(div.levels.find_sub_level("Open").unwrap().name, "Open");
        assert!(div.levels.find_sub_level("Novice").is_none());
        assert!(!div.levels.clone().add_level(Level::new("Novice A")));
    }

    #[test]
    fn deleting_last_sublevel_makes_a_leaf() {
        let mut div = standard();
        assert_eq!(div.levels.delete_sub_level("Novice A"), Some(false));
        assert_eq!(div.levels.delete_sub_level("Novice B"), Some(false));
        let novice = div.levels.find_level("Novice").unwrap();
        assert!(novice.is_leaf());
        assert!(div.levels.find_sub_level("Novice").is_some());
        assert_eq!(div.levels.delete_sub_level("Novice B"), None);
    }

    #[test]
    fn leaf_name_collision_appends_marker() {
        let mut div = Division::new("Standard");
        div.levels.add_level(Level::new("Open"));
        let mut parent = Level::new("Open");
        parent.sub_levels.add_sub_level("Open A");
        div.levels.levels.push(parent);
        assert_eq!(div.levels.delete_sub_level("Open A"), Some(true));
        assert!(div.levels.find_level("Open?").is_some());
    }

    #[test]
    fn verify_level_accepts_wildcards() {
        let mut list = DivisionList::new();
        list.add_division(standard());
        assert!(list.verify_level("Standard", "Open"));
        assert!(list.verify_level("Standard", "*"));
        assert!(list.verify_level("*", "Novice"));
        assert!(list.verify_level("*", "*"));
        assert!(!list.verify_level("Standard", "Novice A"));
        assert!(!list.verify_level("Preferred", "Open"));
    }

    #[test]
    fn load_moves_old_titles_to_the_venue() {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut titles = TitleList::new();
        let mut div = Division::default();
        let xml = r#"<Division Name="Standard"><Level Name="Open"><SubLevel Name="Open A"/></Level><Titles Name="NA"/></Division>"#;
        let ok = {
            let mut ctx = LoadContext::new(ArbVersion::new(11, 0), &text, &mut cb);
            div.load(&ElementNode::load_xml_str(xml).unwrap(), &mut ctx, &mut titles)
        };
        assert!(ok, "{}", cb.text());
        assert_eq!(titles.len(), 1);
        assert_eq!(div.levels.find_sub_level("Open A").unwrap().name, "Open");

        let mut titles = TitleList::new();
        let mut div = Division::default();
        let ok = {
            let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
            div.load(&ElementNode::load_xml_str(xml).unwrap(), &mut ctx, &mut titles)
        };
        assert!(ok);
        assert!(titles.is_empty());
    }

    #[test]
    fn update_reports_added_levels() {
        let mut current = Division::new("Standard");
        current.levels.add_level(Level::new("Open"));
        let reference = standard();
        let text = Localization::new();
        let mut info = String::new();
        assert!(current.update(2, &reference, &text, &mut info));
        assert_eq!(
            info,
            "   -Standard\n      Levels: 1 added, 0 updated, 1 identical\n      +Novice\n"
        );
        let names: Vec<_> = current.levels.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["Novice", "Open"]);
        let mut info = String::new();
        assert!(!current.update(2, &reference, &text, &mut info));
        assert!(info.is_empty());
    }
}
