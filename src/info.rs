use crate::element::ElementNode;
use crate::error::LoadContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::debug;

pub const TREE_INFO: &str = "Info";
pub const TREE_CLUBINFO: &str = "ClubInfo";
pub const TREE_JUDGEINFO: &str = "JudgeInfo";
pub const TREE_LOCATIONINFO: &str = "LocationInfo";
const ATTRIB_INFO_NAME: &str = "Name";
const ATTRIB_INFO_VISIBLE: &str = "Visible";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoItem {
    pub name: String,
    pub comment: String,
    pub visible: bool,
}

impl Default for InfoItem {
    fn default() -> Self {
        Self {
            name: String::new(),
            comment: String::new(),
            visible: true,
        }
    }
}

impl InfoItem {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> &str {
        &self.name
    }

    pub fn search_strings(&self, strings: &mut BTreeSet<String>) -> usize {
        strings.insert(self.name.clone());
        if self.comment.is_empty() {
            return 1;
        }
        strings.insert(self.comment.clone());
        2
    }

    pub fn has_data(&self) -> bool {
        !self.comment.is_empty() || !self.visible
    }

    pub fn load(&mut self, tree: &ElementNode, item_name: &str, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != item_name {
            return false;
        }
        let Some(name) = tree.attrib(ATTRIB_INFO_NAME) else {
            ctx.missing_attribute(item_name, ATTRIB_INFO_NAME);
            return false;
        };
        self.name = name.to_string();
        if !ctx.read_bool(tree, ATTRIB_INFO_VISIBLE, &mut self.visible) {
            return false;
        }
        self.comment = tree.value().to_string();
        true
    }

    pub fn save(&self, tree: &mut ElementNode, item_name: &str) -> bool {
        let info = tree.add_element_node(item_name, None);
        info.add_attrib(ATTRIB_INFO_NAME, self.name.as_str());
        if !self.visible {
            info.add_attrib_bool(ATTRIB_INFO_VISIBLE, false);
        }
        if !self.comment.is_empty() {
            info.set_value(self.comment.as_str());
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoItemList {
    items: Vec<InfoItem>,
}

impl InfoItemList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, InfoItem> {
        self.items.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, item_name: &str, ctx: &mut LoadContext<'_>) -> bool {
        let mut item = InfoItem::default();
        if !item.load(tree, item_name, ctx) {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn save(&self, tree: &mut ElementNode, item_name: &str) -> bool {
        self.items.iter().all(|item| item.save(tree, item_name))
    }

    pub fn sort(&mut self) {
        self.items.sort_by_key(|item| item.name.to_lowercase());
    }

    /// Names in file order. With `visible_only`, a hidden item also removes
    /// a name collected earlier.
    pub fn all_items(&self, names: &mut BTreeSet<String>, visible_only: bool) -> usize {
        for item in &self.items {
            if !visible_only || item.visible {
                names.insert(item.name.clone());
            } else {
                names.remove(&item.name);
            }
        }
        names.len()
    }

    pub fn condense_content(&mut self, names_in_use: &BTreeSet<String>) {
        let before = self.items.len();
        self.items
            .retain(|item| item.has_data() || !names_in_use.contains(&item.name));
        debug!(removed = before - self.items.len(), "condensed info items");
    }

    pub fn find_item(&self, name: &str) -> Option<&InfoItem> {
        self.items.iter().find(|item| item.name == name)
    }

    pub fn find_item_mut(&mut self, name: &str) -> Option<&mut InfoItem> {
        self.items.iter_mut().find(|item| item.name == name)
    }

    pub fn add_item(&mut self, name: &str) -> bool {
        if name.is_empty() || self.find_item(name).is_some() {
            return false;
        }
        self.items.push(InfoItem::new(name));
        true
    }

    pub fn add_info_item(&mut self, item: InfoItem) -> bool {
        if self.find_item(&item.name).is_some() {
            return false;
        }
        self.items.push(item);
        true
    }

    pub fn delete_item(&mut self, item: &InfoItem) -> bool {
        match self.items.iter().position(|i| i == item) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    pub clubs: InfoItemList,
    pub judges: InfoItemList,
    pub locations: InfoItemList,
}

impl Info {
    pub fn is_empty(&self) -> bool {
        self.clubs.is_empty() && self.judges.is_empty() && self.locations.is_empty()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_INFO {
            return false;
        }
        for element in tree.elements() {
            let loaded = match element.name() {
                TREE_CLUBINFO => self.clubs.load(element, TREE_CLUBINFO, ctx),
                TREE_JUDGEINFO => self.judges.load(element, TREE_JUDGEINFO, ctx),
                TREE_LOCATIONINFO => self.locations.load(element, TREE_LOCATIONINFO, ctx),
                _ => true,
            };
            if !loaded {
                debug!(element = element.name(), "skipped info item");
            }
        }
        self.clubs.sort();
        self.judges.sort();
        self.locations.sort();
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let info = tree.add_element_node(TREE_INFO, None);
        self.clubs.save(info, TREE_CLUBINFO)
            && self.judges.save(info, TREE_JUDGEINFO)
            && self.locations.save(info, TREE_LOCATIONINFO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectingErrorCallback, Localization};
    use crate::types::CURRENT_DOC_VERSION;
    use pretty_assertions::assert_eq;

    const INFO: &str = r#"<Info>
        <ClubInfo Name="club2">Club 2 info</ClubInfo>
        <ClubInfo Name="Club1">Club 1 info</ClubInfo>
        <ClubInfo Name="Club3"/>
        <ClubInfo Name="club1" Visible="n"/>
        <JudgeInfo Name="Judge One">Judge 1 info</JudgeInfo>
        <JudgeInfo Visible="n"/>
        <LocationInfo Name="Sunnyvale"/>
    </Info>"#;

    fn load(xml: &str) -> (Info, CollectingErrorCallback) {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut info = Info::default();
        {
            let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
            assert!(info.load(&ElementNode::load_xml_str(xml).unwrap(), &mut ctx));
        }
        (info, cb)
    }

    #[test]
    fn load_sorts_by_name_ignoring_case() {
        let (info, cb) = load(INFO);
        assert_eq!(cb.messages().len(), 1);
        assert!(cb.text().contains("'Name'"));
        let clubs: Vec<_> = info.clubs.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(clubs, ["Club1", "club1", "club2", "Club3"]);
        assert_eq!(info.judges.len(), 1);
        assert_eq!(info.locations.len(), 1);
        assert!(!info.clubs.find_item("club1").unwrap().visible);
        assert!(info.clubs.find_item("CLUB1").is_none());
    }

    #[test]
    fn save_then_load_is_equal() {
        let (info, _) = load(INFO);
        let mut root = ElementNode::new("AgilityBook");
        assert!(info.save(&mut root));
        let saved = root.element(0).unwrap();
        assert_eq!(saved.element(0).unwrap().value(), "Club 1 info");
        assert_eq!(saved.element(0).unwrap().attrib("Visible"), None);
        assert_eq!(saved.element(1).unwrap().attrib("Visible"), Some("n"));
        let (reloaded, cb) = load(&saved.save_xml());
        assert!(cb.is_empty());
        assert_eq!(reloaded, info);
    }

    #[test]
    fn visible_only_hides_names() {
        let (info, _) = load(INFO);
        let mut names = BTreeSet::new();
        assert_eq!(info.clubs.all_items(&mut names, false), 4);
        names.clear();
        assert_eq!(info.clubs.all_items(&mut names, true), 3);
        assert!(!names.contains("club1"));
    }

    #[test]
    fn add_delete_and_condense() {
        let mut list = InfoItemList::new();
        assert!(list.add_item("Judge"));
        assert!(!list.add_item("Judge"));
        assert!(!list.add_item(""));
        assert!(list.add_item("Other"));
        list.find_item_mut("Other").unwrap().comment = "strict".into();

        let in_use: BTreeSet<String> = ["Judge".to_string(), "Other".to_string()].into();
        list.condense_content(&in_use);
        assert_eq!(list.len(), 1);

        let other = list.find_item("Other").unwrap().clone();
        let mut strings = BTreeSet::new();
        assert_eq!(other.search_strings(&mut strings), 2);
        assert!(list.delete_item(&other));
        assert!(!list.delete_item(&other));
        assert!(list.is_empty());
    }
}
