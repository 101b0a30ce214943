use crate::config::TitleStyle;
use crate::element::{AttribLookup, ElementNode};
use crate::error::LoadContext;
use crate::types::{ArbDate, ArbVersion};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

pub const TREE_TITLE: &str = "Title";
const ATTRIB_TITLE_VENUE: &str = "Venue";
const ATTRIB_TITLE_NAME: &str = "Name";
const ATTRIB_TITLE_DATE: &str = "Date";
const ATTRIB_TITLE_HIDDEN: &str = "isHidden";
const ATTRIB_TITLE_INSTANCE: &str = "instance";
const ATTRIB_TITLE_INSTANCE_SHOW: &str = "show";
const ATTRIB_TITLE_STYLE: &str = "style";
const ATTRIB_TITLE_RECEIVED: &str = "isReceived";

const VERSION_UNDATED_TITLES: ArbVersion = ArbVersion::new(8, 5);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogTitle {
    pub venue: String,
    pub name: String,
    pub date: ArbDate,
    pub hidden: bool,
    pub instance: i16,
    pub show_instance_one: bool,
    pub style: TitleStyle,
    pub received: bool,
}

impl DogTitle {
    pub fn new(venue: &str, name: &str, date: ArbDate) -> Self {
        Self {
            venue: venue.to_string(),
            name: name.to_string(),
            date,
            hidden: !date.is_valid(),
            instance: 1,
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        format!(
            "{}{}",
            self.name,
            self.style.instance_suffix(self.show_instance_one, self.instance)
        )
    }

    pub fn search_strings(&self, strings: &mut BTreeSet<String>) -> usize {
        let mut count = 1;
        strings.insert(self.generic_name());
        if self.date.is_valid() {
            strings.insert(self.date.to_iso_string());
            count += 1;
        }
        count
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_TITLE {
            return false;
        }
        let Some(venue) = ctx.required(tree, ATTRIB_TITLE_VENUE) else {
            return false;
        };
        let Some(name) = ctx.required(tree, ATTRIB_TITLE_NAME) else {
            return false;
        };
        self.venue = venue;
        self.name = name;
        if !ctx.read_bool(tree, ATTRIB_TITLE_HIDDEN, &mut self.hidden) {
            return false;
        }
        match tree.get_attrib_date(ATTRIB_TITLE_DATE) {
            AttribLookup::Found(date) => self.date = date,
            AttribLookup::NotFound => {
                if ctx.version() < VERSION_UNDATED_TITLES {
                    ctx.missing_attribute(TREE_TITLE, ATTRIB_TITLE_DATE);
                    return false;
                }
                self.date = ArbDate::invalid();
                self.hidden = true;
            }
            AttribLookup::Invalid(raw) => {
                ctx.invalid_date(TREE_TITLE, ATTRIB_TITLE_DATE, &raw);
                return false;
            }
        }
        self.instance = 1;
        if !(ctx.read_bool(tree, ATTRIB_TITLE_INSTANCE_SHOW, &mut self.show_instance_one)
            && ctx.read_number(tree, ATTRIB_TITLE_INSTANCE, &mut self.instance))
        {
            return false;
        }
        if self.instance > 1 {
            self.show_instance_one = true;
        }
        let mut style = TitleStyle::Number.code();
        if !ctx.read_number(tree, ATTRIB_TITLE_STYLE, &mut style) {
            return false;
        }
        match TitleStyle::from_code(style) {
            Some(style) => self.style = style,
            None => {
                ctx.invalid_attribute(TREE_TITLE, ATTRIB_TITLE_STYLE, None);
                return false;
            }
        }
        ctx.read_bool(tree, ATTRIB_TITLE_RECEIVED, &mut self.received)
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let title = tree.add_element_node(TREE_TITLE, None);
        if self.date.is_valid() {
            title.add_attrib_date(ATTRIB_TITLE_DATE, &self.date);
            if self.hidden {
                title.add_attrib_bool(ATTRIB_TITLE_HIDDEN, true);
            }
        } else {
            title.add_attrib_bool(ATTRIB_TITLE_HIDDEN, true);
        }
        title.add_attrib(ATTRIB_TITLE_VENUE, self.venue.as_str());
        title.add_attrib(ATTRIB_TITLE_NAME, self.name.as_str());
        if self.instance == 1 && self.show_instance_one {
            title.add_attrib_bool(ATTRIB_TITLE_INSTANCE_SHOW, true);
        }
        if self.instance > 1 {
            title.add_attrib_int(ATTRIB_TITLE_INSTANCE, i64::from(self.instance));
        }
        if self.style != TitleStyle::Number {
            title.add_attrib_int(ATTRIB_TITLE_STYLE, i64::from(self.style.code()));
        }
        if self.received {
            title.add_attrib_bool(ATTRIB_TITLE_RECEIVED, true);
        }
        true
    }

    fn sort_key(&self, other: &Self) -> Ordering {
        self.date
            .cmp(&other.date)
            .then_with(|| self.venue.cmp(&other.venue))
            .then_with(|| self.name.cmp(&other.name))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DogTitleList {
    titles: Vec<DogTitle>,
}

impl DogTitleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DogTitle> {
        self.titles.iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, DogTitle> {
        self.titles.iter_mut()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut title = DogTitle::default();
        if !title.load(tree, ctx) {
            return false;
        }
        self.titles.push(title);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.titles.iter().all(|t| t.save(tree))
    }

    pub fn sort(&mut self) {
        self.titles.sort_by(DogTitle::sort_key);
    }

    pub fn find_title(&self, venue: &str, name: &str) -> Option<&DogTitle> {
        self.titles
            .iter()
            .filter(|t| t.venue == venue && t.name == name)
            .max_by_key(|t| t.instance)
    }

    pub fn find_max_instance(&self, venue: &str, name: &str) -> i16 {
        self.find_title(venue, name).map_or(0, |t| t.instance)
    }

    pub fn add_title(&mut self, title: DogTitle) -> bool {
        self.titles.push(title);
        true
    }

    pub fn delete_title(&mut self, title: &DogTitle) -> bool {
        match self.titles.iter().position(|t| t == title) {
            Some(index) => {
                self.titles.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn count_in_venue(&self, venue: &str) -> usize {
        self.titles.iter().filter(|t| t.venue == venue).count()
    }

    pub fn rename_venue(&mut self, old_venue: &str, new_venue: &str) -> usize {
        let mut count = 0;
        for title in self.titles.iter_mut().filter(|t| t.venue == old_venue) {
            title.venue = new_venue.to_string();
            count += 1;
        }
        count
    }

    pub fn delete_venue(&mut self, venue: &str) -> usize {
        let before = self.titles.len();
        self.titles.retain(|t| t.venue != venue);
        before - self.titles.len()
    }

    pub fn count_titles_in_use(&self, venue: &str, name: &str) -> usize {
        self.titles
            .iter()
            .filter(|t| t.venue == venue && t.name == name)
            .count()
    }

    pub fn rename_title(&mut self, venue: &str, old_name: &str, new_name: &str) -> usize {
        let mut count = 0;
        for title in self
            .titles
            .iter_mut()
            .filter(|t| t.venue == venue && t.name == old_name)
        {
            title.name = new_name.to_string();
            count += 1;
        }
        count
    }

    pub fn delete_titles(&mut self, venue: &str, name: &str) -> usize {
        let before = self.titles.len();
        self.titles.retain(|t| !(t.venue == venue && t.name == name));
        before - self.titles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectingErrorCallback, Localization};
    use crate::types::CURRENT_DOC_VERSION;
    use pretty_assertions::assert_eq;

    fn load_one(xml: &str, version: ArbVersion) -> (Option<DogTitle>, CollectingErrorCallback) {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut title = DogTitle::default();
        let ok = {
            let mut ctx = LoadContext::new(version, &text, &mut cb);
            title.load(&ElementNode::load_xml_str(xml).unwrap(), &mut ctx)
        };
        (ok.then_some(title), cb)
    }

    #[test]
    fn undated_title_is_hidden_in_new_documents() {
        let (title, cb) = load_one(r#"<Title Venue="AKC" Name="MX"/>"#, CURRENT_DOC_VERSION);
        let title = title.unwrap();
        assert!(cb.is_empty());
        assert!(title.hidden);
        assert!(!title.date.is_valid());
    }

    #[test]
    fn undated_title_is_an_error_in_old_documents() {
        let (title, cb) = load_one(r#"<Title Venue="AKC" Name="MX"/>"#, ArbVersion::new(8, 0));
        assert!(title.is_none());
        assert!(cb.text().contains("'Date'"));
    }

    #[test]
    fn higher_instance_forces_show_one() {
        let (title, _) = load_one(
            r#"<Title Venue="AKC" Name="MACH" Date="2023-01-02" instance="3" style="1"/>"#,
            CURRENT_DOC_VERSION,
        );
        let title = title.unwrap();
        assert!(title.show_instance_one);
        assert_eq!(title.style, TitleStyle::Roman);
    }

    #[test]
    fn save_round_trip() {
        let (title, _) = load_one(
            r#"<Title Venue="AKC" Name="MACH" Date="2023-01-02" instance="2" isReceived="y"/>"#,
            CURRENT_DOC_VERSION,
        );
        let title = title.unwrap();
        let mut root = ElementNode::new("Dog");
        title.save(&mut root);
        let (reloaded, _) = load_one(&root.element(0).unwrap().save_xml(), CURRENT_DOC_VERSION);
        assert_eq!(reloaded.unwrap(), title);
    }

    #[test]
    fn list_cascades() {
        let mut list = DogTitleList::new();
        list.add_title(DogTitle::new("AKC", "MX", ArbDate::new(2022, 1, 1)));
        let mut second = DogTitle::new("AKC", "MX", ArbDate::new(2021, 1, 1));
        second.instance = 2;
        list.add_title(second);
        list.add_title(DogTitle::new("USDAA", "AD", ArbDate::new(2020, 1, 1)));
        list.sort();
        assert_eq!(list.iter().next().unwrap().venue, "USDAA");
        assert_eq!(list.find_max_instance("AKC", "MX"), 2);
        assert_eq!(list.count_titles_in_use("AKC", "MX"), 2);
        assert_eq!(list.rename_title("AKC", "MX", "MXB"), 2);
        assert_eq!(list.rename_venue("USDAA", "UKI"), 1);
        assert_eq!(list.delete_titles("AKC", "MXB"), 2);
        assert_eq!(list.delete_venue("UKI"), 1);
        assert!(list.is_empty());
    }
}
