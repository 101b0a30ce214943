use crate::element::{AttribLookup, ElementNode};
use crate::error::LoadContext;
use crate::types::ArbDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TREE_TRAINING: &str = "Training";
const ATTRIB_TRAINING_DATE: &str = "Date";
const ATTRIB_TRAINING_NAME: &str = "Name";
const ATTRIB_TRAINING_SUBNAME: &str = "SubName";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Training {
    pub date: ArbDate,
    pub name: String,
    pub sub_name: String,
    pub note: String,
}

impl Training {
    pub fn new(date: ArbDate, name: impl Into<String>) -> Self {
        Self {
            date,
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        format!("{} {}", self.date.to_iso_string(), self.name)
    }

    pub fn search_strings(&self, strings: &mut BTreeSet<String>) -> usize {
        strings.insert(self.date.to_iso_string());
        let mut items = 1;
        for text in [&self.name, &self.sub_name, &self.note] {
            if !text.is_empty() {
                strings.insert(text.clone());
                items += 1;
            }
        }
        items
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_TRAINING {
            return false;
        }
        match tree.get_attrib_date(ATTRIB_TRAINING_DATE) {
            AttribLookup::Found(date) => self.date = date,
            AttribLookup::NotFound => {
                ctx.missing_attribute(TREE_TRAINING, ATTRIB_TRAINING_DATE);
                return false;
            }
            AttribLookup::Invalid(raw) => {
                ctx.invalid_date(TREE_TRAINING, ATTRIB_TRAINING_DATE, &raw);
                return false;
            }
        }
        tree.read_attrib(ATTRIB_TRAINING_NAME, &mut self.name);
        tree.read_attrib(ATTRIB_TRAINING_SUBNAME, &mut self.sub_name);
        self.note = tree.value().to_string();
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let training = tree.add_element_node(TREE_TRAINING, None);
        if !training.add_attrib_date(ATTRIB_TRAINING_DATE, &self.date) {
            return false;
        }
        if !self.name.is_empty() {
            training.add_attrib(ATTRIB_TRAINING_NAME, self.name.as_str());
        }
        if !self.sub_name.is_empty() {
            training.add_attrib(ATTRIB_TRAINING_SUBNAME, self.sub_name.as_str());
        }
        if !self.note.is_empty() {
            training.set_value(self.note.as_str());
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrainingList {
    entries: Vec<Training>,
}

impl TrainingList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Training> {
        self.entries.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut training = Training::default();
        if !training.load(tree, ctx) {
            return false;
        }
        self.entries.push(training);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.entries.iter().all(|t| t.save(tree))
    }

    pub fn sort(&mut self) {
        self.entries.sort_by(|a, b| a.date.cmp(&b.date));
    }

    pub fn all_names(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|t| !t.name.is_empty())
            .map(|t| t.name.clone())
            .collect()
    }

    pub fn all_sub_names(&self) -> BTreeSet<String> {
        self.entries
            .iter()
            .filter(|t| !t.sub_name.is_empty())
            .map(|t| t.sub_name.clone())
            .collect()
    }

    pub fn find_training(&self, training: &Training) -> bool {
        self.entries.contains(training)
    }

    pub fn add_training(&mut self, training: Training) -> bool {
        self.entries.push(training);
        true
    }

    pub fn delete_training(&mut self, training: &Training) -> bool {
        match self.entries.iter().position(|t| t == training) {
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
    use crate::types::CURRENT_DOC_VERSION;
    use pretty_assertions::assert_eq;

    fn load_list(elements: &[&str]) -> (TrainingList, CollectingErrorCallback) {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut list = TrainingList::new();
        {
            let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
            for xml in elements {
                list.load(&ElementNode::load_xml_str(xml).unwrap(), &mut ctx);
            }
        }
        list.sort();
        (list, cb)
    }

    #[test]
    fn load_requires_a_valid_date() {
        let (list, cb) = load_list(&[
            r#"<Training Date="2008-01-13" Name="Hollister, CA" SubName="PASA">Weaves</Training>"#,
            r#"<Training Name="Hollister, CA" SubName="PASA"/>"#,
            r#"<Training Date="someday"/>"#,
        ]);
        assert_eq!(list.len(), 1);
        assert_eq!(cb.messages().len(), 2);
        let entry = list.iter().next().unwrap();
        assert_eq!(entry.note, "Weaves");
        assert_eq!(entry.generic_name(), "2008-01-13 Hollister, CA");
    }

    #[test]
    fn sort_is_stable_by_date() {
        let (list, _) = load_list(&[
            r#"<Training Date="2006-03-04" Name="B"/>"#,
            r#"<Training Date="2005-01-01" Name="C"/>"#,
            r#"<Training Date="2006-03-04" Name="A"/>"#,
        ]);
        let names: Vec<_> = list.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, ["C", "B", "A"]);
        assert_eq!(list.all_names().len(), 3);
        assert!(list.all_sub_names().is_empty());
    }

    #[test]
    fn save_then_load_is_equal() {
        let (list, _) = load_list(&[
            r#"<Training Date="2006-03-04" Name="A Name" SubName="SubName1">notes</Training>"#,
        ]);
        let mut root = ElementNode::new("AgilityBook");
        assert!(list.save(&mut root));
        let saved = root.element(0).unwrap().save_xml();
        let (reloaded, cb) = load_list(&[saved.as_str()]);
        assert!(cb.is_empty());
        assert_eq!(reloaded, list);
    }

    #[test]
    fn add_find_delete() {
        let mut list = TrainingList::new();
        let entry = Training::new(ArbDate::new(2024, 5, 1), "Club");
        assert!(list.add_training(entry.clone()));
        assert!(list.find_training(&entry));
        let mut strings = BTreeSet::new();
        assert_eq!(entry.search_strings(&mut strings), 2);
        assert!(list.delete_training(&entry));
        assert!(!list.delete_training(&entry));
    }
}
