use crate::element::ElementNode;
use crate::error::LoadContext;
use serde::{Deserialize, Serialize};

pub const TREE_OTHERPTS: &str = "OtherPts";
const ATTRIB_OTHERPTS_NAME: &str = "Name";
const ATTRIB_OTHERPTS_COUNT: &str = "Count";
const ATTRIB_OTHERPTS_DEFAULT: &str = "defValue";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OtherPointsTally {
    #[default]
    All,
    AllByEvent,
    Level,
    LevelByEvent,
}

impl OtherPointsTally {
    pub fn code(self) -> &'static str {
        match self {
            Self::All => "All",
            Self::AllByEvent => "AllByEvent",
            Self::Level => "Level",
            Self::LevelByEvent => "LevelByEvent",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "All" => Some(Self::All),
            "AllByEvent" => Some(Self::AllByEvent),
            "Level" => Some(Self::Level),
            "LevelByEvent" => Some(Self::LevelByEvent),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherPoints {
    pub name: String,
    pub tally: OtherPointsTally,
    pub desc: String,
    pub default_value: f64,
}

impl OtherPoints {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        self.name.clone()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_OTHERPTS {
            return false;
        }
        let Some(name) = ctx.required(tree, ATTRIB_OTHERPTS_NAME) else {
            return false;
        };
        self.name = name;
        if !ctx.read_number(tree, ATTRIB_OTHERPTS_DEFAULT, &mut self.default_value) {
            return false;
        }
        let Some(count) = tree.attrib(ATTRIB_OTHERPTS_COUNT) else {
            ctx.missing_attribute(TREE_OTHERPTS, ATTRIB_OTHERPTS_COUNT);
            return false;
        };
        match OtherPointsTally::from_code(count) {
            Some(tally) => self.tally = tally,
            None => {
                let hint = ctx
                    .text()
                    .valid_values("All, AllByEvent, Level, LevelByEvent");
                ctx.invalid_attribute(TREE_OTHERPTS, ATTRIB_OTHERPTS_COUNT, Some(&hint));
                return false;
            }
        }
        self.desc = tree.value().to_string();
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let node = tree.add_element_node(TREE_OTHERPTS, None);
        node.add_attrib(ATTRIB_OTHERPTS_NAME, self.name.as_str());
        node.add_attrib_double(ATTRIB_OTHERPTS_DEFAULT, self.default_value, 2);
        node.add_attrib(ATTRIB_OTHERPTS_COUNT, self.tally.code());
        if !self.desc.is_empty() {
            node.set_value(self.desc.as_str());
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OtherPointsList {
    items: Vec<OtherPoints>,
}

impl OtherPointsList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, OtherPoints> {
        self.items.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut other = OtherPoints::default();
        if !other.load(tree, ctx) {
            return false;
        }
        self.items.push(other);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.items.iter().all(|o| o.save(tree))
    }

    pub fn verify_other_points(&self, name: &str) -> bool {
        self.find_other_points(name).is_some()
    }

    pub fn find_other_points(&self, name: &str) -> Option<&OtherPoints> {
        self.items.iter().find(|o| o.name == name)
    }

    pub fn find_other_points_mut(&mut self, name: &str) -> Option<&mut OtherPoints> {
        self.items.iter_mut().find(|o| o.name == name)
    }

    pub fn add_other_points(&mut self, other: OtherPoints) -> bool {
        if other.name.is_empty() || self.verify_other_points(&other.name) {
            return false;
        }
        self.items.push(other);
        true
    }

    pub fn delete_other_points(&mut self, name: &str) -> bool {
        match self.items.iter().position(|o| o.name == name) {
            Some(index) => {
                self.items.remove(index);
                true
            }
            None => false,
        }
    }
}
