use crate::element::ElementNode;
use crate::error::LoadContext;
use crate::types::ArbVersion;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

pub const TREE_REGNUM: &str = "RegNum";
const ATTRIB_REGNUM_VENUE: &str = "Venue";
const ATTRIB_REGNUM_NUMBER: &str = "Number";
const ATTRIB_REGNUM_HEIGHT: &str = "Height";
const ATTRIB_REGNUM_RECEIVED: &str = "isReceived";

const VERSION_REGNUM_ATTRIB: ArbVersion = ArbVersion::new(9, 0);

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegNum {
    pub venue: String,
    pub number: String,
    pub height: String,
    pub received: bool,
    pub note: String,
}

impl RegNum {
    pub fn new(venue: &str, number: &str) -> Self {
        Self {
            venue: venue.to_string(),
            number: number.to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        self.number.clone()
    }

    pub fn search_strings(&self, strings: &mut BTreeSet<String>) -> usize {
        strings.insert(self.number.clone());
        if self.note.is_empty() {
            1
        } else {
            strings.insert(self.note.clone());
            2
        }
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_REGNUM {
            return false;
        }
        let Some(venue) = ctx.required(tree, ATTRIB_REGNUM_VENUE) else {
            return false;
        };
        self.venue = venue;
        let version = ctx.version();
        if version == ArbVersion::new(1, 0) {
            let Some(number) = ctx.required(tree, ATTRIB_REGNUM_NUMBER) else {
                return false;
            };
            self.number = number;
        } else if version < VERSION_REGNUM_ATTRIB {
            self.number = tree.value().to_string();
        } else {
            let Some(number) = ctx.required(tree, ATTRIB_REGNUM_NUMBER) else {
                return false;
            };
            self.number = number;
            self.note = tree.value().to_string();
        }
        tree.read_attrib(ATTRIB_REGNUM_HEIGHT, &mut self.height);
        ctx.read_bool(tree, ATTRIB_REGNUM_RECEIVED, &mut self.received)
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let regnum = tree.add_element_node(TREE_REGNUM, None);
        regnum.add_attrib(ATTRIB_REGNUM_VENUE, self.venue.as_str());
        regnum.add_attrib(ATTRIB_REGNUM_NUMBER, self.number.as_str());
        if !self.height.is_empty() {
            regnum.add_attrib(ATTRIB_REGNUM_HEIGHT, self.height.as_str());
        }
        if self.received {
            regnum.add_attrib_bool(ATTRIB_REGNUM_RECEIVED, true);
        }
        if !self.note.is_empty() {
            regnum.set_value(self.note.as_str());
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegNumList {
    numbers: Vec<RegNum>,
}

impl RegNumList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.numbers.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, RegNum> {
        self.numbers.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut number = RegNum::default();
        if !number.load(tree, ctx) {
            return false;
        }
        self.numbers.push(number);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.numbers.iter().all(|n| n.save(tree))
    }

    pub fn sort(&mut self) {
        self.numbers.sort_by(|a, b| a.venue.cmp(&b.venue));
    }

    pub fn find_regnum(&self, venue: &str) -> Option<&RegNum> {
        self.numbers.iter().find(|n| n.venue == venue)
    }

    pub fn add_regnum(&mut self, number: RegNum) -> bool {
        self.numbers.push(number);
        true
    }

    pub fn delete_regnum(&mut self, venue: &str, number: &str) -> bool {
        match self
            .numbers
            .iter()
            .position(|n| n.venue == venue && n.number == number)
        {
            Some(index) => {
                self.numbers.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn count_in_venue(&self, venue: &str) -> usize {
        self.numbers.iter().filter(|n| n.venue == venue).count()
    }

    pub fn rename_venue(&mut self, old_venue: &str, new_venue: &str) -> usize {
        let mut count = 0;
        for number in self.numbers.iter_mut().filter(|n| n.venue == old_venue) {
            number.venue = new_venue.to_string();
            count += 1;
        }
        count
    }

    pub fn delete_venue(&mut self, venue: &str) -> usize {
        let before = self.numbers.len();
        self.numbers.retain(|n| n.venue != venue);
        before - self.numbers.len()
    }
}
