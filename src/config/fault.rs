use crate::element::ElementNode;
use crate::error::LoadContext;
use serde::{Deserialize, Serialize};

pub const TREE_FAULTTYPE: &str = "FaultType";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fault {
    pub name: String,
}

impl Fault {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
        }
    }

    pub fn generic_name(&self) -> String {
        self.name.clone()
    }

    pub fn load(&mut self, tree: &ElementNode, _ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_FAULTTYPE {
            return false;
        }
        self.name = tree.value().to_string();
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let node = tree.add_element_node(TREE_FAULTTYPE, None);
        node.set_value(self.name.as_str());
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultList {
    faults: Vec<Fault>,
}

impl FaultList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.faults.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faults.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Fault> {
        self.faults.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut fault = Fault::default();
        if !fault.load(tree, ctx) {
            return false;
        }
        self.faults.push(fault);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.faults.iter().all(|f| f.save(tree))
    }

    pub fn find_fault(&self, name: &str) -> Option<&Fault> {
        self.faults.iter().find(|f| f.name == name)
    }

    pub fn add_fault(&mut self, name: impl AsRef<str>) -> bool {
        let name = name.as_ref();
        if name.is_empty() {
            return false;
        }
        self.faults.push(Fault::new(name));
        true
    }

    pub fn delete_fault(&mut self, name: &str) -> bool {
        match self.faults.iter().position(|f| f.name == name) {
            Some(index) => {
                self.faults.remove(index);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_names_are_case_sensitive() {
        let mut faults = FaultList::new();
        assert!(faults.add_fault("Refusal"));
        assert!(!faults.add_fault(""));
        assert!(faults.find_fault("Refusal").is_some());
        assert!(faults.find_fault("refusal").is_none());
        assert!(faults.delete_fault("Refusal"));
        assert!(!faults.delete_fault("Refusal"));
    }

    #[test]
    fn name_is_saved_as_element_text() {
        let mut root = ElementNode::new("Configuration");
        Fault::new("Knocked bar").save(&mut root);
        assert_eq!(root.element(0).unwrap().value(), "Knocked bar");
        assert_eq!(root.element(0).unwrap().attrib_count(), 0);
    }
}
