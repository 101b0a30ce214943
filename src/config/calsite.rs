use crate::element::ElementNode;
use crate::error::LoadContext;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const TREE_CALSITE: &str = "CalSite";
const TREE_CALSITE_DESC: &str = "Desc";
const TREE_LOCCODE: &str = "LocCode";
const TREE_VENUECODE: &str = "VenueCode";
const ATTRIB_CALSITE_NAME: &str = "name";
const ATTRIB_CALSITE_SEARCH: &str = "search";
const ATTRIB_CALSITE_HELP: &str = "help";
const ATTRIB_LOCCODE_CODE: &str = "code";
const ATTRIB_LOCCODE_NAME: &str = "name";
const ATTRIB_VENUECODE_CODE: &str = "code";
const ATTRIB_VENUECODE_VENUE: &str = "venue";

/// An online calendar source with its location and venue code tables.
///
/// The search URL may contain `!L!` and `!V!` placeholders, replaced by
/// `+`-joined location and venue codes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalSite {
    pub name: String,
    pub desc: String,
    pub search_url: String,
    pub help_url: String,
    pub locations: BTreeMap<String, String>,
    pub venues: BTreeMap<String, String>,
}

impl CalSite {
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
        if tree.name() != TREE_CALSITE {
            return false;
        }
        let Some(name) = tree.attrib(ATTRIB_CALSITE_NAME) else {
            ctx.missing_attribute(TREE_CALSITE, ATTRIB_CALSITE_NAME);
            return false;
        };
        self.name = name.to_string();
        let Some(search) = tree.attrib(ATTRIB_CALSITE_SEARCH) else {
            ctx.missing_attribute(TREE_CALSITE, ATTRIB_CALSITE_SEARCH);
            return false;
        };
        self.search_url = search.to_string();
        tree.read_attrib(ATTRIB_CALSITE_HELP, &mut self.help_url);

        // Malformed code entries are skipped.
        for element in tree.elements() {
            match element.name() {
                TREE_CALSITE_DESC => self.desc = element.value().to_string(),
                TREE_LOCCODE => {
                    if let Some(code) = element.attrib(ATTRIB_LOCCODE_CODE).filter(|c| !c.is_empty()) {
                        let name = element.attrib(ATTRIB_LOCCODE_NAME).unwrap_or_default();
                        self.locations.insert(code.to_string(), name.to_string());
                    }
                }
                TREE_VENUECODE => {
                    if let Some(code) = element.attrib(ATTRIB_VENUECODE_CODE).filter(|c| !c.is_empty()) {
                        let venue = element.attrib(ATTRIB_VENUECODE_VENUE).unwrap_or_default();
                        self.venues.insert(code.to_string(), venue.to_string());
                    }
                }
                _ => {}
            }
        }
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let site = tree.add_element_node(TREE_CALSITE, None);
        site.add_attrib(ATTRIB_CALSITE_NAME, self.name.as_str());
        site.add_attrib(ATTRIB_CALSITE_SEARCH, self.search_url.as_str());
        if !self.help_url.is_empty() {
            site.add_attrib(ATTRIB_CALSITE_HELP, self.help_url.as_str());
        }
        if !self.desc.is_empty() {
            site.add_element_node(TREE_CALSITE_DESC, None)
                .set_value(self.desc.as_str());
        }
        for (code, name) in &self.locations {
            let loc = site.add_element_node(TREE_LOCCODE, None);
            loc.add_attrib(ATTRIB_LOCCODE_CODE, code.as_str());
            loc.add_attrib(ATTRIB_LOCCODE_NAME, name.as_str());
        }
        for (code, venue) in &self.venues {
            let node = site.add_element_node(TREE_VENUECODE, None);
            node.add_attrib(ATTRIB_VENUECODE_CODE, code.as_str());
            if !venue.is_empty() {
                node.add_attrib(ATTRIB_VENUECODE_VENUE, venue.as_str());
            }
        }
        true
    }

    pub fn formatted_url(&self, loc_codes: &[&str], venue_codes: &[&str]) -> String {
        self.search_url
            .replacen("!L!", &loc_codes.join("+"), 1)
            .replacen("!V!", &venue_codes.join("+"), 1)
    }

    pub fn has_location_code(&self, code: &str) -> bool {
        self.locations.contains_key(code)
    }

    pub fn add_location_code(&mut self, code: impl AsRef<str>, name: impl AsRef<str>) -> bool {
        let code = code.as_ref();
        if self.has_location_code(code) {
            return false;
        }
        self.locations.insert(code.to_string(), name.as_ref().to_string());
        true
    }

    pub fn remove_location_code(&mut self, code: &str) -> bool {
        self.locations.remove(code).is_some()
    }

    pub fn has_venue_code(&self, code: &str) -> bool {
        self.venues.contains_key(code)
    }

    pub fn add_venue_code(&mut self, code: impl AsRef<str>, venue: impl AsRef<str>) -> bool {
        let code = code.as_ref();
        if self.has_venue_code(code) {
            return false;
        }
        self.venues.insert(code.to_string(), venue.as_ref().to_string());
        true
    }

    pub fn remove_venue_code(&mut self, code: &str) -> bool {
        self.venues.remove(code).is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalSiteList {
    sites: Vec<CalSite>,
}

impl CalSiteList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sites.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, CalSite> {
        self.sites.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        let mut site = CalSite::default();
        if !site.load(tree, ctx) {
            return false;
        }
        self.sites.push(site);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.sites.iter().all(|s| s.save(tree))
    }

    pub fn sort(&mut self) {
        self.sites.sort_by(|a, b| a.name.cmp(&b.name));
    }

    pub fn find_site(&self, name: &str) -> Option<&CalSite> {
        self.sites.iter().find(|s| s.name == name)
    }

    pub fn find_site_mut(&mut self, name: &str) -> Option<&mut CalSite> {
        self.sites.iter_mut().find(|s| s.name == name)
    }

    pub fn add_site(&mut self, site: CalSite) -> bool {
        if site.name.is_empty() || self.find_site(&site.name).is_some() {
            return false;
        }
        self.sites.push(site);
        self.sort();
        true
    }

    pub fn delete_site(&mut self, name: &str) -> usize {
        match self.sites.iter().position(|s| s.name == name) {
            Some(index) => {
                self.sites.remove(index);
                1
            }
            None => 0,
        }
    }

    pub(crate) fn push(&mut self, site: CalSite) {
        self.sites.push(site);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CollectingErrorCallback, Localization};
    use crate::types::CURRENT_DOC_VERSION;

    const SITE: &str = r#"<CalSite name="Agility Events" search="http://example.com/?loc=!L!&amp;v=!V!" help="http://example.com/help">
        <Desc>Event listings</Desc>
        <LocCode code="CA" name="California"/>
        <LocCode code="" name="ignored"/>
        <VenueCode code="1" venue="AKC"/>
        <VenueCode code="2"/>
    </CalSite>"#;

    fn load(xml: &str) -> Option<CalSite> {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
        let mut site = CalSite::default();
        site.load(&ElementNode::load_xml_str(xml).unwrap(), &mut ctx)
            .then_some(site)
    }

    #[test]
    fn loads_codes_and_skips_blank_ones() {
        let site = load(SITE).unwrap();
        assert_eq!(site.desc, "Event listings");
        assert_eq!(site.locations.len(), 1);
        assert_eq!(site.venues.get("1").map(String::as_str), Some("AKC"));
        assert_eq!(site.venues.get("2").map(String::as_str), Some(""));
    }

    #[test]
    fn search_url_is_required() {
        assert!(load(r#"<CalSite name="x"/>"#).is_none());
    }

    #[test]
    fn formats_search_url() {
        let site = load(SITE).unwrap();
        assert_eq!(
            site.formatted_url(&["CA", "NV"], &["1"]),
            "http://example.com/?loc=CA+NV&v=1"
        );
    }

    #[test]
    fn save_then_load_is_equal() {
        let site = load(SITE).unwrap();
        let mut root = ElementNode::new("Configuration");
        assert!(site.save(&mut root));
        let reloaded = load(&root.element(0).unwrap().save_xml()).unwrap();
        assert_eq!(site, reloaded);
    }

    #[test]
    fn list_is_kept_sorted_and_unique() {
        let mut list = CalSiteList::new();
        assert!(list.add_site(CalSite::new("b")));
        assert!(list.add_site(CalSite::new("a")));
        assert!(!list.add_site(CalSite::new("a")));
        let names: Vec<_> = list.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(list.delete_site("a"), 1);
        assert_eq!(list.delete_site("a"), 0);
    }
}
