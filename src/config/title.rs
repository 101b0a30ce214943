use super::{reorder_by, Named};
use crate::element::ElementNode;
use crate::error::LoadContext;
use crate::types::ArbDate;
use serde::{Deserialize, Serialize};

pub const TREE_TITLES: &str = "Titles";
const ATTRIB_TITLES_NAME: &str = "Name";
const ATTRIB_TITLES_LONGNAME: &str = "LongName";
const ATTRIB_TITLES_MULTIPLE: &str = "Multiple";
const ATTRIB_TITLES_MULTIPLE_STYLE: &str = "Style";
const ATTRIB_TITLES_PREFIX: &str = "Prefix";
const ATTRIB_TITLES_VALIDFROM: &str = "ValidFrom";
const ATTRIB_TITLES_VALIDTO: &str = "ValidTo";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TitleStyle {
    #[default]
    Number,
    Roman,
}

impl TitleStyle {
    pub(crate) fn code(self) -> i16 {
        match self {
            Self::Number => 0,
            Self::Roman => 1,
        }
    }

    pub(crate) fn from_code(code: i16) -> Option<Self> {
        match code {
            0 => Some(Self::Number),
            1 => Some(Self::Roman),
            _ => None,
        }
    }

    pub fn instance_suffix(self, show_one: bool, instance: i16) -> String {
        if !show_one && instance <= 1 {
            return String::new();
        }
        match self {
            Self::Number => instance.to_string(),
            Self::Roman => format!("-{}", to_roman(instance)),
        }
    }
}

fn to_roman(value: i16) -> String {
    const DIGITS: [[&str; 4]; 9] = [
        ["M", "C", "X", "I"],
        ["MM", "CC", "XX", "II"],
        ["MMM", "CCC", "XXX", "III"],
        ["", "CD", "XL", "IV"],
        ["", "D", "L", "V"],
        ["", "DC", "LX", "VI"],
        ["", "DCC", "LXX", "VII"],
        ["", "DCCC", "LXXX", "VIII"],
        ["", "CM", "XC", "IX"],
    ];
    let mut value = i32::from(value.clamp(0, 3999));
    let mut out = String::new();
    for (index, power) in [1000, 100, 10, 1].into_iter().enumerate() {
        let digit = value / power;
        value -= digit * power;
        if digit > 0 {
            out.push_str(DIGITS[(digit - 1) as usize][index]);
        }
    }
    out
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Title {
    pub name: String,
    pub long_name: String,
    pub desc: String,
    pub prefix: bool,
    pub valid_from: ArbDate,
    pub valid_to: ArbDate,
    pub multiple: i16,
    pub style: TitleStyle,
}

impl Named for Title {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Title {
    pub fn new(name: impl AsRef<str>) -> Self {
        Self {
            name: name.as_ref().to_string(),
            ..Self::default()
        }
    }

    pub fn generic_name(&self) -> String {
        self.nice_name().to_string()
    }

    pub fn nice_name(&self) -> &str {
        if self.long_name.is_empty() {
            &self.name
        } else {
            &self.long_name
        }
    }

    pub fn is_valid_on(&self, date: &ArbDate) -> bool {
        if !date.is_valid() {
            return true;
        }
        let after_start = !self.valid_from.is_valid() || self.valid_from <= *date;
        let before_end = !self.valid_to.is_valid() || *date <= self.valid_to;
        after_start && before_end
    }

    /// Display name such as `[MX2] Master Excellent` or `Master Excellent [MX2]`.
    ///
    /// A negative `instance` renders the multiple marker `+` instead of a
    /// number for titles that can be earned more than once.
    pub fn complete_name(&self, instance: i16, show_one: bool, abbrev_first: bool) -> String {
        let suffix = if instance < 0 && self.multiple > 0 {
            "+".to_string()
        } else {
            self.style.instance_suffix(show_one, instance)
        };
        let abbrev = format!("{}{}", self.name, suffix);
        if self.long_name.is_empty() {
            abbrev
        } else if abbrev_first {
            format!("[{abbrev}] {}", self.long_name)
        } else {
            format!("{} [{abbrev}]", self.long_name)
        }
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_TITLES {
            return false;
        }
        let Some(name) = ctx.required(tree, ATTRIB_TITLES_NAME) else {
            return false;
        };
        self.name = name;
        tree.read_attrib(ATTRIB_TITLES_LONGNAME, &mut self.long_name);
        if !ctx.read_number(tree, ATTRIB_TITLES_MULTIPLE, &mut self.multiple) {
            return false;
        }
        // Unknown style codes fall back to numbers.
        if let Some(style) = tree
            .get_attrib_parsed::<i16>(ATTRIB_TITLES_MULTIPLE_STYLE)
            .found()
            .and_then(TitleStyle::from_code)
        {
            self.style = style;
        }
        if !ctx.read_bool(tree, ATTRIB_TITLES_PREFIX, &mut self.prefix)
            || !ctx.read_date(tree, ATTRIB_TITLES_VALIDFROM, &mut self.valid_from)
            || !ctx.read_date(tree, ATTRIB_TITLES_VALIDTO, &mut self.valid_to)
        {
            return false;
        }
        self.desc = tree.value().to_string();
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        let title = tree.add_element_node(TREE_TITLES, None);
        title.add_attrib(ATTRIB_TITLES_NAME, self.name.as_str());
        if self.multiple > 0 {
            title.add_attrib_int(ATTRIB_TITLES_MULTIPLE, i64::from(self.multiple));
        }
        if self.style != TitleStyle::Number {
            title.add_attrib_int(ATTRIB_TITLES_MULTIPLE_STYLE, i64::from(self.style.code()));
        }
        if self.prefix {
            title.add_attrib_bool(ATTRIB_TITLES_PREFIX, true);
        }
        if !self.long_name.is_empty() {
            title.add_attrib(ATTRIB_TITLES_LONGNAME, self.long_name.as_str());
        }
        title.add_attrib_date(ATTRIB_TITLES_VALIDFROM, &self.valid_from);
        title.add_attrib_date(ATTRIB_TITLES_VALIDTO, &self.valid_to);
        if !self.desc.is_empty() {
            title.set_value(self.desc.as_str());
        }
        true
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TitleList {
    titles: Vec<Title>,
}

impl TitleList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.titles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.titles.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Title> {
        self.titles.iter()
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>, check_dups: bool) -> bool {
        let mut title = Title::default();
        if !title.load(tree, ctx) || (check_dups && self.find_title(&title.name).is_some()) {
            return false;
        }
        self.titles.push(title);
        true
    }

    pub fn save(&self, tree: &mut ElementNode) -> bool {
        self.titles.iter().all(|t| t.save(tree))
    }

    pub fn reorder_by(&mut self, reference: &TitleList) {
        if self != reference {
            reorder_by(&mut self.titles, &reference.titles);
        }
    }

    pub fn find_title(&self, name: &str) -> Option<&Title> {
        self.titles.iter().find(|t| t.name == name)
    }

    pub fn find_title_mut(&mut self, name: &str) -> Option<&mut Title> {
        self.titles.iter_mut().find(|t| t.name == name)
    }

    pub fn find_title_complete_name(
        &self,
        name: &str,
        instance: i16,
        show_one: bool,
        abbrev_first: bool,
    ) -> Option<&Title> {
        self.titles
            .iter()
            .find(|t| t.complete_name(instance, show_one, abbrev_first) == name)
    }

    pub fn add_title(&mut self, title: Title) -> bool {
        if title.name.is_empty() || self.find_title(&title.name).is_some() {
            return false;
        }
        self.titles.push(title);
        true
    }

    pub fn delete_title(&mut self, name: &str) -> bool {
        match self.titles.iter().position(|t| t.name == name) {
            Some(index) => {
                self.titles.remove(index);
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

    fn load(xml: &str) -> (Option<Title>, CollectingErrorCallback) {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut title = Title::default();
        let ok = {
            let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
            title.load(&ElementNode::load_xml_str(xml).unwrap(), &mut ctx)
        };
        (ok.then_some(title), cb)
    }

    #[test]
    fn complete_name_places_abbreviation() {
        let mut title = Title::new("MX");
        title.long_name = "Master Excellent".to_string();
        title.multiple = 1;
        assert_eq!(title.complete_name(2, false, true), "[MX2] Master Excellent");
        assert_eq!(title.complete_name(1, false, false), "Master Excellent [MX]");
        assert_eq!(title.complete_name(1, true, false), "Master Excellent [MX1]");
        assert_eq!(title.complete_name(-1, false, true), "[MX+] Master Excellent");
    }

    #[test]
    fn roman_style_appends_numeral() {
        let mut title = Title::new("ADCH");
        title.multiple = 1;
        title.style = TitleStyle::Roman;
        assert_eq!(title.complete_name(4, false, true), "ADCH-IV");
        assert_eq!(title.complete_name(1949, false, true), "ADCH-MCMXLIX");
    }

    #[test]
    fn load_reads_all_attributes() {
        let (title, cb) = load(
            r#"<Titles Name="MACH" LongName="Master Agility Champion" Multiple="1" Style="1" Prefix="y" ValidFrom="2000-01-01">Champion</Titles>"#,
        );
        assert!(cb.is_empty());
        let title = title.unwrap();
        assert_eq!(title.multiple, 1);
        assert_eq!(title.style, TitleStyle::Roman);
        assert!(title.prefix);
        assert!(title.valid_from.is_valid());
        assert!(!title.valid_to.is_valid());
        assert_eq!(title.desc, "Champion");
    }

    #[test]
    fn bad_prefix_and_date_are_fatal() {
        let (title, cb) = load(r#"<Titles Name="X" Prefix="maybe"/>"#);
        assert!(title.is_none());
        assert!(cb.text().contains("'Prefix'"));
        let (title, cb) = load(r#"<Titles Name="X" ValidTo="someday"/>"#);
        assert!(title.is_none());
        assert!(cb.text().contains("Invalid date: someday"));
    }

    #[test]
    fn save_omits_defaults() {
        let mut root = ElementNode::new("Venue");
        Title::new("NA").save(&mut root);
        let node = root.element(0).unwrap();
        assert_eq!(node.attrib_count(), 1);
        assert_eq!(node.attrib("Name"), Some("NA"));
    }

    #[test]
    fn validity_window_is_open_ended() {
        let mut title = Title::new("NA");
        title.valid_to = ArbDate::new(2005, 12, 31);
        assert!(title.is_valid_on(&ArbDate::new(2005, 12, 31)));
        assert!(!title.is_valid_on(&ArbDate::new(2006, 1, 1)));
        assert!(title.is_valid_on(&ArbDate::invalid()));
    }

    #[test]
    fn list_load_can_reject_duplicates() {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
        let node = ElementNode::load_xml_str(r#"<Titles Name="NA"/>"#).unwrap();
        let mut list = TitleList::new();
        assert!(list.load(&node, &mut ctx, true));
        assert!(!list.load(&node, &mut ctx, true));
        assert!(list.load(&node, &mut ctx, false));
        assert_eq!(list.len(), 2);
    }
}
