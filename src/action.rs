//! Configuration actions: the renames and deletes a reference
//! configuration carries so that existing books can follow it.

use crate::config::Config;
use crate::dog::DogList;
use crate::element::{AttribLookup, ElementNode};
use crate::error::{LoadContext, Localization};
use crate::types::VERSION_ACTION_CONFIG;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

pub const TREE_ACTION: &str = "Action";
const ATTRIB_ACTION_VERB: &str = "Verb";
const ATTRIB_ACTION_CONFIG: &str = "Config";
const ATTRIB_ACTION_VENUE: &str = "Venue";
const ATTRIB_ACTION_DIVISION: &str = "Div";
const ATTRIB_ACTION_LEVEL: &str = "Level";
const ATTRIB_ACTION_OLDNAME: &str = "OldName";
const ATTRIB_ACTION_NEWNAME: &str = "NewName";

const VERB_DELETE_CALPLUGIN: &str = "DeleteCalPlugin";
const VERB_RENAME_OTHERPOINTS: &str = "RenameOtherPoints";
const VERB_DELETE_OTHERPOINTS: &str = "DeleteOtherPoints";
const VERB_RENAME_VENUE: &str = "RenameVenue";
const VERB_DELETE_VENUE: &str = "DeleteVenue";
const VERB_RENAME_MULTIQ: &str = "RenameMultiQ";
const VERB_DELETE_MULTIQ: &str = "DeleteMultiQ";
const VERB_RENAME_DIV: &str = "RenameDivision";
const VERB_DELETE_DIV: &str = "DeleteDivision";
const VERB_RENAME_LEVEL: &str = "RenameLevel";
const VERB_DELETE_LEVEL: &str = "DeleteLevel";
const VERB_RENAME_TITLE: &str = "RenameTitle";
const VERB_DELETE_TITLE: &str = "DeleteTitle";
const VERB_RENAME_EVENT: &str = "RenameEvent";
const VERB_DELETE_EVENT: &str = "DeleteEvent";
const VERB_RENAME_LIFETIME_NAME: &str = "RenameLifetimeName";
const VERB_DELETE_LIFETIME_NAME: &str = "DeleteLifetimeName";

const VERBS: [&str; 17] = [
    VERB_DELETE_CALPLUGIN,
    VERB_RENAME_OTHERPOINTS,
    VERB_DELETE_OTHERPOINTS,
    VERB_RENAME_VENUE,
    VERB_DELETE_VENUE,
    VERB_RENAME_MULTIQ,
    VERB_DELETE_MULTIQ,
    VERB_RENAME_DIV,
    VERB_DELETE_DIV,
    VERB_RENAME_LEVEL,
    VERB_DELETE_LEVEL,
    VERB_RENAME_TITLE,
    VERB_DELETE_TITLE,
    VERB_RENAME_EVENT,
    VERB_DELETE_EVENT,
    VERB_RENAME_LIFETIME_NAME,
    VERB_DELETE_LIFETIME_NAME,
];

/// Gate for destructive actions.
///
/// `pre_delete` is called with a description of what a delete will remove
/// from the dogs; `can_continue` is asked right after and a `false` skips
/// that action. `post_delete` reports runs removed after an update.
pub trait ConfirmationCallback {
    fn pre_delete(&mut self, msg: &str);
    fn post_delete(&mut self, msg: &str);
    fn can_continue(&self) -> bool;
}

/// Level actions with a non-empty `level` act on a sublevel of that level.
/// A `DeleteTitle` with a `new_name` moves earned titles to the new name
/// instead of deleting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigAction {
    DeleteCalPlugin { name: String },
    RenameOtherPoints { old_name: String, new_name: String },
    DeleteOtherPoints { name: String },
    RenameVenue { old_name: String, new_name: String },
    DeleteVenue { name: String },
    RenameMultiQ { venue: String, old_name: String, new_name: String },
    DeleteMultiQ { venue: String, name: String },
    RenameDivision { venue: String, old_name: String, new_name: String },
    DeleteDivision { venue: String, name: String },
    RenameLevel { venue: String, division: String, level: String, old_name: String, new_name: String },
    DeleteLevel { venue: String, division: String, level: String, name: String },
    RenameTitle { venue: String, old_name: String, new_name: String },
    DeleteTitle { venue: String, old_name: String, new_name: String },
    RenameEvent { venue: String, old_name: String, new_name: String },
    DeleteEvent { venue: String, name: String },
    RenameLifetimeName { venue: String, old_name: String, new_name: String },
    DeleteLifetimeName { venue: String, name: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionOutcome {
    Applied,
    NotApplicable,
    Declined,
}

impl ActionOutcome {
    pub fn is_applied(self) -> bool {
        self == Self::Applied
    }
}

fn confirm(
    affected: usize,
    has_dogs: bool,
    msg: impl FnOnce() -> String,
    info: &mut String,
    callback: &mut dyn ConfirmationCallback,
) -> bool {
    if affected == 0 || !has_dogs {
        return true;
    }
    let msg = msg();
    callback.pre_delete(&msg);
    if !callback.can_continue() {
        debug!(%msg, "delete declined");
        return false;
    }
    info.push_str(&msg);
    info.push('\n');
    true
}

fn report(info: &mut String, line: String) {
    info.push_str(&line);
    info.push('\n');
}

impl ConfigAction {
    pub fn target(&self) -> String {
        match self {
            Self::DeleteCalPlugin { name } | Self::DeleteOtherPoints { name } | Self::DeleteVenue { name } => {
                format!("'{name}'")
            }
            Self::RenameOtherPoints { old_name, .. } | Self::RenameVenue { old_name, .. } => {
                format!("'{old_name}'")
            }
            Self::RenameMultiQ { venue, old_name, .. }
            | Self::RenameDivision { venue, old_name, .. }
            | Self::RenameTitle { venue, old_name, .. }
            | Self::DeleteTitle { venue, old_name, .. }
            | Self::RenameEvent { venue, old_name, .. }
            | Self::RenameLifetimeName { venue, old_name, .. } => format!("'{old_name}' in venue '{venue}'"),
            Self::DeleteMultiQ { venue, name }
            | Self::DeleteDivision { venue, name }
            | Self::DeleteEvent { venue, name }
            | Self::DeleteLifetimeName { venue, name } => format!("'{name}' in venue '{venue}'"),
            Self::RenameLevel { venue, division, old_name: name, .. }
            | Self::DeleteLevel { venue, division, name, .. } => {
                format!("'{name}' in division '{division}' of venue '{venue}'")
            }
        }
    }

    pub fn verb(&self) -> &'static str {
        match self {
            Self::DeleteCalPlugin { .. } => VERB_DELETE_CALPLUGIN,
            Self::RenameOtherPoints { .. } => VERB_RENAME_OTHERPOINTS,
            Self::DeleteOtherPoints { .. } => VERB_DELETE_OTHERPOINTS,
            Self::RenameVenue { .. } => VERB_RENAME_VENUE,
            Self::DeleteVenue { .. } => VERB_DELETE_VENUE,
            Self::RenameMultiQ { .. } => VERB_RENAME_MULTIQ,
            Self::DeleteMultiQ { .. } => VERB_DELETE_MULTIQ,
            Self::RenameDivision { .. } => VERB_RENAME_DIV,
            Self::DeleteDivision { .. } => VERB_DELETE_DIV,
            Self::RenameLevel { .. } => VERB_RENAME_LEVEL,
            Self::DeleteLevel { .. } => VERB_DELETE_LEVEL,
            Self::RenameTitle { .. } => VERB_RENAME_TITLE,
            Self::DeleteTitle { .. } => VERB_DELETE_TITLE,
            Self::RenameEvent { .. } => VERB_RENAME_EVENT,
            Self::DeleteEvent { .. } => VERB_DELETE_EVENT,
            Self::RenameLifetimeName { .. } => VERB_RENAME_LIFETIME_NAME,
            Self::DeleteLifetimeName { .. } => VERB_DELETE_LIFETIME_NAME,
        }
    }

    pub fn apply(
        &self,
        config: &mut Config,
        mut dogs: Option<&mut DogList>,
        text: &Localization,
        info: &mut String,
        callback: &mut dyn ConfirmationCallback,
    ) -> ActionOutcome {
        use ActionOutcome::{Applied, Declined, NotApplicable};
        let has_dogs = dogs.is_some();
        match self {
            Self::DeleteCalPlugin { name } => {
                if config.cal_sites.delete_site(name) == 0 {
                    return NotApplicable;
                }
                report(info, text.action_delete_cal_plugin(name));
                Applied
            }

            Self::RenameOtherPoints { old_name, new_name } => {
                if config.other_points.find_other_points(old_name).is_none() {
                    return NotApplicable;
                }
                let mut changes = 0;
                if let Some(dogs) = dogs.as_deref_mut() {
                    changes = dogs.count_other_points(old_name);
                    if changes > 0 {
                        dogs.rename_other_points(old_name, new_name);
                    }
                }
                report(info, text.action_rename_other_points(old_name, new_name, changes));
                if config.other_points.find_other_points(new_name).is_some() {
                    config.other_points.delete_other_points(old_name);
                } else if let Some(other) = config.other_points.find_other_points_mut(old_name) {
                    other.name = new_name.clone();
                }
                Applied
            }

            Self::DeleteOtherPoints { name } => {
                if config.other_points.find_other_points(name).is_none() {
                    return NotApplicable;
                }
                let affected = dogs.as_deref().map_or(0, |d| d.count_other_points(name));
                if !confirm(
                    affected,
                    has_dogs,
                    || text.action_pre_delete_other_points(name, affected),
                    info,
                    callback,
                ) {
                    return Declined;
                }
                if let Some(dogs) = dogs.as_deref_mut() {
                    dogs.delete_other_points(name);
                }
                report(info, text.action_delete_other_points(name));
                config.other_points.delete_other_points(name);
                Applied
            }

            Self::RenameVenue { old_name, new_name } => {
                if config.venues.find_venue(old_name).is_none() {
                    return NotApplicable;
                }
                let mut changes = 0;
                if let Some(dogs) = dogs.as_deref_mut() {
                    changes = dogs.count_venue_refs(old_name);
                    if changes > 0 {
                        dogs.rename_venue(old_name, new_name);
                    }
                }
                report(info, text.action_rename_venue(old_name, new_name, changes));
                if config.venues.find_venue(new_name).is_some() {
                    config.venues.delete_venue(old_name);
                } else if let Some(venue) = config.venues.find_venue_mut(old_name) {
                    venue.name = new_name.clone();
                    config.venues.sort();
                }
                Applied
            }

            Self::DeleteVenue { name } => {
                if config.venues.find_venue(name).is_none() {
                    return NotApplicable;
                }
                let affected = dogs.as_deref().map_or(0, |d| d.count_venue_refs(name));
                if !confirm(
                    affected,
                    has_dogs,
                    || text.action_pre_delete_venue(name, affected),
                    info,
                    callback,
                ) {
                    return Declined;
                }
                if let Some(dogs) = dogs.as_deref_mut() {
                    dogs.delete_venue(name);
                }
                report(info, text.action_delete_venue(name));
                config.venues.delete_venue(name);
                Applied
            }

            Self::RenameMultiQ { venue, old_name, new_name } => {
                let Some(config_venue) = config.venues.find_venue_mut(venue) else {
                    return NotApplicable;
                };
                if config_venue.multiqs.find_multiq(old_name, false).is_none() {
                    return NotApplicable;
                }
                let mut changes = 0;
                if let Some(dogs) = dogs.as_deref_mut() {
                    changes = dogs.count_multiq(venue, old_name);
                    if changes > 0 {
                        dogs.rename_multiq(venue, old_name, new_name);
                    }
                }
                report(info, text.action_rename_multiq(venue, old_name, new_name, changes));
                if config_venue.multiqs.find_multiq(new_name, false).is_some() {
                    config_venue.multiqs.delete_multiq_by_name(old_name);
                } else if let Some(multiq) = config_venue.multiqs.find_multiq_mut(old_name) {
                    multiq.name = new_name.clone();
                }
                Applied
            }

            Self::DeleteMultiQ { venue, name } => {
                let exists = config
                    .venues
                    .find_venue(venue)
                    .is_some_and(|v| v.multiqs.find_multiq(name, false).is_some());
                if !exists {
                    return NotApplicable;
                }
                let affected = dogs.as_deref().map_or(0, |d| d.count_multiq(venue, name));
                if !confirm(
                    affected,
                    has_dogs,
                    || text.action_pre_delete_multiq(venue, name, affected),
                    info,
                    callback,
                ) {
                    return Declined;
                }
                report(info, text.action_delete_multiq(venue, name));
                if let Some(config_venue) = config.venues.find_venue_mut(venue) {
                    config_venue.multiqs.delete_multiq_by_name(name);
                }
                // Dog points naming it go in the post-update multi-Q cleanup.
                Applied
            }

            Self::RenameDivision { venue, old_name, new_name } => {
                let Some(config_venue) = config.venues.find_venue_mut(venue) else {
                    return NotApplicable;
                };
                if config_venue.divisions.find_division(old_name).is_none() {
                    return NotApplicable;
                }
                let mut changes = 0;
                if let Some(dogs) = dogs.as_deref_mut() {
                    changes = dogs.count_runs_in_division(venue, old_name);
                    if changes > 0 {
                        dogs.rename_division(venue, old_name, new_name);
                    }
                }
                report(info, text.action_rename_division(venue, old_name, new_name, changes));
                if config_venue.divisions.find_division(new_name).is_some() {
                    config_venue.divisions.delete_division(old_name);
                    config_venue.events.delete_division(old_name);
                    config_venue.multiqs.delete_division(old_name);
                } else if let Some(division) = config_venue.divisions.find_division_mut(old_name) {
                    division.name = new_name.clone();
                    config_venue.events.rename_division(old_name, new_name);
                    config_venue.multiqs.rename_division(old_name, new_name);
                }
                Applied
            }

            Self::DeleteDivision { venue, name } => {
                let exists = config
                    .venues
                    .find_venue(venue)
                    .is_some_and(|v| v.divisions.find_division(name).is_some());
                if !exists {
                    return NotApplicable;
                }
                let affected = dogs.as_deref().map_or(0, |d| {
                    d.count_runs_in_division(venue, name) + d.count_existing_in_division(venue, name)
                });
                if !confirm(
                    affected,
                    has_dogs,
                    || text.action_pre_delete_division(venue, name, affected),
                    info,
                    callback,
                ) {
                    return Declined;
                }
                if let Some(dogs) = dogs.as_deref_mut() {
                    dogs.delete_division(config, venue, name);
                }
                report(info, text.action_delete_division(venue, name));
                if let Some(config_venue) = config.venues.find_venue_mut(venue) {
                    if config_venue.divisions.delete_division(name) > 0 {
                        config_venue.events.delete_division(name);
                        config_venue.multiqs.delete_division(name);
                    }
                }
                Applied
            }

            Self::RenameLevel { venue, division, level, old_name, new_name } => {
                let Some(config_venue) = config.venues.find_venue_mut(venue) else {
                    return NotApplicable;
                };
                let Some(config_div) = config_venue.divisions.find_division_mut(division) else {
                    return NotApplicable;
                };
                let is_sub_level = !level.is_empty();
                let leaf = if is_sub_level {
                    match config_div.levels.find_level(level) {
                        Some(parent) if parent.sub_levels.find_sub_level(old_name).is_some() => true,
                        _ => return NotApplicable,
                    }
                } else {
                    match config_div.levels.find_level(old_name) {
                        Some(found) => found.is_leaf(),
                        None => return NotApplicable,
                    }
                };
                let mut changes = 0;
                if leaf {
                    if let Some(dogs) = dogs.as_deref_mut() {
                        changes = dogs.count_levels_in_use(venue, division, old_name);
                        dogs.rename_level(venue, division, old_name, new_name);
                    }
                }
                report(info, text.action_rename_level(venue, old_name, new_name, changes));
                if !is_sub_level {
                    config_venue.events.rename_level(division, old_name, new_name);
                }
                if leaf {
                    config_venue.multiqs.rename_level(division, old_name, new_name);
                }
                if is_sub_level {
                    let Some(parent) = config_div.levels.find_level_mut(level) else {
                        return Applied;
                    };
                    if parent.sub_levels.find_sub_level(new_name).is_some() {
                        parent.sub_levels.delete_sub_level(old_name);
                    } else if let Some(sub) = parent.sub_levels.find_sub_level_mut(old_name) {
                        sub.name = new_name.clone();
                    }
                } else if config_div.levels.find_level(new_name).is_some() {
                    config_div.levels.delete_level(old_name);
                    config_venue.events.delete_level(division, old_name);
                } else if let Some(found) = config_div.levels.find_level_mut(old_name) {
                    found.name = new_name.clone();
                }
                Applied
            }

            Self::DeleteLevel { venue, division, level, name } => {
                let Some(config_div) = config
                    .venues
                    .find_venue(venue)
                    .and_then(|v| v.divisions.find_division(division))
                else {
                    return NotApplicable;
                };
                let run_levels: Vec<String> = if level.is_empty() {
                    match config_div.levels.find_level(name) {
                        Some(found) if found.is_leaf() => vec![name.clone()],
                        Some(found) => found.sub_levels.iter().map(|s| s.name.clone()).collect(),
                        None => return NotApplicable,
                    }
                } else {
                    match config_div.levels.find_level(level) {
                        Some(parent) if parent.sub_levels.find_sub_level(name).is_some() => {
                            vec![name.clone()]
                        }
                        _ => return NotApplicable,
                    }
                };
                let affected = dogs.as_deref().map_or(0, |d| {
                    run_levels
                        .iter()
                        .map(|l| d.count_levels_in_use(venue, division, l))
                        .sum()
                });
                if !confirm(
                    affected,
                    has_dogs,
                    || text.action_pre_delete_level(venue, name, affected),
                    info,
                    callback,
                ) {
                    return Declined;
                }
                if affected > 0 {
                    if let Some(dogs) = dogs.as_deref_mut() {
                        for run_level in &run_levels {
                            dogs.delete_level(venue, division, run_level);
                        }
                    }
                }
                report(info, text.action_delete_level(venue, name));
                let Some(config_venue) = config.venues.find_venue_mut(venue) else {
                    return Applied;
                };
                let Some(config_div) = config_venue.divisions.find_division_mut(division) else {
                    return Applied;
                };
                if level.is_empty() {
                    if config_div.levels.delete_level(name) {
                        config_venue.events.delete_level(division, name);
                        for run_level in &run_levels {
                            config_venue.multiqs.delete_level(run_level);
                        }
                    }
                } else if config_div.levels.delete_sub_level(name).is_some() {
                    config_venue.multiqs.delete_level(name);
                }
                Applied
            }

            Self::RenameTitle { venue, old_name, new_name } => {
                let Some(config_venue) = config.venues.find_venue_mut(venue) else {
                    return NotApplicable;
                };
                if config_venue.titles.find_title(old_name).is_none() {
                    return NotApplicable;
                }
                let mut changes = 0;
                if let Some(dogs) = dogs.as_deref_mut() {
                    changes = dogs.count_titles_in_use(venue, old_name);
                    if changes > 0 {
                        dogs.rename_title(venue, old_name, new_name);
                    }
                }
                report(info, text.action_rename_title(venue, old_name, new_name, changes));
                if config_venue.titles.find_title(new_name).is_some() {
                    config_venue.titles.delete_title(old_name);
                } else if let Some(title) = config_venue.titles.find_title_mut(old_name) {
                    title.name = new_name.clone();
                }
                Applied
            }

            Self::DeleteTitle { venue, old_name, new_name } => {
                let exists = config
                    .venues
                    .find_venue(venue)
                    .is_some_and(|v| v.titles.find_title(old_name).is_some());
                if !exists {
                    return NotApplicable;
                }
                let affected = dogs.as_deref().map_or(0, |d| d.count_titles_in_use(venue, old_name));
                if affected > 0 {
                    if let Some(dogs) = dogs.as_deref_mut() {
                        if new_name.is_empty() {
                            if !confirm(
                                affected,
                                true,
                                || text.action_pre_delete_title(venue, old_name, affected),
                                info,
                                callback,
                            ) {
                                return Declined;
                            }
                            dogs.delete_title(venue, old_name);
                        } else {
                            report(info, text.action_rename_title(venue, old_name, new_name, affected));
                            dogs.rename_title(venue, old_name, new_name);
                        }
                    }
                }
                report(info, text.action_delete_title(venue, old_name));
                if let Some(config_venue) = config.venues.find_venue_mut(venue) {
                    config_venue.titles.delete_title(old_name);
                }
                Applied
            }

            Self::RenameEvent { venue, old_name, new_name } => {
                let Some(config_venue) = config.venues.find_venue_mut(venue) else {
                    return NotApplicable;
                };
                if config_venue.events.find_event(old_name).is_none() {
                    return NotApplicable;
                }
                let mut changes = 0;
                if let Some(dogs) = dogs.as_deref_mut() {
                    changes = dogs.count_events_in_use(venue, old_name);
                    if changes > 0 {
                        dogs.rename_event(venue, old_name, new_name);
                    }
                }
                report(info, text.action_rename_event(venue, old_name, new_name, changes));
                if config_venue.events.find_event(new_name).is_some() {
                    config_venue.events.delete_event(old_name);
                } else if let Some(event) = config_venue.events.find_event_mut(old_name) {
                    event.name = new_name.clone();
                }
                config_venue.multiqs.rename_event(old_name, new_name);
                Applied
            }

            Self::DeleteEvent { venue, name } => {
                let exists = config
                    .venues
                    .find_venue(venue)
                    .is_some_and(|v| v.events.find_event(name).is_some());
                if !exists {
                    return NotApplicable;
                }
                let affected = dogs.as_deref().map_or(0, |d| d.count_events_in_use(venue, name));
                if !confirm(
                    affected,
                    has_dogs,
                    || text.action_pre_delete_event(venue, name, affected),
                    info,
                    callback,
                ) {
                    return Declined;
                }
                if affected > 0 {
                    if let Some(dogs) = dogs.as_deref_mut() {
                        dogs.delete_event(venue, name);
                    }
                }
                report(info, text.action_delete_event(venue, name));
                if let Some(config_venue) = config.venues.find_venue_mut(venue) {
                    config_venue.multiqs.delete_event(name);
                    config_venue.events.delete_event(name);
                }
                Applied
            }

            Self::RenameLifetimeName { venue, old_name, new_name } => {
                let Some(config_venue) = config.venues.find_venue_mut(venue) else {
                    return NotApplicable;
                };
                if !config_venue.lifetime_names.rename_lifetime_name(old_name, new_name) {
                    return NotApplicable;
                }
                let event_changes = config_venue.events.rename_lifetime_name(old_name, new_name);
                report(
                    info,
                    text.action_rename_lifetime_name(venue, old_name, new_name, event_changes),
                );
                if let Some(dogs) = dogs.as_deref_mut() {
                    dogs.rename_lifetime_name(venue, old_name, new_name);
                }
                Applied
            }

            Self::DeleteLifetimeName { venue, name } => {
                let Some(config_venue) = config.venues.find_venue_mut(venue) else {
                    return NotApplicable;
                };
                if !config_venue.lifetime_names.delete_lifetime_name(name) {
                    return NotApplicable;
                }
                let event_changes = config_venue.events.delete_lifetime_name(name);
                report(info, text.action_delete_lifetime_name(venue, name, event_changes));
                if let Some(dogs) = dogs.as_deref_mut() {
                    dogs.delete_lifetime_name(venue, name);
                }
                Applied
            }
        }
    }

    fn update_names(&self, venue: &mut String, division: &mut String, sub_level: &mut String) {
        match self {
            Self::RenameVenue { old_name, new_name } => {
                if !venue.is_empty() && venue == old_name {
                    *venue = new_name.clone();
                }
            }
            Self::RenameDivision { venue: v, old_name, new_name } => {
                if !venue.is_empty() && venue == v && !division.is_empty() && division == old_name {
                    *division = new_name.clone();
                }
            }
            Self::RenameLevel { venue: v, division: d, old_name, new_name, .. } => {
                if !venue.is_empty()
                    && venue == v
                    && !division.is_empty()
                    && division == d
                    && !sub_level.is_empty()
                    && sub_level == old_name
                {
                    *sub_level = new_name.clone();
                }
            }
            _ => {}
        }
    }
}

/// An action plus the reference config version that introduced it. Zero
/// means it always applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedAction {
    pub config_version: i16,
    pub action: ConfigAction,
}

impl VersionedAction {
    fn is_stale(&self, config_version: i16) -> bool {
        self.config_version != 0 && config_version >= self.config_version
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActionCounts {
    pub applied: usize,
    pub declined: usize,
    pub not_applicable: usize,
    pub stale: usize,
}

impl ActionCounts {
    pub fn changed(&self) -> bool {
        self.applied > 0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionList {
    actions: Vec<VersionedAction>,
}

impl ActionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VersionedAction> {
        self.actions.iter()
    }

    pub fn push(&mut self, config_version: i16, action: ConfigAction) {
        self.actions.push(VersionedAction {
            config_version,
            action,
        });
    }

    pub fn load(&mut self, tree: &ElementNode, ctx: &mut LoadContext<'_>) -> bool {
        if tree.name() != TREE_ACTION {
            return false;
        }
        let Some(verb) = ctx.required(tree, ATTRIB_ACTION_VERB) else {
            return false;
        };
        let config_version = match tree.get_attrib_parsed::<i16>(ATTRIB_ACTION_CONFIG) {
            AttribLookup::Found(version) => version,
            AttribLookup::NotFound if ctx.version() < VERSION_ACTION_CONFIG => 0,
            AttribLookup::NotFound => {
                ctx.missing_attribute(TREE_ACTION, ATTRIB_ACTION_CONFIG);
                return false;
            }
            AttribLookup::Invalid(_) => {
                ctx.invalid_attribute(TREE_ACTION, ATTRIB_ACTION_CONFIG, None);
                return false;
            }
        };
        let attrib = |name: &str| tree.attrib(name).unwrap_or_default().to_string();
        let venue = attrib(ATTRIB_ACTION_VENUE);
        let division = attrib(ATTRIB_ACTION_DIVISION);
        let level = attrib(ATTRIB_ACTION_LEVEL);
        let old_name = attrib(ATTRIB_ACTION_OLDNAME);
        let new_name = attrib(ATTRIB_ACTION_NEWNAME);

        let action = match verb.as_str() {
            VERB_DELETE_CALPLUGIN => ConfigAction::DeleteCalPlugin { name: old_name },
            VERB_RENAME_OTHERPOINTS => ConfigAction::RenameOtherPoints { old_name, new_name },
            VERB_DELETE_OTHERPOINTS => ConfigAction::DeleteOtherPoints { name: old_name },
            VERB_RENAME_VENUE => ConfigAction::RenameVenue { old_name, new_name },
            VERB_DELETE_VENUE => ConfigAction::DeleteVenue { name: old_name },
            VERB_RENAME_MULTIQ => ConfigAction::RenameMultiQ { venue, old_name, new_name },
            VERB_DELETE_MULTIQ => ConfigAction::DeleteMultiQ { venue, name: old_name },
            VERB_RENAME_DIV => ConfigAction::RenameDivision { venue, old_name, new_name },
            VERB_DELETE_DIV => ConfigAction::DeleteDivision { venue, name: old_name },
            VERB_RENAME_LEVEL => ConfigAction::RenameLevel {
                venue,
                division,
                level,
                old_name,
                new_name,
            },
            VERB_DELETE_LEVEL => ConfigAction::DeleteLevel {
                venue,
                division,
                level,
                name: old_name,
            },
            VERB_RENAME_TITLE => ConfigAction::RenameTitle { venue, old_name, new_name },
            VERB_DELETE_TITLE => ConfigAction::DeleteTitle { venue, old_name, new_name },
            VERB_RENAME_EVENT => ConfigAction::RenameEvent { venue, old_name, new_name },
            VERB_DELETE_EVENT => ConfigAction::DeleteEvent { venue, name: old_name },
            VERB_RENAME_LIFETIME_NAME => ConfigAction::RenameLifetimeName { venue, old_name, new_name },
            VERB_DELETE_LIFETIME_NAME => ConfigAction::DeleteLifetimeName { venue, name: old_name },
            _ => {
                let hint = ctx.text().valid_values(&VERBS.join(", "));
                ctx.invalid_attribute(TREE_ACTION, ATTRIB_ACTION_VERB, Some(&hint));
                return false;
            }
        };
        self.push(config_version, action);
        true
    }

    /// Applies every action newer than `config.version`, in order. A
    /// declined or inapplicable action does not stop the rest.
    pub fn apply(
        &self,
        config: &mut Config,
        mut dogs: Option<&mut DogList>,
        text: &Localization,
        info: &mut String,
        callback: &mut dyn ConfirmationCallback,
    ) -> ActionCounts {
        let mut counts = ActionCounts::default();
        for entry in &self.actions {
            if entry.is_stale(config.version) {
                counts.stale += 1;
                continue;
            }
            match entry
                .action
                .apply(config, dogs.as_deref_mut(), text, info, callback)
            {
                ActionOutcome::Applied => counts.applied += 1,
                ActionOutcome::Declined => counts.declined += 1,
                ActionOutcome::NotApplicable => {
                    debug!(verb = entry.action.verb(), "action has nothing to act on");
                    let skipped = text
                        .action_not_applicable(entry.action.verb(), &entry.action.target());
                    report(info, skipped);
                    counts.not_applicable += 1;
                }
            }
        }
        if counts.applied > 0 || counts.not_applicable > 0 {
            info.push('\n');
            info!(applied = counts.applied, declined = counts.declined, "applied config actions");
        }
        counts
    }

    /// Translates names through the pending renames newer than
    /// `config_version`. Returns true if anything changed.
    pub fn update(
        &self,
        config_version: i16,
        venue: &mut String,
        division: &mut String,
        sub_level: &mut String,
    ) -> bool {
        let before = (venue.clone(), division.clone(), sub_level.clone());
        for entry in self.actions.iter().filter(|a| !a.is_stale(config_version)) {
            entry.action.update_names(venue, division, sub_level);
        }
        before != (venue.clone(), division.clone(), sub_level.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::StaticConfirmation;
    use crate::dog::{Dog, ExistingPointType, ExistingPoints, Run, Trial};
    use crate::error::CollectingErrorCallback;
    use crate::types::{ArbDate, ArbVersion, CURRENT_DOC_VERSION};
    use pretty_assertions::assert_eq;

    const CONFIG: &str = r#"<Configuration version="3">
        <Venue Name="AKC">
            <LifetimeName Name="Lifetime"/>
            <Division Name="Standard">
                <Level Name="Novice"/>
                <Level Name="Open">
                    <SubLevel Name="Open A"/>
                    <SubLevel Name="Open B"/>
                </Level>
            </Division>
            <Division Name="Preferred"><Level Name="Novice"/></Division>
            <Event Name="JWW">
                <Scoring Division="Standard" Level="Novice" type="FaultsThenTime"/>
            </Event>
            <Event Name="FAST">
                <Scoring Division="*" Level="*" type="ScoreThenTime"/>
            </Event>
            <MultiQ Name="Double Q" SName="QQ">
                <MultiQItem Div="Standard" Level="Novice" Event="JWW"/>
            </MultiQ>
            <Titles Name="NA"/>
        </Venue>
        <Venue Name="USDAA"><Division Name="Champ"><Level Name="Masters"/></Division></Venue>
        <OtherPts Name="Breed" Count="All"/>
        <CalSite Name="Plugin"/>
    </Configuration>"#;

    fn config() -> Config {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let root = ElementNode::load_xml_str(CONFIG).unwrap();
        let mut config = Config::new();
        let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
        assert!(config.load(&root, &mut ctx));
        config
    }

    fn dogs() -> DogList {
        let mut dog = Dog::new("Rex");
        let mut trial = Trial::default();
        trial.clubs.add_club("Club", "AKC");
        trial
            .runs
            .add_run(Run::new(ArbDate::new(2024, 1, 6), "Standard", "Novice", "JWW"));
        trial
            .runs
            .add_run(Run::new(ArbDate::new(2024, 1, 7), "Standard", "Open A", "FAST"));
        dog.trials.add_trial(trial);
        dog.existing_points.add_existing_points(ExistingPoints {
            kind: ExistingPointType::MultiQ,
            venue: "AKC".into(),
            multi_q: "Double Q".into(),
            ..ExistingPoints::default()
        });
        let mut dogs = DogList::new();
        dogs.add_dog(dog);
        dogs
    }

    fn run(
        action: ConfigAction,
        config: &mut Config,
        dogs: &mut DogList,
        answer: bool,
    ) -> (ActionOutcome, String, StaticConfirmation) {
        let text = Localization::new();
        let mut info = String::new();
        let mut confirm = StaticConfirmation::new(answer);
        let outcome = action.apply(config, Some(dogs), &text, &mut info, &mut confirm);
        (outcome, info, confirm)
    }

    fn rename(old: &str, new: &str) -> (String, String) {
        (old.to_string(), new.to_string())
    }

    #[test]
    fn rename_venue_cascades_into_dogs() {
        let mut config = config();
        let mut dogs = dogs();
        let (old_name, new_name) = rename("AKC", "American");
        let (outcome, info, _) = run(
            ConfigAction::RenameVenue { old_name, new_name },
            &mut config,
            &mut dogs,
            true,
        );
        assert_eq!(outcome, ActionOutcome::Applied);
        assert_eq!(
            info,
            "Renamed venue 'AKC' to 'American', 2 related items updated\n"
        );
        assert!(config.venues.find_venue("American").is_some());
        assert_eq!(dogs.count_venue_refs("American"), 2);
    }

    #[test]
    fn rename_onto_existing_venue_merges() {
        let mut config = config();
        let mut dogs = DogList::new();
        let (old_name, new_name) = rename("USDAA", "AKC");
        let (outcome, _, _) = run(
            ConfigAction::RenameVenue { old_name, new_name },
            &mut config,
            &mut dogs,
            true,
        );
        assert!(outcome.is_applied());
        assert_eq!(config.venues.len(), 1);
    }

    #[test]
    fn declined_delete_leaves_everything() {
        let mut config = config();
        let mut dogs = dogs();
        let before = dogs.clone();
        let (outcome, info, confirm) = run(
            ConfigAction::DeleteEvent { venue: "AKC".into(), name: "JWW".into() },
            &mut config,
            &mut dogs,
            false,
        );
        assert_eq!(outcome, ActionOutcome::Declined);
        assert!(info.is_empty());
        assert_eq!(
            confirm.pre_delete_messages(),
            ["Deleting event 'JWW' in venue 'AKC' will affect 1 related items"]
        );
        assert_eq!(dogs, before);
        assert!(config.venues.find_venue("AKC").unwrap().events.find_event("JWW").is_some());
    }

    #[test]
    fn confirmed_delete_event_cascades() {
        let mut config = config();
        let mut dogs = dogs();
        let (outcome, info, _) = run(
            ConfigAction::DeleteEvent { venue: "AKC".into(), name: "JWW".into() },
            &mut config,
            &mut dogs,
            true,
        );
        assert!(outcome.is_applied());
        assert_eq!(
            info,
            "Deleting event 'JWW' in venue 'AKC' will affect 1 related items\n\
             Deleted event 'JWW' in venue 'AKC'\n"
        );
        assert_eq!(dogs.count_events_in_use("AKC", "JWW"), 0);
        let venue = config.venues.find_venue("AKC").unwrap();
        assert!(venue.events.find_event("JWW").is_none());
        assert!(venue.multiqs.find_multiq("Double Q", false).unwrap().item_count() == 0);
    }

    #[test]
    fn rename_sub_level_only_touches_the_sub_level() {
        let mut config = config();
        let mut dogs = dogs();
        let (outcome, info, _) = run(
            ConfigAction::RenameLevel {
                venue: "AKC".into(),
                division: "Standard".into(),
                level: "Open".into(),
                old_name: "Open A".into(),
                new_name: "Open Alpha".into(),
            },
            &mut config,
            &mut dogs,
            true,
        );
        assert!(outcome.is_applied());
        assert_eq!(
            info,
            "Renamed level 'Open A' to 'Open Alpha' in venue 'AKC', 1 related items updated\n"
        );
        let levels = &config
            .venues
            .find_venue("AKC")
            .unwrap()
            .divisions
            .find_division("Standard")
            .unwrap()
            .levels;
        assert!(levels.find_level("Open").is_some());
        assert_eq!(levels.find_sub_level("Open Alpha").unwrap().name, "Open");
        assert_eq!(dogs.count_levels_in_use("AKC", "Standard", "Open Alpha"), 1);
    }

    #[test]
    fn delete_level_with_sub_levels_removes_their_runs() {
        let mut config = config();
        let mut dogs = dogs();
        let (outcome, _, _) = run(
            ConfigAction::DeleteLevel {
                venue: "AKC".into(),
                division: "Standard".into(),
                level: String::new(),
                name: "Open".into(),
            },
            &mut config,
            &mut dogs,
            true,
        );
        assert!(outcome.is_applied());
        assert_eq!(dogs.count_levels_in_use("AKC", "Standard", "Open A"), 0);
        assert_eq!(dogs.iter().next().unwrap().trials.iter().next().unwrap().runs.len(), 1);
    }

    #[test]
    fn delete_title_with_new_name_moves_titles() {
        let mut config = config();
        let mut dogs = dogs();
        dogs.iter_mut()
            .next()
            .unwrap()
            .titles
            .add_title(crate::dog::DogTitle::new("AKC", "NA", ArbDate::new(2023, 1, 1)));
        let (outcome, info, confirm) = run(
            ConfigAction::DeleteTitle {
                venue: "AKC".into(),
                old_name: "NA".into(),
                new_name: "NAP".into(),
            },
            &mut config,
            &mut dogs,
            true,
        );
        assert!(outcome.is_applied());
        assert!(confirm.pre_delete_messages().is_empty());
        assert!(info.starts_with("Renamed title 'NA' to 'NAP'"));
        assert_eq!(dogs.count_titles_in_use("AKC", "NAP"), 1);
        assert!(config.venues.find_title("AKC", "NA").is_none());
    }

    #[test]
    fn missing_scope_is_not_applicable() {
        let mut config = config();
        let mut dogs = dogs();
        let (outcome, info, _) = run(
            ConfigAction::RenameDivision {
                venue: "CPE".into(),
                old_name: "A".into(),
                new_name: "B".into(),
            },
            &mut config,
            &mut dogs,
            true,
        );
        assert_eq!(outcome, ActionOutcome::NotApplicable);
        assert!(info.is_empty());
    }

    #[test]
    fn list_reports_actions_with_nothing_to_act_on() {
        let mut config = config();
        let mut dogs = dogs();
        let mut list = ActionList::new();
        list.push(
            0,
            ConfigAction::RenameDivision {
                venue: "CPE".into(),
                old_name: "A".into(),
                new_name: "B".into(),
            },
        );
        list.push(0, ConfigAction::RenameOtherPoints { old_name: "Breed".into(), new_name: "Group".into() });
        let text = Localization::new();
        let mut info = String::new();
        let mut confirm = StaticConfirmation::new(true);
        let counts = list.apply(&mut config, Some(&mut dogs), &text, &mut info, &mut confirm);
        assert_eq!(counts.not_applicable, 1);
        assert_eq!(counts.applied, 1);
        assert_eq!(
            info,
            "Skipped RenameDivision of 'A' in venue 'CPE': not found in the configuration\n\
             Renamed other points 'Breed' to 'Group'\n\n"
        );
    }

    #[test]
    fn list_skips_stale_actions_and_continues_after_decline() {
        let mut config = config();
        let mut dogs = dogs();
        let mut list = ActionList::new();
        list.push(2, ConfigAction::DeleteCalPlugin { name: "Plugin".into() });
        list.push(4, ConfigAction::DeleteEvent { venue: "AKC".into(), name: "JWW".into() });
        list.push(0, ConfigAction::RenameOtherPoints { old_name: "Breed".into(), new_name: "Group".into() });
        let text = Localization::new();
        let mut info = String::new();
        let mut confirm = StaticConfirmation::new(false);
        let counts = list.apply(&mut config, Some(&mut dogs), &text, &mut info, &mut confirm);
        assert_eq!(
            counts,
            ActionCounts {
                applied: 1,
                declined: 1,
                not_applicable: 0,
                stale: 1
            }
        );
        assert_eq!(info, "Renamed other points 'Breed' to 'Group'\n\n");
        assert!(config.other_points.find_other_points("Group").is_some());
    }

    #[test]
    fn load_reads_verbs_and_versions() {
        let text = Localization::new();
        let mut cb = CollectingErrorCallback::new();
        let mut list = ActionList::new();
        {
            let mut ctx = LoadContext::new(CURRENT_DOC_VERSION, &text, &mut cb);
            let ok = ElementNode::load_xml_str(
                r#"<Action Verb="RenameLevel" Config="7" Venue="AKC" Div="Standard" Level="Open" OldName="A" NewName="B"/>"#,
            )
            .unwrap();
            assert!(list.load(&ok, &mut ctx));
            let no_config = ElementNode::load_xml_str(r#"<Action Verb="DeleteVenue" OldName="X"/>"#).unwrap();
            assert!(!list.load(&no_config, &mut ctx));
            let bad_verb = ElementNode::load_xml_str(r#"<Action Verb="Explode" Config="1"/>"#).unwrap();
            assert!(!list.load(&bad_verb, &mut ctx));
        }
        assert_eq!(cb.messages().len(), 2);
        assert!(cb.messages()[1].contains("DeleteCalPlugin, RenameOtherPoints"));
        let entry = list.iter().next().unwrap();
        assert_eq!(entry.config_version, 7);
        assert_eq!(
            entry.action,
            ConfigAction::RenameLevel {
                venue: "AKC".into(),
                division: "Standard".into(),
                level: "Open".into(),
                old_name: "A".into(),
                new_name: "B".into(),
            }
        );

        let mut old = ActionList::new();
        let mut cb = CollectingErrorCallback::new();
        let mut ctx = LoadContext::new(ArbVersion::new(12, 0), &text, &mut cb);
        let no_config = ElementNode::load_xml_str(r#"<Action Verb="DeleteVenue" OldName="X"/>"#).unwrap();
        assert!(old.load(&no_config, &mut ctx));
        assert_eq!(old.iter().next().unwrap().config_version, 0);
    }

    #[test]
    fn update_translates_names_through_renames() {
        let mut list = ActionList::new();
        list.push(5, ConfigAction::RenameVenue { old_name: "AKC".into(), new_name: "American".into() });
        list.push(5, ConfigAction::RenameDivision {
            venue: "American".into(),
            old_name: "Std".into(),
            new_name: "Standard".into(),
        });
        let (mut venue, mut division, mut level) = ("AKC".to_string(), "Std".to_string(), "Open".to_string());
        assert!(list.update(4, &mut venue, &mut division, &mut level));
        assert_eq!((venue.as_str(), division.as_str()), ("American", "Standard"));

        let (mut venue, mut division, mut level) = ("AKC".to_string(), "Std".to_string(), "Open".to_string());
        assert!(!list.update(5, &mut venue, &mut division, &mut level));
    }
}
