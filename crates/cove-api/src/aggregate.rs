use std::collections::HashMap;

use cove_db::models::ReactionRow;
use cove_types::api::GroupedReaction;

/// Group raw per-user reaction rows into per-emoji aggregates for one
/// message, as seen by `viewer`.
///
/// Output order is first appearance of each emoji in the input — not
/// alphabetical, not by count. Pure: empty in, empty out.
pub fn group_reactions(rows: &[ReactionRow], viewer: &str) -> Vec<GroupedReaction> {
    let mut groups: Vec<GroupedReaction> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for row in rows {
        match index.get(row.emoji.as_str()) {
            Some(&i) => {
                groups[i].count += 1;
                if row.user_id == viewer {
                    groups[i].reacted_by_me = true;
                }
            }
            None => {
                index.insert(row.emoji.as_str(), groups.len());
                groups.push(GroupedReaction {
                    emoji: row.emoji.clone(),
                    count: 1,
                    reacted_by_me: row.user_id == viewer,
                });
            }
        }
    }

    groups
}
