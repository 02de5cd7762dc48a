use std::fmt;

use super::model::{Table, Tables};
use crate::config::EcMapping;

// ---------------------------------------------------------------------------
// Group selection (side panel)
// ---------------------------------------------------------------------------

/// Label of the "every group" choice.
pub const ALL_GROUPS: &str = "전체";

/// Which groups a view shows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum GroupSelection {
    #[default]
    All,
    Only(String),
}

impl GroupSelection {
    pub fn includes(&self, group: &str) -> bool {
        match self {
            GroupSelection::All => true,
            GroupSelection::Only(selected) => selected == group,
        }
    }
}

impl fmt::Display for GroupSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupSelection::All => write!(f, "{ALL_GROUPS}"),
            GroupSelection::Only(group) => write!(f, "{group}"),
        }
    }
}

/// "All" followed by every mapped group, in mapping order.
pub fn selection_options(mapping: &EcMapping) -> Vec<GroupSelection> {
    std::iter::once(GroupSelection::All)
        .chain(mapping.names().map(|n| GroupSelection::Only(n.to_string())))
        .collect()
}

/// Tables passing the selection, in key order.
pub fn selected_tables<'a, R>(
    tables: &'a Tables<R>,
    selection: &'a GroupSelection,
) -> impl Iterator<Item = &'a Table<R>> + 'a {
    tables
        .values()
        .filter(move |table| selection.includes(&table.group))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::growth_table;
    use crate::data::model::GrowthTables;

    #[test]
    fn options_start_with_all() {
        let options = selection_options(&EcMapping::default());
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].to_string(), ALL_GROUPS);
        assert_eq!(options[1], GroupSelection::Only("송도고".into()));
    }

    #[test]
    fn selection_filters_tables() {
        let mut tables = GrowthTables::new();
        for group in ["A", "B", "C"] {
            tables.insert(group.into(), growth_table(group, &[[1.0, 1.0, 1.0]]));
        }

        assert_eq!(selected_tables(&tables, &GroupSelection::All).count(), 3);
        let only_b = GroupSelection::Only("B".into());
        let picked: Vec<&str> = selected_tables(&tables, &only_b)
            .map(|t| t.group.as_str())
            .collect();
        assert_eq!(picked, ["B"]);
        assert_eq!(
            selected_tables(&tables, &GroupSelection::Only("Z".into())).count(),
            0
        );
    }
}
