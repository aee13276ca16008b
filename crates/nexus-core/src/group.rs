//! Category grouping for display.
//!
//! Group order is fixed by the [`Category`] enumeration, never by the order
//! in which categories first appear in a result.

use serde::Serialize;

use crate::models::{Category, CategoryFilter, Item};

/// Items of one category, in result order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Group {
    pub category: Category,
    pub label: &'static str,
    pub items: Vec<Item>,
}

/// Split a flat, ordered result into display groups.
///
/// With a selected category that category is the sole group, even when it
/// is empty. Under `All`, groups follow enumeration order and empty groups
/// are omitted.
pub fn group_by_category(items: &[Item], filter: CategoryFilter) -> Vec<Group> {
    let categories: Vec<Category> = match filter {
        CategoryFilter::Only(c) => vec![c],
        CategoryFilter::All => Category::ALL.to_vec(),
    };

    categories
        .into_iter()
        .filter_map(|category| {
            let members: Vec<Item> = items
                .iter()
                .filter(|item| item.category == category)
                .cloned()
                .collect();
            if members.is_empty() && filter == CategoryFilter::All {
                return None;
            }
            Some(Group {
                category,
                label: category.label(),
                items: members,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, category: Category) -> Item {
        Item {
            id: id.to_string(),
            name: id.to_string(),
            description: String::new(),
            category,
            tags: Vec::new(),
            url: String::new(),
            icon: String::new(),
        }
    }

    #[test]
    fn test_all_uses_enumeration_order() {
        let items = vec![
            item("p", Category::Personal),
            item("a1", Category::Ai),
            item("d", Category::Development),
            item("a2", Category::Ai),
        ];
        let groups = group_by_category(&items, CategoryFilter::All);
        let order: Vec<Category> = groups.iter().map(|g| g.category).collect();
        assert_eq!(
            order,
            vec![Category::Development, Category::Ai, Category::Personal]
        );
        let ai: Vec<&str> = groups[1].items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ai, vec!["a1", "a2"]);
    }

    #[test]
    fn test_selected_category_is_sole_group_even_if_empty() {
        let items = vec![item("a", Category::Ai)];
        let groups = group_by_category(&items, CategoryFilter::Only(Category::Creative));
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].category, Category::Creative);
        assert!(groups[0].items.is_empty());
    }

    #[test]
    fn test_empty_result_under_all() {
        assert!(group_by_category(&[], CategoryFilter::All).is_empty());
    }
}
