use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category tree node. `parent_id` is null for roots.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "categories")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    #[sea_orm(unique)]
    pub slug: String,
    pub description: Option<String>,
    pub position: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::product::Entity")]
    Products,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Products.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Category with its children, shaped for the tree endpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CategoryTree {
    pub id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub slug: String,
    pub position: i32,
    pub is_active: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<CategoryTree>,
}

impl From<Model> for CategoryTree {
    fn from(model: Model) -> Self {
        Self {
            id: model.id,
            parent_id: model.parent_id,
            name: model.name,
            slug: model.slug,
            position: model.position,
            is_active: model.is_active,
            children: Vec::new(),
        }
    }
}

impl CategoryTree {
    /// Assemble a forest from a flat row set. Rows whose parent is missing
    /// from the set surface as roots rather than disappearing.
    pub fn build(rows: Vec<Model>) -> Vec<CategoryTree> {
        use std::collections::{BTreeMap, HashSet};

        let ids: HashSet<i64> = rows.iter().map(|r| r.id).collect();
        let mut by_parent: BTreeMap<Option<i64>, Vec<Model>> = BTreeMap::new();
        for row in rows {
            let key = match row.parent_id {
                Some(pid) if ids.contains(&pid) => Some(pid),
                _ => None,
            };
            by_parent.entry(key).or_default().push(row);
        }

        fn attach(
            parent: Option<i64>,
            by_parent: &mut std::collections::BTreeMap<Option<i64>, Vec<Model>>,
        ) -> Vec<CategoryTree> {
            let mut nodes: Vec<CategoryTree> = by_parent
                .remove(&parent)
                .unwrap_or_default()
                .into_iter()
                .map(CategoryTree::from)
                .collect();
            nodes.sort_by_key(|n| (n.position, n.id));
            for node in &mut nodes {
                node.children = attach(Some(node.id), by_parent);
            }
            nodes
        }

        attach(None, &mut by_parent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn row(id: i64, parent_id: Option<i64>, position: i32) -> Model {
        Model {
            id,
            parent_id,
            name: format!("cat-{id}"),
            slug: format!("cat-{id}"),
            description: None,
            position,
            is_active: true,
            created_at: Utc::now(),
            updated_at: None,
        }
    }

    #[test]
    fn builds_nested_tree_ordered_by_position() {
        let rows = vec![row(1, None, 2), row(2, None, 1), row(3, Some(1), 0), row(4, Some(3), 0)];
        let tree = CategoryTree::build(rows);

        assert_eq!(tree.len(), 2);
        assert_eq!(tree[0].id, 2);
        assert_eq!(tree[1].id, 1);
        assert_eq!(tree[1].children[0].id, 3);
        assert_eq!(tree[1].children[0].children[0].id, 4);
    }

    #[test]
    fn orphaned_children_become_roots() {
        let rows = vec![row(5, Some(99), 0)];
        let tree = CategoryTree::build(rows);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id, 5);
    }
}
