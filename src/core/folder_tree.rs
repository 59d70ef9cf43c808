//! Builds a forest of folders out of a flat parent-pointer collection.
//!
//! Nodes live in an arena (`Vec`) and refer to their children by index, so the
//! structure owns exactly one copy of each placed folder and hands out cheap
//! borrowed `TreeNode` views. The forest is rebuilt from scratch whenever the
//! folder collection changes; there is no incremental update.
//!
//! Building is O(n²): every placed node scans the whole name-sorted collection
//! for its children. That is fine for catalog-sized data (tens to a few hundred
//! folders) and keeps sibling order identical to the sorted input order.

use std::collections::HashSet;
use std::iter::FusedIterator;

use serde::ser::{Serialize, SerializeStruct, Serializer};

use super::{locale_cmp, CoreError, Folder};

#[derive(Debug, Clone)]
struct ArenaNode {
    data: Folder,
    children: Vec<usize>,
}

/// An ordered forest of folder trees.
#[derive(Debug, Clone, Default)]
pub struct FolderForest {
    nodes: Vec<ArenaNode>,
    roots: Vec<usize>,
}

impl FolderForest {
    /// Builds the forest from folders in any order.
    ///
    /// Folders are sorted by name (stable, so equal names keep their input order),
    /// then every root folder is expanded recursively. A folder whose `parent_id`
    /// names a folder that does not exist is unreachable and silently left out.
    ///
    /// Fails with `CoreError::CyclicFolderGraph` if an id shows up again inside its
    /// own ancestor chain, which can only happen when two records share an id.
    pub fn build<'a, I>(folders: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = &'a Folder>,
    {
        let mut sorted: Vec<&Folder> = folders.into_iter().collect();
        sorted.sort_by(|a, b| locale_cmp(&a.name, &b.name));

        let mut forest = Self::default();
        let mut ancestors: Vec<&str> = Vec::new();

        for folder in sorted.iter().copied().filter(|f| f.is_root()) {
            let index = forest.attach(folder, &sorted, &mut ancestors)?;
            forest.roots.push(index);
        }

        let known_ids: HashSet<&str> = sorted.iter().map(|f| f.id.as_str()).collect();
        let orphans = sorted
            .iter()
            .filter(|f| {
                f.parent_id
                    .as_deref()
                    .is_some_and(|p| !p.is_empty() && !known_ids.contains(p))
            })
            .count();
        if orphans > 0 {
            tracing::warn!(orphans, "Folders reference a missing parent and were left out of the tree");
        }

        tracing::debug!(
            folders = sorted.len(),
            nodes = forest.nodes.len(),
            roots = forest.roots.len(),
            "Built folder tree"
        );
        Ok(forest)
    }

    /// Places `folder` into the arena and recursively attaches its children.
    fn attach<'f>(
        &mut self,
        folder: &'f Folder,
        sorted: &[&'f Folder],
        ancestors: &mut Vec<&'f str>,
    ) -> Result<usize, CoreError> {
        if ancestors.contains(&folder.id.as_str()) {
            tracing::warn!(id = %folder.id, "Cycle detected while building folder tree");
            return Err(CoreError::CyclicFolderGraph {
                id: folder.id.clone(),
            });
        }

        let index = self.nodes.len();
        self.nodes.push(ArenaNode {
            data: folder.clone(),
            children: Vec::new(),
        });

        ancestors.push(folder.id.as_str());
        for child in sorted
            .iter()
            .copied()
            .filter(|c| c.parent_id.as_deref() == Some(folder.id.as_str()))
        {
            let child_index = self.attach(child, sorted, ancestors)?;
            self.nodes[index].children.push(child_index);
        }
        ancestors.pop();

        Ok(index)
    }

    /// Number of nodes placed in the forest.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    /// Root nodes in name order.
    pub fn roots(&self) -> impl ExactSizeIterator<Item = TreeNode<'_>> + '_ {
        self.roots.iter().map(move |&index| TreeNode {
            forest: self,
            index,
        })
    }

    /// Depth-first, pre-order walk over every folder in the forest.
    ///
    /// Each call starts over from the first root.
    pub fn iter(&self) -> TreeIter<'_> {
        TreeIter {
            inner: PreOrder::new(self, self.roots.iter().rev().copied().collect()),
        }
    }

    /// Finds the subtree rooted at `folder_id`.
    ///
    /// `None` yields the first root only, not a synthetic node holding all roots.
    pub fn sub_tree(&self, folder_id: Option<&str>) -> Option<TreeNode<'_>> {
        match folder_id {
            None => self.roots().next(),
            Some(id) => {
                PreOrder::new(self, self.roots.iter().rev().copied().collect())
                    .find(|node| node.data().id == id)
            }
        }
    }

    /// Ids from the root down to `folder_id`, led by a `None` sentinel for "above all roots".
    ///
    /// An unknown id (or `None`) gives just `[None]`.
    pub fn folder_path(&self, folder_id: Option<&str>) -> Vec<Option<String>> {
        let Some(target) = folder_id else {
            return vec![None];
        };

        let mut path: Vec<usize> = Vec::new();
        let mut stack: Vec<(usize, usize)> = self.roots.iter().rev().map(|&r| (r, 0)).collect();

        while let Some((index, depth)) = stack.pop() {
            path.truncate(depth);
            path.push(index);

            let node = &self.nodes[index];
            if node.data.id == target {
                return std::iter::once(None)
                    .chain(path.iter().map(|&i| Some(self.nodes[i].data.id.clone())))
                    .collect();
            }

            for &child in node.children.iter().rev() {
                stack.push((child, depth + 1));
            }
        }

        vec![None]
    }

    /// Folders that `folder_id` could be moved under without creating a cycle:
    /// everything except the folder itself and its descendants.
    pub fn parent_candidates(&self, folder_id: &str) -> Vec<&Folder> {
        let excluded: HashSet<&str> = match self.sub_tree(Some(folder_id)) {
            Some(node) => node.iter().map(|f| f.id.as_str()).collect(),
            None => HashSet::from([folder_id]),
        };

        self.iter()
            .filter(|f| !excluded.contains(f.id.as_str()))
            .collect()
    }
}

/// A borrowed view of one node in a `FolderForest`.
#[derive(Debug, Clone, Copy)]
pub struct TreeNode<'a> {
    forest: &'a FolderForest,
    index: usize,
}

impl<'a> TreeNode<'a> {
    pub fn data(&self) -> &'a Folder {
        &self.forest.nodes[self.index].data
    }

    /// Children in name order.
    pub fn children(&self) -> impl ExactSizeIterator<Item = TreeNode<'a>> + 'a {
        let forest: &'a FolderForest = self.forest;
        forest.nodes[self.index]
            .children
            .iter()
            .map(move |&index| TreeNode { forest, index })
    }

    pub fn has_children(&self) -> bool {
        !self.forest.nodes[self.index].children.is_empty()
    }

    /// Pre-order walk over this node and everything below it.
    pub fn iter(&self) -> TreeIter<'a> {
        TreeIter {
            inner: PreOrder::new(self.forest, vec![self.index]),
        }
    }
}

impl Serialize for TreeNode<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let children: Vec<TreeNode<'_>> = self.children().collect();
        let mut state = serializer.serialize_struct("TreeNode", 2)?;
        state.serialize_field("data", self.data())?;
        state.serialize_field("children", &children)?;
        state.end()
    }
}

impl Serialize for FolderForest {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.roots())
    }
}

/// Stack-driven pre-order walk. The stack holds indices still to visit, top last.
#[derive(Debug, Clone)]
struct PreOrder<'a> {
    forest: &'a FolderForest,
    stack: Vec<usize>,
}

impl<'a> PreOrder<'a> {
    fn new(forest: &'a FolderForest, stack: Vec<usize>) -> Self {
        Self { forest, stack }
    }
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = TreeNode<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let index = self.stack.pop()?;
        self.stack
            .extend(self.forest.nodes[index].children.iter().rev().copied());
        Some(TreeNode {
            forest: self.forest,
            index,
        })
    }
}

/// Lazy pre-order sequence of folder records.
#[derive(Debug, Clone)]
pub struct TreeIter<'a> {
    inner: PreOrder<'a>,
}

impl<'a> Iterator for TreeIter<'a> {
    type Item = &'a Folder;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|node| node.data())
    }
}

impl FusedIterator for TreeIter<'_> {}

impl<'a> IntoIterator for &'a FolderForest {
    type Item = &'a Folder;
    type IntoIter = TreeIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::test_helpers::setup_test_logging;
    use indexmap::IndexMap;

    fn folder(id: &str, name: &str, parent: Option<&str>) -> Folder {
        Folder {
            id: id.to_string(),
            name: name.to_string(),
            description: None,
            parent_id: parent.map(str::to_string),
            created_at: None,
            updated_at: None,
            shared_with: Vec::new(),
        }
    }

    /// Clothing
    /// ├── Jackets
    /// │   └── Leather
    /// └── Shoes
    /// Furniture
    /// └── Chairs
    fn create_test_folders() -> IndexMap<String, Folder> {
        [
            folder("shoes", "Shoes", Some("clothing")),
            folder("furniture", "Furniture", None),
            folder("leather", "Leather", Some("jackets")),
            folder("clothing", "Clothing", None),
            folder("chairs", "Chairs", Some("furniture")),
            folder("jackets", "Jackets", Some("clothing")),
        ]
        .into_iter()
        .map(|f| (f.id.clone(), f))
        .collect()
    }

    fn ids<'a>(iter: impl Iterator<Item = &'a Folder>) -> Vec<&'a str> {
        iter.map(|f| f.id.as_str()).collect()
    }

    #[test]
    fn test_build_orders_roots_and_children_by_name() {
        setup_test_logging();
        let folders = create_test_folders();
        let forest = FolderForest::build(folders.values()).unwrap();

        let roots: Vec<_> = forest.roots().map(|n| n.data().name.as_str()).collect();
        assert_eq!(roots, vec!["Clothing", "Furniture"]);

        let clothing = forest.roots().next().unwrap();
        let children: Vec<_> = clothing.children().map(|n| n.data().name.as_str()).collect();
        assert_eq!(children, vec!["Jackets", "Shoes"]);
        assert_eq!(forest.len(), 6);
    }

    #[test]
    fn test_accented_siblings_sort_with_their_base_letter() {
        let folders = [
            folder("zebra", "Zebra", None),
            folder("emile", "Émile", None),
            folder("ol", "Öl", None),
            folder("apple", "apple", None),
            folder("uber", "Über", Some("emile")),
            folder("tee", "Tee", Some("emile")),
            folder("accent", "Äpfel", Some("emile")),
        ];
        let forest = FolderForest::build(folders.iter()).unwrap();

        let roots: Vec<_> = forest.roots().map(|n| n.data().name.as_str()).collect();
        assert_eq!(roots, vec!["apple", "Émile", "Öl", "Zebra"]);

        let emile = forest.sub_tree(Some("emile")).unwrap();
        let children: Vec<_> = emile.children().map(|n| n.data().name.as_str()).collect();
        assert_eq!(children, vec!["Äpfel", "Tee", "Über"]);
    }

    #[test]
    fn test_equal_names_keep_input_order() {
        let folders = [
            folder("b", "Same", None),
            folder("a", "Same", None),
            folder("c", "Other", None),
        ];
        let forest = FolderForest::build(folders.iter()).unwrap();
        assert_eq!(ids(forest.iter()), vec!["c", "b", "a"]);
    }

    #[test]
    fn test_empty_string_parent_is_a_root() {
        let folders = [folder("x", "X", Some(""))];
        let forest = FolderForest::build(folders.iter()).unwrap();
        assert_eq!(forest.roots().len(), 1);
    }

    #[test]
    fn test_orphans_are_left_out() {
        setup_test_logging();
        let mut folders = create_test_folders();
        folders.insert(
            "lost".to_string(),
            folder("lost", "Lost", Some("does-not-exist")),
        );
        folders.insert("lost-child".to_string(), folder("lost-child", "Kid", Some("lost")));

        let forest = FolderForest::build(folders.values()).unwrap();
        assert_eq!(forest.len(), 6);
        assert!(forest.iter().all(|f| f.id != "lost" && f.id != "lost-child"));
    }

    #[test]
    fn test_iterate_is_pre_order_and_restartable() {
        let folders = create_test_folders();
        let forest = FolderForest::build(folders.values()).unwrap();

        let expected = vec!["clothing", "jackets", "leather", "shoes", "furniture", "chairs"];
        assert_eq!(ids(forest.iter()), expected);
        assert_eq!(ids(forest.iter()), expected);
        assert_eq!(ids((&forest).into_iter()), expected);
    }

    #[test]
    fn test_sub_tree_lookup() {
        let folders = create_test_folders();
        let forest = FolderForest::build(folders.values()).unwrap();

        let jackets = forest.sub_tree(Some("jackets")).unwrap();
        assert_eq!(jackets.data().name, "Jackets");
        assert_eq!(ids(jackets.iter()), vec!["jackets", "leather"]);

        assert!(forest.sub_tree(Some("nope")).is_none());
    }

    #[test]
    fn test_sub_tree_of_none_is_first_root_only() {
        let folders = create_test_folders();
        let forest = FolderForest::build(folders.values()).unwrap();
        assert_eq!(forest.sub_tree(None).unwrap().data().id, "clothing");

        let empty = FolderForest::build(std::iter::empty()).unwrap();
        assert!(empty.sub_tree(None).is_none());
        assert!(empty.is_empty());
    }

    #[test]
    fn test_folder_path() {
        let folders = create_test_folders();
        let forest = FolderForest::build(folders.values()).unwrap();

        assert_eq!(
            forest.folder_path(Some("leather")),
            vec![
                None,
                Some("clothing".to_string()),
                Some("jackets".to_string()),
                Some("leather".to_string())
            ]
        );
        assert_eq!(
            forest.folder_path(Some("furniture")),
            vec![None, Some("furniture".to_string())]
        );
        assert_eq!(forest.folder_path(None), vec![None]);
        assert_eq!(forest.folder_path(Some("missing")), vec![None]);
    }

    #[test]
    fn test_duplicate_id_in_ancestor_chain_is_rejected() {
        setup_test_logging();
        let mut folders = IndexMap::new();
        folders.insert("k1".to_string(), folder("x", "Root", None));
        folders.insert("k2".to_string(), folder("x", "Loop", Some("x")));

        let err = FolderForest::build(folders.values()).unwrap_err();
        assert!(matches!(err, CoreError::CyclicFolderGraph { ref id } if id == "x"));
    }

    #[test]
    fn test_self_parented_folder_is_unreachable_not_fatal() {
        let folders = [folder("a", "A", None), folder("s", "Self", Some("s"))];
        let forest = FolderForest::build(folders.iter()).unwrap();
        assert_eq!(ids(forest.iter()), vec!["a"]);
    }

    #[test]
    fn test_parent_candidates_exclude_self_and_descendants() {
        let folders = create_test_folders();
        let forest = FolderForest::build(folders.values()).unwrap();

        let candidates = ids(forest.parent_candidates("clothing").into_iter());
        assert_eq!(candidates, vec!["furniture", "chairs"]);

        let candidates = ids(forest.parent_candidates("brand-new").into_iter());
        assert_eq!(candidates.len(), 6);
    }

    #[test]
    fn test_forest_serializes_as_nested_nodes() {
        let folders = [folder("a", "A", None), folder("b", "B", Some("a"))];
        let forest = FolderForest::build(folders.iter()).unwrap();
        let json = serde_json::to_value(&forest).unwrap();

        assert_eq!(json[0]["data"]["id"], "a");
        assert_eq!(json[0]["children"][0]["data"]["id"], "b");
        assert_eq!(json[0]["children"][0]["children"].as_array().unwrap().len(), 0);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        /// Each entry: (name, parent). A parent of `Some(Ok(j))` points at an earlier
        /// folder, `Some(Err(_))` at an id that does not exist.
        type Shape = Vec<(String, Option<Result<usize, u8>>)>;

        fn shape_strategy() -> impl Strategy<Value = Shape> {
            prop::collection::vec(
                (
                    "[a-cA-C]{1,3}",
                    prop_oneof![
                        2 => Just(None::<Result<usize, u8>>),
                        5 => any::<prop::sample::Index>().prop_map(|i| Some(Ok(i.index(usize::MAX)))),
                        1 => any::<u8>().prop_map(|n| Some(Err(n))),
                    ],
                ),
                0..30,
            )
            .prop_map(|entries| {
                entries
                    .into_iter()
                    .enumerate()
                    .map(|(i, (name, parent))| {
                        let parent = match parent {
                            Some(Ok(_)) if i == 0 => None,
                            Some(Ok(j)) => Some(Ok(j % i)),
                            other => other,
                        };
                        (name, parent)
                    })
                    .collect()
            })
        }

        /// Returns the folders plus, per folder, `Some(depth)` if reachable.
        fn materialize(shape: &Shape) -> (Vec<Folder>, Vec<Option<usize>>) {
            let mut depths: Vec<Option<usize>> = Vec::with_capacity(shape.len());
            let folders: Vec<Folder> = shape
                .iter()
                .enumerate()
                .map(|(i, (name, parent))| {
                    let (parent_id, depth) = match parent {
                        None => (None, Some(0)),
                        Some(Ok(j)) => (Some(format!("f{j}")), depths[*j].map(|d| d + 1)),
                        Some(Err(n)) => (Some(format!("missing-{n}")), None),
                    };
                    depths.push(depth);
                    folder(&format!("f{i}"), name, parent_id.as_deref())
                })
                .collect();
            (folders, depths)
        }

        proptest! {
            #[test]
            fn reachable_folders_appear_exactly_once(shape in shape_strategy()) {
                let (folders, depths) = materialize(&shape);
                let forest = FolderForest::build(folders.iter()).unwrap();
                let seen = ids(forest.iter());

                for (i, depth) in depths.iter().enumerate() {
                    let id = format!("f{i}");
                    let count = seen.iter().filter(|s| **s == id).count();
                    prop_assert_eq!(count, usize::from(depth.is_some()));
                }
                prop_assert_eq!(seen.len(), forest.len());
            }

            #[test]
            fn siblings_are_sorted_by_name(shape in shape_strategy()) {
                let (folders, _) = materialize(&shape);
                let forest = FolderForest::build(folders.iter()).unwrap();

                let roots: Vec<_> = forest.roots().collect();
                let roots_sorted = roots.windows(2).all(|w| {
                    locale_cmp(&w[0].data().name, &w[1].data().name) != std::cmp::Ordering::Greater
                });
                prop_assert!(roots_sorted);
                for node in PreOrder::new(&forest, forest.roots.iter().rev().copied().collect()) {
                    let children: Vec<_> = node.children().collect();
                    let children_sorted = children.windows(2).all(|w| {
                        locale_cmp(&w[0].data().name, &w[1].data().name) != std::cmp::Ordering::Greater
                    });
                    prop_assert!(children_sorted);
                }
            }

            #[test]
            fn path_length_tracks_depth(shape in shape_strategy()) {
                let (folders, depths) = materialize(&shape);
                let forest = FolderForest::build(folders.iter()).unwrap();

                for (i, depth) in depths.iter().enumerate() {
                    let id = format!("f{i}");
                    let path = forest.folder_path(Some(&id));
                    match depth {
                        Some(d) => {
                            prop_assert_eq!(path.len(), d + 2);
                            prop_assert_eq!(path[0].as_deref(), None);
                            prop_assert_eq!(path.last().unwrap().as_deref(), Some(id.as_str()));
                        }
                        None => prop_assert_eq!(path, vec![None]),
                    }
                }
            }

            #[test]
            fn sub_tree_of_none_matches_first_root(shape in shape_strategy()) {
                let (folders, _) = materialize(&shape);
                let forest = FolderForest::build(folders.iter()).unwrap();
                let first = forest.sub_tree(None).map(|n| n.data().id.clone());
                let expected = forest.roots().next().map(|n| n.data().id.clone());
                prop_assert_eq!(first, expected);
            }
        }
    }
}
