//! Generates an ASCII representation of a folder forest.

use super::folder_tree::{FolderForest, TreeNode};

/// A utility struct for generating an ASCII folder tree.
///
/// This struct is stateless and provides methods as associated functions.
pub struct TreeGenerator;

impl TreeGenerator {
    /// Renders the whole forest under a single label line.
    pub fn generate_tree(forest: &FolderForest, root_label: &str) -> String {
        let mut result = format!("{root_label}/\n");
        let roots: Vec<TreeNode<'_>> = forest.roots().collect();
        Self::render_nodes(&roots, &mut result, "");
        result
    }

    /// Renders one subtree, starting with the node itself as the top line.
    pub fn generate_sub_tree(node: TreeNode<'_>) -> String {
        let mut result = format!("{}/\n", node.data().name);
        let children: Vec<TreeNode<'_>> = node.children().collect();
        Self::render_nodes(&children, &mut result, "");
        result
    }

    fn render_nodes(nodes: &[TreeNode<'_>], result: &mut String, prefix: &str) {
        for (i, node) in nodes.iter().enumerate() {
            let is_last = i == nodes.len() - 1;
            let connector = if is_last { "└── " } else { "├── " };

            result.push_str(&format!("{prefix}{connector}{}\n", node.data().name));

            if node.has_children() {
                let new_prefix = if is_last {
                    format!("{prefix}    ")
                } else {
                    format!("{prefix}│   ")
                };
                let children: Vec<TreeNode<'_>> = node.children().collect();
                Self::render_nodes(&children, result, &new_prefix);
            }
        }
    }
}
