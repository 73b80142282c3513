use crate::tree::TreeSnapshot;

/// Renders a tree as an indented listing, one line per node below the root
///
/// ```
/// use sitetree::tree::{render, TreeSnapshot};
///
/// let tree = TreeSnapshot {
///     name: "example.com".into(),
///     children: vec![TreeSnapshot {
///         name: "a".into(),
///         children: vec![TreeSnapshot::leaf("b")],
///     }],
/// };
/// assert_eq!(render(&tree), "+--a\n    +--b\n");
/// ```
pub fn render(tree: &TreeSnapshot) -> String {
    let mut out = String::new();
    render_children(tree, 0, &mut out);
    out
}

fn render_children(node: &TreeSnapshot, depth: usize, out: &mut String) {
    for child in &node.children {
        out.push_str(&" ".repeat(depth * 4));
        out.push_str("+--");
        out.push_str(&child.name);
        out.push('\n');
        render_children(child, depth + 1, out);
    }
}
