//! Projection of a flat path list into the rows of a collapsible tree.

use std::collections::{BTreeMap, HashMap};

use crate::gateway::FileStatusEntry;

/// Explicit expand/collapse overrides keyed by directory path.
///
/// `false` expands a directory; a missing key or `true` keeps it collapsed.
pub type CollapseState = HashMap<String, bool>;

/// One renderable line of the file tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Row {
    pub path: String,
    pub is_dir: bool,
    pub collapsed: bool,
    pub ignored: bool,
    pub depth: usize,
    /// Source entry for file rows.
    pub entry: Option<FileStatusEntry>,
}

impl Row {
    /// Last path component.
    pub fn name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    pub fn parent(&self) -> Option<&str> {
        self.path.rsplit_once('/').map(|(parent, _)| parent)
    }
}

pub fn is_expanded(collapse: &CollapseState, path: &str) -> bool {
    collapse.get(path) == Some(&false)
}

#[derive(Default)]
struct DirNode<'a> {
    dirs: BTreeMap<String, DirNode<'a>>,
    files: BTreeMap<String, &'a FileStatusEntry>,
}

enum Child<'n, 'a> {
    Dir(&'n DirNode<'a>),
    File(&'a FileStatusEntry),
}

impl<'a> DirNode<'a> {
    /// Children in path order. A file sorts before a directory of the same
    /// name.
    fn children(&self) -> Vec<(&str, Child<'_, 'a>)> {
        let mut children: Vec<_> = self
            .files
            .iter()
            .map(|(path, entry)| (path.as_str(), Child::File(*entry)))
            .chain(
                self.dirs
                    .iter()
                    .map(|(path, dir)| (path.as_str(), Child::Dir(dir))),
            )
            .collect();
        children.sort_by(|left, right| left.0.cmp(right.0));
        children
    }

    fn all_files_ignored(&self) -> bool {
        self.files.values().all(|entry| entry.ignored)
            && self.dirs.values().all(DirNode::all_files_ignored)
    }
}

/// Build the visible rows for `entries`.
///
/// Children of every directory are ordered by full path, files and
/// directories interleaved. A path that is both a file and a directory gets
/// a row for each. Descendants of collapsed directories are omitted.
///
/// # Panics
///
/// Panics if an entry has an empty path.
pub fn build_rows(entries: &[FileStatusEntry], collapse: &CollapseState) -> Vec<Row> {
    let mut root = DirNode::default();

    for entry in entries {
        assert!(!entry.path.is_empty(), "file entries must have a path");
        insert(&mut root, entry);
    }

    let mut rows = Vec::new();
    emit(&root, collapse, 0, &mut rows);
    rows
}

fn insert<'a>(root: &mut DirNode<'a>, entry: &'a FileStatusEntry) {
    let mut dir = root;

    if let Some((parent, _)) = entry.path.rsplit_once('/') {
        let mut end = 0;
        for component in parent.split('/') {
            end += component.len();
            let prefix = entry.path[..end].to_string();
            end += 1;
            dir = dir.dirs.entry(prefix).or_default();
        }
    }

    dir.files.insert(entry.path.clone(), entry);
}

/// Returns whether every file beneath `dir` is ignored.
fn emit(dir: &DirNode<'_>, collapse: &CollapseState, depth: usize, rows: &mut Vec<Row>) -> bool {
    let mut all_ignored = true;

    for (path, child) in dir.children() {
        match child {
            Child::File(entry) => {
                all_ignored &= entry.ignored;
                rows.push(Row {
                    path: path.to_string(),
                    is_dir: false,
                    collapsed: false,
                    ignored: entry.ignored,
                    depth,
                    entry: Some(entry.clone()),
                });
            }
            Child::Dir(child) => {
                let expanded = is_expanded(collapse, path);
                let index = rows.len();
                rows.push(Row {
                    path: path.to_string(),
                    is_dir: true,
                    collapsed: !expanded,
                    ignored: false,
                    depth,
                    entry: None,
                });

                let ignored = if expanded {
                    emit(child, collapse, depth + 1, rows)
                } else {
                    child.all_files_ignored()
                };
                rows[index].ignored = ignored;
                all_ignored &= ignored;
            }
        }
    }

    all_ignored
}
