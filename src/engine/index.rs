//! Red-black ordered index.
//!
//! Nodes live in a `Vec` arena and refer to each other by slot index, so
//! parent links are plain back-references. A removed node is unlinked from the
//! tree first, then its slot is reclaimed with `swap_remove`; the node that
//! moved into the hole has its neighbours re-pointed. The arena therefore
//! stays dense and `len()` is just the arena length.

use std::cmp::Ordering;

type NodeId = usize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Color {
    Red,
    Black,
}

#[derive(Debug, Clone)]
struct Node<K, V> {
    key: K,
    value: V,
    color: Color,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IndexError {
    DuplicateKey,
}

impl std::fmt::Display for IndexError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IndexError::DuplicateKey => write!(f, "duplicate key"),
        }
    }
}

impl std::error::Error for IndexError {}

/// Balanced search tree keyed by `K`.
#[derive(Debug, Clone)]
pub struct OrderedIndex<K, V> {
    nodes: Vec<Node<K, V>>,
    root: Option<NodeId>,
}

impl<K, V> Default for OrderedIndex<K, V> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            root: None,
        }
    }
}

impl<K: Ord, V> OrderedIndex<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    // ── Link accessors ───────────────────────────────────────

    fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    fn left(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].left
    }

    fn right(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].right
    }

    /// Absent children count as black leaves.
    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.is_some_and(|n| self.nodes[n].color == Color::Red)
    }

    fn is_black(&self, id: Option<NodeId>) -> bool {
        !self.is_red(id)
    }

    fn set_color(&mut self, id: Option<NodeId>, color: Color) {
        if let Some(n) = id {
            self.nodes[n].color = color;
        }
    }

    // ── Lookup ───────────────────────────────────────────────

    fn find(&self, key: &K) -> Option<NodeId> {
        let mut cur = self.root;
        while let Some(n) = cur {
            cur = match key.cmp(&self.nodes[n].key) {
                Ordering::Less => self.left(n),
                Ordering::Greater => self.right(n),
                Ordering::Equal => return Some(n),
            };
        }
        None
    }

    /// O(log n) exact lookup.
    pub fn search(&self, key: &K) -> Option<&V> {
        self.find(key).map(|n| &self.nodes[n].value)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.find(key).is_some()
    }

    /// Value stored under the greatest key.
    pub fn max_value(&self) -> Option<&V> {
        let mut cur = self.root?;
        while let Some(r) = self.right(cur) {
            cur = r;
        }
        Some(&self.nodes[cur].value)
    }

    fn subtree_min(&self, mut id: NodeId) -> NodeId {
        while let Some(l) = self.left(id) {
            id = l;
        }
        id
    }

    // ── Rotations ────────────────────────────────────────────

    /// Point `old`'s parent (or the root) at `new` instead.
    fn replace_child(&mut self, new: Option<NodeId>, old: NodeId) {
        let parent = self.parent(old);
        match parent {
            None => self.root = new,
            Some(p) => {
                if self.left(p) == Some(old) {
                    self.nodes[p].left = new;
                } else {
                    self.nodes[p].right = new;
                }
            }
        }
        if let Some(n) = new {
            self.nodes[n].parent = parent;
        }
    }

    fn rotate_left(&mut self, x: NodeId) {
        let Some(y) = self.right(x) else { return };
        let y_left = self.left(y);
        self.nodes[x].right = y_left;
        if let Some(yl) = y_left {
            self.nodes[yl].parent = Some(x);
        }
        self.replace_child(Some(y), x);
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);
    }

    fn rotate_right(&mut self, x: NodeId) {
        let Some(y) = self.left(x) else { return };
        let y_right = self.right(y);
        self.nodes[x].left = y_right;
        if let Some(yr) = y_right {
            self.nodes[yr].parent = Some(x);
        }
        self.replace_child(Some(y), x);
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);
    }

    // ── Insert ───────────────────────────────────────────────

    /// Insert a new pair. Existing keys are never overwritten.
    pub fn insert(&mut self, key: K, value: V) -> Result<(), IndexError> {
        let mut parent = None;
        let mut go_left = false;
        let mut cur = self.root;
        while let Some(n) = cur {
            parent = Some(n);
            match key.cmp(&self.nodes[n].key) {
                Ordering::Less => {
                    go_left = true;
                    cur = self.left(n);
                }
                Ordering::Greater => {
                    go_left = false;
                    cur = self.right(n);
                }
                Ordering::Equal => return Err(IndexError::DuplicateKey),
            }
        }

        let id = self.nodes.len();
        self.nodes.push(Node {
            key,
            value,
            color: Color::Red,
            parent,
            left: None,
            right: None,
        });
        match parent {
            None => self.root = Some(id),
            Some(p) if go_left => self.nodes[p].left = Some(id),
            Some(p) => self.nodes[p].right = Some(id),
        }
        self.insert_fixup(id);
        Ok(())
    }

    fn insert_fixup(&mut self, mut z: NodeId) {
        loop {
            let Some(p) = self.parent(z) else { break };
            if self.is_black(Some(p)) {
                break;
            }
            // A red parent is never the root, so the grandparent exists.
            let Some(g) = self.parent(p) else { break };

            if self.left(g) == Some(p) {
                let uncle = self.right(g);
                if self.is_red(uncle) {
                    self.set_color(Some(p), Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(Some(g), Color::Red);
                    z = g;
                    continue;
                }
                if self.right(p) == Some(z) {
                    z = p;
                    self.rotate_left(z);
                }
                let Some(p) = self.parent(z) else { break };
                let Some(g) = self.parent(p) else { break };
                self.set_color(Some(p), Color::Black);
                self.set_color(Some(g), Color::Red);
                self.rotate_right(g);
            } else {
                let uncle = self.left(g);
                if self.is_red(uncle) {
                    self.set_color(Some(p), Color::Black);
                    self.set_color(uncle, Color::Black);
                    self.set_color(Some(g), Color::Red);
                    z = g;
                    continue;
                }
                if self.left(p) == Some(z) {
                    z = p;
                    self.rotate_right(z);
                }
                let Some(p) = self.parent(z) else { break };
                let Some(g) = self.parent(p) else { break };
                self.set_color(Some(p), Color::Black);
                self.set_color(Some(g), Color::Red);
                self.rotate_left(g);
            }
        }
        let root = self.root;
        self.set_color(root, Color::Black);
    }

    // ── Delete ───────────────────────────────────────────────

    /// Remove `key`, returning its value. `None` if the key is absent.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        let z = self.find(key)?;

        // The node physically unlinked: z itself, or its in-order successor
        // when z has two children.
        let splice = match (self.left(z), self.right(z)) {
            (Some(_), Some(r)) => self.subtree_min(r),
            _ => z,
        };
        let child = self.left(splice).or(self.right(splice));
        // Where `child` hangs once the splice is done. If the successor is z's
        // direct child it takes z's place, so the child stays under it.
        let child_parent = if splice != z && self.parent(splice) == Some(z) {
            Some(splice)
        } else {
            self.parent(splice)
        };

        let removed_black = self.nodes[splice].color == Color::Black;
        self.replace_child(child, splice);

        if splice != z {
            self.transplant(splice, z);
        }
        if removed_black {
            self.delete_fixup(child, child_parent);
        }

        Some(self.release(z).value)
    }

    /// Move `src` (already unlinked) into `dst`'s position, taking its colour.
    fn transplant(&mut self, src: NodeId, dst: NodeId) {
        self.replace_child(Some(src), dst);
        let (left, right, color) = {
            let d = &self.nodes[dst];
            (d.left, d.right, d.color)
        };
        self.nodes[src].left = left;
        self.nodes[src].right = right;
        self.nodes[src].color = color;
        if let Some(l) = left {
            self.nodes[l].parent = Some(src);
        }
        if let Some(r) = right {
            self.nodes[r].parent = Some(src);
        }
    }

    /// Restore black height after a black node was removed above `x`.
    fn delete_fixup(&mut self, mut x: Option<NodeId>, mut parent: Option<NodeId>) {
        while let Some(p) = parent {
            if self.is_red(x) {
                break;
            }
            if x == self.left(p) {
                let Some(mut w) = self.right(p) else { break };
                if self.is_red(Some(w)) {
                    self.set_color(Some(w), Color::Black);
                    self.set_color(Some(p), Color::Red);
                    self.rotate_left(p);
                    let Some(next) = self.right(p) else { break };
                    w = next;
                }
                if self.is_black(self.left(w)) && self.is_black(self.right(w)) {
                    self.set_color(Some(w), Color::Red);
                    x = Some(p);
                    parent = self.parent(p);
                    continue;
                }
                if self.is_black(self.right(w)) {
                    let wl = self.left(w);
                    self.set_color(wl, Color::Black);
                    self.set_color(Some(w), Color::Red);
                    self.rotate_right(w);
                    let Some(next) = self.right(p) else { break };
                    w = next;
                }
                let p_color = self.nodes[p].color;
                self.nodes[w].color = p_color;
                self.set_color(Some(p), Color::Black);
                let wr = self.right(w);
                self.set_color(wr, Color::Black);
                self.rotate_left(p);
            } else {
                let Some(mut w) = self.left(p) else { break };
                if self.is_red(Some(w)) {
                    self.set_color(Some(w), Color::Black);
                    self.set_color(Some(p), Color::Red);
                    self.rotate_right(p);
                    let Some(next) = self.left(p) else { break };
                    w = next;
                }
                if self.is_black(self.right(w)) && self.is_black(self.left(w)) {
                    self.set_color(Some(w), Color::Red);
                    x = Some(p);
                    parent = self.parent(p);
                    continue;
                }
                if self.is_black(self.left(w)) {
                    let wr = self.right(w);
                    self.set_color(wr, Color::Black);
                    self.set_color(Some(w), Color::Red);
                    self.rotate_left(w);
                    let Some(next) = self.left(p) else { break };
                    w = next;
                }
                let p_color = self.nodes[p].color;
                self.nodes[w].color = p_color;
                self.set_color(Some(p), Color::Black);
                let wl = self.left(w);
                self.set_color(wl, Color::Black);
                self.rotate_right(p);
            }
            x = self.root;
            break;
        }
        self.set_color(x, Color::Black);
    }

    /// Reclaim the slot of a node that is no longer linked into the tree.
    fn release(&mut self, id: NodeId) -> Node<K, V> {
        let last = self.nodes.len() - 1;
        let node = self.nodes.swap_remove(id);
        if id != last {
            // The former last node now lives at `id`.
            match self.nodes[id].parent {
                None => self.root = Some(id),
                Some(p) => {
                    if self.nodes[p].left == Some(last) {
                        self.nodes[p].left = Some(id);
                    } else {
                        self.nodes[p].right = Some(id);
                    }
                }
            }
            if let Some(l) = self.nodes[id].left {
                self.nodes[l].parent = Some(id);
            }
            if let Some(r) = self.nodes[id].right {
                self.nodes[r].parent = Some(id);
            }
        }
        node
    }

    // ── Traversal ────────────────────────────────────────────

    /// Lazy ascending-by-key traversal.
    pub fn iter(&self) -> Iter<'_, K, V> {
        let mut iter = Iter {
            index: self,
            stack: Vec::new(),
        };
        iter.push_left_spine(self.root);
        iter
    }

    /// Entries with keys in `[low, high]`, ascending. Visits only the
    /// subtrees that can intersect the range.
    pub fn range(&self, low: &K, high: &K) -> Vec<(&K, &V)> {
        let mut out = Vec::new();
        if low <= high {
            self.collect_range(self.root, low, high, &mut out);
        }
        out
    }

    fn collect_range<'a>(&'a self, id: Option<NodeId>, low: &K, high: &K, out: &mut Vec<(&'a K, &'a V)>) {
        let Some(n) = id else { return };
        let node = &self.nodes[n];
        if &node.key > low {
            self.collect_range(node.left, low, high, out);
        }
        if &node.key >= low && &node.key <= high {
            out.push((&node.key, &node.value));
        }
        if &node.key < high {
            self.collect_range(node.right, low, high, out);
        }
    }
}

impl<K: Ord + Clone, V> OrderedIndex<K, V> {
    /// Delete every key in `[low, high]`, returning the removed pairs ascending by key.
    pub fn remove_range(&mut self, low: &K, high: &K) -> Vec<(K, V)> {
        let keys: Vec<K> = self.range(low, high).into_iter().map(|(k, _)| k.clone()).collect();
        keys.into_iter()
            .filter_map(|k| self.delete(&k).map(|v| (k, v)))
            .collect()
    }
}

pub struct Iter<'a, K, V> {
    index: &'a OrderedIndex<K, V>,
    stack: Vec<NodeId>,
}

impl<K, V> Iter<'_, K, V> {
    fn push_left_spine(&mut self, mut id: Option<NodeId>) {
        while let Some(n) = id {
            self.stack.push(n);
            id = self.index.nodes[n].left;
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let n = self.stack.pop()?;
        let node = &self.index.nodes[n];
        self.push_left_spine(node.right);
        Some((&node.key, &node.value))
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a OrderedIndex<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
impl<K: Ord + std::fmt::Debug, V> OrderedIndex<K, V> {
    /// Validate colouring, black height, key order and parent links.
    /// Returns the tree's black height.
    pub(crate) fn check_invariants(&self) -> Result<usize, String> {
        if self.is_red(self.root) {
            return Err("root is red".into());
        }
        if self.root.is_some_and(|r| self.parent(r).is_some()) {
            return Err("root has a parent".into());
        }
        let (height, count) = self.check_subtree(self.root, None, None)?;
        if count != self.nodes.len() {
            return Err(format!("{} nodes reachable, {} in arena", count, self.nodes.len()));
        }
        Ok(height)
    }

    fn check_subtree(&self, id: Option<NodeId>, low: Option<&K>, high: Option<&K>) -> Result<(usize, usize), String> {
        let Some(n) = id else { return Ok((1, 0)) };
        let node = &self.nodes[n];
        if low.is_some_and(|l| &node.key <= l) || high.is_some_and(|h| &node.key >= h) {
            return Err(format!("key {:?} out of order", node.key));
        }
        for child in [node.left, node.right].into_iter().flatten() {
            if self.nodes[child].parent != Some(n) {
                return Err(format!("broken parent link under {:?}", node.key));
            }
        }
        if node.color == Color::Red && (self.is_red(node.left) || self.is_red(node.right)) {
            return Err(format!("red node {:?} has a red child", node.key));
        }
        let (lh, lc) = self.check_subtree(node.left, low, Some(&node.key))?;
        let (rh, rc) = self.check_subtree(node.right, Some(&node.key), high)?;
        if lh != rh {
            return Err(format!("black height mismatch at {:?}: {lh} vs {rh}", node.key));
        }
        let own = usize::from(node.color == Color::Black);
        Ok((lh + own, lc + rc + 1))
    }

    pub(crate) fn height(&self) -> usize {
        fn depth<K, V>(nodes: &[Node<K, V>], id: Option<NodeId>) -> usize {
            id.map_or(0, |n| 1 + depth(nodes, nodes[n].left).max(depth(nodes, nodes[n].right)))
        }
        depth(&self.nodes, self.root)
    }
}
