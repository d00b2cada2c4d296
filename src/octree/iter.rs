use crate::shared::{Float, PointMass};

use super::node::Node;

/// Level-by-level walk over a subtree. Nodes come out in nondecreasing depth,
/// siblings in octant order.
pub struct NodeIterator<'a, F: Float, P: PointMass<F>> {
    current: Vec<&'a Node<F, P>>,
    next: Vec<&'a Node<F, P>>,
    current_index: usize,
}

impl<'a, F: Float, P: PointMass<F>> Iterator for NodeIterator<'a, F, P> {
    type Item = &'a Node<F, P>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_index < self.current.len() {
            let node = self.current[self.current_index];
            if let Some(children) = node.children() {
                self.next.extend(children.iter());
            }
            self.current_index += 1;
            Some(node)
        } else if self.next.is_empty() {
            None
        } else {
            self.current = std::mem::take(&mut self.next);
            self.current_index = 0;
            self.next()
        }
    }
}

impl<'a, F: Float, P: PointMass<F>> IntoIterator for &'a Node<F, P> {
    type Item = &'a Node<F, P>;
    type IntoIter = NodeIterator<'a, F, P>;

    fn into_iter(self) -> Self::IntoIter {
        NodeIterator {
            current: vec![self],
            next: Vec::new(),
            current_index: 0,
        }
    }
}
