//! A narrow, read-mostly view over the underlying Markdown AST.
//!
//! Wraps `comrak`'s arena tree so the rest of the crate only ever sees the
//! capability set the compiler actually needs: kind, parent, first child,
//! next sibling, literal text, unlink, and one attached directive slot.
//! `comrak::nodes::AstNode` carries no user-data slot of its own, so the
//! directive attachment is a side map keyed by node pointer identity,
//! owned by the [`DirectiveMap`] for the whole document.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use comrak::nodes::{AstNode, NodeValue};

use crate::diagnostic::NodeSpan;
use crate::directive::Directive;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Document,
    Paragraph,
    Heading,
    BlockQuote,
    Code,
    Link,
    Image,
    Other,
}

/// Per-document attached-directive table, keyed by AST node identity.
#[derive(Debug, Default)]
pub struct DirectiveMap {
    attached: RefCell<HashMap<usize, Rc<RefCell<Directive>>>>,
}

impl DirectiveMap {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn node_id(ast: &AstNode<'_>) -> usize {
    std::ptr::from_ref(ast) as usize
}

/// Read-mostly handle onto one AST node.
#[derive(Clone, Copy)]
pub struct Node<'a, 'm> {
    ast: &'a AstNode<'a>,
    directives: &'m DirectiveMap,
}

impl<'a, 'm> Node<'a, 'm> {
    #[must_use]
    pub fn new(ast: &'a AstNode<'a>, directives: &'m DirectiveMap) -> Self {
        Self { ast, directives }
    }

    #[must_use]
    pub fn kind(&self) -> NodeKind {
        match &self.ast.data.borrow().value {
            NodeValue::Document => NodeKind::Document,
            NodeValue::Paragraph => NodeKind::Paragraph,
            NodeValue::Heading(_) => NodeKind::Heading,
            NodeValue::BlockQuote => NodeKind::BlockQuote,
            NodeValue::Code(_) => NodeKind::Code,
            NodeValue::Link(_) => NodeKind::Link,
            NodeValue::Image(_) => NodeKind::Image,
            _ => NodeKind::Other,
        }
    }

    #[must_use]
    pub fn parent(&self) -> Option<Node<'a, 'm>> {
        self.ast.parent().map(|p| Node::new(p, self.directives))
    }

    #[must_use]
    pub fn first_child(&self) -> Option<Node<'a, 'm>> {
        self.ast.first_child().map(|c| Node::new(c, self.directives))
    }

    #[must_use]
    pub fn next_sibling(&self) -> Option<Node<'a, 'm>> {
        self.ast.next_sibling().map(|s| Node::new(s, self.directives))
    }

    #[must_use]
    pub fn is_first_child_of_parent(&self) -> bool {
        match self.parent().and_then(|p| p.first_child()) {
            Some(first) => std::ptr::eq(first.ast, self.ast),
            None => false,
        }
    }

    /// Literal text for inline `Code` and `Text` nodes; `None` otherwise.
    #[must_use]
    pub fn literal(&self) -> Option<String> {
        match &self.ast.data.borrow().value {
            NodeValue::Code(c) => Some(c.literal.clone()),
            NodeValue::Text(t) => Some(t.clone()),
            _ => None,
        }
    }

    #[must_use]
    pub fn span(&self) -> NodeSpan {
        self.ast.data.borrow().sourcepos.into()
    }

    /// Link destination, for `Link` nodes.
    #[must_use]
    pub fn link_url(&self) -> Option<String> {
        match &self.ast.data.borrow().value {
            NodeValue::Link(l) => Some(l.url.clone()),
            _ => None,
        }
    }

    /// Detaches this node (and its subtree) from the document.
    pub fn unlink(&self) {
        self.ast.detach();
    }

    pub fn attach_directive(&self, directive: Rc<RefCell<Directive>>) {
        self.directives
            .attached
            .borrow_mut()
            .insert(node_id(self.ast), directive);
    }

    #[must_use]
    pub fn directive(&self) -> Option<Rc<RefCell<Directive>>> {
        self.directives
            .attached
            .borrow()
            .get(&node_id(self.ast))
            .cloned()
    }
}

/// Depth-first preorder iterator over an AST subtree.
pub struct Preorder<'a, 'm> {
    stack: Vec<Node<'a, 'm>>,
}

impl<'a, 'm> Preorder<'a, 'm> {
    #[must_use]
    pub fn new(root: Node<'a, 'm>) -> Self {
        Self { stack: vec![root] }
    }
}

impl<'a, 'm> Iterator for Preorder<'a, 'm> {
    type Item = Node<'a, 'm>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        let mut children = vec![];
        let mut child = node.first_child();
        while let Some(c) = child {
            child = c.next_sibling();
            children.push(c);
        }
        children.reverse();
        self.stack.extend(children);
        Some(node)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comrak::{Arena, Options};

    #[test]
    fn preorder_visits_document_before_children() {
        let arena = Arena::new();
        let root = comrak::parse_document(&arena, "# Title\n\nbody\n", &Options::default());
        let directives = DirectiveMap::new();
        let node = Node::new(root, &directives);
        let kinds: Vec<_> = Preorder::new(node).map(|n| n.kind()).collect();
        assert_eq!(kinds[0], NodeKind::Document);
        assert!(kinds.contains(&NodeKind::Heading));
        assert!(kinds.contains(&NodeKind::Paragraph));
    }

    #[test]
    fn attach_and_read_back_directive() {
        use crate::directive::{Directive, Kind};

        let arena = Arena::new();
        let root = comrak::parse_document(&arena, "body\n", &Options::default());
        let directives = DirectiveMap::new();
        let node = Node::new(root, &directives);
        assert!(node.directive().is_none());
        node.attach_directive(Rc::new(RefCell::new(Directive::new(Kind::Text))));
        assert!(node.directive().is_some());
    }
}
