//! DOM tree implementation for the mordant style inliner.
//!
//! This crate provides an arena-based DOM tree structure following the
//! [DOM Living Standard](https://dom.spec.whatwg.org/).
//!
//! # Design
//!
//! The tree uses arena allocation with [`NodeId`] indices for all relationships,
//! providing O(1) access and traversal without borrow checker issues. Nodes
//! removed from the tree stay in the arena but are no longer reachable from
//! [`NodeId::ROOT`].
//!
//! Attributes are kept in source order so that serializing a parsed document
//! reproduces the author's attribute layout.

mod serializer;

pub use serializer::{serialize, serialize_node};

/// A single attribute on an element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name, lowercased by the HTML parser.
    pub name: String,
    /// Attribute value. Boolean attributes carry an empty value.
    pub value: String,
}

/// Ordered attribute list for an element.
///
/// [§ 4.9.2 Attr](https://dom.spec.whatwg.org/#concept-element-attribute)
///
/// "An element has an associated ordered attribute list."
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeList {
    entries: Vec<Attribute>,
}

impl AttributeList {
    /// Create an empty attribute list.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Get an attribute value by name (ASCII case-insensitive).
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
            .map(|a| a.value.as_str())
    }

    /// Check whether an attribute is present.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// [§ 4.9 set an attribute value](https://dom.spec.whatwg.org/#concept-element-attributes-set-value)
    ///
    /// Replaces the value in place when the attribute exists, otherwise
    /// appends a new attribute at the end of the list.
    pub fn set(&mut self, name: &str, value: impl Into<String>) {
        let value = value.into();
        if let Some(existing) = self
            .entries
            .iter_mut()
            .find(|a| a.name.eq_ignore_ascii_case(name))
        {
            existing.value = value;
        } else {
            self.entries.push(Attribute {
                name: name.to_string(),
                value,
            });
        }
    }

    /// Keep only the attributes for which `keep` returns true.
    pub fn retain(&mut self, mut keep: impl FnMut(&Attribute) -> bool) {
        self.entries.retain(|a| keep(a));
    }

    /// Iterate over attributes in document order.
    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    /// Number of attributes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the element has no attributes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<N: Into<String>, V: Into<String>> FromIterator<(N, V)> for AttributeList {
    fn from_iter<T: IntoIterator<Item = (N, V)>>(iter: T) -> Self {
        let mut list = Self::new();
        for (name, value) in iter {
            list.set(&name.into(), value);
        }
        list
    }
}

/// A type-safe index into the DOM tree.
///
/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
/// "Each node has an associated node document..."
///
/// NodeId provides O(1) access to any node in the tree without borrowing issues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub usize);

impl NodeId {
    /// The root document node is always at index 0.
    pub const ROOT: Self = Self(0);
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Node is an abstract interface that is used by all nodes in a tree."
///
/// This node stores indices for parent/child/sibling relationships,
/// enabling O(1) traversal in any direction.
#[derive(Debug, Clone)]
pub struct Node {
    /// "Each node has an associated node type"
    pub node_type: NodeType,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-parent)
    /// "An object that participates in a tree has a parent, which is either
    /// null or an object."
    pub parent: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-child)
    /// "A node has an associated list of children"
    pub children: Vec<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-next-sibling)
    pub next_sibling: Option<NodeId>,

    /// [§ 4.4](https://dom.spec.whatwg.org/#concept-tree-previous-sibling)
    pub prev_sibling: Option<NodeId>,
}

/// [§ 4.4 Interface Node](https://dom.spec.whatwg.org/#interface-node)
///
/// "Each node has an associated node type"
#[derive(Debug, Clone)]
pub enum NodeType {
    /// [§ 4.5 Interface Document](https://dom.spec.whatwg.org/#interface-document)
    Document,
    /// [§ 4.6 Interface DocumentType](https://dom.spec.whatwg.org/#interface-documenttype)
    ///
    /// "Doctypes have an associated name, public ID, and system ID."
    Doctype {
        /// Doctype name, usually `html`.
        name: String,
        /// Public identifier, empty when absent.
        public_id: String,
        /// System identifier, empty when absent.
        system_id: String,
    },
    /// [§ 4.9 Interface Element](https://dom.spec.whatwg.org/#interface-element)
    Element(ElementData),
    /// [§ 4.10 Interface Text](https://dom.spec.whatwg.org/#interface-text)
    Text(String),
    /// [§ 4.7 Interface Comment](https://dom.spec.whatwg.org/#interface-comment)
    Comment(String),
}

/// Element-specific data.
///
/// NOTE: We only store tag_name (local name) and attrs. Namespaces are
/// dropped by the parser; foreign content such as inline SVG keeps its
/// local names, which is all the selector engine looks at.
#[derive(Debug, Clone)]
pub struct ElementData {
    /// "An element's local name"
    pub tag_name: String,
    /// "An element has an associated attribute list"
    pub attrs: AttributeList,
}

impl ElementData {
    /// Create element data with no attributes.
    #[must_use]
    pub fn new(tag_name: &str) -> Self {
        Self {
            tag_name: tag_name.to_string(),
            attrs: AttributeList::new(),
        }
    }

    /// Returns the element's id attribute value if present.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id")
    }

    /// Returns the class names from the class attribute, in attribute order.
    ///
    /// Per [§ 3.2.6 Global attributes](https://html.spec.whatwg.org/multipage/dom.html#global-attributes):
    /// "The class attribute, if specified, must have a value that is a set of
    /// space-separated tokens representing the various classes that the element belongs to."
    pub fn classes(&self) -> impl Iterator<Item = &str> {
        self.attrs
            .get("class")
            .unwrap_or_default()
            .split_ascii_whitespace()
    }

    /// Whether the class attribute contains `class_name`.
    #[must_use]
    pub fn has_class(&self, class_name: &str) -> bool {
        self.classes().any(|c| c == class_name)
    }

    /// Whether this element has the given local name (ASCII case-insensitive).
    #[must_use]
    pub fn is(&self, tag_name: &str) -> bool {
        self.tag_name.eq_ignore_ascii_case(tag_name)
    }
}

/// Arena-based DOM tree with O(1) node access and traversal.
///
/// [§ 4 Nodes](https://dom.spec.whatwg.org/#nodes)
///
/// "The DOM represents a document as a tree. A tree is a finite hierarchical
/// tree structure."
#[derive(Debug, Clone)]
pub struct DomTree {
    /// All nodes in the tree, indexed by NodeId.
    /// The Document node is always at index 0 (NodeId::ROOT).
    nodes: Vec<Node>,
}

impl DomTree {
    /// Create a new DOM tree with just the Document node.
    #[must_use]
    pub fn new() -> Self {
        let document = Node {
            node_type: NodeType::Document,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        };
        Self {
            nodes: vec![document],
        }
    }

    /// Get the root document node ID.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        NodeId::ROOT
    }

    /// Get a node by its ID.
    #[must_use]
    pub fn get(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    /// Get a mutable reference to a node by its ID.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    /// Number of nodes in the arena, including detached ones.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the tree is empty (should always have at least the Document).
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Allocate a new node and return its ID.
    /// The node is not yet attached to the tree.
    pub fn alloc(&mut self, node_type: NodeType) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            node_type,
            parent: None,
            children: Vec::new(),
            next_sibling: None,
            prev_sibling: None,
        });
        id
    }

    /// Allocate a detached element with no attributes.
    pub fn create_element(&mut self, tag_name: &str) -> NodeId {
        self.alloc(NodeType::Element(ElementData::new(tag_name)))
    }

    /// Allocate a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        self.alloc(NodeType::Text(text.to_string()))
    }

    /// [§ 4.2.2 Append](https://dom.spec.whatwg.org/#concept-node-append)
    ///
    /// "To append a node to a parent, pre-insert node into parent before null."
    ///
    /// Appends `child` as the last child of `parent`, updating all relationships.
    /// The child is detached from its previous parent first.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.detach(child);
        let prev_last_child = self.nodes[parent.0].children.last().copied();

        self.nodes[parent.0].children.push(child);
        self.nodes[child.0].parent = Some(parent);

        if let Some(prev_id) = prev_last_child {
            self.nodes[prev_id.0].next_sibling = Some(child);
            self.nodes[child.0].prev_sibling = Some(prev_id);
        }
    }

    /// [§ 4.2.3 Pre-insert](https://dom.spec.whatwg.org/#concept-node-pre-insert)
    ///
    /// Inserts `child` into `parent` immediately before `reference`. When
    /// `reference` is not a child of `parent` this behaves like
    /// [`DomTree::append_child`].
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.detach(child);
        let Some(index) = self.nodes[parent.0]
            .children
            .iter()
            .position(|&id| id == reference)
        else {
            self.append_child(parent, child);
            return;
        };

        self.nodes[parent.0].children.insert(index, child);
        self.nodes[child.0].parent = Some(parent);
        self.relink_siblings(parent);
    }

    /// [§ 4.2.3 Remove](https://dom.spec.whatwg.org/#concept-node-remove)
    ///
    /// Removes `child` from `parent`. The removed node keeps its own
    /// subtree but has no parent or siblings afterwards.
    pub fn remove_child(&mut self, parent: NodeId, child: NodeId) {
        let before = self.nodes[parent.0].children.len();
        self.nodes[parent.0].children.retain(|&id| id != child);
        if self.nodes[parent.0].children.len() == before {
            return;
        }
        let node = &mut self.nodes[child.0];
        node.parent = None;
        node.prev_sibling = None;
        node.next_sibling = None;
        self.relink_siblings(parent);
    }

    /// Remove a node from whatever parent it currently has.
    pub fn detach(&mut self, id: NodeId) {
        if let Some(parent) = self.parent(id) {
            self.remove_child(parent, id);
        }
    }

    /// Replace `id` with its own children, keeping their order.
    ///
    /// Used to strip presentational wrappers without losing content.
    pub fn unwrap(&mut self, id: NodeId) {
        let Some(parent) = self.parent(id) else {
            return;
        };
        let children = std::mem::take(&mut self.nodes[id.0].children);
        for child in children {
            self.nodes[child.0].parent = None;
            self.insert_before(parent, child, id);
        }
        self.remove_child(parent, id);
    }

    fn relink_siblings(&mut self, parent: NodeId) {
        let children = self.nodes[parent.0].children.clone();
        for (i, &id) in children.iter().enumerate() {
            let prev = i.checked_sub(1).map(|p| children[p]);
            let next = children.get(i + 1).copied();
            let node = &mut self.nodes[id.0];
            node.prev_sibling = prev;
            node.next_sibling = next;
        }
    }

    /// Get the parent of a node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Get all children of a node.
    #[must_use]
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// Get the first child of a node.
    #[must_use]
    pub fn first_child(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.children.first().copied())
    }

    /// Get the next sibling of a node.
    #[must_use]
    pub fn next_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.next_sibling)
    }

    /// Get the previous sibling of a node.
    #[must_use]
    pub fn prev_sibling(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.prev_sibling)
    }

    /// Iterate over all ancestors of a node, from parent to root.
    #[must_use]
    pub fn ancestors(&self, id: NodeId) -> AncestorIterator<'_> {
        AncestorIterator {
            tree: self,
            current: self.parent(id),
        }
    }

    /// Iterate over preceding siblings (from immediately before to first child).
    #[must_use]
    pub fn preceding_siblings(&self, id: NodeId) -> PrecedingSiblingIterator<'_> {
        PrecedingSiblingIterator {
            tree: self,
            current: self.prev_sibling(id),
        }
    }

    /// [§ 4.2.6 Tree order](https://dom.spec.whatwg.org/#concept-tree-order)
    ///
    /// "Tree order is preorder, depth-first traversal of a tree."
    ///
    /// Iterate over `id` and all of its descendants in tree order.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> DescendantIterator<'_> {
        DescendantIterator {
            tree: self,
            stack: vec![id],
        }
    }

    /// All elements attached to the document, in tree order.
    pub fn elements(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.descendants(NodeId::ROOT)
            .filter(|&id| self.as_element(id).is_some())
    }

    /// All attached elements with the given local name, in tree order.
    pub fn elements_by_tag_name<'a>(
        &'a self,
        tag_name: &'a str,
    ) -> impl Iterator<Item = NodeId> + 'a {
        self.elements()
            .filter(move |&id| self.as_element(id).is_some_and(|e| e.is(tag_name)))
    }

    /// Get element data if this node is an element.
    #[must_use]
    pub fn as_element(&self, id: NodeId) -> Option<&ElementData> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get mutable element data if this node is an element.
    pub fn as_element_mut(&mut self, id: NodeId) -> Option<&mut ElementData> {
        self.get_mut(id).and_then(|n| match &mut n.node_type {
            NodeType::Element(data) => Some(data),
            _ => None,
        })
    }

    /// Get text content if this node is a text node.
    #[must_use]
    pub fn as_text(&self, id: NodeId) -> Option<&str> {
        self.get(id).and_then(|n| match &n.node_type {
            NodeType::Text(s) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Read an attribute of an element node.
    #[must_use]
    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.as_element(id).and_then(|e| e.attrs.get(name))
    }

    /// Set an attribute on an element node. Non-element nodes are ignored.
    pub fn set_attribute(&mut self, id: NodeId, name: &str, value: impl Into<String>) {
        if let Some(element) = self.as_element_mut(id) {
            element.attrs.set(name, value);
        }
    }

    /// [§ 4.4 textContent](https://dom.spec.whatwg.org/#dom-node-textcontent)
    ///
    /// Concatenation of the data of all text node descendants, in tree order.
    #[must_use]
    pub fn text_content(&self, id: NodeId) -> String {
        self.descendants(id)
            .filter_map(|n| self.as_text(n))
            .collect()
    }

    /// [§ 3.1.1 The document element](https://html.spec.whatwg.org/multipage/dom.html#the-html-element-2)
    ///
    /// "The document element of a document is the element whose parent is that
    /// document, if it exists; otherwise null."
    #[must_use]
    pub fn document_element(&self) -> Option<NodeId> {
        self.children(NodeId::ROOT)
            .iter()
            .find(|&&id| self.as_element(id).is_some())
            .copied()
    }

    /// [§ 3.1.4 The head element](https://html.spec.whatwg.org/multipage/dom.html#the-head-element-2)
    ///
    /// "The head element of a document is the first head element that is a
    /// child of the html element, if there is one, or null otherwise."
    #[must_use]
    pub fn head(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, &["head"])
    }

    /// [§ 3.1.3 The body element](https://html.spec.whatwg.org/multipage/dom.html#the-body-element-2)
    ///
    /// "The body element of a document is the first of the html element's children
    /// that is either a body element or a frameset element, or null if there is
    /// no such element."
    #[must_use]
    pub fn body(&self) -> Option<NodeId> {
        self.child_element(self.document_element()?, &["body", "frameset"])
    }

    fn child_element(&self, parent: NodeId, tags: &[&str]) -> Option<NodeId> {
        self.children(parent)
            .iter()
            .find(|&&id| {
                self.as_element(id)
                    .is_some_and(|e| tags.iter().any(|t| e.is(t)))
            })
            .copied()
    }
}

impl Default for DomTree {
    fn default() -> Self {
        Self::new()
    }
}

/// Iterator over ancestors of a node.
pub struct AncestorIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for AncestorIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.parent(id);
        Some(id)
    }
}

/// Iterator over preceding siblings of a node.
pub struct PrecedingSiblingIterator<'a> {
    tree: &'a DomTree,
    current: Option<NodeId>,
}

impl Iterator for PrecedingSiblingIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.current?;
        self.current = self.tree.prev_sibling(id);
        Some(id)
    }
}

/// Preorder iterator over a subtree.
pub struct DescendantIterator<'a> {
    tree: &'a DomTree,
    stack: Vec<NodeId>,
}

impl Iterator for DescendantIterator<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        self.stack
            .extend(self.tree.children(id).iter().rev().copied());
        Some(id)
    }
}
