use std::collections::{BTreeMap, BTreeSet};

/// Which members of an object, and recursively of its object-valued members,
/// were present in the input.
///
/// Only produced when [`JsonOptions::include_return_graph`] is set. A member
/// that was present with the value `null` is still recorded.
///
/// [`JsonOptions::include_return_graph`]: crate::JsonOptions::include_return_graph
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Graph {
    members: BTreeSet<String>,
    children: BTreeMap<String, Graph>,
}

impl Graph {
    pub fn new() -> Self {
        Graph::default()
    }

    pub fn add_member(&mut self, name: &str) {
        self.members.insert(name.to_owned());
    }

    /// Records `name` as present and attaches the graph of its value.
    pub fn add_child(&mut self, name: &str, child: Graph) {
        self.add_member(name);
        self.children.insert(name.to_owned(), child);
    }

    pub fn has_member(&self, name: &str) -> bool {
        self.members.contains(name)
    }

    pub fn child(&self, name: &str) -> Option<&Graph> {
        self.children.get(name)
    }

    /// Present member names in sorted order.
    pub fn members(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_child_implies_member() {
        let mut inner = Graph::new();
        inner.add_member("City");
        let mut graph = Graph::new();
        graph.add_member("Name");
        graph.add_child("Address", inner);

        assert!(graph.has_member("Address"));
        assert!(graph.child("Address").unwrap().has_member("City"));
        assert!(graph.child("Name").is_none());
        assert_eq!(graph.members().collect::<Vec<_>>(), ["Address", "Name"]);
    }
}
