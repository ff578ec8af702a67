//! Emission state for the post-order traversal
//!
//! Tracks, per node identity, how far the traversal got with it.

use std::fmt;
use std::marker::PhantomData;

use hashbrown::HashMap;

/// Identity of a node: its address.
///
/// Two nodes with identical operator and operands are still two nodes, so
/// structural equality is never used here. Zero-sized node types have no
/// usable identity and are not supported.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeKey(usize);

impl NodeKey {
    #[inline]
    pub fn of<N>(node: &N) -> Self {
        NodeKey(node as *const N as usize)
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

/// Traversal colour of a node.
///
/// Colours only ever advance: `Unseen` → `Emitting` → `Emitted`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Colour {
    /// Never visited. Not stored; absence from the map means `Unseen`.
    Unseen,
    /// On the work stack, operands still being explored.
    Emitting,
    /// Done; the node and all of its operands are in the output.
    Emitted,
}

/// Colour store shared by one or more root traversals.
///
/// The lifetime ties the map to the node borrows it was filled from, so the
/// nodes cannot be freed (and their addresses reused) while the map lives.
/// Entries are never removed.
#[derive(Debug, Default)]
pub struct EmissionMap<'a> {
    colours: HashMap<NodeKey, Colour>,
    _nodes: PhantomData<&'a ()>,
}

impl<'a> EmissionMap<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            colours: HashMap::with_capacity(capacity),
            _nodes: PhantomData,
        }
    }

    /// Stored colour of `node`; `None` when it was never visited.
    #[inline]
    pub fn get<N>(&self, node: &N) -> Option<Colour> {
        self.colours.get(&NodeKey::of(node)).copied()
    }

    /// Colour of `node`, with absence reported as [`Colour::Unseen`].
    #[inline]
    pub fn colour<N>(&self, node: &N) -> Colour {
        self.get(node).unwrap_or(Colour::Unseen)
    }

    /// Advance `node` to `colour`.
    #[inline]
    pub fn set<N>(&mut self, node: &'a N, colour: Colour) {
        let previous = self.colours.insert(NodeKey::of(node), colour);
        debug_assert!(
            colour > previous.unwrap_or(Colour::Unseen),
            "colour of {} moved from {:?} to {:?}",
            NodeKey::of(node),
            previous,
            colour
        );
    }

    #[inline]
    pub fn is_emitted<N>(&self, node: &N) -> bool {
        self.get(node) == Some(Colour::Emitted)
    }

    /// Number of nodes visited so far, finished or not.
    #[inline]
    pub fn len(&self) -> usize {
        self.colours.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.colours.is_empty()
    }

    /// Number of nodes already emitted.
    pub fn emitted_count(&self) -> usize {
        self.colours
            .values()
            .filter(|&&c| c == Colour::Emitted)
            .count()
    }
}
