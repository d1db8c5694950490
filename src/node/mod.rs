//! The push/pull node contracts and the arena-backed graph that drives
//! them.
//!
//! The original design keeps children in growable per-node lists and
//! merges pipelines by walking both trees together, comparing nodes by
//! value. Rather than a reference-counted graph of trait objects calling
//! into each other, nodes live in an arena ([`Graph`]) addressed by
//! stable [`NodeId`]s, and the *driver* (the arena itself, ultimately
//! owned by [`crate::graph::Pump`]) performs the recursive DFS dispatch.
//! A node's [`PushNode::process_self`] only describes what it emits and
//! to which child slot; it never calls a child directly. This keeps
//! mutable-borrow bookkeeping in one place and makes structural equality
//! (used for merging, see [`crate::graph`]) a property the driver can
//! check without downcasting trait objects.

pub mod aggregate;
pub mod bandsplit;
pub mod channel;
pub mod downmix;
pub mod fft_nodes;
pub mod framefilter;
pub mod instfreq;
pub mod join;
pub mod map;
pub mod novelty;
pub mod onset;
pub mod overlap_add;
pub mod resample;
pub mod selfsimilarity;
pub mod spectral;
pub mod window;
pub mod zeropad;

use crate::error::Result;
use crate::frame::Frame;
use crate::matrix::Matrix;
use dyn_clone::DynClone;
use std::fmt;

/// Stable index of a node within a [`crate::graph::Pump`]'s arena.
pub type NodeId = usize;

/// Which logical output a node's emission is destined for. Ordinary
/// nodes only ever use `Single`; splits use `Channel` to route each
/// channel's frame only to the children registered under that channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ChildSlot {
    Single,
    Channel(usize),
}

/// The terminal value a leaf node accumulates, retrievable after flush.
/// `Matrix` is held behind `Rc` rather than `Box` so `output(&self)` can
/// hand back a cheap clone of whichever dense/symmetric/banded/sparse
/// shape a node finished with, without requiring `Matrix: Clone`.
#[derive(Debug, Clone)]
pub enum Output {
    Frame(Frame),
    Matrix(std::rc::Rc<dyn Matrix>),
}

/// One frame emitted by a node's `process`/`flush`, tagged with the
/// child slot it is destined for.
#[derive(Clone, Debug)]
pub struct Emission {
    pub slot: ChildSlot,
    pub frame: Frame,
}

impl Emission {
    pub fn single(frame: Frame) -> Self {
        Emission {
            slot: ChildSlot::Single,
            frame,
        }
    }

    pub fn channel(channel: usize, frame: Frame) -> Self {
        Emission {
            slot: ChildSlot::Channel(channel),
            frame,
        }
    }
}

/// A node's lifecycle state (§4.7): Idle until the first `process`,
/// Running thereafter, Flushed once `flush` has completed. Flush is
/// idempotent: flushing an already-`Flushed` node is a self-transition
/// that must not re-emit accumulators.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeState {
    Idle,
    Running,
    Flushed,
}

/// A push node: borrows one input frame per call, may emit zero or more
/// derived frames to registered children, and never mutates its input.
///
/// `Clone` (via [`dyn_clone`]) lets a [`Frag`]/[`Pipeline`] be extended
/// functionally, producing a new fragment that structurally shares its
/// unchanged prefix with the original (see `Pipeline::append`); actual
/// node identity is unified later, structurally, when
/// [`crate::graph::Pump::add`] merges the fragment into the arena.
pub trait PushNode: DynClone + fmt::Debug {
    /// Stable key used in the pump's result map; falls back to a
    /// synthesized identifier derived from `structural_key` if unset.
    fn id(&self) -> &str;

    /// A canonical string encoding this node's kind and configuration.
    /// Two nodes merge during `Pump::add` only if their structural keys
    /// are equal. Splits always return a key containing a disambiguating
    /// marker that can never equal another node's key (see
    /// [`PushNode::is_split`]), since split children are channel
    /// partitioned and per spec must never be merged.
    fn structural_key(&self) -> String;

    /// Splits are never merged with an existing node, regardless of
    /// structural key (§4.7).
    fn is_split(&self) -> bool {
        false
    }

    fn state(&self) -> NodeState;

    /// Process one input frame, returning frames to deliver to children.
    fn process_self(&mut self, input: &Frame) -> Result<Vec<Emission>>;

    /// Process one input frame arriving via a specific edge (the slot
    /// under which the arena wired this node as a child). The default
    /// ignores `slot` and forwards to `process_self`; only a node that
    /// genuinely depends on which edge delivered the frame (the `Join`
    /// fan-in sink, fed by more than one parent through distinct
    /// channel-tagged edges) overrides this.
    fn process_port(&mut self, slot: ChildSlot, input: &Frame) -> Result<Vec<Emission>> {
        let _ = slot;
        self.process_self(input)
    }

    /// Complete pending work (e.g. flush a partially filled window) and
    /// return any residual frames to deliver to children. Must be
    /// idempotent: once in the `Flushed` state, returns an empty vector.
    fn flush_self(&mut self) -> Result<Vec<Emission>>;

    /// The last produced frame, or the finalized accumulator, after
    /// flush. `None` for nodes with no retrievable terminal value (pure
    /// pass-through or fan-out nodes).
    fn output(&self) -> Option<Output>;
}

dyn_clone::clone_trait_object!(PushNode);

/// A pull node reads from an upstream source on demand instead of being
/// pushed into. `None` is the end-of-stream sentinel (§4.1): upstream and
/// internal buffers are both drained rather than erroring.
pub trait PullNode {
    fn read(&mut self) -> Result<Option<Frame>>;
    fn reset(&mut self) -> Result<()>;
}

/// A node-and-children fragment, the unit [`crate::graph::Pump::add`]
/// merges into its arena. `children` is ordered: for a non-split node it
/// holds zero or more `(ChildSlot::Single, _)` entries (multiple children
/// fan out the same frame to all of them); for a split it holds one list
/// of children per `ChildSlot::Channel(c)`, visited in ascending `c`.
#[derive(Clone, Debug)]
pub struct Frag {
    pub node: Box<dyn PushNode>,
    pub children: Vec<(ChildSlot, Frag)>,
}

impl Frag {
    pub fn leaf(node: Box<dyn PushNode>) -> Self {
        Frag {
            node,
            children: Vec::new(),
        }
    }

    pub fn with_child(mut self, child: Frag) -> Self {
        self.children.push((ChildSlot::Single, child));
        self
    }

    pub fn with_channel(mut self, channel: usize, child: Frag) -> Self {
        self.children.push((ChildSlot::Channel(channel), child));
        self
    }
}

/// A verified linear push chain: every node but the tail has exactly one
/// child. `Pipeline::append` returns a new pipeline; it does not mutate
/// `self`, matching the "joining appends a node to the tail and returns a
/// new pipeline sharing the head" contract in spirit — the returned
/// pipeline's prefix is structurally identical to the original's, and
/// `Pump::add` unifies structurally equal prefixes on insertion.
#[derive(Clone, Debug)]
pub struct Pipeline {
    nodes: Vec<Box<dyn PushNode>>,
}

impl Pipeline {
    pub fn new(nodes: Vec<Box<dyn PushNode>>) -> Self {
        Pipeline { nodes }
    }

    pub fn single(node: Box<dyn PushNode>) -> Self {
        Pipeline { nodes: vec![node] }
    }

    pub fn append(&self, node: Box<dyn PushNode>) -> Self {
        let mut nodes = self.nodes.clone();
        nodes.push(node);
        Pipeline { nodes }
    }

    pub fn into_frag(self) -> Option<Frag> {
        let mut iter = self.nodes.into_iter().rev();
        let mut frag = Frag::leaf(iter.next()?);
        for node in iter {
            frag = Frag::leaf(node).with_child(frag);
        }
        Some(frag)
    }
}

impl From<Pipeline> for Option<Frag> {
    fn from(p: Pipeline) -> Self {
        p.into_frag()
    }
}
