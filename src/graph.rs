//! The pump and its arena-backed graph (§4.7): owns the signal source and
//! drives a DAG of push nodes built by merging [`Frag`]s (possibly
//! unwrapped from [`Pipeline`]s) that share a common prefix.
//!
//! §9 "Graph representation" calls for arena-allocated nodes with stable
//! indices instead of a tree of reference-counted trait objects calling
//! into each other. [`Arena`] holds every node in a flat `Vec`, addressed
//! by [`NodeId`]; [`Arena::merge_into`] and the dispatch in
//! [`Arena::process`]/[`Arena::flush`] are the only places that walk
//! parent/child relationships, so structural-equality merging and DFS
//! delivery order both live in one spot rather than being a property each
//! node has to cooperate with.

use crate::error::Result;
use crate::frame::Frame;
use crate::node::{ChildSlot, Frag, NodeId, Output, Pipeline, PushNode};
use crate::source::{ReadOutcome, SignalSource};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

struct ArenaNode {
    node: Box<dyn PushNode>,
    children: Vec<(ChildSlot, NodeId)>,
}

/// Ascending sort key for a node's children: `Single` first (fan-out
/// order is then whatever order they were inserted in), `Channel(c)` by
/// `c` (§4.7/§5 "split channels visited in ascending channel index"). A
/// given node's children are always uniformly `Single` or uniformly
/// `Channel`, so within either group the sort is a no-op beyond making it
/// stable on insertion order.
fn slot_key(slot: ChildSlot) -> usize {
    match slot {
        ChildSlot::Single => 0,
        ChildSlot::Channel(c) => c,
    }
}

#[derive(Default)]
struct Arena {
    nodes: Vec<ArenaNode>,
}

impl Arena {
    fn node(&self, id: NodeId) -> &dyn PushNode {
        &*self.nodes[id].node
    }

    fn node_mut(&mut self, id: NodeId) -> &mut dyn PushNode {
        &mut *self.nodes[id].node
    }

    fn children(&self, id: NodeId) -> Vec<(ChildSlot, NodeId)> {
        let mut children = self.nodes[id].children.clone();
        children.sort_by_key(|(slot, _)| slot_key(*slot));
        children
    }

    fn children_in(&self, id: NodeId, slot: ChildSlot) -> Vec<NodeId> {
        self.nodes[id]
            .children
            .iter()
            .filter(|(s, _)| *s == slot)
            .map(|(_, c)| *c)
            .collect()
    }

    /// Insert an entire fragment subtree as fresh nodes, returning the
    /// new root's id.
    fn insert_frag(&mut self, frag: Frag) -> NodeId {
        self.nodes.push(ArenaNode {
            node: frag.node,
            children: Vec::new(),
        });
        let id = self.nodes.len() - 1;
        for (slot, child) in frag.children {
            let child_id = self.insert_frag(child);
            self.nodes[id].children.push((slot, child_id));
        }
        id
    }

    /// Find an existing child of `parent`, under `slot`, that `frag`'s
    /// node can merge into: same structural key, and neither side is a
    /// split (§4.2/§4.7: splits are never merged, since their children
    /// are channel-partitioned and heterogeneous).
    fn merge_target(&self, parent: NodeId, slot: ChildSlot, frag: &Frag) -> Option<NodeId> {
        if frag.node.is_split() {
            return None;
        }
        let key = frag.node.structural_key();
        self.children_in(parent, slot)
            .into_iter()
            .find(|&cid| !self.node(cid).is_split() && self.node(cid).structural_key() == key)
    }

    /// Merge `frag`'s children into the subtree rooted at `existing`,
    /// recursively, per §4.7: "each linear path of the new graph is
    /// walked; at each depth, if the existing parent already has an equal
    /// child, recursion continues into that child; otherwise the new
    /// child is attached there."
    fn merge_into(&mut self, existing: NodeId, frag: Frag) {
        for (slot, child_frag) in frag.children {
            match self.merge_target(existing, slot, &child_frag) {
                Some(target) => {
                    log::debug!(
                        "pump: merging into existing node `{}`",
                        self.node(target).structural_key()
                    );
                    self.merge_into(target, child_frag);
                }
                None => {
                    log::debug!(
                        "pump: attaching fresh node `{}`",
                        child_frag.node.structural_key()
                    );
                    let new_id = self.insert_frag(child_frag);
                    self.nodes[existing].children.push((slot, new_id));
                }
            }
        }
    }

    /// Deliver `frame` into `id` (arriving via `slot`) and recursively
    /// into every child it emits to, in DFS left-to-right order (§5).
    fn process(&mut self, id: NodeId, slot: ChildSlot, frame: &Frame) -> Result<()> {
        let emissions = self.node_mut(id).process_port(slot, frame)?;
        for emission in emissions {
            for child in self.children_in(id, emission.slot) {
                self.process(child, emission.slot, &emission.frame)?;
            }
        }
        Ok(())
    }

    /// Flush `id`: run its own `flush_self`, push any residual emissions
    /// through the matching children via `process` (not `flush` — a
    /// residual frame is ordinary data to whoever receives it), then
    /// recursively flush every child regardless of whether it received a
    /// residual, in deterministic order (§4.1 "flush... recursively
    /// flushes children").
    fn flush(&mut self, id: NodeId) -> Result<()> {
        let emissions = self.node_mut(id).flush_self()?;
        for emission in emissions {
            for child in self.children_in(id, emission.slot) {
                self.process(child, emission.slot, &emission.frame)?;
            }
        }
        for (_, child) in self.children(id) {
            self.flush(child)?;
        }
        Ok(())
    }

    /// Collect `(id, output)` pairs in the same deterministic DFS order
    /// as delivery: root first, then each channel's children
    /// left-to-right, then each child's children (§4.7).
    fn collect(&self, id: NodeId, order: &mut Vec<String>, values: &mut HashMap<String, Output>) {
        let node = self.node(id);
        if let Some(output) = node.output() {
            let key = node.id().to_string();
            if !values.contains_key(&key) {
                order.push(key.clone());
            }
            values.insert(key, output);
        }
        for (_, child) in self.children(id) {
            self.collect(child, order, values);
        }
    }

    fn describe_into(&self, id: NodeId, depth: usize, out: &mut String) {
        out.push_str(&"  ".repeat(depth));
        out.push_str(&self.node(id).structural_key());
        out.push('\n');
        for (slot, child) in self.children(id) {
            if let ChildSlot::Channel(c) = slot {
                out.push_str(&"  ".repeat(depth + 1));
                out.push_str(&format!("[channel {c}]\n"));
                self.describe_into(child, depth + 2, out);
            } else {
                self.describe_into(child, depth + 1, out);
            }
        }
    }
}

/// Outcome of a completed [`Pump::pump`] run. Cancellation is cooperative
/// and non-erroring (§7), so it is an ordinary enum value rather than an
/// [`crate::error::Error`] variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PumpOutcome {
    Completed,
    Cancelled,
}

/// `(id, output)` pairs collected after a completed pump, in the
/// deterministic traversal order described at [`Arena::collect`].
#[derive(Clone, Debug, Default)]
pub struct PumpResults {
    order: Vec<String>,
    values: HashMap<String, Output>,
}

impl PumpResults {
    pub fn get(&self, id: &str) -> Option<&Output> {
        self.values.get(id)
    }

    pub fn ids(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Output)> {
        self.order.iter().map(move |id| (id.as_str(), &self.values[id]))
    }
}

/// A handle that can request cancellation of a running [`Pump`] from any
/// thread (§5: "the only cross-thread interaction is the cancel flag, one
/// reader, many potential writers").
#[derive(Clone, Debug)]
pub struct Canceller(Arc<AtomicBool>);

impl Canceller {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

/// Owns the signal source and a merged arena of root pipelines, and pumps
/// frames from the source through every root until exhaustion or
/// cancellation (§4.7).
pub struct Pump<S: SignalSource> {
    source: S,
    arena: Arena,
    roots: Vec<NodeId>,
    cancel: Arc<AtomicBool>,
}

impl<S: SignalSource> Pump<S> {
    pub fn new(source: S) -> Self {
        Pump {
            source,
            arena: Arena::default(),
            roots: Vec::new(),
            cancel: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn set_source(&mut self, source: S) {
        self.source = source;
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// A cloneable, `Send`-safe handle for cancelling this pump from
    /// another thread while `pump()` runs here.
    pub fn canceller(&self) -> Canceller {
        Canceller(self.cancel.clone())
    }

    /// Request cancellation. Safe to call from any thread; `pump()`
    /// checks the flag between source reads and between root invocations.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Release);
    }

    fn is_cancelled(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }

    /// Decompose `pipeline` into a [`Frag`] and merge it into the arena.
    /// An empty pipeline contributes nothing.
    pub fn add_pipeline(&mut self, pipeline: Pipeline) {
        if let Some(frag) = pipeline.into_frag() {
            self.add(frag);
        }
    }

    /// Decompose `frag` into its root and merge it into the existing
    /// roots, per §4.7: if an existing root has the same structural key
    /// (and neither is a split), the new fragment's children are merged
    /// recursively into it; otherwise the whole fragment becomes a fresh
    /// root, appended after the existing ones (insertion order is
    /// preserved for `describe`/`results`).
    pub fn add(&mut self, frag: Frag) {
        let key = frag.node.structural_key();
        let reuse = if frag.node.is_split() {
            None
        } else {
            self.roots
                .iter()
                .copied()
                .find(|&rid| !self.arena.node(rid).is_split() && self.arena.node(rid).structural_key() == key)
        };
        match reuse {
            Some(root) => {
                log::debug!("pump: merging pipeline into existing root `{key}`");
                self.arena.merge_into(root, frag);
            }
            None => {
                log::debug!("pump: adding fresh root `{key}`");
                let root = self.arena.insert_frag(frag);
                self.roots.push(root);
            }
        }
    }

    /// Reset the source, then read and dispatch frames to every root
    /// until the source is exhausted or [`Pump::cancel`] is observed. On
    /// normal completion, flushes every root once (recursively) before
    /// returning. A cancelled run returns [`PumpOutcome::Cancelled`]
    /// without flushing (§5 "a cancelled pump returns a null result map
    /// without flushing").
    pub fn pump(&mut self) -> Result<PumpOutcome> {
        self.cancel.store(false, Ordering::Release);
        self.source.reset()?;
        let mut frame_count: u64 = 0;
        loop {
            if self.is_cancelled() {
                log::info!("pump: cancelled after {frame_count} frames");
                return Ok(PumpOutcome::Cancelled);
            }
            let frame = match self.source.read()? {
                ReadOutcome::Frame(frame) => frame,
                ReadOutcome::EndOfStream => break,
            };
            for &root in &self.roots {
                if self.is_cancelled() {
                    log::info!("pump: cancelled after {frame_count} frames");
                    return Ok(PumpOutcome::Cancelled);
                }
                self.arena.process(root, ChildSlot::Single, &frame)?;
            }
            frame_count += 1;
            if frame_count % 1000 == 0 {
                log::trace!("pump: processed {frame_count} frames");
            }
        }
        for &root in &self.roots {
            self.arena.flush(root)?;
        }
        log::info!("pump: completed after {frame_count} frames");
        Ok(PumpOutcome::Completed)
    }

    /// Collect every node's retrievable output after a completed pump.
    /// Meaningful only after [`Pump::pump`] returned
    /// [`PumpOutcome::Completed`]; after a cancelled run this reflects
    /// whatever partial state nodes happened to hold, which callers
    /// should treat as undefined.
    pub fn results(&self) -> PumpResults {
        let mut order = Vec::new();
        let mut values = HashMap::new();
        for &root in &self.roots {
            self.arena.collect(root, &mut order, &mut values);
        }
        PumpResults { order, values }
    }

    /// ASCII dump of the merged graph, one structural key per line,
    /// indented by depth, with `[channel N]` markers above split
    /// children.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for &root in &self.roots {
            self.arena.describe_into(root, 0, &mut out);
        }
        out
    }

    pub fn root_count(&self) -> usize {
        self.roots.len()
    }
}
