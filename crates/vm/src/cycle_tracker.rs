//! Reclaims reference cycles built by APPEND and SETITEM.
//!
//! Compound items are reference counted, so a script that stores an array
//! inside itself would leak. Every container that receives a compound value
//! is remembered weakly. When the engine is dropped, the strongly connected
//! components of the remembered containers are computed and every container
//! that sits on a cycle is emptied, which lets reference counting free it.

use crate::stack_item::{ArrayRef, ItemList, Map, MapRef, StackItem};
use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

const PRUNE_THRESHOLD: usize = 1024;

#[derive(Clone)]
enum WeakNode {
    List(Weak<RefCell<ItemList>>),
    Map(Weak<RefCell<Map>>),
}

impl WeakNode {
    fn upgrade(&self) -> Option<Node> {
        match self {
            WeakNode::List(weak) => weak.upgrade().map(Node::List),
            WeakNode::Map(weak) => weak.upgrade().map(Node::Map),
        }
    }

    fn is_alive(&self) -> bool {
        match self {
            WeakNode::List(weak) => weak.strong_count() > 0,
            WeakNode::Map(weak) => weak.strong_count() > 0,
        }
    }
}

#[derive(Clone)]
enum Node {
    List(ArrayRef),
    Map(MapRef),
}

impl Node {
    fn from_item(item: &StackItem) -> Option<Node> {
        match item {
            StackItem::Array(list) | StackItem::Struct(list) => Some(Node::List(Rc::clone(list))),
            StackItem::Map(map) => Some(Node::Map(Rc::clone(map))),
            _ => None,
        }
    }

    fn id(&self) -> usize {
        match self {
            Node::List(list) => Rc::as_ptr(list) as *const () as usize,
            Node::Map(map) => Rc::as_ptr(map) as *const () as usize,
        }
    }

    fn downgrade(&self) -> WeakNode {
        match self {
            Node::List(list) => WeakNode::List(Rc::downgrade(list)),
            Node::Map(map) => WeakNode::Map(Rc::downgrade(map)),
        }
    }

    fn children(&self) -> Vec<Node> {
        match self {
            Node::List(list) => match list.try_borrow() {
                Ok(list) => list.iter().filter_map(Node::from_item).collect(),
                Err(_) => Vec::new(),
            },
            Node::Map(map) => match map.try_borrow() {
                Ok(map) => map.values().filter_map(Node::from_item).collect(),
                Err(_) => Vec::new(),
            },
        }
    }

    /// Empties the container and hands back what it held.
    fn take_contents(&self) -> Vec<StackItem> {
        match self {
            Node::List(list) => match list.try_borrow_mut() {
                Ok(mut list) => std::mem::take(&mut **list),
                Err(_) => Vec::new(),
            },
            Node::Map(map) => match map.try_borrow_mut() {
                Ok(mut map) => map.clear(),
                Err(_) => Vec::new(),
            },
        }
    }
}

/// Weak registry of containers that may take part in a cycle.
#[derive(Default)]
pub struct CycleTracker {
    tracked: Vec<WeakNode>,
    ids: HashSet<usize>,
    live_after_prune: usize,
}

impl CycleTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of containers currently remembered.
    pub fn len(&self) -> usize {
        self.tracked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracked.is_empty()
    }

    /// Records `target` when a compound `value` has just been stored in it.
    pub fn track(&mut self, target: &StackItem, value: &StackItem) {
        if !value.is_collection() {
            return;
        }
        let Some(node) = Node::from_item(target) else {
            return;
        };
        if self.ids.insert(node.id()) {
            self.tracked.push(node.downgrade());
            if self.tracked.len() > self.live_after_prune * 2 + PRUNE_THRESHOLD {
                self.prune();
            }
        }
    }

    fn prune(&mut self) {
        // A Weak keeps its allocation reserved, so an id cannot be reused
        // while it is still listed here.
        let mut ids = HashSet::with_capacity(self.tracked.len());
        self.tracked.retain(|weak| weak.is_alive());
        for node in self.tracked.iter().filter_map(WeakNode::upgrade) {
            ids.insert(node.id());
        }
        self.ids = ids;
        self.live_after_prune = self.tracked.len();
    }

    /// Empties every remembered container that sits on a cycle and returns
    /// how many were emptied.
    pub fn break_cycles(&mut self) -> usize {
        let roots: Vec<Node> = self.tracked.drain(..).filter_map(|w| w.upgrade()).collect();
        self.ids.clear();
        self.live_after_prune = 0;

        let cyclic = strongly_connected_cycles(&roots);
        let count = cyclic.len();
        let mut released = Vec::new();
        for node in &cyclic {
            released.extend(node.take_contents());
        }
        drop(roots);
        drop(cyclic);
        crate::stack_item::compound::release(released);
        if count > 0 {
            log::debug!("released {count} containers on reference cycles");
        }
        count
    }
}

impl std::fmt::Debug for CycleTracker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CycleTracker")
            .field("tracked", &self.tracked.len())
            .finish()
    }
}

struct Frame {
    node: Node,
    children: Vec<Node>,
    next: usize,
}

#[derive(Default)]
struct Tarjan {
    index: HashMap<usize, usize>,
    lowlink: HashMap<usize, usize>,
    on_stack: HashSet<usize>,
    stack: Vec<Node>,
    work: Vec<Frame>,
    next_index: usize,
    cyclic: Vec<Node>,
}

impl Tarjan {
    fn enter(&mut self, node: Node) {
        let id = node.id();
        self.index.insert(id, self.next_index);
        self.lowlink.insert(id, self.next_index);
        self.next_index += 1;
        self.on_stack.insert(id);
        self.stack.push(node.clone());
        let children = node.children();
        self.work.push(Frame {
            node,
            children,
            next: 0,
        });
    }

    fn lower(&mut self, id: usize, value: usize) {
        if let Some(low) = self.lowlink.get_mut(&id) {
            *low = (*low).min(value);
        }
    }

    fn visit(&mut self, root: &Node) {
        if self.index.contains_key(&root.id()) {
            return;
        }
        self.enter(root.clone());

        while let Some(frame) = self.work.last_mut() {
            let id = frame.node.id();
            if let Some(child) = frame.children.get(frame.next).cloned() {
                frame.next += 1;
                let child_id = child.id();
                match self.index.get(&child_id).copied() {
                    None => self.enter(child),
                    Some(child_index) if self.on_stack.contains(&child_id) => {
                        self.lower(id, child_index)
                    }
                    Some(_) => {}
                }
                continue;
            }

            let Some(frame) = self.work.pop() else { break };
            let low = self.lowlink.get(&id).copied().unwrap_or_default();
            if let Some(parent) = self.work.last() {
                let parent_id = parent.node.id();
                self.lower(parent_id, low);
            }
            if Some(&low) == self.index.get(&id) {
                self.pop_component(id, &frame);
            }
        }
    }

    fn pop_component(&mut self, id: usize, frame: &Frame) {
        let mut component = Vec::new();
        while let Some(member) = self.stack.pop() {
            let member_id = member.id();
            self.on_stack.remove(&member_id);
            component.push(member);
            if member_id == id {
                break;
            }
        }
        let self_loop = frame.children.iter().any(|child| child.id() == id);
        if component.len() > 1 || self_loop {
            self.cyclic.extend(component);
        }
    }
}

/// Iterative Tarjan. Returns the nodes of every component that is a cycle:
/// more than one member, or a single member that contains itself.
fn strongly_connected_cycles(roots: &[Node]) -> Vec<Node> {
    let mut tarjan = Tarjan::default();
    for root in roots {
        tarjan.visit(root);
    }
    tarjan.cyclic
}

#[cfg(test)]
mod tests {
    use super::*;

    fn push(target: &StackItem, value: StackItem) {
        target.as_array().unwrap().borrow_mut().push(value);
    }

    #[test]
    fn self_reference_is_released() {
        let mut tracker = CycleTracker::new();
        let array = StackItem::new_array(Vec::new());
        push(&array, array.clone());
        tracker.track(&array, &array);

        let weak = Rc::downgrade(array.as_array().unwrap());
        drop(array);
        assert!(weak.upgrade().is_some());
        assert_eq!(tracker.break_cycles(), 1);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn map_and_array_cycle_is_released() {
        let mut tracker = CycleTracker::new();
        let array = StackItem::new_array(Vec::new());
        let map = StackItem::new_map();
        map.as_map()
            .unwrap()
            .borrow_mut()
            .insert(StackItem::from(1), array.clone())
            .unwrap();
        tracker.track(&map, &array);
        push(&array, map.clone());
        tracker.track(&array, &map);

        let weak = Rc::downgrade(map.as_map().unwrap());
        drop(array);
        drop(map);
        assert_eq!(tracker.break_cycles(), 2);
        assert!(weak.upgrade().is_none());
    }

    #[test]
    fn acyclic_nesting_is_left_alone() {
        let mut tracker = CycleTracker::new();
        let inner = StackItem::new_array(vec![StackItem::from(1)]);
        let outer = StackItem::new_array(Vec::new());
        push(&outer, inner.clone());
        tracker.track(&outer, &inner);
        push(&outer, inner.clone());
        tracker.track(&outer, &inner);
        assert_eq!(tracker.len(), 1);

        assert_eq!(tracker.break_cycles(), 0);
        assert_eq!(outer.as_array().unwrap().borrow().len(), 2);
    }

    #[test]
    fn dead_entries_are_pruned() {
        let mut tracker = CycleTracker::new();
        let value = StackItem::new_array(Vec::new());
        for _ in 0..(PRUNE_THRESHOLD * 3) {
            let target = StackItem::new_array(Vec::new());
            tracker.track(&target, &value);
        }
        assert!(tracker.len() <= PRUNE_THRESHOLD + 1);
    }
}
