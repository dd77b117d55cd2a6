//! Generic instantiation bookkeeping
//!
//! Every function in picolang is generic over the primitive types of its
//! arguments. A call site with argument types `(T1, .., Tn)` is served by a
//! clone of the definition registered under the decorated name
//! `base@@T1@@..@@Tn`. Clones are created at most once per decorated name and
//! inferred through a worklist rather than by re-entering the inference pass.

use pico_parser::{NodeId, PrimitiveType};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::VecDeque;

/// Build the decorated name for `base` called with `arg_types`.
///
/// A call with no arguments decorates to `base@@`, so it never collides with
/// the undecorated template symbol.
pub fn decorate(base: &str, arg_types: &[PrimitiveType]) -> String {
    let tags: Vec<&str> = arg_types.iter().map(|ty| ty.tag()).collect();
    format!("{}@@{}", base, tags.join("@@"))
}

/// One specialized copy of a generic function.
#[derive(Debug, Clone)]
pub struct Instance {
    /// Decorated name, also the assembly label of the function
    pub name: String,
    /// Source-level function name
    pub base: String,
    /// Root of the cloned definition
    pub definition: NodeId,
    pub arg_types: Vec<PrimitiveType>,
}

/// All instantiations of a compilation plus the pending worklist.
///
/// Instances and recorded return types persist across inference rounds; the
/// worklist and the per-round queued set do not.
#[derive(Debug, Default)]
pub struct Instantiations {
    instances: FxHashMap<String, Instance>,
    /// Decorated names in creation order
    order: Vec<String>,
    pending: VecDeque<String>,
    queued: FxHashSet<String>,
    return_types: FxHashMap<String, PrimitiveType>,
}

impl Instantiations {
    pub fn get(&self, name: &str) -> Option<&Instance> {
        self.instances.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.instances.contains_key(name)
    }

    pub fn insert(&mut self, instance: Instance) {
        if !self.instances.contains_key(&instance.name) {
            self.order.push(instance.name.clone());
            self.instances.insert(instance.name.clone(), instance);
        }
    }

    /// Queue `name` for inference. Returns false if it is already queued
    /// in this round.
    pub fn enqueue(&mut self, name: &str) -> bool {
        if !self.queued.insert(name.to_string()) {
            return false;
        }
        self.pending.push_back(name.to_string());
        true
    }

    pub fn next_pending(&mut self) -> Option<String> {
        self.pending.pop_front()
    }

    /// Forget the worklist state of the previous round.
    pub fn begin_round(&mut self) {
        self.pending.clear();
        self.queued.clear();
    }

    /// Body type of an instance, or integer while it is still unknown.
    pub fn return_type(&self, name: &str) -> PrimitiveType {
        self.return_types
            .get(name)
            .copied()
            .unwrap_or(PrimitiveType::Int)
    }

    /// Record the body type of an instance. Returns true if this differs from
    /// what callers have been assuming so far.
    pub fn record_return_type(&mut self, name: &str, ty: PrimitiveType) -> bool {
        let assumed = self.return_type(name);
        self.return_types.insert(name.to_string(), ty);
        assumed != ty
    }

    /// Instances in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &Instance> {
        self.order.iter().filter_map(|name| self.instances.get(name))
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
