//! Local mirror of the host-side scene graph.
//!
//! Creation calls return a forward handle immediately; the record stays
//! `Pending` until the host acknowledges it, and dependent operations may be
//! attached to the handle in the meantime. Children are kept in creation
//! order so positional addressing (window `i`, panel `i`) matches the order
//! the scene was authored in.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use glam::{Quat, Vec3};
use serde::Serialize;

use crate::windows::WindowState;

/// Forward handle for a host-side actor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ActorId(pub u32);

impl fmt::Display for ActorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "actor#{}", self.0)
    }
}

/// Whether the host has caught up with a creation call yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolveState {
    Pending,
    Resolved,
    Rejected,
}

/// Local transform as authored; `None` fields take the host default.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Transform {
    pub position: Option<Vec3>,
    pub rotation: Option<Quat>,
    pub scale: Option<Vec3>,
}

impl Transform {
    pub fn at(position: Vec3) -> Self {
        Transform {
            position: Some(position),
            ..Transform::default()
        }
    }

    pub fn rotated(rotation: Quat) -> Self {
        Transform {
            rotation: Some(rotation),
            ..Transform::default()
        }
    }

    pub fn with_rotation(mut self, rotation: Quat) -> Self {
        self.rotation = Some(rotation);
        self
    }

    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// What the app knows about one actor it asked the host to create.
#[derive(Debug, Clone)]
pub struct ActorRecord {
    pub id: ActorId,
    pub name: Option<String>,
    pub parent: Option<ActorId>,
    pub transform: Transform,
    pub tag: Option<WindowState>,
    pub state: ResolveState,
    pub animations: BTreeSet<String>,
}

/// Creation request; the graph fills in the handle.
#[derive(Debug, Clone, Default)]
pub struct ActorSpec {
    pub name: Option<String>,
    pub parent: Option<ActorId>,
    pub transform: Transform,
    pub tag: Option<WindowState>,
}

impl ActorSpec {
    pub fn named(name: impl Into<String>) -> Self {
        ActorSpec {
            name: Some(name.into()),
            ..ActorSpec::default()
        }
    }

    pub fn child_of(mut self, parent: ActorId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = transform;
        self
    }

    pub fn tagged(mut self, tag: WindowState) -> Self {
        self.tag = Some(tag);
        self
    }
}

/// Bookkeeping for every actor the app has staged.
#[derive(Debug, Default)]
pub struct StageGraph {
    records: BTreeMap<ActorId, ActorRecord>,
    children: BTreeMap<ActorId, Vec<ActorId>>,
    roots: Vec<ActorId>,
    labels: BTreeMap<String, ActorId>,
    next_handle: u32,
}

impl StageGraph {
    pub fn new() -> Self {
        StageGraph {
            next_handle: 1,
            ..StageGraph::default()
        }
    }

    /// Stage a new actor and hand back its forward handle.
    pub fn create(&mut self, spec: ActorSpec) -> ActorId {
        let id = ActorId(self.next_handle);
        self.next_handle += 1;

        if let Some(parent) = spec.parent {
            self.children.entry(parent).or_default().push(id);
        } else {
            self.roots.push(id);
        }
        if let Some(name) = spec.name.as_ref() {
            // First creation wins; duplicate names keep their original owner.
            self.labels.entry(name.clone()).or_insert(id);
        }

        self.records.insert(
            id,
            ActorRecord {
                id,
                name: spec.name,
                parent: spec.parent,
                transform: spec.transform,
                tag: spec.tag,
                state: ResolveState::Pending,
                animations: BTreeSet::new(),
            },
        );
        id
    }

    pub fn record(&self, id: ActorId) -> Option<&ActorRecord> {
        self.records.get(&id)
    }

    pub fn records(&self) -> impl Iterator<Item = &ActorRecord> {
        self.records.values()
    }

    pub fn children(&self, parent: ActorId) -> &[ActorId] {
        self.children
            .get(&parent)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn child(&self, parent: ActorId, index: usize) -> Option<ActorId> {
        self.children(parent).get(index).copied()
    }

    pub fn find_by_name(&self, name: &str) -> Option<ActorId> {
        self.labels.get(name).copied()
    }

    pub fn register_animation(&mut self, id: ActorId, name: impl Into<String>) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.animations.insert(name.into());
                true
            }
            None => false,
        }
    }

    pub fn has_animation(&self, id: ActorId, name: &str) -> bool {
        self.records
            .get(&id)
            .map(|record| record.animations.contains(name))
            .unwrap_or(false)
    }

    pub fn tag(&self, id: ActorId) -> Option<WindowState> {
        self.records.get(&id).and_then(|record| record.tag)
    }

    pub fn set_tag(&mut self, id: ActorId, tag: WindowState) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.tag = Some(tag);
                true
            }
            None => false,
        }
    }

    /// Flip a pending record once the host confirms it. Returns false for
    /// handles the graph never issued.
    pub fn mark_resolved(&mut self, id: ActorId) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.state = ResolveState::Resolved;
                true
            }
            None => false,
        }
    }

    pub fn mark_rejected(&mut self, id: ActorId) -> bool {
        match self.records.get_mut(&id) {
            Some(record) => {
                record.state = ResolveState::Rejected;
                true
            }
            None => false,
        }
    }

    pub fn pending(&self) -> Vec<ActorId> {
        self.records
            .values()
            .filter(|record| record.state == ResolveState::Pending)
            .map(|record| record.id)
            .collect()
    }

    pub fn count_state(&self, state: ResolveState) -> usize {
        self.records
            .values()
            .filter(|record| record.state == state)
            .count()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_keep_creation_order() {
        let mut stage = StageGraph::new();
        let parent = stage.create(ActorSpec::named("Building1"));
        let first = stage.create(ActorSpec::default().child_of(parent));
        let second = stage.create(ActorSpec::default().child_of(parent));
        let third = stage.create(ActorSpec::default().child_of(parent));

        assert_eq!(stage.children(parent), &[first, second, third]);
        assert_eq!(stage.child(parent, 1), Some(second));
        assert_eq!(stage.child(parent, 3), None);
    }

    #[test]
    fn forward_handles_start_pending_and_resolve_once_acked() {
        let mut stage = StageGraph::new();
        let id = stage.create(ActorSpec::named("SpotLight"));
        assert_eq!(stage.record(id).map(|r| r.state), Some(ResolveState::Pending));

        // Operations can attach to the handle before resolution.
        assert!(stage.register_animation(id, "Open"));
        assert!(stage.has_animation(id, "Open"));

        assert!(stage.mark_resolved(id));
        assert_eq!(
            stage.record(id).map(|r| r.state),
            Some(ResolveState::Resolved)
        );
        assert!(!stage.mark_resolved(ActorId(999)));
    }

    #[test]
    fn first_creation_owns_a_duplicated_name() {
        let mut stage = StageGraph::new();
        let first = stage.create(ActorSpec::named("CurtainPanel"));
        let _second = stage.create(ActorSpec::named("CurtainPanel"));
        assert_eq!(stage.find_by_name("CurtainPanel"), Some(first));
    }
}
