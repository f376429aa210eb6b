use glam::{Mat4, Quat, Vec3};
use slotmap::{new_key_type, SlotMap};

new_key_type! {
    pub struct NodeKey;
    pub struct SubscriptionKey;
}

#[derive(Clone, Debug)]
pub struct SceneNode {
    name: String,
    parent: Option<NodeKey>,
    children: Vec<NodeKey>,
    translation: Vec3,
    rotation: Quat,
    scale: Vec3,
    watchers: Vec<SubscriptionKey>,
}

#[derive(Clone, Debug)]
struct Subscription {
    nodes: Vec<NodeKey>,
    changed: bool,
}

/// Minimal transform hierarchy that joints are resolved against.
///
/// Nodes are addressed by stable keys. Renderers that care about joint
/// movement register an explicit subscription over the nodes they watch and
/// poll it with [`SceneGraph::take_changed`]; a transform change on a node
/// marks every subscription watching that node or any of its descendants,
/// since their world transforms changed as well.
#[derive(Clone, Debug, Default)]
pub struct SceneGraph {
    nodes: SlotMap<NodeKey, SceneNode>,
    subscriptions: SlotMap<SubscriptionKey, Subscription>,
}

impl SceneGraph {
    pub fn new() -> Self {
        SceneGraph {
            nodes: SlotMap::with_key(),
            subscriptions: SlotMap::with_key(),
        }
    }

    pub fn create_node(&mut self, name: &str, parent: Option<NodeKey>) -> NodeKey {
        let parent = match parent {
            Some(parent) if !self.nodes.contains_key(parent) => {
                log::warn!("Parent of node {} does not exist, creating it as a root.", name);
                None
            }
            parent => parent,
        };
        let key = self.nodes.insert(SceneNode {
            name: name.to_string(),
            parent,
            children: vec![],
            translation: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
            watchers: vec![],
        });
        if let Some(parent) = parent {
            if let Some(parent_node) = self.nodes.get_mut(parent) {
                parent_node.children.push(key);
            }
        }
        key
    }

    /// Re-parents `child` under `parent`. Refuses to create cycles.
    pub fn add_child(&mut self, parent: NodeKey, child: NodeKey) -> bool {
        if !self.nodes.contains_key(parent) || !self.nodes.contains_key(child) {
            return false;
        }
        if parent == child || self.is_ancestor(child, parent) {
            log::warn!(
                "Refusing to parent {} under its own descendant {}.",
                self.nodes[child].name,
                self.nodes[parent].name
            );
            return false;
        }
        if let Some(old_parent) = self.nodes[child].parent {
            if let Some(old_parent_node) = self.nodes.get_mut(old_parent) {
                old_parent_node.children.retain(|c| *c != child);
            }
        }
        self.nodes[child].parent = Some(parent);
        self.nodes[parent].children.push(child);
        self.mark_changed(child);
        true
    }

    pub fn contains(&self, key: NodeKey) -> bool {
        self.nodes.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn name(&self, key: NodeKey) -> Option<&str> {
        self.nodes.get(key).map(|n| n.name.as_str())
    }

    pub fn parent(&self, key: NodeKey) -> Option<NodeKey> {
        self.nodes.get(key).and_then(|n| n.parent)
    }

    pub fn children(&self, key: NodeKey) -> &[NodeKey] {
        self.nodes
            .get(key)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    fn is_ancestor(&self, ancestor: NodeKey, node: NodeKey) -> bool {
        let mut current = self.parent(node);
        while let Some(key) = current {
            if key == ancestor {
                return true;
            }
            current = self.parent(key);
        }
        false
    }

    /// Walks `path` segment by segment from `root`, matching child names.
    /// Empty segments are ignored, so an empty path resolves to `root`.
    pub fn get_child_by_path(&self, root: NodeKey, path: &str) -> Option<NodeKey> {
        if !self.nodes.contains_key(root) {
            return None;
        }
        let mut current = root;
        for segment in path.split('/').filter(|s| !s.is_empty()) {
            current = *self
                .children(current)
                .iter()
                .find(|child| self.nodes[**child].name == segment)?;
        }
        Some(current)
    }

    /// Slash-joined names from just below `ancestor` down to `node`.
    /// Returns `None` if `ancestor` is not an ancestor of `node`.
    pub fn path_between(&self, ancestor: NodeKey, node: NodeKey) -> Option<String> {
        let mut segments = vec![];
        let mut current = node;
        while current != ancestor {
            let scene_node = self.nodes.get(current)?;
            segments.push(scene_node.name.as_str());
            current = scene_node.parent?;
        }
        segments.reverse();
        Some(segments.join("/"))
    }

    /// Pre-order list of `root` and everything below it.
    pub fn descendants(&self, root: NodeKey) -> Vec<NodeKey> {
        let mut result = vec![];
        let mut stack = vec![root];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                result.push(current);
                stack.extend(node.children.iter().rev().copied());
            }
        }
        result
    }

    pub fn translation(&self, key: NodeKey) -> Option<Vec3> {
        self.nodes.get(key).map(|n| n.translation)
    }

    pub fn rotation(&self, key: NodeKey) -> Option<Quat> {
        self.nodes.get(key).map(|n| n.rotation)
    }

    pub fn scale(&self, key: NodeKey) -> Option<Vec3> {
        self.nodes.get(key).map(|n| n.scale)
    }

    pub fn set_rts(&mut self, key: NodeKey, rotation: Quat, translation: Vec3, scale: Vec3) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.rotation = rotation;
            node.translation = translation;
            node.scale = scale;
            self.mark_changed(key);
        }
    }

    pub fn set_translation(&mut self, key: NodeKey, translation: Vec3) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.translation = translation;
            self.mark_changed(key);
        }
    }

    pub fn set_rotation(&mut self, key: NodeKey, rotation: Quat) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.rotation = rotation;
            self.mark_changed(key);
        }
    }

    pub fn set_scale(&mut self, key: NodeKey, scale: Vec3) {
        if let Some(node) = self.nodes.get_mut(key) {
            node.scale = scale;
            self.mark_changed(key);
        }
    }

    pub fn local_matrix(&self, key: NodeKey) -> Mat4 {
        self.nodes
            .get(key)
            .map(|n| Mat4::from_scale_rotation_translation(n.scale, n.rotation, n.translation))
            .unwrap_or(Mat4::IDENTITY)
    }

    pub fn world_matrix(&self, key: NodeKey) -> Mat4 {
        let mut world = self.local_matrix(key);
        let mut current = self.parent(key);
        while let Some(parent) = current {
            world = self.local_matrix(parent) * world;
            current = self.parent(parent);
        }
        world
    }

    pub fn world_position(&self, key: NodeKey) -> Vec3 {
        self.world_matrix(key).transform_point3(Vec3::ZERO)
    }

    /// Registers interest in world transform changes of `nodes`.
    /// A fresh subscription starts out changed.
    pub fn subscribe(&mut self, nodes: &[NodeKey]) -> SubscriptionKey {
        let nodes: Vec<NodeKey> = nodes
            .iter()
            .copied()
            .filter(|n| self.nodes.contains_key(*n))
            .collect();
        let key = self.subscriptions.insert(Subscription {
            nodes: nodes.clone(),
            changed: true,
        });
        for node in nodes.into_iter() {
            self.nodes[node].watchers.push(key);
        }
        key
    }

    pub fn watch_hierarchy(&mut self, roots: &[NodeKey]) -> SubscriptionKey {
        let nodes: Vec<NodeKey> = roots
            .iter()
            .flat_map(|root| self.descendants(*root))
            .collect();
        self.subscribe(&nodes)
    }

    pub fn is_changed(&self, key: SubscriptionKey) -> bool {
        self.subscriptions
            .get(key)
            .map(|s| s.changed)
            .unwrap_or(false)
    }

    /// Returns whether anything watched moved since the last call, and resets
    /// the flag.
    pub fn take_changed(&mut self, key: SubscriptionKey) -> bool {
        match self.subscriptions.get_mut(key) {
            Some(subscription) => std::mem::replace(&mut subscription.changed, false),
            None => false,
        }
    }

    pub fn unsubscribe(&mut self, key: SubscriptionKey) -> bool {
        let subscription = match self.subscriptions.remove(key) {
            Some(subscription) => subscription,
            None => return false,
        };
        for node in subscription.nodes.iter() {
            if let Some(scene_node) = self.nodes.get_mut(*node) {
                scene_node.watchers.retain(|w| *w != key);
            }
        }
        true
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    fn mark_changed(&mut self, key: NodeKey) {
        let mut stack = vec![key];
        while let Some(current) = stack.pop() {
            if let Some(node) = self.nodes.get(current) {
                for watcher in node.watchers.iter() {
                    if let Some(subscription) = self.subscriptions.get_mut(*watcher) {
                        subscription.changed = true;
                    }
                }
                stack.extend(node.children.iter().copied());
            }
        }
    }
}
