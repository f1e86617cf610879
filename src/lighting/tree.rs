//! Light tree construction.
//!
//! Every light-surface interaction is an [`Rdf`] node stored in one flat,
//! append-only [`JumbleMap`]. Emissive triangles get a bounce-0 root; a
//! FIFO work queue then propagates each popped node to every surface its
//! triangle can see.
//!
//! Propagation currently stops one hop past the roots: children are
//! recorded (and registered on the receiving surface) but not pushed back
//! onto the queue. Brightness is carried from the source unattenuated.

use std::collections::VecDeque;
use std::ops::Index;

use rayon::prelude::*;

use crate::util::Vec3;

use super::config::LightingConfig;
use super::directory::SurfaceDirectory;

/// Radiance distribution function node: one light-surface interaction.
#[derive(Clone, Debug, PartialEq)]
pub struct Rdf {
    /// Triangle (directory index) this interaction lands on.
    pub directory: u32,
    /// 0 for an emissive source.
    pub bounce: u32,
    /// Jumble map index of the node this light arrived from.
    pub parent: Option<u32>,
    pub children: Vec<u32>,
    /// Emitter color tinted by every surface along the path.
    pub color: Vec3,
    /// Brightness carried from the source.
    pub light_brightness: f32,
    pub lightness: f32,
    /// Shadow casters between parent and this surface. Always empty: shadows
    /// are resolved per fragment by the renderer.
    pub shadows: Vec<u32>,
}

impl Rdf {
    /// Bounce-0 node for an emissive surface.
    pub fn root(directory: u32, dir: &SurfaceDirectory) -> Self {
        Self {
            directory,
            bounce: 0,
            parent: None,
            children: Vec::new(),
            color: dir.color,
            light_brightness: dir.emissive_strength,
            lightness: dir.emissive_strength,
            shadows: Vec::new(),
        }
    }

    #[inline]
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }
}

/// Append-only RDF store. Indices are stable for the lifetime of a build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JumbleMap {
    nodes: Vec<Rdf>,
}

impl JumbleMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a node, returning its index.
    pub fn push(&mut self, node: Rdf) -> u32 {
        let index = self.nodes.len() as u32;
        self.nodes.push(node);
        index
    }

    /// Link an existing child to its parent.
    fn add_child(&mut self, parent: u32, child: u32) {
        self.nodes[parent as usize].children.push(child);
    }

    #[inline]
    pub fn get(&self, index: u32) -> Option<&Rdf> {
        self.nodes.get(index as usize)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn nodes(&self) -> &[Rdf] {
        &self.nodes
    }

    pub fn iter(&self) -> impl Iterator<Item = (u32, &Rdf)> {
        self.nodes.iter().enumerate().map(|(i, n)| (i as u32, n))
    }
}

impl Index<u32> for JumbleMap {
    type Output = Rdf;

    fn index(&self, index: u32) -> &Rdf {
        &self.nodes[index as usize]
    }
}

/// Result of one full light tree build.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LightTree {
    pub jumble: JumbleMap,
    /// Jumble indices of the bounce-0 nodes, in triangle order.
    pub roots: Vec<u32>,
    /// Queue pops performed.
    pub iterations: usize,
    /// Set when the iteration budget ran out with work still queued.
    pub truncated: bool,
}

impl LightTree {
    pub fn node_count(&self) -> usize {
        self.jumble.len()
    }

    /// Highest bounce present, `None` for an empty tree.
    pub fn max_bounce(&self) -> Option<u32> {
        self.jumble.nodes().iter().map(|n| n.bounce).max()
    }

    pub fn count_at_bounce(&self, bounce: u32) -> usize {
        self.jumble.nodes().iter().filter(|n| n.bounce == bounce).count()
    }
}

/// Children of `parent` on every surface its triangle sees.
fn spawn_children(
    parent: &Rdf,
    parent_index: u32,
    directories: &[SurfaceDirectory],
    config: &LightingConfig,
) -> Vec<Rdf> {
    if parent.bounce >= config.max_bounces || parent.lightness < config.min_lightness {
        return Vec::new();
    }
    directories[parent.directory as usize]
        .visible_surfaces
        .iter()
        .map(|&receiver| Rdf {
            directory: receiver,
            bounce: parent.bounce + 1,
            parent: Some(parent_index),
            children: Vec::new(),
            color: parent.color * directories[receiver as usize].color,
            // TODO: attenuate by path distance once a falloff model replaces the flat carry.
            light_brightness: parent.light_brightness,
            lightness: 1.0,
            shadows: Vec::new(),
        })
        .collect()
}

/// Build the light tree from scratch.
///
/// Clears and repopulates `light_refs` on every directory. Terminates after
/// at most [`LightingConfig::iteration_cap`] queue pops; hitting the cap
/// with work left sets [`LightTree::truncated`].
#[tracing::instrument(skip_all, fields(surfaces = directories.len()))]
pub fn build_light_tree(directories: &mut [SurfaceDirectory], config: &LightingConfig) -> LightTree {
    for dir in directories.iter_mut() {
        dir.light_refs.clear();
    }

    let mut jumble = JumbleMap::new();
    let mut roots = Vec::new();
    for (i, dir) in directories.iter_mut().enumerate() {
        if dir.emissive_strength > config.emissive_threshold {
            let index = jumble.push(Rdf::root(i as u32, dir));
            dir.light_refs.push(index);
            roots.push(index);
        }
    }

    let cap = config.iteration_cap(directories.len());
    let mut tree = LightTree {
        jumble,
        roots,
        iterations: 0,
        truncated: false,
    };

    if config.parallel && tree.roots.len() > 1 {
        propagate_fragments(&mut tree, directories, config, cap);
    } else {
        propagate_queue(&mut tree, directories, config, cap);
    }

    if tree.truncated {
        tracing::warn!(
            iterations = tree.iterations,
            cap,
            "light tree truncated: iteration budget exhausted"
        );
    }
    tracing::info!(
        roots = tree.roots.len(),
        nodes = tree.jumble.len(),
        iterations = tree.iterations,
        "light tree built"
    );
    tree
}

/// Breadth-first propagation over the shared jumble map.
fn propagate_queue(
    tree: &mut LightTree,
    directories: &mut [SurfaceDirectory],
    config: &LightingConfig,
    cap: usize,
) {
    let mut queue: VecDeque<u32> = tree.roots.iter().copied().collect();

    while !queue.is_empty() {
        if tree.iterations >= cap {
            tree.truncated = true;
            break;
        }
        let Some(current) = queue.pop_front() else {
            break;
        };
        tree.iterations += 1;

        let children = spawn_children(&tree.jumble[current], current, directories, config);
        for child in children {
            let receiver = child.directory as usize;
            let index = tree.jumble.push(child);
            tree.jumble.add_child(current, index);
            directories[receiver].light_refs.push(index);
            // Not re-enqueued: propagation ends at the first bounce.
        }
    }
}

/// Nodes grown from one root in a thread-local buffer. Local index 0 is the root.
struct Fragment {
    nodes: Vec<Rdf>,
    pops: usize,
}

/// Same queue discipline as [`propagate_queue`], confined to one root.
fn grow_fragment(
    root: &Rdf,
    directories: &[SurfaceDirectory],
    config: &LightingConfig,
    budget: usize,
) -> Fragment {
    let mut nodes = vec![root.clone()];
    let mut queue = VecDeque::from([0u32]);
    let mut pops = 0;

    while pops < budget {
        let Some(current) = queue.pop_front() else {
            break;
        };
        pops += 1;

        let children = spawn_children(&nodes[current as usize], current, directories, config);
        for child in children {
            let index = nodes.len() as u32;
            nodes.push(child);
            nodes[current as usize].children.push(index);
        }
    }

    Fragment { nodes, pops }
}

/// Grow one fragment per root in parallel, then append them in root order.
///
/// Roots stay where they were pushed; every other node is renumbered into
/// the tail of the jumble map, which reproduces the sequential layout.
fn propagate_fragments(
    tree: &mut LightTree,
    directories: &mut [SurfaceDirectory],
    config: &LightingConfig,
    cap: usize,
) {
    // Every root costs at least one pop, so roots past the cap never run.
    let runnable = tree.roots.len().min(cap);
    let fragments: Vec<Fragment> = {
        let shared: &[SurfaceDirectory] = directories;
        let jumble = &tree.jumble;
        tree.roots[..runnable]
            .par_iter()
            .map(|&root| grow_fragment(&jumble[root], shared, config, cap))
            .collect()
    };

    for (&root, fragment) in tree.roots[..runnable].iter().zip(fragments) {
        if tree.iterations + fragment.pops > cap {
            tree.truncated = true;
            break;
        }
        tree.iterations += fragment.pops;

        let base = tree.jumble.len() as u32;
        let remap = |local: u32| if local == 0 { root } else { base + local - 1 };

        let mut nodes = fragment.nodes.into_iter();
        let Some(local_root) = nodes.next() else {
            continue;
        };
        tree.jumble.nodes[root as usize].children =
            local_root.children.iter().map(|&c| remap(c)).collect();

        for mut node in nodes {
            node.parent = node.parent.map(remap);
            node.children = node.children.iter().map(|&c| remap(c)).collect();
            let receiver = node.directory as usize;
            let index = tree.jumble.push(node);
            directories[receiver].light_refs.push(index);
        }
    }

    if runnable < tree.roots.len() {
        tree.truncated = true;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::Triangle;
    use crate::scene::Material;

    fn dir(emissive: f32, visible: Vec<u32>) -> SurfaceDirectory {
        let tri = Triangle::new(Vec3::ZERO, Vec3::X, Vec3::Y);
        let mut d = SurfaceDirectory::new(&tri, &Material::emissive(Vec3::splat(0.5), emissive));
        d.visible_surfaces = visible;
        d
    }

    fn sequential() -> LightingConfig {
        LightingConfig {
            parallel: false,
            ..LightingConfig::default()
        }
    }

    #[test]
    fn test_roots_only_for_emissive_above_threshold() {
        let mut dirs = vec![dir(1.0, vec![]), dir(0.1, vec![]), dir(0.0, vec![]), dir(0.5, vec![])];
        let tree = build_light_tree(&mut dirs, &sequential());
        assert_eq!(tree.roots, vec![0, 1]);
        assert_eq!(tree.jumble[0].directory, 0);
        assert_eq!(tree.jumble[1].directory, 3);
        assert!(tree.jumble.nodes().iter().all(|n| n.bounce == 0 && n.is_root()));
        assert_eq!(dirs[0].light_refs, vec![0]);
        assert!(dirs[1].light_refs.is_empty());
        assert_eq!(dirs[3].light_refs, vec![1]);
        assert!(!tree.truncated);
    }

    #[test]
    fn test_children_inherit_brightness() {
        let mut dirs = vec![dir(2.5, vec![1, 2]), dir(0.0, vec![]), dir(0.0, vec![])];
        let tree = build_light_tree(&mut dirs, &sequential());

        assert_eq!(tree.node_count(), 3);
        assert_eq!(tree.jumble[0].children, vec![1, 2]);
        for i in [1u32, 2] {
            let n = &tree.jumble[i];
            assert_eq!(n.bounce, 1);
            assert_eq!(n.parent, Some(0));
            assert_eq!(n.light_brightness, 2.5);
            assert_eq!(n.lightness, 1.0);
            assert_eq!(n.color, Vec3::splat(0.25));
            assert!(n.shadows.is_empty());
        }
        assert_eq!(dirs[1].light_refs, vec![1]);
        assert_eq!(dirs[2].light_refs, vec![2]);
        assert_eq!(tree.iterations, 1);
    }

    #[test]
    fn test_children_are_not_propagated_further() {
        // Chain 0 -> 1 -> 2. Only the first hop is built even with bounces to spare;
        // re-enqueueing children is the missing step for multi-bounce transport.
        let mut dirs = vec![dir(1.0, vec![1]), dir(0.0, vec![2]), dir(0.0, vec![])];
        let tree = build_light_tree(&mut dirs, &sequential());
        assert_eq!(tree.max_bounce(), Some(1));
        assert_eq!(tree.count_at_bounce(2), 0);
        assert!(dirs[2].light_refs.is_empty());
    }

    #[test]
    fn test_bounce_invariant() {
        let mut dirs = vec![
            dir(1.0, vec![1, 2, 3]),
            dir(0.9, vec![0, 2]),
            dir(0.0, vec![0]),
            dir(0.0, vec![]),
        ];
        let tree = build_light_tree(&mut dirs, &sequential());
        for (i, node) in tree.jumble.iter() {
            match node.parent {
                Some(p) => {
                    assert!(p < i, "parent precedes child");
                    assert_eq!(node.bounce, tree.jumble[p].bounce + 1);
                    assert!(tree.jumble[p].children.contains(&i));
                }
                None => assert_eq!(node.bounce, 0),
            }
        }
    }

    #[test]
    fn test_truncation_flag() {
        let mut dirs = vec![dir(1.0, vec![2]), dir(1.0, vec![2]), dir(0.0, vec![])];
        let config = LightingConfig {
            iteration_budget: Some(1),
            ..sequential()
        };
        let tree = build_light_tree(&mut dirs, &config);
        assert!(tree.truncated);
        assert_eq!(tree.iterations, 1);
        // Only the first root propagated.
        assert_eq!(tree.jumble[0].children.len(), 1);
        assert!(tree.jumble[1].children.is_empty());
        assert_eq!(dirs[2].light_refs.len(), 1);

        // Exactly enough budget is not a truncation.
        let config = LightingConfig {
            iteration_budget: Some(2),
            ..sequential()
        };
        let tree = build_light_tree(&mut dirs, &config);
        assert!(!tree.truncated);
    }

    #[test]
    fn test_min_lightness_blocks_propagation() {
        let mut dirs = vec![dir(0.5, vec![1]), dir(0.0, vec![])];
        let config = LightingConfig {
            min_lightness: 0.6,
            ..sequential()
        };
        let tree = build_light_tree(&mut dirs, &config);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_rebuild_clears_previous_refs() {
        let mut dirs = vec![dir(1.0, vec![1]), dir(0.0, vec![])];
        let first = build_light_tree(&mut dirs, &sequential());
        let second = build_light_tree(&mut dirs, &sequential());
        assert_eq!(first, second);
        assert_eq!(dirs[1].light_refs, vec![1]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let make = || {
            vec![
                dir(1.0, vec![2, 3]),
                dir(0.7, vec![3]),
                dir(0.0, vec![0]),
                dir(0.3, vec![0, 1, 2]),
            ]
        };
        let mut seq_dirs = make();
        let mut par_dirs = make();
        let seq = build_light_tree(&mut seq_dirs, &sequential());
        let par = build_light_tree(&mut par_dirs, &LightingConfig::default());
        assert_eq!(seq, par);
        for (a, b) in seq_dirs.iter().zip(&par_dirs) {
            assert_eq!(a.light_refs, b.light_refs);
        }

        // Truncation is identical too.
        for budget in 0..4 {
            let mut a = make();
            let mut b = make();
            let cfg = |parallel| LightingConfig {
                iteration_budget: Some(budget),
                parallel,
                ..LightingConfig::default()
            };
            assert_eq!(
                build_light_tree(&mut a, &cfg(false)),
                build_light_tree(&mut b, &cfg(true)),
                "budget {budget}"
            );
        }
    }
}
