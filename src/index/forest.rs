//! Random-projection forest for approximate nearest neighbours
//!
//! Each tree recursively splits the item set by the perpendicular bisector of
//! two sampled items until leaves hold at most [`LEAF_SIZE`] ids. A query walks
//! all trees best-first (smallest margin to a split plane explored last),
//! gathers `search_k` candidate ids and reranks them by exact Euclidean
//! distance.

use crate::{Error, Result};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};
use std::fs;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

/// Dimensionality of the latent index
pub const INDEX_DIM: usize = 3;

/// Default number of trees
pub const DEFAULT_TREES: usize = 32;

/// Maximum number of ids in a leaf
pub const LEAF_SIZE: usize = 16;

/// Candidate bisectors tried per split; the most balanced one wins
const SPLIT_ATTEMPTS: usize = 4;

const MAGIC: &[u8; 8] = b"LTNTANN\0";
const VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
enum Node {
    Leaf(Vec<u32>),
    Split {
        normal: Vec<f32>,
        offset: f32,
        left: u32,
        right: u32,
    },
}

#[derive(Serialize, Deserialize)]
struct IndexFile {
    version: u32,
    dim: usize,
    items: Vec<Option<Vec<f32>>>,
    nodes: Vec<Node>,
    roots: Vec<u32>,
}

/// Approximate nearest-neighbour index over Euclidean space
///
/// Items are added by id, then the forest is built once; a built index is
/// immutable and can be saved and loaded.
#[derive(Debug, Clone)]
pub struct LatentIndex {
    dim: usize,
    items: Vec<Option<Vec<f32>>>,
    nodes: Vec<Node>,
    roots: Vec<u32>,
    rng: StdRng,
}

impl LatentIndex {
    /// Create an empty index over `dim`-dimensional vectors
    pub fn new(dim: usize) -> Self {
        Self::with_seed(dim, 0)
    }

    /// Create an empty index whose tree construction is seeded
    pub fn with_seed(dim: usize, seed: u64) -> Self {
        Self {
            dim,
            items: Vec::new(),
            nodes: Vec::new(),
            roots: Vec::new(),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Vector dimensionality
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Number of items added
    pub fn len(&self) -> usize {
        self.items.iter().filter(|v| v.is_some()).count()
    }

    /// Whether no items were added
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether the forest has been built
    pub fn is_built(&self) -> bool {
        !self.roots.is_empty()
    }

    /// Number of trees in the built forest
    pub fn n_trees(&self) -> usize {
        self.roots.len()
    }

    /// Add `vector` under `id`
    ///
    /// Replaces any vector previously added under the same id. Fails once the
    /// index is built.
    pub fn add_item(&mut self, id: usize, vector: &[f32]) -> Result<()> {
        if self.is_built() {
            return Err(Error::Index("cannot add items to a built index".into()));
        }
        self.check_dim(vector)?;
        if id >= self.items.len() {
            self.items.resize(id + 1, None);
        }
        self.items[id] = Some(vector.to_vec());
        Ok(())
    }

    /// Stored vector of `id`
    pub fn get_item_vector(&self, id: usize) -> Option<&[f32]> {
        self.items.get(id).and_then(|v| v.as_deref())
    }

    /// Build `n_trees` trees over the added items
    ///
    /// An index with no items still builds; every query on it returns nothing.
    pub fn build(&mut self, n_trees: usize) -> Result<()> {
        if n_trees == 0 {
            return Err(Error::Index("n_trees must be at least 1".into()));
        }
        if self.is_built() {
            return Err(Error::Index("index is already built".into()));
        }

        let ids: Vec<u32> = self
            .items
            .iter()
            .enumerate()
            .filter(|(_, v)| v.is_some())
            .map(|(i, _)| i as u32)
            .collect();

        for _ in 0..n_trees {
            let root = self.build_tree(ids.clone());
            self.roots.push(root);
        }

        tracing::debug!(
            items = ids.len(),
            trees = n_trees,
            nodes = self.nodes.len(),
            "built latent index"
        );
        Ok(())
    }

    fn build_tree(&mut self, ids: Vec<u32>) -> u32 {
        let root = self.push_node(Node::Leaf(Vec::new()));
        let mut pending = vec![(root, ids)];

        while let Some((slot, ids)) = pending.pop() {
            if ids.len() <= LEAF_SIZE {
                self.nodes[slot as usize] = Node::Leaf(ids);
                continue;
            }
            let (normal, offset, left_ids, right_ids) = self.split(&ids);
            let left = self.push_node(Node::Leaf(Vec::new()));
            let right = self.push_node(Node::Leaf(Vec::new()));
            self.nodes[slot as usize] = Node::Split {
                normal,
                offset,
                left,
                right,
            };
            pending.push((left, left_ids));
            pending.push((right, right_ids));
        }
        root
    }

    fn push_node(&mut self, node: Node) -> u32 {
        self.nodes.push(node);
        (self.nodes.len() - 1) as u32
    }

    /// Choose a split plane for `ids`, falling back to a random halving when
    /// the items cannot be separated
    fn split(&mut self, ids: &[u32]) -> (Vec<f32>, f32, Vec<u32>, Vec<u32>) {
        let mut best: Option<(Vec<f32>, f32, Vec<u32>, Vec<u32>)> = None;

        for _ in 0..SPLIT_ATTEMPTS {
            let (Some(&a), Some(&b)) = (ids.choose(&mut self.rng), ids.choose(&mut self.rng))
            else {
                break;
            };
            let (pa, pb) = (self.vector(a), self.vector(b));
            let normal: Vec<f32> = pa.iter().zip(pb).map(|(x, y)| x - y).collect();
            if normal.iter().all(|v| *v == 0.0) {
                continue;
            }
            let midpoint: Vec<f32> = pa.iter().zip(pb).map(|(x, y)| (x + y) / 2.0).collect();
            let offset = -dot(&normal, &midpoint);

            let (left, right): (Vec<u32>, Vec<u32>) = ids
                .iter()
                .copied()
                .partition(|&id| margin(&normal, offset, self.vector(id)) <= 0.0);
            if left.is_empty() || right.is_empty() {
                continue;
            }

            let imbalance = left.len().abs_diff(right.len());
            let better = best
                .as_ref()
                .map_or(true, |(_, _, l, r)| imbalance < l.len().abs_diff(r.len()));
            if better {
                best = Some((normal, offset, left, right));
            }
        }

        best.unwrap_or_else(|| {
            // Degenerate (e.g. duplicate points): a zero plane sends queries
            // down both sides with equal priority
            let mut shuffled = ids.to_vec();
            for i in (1..shuffled.len()).rev() {
                let j = self.rng.random_range(0..=i);
                shuffled.swap(i, j);
            }
            let right = shuffled.split_off(shuffled.len() / 2);
            (vec![0.0; self.dim], 0.0, shuffled, right)
        })
    }

    fn vector(&self, id: u32) -> &[f32] {
        self.items[id as usize].as_deref().unwrap_or(&[])
    }

    fn check_dim(&self, vector: &[f32]) -> Result<()> {
        if vector.len() != self.dim {
            return Err(Error::shape("index vector", vec![self.dim], vec![vector.len()]));
        }
        Ok(())
    }

    /// The `k` nearest items to `vector` as `(id, distance)`, closest first
    ///
    /// `search_k` bounds how many candidates are gathered before reranking;
    /// `None` uses `n_trees * k`. Larger values are slower and more exact.
    pub fn get_nns_by_vector(
        &self,
        vector: &[f32],
        k: usize,
        search_k: Option<usize>,
    ) -> Result<Vec<(usize, f32)>> {
        if !self.is_built() {
            return Err(Error::Index("index must be built before querying".into()));
        }
        self.check_dim(vector)?;
        if k == 0 {
            return Ok(Vec::new());
        }
        let search_k = search_k.unwrap_or(self.roots.len() * k).max(k);

        let mut queue: BinaryHeap<Frontier> = self
            .roots
            .iter()
            .map(|&node| Frontier {
                priority: f32::INFINITY,
                node,
            })
            .collect();
        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        while candidates.len() < search_k {
            let Some(Frontier { priority, node }) = queue.pop() else {
                break;
            };
            match &self.nodes[node as usize] {
                Node::Leaf(ids) => {
                    for &id in ids {
                        if seen.insert(id) {
                            candidates.push(id);
                        }
                    }
                }
                Node::Split {
                    normal,
                    offset,
                    left,
                    right,
                } => {
                    let m = margin(normal, *offset, vector);
                    queue.push(Frontier {
                        priority: priority.min(m),
                        node: *right,
                    });
                    queue.push(Frontier {
                        priority: priority.min(-m),
                        node: *left,
                    });
                }
            }
        }

        let mut scored: Vec<(usize, f32)> = candidates
            .into_iter()
            .map(|id| (id as usize, euclidean(vector, self.vector(id))))
            .collect();
        scored.sort_by(|a, b| nan_last(a.1, b.1).then(a.0.cmp(&b.0)));
        scored.truncate(k);
        Ok(scored)
    }

    /// Persist a built index
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        if !self.is_built() {
            return Err(Error::Index("only a built index can be saved".into()));
        }
        let file = IndexFile {
            version: VERSION,
            dim: self.dim,
            items: self.items.clone(),
            nodes: self.nodes.clone(),
            roots: self.roots.clone(),
        };

        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let mut writer = BufWriter::new(fs::File::create(path)?);
        writer.write_all(MAGIC)?;
        bincode::serialize_into(&mut writer, &file)?;
        writer.flush()?;
        Ok(())
    }

    /// Load an index written by [`LatentIndex::save`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut reader = BufReader::new(fs::File::open(path.as_ref())?);
        let mut magic = [0u8; 8];
        reader
            .read_exact(&mut magic)
            .map_err(|_| Error::Index("file too short for a latent index".into()))?;
        if &magic != MAGIC {
            return Err(Error::Index("not a latent index file".into()));
        }

        let file: IndexFile = bincode::deserialize_from(&mut reader)?;
        if file.version != VERSION {
            return Err(Error::Index(format!(
                "unsupported index version {} (expected {VERSION})",
                file.version
            )));
        }
        if file.roots.is_empty() {
            return Err(Error::Index("index file has no trees".into()));
        }
        let node_count = file.nodes.len() as u32;
        let dangling = file.roots.iter().any(|&r| r >= node_count)
            || file.nodes.iter().any(|n| match n {
                Node::Split { left, right, .. } => *left >= node_count || *right >= node_count,
                Node::Leaf(ids) => ids
                    .iter()
                    .any(|&id| file.items.get(id as usize).map_or(true, Option::is_none)),
            });
        if dangling {
            return Err(Error::Index("index file references missing nodes or items".into()));
        }

        Ok(Self {
            dim: file.dim,
            items: file.items,
            nodes: file.nodes,
            roots: file.roots,
            rng: StdRng::seed_from_u64(0),
        })
    }
}

#[derive(Debug, Clone, Copy)]
struct Frontier {
    priority: f32,
    node: u32,
}

impl Eq for Frontier {}

impl PartialEq for Frontier {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl PartialOrd for Frontier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Frontier {
    fn cmp(&self, other: &Self) -> Ordering {
        // max-heap, so NaN margins rank lowest and are popped last
        let by_priority = match (self.priority.is_nan(), other.priority.is_nan()) {
            (true, true) => Ordering::Equal,
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            (false, false) => self.priority.total_cmp(&other.priority),
        };
        by_priority.then_with(|| other.node.cmp(&self.node))
    }
}

/// Total order on `f32` that puts NaN of either sign after every number
fn nan_last(a: f32, b: f32) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => a.total_cmp(&b),
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[inline]
fn margin(normal: &[f32], offset: f32, v: &[f32]) -> f32 {
    dot(normal, v) + offset
}

#[inline]
fn euclidean(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}
