//! A binned-SAH bounding volume hierarchy over triangles.
//!
//! # Layout
//!
//! The tree is a flat array of [`LinearNode`]s in which every parent
//! precedes both children: the left child of node `i` is implicitly at
//! `i + 1`, the right child's index is stored in `offset`. Leaves reuse
//! `offset` as the start of their triangle range. The root is node 0.
//! There are no pointers, no cycles, and the whole index is two `Vec`s.
//!
//! # Build
//!
//! Top-down over an explicit stack of pending index ranges. Each interior
//! split bins triangle centroids into 256 strata along the widest
//! centroid-extent axis and picks the plane minimizing
//! `left_count * left_area + right_count * right_area`. Splits that fail
//! to separate anything (all centroids on one side, or coincident) fall
//! back to a median partition. Leaf triangles are stored denormalized —
//! three vertex positions copied out of the mesh — so traversal never
//! touches the original index buffer.
//!
//! # Traversal
//!
//! Per ray: descend while the slab test passes, pushing the far child and
//! visiting the near child first as decided by the ray direction's sign
//! on the node's split axis. Closest hits shrink the ray's `t_max` in
//! place, so later subtrees are culled by earlier hits. Shadow queries
//! stop at the first intersection.

// others
use smallvec::SmallVec;
// bvh
use crate::core::bvh::{clamp_t, Accelerator, Float, Hit, TRACE_SHADOW};
use crate::core::geometry::{bnd3_union_bnd3, bnd3_union_pnt3, Bounds3f, Point3f, Ray, Vector3f};
use crate::core::mesh::TriangleMesh;
use crate::core::triangle::WoopRay;

/// Leaves hold at most this many triangles unless overridden.
pub const MAX_NODE_SIZE: u32 = 4;

/// Number of SAH strata per split.
const N_BUCKETS: usize = 256;

/// Parent sentinel for the root range during the build.
const INVALID: u32 = 0xffff_ffff;

/// One node of the flattened tree.
///
/// `count == 0` marks an interior node: `offset` is the right child's
/// index and `axis` the split axis. `count > 0` marks a leaf covering
/// triangles `[offset, offset + count)` of the owned triangle array.
#[derive(Debug, Default, Copy, Clone, PartialEq)]
pub struct LinearNode {
    pub bounds: Bounds3f,
    pub offset: u32,
    pub count: u16,
    pub axis: u16,
}

/// A triangle copied out of the source mesh, remembering its original
/// index for hit reporting.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Triangle {
    pub p0: Point3f,
    pub p1: Point3f,
    pub p2: Point3f,
    pub index: u32,
}

/// Per-triangle build summary: geometric bounds, centroid, source index.
#[derive(Debug, Copy, Clone)]
struct PrimitiveInfo {
    bounds: Bounds3f,
    centroid: Point3f,
    index: u32,
}

/// A pending subrange of the primitive array awaiting its split.
///
/// `parent` is the node whose right-child offset this range will fill
/// when it is popped, or `INVALID` for ranges that become left children
/// (their index is implied) and the root.
#[derive(Debug, Copy, Clone)]
struct BuildVolume {
    first: u32,
    last: u32,
    parent: u32,
    centroid_bounds: Bounds3f,
}

#[derive(Debug, Copy, Clone)]
struct BucketInfo {
    count: usize,
    bounds: Bounds3f,
}

impl Default for BucketInfo {
    fn default() -> Self {
        BucketInfo {
            count: 0_usize,
            bounds: Bounds3f::default(),
        }
    }
}

/// The straightforward single-threaded BVH.
pub struct SimpleAccel {
    max_node_size: u32,
    pub nodes: Vec<LinearNode>,
    pub triangles: Vec<Triangle>,
}

impl Default for SimpleAccel {
    fn default() -> Self {
        SimpleAccel::new()
    }
}

impl SimpleAccel {
    pub fn new() -> Self {
        SimpleAccel::with_max_node_size(MAX_NODE_SIZE)
    }

    /// Override the leaf capacity. Values are clamped to `[1, 255]`.
    pub fn with_max_node_size(max_node_size: u32) -> Self {
        SimpleAccel {
            max_node_size: clamp_t(max_node_size, 1, 255),
            nodes: Vec::new(),
            triangles: Vec::new(),
        }
    }

    /// Split one pending range: bin centroids along `axis`, pick the
    /// cheapest plane, and partition `prims[first..last]` in place.
    /// Returns the pivot and the children's centroid bounds; a pivot
    /// equal to `first` or `last` means the split degenerated.
    fn partition_sah(
        prims: &mut [PrimitiveInfo],
        vol: &BuildVolume,
        axis: usize,
    ) -> (u32, Bounds3f, Bounds3f) {
        let cmin = vol.centroid_bounds.p_min[axis];
        let cmax = vol.centroid_bounds.p_max[axis];
        // coincident centroids cannot be separated on this axis; report a
        // degenerate pivot and let the caller take the median
        if cmax <= cmin {
            return (vol.first, Bounds3f::default(), Bounds3f::default());
        }

        // the slack factor keeps the topmost centroid inside the last bucket
        let scale = N_BUCKETS as Float / ((cmax - cmin) * 1.00001);

        let mut buckets = [BucketInfo::default(); N_BUCKETS];
        for prim in &prims[vol.first as usize..vol.last as usize] {
            let b = ((prim.centroid[axis] - cmin) * scale) as usize;
            debug_assert!(b < N_BUCKETS);
            buckets[b].count += 1;
            buckets[b].bounds = bnd3_union_bnd3(&buckets[b].bounds, &prim.bounds);
        }

        // suffix sums: everything in buckets [i, N_BUCKETS)
        let mut right_count = [0_usize; N_BUCKETS];
        let mut right_bounds = [Bounds3f::default(); N_BUCKETS];
        let mut count_acc = 0_usize;
        let mut bounds_acc = Bounds3f::default();
        for i in (0..N_BUCKETS).rev() {
            count_acc += buckets[i].count;
            bounds_acc = bnd3_union_bnd3(&bounds_acc, &buckets[i].bounds);
            right_count[i] = count_acc;
            right_bounds[i] = bounds_acc;
        }

        // sweep the candidate planes; ties keep the first minimum
        let mut best_bucket = 1_usize;
        let mut best_cost = std::f32::INFINITY;
        let mut left_count = 0_usize;
        let mut left_bounds = Bounds3f::default();
        for i in 1..N_BUCKETS {
            left_count += buckets[i - 1].count;
            left_bounds = bnd3_union_bnd3(&left_bounds, &buckets[i - 1].bounds);
            let cost = left_count as Float * left_bounds.surface_area()
                + right_count[i] as Float * right_bounds[i].surface_area();
            if cost < best_cost {
                best_cost = cost;
                best_bucket = i;
            }
        }
        let split = cmin + best_bucket as Float / scale;

        // in-place partition with swap-to-end; track the children's
        // centroid bounds as elements land on their side
        let mut left_cb = Bounds3f::default();
        let mut right_cb = Bounds3f::default();
        let mut l = vol.first;
        let mut r = vol.last;
        while l < r {
            if prims[l as usize].centroid[axis] < split {
                left_cb = bnd3_union_pnt3(&left_cb, &prims[l as usize].centroid);
                l += 1;
            } else {
                right_cb = bnd3_union_pnt3(&right_cb, &prims[l as usize].centroid);
                r -= 1;
                prims.swap(l as usize, r as usize);
            }
        }

        (l, left_cb, right_cb)
    }

    /// Trace a single ray; `stack` is caller-provided scratch so a batch
    /// reuses one allocation.
    fn trace_ray(&self, ray: &mut Ray, flags: u32, stack: &mut SmallVec<[u32; 64]>) -> Hit {
        let mut hit = Hit::default();
        if self.nodes.is_empty() {
            return hit;
        }

        let inv_dir = Vector3f {
            x: 1.0 / ray.d.x,
            y: 1.0 / ray.d.y,
            z: 1.0 / ray.d.z,
        };
        let woop = WoopRay::new(&ray.o, &ray.d);

        stack.clear();
        let mut node_index: u32 = 0;
        loop {
            let node = &self.nodes[node_index as usize];
            if node
                .bounds
                .intersect_p(&ray.o, &inv_dir, ray.t_min, ray.t_max)
            {
                if node.count == 0 {
                    // interior: visit the near child first
                    if ray.d[node.axis as usize] > 0.0 {
                        stack.push(node.offset);
                        node_index += 1;
                    } else {
                        stack.push(node_index + 1);
                        node_index = node.offset;
                    }
                    continue;
                }

                // leaf
                let first = node.offset as usize;
                let mut occluded = false;
                for tri in &self.triangles[first..first + node.count as usize] {
                    if let Some(th) = woop.intersect(ray.t_min, ray.t_max, &tri.p0, &tri.p1, &tri.p2)
                    {
                        ray.t_max = th.t;
                        hit.triangle = tri.index;
                        hit.u = th.u;
                        hit.v = th.v;
                        if flags & TRACE_SHADOW != 0 {
                            occluded = true;
                            break;
                        }
                    }
                }
                if occluded {
                    // occlusion sentinel; not a triangle index
                    hit.triangle = 0;
                    break;
                }
            }

            match stack.pop() {
                Some(next) => node_index = next,
                None => break,
            }
        }

        hit
    }
}

impl Accelerator for SimpleAccel {
    fn build(&mut self, mesh: &TriangleMesh) {
        self.nodes.clear();
        self.triangles.clear();

        let n_triangles = mesh.n_triangles;
        if n_triangles == 0 {
            return;
        }
        self.triangles.reserve(n_triangles as usize);

        // per-triangle summaries and the root centroid volume
        let mut prims: Vec<PrimitiveInfo> = Vec::with_capacity(n_triangles as usize);
        let mut root = BuildVolume {
            first: 0,
            last: n_triangles,
            parent: INVALID,
            centroid_bounds: Bounds3f::default(),
        };
        for ii in 0..n_triangles {
            let (p0, p1, p2) = mesh.triangle(ii);
            let bounds = bnd3_union_pnt3(&Bounds3f::new(p0, p1), &p2);
            let centroid = (p0 + p1 + p2) * (1.0 / 3.0);
            root.centroid_bounds = bnd3_union_pnt3(&root.centroid_bounds, &centroid);
            prims.push(PrimitiveInfo {
                bounds,
                centroid,
                index: ii,
            });
        }

        // split every pending volume, processing left children eagerly
        // and stacking right children for later
        let mut pending: Vec<BuildVolume> = Vec::new();
        let mut vol = root;
        loop {
            let node_index = self.nodes.len() as u32;
            self.nodes.push(LinearNode::default());
            if vol.parent != INVALID {
                self.nodes[vol.parent as usize].offset = node_index;
            }

            let count = vol.last - vol.first;
            if count <= self.max_node_size {
                // leaf: copy the triangles out and bound their vertices
                let offset = self.triangles.len() as u32;
                let mut bounds = Bounds3f::default();
                for prim in &prims[vol.first as usize..vol.last as usize] {
                    let (p0, p1, p2) = mesh.triangle(prim.index);
                    bounds = bnd3_union_pnt3(&bounds, &p0);
                    bounds = bnd3_union_pnt3(&bounds, &p1);
                    bounds = bnd3_union_pnt3(&bounds, &p2);
                    self.triangles.push(Triangle {
                        p0,
                        p1,
                        p2,
                        index: prim.index,
                    });
                }
                let node = &mut self.nodes[node_index as usize];
                node.bounds = bounds;
                node.offset = offset;
                node.count = count as u16;

                match pending.pop() {
                    Some(next) => {
                        vol = next;
                        continue;
                    }
                    None => break,
                }
            }

            // interior: split along the widest centroid extent
            let axis = vol.centroid_bounds.maximum_extent();
            self.nodes[node_index as usize].axis = axis as u16;

            let (mut l, mut left_cb, mut right_cb) =
                SimpleAccel::partition_sah(&mut prims, &vol, axis);
            if l == vol.first || l == vol.last {
                // nothing separated: split the range down the middle and
                // let each child redo its own binning over the full
                // parent centroid bounds
                l = (vol.first + vol.last) / 2;
                left_cb = vol.centroid_bounds;
                right_cb = vol.centroid_bounds;
            }

            pending.push(BuildVolume {
                first: l,
                last: vol.last,
                parent: node_index,
                centroid_bounds: right_cb,
            });
            vol = BuildVolume {
                first: vol.first,
                last: l,
                parent: INVALID,
                centroid_bounds: left_cb,
            };
        }

        // propagate child bounds into interior nodes; parents precede
        // children so a single backwards pass suffices
        for idx in (0..self.nodes.len()).rev() {
            if self.nodes[idx].count == 0 {
                let left = self.nodes[idx + 1].bounds;
                let right = self.nodes[self.nodes[idx].offset as usize].bounds;
                self.nodes[idx].bounds = bnd3_union_bnd3(&left, &right);
            }
        }
    }

    fn trace(&self, rays: &mut [Ray], hits: &mut [Hit], flags: u32) {
        assert_eq!(rays.len(), hits.len());
        let mut stack: SmallVec<[u32; 64]> = SmallVec::new();
        for (ray, hit) in rays.iter_mut().zip(hits.iter_mut()) {
            *hit = self.trace_ray(ray, flags, &mut stack);
        }
    }
}
