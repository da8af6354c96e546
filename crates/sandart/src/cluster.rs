//! Air bubble clusters.
//!
//! A cluster is a maximal 4-connected group of Air cells. Clusters are
//! rebuilt from scratch every tick and carry no identity between ticks;
//! only their shape matters to the bubble rule.

use crate::cell::CellKind;
use crate::grid::Grid;
use glam::Vec2;

/// One connected group of Air cells and its bounding box.
#[derive(Clone, Debug, PartialEq)]
pub struct Cluster {
    pub cells: Vec<(usize, usize)>,
    pub min_x: usize,
    pub max_x: usize,
    pub min_y: usize,
    pub max_y: usize,
}

impl Cluster {
    fn seed(x: usize, y: usize) -> Self {
        Self {
            cells: Vec::new(),
            min_x: x,
            max_x: x,
            min_y: y,
            max_y: y,
        }
    }

    fn push(&mut self, x: usize, y: usize) {
        self.cells.push((x, y));
        self.min_x = self.min_x.min(x);
        self.max_x = self.max_x.max(x);
        self.min_y = self.min_y.min(y);
        self.max_y = self.max_y.max(y);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    #[inline]
    pub fn width(&self) -> usize {
        if self.cells.is_empty() {
            0
        } else {
            self.max_x - self.min_x + 1
        }
    }

    #[inline]
    pub fn height(&self) -> usize {
        if self.cells.is_empty() {
            0
        } else {
            self.max_y - self.min_y + 1
        }
    }

    /// Height over width, or 0 for a cluster with no width.
    pub fn ratio(&self) -> f32 {
        let width = self.width();
        if width == 0 {
            0.0
        } else {
            self.height() as f32 / width as f32
        }
    }

    /// Midpoint of the bounding box.
    pub fn center(&self) -> Vec2 {
        Vec2::new(
            (self.min_x + self.max_x) as f32 * 0.5,
            (self.min_y + self.max_y) as f32 * 0.5,
        )
    }

    /// True when the cluster is taller than the surface tension threshold allows.
    #[inline]
    pub fn should_split(&self, surface_tension: f32) -> bool {
        self.ratio() > surface_tension
    }
}

/// All clusters of a grid plus a per-cell lookup into them.
#[derive(Clone, Debug, Default)]
pub struct ClusterMap {
    width: usize,
    labels: Vec<Option<u32>>,
    clusters: Vec<Cluster>,
    stack: Vec<(usize, usize)>,
}

impl ClusterMap {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            labels: vec![None; width * height],
            clusters: Vec::new(),
            stack: Vec::new(),
        }
    }

    /// Recompute every cluster of `grid`, reusing this map's buffers.
    ///
    /// Clusters are numbered in row-major order of their first cell, so the
    /// result depends only on the grid.
    pub fn rebuild(&mut self, grid: &Grid) {
        let (width, height) = (grid.width(), grid.height());
        if self.width != width || self.labels.len() != width * height {
            self.width = width;
            self.labels = vec![None; width * height];
        } else {
            self.labels.fill(None);
        }
        self.clusters.clear();

        for y in 0..height {
            for x in 0..width {
                let idx = y * width + x;
                if grid.at(x, y) != CellKind::Air || self.labels[idx].is_some() {
                    continue;
                }
                let id = self.clusters.len() as u32;
                let cluster = self.flood(grid, x, y, id);
                self.clusters.push(cluster);
            }
        }
    }

    fn flood(&mut self, grid: &Grid, start_x: usize, start_y: usize, id: u32) -> Cluster {
        let width = self.width;
        let mut cluster = Cluster::seed(start_x, start_y);

        self.stack.clear();
        self.stack.push((start_x, start_y));
        self.labels[start_y * width + start_x] = Some(id);

        while let Some((x, y)) = self.stack.pop() {
            cluster.push(x, y);

            let neighbors = [
                (x as i32 - 1, y as i32),
                (x as i32 + 1, y as i32),
                (x as i32, y as i32 - 1),
                (x as i32, y as i32 + 1),
            ];
            for (nx, ny) in neighbors {
                if grid.get(nx, ny) != Some(CellKind::Air) {
                    continue;
                }
                let (nx, ny) = (nx as usize, ny as usize);
                let idx = ny * width + nx;
                if self.labels[idx].is_none() {
                    self.labels[idx] = Some(id);
                    self.stack.push((nx, ny));
                }
            }
        }

        cluster.cells.sort_unstable_by_key(|&(x, y)| (y, x));
        cluster
    }

    /// Cluster owning the Air cell at `(x, y)`, if any.
    pub fn cluster_at(&self, x: usize, y: usize) -> Option<&Cluster> {
        let label = (*self.labels.get(y * self.width + x)?)?;
        self.clusters.get(label as usize)
    }

    #[inline]
    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.clusters.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.clusters.is_empty()
    }
}

/// Flood-fill every Air cluster of `grid`.
pub fn find_clusters(grid: &Grid) -> ClusterMap {
    let mut map = ClusterMap::new(grid.width(), grid.height());
    map.rebuild(grid);
    map
}
