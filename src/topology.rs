use std::collections::VecDeque;
use std::fmt::{Display, Formatter};

use crate::config::ConfigError;


/// Shape of the network the peers are arranged in. The shape only decides which node acts as the
///  coordinator and which nodes send to it: every frame travels directly from a peer to the
///  coordinator, there is no multi-hop forwarding.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum Topology {
    /// complete graph: every node is adjacent to every other node
    Mesh { nodes: usize },
    /// 2D lattice, nodes numbered row by row, each adjacent to its horizontal and vertical neighbours
    Grid { rows: usize, cols: usize },
}
impl Display for Topology {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Topology::Mesh { nodes } => write!(f, "mesh({})", nodes),
            Topology::Grid { rows, cols } => write!(f, "grid({}x{})", rows, cols),
        }
    }
}
impl Topology {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.num_nodes() < 2 {
            return Err(ConfigError::InvalidTopology(format!("{} has no peers besides the coordinator", self)));
        }
        Ok(())
    }

    pub fn num_nodes(&self) -> usize {
        match *self {
            Topology::Mesh { nodes } => nodes,
            Topology::Grid { rows, cols } => rows * cols,
        }
    }

    /// (row, col) of a grid node; mesh nodes are treated as a single row
    pub fn position(&self, node: usize) -> (usize, usize) {
        match *self {
            Topology::Mesh { .. } => (0, node),
            Topology::Grid { cols, .. } => (node / cols, node % cols),
        }
    }

    pub fn neighbours(&self, node: usize) -> Vec<usize> {
        match *self {
            Topology::Mesh { nodes } => (0..nodes).filter(|&n| n != node).collect(),
            Topology::Grid { rows, cols } => {
                let (row, col) = self.position(node);
                let mut result = Vec::with_capacity(4);
                if row > 0 {
                    result.push(node - cols);
                }
                if col > 0 {
                    result.push(node - 1);
                }
                if col + 1 < cols {
                    result.push(node + 1);
                }
                if row + 1 < rows {
                    result.push(node + cols);
                }
                result
            }
        }
    }

    /// greatest hop distance from `node` to any other node
    pub fn eccentricity(&self, node: usize) -> usize {
        let mut distances = vec![usize::MAX; self.num_nodes()];
        distances[node] = 0;

        let mut queue = VecDeque::from([node]);
        let mut max_distance = 0;
        while let Some(current) = queue.pop_front() {
            let next_distance = distances[current] + 1;
            for neighbour in self.neighbours(current) {
                if distances[neighbour] == usize::MAX {
                    distances[neighbour] = next_distance;
                    max_distance = max_distance.max(next_distance);
                    queue.push_back(neighbour);
                }
            }
        }
        max_distance
    }

    /// The graph's center, i.e. the node with minimal eccentricity - the first one in node order
    ///  if there are several
    pub fn coordinator(&self) -> Result<usize, ConfigError> {
        self.validate()?;

        let mut best = (0, usize::MAX);
        for node in 0..self.num_nodes() {
            let eccentricity = self.eccentricity(node);
            if eccentricity < best.1 {
                best = (node, eccentricity);
            }
        }
        Ok(best.0)
    }

    /// all nodes that send to the coordinator
    pub fn peers(&self) -> Result<Vec<usize>, ConfigError> {
        let coordinator = self.coordinator()?;
        Ok((0..self.num_nodes())
            .filter(|&n| n != coordinator)
            .collect())
    }

    pub fn peer_count(&self) -> Result<usize, ConfigError> {
        self.validate()?;
        Ok(self.num_nodes() - 1)
    }
}
