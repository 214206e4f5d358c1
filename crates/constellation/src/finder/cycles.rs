//! Bounded simple-cycle enumeration (explicit stack, no recursion).

use crate::model::NodeId;

use super::graph::Adjacency;

/// Simple cycles with exactly `len` nodes, each reported once, at most `cap` of them.
///
/// A cycle is reported starting at its smallest id, in the direction whose
/// second node is smaller than its last. Starting nodes are visited in
/// ascending id order, so the capped prefix is deterministic.
pub fn find_cycles(adj: &Adjacency, len: usize, cap: usize) -> Vec<Vec<NodeId>> {
    CycleRunner::new(adj, len, cap).run()
}

/// DFS runner carrying the shared context and the output accumulator.
struct CycleRunner<'a> {
    adj: &'a Adjacency,
    len: usize,
    cap: usize,
    found: Vec<Vec<NodeId>>,
}

/// Candidate successors of one path node and the next one to try.
struct Frame {
    next: Vec<NodeId>,
    pos: usize,
}

impl<'a> CycleRunner<'a> {
    fn new(adj: &'a Adjacency, len: usize, cap: usize) -> Self {
        Self {
            adj,
            len,
            cap,
            found: Vec::new(),
        }
    }

    fn run(mut self) -> Vec<Vec<NodeId>> {
        if self.len < 3 || self.cap == 0 {
            return self.found;
        }
        let starts: Vec<NodeId> = self.adj.nodes().collect();
        for start in starts {
            if self.adj.degree(start) < 2 {
                continue;
            }
            if self.walk_from(start) {
                break;
            }
        }
        self.found
    }

    /// Successors that keep `start` the minimum of the cycle.
    fn frame(&self, node: NodeId, start: NodeId) -> Frame {
        Frame {
            next: self.adj.neighbors(node).filter(|n| *n > start).collect(),
            pos: 0,
        }
    }

    /// Explore every path from `start`; returns true once the cap is reached.
    fn walk_from(&mut self, start: NodeId) -> bool {
        let mut path = vec![start];
        let mut stack = vec![self.frame(start, start)];
        loop {
            let Some(top) = stack.last_mut() else {
                return false;
            };
            if top.pos >= top.next.len() {
                stack.pop();
                path.pop();
                continue;
            }
            let next = top.next[top.pos];
            top.pos += 1;
            if path.contains(&next) {
                continue;
            }
            path.push(next);
            if path.len() == self.len {
                if path[1] < path[self.len - 1] && self.adj.connected(next, start) {
                    self.found.push(path.clone());
                    if self.found.len() >= self.cap {
                        return true;
                    }
                }
                path.pop();
                continue;
            }
            let f = self.frame(next, start);
            stack.push(f);
        }
    }
}
