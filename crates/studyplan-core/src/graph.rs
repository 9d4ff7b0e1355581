//! Per-call knowledge graph snapshot.

use std::collections::HashMap;

use crate::model::KnowledgePoint;

/// An immutable id -> point index built once per recommendation call.
///
/// Points keep the order the store returned them in. A duplicated id keeps
/// its first position but takes the content of its last occurrence.
#[derive(Debug, Clone, Default)]
pub struct GraphSnapshot {
    points: Vec<KnowledgePoint>,
    index: HashMap<String, usize>,
}

impl GraphSnapshot {
    pub fn new(points: Vec<KnowledgePoint>) -> Self {
        let mut snapshot = Self {
            points: Vec::with_capacity(points.len()),
            index: HashMap::with_capacity(points.len()),
        };
        for point in points {
            match snapshot.index.get(&point.id) {
                Some(&slot) => snapshot.points[slot] = point,
                None => {
                    snapshot
                        .index
                        .insert(point.id.clone(), snapshot.points.len());
                    snapshot.points.push(point);
                }
            }
        }
        snapshot
    }

    pub fn get(&self, id: &str) -> Option<&KnowledgePoint> {
        self.index.get(id).map(|&slot| &self.points[slot])
    }

    /// All points in store order.
    pub fn points(&self) -> &[KnowledgePoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
