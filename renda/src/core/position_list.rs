use std::sync::Arc;

use parking_lot::Mutex;
use renda_ipc::{ClickButton, PositionInfo};

use super::{Delay, Point, Position};

/// List shared between the daemon and the replay worker.
/// The worker reads it live; there is no per-run snapshot.
pub type SharedPositions = Arc<Mutex<PositionList>>;

/// Ordered click targets. Insertion order is replay order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PositionList {
    positions: Vec<Position>,
}

impl PositionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_positions(positions: Vec<Position>) -> Self {
        Self { positions }
    }

    pub fn into_shared(self) -> SharedPositions {
        Arc::new(Mutex::new(self))
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Position> {
        self.positions.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Position> {
        self.positions.iter()
    }

    /// Appends an unset slot and returns its index.
    pub fn add(&mut self) -> usize {
        self.positions.push(Position::unset());
        self.positions.len() - 1
    }

    /// Writes `point` into the first unset slot, or appends a new one.
    /// Returns the index that was written.
    pub fn capture_into(&mut self, point: Point) -> usize {
        if let Some(index) = self.positions.iter().position(Position::is_unset) {
            self.positions[index].point = Some(point);
            tracing::debug!("Captured {} into slot {}", point, index);
            return index;
        }
        self.positions.push(Position::at(point));
        let index = self.positions.len() - 1;
        tracing::debug!("Captured {} into new slot {}", point, index);
        index
    }

    /// Out-of-range indices are ignored.
    pub fn remove_at(&mut self, index: usize) -> Option<Position> {
        if index < self.positions.len() {
            Some(self.positions.remove(index))
        } else {
            None
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Returns false when `index` is out of range.
    pub fn set_delay(&mut self, index: usize, delay: Delay) -> bool {
        match self.positions.get_mut(index) {
            Some(p) => {
                p.delay = delay;
                true
            }
            None => false,
        }
    }

    /// Returns false when `index` is out of range.
    pub fn set_button(&mut self, index: usize, button: ClickButton) -> bool {
        match self.positions.get_mut(index) {
            Some(p) => {
                p.button = button;
                true
            }
            None => false,
        }
    }

    pub fn to_info(&self) -> Vec<PositionInfo> {
        self.positions
            .iter()
            .enumerate()
            .map(|(index, p)| PositionInfo {
                index,
                x: p.point.map(|pt| pt.x),
                y: p.point.map(|pt| pt.y),
                delay: p.delay.to_string(),
                button: p.button,
            })
            .collect()
    }
}
