use crate::geometry::Rect;

/// Axis along which a [`Flex`] lays out its children.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Row,
    Column,
}

/// Space distribution rules for a single slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Constraint {
    /// Exactly this many cells (clamped to what is available).
    Fixed(u16),
    /// A share of the full axis length.
    Percent(u8),
    /// Weighted share of whatever the fixed slots leave over.
    Flex(u16),
}

/// Splits a rectangle into consecutive slots along one axis.
#[derive(Debug, Clone)]
pub struct Flex {
    direction: Direction,
    constraints: Vec<Constraint>,
}

impl Flex {
    pub fn column(constraints: impl Into<Vec<Constraint>>) -> Self {
        Self {
            direction: Direction::Column,
            constraints: constraints.into(),
        }
    }

    pub fn row(constraints: impl Into<Vec<Constraint>>) -> Self {
        Self {
            direction: Direction::Row,
            constraints: constraints.into(),
        }
    }

    /// Solve the slots for `area`; always returns one rect per constraint.
    pub fn split(&self, area: Rect) -> Vec<Rect> {
        let axis = match self.direction {
            Direction::Row => area.width,
            Direction::Column => area.height,
        };
        let lengths = distribute(axis, &self.constraints);

        let mut cursor = match self.direction {
            Direction::Row => area.x,
            Direction::Column => area.y,
        };
        lengths
            .into_iter()
            .map(|span| {
                let rect = match self.direction {
                    Direction::Row => Rect::new(cursor, area.y, span, area.height),
                    Direction::Column => Rect::new(area.x, cursor, area.width, span),
                };
                cursor = cursor.saturating_add(span);
                rect
            })
            .collect()
    }
}

fn distribute(axis: u16, constraints: &[Constraint]) -> Vec<u16> {
    let mut remaining = axis;
    let mut lengths = vec![0u16; constraints.len()];

    // Rigid slots claim space first, in order, until the axis runs out.
    for (idx, constraint) in constraints.iter().enumerate() {
        let wanted = match *constraint {
            Constraint::Fixed(value) => value,
            Constraint::Percent(percent) => {
                ((axis as u32 * percent.min(100) as u32) / 100) as u16
            }
            Constraint::Flex(_) => continue,
        };
        let granted = wanted.min(remaining);
        lengths[idx] = granted;
        remaining -= granted;
    }

    let total_weight: u32 = constraints
        .iter()
        .map(|constraint| match constraint {
            Constraint::Flex(weight) => (*weight).max(1) as u32,
            _ => 0,
        })
        .sum();
    if total_weight == 0 {
        return lengths;
    }

    let pool = remaining as u32;
    let mut handed_out = 0u32;
    let mut last_flex = None;
    for (idx, constraint) in constraints.iter().enumerate() {
        if let Constraint::Flex(weight) = constraint {
            let share = pool * (*weight).max(1) as u32 / total_weight;
            lengths[idx] = share as u16;
            handed_out += share;
            last_flex = Some(idx);
        }
    }
    // Rounding leftovers go to the last flexible slot.
    if let Some(idx) = last_flex {
        lengths[idx] = lengths[idx].saturating_add((pool - handed_out) as u16);
    }
    lengths
}
