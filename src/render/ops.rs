use crate::geometry::Rect;

use super::Style;

/// A single drawing primitive. Ops are applied in list order, so later ops
/// paint over earlier ones.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Fill {
        area: Rect,
        style: Style,
    },
    Text {
        x: u16,
        y: u16,
        text: String,
        style: Style,
        max_width: u16,
    },
}

/// Ordered op buffer for one frame.
#[derive(Debug, Default, Clone)]
pub struct OpList {
    ops: Vec<DrawOp>,
}

impl OpList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, op: DrawOp) {
        self.ops.push(op);
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn ops(&self) -> &[DrawOp] {
        &self.ops
    }

    /// Text of every `Text` op, in paint order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Fill { .. } => None,
        })
    }

    fn split_off(&mut self, start: usize) -> Vec<DrawOp> {
        let start = start.min(self.ops.len());
        self.ops.split_off(start)
    }

    fn extend(&mut self, ops: Vec<DrawOp>) {
        self.ops.extend(ops);
    }
}

/// Marks the start of a recording. Ops emitted after the mark are lifted out
/// of the list by [`Macro::stop`] so they can be replayed later in the frame.
#[derive(Debug)]
#[must_use = "a recording does nothing until stopped"]
pub struct Macro {
    start: usize,
}

impl Macro {
    pub(crate) fn new(start: usize) -> Self {
        Self { start }
    }

    pub(crate) fn stop(self, ops: &mut OpList) -> CallOp {
        CallOp {
            ops: ops.split_off(self.start),
        }
    }
}

/// Recorded ops waiting to be replayed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct CallOp {
    ops: Vec<DrawOp>,
}

impl CallOp {
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    pub(crate) fn add_to(self, ops: &mut OpList) {
        ops.extend(self.ops);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(label: &str) -> DrawOp {
        DrawOp::Text {
            x: 0,
            y: 0,
            text: label.to_string(),
            style: Style::default(),
            max_width: 10,
        }
    }

    #[test]
    fn recorded_ops_move_to_replay_position() {
        let mut ops = OpList::new();
        ops.push(text("background"));
        let recording = Macro::new(ops.len());
        ops.push(text("bar"));
        let call = recording.stop(&mut ops);
        ops.push(text("view"));
        call.add_to(&mut ops);

        let order: Vec<_> = ops.texts().collect();
        assert_eq!(order, vec!["background", "view", "bar"]);
    }
}
