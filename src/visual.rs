//! Keeping the character under the anchor selected when a character-wise
//! selection flips direction.
//!
//! The lead of a character-wise selection is exclusive, so the anchor
//! character is only covered while the lead is to its right. When a motion
//! carries the lead across the anchor the anchor has to shift by one column,
//! and when the lead lands exactly on the anchor (an empty selection) it is
//! nudged one column so the selection never collapses.

use crate::types::Position;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeadNudge {
    None,
    Left,
    Right,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pivot {
    pub anchor: Position,
    pub nudge: LeadNudge,
}

pub fn pivot(
    old_anchor: Position,
    old_lead: Position,
    new_anchor: Position,
    new_lead: Position,
) -> Pivot {
    let mut anchor = new_anchor;
    if old_anchor < old_lead && new_anchor >= new_lead {
        anchor.col += 1;
    } else if old_anchor > old_lead && new_anchor <= new_lead {
        anchor.col = anchor.col.saturating_sub(1);
    }

    let nudge = if new_anchor == new_lead {
        if old_anchor < old_lead {
            LeadNudge::Left
        } else {
            LeadNudge::Right
        }
    } else if old_anchor < old_lead
        && new_anchor > new_lead
        && ((new_lead.line == new_anchor.line && old_lead.line == old_anchor.line + 1)
            || (new_lead.line + 1 == new_anchor.line && old_lead.line == old_anchor.line))
    {
        LeadNudge::Left
    } else if old_anchor > old_lead
        && new_anchor < new_lead
        && ((new_lead.line == new_anchor.line && old_lead.line + 1 == old_anchor.line)
            || (new_lead.line == new_anchor.line + 1 && old_lead.line == old_anchor.line))
    {
        LeadNudge::Right
    } else {
        LeadNudge::None
    };

    Pivot { anchor, nudge }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(line: u32, col: u32) -> Position {
        Position::new(line, col)
    }

    #[test]
    fn no_change_while_direction_holds() {
        let r = pivot(p(0, 2), p(0, 5), p(0, 2), p(0, 7));
        assert_eq!(r.anchor, p(0, 2));
        assert_eq!(r.nudge, LeadNudge::None);
    }

    #[test]
    fn crossing_backwards_keeps_anchor_char() {
        let r = pivot(p(0, 4), p(0, 6), p(0, 4), p(0, 2));
        assert_eq!(r.anchor, p(0, 5));
        assert_eq!(r.nudge, LeadNudge::None);
    }

    #[test]
    fn landing_on_anchor_is_nudged() {
        let r = pivot(p(0, 4), p(0, 5), p(0, 4), p(0, 4));
        assert_eq!(r.anchor, p(0, 5));
        assert_eq!(r.nudge, LeadNudge::Left);

        let r = pivot(p(0, 4), p(0, 2), p(0, 4), p(0, 4));
        assert_eq!(r.anchor, p(0, 3));
        assert_eq!(r.nudge, LeadNudge::Right);
    }

    #[test]
    fn crossing_lines_forward() {
        let r = pivot(p(2, 8), p(1, 10), p(2, 8), p(2, 10));
        assert_eq!(r.anchor, p(2, 7));
        assert_eq!(r.nudge, LeadNudge::Right);
    }
}
