//! Per-mode keystroke tables.
//!
//! Each table maps a keystroke to a tagged action; the engine matches on the
//! action. Motions live in [`crate::motion`] and are consulted after these.

use crate::key::{KeyCode, KeyStroke, Modifiers};
use crate::operator::Operator;
use crate::types::{FoldCommand, VisualKind};

/// Where `i`, `a`, `o` and friends put the caret before entering Insert mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAt {
    Caret,
    After,
    FirstNonBlank,
    LineEnd,
    LineBelow,
    LineAbove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    After,
    Before,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NormalAction {
    CommandLine(char),
    Insert(InsertAt),
    Replace,
    ReplaceChar,
    Visual(VisualKind),
    Operator(Operator),
    YankLine,
    DeleteChar,
    DeleteCharBefore,
    DeleteToLineEnd,
    ChangeToLineEnd,
    SubstituteChar,
    SubstituteLine,
    SearchNext,
    SearchPrevious,
    SearchWord,
    Paste(Placement),
    GPrefix,
    Fold,
    SetMark,
    GoToMark,
    Record,
    Play,
    Join,
    ToggleCase,
    Repeat,
}

impl NormalAction {
    /// Actions that modify the buffer and can be repeated with `.`.
    pub fn is_change(self) -> bool {
        match self {
            NormalAction::Operator(op) => op != Operator::Yank,
            NormalAction::Insert(_)
            | NormalAction::Replace
            | NormalAction::ReplaceChar
            | NormalAction::DeleteChar
            | NormalAction::DeleteCharBefore
            | NormalAction::DeleteToLineEnd
            | NormalAction::ChangeToLineEnd
            | NormalAction::SubstituteChar
            | NormalAction::SubstituteLine
            | NormalAction::Paste(_)
            | NormalAction::Join
            | NormalAction::ToggleCase => true,
            _ => false,
        }
    }
}

const NORMAL_CHARS: &[(char, NormalAction)] = &[
    (':', NormalAction::CommandLine(':')),
    ('/', NormalAction::CommandLine('/')),
    ('?', NormalAction::CommandLine('?')),
    ('i', NormalAction::Insert(InsertAt::Caret)),
    ('a', NormalAction::Insert(InsertAt::After)),
    ('I', NormalAction::Insert(InsertAt::FirstNonBlank)),
    ('A', NormalAction::Insert(InsertAt::LineEnd)),
    ('o', NormalAction::Insert(InsertAt::LineBelow)),
    ('O', NormalAction::Insert(InsertAt::LineAbove)),
    ('R', NormalAction::Replace),
    ('r', NormalAction::ReplaceChar),
    ('v', NormalAction::Visual(VisualKind::CharWise)),
    ('V', NormalAction::Visual(VisualKind::LineWise)),
    ('d', NormalAction::Operator(Operator::Delete)),
    ('y', NormalAction::Operator(Operator::Yank)),
    ('c', NormalAction::Operator(Operator::Change)),
    ('>', NormalAction::Operator(Operator::Indent)),
    ('<', NormalAction::Operator(Operator::Unindent)),
    ('Y', NormalAction::YankLine),
    ('x', NormalAction::DeleteChar),
    ('X', NormalAction::DeleteCharBefore),
    ('D', NormalAction::DeleteToLineEnd),
    ('C', NormalAction::ChangeToLineEnd),
    ('s', NormalAction::SubstituteChar),
    ('S', NormalAction::SubstituteLine),
    ('n', NormalAction::SearchNext),
    ('N', NormalAction::SearchPrevious),
    ('*', NormalAction::SearchWord),
    ('p', NormalAction::Paste(Placement::After)),
    ('P', NormalAction::Paste(Placement::Before)),
    ('g', NormalAction::GPrefix),
    ('z', NormalAction::Fold),
    ('m', NormalAction::SetMark),
    ('`', NormalAction::GoToMark),
    ('q', NormalAction::Record),
    ('@', NormalAction::Play),
    ('J', NormalAction::Join),
    ('~', NormalAction::ToggleCase),
    ('.', NormalAction::Repeat),
];

pub fn normal_action(key: &KeyStroke) -> Option<NormalAction> {
    if key.code == KeyCode::Delete && key.mods.is_empty() {
        return Some(NormalAction::DeleteChar);
    }
    let c = key.printable()?;
    NORMAL_CHARS.iter().find(|(k, _)| *k == c).map(|(_, a)| *a)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisualAction {
    Delete,
    Yank,
    Change,
    ChangeLines,
    Indent,
    Unindent,
    CommandLine,
    Join,
    ToggleCase,
    Paste(Placement),
    SwitchKind(VisualKind),
}

const VISUAL_CHARS: &[(char, VisualAction)] = &[
    ('x', VisualAction::Delete),
    ('d', VisualAction::Delete),
    ('y', VisualAction::Yank),
    ('s', VisualAction::Change),
    ('c', VisualAction::Change),
    ('S', VisualAction::ChangeLines),
    ('>', VisualAction::Indent),
    ('<', VisualAction::Unindent),
    (':', VisualAction::CommandLine),
    ('J', VisualAction::Join),
    ('~', VisualAction::ToggleCase),
    ('p', VisualAction::Paste(Placement::After)),
    ('P', VisualAction::Paste(Placement::Before)),
    ('v', VisualAction::SwitchKind(VisualKind::CharWise)),
    ('V', VisualAction::SwitchKind(VisualKind::LineWise)),
];

pub fn visual_action(key: &KeyStroke) -> Option<VisualAction> {
    if key.code == KeyCode::Delete && key.mods.is_empty() {
        return Some(VisualAction::Delete);
    }
    let c = key.printable()?;
    VISUAL_CHARS.iter().find(|(k, _)| *k == c).map(|(_, a)| *a)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertAction {
    InsertTab,
    NewLine,
    Backspace,
    Delete,
    ToggleOverwrite,
    DeleteWordBefore,
    DeleteWordAfter,
    RemoveIndent,
}

const INSERT_KEYS: &[(KeyCode, Modifiers, InsertAction)] = &[
    (KeyCode::Tab, Modifiers::empty(), InsertAction::InsertTab),
    (KeyCode::Enter, Modifiers::empty(), InsertAction::NewLine),
    (KeyCode::Enter, Modifiers::SHIFT, InsertAction::NewLine),
    (KeyCode::Backspace, Modifiers::empty(), InsertAction::Backspace),
    (KeyCode::Backspace, Modifiers::SHIFT, InsertAction::Backspace),
    (KeyCode::Delete, Modifiers::empty(), InsertAction::Delete),
    (KeyCode::Insert, Modifiers::empty(), InsertAction::ToggleOverwrite),
    (KeyCode::Backspace, Modifiers::CTRL, InsertAction::DeleteWordBefore),
    (KeyCode::Delete, Modifiers::CTRL, InsertAction::DeleteWordAfter),
    (KeyCode::Tab, Modifiers::SHIFT, InsertAction::RemoveIndent),
];

/// Insert-mode editing keys. Alt is ignored.
pub fn insert_action(key: &KeyStroke) -> Option<InsertAction> {
    let mods = key.mods & (Modifiers::SHIFT | Modifiers::CTRL);
    INSERT_KEYS
        .iter()
        .find(|(k, m, _)| *k == key.code && *m == mods)
        .map(|(_, _, a)| *a)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryCommand {
    Undo,
    Redo,
}

const HISTORY_KEYS: &[(KeyCode, Modifiers, HistoryCommand)] = &[
    (KeyCode::Char('u'), Modifiers::empty(), HistoryCommand::Undo),
    (KeyCode::Char('r'), Modifiers::CTRL, HistoryCommand::Redo),
];

pub fn history_command(key: &KeyStroke) -> Option<HistoryCommand> {
    HISTORY_KEYS
        .iter()
        .find(|(k, m, _)| *k == key.code && *m == key.mods)
        .map(|(_, _, c)| *c)
}

const FOLD_CHARS: &[(char, FoldCommand)] = &[
    ('A', FoldCommand::ToggleRecursive),
    ('C', FoldCommand::CloseRecursive),
    ('M', FoldCommand::CloseAll),
    ('O', FoldCommand::OpenRecursive),
    ('R', FoldCommand::OpenAll),
    ('a', FoldCommand::Toggle),
    ('c', FoldCommand::Close),
    ('o', FoldCommand::Open),
];

pub fn fold_command(key: &KeyStroke) -> Option<FoldCommand> {
    let c = key.printable()?;
    FOLD_CHARS.iter().find(|(k, _)| *k == c).map(|(_, f)| *f)
}
