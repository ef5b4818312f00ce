//! The static hotkey tables shown for a selected book.

/// Everything the menu can do with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionId {
    OpenOtherWindow,
    OpenHere,
    OpenViewer,
    InsertSearchString,
    InsertCitekey,
    InsertPath,
    InsertTitle,
    InsertLink,
    /// Opens [`INFO_MENU`].
    BookInfo,
    InsertId,
    InsertPubDate,
    InsertAuthors,
    Cancel,
}

/// One line of a hotkey menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ActionEntry {
    pub key: char,
    pub description: &'static str,
    pub action: ActionId,
}

const fn entry(key: char, description: &'static str, action: ActionId) -> ActionEntry {
    ActionEntry {
        key,
        description,
        action,
    }
}

pub const MAIN_MENU: &[ActionEntry] = &[
    entry('o', "open file in other window", ActionId::OpenOtherWindow),
    entry('O', "open file in current window", ActionId::OpenHere),
    entry('v', "open with the default viewer", ActionId::OpenViewer),
    entry('s', "insert search string", ActionId::InsertSearchString),
    entry('c', "insert citation key", ActionId::InsertCitekey),
    entry('p', "insert file path", ActionId::InsertPath),
    entry('t', "insert title", ActionId::InsertTitle),
    entry('l', "insert calibre link", ActionId::InsertLink),
    entry('i', "get book information (next menu)", ActionId::BookInfo),
    entry('q', "(or anything else) cancel", ActionId::Cancel),
];

pub const INFO_MENU: &[ActionEntry] = &[
    entry('i', "calibre id", ActionId::InsertId),
    entry('p', "publication date", ActionId::InsertPubDate),
    entry('a', "author list", ActionId::InsertAuthors),
    entry('q', "(or anything else) cancel", ActionId::Cancel),
];

/// Resolve a pressed key. Unknown keys and no key at all cancel.
pub fn lookup(menu: &[ActionEntry], key: Option<char>) -> ActionId {
    key.and_then(|key| menu.iter().find(|e| e.key == key))
        .map_or(ActionId::Cancel, |e| e.action)
}

/// Multi-line menu text: `[o] open file in other window`, one per line.
pub fn menu_text(menu: &[ActionEntry]) -> String {
    menu.iter()
        .map(|e| format!("[{}] {}", e.key, e.description))
        .collect::<Vec<_>>()
        .join("\n")
}
