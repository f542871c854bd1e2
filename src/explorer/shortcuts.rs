use crate::event::{Key, KeyCode};

/// Everything a key can ask the explorer to do outside of a modal.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    Quit,
    ToggleFocus,
    ToggleMode,
    MoveUp,
    MoveDown,
    PageUp,
    PageDown,
    Expand,
    Collapse,
    ToggleDirectory,
    OpenCommit,
    OpenHelp,
    Refresh,
    ToggleIgnored,
}

struct Shortcut {
    label: &'static str,
    description: &'static str,
    group: &'static str,
    bindings: &'static [Binding],
    action: Action,
}

#[derive(Clone, Copy)]
struct Binding {
    code: KeyCode,
    ctrl: ModifierRequirement,
    alt: ModifierRequirement,
}

#[derive(Clone, Copy)]
enum ModifierRequirement {
    Any,
    Enabled,
    Disabled,
}

impl ModifierRequirement {
    const fn matches(self, value: bool) -> bool {
        match self {
            Self::Any => true,
            Self::Enabled => value,
            Self::Disabled => !value,
        }
    }
}

impl Binding {
    const fn plain(code: KeyCode) -> Self {
        Self {
            code,
            ctrl: ModifierRequirement::Disabled,
            alt: ModifierRequirement::Disabled,
        }
    }

    const fn ctrl(code: KeyCode) -> Self {
        Self {
            code,
            ctrl: ModifierRequirement::Enabled,
            alt: ModifierRequirement::Any,
        }
    }

    fn matches_key(self, key: Key) -> bool {
        let code_matches = match (self.code, key.code) {
            (KeyCode::Char(expected), KeyCode::Char(actual)) => {
                if key.ctrl {
                    actual.eq_ignore_ascii_case(&expected)
                } else {
                    actual == expected
                }
            }
            _ => self.code == key.code,
        };

        code_matches && self.ctrl.matches(key.ctrl) && self.alt.matches(key.alt)
    }
}

const SHORTCUTS: &[Shortcut] = &[
    Shortcut {
        label: "j/k, Up/Down",
        description: "move selection or scroll",
        group: "Navigation",
        bindings: &[Binding::plain(KeyCode::Up), Binding::plain(KeyCode::Char('k'))],
        action: Action::MoveUp,
    },
    Shortcut {
        label: "",
        description: "",
        group: "Navigation",
        bindings: &[
            Binding::plain(KeyCode::Down),
            Binding::plain(KeyCode::Char('j')),
        ],
        action: Action::MoveDown,
    },
    Shortcut {
        label: "PgUp/PgDn",
        description: "move a page",
        group: "Navigation",
        bindings: &[Binding::plain(KeyCode::PageUp)],
        action: Action::PageUp,
    },
    Shortcut {
        label: "",
        description: "",
        group: "Navigation",
        bindings: &[Binding::plain(KeyCode::PageDown)],
        action: Action::PageDown,
    },
    Shortcut {
        label: "Tab",
        description: "switch focus between panes",
        group: "Navigation",
        bindings: &[Binding::plain(KeyCode::Tab)],
        action: Action::ToggleFocus,
    },
    Shortcut {
        label: "Right/l",
        description: "expand directory",
        group: "Tree",
        bindings: &[
            Binding::plain(KeyCode::Right),
            Binding::plain(KeyCode::Char('l')),
        ],
        action: Action::Expand,
    },
    Shortcut {
        label: "Left",
        description: "collapse directory",
        group: "Tree",
        bindings: &[Binding::plain(KeyCode::Left)],
        action: Action::Collapse,
    },
    Shortcut {
        label: "Space",
        description: "toggle directory",
        group: "Tree",
        bindings: &[Binding::plain(KeyCode::Char(' '))],
        action: Action::ToggleDirectory,
    },
    Shortcut {
        label: "m",
        description: "toggle explorer/diff",
        group: "Modes",
        bindings: &[Binding::plain(KeyCode::Char('m'))],
        action: Action::ToggleMode,
    },
    Shortcut {
        label: "i",
        description: "show/hide ignored files",
        group: "Modes",
        bindings: &[Binding::plain(KeyCode::Char('i'))],
        action: Action::ToggleIgnored,
    },
    Shortcut {
        label: "Enter",
        description: "commit",
        group: "Actions",
        bindings: &[Binding::plain(KeyCode::Enter)],
        action: Action::OpenCommit,
    },
    Shortcut {
        label: "r",
        description: "refresh now",
        group: "Actions",
        bindings: &[Binding::plain(KeyCode::Char('r'))],
        action: Action::Refresh,
    },
    Shortcut {
        label: "h",
        description: "help",
        group: "Actions",
        bindings: &[
            Binding::plain(KeyCode::Char('h')),
            Binding::plain(KeyCode::Char('?')),
        ],
        action: Action::OpenHelp,
    },
    Shortcut {
        label: "q/Esc",
        description: "quit",
        group: "Actions",
        bindings: &[
            Binding::plain(KeyCode::Char('q')),
            Binding::plain(KeyCode::Esc),
            Binding::ctrl(KeyCode::Char('c')),
        ],
        action: Action::Quit,
    },
];

pub fn action_for(key: Key) -> Option<Action> {
    SHORTCUTS
        .iter()
        .find(|shortcut| {
            shortcut
                .bindings
                .iter()
                .any(|binding| binding.matches_key(key))
        })
        .map(|shortcut| shortcut.action)
}

/// Ctrl-C quits even while a modal is open.
pub fn is_force_quit(key: Key) -> bool {
    Binding::ctrl(KeyCode::Char('c')).matches_key(key)
}

/// Help modal body, grouped in table order.
pub fn help_lines() -> Vec<String> {
    let mut lines = Vec::new();
    let mut current_group = None;

    for shortcut in SHORTCUTS.iter().filter(|shortcut| !shortcut.label.is_empty()) {
        if current_group != Some(shortcut.group) {
            if current_group.is_some() {
                lines.push(String::new());
            }
            lines.push(format!("{}:", shortcut.group));
            current_group = Some(shortcut.group);
        }
        lines.push(format!("  {:<14}{}", shortcut.label, shortcut.description));
    }

    lines
}
