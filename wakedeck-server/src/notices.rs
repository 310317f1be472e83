/**
 * NOTICES - Messages utilisateur affichés au prochain rendu de page
 *
 * RÔLE : chaque handler termine par une redirection ; les messages qu'il
 * produit (succès, avertissement, erreur) sont empilés ici puis vidés par la
 * page suivante. File unique en mémoire : dashboard mono-utilisateur.
 */

use serde::Serialize;

use crate::state::{new_state, Shared};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Warning,
    Danger,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Success => "success",
            Level::Warning => "warning",
            Level::Danger => "danger",
        }
    }
}

#[derive(Debug, Serialize, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: Level,
    pub text: String,
}

impl Notice {
    pub fn success(text: impl Into<String>) -> Self {
        Self { level: Level::Success, text: text.into() }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self { level: Level::Warning, text: text.into() }
    }

    pub fn danger(text: impl Into<String>) -> Self {
        Self { level: Level::Danger, text: text.into() }
    }
}

#[derive(Clone, Default)]
pub struct NoticeBoard {
    queue: Shared<Vec<Notice>>,
}

impl NoticeBoard {
    pub fn new() -> Self {
        Self { queue: new_state(Vec::new()) }
    }

    pub fn push(&self, notice: Notice) {
        self.queue.lock().push(notice);
    }

    pub fn extend(&self, notices: impl IntoIterator<Item = Notice>) {
        self.queue.lock().extend(notices);
    }

    /// Vide la file (appelé par la page qui affiche les messages)
    pub fn drain(&self) -> Vec<Notice> {
        std::mem::take(&mut *self.queue.lock())
    }
}
