//! Transient user-facing notices (toasts).

use std::time::Duration;

/// How long a toast stays on screen before the UI dismisses it.
pub const NOTICE_TTL: Duration = Duration::from_secs(4);

/// Oldest notices are dropped beyond this many.
const MAX_NOTICES: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Error,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub id: u64,
    pub level: NoticeLevel,
    pub text: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Notices {
    next_id: u64,
    items: Vec<Notice>,
}

impl Notices {
    pub fn push(&mut self, level: NoticeLevel, text: impl Into<String>) -> u64 {
        self.next_id += 1;
        let id = self.next_id;
        self.items.push(Notice {
            id,
            level,
            text: text.into(),
        });
        if self.items.len() > MAX_NOTICES {
            let overflow = self.items.len() - MAX_NOTICES;
            self.items.drain(..overflow);
        }
        id
    }

    pub fn dismiss(&mut self, id: u64) {
        self.items.retain(|notice| notice.id != id);
    }

    pub fn items(&self) -> &[Notice] {
        &self.items
    }

    pub fn errors(&self) -> impl Iterator<Item = &Notice> {
        self.items
            .iter()
            .filter(|notice| notice.level == NoticeLevel::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
