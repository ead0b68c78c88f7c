//! Message rendering: chat bubble content, markdown with highlighted code
//! blocks, and "from now" timestamps.

use crate::types::{Message, Role};
use comrak::plugins::syntect::SyntectAdapter;
use comrak::{ComrakOptions, ComrakPlugins, markdown_to_html_with_plugins};
use once_cell::sync::Lazy;
use time::{OffsetDateTime, UtcOffset, format_description::FormatItem, macros::format_description};

const CODE_THEME: &str = "base16-ocean.dark";

const MESSAGE_TIME_FORMAT: &[FormatItem<'static>] = format_description!(
    "[month repr:short] [day padding:zero], [hour repr:12 padding:zero]:[minute padding:zero] [period case:upper]"
);

static MARKDOWN_OPTIONS: Lazy<ComrakOptions> = Lazy::new(|| {
    let mut options = ComrakOptions::default();
    options.extension.table = true;
    options.extension.strikethrough = true;
    options.extension.tasklist = true;
    options.extension.autolink = true;
    // raw HTML in model output is never injected
    options.render.unsafe_ = false;
    options
});

static CODE_HIGHLIGHTER: Lazy<SyntectAdapter> =
    Lazy::new(|| SyntectAdapter::new(Some(CODE_THEME)));

#[derive(Clone, Debug, PartialEq)]
pub enum BubbleBody {
    /// User prompts are shown verbatim.
    Plain(String),
    /// Rendered HTML for assistant text.
    Markdown(String),
    Image { src: String },
}

#[derive(Clone, Debug, PartialEq)]
pub struct RenderedMessage {
    pub role: Role,
    pub body: BubbleBody,
    pub relative_time: String,
    /// Absolute local time, used as a tooltip.
    pub full_time: Option<String>,
}

impl RenderedMessage {
    pub fn side_class(&self) -> &'static str {
        match self.role {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// Bubble content for one message. Assistant markdown goes through `cache`
/// so a re-render with unchanged content skips highlighting.
pub fn render_message(
    message: &Message,
    now_ms: i64,
    cache: &mut HighlightCache,
) -> RenderedMessage {
    let body = match (message.role, message.is_image) {
        (Role::User, _) => BubbleBody::Plain(message.content.clone()),
        (Role::Assistant, true) => BubbleBody::Image {
            src: message.content.clone(),
        },
        (Role::Assistant, false) => {
            BubbleBody::Markdown(cache.html_for(&message.content).to_string())
        }
    };
    RenderedMessage {
        role: message.role,
        body,
        relative_time: from_now(message.timestamp, now_ms),
        full_time: format_timestamp(message.timestamp),
    }
}

pub fn markdown_to_html(source: &str) -> String {
    let mut plugins = ComrakPlugins::default();
    plugins.render.codefence_syntax_highlighter = Some(&*CODE_HIGHLIGHTER);
    markdown_to_html_with_plugins(source, &MARKDOWN_OPTIONS, &plugins)
}

/// Whether bubbles offer a "Copy" action; only native builds have a clipboard.
pub const fn copy_action_available() -> bool {
    cfg!(any(feature = "desktop", feature = "mobile"))
}

/// Highlighted HTML for one bubble, recomputed only when the content changes.
#[derive(Debug, Default)]
pub struct HighlightCache {
    content: Option<String>,
    html: String,
    passes: usize,
}

impl HighlightCache {
    pub fn html_for(&mut self, content: &str) -> &str {
        if self.content.as_deref() != Some(content) {
            self.html = markdown_to_html(content);
            self.content = Some(content.to_string());
            self.passes += 1;
        }
        &self.html
    }

    /// How many highlighting passes have run.
    pub fn passes(&self) -> usize {
        self.passes
    }
}

fn format_timestamp(timestamp_ms: i64) -> Option<String> {
    let mut datetime =
        OffsetDateTime::from_unix_timestamp_nanos(i128::from(timestamp_ms) * 1_000_000).ok()?;
    if let Ok(offset) = UtcOffset::current_local_offset() {
        datetime = datetime.to_offset(offset);
    }
    datetime.format(MESSAGE_TIME_FORMAT).ok()
}

const DAYS_PER_MONTH: f64 = 30.436875;
const DAYS_PER_YEAR: f64 = 365.2425;

/// Humanized distance between `timestamp_ms` and `now_ms`, e.g. "3 minutes ago"
/// or "in an hour".
pub fn from_now(timestamp_ms: i64, now_ms: i64) -> String {
    let delta_ms = now_ms.saturating_sub(timestamp_ms);
    let phrase = humanize_duration(delta_ms.unsigned_abs());
    if delta_ms >= 0 {
        format!("{phrase} ago")
    } else {
        format!("in {phrase}")
    }
}

fn humanize_duration(millis: u64) -> String {
    let secs = millis as f64 / 1000.0;
    let seconds = secs.round();
    let minutes = (secs / 60.0).round();
    let hours = (secs / 3_600.0).round();
    let days = (secs / 86_400.0).round();
    let months = (secs / 86_400.0 / DAYS_PER_MONTH).round();
    let years = (secs / 86_400.0 / DAYS_PER_YEAR).round();

    if seconds < 45.0 {
        "a few seconds".to_string()
    } else if minutes <= 1.0 {
        "a minute".to_string()
    } else if minutes < 45.0 {
        format!("{minutes} minutes")
    } else if hours <= 1.0 {
        "an hour".to_string()
    } else if hours < 22.0 {
        format!("{hours} hours")
    } else if days <= 1.0 {
        "a day".to_string()
    } else if days < 26.0 {
        format!("{days} days")
    } else if months <= 1.0 {
        "a month".to_string()
    } else if months < 11.0 {
        format!("{months} months")
    } else if years <= 1.0 {
        "a year".to_string()
    } else {
        format!("{years} years")
    }
}
