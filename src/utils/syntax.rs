//! Syntax highlighting for fenced code blocks in assistant replies.

use std::collections::hash_map::DefaultHasher;
use std::collections::{HashMap, VecDeque};
use std::hash::{Hash, Hasher};
use std::sync::{Mutex, OnceLock};

use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use syntect::easy::HighlightLines;
use syntect::highlighting::ThemeSet;
use syntect::parsing::SyntaxSet;
use syntect::util::LinesWithEndings;

const SYNTECT_THEME: &str = "base16-ocean.dark";
const CACHE_CAPACITY: usize = 64;

type CacheKey = (String, u64);

// Bounded FIFO cache; transcripts re-render every frame.
struct BlockCache {
    map: HashMap<CacheKey, Vec<Line<'static>>>,
    order: VecDeque<CacheKey>,
    cap: usize,
}

impl BlockCache {
    fn new(cap: usize) -> Self {
        Self {
            map: HashMap::new(),
            order: VecDeque::new(),
            cap,
        }
    }

    fn get(&self, key: &CacheKey) -> Option<Vec<Line<'static>>> {
        self.map.get(key).cloned()
    }

    fn put(&mut self, key: CacheKey, lines: Vec<Line<'static>>) {
        if !self.map.contains_key(&key) {
            self.order.push_back(key.clone());
        }
        self.map.insert(key, lines);
        while self.map.len() > self.cap {
            match self.order.pop_front() {
                Some(oldest) => {
                    self.map.remove(&oldest);
                }
                None => break,
            }
        }
    }
}

static BLOCK_CACHE: OnceLock<Mutex<BlockCache>> = OnceLock::new();

fn cache() -> &'static Mutex<BlockCache> {
    BLOCK_CACHE.get_or_init(|| Mutex::new(BlockCache::new(CACHE_CAPACITY)))
}

fn hash_code(lang: &str, code: &str) -> u64 {
    let mut hasher = DefaultHasher::new();
    lang.hash(&mut hasher);
    code.hash(&mut hasher);
    hasher.finish()
}

pub(crate) fn normalize_lang_hint(hint: &str) -> String {
    let lowered = hint.trim().to_ascii_lowercase();
    match lowered.as_str() {
        "py" | "python" => "python".into(),
        "bash" | "sh" | "zsh" | "shell" => "bash".into(),
        "js" | "javascript" | "jsx" => "javascript".into(),
        "ts" | "tsx" | "typescript" => "typescript".into(),
        "yaml" | "yml" => "yaml".into(),
        "rust" | "rs" => "rust".into(),
        "c" | "h" => "c".into(),
        "cpp" | "cc" | "cxx" | "hpp" | "hxx" => "cpp".into(),
        "kotlin" | "kt" => "kotlin".into(),
        other => other.into(),
    }
}

/// Highlights `code` as `lang_hint`, one [`Line`] per source line. Returns
/// `None` when syntect has no usable theme or fails on a line; callers fall
/// back to plain text.
pub fn highlight_code_block(lang_hint: &str, code: &str) -> Option<Vec<Line<'static>>> {
    static SYNTAX_SET: OnceLock<SyntaxSet> = OnceLock::new();
    static THEME_SET: OnceLock<ThemeSet> = OnceLock::new();
    let syntaxes = SYNTAX_SET.get_or_init(SyntaxSet::load_defaults_newlines);
    let themes = THEME_SET.get_or_init(ThemeSet::load_defaults);
    let theme = themes.themes.get(SYNTECT_THEME)?;

    let lang = normalize_lang_hint(lang_hint);
    let key = (lang.clone(), hash_code(&lang, code));
    if let Some(lines) = cache().lock().ok().and_then(|c| c.get(&key)) {
        return Some(lines);
    }

    let syntax = syntaxes
        .find_syntax_by_token(&lang)
        .unwrap_or_else(|| syntaxes.find_syntax_plain_text());
    let mut highlighter = HighlightLines::new(syntax, theme);

    let mut out = Vec::new();
    for line in LinesWithEndings::from(code) {
        let ranges = highlighter.highlight_line(line, syntaxes).ok()?;
        let spans: Vec<Span<'static>> = ranges
            .into_iter()
            .map(|(style, text)| {
                let fg = style.foreground;
                Span::styled(
                    text.trim_end_matches('\n').to_string(),
                    Style::default().fg(Color::Rgb(fg.r, fg.g, fg.b)),
                )
            })
            .collect();
        out.push(Line::from(spans));
    }

    if let Ok(mut guard) = cache().lock() {
        guard.put(key, out.clone());
    }
    Some(out)
}
