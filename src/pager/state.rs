//! Pager model - pagination, search and the Navigate/Search state machine
//!
//! Everything here is pure: keys go in through `handle_key`, the caller gets
//! back what needs redrawing. Nothing touches the terminal.

use std::ops::Range;

use crate::core::input::{Direction, KeyEvent};
use crate::ui::text;
use crate::ui::Damage;

const HELP_TEXT: &str =
    "q quit | / search | n/N next/prev match | c clear | w wrap | PgUp/PgDn page | Home/End | h help";

const DEFAULT_WIDTH: usize = 80;

/// Input mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Navigate,
    Search,
}

/// Result of handling one key
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue(Damage),
    Quit,
}

pub struct PagerState {
    items: Vec<String>,
    /// Content rows per page
    page_size: usize,
    /// Columns available to wrapped rows
    width: usize,
    /// First item of each page when wrapping; pages hold whole items
    page_starts: Vec<usize>,
    current_page: usize,
    /// Query being typed in Search mode
    input: String,
    /// Last committed query
    search_query: String,
    /// Item indices containing `search_query`, in order
    search_matches: Vec<usize>,
    current_match: Option<usize>,
    mode: Mode,
    wrap_text: bool,
    show_help: bool,
}

impl PagerState {
    pub fn new(items: Vec<String>, page_size: usize) -> Self {
        Self {
            items,
            page_size: page_size.max(1),
            width: DEFAULT_WIDTH,
            page_starts: vec![0],
            current_page: 0,
            input: String::new(),
            search_query: String::new(),
            search_matches: Vec::new(),
            current_match: None,
            mode: Mode::Navigate,
            wrap_text: false,
            show_help: false,
        }
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn current_page(&self) -> usize {
        self.current_page
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn wrap_text(&self) -> bool {
        self.wrap_text
    }

    pub fn set_wrap_text(&mut self, wrap: bool) {
        let first = self.page_range().start;
        self.wrap_text = wrap;
        self.relayout(first);
    }

    pub fn show_help(&self) -> bool {
        self.show_help
    }

    pub fn search_query(&self) -> &str {
        &self.search_query
    }

    pub fn search_matches(&self) -> &[usize] {
        &self.search_matches
    }

    pub fn current_match(&self) -> Option<usize> {
        self.current_match
    }

    /// Always at least 1 so an empty pager still has a page to show
    pub fn total_pages(&self) -> usize {
        if self.wrap_text {
            self.page_starts.len()
        } else {
            self.items.len().div_ceil(self.page_size).max(1)
        }
    }

    /// Item indices on the current page
    pub fn page_range(&self) -> Range<usize> {
        if self.wrap_text {
            let start = self.page_starts[self.current_page];
            let end = self
                .page_starts
                .get(self.current_page + 1)
                .copied()
                .unwrap_or(self.items.len());
            return start..end;
        }
        let start = (self.current_page * self.page_size).min(self.items.len());
        let end = (start + self.page_size).min(self.items.len());
        start..end
    }

    /// Page showing `item`
    fn page_of(&self, item: usize) -> usize {
        let page = if self.wrap_text {
            self.page_starts.partition_point(|&start| start <= item).saturating_sub(1)
        } else {
            item / self.page_size
        };
        page.min(self.total_pages() - 1)
    }

    /// Rows `item` takes on screen when wrapped, at most a full page
    fn wrapped_height(&self, item: &str) -> usize {
        text::wrap(&text::sanitize(item), self.width)
            .len()
            .min(self.page_size)
    }

    /// Recompute page boundaries and move to the page holding `first`
    fn relayout(&mut self, first: usize) {
        self.page_starts = vec![0];
        if self.wrap_text {
            let mut used = 0;
            for (idx, item) in self.items.iter().enumerate() {
                let height = self.wrapped_height(item);
                if used > 0 && used + height > self.page_size {
                    self.page_starts.push(idx);
                    used = 0;
                }
                used += height;
            }
        }
        self.current_page = self.page_of(first);
    }

    pub fn page_items(&self) -> &[String] {
        &self.items[self.page_range()]
    }

    /// Change the page size, keeping the first visible item on screen
    pub fn set_page_size(&mut self, page_size: usize) {
        self.resize(self.width, page_size);
    }

    /// Lay out for `width` columns and `page_size` rows, keeping the first
    /// visible item on screen
    pub fn resize(&mut self, width: usize, page_size: usize) {
        let first = self.page_range().start;
        self.width = width.max(1);
        self.page_size = page_size.max(1);
        self.relayout(first);
    }

    fn go_to_page(&mut self, page: usize) -> bool {
        let page = page.min(self.total_pages() - 1);
        let changed = page != self.current_page;
        self.current_page = page;
        changed
    }

    pub fn next_page(&mut self) -> bool {
        self.go_to_page(self.current_page + 1)
    }

    pub fn prev_page(&mut self) -> bool {
        self.go_to_page(self.current_page.saturating_sub(1))
    }

    pub fn first_page(&mut self) -> bool {
        self.go_to_page(0)
    }

    pub fn last_page(&mut self) -> bool {
        self.go_to_page(self.total_pages() - 1)
    }

    /// Indices of items containing `query`, case-insensitively, in order
    pub fn search(&self, query: &str) -> Vec<usize> {
        self.items
            .iter()
            .enumerate()
            .filter(|(_, item)| text::contains_ignore_case(item, query))
            .map(|(idx, _)| idx)
            .collect()
    }

    pub fn begin_search(&mut self) {
        self.mode = Mode::Search;
        self.input.clear();
    }

    pub fn search_input(&mut self, c: char) {
        self.input.push(c);
    }

    /// Drop the last rune. Returns true if that emptied the query and left Search.
    pub fn search_backspace(&mut self) -> bool {
        self.input.pop();
        if self.input.is_empty() {
            self.mode = Mode::Navigate;
            self.clear_search();
            return true;
        }
        false
    }

    /// Run the typed query and jump to the first match, if any
    pub fn commit_search(&mut self) {
        self.mode = Mode::Navigate;
        let query = std::mem::take(&mut self.input);
        if query.is_empty() {
            return;
        }

        self.search_matches = self.search(&query);
        self.search_query = query;
        if self.search_matches.is_empty() {
            self.current_match = None;
        } else {
            self.current_match = Some(0);
            self.jump_to_current_match();
        }
    }

    /// Leave Search, keeping the last committed query and matches
    pub fn cancel_search(&mut self) {
        self.mode = Mode::Navigate;
        self.input.clear();
    }

    pub fn clear_search(&mut self) {
        self.search_query.clear();
        self.search_matches.clear();
        self.current_match = None;
    }

    pub fn next_match(&mut self) -> bool {
        let len = self.search_matches.len();
        match self.current_match {
            Some(i) if len > 0 => {
                self.current_match = Some((i + 1) % len);
                self.jump_to_current_match();
                true
            }
            _ => false,
        }
    }

    pub fn prev_match(&mut self) -> bool {
        let len = self.search_matches.len();
        match self.current_match {
            Some(i) if len > 0 => {
                self.current_match = Some((i + len - 1) % len);
                self.jump_to_current_match();
                true
            }
            _ => false,
        }
    }

    fn jump_to_current_match(&mut self) {
        if let Some(&item) = self.current_match.and_then(|i| self.search_matches.get(i)) {
            self.go_to_page(self.page_of(item));
        }
    }

    /// Item index of the current match
    pub fn current_match_item(&self) -> Option<usize> {
        self.current_match.and_then(|i| self.search_matches.get(i).copied())
    }

    /// Query used for highlighting, if any
    pub fn highlight_query(&self) -> Option<&str> {
        if self.search_query.is_empty() {
            None
        } else {
            Some(&self.search_query)
        }
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn toggle_wrap(&mut self) {
        self.set_wrap_text(!self.wrap_text);
    }

    /// Live query, else help, else position summary
    pub fn status_line(&self) -> String {
        if self.mode == Mode::Search {
            return format!("/{}", self.input);
        }
        if self.show_help {
            return HELP_TEXT.to_string();
        }

        let mut status = format!("page {}/{}", self.current_page + 1, self.total_pages());
        if let Some(i) = self.current_match {
            status.push_str(&format!(" | match {}/{}", i + 1, self.search_matches.len()));
        } else if !self.search_query.is_empty() {
            status.push_str(&format!(" | no match for '{}'", self.search_query));
        }
        status.push_str(if self.wrap_text { " | wrap on" } else { " | wrap off" });
        status
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> Action {
        match self.mode {
            Mode::Navigate => self.handle_navigate(key),
            Mode::Search => self.handle_search(key),
        }
    }

    fn handle_navigate(&mut self, key: KeyEvent) -> Action {
        let page_damage = |changed: bool| {
            if changed {
                Damage::FULL
            } else {
                Damage::empty()
            }
        };

        let damage = match key {
            KeyEvent::Printable('q') | KeyEvent::Control('c') => return Action::Quit,
            KeyEvent::Printable('/') => {
                self.begin_search();
                Damage::FULL
            }
            KeyEvent::Arrow(Direction::Up | Direction::Left)
            | KeyEvent::PageUp
            | KeyEvent::Printable('b') => page_damage(self.prev_page()),
            KeyEvent::Arrow(Direction::Down | Direction::Right)
            | KeyEvent::PageDown
            | KeyEvent::Printable(' ') => page_damage(self.next_page()),
            KeyEvent::Home | KeyEvent::Printable('g') => page_damage(self.first_page()),
            KeyEvent::End | KeyEvent::Printable('G') => page_damage(self.last_page()),
            KeyEvent::Printable('n') => page_damage(self.next_match()),
            KeyEvent::Printable('N') => page_damage(self.prev_match()),
            KeyEvent::Printable('c') => {
                self.clear_search();
                Damage::FULL
            }
            KeyEvent::Printable('h') => {
                self.toggle_help();
                Damage::STATUS
            }
            KeyEvent::Escape if self.show_help => {
                self.show_help = false;
                Damage::STATUS
            }
            KeyEvent::Printable('w') => {
                self.toggle_wrap();
                Damage::FULL
            }
            KeyEvent::Control('l') => Damage::FULL,
            _ => Damage::empty(),
        };
        Action::Continue(damage)
    }

    fn handle_search(&mut self, key: KeyEvent) -> Action {
        let damage = match key {
            KeyEvent::Printable(c) => {
                self.search_input(c);
                Damage::STATUS
            }
            KeyEvent::Backspace => {
                if self.search_backspace() {
                    Damage::FULL
                } else {
                    Damage::STATUS
                }
            }
            KeyEvent::Enter => {
                self.commit_search();
                Damage::FULL
            }
            KeyEvent::Escape => {
                self.cancel_search();
                Damage::FULL
            }
            KeyEvent::Control('c') => return Action::Quit,
            _ => Damage::empty(),
        };
        Action::Continue(damage)
    }
}
