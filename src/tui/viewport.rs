//! Scrollable text region for the command output.

const TAB_WIDTH: usize = 4;
const WHEEL_LINES: usize = 3;

/// Navigation requests understood by [`Viewport::scroll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrollAction {
    LineUp(usize),
    LineDown(usize),
    HalfPageUp,
    HalfPageDown,
    PageUp,
    PageDown,
    Top,
    Bottom,
}

impl ScrollAction {
    pub fn wheel_up() -> Self {
        ScrollAction::LineUp(WHEEL_LINES)
    }

    pub fn wheel_down() -> Self {
        ScrollAction::LineDown(WHEEL_LINES)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Viewport {
    lines: Vec<String>,
    width: u16,
    height: u16,
    offset: usize,
}

impl Viewport {
    pub fn new(width: u16, height: u16) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Replace the content, keeping the scroll position where it still fits.
    pub fn set_content(&mut self, text: &str) {
        self.lines = text
            .lines()
            .map(|l| l.replace('\t', &" ".repeat(TAB_WIDTH)))
            .collect();
        self.clamp();
    }

    pub fn resize(&mut self, width: u16, height: u16) {
        self.width = width;
        self.height = height;
        self.clamp();
    }

    pub fn scroll(&mut self, action: ScrollAction) {
        let page = self.height as usize;
        let half = (page / 2).max(1);
        self.offset = match action {
            ScrollAction::LineUp(n) => self.offset.saturating_sub(n),
            ScrollAction::LineDown(n) => self.offset.saturating_add(n),
            ScrollAction::HalfPageUp => self.offset.saturating_sub(half),
            ScrollAction::HalfPageDown => self.offset.saturating_add(half),
            ScrollAction::PageUp => self.offset.saturating_sub(page.max(1)),
            ScrollAction::PageDown => self.offset.saturating_add(page.max(1)),
            ScrollAction::Top => 0,
            ScrollAction::Bottom => self.max_offset(),
        };
        self.clamp();
    }

    /// Lines currently inside the window.
    pub fn visible(&self) -> &[String] {
        let end = (self.offset + self.height as usize).min(self.lines.len());
        &self.lines[self.offset.min(end)..end]
    }

    /// How far down the content the window is, in `0.0..=1.0`.
    pub fn scroll_percent(&self) -> f64 {
        let max = self.max_offset();
        if max == 0 {
            return 1.0;
        }
        (self.offset as f64 / max as f64).clamp(0.0, 1.0)
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    #[cfg(test)]
    pub fn height(&self) -> u16 {
        self.height
    }

    #[cfg(test)]
    pub fn width(&self) -> u16 {
        self.width
    }

    #[cfg(test)]
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    fn max_offset(&self) -> usize {
        self.lines.len().saturating_sub(self.height as usize)
    }

    fn clamp(&mut self) {
        self.offset = self.offset.min(self.max_offset());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line {i}\n")).collect()
    }

    #[test]
    fn short_content_does_not_scroll() {
        let mut vp = Viewport::new(80, 10);
        vp.set_content("ok\n");
        vp.scroll(ScrollAction::PageDown);
        assert_eq!(vp.offset(), 0);
        assert_eq!(vp.visible(), ["ok".to_string()]);
        assert_eq!(vp.scroll_percent(), 1.0);
    }

    #[test]
    fn scrolling_is_clamped_to_content() {
        let mut vp = Viewport::new(80, 10);
        vp.set_content(&numbered(25));

        vp.scroll(ScrollAction::LineDown(3));
        assert_eq!(vp.offset(), 3);
        assert_eq!(vp.visible()[0], "line 4");

        vp.scroll(ScrollAction::PageDown);
        vp.scroll(ScrollAction::PageDown);
        assert_eq!(vp.offset(), 15);
        assert_eq!(vp.scroll_percent(), 1.0);

        vp.scroll(ScrollAction::HalfPageUp);
        assert_eq!(vp.offset(), 10);

        vp.scroll(ScrollAction::LineUp(100));
        assert_eq!(vp.offset(), 0);
        assert_eq!(vp.scroll_percent(), 0.0);

        vp.scroll(ScrollAction::Bottom);
        assert_eq!(vp.visible().last().map(String::as_str), Some("line 25"));
        vp.scroll(ScrollAction::Top);
        assert_eq!(vp.offset(), 0);
    }

    #[test]
    fn new_content_keeps_offset_when_possible() {
        let mut vp = Viewport::new(80, 5);
        vp.set_content(&numbered(20));
        vp.scroll(ScrollAction::LineDown(8));

        vp.set_content(&numbered(30));
        assert_eq!(vp.offset(), 8);

        vp.set_content(&numbered(10));
        assert_eq!(vp.offset(), 5);
    }

    #[test]
    fn resize_with_same_dimensions_is_a_no_op() {
        let mut vp = Viewport::new(80, 5);
        vp.set_content(&numbered(20));
        vp.scroll(ScrollAction::LineDown(7));

        vp.resize(100, 8);
        let after_first = vp.clone();
        vp.resize(100, 8);
        assert_eq!(vp, after_first);
        assert_eq!(vp.offset(), 7);
    }

    #[test]
    fn growing_the_window_pulls_offset_back() {
        let mut vp = Viewport::new(80, 5);
        vp.set_content(&numbered(20));
        vp.scroll(ScrollAction::Bottom);
        assert_eq!(vp.offset(), 15);

        vp.resize(80, 12);
        assert_eq!(vp.offset(), 8);
        assert_eq!(vp.visible().len(), 12);
    }

    #[test]
    fn tabs_are_expanded() {
        let mut vp = Viewport::new(80, 5);
        vp.set_content("a\tb\n");
        assert_eq!(vp.visible()[0], "a    b");
    }

    #[test]
    fn zero_height_shows_nothing() {
        let mut vp = Viewport::new(80, 0);
        vp.set_content(&numbered(3));
        assert!(vp.visible().is_empty());
        vp.scroll(ScrollAction::PageDown);
        assert_eq!(vp.offset(), 1);
        assert!(vp.visible().is_empty());
    }
}
