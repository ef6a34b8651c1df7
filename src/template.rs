use askama_actix::Template;

/// Pages shown on each side of the current one.
const PAGINATOR_LOOK_AHEAD: u64 = 2;

/// Numbered page links for an htmx-driven table.
///
/// [1] 2 3 ... 13
/// 1 2 [3] 4 5 ... 13
/// 1 ... 4 5 [6] 7 8 ... 13
/// 1 ... 11 12 [13]
#[derive(Debug, Clone)]
pub struct Paginator {
    /// Fragment endpoint; `?page=N` is appended.
    pub base_url: String,
    /// Element the fragment replaces.
    pub target: &'static str,
    /// Form whose inputs travel with each page request.
    pub include: &'static str,
    pub this_page: u64,
    pub page_count: u64,
}

#[derive(Template)]
#[template(path = "util/paginator.html")]
struct PaginatorTemplate<'a> {
    paginator: &'a Paginator,
}

impl Paginator {
    pub fn has_pages(&self) -> bool {
        self.page_count > 1
    }

    pub fn is_current_page(&self, page: &u64) -> bool {
        *page == self.this_page
    }

    /// Page numbers to render; `None` marks a gap.
    pub fn links(&self) -> Vec<Option<u64>> {
        let window_start = self.this_page.saturating_sub(PAGINATOR_LOOK_AHEAD).max(1);
        let window_end = (self.this_page + PAGINATOR_LOOK_AHEAD).min(self.page_count);

        let mut links = Vec::new();
        if window_start > 1 {
            links.push(Some(1));
            if window_start > 2 {
                links.push(None);
            }
        }
        links.extend((window_start..=window_end).map(Some));
        if window_end < self.page_count {
            if window_end + 1 < self.page_count {
                links.push(None);
            }
            links.push(Some(self.page_count));
        }
        links
    }

    pub fn as_html(&self) -> String {
        if !self.has_pages() {
            return String::new();
        }
        match (PaginatorTemplate { paginator: self }).render() {
            Ok(html) => html,
            Err(e) => {
                log::error!("Paginator render failed: {}", e);
                "[Paginator Util Error]".to_owned()
            }
        }
    }
}
