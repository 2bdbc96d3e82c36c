// src/site/paginate.rs
//! Index pagination: page 1 is `index.html`, page n >= 2 is `page/<n>.html`.

use std::ops::Range;

/// `ceil(n / per_page)`. Zero items means zero pages.
pub fn total_pages(n: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    n.div_ceil(per_page)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// 1-based.
    pub number: usize,
    pub total: usize,
    pub items: Range<usize>,
}

impl Page {
    /// Output path relative to the site root.
    pub fn path(&self) -> String {
        page_path(self.number)
    }

    pub fn prev(&self) -> Option<usize> {
        (self.number > 1).then(|| self.number - 1)
    }

    pub fn next(&self) -> Option<usize> {
        (self.number < self.total).then(|| self.number + 1)
    }
}

pub fn page_path(number: usize) -> String {
    if number <= 1 {
        "index.html".to_string()
    } else {
        format!("page/{number}.html")
    }
}

/// Site-root URL of a page (`/` for the first).
pub fn page_url(number: usize) -> String {
    if number <= 1 {
        "/".to_string()
    } else {
        format!("/{}", page_path(number))
    }
}

/// Index ranges for every page. An empty corpus still yields one empty first
/// page so `index.html` always exists.
pub fn paginate(n: usize, per_page: usize) -> Vec<Page> {
    let per_page = per_page.max(1);
    let total = total_pages(n, per_page);
    if total == 0 {
        return vec![Page {
            number: 1,
            total: 1,
            items: 0..0,
        }];
    }
    (0..total)
        .map(|i| Page {
            number: i + 1,
            total,
            items: i * per_page..((i + 1) * per_page).min(n),
        })
        .collect()
}
