//! Logical → physical page mapping.
//!
//! Logical pages are 1-based and come from the schema. Physical pages are the
//! 0-based slots of the output; an optional cover page takes slot 0 and
//! shifts everything after it by one.

use log::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageMap {
    declared: usize,
    has_cover: bool,
}

impl PageMap {
    pub fn new(declared: usize, has_cover: bool) -> Self {
        PageMap { declared: declared.max(1), has_cover }
    }

    pub fn declared(&self) -> usize {
        self.declared
    }

    pub fn has_cover(&self) -> bool {
        self.has_cover
    }

    /// Physical slots consumed before logical page 1.
    pub fn page_offset(&self) -> usize {
        usize::from(self.has_cover)
    }

    /// Pages allocated up front: the declared pages plus the cover.
    pub fn physical_count(&self) -> usize {
        self.declared + self.page_offset()
    }

    /// First physical index that carries a header and footer.
    pub fn first_decorated(&self) -> usize {
        self.page_offset()
    }

    pub fn is_decorated(&self, physical: usize) -> bool {
        physical >= self.first_decorated()
    }

    /// Physical index of the first content page.
    pub fn first_content_page(&self) -> usize {
        self.page_offset()
    }

    /// Map a 1-based logical page to a physical index. Pages past the end
    /// clamp to the last existing page instead of failing; page 0 is read as
    /// page 1.
    pub fn physical_index(&self, logical: u32, page_count: usize) -> usize {
        let wanted = (logical.max(1) as usize - 1) + self.page_offset();
        let last = page_count.max(1) - 1;
        if wanted > last {
            debug!("Logical page {} is past the last page, clamping to physical {}", logical, last);
        }
        wanted.min(last)
    }

    /// Number printed for a physical page, 1-based from the first content page.
    /// `None` for the cover.
    pub fn display_number(&self, physical: usize) -> Option<usize> {
        physical.checked_sub(self.page_offset()).map(|n| n + 1)
    }

    /// Total printed page count for `page_count` physical pages.
    pub fn display_total(&self, page_count: usize) -> usize {
        page_count.saturating_sub(self.page_offset())
    }
}
