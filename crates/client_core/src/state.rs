use std::collections::HashSet;

use shared::{
    domain::CategoryFilter,
    protocol::{Course, CoursePage},
};

#[derive(Debug, Clone, PartialEq)]
pub enum Rendering {
    Courses(Vec<Course>),
    NoResults,
    Unchanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListingTicket {
    pub seq: u64,
    pub page: i64,
    pub filter: CategoryFilter,
}

impl ListingTicket {
    pub fn replaces_content(&self) -> bool {
        self.filter != CategoryFilter::All || self.page != 1
    }
}

#[derive(Debug, Clone)]
pub struct CatalogState {
    pub current_page: i64,
    pub current_filter: CategoryFilter,
    pub items: Vec<Course>,
    pub total_pages: i64,
    pub static_items: Vec<Course>,
    latest_seq: u64,
}

impl Default for CatalogState {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl CatalogState {
    pub fn new(static_items: Vec<Course>) -> Self {
        Self {
            current_page: 1,
            current_filter: CategoryFilter::All,
            items: Vec::new(),
            total_pages: 1,
            static_items,
            latest_seq: 0,
        }
    }

    pub fn latest_seq(&self) -> u64 {
        self.latest_seq
    }

    pub fn begin(&mut self) -> ListingTicket {
        self.latest_seq += 1;
        ListingTicket {
            seq: self.latest_seq,
            page: self.current_page,
            filter: self.current_filter,
        }
    }

    pub fn is_current(&self, ticket: &ListingTicket) -> bool {
        ticket.seq == self.latest_seq
    }

    pub fn apply_page(&mut self, ticket: &ListingTicket, page: CoursePage) -> Option<Rendering> {
        if !self.is_current(ticket) {
            return None;
        }
        self.total_pages = page.total_pages;
        self.current_page = page.current_page.max(1);
        self.items = page.items;
        if self.items.is_empty() {
            Some(Rendering::NoResults)
        } else {
            Some(Rendering::Courses(self.items.clone()))
        }
    }

    // Stale tickets yield None; displayed items are never cleared.
    pub fn apply_failure(&mut self, ticket: &ListingTicket) -> Option<Rendering> {
        if !self.is_current(ticket) {
            return None;
        }
        match ticket.filter {
            CategoryFilter::All => Some(Rendering::Unchanged),
            filter => Some(Rendering::Courses(self.fallback_items(filter))),
        }
    }

    pub fn fallback_items(&self, filter: CategoryFilter) -> Vec<Course> {
        let mut seen = HashSet::new();
        self.static_items
            .iter()
            .chain(self.items.iter())
            .filter(|course| filter.matches(course.category))
            .filter(|course| seen.insert(course.id))
            .cloned()
            .collect()
    }
}
