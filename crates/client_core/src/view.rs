use crate::state::Rendering;

pub trait CatalogView: Send + Sync {
    fn show_loading(&self);

    // Unchanged: clear the loading indicator, keep what is shown.
    fn render(&self, rendering: &Rendering);

    fn render_pagination(&self, total_pages: i64, current_page: i64);

    fn scroll_to_catalog(&self);
}
