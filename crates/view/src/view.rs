//! Per-family view state.

use serde::{Deserialize, Serialize};
use hotelops_core::{Task, TaskFamily, TaskFilter, Time};
use crate::filter::matches_filter;
use crate::page::{paginate, Page};
use crate::sort::{sort_tasks, SortOrder};

/// Default number of rows per page.
pub const DEFAULT_PAGE_SIZE: usize = 20;

/// Filter, sort and page position for one task family.
///
/// Changing the filter or the page size always goes back to the first page,
/// so the view never points past the end of a shrunken result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    family: TaskFamily,
    filter: TaskFilter,
    sort: SortOrder,
    page: usize,
    page_size: usize,
}

impl TaskView {
    /// Unfiltered view of `family`, first page.
    pub fn new(family: TaskFamily) -> Self {
        Self {
            family,
            filter: TaskFilter::default(),
            sort: SortOrder::default(),
            page: 0,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Builder: page size.
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Builder: sort order.
    pub fn with_sort(mut self, sort: SortOrder) -> Self {
        self.sort = sort;
        self
    }

    /// Family shown.
    pub fn family(&self) -> TaskFamily {
        self.family
    }

    /// Active filter.
    pub fn filter(&self) -> &TaskFilter {
        &self.filter
    }

    /// Active sort order.
    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    /// Current zero-based page.
    pub fn page(&self) -> usize {
        self.page
    }

    /// Rows per page.
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Replace the filter; resets to the first page.
    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.page = 0;
    }

    /// Edit the filter in place; resets to the first page.
    pub fn update_filter(&mut self, edit: impl FnOnce(&mut TaskFilter)) {
        edit(&mut self.filter);
        self.page = 0;
    }

    /// Drop every filter; resets to the first page.
    pub fn clear_filter(&mut self) {
        self.set_filter(TaskFilter::default());
    }

    /// Change the sort order.
    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
    }

    /// Change the page size; resets to the first page.
    pub fn set_page_size(&mut self, page_size: usize) {
        self.page_size = page_size;
        self.page = 0;
    }

    /// Jump to a page.
    pub fn set_page(&mut self, page: usize) {
        self.page = page;
    }

    /// Back to defaults, keeping the family and page size.
    pub fn reset(&mut self) {
        self.filter = TaskFilter::default();
        self.sort = SortOrder::default();
        self.page = 0;
    }

    /// Tasks of this family passing the filter, in sort order.
    pub fn visible<'a>(&self, tasks: &'a [Task], now: Time) -> Vec<&'a Task> {
        let mut selected: Vec<&Task> = tasks
            .iter()
            .filter(|task| task.family() == self.family && matches_filter(task, &self.filter))
            .collect();
        sort_tasks(&mut selected, self.sort, now);
        selected
    }

    /// The current page of [`TaskView::visible`].
    pub fn render(&self, tasks: &[Task], now: Time) -> Page<Task> {
        let selected: Vec<Task> = self.visible(tasks, now).into_iter().cloned().collect();
        let page = paginate(&selected, self.page, self.page_size);
        tracing::debug!(
            family = %self.family,
            page = page.page,
            shown = page.items.len(),
            total = page.total_elements,
            "Rendered task view"
        );
        page
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::tests::{base_time, task};
    use hotelops_core::{Priority, RepairType, TaskKind, TaskStatus};

    fn mixed() -> Vec<Task> {
        let mut tasks: Vec<Task> = (0..5).map(|_| task(TaskStatus::Pending, Priority::Normal)).collect();
        for _ in 0..3 {
            let mut repair = task(TaskStatus::Pending, Priority::High);
            repair.kind = TaskKind::Repair(RepairType::Electrical);
            tasks.push(repair);
        }
        tasks
    }

    #[test]
    fn test_render_shows_only_own_family() {
        let tasks = mixed();
        let view = TaskView::new(TaskFamily::Repair);
        let page = view.render(&tasks, base_time());
        assert_eq!(page.total_elements, 3);
        assert!(page.items.iter().all(|t| t.family() == TaskFamily::Repair));
    }

    #[test]
    fn test_filter_and_page_size_changes_reset_page() {
        let mut view = TaskView::new(TaskFamily::Servicing).with_page_size(2);
        view.set_page(2);
        view.set_filter(TaskFilter { floor_number: Some(2), ..Default::default() });
        assert_eq!(view.page(), 0);

        view.set_page(1);
        view.update_filter(|f| f.priority.push(Priority::Normal));
        assert_eq!(view.page(), 0);

        view.set_page(1);
        view.set_page_size(10);
        assert_eq!(view.page(), 0);

        view.set_page(1);
        view.set_sort(SortOrder::Status);
        assert_eq!(view.page(), 1);
    }

    #[test]
    fn test_render_pages_through_results() {
        let tasks = mixed();
        let mut view = TaskView::new(TaskFamily::Servicing).with_page_size(2);
        let first = view.render(&tasks, base_time());
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.total_pages, 3);

        view.set_page(2);
        let last = view.render(&tasks, base_time());
        assert_eq!(last.items.len(), 1);
        assert!(!last.has_next);
    }

    #[test]
    fn test_reset_keeps_family_and_page_size() {
        let mut view = TaskView::new(TaskFamily::Repair).with_page_size(5).with_sort(SortOrder::DueDate);
        view.set_filter(TaskFilter { floor_number: Some(1), ..Default::default() });
        view.set_page(3);
        view.reset();
        assert!(view.filter().is_empty());
        assert_eq!(view.sort(), SortOrder::Urgency);
        assert_eq!(view.page(), 0);
        assert_eq!(view.page_size(), 5);
        assert_eq!(view.family(), TaskFamily::Repair);
    }
}
