//! PDF export of a user's task list.
//!
//! Layout is computed first as plain [`ReportPage`]s so it can be checked
//! without parsing PDF output; [`render_pdf`] then draws those pages.

use printpdf::{BuiltinFont, Mm, PdfDocument, Pt};

use super::Task;
use crate::category::Category;

/// A4 portrait, in points.
pub const PAGE_WIDTH: f32 = 595.0;
pub const PAGE_HEIGHT: f32 = 842.0;

pub const LEFT_MARGIN: f32 = 100.0;
pub const TITLE_Y: f32 = 800.0;
pub const FIRST_LINE_Y: f32 = 770.0;
pub const LINE_SPACING: f32 = 20.0;
/// Lines are never drawn below this height.
pub const BOTTOM_MARGIN: f32 = 50.0;
/// Where body lines resume on continuation pages.
pub const CONTINUATION_Y: f32 = 800.0;

pub const REPORT_TITLE: &str = "Tasks:";
pub const UNCATEGORIZED_HEADING: &str = "Without Category:";
pub const FILENAME: &str = "todo_list.pdf";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Title,
    Body,
}

impl LineStyle {
    pub fn font_size(&self) -> f32 {
        match self {
            LineStyle::Title => 16.0,
            LineStyle::Body => 12.0,
        }
    }

    fn font(&self) -> BuiltinFont {
        match self {
            LineStyle::Title => BuiltinFont::HelveticaBold,
            LineStyle::Body => BuiltinFont::Helvetica,
        }
    }
}

/// One line of text at an absolute position, in points from the bottom-left corner.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportLine {
    pub text: String,
    pub style: LineStyle,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportPage {
    pub lines: Vec<ReportLine>,
}

/// Tasks printed under one heading.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskGroup<'a> {
    pub heading: String,
    pub tasks: Vec<&'a Task>,
}

#[derive(Debug, thiserror::Error)]
pub enum PdfError {
    #[error("PDF rendering failed: {0}")]
    Render(String),
}

/// Groups tasks by category, in category order, with uncategorized tasks last.
///
/// Categories without tasks are left out. Tasks keep their relative order.
pub fn group_by_category<'a>(tasks: &'a [Task], categories: &[Category]) -> Vec<TaskGroup<'a>> {
    let mut groups: Vec<TaskGroup<'a>> = categories
        .iter()
        .map(|category| TaskGroup {
            heading: format!("{}:", category.name()),
            tasks: tasks
                .iter()
                .filter(|task| task.category_id() == Some(category.id()))
                .collect(),
        })
        .filter(|group| !group.tasks.is_empty())
        .collect();

    let uncategorized: Vec<&Task> = tasks
        .iter()
        .filter(|task| {
            task.category_id()
                .is_none_or(|id| !categories.iter().any(|category| category.id() == id))
        })
        .collect();
    if !uncategorized.is_empty() {
        groups.push(TaskGroup {
            heading: UNCATEGORIZED_HEADING.to_string(),
            tasks: uncategorized,
        });
    }
    groups
}

/// `"N. Title - Done"` or `"N. Title - Not Done"`.
pub fn task_line(number: usize, task: &Task) -> String {
    format!("{}. {} - {}", number, task.title(), task.status_label())
}

/// Positions the title, group headings and numbered task lines on pages.
pub fn layout_report(groups: &[TaskGroup<'_>]) -> Vec<ReportPage> {
    let mut pages = vec![ReportPage {
        lines: vec![ReportLine {
            text: REPORT_TITLE.to_string(),
            style: LineStyle::Title,
            x: LEFT_MARGIN,
            y: TITLE_Y,
        }],
    }];
    let mut y = FIRST_LINE_Y;

    let mut push_body_line = |text: String| {
        if y < BOTTOM_MARGIN {
            pages.push(ReportPage::default());
            y = CONTINUATION_Y;
        }
        if let Some(page) = pages.last_mut() {
            page.lines.push(ReportLine {
                text,
                style: LineStyle::Body,
                x: LEFT_MARGIN,
                y,
            });
        }
        y -= LINE_SPACING;
    };

    for group in groups {
        push_body_line(group.heading.clone());
        for (index, task) in group.tasks.iter().enumerate() {
            push_body_line(task_line(index + 1, task));
        }
    }
    pages
}

/// Draws laid out pages into a PDF document.
///
/// The built-in Helvetica fonts only cover WinAnsi, so characters outside it
/// (Cyrillic, CJK, emoji) are left out of the rendered text.
pub fn render_pdf(pages: &[ReportPage]) -> Result<Vec<u8>, PdfError> {
    let (doc, first_page, first_layer) = PdfDocument::new(
        "Tasks",
        Mm::from(Pt(PAGE_WIDTH)),
        Mm::from(Pt(PAGE_HEIGHT)),
        "Layer 1",
    );
    let title_font = doc
        .add_builtin_font(LineStyle::Title.font())
        .map_err(render_error)?;
    let body_font = doc
        .add_builtin_font(LineStyle::Body.font())
        .map_err(render_error)?;
    let mut first = Some((first_page, first_layer));
    for page in pages {
        let (page_index, layer_index) = match first.take() {
            Some(indices) => indices,
            None => doc.add_page(
                Mm::from(Pt(PAGE_WIDTH)),
                Mm::from(Pt(PAGE_HEIGHT)),
                "Layer 1",
            ),
        };
        let layer = doc.get_page(page_index).get_layer(layer_index);
        for line in &page.lines {
            let font = match line.style {
                LineStyle::Title => &title_font,
                LineStyle::Body => &body_font,
            };
            layer.use_text(
                line.text.as_str(),
                line.style.font_size(),
                Mm::from(Pt(line.x)),
                Mm::from(Pt(line.y)),
                font,
            );
        }
    }

    doc.save_to_bytes().map_err(render_error)
}

/// Builds the complete export for a user's tasks and categories.
pub fn build_task_report(tasks: &[Task], categories: &[Category]) -> Result<Vec<u8>, PdfError> {
    let groups = group_by_category(tasks, categories);
    render_pdf(&layout_report(&groups))
}

fn render_error<E: std::fmt::Debug>(err: E) -> PdfError {
    PdfError::Render(format!("{err:?}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::sea_orm_active_enums::Priority;
    use chrono::DateTime;

    fn task(id: i32, title: &str, complete: bool, category_id: Option<i32>) -> Task {
        Task {
            id,
            user_id: 1,
            title: title.to_string(),
            description: None,
            complete,
            created_at: DateTime::parse_from_rfc3339("2025-01-01T00:00:00+00:00").unwrap(),
            priority: Priority::High,
            category_id,
            deadline: None,
        }
    }

    fn category(id: i32, name: &str) -> Category {
        Category::new(id, name.to_string(), None, 1)
    }

    fn texts(page: &ReportPage) -> Vec<&str> {
        page.lines.iter().map(|line| line.text.as_str()).collect()
    }

    #[test]
    fn can_group_tasks_under_categories() {
        let tasks = vec![
            task(1, "Pay rent", false, Some(2)),
            task(2, "Call mom", true, None),
            task(3, "Write report", false, Some(1)),
            task(4, "Book flights", true, Some(2)),
        ];
        let categories = vec![category(1, "Work"), category(2, "Home"), category(3, "Empty")];

        let groups = group_by_category(&tasks, &categories);

        let headings: Vec<&str> = groups.iter().map(|group| group.heading.as_str()).collect();
        assert_eq!(headings, vec!["Work:", "Home:", "Without Category:"]);
        let home: Vec<i32> = groups[1].tasks.iter().map(|task| task.id()).collect();
        assert_eq!(home, vec![1, 4]);
        assert_eq!(groups[2].tasks[0].title(), "Call mom");
    }

    #[test]
    fn can_layout_title_and_numbered_lines() {
        let tasks = vec![
            task(1, "Write report", false, Some(1)),
            task(2, "Review code", true, Some(1)),
            task(3, "Call mom", false, None),
        ];
        let categories = vec![category(1, "Work")];

        let pages = layout_report(&group_by_category(&tasks, &categories));

        assert_eq!(pages.len(), 1);
        assert_eq!(
            texts(&pages[0]),
            vec![
                "Tasks:",
                "Work:",
                "1. Write report - Not Done",
                "2. Review code - Done",
                "Without Category:",
                "1. Call mom - Not Done",
            ]
        );
        let title = &pages[0].lines[0];
        assert_eq!((title.x, title.y, title.style), (100.0, 800.0, LineStyle::Title));
        let ys: Vec<f32> = pages[0].lines[1..].iter().map(|line| line.y).collect();
        assert_eq!(ys, vec![770.0, 750.0, 730.0, 710.0, 690.0]);
        assert!(pages[0].lines[1..]
            .iter()
            .all(|line| line.style == LineStyle::Body && line.x == LEFT_MARGIN));
    }

    #[test]
    fn empty_report_has_only_the_title() {
        let pages = layout_report(&group_by_category(&[], &[]));
        assert_eq!(pages.len(), 1);
        assert_eq!(texts(&pages[0]), vec!["Tasks:"]);
    }

    #[test]
    fn can_continue_long_lists_on_new_pages() {
        let tasks: Vec<Task> = (1..=40)
            .map(|id| task(id, &format!("Task {id}"), false, None))
            .collect();

        let pages = layout_report(&group_by_category(&tasks, &[]));

        // heading plus 40 tasks; 37 body lines fit between y=770 and y=50
        assert_eq!(pages.len(), 2);
        assert_eq!(pages[0].lines.len(), 1 + 37);
        assert_eq!(pages[0].lines.last().map(|line| line.y), Some(BOTTOM_MARGIN));
        assert_eq!(pages[1].lines.len(), 4);
        assert_eq!(pages[1].lines[0].y, CONTINUATION_Y);
        assert_eq!(pages[1].lines[3].text, "40. Task 40 - Not Done");
        assert!(pages.iter().flat_map(|page| &page.lines).all(|line| line.y >= BOTTOM_MARGIN));
    }

    #[test]
    fn can_render_pdf_document() {
        let tasks = vec![task(1, "Write report", false, None)];
        let bytes = build_task_report(&tasks, &[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn can_render_pdf_with_titles_outside_winansi() {
        let tasks = vec![
            task(1, "Купить молоко", false, None),
            task(2, "Crème brûlée", true, None),
        ];
        let bytes = build_task_report(&tasks, &[]).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
