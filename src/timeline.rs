//! Timeline layout for task progress bars.
//!
//! Maps a task's poll responses onto a fixed-geometry bar with two zones laid
//! end to end: "In progress" (60% of the track) and "In review" (40%). Dot
//! placement is a deliberately fixed, non-linear lookup rather than a
//! function of elapsed time: poll timestamps are irregular, and the bar only
//! needs to convey relative sequence, not duration.

use crate::models::PollResponse;

/// A named horizontal segment of the timeline bar.
#[derive(Debug, Clone, Copy)]
pub struct Zone {
    pub label: &'static str,
    /// Width as a share of the whole track, in percent.
    pub width_pct: u8,
}

/// The phase zones, laid end to end left to right.
pub const ZONES: [Zone; 2] = [
    Zone {
        label: "In progress",
        width_pct: 60,
    },
    Zone {
        label: "In review",
        width_pct: 40,
    },
];

/// A dot on the timeline bar. Derived per render, never persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TimelinePoint {
    /// Horizontal position on the track, 0 to 100.
    pub percent: u8,
    /// The latest marker (or the completion marker of a task with no
    /// recorded responses).
    pub terminal: bool,
    pub tooltip: String,
}

/// Dot position for the response at `response_index` out of `total_count`.
///
/// Pure and total. A completed task pins its last marker to 100 regardless of
/// natural spacing; otherwise positions come from a fixed lookup per count.
/// Ties are broken by input order (callers sort responses ascending by poll
/// timestamp before indexing; this function never reorders anything).
/// `response_index >= total_count` is a caller contract violation.
pub fn position_of(response_index: usize, total_count: usize, is_done: bool) -> u8 {
    if is_done && total_count > 0 && response_index == total_count - 1 {
        return 100;
    }
    if is_done && total_count == 0 {
        return 100;
    }
    if total_count == 1 {
        return 30;
    }
    if total_count == 2 {
        return if response_index == 0 { 30 } else { 80 };
    }
    if total_count >= 3 {
        if response_index == 0 {
            return 20;
        }
        if response_index == 1 {
            return 40;
        }
        // Open tasks collapse later responses into the review zone; a done
        // task pulls them to the end with the pinned final marker.
        return if is_done { 100 } else { 80 };
    }
    // total_count == 0 and not done: no dot is ever rendered for this input
    // at real call sites. Dead branch kept total rather than panicking.
    30
}

/// Lay out a task's poll responses as timeline points.
///
/// `responses` must already be sorted ascending by `polled_at`; that sort is
/// the caller's responsibility (see `Task::sorted_poll_responses`). A
/// completed task with no recorded responses still yields a single terminal
/// point at the end of the track.
pub fn layout(responses: &[PollResponse], is_done: bool) -> Vec<TimelinePoint> {
    let n = responses.len();
    if n == 0 && is_done {
        return vec![TimelinePoint {
            percent: 100,
            terminal: true,
            tooltip: "Completed".to_string(),
        }];
    }
    responses
        .iter()
        .enumerate()
        .map(|(i, response)| TimelinePoint {
            percent: position_of(i, n, is_done),
            terminal: i == n - 1,
            tooltip: response_tooltip(response),
        })
        .collect()
}

/// Tooltip text for one poll response.
fn response_tooltip(response: &PollResponse) -> String {
    let date = response.polled_at.format("%d.%m.%Y");
    let name = response
        .user
        .as_ref()
        .map(|u| u.display_name())
        .unwrap_or_else(|| "Assignee".to_string());
    let answer = response
        .response_text
        .as_deref()
        .unwrap_or("")
        .trim()
        .to_string();
    if answer.is_empty() {
        format!("{}: {}: polled, no reply", date, name)
    } else {
        format!("{}: {}: \"{}\"", date, name, answer)
    }
}

const DOT: char = '●';
const TERMINAL_DOT: char = '◆';
const TRACK: char = '─';

/// Render timeline points as a plain-text bar.
///
/// Example output for two responses on a completed task:
/// ```text
/// ──────────●─────────────────────────◆
/// ```
/// Later points win a cell when positions collide, matching their stacking
/// order on screen.
pub fn render_bar(points: &[TimelinePoint], width: usize) -> String {
    let width = width.max(2);
    let mut cells: Vec<char> = vec![TRACK; width];
    for point in points {
        let col = (point.percent as usize * (width - 1)) / 100;
        cells[col] = if point.terminal { TERMINAL_DOT } else { DOT };
    }
    cells.into_iter().collect()
}

/// Zone labels spaced under a bar of the given width.
pub fn render_zone_labels(width: usize) -> String {
    let width = width.max(2);
    let mut output = String::new();
    for zone in ZONES {
        let cells = (width * zone.width_pct as usize) / 100;
        let label: String = zone.label.chars().take(cells).collect();
        output.push_str(&label);
        for _ in label.chars().count()..cells {
            output.push(' ');
        }
    }
    output.trim_end().to_string()
}
