use tracks_core::{AppViewModel, TrackRowView};

const MISSING: &str = "N/A";

/// Prints status lines to stdout, skipping lines identical to the last render.
#[derive(Debug, Default)]
pub struct TerminalRenderer {
    last: Vec<String>,
}

impl TerminalRenderer {
    pub fn render(&mut self, view: &AppViewModel) {
        let lines = status_lines(view);
        for line in lines.iter().filter(|line| !self.last.contains(line)) {
            println!("{line}");
        }
        self.last = lines;
    }
}

pub fn status_lines(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();
    if !view.upload_status.is_empty() {
        lines.push(view.upload_status.clone());
    }
    if view.inference.running || view.inference.runs_finished > 0 {
        let state = if view.inference.running {
            "running"
        } else {
            "finished"
        };
        lines.push(format!(
            "Year inference {}: {} / {} started, {} failed",
            state,
            view.inference.accepted,
            view.inference.requested,
            view.inference.failed
        ));
    }
    if let Some(error) = &view.last_error {
        lines.push(format!("Could not fetch tracks: {error}"));
    }
    lines
}

pub fn track_table(view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::with_capacity(view.tracks.len() + 2);
    lines.push(format!(
        "{:>6}  {:<30}  {:<24}  {:<24}  {:>4}  {}",
        "ID", "Title", "Artist", "Album", "Year", "Genre"
    ));
    lines.extend(view.tracks.iter().map(track_row));
    lines.push(summary_line(view));
    lines
}

pub fn summary_line(view: &AppViewModel) -> String {
    let filter = if view.only_missing {
        " [showing missing only]"
    } else {
        ""
    };
    format!(
        "Tracks: {} (missing year: {}){}",
        view.track_count, view.missing_count, filter
    )
}

fn track_row(row: &TrackRowView) -> String {
    let year = row
        .year
        .map(|year| year.to_string())
        .unwrap_or_else(|| MISSING.to_string());
    format!(
        "{:>6}  {:<30}  {:<24}  {:<24}  {:>4}  {}",
        row.id,
        cell(&row.title, 30),
        cell(&row.artist, 24),
        cell(&row.album, 24),
        year,
        or_missing(&row.genre)
    )
}

fn cell(text: &str, width: usize) -> String {
    let text = or_missing(text);
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

fn or_missing(text: &str) -> &str {
    if text.is_empty() {
        MISSING
    } else {
        text
    }
}
