//! Ratatui-based terminal UI.
//!
//! Three tabs follow the grading flow: pick and process a document, edit the
//! rubric and run grading, then read (and export) the results.

use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{
    Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Tabs, Wrap},
};
use tracing::{info, warn};

use crate::app::pipeline::{
    self, Assessment, ExtractedDocument, Grader, RunOptions, RunOutput, SimilarityOutcome,
};
use crate::cli::picker::{discover_documents, pretty_path};
use crate::domain::{DEFAULT_RUBRIC, SimilarityBand, preview};
use crate::error::{AppError, EXIT_RUNTIME};
use crate::report::PREVIEW_CHARS;

/// Start the TUI.
pub fn run(grader: Grader) -> Result<(), AppError> {
    let _guard = TerminalGuard::new()?;

    let backend = CrosstermBackend::new(io::stdout());
    let mut terminal = Terminal::new(backend)
        .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Failed to initialize terminal: {e}")))?;

    let mut app = App::new(grader, discover_documents());
    app.event_loop(&mut terminal)
}

const MISSING_SEARCH_WARNING: &str =
    "Warning: Google API key or search engine id not configured. Skipping plagiarism check.";

/// Ensures the terminal is restored (raw mode, alternate screen) on exit.
struct TerminalGuard;

impl TerminalGuard {
    fn new() -> Result<Self, AppError> {
        enable_raw_mode().map_err(|e| {
            AppError::new(EXIT_RUNTIME, format!("Failed to enable raw mode: {e}"))
        })?;
        if let Err(e) = execute!(io::stdout(), EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(AppError::new(
                EXIT_RUNTIME,
                format!("Failed to enter alternate screen: {e}"),
            ));
        }
        Ok(Self)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tab {
    Upload,
    Grade,
    Results,
}

impl Tab {
    const ALL: [Tab; 3] = [Tab::Upload, Tab::Grade, Tab::Results];

    fn title(self) -> &'static str {
        match self {
            Tab::Upload => "1 Upload",
            Tab::Grade => "2 Grade",
            Tab::Results => "3 Results",
        }
    }

    fn index(self) -> usize {
        match self {
            Tab::Upload => 0,
            Tab::Grade => 1,
            Tab::Results => 2,
        }
    }

    fn next(self) -> Self {
        Tab::ALL[(self.index() + 1) % Tab::ALL.len()]
    }

    fn prev(self) -> Self {
        Tab::ALL[(self.index() + Tab::ALL.len() - 1) % Tab::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Normal,
    EditingPath,
    EditingRubric,
}

/// Slow work queued by a key press and run after the next redraw, so the
/// status line shows what is happening while the UI is blocked.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Job {
    Process(PathBuf),
    Grade,
}

struct App {
    grader: Grader,
    tab: Tab,
    mode: Mode,
    files: Vec<PathBuf>,
    selected_file: usize,
    path_input: String,
    rubric: String,
    check_plagiarism: bool,
    document: Option<ExtractedDocument>,
    assessment: Option<Assessment>,
    results_scroll: u16,
    export_dir: PathBuf,
    pending: Option<Job>,
    status: String,
    banner: Option<String>,
}

impl App {
    fn new(grader: Grader, files: Vec<PathBuf>) -> Self {
        let status = if files.is_empty() {
            "No documents found. Press / to type a path.".to_string()
        } else {
            format!("Found {} document(s).", files.len())
        };
        Self {
            grader,
            tab: Tab::Upload,
            mode: Mode::Normal,
            files,
            selected_file: 0,
            path_input: String::new(),
            rubric: DEFAULT_RUBRIC.to_string(),
            check_plagiarism: true,
            document: None,
            assessment: None,
            results_scroll: 0,
            export_dir: PathBuf::from("."),
            pending: None,
            status,
            banner: None,
        }
    }

    fn event_loop<B: ratatui::backend::Backend>(
        &mut self,
        terminal: &mut Terminal<B>,
    ) -> Result<(), AppError> {
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal
                    .draw(|f| self.draw(f))
                    .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Terminal draw error: {e}")))?;
                needs_redraw = false;
            }

            if let Some(job) = self.pending.take() {
                self.perform(job);
                needs_redraw = true;
                continue;
            }

            if !event::poll(Duration::from_millis(100))
                .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event poll error: {e}")))?
            {
                continue;
            }

            let input = event::read()
                .map_err(|e| AppError::new(EXIT_RUNTIME, format!("Event read error: {e}")))?;
            match input {
                Event::Key(key) => {
                    if key.kind != KeyEventKind::Press {
                        continue;
                    }
                    if self.handle_key(key.code) {
                        break;
                    }
                    needs_redraw = true;
                }
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns `true` when the user asked to quit.
    fn handle_key(&mut self, code: KeyCode) -> bool {
        match self.mode {
            Mode::EditingPath => {
                self.handle_path_edit(code);
                return false;
            }
            Mode::EditingRubric => {
                self.handle_rubric_edit(code);
                return false;
            }
            Mode::Normal => {}
        }

        match code {
            KeyCode::Char('q') => return true,
            KeyCode::Tab => self.tab = self.tab.next(),
            KeyCode::BackTab => self.tab = self.tab.prev(),
            KeyCode::Char('1') => self.tab = Tab::Upload,
            KeyCode::Char('2') => self.tab = Tab::Grade,
            KeyCode::Char('3') => self.tab = Tab::Results,
            _ => match self.tab {
                Tab::Upload => self.handle_upload_key(code),
                Tab::Grade => self.handle_grade_key(code),
                Tab::Results => self.handle_results_key(code),
            },
        }
        false
    }

    fn handle_upload_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.selected_file = self.selected_file.saturating_sub(1),
            KeyCode::Down => {
                if self.selected_file + 1 < self.files.len() {
                    self.selected_file += 1;
                }
            }
            KeyCode::Enter => match self.files.get(self.selected_file).cloned() {
                Some(path) => self.queue(Job::Process(path)),
                None => self.status = "No document selected. Press / to type a path.".to_string(),
            },
            KeyCode::Char('/') => {
                self.mode = Mode::EditingPath;
                self.status = "Type a path. Enter to process, Esc to cancel.".to_string();
            }
            KeyCode::Char('r') => {
                self.files = discover_documents();
                self.selected_file = 0;
                self.status = format!("Found {} document(s).", self.files.len());
            }
            _ => {}
        }
    }

    fn handle_grade_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('e') => {
                self.mode = Mode::EditingRubric;
                self.status = "Editing rubric. Esc to finish.".to_string();
            }
            KeyCode::Char('p') => {
                self.check_plagiarism = !self.check_plagiarism;
                self.status = format!(
                    "Plagiarism check {}.",
                    if self.check_plagiarism { "enabled" } else { "disabled" }
                );
            }
            KeyCode::Char('d') => {
                self.rubric = DEFAULT_RUBRIC.to_string();
                self.status = "Rubric reset to default.".to_string();
            }
            KeyCode::Char('g') | KeyCode::Enter => {
                if self.document.is_none() {
                    self.status = "Process a document on the Upload tab first.".to_string();
                } else {
                    self.queue(Job::Grade);
                }
            }
            _ => {}
        }
    }

    fn handle_results_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Up => self.results_scroll = self.results_scroll.saturating_sub(1),
            KeyCode::Down => self.results_scroll = self.results_scroll.saturating_add(1),
            KeyCode::Char('x') => self.export(),
            _ => {}
        }
    }

    fn handle_path_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Path entry canceled.".to_string();
            }
            KeyCode::Enter => {
                self.mode = Mode::Normal;
                let path = PathBuf::from(self.path_input.trim());
                if path.as_os_str().is_empty() {
                    self.status = "Path is empty.".to_string();
                } else {
                    self.queue(Job::Process(path));
                }
            }
            KeyCode::Backspace => {
                self.path_input.pop();
            }
            KeyCode::Char(c) => self.path_input.push(c),
            _ => {}
        }
    }

    fn handle_rubric_edit(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => {
                self.mode = Mode::Normal;
                self.status = "Rubric updated.".to_string();
            }
            KeyCode::Enter => self.rubric.push('\n'),
            KeyCode::Backspace => {
                self.rubric.pop();
            }
            KeyCode::Char(c) => self.rubric.push(c),
            _ => {}
        }
    }

    fn queue(&mut self, job: Job) {
        self.status = match &job {
            Job::Process(path) => format!("Processing {}...", pretty_path(path)),
            Job::Grade => "Grading... this may take a moment.".to_string(),
        };
        self.pending = Some(job);
    }

    fn perform(&mut self, job: Job) {
        match job {
            Job::Process(path) => self.process(&path),
            Job::Grade => self.grade(),
        }
    }

    fn process(&mut self, path: &Path) {
        self.assessment = None;
        self.results_scroll = 0;
        match pipeline::extract_document(&self.grader, path) {
            Ok(document) => {
                info!(file = %document.file_name, "document processed in tui");
                self.status = format!(
                    "Processed {} ({} words).",
                    document.file_name,
                    document.word_count()
                );
                self.banner = None;
                self.document = Some(document);
            }
            Err(e) => {
                self.document = None;
                self.status = "Processing failed.".to_string();
                self.banner = Some(e.sentinel());
            }
        }
    }

    fn grade(&mut self) {
        let Some(document) = &self.document else {
            self.status = "Process a document on the Upload tab first.".to_string();
            return;
        };

        let options = RunOptions {
            check_plagiarism: self.check_plagiarism,
        };
        match pipeline::assess(&self.grader, &document.text, &self.rubric, options) {
            Ok(assessment) => {
                self.banner = match &assessment.similarity {
                    SimilarityOutcome::SkippedMissingCredentials => {
                        Some(MISSING_SEARCH_WARNING.to_string())
                    }
                    _ => None,
                };
                self.status = if assessment.any_succeeded() {
                    "Grading complete.".to_string()
                } else {
                    "Grading and feedback both failed.".to_string()
                };
                self.assessment = Some(assessment);
                self.results_scroll = 0;
                self.tab = Tab::Results;
            }
            Err(e) => {
                self.status = "Grading not started.".to_string();
                self.banner = Some(e.sentinel());
            }
        }
    }

    fn export(&mut self) {
        let (Some(document), Some(assessment)) = (&self.document, &self.assessment) else {
            self.status = "Nothing to export yet.".to_string();
            return;
        };

        let run = RunOutput {
            document: document.clone(),
            rubric: self.rubric.clone(),
            assessment: assessment.clone(),
        };
        let path = self.export_dir.join(export_file_name(&document.file_name));
        match crate::io::export::write_results_json(&path, &run) {
            Ok(()) => self.status = format!("Exported results to {}", path.display()),
            Err(e) => {
                warn!(error = %e, "export failed");
                self.status = format!("Export failed: {e}");
            }
        }
    }

    fn draw(&self, frame: &mut ratatui::Frame<'_>) {
        let size = frame.area();
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(4), Constraint::Min(0), Constraint::Length(4)])
            .split(size);

        self.draw_header(frame, chunks[0]);
        match self.tab {
            Tab::Upload => self.draw_upload(frame, chunks[1]),
            Tab::Grade => self.draw_grade(frame, chunks[1]),
            Tab::Results => self.draw_results(frame, chunks[1]),
        }
        self.draw_footer(frame, chunks[2]);
    }

    fn draw_header(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let block = Block::default().title(" grader: AI assignment grader ").borders(Borders::ALL);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Length(1)])
            .split(inner);

        let tabs = Tabs::new(Tab::ALL.iter().map(|t| t.title()).collect::<Vec<_>>())
            .select(self.tab.index())
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
        frame.render_widget(tabs, rows[0]);

        let config = self.grader.config();
        let info = format!(
            "model: {} | openai key: {} | search: {} | document: {}",
            config.model,
            configured_label(config.has_generation_key()),
            configured_label(config.has_search_credentials()),
            self.document.as_ref().map(|d| d.file_name.as_str()).unwrap_or("-"),
        );
        frame.render_widget(Paragraph::new(info).style(Style::default().fg(Color::Gray)), rows[1]);
    }

    fn draw_upload(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(35), Constraint::Percentage(65)])
            .split(area);

        let left = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(chunks[0]);

        let items: Vec<ListItem> =
            self.files.iter().map(|p| ListItem::new(pretty_path(p))).collect();
        let list = List::new(items)
            .block(Block::default().title("Documents (.pdf/.docx)").borders(Borders::ALL))
            .highlight_style(Style::default().fg(Color::Black).bg(Color::White))
            .highlight_symbol("» ");
        let mut state = ListState::default();
        if !self.files.is_empty() {
            state.select(Some(self.selected_file));
        }
        frame.render_stateful_widget(list, left[0], &mut state);

        let path_style = if self.mode == Mode::EditingPath {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Gray)
        };
        let path = Paragraph::new(self.path_input.as_str())
            .style(path_style)
            .block(Block::default().title("Path (/)").borders(Borders::ALL));
        frame.render_widget(path, left[1]);

        let body = match &self.document {
            Some(document) => {
                let mut lines = vec![
                    Line::from(Span::styled(
                        format!("{}: {} words", document.file_name, document.word_count()),
                        Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
                    )),
                    Line::raw(""),
                ];
                lines.extend(
                    preview(&document.text, PREVIEW_CHARS)
                        .lines()
                        .map(|l| Line::raw(l.to_string())),
                );
                Text::from(lines)
            }
            None => Text::from("Select a document and press Enter to process it."),
        };
        let panel = Paragraph::new(body)
            .wrap(Wrap { trim: false })
            .block(Block::default().title("Preview").borders(Borders::ALL));
        frame.render_widget(panel, chunks[1]);
    }

    fn draw_grade(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(3)])
            .split(area);

        let title = if self.mode == Mode::EditingRubric {
            "Rubric (editing, Esc to finish)"
        } else {
            "Rubric (e to edit, d to reset)"
        };
        let rubric = Paragraph::new(self.rubric.as_str())
            .wrap(Wrap { trim: false })
            .block(Block::default().title(title).borders(Borders::ALL));
        frame.render_widget(rubric, chunks[0]);

        let mark = if self.check_plagiarism { "[x]" } else { "[ ]" };
        let options = Paragraph::new(format!("{mark} Check for plagiarism (p)"))
            .block(Block::default().title("Options").borders(Borders::ALL));
        frame.render_widget(options, chunks[1]);
    }

    fn draw_results(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let text = match &self.assessment {
            Some(assessment) => Text::from(result_lines(assessment)),
            None => Text::from("No results yet. Run grading from the Grade tab."),
        };
        let p = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .scroll((self.results_scroll, 0))
            .block(Block::default().title("Results (x to export)").borders(Borders::ALL));
        frame.render_widget(p, area);
    }

    fn draw_footer(&self, frame: &mut ratatui::Frame<'_>, area: Rect) {
        let help = match (self.mode, self.tab) {
            (Mode::EditingPath, _) | (Mode::EditingRubric, _) => "typing...  Esc done",
            (Mode::Normal, Tab::Upload) => {
                "↑/↓ select  Enter process  / path  r rescan  Tab switch  q quit"
            }
            (Mode::Normal, Tab::Grade) => {
                "e edit rubric  p plagiarism  g grade  Tab switch  q quit"
            }
            (Mode::Normal, Tab::Results) => "↑/↓ scroll  x export  Tab switch  q quit",
        };
        let mut lines = vec![Line::from(vec![
            Span::styled(help, Style::default().fg(Color::Gray)),
            Span::raw(" | "),
            Span::styled(self.status.as_str(), Style::default().fg(Color::Yellow)),
        ])];
        if let Some(banner) = &self.banner {
            lines.push(Line::from(Span::styled(
                banner.as_str(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )));
        }
        let p = Paragraph::new(Text::from(lines)).block(Block::default().borders(Borders::ALL));
        frame.render_widget(p, area);
    }
}

fn configured_label(ok: bool) -> &'static str {
    if ok { "set" } else { "missing" }
}

fn export_file_name(file_name: &str) -> String {
    let stem = Path::new(file_name)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "grading".to_string());
    format!("{stem}_results.json")
}

fn band_style(band: SimilarityBand) -> Style {
    match band {
        SimilarityBand::High => Style::default().fg(Color::Red),
        SimilarityBand::Moderate => Style::default().fg(Color::Yellow),
        SimilarityBand::Low => Style::default().fg(Color::Green),
    }
}

fn error_line(message: String) -> Line<'static> {
    Line::from(Span::styled(message, Style::default().fg(Color::Red)))
}

fn heading(title: &'static str) -> Line<'static> {
    Line::from(Span::styled(title, Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)))
}

fn result_lines(assessment: &Assessment) -> Vec<Line<'static>> {
    let mut lines = vec![heading("Grade")];
    match &assessment.grade {
        Ok(report) => {
            lines.push(Line::from(Span::styled(
                format!("{} ({})", report.grade, report.score),
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
            )));
            for (criterion, score) in &report.breakdown {
                lines.push(Line::raw(format!("  {criterion}: {score}")));
            }
            if !report.summary.is_empty() {
                lines.push(Line::raw(""));
                lines.push(Line::raw(report.summary.clone()));
            }
        }
        Err(e) => lines.push(error_line(e.sentinel())),
    }

    lines.push(Line::raw(""));
    lines.push(heading("Feedback"));
    match &assessment.feedback {
        Ok(feedback) => lines.extend(feedback.as_str().lines().map(|l| Line::raw(l.to_string()))),
        Err(e) => lines.push(error_line(e.sentinel())),
    }

    lines.push(Line::raw(""));
    lines.push(heading("Plagiarism"));
    match &assessment.similarity {
        SimilarityOutcome::Disabled => lines.push(Line::raw("Not requested.")),
        SimilarityOutcome::SkippedMissingCredentials => {
            lines.push(Line::raw("Skipped: search not configured."))
        }
        SimilarityOutcome::Ran(Ok(report)) if report.is_empty() => {
            lines.push(Line::raw("No similar content found online."))
        }
        SimilarityOutcome::Ran(Ok(report)) => {
            for m in report.matches() {
                let band = m.band();
                lines.push(Line::from(Span::styled(
                    format!("{} similarity ({}%): {}", band.label(), m.score, m.url),
                    band_style(band),
                )));
            }
        }
        SimilarityOutcome::Ran(Err(e)) => lines.push(error_line(e.sentinel())),
    }
    lines
}

#[cfg(test)]
mod tests {
    use std::io::Write;
    use std::rc::Rc;

    use ratatui::backend::TestBackend;

    use super::*;
    use crate::config::GraderConfig;
    use crate::extract::docx::tests::{docx_bytes, paragraph};
    use crate::llm::ChatError;
    use crate::llm::stub::StubChat;
    use crate::search::stub::StubSearch;

    const GRADE_REPLY: &str =
        r#"{"grade":"A","score":"95/100","breakdown":{"Content":"38/40"},"summary":"Good"}"#;

    fn app_with(config: GraderConfig, chat: StubChat) -> (App, Rc<StubSearch>, Rc<StubChat>) {
        let search = Rc::new(StubSearch::with_hits(Vec::new()));
        let chat = Rc::new(chat);
        let grader = Grader::with_backends(
            config,
            Box::new(Rc::clone(&search)),
            Box::new(Rc::clone(&chat)),
        );
        (App::new(grader, Vec::new()), search, chat)
    }

    fn keyed_config() -> GraderConfig {
        GraderConfig {
            openai_api_key: Some("sk-test".to_string()),
            ..GraderConfig::default()
        }
    }

    fn docx_file(text: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".docx").tempfile().unwrap();
        file.write_all(&docx_bytes(&paragraph(text))).unwrap();
        file
    }

    fn run_pending(app: &mut App) {
        if let Some(job) = app.pending.take() {
            app.perform(job);
        }
    }

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(120, 30)).unwrap();
        terminal.draw(|f| app.draw(f)).unwrap();
        terminal.backend().buffer().content().iter().map(|c| c.symbol()).collect()
    }

    #[test]
    fn tabs_cycle_in_both_directions() {
        assert_eq!(Tab::Upload.next(), Tab::Grade);
        assert_eq!(Tab::Results.next(), Tab::Upload);
        assert_eq!(Tab::Upload.prev(), Tab::Results);
    }

    #[test]
    fn typed_path_is_processed_and_previewed() {
        let (mut app, _, _) = app_with(keyed_config(), StubChat::replying(GRADE_REPLY));
        let file = docx_file("The sky is blue.");

        app.handle_key(KeyCode::Char('/'));
        for c in file.path().display().to_string().chars() {
            app.handle_key(KeyCode::Char(c));
        }
        app.handle_key(KeyCode::Enter);
        assert!(app.status.starts_with("Processing"));
        run_pending(&mut app);

        let document = app.document.as_ref().unwrap();
        assert_eq!(document.word_count(), 4);
        assert!(app.banner.is_none());
        assert!(screen_text(&app).contains("The sky is blue."));
    }

    #[test]
    fn unsupported_file_shows_banner() {
        let (mut app, _, _) = app_with(keyed_config(), StubChat::replying(GRADE_REPLY));
        app.queue(Job::Process(PathBuf::from("notes.txt")));
        run_pending(&mut app);

        assert!(app.document.is_none());
        assert!(app.banner.as_deref().unwrap().starts_with("Error: Unsupported file format"));
    }

    #[test]
    fn grading_without_key_runs_nothing() {
        let (mut app, search, chat) =
            app_with(GraderConfig::default(), StubChat::replying(GRADE_REPLY));
        let file = docx_file("Essay text.");
        app.queue(Job::Process(file.path().to_path_buf()));
        run_pending(&mut app);

        app.handle_key(KeyCode::Char('2'));
        app.handle_key(KeyCode::Char('g'));
        run_pending(&mut app);

        assert!(app.assessment.is_none());
        assert_eq!(app.banner.as_deref(), Some("Error: OpenAI API key missing"));
        assert_eq!(search.calls.get(), 0);
        assert_eq!(chat.calls.get(), 0);
    }

    #[test]
    fn grading_flow_reaches_results_and_exports() {
        let chat = StubChat::with_results(vec![
            Ok(GRADE_REPLY.to_string()),
            Ok("Well argued.".to_string()),
        ]);
        let (mut app, search, _) = app_with(keyed_config(), chat);
        let file = docx_file("The sky is blue.");
        app.queue(Job::Process(file.path().to_path_buf()));
        run_pending(&mut app);

        app.handle_key(KeyCode::Char('2'));
        app.handle_key(KeyCode::Char('g'));
        run_pending(&mut app);

        assert_eq!(app.tab, Tab::Results);
        assert!(app.banner.as_deref().unwrap().starts_with("Warning"));
        assert_eq!(search.calls.get(), 0);
        let screen = screen_text(&app);
        assert!(screen.contains("A (95/100)"));
        assert!(screen.contains("Well argued."));

        let dir = tempfile::tempdir().unwrap();
        app.export_dir = dir.path().to_path_buf();
        app.handle_key(KeyCode::Char('x'));
        assert!(app.status.starts_with("Exported"));
        let exported = std::fs::read_dir(dir.path()).unwrap().count();
        assert_eq!(exported, 1);
    }

    #[test]
    fn failed_grading_is_not_reported_as_complete() {
        let chat = StubChat::with_results(vec![
            Err(ChatError::Transport("connection reset".to_string())),
            Err(ChatError::Transport("connection reset".to_string())),
        ]);
        let (mut app, _, chat) = app_with(keyed_config(), chat);
        let file = docx_file("The sky is blue.");
        app.queue(Job::Process(file.path().to_path_buf()));
        run_pending(&mut app);

        app.handle_key(KeyCode::Char('2'));
        app.handle_key(KeyCode::Char('g'));
        run_pending(&mut app);

        assert_eq!(chat.calls.get(), 2);
        assert_eq!(app.tab, Tab::Results);
        assert_eq!(app.status, "Grading and feedback both failed.");
        assert!(!app.assessment.as_ref().unwrap().any_succeeded());
    }

    #[test]
    fn rubric_editing_and_plagiarism_toggle() {
        let (mut app, _, _) = app_with(keyed_config(), StubChat::replying(GRADE_REPLY));
        app.handle_key(KeyCode::Char('2'));
        app.handle_key(KeyCode::Char('p'));
        assert!(!app.check_plagiarism);

        app.handle_key(KeyCode::Char('e'));
        app.handle_key(KeyCode::Enter);
        app.handle_key(KeyCode::Char('Z'));
        // 'q' while editing is text, not quit.
        assert!(!app.handle_key(KeyCode::Char('q')));
        app.handle_key(KeyCode::Esc);
        assert!(app.rubric.ends_with("\nZq"));

        app.handle_key(KeyCode::Char('d'));
        assert_eq!(app.rubric, DEFAULT_RUBRIC);
        assert!(app.handle_key(KeyCode::Char('q')));
    }

    #[test]
    fn export_name_follows_document_stem() {
        assert_eq!(export_file_name("essay.final.docx"), "essay.final_results.json");
    }
}
