use std::io;
use std::sync::mpsc::Receiver;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{ensure, Context, Result};
use chrono::Local;
use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Position, Size};
use ratatui::Terminal;

use crate::cli::{Cli, Command, TableSpec};
use crate::components::window::{DrawFn, Window};
use crate::event::spawn_event_reader;
use crate::manager::WindowManager;
use crate::model::column::ColumnCatalog;
use crate::model::table::{Cell, Table};
use crate::source::fs::{FsDataSource, JsonColumnCatalog};
use crate::source::DataSource;
use crate::ui::screen::Screen;
use crate::ui::surface::Surface;
use crate::ui::theme::Theme;

const MIN_WIDTH: u16 = 80;
const MIN_HEIGHT: u16 = 20;

fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    io::stdout().execute(DisableMouseCapture)?;
    io::stdout().execute(LeaveAlternateScreen)?;
    Ok(())
}

/// Runs `restore` when dropped, unless [`TerminalGuard::restore`] already did.
struct TerminalGuard<F: FnMut() -> io::Result<()>> {
    restore: Option<F>,
}

impl<F: FnMut() -> io::Result<()>> TerminalGuard<F> {
    fn new(restore: F) -> Self {
        Self {
            restore: Some(restore),
        }
    }

    fn restore(mut self) -> io::Result<()> {
        match self.restore.take() {
            Some(mut restore) => restore(),
            None => Ok(()),
        }
    }
}

impl<F: FnMut() -> io::Result<()>> Drop for TerminalGuard<F> {
    fn drop(&mut self) {
        if let Some(mut restore) = self.restore.take() {
            if let Err(err) = restore() {
                tracing::warn!(error = %err, "failed to restore terminal");
            }
        }
    }
}

pub async fn run(cli: Cli, status: Option<Receiver<String>>) -> Result<()> {
    let (width, height) = crossterm::terminal::size().context("failed to query terminal size")?;
    ensure!(
        width >= MIN_WIDTH && height >= MIN_HEIGHT,
        "terminal is {width}x{height}, at least {MIN_WIDTH}x{MIN_HEIGHT} is required"
    );

    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore_terminal();
        original_hook(info);
    }));

    enable_raw_mode().context("failed to enable raw mode")?;
    let guard = TerminalGuard::new(restore_terminal);
    io::stdout()
        .execute(EnterAlternateScreen)
        .context("failed to enter alternate screen")?;
    io::stdout()
        .execute(EnableMouseCapture)
        .context("failed to enable mouse capture")?;
    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    let result = run_app(terminal, cli, status).await;

    guard.restore()?;

    result
}

async fn run_app(
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    cli: Cli,
    status: Option<Receiver<String>>,
) -> Result<()> {
    let mut manager = WindowManager::new(Screen::new(terminal)?);
    let interval = Duration::from_secs(cli.refresh_secs);
    let bounds = manager.bounds();
    manager
        .screen_mut()
        .status_mut()
        .set_message("press h for help");

    match cli.command {
        Command::Demo => {
            for window in demo_windows(bounds)? {
                manager.add(window)?;
            }
            tracing::info!(windows = manager.windows().len(), "demo ready");
            manager
                .run(spawn_event_reader(), interval, None, status)
                .await
        }
        Command::Watch {
            columns_dir,
            data_dir,
            tables,
        } => {
            let catalog = JsonColumnCatalog::new(columns_dir);
            let source = FsDataSource::new(data_dir);
            tracing::info!(
                data_dir = %source.root().display(),
                tables = tables.len(),
                "watching"
            );
            for window in watch_windows(&tables, &catalog, &source, bounds)? {
                manager.add(window)?;
            }
            manager
                .run(spawn_event_reader(), interval, Some(&source), status)
                .await
        }
    }
}

fn sample_table(name: &str) -> Result<Table> {
    let mut table = Table::new(name, false)?;
    table.set_header(
        vec![Cell::new("COLUMN1", 10), Cell::new("COLUMN2", 15)],
        MIN_WIDTH,
    )?;
    for row in 1..=5 {
        table.append_row([format!("col1row{row}"), format!("col2row{row}")])?;
    }
    table.append_row(["longer than width", "again longer than width"])?;
    Ok(table)
}

fn clock() -> DrawFn {
    Arc::new(|surface: &mut Surface| {
        surface.draw_box(Theme::border_unfocused());
        surface.print(0, 1, "clock", Theme::title());
        let now = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        surface.print(1, 1, &now, Theme::table_row());
    })
}

/// Two static tables, one of them shown twice, and a clock, overlapping so
/// there is something to click and drag.
pub fn demo_windows(bounds: Size) -> Result<Vec<Window>> {
    let table1 = sample_table("table1")?;
    let table2 = sample_table("table2")?;

    Ok(vec![
        Window::for_table(table1.clone(), Position::new(0, 1), bounds)?,
        Window::for_table(table2.clone(), Position::new(5, 5), bounds)?,
        Window::for_table(table2, Position::new(10, 10), bounds)?,
        Window::for_table(table1, Position::new(30, 1), bounds)?,
        Window::draw("clock", clock(), 21, 3, Position::new(58, 1), bounds),
    ])
}

/// One live table window per spec, cascaded from the top-left corner. Each
/// table is filled once here so its window starts at the right height.
pub fn watch_windows(
    specs: &[TableSpec],
    catalog: &dyn ColumnCatalog,
    source: &dyn DataSource,
    bounds: Size,
) -> Result<Vec<Window>> {
    let mut windows = Vec::with_capacity(specs.len());
    for (i, spec) in specs.iter().enumerate() {
        let mut table = Table::new(spec.name.as_str(), true)?;
        for column in &spec.columns {
            table
                .add_column(column, catalog)
                .with_context(|| format!("table {}", spec.name))?;
        }
        table.regenerate(source, bounds.width)?;
        tracing::info!(
            table = %table.name(),
            columns = table.column_count(),
            rows = table.row_count(),
            "live table ready"
        );

        let step = u16::try_from(i).unwrap_or(u16::MAX).saturating_mul(3);
        let origin = Position::new(step.saturating_mul(2), step);
        windows.push(Window::for_table(table, origin, bounds)?);
    }
    Ok(windows)
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::path::Path;

    use ratatui::layout::Rect;

    use super::*;

    const BOUNDS: Size = Size {
        width: 80,
        height: 23,
    };

    fn setup_after_raw_mode(restores: &std::cell::Cell<u32>) -> Result<()> {
        let guard = TerminalGuard::new(|| {
            restores.set(restores.get() + 1);
            Ok(())
        });
        Err(io::Error::other("not a tty")).context("failed to enter alternate screen")?;
        guard.restore()?;
        Ok(())
    }

    #[test]
    fn failed_setup_still_restores_the_terminal() {
        let restores = std::cell::Cell::new(0);
        let err = setup_after_raw_mode(&restores).unwrap_err();
        assert!(err.to_string().contains("alternate screen"));
        assert_eq!(restores.get(), 1);
    }

    #[test]
    fn explicit_restore_runs_once_and_reports_errors() {
        let restores = std::cell::Cell::new(0);
        let guard = TerminalGuard::new(|| {
            restores.set(restores.get() + 1);
            Err(io::Error::other("stdout closed"))
        });
        assert!(guard.restore().is_err());
        assert_eq!(restores.get(), 1);
    }

    #[test]
    fn demo_layout() {
        let windows = demo_windows(BOUNDS).unwrap();
        let areas: Vec<Rect> = windows.iter().map(|w| w.area()).collect();
        assert_eq!(
            areas,
            [
                Rect::new(0, 1, 28, 9),
                Rect::new(5, 5, 28, 9),
                Rect::new(10, 10, 28, 9),
                Rect::new(30, 1, 28, 9),
                Rect::new(58, 1, 21, 3),
            ]
        );
        // The same table shown twice still gets two distinct windows.
        assert_ne!(windows[1].id(), windows[2].id());
    }

    #[test]
    fn clock_shows_current_time() {
        let mut windows = demo_windows(BOUNDS).unwrap();
        let surface = windows[4].populate(false).unwrap();
        assert!(surface.line(0).starts_with("┌clock"));
        let year = Local::now().format("%Y").to_string();
        assert!(surface.line(1).starts_with(&format!("│{year}-")));
    }

    fn write(path: &Path, contents: &str) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn quote_tree(root: &Path) -> (JsonColumnCatalog, FsDataSource) {
        let columns = root.join("columns");
        write(
            &columns.join("symbol.json"),
            r#"{"id": "symbol", "name": "SYMBOL", "source": "quotes", "iskey": true}"#,
        );
        write(
            &columns.join("ltp.json"),
            r#"{"id": "ltp", "name": "LTP", "source": "ltp", "width": 8}"#,
        );

        let data = root.join("data");
        write(&data.join("quotes/BBB/ltp/latest"), "5\n");
        write(&data.join("quotes/AAA/ltp/latest"), "9\n");

        (JsonColumnCatalog::new(columns), FsDataSource::new(data))
    }

    #[test]
    fn watch_windows_are_filled_and_cascaded() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, source) = quote_tree(dir.path());
        let specs: Vec<TableSpec> = ["quotes=symbol,ltp", "again=symbol,ltp"]
            .iter()
            .map(|s| s.parse().unwrap())
            .collect();

        let windows = watch_windows(&specs, &catalog, &source, BOUNDS).unwrap();

        assert_eq!(windows.len(), 2);
        // 10 + 1 + 8 plus borders; two records plus header and borders.
        assert_eq!(windows[0].area(), Rect::new(0, 0, 21, 5));
        assert_eq!(windows[1].area().as_position(), Position::new(6, 3));

        let table = windows[0].table().unwrap();
        assert!(table.is_dynamic());
        let rows: Vec<(&str, &str)> = table
            .rows()
            .iter()
            .map(|r| (r.cells[0].content.as_str(), r.cells[1].content.as_str()))
            .collect();
        assert_eq!(rows, [("AAA", "9"), ("BBB", "5")]);
    }

    #[test]
    fn watch_with_unknown_column_names_the_table() {
        let dir = tempfile::tempdir().unwrap();
        let (catalog, source) = quote_tree(dir.path());
        let specs = vec!["quotes=symbol,missing".parse::<TableSpec>().unwrap()];

        let err = watch_windows(&specs, &catalog, &source, BOUNDS)
            .err()
            .unwrap();
        assert!(format!("{err:#}").contains("table quotes"));
    }
}
