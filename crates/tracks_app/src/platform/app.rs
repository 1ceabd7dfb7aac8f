use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use engine_logging::{engine_info, engine_warn};
use tracks_core::{
    update, AppState, AppViewModel, ChannelStatus, Msg, SelectedFile, UploadState,
};
use tracks_engine::EngineStopped;

use super::cli::{Cli, Command};
use super::config;
use super::effects::EffectRunner;
use super::ui::render::{self, TerminalRenderer};

/// How long the loop waits for an engine event before ticking.
const TICK_INTERVAL: Duration = Duration::from_millis(75);

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();
    engine_logging::initialize(cli.log.into(), cli.log_level());

    let file_config = config::load(cli.config.as_deref())?;
    let settings = config::resolve(file_config, cli.server.as_deref())?;
    engine_info!("Using server {}", settings.base_url);

    let runner = EffectRunner::new(settings).context("failed to start engine")?;
    let mut app = App::new(runner);

    match cli.command {
        Command::List { missing } => app.list(missing),
        Command::Upload { path } => app.upload(path.as_deref()),
        Command::InferAll => app.infer_all(),
    }
}

struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: TerminalRenderer,
}

impl App {
    fn new(runner: EffectRunner) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer: TerminalRenderer::default(),
        }
    }

    fn list(&mut self, only_missing: bool) -> anyhow::Result<()> {
        self.refresh()?;
        if only_missing {
            self.dispatch(Msg::ToggleMissingFilter);
        }
        for line in render::track_table(&self.state.view()) {
            println!("{line}");
        }
        Ok(())
    }

    fn upload(&mut self, path: Option<&Path>) -> anyhow::Result<()> {
        let file = path.map(read_selected_file).transpose()?;
        self.dispatch(Msg::UploadRequested(file));
        let view = self.run_until(upload_settled)?;

        match &view.upload {
            UploadState::Completed(_) => {
                println!("{}", render::summary_line(&view));
                Ok(())
            }
            UploadState::Failed(failure) => bail!("upload failed: {failure}"),
            _ => bail!("progress stream closed before the import finished"),
        }
    }

    fn infer_all(&mut self) -> anyhow::Result<()> {
        self.refresh()?;
        let runs_before = self.state.view().inference.runs_finished;
        self.dispatch(Msg::InferAllClicked);
        if !self.state.view().inference.running {
            println!("No tracks are missing a year.");
            return Ok(());
        }

        let view = self.run_until(|view| view.inference.runs_finished > runs_before)?;
        if view.inference.failed > 0 {
            engine_warn!(
                "{} of {} inference requests failed",
                view.inference.failed,
                view.inference.requested
            );
        }
        Ok(())
    }

    fn refresh(&mut self) -> anyhow::Result<()> {
        self.dispatch(Msg::RefreshRequested);
        let view = self.run_until(|view| !view.loading_tracks)?;
        match view.last_error {
            Some(error) => bail!("could not fetch tracks: {error}"),
            None => Ok(()),
        }
    }

    fn run_until(
        &mut self,
        done: impl Fn(&AppViewModel) -> bool,
    ) -> anyhow::Result<AppViewModel> {
        loop {
            let view = self.state.view();
            if done(&view) {
                return Ok(view);
            }
            let msg = next_or_tick(self.runner.next_msg(TICK_INTERVAL))?;
            self.dispatch(msg);
        }
    }

    fn dispatch(&mut self, msg: Msg) {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.renderer.render(&state.view());
        }
        self.state = state;
        self.runner.enqueue(effects);
    }
}

/// A quiet engine ticks the loop; a stopped one ends it.
fn next_or_tick(next: Result<Option<Msg>, EngineStopped>) -> anyhow::Result<Msg> {
    let msg = next.context("lost the engine while waiting for the server")?;
    Ok(msg.unwrap_or(Msg::Tick))
}

/// Terminal upload states, or a progress stream that ended without a verdict.
fn upload_settled(view: &AppViewModel) -> bool {
    match &view.upload {
        UploadState::Failed(_) => true,
        UploadState::Completed(_) => !view.loading_tracks,
        UploadState::Submitting | UploadState::Processing(_) => {
            view.channel == ChannelStatus::Closed
        }
        UploadState::Idle => false,
    }
}

fn read_selected_file(path: &Path) -> anyhow::Result<SelectedFile> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "library.xml".to_string());
    Ok(SelectedFile::new(file_name, bytes))
}
