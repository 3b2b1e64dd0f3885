/* This Source Code Form is subject to the terms of the Mozilla Public
 * License, v. 2.0. If a copy of the MPL was not distributed with this
 * file, You can obtain one at https://mozilla.org/MPL/2.0/. */

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use bpaf::Bpaf;
use browserui::diagnostics::{DiagnosticsState, install_global_sender};
use browserui::host::{HeadlessHost, HeadlessProcess};
use browserui::install::{InstallError, InstallSurface, MessageBus};
use browserui::mods::native::browserui::{AddonServices, BrowserUiAddon, ShutdownReason};
use browserui::persistence::{
    HistoryList, HistoryStore, HistoryStoreError, JsonFileHistoryStore, MemoryHistoryStore,
};
use browserui::prefs::{BrowserUiPrefs, PrefsError};
use browserui::protocols::{DEFAULT_UI_SENTINEL, OwnerId, Resolution, UiEndpoint};
use log::info;

/// Swap the host chrome for a document served through browserui://
#[derive(Debug, Clone, Bpaf)]
#[bpaf(options, version)]
struct Cli {
    /// Preferences file (defaults to $BROWSERUI_PREFS, then the config dir)
    #[bpaf(long("prefs"), argument("PATH"))]
    prefs: Option<PathBuf>,
    /// Log filter directives, e.g. `browserui=debug`
    #[bpaf(long("log-filter"), argument("FILTER"))]
    log_filter: Option<String>,
    #[bpaf(external(command))]
    command: Command,
}

#[derive(Debug, Clone, Bpaf)]
enum Command {
    /// Print the endpoints selected so far
    #[bpaf(command)]
    List,
    /// Record an endpoint in the history and confirm it
    #[bpaf(command)]
    Install {
        #[bpaf(positional("URI"))]
        uri: String,
    },
    /// Drop an endpoint from the history
    #[bpaf(command)]
    Remove {
        #[bpaf(positional("URI"))]
        uri: String,
    },
    /// Run the cross-process flow on a headless host and print what every
    /// process resolves
    #[bpaf(command)]
    Simulate {
        /// Content processes alive before the endpoint is confirmed
        #[bpaf(long("processes"), argument("N"), fallback(2))]
        processes: usize,
        #[bpaf(positional("URI"))]
        uri: String,
    },
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Prefs(#[from] PrefsError),
    #[error(transparent)]
    History(#[from] HistoryStoreError),
    #[error(transparent)]
    Install(#[from] InstallError),
}

fn history_store(prefs: &BrowserUiPrefs) -> Result<Arc<dyn HistoryStore>, CliError> {
    Ok(Arc::new(JsonFileHistoryStore::new(prefs.history_path()?)))
}

fn list(prefs: &BrowserUiPrefs) -> Result<(), CliError> {
    let history = HistoryList::from_stored(history_store(prefs)?.load()?);
    let mut entries = history.entries().to_vec();
    entries.sort();
    for entry in entries {
        println!("{entry}");
    }
    Ok(())
}

fn install(prefs: &BrowserUiPrefs, uri: &str) -> Result<(), CliError> {
    let mut surface = InstallSurface::open(DEFAULT_UI_SENTINEL, history_store(prefs)?, MessageBus::new())?;
    let outcome = surface.install(uri)?;
    println!("{uri}: {outcome:?}");
    Ok(())
}

fn remove(prefs: &BrowserUiPrefs, uri: &str) -> Result<(), CliError> {
    let mut surface = InstallSurface::open(DEFAULT_UI_SENTINEL, history_store(prefs)?, MessageBus::new())?;
    if surface.remove(uri)? {
        println!("removed {uri}");
    } else {
        println!("{uri} was not in the history");
    }
    Ok(())
}

fn describe(resolution: &Resolution) -> String {
    match resolution {
        Resolution::Override(url) => format!("override {url}"),
        Resolution::Default(url) => format!("default {url}"),
        Resolution::Confirm(url) => format!("confirm {url}"),
        Resolution::HostFallback => "host fallback".to_string(),
    }
}

fn report(stage: &str, parent: &HeadlessProcess, children: &[HeadlessProcess]) {
    println!("{stage}:");
    for process in std::iter::once(parent).chain(children) {
        process.pump();
        println!("  {} browserui:// -> {}", process.id(), describe(&process.resolve(DEFAULT_UI_SENTINEL)));
    }
}

fn simulate(prefs: &BrowserUiPrefs, processes: usize, uri: &str) -> Result<(), CliError> {
    let mut diagnostics = DiagnosticsState::new();
    install_global_sender(diagnostics.sender());

    let endpoint = UiEndpoint::parse(uri).map_err(InstallError::from)?;
    let host = HeadlessHost::new(prefs.document_locator()?);
    let parent = host.spawn_parent_process();
    let mut children: Vec<_> = (0..processes).map(|_| host.spawn_process()).collect();
    host.windows().open_window(DEFAULT_UI_SENTINEL);

    let owner = OwnerId::generate();
    let bus = MessageBus::new();
    BrowserUiAddon::on_install(&owner);
    let [reload, reset] = prefs.shortcut_bindings();
    let addon = BrowserUiAddon::startup(AddonServices {
        owner: owner.clone(),
        broadcaster: Arc::new(host.clone()),
        windows: Arc::new(host.windows().clone()),
        resolver: parent.resolver().clone(),
        bus: bus.clone(),
        shortcuts: [reload, reset],
    });
    report("after startup", &parent, &children);

    let location = parent
        .resolver()
        .documents()
        .confirmation_page(&owner, endpoint.as_str())
        .map_or_else(|| endpoint.to_string(), |page| page.to_string());
    let mut page = InstallSurface::open(&location, Arc::new(MemoryHistoryStore::new()), bus)?;
    page.install_requested()?;
    addon.pump_confirmations();
    children.push(host.spawn_process());
    report("after confirming", &parent, &children);

    host.windows().press_key(reset.chord.code, reset.chord.modifiers);
    report(&format!("after pressing {}", reset.chord), &parent, &children);

    addon.shutdown(ShutdownReason::AppShutdown);
    children.push(host.spawn_process());
    report("after shutdown", &parent, &children);

    diagnostics.drain();
    info!("simulation emitted {} diagnostic events", diagnostics.events().len());
    Ok(())
}

fn main() -> ExitCode {
    let cli = cli().run();
    let prefs = match BrowserUiPrefs::load(cli.prefs.as_deref()) {
        Ok(prefs) => prefs,
        Err(error) => {
            eprintln!("browserui: {error}");
            return ExitCode::FAILURE;
        }
    };
    browserui::init_tracing(cli.log_filter.as_deref().or(prefs.log_filter.as_deref()));

    let result = match &cli.command {
        Command::List => list(&prefs),
        Command::Install { uri } => install(&prefs, uri),
        Command::Remove { uri } => remove(&prefs, uri),
        Command::Simulate { processes, uri } => simulate(&prefs, *processes, uri),
    };
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("browserui: {error}");
            ExitCode::FAILURE
        }
    }
}
