mod app;
mod bootstrap;
mod cli;
mod host;
mod replay;
mod report;
mod stream;

use anyhow::Result;

use crate::app::RooftopApp;
use crate::cli::EventSource;
use crate::host::CommandSink;
use crate::stream::StreamServer;

fn main() -> Result<()> {
    env_logger::init();
    let args = cli::parse()?;

    let sink: Option<Box<dyn CommandSink>> = match &args.bind {
        Some(addr) => {
            let server =
                StreamServer::bind(addr, Some(env!("CARGO_PKG_VERSION").to_string()))?;
            println!("Streaming command feed on {addr}");
            Some(Box::new(server))
        }
        None => None,
    };

    let mut app = RooftopApp::new(args.base_url.clone(), sink);

    match &args.source {
        EventSource::Demo(kind) => {
            log::info!("running built-in demo {kind:?}");
            replay::run_demo(&mut app, *kind);
        }
        EventSource::Script(path) => {
            let events = replay::load_script(path)?;
            log::info!("replaying {} scripted events from {}", events.len(), path.display());
            replay::run_script(&mut app, &events);
        }
    }

    // Anything still pending never got a host answer; settle it before
    // reporting so the snapshot reflects a finished session.
    let settled = app.resolve_outstanding();
    if settled > 0 {
        log::info!("resolved {settled} outstanding actor handles");
    }

    let snapshot = report::build_snapshot(&app);
    print_summary(&app, &snapshot, args.verbose);

    if let Some(path) = &args.snapshot_json {
        report::persist_snapshot(path, &snapshot)?;
    }
    if let Some(path) = &args.command_log_json {
        report::persist_command_log(path, app.host().issued())?;
    }

    Ok(())
}

fn print_summary(app: &RooftopApp, snapshot: &report::SceneSnapshot, verbose: bool) {
    println!(
        "Actors staged: {} ({} resolved, {} rejected)",
        snapshot.counts.total, snapshot.counts.resolved, snapshot.counts.rejected
    );
    println!("Commands issued: {}", app.host().issued().len());
    println!("Users connected: {}", app.roster().count());
    for building in &snapshot.buildings {
        println!("  {} windows: {}", building.name, building.pattern);
    }

    if verbose {
        for actor in &snapshot.actors {
            let name = actor.name.as_deref().unwrap_or("<unnamed>");
            match actor.parent {
                Some(parent) => {
                    println!("  actor#{:<4} {name} (parent actor#{parent})", actor.id)
                }
                None => println!("  actor#{:<4} {name}", actor.id),
            }
        }
    }
}
