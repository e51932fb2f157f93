//! JSON reporting: scene snapshot and outbound command log.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use rooftop_scene::session::UserEntry;
use rooftop_scene::stage::ResolveState;
use rooftop_scene::windows::WindowState;
use rooftop_stream::{Command, WireTransform};

use crate::app::RooftopApp;
use crate::host::wire_transform;

#[derive(Debug, Serialize)]
pub struct SceneSnapshot {
    pub counts: StateCounts,
    pub roster: Vec<UserEntry>,
    pub buildings: Vec<BuildingSnapshot>,
    pub actors: Vec<ActorSnapshot>,
}

#[derive(Debug, Serialize)]
pub struct StateCounts {
    pub total: usize,
    pub pending: usize,
    pub resolved: usize,
    pub rejected: usize,
}

/// Window tags rendered back into pattern form, newest state per window.
#[derive(Debug, Serialize)]
pub struct BuildingSnapshot {
    pub name: String,
    pub pattern: String,
}

#[derive(Debug, Serialize)]
pub struct ActorSnapshot {
    pub id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent: Option<u32>,
    pub state: ResolveState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<WindowState>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub animations: Vec<String>,
    pub transform: WireTransform,
}

pub fn build_snapshot(app: &RooftopApp) -> SceneSnapshot {
    let stage = app.stage();
    let counts = StateCounts {
        total: stage.len(),
        pending: stage.count_state(ResolveState::Pending),
        resolved: stage.count_state(ResolveState::Resolved),
        rejected: stage.count_state(ResolveState::Rejected),
    };

    let buildings = app
        .handles()
        .map(|handles| {
            handles
                .buildings
                .iter()
                .map(|building| BuildingSnapshot {
                    name: building.name.clone(),
                    pattern: building
                        .windows
                        .iter()
                        .map(|window| match stage.tag(*window) {
                            Some(WindowState::On) => '1',
                            Some(WindowState::Off) => '0',
                            None => '?',
                        })
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default();

    let actors = stage
        .records()
        .map(|record| ActorSnapshot {
            id: record.id.0,
            name: record.name.clone(),
            parent: record.parent.map(|parent| parent.0),
            state: record.state,
            tag: record.tag,
            animations: record.animations.iter().cloned().collect(),
            transform: wire_transform(&record.transform),
        })
        .collect();

    SceneSnapshot {
        counts,
        roster: app.roster().iter().cloned().collect(),
        buildings,
        actors,
    }
}

pub fn persist_snapshot(path: &Path, snapshot: &SceneSnapshot) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let json =
        serde_json::to_string_pretty(snapshot).context("serializing scene snapshot to JSON")?;
    fs::write(path, json)
        .with_context(|| format!("writing scene snapshot to {}", path.display()))?;
    println!("Saved scene snapshot to {}", path.display());
    Ok(())
}

pub fn persist_command_log(path: &Path, commands: &[Command]) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
    }
    let json =
        serde_json::to_string_pretty(commands).context("serializing command log to JSON")?;
    fs::write(path, json)
        .with_context(|| format!("writing command log to {}", path.display()))?;
    println!("Saved command log to {}", path.display());
    Ok(())
}
