//! Inbound-event scripts and the built-in demos.
//!
//! A script is a JSON array of events addressed by actor *name* so authors
//! never have to predict forward-handle numbers; names resolve against the
//! stage once the referenced actor exists. The demos synthesize the same
//! sequences programmatically.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;
use rooftop_scene::curtain::{CLOSE_ANIMATION, OPEN_ANIMATION, TERMINAL_PANEL};
use rooftop_scene::stage::ActorId;
use rooftop_stream::{Ack, AckStatus, EventPayload, HoverPhase};

use crate::app::RooftopApp;
use crate::cli::DemoKind;

/// One scripted inbound message. Actor references are names, resolved at
/// dispatch time.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScriptedEvent {
    Started,
    UserJoined {
        id: String,
        name: String,
    },
    UserLeft {
        id: String,
    },
    ButtonHover {
        button: String,
        user: String,
        phase: HoverPhase,
    },
    ButtonClick {
        button: String,
        user: String,
    },
    TriggerEnter {
        actor: String,
        #[serde(default)]
        data: Value,
    },
    AnimationFinished {
        actor: String,
        animation: String,
    },
    Ack {
        actor: String,
        rejected: Option<String>,
    },
}

pub fn load_script(path: &Path) -> Result<Vec<ScriptedEvent>> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading event script {}", path.display()))?;
    serde_json::from_str(&raw)
        .with_context(|| format!("parsing event script {}", path.display()))
}

/// Feed scripted events through the dispatcher. Events naming actors the
/// stage has never seen are logged and skipped, mirroring how a live host
/// drops references to unknown handles.
pub fn run_script(app: &mut RooftopApp, events: &[ScriptedEvent]) {
    for event in events {
        dispatch(app, event);
    }
}

fn dispatch(app: &mut RooftopApp, event: &ScriptedEvent) {
    match event {
        ScriptedEvent::Started => app.handle_event(EventPayload::Started),
        ScriptedEvent::UserJoined { id, name } => app.handle_event(EventPayload::UserJoined {
            id: id.clone(),
            name: name.clone(),
        }),
        ScriptedEvent::UserLeft { id } => {
            app.handle_event(EventPayload::UserLeft { id: id.clone() })
        }
        ScriptedEvent::ButtonHover { button, user, phase } => {
            let Some(actor) = resolve(app, button) else {
                return;
            };
            app.handle_event(EventPayload::ButtonHover {
                actor: actor.0,
                user: user.clone(),
                phase: *phase,
            });
        }
        ScriptedEvent::ButtonClick { button, user } => {
            let Some(actor) = resolve(app, button) else {
                return;
            };
            app.handle_event(EventPayload::ButtonClick {
                actor: actor.0,
                user: user.clone(),
            });
        }
        ScriptedEvent::TriggerEnter { actor, data } => {
            let Some(id) = resolve(app, actor) else {
                return;
            };
            app.handle_event(EventPayload::TriggerEnter {
                actor: id.0,
                other: 0,
                data: data.clone(),
            });
        }
        ScriptedEvent::AnimationFinished { actor, animation } => {
            let Some(id) = resolve(app, actor) else {
                return;
            };
            app.handle_event(EventPayload::AnimationFinished {
                actor: id.0,
                animation: animation.clone(),
            });
        }
        ScriptedEvent::Ack { actor, rejected } => {
            let Some(id) = resolve(app, actor) else {
                return;
            };
            let seq = app.host().creation_seq(id.0).unwrap_or(0);
            let ack = match rejected {
                Some(reason) => Ack {
                    seq,
                    actor: id.0,
                    status: AckStatus::Rejected,
                    error: Some(reason.clone()),
                },
                None => Ack {
                    seq,
                    actor: id.0,
                    status: AckStatus::Resolved,
                    error: None,
                },
            };
            app.handle_ack(&ack);
        }
    }
}

fn resolve(app: &RooftopApp, name: &str) -> Option<ActorId> {
    let id = app.stage().find_by_name(name);
    if id.is_none() {
        log::warn!("scripted event references unknown actor {name:?}; skipping");
    }
    id
}

/// Run one of the built-in event sequences.
pub fn run_demo(app: &mut RooftopApp, kind: DemoKind) {
    match kind {
        DemoKind::Curtains => run_curtains_demo(app),
        DemoKind::Windows => run_windows_demo(app),
        DemoKind::Full => run_full_demo(app),
    }
}

fn click(app: &mut RooftopApp, button: &str, user: &str) {
    dispatch(
        app,
        &ScriptedEvent::ButtonClick {
            button: button.to_string(),
            user: user.to_string(),
        },
    );
}

fn finish_wave(app: &mut RooftopApp, animation: &str) {
    let Some(terminal) = app
        .handles()
        .map(|handles| handles.panels[TERMINAL_PANEL])
    else {
        return;
    };
    app.handle_event(EventPayload::AnimationFinished {
        actor: terminal.0,
        animation: animation.to_string(),
    });
}

fn run_curtains_demo(app: &mut RooftopApp) {
    app.handle_event(EventPayload::Started);
    app.resolve_outstanding();
    app.handle_event(EventPayload::UserJoined {
        id: "demo-user".to_string(),
        name: "Ben".to_string(),
    });

    click(app, "OpenButton", "demo-user");
    // Pressed again mid-wave: the gate swallows it.
    click(app, "CloseButton", "demo-user");
    finish_wave(app, OPEN_ANIMATION);

    click(app, "CloseButton", "demo-user");
    finish_wave(app, CLOSE_ANIMATION);
}

fn run_windows_demo(app: &mut RooftopApp) {
    app.handle_event(EventPayload::Started);
    app.resolve_outstanding();
    app.handle_event(EventPayload::UserJoined {
        id: "demo-user".to_string(),
        name: "Ben".to_string(),
    });

    click(app, "SmileButton", "demo-user");
    // Same cue twice: no further animations fire.
    click(app, "SmileButton", "demo-user");
    click(app, "StarButton", "demo-user");
    click(app, "TrtButton", "demo-user");
    click(app, "CheckerButton", "demo-user");
}

fn run_full_demo(app: &mut RooftopApp) {
    app.handle_event(EventPayload::Started);
    app.resolve_outstanding();
    app.handle_event(EventPayload::UserJoined {
        id: "user-1".to_string(),
        name: "Ben".to_string(),
    });
    app.handle_event(EventPayload::UserJoined {
        id: "user-2".to_string(),
        name: "Mara".to_string(),
    });

    dispatch(
        app,
        &ScriptedEvent::ButtonHover {
            button: "OpenButton".to_string(),
            user: "user-1".to_string(),
            phase: HoverPhase::Enter,
        },
    );
    click(app, "OpenButton", "user-1");
    dispatch(
        app,
        &ScriptedEvent::ButtonHover {
            button: "OpenButton".to_string(),
            user: "user-1".to_string(),
            phase: HoverPhase::Exit,
        },
    );
    finish_wave(app, OPEN_ANIMATION);

    click(app, "SmileButton", "user-2");
    click(app, "UserButton_user-2", "user-1");

    dispatch(
        app,
        &ScriptedEvent::TriggerEnter {
            actor: "TriggerBox".to_string(),
            data: serde_json::json!({ "impulse": [0.0, 0.0, 1.2] }),
        },
    );

    click(app, "CloseButton", "user-1");
    finish_wave(app, CLOSE_ANIMATION);

    app.handle_event(EventPayload::UserLeft {
        id: "user-1".to_string(),
    });
}
