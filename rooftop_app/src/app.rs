//! Event dispatch for the rooftop stage.
//!
//! The host delivers events one at a time on a single logical thread; each
//! handler runs to completion before the next event arrives. All mutable
//! session state (stage mirror, roster, wave gate) is owned here and handed
//! to the handlers explicitly.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use glam::Vec3;
use rooftop_scene::curtain::{
    animated_panels, CLOSE_ANIMATION, OPEN_ANIMATION, TERMINAL_PANEL, WAVE_SECONDS,
};
use rooftop_scene::session::SessionRoster;
use rooftop_scene::stage::{ActorId, ActorSpec, StageGraph, Transform};
use rooftop_scene::windows::apply_pattern;
use rooftop_stream::{
    Ack, AckStatus, BehaviorKind, CommandPayload, EventPayload, HoverPhase, LookAtMode,
    LookAtTarget, PrimitiveShape, TextAnchor,
};

use crate::bootstrap::{build_scene, BuildingHandles, ButtonAction, SceneHandles, WindowCue};
use crate::host::{CommandSink, HostClient, SceneWriter, TextBlock};

/// Non-reentrant gate around the curtain wave.
///
/// Released by the terminal panel's completion event when the host sends
/// one; the deadline is the documented fallback approximation for hosts
/// that never report completion.
#[derive(Debug, Default)]
pub struct WaveGate {
    deadline: Option<Instant>,
}

impl WaveGate {
    pub fn try_start(&mut self, now: Instant) -> bool {
        if let Some(deadline) = self.deadline {
            if now < deadline {
                return false;
            }
        }
        self.deadline = Some(now + Duration::from_secs_f32(WAVE_SECONDS));
        true
    }

    pub fn release(&mut self) {
        self.deadline = None;
    }

    pub fn is_busy(&self, now: Instant) -> bool {
        self.deadline.map(|deadline| now < deadline).unwrap_or(false)
    }
}

pub struct RooftopApp {
    base_url: String,
    stage: StageGraph,
    host: HostClient,
    roster: SessionRoster,
    handles: Option<SceneHandles>,
    buttons: BTreeMap<ActorId, ButtonAction>,
    gate: WaveGate,
}

impl RooftopApp {
    pub fn new(base_url: impl Into<String>, sink: Option<Box<dyn CommandSink>>) -> Self {
        RooftopApp {
            base_url: base_url.into(),
            stage: StageGraph::new(),
            host: HostClient::new(sink),
            roster: SessionRoster::new(),
            handles: None,
            buttons: BTreeMap::new(),
            gate: WaveGate::default(),
        }
    }

    pub fn stage(&self) -> &StageGraph {
        &self.stage
    }

    pub fn host(&self) -> &HostClient {
        &self.host
    }

    pub fn roster(&self) -> &SessionRoster {
        &self.roster
    }

    pub fn handles(&self) -> Option<&SceneHandles> {
        self.handles.as_ref()
    }

    pub fn handle_event(&mut self, payload: EventPayload) {
        match payload {
            EventPayload::Started => self.on_started(),
            EventPayload::UserJoined { id, name } => self.on_user_joined(id, name),
            EventPayload::UserLeft { id } => self.on_user_left(&id),
            EventPayload::ButtonHover { actor, phase, .. } => self.on_hover(ActorId(actor), phase),
            EventPayload::ButtonClick { actor, user } => self.on_click(ActorId(actor), &user),
            EventPayload::TriggerEnter { actor, other, data } => {
                log::info!("trigger entered on {}: {} ({data})", ActorId(actor), ActorId(other));
            }
            EventPayload::CollisionEnter { actor, other, data } => {
                log::info!("collision on {}: {} ({data})", ActorId(actor), ActorId(other));
            }
            EventPayload::AnimationFinished { actor, animation } => {
                self.on_animation_finished(ActorId(actor), &animation);
            }
        }
    }

    /// Host resolution of a forward handle. Rejections are logged and
    /// dropped; nothing retries a failed creation.
    pub fn handle_ack(&mut self, ack: &Ack) {
        let id = ActorId(ack.actor);
        match ack.status {
            AckStatus::Resolved => {
                if !self.stage.mark_resolved(id) {
                    log::warn!("ack {} references unknown {id}", ack.seq);
                }
            }
            AckStatus::Rejected => {
                self.stage.mark_rejected(id);
                log::error!(
                    "host rejected {id}: {}",
                    ack.error.as_deref().unwrap_or("no reason given")
                );
            }
        }
    }

    /// Stand-in for a live host: acknowledge every still-pending creation.
    pub fn resolve_outstanding(&mut self) -> usize {
        let pending = self.stage.pending();
        for id in &pending {
            let ack = Ack {
                seq: self.host.creation_seq(id.0).unwrap_or(0),
                actor: id.0,
                status: AckStatus::Resolved,
                error: None,
            };
            self.handle_ack(&ack);
        }
        pending.len()
    }

    fn on_started(&mut self) {
        if self.handles.is_some() {
            log::warn!("session start received twice; keeping the existing stage");
            return;
        }
        log::info!("session started; building the rooftop stage from {}", self.base_url);
        let base_url = self.base_url.clone();
        let mut writer = SceneWriter {
            stage: &mut self.stage,
            host: &mut self.host,
        };
        let handles = build_scene(&mut writer, &base_url);
        self.buttons
            .extend(handles.buttons.iter().map(|(id, action)| (*id, action.clone())));
        self.handles = Some(handles);
    }

    fn on_user_joined(&mut self, id: String, name: String) {
        let slot = self.roster.join(id.clone(), name.clone());
        log::info!("user-joined: {name} ({id}); players connected: {slot}");

        // Per-user button row in front of the stage; clicking a button aims
        // the spotlight at that user.
        let x = 0.3 * slot as f32;
        let mut writer = SceneWriter {
            stage: &mut self.stage,
            host: &mut self.host,
        };
        let button = writer.create_primitive(
            ActorSpec::named(format!("UserButton_{id}"))
                .with_transform(Transform::at(Vec3::new(x, 0.0, -10.0))),
            PrimitiveShape::Box,
            [0.1, 0.1, 0.1],
            None,
            true,
            false,
        );
        let label = writer
            .create_empty(ActorSpec::default().with_transform(Transform::at(Vec3::new(
                x, 0.2, -10.0,
            ))));
        writer.attach_text(label, TextBlock::caption(name, TextAnchor::TopCenter, 0.05));
        writer.set_behavior(button, BehaviorKind::Button);
        self.buttons.insert(button, ButtonAction::SpotlightUser(id));
    }

    fn on_user_left(&mut self, id: &str) {
        match self.roster.leave(id) {
            Some(user) => log::info!(
                "user-left: {}; players connected: {}",
                user.name,
                self.roster.count()
            ),
            None => log::warn!("user-left for unknown id {id}"),
        }
        // Tear down the departed user's spotlight button.
        if let Some(button) = self.stage.find_by_name(&format!("UserButton_{id}")) {
            self.buttons.remove(&button);
            self.host.issue(CommandPayload::DestroyActor { actor: button.0 });
        }
    }

    fn on_hover(&mut self, actor: ActorId, phase: HoverPhase) {
        let name = self
            .stage
            .record(actor)
            .and_then(|record| record.name.clone())
            .unwrap_or_else(|| actor.to_string());
        match phase {
            HoverPhase::Enter => log::info!("hover entered on {name}"),
            HoverPhase::Exit => log::info!("hover exited on {name}"),
        }
    }

    fn on_click(&mut self, actor: ActorId, user: &str) {
        let clicker = self
            .roster
            .name(user)
            .unwrap_or("unknown user")
            .to_string();
        match self.buttons.get(&actor).cloned() {
            Some(ButtonAction::OpenCurtains) => {
                log::info!("open clicked by {clicker}");
                self.run_wave(OPEN_ANIMATION);
            }
            Some(ButtonAction::CloseCurtains) => {
                log::info!("close clicked by {clicker}");
                self.run_wave(CLOSE_ANIMATION);
            }
            Some(ButtonAction::SetWindows(cue)) => {
                log::info!("window cue {cue:?} clicked by {clicker}");
                self.set_windows(&cue);
            }
            Some(ButtonAction::SpotlightUser(target)) => {
                log::info!("spotlight aimed at {target} by {clicker}");
                self.point_spotlight(&target);
            }
            None => log::debug!("click on unwired {actor} by {clicker}"),
        }
    }

    fn run_wave(&mut self, clip: &'static str) {
        let Some(handles) = self.handles.as_ref() else {
            log::warn!("curtain wave requested before the session started");
            return;
        };
        if !self.gate.try_start(Instant::now()) {
            log::info!("curtain wave ignored; a wave is still in flight");
            return;
        }
        let panels: Vec<ActorId> = animated_panels().map(|index| handles.panels[index]).collect();
        let mut writer = SceneWriter {
            stage: &mut self.stage,
            host: &mut self.host,
        };
        for panel in panels {
            writer.enable_animation(panel, clip);
        }
    }

    fn set_windows(&mut self, cue: &WindowCue) {
        let Some(handles) = self.handles.as_ref() else {
            log::warn!("window cue requested before the session started");
            return;
        };
        let assignments: Vec<(&BuildingHandles, &str)> = match cue {
            WindowCue::All(spec) => handles
                .buildings
                .iter()
                .map(|building| (building, *spec))
                .collect(),
            WindowCue::PerBuilding(specs) => handles
                .buildings
                .iter()
                .zip(specs.iter().copied())
                .collect(),
        };

        for (building, spec) in assignments {
            match apply_pattern(&mut self.stage, &building.windows, spec) {
                Ok(toggles) => {
                    for toggle in toggles {
                        self.host.issue(CommandPayload::EnableAnimation {
                            actor: toggle.actor.0,
                            name: toggle.state.animation().to_string(),
                        });
                    }
                }
                Err(err) => {
                    log::error!("pattern {spec:?} rejected for {}: {err}", building.name);
                }
            }
        }
    }

    fn point_spotlight(&mut self, user: &str) {
        let Some(handles) = self.handles.as_ref() else {
            log::warn!("spotlight requested before the session started");
            return;
        };
        let spotlight = handles.spotlight;
        let mut writer = SceneWriter {
            stage: &mut self.stage,
            host: &mut self.host,
        };
        writer.look_at(
            spotlight,
            LookAtTarget::User {
                user: user.to_string(),
            },
            LookAtMode::TargetXy,
        );
    }

    fn on_animation_finished(&mut self, actor: ActorId, animation: &str) {
        let Some(handles) = self.handles.as_ref() else {
            return;
        };
        if actor == handles.panels[TERMINAL_PANEL] {
            log::info!("curtain wave complete ({animation})");
            self.gate.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rooftop_scene::windows::{resolve_pattern, WINDOW_COUNT};
    use rooftop_stream::CommandPayload;

    fn started_app() -> RooftopApp {
        let mut app = RooftopApp::new("https://example.test", None);
        app.handle_event(EventPayload::Started);
        app
    }

    fn click(app: &mut RooftopApp, button: &str, user: &str) {
        let actor = app
            .stage()
            .find_by_name(button)
            .unwrap_or_else(|| panic!("button {button} missing"));
        app.handle_event(EventPayload::ButtonClick {
            actor: actor.0,
            user: user.to_string(),
        });
    }

    fn count_enables(app: &RooftopApp, clip: &str) -> usize {
        app.host()
            .issued()
            .iter()
            .filter(|command| {
                matches!(
                    &command.payload,
                    CommandPayload::EnableAnimation { name, .. } if name == clip
                )
            })
            .count()
    }

    #[test]
    fn wave_gate_blocks_until_released() {
        let mut gate = WaveGate::default();
        let now = Instant::now();
        assert!(gate.try_start(now));
        assert!(gate.is_busy(now));
        assert!(!gate.try_start(now + Duration::from_secs(1)));

        // The deadline fallback lets a new wave through on its own.
        assert!(gate.try_start(now + Duration::from_secs(5)));

        gate.release();
        assert!(!gate.is_busy(Instant::now()));
        assert!(gate.try_start(Instant::now()));
    }

    #[test]
    fn started_builds_the_full_stage() {
        let app = started_app();
        let handles = app.handles().expect("scene built");
        assert_eq!(handles.panels.len(), 20);
        assert_eq!(handles.buildings.len(), 3);
        for building in &handles.buildings {
            assert_eq!(building.windows.len(), WINDOW_COUNT);
        }
        // 18 panels get Open and Close clips, each window gets On and Off.
        assert_eq!(count_creates(&app, "Open"), 18);
        assert_eq!(count_creates(&app, "Close"), 18);
        assert_eq!(count_creates(&app, "On"), 300);
        assert_eq!(count_creates(&app, "Off"), 300);
    }

    fn count_creates(app: &RooftopApp, clip: &str) -> usize {
        app.host()
            .issued()
            .iter()
            .filter(|command| {
                matches!(
                    &command.payload,
                    CommandPayload::CreateAnimation { name, .. } if name == clip
                )
            })
            .count()
    }

    #[test]
    fn curtain_clicks_respect_the_gate() {
        let mut app = started_app();
        app.handle_event(EventPayload::UserJoined {
            id: "u1".to_string(),
            name: "Ben".to_string(),
        });

        click(&mut app, "OpenButton", "u1");
        assert_eq!(count_enables(&app, OPEN_ANIMATION), 18);

        // Still animating: the close press is swallowed.
        click(&mut app, "CloseButton", "u1");
        assert_eq!(count_enables(&app, CLOSE_ANIMATION), 0);

        let terminal = app.handles().expect("scene").panels[TERMINAL_PANEL];
        app.handle_event(EventPayload::AnimationFinished {
            actor: terminal.0,
            animation: OPEN_ANIMATION.to_string(),
        });

        click(&mut app, "CloseButton", "u1");
        assert_eq!(count_enables(&app, CLOSE_ANIMATION), 18);
    }

    #[test]
    fn window_cues_only_animate_changed_windows() {
        let mut app = started_app();
        let expected_off = resolve_pattern("smile")
            .chars()
            .filter(|bit| *bit == '0')
            .count();

        click(&mut app, "SmileButton", "nobody");
        assert_eq!(count_enables(&app, "Off"), expected_off * 3);
        assert_eq!(count_enables(&app, "On"), 0);

        // Idempotent: the same cue again triggers nothing new.
        click(&mut app, "SmileButton", "nobody");
        assert_eq!(count_enables(&app, "Off"), expected_off * 3);
        assert_eq!(count_enables(&app, "On"), 0);
    }

    #[test]
    fn trt_cue_spells_across_the_buildings() {
        let mut app = started_app();
        click(&mut app, "TrtButton", "nobody");

        let handles = app.handles().expect("scene");
        for (building, preset) in handles.buildings.iter().zip(["the", "roof", "top"]) {
            let pattern = resolve_pattern(preset);
            for (window, bit) in building.windows.iter().zip(pattern.chars()) {
                let tag = app.stage().tag(*window).expect("window tag");
                assert_eq!(tag.as_tag(), if bit == '0' { "off" } else { "on" });
            }
        }
    }

    #[test]
    fn user_buttons_aim_the_spotlight() {
        let mut app = started_app();
        app.handle_event(EventPayload::UserJoined {
            id: "u1".to_string(),
            name: "Ben".to_string(),
        });

        click(&mut app, "UserButton_u1", "u1");
        let spotlight = app.handles().expect("scene").spotlight;
        let aimed = app.host().issued().iter().any(|command| {
            matches!(
                &command.payload,
                CommandPayload::LookAt { actor, target: LookAtTarget::User { user }, mode }
                    if *actor == spotlight.0 && user == "u1" && *mode == LookAtMode::TargetXy
            )
        });
        assert!(aimed, "expected a LookAt at the joined user");
    }

    #[test]
    fn leaving_tears_down_the_user_button() {
        let mut app = started_app();
        app.handle_event(EventPayload::UserJoined {
            id: "u1".to_string(),
            name: "Ben".to_string(),
        });
        let button = app.stage().find_by_name("UserButton_u1").expect("button");

        app.handle_event(EventPayload::UserLeft {
            id: "u1".to_string(),
        });
        assert_eq!(app.roster().count(), 0);
        let destroyed = app.host().issued().iter().any(|command| {
            matches!(
                &command.payload,
                CommandPayload::DestroyActor { actor } if *actor == button.0
            )
        });
        assert!(destroyed, "expected the departed user's button to be destroyed");

        // A click on the stale handle routes nowhere.
        app.handle_event(EventPayload::ButtonClick {
            actor: button.0,
            user: "u2".to_string(),
        });
        let aimed_after = app.host().issued().iter().any(|command| {
            matches!(&command.payload, CommandPayload::LookAt { .. })
        });
        assert!(!aimed_after, "stale button must not aim the spotlight");
    }

    #[test]
    fn outstanding_handles_resolve_in_bulk() {
        let mut app = started_app();
        let pending = app.resolve_outstanding();
        assert!(pending > 0);
        assert_eq!(app.stage().pending().len(), 0);
        assert_eq!(app.resolve_outstanding(), 0);
    }
}
