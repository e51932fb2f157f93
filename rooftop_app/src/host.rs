//! Outbound side of the host connection.
//!
//! [`HostClient`] assigns sequence numbers, keeps the full command log, and
//! hands each command to an optional sink (the TCP stream server, or a test
//! recorder). [`SceneWriter`] pairs the client with the stage graph so every
//! creation call both stages a local record and issues the wire command.

use anyhow::Result;
use glam::{Quat, Vec3};
use rooftop_scene::keyframes::Keyframe;
use rooftop_scene::stage::{ActorId, ActorSpec, StageGraph, Transform};
use rooftop_stream::{
    BehaviorKind, Command, CommandPayload, LookAtMode, LookAtTarget, PrimitiveShape, TextAnchor,
    TextJustify, WireKeyframe, WireTransform,
};

pub trait CommandSink {
    fn deliver(&mut self, command: &Command) -> Result<()>;
}

pub struct HostClient {
    next_seq: u64,
    issued: Vec<Command>,
    sink: Option<Box<dyn CommandSink>>,
}

impl HostClient {
    pub fn new(sink: Option<Box<dyn CommandSink>>) -> Self {
        HostClient {
            next_seq: 0,
            issued: Vec::new(),
            sink,
        }
    }

    /// Issue one command. Delivery failures are logged and dropped; the host
    /// offers no retry surface.
    pub fn issue(&mut self, payload: CommandPayload) -> u64 {
        let command = Command {
            seq: self.next_seq,
            payload,
        };
        self.next_seq += 1;
        if let Some(sink) = self.sink.as_mut() {
            if let Err(err) = sink.deliver(&command) {
                log::warn!("command {} not delivered: {err:#}", command.seq);
            }
        }
        let seq = command.seq;
        self.issued.push(command);
        seq
    }

    pub fn issued(&self) -> &[Command] {
        &self.issued
    }

    /// Sequence number of the command that created `actor`, for echoing in
    /// synthesized acks.
    pub fn creation_seq(&self, actor: u32) -> Option<u64> {
        self.issued.iter().find_map(|command| match &command.payload {
            CommandPayload::CreatePrimitive { actor: a, .. }
            | CommandPayload::CreateEmpty { actor: a, .. }
            | CommandPayload::CreateFromModel { actor: a, .. }
                if *a == actor =>
            {
                Some(command.seq)
            }
            _ => None,
        })
    }
}

fn wire_vec(value: Vec3) -> [f32; 3] {
    value.to_array()
}

fn wire_quat(value: Quat) -> [f32; 4] {
    value.to_array()
}

pub fn wire_transform(transform: &Transform) -> WireTransform {
    WireTransform {
        position: transform.position.map(wire_vec),
        rotation: transform.rotation.map(wire_quat),
        scale: transform.scale.map(wire_vec),
    }
}

pub fn wire_keyframes(frames: &[Keyframe]) -> Vec<WireKeyframe> {
    frames
        .iter()
        .map(|frame| WireKeyframe {
            time: frame.time,
            value: WireTransform {
                rotation: Some(wire_quat(frame.rotation)),
                ..WireTransform::default()
            },
        })
        .collect()
}

/// Text block attached to an actor.
pub struct TextBlock {
    pub contents: String,
    pub anchor: TextAnchor,
    pub color: [f32; 3],
    pub height: f32,
    pub justify: TextJustify,
}

impl TextBlock {
    /// White centred caption, the style every panel label uses.
    pub fn caption(contents: impl Into<String>, anchor: TextAnchor, height: f32) -> Self {
        TextBlock {
            contents: contents.into(),
            anchor,
            color: [1.0, 1.0, 1.0],
            height,
            justify: TextJustify::Center,
        }
    }
}

/// Issues scene calls while mirroring them into the stage graph.
pub struct SceneWriter<'a> {
    pub stage: &'a mut StageGraph,
    pub host: &'a mut HostClient,
}

impl SceneWriter<'_> {
    pub fn create_empty(&mut self, spec: ActorSpec) -> ActorId {
        let name = spec.name.clone();
        let parent = spec.parent;
        let transform = spec.transform;
        let id = self.stage.create(spec);
        self.host.issue(CommandPayload::CreateEmpty {
            actor: id.0,
            parent: parent.map(|p| p.0),
            name,
            transform: wire_transform(&transform),
        });
        id
    }

    pub fn create_primitive(
        &mut self,
        spec: ActorSpec,
        shape: PrimitiveShape,
        dimensions: [f32; 3],
        radius: Option<f32>,
        collider: bool,
        is_trigger: bool,
    ) -> ActorId {
        let name = spec.name.clone();
        let parent = spec.parent;
        let transform = spec.transform;
        let tag = spec.tag;
        let id = self.stage.create(spec);
        self.host.issue(CommandPayload::CreatePrimitive {
            actor: id.0,
            parent: parent.map(|p| p.0),
            name,
            shape,
            dimensions,
            radius,
            collider,
            is_trigger,
            transform: wire_transform(&transform),
            tag: tag.map(|state| state.as_tag().to_string()),
        });
        id
    }

    pub fn create_from_model(
        &mut self,
        spec: ActorSpec,
        resource_url: impl Into<String>,
        collider: Option<PrimitiveShape>,
    ) -> ActorId {
        let name = spec.name.clone();
        let parent = spec.parent;
        let transform = spec.transform;
        let id = self.stage.create(spec);
        self.host.issue(CommandPayload::CreateFromModel {
            actor: id.0,
            parent: parent.map(|p| p.0),
            name,
            resource_url: resource_url.into(),
            collider,
            transform: wire_transform(&transform),
        });
        id
    }

    pub fn attach_text(&mut self, actor: ActorId, text: TextBlock) {
        self.host.issue(CommandPayload::AttachText {
            actor: actor.0,
            contents: text.contents,
            anchor: text.anchor,
            color: text.color,
            height: text.height,
            justify: text.justify,
        });
    }

    pub fn create_animation(&mut self, actor: ActorId, name: &str, frames: &[Keyframe]) {
        self.stage.register_animation(actor, name);
        self.host.issue(CommandPayload::CreateAnimation {
            actor: actor.0,
            name: name.to_string(),
            keyframes: wire_keyframes(frames),
        });
    }

    pub fn enable_animation(&mut self, actor: ActorId, name: &str) {
        self.host.issue(CommandPayload::EnableAnimation {
            actor: actor.0,
            name: name.to_string(),
        });
    }

    pub fn set_behavior(&mut self, actor: ActorId, behavior: BehaviorKind) {
        self.host
            .issue(CommandPayload::SetBehavior {
                actor: actor.0,
                behavior,
            });
    }

    pub fn look_at(&mut self, actor: ActorId, target: LookAtTarget, mode: LookAtMode) {
        self.host.issue(CommandPayload::LookAt {
            actor: actor.0,
            target,
            mode,
        });
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;

    #[derive(Clone, Default)]
    struct RecordingSink {
        commands: Rc<RefCell<Vec<Command>>>,
    }

    impl CommandSink for RecordingSink {
        fn deliver(&mut self, command: &Command) -> Result<()> {
            self.commands.borrow_mut().push(command.clone());
            Ok(())
        }
    }

    #[test]
    fn commands_are_sequenced_and_mirrored_to_the_sink() {
        let recorder = RecordingSink::default();
        let mut host = HostClient::new(Some(Box::new(recorder.clone())));
        let mut stage = StageGraph::new();
        let mut writer = SceneWriter {
            stage: &mut stage,
            host: &mut host,
        };

        let rig = writer.create_empty(ActorSpec::named("CurtainRig"));
        writer.enable_animation(rig, "Open");

        let issued = host.issued();
        assert_eq!(issued.len(), 2);
        assert_eq!(issued[0].seq, 0);
        assert_eq!(issued[1].seq, 1);
        assert_eq!(recorder.commands.borrow().len(), 2);
        assert_eq!(host.creation_seq(rig.0), Some(0));
    }

    #[test]
    fn keyframes_cross_the_wire_as_rotation_patches() {
        let frames = rooftop_scene::keyframes::sweep_keyframes(1.0, 0.0, 90.0, 0.0);
        let wire = wire_keyframes(&frames);
        assert_eq!(wire.len(), 4);
        assert!(wire.iter().all(|frame| frame.value.rotation.is_some()
            && frame.value.position.is_none()
            && frame.value.scale.is_none()));
    }
}
