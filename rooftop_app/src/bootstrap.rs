//! Builds the rooftop stage on session start.
//!
//! This is the fixed, hand-authored creation sequence: curtain rig and
//! panels, three buildings with their window grids, the two control panels,
//! the spotlight, and the collision test box. Transforms are the authored
//! literals; all generative work lives in `rooftop_scene`.

use std::collections::BTreeMap;

use glam::Vec3;
use rooftop_scene::curtain::{
    animated_panels, close_sweep, open_sweep, rest_angle, CLOSE_ANIMATION, OPEN_ANIMATION,
    PANEL_COUNT,
};
use rooftop_scene::keyframes::{euler_deg, window_off_keyframes, window_on_keyframes, yaw_deg};
use rooftop_scene::stage::{ActorId, ActorSpec, Transform};
use rooftop_scene::windows::{
    window_position, WindowState, OFF_ANIMATION, ON_ANIMATION, WINDOW_COUNT,
};
use rooftop_stream::{BehaviorKind, PrimitiveShape, TextAnchor};

use crate::host::{SceneWriter, TextBlock};

/// What a click on a wired button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    OpenCurtains,
    CloseCurtains,
    SetWindows(WindowCue),
    SpotlightUser(String),
}

/// Pattern selection for the three buildings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WindowCue {
    /// Same pattern everywhere.
    All(&'static str),
    /// One pattern per building, front to back.
    PerBuilding([&'static str; 3]),
}

pub struct BuildingHandles {
    pub name: String,
    pub root: ActorId,
    pub windows: Vec<ActorId>,
}

pub struct SceneHandles {
    pub curtain_rig: ActorId,
    pub curtain_inner: ActorId,
    pub panels: Vec<ActorId>,
    pub buildings: Vec<BuildingHandles>,
    pub spotlight: ActorId,
    pub trigger_box: ActorId,
    pub buttons: BTreeMap<ActorId, ButtonAction>,
}

pub fn build_scene(writer: &mut SceneWriter<'_>, base_url: &str) -> SceneHandles {
    let (curtain_rig, curtain_inner, panels) = build_curtains(writer, base_url);

    let buildings = vec![
        build_building(writer, "Building1", Vec3::new(-13.0, 12.0, 40.0), 0.5),
        build_building(writer, "Building2", Vec3::new(3.0, 17.5, 60.0), 0.3),
        build_building(writer, "Building3", Vec3::new(13.0, 15.0, 50.0), 0.5),
    ];

    let buttons = build_control_panels(writer, base_url);
    let spotlight = build_spotlight(writer);
    let trigger_box = build_trigger_box(writer);

    SceneHandles {
        curtain_rig,
        curtain_inner,
        panels,
        buildings,
        spotlight,
        trigger_box,
        buttons,
    }
}

fn model_url(base_url: &str, name: &str) -> String {
    format!("{base_url}/{name}.gltf")
}

fn build_curtains(writer: &mut SceneWriter<'_>, base_url: &str) -> (ActorId, ActorId, Vec<ActorId>) {
    let rig = writer.create_empty(
        ActorSpec::named("Curtains").with_transform(
            Transform::at(Vec3::new(0.0, 2.0, -4.6)).with_scale(Vec3::new(11.0, 1.0, 11.0)),
        ),
    );
    // The rig faces the seats; panels hang off a flipped inner node.
    let inner = writer.create_empty(
        ActorSpec::default()
            .child_of(rig)
            .with_transform(Transform::rotated(euler_deg(0.0, 180.0, 0.0))),
    );

    let piece_url = model_url(base_url, "piece");
    let mut panels = Vec::with_capacity(PANEL_COUNT);
    for index in 0..PANEL_COUNT {
        let panel = writer.create_empty(
            ActorSpec::named(format!("curtain{index}"))
                .child_of(inner)
                .with_transform(Transform::rotated(yaw_deg(rest_angle(index)))),
        );
        writer.create_from_model(
            ActorSpec::default().child_of(panel).with_transform(
                Transform::at(Vec3::new(0.0, -1.0, -1.0))
                    .with_rotation(euler_deg(90.0, 0.0, 0.0))
                    .with_scale(Vec3::new(0.0875 / 2.0, 0.5, 2.0)),
            ),
            &piece_url,
            None,
        );
        panels.push(panel);
    }

    for index in animated_panels() {
        let panel = panels[index];
        writer.create_animation(panel, OPEN_ANIMATION, &open_sweep(index).keyframes());
        writer.create_animation(panel, CLOSE_ANIMATION, &close_sweep(index).keyframes());
    }

    (rig, inner, panels)
}

fn build_building(
    writer: &mut SceneWriter<'_>,
    name: &str,
    position: Vec3,
    scale: f32,
) -> BuildingHandles {
    let root = writer.create_empty(
        ActorSpec::named(name)
            .with_transform(Transform::at(position).with_scale(Vec3::splat(scale))),
    );

    let off_frames = window_off_keyframes();
    let on_frames = window_on_keyframes();
    let mut windows = Vec::with_capacity(WINDOW_COUNT);
    for index in 0..WINDOW_COUNT {
        let (x, y) = window_position(index);
        let window = writer.create_primitive(
            ActorSpec::default()
                .child_of(root)
                .tagged(WindowState::On)
                .with_transform(
                    Transform::at(Vec3::new(x, y, 0.1))
                        .with_rotation(euler_deg(-90.0, 0.0, 0.0)),
                ),
            PrimitiveShape::Plane,
            [1.0, 1.0, 1.5],
            None,
            false,
            false,
        );
        writer.create_animation(window, OFF_ANIMATION, &off_frames);
        writer.create_animation(window, ON_ANIMATION, &on_frames);
        windows.push(window);
    }

    BuildingHandles {
        name: name.to_string(),
        root,
        windows,
    }
}

struct ButtonSpec {
    name: &'static str,
    model: &'static str,
    position: Vec3,
    scale: Vec3,
    caption: &'static str,
    anchor: TextAnchor,
    caption_height: f32,
    action: Option<ButtonAction>,
}

fn build_control_panels(
    writer: &mut SceneWriter<'_>,
    base_url: &str,
) -> BTreeMap<ActorId, ButtonAction> {
    let control_panels = writer
        .create_empty(ActorSpec::named("ControlPanels").with_transform(Transform::at(Vec3::new(
            0.0, 0.0, -7.5,
        ))));

    let button_scale = Vec3::new(0.025, 0.025, 0.01);
    let mut buttons = BTreeMap::new();

    let curtain_panel = writer.create_empty(
        ActorSpec::named("CurtainPanel")
            .child_of(control_panels)
            .with_transform(Transform::rotated(euler_deg(30.0, 0.0, 0.0))),
    );
    build_backplate(writer, curtain_panel);

    // Left/Center/Right/Partial are staged with button behaviors but no
    // click wiring yet, matching the authored scene.
    let curtain_buttons = [
        ButtonSpec {
            name: "OpenButton",
            model: "greenCube",
            position: Vec3::new(-0.05, 0.0, -0.026),
            scale: button_scale,
            caption: "\n\nOpen",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: Some(ButtonAction::OpenCurtains),
        },
        ButtonSpec {
            name: "CloseButton",
            model: "redCube",
            position: Vec3::new(0.05, 0.0, -0.026),
            scale: button_scale,
            caption: "\n\nClose",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: Some(ButtonAction::CloseCurtains),
        },
        ButtonSpec {
            name: "LeftButton",
            model: "redCube",
            position: Vec3::new(-0.1, 0.13, -0.026),
            scale: button_scale,
            caption: "\n\nLeft",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: None,
        },
        ButtonSpec {
            name: "CenterButton",
            model: "redCube",
            position: Vec3::new(0.0, 0.13, -0.026),
            scale: button_scale,
            caption: "\n\nCenter",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: None,
        },
        ButtonSpec {
            name: "RightButton",
            model: "redCube",
            position: Vec3::new(0.1, 0.13, -0.026),
            scale: button_scale,
            caption: "\n\nRight",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: None,
        },
        ButtonSpec {
            name: "PartialButton",
            model: "redCube",
            position: Vec3::new(0.0, 0.18, -0.026),
            scale: Vec3::new(0.0125, 0.0125, 0.01),
            caption: "Partial\n\n",
            anchor: TextAnchor::BottomCenter,
            caption_height: 1.0,
            action: None,
        },
    ];
    for spec in curtain_buttons {
        build_button(writer, base_url, curtain_panel, spec, &mut buttons);
    }

    let building_panel = writer.create_empty(
        ActorSpec::named("BuildingPanel")
            .child_of(control_panels)
            .with_transform(
                Transform::at(Vec3::new(1.0, 0.0, 0.0)).with_rotation(euler_deg(30.0, 0.0, 0.0)),
            ),
    );
    build_backplate(writer, building_panel);

    let building_buttons = [
        ButtonSpec {
            name: "OnButton",
            model: "redCube",
            position: Vec3::new(-0.1, 0.18, -0.026),
            scale: button_scale,
            caption: "\n\nOn",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: Some(ButtonAction::SetWindows(WindowCue::All("on"))),
        },
        ButtonSpec {
            name: "OffButton",
            model: "redCube",
            position: Vec3::new(0.0, 0.18, -0.026),
            scale: button_scale,
            caption: "\n\nOff",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: Some(ButtonAction::SetWindows(WindowCue::All("off"))),
        },
        ButtonSpec {
            name: "TrtButton",
            model: "redCube",
            position: Vec3::new(0.1, 0.18, -0.026),
            scale: button_scale,
            caption: "\n\nTRT",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: Some(ButtonAction::SetWindows(WindowCue::PerBuilding([
                "the", "roof", "top",
            ]))),
        },
        ButtonSpec {
            name: "SmileButton",
            model: "redCube",
            position: Vec3::new(-0.1, 0.05, -0.026),
            scale: button_scale,
            caption: "\n\nSmile",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: Some(ButtonAction::SetWindows(WindowCue::All("smile"))),
        },
        ButtonSpec {
            name: "StarButton",
            model: "redCube",
            position: Vec3::new(0.0, 0.05, -0.026),
            scale: button_scale,
            caption: "\n\nStar",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: Some(ButtonAction::SetWindows(WindowCue::All("star"))),
        },
        ButtonSpec {
            name: "CheckerButton",
            model: "redCube",
            position: Vec3::new(0.1, 0.05, -0.026),
            scale: button_scale,
            caption: "\n\nChecker",
            anchor: TextAnchor::TopCenter,
            caption_height: 0.6,
            action: Some(ButtonAction::SetWindows(WindowCue::All("checker"))),
        },
    ];
    for spec in building_buttons {
        build_button(writer, base_url, building_panel, spec, &mut buttons);
    }

    buttons
}

fn build_backplate(writer: &mut SceneWriter<'_>, panel: ActorId) {
    writer.create_primitive(
        ActorSpec::default().child_of(panel),
        PrimitiveShape::Box,
        [0.4, 0.6, 0.05],
        None,
        true,
        false,
    );
}

fn build_button(
    writer: &mut SceneWriter<'_>,
    base_url: &str,
    panel: ActorId,
    spec: ButtonSpec,
    buttons: &mut BTreeMap<ActorId, ButtonAction>,
) {
    let button = writer.create_from_model(
        ActorSpec::named(spec.name)
            .child_of(panel)
            .with_transform(Transform::at(spec.position).with_scale(spec.scale)),
        model_url(base_url, spec.model),
        Some(PrimitiveShape::Box),
    );
    // Leading/trailing newlines in the caption drop it clear of the cube.
    writer.attach_text(
        button,
        TextBlock::caption(spec.caption, spec.anchor, spec.caption_height),
    );
    writer.set_behavior(button, BehaviorKind::Button);
    if let Some(action) = spec.action {
        buttons.insert(button, action);
    }
}

fn build_spotlight(writer: &mut SceneWriter<'_>) -> ActorId {
    let spotlight = writer.create_empty(
        ActorSpec::named("SpotLight").with_transform(
            Transform::at(Vec3::new(0.0, 4.0, 0.0)).with_rotation(euler_deg(0.0, -90.0, 0.0)),
        ),
    );
    writer.create_primitive(
        ActorSpec::named("light").child_of(spotlight),
        PrimitiveShape::Cylinder,
        [0.4, 0.4, 0.5],
        Some(0.15),
        false,
        false,
    );
    writer.create_primitive(
        ActorSpec::named("beam")
            .child_of(spotlight)
            .with_transform(Transform::at(Vec3::new(0.0, 0.0, 5.0))),
        PrimitiveShape::Cylinder,
        [0.4, 0.4, 10.0],
        Some(0.01),
        false,
        false,
    );
    spotlight
}

fn build_trigger_box(writer: &mut SceneWriter<'_>) -> ActorId {
    writer.create_primitive(
        ActorSpec::named("TriggerBox")
            .with_transform(Transform::at(Vec3::new(0.0, 0.5, -20.0))),
        PrimitiveShape::Box,
        [0.5, 0.5, 0.5],
        None,
        true,
        true,
    )
}
