//! One-shot construction of the driving scene.

use crate::{
    FollowLight, Geometry, Light, Material, NodeKind, SceneError, SceneGraph, ShadowCamera, Shape,
    VehicleRig,
};
use drivescape_common::{Color, NodeId, Transform};
use drivescape_kernel::VehicleState;
use drivescape_textures::{TextureSet, TextureSlot};
use glam::{Quat, Vec3};
use rand::Rng;
use std::f32::consts::FRAC_PI_2;

/// Handles to the nodes the application mutates after construction.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SceneHandles {
    pub ground: NodeId,
    pub grid: NodeId,
    pub vehicle: VehicleRig,
    pub follow_light: FollowLight,
}

const TREE_COUNT: usize = 12;
const TREE_SPREAD: f32 = 40.0;
const FOLLOW_LIGHT_OFFSET: Vec3 = Vec3::new(0.0, 3.0, 0.0);

const WHEEL_OFFSETS: [Vec3; 4] = [
    Vec3::new(-1.2, -0.5, 0.8),
    Vec3::new(1.2, -0.5, 0.8),
    Vec3::new(-1.2, -0.5, -0.8),
    Vec3::new(1.2, -0.5, -0.8),
];

fn mesh(geometry: Geometry, material: Material) -> NodeKind {
    NodeKind::Mesh { geometry, material }
}

fn at(x: f32, y: f32, z: f32) -> Transform {
    Transform::from_position(Vec3::new(x, y, z))
}

/// Build the whole scene: environment, lights, ground, grid, obstacles,
/// trees and the vehicle placed at `vehicle`'s pose.
///
/// Tree placement draws from `rng`.
pub fn build_scene(
    textures: &TextureSet,
    rng: &mut impl Rng,
    vehicle: &VehicleState,
) -> Result<(SceneGraph, SceneHandles), SceneError> {
    let mut graph = SceneGraph::new();

    let follow_light = add_lights(&mut graph, vehicle.position);
    let (ground, grid) = add_ground(&mut graph, textures);
    add_obstacles(&mut graph);
    for _ in 0..TREE_COUNT {
        let x = rng.random::<f32>() * 2.0 * TREE_SPREAD - TREE_SPREAD;
        let z = rng.random::<f32>() * 2.0 * TREE_SPREAD - TREE_SPREAD;
        add_tree(&mut graph, Vec3::new(x, 0.0, z))?;
    }
    let rig = add_vehicle(&mut graph, vehicle)?;

    tracing::info!(nodes = graph.len(), "scene built");
    Ok((
        graph,
        SceneHandles {
            ground,
            grid,
            vehicle: rig,
            follow_light,
        },
    ))
}

fn add_lights(graph: &mut SceneGraph, vehicle_position: Vec3) -> FollowLight {
    graph.add(
        "ambient",
        NodeKind::Light(Light::Ambient {
            color: Color::hex(0x404040),
            intensity: 0.6,
        }),
        Transform::default(),
    );
    graph.add(
        "sun",
        NodeKind::Light(Light::Directional {
            color: Color::WHITE,
            intensity: 0.9,
            shadow: Some(ShadowCamera::default()),
        }),
        at(15.0, 25.0, 10.0),
    );
    let node = graph.add(
        "vehicle_light",
        NodeKind::Light(Light::Point {
            color: Color::hex(0xffaa00),
            intensity: 0.7,
            range: 30.0,
        }),
        Transform::from_position(vehicle_position + FOLLOW_LIGHT_OFFSET),
    );
    FollowLight {
        node,
        offset: FOLLOW_LIGHT_OFFSET,
    }
}

fn add_ground(graph: &mut SceneGraph, textures: &TextureSet) -> (NodeId, NodeId) {
    let ground = graph.add(
        "ground",
        mesh(
            Geometry::new(Shape::Plane {
                width: 200.0,
                depth: 200.0,
            }),
            Material::lambert(Color::hex(0x4a7c42))
                .with_map(TextureSlot::Ground, textures.ground.repeat)
                .with_shadows(false, true),
        ),
        at(0.0, -2.0, 0.0),
    );
    let grid = graph.add(
        "grid",
        mesh(
            Geometry::new(Shape::Grid {
                size: 200.0,
                divisions: 50,
                center_color: Color::BLACK,
                line_color: Color::hex(0x333333),
            }),
            Material::unlit(Color::WHITE),
        ),
        at(0.0, -1.95, 0.0),
    );
    (ground, grid)
}

fn add_obstacles(graph: &mut SceneGraph) {
    let material = Material::phong(Color::hex(0x8b4513), 30.0).with_shadows(true, true);
    graph.add(
        "crate",
        mesh(Geometry::cuboid(3.0, 3.0, 3.0), material),
        at(12.0, 1.5, 8.0),
    );
    graph.add(
        "pipe",
        mesh(Geometry::cylinder(1.2, 4.0, 10), material),
        at(-8.0, 2.0, -10.0),
    );
    graph.add(
        "cone",
        mesh(
            Geometry::cone(1.5, 3.0, 8),
            material.with_shadows(true, false),
        ),
        at(15.0, 1.5, -12.0),
    );
}

fn add_tree(graph: &mut SceneGraph, position: Vec3) -> Result<NodeId, SceneError> {
    let root = graph.add("tree", NodeKind::Group, Transform::from_position(position));
    graph.add_child(
        root,
        "trunk",
        mesh(
            Geometry::new(Shape::Cylinder {
                radius_top: 0.4,
                radius_bottom: 0.5,
                height: 2.5,
                segments: 8,
            }),
            Material::lambert(Color::hex(0x5d4037)).with_shadows(true, true),
        ),
        Transform::default(),
    )?;
    let crown = Material::lambert(Color::hex(0x2e7d32)).with_shadows(true, false);
    for (radius, offset) in [
        (2.0, at(0.0, 3.0, 0.0)),
        (1.8, at(0.5, 4.0, 0.5)),
        (1.5, at(-0.3, 4.5, -0.4)),
    ] {
        graph.add_child(root, "crown", mesh(Geometry::sphere(radius, 8), crown), offset)?;
    }
    Ok(root)
}

fn add_vehicle(graph: &mut SceneGraph, state: &VehicleState) -> Result<VehicleRig, SceneError> {
    let root = graph.add(
        "vehicle",
        NodeKind::Group,
        Transform::from_position(state.position)
            .with_rotation(Quat::from_rotation_y(state.heading)),
    );

    graph.add_child(
        root,
        "chassis",
        mesh(
            Geometry::cuboid(3.0, 1.0, 1.5),
            Material::phong(Color::WHITE, 120.0)
                .with_specular(Color::hex(0x333333))
                .with_map(TextureSlot::Body, [1.0, 1.0])
                .with_shadows(true, true),
        ),
        Transform::default(),
    )?;
    graph.add_child(
        root,
        "cabin",
        mesh(
            Geometry::cuboid(1.5, 0.8, 1.6),
            Material::phong(Color::hex(0x0a0a2a), 200.0)
                .with_specular(Color::hex(0x555555))
                .with_emissive(Color::hex(0x000033), 1.0)
                .with_opacity(0.6)
                .with_shadows(true, true),
        ),
        at(0.0, 0.9, 0.1),
    )?;

    let wheel_geometry = Geometry::cylinder(0.4, 0.3, 16).baked(Quat::from_rotation_z(FRAC_PI_2));
    let wheel_material = Material::lambert(Color::hex(0x111111))
        .with_map(TextureSlot::Tread, [1.0, 1.0])
        .with_shadows(true, false);
    let mut wheels = [root; 4];
    for (slot, offset) in wheels.iter_mut().zip(WHEEL_OFFSETS) {
        *slot = graph.add_child(
            root,
            "wheel",
            mesh(wheel_geometry, wheel_material),
            Transform::from_position(offset),
        )?;
    }

    let headlight = Material::phong(Color::hex(0xffffaa), 100.0)
        .with_emissive(Color::hex(0xffff44), 0.5);
    let taillight =
        Material::phong(Color::hex(0xff0000), 30.0).with_emissive(Color::hex(0xff3333), 0.3);
    for z in [0.5, -0.5] {
        graph.add_child(
            root,
            "headlight",
            mesh(Geometry::sphere(0.15, 12), headlight),
            at(-1.4, 0.2, z),
        )?;
    }
    for z in [0.5, -0.5] {
        graph.add_child(
            root,
            "taillight",
            mesh(Geometry::sphere(0.1, 12), taillight),
            at(1.4, 0.2, z),
        )?;
    }

    let trim = Material::phong(Color::WHITE, 80.0)
        .with_map(TextureSlot::Metal, [1.0, 1.0])
        .with_shadows(true, false);
    graph.add_child(
        root,
        "bumper",
        mesh(Geometry::cuboid(3.2, 0.2, 1.7), trim),
        at(0.0, -0.4, 0.0),
    )?;
    graph.add_child(
        root,
        "spoiler",
        mesh(Geometry::cuboid(0.5, 0.1, 1.2), trim),
        at(0.0, 1.1, -0.8),
    )?;
    graph.add_child(
        root,
        "exhaust",
        mesh(Geometry::cylinder(0.08, 0.5, 8), trim),
        at(1.5, 0.0, -0.6).with_rotation(Quat::from_rotation_z(FRAC_PI_2)),
    )?;

    Ok(VehicleRig { root, wheels })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Shading;
    use drivescape_kernel::{MotionParams, Simulation};
    use drivescape_textures::TextureSynth;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn build(seed: u64) -> (SceneGraph, SceneHandles) {
        let textures = TextureSynth::from_seed(seed).generate_all().unwrap();
        let mut rng = StdRng::seed_from_u64(seed);
        let vehicle = VehicleState::at_rest(MotionParams::default().spawn_position);
        build_scene(&textures, &mut rng, &vehicle).unwrap()
    }

    fn named<'a>(graph: &'a SceneGraph, name: &str) -> Vec<(NodeId, &'a crate::Node)> {
        graph.nodes().filter(|(_, n)| n.name == name).collect()
    }

    #[test]
    fn vehicle_hierarchy_is_complete() {
        let (graph, handles) = build(1);
        let root = graph.get(handles.vehicle.root).unwrap();
        assert_eq!(root.transform.position, Vec3::new(0.0, 2.0, 0.0));
        // chassis, cabin, 4 wheels, 2 headlights, 2 taillights, bumper, spoiler, exhaust
        assert_eq!(root.children.len(), 13);
        for wheel in handles.vehicle.wheels {
            assert_eq!(graph.get(wheel).unwrap().parent, Some(handles.vehicle.root));
        }
    }

    #[test]
    fn wheels_are_in_rig_order() {
        let (graph, handles) = build(1);
        let positions: Vec<_> = handles
            .vehicle
            .wheels
            .iter()
            .map(|w| graph.get(*w).unwrap().transform.position)
            .collect();
        assert_eq!(positions, WHEEL_OFFSETS.to_vec());
    }

    #[test]
    fn trees_stay_inside_the_spread() {
        let (graph, _) = build(5);
        let trees = named(&graph, "tree");
        assert_eq!(trees.len(), TREE_COUNT);
        for (_, tree) in trees {
            let p = tree.transform.position;
            assert!((-40.0..40.0).contains(&p.x) && (-40.0..40.0).contains(&p.z));
            assert_eq!(p.y, 0.0);
            assert_eq!(tree.children.len(), 4);
        }
    }

    #[test]
    fn seed_fixes_tree_layout() {
        let trees = |seed| {
            let (graph, _) = build(seed);
            named(&graph, "tree")
                .into_iter()
                .map(|(_, n)| n.transform.position)
                .collect::<Vec<_>>()
        };
        assert_eq!(trees(9), trees(9));
        assert_ne!(trees(9), trees(10));
    }

    #[test]
    fn ground_uses_tiled_texture() {
        let (graph, handles) = build(1);
        let ground = graph.get(handles.ground).unwrap();
        assert_eq!(ground.transform.position.y, -2.0);
        let NodeKind::Mesh { material, .. } = &ground.kind else {
            panic!("ground is not a mesh");
        };
        assert_eq!(material.map, Some(TextureSlot::Ground));
        assert_eq!(material.uv_repeat, [15.0, 15.0]);
    }

    #[test]
    fn cabin_is_translucent_phong() {
        let (graph, _) = build(1);
        let (_, cabin) = named(&graph, "cabin")[0];
        let NodeKind::Mesh { material, .. } = &cabin.kind else {
            panic!("cabin is not a mesh");
        };
        assert!(material.is_transparent());
        assert!(matches!(material.shading, Shading::Phong { shininess, .. } if shininess == 200.0));
    }

    #[test]
    fn shadow_flags_follow_the_part() {
        let (graph, _) = build(1);
        let flags = |name: &str| {
            let (_, node) = named(&graph, name)[0];
            let NodeKind::Mesh { material, .. } = &node.kind else {
                panic!("{name} is not a mesh");
            };
            (material.cast_shadow, material.receive_shadow)
        };
        assert_eq!(flags("ground"), (false, true));
        assert_eq!(flags("chassis"), (true, true));
        assert_eq!(flags("wheel"), (true, false));
        assert_eq!(flags("headlight"), (false, false));
        assert_eq!(flags("cone"), (true, false));
        assert_eq!(flags("crate"), (true, true));
        assert_eq!(flags("crown"), (true, false));
    }

    #[test]
    fn grid_toggles_without_touching_ground() {
        let (mut graph, handles) = build(1);
        assert!(!graph.toggle_visible(handles.grid).unwrap());
        assert!(graph.is_visible(handles.ground));
        assert!(!graph.visible_meshes().iter().any(|m| m.id == handles.grid));
    }

    #[test]
    fn rig_mirrors_simulation() {
        let (mut graph, handles) = build(1);
        let mut sim = Simulation::new(MotionParams::default());
        sim.steer(drivescape_input::MovementIntent {
            forward: true,
            turn_left: true,
            ..Default::default()
        });
        for _ in 0..10 {
            sim.advance(0.05);
        }
        let state = *sim.vehicle().unwrap();
        handles.vehicle.apply(&mut graph, &state).unwrap();
        handles.follow_light.track(&mut graph, state.position).unwrap();

        let root = graph.get(handles.vehicle.root).unwrap();
        assert_eq!(root.transform.position, state.position);
        assert!(
            root.transform
                .rotation
                .abs_diff_eq(Quat::from_rotation_y(state.heading), 1e-6)
        );
        let wheel = graph.get(handles.vehicle.wheels[2]).unwrap();
        assert!(
            wheel
                .transform
                .rotation
                .abs_diff_eq(Quat::from_rotation_x(state.wheel_spin[2]), 1e-6)
        );
        assert_eq!(wheel.transform.position, WHEEL_OFFSETS[2]);

        let light = graph.get(handles.follow_light.node).unwrap();
        assert_eq!(light.transform.position, state.position + Vec3::new(0.0, 3.0, 0.0));
    }

    #[test]
    fn lights_are_ambient_sun_and_follow() {
        let (graph, _) = build(1);
        let lights = graph.visible_lights();
        assert_eq!(lights.len(), 3);
        assert!(matches!(lights[0].light, Light::Ambient { .. }));
        assert!(matches!(
            lights[1].light,
            Light::Directional { shadow: Some(s), .. } if s.map_size == 2048
        ));
        assert!(matches!(lights[2].light, Light::Point { range, .. } if range == 30.0));
    }
}
