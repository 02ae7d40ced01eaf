use std::collections::HashMap;
use std::sync::Arc;

use ember_core::animation::{Animation, Bone, KeyframeTrack, NodeData};
use ember_core::math::Vec3;
use ember_core::resource::{MemorySource, ResourceCache};
use ember_ecs::components::*;
use ember_ecs::physics::OverlapPhysics;
use ember_ecs::systems::*;
use ember_ecs::{
    Ecs, Entity, FrameContext, GameState, GameStateMask, HierarchyError, RenderQueues,
    Script, ScriptContext, ScriptError, Scripts, SparseSet, System, SystemError, World,
};
use parking_lot::Mutex;

// ---------------------------------------------------------------------------
// Sparse set behaves like a map under arbitrary add/remove sequences
// ---------------------------------------------------------------------------

#[test]
fn sparse_set_matches_map_model() {
    let mut set = SparseSet::new();
    let mut model: HashMap<u32, u64> = HashMap::new();
    let mut seed: u64 = 0x2545_f491_4f6c_dd1d;

    for step in 0..5_000u64 {
        seed ^= seed << 13;
        seed ^= seed >> 7;
        seed ^= seed << 17;
        let id = (seed % 97) as u32;

        if seed % 3 == 0 {
            assert_eq!(set.remove(id), model.remove(&id), "step {step}");
        } else {
            set.set(id, step);
            model.insert(id, step);
        }

        assert_eq!(set.contains(id), model.contains_key(&id));
        assert_eq!(set.get(id), model.get(&id));
        assert_eq!(set.len(), model.len());
    }

    for id in 0..97 {
        assert_eq!(set.get(id), model.get(&id), "id {id}");
    }
}

// ---------------------------------------------------------------------------
// Membership and hooks
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Health(#[allow(dead_code)] f32);

#[derive(Default)]
struct Armor;

type HookLog = Arc<Mutex<Vec<(&'static str, Entity)>>>;

struct Watch<const N: usize> {
    log: HookLog,
    mask: GameStateMask,
    updated: Vec<Entity>,
}

impl<const N: usize> Watch<N> {
    fn new(log: &HookLog, mask: GameStateMask) -> Self {
        Self {
            log: Arc::clone(log),
            mask,
            updated: Vec::new(),
        }
    }
}

/// `Watch<0>` needs Health, `Watch<1>` needs Health and Armor.
impl System for Watch<0> {
    type Required = (Health,);

    fn state_mask(&self) -> GameStateMask {
        self.mask
    }

    fn on_deregister(&mut self, _world: &mut World, entity: Entity) {
        self.log.lock().push(("health", entity));
    }

    fn update(
        &mut self,
        _world: &mut World,
        entities: &[Entity],
        _frame: &FrameContext<'_>,
    ) -> Result<(), SystemError> {
        self.updated.extend_from_slice(entities);
        Ok(())
    }
}

impl System for Watch<1> {
    type Required = (Health, Armor);

    fn state_mask(&self) -> GameStateMask {
        self.mask
    }

    fn on_deregister(&mut self, _world: &mut World, entity: Entity) {
        self.log.lock().push(("armored", entity));
    }

    fn update(
        &mut self,
        _world: &mut World,
        entities: &[Entity],
        _frame: &FrameContext<'_>,
    ) -> Result<(), SystemError> {
        self.updated.extend_from_slice(entities);
        Ok(())
    }
}

#[test]
fn deletion_deregisters_once_per_matching_system() {
    let log = HookLog::default();
    let mut ecs = Ecs::new();
    ecs.add_system(Watch::<0>::new(&log, GameStateMask::RUNNING));
    ecs.add_system(Watch::<1>::new(&log, GameStateMask::RUNNING));

    let plain = ecs.create_entity("main");
    ecs.insert(plain, Health(1.0)).unwrap();
    let armored = ecs.create_entity("main");
    ecs.insert(armored, Health(2.0)).unwrap();
    ecs.insert(armored, Armor).unwrap();

    ecs.delete_entity(plain);
    ecs.delete_entity(armored);
    ecs.refresh();

    let log = log.lock();
    assert_eq!(
        *log,
        vec![("health", plain), ("health", armored), ("armored", armored)]
    );
}

#[test]
fn invoked_iff_signature_and_state_match() {
    let log = HookLog::default();
    let mut ecs = Ecs::new();
    ecs.add_system(Watch::<0>::new(&log, GameStateMask::RUNNING | GameStateMask::PAUSED));
    ecs.add_system(Watch::<1>::new(&log, GameStateMask::RUNNING));

    let plain = ecs.create_entity("main");
    ecs.insert(plain, Health(1.0)).unwrap();
    let armored = ecs.create_entity("main");
    ecs.insert(armored, Health(1.0)).unwrap();
    ecs.insert(armored, Armor).unwrap();
    let bare = ecs.create_entity("main");
    ecs.insert(bare, Armor).unwrap();

    for (index, state) in [GameState::Running, GameState::Paused, GameState::Stopped]
        .into_iter()
        .enumerate()
    {
        let frame = FrameContext::new("main", 0.1)
            .with_state(state)
            .with_frame_index(index as u64);
        ecs.run_frame(&frame);
    }

    let health = ecs.system::<Watch<0>>().unwrap();
    assert_eq!(health.updated, vec![plain, armored, plain, armored]);
    let armor = ecs.system::<Watch<1>>().unwrap();
    assert_eq!(armor.updated, vec![armored]);
}

// ---------------------------------------------------------------------------
// Hierarchy
// ---------------------------------------------------------------------------

#[test]
fn reparenting_under_a_descendant_is_rejected_untouched() {
    let mut world = World::new();
    let root = world.create_entity("h");
    let mid = world.create_entity("h");
    let leaf = world.create_entity("h");
    world.set_parent(mid, root);
    world.set_parent(leaf, mid);

    assert_eq!(
        world.try_set_parent(root, leaf),
        Err(HierarchyError::Cycle { child: root, parent: leaf })
    );
    assert_eq!(
        world.try_set_parent(mid, mid),
        Err(HierarchyError::SelfParent(mid))
    );

    assert_eq!(world.parent(root), None);
    assert_eq!(world.parent(mid), Some(root));
    assert_eq!(world.children(root), Some(&[mid][..]));
    assert_eq!(world.children(mid), Some(&[leaf][..]));
    assert!(world.children(leaf).is_none());
}

#[test]
#[should_panic(expected = "rejected re-parenting")]
fn set_parent_panics_on_cycle() {
    let mut world = World::new();
    let a = world.create_entity("h");
    let b = world.create_entity("h");
    world.set_parent(b, a);
    world.set_parent(a, b);
}

#[test]
fn deleted_ids_are_reused_with_new_generation() {
    let mut world = World::new();
    world.register_component::<Health>();
    let parent = world.create_entity("h");
    let child = world.create_entity("h");
    world.insert(child, Health(3.0)).unwrap();
    world.set_parent(child, parent);

    assert!(world.delete_entity(parent));
    assert!(!world.is_alive(child));
    assert_eq!(world.entity_count(), 0);

    let reborn = world.create_entity("h");
    assert!(reborn.index() == parent.index() || reborn.index() == child.index());
    assert_ne!(reborn, parent);
    assert_ne!(reborn, child);
    assert!(!world.has_component::<Health>(reborn));
    assert!(world.get_component::<Health>(child).is_none());
}

// ---------------------------------------------------------------------------
// Reflection
// ---------------------------------------------------------------------------

#[test]
fn reflection_reads_and_writes_fields_by_name() {
    let mut ecs = Ecs::new();
    let e = ecs.create_entity("main");
    ecs.insert(e, Light::point(Vec3::new(1.0, 0.5, 0.0), 3.0, 8.0))
        .unwrap();

    let light = ecs.world().reflect(e, "Light").unwrap();
    assert_eq!(light.get::<f32>("intensity"), Some(&3.0));
    assert_eq!(light.get::<Vec3>("color"), Some(&Vec3::new(1.0, 0.5, 0.0)));
    assert!(light.get::<f32>("missing").is_none());

    let light = ecs.world_mut().reflect_mut(e, "Light").unwrap();
    assert!(light.set("range", 12.0f32));
    assert_eq!(
        ecs.world().get_component::<Light>(e).map(|l| l.range),
        Some(12.0)
    );
}

// ---------------------------------------------------------------------------
// Full frame with every built-in system
// ---------------------------------------------------------------------------

struct Mover;

impl Script for Mover {
    fn update(&mut self, ctx: &mut ScriptContext<'_>) -> Result<(), ScriptError> {
        let dt = ctx.delta_time();
        let transform = ctx
            .get_mut::<Transform>()
            .ok_or_else(|| ScriptError::msg("mover needs a transform"))?;
        transform.local.position.x += dt;
        Ok(())
    }
}

fn walk_clip() -> Animation {
    Animation::new("walk", 10.0, 1.0)
        .with_bone(Bone::new("hip", 0).with_positions(KeyframeTrack::new(
            vec![0.0, 10.0],
            vec![Vec3::zeros(), Vec3::new(0.0, 10.0, 0.0)],
        )))
        .with_root(NodeData::new("hip"))
}

#[test]
fn builtin_systems_cooperate_in_one_frame() {
    let source = MemorySource::new();
    source.insert("walk.ani", walk_clip().encode());
    let cache = Arc::new(ResourceCache::with_source(source));

    let mut ecs = Ecs::new();
    ecs.add_system(TransformSystem);
    ecs.add_system(PhysicsSystem::new(OverlapPhysics::new()));
    ecs.add_system(ScriptSystem::new());
    ecs.add_system(AnimationSystem::new(Arc::clone(&cache)));
    ecs.add_system(RenderCollectSystem);

    let root = ecs.create_entity("main");
    ecs.insert(root, Transform::from_position(Vec3::new(0.0, 0.0, 5.0)))
        .unwrap();
    ecs.insert(root, Scripts::new().with(Mover)).unwrap();

    let hero = ecs.create_entity("main");
    ecs.insert(hero, Transform::default()).unwrap();
    ecs.insert(hero, MeshRenderer::new("hero-mesh")).unwrap();
    ecs.insert(hero, Animator::new("walk")).unwrap();
    ecs.set_parent(hero, root);

    for frame_index in 0..2 {
        let frame = FrameContext::new("main", 1.0).with_frame_index(frame_index);
        let stats = ecs.run_frame(&frame);
        assert_eq!(stats.systems_run, 5);
        assert_eq!(stats.errors, 0);
    }

    // Scripts ran before transforms of the next frame were derived.
    let hero_transform = ecs.world().get_component::<Transform>(hero).unwrap();
    assert!((hero_transform.world.position - Vec3::new(1.0, 0.0, 5.0)).norm() < 1e-5);

    let queues = ecs.world().resource::<RenderQueues>();
    assert_eq!(queues.draws.len(), 1);
    let draw = &queues.draws[0];
    assert_eq!(draw.entity, hero);
    let skin = queues.skin_of(draw).unwrap();
    assert!((skin.bone_matrices[0][(1, 3)] - 2.0).abs() < 1e-5);
    assert!(cache.contains("walk"));
}
