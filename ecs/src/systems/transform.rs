use ember_core::math::Mat4;

use crate::components::{Transform, Transformation};
use crate::state::GameStateMask;
use crate::system::{FrameContext, System, SystemError};
use crate::{Entity, World};

/// World values handed down to children.
type Inherited = Option<(Transformation, Mat4)>;

/// Derives `Transform.world` and `world_matrix` from the hierarchy.
///
/// Every entity whose nearest transformed ancestor is missing starts a
/// depth-first walk, so parents are always computed before their children.
/// Children of an entity without a `Transform` inherit the transform of the
/// closest ancestor that has one.
#[derive(Debug, Default)]
pub struct TransformSystem;

impl TransformSystem {
    fn has_transformed_ancestor(world: &World, entity: Entity) -> bool {
        let mut current = world.parent(entity);
        while let Some(parent) = current {
            if world.has_component::<Transform>(parent) {
                return true;
            }
            current = world.parent(parent);
        }
        false
    }

    fn propagate_from(world: &mut World, root: Entity, stack: &mut Vec<(Entity, Inherited)>) {
        stack.push((root, None));
        while let Some((entity, parent)) = stack.pop() {
            let inherited = match world.get_component_mut::<Transform>(entity) {
                Some(transform) => {
                    transform.propagate(parent.as_ref().map(|(w, m)| (w, m)));
                    Some((transform.world, transform.world_matrix))
                }
                None => parent,
            };
            if let Some(children) = world.children(entity) {
                stack.extend(children.iter().rev().map(|&child| (child, inherited)));
            }
        }
    }
}

impl System for TransformSystem {
    type Required = (Transform,);

    fn state_mask(&self) -> GameStateMask {
        GameStateMask::ALL
    }

    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        _frame: &FrameContext<'_>,
    ) -> Result<(), SystemError> {
        let mut stack = Vec::new();
        for &entity in entities {
            if !world.is_alive(entity) || Self::has_transformed_ancestor(world, entity) {
                continue;
            }
            Self::propagate_from(world, entity, &mut stack);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Scheduler;
    use ember_core::math::Vec3;

    fn spawn(world: &mut World, x: f32) -> Entity {
        let e = world.create_entity("t");
        world.insert(e, Transform::from_position(Vec3::new(x, 0.0, 0.0))).unwrap();
        e
    }

    fn world_x(world: &World, e: Entity) -> f32 {
        world.get_component::<Transform>(e).unwrap().world.position.x
    }

    fn run(world: &mut World, scheduler: &mut Scheduler) {
        scheduler.run_frame(world, &FrameContext::new("t", 0.0));
    }

    #[test]
    fn chain_accumulates_positions() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, TransformSystem);

        let grandchild = spawn(&mut world, 1.0);
        let child = spawn(&mut world, 2.0);
        let root = spawn(&mut world, 4.0);
        world.set_parent(grandchild, child);
        world.set_parent(child, root);
        run(&mut world, &mut scheduler);

        assert_eq!(world_x(&world, root), 4.0);
        assert_eq!(world_x(&world, child), 6.0);
        assert_eq!(world_x(&world, grandchild), 7.0);
    }

    #[test]
    fn untransformed_parent_passes_through() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, TransformSystem);

        let root = spawn(&mut world, 3.0);
        let group = world.create_entity("t");
        let leaf = spawn(&mut world, 1.0);
        world.set_parent(group, root);
        world.set_parent(leaf, group);
        run(&mut world, &mut scheduler);

        assert_eq!(world_x(&world, leaf), 4.0);
    }

    #[test]
    fn reparenting_is_picked_up_next_frame() {
        let mut world = World::new();
        let mut scheduler = Scheduler::new();
        scheduler.add_system(&mut world, TransformSystem);

        let a = spawn(&mut world, 10.0);
        let b = spawn(&mut world, 20.0);
        let leaf = spawn(&mut world, 1.0);
        world.set_parent(leaf, a);
        run(&mut world, &mut scheduler);
        assert_eq!(world_x(&world, leaf), 11.0);

        world.set_parent(leaf, b);
        run(&mut world, &mut scheduler);
        assert_eq!(world_x(&world, leaf), 21.0);

        world.remove_parent(leaf);
        run(&mut world, &mut scheduler);
        assert_eq!(world_x(&world, leaf), 1.0);
    }
}
