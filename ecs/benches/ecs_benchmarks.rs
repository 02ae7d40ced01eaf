use criterion::{BatchSize, Criterion, black_box, criterion_group, criterion_main};

use ember_ecs::{Entity, FrameContext, Scheduler, SparseSet, System, SystemError, World};

#[derive(Clone, Copy, Default)]
struct Position {
    x: f32,
    y: f32,
    z: f32,
}

#[derive(Clone, Copy, Default)]
struct Velocity {
    x: f32,
    y: f32,
    z: f32,
}

struct Movement;

impl System for Movement {
    type Required = (Position, Velocity);

    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        frame: &FrameContext<'_>,
    ) -> Result<(), SystemError> {
        for &e in entities {
            let Some(v) = world.get_component::<Velocity>(e).copied() else {
                continue;
            };
            if let Some(p) = world.get_component_mut::<Position>(e) {
                p.x += v.x * frame.delta_time;
                p.y += v.y * frame.delta_time;
                p.z += v.z * frame.delta_time;
            }
        }
        Ok(())
    }
}

fn populated(count: u32) -> (World, Vec<Entity>) {
    let mut world = World::new();
    world.register_component::<Position>();
    world.register_component::<Velocity>();
    let entities = world.create_entities("bench", count);
    for &e in &entities {
        world.insert(e, Position::default()).unwrap();
        world
            .insert(e, Velocity { x: 1.0, y: 0.5, z: 0.0 })
            .unwrap();
    }
    (world, entities)
}

// ---------------------------------------------------------------------------
// Sparse set
// ---------------------------------------------------------------------------

fn bench_sparse_set_insert_10k(c: &mut Criterion) {
    c.bench_function("sparse_set_insert_10k", |b| {
        b.iter(|| {
            let mut set = SparseSet::new();
            for i in 0..10_000u32 {
                set.set(i, Position { x: i as f32, ..Default::default() });
            }
            black_box(set.len())
        });
    });
}

fn bench_sparse_set_swap_remove_10k(c: &mut Criterion) {
    c.bench_function("sparse_set_swap_remove_10k", |b| {
        b.iter_batched(
            || {
                let mut set = SparseSet::new();
                for i in 0..10_000u32 {
                    set.set(i, i);
                }
                set
            },
            |mut set| {
                for i in (0..10_000u32).step_by(2) {
                    black_box(set.remove(i));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_sparse_set_dense_iter_10k(c: &mut Criterion) {
    let mut set = SparseSet::new();
    for i in 0..10_000u32 {
        set.set(i, Position { x: i as f32, ..Default::default() });
    }
    c.bench_function("sparse_set_dense_iter_10k", |b| {
        b.iter(|| black_box(set.data().iter().map(|p| p.x).sum::<f32>()));
    });
}

// ---------------------------------------------------------------------------
// Entity churn
// ---------------------------------------------------------------------------

fn bench_create_entities_10k(c: &mut Criterion) {
    c.bench_function("create_entities_10k", |b| {
        b.iter_batched(
            World::new,
            |mut world| {
                for _ in 0..10_000 {
                    black_box(world.create_entity("bench"));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_delete_and_recycle_1k(c: &mut Criterion) {
    c.bench_function("delete_recycle_1k", |b| {
        b.iter_batched(
            || populated(1_000),
            |(mut world, entities)| {
                for e in entities {
                    world.delete_entity(e);
                }
                for _ in 0..1_000 {
                    black_box(world.create_entity("bench"));
                }
            },
            BatchSize::SmallInput,
        );
    });
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

fn bench_membership_refresh_10k(c: &mut Criterion) {
    c.bench_function("membership_refresh_10k", |b| {
        b.iter_batched(
            || {
                let mut world = World::new();
                let mut scheduler = Scheduler::new();
                scheduler.add_system(&mut world, Movement);
                let entities = world.create_entities("bench", 10_000);
                for &e in &entities {
                    world.insert(e, Position::default()).unwrap();
                    world.insert(e, Velocity::default()).unwrap();
                }
                (world, scheduler)
            },
            |(mut world, mut scheduler)| {
                scheduler.refresh(&mut world);
                black_box(scheduler.members::<Movement>().map(<[_]>::len))
            },
            BatchSize::SmallInput,
        );
    });
}

fn bench_run_frame_10k(c: &mut Criterion) {
    let (mut world, _) = populated(10_000);
    let mut scheduler = Scheduler::new();
    scheduler.add_system(&mut world, Movement);
    let frame = FrameContext::new("bench", 1.0 / 60.0);

    c.bench_function("run_frame_movement_10k", |b| {
        b.iter(|| black_box(scheduler.run_frame(&mut world, &frame)));
    });
}

criterion_group!(
    sparse_set_benches,
    bench_sparse_set_insert_10k,
    bench_sparse_set_swap_remove_10k,
    bench_sparse_set_dense_iter_10k,
);

criterion_group!(
    churn_benches,
    bench_create_entities_10k,
    bench_delete_and_recycle_1k,
);

criterion_group!(
    schedule_benches,
    bench_membership_refresh_10k,
    bench_run_frame_10k,
);

criterion_main!(sparse_set_benches, churn_benches, schedule_benches);
