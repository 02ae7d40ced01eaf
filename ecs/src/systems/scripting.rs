use crate::script::{ScriptContext, Scripts};
use crate::system::{FrameContext, System, SystemError};
use crate::{Entity, World};

/// Runs the [`Scripts`] of every member entity, in attachment order.
///
/// Each script gets `start` before its first `update`. A script that
/// returns an error or panics is logged and skipped for the rest of the
/// frame; the other scripts and systems carry on.
#[derive(Debug, Default)]
pub struct ScriptSystem {
    faults: u64,
}

impl ScriptSystem {
    pub fn new() -> Self {
        Self::default()
    }

    /// Script failures since the system was created.
    pub fn fault_count(&self) -> u64 {
        self.faults
    }
}

impl System for ScriptSystem {
    type Required = (Scripts,);

    fn update(
        &mut self,
        world: &mut World,
        entities: &[Entity],
        frame: &FrameContext<'_>,
    ) -> Result<(), SystemError> {
        for &entity in entities {
            // Slots leave the world while they run so scripts get `&mut World`.
            let Some(scripts) = world.get_component_mut::<Scripts>(entity) else {
                continue;
            };
            let mut slots = std::mem::take(&mut scripts.slots);

            for slot in &mut slots {
                let mut ctx = ScriptContext {
                    world: &mut *world,
                    entity,
                    frame: *frame,
                };
                if let Err(err) = slot.run(&mut ctx) {
                    self.faults += 1;
                    log::error!(
                        "script {} on {entity} failed in frame {}: {err}",
                        slot.name(),
                        frame.frame_index
                    );
                }
                if !world.is_alive(entity) {
                    break;
                }
            }

            // Scripts attached while running go after the existing ones.
            if let Some(scripts) = world.get_component_mut::<Scripts>(entity) {
                let attached = std::mem::replace(&mut scripts.slots, slots);
                scripts.slots.extend(attached);
            }
        }
        Ok(())
    }
}
