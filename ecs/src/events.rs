use crate::World;

/// Double-buffered event queue stored as a world resource.
///
/// Events sent during frame *n* stay readable through frame *n + 1* and are
/// dropped by the second [`update`](Events::update) after they were sent, so
/// a system running before the sender still sees them one frame later.
///
/// ```
/// use ember_ecs::{Events, World};
///
/// struct Explosion(u32);
///
/// let mut world = World::new();
/// world.add_event::<Explosion>();
/// world.resource_mut::<Events<Explosion>>().send(Explosion(3));
///
/// world.update_events();
/// assert_eq!(world.resource::<Events<Explosion>>().len(), 1);
/// world.update_events();
/// assert!(world.resource::<Events<Explosion>>().is_empty());
/// ```
pub struct Events<T: Send + Sync + 'static> {
    current: Vec<T>,
    previous: Vec<T>,
}

impl<T: Send + Sync + 'static> Events<T> {
    pub fn new() -> Self {
        Self {
            current: Vec::new(),
            previous: Vec::new(),
        }
    }

    /// Adds an event to the current frame's buffer.
    pub fn send(&mut self, event: T) {
        self.current.push(event);
    }

    pub fn send_batch(&mut self, events: impl IntoIterator<Item = T>) {
        self.current.extend(events);
    }

    /// Events from both buffers, previous frame first.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.previous.iter().chain(self.current.iter())
    }

    /// Only events sent since the last update.
    pub fn iter_current(&self) -> impl Iterator<Item = &T> {
        self.current.iter()
    }

    /// Drops last frame's events and moves the current buffer into their place.
    pub fn update(&mut self) {
        self.previous.clear();
        std::mem::swap(&mut self.current, &mut self.previous);
    }

    pub fn is_empty(&self) -> bool {
        self.current.is_empty() && self.previous.is_empty()
    }

    pub fn len(&self) -> usize {
        self.current.len() + self.previous.len()
    }

    pub fn clear(&mut self) {
        self.current.clear();
        self.previous.clear();
    }
}

impl<T: Send + Sync + 'static> Default for Events<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Buffer swap functions for every event type added to a world.
#[derive(Default)]
struct EventRegistry {
    updaters: Vec<(std::any::TypeId, fn(&mut World))>,
}

impl World {
    /// Inserts an empty [`Events<T>`] resource and registers it with
    /// [`update_events`](World::update_events). Adding the same type twice
    /// keeps the existing queue.
    pub fn add_event<T: Send + Sync + 'static>(&mut self) {
        if !self.has_resource::<Events<T>>() {
            self.insert_resource(Events::<T>::new());
        }
        if !self.has_resource::<EventRegistry>() {
            self.insert_resource(EventRegistry::default());
        }
        let registry = self.resource_mut::<EventRegistry>();
        let type_id = std::any::TypeId::of::<T>();
        if registry.updaters.iter().all(|(id, _)| *id != type_id) {
            registry.updaters.push((type_id, |world| {
                if let Some(events) = world.get_resource_mut::<Events<T>>() {
                    events.update();
                }
            }));
        }
    }

    /// Advances every registered event queue. Called once per frame after all
    /// systems ran.
    pub fn update_events(&mut self) {
        let Some(updaters) = self
            .get_resource::<EventRegistry>()
            .map(|registry| registry.updaters.iter().map(|(_, f)| *f).collect::<Vec<_>>())
        else {
            return;
        };
        for update in updaters {
            update(self);
        }
    }

    /// Drops every pending event of every registered type.
    pub fn clear_events(&mut self) {
        self.update_events();
        self.update_events();
    }
}
