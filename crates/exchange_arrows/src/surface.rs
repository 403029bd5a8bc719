use log::debug;
use std::{cell::RefCell, collections::HashMap, rc::Rc};

/// Handle of one attached wheel listener
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// The drawing surface an arrow is mounted on. Arrows swallow wheel events
/// so scrolling over them does not zoom the map.
pub trait Surface {
    fn attach_wheel_suppression(&mut self, element: &str) -> ListenerId;
    fn detach_wheel_suppression(&mut self, listener: ListenerId);
}

pub type SharedSurface<S> = Rc<RefCell<S>>;

/// Keeps a wheel listener attached for as long as it lives
#[derive(Debug)]
pub struct WheelGuard<S: Surface> {
    surface: SharedSurface<S>,
    listener: ListenerId,
}

impl<S: Surface> WheelGuard<S> {
    pub fn attach(surface: &SharedSurface<S>, element: &str) -> Self {
        let listener = surface.borrow_mut().attach_wheel_suppression(element);
        debug!("wheel listener {:?} attached to {}", listener, element);
        Self {
            surface: Rc::clone(surface),
            listener,
        }
    }

    pub fn listener(&self) -> ListenerId {
        self.listener
    }
}

impl<S: Surface> Drop for WheelGuard<S> {
    fn drop(&mut self) {
        self.surface
            .borrow_mut()
            .detach_wheel_suppression(self.listener);
        debug!("wheel listener {:?} detached", self.listener);
    }
}

/// In-memory surface that only tracks which listeners are live
#[derive(Debug, Default)]
pub struct RecordingSurface {
    next_id: u64,
    live: HashMap<ListenerId, String>,
    attached_total: u64,
    detached_total: u64,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared() -> SharedSurface<Self> {
        Rc::new(RefCell::new(Self::new()))
    }

    pub fn live_count(&self) -> usize {
        self.live.len()
    }

    pub fn is_live(&self, element: &str) -> bool {
        self.live.values().any(|e| e == element)
    }

    pub fn attached_total(&self) -> u64 {
        self.attached_total
    }

    pub fn detached_total(&self) -> u64 {
        self.detached_total
    }
}

impl Surface for RecordingSurface {
    fn attach_wheel_suppression(&mut self, element: &str) -> ListenerId {
        let id = ListenerId(self.next_id);
        self.next_id += 1;
        self.live.insert(id, element.to_string());
        self.attached_total += 1;
        id
    }

    fn detach_wheel_suppression(&mut self, listener: ListenerId) {
        if self.live.remove(&listener).is_some() {
            self.detached_total += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_guard_detaches_on_drop() {
        let surface = RecordingSurface::shared();
        {
            let guard = WheelGuard::attach(&surface, "DE->FR");
            assert_eq!(guard.listener(), ListenerId(0));
            assert!(surface.borrow().is_live("DE->FR"));
        }
        let s = surface.borrow();
        assert_eq!(s.live_count(), 0);
        assert_eq!(s.attached_total(), 1);
        assert_eq!(s.detached_total(), 1);
    }

    #[test]
    fn test_listener_ids_are_unique() {
        let surface = RecordingSurface::shared();
        let a = WheelGuard::attach(&surface, "A->B");
        let b = WheelGuard::attach(&surface, "B->C");
        assert_ne!(a.listener(), b.listener());
        assert_eq!(surface.borrow().live_count(), 2);
        drop(a);
        assert!(!surface.borrow().is_live("A->B"));
        assert!(surface.borrow().is_live("B->C"));
    }
}
