//! Pointer-drag to normalized region conversion.

use tracing::debug;

use redact_models::{NormalizedRegion, SurfacePoint};

/// Selector gesture state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum SelectorState {
    #[default]
    Idle,
    Dragging {
        anchor: SurfacePoint,
        region: NormalizedRegion,
    },
    Confirmed {
        region: NormalizedRegion,
    },
}

/// Permission to classify one confirmed region.
///
/// Issued once per confirmation. A reply is only applied while the
/// selector's generation still matches.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClassificationTicket {
    pub generation: u64,
    pub region: NormalizedRegion,
}

/// Converts drag events over a bounded surface into a confirmed region.
#[derive(Debug, Clone)]
pub struct RegionSelector {
    state: SelectorState,
    min_size: f64,
    generation: u64,
    classifying: bool,
}

impl RegionSelector {
    pub fn new(min_size: f64) -> Self {
        Self {
            state: SelectorState::Idle,
            min_size: min_size.max(0.0),
            generation: 0,
            classifying: false,
        }
    }

    pub fn state(&self) -> SelectorState {
        self.state
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn min_size(&self) -> f64 {
        self.min_size
    }

    pub fn is_classifying(&self) -> bool {
        self.classifying
    }

    /// The confirmed region, if any.
    pub fn region(&self) -> Option<NormalizedRegion> {
        match self.state {
            SelectorState::Confirmed { region } => Some(region),
            _ => None,
        }
    }

    /// Begin a drag at `point`. Ignored once a region is confirmed.
    pub fn pointer_down(&mut self, point: SurfacePoint) -> bool {
        if matches!(self.state, SelectorState::Confirmed { .. }) || self.classifying {
            return false;
        }
        self.state = SelectorState::Dragging {
            anchor: point,
            region: NormalizedRegion::from_corners(point, point),
        };
        true
    }

    /// Recompute the bounding box of anchor and `point`.
    ///
    /// No-op unless a drag is in progress.
    pub fn pointer_move(&mut self, point: SurfacePoint) -> Option<NormalizedRegion> {
        if self.classifying {
            return None;
        }
        match self.state {
            SelectorState::Dragging { anchor, .. } => {
                let region = NormalizedRegion::from_corners(anchor, point);
                self.state = SelectorState::Dragging { anchor, region };
                Some(region)
            }
            _ => None,
        }
    }

    /// Finish the gesture.
    ///
    /// Returns a ticket when the region exceeds the minimum size on both
    /// axes. Smaller drags are discarded and the selector returns to idle.
    pub fn pointer_up(&mut self) -> Option<ClassificationTicket> {
        let SelectorState::Dragging { region, .. } = self.state else {
            return None;
        };

        if !region.exceeds(self.min_size) {
            debug!(
                width = region.width,
                height = region.height,
                min_size = self.min_size,
                "Discarding region below minimum size"
            );
            self.state = SelectorState::Idle;
            return None;
        }

        self.state = SelectorState::Confirmed { region };
        self.classifying = true;
        Some(ClassificationTicket {
            generation: self.generation,
            region,
        })
    }

    /// Clear the region and supersede any outstanding classification.
    pub fn reset(&mut self) {
        self.state = SelectorState::Idle;
        self.classifying = false;
        self.generation += 1;
    }

    pub fn is_current(&self, ticket: &ClassificationTicket) -> bool {
        ticket.generation == self.generation && self.region() == Some(ticket.region)
    }

    /// Mark the ticket's classification as settled.
    ///
    /// Returns false for a superseded ticket, whose reply must be discarded.
    pub fn finish_classification(&mut self, ticket: &ClassificationTicket) -> bool {
        if !self.is_current(ticket) {
            debug!(
                ticket_generation = ticket.generation,
                current_generation = self.generation,
                "Dropping superseded classification"
            );
            return false;
        }
        self.classifying = false;
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drag(selector: &mut RegionSelector, from: (f64, f64), to: (f64, f64)) -> Option<ClassificationTicket> {
        selector.pointer_down(SurfacePoint::new(from.0, from.1));
        selector.pointer_move(SurfacePoint::new(to.0, to.1));
        selector.pointer_up()
    }

    #[test]
    fn test_small_drags_are_discarded() {
        let mut selector = RegionSelector::new(1.0);
        for (from, to) in [
            ((10.0, 10.0), (10.5, 40.0)),
            ((10.0, 10.0), (40.0, 10.9)),
            ((10.0, 10.0), (11.0, 11.0)),
            ((50.0, 50.0), (50.0, 50.0)),
        ] {
            assert!(drag(&mut selector, from, to).is_none());
            assert_eq!(selector.state(), SelectorState::Idle);
            assert!(!selector.is_classifying());
        }
    }

    #[test]
    fn test_drag_direction_is_irrelevant() {
        let mut forward = RegionSelector::new(1.0);
        let mut backward = RegionSelector::new(1.0);
        let a = drag(&mut forward, (10.0, 20.0), (40.0, 60.0)).unwrap();
        let b = drag(&mut backward, (40.0, 60.0), (10.0, 20.0)).unwrap();

        assert_eq!(a.region, b.region);
        assert_eq!(a.region, NormalizedRegion::new(20.0, 10.0, 30.0, 40.0));
    }

    #[test]
    fn test_confirmed_region_is_immutable() {
        let mut selector = RegionSelector::new(1.0);
        let ticket = drag(&mut selector, (10.0, 10.0), (30.0, 30.0)).unwrap();

        assert!(!selector.pointer_down(SurfacePoint::new(0.0, 0.0)));
        assert!(selector.pointer_move(SurfacePoint::new(90.0, 90.0)).is_none());
        assert!(selector.pointer_up().is_none());
        assert_eq!(selector.region(), Some(ticket.region));
    }

    #[test]
    fn test_ticket_issued_once_per_confirmation() {
        let mut selector = RegionSelector::new(1.0);
        assert!(drag(&mut selector, (10.0, 10.0), (30.0, 30.0)).is_some());
        assert!(selector.pointer_up().is_none());
    }

    #[test]
    fn test_reset_supersedes_in_flight_classification() {
        let mut selector = RegionSelector::new(1.0);
        let stale = drag(&mut selector, (10.0, 10.0), (30.0, 30.0)).unwrap();
        selector.reset();

        let fresh = drag(&mut selector, (10.0, 10.0), (30.0, 30.0)).unwrap();
        assert!(!selector.finish_classification(&stale));
        assert!(selector.is_classifying());
        assert!(selector.finish_classification(&fresh));
        assert!(!selector.is_classifying());
    }

    #[test]
    fn test_threshold_is_strict() {
        let mut selector = RegionSelector::new(0.5);
        assert!(drag(&mut selector, (0.0, 0.0), (0.5, 0.5)).is_none());
        assert!(drag(&mut selector, (0.0, 0.0), (0.6, 0.6)).is_some());
    }
}
