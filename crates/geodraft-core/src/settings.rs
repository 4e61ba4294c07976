//! Snap settings owned by the editor, with an explicit observer list.
//!
//! Observers are registered with [`SnapSettings::subscribe`] and stay
//! registered until [`SnapSettings::unsubscribe`] is called with the returned
//! id. Notifications are delivered synchronously, in subscription order.

use crate::snap::{AssistTarget, DEFAULT_ASSIST_THRESHOLD, GridMode, SnapContext};
use std::fmt;

/// Handle returned by [`SnapSettings::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

/// A change delivered to observers.
#[derive(Debug, Clone, PartialEq)]
pub enum SnapSettingsEvent {
    GridMode(GridMode),
    Assist(Option<AssistTarget>),
    Threshold(f64),
}

type Observer = Box<dyn FnMut(&SnapSettingsEvent)>;

/// Grid mode, active assist target and threshold.
pub struct SnapSettings {
    grid_mode: GridMode,
    assist: Option<AssistTarget>,
    threshold: f64,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
}

impl fmt::Debug for SnapSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapSettings")
            .field("grid_mode", &self.grid_mode)
            .field("assist", &self.assist)
            .field("threshold", &self.threshold)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl Default for SnapSettings {
    fn default() -> Self {
        Self::new(GridMode::Off, DEFAULT_ASSIST_THRESHOLD)
    }
}

impl SnapSettings {
    pub fn new(grid_mode: GridMode, threshold: f64) -> Self {
        Self {
            grid_mode,
            assist: None,
            threshold,
            observers: Vec::new(),
            next_subscription: 1,
        }
    }

    pub fn grid_mode(&self) -> GridMode {
        self.grid_mode
    }

    pub fn assist(&self) -> Option<&AssistTarget> {
        self.assist.as_ref()
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Borrow the settings as a snap context.
    pub fn context(&self) -> SnapContext<'_> {
        SnapContext {
            grid: self.grid_mode,
            assist: self.assist.as_ref(),
            threshold: self.threshold,
        }
    }

    /// Set the grid mode. Observers are only notified on an actual change.
    pub fn set_grid_mode(&mut self, mode: GridMode) {
        if self.grid_mode == mode {
            return;
        }
        self.grid_mode = mode;
        log::debug!("Grid mode set to {}", mode.name());
        self.notify(SnapSettingsEvent::GridMode(mode));
    }

    /// Cycle to the next grid mode.
    pub fn cycle_grid_mode(&mut self) {
        self.set_grid_mode(self.grid_mode.next());
    }

    /// Replace the active assist target (`None` disables assist snapping).
    pub fn set_assist(&mut self, target: Option<AssistTarget>) {
        if self.assist == target {
            return;
        }
        self.assist = target.clone();
        self.notify(SnapSettingsEvent::Assist(target));
    }

    pub fn set_threshold(&mut self, threshold: f64) {
        if self.threshold == threshold || !threshold.is_finite() || threshold < 0.0 {
            return;
        }
        self.threshold = threshold;
        self.notify(SnapSettingsEvent::Threshold(threshold));
    }

    /// Register an observer.
    pub fn subscribe(
        &mut self,
        observer: impl FnMut(&SnapSettingsEvent) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.observers.push((id, Box::new(observer)));
        id
    }

    /// Remove an observer. Returns false if the id was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(sub, _)| *sub != id);
        self.observers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.observers.len()
    }

    fn notify(&mut self, event: SnapSettingsEvent) {
        for (_, observer) in &mut self.observers {
            observer(&event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snap::Axis;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_observer_receives_changes() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut settings = SnapSettings::default();
        let sink = Rc::clone(&seen);
        settings.subscribe(move |e| sink.borrow_mut().push(e.clone()));

        settings.set_grid_mode(GridMode::Edge);
        settings.set_grid_mode(GridMode::Edge);
        settings.set_threshold(1.0);

        assert_eq!(
            *seen.borrow(),
            vec![SnapSettingsEvent::GridMode(GridMode::Edge), SnapSettingsEvent::Threshold(1.0)]
        );
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let count = Rc::new(RefCell::new(0));
        let mut settings = SnapSettings::default();
        let sink = Rc::clone(&count);
        let id = settings.subscribe(move |_| *sink.borrow_mut() += 1);

        settings.cycle_grid_mode();
        assert!(settings.unsubscribe(id));
        assert!(!settings.unsubscribe(id));
        settings.cycle_grid_mode();

        assert_eq!(*count.borrow(), 1);
        assert_eq!(settings.subscriber_count(), 0);
    }

    #[test]
    fn test_context_reflects_settings() {
        let mut settings = SnapSettings::new(GridMode::Auto, 0.25);
        settings.set_assist(Some(AssistTarget::Line { axis: Axis::X, value: 1.0 }));
        let ctx = settings.context();
        assert_eq!(ctx.grid, GridMode::Auto);
        assert_eq!(ctx.threshold, 0.25);
        assert!(ctx.assist.is_some());
    }
}
