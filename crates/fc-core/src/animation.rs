//! Declarative tweens for cosmetic transitions
//!
//! Tweens are pure: they only produce values. Adapters read those values when
//! painting, so a missing or cancelled animation never affects store state.

use std::f32::consts::PI;
use std::time::Duration;

use ahash::AHashMap;

use crate::model::FloatId;
use crate::{CoreError, CoreResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Easing {
    #[default]
    Linear,
    EaseInOutSine,
    EaseOutQuad,
}

impl Easing {
    /// Map linear progress in [0, 1] onto the eased curve
    pub fn apply(self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            Easing::Linear => t,
            Easing::EaseInOutSine => -((PI * t).cos() - 1.0) / 2.0,
            Easing::EaseOutQuad => 1.0 - (1.0 - t) * (1.0 - t),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Repeat {
    #[default]
    Once,
    Loop,
    /// Run forward then backward forever
    PingPong,
}

/// Animated visual property of a primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Property {
    Scale,
    Opacity,
    Rotation,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Tween {
    pub from: f32,
    pub to: f32,
    pub duration: Duration,
    pub easing: Easing,
    pub repeat: Repeat,
    elapsed: Duration,
}

impl Tween {
    pub fn new(from: f32, to: f32, duration: Duration) -> Self {
        Self {
            from,
            to,
            duration,
            easing: Easing::default(),
            repeat: Repeat::default(),
            elapsed: Duration::ZERO,
        }
    }

    pub fn with_easing(mut self, easing: Easing) -> Self {
        self.easing = easing;
        self
    }

    pub fn with_repeat(mut self, repeat: Repeat) -> Self {
        self.repeat = repeat;
        self
    }

    pub fn advance(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    pub fn is_finished(&self) -> bool {
        self.repeat == Repeat::Once && self.elapsed >= self.duration
    }

    /// Linear progress through the current cycle
    fn progress(&self) -> f32 {
        if self.duration.is_zero() {
            return 1.0;
        }
        let cycle = self.duration.as_secs_f32();
        let elapsed = self.elapsed.as_secs_f32();
        match self.repeat {
            Repeat::Once => (elapsed / cycle).min(1.0),
            Repeat::Loop => (elapsed % cycle) / cycle,
            Repeat::PingPong => {
                let phase = (elapsed % (2.0 * cycle)) / cycle;
                if phase <= 1.0 { phase } else { 2.0 - phase }
            }
        }
    }

    pub fn value(&self) -> f32 {
        let t = self.easing.apply(self.progress());
        self.from + (self.to - self.from) * t
    }
}

/// Running tweens keyed by primitive id and property
#[derive(Debug, Default)]
pub struct Animator {
    tweens: AHashMap<(FloatId, Property), Tween>,
}

impl Animator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) a tween on `target`'s `property`
    pub fn animate(&mut self, target: &str, property: Property, tween: Tween) -> CoreResult<()> {
        if !tween.from.is_finite() || !tween.to.is_finite() {
            return Err(CoreError::invalid(format!(
                "tween endpoints for '{target}' must be finite"
            )));
        }
        self.tweens.insert((target.to_string(), property), tween);
        Ok(())
    }

    /// Advance every tween and drop the finished ones
    pub fn tick(&mut self, dt: Duration) {
        for tween in self.tweens.values_mut() {
            tween.advance(dt);
        }
        self.tweens.retain(|_, tween| !tween.is_finished());
    }

    /// Current value, or `None` when nothing is animating that property
    pub fn value(&self, target: &str, property: Property) -> Option<f32> {
        self.tweens
            .get(&(target.to_string(), property))
            .map(Tween::value)
    }

    pub fn is_animating(&self, target: &str) -> bool {
        self.tweens.keys().any(|(id, _)| id == target)
    }

    pub fn cancel_target(&mut self, target: &str) {
        self.tweens.retain(|(id, _), _| id != target);
    }

    pub fn clear(&mut self) {
        self.tweens.clear();
    }

    pub fn len(&self) -> usize {
        self.tweens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tweens.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn test_easing_endpoints() {
        for easing in [Easing::Linear, Easing::EaseInOutSine, Easing::EaseOutQuad] {
            assert!(easing.apply(0.0).abs() < 1e-6);
            assert!((easing.apply(1.0) - 1.0).abs() < 1e-6);
        }
        assert!(Easing::EaseOutQuad.apply(0.5) > 0.5);
    }

    #[test]
    fn test_once_tween_finishes() {
        let mut tween = Tween::new(1.0, 2.0, ms(100));
        tween.advance(ms(50));
        assert!((tween.value() - 1.5).abs() < 1e-4);
        assert!(!tween.is_finished());
        tween.advance(ms(60));
        assert_eq!(tween.value(), 2.0);
        assert!(tween.is_finished());
    }

    #[test]
    fn test_zero_duration_completes_immediately() {
        let tween = Tween::new(0.0, 5.0, Duration::ZERO);
        assert_eq!(tween.value(), 5.0);
        assert!(tween.is_finished());
    }

    #[test]
    fn test_ping_pong_returns() {
        let mut tween = Tween::new(0.0, 1.0, ms(100)).with_repeat(Repeat::PingPong);
        tween.advance(ms(150));
        assert!((tween.value() - 0.5).abs() < 1e-4);
        tween.advance(ms(1000));
        assert!(!tween.is_finished());
    }

    #[test]
    fn test_animator_lifecycle() {
        let mut animator = Animator::new();
        animator.animate("f1", Property::Scale, Tween::new(1.0, 1.5, ms(100))).unwrap();
        animator
            .animate("f2", Property::Opacity, Tween::new(0.0, 1.0, ms(100)).with_repeat(Repeat::Loop))
            .unwrap();
        assert_eq!(animator.len(), 2);

        animator.tick(ms(200));
        assert_eq!(animator.value("f1", Property::Scale), None);
        assert!(animator.is_animating("f2"));

        animator.cancel_target("f2");
        assert!(animator.is_empty());
    }

    #[test]
    fn test_non_finite_endpoints_are_rejected() {
        let mut animator = Animator::new();
        let result = animator.animate("f1", Property::Scale, Tween::new(f32::NAN, 1.0, ms(10)));
        assert!(matches!(result, Err(CoreError::InvalidInput(_))));
        assert!(animator.is_empty());
    }
}
