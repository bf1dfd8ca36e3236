//! Outbound parry notifications.
//!
//! Gameplay code reports through `ParryObserver`; the ECS implementation turns
//! each call into a `ParryFeedback` message that presentation systems read.

use bevy::prelude::*;

pub trait ParryObserver {
    /// Fill ratio in `[0, 1]`; 0 means nothing is incoming.
    fn on_warning(&mut self, fill: f32);
    fn on_parry_active(&mut self);
    fn on_parry_success(&mut self, perfect: bool);
    fn on_parry_failed(&mut self);
}

#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub enum ParryFeedback {
    Warning { defender: Entity, fill: f32 },
    Active { defender: Entity },
    Success { defender: Entity, perfect: bool },
    Failed { defender: Entity },
}

impl ParryFeedback {
    pub fn defender(&self) -> Entity {
        match *self {
            ParryFeedback::Warning { defender, .. }
            | ParryFeedback::Active { defender }
            | ParryFeedback::Success { defender, .. }
            | ParryFeedback::Failed { defender } => defender,
        }
    }
}

/// Observer bound to one defender, writing into the feedback message queue.
pub struct FeedbackWriter<'a, 'w> {
    pub defender: Entity,
    pub writer: &'a mut MessageWriter<'w, ParryFeedback>,
}

impl ParryObserver for FeedbackWriter<'_, '_> {
    fn on_warning(&mut self, fill: f32) {
        self.writer.write(ParryFeedback::Warning { defender: self.defender, fill });
    }

    fn on_parry_active(&mut self) {
        self.writer.write(ParryFeedback::Active { defender: self.defender });
    }

    fn on_parry_success(&mut self, perfect: bool) {
        self.writer.write(ParryFeedback::Success { defender: self.defender, perfect });
    }

    fn on_parry_failed(&mut self) {
        self.writer.write(ParryFeedback::Failed { defender: self.defender });
    }
}
