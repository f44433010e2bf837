use chrono::Timelike;

use crate::models::{DeliveryCondition, MinuteWindow, NotificationChannel};

/// 判断渠道在当前时间是否应该发送
pub fn should_fire<T: Timelike>(channel: &NotificationChannel, now: &T) -> bool {
    evaluate(&channel.condition, now)
}

pub fn evaluate<T: Timelike>(condition: &DeliveryCondition, now: &T) -> bool {
    match condition {
        DeliveryCondition::Always => true,
        DeliveryCondition::Never => false,
        DeliveryCondition::TimeWindow { hour_min, windows } => {
            let minute = now.minute();
            now.hour() >= *hour_min && windows.iter().any(|w| w.contains(minute))
        }
    }
}

impl MinuteWindow {
    /// Both bounds exclusive.
    pub fn contains(&self, minute: u32) -> bool {
        minute > self.0 && minute < self.1
    }
}
