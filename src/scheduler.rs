use std::time::Duration;

pub const MIN_INTERVAL_MINUTES: u32 = 1;
pub const MAX_INTERVAL_MINUTES: u32 = 30;

/// Host notifications the scheduler listens to while enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hook {
    Tick,
    Dirtied,
    Saved,
    PlayMode,
}

impl Hook {
    pub const ALL: [Hook; 4] = [Hook::Tick, Hook::Dirtied, Hook::Saved, Hook::PlayMode];

    pub fn label(self) -> &'static str {
        match self {
            Hook::Tick => "tick",
            Hook::Dirtied => "dirtied",
            Hook::Saved => "saved",
            Hook::PlayMode => "play_mode",
        }
    }
}

/// Registered handlers. Every registration receives its own delivery, so a duplicate
/// registration would show up as a duplicate save.
#[derive(Debug, Default, Clone)]
pub struct Subscriptions {
    registrations: Vec<Hook>,
}

impl Subscriptions {
    pub fn register(&mut self, hook: Hook) {
        self.registrations.push(hook);
    }

    pub fn unregister_all(&mut self) {
        self.registrations.clear();
    }

    pub fn deliveries(&self, hook: Hook) -> usize {
        self.registrations.iter().filter(|registered| **registered == hook).count()
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScheduleState {
    pub enabled: bool,
    pub interval_minutes: u32,
    pub last_trigger: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Poll {
    Disabled,
    Waiting,
    /// The window elapsed and has been restarted at the polled time.
    Due,
}

#[derive(Debug, Clone)]
pub struct Scheduler {
    state: ScheduleState,
    subscriptions: Subscriptions,
}

pub fn clamp_interval(minutes: u32) -> u32 {
    minutes.clamp(MIN_INTERVAL_MINUTES, MAX_INTERVAL_MINUTES)
}

impl Scheduler {
    pub fn new(interval_minutes: u32) -> Self {
        Self {
            state: ScheduleState {
                enabled: false,
                interval_minutes: clamp_interval(interval_minutes),
                last_trigger: 0.0,
            },
            subscriptions: Subscriptions::default(),
        }
    }

    pub fn state(&self) -> ScheduleState {
        self.state
    }

    pub fn subscriptions(&self) -> &Subscriptions {
        &self.subscriptions
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled
    }

    pub fn enable(&mut self, now: f64) {
        self.subscriptions.unregister_all();
        self.advance_trigger(now);
        for hook in Hook::ALL {
            self.subscriptions.register(hook);
        }
        self.state.enabled = true;
    }

    pub fn disable(&mut self) {
        self.subscriptions.unregister_all();
        self.state.enabled = false;
    }

    pub fn set_interval_minutes(&mut self, minutes: u32) -> u32 {
        self.state.interval_minutes = clamp_interval(minutes);
        self.state.interval_minutes
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(u64::from(self.state.interval_minutes) * 60)
    }

    pub fn poll(&mut self, now: f64) -> Poll {
        if !self.state.enabled {
            return Poll::Disabled;
        }
        if now - self.state.last_trigger < self.interval().as_secs_f64() {
            return Poll::Waiting;
        }
        // Restart the window even if nothing turns out to be dirty.
        self.advance_trigger(now);
        Poll::Due
    }

    pub fn remaining(&self, now: f64) -> Duration {
        let remaining = self.interval().as_secs_f64() - (now - self.state.last_trigger);
        if remaining > 0.0 {
            Duration::from_secs_f64(remaining)
        } else {
            Duration::ZERO
        }
    }

    fn advance_trigger(&mut self, now: f64) {
        if now > self.state.last_trigger {
            self.state.last_trigger = now;
        }
    }
}

pub fn format_countdown(remaining: Duration) -> String {
    let total = remaining.as_secs();
    format!("Next autosave in: {:02}:{:02}", total / 60, total % 60)
}
