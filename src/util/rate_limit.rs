//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

use crate::ws::protocol::{ClientMsg, Controls};

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Default cap on inbound WebSocket messages per connection per second
pub const INPUT_RATE_LIMIT: u32 = 60;

/// Per-connection rate limiter state
#[derive(Clone)]
pub struct ConnectionRateLimiter {
    input_limiter: Arc<Limiter>,
}

impl ConnectionRateLimiter {
    pub fn new(messages_per_second: u32) -> Self {
        Self {
            input_limiter: create_limiter(messages_per_second),
        }
    }

    /// Check if an input message is allowed (returns true if allowed)
    pub fn check_input(&self) -> bool {
        self.input_limiter.check().is_ok()
    }
}

impl Default for ConnectionRateLimiter {
    fn default() -> Self {
        Self::new(INPUT_RATE_LIMIT)
    }
}

/// Rate limits one connection's inbound messages without losing its latest controls.
///
/// A `clientUpdate` over the limit is parked as pending and replaces any
/// earlier pending one; `flush` forwards it once the limiter has capacity.
/// Rotation requests over the limit are refused.
pub struct InputGate {
    limiter: ConnectionRateLimiter,
    pending: Option<Controls>,
}

impl InputGate {
    pub fn new(limiter: ConnectionRateLimiter) -> Self {
        Self {
            limiter,
            pending: None,
        }
    }

    /// Message to forward now, if any
    pub fn admit(&mut self, msg: ClientMsg) -> Option<ClientMsg> {
        match msg {
            ClientMsg::ClientUpdate(controls) => {
                if self.limiter.check_input() {
                    self.pending = None;
                    Some(msg)
                } else {
                    self.pending = Some(controls);
                    None
                }
            }
            other => self.limiter.check_input().then_some(other),
        }
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Release the parked controls if the limiter allows it
    pub fn flush(&mut self) -> Option<ClientMsg> {
        if self.pending.is_none() || !self.limiter.check_input() {
            return None;
        }
        self.pending.take().map(ClientMsg::ClientUpdate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::arena::Arena;
    use crate::game::ArenaRules;
    use std::time::Duration;
    use uuid::Uuid;

    fn held_right(right: bool) -> ClientMsg {
        ClientMsg::ClientUpdate(Controls {
            right,
            ..Default::default()
        })
    }

    #[test]
    fn test_burst_then_limited() {
        let limiter = ConnectionRateLimiter::new(5);
        let allowed = (0..20).filter(|_| limiter.check_input()).count();
        assert_eq!(allowed, 5);
    }

    #[test]
    fn test_zero_rate_still_allows_one() {
        let limiter = ConnectionRateLimiter::new(0);
        assert!(limiter.check_input());
    }

    #[test]
    fn test_release_after_burst_is_not_lost() {
        let mut arena = Arena::new(ArenaRules::default(), Some(3));
        let id = Uuid::new_v4();
        arena.join(id);

        let mut gate = InputGate::new(ConnectionRateLimiter::new(5));
        let forward = |arena: &mut Arena, msg: Option<ClientMsg>| {
            if let Some(msg) = msg {
                arena.handle_client_msg(&id, msg);
            }
        };

        for _ in 0..10 {
            let admitted = gate.admit(held_right(true));
            forward(&mut arena, admitted);
        }
        for _ in 0..10 {
            arena.step(1.0 / 30.0);
        }
        assert!(arena.world().get(&id).unwrap().v_x > 0.0);

        let admitted = gate.admit(held_right(false));
        assert!(admitted.is_none());
        assert!(gate.has_pending());
        assert!(gate.flush().is_none());
        assert!(arena.world().get(&id).unwrap().controls.unwrap().right);

        // Quota of 5/s frees a cell every 200ms
        std::thread::sleep(Duration::from_millis(250));
        let flushed = gate.flush();
        assert_eq!(flushed, Some(held_right(false)));
        forward(&mut arena, flushed);
        assert!(!gate.has_pending());

        assert_eq!(
            arena.world().get(&id).unwrap().controls,
            Some(Controls::default())
        );
        for _ in 0..60 {
            arena.step(1.0 / 30.0);
        }
        assert!(arena.world().get(&id).unwrap().v_x.abs() < 1e-3);
    }

    #[test]
    fn test_admitted_update_clears_pending() {
        let mut gate = InputGate::new(ConnectionRateLimiter::new(1));
        assert!(gate.admit(held_right(true)).is_some());
        assert!(gate.admit(held_right(false)).is_none());
        assert!(gate.has_pending());

        std::thread::sleep(Duration::from_millis(1100));
        assert_eq!(gate.admit(held_right(true)), Some(held_right(true)));
        assert!(!gate.has_pending());
        assert_eq!(gate.flush(), None);
    }

    #[test]
    fn test_rotation_over_limit_refused() {
        let mut gate = InputGate::new(ConnectionRateLimiter::new(1));
        assert_eq!(gate.admit(ClientMsg::NextState), Some(ClientMsg::NextState));
        assert_eq!(gate.admit(ClientMsg::PreviousState), None);
        assert!(!gate.has_pending());
    }
}
