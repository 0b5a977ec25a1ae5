use std::sync::Arc;

#[cfg(feature = "rtrb")]
use rtrb::{Consumer, Producer, RingBuffer};

#[cfg(feature = "rtrb")]
use crate::config::EngineConfig;
use crate::mixer::params::{ControlError, ParamBank, ParamId};

/// Discrete events from the control context. Knob values travel through the
/// [`ParamBank`] instead.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ControlEvent {
    /// Start (or retrigger) the envelope.
    Trigger,
    /// Gate high triggers and holds; gate low lets the envelope fall.
    Gate(bool),
    /// Restart the reverb predelay gate.
    TriggerReverb,
    /// Clear every tail and stop the envelope.
    Mute,
}

pub trait EventReceiver {
    fn pop(&mut self) -> Option<ControlEvent>;
}

#[cfg(feature = "rtrb")]
impl EventReceiver for Consumer<ControlEvent> {
    fn pop(&mut self) -> Option<ControlEvent> {
        Consumer::pop(self).ok()
    }
}

/// Audio-side end of the control boundary.
pub struct ControlReceiver<R: EventReceiver> {
    bank: Arc<ParamBank>,
    seen: Box<[i32]>,
    events: R,
}

impl<R: EventReceiver> ControlReceiver<R> {
    /// Whatever the bank holds now counts as applied; only later stores are
    /// reported. The bank must already hold what the graph booted with
    /// (see [`ParamBank::from_config`]).
    pub fn new(bank: Arc<ParamBank>, events: R) -> Self {
        let seen = bank.values().map(|(_, value)| value).collect();
        Self { bank, seen, events }
    }

    pub fn bank(&self) -> &ParamBank {
        &self.bank
    }

    pub fn drain_params(&mut self, apply: impl FnMut(ParamId, i32)) {
        self.bank.drain_changes(&mut self.seen, apply);
    }

    pub fn pop_event(&mut self) -> Option<ControlEvent> {
        self.events.pop()
    }
}

/// Control-side end: the only writer of knob values and events.
#[cfg(feature = "rtrb")]
pub struct ControlHandle {
    bank: Arc<ParamBank>,
    events: Producer<ControlEvent>,
}

#[cfg(feature = "rtrb")]
impl ControlHandle {
    /// Clamp and publish a knob value. Returns the stored value.
    pub fn set(&self, id: ParamId, value: i32) -> Result<i32, ControlError> {
        self.bank.store(id, value)
    }

    pub fn get(&self, id: ParamId) -> Result<i32, ControlError> {
        self.bank.load(id)
    }

    /// Current value of every parameter, as the control side last wrote it.
    pub fn values(&self) -> impl Iterator<Item = (ParamId, i32)> + '_ {
        self.bank.values()
    }

    pub fn trigger(&mut self) -> Result<(), ControlError> {
        self.send(ControlEvent::Trigger)
    }

    pub fn gate(&mut self, on: bool) -> Result<(), ControlError> {
        self.send(ControlEvent::Gate(on))
    }

    pub fn trigger_reverb(&mut self) -> Result<(), ControlError> {
        self.send(ControlEvent::TriggerReverb)
    }

    pub fn mute(&mut self) -> Result<(), ControlError> {
        self.send(ControlEvent::Mute)
    }

    fn send(&mut self, event: ControlEvent) -> Result<(), ControlError> {
        self.events.push(event).map_err(|_| {
            tracing::warn!(?event, "control queue full, event dropped");
            ControlError::QueueFull
        })
    }
}

/// Build both ends of the control boundary for an engine built from
/// `config`. The bank starts at the same boot values as the graph.
#[cfg(feature = "rtrb")]
pub fn control_channel(
    config: &EngineConfig,
    queue_capacity: usize,
) -> (ControlHandle, ControlReceiver<Consumer<ControlEvent>>) {
    let bank = Arc::new(ParamBank::from_config(config));
    let (tx, rx) = RingBuffer::new(queue_capacity.max(1));
    tracing::debug!(
        channels = config.channels,
        queue_capacity,
        slots = bank.len(),
        "control channel created"
    );
    (
        ControlHandle {
            bank: Arc::clone(&bank),
            events: tx,
        },
        ControlReceiver::new(bank, rx),
    )
}

#[cfg(all(test, feature = "rtrb"))]
mod tests {
    use super::*;
    use crate::mixer::params::{ChannelParam, MasterParam};

    fn config(channels: usize) -> EngineConfig {
        EngineConfig {
            channels,
            ..EngineConfig::default()
        }
    }

    #[test]
    fn test_events_arrive_in_order() {
        let (mut handle, mut receiver) = control_channel(&config(1), 8);
        handle.trigger().expect("queue has room");
        handle.gate(false).expect("queue has room");
        handle.mute().expect("queue has room");

        assert_eq!(receiver.pop_event(), Some(ControlEvent::Trigger));
        assert_eq!(receiver.pop_event(), Some(ControlEvent::Gate(false)));
        assert_eq!(receiver.pop_event(), Some(ControlEvent::Mute));
        assert_eq!(receiver.pop_event(), None);
    }

    #[test]
    fn test_full_queue_reports_error() {
        let (mut handle, _receiver) = control_channel(&config(1), 2);
        handle.trigger().expect("room");
        handle.trigger().expect("room");
        assert_eq!(handle.trigger_reverb(), Err(ControlError::QueueFull));
    }

    #[test]
    fn test_params_cross_the_boundary() {
        let (handle, mut receiver) = control_channel(&config(2), 4);

        let id = ParamId::Channel(1, ChannelParam::Pan);
        assert_eq!(handle.set(id, -70), Ok(-50));
        handle
            .set(ParamId::Master(MasterParam::ReverbLevel), 600)
            .expect("valid param");

        let mut seen = Vec::new();
        receiver.drain_params(|id, v| seen.push((id, v)));
        assert_eq!(
            seen,
            vec![
                (ParamId::Master(MasterParam::ReverbLevel), 600),
                (id, -50)
            ]
        );
    }

    #[test]
    fn test_boot_values_are_not_reported_again() {
        let mut config = config(1);
        let gain = ParamId::Channel(0, ChannelParam::Gain);
        config.initial = vec![(gain, 0)];
        let (handle, mut receiver) = control_channel(&config, 4);
        assert_eq!(handle.get(gain), Ok(0));

        let mut seen = Vec::new();
        receiver.drain_params(|id, v| seen.push((id, v)));
        assert!(seen.is_empty(), "{:?}", seen);

        handle.set(gain, 750).expect("valid param");
        receiver.drain_params(|id, v| seen.push((id, v)));
        assert_eq!(seen, vec![(gain, 750)]);
    }
}
