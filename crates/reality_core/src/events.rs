//! Synchronous publish/subscribe bus between the core and its collaborators.
//!
//! Handlers never publish events themselves. They answer with [`Command`]s
//! written to an [`Outbox`]; commands are queued and applied by the frame
//! orchestrator on its next tick, so a handler cannot recurse into the
//! emitter.

use std::collections::VecDeque;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Consequences;
use crate::state::{Ending, PlayerStateSnapshot, Zone};

/// Named channel an event travels on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    ZoneChange,
    ChoiceMade,
    Ending,
    GlitchDiscovered,
    RequestChoices,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Channel::ZoneChange => "zone_change",
            Channel::ChoiceMade => "choice_made",
            Channel::Ending => "ending",
            Channel::GlitchDiscovered => "glitch_discovered",
            Channel::RequestChoices => "request_choices",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Notification produced by the narrative core.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "channel", rename_all = "snake_case")]
pub enum Event {
    ZoneChange {
        zone: Zone,
    },
    ChoiceMade {
        choice: String,
        consequences: Consequences,
    },
    Ending {
        ending: Ending,
        state: PlayerStateSnapshot,
    },
    GlitchDiscovered {
        count: u32,
    },
    RequestChoices,
}

impl Event {
    pub fn channel(&self) -> Channel {
        match self {
            Event::ZoneChange { .. } => Channel::ZoneChange,
            Event::ChoiceMade { .. } => Channel::ChoiceMade,
            Event::Ending { .. } => Channel::Ending,
            Event::GlitchDiscovered { .. } => Channel::GlitchDiscovered,
            Event::RequestChoices => Channel::RequestChoices,
        }
    }
}

/// Request consumed by the frame orchestrator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    Start,
    Pause,
    Resume,
    MakeChoice { id: String },
    /// A pointer hit-test landed on the scene at `at`.
    DiscoverGlitch { at: [f32; 3] },
}

impl Command {
    pub fn make_choice<S: Into<String>>(id: S) -> Self {
        Command::MakeChoice { id: id.into() }
    }
}

/// Collects commands written by a handler during dispatch.
#[derive(Debug, Default)]
pub struct Outbox {
    commands: Vec<Command>,
}

impl Outbox {
    pub fn send(&mut self, command: Command) {
        self.commands.push(command);
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

pub type Handler = Box<dyn FnMut(&Event, &mut Outbox)>;

struct Subscriber {
    id: SubscriptionId,
    channel: Channel,
    handler: Handler,
}

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<Subscriber>,
    queued: VecDeque<Event>,
    commands: VecDeque<Command>,
    history: Vec<Event>,
    next_id: u64,
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscribers", &self.subscribers.len())
            .field("queued", &self.queued.len())
            .field("commands", &self.commands.len())
            .field("history", &self.history.len())
            .finish()
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe<F>(&mut self, channel: Channel, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event, &mut Outbox) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            channel,
            handler: Box::new(handler),
        });
        id
    }

    /// Remove a subscription. Returns `false` when it was already gone.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|subscriber| subscriber.id != id);
        self.subscribers.len() != before
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Queue an event for the next [`EventBus::dispatch`].
    pub fn publish(&mut self, event: Event) {
        self.queued.push_back(event);
    }

    /// Deliver every queued event in publication order.
    ///
    /// Returns the delivered events. Commands produced by handlers are
    /// appended to the inbound command queue.
    pub fn dispatch(&mut self) -> Vec<Event> {
        let mut delivered = Vec::with_capacity(self.queued.len());
        while let Some(event) = self.queued.pop_front() {
            let channel = event.channel();
            let mut outbox = Outbox::default();
            for subscriber in self
                .subscribers
                .iter_mut()
                .filter(|subscriber| subscriber.channel == channel)
            {
                (subscriber.handler)(&event, &mut outbox);
            }
            self.commands.extend(outbox.commands);
            self.history.push(event.clone());
            delivered.push(event);
        }
        delivered
    }

    /// Queue an inbound command for the orchestrator.
    pub fn send(&mut self, command: Command) {
        self.commands.push_back(command);
    }

    pub fn take_commands(&mut self) -> Vec<Command> {
        self.commands.drain(..).collect()
    }

    /// Every event delivered since construction or the last [`EventBus::clear`].
    pub fn history(&self) -> &[Event] {
        &self.history
    }

    pub fn count(&self, channel: Channel) -> usize {
        self.history
            .iter()
            .filter(|event| event.channel() == channel)
            .count()
    }

    /// Drop every subscriber, queued event, pending command and the history.
    pub fn clear(&mut self) {
        self.subscribers.clear();
        self.queued.clear();
        self.commands.clear();
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn dispatch_routes_by_channel() {
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        bus.subscribe(Channel::GlitchDiscovered, move |event, _| {
            sink.borrow_mut().push(event.clone());
        });

        bus.publish(Event::ZoneChange {
            zone: Zone::Awakening,
        });
        bus.publish(Event::GlitchDiscovered { count: 1 });
        let delivered = bus.dispatch();

        assert_eq!(delivered.len(), 2);
        assert_eq!(*seen.borrow(), vec![Event::GlitchDiscovered { count: 1 }]);
        assert_eq!(bus.count(Channel::ZoneChange), 1);
    }

    #[test]
    fn handler_commands_are_queued_not_dispatched() {
        let mut bus = EventBus::new();
        bus.subscribe(Channel::RequestChoices, |_, outbox| {
            outbox.send(Command::make_choice("transcend"));
        });
        bus.publish(Event::RequestChoices);
        bus.dispatch();

        assert_eq!(
            bus.take_commands(),
            vec![Command::make_choice("transcend")]
        );
        assert!(bus.take_commands().is_empty());
    }

    #[test]
    fn unsubscribe_and_clear() {
        let mut bus = EventBus::new();
        let id = bus.subscribe(Channel::Ending, |_, _| {});
        bus.subscribe(Channel::ZoneChange, |_, _| {});
        assert!(bus.unsubscribe(id));
        assert!(!bus.unsubscribe(id));
        assert_eq!(bus.subscriber_count(), 1);

        bus.send(Command::Pause);
        bus.publish(Event::RequestChoices);
        bus.clear();
        assert_eq!(bus.subscriber_count(), 0);
        assert!(bus.dispatch().is_empty());
        assert!(bus.take_commands().is_empty());
    }

    #[test]
    fn events_serialize_with_channel_tag() {
        let value = serde_json::to_value(Event::GlitchDiscovered { count: 3 }).expect("serializes");
        assert_eq!(value["channel"], "glitch_discovered");
        assert_eq!(value["count"], 3);
    }
}
