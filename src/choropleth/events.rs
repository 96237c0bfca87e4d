use std::sync::mpsc::{channel, Receiver, Sender};

#[derive(Debug, Clone, PartialEq)]
pub enum LayerEvent {
    /// The user picked the feature with this join-key value.
    Select { term: String },
    ShowTooltip { content: String, position: geo::Coord },
    HideTooltip,
    StyleChanged { unmatched_terms: Vec<String> },
}

#[derive(Default)]
pub struct EventChannel {
    subscribers: Vec<Sender<LayerEvent>>,
}

impl EventChannel {
    pub fn subscribe(&mut self) -> Receiver<LayerEvent> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Subscribers whose receiver was dropped are forgotten.
    pub fn emit(&mut self, event: LayerEvent) {
        log::debug!("Emitting {:?}", event);
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}
