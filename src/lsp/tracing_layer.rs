//! Tracing layer that forwards events to LSP window/logMessage.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crossbeam_channel::Sender;
use lsp_server::{Connection, Message, Notification};
use lsp_types::notification::{LogMessage, Notification as _};
use lsp_types::{LogMessageParams, MessageType};
use parking_lot::Mutex;
use tracing::{Level, Subscriber};
use tracing_subscriber::Layer;

/// A tracing layer that sends log messages to the LSP client.
///
/// Before `mark_initialized()` is called, messages are dropped, since the
/// client may not send anything but `initialize` before the handshake.
pub struct LspLayer {
    sender: Arc<Mutex<Option<Sender<Message>>>>,
    initialized: Arc<AtomicBool>,
}

/// Handle to control the LspLayer from the server.
#[derive(Clone)]
pub struct LspLayerHandle {
    sender: Arc<Mutex<Option<Sender<Message>>>>,
    initialized: Arc<AtomicBool>,
}

impl LspLayerHandle {
    /// Mark the layer as initialized. Messages will now be sent.
    pub fn mark_initialized(&self) {
        self.initialized.store(true, Ordering::SeqCst);
    }

    /// Stop forwarding and release the connection's sender so the stdio
    /// writer thread can finish.
    pub fn detach(&self) {
        self.initialized.store(false, Ordering::SeqCst);
        self.sender.lock().take();
    }
}

impl LspLayer {
    /// Create a new LSP tracing layer and a handle to control it.
    pub fn new(connection: &Connection) -> (Self, LspLayerHandle) {
        let sender = Arc::new(Mutex::new(Some(connection.sender.clone())));
        let initialized = Arc::new(AtomicBool::new(false));

        let layer = Self {
            sender: Arc::clone(&sender),
            initialized: Arc::clone(&initialized),
        };
        let handle = LspLayerHandle {
            sender,
            initialized,
        };

        (layer, handle)
    }

    fn level_to_message_type(level: &Level) -> MessageType {
        match *level {
            Level::ERROR => MessageType::ERROR,
            Level::WARN => MessageType::WARNING,
            Level::INFO => MessageType::INFO,
            Level::DEBUG | Level::TRACE => MessageType::LOG,
        }
    }
}

/// Collects the message and the structured fields of an event.
#[derive(Default)]
struct MessageVisitor {
    message: String,
    fields: Vec<String>,
}

impl tracing::field::Visit for MessageVisitor {
    fn record_debug(&mut self, field: &tracing::field::Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.message = format!("{value:?}");
        } else {
            self.fields.push(format!("{}={value:?}", field.name()));
        }
    }

    fn record_str(&mut self, field: &tracing::field::Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.fields.push(format!("{}={value}", field.name()));
        }
    }
}

impl<S: Subscriber> Layer<S> for LspLayer {
    fn on_event(
        &self,
        event: &tracing::Event<'_>,
        _ctx: tracing_subscriber::layer::Context<'_, S>,
    ) {
        if !self.initialized.load(Ordering::SeqCst) {
            return;
        }
        let metadata = event.metadata();

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        let mut message = if visitor.message.is_empty() {
            metadata.target().to_string()
        } else {
            visitor.message
        };
        if !visitor.fields.is_empty() {
            message.push(' ');
            message.push_str(&visitor.fields.join(" "));
        }

        let params = LogMessageParams {
            typ: Self::level_to_message_type(metadata.level()),
            message,
        };
        let notif = Notification::new(LogMessage::METHOD.to_string(), params);

        if let Some(sender) = self.sender.lock().as_ref() {
            let _ = sender.send(Message::Notification(notif));
        }
    }
}

#[cfg(test)]
mod tests {
    use tracing_subscriber::layer::SubscriberExt;

    use super::*;

    #[test]
    fn test_forwards_only_after_initialization() {
        let (server, client) = Connection::memory();
        let (layer, handle) = LspLayer::new(&server);
        let subscriber = tracing_subscriber::registry().with(layer);

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("dropped");
            handle.mark_initialized();
            tracing::warn!(uri = "file:///a.pas", "kept");
            handle.detach();
            tracing::info!("dropped too");
        });

        let messages: Vec<Message> = client.receiver.try_iter().collect();
        assert_eq!(messages.len(), 1);
        let Message::Notification(notif) = &messages[0] else {
            panic!("expected notification, got {:?}", messages[0]);
        };
        assert_eq!(notif.method, LogMessage::METHOD);
        let params: LogMessageParams = serde_json::from_value(notif.params.clone()).unwrap();
        assert_eq!(params.typ, MessageType::WARNING);
        assert_eq!(params.message, "kept uri=file:///a.pas");
    }
}
