use std::fmt;
use std::rc::Rc;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum MessageSeverity {
    Normal,
    Warning,
    Error,
}

impl fmt::Display for MessageSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MessageSeverity::Normal => "normal",
            MessageSeverity::Warning => "warning",
            MessageSeverity::Error => "error",
        };
        write!(f, "{}", name)
    }
}

pub type Listener = Rc<dyn Fn(&str, MessageSeverity)>;

/// Fan-out of evaluator messages to subscribed listeners. A listener is
/// identified by its `Rc` allocation, so subscribing it twice or removing it
/// when absent does nothing.
#[derive(Default)]
pub struct OutputSink {
    listeners: Vec<Listener>,
}

impl OutputSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, listener: Listener) {
        if !self.is_subscribed(&listener) {
            self.listeners.push(listener);
        }
    }

    pub fn unsubscribe(&mut self, listener: &Listener) {
        self.listeners.retain(|l| !same_listener(l, listener));
    }

    pub fn is_subscribed(&self, listener: &Listener) -> bool {
        self.listeners.iter().any(|l| same_listener(l, listener))
    }

    pub fn publish(&self, message: &str, severity: MessageSeverity) {
        for listener in &self.listeners {
            listener(message, severity);
        }
    }
}

impl fmt::Debug for OutputSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputSink")
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

fn same_listener(a: &Listener, b: &Listener) -> bool {
    Rc::as_ptr(a) as *const () == Rc::as_ptr(b) as *const ()
}
