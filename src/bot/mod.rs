//! Chat front end.
//!
//! The chat platform sits behind two seams: inbound messages arrive on an
//! `mpsc::Receiver<ChatMessage>` and replies leave through a [`ReplySink`]. The
//! event loop parses each message, acknowledges it at once, and runs the command in
//! its own task so a slow WHOIS lookup never holds up other users.

mod command;
mod registry;

pub use command::{parse, Command, CommandSpec, COMMANDS};
pub use registry::CommandRegistry;

use async_trait::async_trait;
use std::io;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWriteExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Capacity of the inbound and reply queues.
const QUEUE_DEPTH: usize = 64;

/// A message seen by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub channel: String,
    pub author: String,
    pub content: String,
}

/// A message the bot sends.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub channel: String,
    pub content: String,
}

/// Outbound half of a chat transport.
#[async_trait]
pub trait ReplySink: Send {
    async fn send(&mut self, reply: &Reply) -> io::Result<()>;
}

/// Writes replies to stdout, one line per message prefixed with the channel.
pub struct ConsoleSink {
    out: tokio::io::Stdout,
}

impl ConsoleSink {
    pub fn new() -> Self {
        Self {
            out: tokio::io::stdout(),
        }
    }
}

impl Default for ConsoleSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ReplySink for ConsoleSink {
    async fn send(&mut self, reply: &Reply) -> io::Result<()> {
        let line = format!("[#{}] {}\n", reply.channel, reply.content);
        self.out.write_all(line.as_bytes()).await?;
        self.out.flush().await
    }
}

/// Feed each line of `reader` into the returned channel as a message from `author`.
///
/// The channel closes when the reader reaches end of input.
pub fn spawn_line_reader<R>(
    reader: R,
    channel: impl Into<String>,
    author: impl Into<String>,
) -> mpsc::Receiver<ChatMessage>
where
    R: AsyncBufRead + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(QUEUE_DEPTH);
    let channel = channel.into();
    let author = author.into();

    tokio::spawn(async move {
        let mut lines = reader.lines();
        loop {
            match lines.next_line().await {
                Ok(Some(content)) => {
                    let message = ChatMessage {
                        channel: channel.clone(),
                        author: author.clone(),
                        content,
                    };
                    if tx.send(message).await.is_err() {
                        break;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    warn!(error = %e, "failed to read chat input");
                    break;
                }
            }
        }
    });

    rx
}

/// Serve commands until `inbound` closes and every started command has replied.
pub async fn run_event_loop<S>(
    mut inbound: mpsc::Receiver<ChatMessage>,
    sink: &mut S,
    registry: Arc<CommandRegistry>,
) -> io::Result<()>
where
    S: ReplySink + ?Sized,
{
    let (reply_tx, mut replies) = mpsc::channel::<Reply>(QUEUE_DEPTH);
    // Dropped at end of input so `replies` closes once the last command task is done.
    let mut reply_tx = Some(reply_tx);

    loop {
        tokio::select! {
            message = inbound.recv(), if reply_tx.is_some() => match message {
                Some(message) => {
                    if let Some(tx) = &reply_tx {
                        dispatch(message, &registry, tx, sink).await?;
                    }
                }
                None => {
                    debug!("chat input closed, waiting for running commands");
                    reply_tx = None;
                }
            },
            reply = replies.recv() => match reply {
                Some(reply) => sink.send(&reply).await?,
                None => break,
            },
        }
    }

    info!("event loop stopped");
    Ok(())
}

async fn dispatch<S>(
    message: ChatMessage,
    registry: &Arc<CommandRegistry>,
    replies: &mpsc::Sender<Reply>,
    sink: &mut S,
) -> io::Result<()>
where
    S: ReplySink + ?Sized,
{
    let command = match registry.parse(&message.content) {
        None => return Ok(()),
        Some(Err(err)) => {
            debug!(author = %message.author, error = %err, "rejected command");
            for content in registry.reject(&err) {
                sink.send(&Reply {
                    channel: message.channel.clone(),
                    content,
                })
                .await?;
            }
            return Ok(());
        }
        Some(Ok(command)) => command,
    };

    info!(
        author = %message.author,
        channel = %message.channel,
        command = command.name(),
        "dispatching command"
    );

    if let Some(content) = registry.acknowledge(&command) {
        sink.send(&Reply {
            channel: message.channel.clone(),
            content,
        })
        .await?;
    }

    let registry = Arc::clone(registry);
    let replies = replies.clone();
    tokio::spawn(async move {
        for content in registry.execute(&command).await {
            let reply = Reply {
                channel: message.channel.clone(),
                content,
            };
            if replies.send(reply).await.is_err() {
                break;
            }
        }
    });

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WhoisError;
    use crate::whois::WhoisTransport;
    use registry::tests::{registry, registry_with_whois, CannedWhois};
    use std::time::Duration;

    /// WHOIS transport that blocks its thread before answering.
    struct SlowWhois {
        delay: Duration,
    }

    impl WhoisTransport for SlowWhois {
        fn query(
            &self,
            server: &str,
            query: &str,
            timeout: Duration,
        ) -> Result<Vec<u8>, WhoisError> {
            std::thread::sleep(self.delay);
            CannedWhois.query(server, query, timeout)
        }
    }

    /// Sink collecting replies in memory.
    #[derive(Default)]
    struct MemorySink {
        replies: Vec<Reply>,
    }

    #[async_trait]
    impl ReplySink for MemorySink {
        async fn send(&mut self, reply: &Reply) -> io::Result<()> {
            self.replies.push(reply.clone());
            Ok(())
        }
    }

    fn contents(sink: &MemorySink) -> Vec<&str> {
        sink.replies.iter().map(|r| r.content.as_str()).collect()
    }

    #[tokio::test]
    async fn test_line_reader() {
        let mut rx = spawn_line_reader(&b"!help\nhello\n"[..], "general", "alice");
        let first = rx.recv().await.unwrap();
        assert_eq!(first.content, "!help");
        assert_eq!(first.channel, "general");
        assert_eq!(first.author, "alice");
        assert_eq!(rx.recv().await.unwrap().content, "hello");
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_event_loop_replies_to_every_command() {
        let inbound = spawn_line_reader(
            &b"good morning\n!ping example.com\n!whois example.com\n!nope\n"[..],
            "general",
            "alice",
        );
        let mut sink = MemorySink::default();

        run_event_loop(inbound, &mut sink, Arc::new(registry(&[80])))
            .await
            .unwrap();

        let replies = contents(&sink);
        assert!(replies.contains(&"Pinging example.com..."));
        assert!(replies.contains(&"Looking up WHOIS for example.com..."));
        assert!(replies.contains(&"Unknown command 'nope'. Try !help."));
        assert!(replies
            .iter()
            .any(|r| r.starts_with("example.com is reachable on port 80")));
        assert!(replies.iter().any(|r| r.contains("Domain Name: EXAMPLE.COM")));
        assert_eq!(replies.len(), 6);
        assert!(sink.replies.iter().all(|r| r.channel == "general"));
    }

    #[tokio::test]
    async fn test_ack_precedes_result() {
        let (tx, inbound) = mpsc::channel(4);
        tx.send(ChatMessage {
            channel: "ops".into(),
            author: "bob".into(),
            content: "!homeports 10.0.0.1".into(),
        })
        .await
        .unwrap();
        drop(tx);

        let mut sink = MemorySink::default();
        run_event_loop(inbound, &mut sink, Arc::new(registry(&[22])))
            .await
            .unwrap();

        let replies = contents(&sink);
        assert_eq!(replies[0], "Scanning common ports on 10.0.0.1...");
        assert!(replies[1].starts_with("Port scan results for 10.0.0.1 (1 open"));
        assert!(replies[2].starts_with("```"));
    }

    #[tokio::test(flavor = "current_thread")]
    async fn test_slow_whois_does_not_hold_up_other_commands() {
        let inbound = spawn_line_reader(
            &b"!whois example.com\n!ping example.com\n"[..],
            "general",
            "alice",
        );
        let whois = Arc::new(SlowWhois {
            delay: Duration::from_millis(300),
        });
        let mut sink = MemorySink::default();

        run_event_loop(inbound, &mut sink, Arc::new(registry_with_whois(&[80], whois)))
            .await
            .unwrap();

        let replies = contents(&sink);
        let position = |prefix: &str| {
            replies
                .iter()
                .position(|r| r.starts_with(prefix))
                .unwrap_or_else(|| panic!("no reply starting with {:?}: {:?}", prefix, replies))
        };

        let ping_result = position("example.com is reachable on port 80");
        let whois_header = position("WHOIS for example.com");
        let whois_ack = position("Looking up WHOIS for example.com...");
        assert!(whois_ack < position("Pinging example.com..."));
        assert!(ping_result < whois_header, "replies: {:?}", replies);
        assert!(replies[whois_header + 1].contains("Domain Name: EXAMPLE.COM"));
        assert_eq!(replies.len(), 5);
    }

    #[tokio::test]
    async fn test_empty_input_stops_immediately() {
        let inbound = spawn_line_reader(&b""[..], "general", "alice");
        let mut sink = MemorySink::default();
        run_event_loop(inbound, &mut sink, Arc::new(registry(&[])))
            .await
            .unwrap();
        assert!(sink.replies.is_empty());
    }
}
