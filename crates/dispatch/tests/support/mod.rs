//! A tiny scripted SMTP server for exercising `SmtpBackend` end to end.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// What the server saw during one SMTP session.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub mail_from: Option<String>,
    pub rcpt_to: Vec<String>,
    pub data: String,
}

#[derive(Debug, Clone)]
pub struct FakeSmtpServer {
    pub port: u16,
    sessions: Arc<Mutex<Vec<Session>>>,
}

impl FakeSmtpServer {
    /// Start a server on a random local port. `RCPT TO` for any address in
    /// `reject` is answered with `550`.
    pub async fn start(reject: &[&str]) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        let sessions = Arc::new(Mutex::new(Vec::new()));
        let reject: Arc<HashSet<String>> =
            Arc::new(reject.iter().map(|s| (*s).to_owned()).collect());

        let accepted = Arc::clone(&sessions);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let sessions = Arc::clone(&accepted);
                let reject = Arc::clone(&reject);
                tokio::spawn(async move {
                    let index = {
                        let mut sessions = sessions.lock();
                        sessions.push(Session::default());
                        sessions.len() - 1
                    };
                    serve(stream, &reject, &sessions, index).await;
                });
            }
        });

        Self { port, sessions }
    }

    pub fn sessions(&self) -> Vec<Session> {
        self.sessions.lock().clone()
    }

    /// Sessions that actually carried a message.
    pub fn deliveries(&self) -> Vec<Session> {
        self.sessions()
            .into_iter()
            .filter(|s| !s.data.is_empty())
            .collect()
    }
}

fn angle_addr(arg: &str) -> String {
    arg.trim()
        .trim_start_matches('<')
        .split('>')
        .next()
        .unwrap_or_default()
        .to_owned()
}

/// Speak just enough SMTP for lettre. Session state is updated before the
/// matching reply is written, so a client that got its answer can inspect
/// the server right away.
async fn serve(
    stream: TcpStream,
    reject: &HashSet<String>,
    sessions: &Mutex<Vec<Session>>,
    index: usize,
) {
    let (read, mut write) = stream.into_split();
    let mut lines = BufReader::new(read).lines();

    if write.write_all(b"220 fake.test ESMTP ready\r\n").await.is_err() {
        return;
    }

    while let Ok(Some(line)) = lines.next_line().await {
        let upper = line.to_ascii_uppercase();
        let reply: &[u8] = if upper.starts_with("EHLO") || upper.starts_with("HELO") {
            b"250 fake.test\r\n"
        } else if upper.starts_with("MAIL FROM:") {
            let address = angle_addr(&line[10..]);
            sessions.lock()[index].mail_from = Some(address);
            b"250 OK\r\n"
        } else if upper.starts_with("RCPT TO:") {
            let address = angle_addr(&line[8..]);
            if reject.contains(&address) {
                b"550 mailbox unavailable\r\n"
            } else {
                sessions.lock()[index].rcpt_to.push(address);
                b"250 OK\r\n"
            }
        } else if upper.starts_with("DATA") {
            if write.write_all(b"354 end with <CRLF>.<CRLF>\r\n").await.is_err() {
                break;
            }
            let mut data = String::new();
            while let Ok(Some(data_line)) = lines.next_line().await {
                if data_line == "." {
                    break;
                }
                data.push_str(&data_line);
                data.push('\n');
            }
            sessions.lock()[index].data.push_str(&data);
            b"250 OK queued\r\n"
        } else if upper.starts_with("QUIT") {
            let _ = write.write_all(b"221 bye\r\n").await;
            break;
        } else {
            b"250 OK\r\n"
        };

        if write.write_all(reply).await.is_err() {
            break;
        }
    }
}
