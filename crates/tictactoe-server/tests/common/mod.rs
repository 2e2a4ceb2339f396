// crates/tictactoe-server/tests/common/mod.rs
#![allow(dead_code)]

use std::time::Duration;

use tictactoe_protocol::render;
use tictactoe_server::{run_client, OutboundRx, ServerContext, ServerError};
use tokio::io::{AsyncWriteExt, BufReader, DuplexStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Upper bound for anything a test waits on.
pub const WAIT: Duration = Duration::from_secs(5);

/// A session loop driven through an in-memory stream.
pub struct TestClient {
    input: Option<DuplexStream>,
    output: OutboundRx,
    task: JoinHandle<Result<(), ServerError>>,
}

pub fn connect(ctx: &ServerContext) -> TestClient {
    let (client_end, server_end) = tokio::io::duplex(4096);
    let (out_tx, out_rx) = mpsc::unbounded_channel();
    let task = tokio::spawn(run_client(BufReader::new(server_end), out_tx, ctx.clone()));
    TestClient {
        input: Some(client_end),
        output: out_rx,
        task,
    }
}

impl TestClient {
    pub async fn send(&mut self, line: &str) {
        let input = self.input.as_mut().expect("input already closed");
        input
            .write_all(format!("{line}\n").as_bytes())
            .await
            .expect("write to session loop");
    }

    /// Drain output until a line containing `needle` arrives.
    pub async fn expect(&mut self, needle: &str) -> String {
        let output = &mut self.output;
        timeout(WAIT, async {
            loop {
                match output.recv().await {
                    Some(line) if line.contains(needle) => return line,
                    Some(_) => continue,
                    None => panic!("sink closed while waiting for {needle:?}"),
                }
            }
        })
        .await
        .unwrap_or_else(|_| panic!("timed out waiting for {needle:?}"))
    }

    /// The very next line, whatever it is.
    pub async fn next(&mut self) -> String {
        timeout(WAIT, self.output.recv())
            .await
            .expect("timed out waiting for a line")
            .expect("sink closed")
    }

    pub async fn login(&mut self, name: &str) {
        self.send(&format!("login {name}")).await;
        self.expect(render::LOGIN_OK).await;
    }

    /// Close the input side, as if the peer hung up.
    pub fn hang_up(&mut self) {
        self.input = None;
    }

    pub async fn finish(self) -> Result<(), ServerError> {
        timeout(WAIT, self.task)
            .await
            .expect("session loop did not finish")
            .expect("session loop panicked")
    }
}

/// Log in two players and have the first challenge the second.
pub async fn start_game(ctx: &ServerContext, first: &str, second: &str) -> (TestClient, TestClient) {
    let mut a = connect(ctx);
    let mut b = connect(ctx);
    a.login(first).await;
    b.login(second).await;

    a.send(&format!("challenge {second}")).await;
    a.expect("started").await;
    b.expect("started").await;
    a.expect("Your move (X)").await;
    (a, b)
}
