//! Minimal interactive client: stdin lines go to the server, server lines
//! are printed as they arrive.
//!
//! ```text
//! cargo run -p tictactoe-server --example tcp_client
//! ```

use std::env;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Where to connect: env override or default.
    let addr = env::var("TICTACTOE_CLIENT_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    println!("Connecting to {}...", addr);
    let stream = TcpStream::connect(&addr).await?;
    println!("Connected. Start with: login <username>");
    println!("Type 'quit' or 'exit' to leave.\n");

    let (read_half, mut write_half) = stream.into_split();

    // Printer task: echo everything the server sends.
    let printer = tokio::spawn(async move {
        let mut lines = BufReader::new(read_half).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            println!("{}", line);
        }
        println!("Server closed the connection.");
    });

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = stdin.next_line().await? {
        let trimmed = line.trim();
        if trimmed.eq_ignore_ascii_case("quit") || trimmed.eq_ignore_ascii_case("exit") {
            println!("Exiting client.");
            break;
        }
        if printer.is_finished() {
            break;
        }

        write_half.write_all(format!("{}\n", trimmed).as_bytes()).await?;
    }

    write_half.shutdown().await?;
    let _ = printer.await;
    Ok(())
}
