// crates/tictactoe-server/tests/session_loop.rs
mod common;

use std::time::Duration;

use common::{connect, start_game};
use tictactoe_server::{ConnectionError, ServerContext, ServerError};

fn context(idle: Duration) -> (ServerContext, tictactoe_server::ShutdownHandle) {
    ServerContext::new(idle)
}

#[tokio::test]
async fn login_rejects_malformed_and_duplicate_names() {
    let (ctx, _shutdown) = context(Duration::from_secs(30));
    let mut first = connect(&ctx);
    let mut second = connect(&ctx);

    first.login("alice").await;

    second.send("hello").await;
    second.expect("First command must be=login <username>").await;
    second.send("login alice").await;
    second.expect("Username 'alice' is already used").await;
    second.login("Alice").await;

    second.send("whoami").await;
    assert_eq!(second.expect("lice").await, "Alice");

    let mut users = ctx.registry.list().await;
    users.sort();
    assert_eq!(users, vec!["Alice".to_string(), "alice".to_string()]);
}

#[tokio::test]
async fn lobby_commands() {
    let (ctx, _shutdown) = context(Duration::from_secs(30));
    let mut alice = connect(&ctx);
    let mut bob = connect(&ctx);
    alice.login("alice").await;
    bob.login("bob").await;

    alice.send("ALL_USERS").await;
    let listing = alice.expect("Players").await;
    assert!(listing.contains("\nalice\nbob\n"));

    alice.send("help").await;
    alice.expect("challenge <p2-username>").await;

    alice.send("all_games").await;
    alice.expect("No games yet").await;

    alice.send("dance").await;
    alice.expect("Unknown command 'dance'").await;

    alice.send("play 0 0").await;
    alice.expect("You are not in a game").await;

    alice.send("subscribe 42").await;
    alice.expect("No game with id=42").await;

    alice.send("challenge alice").await;
    alice.expect("You cannot challenge yourself").await;
}

#[tokio::test]
async fn alice_wins_on_the_main_diagonal() {
    let (ctx, _shutdown) = context(Duration::from_secs(30));
    let (mut alice, mut bob) = start_game(&ctx, "alice", "bob").await;

    alice.send("play 0 0").await;
    alice.expect("Player=alice move to row=0, col=0").await;
    bob.expect("Player=alice move to row=0, col=0").await;
    bob.expect("Your move (O)").await;

    bob.send("play 0 1").await;
    alice.expect("Player=bob move to row=0, col=1").await;
    alice.expect("Your move (X)").await;

    alice.send("play 1 1").await;
    bob.expect("Your move (O)").await;

    bob.send("play 0 2").await;
    alice.expect("Your move (X)").await;

    alice.send("play 2 2").await;
    alice.expect("Player=alice has won!").await;
    bob.expect("Player=alice has won!").await;

    assert!(!ctx.registry.lookup("alice").await.unwrap().in_game());

    bob.send("play 2 0").await;
    bob.expect("This game has already finished").await;
    alice.send("play 2 0").await;
    alice.expect("This game has already finished").await;

    // Back in the lobby.
    bob.send("whoami").await;
    bob.expect("bob").await;
    alice.send("all_games").await;
    alice.expect("0: alice vs bob [won by alice]").await;
}

#[tokio::test]
async fn out_of_turn_and_invalid_moves_are_reprompted() {
    let (ctx, _shutdown) = context(Duration::from_secs(30));
    let (mut alice, mut bob) = start_game(&ctx, "alice", "bob").await;

    bob.send("play 1 1").await;
    bob.expect("It is not your turn").await;

    alice.send("play 1 1").await;
    bob.expect("Your move (O)").await;

    bob.send("play 1 1").await;
    bob.expect("Not a valid move (row=1, col=1)").await;
    bob.send("play 5 0").await;
    bob.expect("Not a valid move (row=5, col=0)").await;
    bob.send("play one 0").await;
    bob.expect("'one' is not a valid row").await;
    bob.send("all_users").await;
    bob.expect("You are in a game").await;

    bob.send("play 0 0").await;
    alice.expect("Player=bob move to row=0, col=0").await;
}

#[tokio::test]
async fn unknown_challenge_target_changes_nothing() {
    let (ctx, _shutdown) = context(Duration::from_secs(30));
    let mut alice = connect(&ctx);
    alice.login("alice").await;

    alice.send("challenge unknown_user").await;
    alice.expect("No user named 'unknown_user' is online").await;

    assert!(ctx.games.is_empty().await);
    assert_eq!(ctx.registry.len().await, 1);
    assert!(!ctx.registry.lookup("alice").await.unwrap().in_game());

    let mut bob = connect(&ctx);
    bob.login("bob").await;
    alice.send("challenge bob").await;
    alice.expect("Game=0 started").await;
}

#[tokio::test]
async fn spectator_sees_the_same_broadcasts() {
    let (ctx, _shutdown) = context(Duration::from_secs(30));
    let (mut alice, mut bob) = start_game(&ctx, "alice", "bob").await;
    let mut carol = connect(&ctx);
    carol.login("carol").await;

    alice.send("play 0 0").await;
    bob.expect("Your move (O)").await;

    carol.send("subscribe 0").await;
    carol.expect("Succesfully subscribed to game=0").await;
    let snapshot = carol.expect("+-----+").await;
    assert!(snapshot.contains("|X|_|_|"));

    bob.send("play 0 1").await;
    let needle = "Player=bob move to row=0, col=1";
    let seen_by_alice = alice.expect(needle).await;
    let seen_by_bob = bob.expect(needle).await;
    let seen_by_carol = carol.expect(needle).await;
    assert_eq!(seen_by_alice, seen_by_carol);
    assert_eq!(seen_by_bob, seen_by_carol);

    alice.send("play 1 1").await;
    carol.expect("Player=alice move to row=1, col=1").await;
    bob.send("play 0 2").await;
    carol.expect("Player=bob move to row=0, col=2").await;
    alice.send("play 2 2").await;
    carol.expect("Player=alice has won!").await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn refused_challenge_leaves_opponent_in_lobby() {
    for _ in 0..50 {
        let (ctx, _shutdown) = context(Duration::from_secs(30));
        let (_alice, _bob) = start_game(&ctx, "alice", "bob").await;
        let mut carol = connect(&ctx);
        carol.login("carol").await;

        let alice = ctx.registry.lookup("alice").await.unwrap();
        let carol_handle = ctx.registry.lookup("carol").await.unwrap();
        assert!(matches!(
            ctx.games.create_game(&alice, &carol_handle).await,
            Err(ServerError::AlreadyInGame)
        ));
        assert!(!carol_handle.in_game());

        carol.send("whoami").await;
        assert_eq!(carol.next().await, "carol");

        let mut dave = connect(&ctx);
        dave.login("dave").await;
        dave.send("challenge carol").await;
        carol.expect("Game=1 started").await;
        dave.expect("Your move (X)").await;
        dave.send("play 1 1").await;
        carol.expect("Your move (O)").await;
        assert_eq!(ctx.games.len().await, 2);
    }
}

#[tokio::test]
async fn play_after_an_unobserved_game_reports_it_finished() {
    let (ctx, _shutdown) = context(Duration::from_secs(30));
    let mut alice = connect(&ctx);
    let mut bob = connect(&ctx);
    alice.login("alice").await;
    bob.login("bob").await;

    // Started and aborted before bob's loop gets to look at it.
    let alice_handle = ctx.registry.lookup("alice").await.unwrap();
    let bob_handle = ctx.registry.lookup("bob").await.unwrap();
    let game = ctx.games.create_game(&alice_handle, &bob_handle).await.unwrap();
    assert!(game.abort("alice").await);
    assert_eq!(bob_handle.last_game(), Some(game.id()));
    assert!(!bob_handle.in_game());

    bob.send("play 0 0").await;
    bob.expect("This game has already finished").await;
    alice.send("play 0 0").await;
    alice.expect("This game has already finished").await;
}

#[tokio::test]
async fn idle_turn_holder_releases_opponent() {
    let (ctx, _shutdown) = context(Duration::from_millis(300));
    let (alice, mut bob) = start_game(&ctx, "alice", "bob").await;

    // Alice holds the turn and goes silent.
    bob.expect("Player=alice left, game=0 aborted").await;
    let result = alice.finish().await;
    assert!(matches!(
        result,
        Err(ServerError::Connection(ConnectionError::IdleTimeout(_)))
    ));

    assert!(ctx.registry.lookup("alice").await.is_none());
    assert!(!ctx.registry.lookup("bob").await.unwrap().in_game());
}

#[tokio::test]
async fn waiting_player_is_not_timed_out() {
    let (ctx, _shutdown) = context(Duration::from_millis(300));
    let (mut alice, mut bob) = start_game(&ctx, "alice", "bob").await;

    alice.send("play 1 1").await;
    bob.expect("Your move (O)").await;

    // Bob stays active while alice waits longer than the idle timeout.
    tokio::time::sleep(Duration::from_millis(200)).await;
    bob.send("play 1 1").await;
    bob.expect("Not a valid move").await;
    tokio::time::sleep(Duration::from_millis(200)).await;
    bob.send("play 0 0").await;

    alice.expect("Your move (X)").await;
    assert!(ctx.registry.lookup("alice").await.is_some());
    alice.send("play 2 2").await;
    bob.expect("Player=alice move to row=2, col=2").await;
}

#[tokio::test]
async fn hang_up_mid_game_aborts_and_unregisters() {
    let (ctx, _shutdown) = context(Duration::from_secs(30));
    let (mut alice, mut bob) = start_game(&ctx, "alice", "bob").await;

    bob.hang_up();
    alice.expect("Player=bob left, game=0 aborted").await;
    assert!(bob.finish().await.is_ok());
    assert!(ctx.registry.lookup("bob").await.is_none());

    // Alice is back in the lobby and can start again.
    let mut carol = connect(&ctx);
    carol.login("carol").await;
    alice.send("challenge carol").await;
    carol.expect("Game=1 started").await;
}

#[tokio::test]
async fn login_timeout_says_goodbye() {
    let (ctx, _shutdown) = context(Duration::from_millis(100));
    let mut silent = connect(&ctx);

    silent.expect("Bye").await;
    assert!(matches!(
        silent.finish().await,
        Err(ServerError::Connection(ConnectionError::IdleTimeout(_)))
    ));
    assert!(ctx.registry.is_empty().await);
}

#[tokio::test]
async fn shutdown_ends_every_session() {
    let (ctx, shutdown) = context(Duration::from_secs(30));
    let (mut alice, mut bob) = start_game(&ctx, "alice", "bob").await;

    shutdown.trigger();
    alice.expect("Server is shutting down").await;
    bob.expect("Bye").await;
    assert!(matches!(
        alice.finish().await,
        Err(ServerError::Connection(ConnectionError::ShuttingDown))
    ));
    assert!(ctx.registry.lookup("alice").await.is_none());
}
