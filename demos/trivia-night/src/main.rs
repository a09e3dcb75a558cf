use parlor::prelude::*;
use parlor_client::{ParlorClient, StateUpdate};
use tokio::sync::mpsc::UnboundedReceiver;

// ---------------------------------------------------------------------------
// A scripted trivia night: one host, two players, one round.
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    parlor::init_tracing();

    // Self-contained: run the coordinator in-process on a random port.
    let server = ParlorServerBuilder::new().bind("127.0.0.1:0").build().await?;
    let addr = server.local_addr()?;
    tokio::spawn(async move {
        if let Err(e) = server.run().await {
            eprintln!("server stopped: {e}");
        }
    });
    let url = format!("ws://{addr}");
    println!("coordinator listening on {url}");

    // The host opens a room and gets a code to read out.
    let (mut host, mut host_updates) = ParlorClient::connect(&url).await?;
    let code = host.create_room("quizmaster").await?;
    println!("room open, join code: {code}");

    // Two players type the code in.
    let (mut alice, mut alice_updates) = ParlorClient::connect(&url).await?;
    alice.join_room(&code, "Alice").await?;
    println!("host sees:  {}", describe(&next(&mut host_updates).await?));

    let (mut bob, _bob_updates) = ParlorClient::connect(&url).await?;
    bob.join_room(&code, "Bob").await?;
    println!("host sees:  {}", describe(&next(&mut host_updates).await?));

    // Alice heard both roster changes too.
    next(&mut alice_updates).await?;
    next(&mut alice_updates).await?;

    // The host starts the round. Everyone hears it.
    host.start_quiz(&code).await?;
    println!("host sees:  {}", describe(&next(&mut host_updates).await?));
    println!("Alice sees: {}", describe(&next(&mut alice_updates).await?));

    // Answers are recorded server-side; nothing comes back yet.
    alice.submit_answer("q1", serde_json::json!("B")).await?;
    println!("Alice answered q1");

    // Bob drops off. The rest of the room hears about it.
    bob.close().await?;
    println!("host sees:  {}", describe(&next(&mut host_updates).await?));

    println!("trivia night over");
    Ok(())
}

async fn next(
    updates: &mut UnboundedReceiver<StateUpdate>,
) -> Result<StateUpdate, Box<dyn std::error::Error>> {
    updates.recv().await.ok_or_else(|| "update stream closed".into())
}

fn describe(update: &StateUpdate) -> String {
    let names: Vec<&str> = update.state.players.iter().map(|p| p.name.as_str()).collect();
    let line = format!("[{}] players: {names:?}", update.state.status);
    match update.event {
        Some(StateMarker::QuizStarted) => format!("{line} (quiz started)"),
        None => line,
    }
}
