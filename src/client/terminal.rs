//! Line-oriented terminal front end for [`ChatSession`].

use std::io::Write;

use tokio::io::{AsyncBufReadExt, BufReader, Lines, Stdin};
use tracing::warn;

use super::{
    http::ApiClient,
    session::{ChatSession, SessionState},
};
use crate::base::types::{Res, UserInfo, Void};

type Input = Lines<BufReader<Stdin>>;

const HELP: &str = "Commands: /escalate, /urgent, /quit";

/// Run an interactive chat against the server at `server_url` until EOF or `/quit`.
pub async fn run(server_url: &str) -> Void {
    let api = ApiClient::new(server_url);
    let mut session = ChatSession::new();
    let mut input = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let keep_going = match session.state() {
            SessionState::NoUserInfo => collect_user_info(&mut session, &mut input).await?,
            SessionState::CollectingTurns => chat_turn(&api, &mut session, &mut input).await?,
            SessionState::Resolved { reviewed: false } => offer_resolution(&api, &mut session, &mut input).await?,
            SessionState::Resolved { reviewed: true } => {
                session.reset();
                true
            }
        };

        if !keep_going {
            return Ok(());
        }
    }
}

async fn prompt(input: &mut Input, label: &str) -> Res<Option<String>> {
    print!("{label}");
    std::io::stdout().flush()?;

    Ok(input.next_line().await?.map(|line| line.trim().to_string()))
}

/// Print the newest displayed turn, including the typing indicator.
fn print_last_turn(session: &ChatSession) {
    if let Some(turn) = session.view().last() {
        println!("{}: {}", turn.role, turn.content);
    }
}

async fn collect_user_info(session: &mut ChatSession, input: &mut Input) -> Res<bool> {
    println!("Get started by telling us who you are.");

    let Some(name) = prompt(input, "Name: ").await? else { return Ok(false) };
    let Some(email) = prompt(input, "Email: ").await? else { return Ok(false) };
    let Some(phone) = prompt(input, "Phone (optional): ").await? else { return Ok(false) };

    let user = UserInfo {
        name,
        email,
        phone: (!phone.is_empty()).then_some(phone),
    };

    match session.start(user) {
        Ok(()) => {
            print_last_turn(session);
            println!("{HELP}");
        }
        Err(err) => println!("{err}"),
    }

    Ok(true)
}

async fn chat_turn(api: &ApiClient, session: &mut ChatSession, input: &mut Input) -> Res<bool> {
    let Some(line) = prompt(input, "> ").await? else { return Ok(false) };

    match line.as_str() {
        "" => {}
        "/quit" => return Ok(false),
        "/escalate" => match session.escalate_request() {
            Ok(request) => match api.escalate(&request).await {
                Ok(_) => println!("Your ticket has been escalated. A member of our team will contact you shortly."),
                Err(err) => println!("Error: {err}"),
            },
            Err(err) => println!("{err}"),
        },
        "/urgent" => match session.urgent_request() {
            Ok(request) => match api.mark_urgent(&request).await {
                Ok(_) => println!("Your ticket has been marked as urgent."),
                Err(err) => println!("Error: {err}"),
            },
            Err(err) => println!("{err}"),
        },
        text => {
            let request = match session.submit(text) {
                Ok(request) => request,
                Err(err) => {
                    println!("{err}");
                    return Ok(true);
                }
            };

            print_last_turn(session);

            match api.chat(&request).await {
                Ok(reply) => {
                    session.receive(reply);
                    print_last_turn(session);
                }
                Err(err) => {
                    warn!("Chat turn failed: {err:#}");
                    session.fail(err.to_string());
                    if let Some(notice) = session.notice() {
                        println!("{notice}");
                    }
                }
            }
        }
    }

    Ok(true)
}

async fn offer_resolution(api: &ApiClient, session: &mut ChatSession, input: &mut Input) -> Res<bool> {
    println!("1) Exit - my problem is sorted");
    println!("2) Log another ticket");

    let Some(choice) = prompt(input, "Choose: ").await? else { return Ok(false) };

    match choice.as_str() {
        "1" => {
            let Some(rating) = prompt(input, "Rate your experience (1-5): ").await? else { return Ok(false) };
            let Ok(rating) = rating.parse::<u8>() else {
                println!("Please enter a number from 1 to 5.");
                return Ok(true);
            };

            let Some(comment) = prompt(input, "Comment (optional): ").await? else { return Ok(false) };

            match session.review_request(rating, &comment) {
                Ok(request) => match api.resolve(&request).await {
                    Ok(_) => {
                        session.mark_reviewed();
                        println!("Thank you for your feedback!");
                        return Ok(false);
                    }
                    Err(err) => println!("Error: {err}"),
                },
                Err(err) => println!("{err}"),
            }
        }
        "2" => session.reset(),
        _ => println!("Please choose 1 or 2."),
    }

    Ok(true)
}
