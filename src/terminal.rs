// src/terminal.rs
//! Line-oriented chat front-end for the ticket router.

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::watch,
    task::JoinHandle,
};
use uuid::Uuid;

use crate::{
    config::Config,
    services::{
        chat_history::{ChatEntry, ChatHistory, EntryBody, EntryRole, FailureNotice, HistorySink},
        controller::{SubmitOutcome, TicketController},
        health_poller::{HealthIndicator, HealthPoller, StatusBoard},
        renderer::{AgentReply, DetailPanel, RenderOptions},
        router_client::{HttpRouterClient, RouterApi},
    },
};

pub const EXAMPLE_TICKETS: [&str; 4] = [
    "My computer won't turn on and I have an important meeting in 30 minutes",
    "Need access to the shared drive for the marketing team",
    "Invoice from last month hasn't been received yet",
    "Phone system keeps dropping calls during peak hours",
];

const BAR_CELLS: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Submit(String),
    Send,
    ClearInput,
    ToggleDetails,
    Status,
    Example(usize),
    Help,
    Quit,
    Unknown(String),
}

pub fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return Command::Submit(line.to_string());
    };

    let mut parts = rest.split_whitespace();
    match parts.next().unwrap_or_default() {
        "quit" | "exit" => Command::Quit,
        "send" => Command::Send,
        "clear" => Command::ClearInput,
        "details" => Command::ToggleDetails,
        "status" => Command::Status,
        "help" => Command::Help,
        "example" => match parts.next().and_then(|n| n.parse::<usize>().ok()) {
            Some(n) if (1..=EXAMPLE_TICKETS.len()).contains(&n) => Command::Example(n),
            _ => Command::Unknown(trimmed.to_string()),
        },
        _ => Command::Unknown(trimmed.to_string()),
    }
}

pub fn confidence_bar(reply: &AgentReply) -> String {
    let filled = ((reply.confidence.bar_width() / 100.0) * BAR_CELLS as f64).round() as usize;
    format!(
        "[{}{}] {} ({})",
        "#".repeat(filled),
        "-".repeat(BAR_CELLS - filled.min(BAR_CELLS)),
        reply.confidence.label(),
        reply.confidence.tier.as_str()
    )
}

pub fn render_reply(reply: &AgentReply, panel: Option<&DetailPanel>) -> String {
    let mut out = Vec::new();
    match &reply.model {
        Some(model) => out.push(format!("CallCenterAI [{}]", model.badge())),
        None => out.push("CallCenterAI".to_string()),
    }
    out.push(reply.summary.clone());
    out.push(reply.category_line());
    out.push(confidence_bar(reply));
    if let Some(explanation) = reply.model.as_ref().and_then(|m| m.explanation()) {
        out.push(explanation.to_string());
    }
    if let Some(reasoning) = &reply.reasoning {
        out.push(format!("Reasoning: {reasoning}"));
    }
    if let Some(metrics) = &reply.metrics {
        out.push(metrics.items().join(" | "));
    }
    if let Some(panel) = panel.or(reply.details.as_ref()) {
        if panel.is_expanded() {
            out.push("Complexity details:".to_string());
            out.extend(panel.visible_lines().into_iter().map(|l| format!("  {l}")));
        } else {
            out.push("Complexity details available (/details to show)".to_string());
        }
    }
    out.join("\n")
}

pub fn render_failure(notice: &FailureNotice) -> String {
    format!("CallCenterAI\n{}\n{}", notice.guidance, notice.message)
}

pub fn render_entry(entry: &ChatEntry) -> String {
    match (&entry.role, &entry.body) {
        (EntryRole::User, EntryBody::Text(text)) => format!("You\n{text}"),
        (_, EntryBody::Reply(reply)) => render_reply(reply, None),
        (_, EntryBody::Failure(notice)) => render_failure(notice),
        (EntryRole::Agent, EntryBody::Text(text)) => format!("CallCenterAI\n{text}"),
    }
}

/// Records entries in the history and echoes them to stdout as they land.
#[derive(Clone)]
pub struct EchoingHistory {
    history: ChatHistory,
}

#[async_trait]
impl HistorySink for EchoingHistory {
    async fn append(&self, entry: ChatEntry) -> usize {
        println!("\n{}\n", render_entry(&entry));
        self.history.append(entry).await
    }
}

fn print_help() {
    println!("Type a ticket description and press Enter to classify it.");
    println!("  /example N   load example ticket N into the input");
    println!("  /send        submit the current input");
    println!("  /clear       clear the input");
    println!("  /details     show or hide complexity details of the last reply");
    println!("  /status      show router health");
    println!("  /quit        leave");
}

fn print_examples() {
    println!("Try these examples:");
    for (i, example) in EXAMPLE_TICKETS.iter().enumerate() {
        println!("  {}. {}", i + 1, example);
    }
}

/// One interactive chat: the controller plus the view state the terminal
/// keeps on top of it.
pub struct ChatSession {
    controller: Arc<TicketController>,
    history: ChatHistory,
    board: StatusBoard,
    open_details: Option<Uuid>,
}

impl ChatSession {
    pub fn new(controller: Arc<TicketController>, history: ChatHistory, board: StatusBoard) -> Self {
        Self { controller, history, board, open_details: None }
    }

    pub fn controller(&self) -> &Arc<TicketController> {
        &self.controller
    }

    /// Starts classifying `text` in the background. The text is captured
    /// here, so lines read while the request is pending cannot replace it.
    pub fn submit(&self, text: String) -> JoinHandle<SubmitOutcome> {
        let controller = Arc::clone(&self.controller);
        tokio::spawn(async move {
            let outcome = controller.submit(&text).await;
            match &outcome {
                SubmitOutcome::EmptyInput => eprintln!("\x07Please enter a ticket description."),
                SubmitOutcome::Busy => eprintln!("Still classifying the previous ticket, please wait."),
                SubmitOutcome::Classified(_) | SubmitOutcome::Failed(_) => {}
            }
            outcome
        })
    }

    /// Shows or hides the complexity panel of the most recent reply.
    pub async fn toggle_details(&mut self) -> String {
        let last = self
            .history
            .entries()
            .await
            .into_iter()
            .rev()
            .find(|e| e.as_reply().is_some());
        let Some(entry) = last else {
            return "No classification to show details for yet.".to_string();
        };
        let Some(reply) = entry.as_reply() else {
            return "No classification to show details for yet.".to_string();
        };
        let Some(mut panel) = reply.details.clone() else {
            return "The last reply carried no complexity details.".to_string();
        };

        if self.open_details == Some(entry.id) {
            self.open_details = None;
        } else {
            panel.toggle();
            self.open_details = Some(entry.id);
        }
        render_reply(reply, Some(&panel))
    }

    pub async fn status_line(&self) -> String {
        let status = self.board.current().await;
        let marker = if status == HealthIndicator::Online { "●" } else { "○" };
        format!("{marker} Router agent: {}", status.label())
    }

    /// Handles one command. Returns `false` once the user asked to leave.
    pub async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Quit => return false,
            Command::Submit(text) => {
                self.controller.set_input(text.clone()).await;
                self.submit(text);
            }
            Command::Send => {
                let text = self.controller.input().await;
                self.submit(text);
            }
            Command::ClearInput => {
                self.controller.clear_input().await;
                println!("Input cleared.");
            }
            Command::Example(n) => {
                let text = EXAMPLE_TICKETS[n - 1];
                self.controller.set_input(text).await;
                println!("Input: {text}\n(/send to submit)");
            }
            Command::ToggleDetails => println!("\n{}\n", self.toggle_details().await),
            Command::Status => println!("{}", self.status_line().await),
            Command::Help => print_help(),
            Command::Unknown(cmd) => println!("Unknown command {cmd}; try /help"),
        }
        true
    }
}

pub async fn run_chat(config: &Config) -> Result<()> {
    let api: Arc<dyn RouterApi> = Arc::new(HttpRouterClient::new(&config.router_base_url, config.request_timeout)?);
    let history = ChatHistory::new();
    let options = RenderOptions { infer_model_from_input: config.legacy_model_guess };
    let controller = Arc::new(TicketController::with_options(
        Arc::clone(&api),
        Arc::new(EchoingHistory { history: history.clone() }),
        options,
    ));

    let board = StatusBoard::new();
    let poller = Arc::new(HealthPoller::new(api, Arc::new(board.clone()), config.health_poll_interval));
    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let poll_task = poller.spawn(shutdown_rx);

    tracing::info!(router = %config.router_base_url, "chat session started");
    print_help();
    print_examples();

    let mut session = ChatSession::new(controller, history, board);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        if !session.handle(parse_command(&line)).await {
            break;
        }
    }

    shutdown_tx.send(true).ok();
    poll_task.await.ok();
    Ok(())
}
