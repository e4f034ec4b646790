//! Headless pull session against a gacha server.
//!
//! Connects to `GACHALINK_URL` (default `ws://localhost:8080/ws`), waits
//! for the balance, tops it up once on test servers if it is short,
//! performs one pull (`GACHALINK_PULL=single|ten`, default `single`),
//! logs the reveal and exits. Logging follows `RUST_LOG` (default `info`).

use std::time::Duration;

use gachalink::prelude::*;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

const FRAME: Duration = Duration::from_millis(16);
const TOP_UP: u32 = 10_000;

// ---------------------------------------------------------------------------
// Observer
// ---------------------------------------------------------------------------

#[derive(Default)]
struct ConsoleUi {
    failed: bool,
    completed: bool,
}

impl ClientObserver for ConsoleUi {
    fn on_connection_changed(&mut self, state: ConnectionState) {
        info!(%state, "connection");
        if state == ConnectionState::Disconnected && !self.completed {
            self.failed = true;
        }
    }

    fn on_user_info(&mut self, info: &UserInfo) {
        info!(
            user = %info.username,
            currency = info.currency,
            pity = info.pity_count,
            pity_cap = UserInfo::PITY_CAP,
            "account"
        );
    }

    fn on_pull_result(&mut self, result: &PullResult) {
        let new = result.is_new.iter().filter(|n| **n).count();
        info!(count = result.len(), new, "result received");
    }

    fn on_playback_step(&mut self, index: usize, character: &Character) {
        let style = RarityStyle::for_level(character.rarity);
        info!("#{:<2} {:<12} {}", index + 1, character.name, style.label);
    }

    fn on_playback_complete(&mut self) {
        info!("reveal complete");
        self.completed = true;
    }

    fn on_error(&mut self, message: &str) {
        error!(%message, "server");
        self.failed = true;
    }
}

// ---------------------------------------------------------------------------
// Session script
// ---------------------------------------------------------------------------

/// What the script does next, given the client's state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    Wait,
    TopUp,
    Pull,
    Finish,
}

#[derive(Debug, Default)]
struct Script {
    topped_up: bool,
    pulled: bool,
}

impl Script {
    fn next(
        &mut self,
        kind: PullKind,
        client: &GachaClient<ConsoleUi>,
    ) -> Action {
        if client.observer().completed || client.observer().failed {
            return Action::Finish;
        }
        if self.pulled || client.user_info().is_none() {
            return Action::Wait;
        }
        if client.can_pull(kind) {
            self.pulled = true;
            return Action::Pull;
        }
        if !self.topped_up && !client.is_pull_in_flight() {
            self.topped_up = true;
            return Action::TopUp;
        }
        Action::Wait
    }
}

fn pull_kind_from(value: Option<&str>) -> Option<PullKind> {
    match value.map(str::trim) {
        None | Some("") | Some("single") | Some("1") => Some(PullKind::Single),
        Some("ten") | Some("10") => Some(PullKind::Ten),
        Some(_) => None,
    }
}

// ---------------------------------------------------------------------------
// Bootstrap
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let url = std::env::var("GACHALINK_URL").unwrap_or_else(|_| ClientConfig::DEFAULT_URL.to_owned());
    let requested = std::env::var("GACHALINK_PULL").ok();
    let kind = pull_kind_from(requested.as_deref())
        .ok_or_else(|| format!("GACHALINK_PULL must be single or ten, got {requested:?}"))?;

    info!(%url, %kind, "starting console pull");
    let mut client = GachaClient::builder()
        .config(ClientConfig::with_url(url))
        .observer(ConsoleUi::default())
        .build();
    client.connect();

    let mut script = Script::default();
    let mut frame = tokio::time::interval(FRAME);
    loop {
        tokio::select! {
            _ = frame.tick() => {}
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, skipping");
                client.request_skip();
            }
        }
        client.tick(FRAME);

        match script.next(kind, &client) {
            Action::Wait => {}
            Action::TopUp => {
                warn!(cost = client.config().costs.cost(kind), "balance too low, requesting a top-up");
                client.add_currency(TOP_UP)?;
            }
            Action::Pull => client.request_pull(kind)?,
            Action::Finish => break,
        }
    }

    let failed = client.observer().failed;
    client.disconnect();
    for _ in 0..60 {
        if client.state() == ConnectionState::Disconnected {
            break;
        }
        frame.tick().await;
        client.tick(FRAME);
    }

    if failed {
        return Err("pull session failed".into());
    }
    Ok(())
}
