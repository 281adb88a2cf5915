use anyhow::Context;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Json};
use axum::routing::{get, post};
use axum::Router;
use botdash_api::{DashboardClient, StatusSource};
use botdash_core::{BotId, BotSummary};
use botdash_poller::{Card, MemoryBoard, PollerConfig, PollerRegistry};
use serde::Serialize;
use std::collections::HashSet;
use std::convert::Infallible;
use std::future::Future;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::{watch, Mutex};
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tokio_stream::StreamExt;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

// ── Shared state ────────────────────────────────────────────────────────────

struct ServeState {
    client: Arc<DashboardClient>,
    board: Arc<MemoryBoard>,
    registry: PollerRegistry<DashboardClient, MemoryBoard>,
    /// Held for the whole list-then-sync of a refresh.
    refresh: Mutex<()>,
    /// Flips to `true` once the server starts shutting down.
    stopping: watch::Sender<bool>,
}

type Shared = Arc<ServeState>;

impl ServeState {
    fn new(client: DashboardClient, poller: PollerConfig) -> Self {
        let client = Arc::new(client);
        let board = Arc::new(MemoryBoard::new());
        let registry = PollerRegistry::new(client.clone(), board.clone(), poller);
        let (stopping, _) = watch::channel(false);
        Self {
            client,
            board,
            registry,
            refresh: Mutex::new(()),
            stopping,
        }
    }
}

/// Item of an event feed: a board event, or the end of the feed.
enum Feed {
    Event(Event),
    Stop,
}

#[derive(Debug, Default, PartialEq, Eq, Serialize)]
pub struct RefreshSummary {
    pub mounted: Vec<BotId>,
    pub removed: Vec<BotId>,
    pub total: usize,
}

// ── Entry point ─────────────────────────────────────────────────────────────

pub async fn run(client: DashboardClient, poller: PollerConfig, port: u16) -> anyhow::Result<()> {
    let state: Shared = Arc::new(ServeState::new(client, poller));

    let bots = state
        .client
        .list_bots()
        .await
        .context("Failed to list bots")?;
    let summary = sync_board(&state.board, &state.registry, &bots);
    info!(total = summary.total, "board mounted");

    let addr = format!("0.0.0.0:{port}");
    println!("botdash board mirror running at http://localhost:{port}/api/board");
    println!("Press Ctrl+C to stop.\n");

    let listener = TcpListener::bind(&addr).await?;
    serve_board(listener, state, async {
        let _ = tokio::signal::ctrl_c().await;
    })
    .await?;
    Ok(())
}

/// Serve the board until `shutdown` resolves.
///
/// On shutdown every session is cancelled and every open event stream ends,
/// so waiting for in-flight connections cannot hang.
async fn serve_board<F>(listener: TcpListener, state: Shared, shutdown: F) -> std::io::Result<()>
where
    F: Future<Output = ()> + Send + 'static,
{
    let shared = state.clone();
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move {
            shutdown.await;
            info!("shutting down board mirror");
            shared.stopping.send_replace(true);
            shared.registry.teardown();
        })
        .await
}

fn router(state: Shared) -> Router {
    Router::new()
        .route("/api/board", get(board_handler))
        .route("/api/board/events", get(board_events_handler))
        .route("/api/board/refresh", post(refresh_handler))
        .layer(ServiceBuilder::new().layer(CorsLayer::permissive()))
        .with_state(state)
}

// ── Route handlers ──────────────────────────────────────────────────────────

async fn board_handler(State(state): State<Shared>) -> Json<Vec<Card>> {
    Json(state.board.snapshot())
}

async fn board_events_handler(
    State(state): State<Shared>,
) -> Sse<impl tokio_stream::Stream<Item = Result<Event, Infallible>>> {
    // Lagged receivers skip the events they missed; the snapshot endpoint
    // is the way to resynchronise.
    let events = BroadcastStream::new(state.board.subscribe()).filter_map(|event| {
        let event = event.ok()?;
        Event::default().json_data(&event).ok().map(Feed::Event)
    });
    let stop = WatchStream::new(state.stopping.subscribe())
        .filter(|stopping| *stopping)
        .map(|_| Feed::Stop);
    let stream = events
        .merge(stop)
        .take_while(|item| matches!(item, Feed::Event(_)))
        .filter_map(|item| match item {
            Feed::Event(event) => Some(Ok(event)),
            Feed::Stop => None,
        });
    Sse::new(stream).keep_alive(KeepAlive::default())
}

async fn refresh_handler(State(state): State<Shared>) -> impl IntoResponse {
    let _refreshing = state.refresh.lock().await;
    match state.client.list_bots().await {
        Ok(bots) => {
            let summary = sync_board(&state.board, &state.registry, &bots);
            (StatusCode::OK, Json(serde_json::json!(summary)))
        }
        Err(e) => {
            warn!(error = %e, "bot list refresh failed");
            (
                StatusCode::BAD_GATEWAY,
                Json(serde_json::json!({"success": false, "message": e.to_string()})),
            )
        }
    }
}

// ── Helpers ─────────────────────────────────────────────────────────────────

/// Re-render the board from a fresh bot list.
///
/// Cards of bots that are gone are removed and their sessions cancelled; new
/// bots get a card and a session. Existing cards are left as they are.
pub fn sync_board<S: StatusSource + ?Sized>(
    board: &MemoryBoard,
    registry: &PollerRegistry<S, MemoryBoard>,
    bots: &[BotSummary],
) -> RefreshSummary {
    let listed: HashSet<BotId> = bots.iter().map(|b| b.id).collect();
    let mut summary = RefreshSummary {
        total: bots.len(),
        ..Default::default()
    };

    for id in board.bot_ids() {
        if !listed.contains(&id) {
            registry.unmount(id);
            board.unmount(id);
            summary.removed.push(id);
        }
    }

    for bot in bots {
        if board.mount_new(bot) {
            registry.poll(bot.id, bot.bot_username.clone());
            summary.mounted.push(bot.id);
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use botdash_core::{AppError, StatusLabel, StatusReply};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    struct AlwaysInitializing {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl StatusSource for AlwaysInitializing {
        async fn bot_status(&self, _bot: BotId) -> Result<StatusReply, AppError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(StatusReply {
                success: true,
                status: Some("initializing".into()),
                ..Default::default()
            })
        }
    }

    fn bot(id: u64) -> BotSummary {
        BotSummary {
            id: BotId(id),
            bot_name: "openclaw-bot".into(),
            bot_username: format!("bot{id}"),
            ip_address: "192.0.2.20".into(),
            droplet_id: None,
            region: None,
            status: Some("running".into()),
            message_count: 0,
            created_at: None,
        }
    }

    #[tokio::test(flavor = "current_thread", start_paused = true)]
    async fn refresh_mounts_new_and_drops_deleted_bots() {
        let source = Arc::new(AlwaysInitializing {
            calls: AtomicUsize::new(0),
        });
        let board = Arc::new(MemoryBoard::new());
        let registry = PollerRegistry::new(source.clone(), board.clone(), PollerConfig::default());

        let first = sync_board(&board, &registry, &[bot(1), bot(2)]);
        assert_eq!(first.mounted, vec![BotId(1), BotId(2)]);
        assert!(first.removed.is_empty());

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
        assert_eq!(board.card(BotId(1)).unwrap().label, StatusLabel::Initializing);

        // Bot 1 was deleted, bot 3 deployed.
        let second = sync_board(&board, &registry, &[bot(2), bot(3)]);
        assert_eq!(second.mounted, vec![BotId(3)]);
        assert_eq!(second.removed, vec![BotId(1)]);
        assert_eq!(second.total, 2);
        assert!(!registry.is_polling(BotId(1)));
        assert_eq!(registry.active(), vec![BotId(2), BotId(3)]);

        // Bot 2 kept its card and its session.
        assert_eq!(board.card(BotId(2)).unwrap().label, StatusLabel::Initializing);
        assert_eq!(board.bot_ids(), vec![BotId(2), BotId(3)]);

        registry.teardown();
    }

    #[tokio::test]
    async fn shutdown_closes_open_event_streams() {
        // Nothing is mounted, so the client never makes a request.
        let client = DashboardClient::new("http://127.0.0.1:9", None).unwrap();
        let state: Shared = Arc::new(ServeState::new(client, PollerConfig::default()));
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let server = tokio::spawn(serve_board(listener, state, async {
            let _ = stop_rx.await;
        }));

        let mut conn = tokio::net::TcpStream::connect(addr).await.unwrap();
        conn.write_all(b"GET /api/board/events HTTP/1.1\r\nHost: localhost\r\n\r\n")
            .await
            .unwrap();
        let mut head = [0u8; 64];
        let n = conn.read(&mut head).await.unwrap();
        assert!(String::from_utf8_lossy(&head[..n]).starts_with("HTTP/1.1 200"));

        stop_tx.send(()).unwrap();
        let finished = tokio::time::timeout(Duration::from_secs(5), server).await;
        assert!(matches!(finished, Ok(Ok(Ok(())))), "server kept running");
    }
}
