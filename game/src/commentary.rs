//! Host commentary. A [`Commentator`] turns a moment of play into one short
//! line; the [`CommentaryFeed`] runs requests in the background, falls back to
//! a stock line on failure and only ever delivers the newest request's reply.

use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::{Request, Uri, header::CONTENT_TYPE};
use hyper_util::client::legacy::{Client, connect::HttpConnector};
use hyper_util::rt::TokioExecutor;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::mpsc;

use crate::round::RoundEvent;
use crate::session::SessionEvent;
use crate::settings::CommentarySettings;

pub const FALLBACK_LINE: &str = "Technical difficulties, folks! But keep playing!";

pub const HOST_PERSONA: &str = "Ace, a charismatic and slightly cheeky street-magic game show host. \
Be brief (two sentences at most). Praise sharp eyes on a win, tease gently on a loss, build hype at the start.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CommentaryContext {
    RoundStart,
    Win,
    Loss,
    SessionOver,
}

impl CommentaryContext {
    pub fn label(self) -> &'static str {
        match self {
            CommentaryContext::RoundStart => "round-start",
            CommentaryContext::Win => "win",
            CommentaryContext::Loss => "loss",
            CommentaryContext::SessionOver => "session-over",
        }
    }

    /// What happened, phrased for the host.
    pub fn prompt(self) -> &'static str {
        match self {
            CommentaryContext::RoundStart => "The game is starting! Watch the ball carefully.",
            CommentaryContext::Win => "Player guessed correctly! They won this round.",
            CommentaryContext::Loss => "Player guessed wrong. They lost the streak.",
            CommentaryContext::SessionOver => "The session is over. Sum up the player's run.",
        }
    }

    pub fn for_event(event: &SessionEvent) -> Option<Self> {
        match event {
            SessionEvent::RoundStarted(_) => Some(CommentaryContext::RoundStart),
            SessionEvent::Round(RoundEvent::Resolved(outcome)) => Some(if outcome.correct {
                CommentaryContext::Win
            } else {
                CommentaryContext::Loss
            }),
            SessionEvent::Completed(_) => Some(CommentaryContext::SessionOver),
            _ => None,
        }
    }
}

#[derive(Debug, Error)]
pub enum CommentaryError {
    #[error("invalid commentary endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("commentary request failed: {0}")]
    Request(String),
    #[error("commentary service answered with status {0}")]
    Status(u16),
    #[error("commentary reply could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("commentary reply was empty")]
    Empty,
    #[error("commentary timed out after {0:?}")]
    Timeout(Duration),
}

pub trait Commentator: Send + Sync + 'static {
    fn comment(
        &self,
        context: CommentaryContext,
        streak: u32,
    ) -> impl Future<Output = Result<String, CommentaryError>> + Send;
}

/// Offline host lines.
#[derive(Debug, Default, Clone, Copy)]
pub struct CannedCommentator;

const START_LINES: [&str; 3] = [
    "Eyes on the ball, friend. Here we go!",
    "Watch closely now, my hands are quick!",
    "New round, same ball. Can you keep up?",
];
const WIN_LINES: [&str; 3] = [
    "Sharp eyes! Are you sure you're not peeking?",
    "Got it! I'm starting to suspect you're a magician too.",
    "Right again! Somebody check their sleeves.",
];
const LOSS_LINES: [&str; 3] = [
    "Ooh, not that one. One in three, folks!",
    "The ball was right there. Focus!",
    "Probability giveth, probability taketh away.",
];

impl CannedCommentator {
    pub fn line(context: CommentaryContext, streak: u32) -> String {
        let pick = |lines: &[&str; 3]| lines[streak as usize % lines.len()].to_string();
        match context {
            CommentaryContext::RoundStart => pick(&START_LINES),
            CommentaryContext::Win if streak >= 3 => {
                format!("{streak} in a row! Are you sure you're not peeking?")
            }
            CommentaryContext::Win => pick(&WIN_LINES),
            CommentaryContext::Loss => pick(&LOSS_LINES),
            CommentaryContext::SessionOver if streak == 0 => {
                "That's the show! Better luck next time.".to_string()
            }
            CommentaryContext::SessionOver => {
                format!("That's the show! Best streak tonight: {streak}.")
            }
        }
    }
}

impl Commentator for CannedCommentator {
    fn comment(
        &self,
        context: CommentaryContext,
        streak: u32,
    ) -> impl Future<Output = Result<String, CommentaryError>> + Send {
        std::future::ready(Ok(Self::line(context, streak)))
    }
}

#[derive(Debug, Serialize)]
struct CommentaryRequest<'a> {
    context: &'a str,
    streak: u32,
    persona: &'a str,
}

#[derive(Debug, Deserialize)]
struct CommentaryReply {
    text: String,
}

/// POSTs `{context, streak, persona}` as JSON and expects `{text}` back.
#[derive(Debug, Clone)]
pub struct HttpCommentator {
    client: Client<HttpConnector, Full<Bytes>>,
    uri: Uri,
    timeout: Duration,
}

impl HttpCommentator {
    pub fn new(endpoint: &str, timeout: Duration) -> Result<Self, CommentaryError> {
        let invalid = |reason: String| CommentaryError::InvalidEndpoint {
            endpoint: endpoint.to_string(),
            reason,
        };
        let uri: Uri = endpoint.parse().map_err(|e| invalid(format!("{e}")))?;
        if uri.scheme_str() != Some("http") {
            return Err(invalid("only http:// endpoints are supported".to_string()));
        }
        if uri.host().is_none() {
            return Err(invalid("missing host".to_string()));
        }

        Ok(Self {
            client: Client::builder(TokioExecutor::new()).build_http(),
            uri,
            timeout,
        })
    }

    async fn request(&self, context: CommentaryContext, streak: u32) -> Result<String, CommentaryError> {
        let body = serde_json::to_vec(&CommentaryRequest {
            context: context.prompt(),
            streak,
            persona: HOST_PERSONA,
        })?;
        let request = Request::post(self.uri.clone())
            .header(CONTENT_TYPE, "application/json")
            .body(Full::new(Bytes::from(body)))
            .map_err(|e| CommentaryError::Request(e.to_string()))?;

        let response = self
            .client
            .request(request)
            .await
            .map_err(|e| CommentaryError::Request(e.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            return Err(CommentaryError::Status(status.as_u16()));
        }

        let bytes = response
            .into_body()
            .collect()
            .await
            .map_err(|e| CommentaryError::Request(e.to_string()))?
            .to_bytes();
        let reply: CommentaryReply = serde_json::from_slice(&bytes)?;
        let text = reply.text.trim();
        if text.is_empty() {
            return Err(CommentaryError::Empty);
        }
        Ok(text.to_string())
    }
}

impl Commentator for HttpCommentator {
    fn comment(
        &self,
        context: CommentaryContext,
        streak: u32,
    ) -> impl Future<Output = Result<String, CommentaryError>> + Send {
        async move {
            tokio::time::timeout(self.timeout, self.request(context, streak))
                .await
                .map_err(|_| CommentaryError::Timeout(self.timeout))?
        }
    }
}

/// The commentator picked from settings: remote when an endpoint is
/// configured and valid, canned otherwise.
#[derive(Debug, Clone)]
pub enum AnyCommentator {
    Canned(CannedCommentator),
    Http(HttpCommentator),
}

impl AnyCommentator {
    pub fn from_settings(settings: &CommentarySettings) -> Self {
        let Some(endpoint) = settings.endpoint.as_deref() else {
            return AnyCommentator::Canned(CannedCommentator);
        };
        match HttpCommentator::new(endpoint, settings.timeout) {
            Ok(http) => AnyCommentator::Http(http),
            Err(err) => {
                tracing::warn!(error = %err, "commentary endpoint unusable; using canned lines");
                AnyCommentator::Canned(CannedCommentator)
            }
        }
    }
}

impl Commentator for AnyCommentator {
    fn comment(
        &self,
        context: CommentaryContext,
        streak: u32,
    ) -> impl Future<Output = Result<String, CommentaryError>> + Send {
        async move {
            match self {
                AnyCommentator::Canned(canned) => canned.comment(context, streak).await,
                AnyCommentator::Http(http) => http.comment(context, streak).await,
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentaryLine {
    pub request: u64,
    pub context: CommentaryContext,
    pub text: String,
    /// The commentator failed and the stock line was substituted.
    pub fallback: bool,
}

/// Background commentary requests. Each [`request`](Self::request) supersedes
/// the previous one: a reply is delivered only if no newer request was made
/// while it was in flight.
pub struct CommentaryFeed<C> {
    commentator: Arc<C>,
    latest: Arc<AtomicU64>,
    tx: mpsc::UnboundedSender<CommentaryLine>,
    rx: mpsc::UnboundedReceiver<CommentaryLine>,
}

impl<C: Commentator> CommentaryFeed<C> {
    pub fn new(commentator: C) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self {
            commentator: Arc::new(commentator),
            latest: Arc::new(AtomicU64::new(0)),
            tx,
            rx,
        }
    }

    pub fn latest_request(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }

    /// Spawn a request on the current tokio runtime and return its id.
    pub fn request(&mut self, context: CommentaryContext, streak: u32) -> u64 {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let commentator = Arc::clone(&self.commentator);
        let latest = Arc::clone(&self.latest);
        let tx = self.tx.clone();

        tokio::spawn(async move {
            let (text, fallback) = match commentator.comment(context, streak).await {
                Ok(text) => (text, false),
                Err(err) => {
                    tracing::warn!(context = context.label(), error = %err, "commentary failed; using fallback line");
                    (FALLBACK_LINE.to_string(), true)
                }
            };
            if latest.load(Ordering::SeqCst) != id {
                tracing::debug!(request = id, "stale commentary dropped");
                return;
            }
            let _ = tx.send(CommentaryLine {
                request: id,
                context,
                text,
                fallback,
            });
        });
        id
    }

    /// Invalidate whatever is in flight.
    pub fn cancel_pending(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    /// Next current reply. Replies that went stale while queued are skipped.
    pub async fn recv(&mut self) -> Option<CommentaryLine> {
        loop {
            let line = self.rx.recv().await?;
            if line.request == self.latest_request() {
                return Some(line);
            }
            tracing::debug!(request = line.request, "stale commentary dropped");
        }
    }
}
