//! Middleware chain demo showing happy and unhappy request paths.
//!
//! Run with: cargo run --example demo

use std::time::Duration;

use async_trait::async_trait;
use gauntlet::{chain, Chain, ErrorHandler, Next, RequestHandler, RunResult};
use thiserror::Error;

// ============================================================================
// Payloads and error type
// ============================================================================

#[derive(Debug)]
struct GatewayRequest {
    path: &'static str,
    token: Option<&'static str>,
    user: Option<String>,
}

impl GatewayRequest {
    fn to(path: &'static str, token: Option<&'static str>) -> Self {
        Self {
            path,
            token,
            user: None,
        }
    }
}

#[derive(Debug, Default)]
struct GatewayResponse {
    status: Option<u16>,
    body: Option<String>,
}

#[derive(Debug, Clone, Error)]
enum GatewayError {
    #[error("missing or invalid token")]
    Unauthorized,
    #[error("too many requests")]
    RateLimited,
}

// ============================================================================
// Handlers
// ============================================================================

/// Resolves the token to a user, or raises `Unauthorized`.
struct Authenticate;

#[async_trait]
impl RequestHandler<GatewayRequest, GatewayResponse, GatewayError> for Authenticate {
    async fn handle(
        &self,
        req: &mut GatewayRequest,
        _res: &mut GatewayResponse,
        next: Next<GatewayError>,
    ) -> Result<(), GatewayError> {
        println!("  [Authenticate] Checking token for {}", req.path);
        tokio::time::sleep(Duration::from_millis(50)).await;

        match req.token {
            Some("secret") => {
                req.user = Some("alice".to_string());
                println!("  [Authenticate] Welcome, alice");
                next.proceed();
                Ok(())
            }
            _ => {
                println!("  [Authenticate] REJECTED");
                next.fail(GatewayError::Unauthorized);
                Ok(())
            }
        }
    }
}

/// Answers straight from the cache and ends the run without signaling.
struct CacheLookup;

#[async_trait]
impl RequestHandler<GatewayRequest, GatewayResponse, GatewayError> for CacheLookup {
    async fn handle(
        &self,
        req: &mut GatewayRequest,
        res: &mut GatewayResponse,
        next: Next<GatewayError>,
    ) -> Result<(), GatewayError> {
        if req.path == "/cached" {
            println!("  [CacheLookup] HIT - responding directly");
            res.status = Some(200);
            res.body = Some("cached payload".to_string());
            return Ok(());
        }

        println!("  [CacheLookup] miss");
        next.proceed();
        Ok(())
    }
}

/// Throttles bursty paths.
struct RateLimit;

#[async_trait]
impl RequestHandler<GatewayRequest, GatewayResponse, GatewayError> for RateLimit {
    async fn handle(
        &self,
        req: &mut GatewayRequest,
        _res: &mut GatewayResponse,
        next: Next<GatewayError>,
    ) -> Result<(), GatewayError> {
        if req.path == "/burst" {
            println!("  [RateLimit] over budget");
            return Err(GatewayError::RateLimited);
        }

        println!("  [RateLimit] within budget");
        next.proceed();
        Ok(())
    }
}

/// Produces the successful response.
struct Render;

#[async_trait]
impl RequestHandler<GatewayRequest, GatewayResponse, GatewayError> for Render {
    async fn handle(
        &self,
        req: &mut GatewayRequest,
        res: &mut GatewayResponse,
        next: Next<GatewayError>,
    ) -> Result<(), GatewayError> {
        let user = req.user.as_deref().unwrap_or("stranger");
        res.status = Some(200);
        res.body = Some(format!("hello {user}, this is {}", req.path));
        println!("  [Render] 200 OK");
        next.proceed();
        Ok(())
    }
}

/// Turns a pending error into an error page and clears it.
struct ErrorPage;

#[async_trait]
impl ErrorHandler<GatewayRequest, GatewayResponse, GatewayError> for ErrorPage {
    async fn handle(
        &self,
        error: GatewayError,
        _req: &mut GatewayRequest,
        res: &mut GatewayResponse,
        next: Next<GatewayError>,
    ) -> Result<(), GatewayError> {
        let status = match error {
            GatewayError::Unauthorized => 401,
            GatewayError::RateLimited => 429,
        };
        res.status = Some(status);
        res.body = Some(format!("error: {error}"));
        println!("  [ErrorPage] {status} ({error})");
        next.proceed();
        Ok(())
    }
}

// ============================================================================
// Demo scenarios
// ============================================================================

fn gateway() -> Chain<GatewayRequest, GatewayResponse, GatewayError> {
    chain![
        request CacheLookup,
        [request Authenticate, request RateLimit],
        request Render,
        error ErrorPage,
    ]
}

async fn show(title: &str, chain: &Chain<GatewayRequest, GatewayResponse, GatewayError>, mut req: GatewayRequest) {
    println!("┌──────────────────────────────────────────────────────────────┐");
    println!("│ {title:<60} │");
    println!("└──────────────────────────────────────────────────────────────┘");

    let mut res = GatewayResponse::default();
    match chain.run(&mut req, &mut res).await {
        Ok(RunResult::Completed(None)) => {
            println!("  ✓ completed: {:?}\n", res);
        }
        Ok(RunResult::Completed(Some(error))) => {
            println!("  ✗ completed with unhandled error: {error}\n");
        }
        Ok(RunResult::Halted { position }) => {
            println!("  ■ halted at position {position}: {:?}\n", res);
        }
        Err(escaped) => {
            println!("  ! aborted: {escaped}\n");
        }
    }
}

#[tokio::main]
async fn main() {
    let pipeline = gateway();

    show(
        "Scenario 1: Happy path",
        &pipeline,
        GatewayRequest::to("/profile", Some("secret")),
    )
    .await;

    show(
        "Scenario 2: Bad token, recovered by the error page",
        &pipeline,
        GatewayRequest::to("/profile", Some("nope")),
    )
    .await;

    show(
        "Scenario 3: Rate limited (returned error is captured)",
        &pipeline,
        GatewayRequest::to("/burst", Some("secret")),
    )
    .await;

    show(
        "Scenario 4: Cache hit ends the run early",
        &pipeline,
        GatewayRequest::to("/cached", Some("secret")),
    )
    .await;

    // No error page in this chain: the error survives to completion.
    let bare = chain![request Authenticate, request Render];
    show(
        "Scenario 5: No error handler installed",
        &bare,
        GatewayRequest::to("/profile", None),
    )
    .await;

    println!("✓ All demos completed!");
}
