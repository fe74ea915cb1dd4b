//! Retry Patterns Example
//!
//! Demonstrates retry and repeat patterns with the async runner:
//! - Basic retry with exponential backoff
//! - Conditional retry that skips permanent errors
//! - Observing every decision
//! - Polling until a condition holds
//! - Cancelling a long-running retry loop
//! - Structured logs of every decision via `tracing-subscriber`

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tidewater::prelude::*;

fn ms(n: u64) -> PositiveDuration {
    PositiveDuration::from_millis(n)
}

// ==================== Basic Retry ====================

/// Example 1: Basic retry with exponential backoff
async fn example_basic_retry() {
    println!("\n=== Example 1: Basic Retry ===");

    let attempts = Arc::new(AtomicU32::new(0));
    let schedule = exponential(ms(50), 2.0).union(recurs(5));

    let result = AsyncRunner::new()
        .retry(&schedule, || {
            let attempts = attempts.clone();
            async move {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                println!("  Attempt {}", n + 1);
                if n < 2 {
                    Err("transient failure")
                } else {
                    Ok("success!")
                }
            }
        })
        .await;

    match result {
        Ok(value) => println!(
            "Success after {} attempts: {}",
            attempts.load(Ordering::SeqCst),
            value
        ),
        Err(e) => println!("Failed: {}", e),
    }
}

// ==================== Conditional Retry ====================

#[derive(Debug, Clone, PartialEq)]
enum HttpError {
    ServerError(u16),
    ClientError(u16),
}

impl std::fmt::Display for HttpError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HttpError::ServerError(code) => write!(f, "server error {}", code),
            HttpError::ClientError(code) => write!(f, "client error {}", code),
        }
    }
}

fn is_retryable(error: &HttpError) -> bool {
    matches!(error, HttpError::ServerError(_))
}

/// Example 2: Only retry server errors
async fn example_conditional_retry() {
    println!("\n=== Example 2: Conditional Retry ===");

    let schedule = exponential(ms(20), 2.0)
        .max_delay(ms(100))
        .union(recurs(5));
    let attempts = Arc::new(AtomicU32::new(0));

    let result = AsyncRunner::new()
        .retry_while(
            &schedule,
            || {
                let attempts = attempts.clone();
                async move {
                    let n = attempts.fetch_add(1, Ordering::SeqCst);
                    println!("  HTTP request attempt {}", n + 1);
                    if n == 0 {
                        Err::<&str, _>(HttpError::ServerError(503))
                    } else {
                        Err(HttpError::ClientError(404))
                    }
                }
            },
            is_retryable,
        )
        .await;

    match result {
        Ok(body) => println!("Response: {}", body),
        Err(e) => println!("Request failed (no retries for client errors): {}", e),
    }
    println!("Total attempts: {}", attempts.load(Ordering::SeqCst));
}

// ==================== Observability ====================

/// Example 3: Log every decision the schedule makes
async fn example_observer() {
    println!("\n=== Example 3: Observing Decisions ===");

    let schedule = fibonacci(ms(10)).union(recurs(4));

    let result = AsyncRunner::new()
        .observe(|event: &ScheduleEvent<'_, (), &str>| {
            println!(
                "  attempt {} failed ({:?}), decision: {}",
                event.attempt, event.outcome, event.decision
            );
        })
        .retry(&schedule, || async { Err::<(), _>("connection refused") })
        .await;

    println!("Final result: {:?}", result);
}

// ==================== Polling ====================

/// Example 4: Poll a job until it reports completion
async fn example_polling() {
    println!("\n=== Example 4: Polling ===");

    let progress = Arc::new(AtomicU32::new(0));
    let schedule = spaced(ms(25)).union(recurs(20));

    let result = AsyncRunner::new()
        .repeat_until(
            &schedule,
            || {
                let progress = progress.clone();
                async move {
                    let percent = progress.fetch_add(25, Ordering::SeqCst) + 25;
                    println!("  Job progress: {}%", percent);
                    Ok::<_, String>(percent)
                }
            },
            |percent| *percent >= 100,
        )
        .await;

    println!("Polling finished: {:?}", result);
}

// ==================== Cancellation ====================

/// Example 5: Cancel a retry loop that would otherwise wait a long time
async fn example_cancellation() {
    println!("\n=== Example 5: Cancellation ===");

    let runner = AsyncRunner::new();
    let token = runner.cancellation_token().clone();

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(100)).await;
        println!("  Shutting down...");
        token.cancel();
    });

    let result = runner
        .retry(&spaced(PositiveDuration::from_secs(30)), || async {
            println!("  Trying an unavailable service");
            Err::<(), _>("unavailable")
        })
        .await;

    match result {
        Err(RunError::Cancelled) => println!("Retry loop cancelled cleanly"),
        other => println!("Unexpected result: {:?}", other),
    }
}

#[tokio::main]
async fn main() {
    // Driver decisions are logged at debug level with the `tracing` feature
    tracing_subscriber::fmt()
        .with_max_level(tracing_subscriber::filter::LevelFilter::DEBUG)
        .with_target(false)
        .init();

    println!("======================================");
    println!("       Retry Patterns Example         ");
    println!("======================================");

    example_basic_retry().await;
    example_conditional_retry().await;
    example_observer().await;
    example_polling().await;
    example_cancellation().await;

    println!("\n======================================");
    println!("           Examples Complete           ");
    println!("======================================");
}
