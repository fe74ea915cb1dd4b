//! Dry Run Example
//!
//! Schedules are pure, so their delays can be inspected without running
//! anything. This example prints the delays of several schedules, compares a
//! dry run with a real run, and builds a schedule from configuration.

use std::sync::Arc;

use tidewater::config::{Backoff, JitterConfig, RetryConfig};
use tidewater::prelude::*;
use tidewater::schedule::Schedule;
use tidewater::testing::RecordingSleeper;

fn ms(n: u64) -> PositiveDuration {
    PositiveDuration::from_millis(n)
}

fn print_delays<S: Schedule>(name: &str, schedule: S) {
    let delays: Vec<String> = schedule.delays().map(|d| d.to_string()).collect();
    println!("{:<28} {}", name, delays.join(", "));
}

fn example_backoff_shapes() {
    println!("\n=== Backoff Shapes ===");

    print_delays("spaced(100ms)", spaced(ms(100)).union(recurs(5)));
    print_delays("linear(100ms, 1.0)", linear(ms(100), 1.0).union(recurs(5)));
    print_delays(
        "exponential(100ms, 2.0)",
        exponential(ms(100), 2.0).union(recurs(5)),
    );
    print_delays("fibonacci(100ms)", fibonacci(ms(100)).union(recurs(5)));
    print_delays(
        "exponential, capped at 500ms",
        exponential(ms(100), 2.0).max_delay(ms(500)).union(recurs(5)),
    );
    print_delays(
        "spaced, at most 1s in total",
        spaced(ms(300)).max_cumulative_delay(PositiveDuration::from_secs(1)),
    );
    print_delays(
        "warm-up then exponential",
        from_durations([ms(5), ms(5)]).then(exponential(ms(100), 2.0).union(recurs(3))),
    );
}

fn example_randomized() {
    println!("\n=== Randomized (seeded) ===");

    let random = Arc::new(RandomSource::seeded(7));
    print_delays(
        "exponential + 25% jitter",
        exponential(ms(100), 2.0)
            .jitter_factor(0.25, Arc::clone(&random))
            .union(recurs(5)),
    );
    print_delays(
        "aws decorrelated",
        aws_decorrelated(ms(100), PositiveDuration::from_secs(2), Arc::clone(&random))
            .union(recurs(5)),
    );
    print_delays(
        "polly decorrelated",
        polly_decorrelated(ms(100), random).union(recurs(5)),
    );
}

fn example_dry_run_vs_real_run() {
    println!("\n=== Dry Run vs Real Run ===");

    let schedule = exponential(ms(10), 2.0).union(recurs(4));
    let planned: Vec<_> = schedule.clone().delays().collect();

    let sleeper = RecordingSleeper::new();
    let result = Runner::new()
        .with_sleeper(sleeper.clone())
        .retry(&schedule, || Err::<(), _>("still failing"));

    println!("Planned delays:  {:?}", planned);
    println!("Recorded sleeps: {:?}", sleeper.recorded());
    println!("Result:          {:?}", result);
}

fn example_from_config() {
    println!("\n=== From Configuration ===");

    let config = RetryConfig::new(Backoff::Exponential {
        seed_ms: 50,
        factor: 2.0,
    })
    .with_max_retries(4)
    .with_max_delay_ms(300)
    .with_jitter(JitterConfig::Between {
        min_ms: 0,
        max_ms: 10,
    })
    .with_seed(1);

    match config.build() {
        Ok(schedule) => print_delays("configured schedule", schedule),
        Err(e) => println!("Invalid config: {}", e),
    }

    let unbounded = RetryConfig::new(Backoff::Spaced { delay_ms: 100 });
    if let Err(e) = unbounded.build() {
        println!("Rejected: {}", e);
    }
}

fn main() {
    println!("======================================");
    println!("          Dry Run Example             ");
    println!("======================================");

    example_backoff_shapes();
    example_randomized();
    example_dry_run_vs_real_run();
    example_from_config();

    println!("\n======================================");
    println!("           Examples Complete           ");
    println!("======================================");
}
